// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic traits for the native capture UI and the host's retry
// prompt.

use std::future::Future;

use pagescan_core::CaptureFailure;
use pagescan_core::human_errors::HumanError;
use pagescan_document::Page;

/// Result of presenting the capture UI once.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// The user finished; pages are in scan order.
    Captured(Vec<Page>),
    /// The user dismissed the scanner.
    Cancelled,
    /// The platform component reported an error.
    Failed(CaptureFailure),
}

/// The OS-provided document camera.
///
/// Implementations wrap the platform scanner (VisionKit, ML Kit, ...). The
/// page edge detection and perspective correction happen inside the platform
/// component; this trait only hands back the finished bitmaps.
pub trait ScanAcquisition: Send + Sync {
    /// Human-readable platform name (e.g. "iOS 17", "Android 14").
    fn platform_name(&self) -> &str;

    /// Whether the device can scan documents at all.
    fn is_capture_supported(&self) -> bool;

    /// Whether there is somewhere to present the scanner right now.
    fn has_presentation_surface(&self) -> bool {
        true
    }

    /// Present the scanner and suspend until the user finishes, cancels, or
    /// the platform reports a failure.
    ///
    /// There is no deadline: an abandoned scanner keeps the caller suspended
    /// until the user acts.
    fn present_capture_ui(&self) -> impl Future<Output = CaptureOutcome> + Send;
}

/// Asks the user whether to try a failed scan again.
pub trait RetryPrompt: Send + Sync {
    /// Show `error` with a "Try again" affordance. Returns `true` on confirm.
    fn confirm_retry(&self, error: &HumanError) -> impl Future<Output = bool> + Send;
}

/// Prompt for hosts that never offer a retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetryPrompt;

impl RetryPrompt for NoRetryPrompt {
    async fn confirm_retry(&self, error: &HumanError) -> bool {
        tracing::debug!(message = %error.message, "retry declined (no prompt available)");
        false
    }
}
