// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language messages for scan errors.
//
// The host UI shows these in its retry prompt and failure alerts. Severity
// drives whether the host treats the outcome as an alarm at all.

use crate::error::ScanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Not a problem — the user chose this (e.g. cancelled the scan).
    Quiet,
    /// A fresh attempt may well succeed.
    Transient,
    /// The user must do something first (free storage, grant access).
    ActionRequired,
    /// Retrying won't help on this device or with this request.
    Permanent,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary (alert title).
    pub message: String,
    /// What the user should try (alert body).
    pub suggestion: String,
    /// Whether offering "Try again" makes sense.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `ScanError` into a `HumanError`.
pub fn humanize_error(err: &ScanError) -> HumanError {
    match err {
        ScanError::Unsupported => HumanError {
            message: "Document scanning isn't available on this device.".into(),
            suggestion: "Scanning needs a camera and a recent operating system version.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanError::NoPresentationSurface => HumanError {
            message: "The scanner couldn't be opened.".into(),
            suggestion: "Bring the app to the foreground and try again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanError::Cancelled => HumanError {
            message: "Scan cancelled.".into(),
            suggestion: String::new(),
            retriable: false,
            severity: Severity::Quiet,
        },

        ScanError::RecoverableCaptureFailure { cause } => HumanError {
            message: "Something went wrong while scanning.".into(),
            suggestion: format!(
                "This usually works on a second try. Hold the device steady over the page. ({cause})"
            ),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanError::TerminalCaptureFailure { cause } => HumanError {
            message: "The scanner stopped with an error.".into(),
            suggestion: format!("Close the scanner and start again. (Detail: {cause})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanError::EmptyScan => HumanError {
            message: "No pages were scanned.".into(),
            suggestion: "Capture at least one page before saving.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        ScanError::UnrecognizedRequest { requested } => HumanError {
            message: "The app asked for a scan type that isn't supported.".into(),
            suggestion: format!("Please report this. (Requested: {requested})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanError::Superseded => HumanError {
            message: "A newer scan replaced this one.".into(),
            suggestion: String::new(),
            retriable: false,
            severity: Severity::Quiet,
        },

        ScanError::ArtifactWriteFailure { .. } | ScanError::Io(_) => HumanError {
            message: "The scan couldn't be saved.".into(),
            suggestion: "Your device's storage may be full. Free some space and scan again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::Config(_) | ScanError::Serialization(_) => HumanError {
            message: "The scanner settings are invalid.".into(),
            suggestion: "Reset the scanner settings to their defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}
