// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub acquisition for desktop/CI builds where no document camera exists.
//
// Reports capture as unsupported, so a session built on it fails every
// request with `Unsupported` without presenting anything.

use pagescan_core::CaptureFailure;

use crate::traits::{CaptureOutcome, ScanAcquisition};

/// Error domain reported if the stub is presented anyway.
pub const STUB_DOMAIN: &str = "pagescan.stub";

/// No-op acquisition returned on platforms without a document scanner.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubAcquisition;

impl ScanAcquisition for StubAcquisition {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }

    fn is_capture_supported(&self) -> bool {
        false
    }

    fn has_presentation_surface(&self) -> bool {
        false
    }

    async fn present_capture_ui(&self) -> CaptureOutcome {
        tracing::warn!("ScanAcquisition::present_capture_ui called on stub acquisition");
        CaptureOutcome::Failed(CaptureFailure::new(
            STUB_DOMAIN,
            -1,
            "document capture is not available on this platform",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ScanSession;
    use crate::traits::NoRetryPrompt;
    use pagescan_core::{ScanConfig, ScanError};

    #[tokio::test]
    async fn stub_session_reports_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let session = ScanSession::new(
            StubAcquisition,
            NoRetryPrompt,
            ScanConfig::with_documents_dir(dir.path()),
        );
        let err = session.handle("scan_as_pdf").await.unwrap_err();
        assert!(matches!(err, ScanError::Unsupported));
    }

    #[tokio::test]
    async fn presenting_the_stub_fails_in_its_own_domain() {
        match StubAcquisition.present_capture_ui().await {
            CaptureOutcome::Failed(failure) => assert_eq!(failure.domain, STUB_DOMAIN),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
