// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error taxonomy for Pagescan.

use thiserror::Error;

/// Every terminal failure a scan request can end with.
///
/// Exactly one of these (or a success payload) is delivered per request.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Acquisition --
    #[error("document scanning is not supported on this device")]
    Unsupported,

    #[error("no surface available to present the scanner")]
    NoPresentationSurface,

    #[error("scan cancelled by the user")]
    Cancelled,

    #[error("scan failed: {cause}")]
    RecoverableCaptureFailure { cause: String },

    #[error("scan failed: {cause}")]
    TerminalCaptureFailure { cause: String },

    #[error("the scanner returned no pages")]
    EmptyScan,

    // -- Request handling --
    #[error("unrecognized operation: {requested}")]
    UnrecognizedRequest { requested: String },

    #[error("request superseded by a newer scan request")]
    Superseded,

    // -- Output --
    #[error("failed to write scan output: {cause}")]
    ArtifactWriteFailure { cause: String },

    // -- Configuration --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScanError {
    /// Build an [`ScanError::ArtifactWriteFailure`] from any displayable cause.
    pub fn write_failure(cause: impl std::fmt::Display) -> Self {
        Self::ArtifactWriteFailure {
            cause: cause.to_string(),
        }
    }

    /// Stable machine-readable code, echoed back to the calling layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unsupported => "UNSUPPORTED",
            Self::NoPresentationSurface => "NO_PRESENTATION_SURFACE",
            Self::Cancelled => "CANCELLED",
            Self::RecoverableCaptureFailure { .. } | Self::TerminalCaptureFailure { .. } => {
                "SCAN_FAILED"
            }
            Self::EmptyScan => "EMPTY_SCAN",
            Self::UnrecognizedRequest { .. } => "UNRECOGNIZED_OPERATION",
            Self::Superseded => "SUPERSEDED",
            Self::ArtifactWriteFailure { .. } | Self::Io(_) => "WRITE_FAILED",
            Self::Config(_) | Self::Serialization(_) => "CONFIG",
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
