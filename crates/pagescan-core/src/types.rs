// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagescan bridge.

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ScanError};

/// Identifies one in-flight scan request context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encoding used for images mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageEncoding {
    Jpeg,
    Png,
}

impl ImageEncoding {
    /// File extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// The output shape a caller asked for. Fixed for the lifetime of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputRequest {
    /// One JPEG file per page.
    ImagesAsJpeg,
    /// One PNG file per page.
    ImagesAsPng,
    /// A single multi-page PDF.
    SingleDocument,
}

/// File extension of the assembled document.
pub const DOCUMENT_EXTENSION: &str = "pdf";

impl OutputRequest {
    /// Resolve a request kind sent by the calling application.
    ///
    /// Accepts the snake_case names and the camelCase method names used by the
    /// mobile plugin layer. Anything else is rejected with
    /// [`ScanError::UnrecognizedRequest`] carrying the exact string.
    pub fn from_method(method: &str) -> Result<Self> {
        match method {
            "scan_as_images" | "getScannedDocumentAsImages" => Ok(Self::ImagesAsJpeg),
            "scan_as_png" | "getScanDocuments" | "getScanDocumentsUri" => Ok(Self::ImagesAsPng),
            "scan_as_pdf" | "getScannedDocumentAsPdf" => Ok(Self::SingleDocument),
            other => Err(ScanError::UnrecognizedRequest {
                requested: other.to_string(),
            }),
        }
    }

    /// Image encoding for images mode, `None` in document mode.
    pub fn image_encoding(&self) -> Option<ImageEncoding> {
        match self {
            Self::ImagesAsJpeg => Some(ImageEncoding::Jpeg),
            Self::ImagesAsPng => Some(ImageEncoding::Png),
            Self::SingleDocument => None,
        }
    }
}

impl std::fmt::Display for OutputRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ImagesAsJpeg => "images/jpeg",
            Self::ImagesAsPng => "images/png",
            Self::SingleDocument => "document/pdf",
        };
        f.write_str(name)
    }
}

/// Per-run naming key: capture time as `YYYYMMDD-HHMMSS`.
///
/// Second granularity only; two runs within the same second share a token
/// and the later one overwrites the earlier files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunToken(String);

impl RunToken {
    /// Token for the current local time.
    pub fn now() -> Self {
        Self::from_datetime(Local::now().naive_local())
    }

    pub fn from_datetime(at: NaiveDateTime) -> Self {
        Self(at.format("%Y%m%d-%H%M%S").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of page `index` in images mode.
    pub fn image_file_name(&self, index: usize, encoding: ImageEncoding) -> String {
        format!("{}-{}.{}", self.0, index, encoding.extension())
    }

    /// File name of the assembled document.
    pub fn document_file_name(&self) -> String {
        format!("{}.{}", self.0, DOCUMENT_EXTENSION)
    }
}

impl std::fmt::Display for RunToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One image file written in images mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenImage {
    /// Position of the page in the original scan order.
    pub index: usize,
    pub path: PathBuf,
    pub bytes_written: u64,
}

/// What a successful pipeline run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanArtifact {
    /// Images mode — successfully written pages, in scan order.
    Images(Vec<WrittenImage>),
    /// Document mode — one file holding every page.
    Document { path: PathBuf, page_count: usize },
}

impl ScanArtifact {
    /// Every path produced, in scan order.
    pub fn paths(&self) -> Vec<PathBuf> {
        match self {
            Self::Images(images) => images.iter().map(|img| img.path.clone()).collect(),
            Self::Document { path, .. } => vec![path.clone()],
        }
    }
}

/// A failure reported by the capture UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureFailure {
    /// Error domain of the platform component (e.g. an NSError domain).
    pub domain: String,
    pub code: i64,
    pub description: String,
}

impl CaptureFailure {
    pub fn new(domain: impl Into<String>, code: i64, description: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            code,
            description: description.into(),
        }
    }
}

impl std::fmt::Display for CaptureFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} {})", self.description, self.domain, self.code)
    }
}

/// Retry eligibility of a capture failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureClass {
    /// Transient buffer/geometry problem; the user may be offered a retry.
    Recoverable,
    /// Anything else — surfaced as-is.
    Terminal,
}
