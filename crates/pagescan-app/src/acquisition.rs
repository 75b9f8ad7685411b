// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop acquisition: "capturing" means loading page images from disk.
//
// Each input is either an image file or a directory; directories contribute
// their image files in file-name order. Every presentation re-reads the inputs,
// so a retry starts from a clean slate.

use std::path::{Path, PathBuf};

use ::image::ImageFormat;
use pagescan_bridge::{CaptureOutcome, ScanAcquisition};
use pagescan_core::CaptureFailure;
use pagescan_document::Page;
use tracing::{debug, info, warn};

/// Error domain for failures raised while loading pages from disk.
pub const DIRECTORY_DOMAIN: &str = "pagescan.directory";

const CODE_LIST: i64 = 1;
const CODE_DECODE: i64 = 2;
const CODE_TASK: i64 = 3;

#[derive(Debug, Clone)]
pub struct DirectoryAcquisition {
    inputs: Vec<PathBuf>,
}

impl DirectoryAcquisition {
    pub fn new(inputs: Vec<PathBuf>) -> Self {
        Self { inputs }
    }

    /// Expand the inputs into the ordered list of page files.
    pub fn page_files(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for input in &self.inputs {
            if input.is_dir() {
                let mut entries: Vec<PathBuf> = std::fs::read_dir(input)?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|path| path.is_file() && is_page_image(path))
                    .collect();
                entries.sort();
                debug!(dir = %input.display(), pages = entries.len(), "pages found in directory");
                files.extend(entries);
            } else {
                files.push(input.clone());
            }
        }
        Ok(files)
    }

    fn load_pages(&self) -> Result<Vec<Page>, CaptureFailure> {
        let files = self
            .page_files()
            .map_err(|err| CaptureFailure::new(DIRECTORY_DOMAIN, CODE_LIST, err.to_string()))?;

        files
            .iter()
            .map(|path| {
                Page::open(path).map_err(|err| {
                    CaptureFailure::new(
                        DIRECTORY_DOMAIN,
                        CODE_DECODE,
                        format!("{}: {err}", path.display()),
                    )
                })
            })
            .collect()
    }
}

fn is_page_image(path: &Path) -> bool {
    ImageFormat::from_path(path).is_ok_and(|format| format.reading_enabled())
}

impl ScanAcquisition for DirectoryAcquisition {
    fn platform_name(&self) -> &str {
        "Desktop (files)"
    }

    fn is_capture_supported(&self) -> bool {
        !self.inputs.is_empty()
    }

    async fn present_capture_ui(&self) -> CaptureOutcome {
        let this = self.clone();
        match tokio::task::spawn_blocking(move || this.load_pages()).await {
            Ok(Ok(pages)) => {
                info!(pages = pages.len(), "pages loaded from disk");
                CaptureOutcome::Captured(pages)
            }
            Ok(Err(failure)) => {
                warn!(%failure, "failed to load pages");
                CaptureOutcome::Failed(failure)
            }
            Err(err) => CaptureOutcome::Failed(CaptureFailure::new(
                DIRECTORY_DOMAIN,
                CODE_TASK,
                err.to_string(),
            )),
        }
    }
}
