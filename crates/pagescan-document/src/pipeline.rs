// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output dispatch — routes a captured page sequence to the images writer or the
// document assembler.
//
// Images mode degrades to fewer files when a single page cannot be encoded or
// written. Document mode fails the whole run when the document cannot be
// written. Outputs are staged and only renamed into place once the run has
// finished without being cancelled.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pagescan_core::error::{Result, ScanError};
use pagescan_core::{ImageEncoding, OutputRequest, RunToken, ScanArtifact, ScanConfig, WrittenImage};
use tracing::{debug, info, instrument, warn};

use crate::image::encode::encode_page;
use crate::image::normalize::normalize;
use crate::image::page::Page;
use crate::pdf::writer::DocumentAssembler;
use crate::staging::stage;

/// Shared flag that stops a pipeline run at the next page boundary.
///
/// A cancelled run writes nothing to its final paths and ends with
/// [`ScanError::Superseded`].
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            info!("Scan pipeline cancelled, discarding outputs");
            return Err(ScanError::Superseded);
        }
        Ok(())
    }
}

/// Synchronous, sequential result pipeline. Holds no state between runs.
#[derive(Debug, Clone)]
pub struct ScanPipeline {
    config: ScanConfig,
}

impl ScanPipeline {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn documents_dir(&self) -> &Path {
        &self.config.documents_dir
    }

    /// Process one run's pages in scan order.
    ///
    /// `token` names every artifact of the run. Pages are consumed one at a
    /// time so that at most one normalized bitmap is alive in images mode.
    pub fn process(
        &self,
        pages: Vec<Page>,
        request: OutputRequest,
        token: &RunToken,
    ) -> Result<ScanArtifact> {
        self.process_cancellable(pages, request, token, &CancelFlag::new())
    }

    /// [`process`](Self::process), checking `cancel` between pages and once
    /// more before any output is moved into place.
    #[instrument(skip_all, fields(pages = pages.len(), %request, %token))]
    pub fn process_cancellable(
        &self,
        pages: Vec<Page>,
        request: OutputRequest,
        token: &RunToken,
        cancel: &CancelFlag,
    ) -> Result<ScanArtifact> {
        if pages.is_empty() {
            return Err(ScanError::EmptyScan);
        }

        let dir = self.documents_dir();
        std::fs::create_dir_all(dir).map_err(|err| {
            ScanError::write_failure(format!(
                "cannot create documents directory {}: {}",
                dir.display(),
                err
            ))
        })?;

        let normalize_pages = self.config.normalize.applies_to(request);
        let artifact = match request.image_encoding() {
            Some(encoding) => ScanArtifact::Images(self.write_images(
                pages,
                encoding,
                normalize_pages,
                token,
                cancel,
            )?),
            None => {
                let (path, page_count) =
                    self.write_document(pages, normalize_pages, token, cancel)?;
                ScanArtifact::Document { path, page_count }
            }
        };

        info!(outputs = artifact.paths().len(), "Scan pipeline finished");
        Ok(artifact)
    }

    /// Encode and write each page to `<dir>/<token>-<index>.<ext>`.
    ///
    /// A page that fails to encode or write is skipped; the result lists only
    /// the files actually written, in scan order.
    fn write_images(
        &self,
        pages: Vec<Page>,
        encoding: ImageEncoding,
        normalize_pages: bool,
        token: &RunToken,
        cancel: &CancelFlag,
    ) -> Result<Vec<WrittenImage>> {
        let dir = self.documents_dir();
        let mut staged = Vec::with_capacity(pages.len());

        for (index, page) in pages.into_iter().enumerate() {
            cancel.check()?;
            let page = self.prepare(page, normalize_pages);

            let bytes = match encode_page(page.as_dynamic(), encoding, self.config.jpeg_quality) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(index, error = %err, "Page encoding failed, skipping");
                    continue;
                }
            };

            match stage(dir, &bytes) {
                Ok(temp) => staged.push((index, temp, bytes.len() as u64)),
                Err(err) => warn!(index, error = %err, "Page write failed, skipping"),
            }
        }

        // Dropping `staged` on this early return removes every staged page.
        cancel.check()?;

        let mut written = Vec::with_capacity(staged.len());
        for (index, temp, bytes_written) in staged {
            let path = dir.join(token.image_file_name(index, encoding));
            if let Err(err) = temp.persist(&path) {
                warn!(index, path = %path.display(), error = %err, "Page write failed, skipping");
                continue;
            }
            debug!(index, bytes = bytes_written, path = %path.display(), "Page written");
            written.push(WrittenImage {
                index,
                path,
                bytes_written,
            });
        }

        Ok(written)
    }

    /// Append every page, in order, to one PDF at `<dir>/<token>.pdf`.
    fn write_document(
        &self,
        pages: Vec<Page>,
        normalize_pages: bool,
        token: &RunToken,
        cancel: &CancelFlag,
    ) -> Result<(PathBuf, usize)> {
        let mut assembler = DocumentAssembler::new(&format!("Scan {token}"));
        for page in pages {
            cancel.check()?;
            let page = self.prepare(page, normalize_pages);
            assembler.append_page(&page);
        }
        cancel.check()?;

        let path = self.documents_dir().join(token.document_file_name());
        let page_count = assembler.write_to(&path)?;
        Ok((path, page_count))
    }

    fn prepare(&self, page: Page, normalize_pages: bool) -> Page {
        if normalize_pages {
            normalize(page, self.config.max_dimension)
        } else {
            page
        }
    }
}
