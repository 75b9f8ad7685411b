// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multi-page PDF assembly using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: each page is a `PdfPage` holding a
// `Vec<Op>`, images are registered once as XObjects, and the whole document is
// serialised by `PdfDocument::save()`.

use std::path::Path;

use pagescan_core::error::{Result, ScanError};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::image::page::Page;
use crate::staging::{stage, stage_dir};

/// Pages are laid out at one bitmap pixel per PDF point.
const PAGE_DPI: f32 = 72.0;

/// Ordered container that scanned pages are appended to.
///
/// Each page becomes one PDF page exactly the size of its bitmap, so the
/// document reproduces the scan without margins or scaling. Pages keep the
/// order in which they were appended.
pub struct DocumentAssembler {
    doc: PdfDocument,
    pages: Vec<PdfPage>,
}

impl DocumentAssembler {
    /// Start an empty document with the given `/Title`.
    pub fn new(title: &str) -> Self {
        Self {
            doc: PdfDocument::new(title),
            pages: Vec::new(),
        }
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Convert `page` into a PDF page and append it at the end.
    pub fn append_page(&mut self, page: &Page) {
        let width = page.width() as usize;
        let height = page.height() as usize;

        let rgb = page.as_dynamic().to_rgb8();
        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width,
            height,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = self.doc.add_image(&raw);

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: None,
                scale_y: None,
                dpi: Some(PAGE_DPI),
                rotate: None,
            },
        }];

        let page_w = px_to_mm(width);
        let page_h = px_to_mm(height);
        self.pages.push(PdfPage::new(page_w, page_h, ops));

        debug!(
            index = self.pages.len() - 1,
            width, height, "Page appended to document"
        );
    }

    /// Serialise the document.
    pub fn finish(mut self) -> Vec<u8> {
        let page_count = self.pages.len();
        self.doc.with_pages(self.pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = self.doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "PDF serialisation produced warnings");
        }
        debug!(page_count, bytes = output.len(), "Document serialised");
        output
    }

    /// Serialise the document and write it to `path`.
    ///
    /// The bytes are staged beside `path` and renamed into place, so `path`
    /// only ever holds a complete document. Returns the number of pages
    /// written; any I/O failure is reported as
    /// [`ScanError::ArtifactWriteFailure`].
    #[instrument(skip_all, fields(path = %path.as_ref().display(), pages = self.pages.len()))]
    pub fn write_to(self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let page_count = self.page_count();
        let bytes = self.finish();

        let fail = |err: std::io::Error| {
            ScanError::write_failure(format!("failed to write {}: {}", path.display(), err))
        };
        stage(stage_dir(path), &bytes)
            .map_err(fail)?
            .persist(path)
            .map_err(|err| fail(err.error))?;

        info!(page_count, bytes = bytes.len(), "Wrote scan document");
        Ok(page_count)
    }
}

fn px_to_mm(px: usize) -> Mm {
    Mm(px as f32 / PAGE_DPI * 25.4)
}
