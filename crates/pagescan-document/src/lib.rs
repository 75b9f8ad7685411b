// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagescan-document — the scan-result pipeline.
//
// Takes the ordered pages returned by the capture UI, bounds their size,
// encodes them, and writes either one image file per page or a single
// multi-page PDF.

pub mod image;
pub mod pdf;
pub mod pipeline;
mod staging;

pub use self::image::page::Page;
pub use pdf::reader::PdfInspector;
pub use pdf::writer::DocumentAssembler;
pub use pipeline::{CancelFlag, ScanPipeline};
