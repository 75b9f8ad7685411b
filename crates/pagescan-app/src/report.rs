// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable summary of a finished scan.

use std::fmt::Write;

use pagescan_core::ScanArtifact;
use pagescan_document::PdfInspector;
use tracing::warn;

/// Render one line per written file.
///
/// For a document, the page count and sizes are read back from the file.
pub fn summarize(artifact: &ScanArtifact) -> String {
    let mut out = String::new();
    match artifact {
        ScanArtifact::Images(images) => {
            let _ = writeln!(out, "{} image(s) written", images.len());
            for image in images {
                let _ = writeln!(
                    out,
                    "  page {}: {} ({} bytes)",
                    image.index + 1,
                    image.path.display(),
                    image.bytes_written
                );
            }
        }
        ScanArtifact::Document { path, page_count } => {
            let _ = writeln!(out, "{} ({page_count} page(s))", path.display());
            match PdfInspector::open(path) {
                Ok(pdf) => {
                    for (i, size) in pdf.page_sizes().into_iter().enumerate() {
                        if let Some((w, h)) = size {
                            let _ = writeln!(out, "  page {}: {w:.0} x {h:.0} pt", i + 1);
                        }
                    }
                }
                Err(err) => warn!(path = %path.display(), error = %err, "could not read back document"),
            }
        }
    }
    out
}
