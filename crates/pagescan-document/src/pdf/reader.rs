// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF inspection — page count and page geometry of an assembled scan, read
// back with `lopdf`.

use std::collections::HashSet;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument};

/// Read-only view over a PDF produced by the pipeline.
pub struct PdfInspector {
    document: Document,
}

impl PdfInspector {
    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, lopdf::Error> {
        let document = Document::load(path.as_ref())?;
        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self { document })
    }

    /// Load a PDF already in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self, lopdf::Error> {
        let document = Document::load_mem(data)?;
        Ok(Self { document })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// `(width, height)` in points of every page, in page order.
    ///
    /// Pages without a resolvable `/MediaBox` are reported as `None`.
    pub fn page_sizes(&self) -> Vec<Option<(f32, f32)>> {
        // get_pages() is keyed by 1-based page number, so iteration is in
        // document order.
        self.document
            .get_pages()
            .values()
            .map(|&page_id| self.media_box_size(page_id))
            .collect()
    }

    /// Walk from the page up its `/Parent` chain until a `/MediaBox` is found.
    ///
    /// A chain that revisits a node has no box.
    fn media_box_size(&self, page_id: ObjectId) -> Option<(f32, f32)> {
        let mut visited = HashSet::from([page_id]);
        let mut current = self.document.get_dictionary(page_id).ok()?;
        loop {
            if let Some(size) = self.media_box_of(current) {
                return Some(size);
            }
            let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
            if !visited.insert(parent) {
                debug!(?parent, "cycle in page tree /Parent chain");
                return None;
            }
            current = self.document.get_dictionary(parent).ok()?;
        }
    }

    fn media_box_of(&self, dict: &Dictionary) -> Option<(f32, f32)> {
        let entry = self.resolve(dict.get(b"MediaBox").ok()?)?;
        let values: Vec<f32> = entry
            .as_array()
            .ok()?
            .iter()
            .filter_map(|obj| self.resolve(obj)?.as_float().ok())
            .collect();
        match values.as_slice() {
            [x0, y0, x1, y1] => Some(((x1 - x0).abs(), (y1 - y0).abs())),
            _ => None,
        }
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(id) => self.document.get_object(*id).ok(),
            other => Some(other),
        }
    }
}
