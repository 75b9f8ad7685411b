// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// A single captured page bitmap.

use ::image::{DynamicImage, ImageError};
use tracing::{debug, instrument};

/// One physically scanned sheet, as returned by the capture UI.
///
/// The pipeline takes ownership of each page for one run and drops it as soon
/// as it has been encoded.
#[derive(Debug, Clone)]
pub struct Page {
    image: DynamicImage,
}

impl Page {
    /// Wrap an already-decoded bitmap.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Load a page from an image file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, ImageError> {
        let image = ::image::open(path.as_ref())?;
        debug!(
            width = image.width(),
            height = image.height(),
            "Page loaded"
        );
        Ok(Self { image })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }
}

impl From<DynamicImage> for Page {
    fn from(image: DynamicImage) -> Self {
        Self::from_dynamic(image)
    }
}
