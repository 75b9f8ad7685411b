// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Size normalization — bounds per-page memory and encoding cost before a page
// is encoded.

use ::image::imageops::FilterType;
use tracing::{debug, instrument};

use super::page::Page;

/// Dimensions a `width` x `height` page should be resampled to so that neither
/// side exceeds `max_dimension`.
///
/// Returns `None` when the page is already within bounds (or when no sensible
/// target exists, e.g. a zero-sized page); callers keep the page unchanged.
/// Otherwise the larger side becomes exactly `max_dimension` and the smaller
/// side is `round(other * max / larger)`, never less than one pixel.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 || max_dimension == 0 {
        return None;
    }
    if width <= max_dimension && height <= max_dimension {
        return None;
    }

    let larger = u64::from(width.max(height));
    let max = u64::from(max_dimension);
    // Integer round-half-up of other * max / larger.
    let scale = |other: u32| -> u32 {
        let scaled = (u64::from(other) * max + larger / 2) / larger;
        scaled.max(1) as u32
    };

    if width >= height {
        Some((max_dimension, scale(height)))
    } else {
        Some((scale(width), max_dimension))
    }
}

/// Scale `page` down so its larger side is at most `max_dimension`, preserving
/// aspect ratio. Pages already within bounds are returned untouched.
///
/// Never fails: when no target size can be computed the original bitmap is
/// kept.
#[instrument(skip(page), fields(width = page.width(), height = page.height()))]
pub fn normalize(page: Page, max_dimension: u32) -> Page {
    let Some((new_w, new_h)) = target_dimensions(page.width(), page.height(), max_dimension)
    else {
        return page;
    };

    let resized = page
        .into_dynamic()
        .resize_exact(new_w, new_h, FilterType::Lanczos3);
    debug!(new_w, new_h, "Page normalized");
    Page::from_dynamic(resized)
}
