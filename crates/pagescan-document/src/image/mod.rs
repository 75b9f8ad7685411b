// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — captured pages, size normalization and per-page encoding.

pub mod encode;
pub mod normalize;
pub mod page;

pub use encode::encode_page;
pub use normalize::{normalize, target_dimensions};
pub use page::Page;
