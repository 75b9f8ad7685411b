// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Pagescan — bridge between the native document-scanner UI and the result
//! pipeline.
//!
//! The native side is reached through the [`traits::ScanAcquisition`] and
//! [`traits::RetryPrompt`] traits. [`session::ScanSession`] owns the request
//! flow: availability checks, one suspend point per capture attempt, failure
//! classification with a capped retry, and exactly one outcome per request.

pub mod classify;
pub mod session;
pub mod stub;
pub mod traits;

pub use classify::{FailureClassifier, PatternClassifier};
pub use session::ScanSession;
pub use stub::StubAcquisition;
pub use traits::{CaptureOutcome, NoRetryPrompt, RetryPrompt, ScanAcquisition};
