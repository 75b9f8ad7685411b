// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture failure classification.
//
// Decides whether a failure reported by the platform scanner is worth offering
// the user a retry for. The platform's error messages are not a stable API,
// so the matching is heuristic and may misclassify; the rules are data, not
// code, so hosts can adjust them without a release.

use pagescan_core::config::RecoverableRule;
use pagescan_core::{CaptureFailure, FailureClass, ScanConfig};
use tracing::debug;

/// Classifies a capture failure as recoverable or terminal.
pub trait FailureClassifier: Send + Sync {
    fn classify(&self, failure: &CaptureFailure) -> FailureClass;
}

impl<F> FailureClassifier for F
where
    F: Fn(&CaptureFailure) -> FailureClass + Send + Sync,
{
    fn classify(&self, failure: &CaptureFailure) -> FailureClass {
        self(failure)
    }
}

/// Rule-driven classifier. A failure is recoverable when any rule matches.
#[derive(Debug, Clone)]
pub struct PatternClassifier {
    rules: Vec<LoweredRule>,
}

#[derive(Debug, Clone)]
struct LoweredRule {
    domain: Option<String>,
    needle: Option<String>,
}

impl PatternClassifier {
    pub fn new(rules: &[RecoverableRule]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| LoweredRule {
                domain: rule.domain.clone(),
                needle: rule
                    .description_contains
                    .as_ref()
                    .map(|s| s.to_lowercase()),
            })
            .collect();
        Self { rules }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(&config.recoverable_rules)
    }
}

impl FailureClassifier for PatternClassifier {
    fn classify(&self, failure: &CaptureFailure) -> FailureClass {
        let description = failure.description.to_lowercase();
        let matched = self.rules.iter().position(|rule| {
            // A rule with no criteria matches nothing.
            if rule.domain.is_none() && rule.needle.is_none() {
                return false;
            }
            let domain_ok = rule.domain.as_deref().is_none_or(|d| d == failure.domain);
            let needle_ok = rule
                .needle
                .as_deref()
                .is_none_or(|n| description.contains(n));
            domain_ok && needle_ok
        });

        match matched {
            Some(rule) => {
                debug!(rule, domain = %failure.domain, "capture failure classified as recoverable");
                FailureClass::Recoverable
            }
            None => {
                debug!(domain = %failure.domain, code = failure.code, "capture failure classified as terminal");
                FailureClass::Terminal
            }
        }
    }
}
