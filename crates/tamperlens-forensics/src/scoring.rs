// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scoring aggregator: sums finding severities and maps the score to a verdict.

use tamperlens_core::config::{ForensicsConfig, VerdictThresholds};
use tamperlens_core::{Finding, Verdict, VerdictRecord};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ScoringAggregator {
    thresholds: VerdictThresholds,
}

impl ScoringAggregator {
    pub fn new(config: &ForensicsConfig) -> Self {
        Self {
            thresholds: config.verdict,
        }
    }

    /// Sum of severities. Saturates rather than wrapping.
    pub fn score(findings: &[Finding]) -> u32 {
        findings
            .iter()
            .fold(0u32, |total, finding| total.saturating_add(finding.severity()))
    }

    /// Build the verdict record. Findings keep the order they were given in.
    pub fn aggregate(&self, file_path: impl Into<String>, findings: Vec<Finding>) -> VerdictRecord {
        let suspicion_score = Self::score(&findings);
        let verdict = Verdict::from_score(suspicion_score, &self.thresholds);
        debug!(suspicion_score, %verdict, findings = findings.len(), "Findings aggregated");
        VerdictRecord {
            file_path: file_path.into(),
            suspicion_score,
            verdict,
            findings,
        }
    }
}
