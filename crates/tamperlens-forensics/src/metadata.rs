// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metadata consistency checks: creation/modification timestamps and editing
// tool signatures in the producer/creator strings.

use chrono::TimeDelta;
use tamperlens_core::config::ForensicsConfig;
use tamperlens_core::{DocumentMetadata, Evidence, Finding, MetadataField};
use tracing::{debug, instrument};

/// A tool signature with its pattern pre-lowercased and weight resolved.
#[derive(Debug, Clone)]
struct Signature {
    pattern: String,
    tool: String,
    severity: u32,
}

/// Emits metadata findings. Every rule is evaluated independently; absent
/// fields never produce a finding.
#[derive(Debug, Clone)]
pub struct MetadataAnalyzer {
    max_gap: TimeDelta,
    gap_severity: u32,
    inversion_severity: u32,
    signatures: Vec<Signature>,
}

impl MetadataAnalyzer {
    pub fn new(config: &ForensicsConfig) -> Self {
        let rules = &config.metadata;
        let weights = &config.severity;
        Self {
            max_gap: TimeDelta::try_hours(rules.max_modification_gap_hours)
                .unwrap_or(TimeDelta::MAX),
            gap_severity: weights.weight(rules.date_gap_severity),
            inversion_severity: weights.weight(rules.date_inversion_severity),
            signatures: rules
                .tool_signatures
                .iter()
                .map(|sig| Signature {
                    pattern: sig.pattern.to_lowercase(),
                    tool: sig.tool.clone(),
                    severity: weights.weight(sig.severity),
                })
                .collect(),
        }
    }

    #[instrument(skip_all)]
    pub fn analyze(&self, metadata: &DocumentMetadata) -> Vec<Finding> {
        let mut findings = Vec::new();

        if let (Some(created), Some(modified)) =
            (metadata.creation_date, metadata.modification_date)
        {
            let gap = modified - created;
            if gap > self.max_gap {
                findings.push(Finding::new(
                    Evidence::ModificationLongAfterCreation {
                        created,
                        modified,
                        gap_hours: gap.num_hours(),
                    },
                    self.gap_severity,
                    format!(
                        "modification date far after creation: modified {} hours after \
                         creation ({} -> {})",
                        gap.num_hours(),
                        created.to_rfc3339(),
                        modified.to_rfc3339()
                    ),
                ));
            }
            if modified < created {
                findings.push(Finding::new(
                    Evidence::ModificationBeforeCreation { created, modified },
                    self.inversion_severity,
                    format!(
                        "modification date precedes creation date by {} minutes ({} -> {})",
                        (created - modified).num_minutes(),
                        created.to_rfc3339(),
                        modified.to_rfc3339()
                    ),
                ));
            }
        }

        let fields = [
            (MetadataField::Producer, metadata.producer.as_deref()),
            (MetadataField::Creator, metadata.creator.as_deref()),
        ];
        let lowered: Vec<(MetadataField, &str, String)> = fields
            .into_iter()
            .filter_map(|(field, value)| value.map(|v| (field, v, v.to_lowercase())))
            .collect();

        for signature in &self.signatures {
            let hit = lowered
                .iter()
                .find(|(_, _, lower)| lower.contains(&signature.pattern));
            if let Some((field, value, _)) = hit {
                debug!(tool = %signature.tool, %field, "Editing tool signature matched");
                findings.push(Finding::new(
                    Evidence::EditingTool {
                        tool: signature.tool.clone(),
                        field: *field,
                        value: (*value).to_owned(),
                    },
                    signature.severity,
                    format!(
                        "editing tool {} named in {}: \"{}\"",
                        signature.tool, field, value
                    ),
                ));
            }
        }

        debug!(findings = findings.len(), "Metadata analysis complete");
        findings
    }
}
