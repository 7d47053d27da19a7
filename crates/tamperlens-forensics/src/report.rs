// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Directory scan report, persisted as pretty-printed JSON.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tamperlens_core::error::Result;
use tamperlens_core::{DocumentDetails, Finding, Verdict};
use tracing::info;

use crate::batch::{BatchEntry, Outcome};

/// File name the CLI writes into a scanned directory by default.
pub const DEFAULT_REPORT_NAME: &str = "forensic_report.json";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForensicReport {
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    pub summary: Summary,
    pub entries: Vec<ReportEntry>,
}

/// Document counts per verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub safe: usize,
    pub suspicious: usize,
    pub likely_tampered: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    /// File name without the directory.
    pub file: String,
    pub path: String,
    pub sha256: Option<String>,
    pub score: Option<u32>,
    pub verdict: Option<Verdict>,
    /// One line per finding.
    pub flags: Vec<String>,
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<DocumentDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportEntry {
    fn from_batch(entry: &BatchEntry) -> Self {
        let file = entry
            .file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| entry.file.display().to_string());
        let path = entry.file.display().to_string();

        match &entry.outcome {
            Outcome::Inspected(inspection) => Self {
                file,
                path,
                sha256: Some(inspection.details.sha256.clone()),
                score: Some(inspection.record.suspicion_score),
                verdict: Some(inspection.record.verdict),
                flags: inspection
                    .record
                    .findings
                    .iter()
                    .map(|finding| finding.description().to_owned())
                    .collect(),
                findings: inspection.record.findings.clone(),
                details: Some(inspection.details.clone()),
                error: None,
            },
            Outcome::Failed { error } => Self {
                file,
                path,
                sha256: None,
                score: None,
                verdict: None,
                flags: Vec::new(),
                findings: Vec::new(),
                details: None,
                error: Some(error.clone()),
            },
        }
    }
}

impl ForensicReport {
    pub fn from_entries(entries: &[BatchEntry], generated_at: DateTime<Utc>) -> Self {
        let entries: Vec<ReportEntry> = entries.iter().map(ReportEntry::from_batch).collect();
        let mut summary = Summary {
            total: entries.len(),
            ..Summary::default()
        };
        for entry in &entries {
            match entry.verdict {
                Some(Verdict::Safe) => summary.safe += 1,
                Some(Verdict::Suspicious) => summary.suspicious += 1,
                Some(Verdict::LikelyTampered) => summary.likely_tampered += 1,
                None => summary.failed += 1,
            }
        }

        Self {
            generated_at,
            tool_version: env!("CARGO_PKG_VERSION").to_owned(),
            summary,
            entries,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), documents = self.entries.len(), "Report written");
        Ok(())
    }
}
