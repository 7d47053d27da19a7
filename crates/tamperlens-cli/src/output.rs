// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Console rendering of a directory report.

use tabled::settings::Style;
use tabled::{Table, Tabled};
use tamperlens_forensics::report::{ForensicReport, ReportEntry, Summary};

#[derive(Debug, Tabled)]
struct SummaryRow {
    #[tabled(rename = "Filename")]
    file: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Verdict")]
    verdict: String,
}

impl From<&ReportEntry> for SummaryRow {
    fn from(entry: &ReportEntry) -> Self {
        let verdict = match (&entry.verdict, &entry.error) {
            (Some(verdict), _) => verdict.label().to_owned(),
            (None, Some(error)) => format!("Error: {error}"),
            (None, None) => "Error".to_owned(),
        };
        Self {
            file: entry.file.clone(),
            score: entry.score.map_or_else(|| "-".to_owned(), |score| score.to_string()),
            verdict,
        }
    }
}

/// `Filename | Score | Verdict`, one row per document.
pub fn summary_table(report: &ForensicReport) -> String {
    let rows: Vec<SummaryRow> = report.entries.iter().map(SummaryRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

pub fn summary_line(summary: &Summary) -> String {
    format!(
        "{} document(s): {} safe, {} suspicious, {} likely tampered, {} failed",
        summary.total, summary.safe, summary.suspicious, summary.likely_tampered, summary.failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use chrono::Utc;
    use tamperlens_core::{DocumentDetails, Inspection, Verdict, VerdictRecord};
    use tamperlens_forensics::{BatchEntry, Outcome};

    fn report() -> ForensicReport {
        let inspected = BatchEntry {
            file: PathBuf::from("/in/receipt.pdf"),
            outcome: Outcome::Inspected(Inspection {
                record: VerdictRecord {
                    file_path: "/in/receipt.pdf".into(),
                    suspicion_score: 2,
                    verdict: Verdict::Suspicious,
                    findings: Vec::new(),
                },
                details: DocumentDetails::default(),
            }),
        };
        let failed = BatchEntry {
            file: PathBuf::from("/in/broken.pdf"),
            outcome: Outcome::Failed {
                error: "PDF operation failed: bad xref".into(),
            },
        };
        ForensicReport::from_entries(&[inspected, failed], Utc::now())
    }

    #[test]
    fn table_has_headers_and_rows() {
        let table = summary_table(&report());
        for needle in ["Filename", "Score", "Verdict", "receipt.pdf", "Suspicious", "broken.pdf"] {
            assert!(table.contains(needle), "missing {needle} in\n{table}");
        }
        assert!(table.contains("Error: PDF operation failed: bad xref"));
    }

    #[test]
    fn summary_line_counts() {
        assert_eq!(
            summary_line(&report().summary),
            "2 document(s): 0 safe, 1 suspicious, 0 likely tampered, 1 failed"
        );
    }
}
