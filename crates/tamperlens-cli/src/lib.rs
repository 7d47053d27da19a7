// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// tamperlens-cli: argument parsing, exit status, and the single-file and
// directory commands behind the `tamperlens` binary.

pub mod inspect;
pub mod output;

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Parser;
use tamperlens_core::Verdict;
use tamperlens_forensics::report::Summary;

/// Flag PDFs whose metadata, structure, or embedded images suggest they were
/// edited after creation.
#[derive(Debug, Clone, Parser)]
#[command(name = "tamperlens", version)]
pub struct Args {
    /// A PDF file, or a directory whose *.pdf files are all inspected.
    pub path: PathBuf,

    /// JSON configuration (severity weights, thresholds, tool signatures, ELA tunables).
    #[arg(short, long, env = "TAMPERLENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where to write the directory report [default: <DIR>/forensic_report.json].
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Documents analysed concurrently in directory mode.
    #[arg(short, long, default_value_t = default_jobs())]
    pub jobs: usize,

    /// Write an ELA heatmap PNG for every analysed image into this directory.
    #[arg(long)]
    pub ela_dir: Option<PathBuf>,

    /// Log at debug level (RUST_LOG still takes precedence).
    #[arg(short, long)]
    pub verbose: bool,
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}

// ---------------------------------------------------------------------------
// Exit status
// ---------------------------------------------------------------------------

/// Process exit status.
///
/// | Code | Meaning                                                        |
/// |------|----------------------------------------------------------------|
/// | 0    | Every document was inspected and is Safe                       |
/// | 1    | A document is Suspicious or worse, or could not be inspected   |
/// | 2    | Fatal error (configuration, missing path, unreadable file)     |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    Clean = 0,
    Flagged = 1,
    Fatal = 2,
}

impl ExitStatus {
    pub fn from_verdicts(verdicts: impl IntoIterator<Item = Verdict>) -> Self {
        if verdicts.into_iter().any(|verdict| verdict != Verdict::Safe) {
            Self::Flagged
        } else {
            Self::Clean
        }
    }

    /// Directory mode: a document that failed to parse is never clean.
    pub fn from_summary(summary: &Summary) -> Self {
        if summary.suspicious + summary.likely_tampered + summary.failed > 0 {
            Self::Flagged
        } else {
            Self::Clean
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "tamperlens",
            "scans",
            "--jobs",
            "3",
            "--ela-dir",
            "heat",
            "-v",
        ])
        .expect("valid arguments");
        assert_eq!(args.path, PathBuf::from("scans"));
        assert_eq!(args.jobs, 3);
        assert_eq!(args.ela_dir, Some(PathBuf::from("heat")));
        assert!(args.verbose);
        assert!(args.report.is_none());
    }

    #[test]
    fn path_is_required() {
        assert!(Args::try_parse_from(["tamperlens"]).is_err());
    }

    #[test]
    fn exit_status_from_verdicts() {
        assert_eq!(ExitStatus::from_verdicts([]), ExitStatus::Clean);
        assert_eq!(
            ExitStatus::from_verdicts([Verdict::Safe, Verdict::Safe]),
            ExitStatus::Clean
        );
        assert_eq!(
            ExitStatus::from_verdicts([Verdict::Safe, Verdict::Suspicious]),
            ExitStatus::Flagged
        );
        assert_eq!(
            ExitStatus::from_verdicts([Verdict::LikelyTampered]),
            ExitStatus::Flagged
        );
    }

    #[test]
    fn exit_status_from_summary() {
        let clean = Summary {
            total: 2,
            safe: 2,
            ..Summary::default()
        };
        assert_eq!(ExitStatus::from_summary(&clean), ExitStatus::Clean);
        assert_eq!(
            ExitStatus::from_summary(&Summary::default()),
            ExitStatus::Clean
        );

        let all_failed = Summary {
            total: 3,
            failed: 3,
            ..Summary::default()
        };
        assert_eq!(ExitStatus::from_summary(&all_failed), ExitStatus::Flagged);

        let suspicious = Summary {
            total: 1,
            suspicious: 1,
            ..Summary::default()
        };
        assert_eq!(ExitStatus::from_summary(&suspicious), ExitStatus::Flagged);
    }
}
