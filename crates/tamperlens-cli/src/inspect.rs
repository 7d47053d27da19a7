// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command execution: load configuration, then inspect one file or scan a
// directory, write the report, and optionally export ELA heatmaps.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tamperlens_core::config::ForensicsConfig;
use tamperlens_core::error::{Result, TamperError};
use tamperlens_document::{PdfReader, codec};
use tamperlens_forensics::batch::discover_pdfs;
use tamperlens_forensics::report::DEFAULT_REPORT_NAME;
use tamperlens_forensics::{BatchScanner, ForensicReport, Inspector};
use tracing::{debug, info, instrument, warn};

use crate::{Args, ExitStatus, output};

/// Run the command described by `args`.
pub async fn run(args: Args) -> Result<ExitStatus> {
    let config = match &args.config {
        Some(path) => {
            let config = ForensicsConfig::load(path)?;
            info!(path = %path.display(), "Configuration loaded");
            config
        }
        None => ForensicsConfig::default(),
    };
    let inspector = Arc::new(Inspector::new(config)?);

    if args.path.is_dir() {
        scan_directory(&args, inspector).await
    } else if args.path.is_file() {
        inspect_file(&args, &inspector)
    } else {
        Err(TamperError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} does not exist", args.path.display()),
        )))
    }
}

// -- Single file ---------------------------------------------------------------

/// Print the full inspection of one PDF as JSON on stdout.
fn inspect_file(args: &Args, inspector: &Inspector) -> Result<ExitStatus> {
    let inspection = inspector.inspect_path(&args.path)?;
    println!("{}", serde_json::to_string_pretty(&inspection)?);

    if let Some(dir) = &args.ela_dir {
        let written = export_all(inspector, std::slice::from_ref(&args.path), dir)?;
        info!(dir = %dir.display(), written, "ELA heatmaps exported");
    }

    Ok(ExitStatus::from_verdicts([inspection.record.verdict]))
}

// -- Directory -----------------------------------------------------------------

async fn scan_directory(args: &Args, inspector: Arc<Inspector>) -> Result<ExitStatus> {
    let paths = discover_pdfs(&args.path)?;
    if paths.is_empty() {
        warn!(dir = %args.path.display(), "No PDF files found");
    }

    let scanner = BatchScanner::new(Arc::clone(&inspector), args.jobs);
    let entries = scanner.scan(paths).await;
    let report = ForensicReport::from_entries(&entries, Utc::now());

    let report_path = args
        .report
        .clone()
        .unwrap_or_else(|| args.path.join(DEFAULT_REPORT_NAME));
    report.write_json(&report_path)?;

    println!("{}", output::summary_table(&report));
    println!("{}", output::summary_line(&report.summary));
    println!("Report written to {}", report_path.display());

    if let Some(dir) = args.ela_dir.clone() {
        let documents: Vec<PathBuf> = entries
            .iter()
            .filter(|entry| entry.inspection().is_some())
            .map(|entry| entry.file.clone())
            .collect();
        let written = tokio::task::spawn_blocking(move || export_all(&inspector, &documents, &dir))
            .await
            .map_err(|err| TamperError::Join(err.to_string()))??;
        info!(written, "ELA heatmaps exported");
    }

    Ok(ExitStatus::from_summary(&report.summary))
}

fn export_all(inspector: &Inspector, documents: &[PathBuf], dir: &Path) -> Result<usize> {
    let mut written = 0;
    for path in documents {
        match PdfReader::open(path) {
            Ok(reader) => written += export_heatmaps(inspector, &reader, path, dir)?,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Cannot reopen for heatmap export")
            }
        }
    }
    Ok(written)
}

// -- Heatmaps ------------------------------------------------------------------

/// Write `<stem>-<object>-<generation>.png` for every image ELA can measure.
/// Returns the number of files written.
#[instrument(skip_all, fields(source = %source.display()))]
pub fn export_heatmaps(
    inspector: &Inspector,
    reader: &PdfReader,
    source: &Path,
    dir: &Path,
) -> Result<usize> {
    std::fs::create_dir_all(dir)?;
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_owned());

    let mut written = 0;
    for image in reader.embedded_images() {
        let measurement = match inspector.ela().measure(&image) {
            Ok(measurement) => measurement,
            Err(err) => {
                debug!(id = %image.id, error = %err, "No heatmap for image");
                continue;
            }
        };
        let png = codec::encode_png(&measurement.heatmap())?;
        let target = dir.join(format!(
            "{stem}-{}-{}.png",
            image.id.object, image.id.generation
        ));
        std::fs::write(&target, png)?;
        debug!(path = %target.display(), localized = measurement.localized, "Heatmap written");
        written += 1;
    }
    Ok(written)
}
