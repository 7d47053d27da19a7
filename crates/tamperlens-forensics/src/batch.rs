// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch scanning: documents are analysed in parallel on the blocking pool,
// bounded by a semaphore. Results come back in input order, and a document
// that fails never affects the others.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tamperlens_core::error::{Result, TamperError};
use tamperlens_core::Inspection;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use crate::pipeline::Inspector;

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Inspected(Inspection),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    pub file: PathBuf,
    pub outcome: Outcome,
}

impl BatchEntry {
    pub fn inspection(&self) -> Option<&Inspection> {
        match &self.outcome {
            Outcome::Inspected(inspection) => Some(inspection),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Inspected(_) => None,
            Outcome::Failed { error } => Some(error),
        }
    }
}

pub struct BatchScanner {
    inspector: Arc<Inspector>,
    concurrency: usize,
}

impl BatchScanner {
    /// `concurrency` is clamped to at least one document at a time.
    pub fn new(inspector: Arc<Inspector>, concurrency: usize) -> Self {
        Self {
            inspector,
            concurrency: concurrency.max(1),
        }
    }

    /// Inspect every path. Returns one entry per input, in input order.
    #[instrument(skip_all, fields(documents = paths.len(), concurrency = self.concurrency))]
    pub async fn scan(&self, paths: Vec<PathBuf>) -> Vec<BatchEntry> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, path) in paths.into_iter().enumerate() {
            let inspector = Arc::clone(&self.inspector);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let target = path.clone();
                let result = tokio::task::spawn_blocking(move || inspector.inspect_path(&target))
                    .await
                    .map_err(|err| TamperError::Join(err.to_string()))
                    .and_then(|inspection| inspection);

                let outcome = match result {
                    Ok(inspection) => Outcome::Inspected(inspection),
                    Err(err) => {
                        warn!(
                            path = %path.display(),
                            error = %err,
                            "Document could not be inspected"
                        );
                        Outcome::Failed {
                            error: err.to_string(),
                        }
                    }
                };
                (index, BatchEntry { file: path, outcome })
            });
        }

        let mut indexed = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => indexed.push(entry),
                Err(err) => error!(error = %err, "Batch task aborted"),
            }
        }
        indexed.sort_by_key(|(index, _)| *index);

        let entries: Vec<BatchEntry> = indexed.into_iter().map(|(_, entry)| entry).collect();
        let failed = entries.iter().filter(|entry| entry.error().is_some()).count();
        info!(inspected = entries.len() - failed, failed, "Batch complete");
        entries
    }

    /// Discover the PDFs in `dir` and scan them.
    pub async fn scan_directory(&self, dir: impl AsRef<Path>) -> Result<Vec<BatchEntry>> {
        let paths = discover_pdfs(dir)?;
        Ok(self.scan(paths).await)
    }
}

/// Regular files directly inside `dir` whose extension is `pdf` in any case,
/// sorted by path.
pub fn discover_pdfs(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use tamperlens_core::config::ForensicsConfig;
    use tamperlens_core::{Evidence, Verdict};

    fn scanner(concurrency: usize) -> BatchScanner {
        let inspector = Inspector::new(ForensicsConfig::default()).expect("valid config");
        BatchScanner::new(Arc::new(inspector), concurrency)
    }

    fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, bytes).expect("write fixture");
        path
    }

    #[test]
    fn discovery_is_sorted_and_case_insensitive() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "b.PDF", b"x");
        write(dir.path(), "a.pdf", b"x");
        write(dir.path(), "notes.txt", b"x");
        std::fs::create_dir(dir.path().join("nested.pdf")).expect("mkdir");

        let found = discover_pdfs(dir.path()).expect("discover");
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.PDF"]);
    }

    #[test]
    fn discovery_of_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            discover_pdfs(dir.path().join("absent")),
            Err(TamperError::Io(_))
        ));
    }

    #[tokio::test]
    async fn failures_are_isolated_and_order_is_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        let clean = fixtures::pdf(
            Some(fixtures::info("LibreOffice", "D:20240101000000Z", "D:20240101000000Z")),
            Vec::new(),
        );
        let edited = fixtures::append_update(fixtures::pdf(
            Some(fixtures::info("Photoshop", "D:20240101000000Z", "D:20240101000000Z")),
            Vec::new(),
        ));
        let paths = vec![
            write(dir.path(), "c.pdf", &edited),
            write(dir.path(), "a.pdf", &clean),
            write(dir.path(), "b.pdf", b"no header, no trailer"),
            dir.path().join("missing.pdf"),
            write(dir.path(), "cut.pdf", b"%PDF-1.4\n1 0 obj\n<< /Type /Catal"),
        ];

        let entries = scanner(2).scan(paths.clone()).await;
        assert_eq!(entries.len(), 5);
        let files: Vec<_> = entries.iter().map(|e| e.file.clone()).collect();
        assert_eq!(files, paths);

        let edited = entries[0].inspection().expect("edited inspected");
        assert_eq!(edited.record.verdict, Verdict::LikelyTampered);
        assert_eq!(edited.record.suspicion_score, 5);

        let clean = entries[1].inspection().expect("clean inspected");
        assert_eq!(clean.record.verdict, Verdict::Safe);

        assert!(entries[2].error().is_some());
        assert!(entries[3].error().is_some());

        let cut = entries[4].inspection().expect("truncated PDF assessed");
        assert_eq!(cut.record.verdict, Verdict::Suspicious);
        assert_eq!(cut.record.findings[0].evidence(), &Evidence::MissingEofMarker);
    }

    #[tokio::test]
    async fn scan_directory_matches_single_document_results() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bytes = fixtures::pdf(
            Some(fixtures::info("smallpdf.com", "D:20240101000000Z", "D:20240105000000Z")),
            Vec::new(),
        );
        let path = write(dir.path(), "receipt.pdf", &bytes);

        let entries = scanner(0).scan_directory(dir.path()).await.expect("scan");
        assert_eq!(entries.len(), 1);
        let batch = entries[0].inspection().expect("inspected");

        let inspector = Inspector::new(ForensicsConfig::default()).expect("valid config");
        let single = inspector.inspect_path(&path).expect("inspect");
        assert_eq!(batch, &single);
    }

    #[tokio::test]
    async fn empty_batch() {
        assert!(scanner(4).scan(Vec::new()).await.is_empty());
    }
}
