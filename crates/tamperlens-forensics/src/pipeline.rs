// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-document pipeline: gather evidence from the PDF reader, run the three
// analyzers, and aggregate their findings (metadata, then structural, then
// visual) into a verdict record.

use std::path::Path;

use tamperlens_core::config::ForensicsConfig;
use tamperlens_core::error::{Result, TamperError};
use tamperlens_core::{DocumentDetails, DocumentMetadata, EmbeddedImage, Inspection, VerdictRecord};
use tamperlens_document::{PdfReader, hash_bytes};
use tracing::{info, instrument, warn};

use crate::ela::{ElaAnalyzer, ElaReport};
use crate::metadata::MetadataAnalyzer;
use crate::scoring::ScoringAggregator;
use crate::structure::{StructureAnalyzer, is_truncated_pdf};

/// Inputs for one document. Produced by the PDF reader, or assembled
/// directly when the caller already has the pieces.
#[derive(Debug, Clone)]
pub struct DocumentEvidence<'a> {
    pub file_path: String,
    pub bytes: &'a [u8],
    pub metadata: DocumentMetadata,
    pub images: Vec<EmbeddedImage>,
}

impl<'a> DocumentEvidence<'a> {
    pub fn from_reader(file_path: impl Into<String>, reader: &'a PdfReader) -> Self {
        Self {
            file_path: file_path.into(),
            bytes: reader.raw_bytes(),
            metadata: reader.metadata(),
            images: reader.embedded_images(),
        }
    }
}

/// Owns the configured analyzers. Immutable after construction, so one
/// instance can be shared across worker threads.
#[derive(Debug, Clone)]
pub struct Inspector {
    config: ForensicsConfig,
    metadata: MetadataAnalyzer,
    structure: StructureAnalyzer,
    ela: ElaAnalyzer,
    scoring: ScoringAggregator,
}

impl Inspector {
    /// Validate `config` and build the analyzers from it.
    pub fn new(config: ForensicsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            metadata: MetadataAnalyzer::new(&config),
            structure: StructureAnalyzer::new(&config),
            ela: ElaAnalyzer::new(&config),
            scoring: ScoringAggregator::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &ForensicsConfig {
        &self.config
    }

    pub fn ela(&self) -> &ElaAnalyzer {
        &self.ela
    }

    // -- Assessment ----------------------------------------------------------

    /// Run every analyzer over `evidence` and aggregate. Infallible: images
    /// that cannot be analysed only reduce the visual evidence.
    pub fn assess(&self, evidence: &DocumentEvidence<'_>) -> VerdictRecord {
        self.run(evidence).0
    }

    fn run(&self, evidence: &DocumentEvidence<'_>) -> (VerdictRecord, ElaReport) {
        let mut findings = self.metadata.analyze(&evidence.metadata);
        findings.extend(self.structure.analyze(evidence.bytes));
        let mut visual = self.ela.analyze(&evidence.images);
        findings.append(&mut visual.findings);

        let record = self.scoring.aggregate(evidence.file_path.clone(), findings);
        (record, visual)
    }

    // -- Entry points --------------------------------------------------------

    /// Open and inspect the PDF at `path`. Fails only when the file cannot be
    /// read, or is neither a parseable PDF nor a truncated one.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn inspect_path(&self, path: impl AsRef<Path>) -> Result<Inspection> {
        let path = path.as_ref();
        match PdfReader::open(path) {
            Ok(reader) => Ok(self.inspect_reader(path.display().to_string(), &reader)),
            Err(TamperError::PdfError(reason)) => {
                let bytes = std::fs::read(path)?;
                self.inspect_truncated(path.display().to_string(), &bytes)
                    .ok_or(TamperError::PdfError(reason))
            }
            Err(err) => Err(err),
        }
    }

    /// Inspect an in-memory PDF.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn inspect_bytes(
        &self,
        file_path: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Inspection> {
        let file_path = file_path.into();
        let truncated = is_truncated_pdf(&bytes).then(|| bytes.clone());
        match PdfReader::from_bytes(bytes) {
            Ok(reader) => Ok(self.inspect_reader(file_path, &reader)),
            Err(err) => truncated
                .and_then(|bytes| self.inspect_truncated(file_path, &bytes))
                .ok_or(err),
        }
    }

    /// Assessment of a PDF that was cut off before its first `%%EOF` and so
    /// cannot be parsed. Only the structural check has anything to read.
    /// `None` for any other unparseable input.
    fn inspect_truncated(&self, file_path: String, bytes: &[u8]) -> Option<Inspection> {
        if !is_truncated_pdf(bytes) {
            return None;
        }
        let evidence = DocumentEvidence {
            file_path,
            bytes,
            metadata: DocumentMetadata::default(),
            images: Vec::new(),
        };
        let record = self.assess(&evidence);
        warn!(
            path = %record.file_path,
            score = record.suspicion_score,
            "Truncated PDF assessed on structure alone"
        );

        let details = DocumentDetails {
            sha256: hash_bytes(bytes),
            byte_len: bytes.len(),
            ..DocumentDetails::default()
        };
        Some(Inspection { record, details })
    }

    pub fn inspect_reader(&self, file_path: impl Into<String>, reader: &PdfReader) -> Inspection {
        let evidence = DocumentEvidence::from_reader(file_path, reader);
        let (record, visual) = self.run(&evidence);

        let details = DocumentDetails {
            sha256: hash_bytes(evidence.bytes),
            byte_len: evidence.bytes.len(),
            info: reader.info_entries(),
            fonts: reader.font_names(),
            images_found: evidence.images.len(),
            images_analyzed: visual.analyzed,
        };

        info!(
            path = %record.file_path,
            score = record.suspicion_score,
            verdict = %record.verdict,
            findings = record.findings.len(),
            "Document inspected"
        );
        Inspection { record, details }
    }
}
