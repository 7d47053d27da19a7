// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// tamperlens-forensics: Tampering triage for PDF documents.
//
// Three independent analyzers (document metadata, byte-level structure, and
// Error Level Analysis of embedded images) each emit findings; the scoring
// aggregator sums their severities into a suspicion score and a verdict.
// `Inspector` runs the pipeline for one document, `BatchScanner` for many.

pub mod batch;
pub mod ela;
pub mod metadata;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod structure;

pub use batch::{BatchEntry, BatchScanner, Outcome};
pub use ela::{ElaAnalyzer, ElaMeasurement, ElaReport, ErrorMap};
pub use metadata::MetadataAnalyzer;
pub use pipeline::{DocumentEvidence, Inspector};
pub use report::ForensicReport;
pub use scoring::ScoringAggregator;
pub use structure::StructureAnalyzer;

#[cfg(test)]
pub(crate) mod fixtures;
