// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Tamperlens forensics engine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::VerdictThresholds;

/// Which forensic signal produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Metadata,
    Structural,
    Visual,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Metadata => "metadata",
            Self::Structural => "structural",
            Self::Visual => "visual",
        };
        f.write_str(label)
    }
}

/// Symbolic severity tier. The numeric weight of each tier comes from
/// [`crate::config::SeverityWeights`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
}

/// Which document-information field carried a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataField {
    Producer,
    Creator,
}

impl std::fmt::Display for MetadataField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Producer => f.write_str("Producer"),
            Self::Creator => f.write_str("Creator"),
        }
    }
}

/// Identifies an embedded image by its indirect object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageId {
    pub object: u32,
    pub generation: u16,
}

impl ImageId {
    pub fn new(object: u32, generation: u16) -> Self {
        Self { object, generation }
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.object, self.generation)
    }
}

/// Axis-aligned pixel rectangle inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Whether the pixel `(px, py)` lies inside this region.
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && py >= self.y && px < self.x + self.width && py < self.y + self.height
    }

    /// Whether the two regions share at least one pixel.
    pub fn overlaps(&self, other: &Region) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Signal-specific payload of a finding. The category of a finding is
/// derived from the variant, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    /// The modification timestamp trails the creation timestamp by more than
    /// the configured gap.
    ModificationLongAfterCreation {
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
        gap_hours: i64,
    },
    /// The modification timestamp precedes the creation timestamp.
    ModificationBeforeCreation {
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
    },
    /// A producer/creator string names a known editing tool.
    EditingTool {
        tool: String,
        field: MetadataField,
        value: String,
    },
    /// More than one end-of-file marker: incremental updates were appended.
    IncrementalUpdates { eof_markers: usize },
    /// No end-of-file marker at all (truncated or malformed container).
    MissingEofMarker,
    /// Error Level Analysis found a tile whose error is out of family.
    LocalizedErrorLevel {
        image: ImageId,
        region: Region,
        region_mean: f64,
        threshold: f64,
    },
}

impl Evidence {
    pub fn category(&self) -> Category {
        match self {
            Self::ModificationLongAfterCreation { .. }
            | Self::ModificationBeforeCreation { .. }
            | Self::EditingTool { .. } => Category::Metadata,
            Self::IncrementalUpdates { .. } | Self::MissingEofMarker => Category::Structural,
            Self::LocalizedErrorLevel { .. } => Category::Visual,
        }
    }
}

/// An atomic forensic observation.
///
/// Fields are private: a finding is immutable once created, and its category
/// always matches its evidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    category: Category,
    description: String,
    severity: u32,
    evidence: Evidence,
}

impl Finding {
    pub fn new(evidence: Evidence, severity: u32, description: impl Into<String>) -> Self {
        Self {
            category: evidence.category(),
            description: description.into(),
            severity,
            evidence,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn severity(&self) -> u32 {
        self.severity
    }

    pub fn evidence(&self) -> &Evidence {
        &self.evidence
    }
}

/// Coarse verdict tier derived from the suspicion score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Safe,
    Suspicious,
    LikelyTampered,
}

impl Verdict {
    /// Step function from score to verdict. `0` is always safe; scores from
    /// `suspicious_at` up to (not including) `likely_tampered_at` are
    /// suspicious; everything above is likely tampered.
    pub fn from_score(score: u32, thresholds: &VerdictThresholds) -> Self {
        if score == 0 || score < thresholds.suspicious_at {
            Self::Safe
        } else if score < thresholds.likely_tampered_at {
            Self::Suspicious
        } else {
            Self::LikelyTampered
        }
    }

    /// Human-readable label used in console output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::Suspicious => "Suspicious",
            Self::LikelyTampered => "Likely Tampered",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Final per-document output of the scoring aggregator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictRecord {
    pub file_path: String,
    /// Sum of the severities of every finding.
    pub suspicion_score: u32,
    pub verdict: Verdict,
    /// Ordered metadata, then structural, then visual.
    pub findings: Vec<Finding>,
}

/// Attributes read from the document information dictionary (or the XMP
/// packet as a fallback).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub creation_date: Option<DateTime<Utc>>,
    pub modification_date: Option<DateTime<Utc>>,
    pub producer: Option<String>,
    pub creator: Option<String>,
}

/// Pixel payload of an embedded image as handed over by the PDF reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageData {
    /// A self-describing encoded stream (e.g. a DCTDecode JPEG).
    Encoded(Vec<u8>),
    /// Unfiltered sample data as laid out in the image XObject.
    Raw {
        width: u32,
        height: u32,
        components: u8,
        bits_per_component: u8,
        samples: Vec<u8>,
    },
    /// A filter the codec collaborator cannot decode (JPX, JBIG2, CCITT...).
    Unsupported { filter: String },
}

/// An image XObject extracted from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub id: ImageId,
    pub data: ImageData,
}

/// Report-only facts about a document. Never contributes to the score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentDetails {
    /// SHA-256 of the document bytes, lowercase hex.
    pub sha256: String,
    pub byte_len: usize,
    /// Raw document information dictionary, stringified.
    pub info: BTreeMap<String, String>,
    /// Sorted, de-duplicated font base names.
    pub fonts: Vec<String>,
    pub images_found: usize,
    pub images_analyzed: usize,
}

/// A verdict together with the details gathered while producing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub record: VerdictRecord,
    pub details: DocumentDetails,
}
