// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Forensics configuration: severity weights, verdict thresholds, the editing
// tool signature list, and the ELA tunables. Fixed once a scan starts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TamperError};
use crate::types::SeverityLevel;

/// Every tunable used by the analyzers and the aggregator.
///
/// Each section defaults independently, so a JSON file only needs the keys it
/// overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForensicsConfig {
    pub severity: SeverityWeights,
    pub verdict: VerdictThresholds,
    pub metadata: MetadataRules,
    pub structure: StructureRules,
    pub ela: ElaSettings,
}

/// Numeric weight of each severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityWeights {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
}

impl SeverityWeights {
    pub fn weight(&self, level: SeverityLevel) -> u32 {
        match level {
            SeverityLevel::Low => self.low,
            SeverityLevel::Medium => self.medium,
            SeverityLevel::High => self.high,
        }
    }
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            low: 1,
            medium: 2,
            high: 3,
        }
    }
}

/// Score cut-offs. A score of zero is always `Safe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictThresholds {
    /// Lowest score reported as `Suspicious`.
    pub suspicious_at: u32,
    /// Lowest score reported as `LikelyTampered`.
    pub likely_tampered_at: u32,
}

impl Default for VerdictThresholds {
    fn default() -> Self {
        Self {
            suspicious_at: 1,
            likely_tampered_at: 3,
        }
    }
}

/// A case-insensitive substring that identifies an editing tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSignature {
    /// Substring searched for in Producer/Creator, compared case-insensitively.
    pub pattern: String,
    /// Display name used in finding descriptions.
    pub tool: String,
    pub severity: SeverityLevel,
}

impl ToolSignature {
    pub fn new(pattern: &str, tool: &str, severity: SeverityLevel) -> Self {
        Self {
            pattern: pattern.to_owned(),
            tool: tool.to_owned(),
            severity,
        }
    }
}

/// Metadata analyzer rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataRules {
    /// Modification later than creation by more than this is flagged.
    pub max_modification_gap_hours: i64,
    pub date_gap_severity: SeverityLevel,
    pub date_inversion_severity: SeverityLevel,
    pub tool_signatures: Vec<ToolSignature>,
}

impl Default for MetadataRules {
    fn default() -> Self {
        use SeverityLevel::Medium;
        Self {
            max_modification_gap_hours: 24,
            date_gap_severity: SeverityLevel::High,
            date_inversion_severity: SeverityLevel::High,
            tool_signatures: vec![
                ToolSignature::new("gimp", "GIMP", Medium),
                ToolSignature::new("photoshop", "Photoshop", Medium),
                ToolSignature::new("sejda", "Sejda", Medium),
                ToolSignature::new("ilovepdf", "iLovePDF", Medium),
                ToolSignature::new("smallpdf", "Smallpdf", Medium),
                ToolSignature::new("phantompdf", "Foxit PhantomPDF", Medium),
                ToolSignature::new("pdfescape", "PDFescape", Medium),
                ToolSignature::new("pdf-xchange editor", "PDF-XChange Editor", Medium),
                ToolSignature::new("nitro pro", "Nitro Pro", Medium),
            ],
        }
    }
}

/// Structural analyzer rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureRules {
    pub incremental_update_severity: SeverityLevel,
    pub missing_eof_severity: SeverityLevel,
}

impl Default for StructureRules {
    fn default() -> Self {
        Self {
            incremental_update_severity: SeverityLevel::High,
            missing_eof_severity: SeverityLevel::Medium,
        }
    }
}

/// Error Level Analysis tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElaSettings {
    /// JPEG quality used for the re-encode (1-100).
    pub jpeg_quality: u8,
    /// Multiplier applied to the raw per-pixel difference before clamping.
    pub amplification: u16,
    /// Edge length of the square tiles the error map is partitioned into.
    pub tile_size: u32,
    /// `k` in `max_tile_mean > mean + k * stddev`.
    pub sigma_threshold: f64,
    /// Images whose error variance is below this are never flagged.
    pub noise_floor_variance: f64,
    /// Images narrower or shorter than this are skipped.
    pub min_dimension: u32,
    /// Images with more pixels than this are skipped before any buffer is
    /// allocated.
    pub max_pixels: u64,
    pub severity: SeverityLevel,
}

impl Default for ElaSettings {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            amplification: 15,
            tile_size: 16,
            sigma_threshold: 3.0,
            noise_floor_variance: 4.0,
            min_dimension: 32,
            max_pixels: 50_000_000,
            severity: SeverityLevel::High,
        }
    }
}

impl ForensicsConfig {
    /// Load a JSON configuration file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|err| {
            TamperError::InvalidConfig(format!("cannot read {}: {}", path.display(), err))
        })?;
        Self::from_json(&data)
    }

    /// Parse a JSON configuration document and validate it.
    pub fn from_json(data: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(data)
            .map_err(|err| TamperError::InvalidConfig(format!("malformed JSON: {}", err)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no analyzer can work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(TamperError::InvalidConfig(msg));

        if self.verdict.suspicious_at == 0 {
            return invalid("verdict.suspicious_at must be at least 1".into());
        }
        if self.verdict.likely_tampered_at < self.verdict.suspicious_at {
            return invalid(format!(
                "verdict.likely_tampered_at ({}) is below verdict.suspicious_at ({})",
                self.verdict.likely_tampered_at, self.verdict.suspicious_at
            ));
        }
        if self.metadata.max_modification_gap_hours < 0 {
            return invalid("metadata.max_modification_gap_hours must not be negative".into());
        }
        if let Some(index) = self
            .metadata
            .tool_signatures
            .iter()
            .position(|sig| sig.pattern.trim().is_empty())
        {
            return invalid(format!("metadata.tool_signatures[{index}] has an empty pattern"));
        }

        let ela = &self.ela;
        if !(1..=100).contains(&ela.jpeg_quality) {
            return invalid(format!("ela.jpeg_quality {} is outside 1..=100", ela.jpeg_quality));
        }
        if ela.amplification == 0 {
            return invalid("ela.amplification must be positive".into());
        }
        if ela.tile_size == 0 {
            return invalid("ela.tile_size must be positive".into());
        }
        if !ela.sigma_threshold.is_finite() || ela.sigma_threshold < 0.0 {
            return invalid(format!(
                "ela.sigma_threshold {} is not a finite non-negative number",
                ela.sigma_threshold
            ));
        }
        if !ela.noise_floor_variance.is_finite() || ela.noise_floor_variance < 0.0 {
            return invalid(format!(
                "ela.noise_floor_variance {} is not a finite non-negative number",
                ela.noise_floor_variance
            ));
        }
        if ela.max_pixels == 0 {
            return invalid("ela.max_pixels must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ForensicsConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = ForensicsConfig::from_json(r#"{ "ela": { "jpeg_quality": 75 } }"#)
            .expect("valid partial config");
        assert_eq!(config.ela.jpeg_quality, 75);
        assert_eq!(config.ela.tile_size, 16);
        assert_eq!(config.severity, SeverityWeights::default());
        assert!(!config.metadata.tool_signatures.is_empty());
    }

    #[test]
    fn signature_list_is_data_driven() {
        let config = ForensicsConfig::from_json(
            r#"{ "metadata": { "tool_signatures": [
                { "pattern": "acme edit", "tool": "Acme Edit", "severity": "high" }
            ] } }"#,
        )
        .expect("valid config");
        assert_eq!(config.metadata.tool_signatures.len(), 1);
        assert_eq!(config.metadata.tool_signatures[0].severity, SeverityLevel::High);
        assert_eq!(config.metadata.max_modification_gap_hours, 24);
    }

    #[test]
    fn rejects_bad_quality() {
        let err = ForensicsConfig::from_json(r#"{ "ela": { "jpeg_quality": 0 } }"#).unwrap_err();
        assert!(matches!(err, TamperError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut config = ForensicsConfig::default();
        config.verdict.likely_tampered_at = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_tile_and_nan_sigma() {
        let mut config = ForensicsConfig::default();
        config.ela.tile_size = 0;
        assert!(config.validate().is_err());

        let mut config = ForensicsConfig::default();
        config.ela.sigma_threshold = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = ForensicsConfig::default();
        config.ela.max_pixels = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = ForensicsConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TamperError::InvalidConfig(_)));
    }

    #[test]
    fn shipped_example_matches_defaults() {
        let config = ForensicsConfig::from_json(include_str!("../../../config/tamperlens.json"))
            .expect("example config is valid");
        assert_eq!(config, ForensicsConfig::default());
    }

    #[test]
    fn weight_lookup() {
        let weights = SeverityWeights::default();
        assert_eq!(weights.weight(SeverityLevel::Low), 1);
        assert_eq!(weights.weight(SeverityLevel::Medium), 2);
        assert_eq!(weights.weight(SeverityLevel::High), 3);
    }
}
