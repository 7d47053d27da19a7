// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Byte-level container checks. Every save of an incrementally updated PDF
// appends a new cross-reference section terminated by `%%EOF`, so the marker
// count is a direct measure of post-creation edits.

use tamperlens_core::config::ForensicsConfig;
use tamperlens_core::{Evidence, Finding};
use tracing::{debug, instrument};

pub const EOF_MARKER: &[u8] = b"%%EOF";
pub const PDF_HEADER: &[u8] = b"%PDF-";

/// Readers accept leading junk before the header up to this offset.
const HEADER_WINDOW: usize = 1024;

/// Count non-overlapping occurrences of `%%EOF` anywhere in the document.
pub fn count_eof_markers(bytes: &[u8]) -> usize {
    let mut count = 0;
    let mut rest = bytes;
    while let Some(pos) = rest
        .windows(EOF_MARKER.len())
        .position(|window| window == EOF_MARKER)
    {
        count += 1;
        rest = &rest[pos + EOF_MARKER.len()..];
    }
    count
}

/// Whether `bytes` announce themselves as a PDF but were cut off before the
/// first `%%EOF` was written.
pub fn is_truncated_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(HEADER_WINDOW + PDF_HEADER.len())];
    let has_header = head
        .windows(PDF_HEADER.len())
        .any(|window| window == PDF_HEADER);
    has_header && count_eof_markers(bytes) == 0
}

#[derive(Debug, Clone)]
pub struct StructureAnalyzer {
    incremental_update_severity: u32,
    missing_eof_severity: u32,
}

impl StructureAnalyzer {
    pub fn new(config: &ForensicsConfig) -> Self {
        Self {
            incremental_update_severity: config
                .severity
                .weight(config.structure.incremental_update_severity),
            missing_eof_severity: config.severity.weight(config.structure.missing_eof_severity),
        }
    }

    /// At most one finding: incremental updates when there is more than one
    /// marker, a missing-marker finding when there are none.
    #[instrument(skip_all, fields(bytes = bytes.len()))]
    pub fn analyze(&self, bytes: &[u8]) -> Vec<Finding> {
        let markers = count_eof_markers(bytes);
        debug!(markers, "End-of-file markers counted");

        match markers {
            0 => vec![Finding::new(
                Evidence::MissingEofMarker,
                self.missing_eof_severity,
                "no %%EOF marker: the file is truncated or not a complete PDF",
            )],
            1 => Vec::new(),
            n => {
                let updates = n - 1;
                let noun = if updates == 1 { "update" } else { "updates" };
                vec![Finding::new(
                    Evidence::IncrementalUpdates { eof_markers: n },
                    self.incremental_update_severity,
                    format!("{updates} incremental {noun} detected ({n} %%EOF markers)"),
                )]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tamperlens_core::Category;

    fn analyzer() -> StructureAnalyzer {
        StructureAnalyzer::new(&ForensicsConfig::default())
    }

    fn document(markers: usize) -> Vec<u8> {
        let mut bytes = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\n".to_vec();
        for i in 0..markers {
            let trailer = format!("trailer\n<< /Size {} >>\nstartxref\n9\n%%EOF\n", i + 2);
            bytes.extend_from_slice(trailer.as_bytes());
        }
        bytes
    }

    #[test]
    fn counts_markers() {
        assert_eq!(count_eof_markers(b""), 0);
        assert_eq!(count_eof_markers(b"%%EOF"), 1);
        assert_eq!(count_eof_markers(b"%%EOF%%EOF\n%%EOF"), 3);
        assert_eq!(count_eof_markers(b"%%%EOF"), 1);
        assert_eq!(count_eof_markers(b"%%EO"), 0);
    }

    #[test]
    fn single_marker_is_clean() {
        assert!(analyzer().analyze(&document(1)).is_empty());
    }

    #[test]
    fn three_markers_mean_two_updates() {
        let findings = analyzer().analyze(&document(3));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity(), 3);
        assert_eq!(findings[0].category(), Category::Structural);
        assert_eq!(
            findings[0].evidence(),
            &Evidence::IncrementalUpdates { eof_markers: 3 }
        );
        assert!(findings[0].description().contains("2 incremental updates"));
    }

    #[test]
    fn singular_wording_for_one_update() {
        let findings = analyzer().analyze(&document(2));
        assert!(findings[0].description().starts_with("1 incremental update "));
    }

    #[test]
    fn missing_marker_is_medium() {
        let findings = analyzer().analyze(&document(0));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].evidence(), &Evidence::MissingEofMarker);
        assert_eq!(findings[0].severity(), 2);
    }

    #[test]
    fn truncation_needs_a_header_and_no_marker() {
        assert!(is_truncated_pdf(&document(0)));
        assert!(!is_truncated_pdf(&document(1)));
        assert!(!is_truncated_pdf(b"plain text, no header"));
        assert!(!is_truncated_pdf(b""));

        let mut preamble = vec![b' '; 600];
        preamble.extend_from_slice(&document(0));
        assert!(is_truncated_pdf(&preamble));
    }

    #[test]
    fn markers_inside_streams_still_count() {
        let mut bytes = document(1);
        bytes.extend_from_slice(b"stream\nbinary %%EOF junk\nendstream\n");
        assert_eq!(analyzer().analyze(&bytes).len(), 1);
    }
}
