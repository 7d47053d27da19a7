// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Timestamp parsing for document information (`D:YYYYMMDDHHmmSSOHH'mm'`) and
// XMP (ISO 8601) dates. Anything unparseable yields `None`: a malformed date
// is treated as absent, never as an error.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parse a PDF or ISO 8601 date string into UTC.
///
/// PDF dates may stop after any field (`D:2024` is valid and means
/// 2024-01-01T00:00:00). A missing offset is read as UTC.
pub fn parse_pdf_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim().trim_end_matches('\0').trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix("D:") {
        return parse_compact(rest);
    }

    // Some producers drop the `D:` prefix but keep the compact layout.
    let leading_digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if leading_digits >= 8 || leading_digits == trimmed.len() {
        return parse_compact(trimmed);
    }

    parse_iso(trimmed)
}

/// `YYYY[MM[DD[HH[mm[SS]]]]][Z|+HH'mm'|-HH'mm']`
fn parse_compact(s: &str) -> Option<DateTime<Utc>> {
    let digit_count = s.bytes().take_while(u8::is_ascii_digit).count().min(14);
    if digit_count < 4 || digit_count % 2 != 0 {
        return None;
    }
    let (digits, rest) = s.split_at(digit_count);

    let field = |start: usize, default: u32| -> Option<u32> {
        if start + 2 <= digits.len() {
            digits[start..start + 2].parse().ok()
        } else {
            Some(default)
        }
    };

    let year: i32 = digits[0..4].parse().ok()?;
    let month = field(4, 1)?;
    let day = field(6, 1)?;
    let hour = field(8, 0)?;
    let minute = field(10, 0)?;
    let second = field(12, 0)?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    let offset = parse_offset(rest)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Offset suffix of a compact PDF date. An empty or unrecognised suffix is
/// read as UTC; a recognised but out-of-range offset rejects the date.
fn parse_offset(rest: &str) -> Option<FixedOffset> {
    let mut chars = rest.chars();
    let sign = match chars.next() {
        Some('+') => 1,
        Some('-') => -1,
        _ => return FixedOffset::east_opt(0),
    };

    let digits: String = chars.filter(char::is_ascii_digit).take(4).collect();
    let hours: i32 = match digits.get(0..2) {
        Some(h) => h.parse().ok()?,
        None => return FixedOffset::east_opt(0),
    };
    let minutes: i32 = match digits.get(2..4) {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // XMP allows dropping the seconds.
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
