// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: Container access, date and text-string decoding, XMP packets.

pub mod date;
pub mod reader;
pub mod text;
pub mod xmp;

pub use reader::PdfReader;
