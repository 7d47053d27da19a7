// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// tamperlens-document: Document access for the Tamperlens forensics engine.
//
// Provides PDF extraction (document information, XMP fallback, embedded image
// XObjects, font inventory), image decoding and JPEG round-tripping for Error
// Level Analysis, and SHA-256 fingerprinting of document bytes.

pub mod image;
pub mod integrity;
pub mod pdf;

// Re-export the primary entry points so callers can use `tamperlens_document::PdfReader` etc.
pub use crate::image::codec;
pub use integrity::hash_bytes;
pub use pdf::reader::PdfReader;
