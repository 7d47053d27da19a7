// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: open a document with `lopdf` and hand the forensic analyzers
// what they consume: the raw bytes, the document metadata, and every embedded
// image XObject. Also gathers report-only details (Info dictionary, fonts).

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use lopdf::{Dictionary, Document, Object, Stream};
use tamperlens_core::error::TamperError;
use tamperlens_core::{DocumentMetadata, EmbeddedImage, ImageData, ImageId};
use tracing::{debug, info, instrument};

use crate::pdf::date::parse_pdf_date;
use crate::pdf::text::decode_text_string;
use crate::pdf::xmp;

/// Filters `lopdf` can undo before the samples reach the codec.
const DECOMPRESSIBLE_FILTERS: &[&str] = &[
    "FlateDecode",
    "Fl",
    "LZWDecode",
    "LZW",
    "ASCII85Decode",
    "A85",
];

/// Reference chains longer than this are treated as broken.
const MAX_REFERENCE_DEPTH: usize = 8;

/// Read-only view of a parsed PDF plus the exact bytes it was parsed from.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Original file content, kept for byte-level structure checks.
    bytes: Vec<u8>,
}

/// How the samples of an image XObject are laid out.
enum ColorModel {
    Components(u8),
    Unsupported(String),
    Unknown,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TamperError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let bytes = std::fs::read(path_ref)?;
        let document = Document::load_mem(&bytes).map_err(|err| {
            TamperError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), bytes_len = bytes.len(), "PDF loaded");

        Ok(Self { document, bytes })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, TamperError> {
        let document = Document::load_mem(&data).map_err(|err| {
            TamperError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            bytes: data,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// The bytes the document was parsed from, unmodified.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.bytes
    }

    // -- Metadata -------------------------------------------------------------

    /// Creation/modification dates and producer/creator strings.
    ///
    /// The Info dictionary wins; the catalog's XMP packet fills whatever it
    /// lacks. Malformed values are reported as absent.
    pub fn metadata(&self) -> DocumentMetadata {
        let info = self.info_dictionary();
        let packet = self.xmp_packet();

        let info_text = |key: &[u8]| {
            info.and_then(|dict| dict.get(key).ok())
                .and_then(|object| self.text_value(object))
                .filter(|value| !value.trim().is_empty())
        };
        let xmp_text = |wanted: xmp::Property| {
            packet.as_deref().and_then(|xml| xmp::property(xml, wanted))
        };

        let metadata = DocumentMetadata {
            creation_date: info_text(b"CreationDate")
                .and_then(|raw| parse_pdf_date(&raw))
                .or_else(|| xmp_text(xmp::CREATE_DATE).and_then(|raw| parse_pdf_date(&raw))),
            modification_date: info_text(b"ModDate")
                .and_then(|raw| parse_pdf_date(&raw))
                .or_else(|| xmp_text(xmp::MODIFY_DATE).and_then(|raw| parse_pdf_date(&raw))),
            producer: info_text(b"Producer").or_else(|| xmp_text(xmp::PRODUCER)),
            creator: info_text(b"Creator").or_else(|| xmp_text(xmp::CREATOR_TOOL)),
        };

        debug!(
            has_creation = metadata.creation_date.is_some(),
            has_modification = metadata.modification_date.is_some(),
            producer = metadata.producer.as_deref().unwrap_or(""),
            creator = metadata.creator.as_deref().unwrap_or(""),
            "Metadata read"
        );
        metadata
    }

    /// Every entry of the Info dictionary, stringified, for the report.
    pub fn info_entries(&self) -> BTreeMap<String, String> {
        let Some(info) = self.info_dictionary() else {
            return BTreeMap::new();
        };
        info.iter()
            .map(|(key, value)| {
                (
                    String::from_utf8_lossy(key).into_owned(),
                    self.display_value(value),
                )
            })
            .collect()
    }

    /// Sorted, de-duplicated `/BaseFont` names of every font dictionary.
    pub fn font_names(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        for object in self.document.objects.values() {
            let Object::Dictionary(dict) = object else {
                continue;
            };
            if !name_is(dict, b"Type", b"Font") {
                continue;
            }
            if let Ok(Object::Name(base)) = dict.get(b"BaseFont") {
                names.insert(String::from_utf8_lossy(base).into_owned());
            }
        }
        names.into_iter().collect()
    }

    // -- Images ---------------------------------------------------------------

    /// Every image XObject in object-number order.
    ///
    /// Extraction never fails: images whose payload cannot be handed to the
    /// codec are returned as [`ImageData::Unsupported`] so the caller can
    /// account for them.
    #[instrument(skip_all)]
    pub fn embedded_images(&self) -> Vec<EmbeddedImage> {
        let mut images = Vec::new();
        for (&(object, generation), obj) in &self.document.objects {
            let Object::Stream(stream) = obj else {
                continue;
            };
            if !name_is(&stream.dict, b"Subtype", b"Image") {
                continue;
            }

            let id = ImageId::new(object, generation);
            let data = self.image_data(stream);
            match &data {
                ImageData::Encoded(bytes) => {
                    debug!(%id, bytes = bytes.len(), "Encoded image found")
                }
                ImageData::Raw {
                    width,
                    height,
                    components,
                    ..
                } => debug!(%id, width, height, components, "Raw image found"),
                ImageData::Unsupported { filter } => {
                    debug!(%id, %filter, "Unsupported image found")
                }
            }
            images.push(EmbeddedImage { id, data });
        }

        info!(count = images.len(), "Embedded images extracted");
        images
    }

    // -- Helpers --------------------------------------------------------------

    fn image_data(&self, stream: &Stream) -> ImageData {
        let filters = self.filter_names(&stream.dict);

        if filters.iter().any(|f| f == "DCTDecode" || f == "DCT") {
            return if filters.len() == 1 {
                ImageData::Encoded(stream.content.clone())
            } else {
                ImageData::Unsupported {
                    filter: filters.join("+"),
                }
            };
        }
        if let Some(filter) = filters
            .iter()
            .find(|f| !DECOMPRESSIBLE_FILTERS.contains(&f.as_str()))
        {
            return ImageData::Unsupported {
                filter: filter.clone(),
            };
        }
        if matches!(stream.dict.get(b"ImageMask"), Ok(Object::Boolean(true))) {
            return ImageData::Unsupported {
                filter: "ImageMask".to_owned(),
            };
        }

        let samples = if filters.is_empty() {
            stream.content.clone()
        } else {
            match stream.decompressed_content() {
                Ok(samples) => samples,
                Err(err) => {
                    return ImageData::Unsupported {
                        filter: format!("{} ({})", filters.join("+"), err),
                    };
                }
            }
        };

        let width = self.integer(&stream.dict, b"Width").and_then(|v| u32::try_from(v).ok());
        let height = self.integer(&stream.dict, b"Height").and_then(|v| u32::try_from(v).ok());
        let (Some(width), Some(height)) = (width, height) else {
            return ImageData::Unsupported {
                filter: "missing /Width or /Height".to_owned(),
            };
        };
        let bits_per_component = self
            .integer(&stream.dict, b"BitsPerComponent")
            .and_then(|v| u8::try_from(v).ok())
            .unwrap_or(8);

        let components = match self.color_model(&stream.dict) {
            ColorModel::Components(n) => n,
            ColorModel::Unsupported(space) => {
                return ImageData::Unsupported {
                    filter: format!("{space} colour space"),
                };
            }
            ColorModel::Unknown => {
                infer_components(samples.len(), width, height, bits_per_component).unwrap_or(0)
            }
        };

        ImageData::Raw {
            width,
            height,
            components,
            bits_per_component,
            samples,
        }
    }

    fn color_model(&self, dict: &Dictionary) -> ColorModel {
        let Some(space) = dict.get(b"ColorSpace").ok().and_then(|o| self.resolve(o)) else {
            return ColorModel::Unknown;
        };
        match space {
            Object::Name(name) => device_components(name)
                .map(ColorModel::Components)
                .unwrap_or(ColorModel::Unknown),
            Object::Array(items) => {
                let Some(Object::Name(family)) = items.first() else {
                    return ColorModel::Unknown;
                };
                match family.as_slice() {
                    b"ICCBased" => items
                        .get(1)
                        .and_then(|o| self.resolve(o))
                        .and_then(|profile| match profile {
                            Object::Stream(profile) => self.integer(&profile.dict, b"N"),
                            _ => None,
                        })
                        .and_then(|n| u8::try_from(n).ok())
                        .map(ColorModel::Components)
                        .unwrap_or(ColorModel::Unknown),
                    b"CalRGB" | b"Lab" => ColorModel::Components(3),
                    b"CalGray" => ColorModel::Components(1),
                    other => ColorModel::Unsupported(String::from_utf8_lossy(other).into_owned()),
                }
            }
            _ => ColorModel::Unknown,
        }
    }

    fn filter_names(&self, dict: &Dictionary) -> Vec<String> {
        let Some(filter) = dict.get(b"Filter").ok().and_then(|o| self.resolve(o)) else {
            return Vec::new();
        };
        let as_name = |object: &Object| match self.resolve(object) {
            Some(Object::Name(name)) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        };
        match filter {
            Object::Array(items) => items.iter().filter_map(as_name).collect(),
            single => as_name(single).into_iter().collect(),
        }
    }

    fn info_dictionary(&self) -> Option<&Dictionary> {
        let info = self.document.trailer.get(b"Info").ok()?;
        match self.resolve(info)? {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    fn xmp_packet(&self) -> Option<String> {
        let catalog = self.document.catalog().ok()?;
        let Object::Stream(stream) = self.resolve(catalog.get(b"Metadata").ok()?)? else {
            return None;
        };
        let content = if stream.dict.has(b"Filter") {
            stream.decompressed_content().ok()?
        } else {
            stream.content.clone()
        };
        Some(String::from_utf8_lossy(&content).into_owned())
    }

    /// Follow indirect references to the object they name.
    fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        let mut current = object;
        for _ in 0..MAX_REFERENCE_DEPTH {
            match current {
                Object::Reference(id) => current = self.document.get_object(*id).ok()?,
                other => return Some(other),
            }
        }
        None
    }

    fn integer(&self, dict: &Dictionary, key: &[u8]) -> Option<i64> {
        match self.resolve(dict.get(key).ok()?)? {
            Object::Integer(value) => Some(*value),
            Object::Real(value) => Some(*value as i64),
            _ => None,
        }
    }

    fn text_value(&self, object: &Object) -> Option<String> {
        match self.resolve(object)? {
            Object::String(bytes, _) => Some(decode_text_string(bytes)),
            Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        }
    }

    fn display_value(&self, object: &Object) -> String {
        match self.resolve(object) {
            Some(Object::String(bytes, _)) => decode_text_string(bytes),
            Some(Object::Name(name)) => String::from_utf8_lossy(name).into_owned(),
            Some(Object::Integer(value)) => value.to_string(),
            Some(Object::Real(value)) => value.to_string(),
            Some(Object::Boolean(value)) => value.to_string(),
            Some(Object::Array(items)) => format!("<array of {}>", items.len()),
            Some(Object::Dictionary(_)) => "<dictionary>".to_owned(),
            Some(Object::Stream(_)) => "<stream>".to_owned(),
            Some(_) => "null".to_owned(),
            None => "<unresolved>".to_owned(),
        }
    }
}

fn name_is(dict: &Dictionary, key: &[u8], expected: &[u8]) -> bool {
    matches!(dict.get(key), Ok(Object::Name(name)) if name.as_slice() == expected)
}

fn device_components(name: &[u8]) -> Option<u8> {
    match name {
        b"DeviceGray" | b"G" | b"CalGray" => Some(1),
        b"DeviceRGB" | b"RGB" | b"CalRGB" => Some(3),
        b"DeviceCMYK" | b"CMYK" => Some(4),
        _ => None,
    }
}

/// Guess the component count of 8-bit samples from the buffer length.
fn infer_components(len: usize, width: u32, height: u32, bits_per_component: u8) -> Option<u8> {
    if bits_per_component != 8 {
        return None;
    }
    let pixels = width as usize * height as usize;
    if pixels == 0 || len % pixels != 0 {
        return None;
    }
    match len / pixels {
        n @ (1 | 3 | 4) => Some(n as u8),
        _ => None,
    }
}
