// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test fixtures: synthetic images and small PDFs built with lopdf.

use image::{Rgb, RgbImage};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use tamperlens_core::{EmbeddedImage, ImageData, ImageId, Region};

/// Where `spliced_image` pastes its noise patch.
pub const SPLICE: Region = Region {
    x: 48,
    y: 48,
    width: 16,
    height: 16,
};

/// A flat 128x128 background with a patch of deterministic gray noise.
pub fn spliced_image() -> RgbImage {
    let mut image = RgbImage::from_pixel(128, 128, Rgb([200, 200, 200]));
    splice_noise(&mut image, SPLICE);
    image
}

/// Overwrite `region` with deterministic gray noise.
pub fn splice_noise(image: &mut RgbImage, region: Region) {
    let mut state: u32 = 0x1234_5678;
    for y in region.y..region.y + region.height {
        for x in region.x..region.x + region.width {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let v = (state >> 24) as u8;
            image.put_pixel(x, y, Rgb([v, v, v]));
        }
    }
}

pub fn raw_image(object: u32, image: &RgbImage) -> EmbeddedImage {
    EmbeddedImage {
        id: ImageId::new(object, 0),
        data: ImageData::Raw {
            width: image.width(),
            height: image.height(),
            components: 3,
            bits_per_component: 8,
            samples: image.as_raw().clone(),
        },
    }
}

/// Uncompressed DeviceRGB image XObject.
pub fn image_stream(image: &RgbImage) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width()),
            "Height" => i64::from(image.height()),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        image.as_raw().clone(),
    )
}

/// A DeviceRGB XObject declaring 3000000000x3000000000 pixels over a few
/// bytes of samples.
pub fn oversized_image_stream() -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 3_000_000_000i64,
            "Height" => 3_000_000_000i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        vec![0; 48],
    )
}

/// A DCTDecode XObject whose payload is not a valid JPEG.
pub fn corrupt_jpeg_stream() -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 64,
            "Height" => 64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xDE, 0xAD],
    )
}

pub fn info(producer: &str, created: &str, modified: &str) -> Dictionary {
    dictionary! {
        "Producer" => Object::string_literal(producer),
        "CreationDate" => Object::string_literal(created),
        "ModDate" => Object::string_literal(modified),
    }
}

/// A one-page PDF with an optional Info dictionary and image XObjects.
pub fn pdf(info: Option<Dictionary>, images: Vec<Stream>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut xobjects = Dictionary::new();
    for (index, image) in images.into_iter().enumerate() {
        let image_id = doc.add_object(image);
        xobjects.set(format!("Im{index}"), image_id);
    }
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
        "XObject" => xobjects,
    });
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        b"BT /F1 10 Tf 72 720 Td (Invoice 0042) Tj ET".to_vec(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(info) = info {
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);
    }

    let mut output = Vec::new();
    doc.save_to(&mut output).expect("serialise fixture PDF");
    output
}

/// Simulate an incremental save: repeat the final `startxref ... %%EOF`
/// section so the file gains a marker but still loads.
pub fn append_update(mut bytes: Vec<u8>) -> Vec<u8> {
    let start = bytes
        .windows(b"startxref".len())
        .rposition(|window| window == b"startxref")
        .expect("fixture has a startxref section");
    let tail = bytes[start..].to_vec();
    bytes.extend_from_slice(b"\n% incremental save\n");
    bytes.extend_from_slice(&tail);
    bytes
}
