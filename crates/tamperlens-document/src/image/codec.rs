// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image codec: turns an embedded image payload into an RGB buffer and runs
// the lossy JPEG round trip that Error Level Analysis compares against.
// Operates on in-memory images using the `image` crate.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, ImageFormat, ImageReader, Luma, Rgb, RgbImage};
use tamperlens_core::error::TamperError;
use tamperlens_core::{EmbeddedImage, ImageData, ImageId};
use tracing::{debug, instrument};

/// Decode an embedded image into 8-bit RGB.
///
/// Encoded payloads go through the `image` decoders; raw XObject samples are
/// interpreted from their component count and bit depth (8-bit gray, RGB and
/// CMYK, and 1-bit gray as produced by bilevel scanners). Images declaring
/// more than `max_pixels` pixels are refused before anything is allocated.
#[instrument(skip_all, fields(id = %image.id))]
pub fn decode(image: &EmbeddedImage, max_pixels: u64) -> Result<RgbImage, TamperError> {
    let id = image.id;
    match &image.data {
        ImageData::Encoded(bytes) => {
            let (width, height) = ImageReader::new(Cursor::new(bytes.as_slice()))
                .with_guessed_format()
                .map_err(|err| decode_failure(id, err))?
                .into_dimensions()
                .map_err(|err| decode_failure(id, err))?;
            check_budget(width, height, max_pixels)
                .map_err(|reason| TamperError::UnsupportedImage(format!("image {id}: {reason}")))?;

            let decoded = image::load_from_memory(bytes).map_err(|err| decode_failure(id, err))?;
            debug!(width = decoded.width(), height = decoded.height(), "Image decoded from bytes");
            Ok(decoded.to_rgb8())
        }
        ImageData::Raw {
            width,
            height,
            components,
            bits_per_component,
            samples,
        } => {
            let pixels = check_budget(*width, *height, max_pixels)
                .map_err(|reason| TamperError::UnsupportedImage(format!("image {id}: {reason}")))?;
            decode_raw(*width, *height, pixels, *components, *bits_per_component, samples)
                .map_err(|reason| TamperError::ImageError(format!("image {id}: {reason}")))
        }
        ImageData::Unsupported { filter } => Err(TamperError::UnsupportedImage(format!(
            "image {} uses {}",
            image.id, filter
        ))),
    }
}

/// Encode `image` as JPEG at `quality` and decode it again.
///
/// The result always has the dimensions of the input; anything else is an
/// error rather than a silently misaligned comparison.
pub fn jpeg_round_trip(image: &RgbImage, quality: u8) -> Result<RgbImage, TamperError> {
    let encoded = encode_jpeg(image, quality)?;
    let decoded = image::load_from_memory_with_format(&encoded, ImageFormat::Jpeg)
        .map_err(|err| TamperError::ImageError(format!("JPEG decoding failed: {}", err)))?
        .to_rgb8();

    if decoded.dimensions() != image.dimensions() {
        return Err(TamperError::ImageError(format!(
            "JPEG round trip changed dimensions from {:?} to {:?}",
            image.dimensions(),
            decoded.dimensions()
        )));
    }
    Ok(decoded)
}

/// Encode an RGB image as JPEG bytes with the given quality (1-100).
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, TamperError> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    image
        .write_with_encoder(encoder)
        .map_err(|err| TamperError::ImageError(format!("JPEG encoding failed: {}", err)))?;
    Ok(buffer)
}

/// Encode an RGB image as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, TamperError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| TamperError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}

fn decode_failure(id: ImageId, err: impl std::fmt::Display) -> TamperError {
    TamperError::ImageError(format!("failed to decode image {id}: {err}"))
}

/// Pixel count of a `width` x `height` image, if it is non-empty and within
/// `max_pixels`.
fn check_budget(width: u32, height: u32, max_pixels: u64) -> Result<usize, String> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels == 0 {
        return Err("zero-sized image".into());
    }
    if pixels > max_pixels {
        return Err(format!("{width}x{height} exceeds the {max_pixels} pixel budget"));
    }
    usize::try_from(pixels).map_err(|_| format!("{width}x{height} is not addressable"))
}

fn decode_raw(
    width: u32,
    height: u32,
    pixels: usize,
    components: u8,
    bits_per_component: u8,
    samples: &[u8],
) -> Result<RgbImage, String> {
    let sample_bytes = |per_pixel: usize| {
        pixels
            .checked_mul(per_pixel)
            .ok_or_else(|| format!("{width}x{height} at {per_pixel} bytes per pixel overflows"))
    };

    match (components, bits_per_component) {
        (1, 1) => {
            let row_bytes = (width as usize).div_ceil(8);
            let needed = row_bytes
                .checked_mul(height as usize)
                .ok_or_else(|| format!("{width}x{height} bilevel image overflows"))?;
            if samples.len() < needed {
                return Err(format!(
                    "{} bytes is too short for a {width}x{height} bilevel image",
                    samples.len()
                ));
            }
            Ok(RgbImage::from_fn(width, height, |x, y| {
                let byte = samples[y as usize * row_bytes + x as usize / 8];
                let bit = (byte >> (7 - (x % 8))) & 1;
                let value = if bit == 1 { 255 } else { 0 };
                Rgb([value, value, value])
            }))
        }
        (1, 8) => {
            let gray = GrayImage::from_raw(width, height, truncated(samples, pixels)?)
                .ok_or("gray sample buffer does not match dimensions")?;
            Ok(RgbImage::from_fn(width, height, |x, y| {
                let Luma([v]) = *gray.get_pixel(x, y);
                Rgb([v, v, v])
            }))
        }
        (3, 8) => RgbImage::from_raw(width, height, truncated(samples, sample_bytes(3)?)?)
            .ok_or_else(|| "RGB sample buffer does not match dimensions".to_owned()),
        (4, 8) => {
            let cmyk = truncated(samples, sample_bytes(4)?)?;
            let mut rgb = Vec::with_capacity(sample_bytes(3)?);
            for px in cmyk.chunks_exact(4) {
                let k = u16::from(px[3]);
                for &ink in &px[..3] {
                    rgb.push(255u16.saturating_sub((u16::from(ink) + k).min(255)) as u8);
                }
            }
            RgbImage::from_raw(width, height, rgb)
                .ok_or_else(|| "CMYK sample buffer does not match dimensions".to_owned())
        }
        (n, bits) => Err(format!(
            "{n} component(s) at {bits} bit(s) per component is not supported"
        )),
    }
}

/// The first `expected` samples, or an error if there are fewer. Producers
/// occasionally pad streams with a trailing newline.
fn truncated(samples: &[u8], expected: usize) -> Result<Vec<u8>, String> {
    samples
        .get(..expected)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| format!("expected {expected} sample bytes, found {}", samples.len()))
}
