// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Error Level Analysis: re-encode each embedded image as JPEG at a fixed
// quality and map the per-pixel difference. Regions pasted in from another
// source recompress differently from their surroundings, so a tile whose
// error sits far above the image-wide distribution is reported as a localized
// splicing indicator. A uniformly high error (a low-quality source) is not.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::map::map_colors;
use imageproc::rect::Rect;
use tamperlens_core::config::{ElaSettings, ForensicsConfig};
use tamperlens_core::error::{Result, TamperError};
use tamperlens_core::{EmbeddedImage, Evidence, Finding, ImageId, Region};
use tamperlens_document::codec;
use tracing::{debug, instrument, warn};

/// Outline colour of the flagged tile on a heatmap. Never produced by the
/// heat palette itself.
const HIGHLIGHT: Rgb<u8> = Rgb([0, 255, 255]);

// ---------------------------------------------------------------------------
// Error map
// ---------------------------------------------------------------------------

/// Per-pixel error level: the largest absolute channel difference between the
/// original and its recompressed copy, amplified and clamped to 0..=255.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMap {
    levels: GrayImage,
}

/// Mean error level of one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileMean {
    pub region: Region,
    pub mean: f64,
}

impl ErrorMap {
    pub fn compute(
        original: &RgbImage,
        recompressed: &RgbImage,
        amplification: u16,
    ) -> Result<Self> {
        if original.dimensions() != recompressed.dimensions() {
            return Err(TamperError::ImageError(format!(
                "cannot compare {:?} against {:?}",
                original.dimensions(),
                recompressed.dimensions()
            )));
        }

        let (width, height) = original.dimensions();
        let gain = u32::from(amplification);
        let levels = GrayImage::from_fn(width, height, |x, y| {
            let Rgb(a) = *original.get_pixel(x, y);
            let Rgb(b) = *recompressed.get_pixel(x, y);
            let diff = a
                .iter()
                .zip(b.iter())
                .map(|(p, q)| p.abs_diff(*q))
                .max()
                .unwrap_or(0);
            Luma([(u32::from(diff) * gain).min(255) as u8])
        });
        Ok(Self { levels })
    }

    pub fn width(&self) -> u32 {
        self.levels.width()
    }

    pub fn height(&self) -> u32 {
        self.levels.height()
    }

    pub fn levels(&self) -> &GrayImage {
        &self.levels
    }

    /// Mean and population variance over every pixel.
    pub fn statistics(&self) -> (f64, f64) {
        let count = self.levels.as_raw().len();
        if count == 0 {
            return (0.0, 0.0);
        }
        let (sum, sum_sq) = self
            .levels
            .as_raw()
            .iter()
            .fold((0u64, 0u64), |(s, sq), &v| {
                let v = u64::from(v);
                (s + v, sq + v * v)
            });
        let n = count as f64;
        let mean = sum as f64 / n;
        let variance = (sum_sq as f64 / n - mean * mean).max(0.0);
        (mean, variance)
    }

    /// Partition into `tile_size` squares, row-major. A remainder narrower
    /// or shorter than half a tile is folded into its neighbour, so every
    /// pixel belongs to exactly one tile and no sliver tile can dominate.
    pub fn tile_means(&self, tile_size: u32) -> Vec<TileMean> {
        let (width, height) = self.levels.dimensions();
        let columns = spans(width, tile_size);
        let rows = spans(height, tile_size);
        let mut tiles = Vec::with_capacity(columns.len() * rows.len());

        for &(y, tile_height) in &rows {
            for &(x, tile_width) in &columns {
                let mut sum = 0u64;
                for ty in y..y + tile_height {
                    for tx in x..x + tile_width {
                        sum += u64::from(self.levels.get_pixel(tx, ty).0[0]);
                    }
                }
                tiles.push(TileMean {
                    region: Region {
                        x,
                        y,
                        width: tile_width,
                        height: tile_height,
                    },
                    mean: sum as f64 / f64::from(tile_width * tile_height),
                });
            }
        }
        tiles
    }
}

/// `(start, length)` of each tile along an axis of `len` pixels.
fn spans(len: u32, tile_size: u32) -> Vec<(u32, u32)> {
    let tile_size = tile_size.max(1);
    let min_edge = tile_size.div_ceil(2);
    let mut spans: Vec<(u32, u32)> = Vec::new();
    let mut start = 0;
    while start < len {
        let size = tile_size.min(len - start);
        match spans.last_mut() {
            Some((_, previous)) if size < min_edge => *previous += size,
            _ => spans.push((start, size)),
        }
        start += size;
    }
    spans
}

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

/// Everything computed for one image, flagged or not.
#[derive(Debug, Clone, PartialEq)]
pub struct ElaMeasurement {
    pub image: ImageId,
    pub error_map: ErrorMap,
    pub mean: f64,
    pub variance: f64,
    pub tile_count: usize,
    /// The tile with the highest mean error level.
    pub hottest: Option<TileMean>,
    /// `mean + k * stddev`.
    pub threshold: f64,
    /// Whether `hottest` qualifies as a localized anomaly.
    pub localized: bool,
}

impl ElaMeasurement {
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    pub fn localized_region(&self) -> Option<Region> {
        self.hottest.filter(|_| self.localized).map(|tile| tile.region)
    }

    /// Colourised error map with the flagged tile outlined.
    pub fn heatmap(&self) -> RgbImage {
        let mut heatmap: RgbImage = map_colors(self.error_map.levels(), |Luma([v])| heat(v));
        if let Some(region) = self.localized_region() {
            let rect =
                Rect::at(region.x as i32, region.y as i32).of_size(region.width, region.height);
            draw_hollow_rect_mut(&mut heatmap, rect, HIGHLIGHT);
        }
        heatmap
    }
}

/// Black -> red -> yellow -> white.
fn heat(level: u8) -> Rgb<u8> {
    let scaled = u32::from(level) * 3;
    let channel = |offset: u32| scaled.saturating_sub(offset).min(255) as u8;
    Rgb([channel(0), channel(255), channel(510)])
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Outcome of analysing a document's images.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElaReport {
    pub findings: Vec<Finding>,
    /// Images that were measured.
    pub analyzed: usize,
    /// Images that could not be decoded or were too small.
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct ElaAnalyzer {
    settings: ElaSettings,
    severity: u32,
}

impl ElaAnalyzer {
    pub fn new(config: &ForensicsConfig) -> Self {
        Self {
            settings: config.ela,
            severity: config.severity.weight(config.ela.severity),
        }
    }

    /// Decode, recompress, and measure one image.
    #[instrument(skip_all, fields(id = %image.id))]
    pub fn measure(&self, image: &EmbeddedImage) -> Result<ElaMeasurement> {
        let original = codec::decode(image, self.settings.max_pixels)?;
        let (width, height) = original.dimensions();
        let min = self.settings.min_dimension;
        if width < min || height < min {
            return Err(TamperError::UnsupportedImage(format!(
                "image {} is {width}x{height}, below the {min}px minimum",
                image.id
            )));
        }

        let recompressed = codec::jpeg_round_trip(&original, self.settings.jpeg_quality)?;
        let error_map = ErrorMap::compute(&original, &recompressed, self.settings.amplification)?;
        let (mean, variance) = error_map.statistics();
        let tiles = error_map.tile_means(self.settings.tile_size);
        let hottest = tiles
            .iter()
            .copied()
            .max_by(|a, b| a.mean.total_cmp(&b.mean));
        let threshold = mean + self.settings.sigma_threshold * variance.sqrt();

        let localized = tiles.len() >= 2
            && variance >= self.settings.noise_floor_variance
            && hottest.is_some_and(|tile| tile.mean > threshold);

        debug!(
            width,
            height,
            mean,
            variance,
            threshold,
            tiles = tiles.len(),
            localized,
            "Error level measured"
        );

        Ok(ElaMeasurement {
            image: image.id,
            error_map,
            mean,
            variance,
            tile_count: tiles.len(),
            hottest,
            threshold,
            localized,
        })
    }

    /// Measure every image; at most one finding per image. Images that fail
    /// are logged and counted, never propagated.
    #[instrument(skip_all, fields(images = images.len()))]
    pub fn analyze(&self, images: &[EmbeddedImage]) -> ElaReport {
        let mut report = ElaReport::default();

        for image in images {
            let measurement = match self.measure(image) {
                Ok(measurement) => measurement,
                Err(TamperError::UnsupportedImage(reason)) => {
                    debug!(id = %image.id, %reason, "Image skipped");
                    report.skipped += 1;
                    continue;
                }
                Err(err) => {
                    warn!(id = %image.id, error = %err, "Image could not be analysed");
                    report.skipped += 1;
                    continue;
                }
            };
            report.analyzed += 1;

            if let Some(tile) = measurement.hottest.filter(|_| measurement.localized) {
                let region = tile.region;
                report.findings.push(Finding::new(
                    Evidence::LocalizedErrorLevel {
                        image: image.id,
                        region,
                        region_mean: tile.mean,
                        threshold: measurement.threshold,
                    },
                    self.severity,
                    format!(
                        "localized splicing indicator in image {}: {}x{} region at ({}, {}) \
                         averages {:.1}, above {:.1} (image mean {:.1}, stddev {:.1})",
                        image.id,
                        region.width,
                        region.height,
                        region.x,
                        region.y,
                        tile.mean,
                        measurement.threshold,
                        measurement.mean,
                        measurement.std_dev()
                    ),
                ));
            }
        }

        report
    }
}
