//! Dominant color extraction with modified median-cut quantization (MMCQ).
//!
//! Pixels are reduced to 5 bits per channel and counted in a dense histogram.
//! The color cube is then cut into boxes, first by population and then by
//! population × volume, and each box contributes its average color to the
//! palette.
//!
//! ```
//! let pixels = [255u8, 0, 0, 255].repeat(16);
//! let map = mmcq::quantize(&pixels, &mmcq::QuantizeConfig::new().max_colors(5)).unwrap();
//! assert_eq!(map.palette().len(), 1);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod error;
pub mod histogram;
pub mod median_cut;
pub mod palette;
pub mod vbox;

pub use error::{ParseColorError, QuantizeError};
pub use palette::{ColorMap, RgbText};
pub use rgb::{RGB8, RGBA8};
pub use vbox::{Channel, VBox};

use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Color counts accepted by [`extract_colors`] before clamping.
pub const EXTRACT_COLOR_RANGE: (u32, u32) = (1, 20);
/// Sampling strides accepted by [`extract_colors`] before clamping.
pub const EXTRACT_QUALITY_RANGE: (u32, u32) = (1, 10);

/// Configuration for palette extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizeConfig {
    /// Maximum number of palette colors (1..=256).
    pub max_colors: u32,
    /// Sampling stride: every `quality`-th pixel is read. 1 reads every pixel.
    pub quality: u32,
    /// Skip near-white pixels (all channels above 250).
    pub ignore_white: bool,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            max_colors: 5,
            quality: 10,
            ignore_white: true,
        }
    }
}

impl QuantizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_colors(mut self, n: u32) -> Self {
        self.max_colors = n;
        self
    }

    pub fn quality(mut self, q: u32) -> Self {
        self.quality = q;
        self
    }

    pub fn ignore_white(mut self, ignore: bool) -> Self {
        self.ignore_white = ignore;
        self
    }
}

/// Quantize a flat buffer of interleaved RGBA bytes.
pub fn quantize(pixels: &[u8], config: &QuantizeConfig) -> Result<ColorMap, QuantizeError> {
    if pixels.is_empty() {
        return Err(QuantizeError::EmptyBuffer);
    }
    if pixels.len() % 4 != 0 {
        return Err(QuantizeError::UnalignedBuffer { len: pixels.len() });
    }
    validate_config(config)?;

    let pixels = pixels
        .chunks_exact(4)
        .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]));
    run(pixels, config)
}

/// Quantize RGBA pixels.
pub fn quantize_rgba(pixels: &[RGBA8], config: &QuantizeConfig) -> Result<ColorMap, QuantizeError> {
    if pixels.is_empty() {
        return Err(QuantizeError::EmptyBuffer);
    }
    validate_config(config)?;
    run(pixels.iter().copied(), config)
}

/// Extract up to `color_count` colors as `rgb(R,G,B)` strings.
///
/// Host-facing wrapper around [`quantize`]: `color_count` is clamped to
/// [`EXTRACT_COLOR_RANGE`] and `quality` to [`EXTRACT_QUALITY_RANGE`] instead
/// of being rejected. The buffer itself is still validated.
pub fn extract_colors(
    pixels: &[u8],
    color_count: u32,
    quality: u32,
    ignore_white: bool,
) -> Result<Vec<String>, QuantizeError> {
    let color_count = color_count.clamp(EXTRACT_COLOR_RANGE.0, EXTRACT_COLOR_RANGE.1);
    let quality = quality.clamp(EXTRACT_QUALITY_RANGE.0, EXTRACT_QUALITY_RANGE.1);
    let config = QuantizeConfig::new()
        .max_colors(color_count)
        .quality(quality)
        .ignore_white(ignore_white);

    let map = quantize(pixels, &config)?;
    Ok(map
        .palette()
        .into_iter()
        .take(color_count as usize)
        .map(|color| RgbText(color).to_string())
        .collect())
}

fn run(
    pixels: impl Iterator<Item = RGBA8>,
    config: &QuantizeConfig,
) -> Result<ColorMap, QuantizeError> {
    let seed = histogram::build_histogram(pixels, config.quality as usize, config.ignore_white)?;
    let boxes = median_cut::median_cut(seed, config.max_colors as usize);
    log::debug!("quantized to {} colors (max {})", boxes.len(), config.max_colors);
    Ok(ColorMap::new(boxes))
}

fn validate_config(config: &QuantizeConfig) -> Result<(), QuantizeError> {
    if config.max_colors < 1 || config.max_colors > 256 {
        return Err(QuantizeError::InvalidMaxColors(config.max_colors));
    }
    if config.quality < 1 {
        return Err(QuantizeError::InvalidQuality(config.quality));
    }
    Ok(())
}
