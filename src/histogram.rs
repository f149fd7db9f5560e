extern crate alloc;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use rgb::RGBA8;

use crate::error::QuantizeError;
use crate::vbox::VBox;

/// Bits kept per channel when reducing 8-bit colors into histogram space.
pub const SIGNAL_BITS: u32 = 5;
/// Shift that maps an 8-bit channel onto a reduced coordinate.
pub const RIGHT_SHIFT: u32 = 8 - SIGNAL_BITS;
/// Width of one reduced bucket in 8-bit channel units.
pub const MULTIPLIER: u32 = 1 << RIGHT_SHIFT;
/// Side length of the reduced color cube.
pub const VBOX_LENGTH: usize = 1 << SIGNAL_BITS;
/// Number of buckets in the histogram.
pub const HISTOGRAM_SIZE: usize = 1 << (3 * SIGNAL_BITS);

/// Pixels with alpha at or below this value are treated as transparent and skipped.
pub const ALPHA_THRESHOLD: u8 = 125;
/// Channels above this value count as "white" when white pixels are ignored.
pub const WHITE_THRESHOLD: u8 = 250;

/// Concatenate three reduced coordinates into a histogram index.
#[inline]
pub fn color_index(r: u8, g: u8, b: u8) -> usize {
    ((r as usize) << (2 * SIGNAL_BITS)) | ((g as usize) << SIGNAL_BITS) | b as usize
}

/// Dense pixel-count table over the reduced color space.
///
/// Built once per quantization and shared read-only by every [`VBox`] cut from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    bins: Vec<u32>,
}

impl Histogram {
    /// An all-zero histogram.
    pub fn new() -> Self {
        Self {
            bins: vec![0; HISTOGRAM_SIZE],
        }
    }

    /// Add one pixel to the bucket at `index`.
    pub fn increment(&mut self, index: usize) -> Result<(), QuantizeError> {
        let bin = self
            .bins
            .get_mut(index)
            .ok_or(QuantizeError::IndexOutOfRange { index })?;
        *bin += 1;
        Ok(())
    }

    /// Pixel count of the bucket at reduced coordinates `(r, g, b)`.
    #[inline]
    pub fn get(&self, r: u8, g: u8, b: u8) -> u32 {
        self.bins[color_index(r, g, b)]
    }

    /// Sum of all buckets.
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|&n| n as u64).sum()
    }

    /// Number of non-empty buckets.
    pub fn populated(&self) -> usize {
        self.bins.iter().filter(|&&n| n > 0).count()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan RGBA pixels and build the histogram plus the seed box spanning every kept color.
///
/// Every `quality`-th pixel is sampled. Translucent pixels are skipped, as are
/// near-white pixels when `ignore_white` is set.
pub fn build_histogram(
    pixels: impl IntoIterator<Item = RGBA8>,
    quality: usize,
    ignore_white: bool,
) -> Result<VBox, QuantizeError> {
    let mut histogram = Histogram::new();
    let mut min = [u8::MAX; 3];
    let mut max = [u8::MIN; 3];
    let mut sampled = 0usize;
    let mut kept = 0usize;

    for RGBA8 { r, g, b, a } in pixels.into_iter().step_by(quality.max(1)) {
        sampled += 1;

        if a <= ALPHA_THRESHOLD {
            continue;
        }
        if ignore_white && r > WHITE_THRESHOLD && g > WHITE_THRESHOLD && b > WHITE_THRESHOLD {
            continue;
        }

        let reduced = [r >> RIGHT_SHIFT, g >> RIGHT_SHIFT, b >> RIGHT_SHIFT];
        for c in 0..3 {
            min[c] = min[c].min(reduced[c]);
            max[c] = max[c].max(reduced[c]);
        }

        histogram.increment(color_index(reduced[0], reduced[1], reduced[2]))?;
        kept += 1;
    }

    log::debug!(
        "histogram: sampled {sampled} pixels, kept {kept}, {} populated buckets",
        histogram.populated()
    );

    if kept == 0 {
        return Err(QuantizeError::NoSampledPixels);
    }

    log::debug!("seed box bounds: min {min:?}, max {max:?}");
    Ok(VBox::new(min, max, Arc::new(histogram)))
}
