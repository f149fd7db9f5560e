extern crate alloc;
use alloc::sync::Arc;
use core::cell::Cell;
use core::fmt;

use rgb::RGB8;

use crate::histogram::{Histogram, MULTIPLIER, VBOX_LENGTH};

/// One axis of the reduced color cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    /// Position of this channel in `[r, g, b]` arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

/// A value computed on first read and kept until explicitly recomputed.
struct Cached<T: Copy>(Cell<Option<T>>);

impl<T: Copy> Cached<T> {
    fn empty() -> Self {
        Self(Cell::new(None))
    }

    fn get_or_compute(&self, compute: impl FnOnce() -> T) -> T {
        match self.0.get() {
            Some(value) => value,
            None => self.recompute(compute),
        }
    }

    fn recompute(&self, compute: impl FnOnce() -> T) -> T {
        let value = compute();
        self.0.set(Some(value));
        value
    }

    fn peek(&self) -> Option<T> {
        self.0.get()
    }
}

impl<T: Copy> Clone for Cached<T> {
    fn clone(&self) -> Self {
        Self(Cell::new(self.0.get()))
    }
}

/// An axis-aligned box of the reduced color cube.
///
/// Bounds are inclusive on every axis and fixed at construction. Volume,
/// pixel count and average color are computed from the shared histogram on
/// first access and cached; the `recompute_*` methods refresh them.
#[derive(Clone)]
pub struct VBox {
    min: [u8; 3],
    max: [u8; 3],
    histogram: Arc<Histogram>,
    volume: Cached<u32>,
    count: Cached<u32>,
    average: Cached<RGB8>,
}

impl VBox {
    /// Create a box over `[min, max]` (inclusive) backed by `histogram`.
    ///
    /// # Panics
    /// If any `min` exceeds its `max`, or a bound lies outside the reduced cube.
    pub fn new(min: [u8; 3], max: [u8; 3], histogram: Arc<Histogram>) -> Self {
        for c in 0..3 {
            assert!(
                min[c] <= max[c] && (max[c] as usize) < VBOX_LENGTH,
                "invalid box bounds {min:?}..={max:?}"
            );
        }
        Self {
            min,
            max,
            histogram,
            volume: Cached::empty(),
            count: Cached::empty(),
            average: Cached::empty(),
        }
    }

    /// A box sharing this one's histogram and bounds, except `channel` spans `lo..=hi`.
    pub(crate) fn with_range(&self, channel: Channel, lo: u8, hi: u8) -> Self {
        let mut min = self.min;
        let mut max = self.max;
        min[channel.index()] = lo;
        max[channel.index()] = hi;
        Self::new(min, max, Arc::clone(&self.histogram))
    }

    /// Lower bounds `[r, g, b]`.
    pub fn min(&self) -> [u8; 3] {
        self.min
    }

    /// Upper bounds `[r, g, b]`, inclusive.
    pub fn max(&self) -> [u8; 3] {
        self.max
    }

    /// Inclusive bounds along one channel.
    pub fn range(&self, channel: Channel) -> (u8, u8) {
        (self.min[channel.index()], self.max[channel.index()])
    }

    /// The histogram this box was cut from.
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Number of reduced-space cells inside the box.
    pub fn volume(&self) -> u32 {
        self.volume.get_or_compute(|| self.compute_volume())
    }

    /// Number of histogram pixels inside the box.
    pub fn count(&self) -> u32 {
        self.count.get_or_compute(|| self.compute_count())
    }

    /// Histogram-weighted mean color, or the box midpoint when the box is empty.
    pub fn average(&self) -> RGB8 {
        self.average.get_or_compute(|| self.compute_average())
    }

    pub fn recompute_volume(&self) -> u32 {
        self.volume.recompute(|| self.compute_volume())
    }

    pub fn recompute_count(&self) -> u32 {
        self.count.recompute(|| self.compute_count())
    }

    pub fn recompute_average(&self) -> RGB8 {
        self.average.recompute(|| self.compute_average())
    }

    /// The channel with the greatest extent. Ties prefer red, then green.
    pub fn widest_channel(&self) -> Channel {
        let r = self.max[0] - self.min[0];
        let g = self.max[1] - self.min[1];
        let b = self.max[2] - self.min[2];

        if r >= g && r >= b {
            Channel::Red
        } else if g >= b {
            Channel::Green
        } else {
            Channel::Blue
        }
    }

    fn compute_volume(&self) -> u32 {
        (0..3)
            .map(|c| (self.max[c] - self.min[c]) as u32 + 1)
            .product()
    }

    fn compute_count(&self) -> u32 {
        let mut count = 0;
        for r in self.min[0]..=self.max[0] {
            for g in self.min[1]..=self.max[1] {
                for b in self.min[2]..=self.max[2] {
                    count += self.histogram.get(r, g, b);
                }
            }
        }
        count
    }

    fn compute_average(&self) -> RGB8 {
        // Bucket centers in 8-bit units: (coord + 0.5) * MULTIPLIER.
        let center = |coord: u8| coord as u64 * MULTIPLIER as u64 + (MULTIPLIER / 2) as u64;

        let mut total = 0u64;
        let mut sums = [0u64; 3];
        for r in self.min[0]..=self.max[0] {
            for g in self.min[1]..=self.max[1] {
                for b in self.min[2]..=self.max[2] {
                    let n = self.histogram.get(r, g, b) as u64;
                    if n == 0 {
                        continue;
                    }
                    total += n;
                    sums[0] += n * center(r);
                    sums[1] += n * center(g);
                    sums[2] += n * center(b);
                }
            }
        }

        if total > 0 {
            RGB8::new(
                (sums[0] / total) as u8,
                (sums[1] / total) as u8,
                (sums[2] / total) as u8,
            )
        } else {
            let mid = |c: usize| {
                let v = MULTIPLIER * (self.min[c] as u32 + self.max[c] as u32 + 1) / 2;
                v.min(255) as u8
            };
            RGB8::new(mid(0), mid(1), mid(2))
        }
    }
}

impl fmt::Debug for VBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VBox")
            .field("min", &self.min)
            .field("max", &self.max)
            .field("volume", &self.volume.peek())
            .field("count", &self.count.peek())
            .field("average", &self.average.peek())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::color_index;

    fn histogram_with(cells: &[([u8; 3], u32)]) -> Arc<Histogram> {
        let mut hist = Histogram::new();
        for &([r, g, b], n) in cells {
            for _ in 0..n {
                hist.increment(color_index(r, g, b)).unwrap();
            }
        }
        Arc::new(hist)
    }

    #[test]
    fn volume_is_product_of_inclusive_extents() {
        let vbox = VBox::new([1, 2, 3], [4, 2, 10], histogram_with(&[]));
        assert_eq!(vbox.volume(), 32);
        let full = VBox::new([0; 3], [31; 3], histogram_with(&[]));
        assert_eq!(full.volume(), 32 * 32 * 32);
    }

    #[test]
    fn count_only_includes_cells_inside() {
        let hist = histogram_with(&[([1, 1, 1], 3), ([2, 2, 2], 5), ([9, 9, 9], 7)]);
        let vbox = VBox::new([0; 3], [2; 3], hist);
        assert_eq!(vbox.count(), 8);
    }

    #[test]
    fn average_uses_bucket_centers() {
        let hist = histogram_with(&[([31, 0, 0], 4)]);
        let vbox = VBox::new([31, 0, 0], [31, 0, 0], hist);
        assert_eq!(vbox.average(), RGB8::new(252, 4, 4));
    }

    #[test]
    fn average_is_weighted_by_count() {
        // Centers 4 and 36, weighted 3:1 -> (12 + 36) / 4 = 12.
        let hist = histogram_with(&[([0, 0, 0], 3), ([4, 0, 0], 1)]);
        let vbox = VBox::new([0; 3], [4, 0, 0], hist);
        assert_eq!(vbox.average(), RGB8::new(12, 4, 4));
    }

    #[test]
    fn empty_box_averages_to_midpoint() {
        let vbox = VBox::new([0, 10, 31], [1, 20, 31], histogram_with(&[]));
        assert_eq!(vbox.count(), 0);
        // 8 * 2 / 2, 8 * 31 / 2, min(8 * 63 / 2, 255)
        assert_eq!(vbox.average(), RGB8::new(8, 124, 252));

        let top = VBox::new([31; 3], [31; 3], histogram_with(&[]));
        assert_eq!(top.average(), RGB8::new(252, 252, 252));
    }

    #[test]
    fn cached_values_are_stable() {
        let hist = histogram_with(&[([3, 4, 5], 2), ([6, 4, 5], 9)]);
        let vbox = VBox::new([0, 0, 0], [10, 10, 10], hist);
        assert_eq!(vbox.count(), vbox.count());
        assert_eq!(vbox.volume(), vbox.volume());
        assert_eq!(vbox.average(), vbox.average());
        assert_eq!(vbox.recompute_count(), vbox.count());
        assert_eq!(vbox.recompute_volume(), 1331);
        assert_eq!(vbox.recompute_average(), vbox.average());
    }

    #[test]
    fn widest_channel_prefers_red_then_green() {
        let hist = histogram_with(&[]);
        let cube = VBox::new([0; 3], [5; 3], Arc::clone(&hist));
        assert_eq!(cube.widest_channel(), Channel::Red);
        let gb = VBox::new([0; 3], [1, 5, 5], Arc::clone(&hist));
        assert_eq!(gb.widest_channel(), Channel::Green);
        let b = VBox::new([0; 3], [1, 2, 5], hist);
        assert_eq!(b.widest_channel(), Channel::Blue);
    }

    #[test]
    fn with_range_shares_histogram() {
        let hist = histogram_with(&[([1, 1, 1], 1), ([8, 1, 1], 1)]);
        let parent = VBox::new([0, 0, 0], [8, 2, 2], hist);
        let child = parent.with_range(Channel::Red, 5, 8);
        assert_eq!(child.min(), [5, 0, 0]);
        assert_eq!(child.max(), [8, 2, 2]);
        assert_eq!(child.count(), 1);
        assert!(core::ptr::eq(parent.histogram(), child.histogram()));
    }

    #[test]
    #[should_panic]
    fn inverted_bounds_rejected() {
        VBox::new([3, 0, 0], [2, 0, 0], histogram_with(&[]));
    }
}
