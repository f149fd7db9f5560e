extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::histogram::VBOX_LENGTH;
use crate::vbox::{Channel, VBox};

/// Upper bound on split attempts per refinement phase.
pub const MAX_ITERATIONS: usize = 1000;

/// Result of trying to split a box.
#[derive(Debug, Clone)]
pub enum Cut {
    /// The box holds no pixels.
    Empty,
    /// The box cannot be split further and is returned as is.
    Whole(VBox),
    /// The two halves along the widest channel, lower half first.
    Halves(VBox, VBox),
}

/// Split `vbox` at the median of its widest channel.
///
/// Boxes with fewer than two pixels, or only one cell along the widest
/// channel, come back [`Cut::Whole`].
pub fn split(vbox: VBox) -> Cut {
    match vbox.count() {
        0 => return Cut::Empty,
        1 => return Cut::Whole(vbox),
        _ => {}
    }

    let axis = vbox.widest_channel();
    let (lo, hi) = vbox.range(axis);
    if lo == hi {
        return Cut::Whole(vbox);
    }

    let (partial, total) = partial_sums(&vbox, axis);
    match split_point(&partial, total, lo as usize, hi as usize) {
        Some(d) => {
            log::trace!("split {:?} on {axis:?} at {d}", vbox.range(axis));
            let d = d as u8;
            Cut::Halves(vbox.with_range(axis, lo, d), vbox.with_range(axis, d + 1, hi))
        }
        None => Cut::Whole(vbox),
    }
}

/// Running pixel totals along `axis`: `partial[i]` is the mass at coordinates `<= i`.
fn partial_sums(vbox: &VBox, axis: Channel) -> ([u32; VBOX_LENGTH], u32) {
    let a = axis.index();
    let (o1, o2) = match axis {
        Channel::Red => (1, 2),
        Channel::Green => (0, 2),
        Channel::Blue => (0, 1),
    };
    let (min, max) = (vbox.min(), vbox.max());
    let histogram = vbox.histogram();

    let mut partial = [0u32; VBOX_LENGTH];
    let mut total = 0u32;
    for i in min[a]..=max[a] {
        let mut coords = [0u8; 3];
        coords[a] = i;
        for j in min[o1]..=max[o1] {
            coords[o1] = j;
            for k in min[o2]..=max[o2] {
                coords[o2] = k;
                total += histogram.get(coords[0], coords[1], coords[2]);
            }
        }
        partial[i as usize] = total;
    }
    (partial, total)
}

/// Pick the last coordinate of the lower half, always in `lo..hi`.
fn split_point(partial: &[u32], total: u32, lo: usize, hi: usize) -> Option<usize> {
    let look_ahead = |d: usize| total - partial[d];

    let i = (lo..=hi).find(|&i| partial[i] > total / 2)?;
    let left = i - lo;
    let right = hi - i;

    // Lean into the larger side so neither half ends up one cell wide.
    let mut d = if left <= right {
        (hi - 1).min(i + right / 2)
    } else {
        lo.max(i - 1 - left / 2)
    };

    while d + 1 < hi && partial[d] == 0 {
        d += 1;
    }
    while look_ahead(d) == 0 && d > lo && partial[d - 1] > 0 {
        d -= 1;
    }
    Some(d)
}

/// Priority used to pick the next box to split. The last box after sorting is split first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending pixel count.
    Count,
    /// Ascending pixel count times volume; equal counts compare by volume.
    CountTimesVolume,
}

impl SortOrder {
    pub fn compare(self, a: &VBox, b: &VBox) -> Ordering {
        match self {
            Self::Count => a.count().cmp(&b.count()),
            Self::CountTimesVolume => {
                let (a_count, b_count) = (a.count(), b.count());
                if a_count == b_count {
                    a.volume().cmp(&b.volume())
                } else {
                    let a_product = a_count as u64 * a.volume() as u64;
                    let b_product = b_count as u64 * b.volume() as u64;
                    a_product.cmp(&b_product)
                }
            }
        }
    }

    /// Stable sort, lowest priority first.
    pub fn sort(self, boxes: &mut [VBox]) {
        boxes.sort_by(|a, b| self.compare(a, b));
    }
}

/// Split the highest-priority box of `queue` until it holds `target` boxes.
///
/// `queue` must be sorted by `order` on entry and is sorted again on return.
/// Boxes that cannot be split are set aside for the rest of the phase; empty
/// halves are dropped. Returns the number of iterations used.
pub fn iterate(queue: &mut Vec<VBox>, order: SortOrder, target: usize) -> usize {
    let mut settled = Vec::new();
    let mut iterations = 0;

    while iterations < MAX_ITERATIONS {
        if queue.len() + settled.len() >= target {
            break;
        }
        let Some(vbox) = queue.pop() else {
            break;
        };
        iterations += 1;

        match split(vbox) {
            Cut::Empty => {}
            Cut::Whole(vbox) => settled.push(vbox),
            Cut::Halves(lower, upper) => {
                queue.extend([lower, upper].into_iter().filter(|half| half.count() > 0));
                order.sort(queue);
            }
        }
    }

    if iterations == MAX_ITERATIONS {
        log::warn!("{order:?} phase stopped at the iteration cap ({MAX_ITERATIONS})");
    }

    queue.append(&mut settled);
    order.sort(queue);
    log::debug!(
        "{order:?} phase: {} boxes after {iterations} iterations (target {target})",
        queue.len()
    );
    iterations
}

/// Partition `seed` into at most `max_colors` non-empty boxes.
///
/// Population drives the first three quarters of the splits, then
/// count × volume takes over. The result is ordered most significant first.
pub fn median_cut(seed: VBox, max_colors: usize) -> Vec<VBox> {
    if max_colors == 0 {
        return Vec::new();
    }
    let mut queue = vec![seed];

    // round(0.75 * max_colors)
    let population_target = ((3 * max_colors + 2) / 4).max(1);
    iterate(&mut queue, SortOrder::Count, population_target);

    SortOrder::CountTimesVolume.sort(&mut queue);
    iterate(&mut queue, SortOrder::CountTimesVolume, max_colors);

    queue.reverse();
    queue
}
