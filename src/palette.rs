extern crate alloc;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use rgb::RGB8;

use crate::error::ParseColorError;
use crate::vbox::VBox;

/// The quantization result: the final boxes, most significant first.
#[derive(Debug, Clone)]
pub struct ColorMap {
    vboxes: Vec<VBox>,
}

impl ColorMap {
    pub(crate) fn new(vboxes: Vec<VBox>) -> Self {
        Self { vboxes }
    }

    /// One averaged color per box, in box order.
    pub fn palette(&self) -> Vec<RGB8> {
        self.vboxes.iter().map(VBox::average).collect()
    }

    /// The palette entry closest to `color` by sum of absolute channel differences.
    ///
    /// The first entry wins on ties. Returns black for an empty map.
    pub fn nearest_color(&self, color: RGB8) -> RGB8 {
        self.nearest_index(color)
            .map(|i| self.vboxes[i].average())
            .unwrap_or_default()
    }

    /// Index of the palette entry [`nearest_color`](Self::nearest_color) would return.
    pub fn nearest_index(&self, color: RGB8) -> Option<usize> {
        let mut best = None;
        let mut best_dist = u32::MAX;

        for (i, vbox) in self.vboxes.iter().enumerate() {
            let d = manhattan(color, vbox.average());
            if d < best_dist {
                best_dist = d;
                best = Some(i);
            }
        }
        best
    }

    /// The boxes behind the palette.
    pub fn boxes(&self) -> &[VBox] {
        &self.vboxes
    }

    /// Number of palette entries.
    pub fn len(&self) -> usize {
        self.vboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vboxes.is_empty()
    }
}

fn manhattan(a: RGB8, b: RGB8) -> u32 {
    a.r.abs_diff(b.r) as u32 + a.g.abs_diff(b.g) as u32 + a.b.abs_diff(b.b) as u32
}

/// A color in its `rgb(R,G,B)` text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbText(pub RGB8);

impl fmt::Display for RgbText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let RGB8 { r, g, b } = self.0;
        write!(f, "rgb({r},{g},{b})")
    }
}

impl FromStr for RgbText {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or(ParseColorError::Syntax)?;

        let mut channels = [0u8; 3];
        let mut parts = inner.split(',');
        for channel in &mut channels {
            let part = parts.next().ok_or(ParseColorError::Syntax)?.trim();
            *channel = part
                .parse()
                .map_err(|_| ParseColorError::Channel(part.into()))?;
        }
        if parts.next().is_some() {
            return Err(ParseColorError::Syntax);
        }

        let [r, g, b] = channels;
        Ok(Self(RGB8::new(r, g, b)))
    }
}

impl From<RGB8> for RgbText {
    fn from(color: RGB8) -> Self {
        Self(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::{Histogram, color_index};
    use alloc::string::ToString;
    use alloc::sync::Arc;
    use alloc::vec;

    /// One single-cell box per reduced coordinate, each holding one pixel.
    fn color_map(cells: &[[u8; 3]]) -> ColorMap {
        let mut hist = Histogram::new();
        for c in cells {
            hist.increment(color_index(c[0], c[1], c[2])).unwrap();
        }
        let hist = Arc::new(hist);
        let boxes = cells
            .iter()
            .map(|&c| VBox::new(c, c, Arc::clone(&hist)))
            .collect();
        ColorMap::new(boxes)
    }

    #[test]
    fn palette_preserves_box_order() {
        let map = color_map(&[[31, 0, 0], [0, 31, 0], [0, 0, 31]]);
        assert_eq!(
            map.palette(),
            vec![
                RGB8::new(252, 4, 4),
                RGB8::new(4, 252, 4),
                RGB8::new(4, 4, 252)
            ]
        );
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn nearest_of_a_palette_entry_is_itself() {
        let map = color_map(&[[31, 0, 0], [0, 31, 0], [10, 10, 10]]);
        for entry in map.palette() {
            assert_eq!(map.nearest_color(entry), entry);
        }
    }

    #[test]
    fn nearest_uses_channel_difference_sum() {
        let map = color_map(&[[31, 0, 0], [0, 31, 0], [10, 10, 10]]);
        assert_eq!(map.nearest_color(RGB8::new(200, 30, 10)), RGB8::new(252, 4, 4));
        assert_eq!(map.nearest_color(RGB8::new(90, 90, 90)), RGB8::new(84, 84, 84));
        assert_eq!(map.nearest_index(RGB8::new(0, 255, 0)), Some(1));
    }

    #[test]
    fn first_entry_wins_ties() {
        // 4 and 12: a query at 8 is equally far from both.
        let map = color_map(&[[0, 0, 0], [1, 0, 0]]);
        assert_eq!(map.nearest_index(RGB8::new(8, 4, 4)), Some(0));
    }

    #[test]
    fn empty_map_has_no_nearest() {
        let map = ColorMap::new(Vec::new());
        assert!(map.is_empty());
        assert_eq!(map.nearest_index(RGB8::new(1, 2, 3)), None);
        assert_eq!(map.nearest_color(RGB8::new(1, 2, 3)), RGB8::new(0, 0, 0));
    }

    #[test]
    fn text_form() {
        assert_eq!(RgbText(RGB8::new(255, 0, 12)).to_string(), "rgb(255,0,12)");
        assert_eq!(
            "rgb(1, 2 ,3)".parse::<RgbText>(),
            Ok(RgbText(RGB8::new(1, 2, 3)))
        );
        assert_eq!("rgb(1,2)".parse::<RgbText>(), Err(ParseColorError::Syntax));
        assert_eq!("rgb(1,2,3,4)".parse::<RgbText>(), Err(ParseColorError::Syntax));
        assert_eq!("#010203".parse::<RgbText>(), Err(ParseColorError::Syntax));
        assert_eq!(
            "rgb(1,2,256)".parse::<RgbText>(),
            Err(ParseColorError::Channel("256".into()))
        );
    }
}
