//! Decomposition of an image into lines.
//!
//! The lines of a traversal are pairwise disjoint and together visit every
//! pixel exactly once, which is what allows them to be sorted independently.
use std::fmt;
use std::str;

use crate::buffer::{Coordinate, Dimensions};

/// An ordered path of pixels that gets partitioned into runs and sorted.
pub type Line = Vec<Coordinate>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalPattern {
    RowLtr,
    RowRtl,
    ColumnTtb,
    ColumnBtt,
    SpiralInward,
    SpiralOutward,
}

impl TraversalPattern {
    pub const ALL: [TraversalPattern; 6] = [
        TraversalPattern::RowLtr,
        TraversalPattern::RowRtl,
        TraversalPattern::ColumnTtb,
        TraversalPattern::ColumnBtt,
        TraversalPattern::SpiralInward,
        TraversalPattern::SpiralOutward,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TraversalPattern::RowLtr => "row-ltr",
            TraversalPattern::RowRtl => "row-rtl",
            TraversalPattern::ColumnTtb => "column-ttb",
            TraversalPattern::ColumnBtt => "column-btt",
            TraversalPattern::SpiralInward => "spiral-inward",
            TraversalPattern::SpiralOutward => "spiral-outward",
        }
    }

    /// Generates all lines of this pattern for an image of size `dims`.
    pub fn lines(self, dims: Dimensions) -> Vec<Line> {
        let Dimensions { width, height } = dims;
        if width == 0 || height == 0 {
            return Vec::new();
        }
        match self {
            TraversalPattern::RowLtr => (0..height)
                .map(|y| (0..width).map(|x| Coordinate::new(x, y)).collect())
                .collect(),
            TraversalPattern::RowRtl => (0..height)
                .map(|y| (0..width).rev().map(|x| Coordinate::new(x, y)).collect())
                .collect(),
            TraversalPattern::ColumnTtb => (0..width)
                .map(|x| (0..height).map(|y| Coordinate::new(x, y)).collect())
                .collect(),
            TraversalPattern::ColumnBtt => (0..width)
                .map(|x| (0..height).rev().map(|y| Coordinate::new(x, y)).collect())
                .collect(),
            TraversalPattern::SpiralInward => spiral_rings(dims),
            TraversalPattern::SpiralOutward => {
                // the exact reverse of the inward coordinate sequence: innermost ring first,
                // each ring walked backwards
                let mut rings = spiral_rings(dims);
                rings.reverse();
                rings.iter_mut().for_each(|ring| ring.reverse());
                rings
            }
        }
    }
}

impl fmt::Display for TraversalPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl str::FromStr for TraversalPattern {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "row-ltr" | "row-left-to-right" => Ok(TraversalPattern::RowLtr),
            "row-rtl" | "row-right-to-left" => Ok(TraversalPattern::RowRtl),
            "column-ttb" | "column-top-to-bottom" => Ok(TraversalPattern::ColumnTtb),
            "column-btt" | "column-bottom-to-top" => Ok(TraversalPattern::ColumnBtt),
            "spiral-inward" => Ok(TraversalPattern::SpiralInward),
            "spiral-outward" => Ok(TraversalPattern::SpiralOutward),
            _ => Err(String::from(s)),
        }
    }
}

/// Peels the bounding rectangle ring by ring, one line per ring.
///
/// Each ring runs along the top row left to right, down the right column,
/// back along the bottom row and up the left column. A ring that has
/// degenerated to a single row or column is emitted once, without doubling back.
fn spiral_rings(dims: Dimensions) -> Vec<Line> {
    let mut rings = Vec::new();
    let (mut top, mut left) = (0u32, 0u32);
    let (mut bottom, mut right) = (dims.height - 1, dims.width - 1);
    loop {
        let mut ring = Vec::with_capacity(2 * ((right - left + 1) + (bottom - top + 1)) as usize);
        ring.extend((left..=right).map(|x| Coordinate::new(x, top)));
        ring.extend((top + 1..=bottom).map(|y| Coordinate::new(right, y)));
        if bottom > top {
            ring.extend((left..right).rev().map(|x| Coordinate::new(x, bottom)));
        }
        if right > left && bottom > top + 1 {
            ring.extend((top + 1..bottom).rev().map(|y| Coordinate::new(left, y)));
        }
        rings.push(ring);

        if bottom - top < 2 || right - left < 2 {
            break;
        }
        top += 1;
        left += 1;
        bottom -= 1;
        right -= 1;
    }
    rings
}
