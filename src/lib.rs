//! Pixel sorting along rows, columns and spirals, bounded by a soft mask.
//!
//! ```no_run
//! use glitchsort::{PixelSorter, SortKey, TraversalPattern, WhatToSort};
//!
//! # fn main() -> glitchsort::Result<()> {
//! let image = glitchsort::io::load("in.png")?;
//! let mask = glitchsort::io::load_mask("mask.png")?;
//! let sorted = PixelSorter::new(SortKey::Luminance)
//!     .pattern(TraversalPattern::ColumnBtt)
//!     .what_to_sort(WhatToSort::Background)
//!     .sort(&image, Some(&mask))?;
//! glitchsort::io::save(&sorted, "out.png")?;
//! # Ok(())
//! # }
//! ```
use std::cmp::Ordering;

pub mod buffer;
pub mod error;
pub mod interval;
pub mod io;
pub mod mask;
pub mod noise;
pub mod sorting;
pub mod traversal;

pub use self::buffer::{Coordinate, Dimensions, PixelBuffer};
pub use self::error::{Error, Result};
pub use self::interval::{Partitioner, Run};
pub use self::mask::{Mask, MaskOptions, WhatToSort};
pub use self::noise::{Perlin, PerlinOptions};
pub use self::sorting::SortKey;
pub use self::traversal::{Line, TraversalPattern};

/// Threshold used when none is configured, matching a `blur_include` of 0.5.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Sorts with the default threshold, noise seeded with 0 when `use_perlin` is set.
pub fn sort_pixels(
    image: &PixelBuffer,
    sort_by: SortKey,
    direction: TraversalPattern,
    mask: Option<&Mask>,
    use_perlin: bool,
    what_to_sort: WhatToSort,
) -> Result<PixelBuffer> {
    PixelSorter::new(sort_by)
        .pattern(direction)
        .what_to_sort(what_to_sort)
        .perlin(if use_perlin {
            Some(PerlinOptions::default())
        } else {
            None
        })
        .sort(image, mask)
}

/// Configuration of a sorting pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelSorter {
    sort_by: SortKey,
    pattern: TraversalPattern,
    what: WhatToSort,
    threshold: f32,
    perlin: Option<PerlinOptions>,
    blend: bool,
}

/// A pixel moving from `from` to `to` within one run.
#[derive(Debug, Clone, Copy)]
struct Placement {
    from: Coordinate,
    to: Coordinate,
    weight: f32,
}

impl PixelSorter {
    pub fn new(sort_by: SortKey) -> Self {
        PixelSorter {
            sort_by,
            pattern: TraversalPattern::RowLtr,
            what: WhatToSort::default(),
            threshold: DEFAULT_THRESHOLD,
            perlin: None,
            blend: false,
        }
    }

    pub fn pattern(mut self, pattern: TraversalPattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn what_to_sort(mut self, what: WhatToSort) -> Self {
        self.what = what;
        self
    }

    /// Pixels whose inclusion weight exceeds `threshold` are sorted.
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Derives the threshold from the mask's `blur_include`, including more of
    /// the soft mask edge the closer it is to 1.
    pub fn threshold_from_blur_include(self, blur_include: f32) -> Self {
        self.threshold(1.0 - blur_include)
    }

    pub fn perlin(mut self, perlin: Option<PerlinOptions>) -> Self {
        self.perlin = perlin;
        self
    }

    /// Blends sorted pixels with the originals by their inclusion weight.
    pub fn blend(mut self, blend: bool) -> Self {
        self.blend = blend;
        self
    }

    /// Checks every precondition of [`sort`](Self::sort) without touching any pixels.
    pub fn validate(&self, image: &PixelBuffer, mask: Option<&Mask>) -> Result<()> {
        if let Some(mask) = mask {
            if mask.dimensions() != image.dimensions() {
                return Err(Error::InvalidDimensions {
                    image: image.dimensions().as_tuple(),
                    mask: mask.dimensions().as_tuple(),
                });
            }
        }
        if self.sort_by.requires_alpha() && !image.has_alpha() {
            return Err(Error::UnsupportedChannelForKey {
                key: self.sort_by,
                channels: image.channels(),
            });
        }
        error::check_unit("threshold", self.threshold)?;
        if let Some(perlin) = &self.perlin {
            perlin.validate()?;
        }
        Ok(())
    }

    /// Returns a sorted copy of `image`, the input is left as is.
    pub fn sort(&self, image: &PixelBuffer, mask: Option<&Mask>) -> Result<PixelBuffer> {
        self.validate(image, mask)?;

        let lines = self.pattern.lines(image.dimensions());
        let noise = self.perlin.map(Perlin::new);
        let partitioner = Partitioner::new(mask, self.what, self.threshold).with_noise(noise.as_ref());
        if noise.is_some() && !partitioner.is_masked() {
            log::warn!("perlin noise only moves mask boundaries and has no effect without a mask");
        }
        log::debug!(
            "sorting {}x{} image by {} along {} lines ({})",
            image.width(),
            image.height(),
            self.sort_by,
            lines.len(),
            self.pattern
        );

        #[cfg(feature = "rayon")]
        let placements: Vec<Vec<Placement>> = {
            use rayon::prelude::*;
            lines
                .par_iter()
                .map(|line| self.sort_line(image, &partitioner, line))
                .collect()
        };
        #[cfg(not(feature = "rayon"))]
        let placements: Vec<Vec<Placement>> = lines
            .iter()
            .map(|line| self.sort_line(image, &partitioner, line))
            .collect();

        let mut output = image.clone();
        let mut moved = 0usize;
        for placement in placements.into_iter().flatten() {
            moved += 1;
            if self.blend && placement.weight < 1.0 {
                let blended = blend(
                    image.pixel(placement.from),
                    image.pixel(placement.to),
                    placement.weight,
                );
                output.put_pixel(placement.to, &blended);
            } else {
                output.put_pixel(placement.to, image.pixel(placement.from));
            }
        }
        log::debug!("moved {} of {} pixels", moved, image.dimensions().area());
        Ok(output)
    }

    /// Sorts the included runs of `line` and returns where each pixel goes.
    fn sort_line(
        &self,
        image: &PixelBuffer,
        partitioner: &Partitioner<'_>,
        line: &[Coordinate],
    ) -> Vec<Placement> {
        let dims = image.dimensions();
        let mut placements = Vec::new();
        // allocate buffer outside to prevent frequent reallocations
        let mut scratch: Vec<(f64, Coordinate)> = Vec::new();
        for run in partitioner.partition(line) {
            if !run.included || run.len() < 2 {
                continue;
            }
            let positions = &line[run.range];
            scratch.extend(
                positions
                    .iter()
                    .map(|&at| (self.sort_by.extract(image.rgba(at), at, dims), at)),
            );
            // `sort_by` is stable, equal keys keep their order along the line
            scratch.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
            placements.extend(
                positions
                    .iter()
                    .zip(scratch.drain(..))
                    .filter(|(&to, (_, from))| to != *from)
                    .map(|(&to, (_, from))| Placement {
                        from,
                        to,
                        weight: partitioner.weight(to),
                    }),
            );
        }
        placements
    }
}

fn blend(sorted: &[u8], original: &[u8], weight: f32) -> [u8; 4] {
    let mut out = [0u8; 4];
    for ((slot, &s), &o) in out.iter_mut().zip(sorted).zip(original) {
        let mixed = weight * s as f32 + (1.0 - weight) * o as f32;
        *slot = mixed.round().max(0.0).min(255.0) as u8;
    }
    out
}
