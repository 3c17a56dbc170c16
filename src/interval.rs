//! Splitting lines into runs.
use std::ops::Range;

use crate::buffer::Coordinate;
use crate::mask::{Mask, WhatToSort};
use crate::noise::Perlin;

/// A contiguous stretch of a line, as indices into that line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub range: Range<usize>,
    /// Whether the run takes part in sorting. Excluded runs are left untouched.
    pub included: bool,
}

impl Run {
    pub fn len(&self) -> usize {
        self.range.end - self.range.start
    }

    pub fn is_empty(&self) -> bool {
        self.range.start >= self.range.end
    }
}

/// Decides per pixel whether it is sorted and groups a line accordingly.
///
/// A pixel is included when its weight (see [`WhatToSort::weight`]) is
/// strictly greater than the threshold, optionally shifted by noise. Weights
/// of 0 are never included and weights of 1 always are, whatever the
/// threshold.
#[derive(Clone, Copy)]
pub struct Partitioner<'a> {
    mask: Option<&'a Mask>,
    what: WhatToSort,
    threshold: f32,
    noise: Option<&'a Perlin>,
}

impl<'a> Partitioner<'a> {
    pub fn new(mask: Option<&'a Mask>, what: WhatToSort, threshold: f32) -> Self {
        Partitioner {
            mask,
            what,
            threshold,
            noise: None,
        }
    }

    pub fn with_noise(mut self, noise: Option<&'a Perlin>) -> Self {
        self.noise = noise;
        self
    }

    /// Whether the mask is consulted at all.
    pub fn is_masked(&self) -> bool {
        self.mask.is_some() && self.what != WhatToSort::All
    }

    /// The effective threshold at `at`.
    #[inline]
    pub fn threshold_at(&self, at: Coordinate) -> f32 {
        match self.noise {
            Some(noise) => self.threshold + noise.offset(at.x, at.y),
            None => self.threshold,
        }
    }

    /// The inclusion weight of the pixel at `at`, 1.0 when unmasked.
    #[inline]
    pub fn weight(&self, at: Coordinate) -> f32 {
        match self.mask {
            Some(mask) if self.what != WhatToSort::All => self.what.weight(mask.get(at)),
            _ => 1.0,
        }
    }

    #[inline]
    pub fn is_included(&self, at: Coordinate) -> bool {
        if !self.is_masked() {
            return true;
        }
        let weight = self.weight(at);
        if weight <= 0.0 {
            false
        } else if weight >= 1.0 {
            true
        } else {
            weight > self.threshold_at(at)
        }
    }

    /// Splits `line` into maximal runs of equal inclusion, in line order.
    pub fn partition(&self, line: &[Coordinate]) -> Vec<Run> {
        if line.is_empty() {
            return Vec::new();
        }
        if !self.is_masked() {
            return vec![Run {
                range: 0..line.len(),
                included: true,
            }];
        }
        let mut runs = Vec::new();
        let mut start = 0;
        let mut current = self.is_included(line[0]);
        for (idx, &at) in line.iter().enumerate().skip(1) {
            let included = self.is_included(at);
            if included != current {
                runs.push(Run {
                    range: start..idx,
                    included: current,
                });
                start = idx;
                current = included;
            }
        }
        runs.push(Run {
            range: start..line.len(),
            included: current,
        });
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::PerlinOptions;

    fn row(width: u32) -> Vec<Coordinate> {
        (0..width).map(|x| Coordinate::new(x, 0)).collect()
    }

    fn run(range: Range<usize>, included: bool) -> Run {
        Run { range, included }
    }

    #[test]
    fn unmasked_line_is_one_run() {
        let line = row(6);
        let partitioner = Partitioner::new(None, WhatToSort::Background, 0.5);
        assert_eq!(partitioner.partition(&line), vec![run(0..6, true)]);

        let mask = Mask::filled(6, 1, 0.0);
        let all = Partitioner::new(Some(&mask), WhatToSort::All, 0.5);
        assert_eq!(all.partition(&line), vec![run(0..6, true)]);
        assert!(Partitioner::new(None, WhatToSort::All, 0.5).partition(&[]).is_empty());
    }

    #[test]
    fn foreground_runs_follow_the_mask() {
        let mask = Mask::from_values(6, 1, vec![1.0, 1.0, 0.0, 0.0, 1.0, 1.0]).unwrap();
        let partitioner = Partitioner::new(Some(&mask), WhatToSort::Foreground, 0.5);
        assert_eq!(
            partitioner.partition(&row(6)),
            vec![run(0..2, true), run(2..4, false), run(4..6, true)]
        );
    }

    #[test]
    fn background_selects_low_values() {
        let mask = Mask::from_values(5, 1, vec![0.1, 0.9, 0.9, 0.4, 0.6]).unwrap();
        let partitioner = Partitioner::new(Some(&mask), WhatToSort::Background, 0.5);
        assert_eq!(
            partitioner.partition(&row(5)),
            vec![
                run(0..1, true),
                run(1..3, false),
                run(3..4, true),
                run(4..5, false)
            ]
        );
    }

    #[test]
    fn runs_are_in_line_order() {
        let mask = Mask::from_values(4, 1, vec![1.0, 1.0, 0.0, 1.0]).unwrap();
        let line: Vec<_> = row(4).into_iter().rev().collect();
        let partitioner = Partitioner::new(Some(&mask), WhatToSort::Foreground, 0.5);
        assert_eq!(
            partitioner.partition(&line),
            vec![run(0..1, true), run(1..2, false), run(2..4, true)]
        );
    }

    #[test]
    fn noise_moves_soft_boundaries_deterministically() {
        let width = 256;
        let mask = Mask::from_fn(width, 1, |x, _| x as f32 / (width - 1) as f32);
        let line = row(width);
        let noise = Perlin::new(PerlinOptions {
            amplitude: 0.3,
            ..PerlinOptions::with_seed(11)
        });
        let plain = Partitioner::new(Some(&mask), WhatToSort::Foreground, 0.5);
        let rippled = plain.with_noise(Some(&noise));

        let first = rippled.partition(&line);
        assert_eq!(first, rippled.partition(&line));
        let covered: usize = first.iter().map(Run::len).sum();
        assert_eq!(covered, line.len());

        // the ends of the gradient are beyond the reach of the noise
        assert!(!rippled.is_included(Coordinate::new(0, 0)));
        assert!(rippled.is_included(Coordinate::new(width - 1, 0)));
        let differs = line
            .iter()
            .any(|&at| plain.threshold_at(at) != rippled.threshold_at(at));
        assert!(differs);
    }

    #[test]
    fn mask_endpoints_ignore_threshold_and_noise() {
        let width = 256;
        let line = row(width);
        let noise = Perlin::new(PerlinOptions::with_seed(0));
        let empty = Mask::filled(width, 1, 0.0);
        let full = Mask::filled(width, 1, 1.0);
        for &threshold in [0.0, 0.5, 1.0].iter() {
            for ripple in [None, Some(&noise)].iter() {
                let excluded = Partitioner::new(Some(&empty), WhatToSort::Foreground, threshold)
                    .with_noise(*ripple);
                assert_eq!(excluded.partition(&line), vec![run(0..256, false)]);

                let included = Partitioner::new(Some(&full), WhatToSort::Foreground, threshold)
                    .with_noise(*ripple);
                assert_eq!(included.partition(&line), vec![run(0..256, true)]);

                let background = Partitioner::new(Some(&full), WhatToSort::Background, threshold)
                    .with_noise(*ripple);
                assert_eq!(background.partition(&line), vec![run(0..256, false)]);
            }
        }
    }
}
