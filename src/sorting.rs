//! Sort keys.
//!
//! Every key maps a pixel to an `f64`, channels are normalized to `[0, 1]`
//! before any color space conversion. HSV follows the usual hexcone model,
//! `lightness` is CIE L* (D65, sRGB transfer) divided by 100, and
//! `luminance` is the Rec. 709 weighted sum of the gamma encoded channels.
use std::fmt;
use std::str;

use crate::buffer::{Coordinate, Dimensions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Hue,
    Saturation,
    Brightness,
    Lightness,
    Luminance,
    Color,
    Red,
    Green,
    Blue,
    Alpha,
    Warmth,
    DistanceCenter,
    DistanceEdges,
}

impl SortKey {
    pub const ALL: [SortKey; 13] = [
        SortKey::Hue,
        SortKey::Saturation,
        SortKey::Brightness,
        SortKey::Lightness,
        SortKey::Luminance,
        SortKey::Color,
        SortKey::Red,
        SortKey::Green,
        SortKey::Blue,
        SortKey::Alpha,
        SortKey::Warmth,
        SortKey::DistanceCenter,
        SortKey::DistanceEdges,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SortKey::Hue => "hue",
            SortKey::Saturation => "saturation",
            SortKey::Brightness => "brightness",
            SortKey::Lightness => "lightness",
            SortKey::Luminance => "luminance",
            SortKey::Color => "color",
            SortKey::Red => "red",
            SortKey::Green => "green",
            SortKey::Blue => "blue",
            SortKey::Alpha => "alpha",
            SortKey::Warmth => "warmth",
            SortKey::DistanceCenter => "distance-center",
            SortKey::DistanceEdges => "distance-edges",
        }
    }

    /// Whether the key can only be computed on images with an alpha channel.
    pub fn requires_alpha(self) -> bool {
        self == SortKey::Alpha
    }

    /// Computes the key of the RGBA pixel `rgba` located at `at` in an image of size `dims`.
    #[inline]
    pub fn extract(self, rgba: [u8; 4], at: Coordinate, dims: Dimensions) -> f64 {
        match self {
            SortKey::Hue => hue(rgba),
            SortKey::Saturation => saturation(rgba),
            SortKey::Brightness => brightness(rgba),
            SortKey::Lightness => lightness(rgba),
            SortKey::Luminance => luminance(rgba),
            SortKey::Color => color(rgba),
            SortKey::Red => unit(rgba[0]),
            SortKey::Green => unit(rgba[1]),
            SortKey::Blue => unit(rgba[2]),
            SortKey::Alpha => unit(rgba[3]),
            SortKey::Warmth => warmth(rgba),
            SortKey::DistanceCenter => distance_center(at, dims),
            SortKey::DistanceEdges => distance_edges(at, dims),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl str::FromStr for SortKey {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('_', "-");
        SortKey::ALL
            .iter()
            .copied()
            .find(|key| key.name() == normalized)
            .ok_or_else(|| String::from(s))
    }
}

#[inline]
fn unit(channel: u8) -> f64 {
    channel as f64 / 255.0
}

#[inline]
fn rgb_unit(rgba: [u8; 4]) -> (f64, f64, f64) {
    (unit(rgba[0]), unit(rgba[1]), unit(rgba[2]))
}

/// HSV hue scaled from degrees into `[0, 1)`, zero for grays.
#[inline]
pub fn hue(rgba: [u8; 4]) -> f64 {
    let (r, g, b) = rgb_unit(rgba);
    let max = r.max(g).max(b);
    let delta = max - r.min(g).min(b);
    if delta == 0.0 {
        return 0.0;
    }
    let sector = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    sector / 6.0
}

#[inline]
pub fn saturation(rgba: [u8; 4]) -> f64 {
    let (r, g, b) = rgb_unit(rgba);
    let max = r.max(g).max(b);
    if max == 0.0 {
        0.0
    } else {
        (max - r.min(g).min(b)) / max
    }
}

/// HSV value.
#[inline]
pub fn brightness(rgba: [u8; 4]) -> f64 {
    let (r, g, b) = rgb_unit(rgba);
    r.max(g).max(b)
}

#[inline]
pub fn lightness(rgba: [u8; 4]) -> f64 {
    fn linear(c: f64) -> f64 {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    let (r, g, b) = rgb_unit(rgba);
    let y = 0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b);
    let f = if y > 216.0 / 24389.0 {
        y.cbrt()
    } else {
        (24389.0 / 27.0 * y + 16.0) / 116.0
    };
    ((116.0 * f - 16.0) / 100.0).max(0.0).min(1.0)
}

#[inline]
pub fn luminance(rgba: [u8; 4]) -> f64 {
    let (r, g, b) = rgb_unit(rgba);
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// The 24-bit `0xRRGGBB` value, scaled into `[0, 1]`.
#[inline]
pub fn color(rgba: [u8; 4]) -> f64 {
    let packed = (rgba[0] as u32) << 16 | (rgba[1] as u32) << 8 | rgba[2] as u32;
    packed as f64 / 0x00ff_ffff as f64
}

/// `R + G - 2B`, mapped from `[-510, 510]` onto `[0, 1]`. Reds and yellows rank high.
#[inline]
pub fn warmth(rgba: [u8; 4]) -> f64 {
    let bias = rgba[0] as i32 + rgba[1] as i32 - 2 * rgba[2] as i32;
    (bias + 510) as f64 / 1020.0
}

/// Distance of the pixel center to the image center, divided by half the diagonal.
#[inline]
pub fn distance_center(at: Coordinate, dims: Dimensions) -> f64 {
    let (w, h) = (dims.width as f64, dims.height as f64);
    let half_diagonal = (w / 2.0).hypot(h / 2.0);
    if half_diagonal == 0.0 {
        return 0.0;
    }
    let dx = at.x as f64 + 0.5 - w / 2.0;
    let dy = at.y as f64 + 0.5 - h / 2.0;
    dx.hypot(dy) / half_diagonal
}

/// Distance of the pixel center to the nearest border, divided by half the shorter side.
#[inline]
pub fn distance_edges(at: Coordinate, dims: Dimensions) -> f64 {
    let (w, h) = (dims.width as f64, dims.height as f64);
    let half_short = w.min(h) / 2.0;
    if half_short == 0.0 {
        return 0.0;
    }
    let (px, py) = (at.x as f64 + 0.5, at.y as f64 + 0.5);
    let nearest = px.min(w - px).min(py).min(h - py);
    nearest / half_short
}
