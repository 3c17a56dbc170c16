//! Soft masks and their preparation from detector output.
use std::fmt;
use std::str;

use image::{GrayImage, Luma};

use crate::buffer::{Coordinate, Dimensions, PixelBuffer};
use crate::error::{check_unit, Error, Result};

/// Which end of the mask range takes part in sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WhatToSort {
    /// Low mask values.
    Background,
    /// High mask values.
    Foreground,
    /// Every pixel, the mask is ignored.
    All,
}

impl Default for WhatToSort {
    fn default() -> Self {
        WhatToSort::Background
    }
}

impl WhatToSort {
    pub const ALL: [WhatToSort; 3] = [WhatToSort::Background, WhatToSort::Foreground, WhatToSort::All];

    pub fn name(self) -> &'static str {
        match self {
            WhatToSort::Background => "background",
            WhatToSort::Foreground => "foreground",
            WhatToSort::All => "all",
        }
    }

    /// The inclusion weight of a mask value: `m` for the foreground, `1 - m` for the background.
    #[inline]
    pub fn weight(self, value: f32) -> f32 {
        match self {
            WhatToSort::Background => 1.0 - value,
            WhatToSort::Foreground => value,
            WhatToSort::All => 1.0,
        }
    }
}

impl fmt::Display for WhatToSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl str::FromStr for WhatToSort {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "background" => Ok(WhatToSort::Background),
            "foreground" => Ok(WhatToSort::Foreground),
            "all" => Ok(WhatToSort::All),
            _ => Err(String::from(s)),
        }
    }
}

/// A per-pixel weight in `[0, 1]`, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    dimensions: Dimensions,
    values: Vec<f32>,
}

impl Mask {
    pub fn from_values(width: u32, height: u32, values: Vec<f32>) -> Result<Self> {
        let dimensions = Dimensions::new(width, height);
        if values.len() != dimensions.area() {
            return Err(Error::InvalidBuffer(format!(
                "{}x{} mask needs {} values, got {}",
                width,
                height,
                dimensions.area(),
                values.len()
            )));
        }
        for &value in values.iter() {
            check_unit("mask value", value)?;
        }
        Ok(Mask { dimensions, values })
    }

    /// A mask of `value` everywhere, clamped into `[0, 1]`.
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        let dimensions = Dimensions::new(width, height);
        Mask {
            dimensions,
            values: vec![value.max(0.0).min(1.0); dimensions.area()],
        }
    }

    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> f32,
    {
        let dimensions = Dimensions::new(width, height);
        let mut values = Vec::with_capacity(dimensions.area());
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y).max(0.0).min(1.0));
            }
        }
        Mask { dimensions, values }
    }

    /// Reads a grayscale image, 0 maps to 0.0 and 255 to 1.0.
    pub fn from_gray(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Mask {
            dimensions: Dimensions::new(width, height),
            values: image.pixels().map(|p| p.0[0] as f32 / 255.0).collect(),
        }
    }

    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.dimensions.width, self.dimensions.height, |x, y| {
            Luma([(self.get(Coordinate::new(x, y)) * 255.0).round() as u8])
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn width(&self) -> u32 {
        self.dimensions.width
    }

    pub fn height(&self) -> u32 {
        self.dimensions.height
    }

    #[inline]
    pub fn get(&self, at: Coordinate) -> f32 {
        self.values[self.dimensions.index(at)]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Swaps foreground and background.
    pub fn invert(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 1.0 - *v);
    }

    /// The inclusion weights of this mask for `what`, white where pixels are sorted.
    pub fn weights(&self, what: WhatToSort) -> Mask {
        Mask {
            dimensions: self.dimensions,
            values: self.values.iter().map(|&v| what.weight(v)).collect(),
        }
    }
}

/// Parameters for turning a detector confidence map into a soft mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskOptions {
    /// Confidence a pixel needs to count as part of a detected object.
    pub confidence: f32,
    /// How much of the detected object survives erosion, 1.0 keeps all of it.
    pub blur_include: f32,
    /// Size of the blur that softens and extends the mask outwards.
    pub blur_extend: f32,
    pub invert: bool,
}

impl Default for MaskOptions {
    fn default() -> Self {
        MaskOptions {
            confidence: 0.35,
            blur_include: 0.5,
            blur_extend: 0.7,
            invert: false,
        }
    }
}

impl MaskOptions {
    pub fn validate(&self) -> Result<()> {
        check_unit("confidence", self.confidence)?;
        check_unit("blur_include", self.blur_include)?;
        check_unit("blur_extend", self.blur_extend)?;
        Ok(())
    }
}

/// Source of per-pixel object confidences for an image.
pub trait Detector {
    fn confidence_map(&self, image: &PixelBuffer) -> Result<Mask>;
}

/// Runs `detector` on `image` and prepares the result, see [`prepare`].
pub fn produce_mask<D: Detector + ?Sized>(
    detector: &D,
    image: &PixelBuffer,
    options: &MaskOptions,
) -> Result<Mask> {
    let confidences = detector.confidence_map(image)?;
    if confidences.dimensions() != image.dimensions() {
        return Err(Error::InvalidDimensions {
            image: image.dimensions().as_tuple(),
            mask: confidences.dimensions().as_tuple(),
        });
    }
    prepare(&confidences, options)
}

/// Turns a confidence map into a foreground mask.
///
/// Pixels at or above `confidence` form the object. The object is eroded by
/// up to a tenth of the shorter side as `blur_include` drops to zero, then
/// blurred with a kernel of up to a tenth of the longer side as
/// `blur_extend` grows.
pub fn prepare(confidences: &Mask, options: &MaskOptions) -> Result<Mask> {
    options.validate()?;
    let Dimensions { width, height } = confidences.dimensions();
    let mut binary = GrayImage::from_fn(width, height, |x, y| {
        if confidences.get(Coordinate::new(x, y)) >= options.confidence {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    let covered = binary.pixels().filter(|p| p.0[0] != 0).count();
    log::debug!("detection covers {} of {} pixels", covered, width as usize * height as usize);

    if covered > 0 {
        let erosion = odd((width.min(height) as f32 * (1.0 - options.blur_include) * 0.1) as u32);
        if options.blur_include < 1.0 && erosion > 0 {
            binary = erode(&binary, erosion);
        }
        if options.blur_extend > 0.0 {
            let kernel = odd((width.max(height) as f32 * options.blur_extend * 0.1) as u32).max(3);
            binary = blur(&binary, kernel);
        }
    }

    let mut mask = Mask::from_gray(&binary);
    if options.invert {
        mask.invert();
    }
    Ok(mask)
}

fn odd(k: u32) -> u32 {
    if k > 0 && k % 2 == 0 {
        k + 1
    } else {
        k
    }
}

/// Sigma of a Gaussian with the given kernel size, as OpenCV derives it.
#[cfg(feature = "imageproc")]
fn kernel_sigma(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

#[cfg(feature = "imageproc")]
fn erode(image: &GrayImage, kernel: u32) -> GrayImage {
    use imageproc::distance_transform::Norm;
    let radius = (kernel / 2).min(u8::MAX as u32) as u8;
    log::debug!("eroding mask with a {}x{} kernel", kernel, kernel);
    imageproc::morphology::erode(image, Norm::LInf, radius)
}

#[cfg(feature = "imageproc")]
fn blur(image: &GrayImage, kernel: u32) -> GrayImage {
    log::debug!("blurring mask with a {}x{} kernel", kernel, kernel);
    imageproc::filter::gaussian_blur_f32(image, kernel_sigma(kernel))
}

#[cfg(not(feature = "imageproc"))]
fn erode(image: &GrayImage, _kernel: u32) -> GrayImage {
    log::warn!("built without `imageproc`, mask erosion skipped");
    image.clone()
}

#[cfg(not(feature = "imageproc"))]
fn blur(image: &GrayImage, _kernel: u32) -> GrayImage {
    log::warn!("built without `imageproc`, mask blur skipped");
    image.clone()
}
