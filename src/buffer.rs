use image::{DynamicImage, ImageBuffer, RgbImage, RgbaImage};

use crate::error::{Error, Result};

/// A pixel position, `x` in `[0, width)` and `y` in `[0, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub x: u32,
    pub y: u32,
}

impl Coordinate {
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Coordinate { x, y }
    }
}

/// Image dimensions shared by buffers, masks and traversals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Dimensions { width, height }
    }

    pub fn area(self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub(crate) fn index(self, at: Coordinate) -> usize {
        at.y as usize * self.width as usize + at.x as usize
    }

    pub(crate) fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Row-major 8-bit RGB or RGBA samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    dimensions: Dimensions,
    channels: u8,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wraps raw samples, `channels` must be 3 (RGB) or 4 (RGBA).
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self> {
        if channels != 3 && channels != 4 {
            return Err(Error::InvalidBuffer(format!(
                "expected 3 or 4 channels, got {}",
                channels
            )));
        }
        let dimensions = Dimensions::new(width, height);
        let expected = dimensions.area() * channels as usize;
        if data.len() != expected {
            return Err(Error::InvalidBuffer(format!(
                "{}x{}x{} image needs {} samples, got {}",
                width,
                height,
                channels,
                expected,
                data.len()
            )));
        }
        Ok(PixelBuffer {
            dimensions,
            channels,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.dimensions.width
    }

    pub fn height(&self) -> u32 {
        self.dimensions.height
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// The samples of the pixel at `at`.
    ///
    /// # Panics
    /// Panics if `at` lies outside of the buffer.
    #[inline]
    pub fn pixel(&self, at: Coordinate) -> &[u8] {
        let start = self.dimensions.index(at) * self.channels as usize;
        &self.data[start..start + self.channels as usize]
    }

    /// Overwrites the pixel at `at` with the leading `channels()` samples of `samples`.
    ///
    /// # Panics
    /// Panics if `at` lies outside of the buffer or `samples` is too short.
    #[inline]
    pub fn put_pixel(&mut self, at: Coordinate, samples: &[u8]) {
        let channels = self.channels as usize;
        let start = self.dimensions.index(at) * channels;
        self.data[start..start + channels].copy_from_slice(&samples[..channels]);
    }

    /// Returns the pixel at `at` as RGBA, with opaque alpha for RGB buffers.
    #[inline]
    pub fn rgba(&self, at: Coordinate) -> [u8; 4] {
        let px = self.pixel(at);
        [px[0], px[1], px[2], if self.has_alpha() { px[3] } else { 255 }]
    }

    pub fn into_dynamic(self) -> Result<DynamicImage> {
        let Dimensions { width, height } = self.dimensions;
        let invalid = || Error::InvalidBuffer(String::from("sample count does not match dimensions"));
        if self.has_alpha() {
            ImageBuffer::from_raw(width, height, self.data)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(invalid)
        } else {
            ImageBuffer::from_raw(width, height, self.data)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(invalid)
        }
    }
}

impl From<RgbImage> for PixelBuffer {
    fn from(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        PixelBuffer {
            dimensions: Dimensions::new(width, height),
            channels: 3,
            data: image.into_raw(),
        }
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        PixelBuffer {
            dimensions: Dimensions::new(width, height),
            channels: 4,
            data: image.into_raw(),
        }
    }
}

impl From<DynamicImage> for PixelBuffer {
    fn from(image: DynamicImage) -> Self {
        if image.color().has_alpha() {
            image.to_rgba8().into()
        } else {
            image.to_rgb8().into()
        }
    }
}
