use std::path::PathBuf;

use crate::sorting::SortKey;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors reported by the sorter and its I/O helpers.
///
/// Every precondition is checked before the output buffer is written to, so
/// an `Err` never leaves a partially sorted image behind.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The mask does not cover the image exactly.
    #[error("mask is {}x{} but the image is {}x{}", mask.0, mask.1, image.0, image.1)]
    InvalidDimensions { image: (u32, u32), mask: (u32, u32) },

    /// The sort key reads a channel the image does not have.
    #[error("sort key `{key}` is not available for {channels}-channel images")]
    UnsupportedChannelForKey { key: SortKey, channels: u8 },

    /// A numeric parameter is outside of its allowed range.
    #[error("parameter `{name}` is out of range: {value}")]
    InvalidParameterRange { name: &'static str, value: f32 },

    /// Raw sample data that cannot form a pixel buffer.
    #[error("invalid buffer: {0}")]
    InvalidBuffer(String),

    #[error("failed to process image `{}`: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("file system error at `{}`: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Mutually exclusive or missing command line arguments.
    #[error("invalid argument combination: {0}")]
    InvalidCombination(String),
}

/// Checks that `value` lies within `[0, 1]`.
pub(crate) fn check_unit(name: &'static str, value: f32) -> Result<f32> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(Error::InvalidParameterRange { name, value })
    }
}
