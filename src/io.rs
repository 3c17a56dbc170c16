//! Reading and writing images and masks.
use std::path::{Path, PathBuf};

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};
use crate::mask::{Detector, Mask};

fn image_error(path: &Path) -> impl FnOnce(image::ImageError) -> Error + '_ {
    move |source| Error::Image {
        path: path.to_owned(),
        source,
    }
}

/// Decodes an image as RGB, or RGBA if it carries an alpha channel.
pub fn load<P: AsRef<Path>>(path: P) -> Result<PixelBuffer> {
    let path = path.as_ref();
    let image = image::open(path).map_err(image_error(path))?;
    log::debug!("loaded `{}` ({:?})", path.display(), image.color());
    Ok(PixelBuffer::from(image))
}

/// Encodes `buffer`, the format follows the file extension.
pub fn save<P: AsRef<Path>>(buffer: &PixelBuffer, path: P) -> Result<()> {
    let path = path.as_ref();
    buffer
        .clone()
        .into_dynamic()?
        .save(path)
        .map_err(image_error(path))
}

/// Loads a grayscale image as a mask, black is 0.0 and white 1.0.
pub fn load_mask<P: AsRef<Path>>(path: P) -> Result<Mask> {
    let path = path.as_ref();
    let gray = image::open(path).map_err(image_error(path))?.to_luma8();
    Ok(Mask::from_gray(&gray))
}

pub fn save_mask<P: AsRef<Path>>(mask: &Mask, path: P) -> Result<()> {
    let path = path.as_ref();
    mask.to_gray().save(path).map_err(image_error(path))
}

/// Confidences produced ahead of time by an external detector and stored
/// as a grayscale image next to the input.
#[derive(Debug, Clone)]
pub struct ConfidenceMapFile {
    path: PathBuf,
}

impl ConfidenceMapFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        ConfidenceMapFile { path: path.into() }
    }
}

impl Detector for ConfidenceMapFile {
    fn confidence_map(&self, _image: &PixelBuffer) -> Result<Mask> {
        load_mask(&self.path)
    }
}

/// Files with one of these extensions are picked up from input directories.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Lists `input` itself, or the images directly inside it in name order.
pub fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.is_dir() {
        if !input.exists() {
            return Err(Error::FileSystem {
                path: input.to_owned(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "input does not exist"),
            });
        }
        return Ok(vec![input.to_owned()]);
    }
    let entries = std::fs::read_dir(input).map_err(|source| Error::FileSystem {
        path: input.to_owned(),
        source,
    })?;
    let mut inputs = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| Error::FileSystem {
                path: input.to_owned(),
                source,
            })?
            .path();
        let is_image = path
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image && path.is_file() {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// `<output_dir>/<stem>_sorted.<ext>`, falling back to png for extensionless inputs.
pub fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("image");
    let extension = input
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("png");
    output_dir.join([stem, "_sorted.", extension].concat())
}

/// `<output_dir>/<stem>_mask.png`.
pub fn mask_output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("image");
    output_dir.join([stem, "_mask.png"].concat())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names() {
        assert_eq!(
            output_path(Path::new("photos/cat.jpg"), Path::new("out")),
            Path::new("out/cat_sorted.jpg")
        );
        assert_eq!(
            output_path(Path::new("scan"), Path::new("out")),
            Path::new("out/scan_sorted.png")
        );
        assert_eq!(
            mask_output_path(Path::new("photos/cat.jpg"), Path::new("out")),
            Path::new("out/cat_mask.png")
        );
    }

    #[test]
    fn missing_input_is_reported() {
        let missing = Path::new("definitely/not/here.png");
        assert!(matches!(collect_inputs(missing), Err(Error::FileSystem { .. })));
        assert!(matches!(load(missing), Err(Error::Image { .. })));
    }
}
