//! Reading and writing RGB images

use crate::io::error::{MosaicError, Result, WithPath};
use image::RgbImage;
use std::path::Path;

/// Load an image from disk as 8-bit RGB
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded.
pub fn read_rgb(path: &Path) -> Result<RgbImage> {
    Ok(image::open(path).with_path(path)?.into_rgb8())
}

/// Save an image, creating parent directories as needed
///
/// The format follows the file extension.
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be created
/// - The image cannot be encoded or written to the path
pub fn write_rgb(path: &Path, image: &RgbImage) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_operation(parent, "create directory")?;
    }

    image.save(path).map_err(|e| MosaicError::ImageExport {
        path: path.to_path_buf(),
        source: e,
    })
}
