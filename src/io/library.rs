//! Building tile libraries from image directories and the thumbnail cache
//!
//! Thumbnails are stored as `<key>_<W>x<H>.<ext>` in the cache directory,
//! so one cache can hold several tile sizes side by side. The key is the
//! image's path below the library root with separators written as `__`, so
//! `a/x.png` and `b/x.png` get distinct thumbnails.

use crate::analysis::metrics::Metric;
use crate::io::configuration::ACCEPTED_EXTENSIONS;
use crate::io::error::{MosaicError, Result, WithPath};
use crate::io::image::{read_rgb, write_rgb};
use crate::spatial::tiles::TileLibrary;
use crate::spatial::warp::rotate;
use image::RgbImage;
use image::imageops::{self, FilterType};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Separator standing in for directory boundaries in cache keys
const KEY_SEPARATOR: &str = "__";

/// Whether the path carries an accepted image extension
pub fn is_accepted_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(ext))
        })
}

/// Split a thumbnail file name into stem and size
///
/// `"beach_32x24.png"` gives `Some(("beach", 32, 24))`.
pub fn parse_thumbnail_name(file_name: &str) -> Option<(&str, u32, u32)> {
    let (base, _extension) = file_name.rsplit_once('.')?;
    let (stem, size) = base.rsplit_once('_')?;
    let (width, height) = size.split_once('x')?;
    Some((stem, width.parse().ok()?, height.parse().ok()?))
}

/// Directory of resized thumbnails for one tile size
#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    dir: PathBuf,
    tile_size: (u32, u32),
}

impl ThumbnailCache {
    /// Cache rooted at `dir` for `tile_size` thumbnails
    pub fn new(dir: impl Into<PathBuf>, tile_size: (u32, u32)) -> Self {
        Self {
            dir: dir.into(),
            tile_size,
        }
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Thumbnail size
    pub const fn tile_size(&self) -> (u32, u32) {
        self.tile_size
    }

    /// Cache path for an image below the library root `root`
    ///
    /// `root/photos/dog.jpg` maps to `photos__dog_<W>x<H>.jpg`. An image
    /// outside `root` is keyed by its file stem alone.
    pub fn thumbnail_path(&self, root: &Path, source: &Path) -> Option<PathBuf> {
        let stem = source.file_stem()?.to_str()?;
        let extension = source.extension()?.to_str()?;
        let mut parts = Vec::new();
        if let Some(parent) = source.strip_prefix(root).ok().and_then(Path::parent) {
            for component in parent.components() {
                if let Component::Normal(name) = component {
                    parts.push(name.to_str()?);
                }
            }
        }
        parts.push(stem);

        let key = parts.join(KEY_SEPARATOR);
        let (width, height) = self.tile_size;
        Some(self.dir.join(format!("{key}_{width}x{height}.{extension}")))
    }

    /// Cached thumbnail of `source` below `root`, generating and storing it
    /// when missing
    ///
    /// A cached file of the wrong size is regenerated.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or the thumbnail cannot
    /// be written.
    pub fn get_or_create(&self, root: &Path, source: &Path) -> Result<RgbImage> {
        let cached = self
            .thumbnail_path(root, source)
            .ok_or_else(|| MosaicError::InvalidSourceData {
                reason: format!("'{}' has no usable file name", source.display()),
            })?;

        if cached.is_file() {
            match read_rgb(&cached) {
                Ok(thumb) if thumb.dimensions() == self.tile_size => {
                    tracing::debug!(path = %cached.display(), "thumbnail found in cache");
                    return Ok(thumb);
                }
                Ok(_) | Err(_) => {
                    tracing::debug!(path = %cached.display(), "regenerating cached thumbnail");
                }
            }
        }

        let picture = read_rgb(source)?;
        let thumb = imageops::resize(
            &picture,
            self.tile_size.0,
            self.tile_size.1,
            FilterType::Triangle,
        );
        write_rgb(&cached, &thumb)?;
        Ok(thumb)
    }
}

/// All accepted images under `dir`, recursively, in sorted order
///
/// # Errors
///
/// Returns an error if a directory cannot be read.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current).with_operation(&current, "read directory")? {
            let path = entry.with_operation(&current, "read directory")?.path();
            if path.is_dir() {
                pending.push(path);
            } else if is_accepted_image(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn push_rotations(
    library: &mut TileLibrary,
    thumb: &RgbImage,
    metric: Metric,
    angles: &[f64],
) -> Result<()> {
    for &angle in angles {
        let pixels = rotate(thumb, angle);
        let vector = metric.compute(&pixels);
        library.push(vector, pixels, angle)?;
    }
    Ok(())
}

/// Build a library from raw images, filling the thumbnail cache
///
/// Every accepted image yields one entry per angle. A file that fails to
/// load, or whose cache name is already taken by another file, is logged
/// and skipped.
///
/// # Errors
///
/// Returns an error if:
/// - `source_dir` does not exist
/// - The cache directory cannot be created
/// - A directory cannot be read
#[tracing::instrument(skip_all, fields(source_dir = %source_dir.display(), %metric))]
pub fn build_library(
    source_dir: &Path,
    metric: Metric,
    angles: &[f64],
    cache: &ThumbnailCache,
) -> Result<TileLibrary> {
    if !source_dir.is_dir() {
        return Err(MosaicError::LibraryNotFound {
            path: source_dir.to_path_buf(),
        });
    }
    if !cache.dir().is_dir() {
        tracing::info!(dir = %cache.dir().display(), "creating thumbnail cache");
        std::fs::create_dir_all(cache.dir()).with_operation(cache.dir(), "create directory")?;
    }

    let files = collect_images(source_dir)?;
    let mut library = TileLibrary::new();
    let mut claimed = HashSet::new();

    for path in &files {
        tracing::debug!(path = %path.display(), "processing library image");
        if let Some(cached) = cache.thumbnail_path(source_dir, path) {
            if !claimed.insert(cached.clone()) {
                tracing::warn!(
                    path = %path.display(),
                    cached = %cached.display(),
                    "skipping library image with a clashing cache name"
                );
                continue;
            }
        }
        match cache.get_or_create(source_dir, path) {
            Ok(thumb) => push_rotations(&mut library, &thumb, metric, angles)?,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping library image");
            }
        }
    }

    tracing::info!(
        images = files.len(),
        entries = library.len(),
        "library built"
    );
    Ok(library)
}

/// Load a library from cached thumbnails only
///
/// Only files whose name encodes the cache's tile size are used.
///
/// # Errors
///
/// Returns an error if the cache directory does not exist or cannot be read.
#[tracing::instrument(skip_all, fields(cache_dir = %cache.dir().display(), %metric))]
pub fn load_library(cache: &ThumbnailCache, metric: Metric, angles: &[f64]) -> Result<TileLibrary> {
    if !cache.dir().is_dir() {
        return Err(MosaicError::LibraryNotFound {
            path: cache.dir().to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(cache.dir()).with_operation(cache.dir(), "read directory")? {
        let path = entry.with_operation(cache.dir(), "read directory")?.path();
        let matches_size = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(parse_thumbnail_name)
            .is_some_and(|(_, width, height)| (width, height) == cache.tile_size());
        if path.is_file() && matches_size && is_accepted_image(&path) {
            files.push(path);
        }
    }
    files.sort();

    let mut library = TileLibrary::new();
    for path in &files {
        match read_rgb(path) {
            Ok(thumb) if thumb.dimensions() == cache.tile_size() => {
                push_rotations(&mut library, &thumb, metric, angles)?;
            }
            Ok(thumb) => {
                let (width, height) = thumb.dimensions();
                tracing::warn!(path = %path.display(), width, height, "skipping mislabelled thumbnail");
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping cached thumbnail");
            }
        }
    }

    tracing::info!(entries = library.len(), "library loaded from cache");
    Ok(library)
}
