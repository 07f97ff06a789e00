//! Library of candidate tiles
//!
//! A library is an ordered list of entries sharing one tile size. A single
//! source thumbnail contributes one entry per configured rotation angle, and
//! each of those entries is consumed independently during matching.

use crate::analysis::metrics::{MetricVector, grayscale_signature};
use crate::io::error::{MosaicError, Result};
use image::RgbImage;
use ndarray::Array1;
use rand::Rng;
use std::cell::OnceCell;

/// One candidate tile with its precomputed metric
#[derive(Debug, Clone)]
pub struct LibraryEntry {
    id: usize,
    metric: MetricVector,
    pixels: RgbImage,
    angle: f64,
    signature: OnceCell<Array1<f64>>,
}

impl LibraryEntry {
    /// Position of the entry in the library it was first added to
    ///
    /// Sampled libraries keep the id of the original entry, so duplicates
    /// share an id.
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Primary metric of the tile
    pub const fn metric(&self) -> &MetricVector {
        &self.metric
    }

    /// Tile pixels
    pub const fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Rotation applied to the source thumbnail, in degrees
    pub const fn angle(&self) -> f64 {
        self.angle
    }

    /// Grayscale signature, computed on first use
    pub fn signature(&self) -> &Array1<f64> {
        self.signature.get_or_init(|| grayscale_signature(&self.pixels))
    }
}

/// Ordered collection of same-sized library entries
#[derive(Debug, Clone, Default)]
pub struct TileLibrary {
    entries: Vec<LibraryEntry>,
    tile_size: Option<(u32, u32)>,
}

impl TileLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tile
    ///
    /// # Errors
    ///
    /// Returns an error if the tile's dimensions differ from the entries
    /// already in the library, or if its metric length differs.
    pub fn push(&mut self, metric: MetricVector, pixels: RgbImage, angle: f64) -> Result<()> {
        let dims = pixels.dimensions();
        match self.tile_size {
            Some(size) if size != dims => {
                return Err(MosaicError::InvalidSourceData {
                    reason: format!(
                        "tile of {}x{} does not match library tile size {}x{}",
                        dims.0, dims.1, size.0, size.1
                    ),
                });
            }
            Some(_) => {}
            None => self.tile_size = Some(dims),
        }

        if let Some(first) = self.entries.first() {
            if first.metric.len() != metric.len() {
                return Err(MosaicError::InvalidSourceData {
                    reason: format!(
                        "metric of length {} does not match library metric length {}",
                        metric.len(),
                        first.metric.len()
                    ),
                });
            }
        }

        self.entries.push(LibraryEntry {
            id: self.entries.len(),
            metric,
            pixels,
            angle,
            signature: OnceCell::new(),
        });
        Ok(())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the library holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shared tile size, `None` while empty
    pub const fn tile_size(&self) -> Option<(u32, u32)> {
        self.tile_size
    }

    /// Entries in library order
    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    /// Take ownership of the entries
    pub fn into_entries(self) -> Vec<LibraryEntry> {
        self.entries
    }

    /// Draw `k` entries uniformly at random, with replacement
    ///
    /// The result may contain the same entry several times; each copy is then
    /// consumable on its own.
    pub fn sample<R: Rng>(&self, k: usize, rng: &mut R) -> Self {
        if self.entries.is_empty() {
            return Self::default();
        }

        let entries = (0..k)
            .filter_map(|_| self.entries.get(rng.random_range(0..self.entries.len())))
            .cloned()
            .collect();

        Self {
            entries,
            tile_size: self.tile_size,
        }
    }
}
