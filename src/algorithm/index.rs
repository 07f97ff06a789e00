//! Sorted, consumable view over a tile library
//!
//! Entries are ordered by their linearized metric key. The bounds used for
//! linearization are taken from the full library at construction and are not
//! recomputed as entries are consumed, so queries made late in a run are
//! placed against the original library's scale.

use crate::io::error::{MosaicError, Result};
use crate::math::linearize::{MetricBounds, linearize};
use crate::spatial::tiles::{LibraryEntry, TileLibrary};
use ndarray::Array1;

/// Library entries sorted by linearized key, with removal
#[derive(Debug, Clone)]
pub struct TileIndex {
    entries: Vec<LibraryEntry>,
    keys: Vec<f64>,
    bounds: MetricBounds,
}

impl TileIndex {
    /// Build the index from a library
    ///
    /// Ties between equal keys keep library order.
    ///
    /// # Errors
    ///
    /// Returns an error if the library is empty.
    pub fn new(library: TileLibrary) -> Result<Self> {
        let bounds = MetricBounds::from_vectors(library.entries().iter().map(LibraryEntry::metric))
            .ok_or_else(|| MosaicError::InvalidSourceData {
                reason: "cannot index an empty tile library".to_string(),
            })?;

        let mut keyed: Vec<(f64, LibraryEntry)> = library
            .into_entries()
            .into_iter()
            .map(|entry| (linearize(entry.metric(), &bounds), entry))
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (keys, entries): (Vec<f64>, Vec<LibraryEntry>) = keyed.into_iter().unzip();

        Ok(Self {
            entries,
            keys,
            bounds,
        })
    }

    /// Number of entries left
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether every entry has been consumed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remaining entries in key order
    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    /// Keys of the remaining entries, parallel to [`TileIndex::entries`]
    pub fn keys(&self) -> &[f64] {
        &self.keys
    }

    /// Bounds fixed at construction
    pub const fn bounds(&self) -> &MetricBounds {
        &self.bounds
    }

    /// Key of a query vector under the construction-time bounds
    pub fn key_of(&self, metric: &Array1<f64>) -> f64 {
        linearize(metric, &self.bounds)
    }

    /// Remove the entry at `position` and hand it back
    ///
    /// The remaining entries keep their order and their original keys.
    ///
    /// # Errors
    ///
    /// Returns an error if `position` is past the last remaining entry.
    pub fn consume(&mut self, position: usize) -> Result<LibraryEntry> {
        if position >= self.entries.len() {
            return Err(MosaicError::InvalidTileIndex {
                index: position,
                max_tiles: self.entries.len(),
            });
        }

        self.keys.remove(position);
        Ok(self.entries.remove(position))
    }

    /// Narrow a bracket toward `key` until it spans at most `width` positions
    ///
    /// At each step the bracket midpoint's key is compared with `key` and the
    /// bracket shrinks onto the half that contains it, keeping the midpoint.
    /// Returns the upper-middle position of the final bracket, or `None`
    /// when the index is empty.
    pub fn narrow_toward(&self, key: f64, width: usize) -> Option<usize> {
        let last = self.keys.len().checked_sub(1)?;
        let width = width.max(1);
        let mut inf = 0;
        let mut sup = last;

        while sup - inf > width {
            let mid = inf + (sup - inf) / 2;
            let mid_key = self.keys.get(mid).copied().unwrap_or(f64::INFINITY);
            if mid_key < key {
                inf = mid;
            } else {
                sup = mid;
            }
        }

        Some(inf + (sup - inf).div_ceil(2))
    }
}
