//! Tile selection strategies over a consumable index
//!
//! Exact mode scans every remaining entry; fast mode narrows a bracket over
//! the linearized keys and only looks at a small window. Both draw exactly
//! one random number per query and consume the chosen entry, so a tile is
//! never handed to two cells.

use crate::algorithm::index::TileIndex;
use crate::analysis::metrics::{MetricVector, grayscale_signature};
use crate::io::configuration::{DEFAULT_RANDOM_SIZE, REFINEMENT_WINDOW_FACTOR};
use crate::io::error::{MosaicError, Result, invalid_option};
use crate::math::linearize::squared_distance;
use crate::spatial::tiles::LibraryEntry;
use image::RgbImage;
use ndarray::Array1;
use rand::Rng;
use std::cmp::Ordering;
use std::ops::Range;

/// Matching parameters chosen once per run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchConfig {
    /// Use the linearized index instead of a full scan
    pub fast: bool,
    /// Number of close candidates the final pick is drawn from
    pub random_size: usize,
    /// Re-rank the fast-mode window by grayscale signature
    pub refine: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fast: false,
            random_size: DEFAULT_RANDOM_SIZE,
            refine: true,
        }
    }
}

impl MatchConfig {
    /// Check parameter ranges
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `random_size` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.random_size == 0 {
            return Err(invalid_option(
                "random_size",
                &self.random_size,
                &"must be at least 1",
            ));
        }
        Ok(())
    }

    /// Pick and consume the tile for one source cell
    ///
    /// # Errors
    ///
    /// Returns an error if the index is empty.
    pub fn select<R: Rng>(
        &self,
        index: &mut TileIndex,
        query: &MetricVector,
        cell_pixels: &RgbImage,
        rng: &mut R,
    ) -> Result<LibraryEntry> {
        if self.fast {
            let signature = self.refine.then(|| grayscale_signature(cell_pixels));
            select_fast(index, query, signature.as_ref(), self.random_size, rng)
        } else {
            select_exact(index, query, self.random_size, rng)
        }
    }
}

fn by_distance_then_position(a: &(f64, usize), b: &(f64, usize)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

/// Positions of the `count` entries closest to `query`, nearest first
///
/// Equal distances are ordered by index position.
pub fn closest_positions(index: &TileIndex, query: &MetricVector, count: usize) -> Vec<usize> {
    let mut distances: Vec<(f64, usize)> = index
        .entries()
        .iter()
        .enumerate()
        .map(|(position, entry)| (squared_distance(query, entry.metric()), position))
        .collect();

    let count = count.min(distances.len());
    if count == 0 {
        return Vec::new();
    }
    if count < distances.len() {
        distances.select_nth_unstable_by(count - 1, by_distance_then_position);
        distances.truncate(count);
    }
    distances.sort_by(by_distance_then_position);

    distances.into_iter().map(|(_, position)| position).collect()
}

/// Full-scan selection
///
/// Picks uniformly among the `random_size` entries closest to `query` by
/// squared distance and consumes it.
///
/// # Errors
///
/// Returns an error if the index is empty.
pub fn select_exact<R: Rng>(
    index: &mut TileIndex,
    query: &MetricVector,
    random_size: usize,
    rng: &mut R,
) -> Result<LibraryEntry> {
    let candidates = closest_positions(index, query, random_size.max(1));
    if candidates.is_empty() {
        return Err(exhausted());
    }

    let choice = rng.random_range(0..candidates.len());
    let position = candidates
        .get(choice)
        .copied()
        .ok_or_else(exhausted)?;
    index.consume(position)
}

/// Window of `width` positions centred on `center`, shifted to fit `0..len`
///
/// Shrinks to `len` when the index holds fewer than `width` entries.
pub fn centered_window(len: usize, center: usize, width: usize) -> Range<usize> {
    let width = width.min(len);
    let start = center.saturating_sub(width / 2).min(len - width);
    start..start + width
}

/// Linearized-key selection
///
/// Narrows toward the query's key until the bracket is at most
/// `random_size` wide. Without a signature, picks uniformly in the
/// `random_size` window centred there. With a signature, widens the window
/// by [`REFINEMENT_WINDOW_FACTOR`], keeps the `random_size` entries whose
/// signatures are closest and picks uniformly among those.
///
/// # Errors
///
/// Returns an error if the index is empty.
pub fn select_fast<R: Rng>(
    index: &mut TileIndex,
    query: &MetricVector,
    signature: Option<&Array1<f64>>,
    random_size: usize,
    rng: &mut R,
) -> Result<LibraryEntry> {
    let random_size = random_size.max(1);
    let key = index.key_of(query);
    let center = index
        .narrow_toward(key, random_size)
        .ok_or_else(exhausted)?;

    let position = match signature {
        Some(signature) => {
            let window = centered_window(
                index.len(),
                center,
                random_size * REFINEMENT_WINDOW_FACTOR,
            );
            let mut ranked: Vec<(f64, usize)> = window
                .filter_map(|position| {
                    index
                        .entries()
                        .get(position)
                        .map(|entry| (squared_distance(signature, entry.signature()), position))
                })
                .collect();
            ranked.sort_by(by_distance_then_position);
            ranked.truncate(random_size);

            let choice = rng.random_range(0..ranked.len().max(1));
            ranked
                .get(choice)
                .map(|&(_, position)| position)
                .ok_or_else(exhausted)?
        }
        None => {
            let window = centered_window(index.len(), center, random_size);
            window.start + rng.random_range(0..window.len().max(1))
        }
    };

    index.consume(position)
}

const fn exhausted() -> MosaicError {
    MosaicError::InsufficientLibrary {
        available: 0,
        required: 1,
    }
}
