//! Photomosaic construction with animated source-to-mosaic transitions
//!
//! A library of thumbnails is indexed by a visual metric, every cell of a
//! source image is matched to a distinct library tile, and an optional video
//! blends each cell from source to tile following a per-cell schedule.

#![forbid(unsafe_code)]

/// Tile indexing, matching, composition and transition scheduling
pub mod algorithm;
/// Visual metrics over tiles
pub mod analysis;
/// Input/output operations and error handling
pub mod io;
/// Metric linearization and clustering
pub mod math;
/// Cell grid, tile library and tile rotation
pub mod spatial;

pub use io::error::{MosaicError, Result};
