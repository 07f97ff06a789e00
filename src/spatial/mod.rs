//! Spatial data structures
//!
//! This module contains:
//! - The cell grid laid over a source image
//! - The tile library and its entries
//! - Tile rotation

/// Cell grid over a source image
pub mod grid;
/// Library entries and sampling
pub mod tiles;
/// Rotation of tiles
pub mod warp;

pub use grid::{CellCoordinate, MosaicGrid};
pub use tiles::{LibraryEntry, TileLibrary};
