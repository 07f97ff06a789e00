//! Partition of a source image into fixed-size cells
//!
//! Both grid dimensions are floored: a source whose size is not a multiple of
//! the tile size keeps an unprocessed strip along its right and bottom edges.

use crate::io::error::{MosaicError, Result};
use image::RgbImage;
use image::imageops;

/// Grid indices of one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoordinate {
    /// Column index
    pub x: u32,
    /// Row index
    pub y: u32,
}

impl CellCoordinate {
    /// Create a coordinate from column and row indices
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Cell layout of a source image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MosaicGrid {
    cols: u32,
    rows: u32,
    tile_width: u32,
    tile_height: u32,
}

impl MosaicGrid {
    /// Lay a grid of `tile_width` x `tile_height` cells over a source image size
    ///
    /// # Errors
    ///
    /// Returns an error if the tile size is zero or the source is smaller
    /// than a single tile in either dimension.
    pub fn new(
        source_width: u32,
        source_height: u32,
        tile_width: u32,
        tile_height: u32,
    ) -> Result<Self> {
        if tile_width == 0 || tile_height == 0 {
            return Err(MosaicError::InvalidSourceData {
                reason: format!("tile size {tile_width}x{tile_height} must be non-zero"),
            });
        }

        let cols = source_width / tile_width;
        let rows = source_height / tile_height;
        if cols == 0 || rows == 0 {
            return Err(MosaicError::InvalidSourceData {
                reason: format!(
                    "source {source_width}x{source_height} is smaller than one {tile_width}x{tile_height} tile"
                ),
            });
        }

        Ok(Self {
            cols,
            rows,
            tile_width,
            tile_height,
        })
    }

    /// Lay a grid over an image
    ///
    /// # Errors
    ///
    /// See [`MosaicGrid::new`].
    pub fn for_image(source: &RgbImage, tile_width: u32, tile_height: u32) -> Result<Self> {
        Self::new(source.width(), source.height(), tile_width, tile_height)
    }

    /// Number of columns
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    /// Number of rows
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Cell width in pixels
    pub const fn tile_width(&self) -> u32 {
        self.tile_width
    }

    /// Cell height in pixels
    pub const fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Total number of cells
    pub const fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Cells in row-major order (y outer, x inner)
    pub fn cells(&self) -> impl Iterator<Item = CellCoordinate> + use<> {
        let cols = self.cols;
        (0..self.rows).flat_map(move |y| (0..cols).map(move |x| CellCoordinate::new(x, y)))
    }

    /// Row-major position of a cell, `None` outside the grid
    pub const fn linear_index(&self, cell: CellCoordinate) -> Option<usize> {
        if cell.x < self.cols && cell.y < self.rows {
            Some(cell.y as usize * self.cols as usize + cell.x as usize)
        } else {
            None
        }
    }

    /// Top-left pixel of a cell
    pub const fn origin(&self, cell: CellCoordinate) -> (u32, u32) {
        (cell.x * self.tile_width, cell.y * self.tile_height)
    }

    /// Copy of the source pixels covered by a cell
    pub fn extract(&self, source: &RgbImage, cell: CellCoordinate) -> RgbImage {
        let (x, y) = self.origin(cell);
        imageops::crop_imm(source, x, y, self.tile_width, self.tile_height).to_image()
    }
}
