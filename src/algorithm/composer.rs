//! Assignment of library tiles to source cells and still-image rendering

use crate::algorithm::index::TileIndex;
use crate::algorithm::selection::MatchConfig;
use crate::analysis::metrics::Metric;
use crate::io::configuration::{DEFAULT_TILE_ALPHA, STRIPE_BASE_SPACING, STRIPE_MIN_SPACING};
use crate::io::error::{MosaicError, Result};
use crate::io::progress::ProgressManager;
use crate::spatial::grid::{CellCoordinate, MosaicGrid};
use crate::spatial::tiles::LibraryEntry;
use bitvec::vec::BitVec;
use image::{Rgb, RgbImage};
use rand::Rng;

/// Tile chosen for every cell of a grid, stored in row-major order
#[derive(Debug, Clone)]
pub struct CellAssignment {
    grid: MosaicGrid,
    tiles: Vec<LibraryEntry>,
}

impl CellAssignment {
    /// Grid the assignment covers
    pub const fn grid(&self) -> &MosaicGrid {
        &self.grid
    }

    /// Number of assigned cells
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether no cell is assigned
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Entry assigned to a cell
    pub fn get(&self, cell: CellCoordinate) -> Option<&LibraryEntry> {
        self.grid
            .linear_index(cell)
            .and_then(|index| self.tiles.get(index))
    }

    /// Cells paired with their entries, row-major
    pub fn iter(&self) -> impl Iterator<Item = (CellCoordinate, &LibraryEntry)> {
        self.grid.cells().zip(self.tiles.iter())
    }
}

/// Matches every cell of a source image against a tile index
#[derive(Debug, Clone, Copy, Default)]
pub struct MosaicComposer {
    metric: Metric,
    config: MatchConfig,
}

impl MosaicComposer {
    /// Create a composer
    pub const fn new(metric: Metric, config: MatchConfig) -> Self {
        Self { metric, config }
    }

    /// Matching parameters
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Assign a tile to every cell, consuming entries from `index`
    ///
    /// Cells are visited row by row, so the same seed, library and source
    /// always yield the same assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The match configuration is invalid
    /// - The index tiles differ in size from `tile_size`
    /// - The index holds fewer entries than the grid has cells
    #[tracing::instrument(skip_all, fields(fast = self.config.fast, random_size = self.config.random_size))]
    pub fn compose<R: Rng>(
        &self,
        source: &RgbImage,
        tile_size: (u32, u32),
        index: &mut TileIndex,
        rng: &mut R,
        progress: &mut ProgressManager,
    ) -> Result<CellAssignment> {
        self.config.validate()?;
        let grid = MosaicGrid::for_image(source, tile_size.0, tile_size.1)?;

        if let Some(entry) = index.entries().first() {
            if entry.pixels().dimensions() != tile_size {
                let (w, h) = entry.pixels().dimensions();
                return Err(MosaicError::InvalidSourceData {
                    reason: format!(
                        "library tiles are {w}x{h} but the grid uses {}x{}",
                        tile_size.0, tile_size.1
                    ),
                });
            }
        }

        let required = grid.cell_count();
        if index.len() < required {
            return Err(MosaicError::InsufficientLibrary {
                available: index.len(),
                required,
            });
        }

        tracing::info!(
            cols = grid.cols(),
            rows = grid.rows(),
            library = index.len(),
            "matching cells"
        );
        progress.start_stage("matching", required);

        let mut tiles = Vec::with_capacity(required);
        for cell in grid.cells() {
            let block = grid.extract(source, cell);
            let query = self.metric.compute(&block);
            let entry = self.config.select(index, &query, &block, rng)?;
            tracing::trace!(x = cell.x, y = cell.y, tile = entry.id(), "cell matched");
            tiles.push(entry);
            progress.advance();
        }

        progress.finish_stage();
        Ok(CellAssignment { grid, tiles })
    }
}

/// Options for the still image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StillOptions {
    /// Weight of the tile against the source block
    pub tile_alpha: f64,
    /// Black out stripe columns
    pub stripes: bool,
}

impl Default for StillOptions {
    fn default() -> Self {
        Self {
            tile_alpha: DEFAULT_TILE_ALPHA,
            stripes: false,
        }
    }
}

/// Blend two pixels, `weight` being the share of `tile`
pub fn blend_pixel(tile: Rgb<u8>, source: Rgb<u8>, weight: f64) -> Rgb<u8> {
    let mut out = [0u8; 3];
    for ((value, &t), &s) in out.iter_mut().zip(&tile.0).zip(&source.0) {
        *value = f64::from(t)
            .mul_add(weight, f64::from(s) * (1.0 - weight))
            .round()
            .clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

/// Write one cell of `dest` from its tile and source block
///
/// A weight of exactly 0 copies the source, exactly 1 copies the tile and
/// anything between is a linear blend.
pub fn composite_cell(
    dest: &mut RgbImage,
    source: &RgbImage,
    grid: &MosaicGrid,
    cell: CellCoordinate,
    tile: &RgbImage,
    weight: f64,
) {
    let (x0, y0) = grid.origin(cell);
    for dy in 0..grid.tile_height() {
        for dx in 0..grid.tile_width() {
            let (x, y) = (x0 + dx, y0 + dy);
            let (Some(&s), Some(&t)) = (source.get_pixel_checked(x, y), tile.get_pixel_checked(dx, dy))
            else {
                continue;
            };
            let pixel = if weight <= 0.0 {
                s
            } else if weight >= 1.0 {
                t
            } else {
                blend_pixel(t, s, weight)
            };
            if let Some(d) = dest.get_pixel_mut_checked(x, y) {
                *d = pixel;
            }
        }
    }
}

/// Columns blacked out by the stripe overlay
///
/// Starting at column 0, each stripe schedules the next one
/// `max(50 * (1 - (i / width)^2), 2)` columns later, so stripes get denser
/// toward the right edge.
pub fn stripe_columns(width: u32) -> BitVec {
    let total = width as usize;
    let mut mask = BitVec::repeat(false, total);
    let mut index = 0usize;

    while index < total {
        mask.set(index, true);
        let progress = index as f64 / total as f64;
        let spacing = (STRIPE_BASE_SPACING * progress.mul_add(-progress, 1.0)) as usize;
        index += spacing.max(STRIPE_MIN_SPACING);
    }

    mask
}

/// Render the still mosaic
///
/// Each cell becomes `tile * alpha + source * (1 - alpha)`. Pixels outside
/// the grid stay black.
pub fn render_still(
    source: &RgbImage,
    assignment: &CellAssignment,
    options: &StillOptions,
) -> RgbImage {
    let mut dest = RgbImage::new(source.width(), source.height());
    let weight = options.tile_alpha.clamp(0.0, 1.0);

    for (cell, entry) in assignment.iter() {
        composite_cell(
            &mut dest,
            source,
            assignment.grid(),
            cell,
            entry.pixels(),
            weight,
        );
    }

    if options.stripes {
        for column in stripe_columns(dest.width()).iter_ones() {
            for y in 0..dest.height() {
                if let Some(pixel) = dest.get_pixel_mut_checked(column as u32, y) {
                    *pixel = Rgb([0, 0, 0]);
                }
            }
        }
    }

    dest
}
