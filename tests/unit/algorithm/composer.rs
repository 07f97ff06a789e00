//! Tests for cell assignment and still-image rendering

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;
    use tessera::MosaicError;
    use tessera::algorithm::composer::{
        CellAssignment, MosaicComposer, StillOptions, blend_pixel, render_still, stripe_columns,
    };
    use tessera::algorithm::index::TileIndex;
    use tessera::algorithm::selection::MatchConfig;
    use tessera::analysis::metrics::Metric;
    use tessera::io::progress::ProgressManager;
    use tessera::spatial::grid::CellCoordinate;
    use tessera::spatial::tiles::TileLibrary;

    const QUADRANT_COLORS: [[u8; 3]; 4] = [
        [220, 30, 30],
        [30, 220, 30],
        [30, 30, 220],
        [220, 220, 30],
    ];

    fn solid_index(colors: &[[u8; 3]], size: u32) -> TileIndex {
        let mut library = TileLibrary::new();
        for &color in colors {
            let pixels = RgbImage::from_pixel(size, size, Rgb(color));
            let metric = Metric::Average.compute(&pixels);
            assert!(library.push(metric, pixels, 0.0).is_ok());
        }
        match TileIndex::new(library) {
            Ok(index) => index,
            Err(error) => unreachable!("index construction failed: {error}"),
        }
    }

    /// 2x2 grid of 8 pixel cells, one color per quadrant in row-major order
    fn quadrant_source() -> RgbImage {
        RgbImage::from_fn(16, 16, |x, y| {
            let quadrant = (y / 8) * 2 + x / 8;
            Rgb(QUADRANT_COLORS[quadrant as usize])
        })
    }

    fn gradient_source(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    fn spread_colors(count: usize) -> Vec<[u8; 3]> {
        (0..count)
            .map(|i| {
                let v = (i * 251 / count.max(1)) as u8;
                [v, 255 - v, v / 2]
            })
            .collect()
    }

    fn compose(
        source: &RgbImage,
        index: &mut TileIndex,
        config: MatchConfig,
        seed: u64,
    ) -> Result<CellAssignment, MosaicError> {
        let composer = MosaicComposer::new(Metric::Average, config);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut progress = ProgressManager::hidden();
        composer.compose(source, (8, 8), index, &mut rng, &mut progress)
    }

    fn exact(random_size: usize) -> MatchConfig {
        MatchConfig {
            fast: false,
            random_size,
            refine: true,
        }
    }

    // Tests that each quadrant receives the tile of its own color
    // Verified by matching against the first entry of the index
    #[test]
    fn test_quadrants_match_their_tiles() {
        let source = quadrant_source();
        let shuffled = [
            QUADRANT_COLORS[2],
            QUADRANT_COLORS[0],
            QUADRANT_COLORS[3],
            QUADRANT_COLORS[1],
        ];
        let mut index = solid_index(&shuffled, 8);

        let Ok(assignment) = compose(&source, &mut index, exact(1), 42) else {
            unreachable!("composition expected");
        };

        assert_eq!(assignment.len(), 4);
        for (cell, entry) in assignment.iter() {
            let quadrant = (cell.y * 2 + cell.x) as usize;
            assert_eq!(entry.pixels().get_pixel(0, 0), &Rgb(QUADRANT_COLORS[quadrant]));
        }
        assert!(index.is_empty());
    }

    // Tests that a short library fails before any tile is consumed
    // Verified by moving the size check inside the matching loop
    #[test]
    fn test_insufficient_library() {
        let source = quadrant_source();
        let mut index = solid_index(&QUADRANT_COLORS[..3], 8);

        let result = compose(&source, &mut index, exact(1), 42);

        assert!(matches!(
            result,
            Err(MosaicError::InsufficientLibrary {
                available: 3,
                required: 4
            })
        ));
        assert_eq!(index.len(), 3);
    }

    // Tests that library tiles of the wrong size are rejected
    // Verified by removing the tile size comparison
    #[test]
    fn test_tile_size_mismatch() {
        let source = quadrant_source();
        let mut index = solid_index(&QUADRANT_COLORS, 4);

        assert!(matches!(
            compose(&source, &mut index, exact(1), 42),
            Err(MosaicError::InvalidSourceData { .. })
        ));
    }

    // Tests that no entry is used twice and every cell is filled, in both modes
    // Verified by selecting without consuming the entry
    #[test]
    fn test_no_reuse() {
        let source = gradient_source(32, 24);

        for fast in [false, true] {
            let mut index = solid_index(&spread_colors(20), 8);
            let config = MatchConfig {
                fast,
                random_size: 4,
                refine: true,
            };
            let Ok(assignment) = compose(&source, &mut index, config, 5) else {
                unreachable!("composition expected");
            };

            let ids: HashSet<usize> = assignment.iter().map(|(_, entry)| entry.id()).collect();
            assert_eq!(assignment.len(), 12);
            assert_eq!(ids.len(), 12);
            assert_eq!(index.len(), 8);
        }
    }

    // Tests that the same seed gives the same assignment
    // Verified by visiting cells in a shuffled order
    #[test]
    fn test_deterministic_assignment() {
        let source = gradient_source(32, 24);
        let run = |seed: u64| {
            let mut index = solid_index(&spread_colors(30), 8);
            match compose(&source, &mut index, exact(3), seed) {
                Ok(assignment) => assignment.iter().map(|(_, e)| e.id()).collect::<Vec<_>>(),
                Err(error) => unreachable!("composition failed: {error}"),
            }
        };

        assert_eq!(run(8), run(8));
    }

    // Tests lookup of a single cell and outside the grid
    // Verified by indexing column-major
    #[test]
    fn test_assignment_get() {
        let source = quadrant_source();
        let mut index = solid_index(&QUADRANT_COLORS, 8);
        let Ok(assignment) = compose(&source, &mut index, exact(1), 1) else {
            unreachable!("composition expected");
        };

        let Some(entry) = assignment.get(CellCoordinate::new(1, 0)) else {
            unreachable!("cell (1, 0) is in the grid");
        };
        assert_eq!(entry.pixels().get_pixel(0, 0), &Rgb(QUADRANT_COLORS[1]));
        assert!(assignment.get(CellCoordinate::new(2, 0)).is_none());
        assert_eq!(assignment.grid().cols(), 2);
    }

    // Tests pixel blending at both ends and the midpoint
    // Verified by swapping tile and source weights
    #[test]
    fn test_blend_pixel() {
        let tile = Rgb([200, 0, 100]);
        let source = Rgb([0, 100, 100]);

        assert_eq!(blend_pixel(tile, source, 0.0), source);
        assert_eq!(blend_pixel(tile, source, 1.0), tile);
        assert_eq!(blend_pixel(tile, source, 0.5), Rgb([100, 50, 100]));
        assert_eq!(blend_pixel(tile, source, 0.25), Rgb([50, 75, 100]));
    }

    // Tests stripe spacing that tightens toward the right edge
    // Verified by dropping the quadratic term
    #[test]
    fn test_stripe_columns() {
        let mask = stripe_columns(100);
        let columns: Vec<usize> = mask.iter_ones().collect();

        assert_eq!(mask.len(), 100);
        assert_eq!(columns, vec![0, 50, 87, 99]);
        assert!(stripe_columns(0).is_empty());
    }

    // Tests that a full tile weight copies tiles and leaves the border black
    // Verified by starting the canvas from the source
    #[test]
    fn test_render_still_full_weight() {
        let mut source = RgbImage::from_pixel(20, 17, Rgb([9, 9, 9]));
        for (x, y, pixel) in quadrant_source().enumerate_pixels() {
            source.put_pixel(x, y, *pixel);
        }
        let mut index = solid_index(&QUADRANT_COLORS, 8);
        let Ok(assignment) = compose(&source, &mut index, exact(1), 3) else {
            unreachable!("composition expected");
        };

        let options = StillOptions {
            tile_alpha: 1.0,
            stripes: false,
        };
        let still = render_still(&source, &assignment, &options);

        assert_eq!(still.dimensions(), (20, 17));
        assert_eq!(still.get_pixel(12, 3), &Rgb(QUADRANT_COLORS[1]));
        assert_eq!(still.get_pixel(18, 3), &Rgb([0, 0, 0]));
        assert_eq!(still.get_pixel(3, 16), &Rgb([0, 0, 0]));
    }

    // Tests the default blend and the stripe overlay together
    // Verified by applying stripes before blending
    #[test]
    fn test_render_still_blend_and_stripes() {
        let source = RgbImage::from_pixel(16, 16, Rgb([0, 0, 0]));
        let mut index = solid_index(&[[250, 250, 250]; 4], 8);
        let Ok(assignment) = compose(&source, &mut index, exact(1), 3) else {
            unreachable!("composition expected");
        };

        let options = StillOptions {
            stripes: true,
            ..StillOptions::default()
        };
        let still = render_still(&source, &assignment, &options);

        assert!((options.tile_alpha - 0.4).abs() < f64::EPSILON);
        assert_eq!(still.get_pixel(0, 5), &Rgb([0, 0, 0]));
        assert_eq!(still.get_pixel(1, 5), &Rgb([100, 100, 100]));
    }
}
