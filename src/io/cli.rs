//! Command-line interface and the end-to-end mosaic run

use crate::algorithm::alpha::{AlphaKind, AlphaParams};
use crate::algorithm::composer::{MosaicComposer, StillOptions, render_still};
use crate::algorithm::index::TileIndex;
use crate::algorithm::selection::MatchConfig;
use crate::algorithm::video::{VideoConfig, render_video};
use crate::analysis::metrics::Metric;
use crate::io::configuration::{
    DEFAULT_CACHE_DIR, DEFAULT_FPS, DEFAULT_HOLD_FRAMES, DEFAULT_MAX_ALPHA, DEFAULT_MIN_ALPHA,
    DEFAULT_NUM_FRAMES, DEFAULT_OUTPUT, DEFAULT_RANDOM_SIZE, DEFAULT_SEED,
    DEFAULT_SPLIT_DELTA_FRAMES, DEFAULT_TILE_ALPHA,
};
use crate::io::encoder::{EncodeConfig, open_sink};
use crate::io::error::{Result, invalid_option};
use crate::io::image::{read_rgb, write_rgb};
use crate::io::library::{ThumbnailCache, build_library, load_library};
use crate::io::progress::ProgressManager;
use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};
use std::path::PathBuf;

/// Parse a tile size written as `W,H` or `WxH`
///
/// # Errors
///
/// Returns a configuration error unless both parts are positive integers.
pub fn parse_tile_size(value: &str) -> Result<(u32, u32)> {
    let invalid = || invalid_option("tile_size", &value, &"expected W,H or WxH with W, H > 0");
    let (width, height) = value
        .split_once(',')
        .or_else(|| value.split_once('x'))
        .ok_or_else(invalid)?;
    let width: u32 = width.trim().parse().ok().ok_or_else(invalid)?;
    let height: u32 = height.trim().parse().ok().ok_or_else(invalid)?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(
    author,
    version,
    about = "Build a photomosaic of an image and optionally animate the transition"
)]
/// Command-line arguments for the mosaic tool
// CLI tools commonly need multiple boolean flags for various features and user preferences
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Source image to rebuild from tiles
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Directory of raw library images; without it the cache is used as-is
    #[arg(short, long)]
    pub library: Option<PathBuf>,

    /// Thumbnail cache directory
    #[arg(long, default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    /// Still image output path
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Transition video output (.gif, or any ffmpeg container)
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Similarity metric
    #[arg(short, long, default_value_t = Metric::Average)]
    pub metric: Metric,

    /// Tile size as W,H or WxH
    #[arg(short, long, value_parser = parse_tile_size, default_value = "32,32")]
    pub tile_size: (u32, u32),

    /// Size of the closest-candidate set the pick is drawn from
    #[arg(short, long, default_value_t = DEFAULT_RANDOM_SIZE)]
    pub random_size: usize,

    /// Match through the linearized index instead of a full scan
    #[arg(short, long)]
    pub fast: bool,

    /// Skip grayscale re-ranking in fast mode
    #[arg(long)]
    pub no_refine: bool,

    /// Rotation angles in degrees, one library entry per angle
    #[arg(long, value_delimiter = ',', default_value = "0", allow_negative_numbers = true)]
    pub angles: Vec<f64>,

    /// Sample this many entries with replacement before matching
    #[arg(long)]
    pub sample: Option<usize>,

    /// Tile weight in the still image
    #[arg(long, default_value_t = DEFAULT_TILE_ALPHA)]
    pub tile_alpha: f64,

    /// Black out stripe columns in the still image
    #[arg(long)]
    pub stripes: bool,

    /// Transition pattern
    #[arg(short, long, default_value_t = AlphaKind::Wave)]
    pub alpha: AlphaKind,

    /// Lowest tile weight during the transition
    #[arg(long, default_value_t = DEFAULT_MIN_ALPHA)]
    pub min_alpha: f64,

    /// Highest tile weight during the transition
    #[arg(long, default_value_t = DEFAULT_MAX_ALPHA)]
    pub max_alpha: f64,

    /// Transition frames
    #[arg(long, default_value_t = DEFAULT_NUM_FRAMES)]
    pub frames: usize,

    /// Extra copies of the final frame
    #[arg(long, default_value_t = DEFAULT_HOLD_FRAMES)]
    pub hold_frames: usize,

    /// Frames a cell spends blending in the wave pattern
    #[arg(long, default_value_t = DEFAULT_SPLIT_DELTA_FRAMES)]
    pub split_delta: usize,

    /// Video frame rate
    #[arg(long, default_value_t = DEFAULT_FPS)]
    pub fps: u32,

    /// Random seed for reproducible generation
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Only report warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Matching parameters
    pub const fn match_config(&self) -> MatchConfig {
        MatchConfig {
            fast: self.fast,
            random_size: self.random_size,
            refine: !self.no_refine,
        }
    }

    /// Still image parameters
    pub const fn still_options(&self) -> StillOptions {
        StillOptions {
            tile_alpha: self.tile_alpha,
            stripes: self.stripes,
        }
    }

    /// Transition parameters for a grid
    pub const fn alpha_params(&self, cols: u32, rows: u32) -> AlphaParams {
        let mut params = AlphaParams::for_grid(cols, rows);
        params.num_frames = self.frames;
        params.split_delta_frames = self.split_delta;
        params.min_alpha = self.min_alpha;
        params.max_alpha = self.max_alpha;
        params
    }

    /// Video frame counts
    pub const fn video_config(&self) -> VideoConfig {
        VideoConfig {
            num_frames: self.frames,
            hold_frames: self.hold_frames,
        }
    }

    /// Check every option before any file is touched
    ///
    /// # Errors
    ///
    /// Returns a configuration error for the first invalid option.
    pub fn validate(&self) -> Result<()> {
        self.match_config().validate()?;

        if !(0.0..=1.0).contains(&self.tile_alpha) {
            return Err(invalid_option(
                "tile_alpha",
                &self.tile_alpha,
                &"must be within [0, 1]",
            ));
        }
        if self.angles.is_empty() || self.angles.iter().any(|a| !a.is_finite()) {
            return Err(invalid_option(
                "angles",
                &format!("{:?}", self.angles),
                &"need at least one finite angle",
            ));
        }
        if self.sample == Some(0) {
            return Err(invalid_option("sample", &0, &"must be at least 1"));
        }
        if self.video.is_some() {
            self.alpha_params(1, 1).validate()?;
            if self.fps == 0 {
                return Err(invalid_option("fps", &self.fps, &"must be non-zero"));
            }
        }
        Ok(())
    }
}

/// Runs the whole pipeline for one set of arguments
///
/// All randomness comes from a single generator seeded once, consumed in a
/// fixed order: library sampling, then cell matching, then the transition
/// schedule.
pub struct MosaicRunner {
    cli: Cli,
    progress: ProgressManager,
}

impl MosaicRunner {
    /// Create a runner with the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress = if cli.should_show_progress() {
            ProgressManager::new()
        } else {
            ProgressManager::hidden()
        };

        Self { cli, progress }
    }

    /// Arguments the runner was created with
    pub const fn cli(&self) -> &Cli {
        &self.cli
    }

    /// Build the mosaic and, if requested, the transition video
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An option is invalid
    /// - The source image cannot be read
    /// - The library cannot be found, is empty, or holds fewer tiles than the
    ///   grid has cells
    /// - An output cannot be written
    pub fn run(&mut self) -> Result<()> {
        self.cli.validate()?;
        let mut rng = StdRng::seed_from_u64(self.cli.seed);

        tracing::info!(path = %self.cli.source.display(), "reading source image");
        let source = read_rgb(&self.cli.source)?;

        let cache = ThumbnailCache::new(&self.cli.cache_dir, self.cli.tile_size);
        let mut library = match &self.cli.library {
            Some(dir) => build_library(dir, self.cli.metric, &self.cli.angles, &cache)?,
            None => load_library(&cache, self.cli.metric, &self.cli.angles)?,
        };
        if let Some(k) = self.cli.sample {
            library = library.sample(k, &mut rng);
        }

        let mut index = TileIndex::new(library)?;
        let composer = MosaicComposer::new(self.cli.metric, self.cli.match_config());
        let assignment = composer.compose(
            &source,
            self.cli.tile_size,
            &mut index,
            &mut rng,
            &mut self.progress,
        )?;

        let still = render_still(&source, &assignment, &self.cli.still_options());
        write_rgb(&self.cli.output, &still)?;
        tracing::info!(path = %self.cli.output.display(), "mosaic written");

        if let Some(video_path) = &self.cli.video {
            let grid = assignment.grid();
            let params = self.cli.alpha_params(grid.cols(), grid.rows());
            let mut generator = self.cli.alpha.build(params, &mut rng)?;
            let mut sink = open_sink(EncodeConfig {
                path: video_path.clone(),
                width: source.width(),
                height: source.height(),
                fps: self.cli.fps,
            })?;
            render_video(
                &source,
                &assignment,
                generator.as_mut(),
                &self.cli.video_config(),
                sink.as_mut(),
                &mut self.progress,
            )?;
        }

        self.progress.finish();
        Ok(())
    }
}
