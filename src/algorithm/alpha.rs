//! Per-frame, per-cell blend weights for the source-to-mosaic transition
//!
//! A generator answers "how much of the matched tile is visible in this cell
//! at this frame". Generators are created once per video from the shared
//! random stream and queried frame by frame; every answer lies in
//! `[min_alpha, max_alpha]` and never decreases as frames advance.

use crate::io::configuration::{
    DEFAULT_MAX_ALPHA, DEFAULT_MIN_ALPHA, DEFAULT_NUM_FRAMES, DEFAULT_SPLIT_DELTA_FRAMES,
    FIREWORKS_CENTERS, FIREWORKS_DISTANCE_FACTOR, FIREWORKS_RAMP_RATE, RANDOM_RAMP_RATE_MAX,
    RANDOM_RAMP_RATE_MIN,
};
use crate::io::error::{MosaicError, Result, invalid_option};
use crate::spatial::grid::CellCoordinate;
use ndarray::Array2;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Source of blend weights
pub trait AlphaGenerator {
    /// Prepare for queries about `frame_id`
    ///
    /// Called once per frame, with increasing frame ids, before any
    /// [`AlphaGenerator::alpha`] call for that frame.
    fn update_to_frame(&mut self, frame_id: usize);

    /// Share of the tile visible in `cell` at `frame_id`
    fn alpha(&self, frame_id: usize, cell: CellCoordinate) -> f64;
}

/// Parameters shared by all generators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaParams {
    /// Grid columns
    pub cols: u32,
    /// Grid rows
    pub rows: u32,
    /// Frames in the transition, excluding hold frames
    pub num_frames: usize,
    /// Frames a single cell takes to go from source to tile in the wave
    pub split_delta_frames: usize,
    /// Weight before a cell starts its transition
    pub min_alpha: f64,
    /// Weight once a cell has finished its transition
    pub max_alpha: f64,
    /// Slowest ramp of the random generator, in transition fraction per frame
    pub ramp_rate_min: f64,
    /// Fastest ramp of the random generator
    pub ramp_rate_max: f64,
    /// Activation centres of the fireworks generator
    pub fireworks_centers: usize,
}

impl AlphaParams {
    /// Parameters with defaults for a grid
    pub const fn for_grid(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            rows,
            num_frames: DEFAULT_NUM_FRAMES,
            split_delta_frames: DEFAULT_SPLIT_DELTA_FRAMES,
            min_alpha: DEFAULT_MIN_ALPHA,
            max_alpha: DEFAULT_MAX_ALPHA,
            ramp_rate_min: RANDOM_RAMP_RATE_MIN,
            ramp_rate_max: RANDOM_RAMP_RATE_MAX,
            fireworks_centers: FIREWORKS_CENTERS,
        }
    }

    /// Check parameter ranges
    ///
    /// # Errors
    ///
    /// Returns a configuration error if:
    /// - The grid is empty
    /// - `split_delta_frames` is zero or leaves no frame for the sweep
    /// - The alpha range is outside `[0, 1]` or inverted
    /// - The ramp range is not positive or inverted
    /// - There are no fireworks centres
    pub fn validate(&self) -> Result<()> {
        if self.cols == 0 || self.rows == 0 {
            return Err(invalid_option(
                "grid",
                &format!("{}x{}", self.cols, self.rows),
                &"must contain at least one cell",
            ));
        }
        if self.split_delta_frames == 0 {
            return Err(invalid_option(
                "split_delta_frames",
                &self.split_delta_frames,
                &"must be at least 1",
            ));
        }
        if self.num_frames < self.split_delta_frames + 2 {
            return Err(invalid_option(
                "num_frames",
                &self.num_frames,
                &format!(
                    "must exceed split_delta_frames ({}) by at least 2",
                    self.split_delta_frames
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_alpha)
            || !(0.0..=1.0).contains(&self.max_alpha)
            || self.min_alpha > self.max_alpha
        {
            return Err(invalid_option(
                "alpha",
                &format!("{}..{}", self.min_alpha, self.max_alpha),
                &"must satisfy 0 <= min_alpha <= max_alpha <= 1",
            ));
        }
        if self.ramp_rate_min <= 0.0 || self.ramp_rate_min > self.ramp_rate_max {
            return Err(invalid_option(
                "ramp_rate",
                &format!("{}..{}", self.ramp_rate_min, self.ramp_rate_max),
                &"must satisfy 0 < min <= max",
            ));
        }
        if self.fireworks_centers == 0 {
            return Err(invalid_option(
                "fireworks_centers",
                &self.fireworks_centers,
                &"must be at least 1",
            ));
        }
        Ok(())
    }

    /// Exclusive upper bound of random onset frames
    const fn onset_limit(&self) -> usize {
        self.num_frames - self.split_delta_frames
    }

    fn weight(&self, progress: f64) -> f64 {
        if progress <= 0.0 {
            self.min_alpha
        } else if progress >= 1.0 {
            self.max_alpha
        } else {
            (self.max_alpha - self.min_alpha)
                .mul_add(progress, self.min_alpha)
                .clamp(self.min_alpha, self.max_alpha)
        }
    }
}

/// Global left-to-right sweep
///
/// Two boundaries move across the grid: columns left of the stop boundary
/// show the tile, columns right of the start boundary show the source, and
/// columns in between interpolate by their position. Column `x` (measured
/// at its centre) starts at frame `(x + 0.5) / cols * sweep` and finishes
/// `split_delta_frames` later, where `sweep = num_frames - 1 - split_delta_frames`.
#[derive(Debug, Clone)]
pub struct WaveAlpha {
    params: AlphaParams,
    columns_per_frame: f64,
    start_boundary: f64,
    stop_boundary: f64,
}

impl WaveAlpha {
    /// Create a wave for validated parameters
    pub fn new(params: AlphaParams) -> Self {
        let sweep = params.num_frames.saturating_sub(1 + params.split_delta_frames).max(1);
        let mut wave = Self {
            params,
            columns_per_frame: f64::from(params.cols) / sweep as f64,
            start_boundary: 0.0,
            stop_boundary: 0.0,
        };
        wave.update_to_frame(0);
        wave
    }

    /// Column positions of the start and stop boundaries
    pub const fn boundaries(&self) -> (f64, f64) {
        (self.start_boundary, self.stop_boundary)
    }
}

impl AlphaGenerator for WaveAlpha {
    fn update_to_frame(&mut self, frame_id: usize) {
        let frame = frame_id as f64;
        self.start_boundary = frame * self.columns_per_frame;
        self.stop_boundary =
            (frame - self.params.split_delta_frames as f64) * self.columns_per_frame;
    }

    fn alpha(&self, _frame_id: usize, cell: CellCoordinate) -> f64 {
        let band = self.start_boundary - self.stop_boundary;
        let column = f64::from(cell.x) + 0.5;
        let progress = if band > 0.0 {
            (self.start_boundary - column) / band
        } else if column <= self.start_boundary {
            1.0
        } else {
            0.0
        };
        self.params.weight(progress)
    }
}

/// Per-cell onset frames and ramp rates
#[derive(Debug, Clone)]
struct CellSchedule {
    params: AlphaParams,
    onset: Array2<f64>,
    ramp: Array2<f64>,
}

impl CellSchedule {
    fn alpha(&self, frame_id: usize, cell: CellCoordinate) -> f64 {
        let index = (cell.y as usize, cell.x as usize);
        let (Some(&onset), Some(&ramp)) = (self.onset.get(index), self.ramp.get(index)) else {
            return self.params.min_alpha;
        };
        let elapsed = frame_id as f64 - onset;
        if elapsed <= 0.0 {
            return self.params.min_alpha;
        }
        self.params.weight(elapsed * ramp)
    }
}

/// Independent random onset and ramp per cell
///
/// Onsets are uniform over `[0, num_frames - split_delta_frames)`, ramps
/// uniform over the configured rate range. Cells are drawn row by row, onset
/// before ramp.
#[derive(Debug, Clone)]
pub struct RandomAlpha {
    schedule: CellSchedule,
}

impl RandomAlpha {
    /// Draw the schedule for validated parameters
    pub fn new<R: Rng>(params: AlphaParams, rng: &mut R) -> Self {
        let shape = (params.rows as usize, params.cols as usize);
        let mut onset = Array2::zeros(shape);
        let mut ramp = Array2::zeros(shape);

        for (o, r) in onset.iter_mut().zip(ramp.iter_mut()) {
            *o = rng.random_range(0..params.onset_limit().max(1)) as f64;
            *r = rng.random_range(params.ramp_rate_min..=params.ramp_rate_max);
        }

        Self {
            schedule: CellSchedule {
                params,
                onset,
                ramp,
            },
        }
    }

    /// Onset frame of a cell
    pub fn onset(&self, cell: CellCoordinate) -> Option<f64> {
        self.schedule
            .onset
            .get((cell.y as usize, cell.x as usize))
            .copied()
    }
}

impl AlphaGenerator for RandomAlpha {
    fn update_to_frame(&mut self, _frame_id: usize) {}

    fn alpha(&self, frame_id: usize, cell: CellCoordinate) -> f64 {
        self.schedule.alpha(frame_id, cell)
    }
}

/// Radial activation fronts from a few random centres
///
/// Each centre gets a random grid position and a random onset. A cell starts
/// at the earliest `center onset + 2 * distance` over all centres and ramps
/// at a fixed fast rate. Cells far from every centre may start after the
/// last transition frame and then stay on the source.
#[derive(Debug, Clone)]
pub struct FireworksAlpha {
    schedule: CellSchedule,
    centers: Vec<(CellCoordinate, f64)>,
}

impl FireworksAlpha {
    /// Draw centres for validated parameters
    pub fn new<R: Rng>(params: AlphaParams, rng: &mut R) -> Self {
        let limit = params.onset_limit().max(1);
        let centers = (0..params.fireworks_centers)
            .map(|_| {
                let x = rng.random_range(0..params.cols);
                let y = rng.random_range(0..params.rows);
                let onset = rng.random_range(0..limit) as f64;
                (CellCoordinate::new(x, y), onset)
            })
            .collect();
        Self::with_centers(params, centers)
    }

    /// Schedule for given centre positions and onset frames
    pub fn with_centers(params: AlphaParams, centers: Vec<(CellCoordinate, f64)>) -> Self {
        let shape = (params.rows as usize, params.cols as usize);
        let onset = Array2::from_shape_fn(shape, |(y, x)| {
            centers
                .iter()
                .map(|(center, start)| {
                    let dx = x as f64 - f64::from(center.x);
                    let dy = y as f64 - f64::from(center.y);
                    FIREWORKS_DISTANCE_FACTOR.mul_add(dx.hypot(dy), *start)
                })
                .fold(f64::INFINITY, f64::min)
        });
        let ramp = Array2::from_elem(shape, FIREWORKS_RAMP_RATE);

        Self {
            schedule: CellSchedule {
                params,
                onset,
                ramp,
            },
            centers,
        }
    }

    /// Onset frame of a cell
    pub fn onset(&self, cell: CellCoordinate) -> Option<f64> {
        self.schedule
            .onset
            .get((cell.y as usize, cell.x as usize))
            .copied()
    }

    /// Centre positions and their onset frames
    pub fn centers(&self) -> &[(CellCoordinate, f64)] {
        &self.centers
    }
}

impl AlphaGenerator for FireworksAlpha {
    fn update_to_frame(&mut self, _frame_id: usize) {}

    fn alpha(&self, frame_id: usize, cell: CellCoordinate) -> f64 {
        self.schedule.alpha(frame_id, cell)
    }
}

/// Generator variant selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaKind {
    /// [`WaveAlpha`]
    #[default]
    Wave,
    /// [`RandomAlpha`]
    Random,
    /// [`FireworksAlpha`]
    Fireworks,
}

/// Labels accepted on the command line, in display order
pub const ALPHA_GENERATORS: [(&str, AlphaKind); 3] = [
    ("wave", AlphaKind::Wave),
    ("random", AlphaKind::Random),
    ("fireworks", AlphaKind::Fireworks),
];

impl AlphaKind {
    /// Build the generator
    ///
    /// Random and fireworks schedules are drawn from `rng` here; the wave
    /// draws nothing.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `params` fail validation.
    pub fn build<R: Rng>(self, params: AlphaParams, rng: &mut R) -> Result<Box<dyn AlphaGenerator>> {
        params.validate()?;
        Ok(match self {
            Self::Wave => Box::new(WaveAlpha::new(params)),
            Self::Random => Box::new(RandomAlpha::new(params, rng)),
            Self::Fireworks => Box::new(FireworksAlpha::new(params, rng)),
        })
    }

    /// Label used on the command line
    pub fn label(self) -> &'static str {
        ALPHA_GENERATORS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("wave", |(label, _)| label)
    }
}

impl FromStr for AlphaKind {
    type Err = MosaicError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ALPHA_GENERATORS
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(s))
            .map(|(_, kind)| *kind)
            .ok_or_else(|| {
                invalid_option(
                    "alpha",
                    &s,
                    &format!(
                        "expected one of: {}",
                        ALPHA_GENERATORS.map(|(label, _)| label).join(", ")
                    ),
                )
            })
    }
}

impl fmt::Display for AlphaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
