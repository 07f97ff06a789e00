//! Mosaic constants and runtime configuration defaults

// Matching defaults
/// Number of closest candidates the final random pick is drawn from
pub const DEFAULT_RANDOM_SIZE: usize = 6;

/// Default cell and thumbnail size (width, height)
pub const DEFAULT_TILE_SIZE: (u32, u32) = (32, 32);

/// Fixed seed for reproducible generation
pub const DEFAULT_SEED: u64 = 42;

// Fast-mode refinement window is this many times the random window
/// Multiplier applied to the random window before signature re-ranking
pub const REFINEMENT_WINDOW_FACTOR: usize = 2;

/// Side length of the grayscale signature used for refinement
pub const SIGNATURE_SIZE: u32 = 8;

// Palette metric
/// Clusters searched by the palette metric
pub const PALETTE_CLUSTERS: usize = 5;
/// Upper bound on k-means iterations
pub const KMEANS_MAX_ITERATIONS: usize = 200;
/// k-means stops once no centre moves further than this
pub const KMEANS_EPSILON: f64 = 0.1;

// Still image
/// Weight of the library tile when blending the still image
pub const DEFAULT_TILE_ALPHA: f64 = 0.4;
/// Stripe spacing at the near edge of the image
pub const STRIPE_BASE_SPACING: f64 = 50.0;
/// Smallest gap between two stripes
pub const STRIPE_MIN_SPACING: usize = 2;

// Video transition
/// Default number of transition frames
pub const DEFAULT_NUM_FRAMES: usize = 100;
/// Default number of repeats of the final frame
pub const DEFAULT_HOLD_FRAMES: usize = 25;
/// Default width of the transition window in frames
pub const DEFAULT_SPLIT_DELTA_FRAMES: usize = 40;
/// Default output frame rate
pub const DEFAULT_FPS: u32 = 25;
/// Default lower bound of the blend weight schedule
pub const DEFAULT_MIN_ALPHA: f64 = 0.0;
/// Default upper bound of the blend weight schedule
pub const DEFAULT_MAX_ALPHA: f64 = 1.0;

// Random generator ramp, in fraction of the full transition per frame
/// Slowest per-cell ramp of the random generator
pub const RANDOM_RAMP_RATE_MIN: f64 = 0.025;
/// Fastest per-cell ramp of the random generator
pub const RANDOM_RAMP_RATE_MAX: f64 = 0.1;

// Fireworks generator
/// Number of activation centres
pub const FIREWORKS_CENTERS: usize = 5;
/// Uniform per-cell ramp of the fireworks generator
pub const FIREWORKS_RAMP_RATE: f64 = 0.2;
/// Frames of delay per grid unit of distance from a centre
pub const FIREWORKS_DISTANCE_FACTOR: f64 = 2.0;

// Library and cache
/// Default thumbnail cache directory
pub const DEFAULT_CACHE_DIR: &str = ".mosaic_libs";
/// Default still image output
pub const DEFAULT_OUTPUT: &str = "mosaic.png";
/// File extensions accepted as library images (lowercase)
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;
