//! Visual metrics computed over tiles and source cells

/// Primary metrics and the refinement signature
pub mod metrics;
