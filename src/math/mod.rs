//! Mathematical utilities for metric indexing and clustering

/// k-means clustering for dominant color extraction
pub mod clustering;
/// Metric bounds, scalar linearization and distances
pub mod linearize;
