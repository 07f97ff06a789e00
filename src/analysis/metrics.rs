//! Visual metrics summarising a tile as a fixed-length vector
//!
//! The primary metric drives both exact matching and the linearized key of
//! fast matching. The grayscale signature is a secondary, coarser description
//! used only to re-rank a handful of fast-mode candidates.

use crate::io::configuration::{PALETTE_CLUSTERS, SIGNATURE_SIZE};
use crate::io::error::{MosaicError, invalid_option};
use crate::math::clustering::kmeans_dominant_color;
use image::RgbImage;
use image::imageops::{self, FilterType};
use ndarray::Array1;
use std::fmt;
use std::str::FromStr;

/// Feature vector describing a tile
pub type MetricVector = Array1<f64>;

/// Primary similarity metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// Mean of each color channel
    #[default]
    Average,
    /// Centre of the most populated k-means color cluster
    Palette,
}

/// Labels accepted on the command line, in display order
pub const METRIC_LABELS: [(&str, Metric); 2] =
    [("average", Metric::Average), ("palette", Metric::Palette)];

impl Metric {
    /// Evaluate the metric on an image
    pub fn compute(self, image: &RgbImage) -> MetricVector {
        match self {
            Self::Average => average_color(image),
            Self::Palette => kmeans_dominant_color(image, PALETTE_CLUSTERS),
        }
    }

    /// Label used on the command line
    pub fn label(self) -> &'static str {
        METRIC_LABELS
            .iter()
            .find(|(_, metric)| *metric == self)
            .map_or("average", |(label, _)| label)
    }
}

impl FromStr for Metric {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        METRIC_LABELS
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(s))
            .map(|(_, metric)| *metric)
            .ok_or_else(|| {
                invalid_option(
                    "metric",
                    &s,
                    &format!(
                        "expected one of: {}",
                        METRIC_LABELS.map(|(label, _)| label).join(", ")
                    ),
                )
            })
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mean RGB value of an image
pub fn average_color(image: &RgbImage) -> MetricVector {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return Array1::zeros(3);
    }

    let mut sums = [0u64; 3];
    for pixel in image.pixels() {
        for (sum, &channel) in sums.iter_mut().zip(&pixel.0) {
            *sum += u64::from(channel);
        }
    }

    Array1::from_iter(sums.iter().map(|&sum| sum as f64 / count as f64))
}

/// Coarse grayscale thumbnail flattened into a vector
pub fn grayscale_signature(image: &RgbImage) -> Array1<f64> {
    let gray = imageops::grayscale(image);
    let small = imageops::resize(&gray, SIGNATURE_SIZE, SIGNATURE_SIZE, FilterType::Triangle);
    small.pixels().map(|p| f64::from(p.0[0])).collect()
}
