//! Dominant color extraction by k-means clustering

use crate::io::configuration::{KMEANS_EPSILON, KMEANS_MAX_ITERATIONS};
use image::RgbImage;
use ndarray::{Array1, Array2, Axis};

/// Return the centre of the most populated of `k` color clusters
///
/// Lloyd iterations over the image's RGB pixels. Initial centres are pixels
/// taken at evenly spaced positions, which keeps the result deterministic
/// for a given image. Iteration stops after [`KMEANS_MAX_ITERATIONS`] or once
/// no centre moves further than [`KMEANS_EPSILON`].
pub fn kmeans_dominant_color(image: &RgbImage, k: usize) -> Array1<f64> {
    let pixels: Vec<[f64; 3]> = image
        .pixels()
        .map(|p| [f64::from(p.0[0]), f64::from(p.0[1]), f64::from(p.0[2])])
        .collect();

    if pixels.is_empty() {
        return Array1::zeros(3);
    }

    let k = k.clamp(1, pixels.len());
    let mut centers = Array2::<f64>::zeros((k, 3));
    for (c, mut center) in centers.axis_iter_mut(Axis(0)).enumerate() {
        let source = pixels
            .get(c * pixels.len() / k)
            .copied()
            .unwrap_or([0.0; 3]);
        center.assign(&Array1::from_vec(source.to_vec()));
    }

    let mut labels = vec![0usize; pixels.len()];

    for _ in 0..KMEANS_MAX_ITERATIONS {
        for (label, pixel) in labels.iter_mut().zip(&pixels) {
            *label = nearest_center(&centers, pixel);
        }

        let mut sums = Array2::<f64>::zeros((k, 3));
        let mut counts = vec![0usize; k];
        for (&label, pixel) in labels.iter().zip(&pixels) {
            if let Some(count) = counts.get_mut(label) {
                *count += 1;
            }
            for (channel, &value) in pixel.iter().enumerate() {
                if let Some(sum) = sums.get_mut((label, channel)) {
                    *sum += value;
                }
            }
        }

        let mut max_shift: f64 = 0.0;
        for (c, &count) in counts.iter().enumerate() {
            // Empty clusters keep their previous centre
            if count == 0 {
                continue;
            }
            for channel in 0..3 {
                let mean = sums.get((c, channel)).copied().unwrap_or(0.0) / count as f64;
                if let Some(center) = centers.get_mut((c, channel)) {
                    max_shift = max_shift.max((mean - *center).abs());
                    *center = mean;
                }
            }
        }

        if max_shift <= KMEANS_EPSILON {
            break;
        }
    }

    for (label, pixel) in labels.iter_mut().zip(&pixels) {
        *label = nearest_center(&centers, pixel);
    }
    let mut counts = vec![0usize; k];
    for &label in &labels {
        if let Some(count) = counts.get_mut(label) {
            *count += 1;
        }
    }

    // First cluster wins ties
    let dominant = counts
        .iter()
        .enumerate()
        .fold((0, 0), |best, (c, &count)| {
            if count > best.1 { (c, count) } else { best }
        })
        .0;

    centers.row(dominant).to_owned()
}

fn nearest_center(centers: &Array2<f64>, pixel: &[f64; 3]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;

    for (c, center) in centers.axis_iter(Axis(0)).enumerate() {
        let distance: f64 = center
            .iter()
            .zip(pixel)
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        if distance < best_distance {
            best = c;
            best_distance = distance;
        }
    }

    best
}
