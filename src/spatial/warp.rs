//! Rotation of tiles about their centre

use image::{Rgb, RgbImage};

/// Rotate an image counter-clockwise by `angle_degrees` about its centre
///
/// The output keeps the input dimensions. Each output pixel is sampled
/// bilinearly from the inverse-rotated position; samples that fall outside
/// the input are black. Angles that are multiples of 360 return a copy.
pub fn rotate(image: &RgbImage, angle_degrees: f64) -> RgbImage {
    if angle_degrees.rem_euclid(360.0) == 0.0 {
        return image.clone();
    }

    let (width, height) = image.dimensions();
    let cx = (f64::from(width) - 1.0) / 2.0;
    let cy = (f64::from(height) - 1.0) / 2.0;
    let (sin, cos) = angle_degrees.to_radians().sin_cos();

    RgbImage::from_fn(width, height, |x, y| {
        let dx = f64::from(x) - cx;
        let dy = f64::from(y) - cy;
        // Image y points down, so a counter-clockwise turn on screen is
        // clockwise in pixel space; the inverse map applies the opposite turn.
        let sx = cos.mul_add(dx, -(sin * dy)) + cx;
        let sy = sin.mul_add(dx, cos * dy) + cy;
        sample_bilinear(image, sx, sy)
    })
}

fn sample_bilinear(image: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let (width, height) = image.dimensions();
    if x < -0.5 || y < -0.5 || x > f64::from(width) - 0.5 || y > f64::from(height) - 0.5 {
        return Rgb([0, 0, 0]);
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let fetch = |px: f64, py: f64| -> [f64; 3] {
        let cx = px.clamp(0.0, f64::from(width) - 1.0) as u32;
        let cy = py.clamp(0.0, f64::from(height) - 1.0) as u32;
        image
            .get_pixel_checked(cx, cy)
            .map_or([0.0; 3], |p| p.0.map(f64::from))
    };

    let top_left = fetch(x0, y0);
    let top_right = fetch(x0 + 1.0, y0);
    let bottom_left = fetch(x0, y0 + 1.0);
    let bottom_right = fetch(x0 + 1.0, y0 + 1.0);

    let mut out = [0u8; 3];
    for (channel, value) in out.iter_mut().enumerate() {
        let pick = |p: [f64; 3]| p.get(channel).copied().unwrap_or(0.0);
        let top = pick(top_left).mul_add(1.0 - fx, pick(top_right) * fx);
        let bottom = pick(bottom_left).mul_add(1.0 - fx, pick(bottom_right) * fx);
        *value = top.mul_add(1.0 - fy, bottom * fy).round().clamp(0.0, 255.0) as u8;
    }

    Rgb(out)
}
