use image::{imageops, RgbImage};

use crate::geometry::BoundingBox;

/// Mean over every channel of every pixel, 0 for an empty image.
pub fn mean_intensity(img: &RgbImage) -> f64 {
    let raw = img.as_raw();
    if raw.is_empty() {
        return 0.0;
    }
    let sum: u64 = raw.iter().map(|v| *v as u64).sum();
    sum as f64 / raw.len() as f64
}

/// Copy of the region under `rect`, clipped to the image.
pub fn crop(img: &RgbImage, rect: &BoundingBox) -> RgbImage {
    imageops::crop_imm(img, rect.x, rect.y, rect.width, rect.height).to_image()
}

/// A `width x height` patch centered on `center`. Samples past the border
/// repeat the edge pixels.
///
/// The top-left corner is floored to a whole pixel; pixels are copied, never
/// interpolated.
pub fn crop_centered(img: &RgbImage, (width, height): (u32, u32), center: (f32, f32)) -> RgbImage {
    let (src_w, src_h) = img.dimensions();
    if src_w == 0 || src_h == 0 {
        return RgbImage::new(0, 0);
    }
    let left = (center.0 - (width as f32 - 1.0) / 2.0).floor() as i64;
    let top = (center.1 - (height as f32 - 1.0) / 2.0).floor() as i64;
    RgbImage::from_fn(width, height, |x, y| {
        let sx = (left + x as i64).clamp(0, src_w as i64 - 1) as u32;
        let sy = (top + y as i64).clamp(0, src_h as i64 - 1) as u32;
        *img.get_pixel(sx, sy)
    })
}

/// Upper and lower halves of a two-line plate, split at half height.
pub fn split_halves(img: &RgbImage) -> (RgbImage, RgbImage) {
    let (width, height) = img.dimensions();
    let mid = height / 2;
    let upper = imageops::crop_imm(img, 0, 0, width, mid).to_image();
    let lower = imageops::crop_imm(img, 0, mid, width, height - mid).to_image();
    (upper, lower)
}
