//! Edge map, morphology and thresholding stages of the plate search.

use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::contrast::ThresholdType;
use imageproc::morphology::{self, Mask};
use imageproc::point::Point;
use imageproc::{contrast, filter, gradients};

use crate::profile::PlateProfile;

// fixed 7-tap smoothing kernel used when no sigma is given
const GAUSSIAN_7: [f32; 7] = [0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125];

/// Block size of the adaptive threshold used on candidate plates.
pub const ADAPTIVE_BLOCK_SIZE: u32 = 11;
/// Offset subtracted from the local mean before comparing.
pub const ADAPTIVE_OFFSET: i16 = 2;

/// 1-D gaussian kernel of `size` taps. A non-positive sigma is derived from the size.
pub fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 && size == 7 {
        return GAUSSIAN_7.to_vec();
    }
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let half = (size as f32 - 1.0) / 2.0;
    let raw: Vec<f32> = (0..size).map(|i| {
        let d = i as f32 - half;
        (-(d * d) / (2.0 * sigma * sigma)).exp()
    }).collect();
    let sum: f32 = raw.iter().sum();
    raw.into_iter().map(|v| v / sum).collect()
}

/// Binary edge map that favours vertical edges, such as plate borders and strokes.
///
/// Blur 7x7, grayscale, x-direction Sobel saturated to 8 bits, then Otsu.
pub fn preprocess(img: &RgbImage) -> GrayImage {
    let blurred = filter::separable_filter_equal(img, &GAUSSIAN_7[..]);
    let gray = image::imageops::grayscale(&blurred);
    let sobel = gradients::horizontal_sobel(&gray);
    let (width, height) = sobel.dimensions();
    let edges = GrayImage::from_fn(width, height, |x, y| {
        Luma([sobel.get_pixel(x, y).0[0].clamp(0, 255) as u8])
    });
    let level = contrast::otsu_level(&edges);
    contrast::threshold(&edges, level, ThresholdType::Binary)
}

/// Morphological closing with a `width x height` rectangle anchored at its center.
pub fn close(mask: &GrayImage, (kw, kh): (u32, u32)) -> GrayImage {
    let element = Mask::from_image(&GrayImage::from_pixel(kw, kh, Luma([255])), (kw / 2) as u8, (kh / 2) as u8);
    morphology::grayscale_close(mask, &element)
}

/// Outermost boundaries of the foreground, every boundary pixel kept.
///
/// The mask is traced inside a one pixel empty frame so that blobs touching
/// the image border still get an outer boundary.
pub fn extract_contours(mask: &GrayImage) -> Vec<Vec<Point<i32>>> {
    let (width, height) = mask.dimensions();
    let mut framed = GrayImage::new(width + 2, height + 2);
    image::imageops::replace(&mut framed, mask, 1, 1);
    find_contours::<i32>(&framed)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points.into_iter().map(|p| Point::new(p.x - 1, p.y - 1)).collect())
        .collect()
}

/// Close the edge map with the profile's kernel, then pull out its outer boundaries.
pub fn extract_plate_contours(mask: &GrayImage, profile: PlateProfile) -> (GrayImage, Vec<Vec<Point<i32>>>) {
    let morphed = close(mask, profile.structuring_element());
    let contours = extract_contours(&morphed);
    (morphed, contours)
}

/// Gaussian-weighted local threshold: a pixel is set when it is above its
/// neighbourhood mean minus `offset`.
pub fn adaptive_threshold(gray: &GrayImage, block_size: u32, offset: i16) -> GrayImage {
    let kernel = gaussian_kernel(block_size, 0.0);
    let mean = filter::separable_filter_equal(gray, &kernel);
    let (width, height) = gray.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let src = gray.get_pixel(x, y).0[0] as i16;
        let local = mean.get_pixel(x, y).0[0] as i16;
        Luma([if src - local > -offset { 255 } else { 0 }])
    })
}
