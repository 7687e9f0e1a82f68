use image::{imageops, Rgb, RgbImage};
use imageproc::geometric_transformations::{rotate, Interpolation};
use log::trace;

use crate::error::{LprError, LprErrorKind};
use crate::geometry::{self, BoundingBox, RotatedRect};
use crate::image_process::{self, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET};
use crate::profile::PlateProfile;
use crate::utils;

/// Outcome of cleaning one candidate region.
#[derive(Debug, Clone)]
pub struct CleanedPlate {
    /// Deskewed plate, or the untouched region when nothing was found.
    pub plate: RgbImage,
    /// Box of the plate inside the region, `None` when the region was rejected.
    pub bounding_box: Option<BoundingBox>,
}

impl CleanedPlate {

    pub fn found(&self) -> bool {
        self.bounding_box.is_some()
    }

    fn rejected(region: &RgbImage) -> Self {
        Self { plate: region.clone(), bounding_box: None }
    }
}

/// Re-threshold a candidate region, keep its largest blob and straighten it.
pub fn clean_plate(profile: PlateProfile, region: &RgbImage) -> Result<CleanedPlate, LprError> {
    let gray = imageops::grayscale(region);
    let thresh = image_process::adaptive_threshold(&gray, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET);
    let contours = image_process::extract_contours(&thresh);

    // first contour wins ties
    let mut largest = None;
    for contour in &contours {
        let area = geometry::contour_area(contour);
        if largest.map_or(true, |(_, best)| area > best) {
            largest = Some((contour, area));
        }
    }
    let (contour, area) = match largest {
        Some(found) => found,
        None => {
            trace!("no contour inside candidate region");
            return Ok(CleanedPlate::rejected(region));
        }
    };

    let bounding_box = match geometry::bounding_rect(contour) {
        Some(b) => b,
        None => return Ok(CleanedPlate::rejected(region)),
    };
    if !geometry::ratio_check(profile, area as f32, bounding_box.width as f32, bounding_box.height as f32) {
        trace!("inner contour {:?} with area {} fails the ratio check", bounding_box, area);
        return Ok(CleanedPlate::rejected(region));
    }

    let rect = geometry::min_area_rect(contour);
    let plate = crop_rotated(region, &rect)?;
    Ok(CleanedPlate { plate, bounding_box: Some(bounding_box) })
}

/// Cut `rect` out of `img` and rotate it upright, long side horizontal.
///
/// An axis-aligned `rect` returns `img` as is.
pub fn crop_rotated(img: &RgbImage, rect: &RotatedRect) -> Result<RgbImage, LprError> {
    if !rect.is_finite() {
        return Err(LprError::invalid_input(format!("non-finite rotated rectangle {:?}", rect)));
    }

    // corners are truncated to whole pixels
    let corners = rect.points();
    let xs = corners.iter().map(|p| p.0 as i64);
    let ys = corners.iter().map(|p| p.1 as i64);
    let (x1, x2) = (xs.clone().min().unwrap_or(0), xs.max().unwrap_or(0));
    let (y1, y2) = (ys.clone().min().unwrap_or(0), ys.max().unwrap_or(0));

    let mut angle = rect.angle;
    if angle < -45.0 {
        angle += 90.0;
    }
    if angle == 0.0 {
        return Ok(img.clone());
    }

    let size = ((x2 - x1) as u32, (y2 - y1) as u32);
    if size.0 == 0 || size.1 == 0 {
        return Err(LprErrorKind::DegenerateCrop { width: size.0, height: size.1 }.into());
    }
    let center = ((x1 + x2) as f32 / 2.0, (y1 + y2) as f32 / 2.0);
    let upright = utils::crop_centered(img, size, center);

    // rotate() turns clockwise, the angle is counter-clockwise
    let pivot = (size.0 as f32 / 2.0, size.1 as f32 / 2.0);
    let rotated = rotate(&upright, pivot, -angle.to_radians(), Interpolation::Bilinear, Rgb([0, 0, 0]));

    let long = rect.width.max(rect.height) as u32;
    let short = rect.width.min(rect.height) as u32;
    if long == 0 || short == 0 {
        return Err(LprErrorKind::DegenerateCrop { width: long, height: short }.into());
    }
    Ok(utils::crop_centered(&rotated, (long, short), pivot))
}
