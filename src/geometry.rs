//! Contour geometry: boxes, minimum-area rectangles and the plate shape gates.

use imageproc::point::Point;

use crate::error::LprError;
use crate::profile::PlateProfile;

/// Axis-aligned box, inclusive of its last row and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {

    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Move the box into the frame its origin `(dx, dy)` was cropped from.
    pub fn translate(&self, dx: u32, dy: u32) -> Self {
        Self { x: self.x + dx, y: self.y + dy, ..*self }
    }
}

/// Rotated rectangle with `angle` in degrees, in `(-90, 0]`.
///
/// `width` is the side running along `angle`; 0 means axis-aligned with
/// `width` horizontal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    pub center: (f32, f32),
    pub width: f32,
    pub height: f32,
    pub angle: f32,
}

impl RotatedRect {

    pub fn new(center: (f32, f32), width: f32, height: f32, angle: f32) -> Self {
        Self { center, width, height, angle }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn is_finite(&self) -> bool {
        self.center.0.is_finite()
            && self.center.1.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.angle.is_finite()
    }

    /// The four corners, in the same order `boxPoints` produces them.
    pub fn points(&self) -> [(f32, f32); 4] {
        let angle = self.angle.to_radians();
        let b = angle.cos() * 0.5;
        let a = angle.sin() * 0.5;
        let (cx, cy) = self.center;
        let p0 = (cx - a * self.height - b * self.width, cy + b * self.height - a * self.width);
        let p1 = (cx + a * self.height - b * self.width, cy - b * self.height - a * self.width);
        let p2 = (2.0 * cx - p0.0, 2.0 * cy - p0.1);
        let p3 = (2.0 * cx - p1.0, 2.0 * cy - p1.1);
        [p0, p1, p2, p3]
    }
}

/// Smallest box holding every point, `None` for an empty contour.
pub fn bounding_rect(points: &[Point<i32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (min_x, min_y, max_x, max_y) = points.iter().fold(
        (first.x, first.y, first.x, first.y),
        |(min_x, min_y, max_x, max_y), p| (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y)),
    );
    Some(BoundingBox {
        x: min_x.max(0) as u32,
        y: min_y.max(0) as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    })
}

/// Area enclosed by a closed contour.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    imageproc::geometry::contour_area(points).abs()
}

/// Minimum-area enclosing rectangle of a contour.
pub fn min_area_rect(points: &[Point<i32>]) -> RotatedRect {
    if points.is_empty() {
        return RotatedRect::new((0.0, 0.0), 0.0, 0.0, 0.0);
    }
    let corners = imageproc::geometry::min_area_rect(points);
    let [p0, p1, p2, _] = corners.map(|p| (p.x as f64, p.y as f64));
    let center = corners.iter().fold((0.0, 0.0), |(cx, cy), p| (cx + p.x as f64 / 4.0, cy + p.y as f64 / 4.0));
    let (ex, ey) = (p1.0 - p0.0, p1.1 - p0.1);
    let width = ex.hypot(ey);
    let height = (p2.0 - p1.0).hypot(p2.1 - p1.1);
    normalize_rect(center, width, height, ey.atan2(ex).to_degrees())
}

// Fold an edge direction into (-90, 0]; an edge pointing below the x-axis
// means its perpendicular is the `width` side.
fn normalize_rect(center: (f64, f64), width: f64, height: f64, angle: f64) -> RotatedRect {
    let mut angle = angle;
    while angle > 90.0 {
        angle -= 180.0;
    }
    while angle <= -90.0 {
        angle += 180.0;
    }
    let (width, height, angle) = if angle > 0.0 {
        (height, width, angle - 90.0)
    } else {
        (width, height, angle)
    };
    // +0.0 turns a negative zero into a plain zero
    RotatedRect::new((center.0 as f32, center.1 as f32), width as f32, height as f32, angle as f32 + 0.0)
}

/// Area and aspect-ratio gate for a plate profile.
///
/// The ratio is folded to be at least 1, so `(w, h)` and `(h, w)` get the same answer.
pub fn ratio_check(profile: PlateProfile, area: f32, width: f32, height: f32) -> bool {
    let t = profile.thresholds();
    if width <= 0.0 || height <= 0.0 {
        return false;
    }
    let mut ratio = width / height;
    if ratio < 1.0 {
        ratio = 1.0 / ratio;
    }
    !(area < t.min_area || area > t.max_area || ratio < t.min_ratio || ratio > t.max_ratio)
}

/// Tilt, size and ratio gate applied to each contour of the closed edge map.
pub fn validate_rotation_and_ratio(profile: PlateProfile, rect: &RotatedRect, max_tilt: f32) -> Result<bool, LprError> {
    if !rect.is_finite() {
        return Err(LprError::invalid_input(format!("non-finite rotated rectangle {:?}", rect)));
    }
    let (width, height) = (rect.width, rect.height);
    let tilt = if width > height {
        -rect.angle
    } else {
        90.0 + rect.angle
    };
    if tilt > max_tilt {
        return Ok(false);
    }
    if width == 0.0 || height == 0.0 {
        return Ok(false);
    }
    Ok(ratio_check(profile, width * height, width, height))
}


#[cfg(test)]
mod test {

    use super::*;
    use crate::profile::MAX_TILT;

    fn rect_outline(x0: i32, y0: i32, w: i32, h: i32) -> Vec<Point<i32>> {
        let mut pts = Vec::new();
        for x in x0..x0 + w {
            pts.push(Point::new(x, y0));
        }
        for y in y0 + 1..y0 + h {
            pts.push(Point::new(x0 + w - 1, y));
        }
        for x in (x0..x0 + w - 1).rev() {
            pts.push(Point::new(x, y0 + h - 1));
        }
        for y in (y0 + 1..y0 + h - 1).rev() {
            pts.push(Point::new(x0, y));
        }
        pts
    }

    #[test]
    fn bounding_rect_is_inclusive() {
        let pts = rect_outline(10, 20, 200, 47);
        assert_eq!(bounding_rect(&pts), Some(BoundingBox::new(10, 20, 200, 47)));
        assert_eq!(bounding_rect(&[]), None);
    }

    #[test]
    fn enclosed_area() {
        let pts = rect_outline(0, 0, 11, 6);
        assert_eq!(contour_area(&pts), 50.0);
        let mut reversed = pts.clone();
        reversed.reverse();
        assert_eq!(contour_area(&reversed), 50.0);
        assert_eq!(contour_area(&pts[..2]), 0.0);
    }

    #[test]
    fn axis_aligned_rect_has_zero_angle() {
        let rect = min_area_rect(&rect_outline(5, 5, 200, 47));
        assert_eq!(rect.angle, 0.0);
        assert!((rect.width - 199.0).abs() < 1e-3);
        assert!((rect.height - 46.0).abs() < 1e-3);
        assert!((rect.center.0 - 104.5).abs() < 1e-3);
        assert!((rect.center.1 - 28.0).abs() < 1e-3);
    }

    #[test]
    fn tall_rect_keeps_width_horizontal() {
        let rect = min_area_rect(&rect_outline(0, 0, 20, 90));
        assert_eq!(rect.angle, 0.0);
        assert!(rect.width < rect.height);
    }

    #[test]
    fn single_point_and_empty_contours() {
        let rect = min_area_rect(&[Point::new(3, 4)]);
        assert_eq!((rect.width, rect.height), (0.0, 0.0));
        assert_eq!(rect.center, (3.0, 4.0));
        assert_eq!(min_area_rect(&[]).area(), 0.0);
    }

    #[test]
    fn tilted_rect_angle() {
        // a 100x20 rectangle rotated so its long side climbs by 10 degrees
        let rect = RotatedRect::new((100.0, 100.0), 100.0, 20.0, -10.0);
        let pts: Vec<Point<i32>> = rect.points().iter()
            .map(|&(x, y)| Point::new(x.round() as i32, y.round() as i32))
            .collect();
        let found = min_area_rect(&pts);
        assert!(found.angle < 0.0 && found.angle > -90.0);
        let tilt = if found.width > found.height { -found.angle } else { 90.0 + found.angle };
        assert!((tilt - 10.0).abs() < 1.5, "tilt {}", tilt);
    }

    #[test]
    fn corners_of_axis_aligned_rect() {
        let rect = RotatedRect::new((50.0, 20.0), 40.0, 10.0, 0.0);
        let pts = rect.points();
        let xs: Vec<f32> = pts.iter().map(|p| p.0).collect();
        let ys: Vec<f32> = pts.iter().map(|p| p.1).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), 30.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 70.0);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), 15.0);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 25.0);
    }

    #[test]
    fn ratio_check_is_symmetric() {
        for profile in [PlateProfile::Rectangular, PlateProfile::Square] {
            for &(w, h) in &[(100.0, 25.0), (160.0, 40.0), (80.0, 80.0), (300.0, 30.0)] {
                assert_eq!(
                    ratio_check(profile, w * h, w, h),
                    ratio_check(profile, w * h, h, w),
                );
            }
        }
        assert!(ratio_check(PlateProfile::Rectangular, 6400.0, 160.0, 40.0));
        assert!(ratio_check(PlateProfile::Rectangular, 6400.0, 40.0, 160.0));
    }

    #[test]
    fn area_bounds_are_inclusive() {
        let p = PlateProfile::Rectangular;
        assert!(ratio_check(p, 3000.0, 100.0, 25.0));
        assert!(ratio_check(p, 30000.0, 100.0, 25.0));
        assert!(!ratio_check(p, 2999.0, 100.0, 25.0));
        assert!(!ratio_check(p, 30001.0, 100.0, 25.0));

        let p = PlateProfile::Square;
        assert!(ratio_check(p, 4000.0, 70.0, 60.0));
        assert!(!ratio_check(p, 3999.0, 70.0, 60.0));
    }

    #[test]
    fn ratio_out_of_range() {
        assert!(!ratio_check(PlateProfile::Rectangular, 5000.0, 100.0, 50.0));
        assert!(!ratio_check(PlateProfile::Square, 5000.0, 100.0, 50.0));
        assert!(!ratio_check(PlateProfile::Square, 5000.0, 0.0, 50.0));
    }

    #[test]
    fn rotation_gate() -> Result<(), LprError> {
        let p = PlateProfile::Rectangular;
        let flat = RotatedRect::new((0.0, 0.0), 200.0, 47.0, 0.0);
        assert!(validate_rotation_and_ratio(p, &flat, MAX_TILT)?);
        let slight = RotatedRect::new((0.0, 0.0), 200.0, 47.0, -12.0);
        assert!(validate_rotation_and_ratio(p, &slight, MAX_TILT)?);
        let steep = RotatedRect::new((0.0, 0.0), 200.0, 47.0, -20.0);
        assert!(!validate_rotation_and_ratio(p, &steep, MAX_TILT)?);
        // long side along the second edge, tilted the other way by 10 degrees
        let other_way = RotatedRect::new((0.0, 0.0), 47.0, 200.0, -80.0);
        assert!(validate_rotation_and_ratio(p, &other_way, MAX_TILT)?);
        // upright plate on its side
        let vertical = RotatedRect::new((0.0, 0.0), 47.0, 200.0, 0.0);
        assert!(!validate_rotation_and_ratio(p, &vertical, MAX_TILT)?);
        Ok(())
    }

    #[test]
    fn degenerate_and_non_finite_rects() {
        let p = PlateProfile::Rectangular;
        let flat_line = RotatedRect::new((0.0, 0.0), 200.0, 0.0, 0.0);
        assert_eq!(validate_rotation_and_ratio(p, &flat_line, MAX_TILT).ok(), Some(false));
        let broken = RotatedRect::new((f32::NAN, 0.0), 200.0, 47.0, 0.0);
        assert!(validate_rotation_and_ratio(p, &broken, MAX_TILT).is_err());
    }
}
