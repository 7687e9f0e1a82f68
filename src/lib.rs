//! License plate localisation with classical image processing.
//!
//! [`PlateDetector`] looks for dense vertical edges, closes them into blobs,
//! keeps the blobs shaped like a plate, straightens them and hands each one to
//! a [`CharacterSegmenter`]. Only plates with enough characters come back.

use image::{DynamicImage, GrayImage, RgbImage};
use imageproc::point::Point;
use log::{debug, trace};

use error::LprError;

pub mod clean;
pub mod error;
pub mod geometry;
pub mod image_process;
pub mod profile;
pub mod utils;

pub use geometry::{BoundingBox, RotatedRect};
pub use profile::{DetectorConfig, PlateProfile};

/// Splits a straightened plate into character images.
///
/// An empty result means segmentation failed.
pub trait CharacterSegmenter {
    fn segment(&self, plate: &RgbImage, min_width: u32) -> Vec<RgbImage>;
}

impl<F> CharacterSegmenter for F
where F: Fn(&RgbImage, u32) -> Vec<RgbImage>
{
    fn segment(&self, plate: &RgbImage, min_width: u32) -> Vec<RgbImage> {
        self(plate, min_width)
    }
}

/// A plate that passed every gate.
#[derive(Debug, Clone)]
pub struct PlateCandidate {
    /// Cropped and deskewed plate.
    pub plate: RgbImage,
    /// Where the plate sits in the input image.
    pub bounding_box: BoundingBox,
    /// Character images, upper line first for square plates.
    pub characters: Vec<RgbImage>,
}

/// How many contours each gate dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rejections {
    pub geometry: usize,
    pub brightness: usize,
    pub cleanup: usize,
    pub characters: usize,
}

/// Intermediate results of one detection call.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Binary edge map.
    pub threshold: Option<GrayImage>,
    /// Edge map after closing.
    pub morphed: Option<GrayImage>,
    /// Number of outer contours found in the closed map.
    pub contours: usize,
    pub rejections: Rejections,
}

pub struct PlateDetector<S> {
    profile: PlateProfile,
    config: DetectorConfig,
    segmenter: S,
}

impl<S: CharacterSegmenter> PlateDetector<S> {

    pub fn new(profile: PlateProfile, segmenter: S) -> Self {
        Self::with_config(profile, DetectorConfig::default(), segmenter)
    }

    pub fn with_config(profile: PlateProfile, config: DetectorConfig, segmenter: S) -> Self {
        Self { profile, config, segmenter }
    }

    pub fn profile(&self) -> PlateProfile {
        self.profile
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Find every plate in `img`, in contour discovery order.
    ///
    /// No plate is not an error, the result is just empty.
    pub fn find_possible_plates(&self, img: &DynamicImage) -> Result<Vec<PlateCandidate>, LprError> {
        self.run(&img.to_rgb8(), None)
    }

    /// Same as [`find_possible_plates`](Self::find_possible_plates), also filling `diagnostics`.
    pub fn find_possible_plates_with_diagnostics(&self, img: &DynamicImage, diagnostics: &mut Diagnostics) -> Result<Vec<PlateCandidate>, LprError> {
        self.run(&img.to_rgb8(), Some(diagnostics))
    }

    fn run(&self, img: &RgbImage, diagnostics: Option<&mut Diagnostics>) -> Result<Vec<PlateCandidate>, LprError> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(LprError::invalid_input(format!("empty image {}x{}", width, height)));
        }

        let threshold = image_process::preprocess(img);
        let (morphed, contours) = image_process::extract_plate_contours(&threshold, self.profile);
        debug!("{} contours in {}x{} image", contours.len(), width, height);

        let mut rejections = Rejections::default();
        let mut plates = Vec::new();
        for contour in &contours {
            if let Some(candidate) = self.check_plate(img, contour, &mut rejections)? {
                plates.push(candidate);
            }
        }
        debug!("{} plates kept, rejected {:?}", plates.len(), rejections);

        if let Some(diagnostics) = diagnostics {
            diagnostics.threshold = Some(threshold);
            diagnostics.morphed = Some(morphed);
            diagnostics.contours = contours.len();
            diagnostics.rejections = rejections;
        }
        Ok(plates)
    }

    // run one contour through every gate
    fn check_plate(&self, img: &RgbImage, contour: &[Point<i32>], rejections: &mut Rejections) -> Result<Option<PlateCandidate>, LprError> {
        let rect = geometry::min_area_rect(contour);
        if !geometry::validate_rotation_and_ratio(self.profile, &rect, self.config.max_tilt)? {
            trace!("contour rejected by geometry: {:?}", rect);
            rejections.geometry += 1;
            return Ok(None);
        }
        let outer = match geometry::bounding_rect(contour) {
            Some(b) => b,
            None => return Ok(None),
        };

        let region = utils::crop(img, &outer);
        if !self.is_bright_enough(&region) {
            trace!("region {:?} too dark", outer);
            rejections.brightness += 1;
            return Ok(None);
        }

        let cleaned = clean::clean_plate(self.profile, &region)?;
        let inner = match cleaned.bounding_box {
            Some(b) => b,
            None => {
                trace!("region {:?} has no plate-shaped blob", outer);
                rejections.cleanup += 1;
                return Ok(None);
            }
        };

        let characters = match self.find_characters_on_plate(&cleaned.plate) {
            Some(characters) if characters.len() > self.config.character_threshold => characters,
            other => {
                trace!("region {:?} gave {} characters", outer, other.map_or(0, |c| c.len()));
                rejections.characters += 1;
                return Ok(None);
            }
        };

        Ok(Some(PlateCandidate {
            plate: cleaned.plate,
            bounding_box: inner.translate(outer.x, outer.y),
            characters,
        }))
    }

    /// Brightness gate: dark regions such as shadows are not plates.
    pub fn is_bright_enough(&self, region: &RgbImage) -> bool {
        utils::mean_intensity(region) >= self.config.brightness_threshold
    }

    /// Segment a cleaned plate the way its profile lays characters out.
    ///
    /// Square plates are cut in half and both lines must give characters.
    pub fn find_characters_on_plate(&self, plate: &RgbImage) -> Option<Vec<RgbImage>> {
        let min_width = self.profile.min_char_width();
        match self.profile {
            PlateProfile::Rectangular => {
                let characters = self.segmenter.segment(plate, min_width);
                if characters.is_empty() { None } else { Some(characters) }
            },
            PlateProfile::Square => {
                let (upper, lower) = utils::split_halves(plate);
                let mut characters = self.segmenter.segment(&upper, min_width);
                let lower_characters = self.segmenter.segment(&lower, min_width);
                if characters.is_empty() || lower_characters.is_empty() {
                    return None;
                }
                characters.extend(lower_characters);
                Some(characters)
            },
        }
    }
}
