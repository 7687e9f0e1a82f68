/// Layout of the plates a detector looks for.
///
/// Picked once when the detector is built. Every stage reads its
/// structuring element and thresholds from here instead of branching on a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateProfile {
    /// Single line, wide aspect.
    Rectangular,
    /// Two lines, near-square aspect.
    Square,
}

/// Geometric gate for one profile. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateThresholds {
    /// Nominal width/height of the plate. Not used by the gate itself.
    pub aspect: f32,
    pub min_area: f32,
    pub max_area: f32,
    pub min_ratio: f32,
    pub max_ratio: f32,
}

impl PlateProfile {

    /// Width and height of the rectangular kernel used for closing the edge map.
    /// The square layout spreads characters over two lines, so it needs a wider one.
    pub fn structuring_element(&self) -> (u32, u32) {
        match self {
            PlateProfile::Rectangular => (22, 3),
            PlateProfile::Square => (26, 5),
        }
    }

    pub fn thresholds(&self) -> PlateThresholds {
        match self {
            PlateProfile::Rectangular => PlateThresholds {
                aspect: 4.272727,
                min_area: 3000.0,
                max_area: 30000.0,
                min_ratio: 3.0,
                max_ratio: 7.0,
            },
            PlateProfile::Square => PlateThresholds {
                aspect: 1.0,
                min_area: 4000.0,
                max_area: 30000.0,
                min_ratio: 0.5,
                max_ratio: 1.5,
            },
        }
    }

    /// Minimum character width handed to the segmenter, per text line.
    pub fn min_char_width(&self) -> u32 {
        match self {
            PlateProfile::Rectangular => 400,
            PlateProfile::Square => 200,
        }
    }
}

/// Mean intensity a cropped candidate needs to reach (inclusive).
pub const BRIGHTNESS_THRESHOLD: f64 = 40.0;
/// Candidates need strictly more segmented characters than this.
pub const CHARACTER_THRESHOLD: usize = 5;
/// Largest tilt, in degrees, a candidate may have before it is dropped.
pub const MAX_TILT: f32 = 15.0;

/// Empirically tuned gates that are not tied to a plate layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    pub brightness_threshold: f64,
    pub character_threshold: usize,
    pub max_tilt: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            brightness_threshold: BRIGHTNESS_THRESHOLD,
            character_threshold: CHARACTER_THRESHOLD,
            max_tilt: MAX_TILT,
        }
    }
}

impl DetectorConfig {

    pub fn with_brightness_threshold(mut self, threshold: f64) -> Self {
        self.brightness_threshold = threshold;
        self
    }

    pub fn with_character_threshold(mut self, threshold: usize) -> Self {
        self.character_threshold = threshold;
        self
    }

    pub fn with_max_tilt(mut self, degrees: f32) -> Self {
        self.max_tilt = degrees;
        self
    }
}
