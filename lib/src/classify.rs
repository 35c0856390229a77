use crate::descriptor::PositionDescriptor;
use crate::error::ClassifierError;
use crate::region::Bounds;
use crate::tile::{Color, Shape, TileSet, LABELS_PER_KIND};
use image::{Rgb, RgbImage};

/// The classifier's verdict for one tile image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification {
    Known {
        color: Color,
        shape: Shape,
        color_confidence: f32,
        shape_confidence: f32,
    },
    Unknown,
}

impl Default for Classification {
    fn default() -> Self {
        Classification::Unknown
    }
}

impl Classification {
    pub fn known(color: Color, shape: Shape, color_confidence: f32, shape_confidence: f32) -> Self {
        Classification::Known {
            color,
            shape,
            color_confidence: color_confidence.clamp(0.0, 1.0),
            shape_confidence: shape_confidence.clamp(0.0, 1.0),
        }
    }

    /// A color without a shape, as reported by [DominantColor].
    pub fn color_only(color: Color, color_confidence: f32) -> Self {
        Classification::known(color, Shape::Circle, color_confidence, 0.0)
    }

    /// The color label. A label with zero confidence is unknown.
    pub fn color(&self) -> Option<Color> {
        match *self {
            Classification::Known {
                color,
                color_confidence,
                ..
            } if color_confidence > 0.0 => Some(color),
            _ => None,
        }
    }

    /// The shape label. A label with zero confidence is unknown.
    pub fn shape(&self) -> Option<Shape> {
        match *self {
            Classification::Known {
                shape,
                shape_confidence,
                ..
            } if shape_confidence > 0.0 => Some(shape),
            _ => None,
        }
    }

    pub fn color_confidence(&self) -> f32 {
        match *self {
            Classification::Known {
                color_confidence, ..
            } => color_confidence,
            Classification::Unknown => 0.0,
        }
    }

    pub fn shape_confidence(&self) -> f32 {
        match *self {
            Classification::Known {
                shape_confidence, ..
            } => shape_confidence,
            Classification::Unknown => 0.0,
        }
    }

    /// Returns true if both labels are known with confidence above `floor`.
    pub fn is_confident(&self, floor: f32) -> bool {
        self.color_confidence() > floor && self.shape_confidence() > floor
    }
}

/// A tile found in one photo, with its labels and position.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedTile {
    /// Index of the tile within its photo
    pub id: usize,
    pub classification: Classification,
    /// Pixel centroid
    pub position: (f32, f32),
    pub descriptor: PositionDescriptor,
    pub bounds: Bounds,
    /// Pixel count of the tile region
    pub size: usize,
    /// The region was too large to keep every pixel
    pub low_confidence: bool,
}

impl ClassifiedTile {
    pub fn color(&self) -> Option<Color> {
        self.classification.color()
    }

    pub fn shape(&self) -> Option<Shape> {
        self.classification.shape()
    }
}

/// A color and shape classifier for cropped tile images.
///
/// Implementations are called once per tile candidate, possibly from several threads.
/// A failure only affects the tile it was called for.
pub trait TileClassifier: Send + Sync {
    fn classify(&self, tile: &RgbImage) -> Result<Classification, ClassifierError>;
}

impl<F> TileClassifier for F
where
    F: Fn(&RgbImage) -> Result<Classification, ClassifierError> + Send + Sync,
{
    fn classify(&self, tile: &RgbImage) -> Result<Classification, ClassifierError> {
        self(tile)
    }
}

/// A classifier without a trained model. Every call fails with `ModelNotReady`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Untrained;

impl TileClassifier for Untrained {
    fn classify(&self, _tile: &RgbImage) -> Result<Classification, ClassifierError> {
        Err(ClassifierError::ModelNotReady)
    }
}

/// Hue bands in degrees for every color label we know of, first match wins
const HUE_BANDS: [(&str, f32, f32); 9] = [
    ("red", 345., 360.),
    ("red", 0., 15.),
    ("orange", 15., 45.),
    ("yellow", 45., 70.),
    ("green", 70., 170.),
    ("blue", 180., 240.),
    ("purple-blue", 240., 270.),
    ("purple", 270., 300.),
    ("pink", 300., 360.),
];
const SILVER: &str = "silver";
/// Pixels with less spread between channels have no usable hue
const MIN_CHROMA: u8 = 30;

/// Hue in degrees, in [0, 360).
fn hue(r: f32, g: f32, b: f32, max: f32, delta: f32) -> f32 {
    let h = if max == r {
        60. * ((g - b) / delta % 6.)
    } else if max == g {
        60. * ((b - r) / delta + 2.)
    } else {
        60. * ((r - g) / delta + 4.)
    };
    if h < 0. {
        h + 360.
    } else {
        h
    }
}

/// Colors a tile by the most common pixel hue in the middle of its crop. Shapes stay unknown.
///
/// Works without a trained model. Only the labels of the given tile set are reported:
/// hue bands whose label is not in the set are ignored, and `silver` (bright, unsaturated
/// pixels) only exists in sets that have it.
#[derive(Debug, Clone)]
pub struct DominantColor {
    bands: Vec<(Color, f32, f32)>,
    silver: Option<Color>,
}

impl DominantColor {
    pub fn new(tile_set: &TileSet) -> DominantColor {
        DominantColor {
            bands: HUE_BANDS
                .iter()
                .filter_map(|&(label, lo, hi)| tile_set.parse_color(label).ok().map(|c| (c, lo, hi)))
                .collect(),
            silver: tile_set.parse_color(SILVER).ok(),
        }
    }

    /// The color of one pixel, if it has one in this tile set.
    pub fn pixel_color(&self, pixel: Rgb<u8>) -> Option<Color> {
        let [r, g, b] = pixel.0;
        let max = r.max(g).max(b);
        let delta = max - r.min(g).min(b);
        let value = max as f32 / 255.;
        let saturation = if max == 0 { 0. } else { delta as f32 / max as f32 };
        if saturation < 0.15 && value > 0.5 {
            return self.silver;
        }
        if delta < MIN_CHROMA {
            return None;
        }
        let h = hue(r as f32, g as f32, b as f32, max as f32, delta as f32);
        self.bands
            .iter()
            .find(|&&(_, lo, hi)| h >= lo && h < hi)
            .map(|&(color, _, _)| color)
    }
}

impl Default for DominantColor {
    fn default() -> Self {
        DominantColor::new(&TileSet::default())
    }
}

impl TileClassifier for DominantColor {
    fn classify(&self, tile: &RgbImage) -> Result<Classification, ClassifierError> {
        // the middle half of the crop, away from the padding around the tile
        let (w, h) = tile.dimensions();
        let mut votes = [0usize; LABELS_PER_KIND];
        let mut sampled = 0usize;
        for y in h / 4..h - h / 4 {
            for x in w / 4..w - w / 4 {
                sampled += 1;
                if let Some(color) = self.pixel_color(*tile.get_pixel(x, y)) {
                    votes[color.index()] += 1;
                }
            }
        }
        let (index, count) = votes
            .iter()
            .enumerate()
            .fold((0, 0), |best, (i, &n)| if n > best.1 { (i, n) } else { best });
        match Color::from_index(index) {
            Some(color) if count > 0 => Ok(Classification::color_only(
                color,
                count as f32 / sampled as f32,
            )),
            _ => Err(ClassifierError::Failed("no dominant color".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_clamps_confidence() {
        let c = Classification::known(Color::Red, Shape::Star, 1.5, -0.2);
        assert_eq!(c.color_confidence(), 1.0);
        assert_eq!(c.shape_confidence(), 0.0);
        assert!(!c.is_confident(0.5));
    }

    #[test]
    fn test_unknown_has_no_labels() {
        let c = Classification::Unknown;
        assert_eq!(c.color(), None);
        assert_eq!(c.shape(), None);
        assert_eq!(c.color_confidence(), 0.0);
    }

    #[test]
    fn test_closure_classifier() {
        let classifier = |_tile: &RgbImage| -> Result<Classification, ClassifierError> {
            Ok(Classification::known(Color::Blue, Shape::Cross, 0.9, 0.8))
        };
        let tile = RgbImage::new(4, 4);
        let c = classifier.classify(&tile).unwrap();
        assert_eq!(c.color(), Some(Color::Blue));
        assert_eq!(Untrained.classify(&tile), Err(ClassifierError::ModelNotReady));
    }

    #[test]
    fn test_zero_confidence_label_is_unknown() {
        let c = Classification::color_only(Color::Green, 0.7);
        assert_eq!(c.color(), Some(Color::Green));
        assert_eq!(c.shape(), None);
        assert!(!c.is_confident(0.5));
    }

    fn crop(center: Rgb<u8>) -> RgbImage {
        // a dark padding ring around the tile face
        let mut tile = RgbImage::new(40, 40);
        for y in 8..32 {
            for x in 8..32 {
                tile.put_pixel(x, y, center);
            }
        }
        tile
    }

    #[test]
    fn test_dominant_color_classic() {
        let classifier = DominantColor::default();
        let orange = classifier.classify(&crop(Rgb([200, 120, 40]))).unwrap();
        assert_eq!(orange.color(), Some(Color::Orange));
        assert_eq!(orange.shape(), None);
        assert_eq!(orange.color_confidence(), 1.0);
        assert_eq!(
            classifier.classify(&crop(Rgb([210, 40, 50]))).unwrap().color(),
            Some(Color::Red)
        );
        // no silver in the classic set
        assert!(classifier.classify(&crop(Rgb([200, 200, 205]))).is_err());
        assert!(classifier.classify(&RgbImage::new(2, 2)).is_err());
    }

    #[test]
    fn test_dominant_color_printed() {
        let set = TileSet::printed();
        let classifier = DominantColor::new(&set);
        let silver = classifier.classify(&crop(Rgb([200, 200, 205]))).unwrap();
        assert_eq!(set.color_label(silver.color().unwrap()), "silver");
        let pink = classifier.classify(&crop(Rgb([220, 60, 160]))).unwrap();
        assert_eq!(set.color_label(pink.color().unwrap()), "pink");
        let purple_blue = classifier.classify(&crop(Rgb([90, 60, 220]))).unwrap();
        assert_eq!(set.color_label(purple_blue.color().unwrap()), "purple-blue");
    }
}
