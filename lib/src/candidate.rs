use crate::region::Region;
use image::math::Rect;
use image::{GenericImageView, RgbImage};
use log::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateConfig {
    /// Regions with fewer pixels are sensor noise, not tiles
    pub min_tile_pixels: usize,
    /// Regions covering more than this fraction of the frame are background
    pub max_frame_fraction: f32,
    /// Accepted bounding box aspect ratio (width / height) band
    pub min_aspect: f32,
    pub max_aspect: f32,
    /// Margin around the bounding box of each crop
    pub padding: u32,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        CandidateConfig {
            min_tile_pixels: 100,
            max_frame_fraction: 1.0 / 3.0,
            min_aspect: 0.5,
            max_aspect: 2.0,
            padding: 10,
        }
    }
}

/// Why a region is not a tile
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    TooSmall(usize),
    TooLarge(usize),
    NotSquare(f32),
}

/// A region that looks like a tile, with its cropped image.
#[derive(Debug, Clone)]
pub struct TileCandidate {
    pub region: Region,
    /// The crop area in the source image
    pub crop: Rect,
    pub image: RgbImage,
}

impl TileCandidate {
    /// Candidates cut from a capped region are less trustworthy.
    pub fn is_low_confidence(&self) -> bool {
        self.region.capped
    }
}

/// Keeps the regions that are plausibly tiles.
pub struct TileCandidateFilter {
    config: CandidateConfig,
}

impl TileCandidateFilter {
    pub fn new(config: CandidateConfig) -> TileCandidateFilter {
        TileCandidateFilter { config }
    }

    /// Check one region against the size and shape limits for an image of `width` x `height`.
    ///
    /// Limits apply to the full region area, including pixels dropped by the cap.
    pub fn check(&self, region: &Region, width: u32, height: u32) -> Result<(), Rejection> {
        let area = region.area;
        let frame = (width as f32) * (height as f32);
        if area < self.config.min_tile_pixels {
            return Err(Rejection::TooSmall(area));
        }
        if area as f32 > frame * self.config.max_frame_fraction {
            return Err(Rejection::TooLarge(area));
        }
        let aspect = region.bounds.aspect_ratio();
        if aspect < self.config.min_aspect || aspect > self.config.max_aspect {
            return Err(Rejection::NotSquare(aspect));
        }
        Ok(())
    }

    /// Crop the padded bounding box of `region` out of `image`.
    pub fn crop(&self, region: &Region, image: &RgbImage) -> (Rect, RgbImage) {
        let (width, height) = image.dimensions();
        let rect = region.bounds.padded(self.config.padding, width, height);
        let tile = image.view(rect.x, rect.y, rect.width, rect.height).to_image();
        (rect, tile)
    }

    /// Turn regions into tile candidates, dropping the ones that fail [check](Self::check).
    pub fn filter(&self, regions: Vec<Region>, image: &RgbImage) -> Vec<TileCandidate> {
        let (width, height) = image.dimensions();
        let total = regions.len();
        let candidates: Vec<TileCandidate> = regions
            .into_iter()
            .filter(|region| match self.check(region, width, height) {
                Ok(()) => true,
                Err(rejection) => {
                    trace!("region at {:?} rejected: {:?}", region.bounds, rejection);
                    false
                }
            })
            .map(|region| {
                let (crop, tile) = self.crop(&region, image);
                TileCandidate {
                    region,
                    crop,
                    image: tile,
                }
            })
            .collect();
        debug!("{} of {} regions are tile candidates", candidates.len(), total);
        candidates
    }
}

impl Default for TileCandidateFilter {
    fn default() -> Self {
        TileCandidateFilter::new(CandidateConfig::default())
    }
}
