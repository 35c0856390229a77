use image::math::Rect;
use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::gradients::sobel_gradients;
use imageproc::map::map_pixels;
use log::{debug, trace};

const FOREGROUND: u8 = 255;
const BACKGROUND: u8 = 0;

/// How pixels are split into foreground and background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForegroundRule {
    /// Luminance above `threshold` is foreground.
    Brightness { threshold: u8 },
    /// Sobel gradient magnitude at or below `magnitude_threshold` is foreground,
    /// so tile faces enclosed by strong edges become separate regions.
    Edges { magnitude_threshold: u16 },
}

impl Default for ForegroundRule {
    fn default() -> Self {
        ForegroundRule::Brightness { threshold: 128 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionConfig {
    pub rule: ForegroundRule,
    /// Regions with fewer pixels are dropped as noise
    pub min_region_pixels: usize,
    /// Pixel coordinates kept per region. Larger regions are marked `capped`.
    pub max_region_pixels: usize,
}

impl Default for RegionConfig {
    fn default() -> Self {
        RegionConfig {
            rule: ForegroundRule::default(),
            min_region_pixels: 50,
            max_region_pixels: 250_000,
        }
    }
}

/// Inclusive pixel bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl Bounds {
    fn at(x: u32, y: u32) -> Bounds {
        Bounds {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        }
    }

    fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Width over height
    pub fn aspect_ratio(&self) -> f32 {
        self.width() as f32 / self.height() as f32
    }

    /// Grow by `padding` on every side, clipped to a `width` x `height` image.
    pub fn padded(&self, padding: u32, width: u32, height: u32) -> Rect {
        let x = self.min_x.saturating_sub(padding);
        let y = self.min_y.saturating_sub(padding);
        let right = (self.max_x + padding).min(width.saturating_sub(1));
        let bottom = (self.max_y + padding).min(height.saturating_sub(1));
        Rect {
            x,
            y,
            width: right - x + 1,
            height: bottom - y + 1,
        }
    }
}

/// A 4-connected set of foreground pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub bounds: Bounds,
    /// Mean pixel position
    pub centroid: (f32, f32),
    /// Number of pixels in the region
    pub area: usize,
    /// Member pixels, at most `max_region_pixels` of them
    pub pixels: Vec<(u32, u32)>,
    /// Set when members were discarded to respect `max_region_pixels`
    pub capped: bool,
}

/// Convert to luminance with the 0.299 / 0.587 / 0.114 weights.
pub fn luminance(image: &RgbImage) -> GrayImage {
    map_pixels(image, |_x, _y, p: Rgb<u8>| {
        let [r, g, b] = p.0;
        let gray = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([gray.round().min(255.0) as u8])
    })
}

/// Change mask of two photos of the same size: 255 where the summed absolute RGB
/// difference exceeds `threshold`, 0 elsewhere. `None` if the sizes differ.
pub fn difference_mask(previous: &RgbImage, current: &RgbImage, threshold: u16) -> Option<GrayImage> {
    if previous.dimensions() != current.dimensions() {
        return None;
    }
    let (width, height) = current.dimensions();
    Some(ImageBuffer::from_fn(width, height, |x, y| {
        let a = previous.get_pixel(x, y);
        let b = current.get_pixel(x, y);
        let diff: u16 = a
            .0
            .iter()
            .zip(b.0.iter())
            .map(|(&p, &q)| (p as i16 - q as i16).abs() as u16)
            .sum();
        Luma([if diff > threshold { FOREGROUND } else { BACKGROUND }])
    }))
}

/// Share of the pixels inside `bounds` that are set in `mask`.
pub fn changed_fraction(mask: &GrayImage, bounds: &Bounds) -> f32 {
    let (width, height) = mask.dimensions();
    if bounds.min_x >= width || bounds.min_y >= height {
        return 0.;
    }
    let max_x = bounds.max_x.min(width - 1);
    let max_y = bounds.max_y.min(height - 1);
    let mut changed = 0usize;
    for y in bounds.min_y..=max_y {
        for x in bounds.min_x..=max_x {
            if mask.get_pixel(x, y)[0] == FOREGROUND {
                changed += 1;
            }
        }
    }
    let total = ((max_x - bounds.min_x + 1) * (max_y - bounds.min_y + 1)) as f32;
    changed as f32 / total
}

/// Finds connected foreground regions (blobs) in an image.
pub struct RegionExtractor {
    config: RegionConfig,
}

impl RegionExtractor {
    pub fn new(config: RegionConfig) -> RegionExtractor {
        RegionExtractor { config }
    }

    /// Foreground mask of `image`: 255 for foreground, 0 for background.
    pub fn binarize(&self, image: &RgbImage) -> GrayImage {
        let gray = luminance(image);
        match self.config.rule {
            ForegroundRule::Brightness { threshold } => map_pixels(&gray, |_x, _y, p| {
                Luma([if p[0] > threshold { FOREGROUND } else { BACKGROUND }])
            }),
            ForegroundRule::Edges {
                magnitude_threshold,
            } => {
                let gradients = sobel_gradients(&gray);
                map_pixels(&gradients, |_x, _y, p| {
                    Luma([if p[0] > magnitude_threshold {
                        BACKGROUND
                    } else {
                        FOREGROUND
                    }])
                })
            }
        }
    }

    /// Binarize `image` and return its regions in raster order of their first pixel.
    pub fn extract(&self, image: &RgbImage) -> Vec<Region> {
        let mask = self.binarize(image);
        self.find_regions(&mask)
    }

    /// Flood fill every foreground region of `mask`.
    ///
    /// Regions smaller than `min_region_pixels` are dropped. The output only depends on
    /// the mask, so identical input always gives identical regions.
    pub fn find_regions(&self, mask: &GrayImage) -> Vec<Region> {
        let (width, height) = mask.dimensions();
        let mut visited = vec![false; (width as usize) * (height as usize)];
        let mut regions = Vec::new();
        let mut dropped = 0;
        for y in 0..height {
            for x in 0..width {
                let index = (y * width + x) as usize;
                if visited[index] || mask.get_pixel(x, y)[0] != FOREGROUND {
                    continue;
                }
                let region = self.flood_fill(mask, x, y, &mut visited);
                if region.area >= self.config.min_region_pixels {
                    trace!(
                        "region at {:?} area {} capped {}",
                        region.bounds,
                        region.area,
                        region.capped
                    );
                    regions.push(region);
                } else {
                    dropped += 1;
                }
            }
        }
        debug!(
            "found {} regions in {}x{} mask, dropped {} as noise",
            regions.len(),
            width,
            height,
            dropped
        );
        regions
    }

    fn flood_fill(&self, mask: &GrayImage, x0: u32, y0: u32, visited: &mut [bool]) -> Region {
        let (width, height) = mask.dimensions();
        let cap = self.config.max_region_pixels;
        let mut stack = vec![(x0, y0)];
        visited[(y0 * width + x0) as usize] = true;

        let mut bounds = Bounds::at(x0, y0);
        let mut pixels = Vec::new();
        let (mut sum_x, mut sum_y, mut area) = (0u64, 0u64, 0usize);

        while let Some((x, y)) = stack.pop() {
            area += 1;
            sum_x += x as u64;
            sum_y += y as u64;
            bounds.include(x, y);
            if pixels.len() < cap {
                pixels.push((x, y));
            }

            let mut visit = |nx: u32, ny: u32| {
                let index = (ny * width + nx) as usize;
                if !visited[index] && mask.get_pixel(nx, ny)[0] == FOREGROUND {
                    visited[index] = true;
                    stack.push((nx, ny));
                }
            };
            if x + 1 < width {
                visit(x + 1, y);
            }
            if x > 0 {
                visit(x - 1, y);
            }
            if y + 1 < height {
                visit(x, y + 1);
            }
            if y > 0 {
                visit(x, y - 1);
            }
        }

        Region {
            bounds,
            centroid: (
                (sum_x as f64 / area as f64) as f32,
                (sum_y as f64 / area as f64) as f32,
            ),
            area,
            capped: area > pixels.len(),
            pixels,
        }
    }
}

impl Default for RegionExtractor {
    fn default() -> Self {
        RegionExtractor::new(RegionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with_squares(squares: &[(u32, u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(100, 80);
        for &(x0, y0, size) in squares {
            for y in y0..y0 + size {
                for x in x0..x0 + size {
                    mask.put_pixel(x, y, Luma([FOREGROUND]));
                }
            }
        }
        mask
    }

    #[test]
    fn test_find_regions_raster_order() {
        let mask = mask_with_squares(&[(60, 10, 10), (5, 40, 12), (5, 5, 2)]);
        let config = RegionConfig {
            min_region_pixels: 10,
            ..Default::default()
        };
        let regions = RegionExtractor::new(config).find_regions(&mask);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].area, 100);
        assert_eq!(regions[0].bounds.min_x, 60);
        assert_eq!(regions[0].centroid, (64.5, 14.5));
        assert_eq!(regions[1].bounds.width(), 12);
        assert_eq!(regions[1].bounds.height(), 12);
    }

    #[test]
    fn test_regions_are_four_connected() {
        // two squares touching only at a corner
        let mask = mask_with_squares(&[(0, 0, 10), (10, 10, 10)]);
        let regions = RegionExtractor::default().find_regions(&mask);
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn test_capped_region_keeps_bounds() {
        let mask = mask_with_squares(&[(10, 10, 20)]);
        let config = RegionConfig {
            max_region_pixels: 50,
            ..Default::default()
        };
        let regions = RegionExtractor::new(config).find_regions(&mask);
        assert_eq!(regions.len(), 1);
        let region = &regions[0];
        assert!(region.capped);
        assert_eq!(region.pixels.len(), 50);
        assert_eq!(region.area, 400);
        assert_eq!(region.bounds.width(), 20);
        assert_eq!(region.bounds.max_y, 29);
    }

    #[test]
    fn test_binarize_brightness() {
        let mut image = RgbImage::new(4, 1);
        image.put_pixel(0, 0, Rgb([255, 255, 255]));
        image.put_pixel(1, 0, Rgb([129, 129, 129]));
        image.put_pixel(2, 0, Rgb([128, 128, 128]));
        let mask = RegionExtractor::default().binarize(&image);
        let values: Vec<u8> = mask.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![255, 255, 0, 0]);
    }

    #[test]
    fn test_binarize_edges_splits_tiles() {
        // two bright squares on a dark background: the edge ring separates faces from background
        let mut image = RgbImage::new(60, 30);
        for y in 5..25 {
            for x in 5..25 {
                image.put_pixel(x, y, Rgb([220, 220, 220]));
                image.put_pixel(x + 30, y, Rgb([220, 220, 220]));
            }
        }
        let config = RegionConfig {
            rule: ForegroundRule::Edges {
                magnitude_threshold: 50,
            },
            min_region_pixels: 50,
            ..Default::default()
        };
        let regions = RegionExtractor::new(config).extract(&image);
        // background plus two tile faces
        assert_eq!(regions.len(), 3);
        assert!(regions[0].area > regions[1].area);
    }

    #[test]
    fn test_difference_mask() {
        let before = RgbImage::from_pixel(20, 10, Rgb([40, 40, 40]));
        let mut after = before.clone();
        // 10 + 10 + 10 is not above the threshold, 11 + 10 + 10 is
        after.put_pixel(1, 1, Rgb([50, 50, 50]));
        after.put_pixel(2, 1, Rgb([51, 50, 50]));
        for y in 0..10 {
            for x in 10..15 {
                after.put_pixel(x, y, Rgb([200, 0, 0]));
            }
        }
        let mask = difference_mask(&before, &after, 30).unwrap();
        assert_eq!(mask.get_pixel(1, 1)[0], BACKGROUND);
        assert_eq!(mask.get_pixel(2, 1)[0], FOREGROUND);

        let right = Bounds {
            min_x: 10,
            max_x: 19,
            min_y: 0,
            max_y: 9,
        };
        assert_eq!(changed_fraction(&mask, &right), 0.5);
        assert_eq!(difference_mask(&before, &before, 30).map(|m| changed_fraction(&m, &right)), Some(0.));
        assert!(difference_mask(&before, &RgbImage::new(10, 20), 30).is_none());
    }

    #[test]
    fn test_padded_clips_to_image() {
        let bounds = Bounds {
            min_x: 2,
            max_x: 20,
            min_y: 5,
            max_y: 9,
        };
        let rect = bounds.padded(10, 25, 100);
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (0, 0, 25, 20));
    }
}
