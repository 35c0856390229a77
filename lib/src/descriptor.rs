use crate::classify::Classification;
use crate::tile::{Color, Shape};
use std::cmp::Ordering;

/// Number of nearest neighbors kept per descriptor
pub const NEIGHBOR_SLOTS: usize = 4;

/// A nearby tile, seen from the tile owning the descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborSummary {
    /// Pixel distance divided by the larger image dimension
    pub distance: f32,
    /// Direction in radians, image coordinates (y down)
    pub angle: f32,
    pub color: Option<Color>,
    pub shape: Option<Shape>,
}

/// Where a tile sits in a photo, in terms that survive a change of resolution.
///
/// `relative_x` / `relative_y` are only a proxy for the board position: a moved camera
/// shifts them, so they are compared with a tolerance, never for equality.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionDescriptor {
    pub relative_x: f32,
    pub relative_y: f32,
    /// Nearest first, at most [NEIGHBOR_SLOTS]
    pub neighbors: Vec<NeighborSummary>,
}

impl PositionDescriptor {
    /// Euclidean distance between the relative positions of two descriptors.
    pub fn offset(&self, other: &PositionDescriptor) -> f32 {
        let dx = self.relative_x - other.relative_x;
        let dy = self.relative_y - other.relative_y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Builds descriptors for all tiles found in one photo.
pub struct PositionDescriptorBuilder {
    width: f32,
    height: f32,
}

impl PositionDescriptorBuilder {
    pub fn new(width: u32, height: u32) -> PositionDescriptorBuilder {
        PositionDescriptorBuilder {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
        }
    }

    fn scale(&self) -> f32 {
        self.width.max(self.height)
    }

    /// Descriptor for the tile at `index`, given every tile's centroid and label.
    ///
    /// `centroids` and `labels` are parallel slices.
    pub fn build(
        &self,
        index: usize,
        centroids: &[(f32, f32)],
        labels: &[Classification],
    ) -> PositionDescriptor {
        let (x, y) = centroids[index];
        let scale = self.scale();
        let mut neighbors: Vec<NeighborSummary> = centroids
            .iter()
            .zip(labels)
            .enumerate()
            .filter(|&(other, _)| other != index)
            .map(|(_, (&(ox, oy), label))| {
                let (dx, dy) = (ox - x, oy - y);
                NeighborSummary {
                    distance: (dx * dx + dy * dy).sqrt() / scale,
                    angle: dy.atan2(dx),
                    color: label.color(),
                    shape: label.shape(),
                }
            })
            .collect();
        neighbors.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        neighbors.truncate(NEIGHBOR_SLOTS);

        PositionDescriptor {
            relative_x: x / self.width,
            relative_y: y / self.height,
            neighbors,
        }
    }

    pub fn build_all(
        &self,
        centroids: &[(f32, f32)],
        labels: &[Classification],
    ) -> Vec<PositionDescriptor> {
        (0..centroids.len())
            .map(|index| self.build(index, centroids, labels))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_relative_position_and_neighbors() {
        let centroids = vec![(100., 50.), (150., 50.), (100., 150.), (400., 50.), (10., 190.), (300., 190.)];
        let labels = vec![
            Classification::known(Color::Red, Shape::Circle, 0.9, 0.9),
            Classification::known(Color::Red, Shape::Square, 0.9, 0.9),
            Classification::Unknown,
            Classification::Unknown,
            Classification::Unknown,
            Classification::Unknown,
        ];
        let builder = PositionDescriptorBuilder::new(400, 200);
        let d = builder.build(0, &centroids, &labels);
        assert_eq!(d.relative_x, 0.25);
        assert_eq!(d.relative_y, 0.25);
        assert_eq!(d.neighbors.len(), NEIGHBOR_SLOTS);
        assert_eq!(d.neighbors[0].distance, 50. / 400.);
        assert_eq!(d.neighbors[0].angle, 0.);
        assert_eq!(d.neighbors[0].shape, Some(Shape::Square));
        assert_eq!(d.neighbors[1].angle, FRAC_PI_2);
        assert_eq!(d.neighbors[1].color, None);
        // the tile at (400, 50) is the farthest and falls off the list
        assert!(d.neighbors.iter().all(|n| n.distance < 300. / 400.));
    }

    #[test]
    fn test_distance_is_resolution_independent() {
        let labels = vec![Classification::Unknown; 2];
        let small = PositionDescriptorBuilder::new(400, 300).build(0, &[(100., 100.), (140., 100.)], &labels);
        let large = PositionDescriptorBuilder::new(800, 600).build(0, &[(200., 200.), (280., 200.)], &labels);
        assert_eq!(small.neighbors[0].distance, large.neighbors[0].distance);
        assert_eq!(small.offset(&large), 0.);
    }
}
