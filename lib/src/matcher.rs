use crate::classify::ClassifiedTile;
use crate::descriptor::{NeighborSummary, PositionDescriptor, NEIGHBOR_SLOTS};
use log::debug;

const COLOR_WEIGHT: f32 = 40.;
const SHAPE_WEIGHT: f32 = 40.;
const POSITION_WEIGHT: f32 = 15.;
const SIZE_WEIGHT: f32 = 5.;
const TOTAL_WEIGHT: f32 = COLOR_WEIGHT + SHAPE_WEIGHT + POSITION_WEIGHT + SIZE_WEIGHT;

/// Share of the position score taken by the relative position, the rest comes from neighbors
const OFFSET_SHARE: f32 = 0.7;
/// Size ratios at or below this count as no resemblance at all
const SIZE_RATIO_FLOOR: f32 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct MatcherConfig {
    /// A tile whose best similarity is below this is new
    pub new_tile_threshold: f32,
    /// Relative distance at which position similarity drops to zero
    pub position_tolerance: f32,
    /// Neighbor ranks compared, at most [NEIGHBOR_SLOTS]
    pub neighbor_slots: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfig {
            new_tile_threshold: 0.6,
            position_tolerance: 0.3,
            neighbor_slots: NEIGHBOR_SLOTS,
        }
    }
}

/// The verdict for one tile of the current photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub is_new: bool,
    /// Similarity of the best matching previous tile, 0 without previous tiles
    pub best_match_confidence: f32,
    /// Index of the best matching previous tile
    pub best_match: Option<usize>,
}

fn same<T: PartialEq>(a: Option<T>, b: Option<T>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn neighbor_agreement(a: &[NeighborSummary], b: &[NeighborSummary], max_slots: usize) -> f32 {
    let slots = a.len().max(b.len()).min(max_slots);
    if slots == 0 {
        // two lone tiles have identical (empty) surroundings
        return 1.;
    }
    // neighbors are compared rank by rank, each label counting on its own
    let agreeing: usize = a
        .iter()
        .zip(b)
        .take(slots)
        .map(|(na, nb)| same(na.color, nb.color) as usize + same(na.shape, nb.shape) as usize)
        .sum();
    agreeing as f32 / (2 * slots) as f32
}

fn size_similarity(a: usize, b: usize) -> f32 {
    let (small, large) = (a.min(b), a.max(b));
    if large == 0 {
        return 0.;
    }
    let ratio = small as f32 / large as f32;
    ((ratio - SIZE_RATIO_FLOOR) / (1. - SIZE_RATIO_FLOOR)).max(0.)
}

/// Decides which tiles of a photo were already on the previous photo.
pub struct TileMatcher {
    config: MatcherConfig,
}

impl TileMatcher {
    pub fn new(config: MatcherConfig) -> TileMatcher {
        TileMatcher { config }
    }

    /// Position similarity in [0, 1]: relative offset falloff blended with neighbor agreement.
    pub fn position_similarity(&self, a: &PositionDescriptor, b: &PositionDescriptor) -> f32 {
        let falloff = (1. - a.offset(b) / self.config.position_tolerance).max(0.);
        let agreement = neighbor_agreement(&a.neighbors, &b.neighbors, self.config.neighbor_slots);
        OFFSET_SHARE * falloff + (1. - OFFSET_SHARE) * agreement
    }

    /// Weighted similarity in [0, 1] between a current tile `a` and a previous tile `b`.
    ///
    /// Unknown labels never count as a match.
    pub fn similarity(&self, a: &ClassifiedTile, b: &ClassifiedTile) -> f32 {
        let color = same(a.color(), b.color()) as u8 as f32;
        let shape = same(a.shape(), b.shape()) as u8 as f32;
        let position = self.position_similarity(&a.descriptor, &b.descriptor);
        let size = size_similarity(a.size, b.size);
        (COLOR_WEIGHT * color + SHAPE_WEIGHT * shape + POSITION_WEIGHT * position + SIZE_WEIGHT * size)
            / TOTAL_WEIGHT
    }

    /// Compare `tile` with every previous tile and keep the best one.
    ///
    /// On equal similarity the earliest previous tile wins.
    pub fn match_tile(&self, tile: &ClassifiedTile, previous: &[ClassifiedTile]) -> MatchResult {
        let mut best: Option<(usize, f32)> = None;
        for (index, candidate) in previous.iter().enumerate() {
            let score = self.similarity(tile, candidate);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((index, score));
            }
        }
        let result = match best {
            Some((index, score)) => MatchResult {
                is_new: score < self.config.new_tile_threshold,
                best_match_confidence: score,
                best_match: Some(index),
            },
            None => MatchResult {
                is_new: true,
                best_match_confidence: 0.,
                best_match: None,
            },
        };
        debug!(
            "tile {} best match {:?} ({:.3}) new: {}",
            tile.id, result.best_match, result.best_match_confidence, result.is_new
        );
        result
    }

    /// One verdict per current tile, in order.
    pub fn match_tiles(
        &self,
        current: &[ClassifiedTile],
        previous: &[ClassifiedTile],
    ) -> Vec<MatchResult> {
        current
            .iter()
            .map(|tile| self.match_tile(tile, previous))
            .collect()
    }
}

impl Default for TileMatcher {
    fn default() -> Self {
        TileMatcher::new(MatcherConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;
    use crate::region::Bounds;
    use crate::tile::{Color, Shape};

    fn neighbor(color: Color, shape: Shape) -> NeighborSummary {
        NeighborSummary {
            distance: 0.1,
            angle: 0.,
            color: Some(color),
            shape: Some(shape),
        }
    }

    fn classified(
        classification: Classification,
        at: (f32, f32),
        neighbors: Vec<NeighborSummary>,
        size: usize,
    ) -> ClassifiedTile {
        ClassifiedTile {
            id: 0,
            classification,
            position: (at.0 * 1000., at.1 * 1000.),
            descriptor: PositionDescriptor {
                relative_x: at.0,
                relative_y: at.1,
                neighbors,
            },
            bounds: Bounds {
                min_x: 0,
                max_x: 9,
                min_y: 0,
                max_y: 9,
            },
            size,
            low_confidence: false,
        }
    }

    fn red(shape: Shape) -> Classification {
        Classification::known(Color::Red, shape, 0.9, 0.9)
    }

    #[test]
    fn test_self_similarity_is_one() {
        let tile = classified(
            red(Shape::Circle),
            (0.5, 0.5),
            vec![neighbor(Color::Blue, Shape::Star)],
            400,
        );
        let score = TileMatcher::default().similarity(&tile, &tile);
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_below_threshold_is_new() {
        // color and position agree, shape and size do not: 0.40 + 0.15 = 0.55
        let n = vec![neighbor(Color::Blue, Shape::Star)];
        let current = classified(red(Shape::Circle), (0.5, 0.5), n.clone(), 1000);
        let previous = classified(red(Shape::Square), (0.5, 0.5), n, 100);
        let result = TileMatcher::default().match_tile(&current, &[previous]);
        assert!((result.best_match_confidence - 0.55).abs() < 1e-5);
        assert!(result.is_new);
    }

    #[test]
    fn test_above_threshold_is_present() {
        // labels agree, position and size do not: 0.80
        let current = classified(
            red(Shape::Circle),
            (0.1, 0.1),
            vec![neighbor(Color::Blue, Shape::Star)],
            1000,
        );
        let previous = classified(
            red(Shape::Circle),
            (0.9, 0.9),
            vec![neighbor(Color::Green, Shape::Cross)],
            100,
        );
        let result = TileMatcher::default().match_tile(&current, &[previous]);
        assert!((result.best_match_confidence - 0.8).abs() < 1e-5);
        assert!(!result.is_new);
    }

    #[test]
    fn test_unknown_labels_never_match() {
        let current = classified(Classification::Unknown, (0.5, 0.5), vec![], 400);
        let previous = classified(Classification::Unknown, (0.5, 0.5), vec![], 400);
        let matcher = TileMatcher::default();
        // position and size only: (15 + 5) / 100
        assert!((matcher.similarity(&current, &previous) - 0.2).abs() < 1e-5);
        assert!(matcher.match_tile(&current, &[previous]).is_new);
    }

    #[test]
    fn test_best_match_not_first_match() {
        let current = classified(red(Shape::Circle), (0.5, 0.5), vec![], 400);
        let far = classified(red(Shape::Circle), (0.95, 0.95), vec![], 400);
        let near = classified(red(Shape::Circle), (0.52, 0.5), vec![], 400);
        let result = TileMatcher::default().match_tile(&current, &[far, near]);
        assert_eq!(result.best_match, Some(1));
    }

    #[test]
    fn test_no_previous_tiles() {
        let current = classified(red(Shape::Circle), (0.5, 0.5), vec![], 400);
        let result = TileMatcher::default().match_tile(&current, &[]);
        assert!(result.is_new);
        assert_eq!(result.best_match, None);
    }

    #[test]
    fn test_size_similarity() {
        assert_eq!(size_similarity(100, 100), 1.);
        assert_eq!(size_similarity(30, 100), 0.);
        assert_eq!(size_similarity(10, 100), 0.);
        assert!((size_similarity(65, 100) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_lone_tile_matches_itself() {
        let tile = classified(red(Shape::Diamond), (0.3, 0.6), vec![], 700);
        let matcher = TileMatcher::default();
        assert!((matcher.similarity(&tile, &tile) - 1.0).abs() < 1e-6);
        assert!(!matcher.match_tile(&tile, &[tile.clone()]).is_new);
    }
}
