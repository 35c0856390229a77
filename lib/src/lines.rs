//! Heuristic turn scoring from pixel geometry.
//!
//! Photos give no exact board cells, so lines are inferred from tiles that sit close
//! together along roughly the same image axis. The result is an estimate; the exact
//! score needs grid coordinates and the rule engine in [crate::board].

use crate::board::{Axis, MAX_LINE_LENGTH, QWIRKLE_BONUS};
use crate::classify::{Classification, ClassifiedTile};
use crate::tile::{Color, Shape};
use log::{debug, trace};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub struct LineConfig {
    /// Neighbor search radius as a fraction of the larger image dimension
    pub proximity_radius: f32,
    /// Allowed deviation from the horizontal or vertical image axis, in degrees
    pub axis_tolerance_degrees: f32,
    /// Tiles need both confidences above this to count as evidence for or against a line
    pub confidence_floor: f32,
    /// Fraction of a line allowed to disagree with "same color, distinct shapes" (or vice versa)
    pub disagreement: f32,
}

impl Default for LineConfig {
    fn default() -> Self {
        LineConfig {
            proximity_radius: 0.15,
            axis_tolerance_degrees: 30.,
            confidence_floor: 0.5,
            disagreement: 0.2,
        }
    }
}

/// A group of aligned tiles containing at least one new tile.
#[derive(Debug, Clone, PartialEq)]
pub struct InferredLine {
    pub axis: Axis,
    /// Indices into the current tile set, ascending
    pub members: Vec<usize>,
    pub score: u32,
}

/// The estimated score of a turn.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeuristicScore {
    pub total: u32,
    pub lines: Vec<InferredLine>,
    /// New tiles that joined no plausible line
    pub isolated: usize,
    pub multi_tile_bonus: u32,
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> DisjointSet {
        DisjointSet {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // the lower index stays root so groups are labelled deterministically
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }
}

fn majority<T: Ord + Copy>(values: impl Iterator<Item = T>) -> (usize, usize) {
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let most = counts.values().copied().max().unwrap_or(0);
    (most, counts.len())
}

/// Estimates a turn score from tile positions in a photo.
pub struct LineInferenceEngine {
    config: LineConfig,
}

impl LineInferenceEngine {
    pub fn new(config: LineConfig) -> LineInferenceEngine {
        LineInferenceEngine { config }
    }

    fn aligned(&self, dx: f32, dy: f32, axis: Axis) -> bool {
        let angle = dy.atan2(dx).to_degrees().rem_euclid(180.);
        let tol = self.config.axis_tolerance_degrees;
        match axis {
            Axis::Horizontal => angle <= tol || angle >= 180. - tol,
            Axis::Vertical => (angle - 90.).abs() <= tol,
        }
    }

    /// Relaxed line rule on the confidently classified members.
    ///
    /// Mostly one color with mostly distinct shapes, or the other way around. With fewer
    /// than two confident members there is no evidence against the line.
    pub fn is_plausible(&self, members: &[&ClassifiedTile]) -> bool {
        let floor = self.config.confidence_floor;
        let labels: Vec<(Color, Shape)> = members
            .iter()
            .filter(|t| t.classification.is_confident(floor))
            .filter_map(|t| match t.classification {
                Classification::Known { color, shape, .. } => Some((color, shape)),
                Classification::Unknown => None,
            })
            .collect();
        if labels.len() < 2 {
            return true;
        }
        let n = labels.len() as f32;
        let allowed = self.config.disagreement * n;
        let mostly = |count: usize| n - count as f32 <= allowed + f32::EPSILON;

        let (color_major, distinct_colors) = majority(labels.iter().map(|l| l.0));
        let (shape_major, distinct_shapes) = majority(labels.iter().map(|l| l.1));
        (mostly(color_major) && mostly(distinct_shapes))
            || (mostly(shape_major) && mostly(distinct_colors))
    }

    /// Groups of at least two tiles chained along `axis`, each containing a new tile.
    fn groups(&self, tiles: &[ClassifiedTile], new: &HashSet<usize>, axis: Axis, radius: f32) -> Vec<Vec<usize>> {
        let mut sets = DisjointSet::new(tiles.len());
        for i in 0..tiles.len() {
            for j in i + 1..tiles.len() {
                let (xi, yi) = tiles[i].position;
                let (xj, yj) = tiles[j].position;
                let (dx, dy) = (xj - xi, yj - yi);
                if (dx * dx + dy * dy).sqrt() <= radius && self.aligned(dx, dy, axis) {
                    sets.union(i, j);
                }
            }
        }
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..tiles.len() {
            let root = sets.find(i);
            groups.entry(root).or_insert_with(Vec::new).push(i);
        }
        groups
            .into_iter()
            .map(|(_, members)| members)
            .filter(|members| members.len() > 1 && members.iter().any(|i| new.contains(i)))
            .collect()
    }

    /// Estimate the score for the tiles at indices `new` of the current photo's `tiles`.
    ///
    /// `width` and `height` are the photo dimensions.
    pub fn estimate(&self, tiles: &[ClassifiedTile], new: &[usize], width: u32, height: u32) -> HeuristicScore {
        if new.is_empty() {
            return HeuristicScore::default();
        }
        let radius = self.config.proximity_radius * width.max(height) as f32;
        let new_set: HashSet<usize> = new.iter().copied().collect();

        let mut lines = Vec::new();
        let mut covered = HashSet::new();
        for &axis in &[Axis::Horizontal, Axis::Vertical] {
            for members in self.groups(tiles, &new_set, axis, radius) {
                let refs: Vec<&ClassifiedTile> = members.iter().map(|&i| &tiles[i]).collect();
                if members.len() > MAX_LINE_LENGTH || !self.is_plausible(&refs) {
                    trace!("implausible {} line {:?}", axis, members);
                    continue;
                }
                let len = members.len() as u32;
                let score = if members.len() == MAX_LINE_LENGTH {
                    len + QWIRKLE_BONUS
                } else {
                    len
                };
                covered.extend(members.iter().copied());
                lines.push(InferredLine {
                    axis,
                    members,
                    score,
                });
            }
        }

        let isolated = new_set.iter().filter(|i| !covered.contains(*i)).count();
        let multi_tile_bonus = if new.len() > 1 {
            (new.len() / 2) as u32
        } else {
            0
        };
        let total = lines.iter().map(|l| l.score).sum::<u32>() + isolated as u32 + multi_tile_bonus;
        debug!(
            "{} new tiles: {} lines, {} isolated, bonus {}, estimate {}",
            new.len(),
            lines.len(),
            isolated,
            multi_tile_bonus,
            total
        );
        HeuristicScore {
            total,
            lines,
            isolated,
            multi_tile_bonus,
        }
    }
}

impl Default for LineInferenceEngine {
    fn default() -> Self {
        LineInferenceEngine::new(LineConfig::default())
    }
}
