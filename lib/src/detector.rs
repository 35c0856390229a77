use crate::board::{Board, GridTile};
use crate::candidate::{CandidateConfig, TileCandidate, TileCandidateFilter};
use crate::classify::{Classification, ClassifiedTile, DominantColor, TileClassifier};
use crate::descriptor::{PositionDescriptorBuilder, NEIGHBOR_SLOTS};
use crate::error::{ClassifierError, Error, MoveError};
use crate::grid::infer_grid_positions;
use crate::lines::{HeuristicScore, LineConfig, LineInferenceEngine};
use crate::matcher::{MatchResult, MatcherConfig, TileMatcher};
use crate::region::{changed_fraction, difference_mask, RegionConfig, RegionExtractor};
use crate::tile::TileSet;
use image::RgbImage;
use log::{debug, info, warn};
use std::path::Path;

/// Pixel differencing of the two photos, used to overrule the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceConfig {
    /// Summed absolute RGB difference above which a pixel counts as changed
    pub threshold: u16,
    /// A tile the matcher calls new stays new only if at least this share of its
    /// bounding box changed
    pub min_changed_fraction: f32,
}

impl Default for DifferenceConfig {
    fn default() -> Self {
        DifferenceConfig {
            threshold: 30,
            min_changed_fraction: 0.3,
        }
    }
}

/// Settings for every stage of turn detection.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub region: RegionConfig,
    pub candidate: CandidateConfig,
    pub matcher: MatcherConfig,
    pub lines: LineConfig,
    pub tile_set: TileSet,
    /// `None` disables differencing, photos of different sizes are never differenced
    pub difference: Option<DifferenceConfig>,
    /// Label the color with [DominantColor] when the classifier has no model
    pub color_fallback: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            region: RegionConfig::default(),
            candidate: CandidateConfig::default(),
            matcher: MatcherConfig::default(),
            lines: LineConfig::default(),
            tile_set: TileSet::default(),
            difference: Some(DifferenceConfig::default()),
            color_fallback: true,
        }
    }
}

fn check(ok: bool, message: &str) -> Result<(), Error> {
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidConfig(message.to_string()))
    }
}

impl DetectorConfig {
    /// Check that all settings are in range.
    pub fn validate(&self) -> Result<(), Error> {
        check(
            self.region.max_region_pixels > 0,
            "max_region_pixels must be positive",
        )?;
        let c = &self.candidate;
        check(
            c.max_frame_fraction > 0. && c.max_frame_fraction <= 1.,
            "max_frame_fraction must be in (0, 1]",
        )?;
        check(
            c.min_aspect > 0. && c.min_aspect <= c.max_aspect,
            "aspect band must satisfy 0 < min_aspect <= max_aspect",
        )?;
        let m = &self.matcher;
        check(
            (0. ..=1.).contains(&m.new_tile_threshold),
            "new_tile_threshold must be in [0, 1]",
        )?;
        check(m.position_tolerance > 0., "position_tolerance must be positive")?;
        check(
            m.neighbor_slots <= NEIGHBOR_SLOTS,
            "neighbor_slots exceeds the descriptor size",
        )?;
        let l = &self.lines;
        check(l.proximity_radius > 0., "proximity_radius must be positive")?;
        check(
            (0. ..90.).contains(&l.axis_tolerance_degrees),
            "axis_tolerance_degrees must be in [0, 90)",
        )?;
        check(
            (0. ..1.).contains(&l.disagreement),
            "disagreement must be in [0, 1)",
        )?;
        if let Some(d) = &self.difference {
            check(
                d.min_changed_fraction > 0. && d.min_changed_fraction <= 1.,
                "min_changed_fraction must be in (0, 1]",
            )?;
        }
        Ok(())
    }
}

/// How a turn detection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// No tile was found on the current photo
    NoTilesDetected,
    /// Tiles were found, but all of them were already on the previous photo
    NoNewTiles,
    Scored,
}

/// The outcome of comparing two photos of the board.
#[derive(Debug, Clone)]
pub struct TurnReport {
    /// Every tile on the current photo
    pub tiles: Vec<ClassifiedTile>,
    /// One verdict per entry in `tiles`
    pub matches: Vec<MatchResult>,
    /// The tiles judged new, in detection order
    pub new_tiles: Vec<ClassifiedTile>,
    /// Estimated from pixel geometry, not authoritative
    pub score: HeuristicScore,
    pub status: TurnStatus,
}

impl TurnReport {
    /// Indices into `tiles` of the new tiles.
    pub fn new_indices(&self) -> Vec<usize> {
        self.matches
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_new)
            .map(|(i, _)| i)
            .collect()
    }

    /// Heuristic grid placement of this turn: a board holding the tiles that were
    /// already there, and the move made of the new tiles.
    ///
    /// Feed the result to [crate::calculate_move_score] for a rule-checked score.
    /// Tiles with unknown labels are left out.
    ///
    /// # Errors
    /// `PositionOccupied` if two existing tiles map to the same cell.
    pub fn grid_move(&self) -> Result<(Board, Vec<GridTile>), MoveError> {
        let mut existing = Vec::new();
        let mut placed = Vec::new();
        for (index, tile) in infer_grid_positions(&self.tiles) {
            if self.matches[index].is_new {
                placed.push(tile);
            } else {
                existing.push(tile);
            }
        }
        Ok((Board::from_tiles(existing)?, placed))
    }
}

/// Finds the tiles placed between two photos of a board and estimates the turn score.
///
/// The classifier is a field, so several detectors (and games) can run side by side.
pub struct TurnDetector<C> {
    config: DetectorConfig,
    classifier: C,
    extractor: RegionExtractor,
    filter: TileCandidateFilter,
    matcher: TileMatcher,
    lines: LineInferenceEngine,
    fallback: Option<DominantColor>,
}

impl<C: TileClassifier> TurnDetector<C> {
    /// A detector with the default settings
    pub fn new(classifier: C) -> TurnDetector<C> {
        TurnDetector::build(DetectorConfig::default(), classifier)
    }

    /// # Errors
    /// `InvalidConfig` if a setting is out of range.
    pub fn with_config(config: DetectorConfig, classifier: C) -> Result<TurnDetector<C>, Error> {
        config.validate()?;
        Ok(TurnDetector::build(config, classifier))
    }

    fn build(config: DetectorConfig, classifier: C) -> TurnDetector<C> {
        TurnDetector {
            extractor: RegionExtractor::new(config.region.clone()),
            filter: TileCandidateFilter::new(config.candidate.clone()),
            matcher: TileMatcher::new(config.matcher.clone()),
            lines: LineInferenceEngine::new(config.lines.clone()),
            fallback: if config.color_fallback {
                Some(DominantColor::new(&config.tile_set))
            } else {
                None
            },
            config,
            classifier,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn tile_set(&self) -> &TileSet {
        &self.config.tile_set
    }

    /// Regions of `image` that pass the tile filter, with their crops.
    pub fn find_candidates(&self, image: &RgbImage) -> Vec<TileCandidate> {
        let regions = self.extractor.extract(image);
        self.filter.filter(regions, image)
    }

    fn classify_one(&self, index: usize, candidate: &TileCandidate) -> Classification {
        let result = match (self.classifier.classify(&candidate.image), &self.fallback) {
            (Err(ClassifierError::ModelNotReady), Some(fallback)) => {
                debug!("tile {} has no model, labeling by dominant color", index);
                fallback.classify(&candidate.image)
            }
            (result, _) => result,
        };
        match result {
            Ok(classification) => classification,
            Err(e) => {
                warn!("tile {} classified as unknown: {}", index, e);
                Classification::Unknown
            }
        }
    }

    fn classify_all(&self, candidates: &[TileCandidate]) -> Vec<Classification> {
        #[cfg(feature = "parallel")]
        let labels: Vec<Classification> = {
            use rayon::prelude::*;
            candidates
                .par_iter()
                .enumerate()
                .map(|(index, candidate)| self.classify_one(index, candidate))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let labels: Vec<Classification> = candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| self.classify_one(index, candidate))
            .collect();

        labels
    }

    /// Find, crop and classify every tile on `image`.
    ///
    /// A classifier failure only turns the affected tile into [Classification::Unknown].
    pub fn detect_tiles(&self, image: &RgbImage) -> Vec<ClassifiedTile> {
        let candidates = self.find_candidates(image);
        let labels = self.classify_all(&candidates);
        let centroids: Vec<(f32, f32)> = candidates.iter().map(|c| c.region.centroid).collect();
        let (width, height) = image.dimensions();
        let descriptors = PositionDescriptorBuilder::new(width, height).build_all(&centroids, &labels);

        candidates
            .iter()
            .zip(labels)
            .zip(descriptors)
            .enumerate()
            .map(|(id, ((candidate, classification), descriptor))| ClassifiedTile {
                id,
                classification,
                position: candidate.region.centroid,
                descriptor,
                bounds: candidate.region.bounds,
                size: candidate.region.pixels.len(),
                low_confidence: candidate.is_low_confidence(),
            })
            .collect()
    }

    /// Compare the photo taken after a turn with the one taken before it.
    ///
    /// Without a previous photo every tile on `current` is new. With a previous photo
    /// of the same size and differencing enabled, a tile only stays new when enough of
    /// its pixels changed between the photos.
    pub fn score_turn(&self, previous: Option<&RgbImage>, current: &RgbImage) -> TurnReport {
        let previous_tiles = previous.map(|image| self.detect_tiles(image)).unwrap_or_default();
        let tiles = self.detect_tiles(current);
        let mut matches = self.matcher.match_tiles(&tiles, &previous_tiles);
        if let (Some(previous), Some(config)) = (previous, &self.config.difference) {
            self.veto_unchanged(previous, current, config, &tiles, &mut matches);
        }
        let new: Vec<usize> = matches
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_new)
            .map(|(i, _)| i)
            .collect();
        let new_tiles: Vec<ClassifiedTile> = new.iter().map(|&i| tiles[i].clone()).collect();

        let (width, height) = current.dimensions();
        let score = self.lines.estimate(&tiles, &new, width, height);
        let status = if tiles.is_empty() {
            TurnStatus::NoTilesDetected
        } else if new.is_empty() {
            TurnStatus::NoNewTiles
        } else {
            TurnStatus::Scored
        };
        info!(
            "{} tiles before, {} now, {} new, estimated score {} ({:?})",
            previous_tiles.len(),
            tiles.len(),
            new_tiles.len(),
            score.total,
            status
        );
        TurnReport {
            tiles,
            matches,
            new_tiles,
            score,
            status,
        }
    }

    fn veto_unchanged(
        &self,
        previous: &RgbImage,
        current: &RgbImage,
        config: &DifferenceConfig,
        tiles: &[ClassifiedTile],
        matches: &mut [MatchResult],
    ) {
        let mask = match difference_mask(previous, current, config.threshold) {
            Some(mask) => mask,
            None => {
                debug!(
                    "photos differ in size {:?} vs {:?}, skipping difference check",
                    previous.dimensions(),
                    current.dimensions()
                );
                return;
            }
        };
        for (tile, verdict) in tiles.iter().zip(matches.iter_mut()) {
            if !verdict.is_new {
                continue;
            }
            let changed = changed_fraction(&mask, &tile.bounds);
            if changed < config.min_changed_fraction {
                debug!(
                    "tile {} unchanged between photos ({:.2} changed), not new",
                    tile.id, changed
                );
                verdict.is_new = false;
            }
        }
    }

    /// Like [score_turn](Self::score_turn), reading the photos from files.
    pub fn score_turn_from_files<P: AsRef<Path>>(
        &self,
        previous: Option<P>,
        current: P,
    ) -> Result<TurnReport, Error> {
        let previous = match previous {
            Some(path) => Some(open_rgb(path.as_ref())?),
            None => None,
        };
        let current = open_rgb(current.as_ref())?;
        Ok(self.score_turn(previous.as_ref(), &current))
    }

    /// Like [score_turn](Self::score_turn), decoding the photos from encoded bytes.
    pub fn score_turn_from_memory(
        &self,
        previous: Option<&[u8]>,
        current: &[u8],
    ) -> Result<TurnReport, Error> {
        let previous = match previous {
            Some(buf) => Some(image::load_from_memory(buf)?.into_rgb8()),
            None => None,
        };
        let current = image::load_from_memory(current)?.into_rgb8();
        Ok(self.score_turn(previous.as_ref(), &current))
    }
}

fn open_rgb(path: &Path) -> Result<RgbImage, Error> {
    debug!("open {}", path.display());
    image::open(path)
        .map(|img| img.into_rgb8())
        .map_err(|source| Error::ImageError {
            path: path.display().to_string(),
            source,
        })
}
