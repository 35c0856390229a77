//! Scores turns of the Qwirkle tile-laying game, from photos or from exact board positions.
//!
//! The library has two independent scoring paths:
//! * A photo pipeline that finds the tiles on a photo of the table, classifies them with a
//!   classifier you supply (or by [DominantColor] alone while it has no model), works out which tiles are new since the previous photo, and
//!   estimates the score of the turn from their geometry.
//! * An exact rule engine that validates and scores a move given integer board cells.
//!
//! # Scoring a move on a board
//! ```
//! # use qwirkle_counter::{calculate_move_score, Board, Color, GridTile, Shape};
//! let board = Board::new();
//! let placed = [
//!     GridTile::new(Color::Red, Shape::Circle, 0, 0),
//!     GridTile::new(Color::Red, Shape::Square, 1, 0),
//!     GridTile::new(Color::Red, Shape::Diamond, 2, 0),
//! ];
//! assert_eq!(calculate_move_score(&board, &placed), Ok(3));
//! ```
//!
//! # Scoring a turn from photos
//! ```no_run
//! # use qwirkle_counter::{Classification, ClassifierError, Color, Error, Shape, TurnDetector};
//! # use image::RgbImage;
//! // Plug in a trained model here
//! let classifier = |_tile: &RgbImage| -> Result<Classification, ClassifierError> {
//!     Ok(Classification::known(Color::Red, Shape::Star, 0.9, 0.9))
//! };
//! let detector = TurnDetector::new(classifier);
//! let report = detector.score_turn_from_files(Some("before.jpg"), "after.jpg")?;
//! println!("{} new tiles, about {} points", report.new_tiles.len(), report.score.total);
//! # Ok::<(), Error>(())
//! ```
//! The photo score is an estimate. When [TurnReport::grid_move] gives a sensible
//! placement, [calculate_move_score] turns it into a rule-checked score.

mod board;
mod candidate;
mod classify;
mod descriptor;
mod detector;
mod error;
mod grid;
mod lines;
mod matcher;
mod region;
mod tile;
mod utils;

pub use board::{
    calculate_move_score, is_valid_line, validate_move, Axis, Board, GridTile, Run, MAX_LINE_LENGTH,
    QWIRKLE_BONUS,
};
pub use candidate::{CandidateConfig, Rejection, TileCandidate, TileCandidateFilter};
pub use classify::{Classification, ClassifiedTile, DominantColor, TileClassifier, Untrained};
pub use descriptor::{NeighborSummary, PositionDescriptor, PositionDescriptorBuilder, NEIGHBOR_SLOTS};
pub use detector::{DetectorConfig, DifferenceConfig, TurnDetector, TurnReport, TurnStatus};
pub use error::{ClassifierError, Error, MoveError};
pub use grid::{estimate_spacing, infer_grid_positions, DEFAULT_SPACING};
pub use lines::{HeuristicScore, InferredLine, LineConfig, LineInferenceEngine};
pub use matcher::{MatchResult, MatcherConfig, TileMatcher};
pub use region::{
    changed_fraction, difference_mask, luminance, Bounds, ForegroundRule, Region, RegionConfig,
    RegionExtractor,
};
pub use tile::{Color, Shape, TileSet, LABELS_PER_KIND};
pub use utils::collage;
