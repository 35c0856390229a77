use crate::error::MoveError;
use crate::tile::{Color, Shape};
use log::debug;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// The longest line the rules allow
pub const MAX_LINE_LENGTH: usize = 6;
/// Extra points for completing a line of [MAX_LINE_LENGTH] tiles
pub const QWIRKLE_BONUS: u32 = 6;

/// A board axis. Horizontal runs vary in `x`, vertical runs vary in `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    fn step(self) -> (i32, i32) {
        match self {
            Axis::Horizontal => (1, 0),
            Axis::Vertical => (0, 1),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Axis::Horizontal => write!(f, "horizontal"),
            Axis::Vertical => write!(f, "vertical"),
        }
    }
}

/// A tile at an exact board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridTile {
    pub color: Color,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

impl GridTile {
    pub fn new(color: Color, shape: Shape, x: i32, y: i32) -> GridTile {
        GridTile { color, shape, x, y }
    }

    fn cell(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

impl fmt::Display for GridTile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}@({},{})", self.color, self.shape, self.x, self.y)
    }
}

/// A maximal contiguous run of occupied cells along one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub axis: Axis,
    /// The coordinate shared by all tiles in the run (`y` for horizontal runs)
    pub fixed: i32,
    /// The lowest varying coordinate of the run
    pub start: i32,
    pub tiles: Vec<GridTile>,
}

impl Run {
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Points for this run: one per tile, plus the bonus for a full line.
    pub fn score(&self) -> u32 {
        let len = self.tiles.len() as u32;
        if self.tiles.len() == MAX_LINE_LENGTH {
            len + QWIRKLE_BONUS
        } else {
            len
        }
    }

    fn key(&self) -> (Axis, i32, i32) {
        (self.axis, self.fixed, self.start)
    }
}

/// Returns true if `tiles` share a color or a shape and contain no duplicate tile.
pub fn is_valid_line(tiles: &[GridTile]) -> bool {
    let first = match tiles.first() {
        Some(first) => first,
        None => return false,
    };
    let same_color = tiles.iter().all(|t| t.color == first.color);
    let same_shape = tiles.iter().all(|t| t.shape == first.shape);
    if !same_color && !same_shape {
        return false;
    }
    let unique: HashSet<(Color, Shape)> = tiles.iter().map(|t| (t.color, t.shape)).collect();
    unique.len() == tiles.len()
}

/// The axis shared by all placed tiles. `None` for a single tile.
fn line_axis(tiles: &[GridTile]) -> Result<Option<Axis>, MoveError> {
    if tiles.len() < 2 {
        return Ok(None);
    }
    let first = tiles[0];
    if tiles.iter().all(|t| t.y == first.y) {
        Ok(Some(Axis::Horizontal))
    } else if tiles.iter().all(|t| t.x == first.x) {
        Ok(Some(Axis::Vertical))
    } else {
        Err(MoveError::NotALine)
    }
}

/// The cell next to `(x, y)` in direction `(dx, dy)`. `None` past the edge of the coordinate range.
fn neighbor_cell(x: i32, y: i32, dx: i32, dy: i32) -> Option<(i32, i32)> {
    Some((x.checked_add(dx)?, y.checked_add(dy)?))
}

/// The state of a game board: at most one tile per cell.
///
/// A board only grows. Moves are validated against a copy, so a rejected move never
/// changes the board it was checked against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    tiles: BTreeMap<(i32, i32), GridTile>,
}

impl Board {
    pub fn new() -> Board {
        Board::default()
    }

    /// Restore a board from previously placed tiles, without checking the line rules.
    /// # Errors
    /// `PositionOccupied` if two tiles share a cell.
    pub fn from_tiles<I>(tiles: I) -> Result<Board, MoveError>
    where
        I: IntoIterator<Item = GridTile>,
    {
        let mut board = Board::new();
        for tile in tiles {
            if board.contains(tile.x, tile.y) {
                return Err(MoveError::PositionOccupied {
                    x: tile.x,
                    y: tile.y,
                });
            }
            board.place(tile);
        }
        Ok(board)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&GridTile> {
        self.tiles.get(&(x, y))
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.tiles.contains_key(&(x, y))
    }

    /// All tiles, ordered by cell.
    pub fn tiles(&self) -> impl Iterator<Item = &GridTile> {
        self.tiles.values()
    }

    fn place(&mut self, tile: GridTile) {
        self.tiles.insert(tile.cell(), tile);
    }

    fn occupied(&self, cell: Option<(i32, i32)>) -> bool {
        cell.map_or(false, |(x, y)| self.contains(x, y))
    }

    fn has_neighbor(&self, x: i32, y: i32) -> bool {
        [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .iter()
            .any(|&(dx, dy)| self.occupied(neighbor_cell(x, y, dx, dy)))
    }

    /// The contiguous run through `(x, y)` along `axis`, walking outward while cells are occupied.
    ///
    /// Empty if `(x, y)` itself is empty.
    pub fn run(&self, x: i32, y: i32, axis: Axis) -> Run {
        let (dx, dy) = axis.step();
        let (mut sx, mut sy) = (x, y);
        if self.contains(x, y) {
            while let Some((px, py)) =
                neighbor_cell(sx, sy, -dx, -dy).filter(|&(px, py)| self.contains(px, py))
            {
                sx = px;
                sy = py;
            }
        }
        let mut tiles = Vec::new();
        let mut cell = Some((sx, sy));
        while let Some(tile) = cell.and_then(|(cx, cy)| self.get(cx, cy)) {
            tiles.push(*tile);
            cell = neighbor_cell(tile.x, tile.y, dx, dy);
        }
        let (fixed, start) = match axis {
            Axis::Horizontal => (sy, sx),
            Axis::Vertical => (sx, sy),
        };
        Run {
            axis,
            fixed,
            start,
            tiles,
        }
    }

    fn with_placed(&self, tiles: &[GridTile]) -> Board {
        let mut trial = self.clone();
        for &tile in tiles {
            trial.place(tile);
        }
        trial
    }

    /// Check whether placing `tiles` is a legal move on this board.
    ///
    /// # Errors
    /// * `NoTiles` if nothing is placed
    /// * `NotALine` if the tiles do not share a row or column, or leave a gap in it
    /// * `PositionOccupied` if a target cell is taken (or targeted twice)
    /// * `NotConnected` if the board has tiles and none of the new tiles touches one
    /// * `LineTooLong` if a resulting run exceeds [MAX_LINE_LENGTH]
    /// * `InvalidLine` if a resulting run mixes colors and shapes or repeats a tile
    pub fn validate_move(&self, tiles: &[GridTile]) -> Result<(), MoveError> {
        let result = self.check_move(tiles);
        if let Err(err) = &result {
            debug!("rejected move of {} tiles: {}", tiles.len(), err);
        }
        result
    }

    fn check_move(&self, tiles: &[GridTile]) -> Result<(), MoveError> {
        if tiles.is_empty() {
            return Err(MoveError::NoTiles);
        }
        let axis = line_axis(tiles)?;

        let mut targeted = HashSet::new();
        for tile in tiles {
            if self.contains(tile.x, tile.y) || !targeted.insert(tile.cell()) {
                return Err(MoveError::PositionOccupied {
                    x: tile.x,
                    y: tile.y,
                });
            }
        }

        let trial = self.with_placed(tiles);
        if let Some(axis) = axis {
            // every cell between the outermost new tiles must end up filled
            let run = trial.run(tiles[0].x, tiles[0].y, axis);
            let covered = tiles.iter().all(|t| run.tiles.iter().any(|r| r.cell() == t.cell()));
            if !covered {
                return Err(MoveError::NotALine);
            }
        }

        if self.is_empty() {
            if !is_valid_line(tiles) {
                return Err(MoveError::InvalidLine {
                    axis: axis.unwrap_or(Axis::Horizontal),
                });
            }
        } else if !tiles.iter().any(|t| self.has_neighbor(t.x, t.y)) {
            return Err(MoveError::NotConnected);
        }

        for tile in tiles {
            for &axis in &[Axis::Horizontal, Axis::Vertical] {
                let run = trial.run(tile.x, tile.y, axis);
                if run.len() > MAX_LINE_LENGTH {
                    return Err(MoveError::LineTooLong { length: run.len() });
                }
                if run.len() > 1 && !is_valid_line(&run.tiles) {
                    return Err(MoveError::InvalidLine { axis });
                }
            }
        }
        Ok(())
    }

    /// Score a move without applying it.
    ///
    /// Every run of two or more tiles through a new tile scores its length once per move,
    /// plus [QWIRKLE_BONUS] when it reaches [MAX_LINE_LENGTH]. A new tile that touches
    /// nothing in either direction scores 1.
    /// # Errors
    /// The validation error if the move is illegal.
    pub fn score_move(&self, tiles: &[GridTile]) -> Result<u32, MoveError> {
        self.validate_move(tiles)?;
        let trial = self.with_placed(tiles);

        let mut scored = HashSet::new();
        let mut total = 0;
        for tile in tiles {
            let horizontal = trial.run(tile.x, tile.y, Axis::Horizontal);
            let vertical = trial.run(tile.x, tile.y, Axis::Vertical);
            for run in [&horizontal, &vertical].iter() {
                if run.len() > 1 && scored.insert(run.key()) {
                    total += run.score();
                }
            }
            if horizontal.len() == 1 && vertical.len() == 1 {
                total += 1;
            }
        }
        debug!("move of {} tiles scores {}", tiles.len(), total);
        Ok(total)
    }

    /// Validate, score and place `tiles`. On error the board is left unchanged.
    pub fn apply_move(&mut self, tiles: &[GridTile]) -> Result<u32, MoveError> {
        let score = self.score_move(tiles)?;
        for &tile in tiles {
            self.place(tile);
        }
        Ok(score)
    }
}

/// Check whether placing `tiles` on `board` is legal. See [Board::validate_move].
pub fn validate_move(board: &Board, tiles: &[GridTile]) -> Result<(), MoveError> {
    board.validate_move(tiles)
}

/// Score placing `tiles` on `board`. See [Board::score_move].
pub fn calculate_move_score(board: &Board, tiles: &[GridTile]) -> Result<u32, MoveError> {
    board.score_move(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(color: Color, shape: Shape, x: i32, y: i32) -> GridTile {
        GridTile::new(color, shape, x, y)
    }

    fn red_row(len: usize) -> Vec<GridTile> {
        Shape::ALL
            .iter()
            .take(len)
            .enumerate()
            .map(|(i, &shape)| tile(Color::Red, shape, i as i32, 0))
            .collect()
    }

    #[test]
    fn test_first_move_scores_line_length() {
        let board = Board::new();
        let tiles = vec![
            tile(Color::Red, Shape::Circle, 0, 0),
            tile(Color::Red, Shape::Square, 1, 0),
            tile(Color::Red, Shape::Diamond, 2, 0),
        ];
        assert_eq!(board.validate_move(&tiles), Ok(()));
        assert_eq!(board.score_move(&tiles), Ok(3));
    }

    #[test]
    fn test_single_tile_first_move() {
        let board = Board::new();
        let tiles = vec![tile(Color::Blue, Shape::Star, 4, -2)];
        assert_eq!(board.score_move(&tiles), Ok(1));
    }

    #[test]
    fn test_no_tiles() {
        assert_eq!(Board::new().validate_move(&[]), Err(MoveError::NoTiles));
    }

    #[test]
    fn test_not_a_line() {
        let tiles = vec![
            tile(Color::Red, Shape::Circle, 0, 0),
            tile(Color::Red, Shape::Square, 1, 1),
        ];
        assert_eq!(Board::new().validate_move(&tiles), Err(MoveError::NotALine));
    }

    #[test]
    fn test_gap_is_not_a_line() {
        let tiles = vec![
            tile(Color::Red, Shape::Circle, 0, 0),
            tile(Color::Red, Shape::Square, 2, 0),
        ];
        assert_eq!(Board::new().validate_move(&tiles), Err(MoveError::NotALine));
    }

    #[test]
    fn test_gap_filled_by_existing_tile() {
        let mut board = Board::new();
        board
            .apply_move(&[tile(Color::Red, Shape::Square, 1, 0)])
            .unwrap();
        let tiles = vec![
            tile(Color::Red, Shape::Circle, 0, 0),
            tile(Color::Red, Shape::Diamond, 2, 0),
        ];
        assert_eq!(board.score_move(&tiles), Ok(3));
    }

    #[test]
    fn test_position_occupied() {
        let mut board = Board::new();
        board.apply_move(&red_row(2)).unwrap();
        let tiles = vec![tile(Color::Blue, Shape::Circle, 0, 0)];
        assert_eq!(
            board.validate_move(&tiles),
            Err(MoveError::PositionOccupied { x: 0, y: 0 })
        );
    }

    #[test]
    fn test_same_cell_twice() {
        let tiles = vec![
            tile(Color::Red, Shape::Circle, 0, 0),
            tile(Color::Red, Shape::Square, 0, 0),
        ];
        assert_eq!(
            Board::new().validate_move(&tiles),
            Err(MoveError::PositionOccupied { x: 0, y: 0 })
        );
    }

    #[test]
    fn test_mixed_first_line() {
        let tiles = vec![
            tile(Color::Red, Shape::Circle, 0, 0),
            tile(Color::Blue, Shape::Square, 1, 0),
        ];
        assert_eq!(
            Board::new().validate_move(&tiles),
            Err(MoveError::InvalidLine {
                axis: Axis::Horizontal
            })
        );
    }

    #[test]
    fn test_duplicate_in_line() {
        let mut board = Board::new();
        board.apply_move(&red_row(2)).unwrap();
        let tiles = vec![tile(Color::Red, Shape::Circle, 2, 0)];
        assert_eq!(
            board.validate_move(&tiles),
            Err(MoveError::InvalidLine {
                axis: Axis::Horizontal
            })
        );
    }

    #[test]
    fn test_not_connected() {
        let mut board = Board::new();
        board.apply_move(&red_row(2)).unwrap();
        let tiles = vec![tile(Color::Red, Shape::Star, 5, 5)];
        assert_eq!(board.validate_move(&tiles), Err(MoveError::NotConnected));
    }

    #[test]
    fn test_qwirkle_bonus() {
        let mut board = Board::new();
        assert_eq!(board.apply_move(&red_row(5)), Ok(5));
        let sixth = vec![tile(Color::Red, Shape::Cross, 5, 0)];
        assert_eq!(board.score_move(&sixth), Ok(12));
    }

    #[test]
    fn test_line_too_long() {
        let mut board = Board::new();
        board.apply_move(&red_row(6)).unwrap();
        let seventh = vec![tile(Color::Red, Shape::Circle, 6, 0)];
        assert_eq!(
            board.validate_move(&seventh),
            Err(MoveError::LineTooLong { length: 7 })
        );
    }

    #[test]
    fn test_cross_scores_both_lines() {
        let mut board = Board::new();
        board.apply_move(&red_row(3)).unwrap();
        // blue circle below the red circle, green circle below that
        let tiles = vec![
            tile(Color::Blue, Shape::Circle, 0, 1),
            tile(Color::Green, Shape::Circle, 0, 2),
        ];
        assert_eq!(board.apply_move(&tiles), Ok(3));

        // blue square joins the blue circle's row and the red square's column
        let tiles = vec![tile(Color::Blue, Shape::Square, 1, 1)];
        assert_eq!(board.score_move(&tiles), Ok(4));
    }

    #[test]
    fn test_rejected_move_leaves_board_untouched() {
        let mut board = Board::new();
        board.apply_move(&red_row(3)).unwrap();
        let before = board.clone();
        let bad = vec![
            tile(Color::Blue, Shape::Star, 3, 0),
            tile(Color::Blue, Shape::Cross, 4, 0),
        ];
        assert!(board.apply_move(&bad).is_err());
        assert_eq!(board, before);
        assert_eq!(board.len(), 3);
    }

    #[test]
    fn test_run_walks_both_directions() {
        let board = Board::from_tiles(red_row(4)).unwrap();
        let run = board.run(2, 0, Axis::Horizontal);
        assert_eq!(run.start, 0);
        assert_eq!(run.len(), 4);
        assert_eq!(board.run(2, 0, Axis::Vertical).len(), 1);
        assert!(board.run(9, 9, Axis::Vertical).is_empty());
    }

    #[test]
    fn test_edge_of_coordinate_range() {
        let edge = tile(Color::Red, Shape::Circle, i32::MAX - 1, 0);
        let mut board = Board::from_tiles(vec![edge]).unwrap();
        let placed = vec![tile(Color::Red, Shape::Square, i32::MAX, 0)];
        assert_eq!(board.validate_move(&placed), Ok(()));
        assert_eq!(board.apply_move(&placed), Ok(2));

        let corner = vec![tile(Color::Blue, Shape::Circle, i32::MIN, i32::MIN)];
        assert_eq!(board.validate_move(&corner), Err(MoveError::NotConnected));
        let below = vec![tile(Color::Red, Shape::Star, i32::MAX, 1)];
        assert_eq!(board.score_move(&below), Ok(2));
    }
}
