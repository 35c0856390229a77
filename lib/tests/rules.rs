use anyhow::Result;
use qwirkle_counter::{
    calculate_move_score, validate_move, Axis, Board, Color, GridTile, MoveError, Shape, TileSet,
};

fn red(shape: Shape, x: i32, y: i32) -> GridTile {
    GridTile::new(Color::Red, shape, x, y)
}

fn red_line() -> Vec<GridTile> {
    vec![
        red(Shape::Circle, 0, 0),
        red(Shape::Square, 1, 0),
        red(Shape::Diamond, 2, 0),
    ]
}

#[test]
fn test_first_line_scores_three() {
    let board = Board::new();
    assert_eq!(validate_move(&board, &red_line()), Ok(()));
    assert_eq!(calculate_move_score(&board, &red_line()), Ok(3));
}

#[test]
fn test_completing_a_line_scores_bonus() -> Result<()> {
    let mut board = Board::new();
    board.apply_move(&red_line())?;
    board.apply_move(&[red(Shape::Star, 3, 0), red(Shape::Clover, 4, 0)])?;
    assert_eq!(board.apply_move(&[red(Shape::Cross, 5, 0)])?, 12);
    Ok(())
}

#[test]
fn test_rejections() -> Result<()> {
    let board = Board::from_tiles(red_line())?;
    assert_eq!(
        calculate_move_score(&board, &[red(Shape::Star, 1, 0)]),
        Err(MoveError::PositionOccupied { x: 1, y: 0 })
    );
    assert_eq!(
        calculate_move_score(&board, &[GridTile::new(Color::Blue, Shape::Star, 3, 0)]),
        Err(MoveError::InvalidLine {
            axis: Axis::Horizontal
        })
    );
    assert_eq!(
        calculate_move_score(&board, &[red(Shape::Star, 5, 5)]),
        Err(MoveError::NotConnected)
    );
    assert_eq!(calculate_move_score(&board, &[]), Err(MoveError::NoTiles));
    assert_eq!(
        calculate_move_score(&board, &[red(Shape::Star, 3, 0), red(Shape::Cross, 0, 1)]),
        Err(MoveError::NotALine)
    );
    Ok(())
}

#[test]
fn test_rejected_move_leaves_board_untouched() -> Result<()> {
    let mut board = Board::from_tiles(red_line())?;
    let before = board.clone();
    let err = board.apply_move(&[GridTile::new(Color::Blue, Shape::Star, 3, 0)]);
    assert!(err.is_err());
    assert_eq!(board, before);
    Ok(())
}

#[test]
fn test_labels_from_tile_set() -> Result<()> {
    let set = TileSet::printed();
    let color = set.parse_color("Silver")?;
    let shape = set.parse_shape("clover")?;
    let board = Board::new();
    assert_eq!(
        calculate_move_score(&board, &[GridTile::new(color, shape, 0, 0)]),
        Ok(1)
    );
    assert!(set.parse_color("red").is_err());
    Ok(())
}
