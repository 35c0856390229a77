use anyhow::Result;
use qwirkle_counter::{Board, GridTile, TileSet};

fn tiles(set: &TileSet, specs: &[(&str, &str, i32, i32)]) -> Result<Vec<GridTile>> {
    specs
        .iter()
        .map(|&(color, shape, x, y)| -> Result<GridTile> {
            Ok(GridTile::new(set.parse_color(color)?, set.parse_shape(shape)?, x, y))
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let set = TileSet::classic();
    let mut board = Board::new();

    let first = tiles(&set, &[("red", "circle", 0, 0), ("red", "square", 1, 0), ("red", "diamond", 2, 0)])?;
    println!("first move scores {}", board.apply_move(&first)?);

    let second = tiles(&set, &[("blue", "circle", 0, 1), ("green", "circle", 0, 2)])?;
    println!("second move scores {}", board.apply_move(&second)?);

    let bad = tiles(&set, &[("blue", "star", 1, 1)])?;
    match board.apply_move(&bad) {
        Ok(score) => println!("third move scores {}", score),
        Err(err) => println!("third move rejected: {}", err),
    }
    println!("{} tiles on the board", board.len());
    Ok(())
}
