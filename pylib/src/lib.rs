use pyo3::{
    create_exception, exceptions::PyException, prelude::*, types::PyDict, wrap_pyfunction, PyErr,
};
use qwirkle_counter::{Board, GridTile, MoveError, TileSet};

create_exception!(pyqwirkle_counter, QwirkleException, PyException);

/// A tile as passed from Python: (color, shape, x, y)
type PyTile = (String, String, i32, i32);

fn tile_set(name: Option<&str>) -> PyResult<TileSet> {
    match name.unwrap_or("classic") {
        "classic" => Ok(TileSet::classic()),
        "printed" => Ok(TileSet::printed()),
        other => Err(PyErr::new::<QwirkleException, String>(format!(
            "Unknown tile set {:?}",
            other
        ))),
    }
}

fn to_grid_tiles(tiles: &[PyTile], set: &TileSet) -> Result<Vec<GridTile>, QwirkleError> {
    tiles
        .iter()
        .map(|(color, shape, x, y)| -> Result<GridTile, QwirkleError> {
            Ok(GridTile::new(
                set.parse_color(color)?,
                set.parse_shape(shape)?,
                *x,
                *y,
            ))
        })
        .collect()
}

fn prepare(
    board: Vec<PyTile>,
    tiles: Vec<PyTile>,
    set: Option<&str>,
) -> PyResult<(Board, Vec<GridTile>)> {
    let set = tile_set(set)?;
    let board = Board::from_tiles(to_grid_tiles(&board, &set)?).map_err(QwirkleError::from)?;
    let tiles = to_grid_tiles(&tiles, &set)?;
    Ok((board, tiles))
}

/// Raise QwirkleException with the reason if the move is not allowed.
#[pyfunction]
fn validate_move(board: Vec<PyTile>, tiles: Vec<PyTile>, tile_set: Option<&str>) -> PyResult<()> {
    let (board, tiles) = prepare(board, tiles, tile_set)?;
    board.validate_move(&tiles).map_err(QwirkleError::from)?;
    Ok(())
}

/// The score of a move, raising QwirkleException if the move is not allowed.
#[pyfunction]
fn calculate_move_score(
    board: Vec<PyTile>,
    tiles: Vec<PyTile>,
    tile_set: Option<&str>,
) -> PyResult<u32> {
    let (board, tiles) = prepare(board, tiles, tile_set)?;
    let score = board.score_move(&tiles).map_err(QwirkleError::from)?;
    Ok(score)
}

/// A dict with "valid", "score" and "error" (the rejection reason, or None).
#[pyfunction]
fn score_move(
    board: Vec<PyTile>,
    tiles: Vec<PyTile>,
    tile_set: Option<&str>,
    py: Python,
) -> PyResult<PyObject> {
    let (board, tiles) = prepare(board, tiles, tile_set)?;
    let dict = PyDict::new(py);
    match board.score_move(&tiles) {
        Ok(score) => {
            dict.set_item("valid", true)?;
            dict.set_item("score", score)?;
            dict.set_item("error", py.None())?;
        }
        Err(err) => {
            dict.set_item("valid", false)?;
            dict.set_item("score", 0)?;
            dict.set_item("error", err.to_string())?;
        }
    }
    Ok(dict.into())
}

/// Wrapper around the library errors so we convert to PyErr
struct QwirkleError(String);

impl From<qwirkle_counter::Error> for QwirkleError {
    fn from(err: qwirkle_counter::Error) -> QwirkleError {
        QwirkleError(err.to_string())
    }
}

impl From<MoveError> for QwirkleError {
    fn from(err: MoveError) -> QwirkleError {
        QwirkleError(err.to_string())
    }
}

impl From<QwirkleError> for PyErr {
    fn from(err: QwirkleError) -> PyErr {
        PyErr::new::<QwirkleException, String>(err.0)
    }
}

#[pymodule]
fn pyqwirkle_counter(py: Python, m: &PyModule) -> PyResult<()> {
    m.add("QwirkleException", py.get_type::<QwirkleException>())?;
    m.add_function(wrap_pyfunction!(validate_move, m)?)?;
    m.add_function(wrap_pyfunction!(calculate_move_score, m)?)?;
    m.add_function(wrap_pyfunction!(score_move, m)?)?;
    Ok(())
}
