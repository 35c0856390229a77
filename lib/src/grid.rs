use crate::board::GridTile;
use crate::classify::ClassifiedTile;
use log::debug;
use std::cmp::Ordering;

/// Tile spacing in pixels when it can not be estimated from the photo
pub const DEFAULT_SPACING: f32 = 100.;

/// Estimate the pixel distance between neighboring board cells.
///
/// Uses the median of every tile's nearest-neighbor distance. Falls back to
/// [DEFAULT_SPACING] with fewer than two tiles.
pub fn estimate_spacing(positions: &[(f32, f32)]) -> f32 {
    let mut nearest: Vec<f32> = positions
        .iter()
        .enumerate()
        .filter_map(|(i, &(x, y))| {
            positions
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, &(ox, oy))| ((ox - x).powi(2) + (oy - y).powi(2)).sqrt())
                .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        })
        .filter(|&d| d > 0.)
        .collect();
    if nearest.is_empty() {
        return DEFAULT_SPACING;
    }
    nearest.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    nearest[nearest.len() / 2]
}

/// Map tiles of one photo onto integer board cells.
///
/// Cells count from the top-left tile, in units of the estimated spacing. Tiles with
/// an unknown color or shape take part in the spacing estimate but get no cell. Returns the index
/// of each mapped tile with its [GridTile]. Two tiles may round to the same cell, the
/// rule engine rejects such a placement.
pub fn infer_grid_positions(tiles: &[ClassifiedTile]) -> Vec<(usize, GridTile)> {
    if tiles.is_empty() {
        return Vec::new();
    }
    let positions: Vec<(f32, f32)> = tiles.iter().map(|t| t.position).collect();
    let spacing = estimate_spacing(&positions);
    let origin_x = positions.iter().map(|p| p.0).fold(f32::INFINITY, f32::min);
    let origin_y = positions.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
    debug!(
        "grid spacing {:.1} px, origin ({:.1}, {:.1})",
        spacing, origin_x, origin_y
    );

    tiles
        .iter()
        .enumerate()
        .filter_map(|(index, tile)| {
            let (color, shape) = (tile.color()?, tile.shape()?);
            let (x, y) = tile.position;
            let gx = ((x - origin_x) / spacing).round() as i32;
            let gy = ((y - origin_y) / spacing).round() as i32;
            Some((index, GridTile::new(color, shape, gx, gy)))
        })
        .collect()
}
