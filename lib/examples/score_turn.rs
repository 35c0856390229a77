use anyhow::{Context, Result};
use image::RgbImage;
use qwirkle_counter::{
    calculate_move_score, Classification, ClassifierError, Color, Shape, TurnDetector, TurnStatus,
};

/// Reference colors of the classic tile set, in `Color` order.
const PALETTE: [(Color, [f32; 3]); 6] = [
    (Color::Red, [200., 40., 40.]),
    (Color::Orange, [230., 130., 30.]),
    (Color::Yellow, [230., 210., 40.]),
    (Color::Green, [50., 160., 70.]),
    (Color::Blue, [40., 90., 200.]),
    (Color::Purple, [130., 60., 160.]),
];

/// Stand-in for a trained model: nearest palette color of the mean crop color.
/// It has no idea about shapes.
fn mean_color(tile: &RgbImage) -> Result<Classification, ClassifierError> {
    let n = (tile.width() * tile.height()) as f32;
    if n == 0. {
        return Err(ClassifierError::Failed("empty crop".to_string()));
    }
    let mut sum = [0f32; 3];
    for p in tile.pixels() {
        for c in 0..3 {
            sum[c] += p[c] as f32;
        }
    }
    let mean = [sum[0] / n, sum[1] / n, sum[2] / n];
    let distance = |rgb: &[f32; 3]| {
        rgb.iter()
            .zip(&mean)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt()
    };
    let (color, best) = PALETTE
        .iter()
        .map(|(color, rgb)| (*color, distance(rgb)))
        .fold((Color::Red, f32::MAX), |acc, x| if x.1 < acc.1 { x } else { acc });
    let confidence = (1. - best / 255.).max(0.);
    Ok(Classification::known(color, Shape::Circle, confidence, 0.))
}

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let current = args
        .next()
        .context("Usage: score_turn CURRENT [PREVIOUS]")?;
    let previous = args.next();

    let detector = TurnDetector::new(mean_color);
    let report = detector
        .score_turn_from_files(previous.as_deref(), current.as_str())
        .with_context(|| format!("Failed to score {}", current))?;

    match report.status {
        TurnStatus::NoTilesDetected => println!("No tiles detected"),
        TurnStatus::NoNewTiles => println!("No new tiles"),
        TurnStatus::Scored => {
            let set = detector.tile_set();
            for tile in &report.new_tiles {
                let label = match tile.classification {
                    Classification::Known { color, .. } => set.color_label(color).to_string(),
                    Classification::Unknown => "unknown".to_string(),
                };
                println!(
                    "new tile {} at ({:.0}, {:.0}): {}",
                    tile.id, tile.position.0, tile.position.1, label
                );
            }
            println!("Estimated score: {}", report.score.total);
            let (board, placed) = report.grid_move()?;
            match calculate_move_score(&board, &placed) {
                Ok(score) => println!("Score on inferred grid: {}", score),
                Err(err) => println!("Inferred grid placement rejected: {}", err),
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("{:?}", err);
    }
}
