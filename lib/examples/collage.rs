use anyhow::{Context, Result};
use qwirkle_counter::{collage, TurnDetector, Untrained};

fn run() -> Result<()> {
    let path = std::env::args().nth(1).context("Usage: collage PHOTO")?;

    let rgb = image::open(&path)
        .with_context(|| format!("Failed to open {}", path))?
        .into_rgb8();
    eprintln!("read image from {}", path);
    // only the tile crops are needed, so no classifier
    let detector = TurnDetector::new(Untrained);
    let crops: Vec<_> = detector
        .find_candidates(&rgb)
        .iter()
        .map(|candidate| candidate.crop)
        .collect();
    eprintln!("found {} tile candidates", crops.len());

    let sheet = collage(&rgb, &crops, None)?;
    sheet.save("collage.png")?;

    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("{:?}", err);
    }
}
