use crate::Error;
use image::imageops::{resize, FilterType};
use image::math::Rect;
use image::{GenericImage, GenericImageView, ImageBuffer, RgbImage, SubImage};

/// Create a contact sheet from parts of a source image, e.g. the crops of all tile candidates.
///
/// Every cell gets the size of the first part; parts of another size are resized to fit.
/// Parts are laid out row by row in a roughly square grid, with at most `maxrows` rows.
pub fn collage(source: &RgbImage, parts: &[Rect], maxrows: Option<u32>) -> Result<RgbImage, Error> {
    if parts.is_empty() {
        return Ok(RgbImage::new(0, 0));
    }
    let nimages = parts.len();
    let mut nrows = (nimages as f64).sqrt().floor() as u32;
    if let Some(maxrows) = maxrows {
        nrows = std::cmp::min(nrows, maxrows);
    }
    let nrows = nrows.max(1);
    let ncols = (nimages as f64 / nrows as f64).ceil() as u32;
    let (w, h) = (parts[0].width, parts[0].height);
    let mut collage: RgbImage = ImageBuffer::new(w * ncols, h * nrows);
    for (i, &cell) in parts.iter().enumerate() {
        let (row, col) = ((i as u32 / ncols), (i as u32 % ncols));
        let mut dest: SubImage<&mut RgbImage> = collage.sub_image(col * w, row * h, w, h);

        let src: SubImage<&RgbImage> = source.view(cell.x, cell.y, cell.width, cell.height);
        if cell.width != w || cell.height != h {
            let resized = resize(&src, w, h, FilterType::Lanczos3);
            dest.copy_from(&resized, 0, 0)?;
        } else {
            dest.copy_from(&src, 0, 0)?;
        }
    }
    Ok(collage)
}
