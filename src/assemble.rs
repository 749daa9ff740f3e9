//! Compositing matched library images into the mosaic canvas

use std::collections::HashMap;

use image::imageops::{replace, resize};
use image::RgbImage;
use indicatif::ProgressBar;
use itertools::Itertools;
use rayon::prelude::*;

use crate::config::RENDER_FILTER;
use crate::error::{invalid_parameter, require_positive, MosaicError, Result};
use crate::library::Library;

/// Concatenate images left to right; heights must match the first image
pub fn hstack(images: &[&RgbImage]) -> RgbImage {
    let height = images.first().map_or(0, |image| image.height());
    let width = images.iter().map(|image| image.width()).sum();
    let mut out = RgbImage::new(width, height);
    let mut x = 0i64;
    for image in images {
        replace(&mut out, *image, x, 0);
        x += i64::from(image.width());
    }
    out
}

/// Append `below` under `canvas`; widths must match
pub fn vstack(canvas: RgbImage, below: &RgbImage) -> RgbImage {
    let mut out = RgbImage::new(canvas.width(), canvas.height() + below.height());
    replace(&mut out, &canvas, 0, 0);
    replace(&mut out, below, 0, i64::from(canvas.height()));
    out
}

/// Build the `(cols * render_size) x (rows * render_size)` mosaic
///
/// `matches` holds one library identifier per tile in row-major order. Each
/// distinct identifier is loaded and scaled once.
///
/// # Errors
///
/// Returns `InvalidParameter` if `matches` does not hold `rows * cols`
/// entries or `render_size` is zero, and `MissingLibraryImage` if a matched
/// file has disappeared.
pub fn assemble(
    matches: &[&str],
    library: &Library,
    rows: u32,
    cols: u32,
    render_size: u32,
    progress: &ProgressBar,
) -> Result<RgbImage> {
    let render_size = require_positive("render_size", render_size)?;
    let expected = rows as usize * cols as usize;
    if expected == 0 || matches.len() != expected {
        return Err(invalid_parameter(
            "matches",
            &matches.len(),
            &format!("expected {rows}x{cols} = {expected} tiles"),
        ));
    }
    cols.checked_mul(render_size)
        .zip(rows.checked_mul(render_size))
        .ok_or_else(|| invalid_parameter("render_size", &render_size, &"canvas is too large"))?;

    let distinct = matches.iter().copied().unique().collect_vec();
    progress.set_length(distinct.len() as u64);
    let rendered = distinct
        .into_par_iter()
        .map(|name| {
            let image = library.load(name)?;
            progress.inc(1);
            Ok::<_, MosaicError>((name, resize(&image, render_size, render_size, RENDER_FILTER)))
        })
        .collect::<Result<HashMap<_, _>>>()
        .inspect_err(|_| progress.finish_and_clear())?;
    progress.finish_and_clear();
    log::debug!("Rendered {} distinct library images", rendered.len());

    let mut canvas: Option<RgbImage> = None;
    for row in &matches.iter().chunks(cols as usize) {
        let tiles = row.filter_map(|name| rendered.get(name)).collect_vec();
        let strip = hstack(&tiles);
        canvas = Some(match canvas {
            None => strip,
            Some(above) => vstack(above, &strip),
        });
    }
    Ok(canvas.unwrap_or_default())
}
