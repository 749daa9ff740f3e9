//! Target image partitioning into a uniform tile grid

use image::imageops::resize;
use image::RgbImage;
use itertools::{iproduct, Itertools};
use rayon::prelude::*;

use crate::color::{average_block, AverageColor};
use crate::config::PROBE_FILTER;
use crate::error::{MosaicError, Result};

/// Largest `(width, height)` not exceeding the input that `tile_size` divides evenly
pub const fn crop_dimensions(width: u32, height: u32, tile_size: u32) -> (u32, u32) {
    if tile_size == 0 {
        return (0, 0);
    }
    (
        width / tile_size * tile_size,
        height / tile_size * tile_size,
    )
}

/// Average colors of every tile of a target image, row-major
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    /// Number of tile rows
    pub rows: u32,
    /// Number of tile columns
    pub cols: u32,
    /// Tile edge length in target pixels
    pub tile_size: u32,
    /// `rows * cols` colors; tile `(row, col)` is at `row * cols + col`
    pub colors: Vec<AverageColor>,
}

impl TileGrid {
    /// Color of tile `(row, col)`
    pub fn get(&self, row: u32, col: u32) -> Option<AverageColor> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.colors.get((row * self.cols + col) as usize).copied()
    }

    /// Number of tiles
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the grid has no tiles
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Split `image` into `tile_size` squares and average each one
///
/// The image is first resized (not cropped) to [`crop_dimensions`], which
/// stretches content slightly when a dimension is not a multiple of
/// `tile_size`.
///
/// # Errors
///
/// Returns `InvalidTileSize` if `tile_size` is zero or larger than either
/// image dimension.
pub fn extract(image: &RgbImage, tile_size: u32) -> Result<TileGrid> {
    let (width, height) = crop_dimensions(image.width(), image.height(), tile_size);
    if width == 0 || height == 0 {
        return Err(MosaicError::InvalidTileSize {
            tile_size,
            width: image.width(),
            height: image.height(),
        });
    }

    let fitted;
    let image = if image.dimensions() == (width, height) {
        image
    } else {
        log::debug!(
            "Fitting target from {}x{} to {width}x{height}",
            image.width(),
            image.height()
        );
        fitted = resize(image, width, height, PROBE_FILTER);
        &fitted
    };

    let rows = height / tile_size;
    let cols = width / tile_size;
    let colors = iproduct!(0..rows, 0..cols)
        .collect_vec()
        .into_par_iter()
        .map(|(row, col)| average_block(image, col * tile_size, row * tile_size, tile_size, tile_size))
        .collect();

    Ok(TileGrid {
        rows,
        cols,
        tile_size,
        colors,
    })
}
