//! Defaults and the immutable run configuration

use std::path::PathBuf;

use clap::{builder::PossibleValue, ValueEnum};
use image::imageops::FilterType;

use crate::color::Comparison;
use crate::export::CollisionPolicy;

/// Tile edge length in target-image pixels
pub const DEFAULT_QUALITY: u32 = 8;
/// Edge length each library image is rendered at in the canvas
pub const DEFAULT_RENDER_SIZE: u32 = 16;
/// Edge length library images are shrunk to before averaging
pub const DEFAULT_PROBE_SIZE: u32 = 32;

/// Extension appended to the library basename for its index file
pub const INDEX_EXTENSION: &str = "colors.json";
/// Prefix of auto-generated export names
pub const RESULT_PREFIX: &str = "result_";
/// Extension every exported mosaic carries
pub const EXPORT_EXTENSION: &str = "jpg";

// Probing only needs a stable average, rendering needs sharp thumbnails
/// Filter used when shrinking library images for averaging and fitting the target
pub const PROBE_FILTER: FilterType = FilterType::Triangle;
/// Filter used when scaling library images into canvas cells
pub const RENDER_FILTER: FilterType = FilterType::Lanczos3;

/// What to do with the finished canvas
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Choice {
    /// Only hand the canvas to the preview
    ShowOnly,
    /// Only write the canvas to disk
    ExportOnly,
    /// Write to disk, then preview
    #[default]
    Both,
}

impl Choice {
    /// Whether the canvas is written to the export directory
    pub const fn exports(self) -> bool {
        matches!(self, Self::ExportOnly | Self::Both)
    }

    /// Whether the canvas is handed to the preview
    pub const fn shows(self) -> bool {
        matches!(self, Self::ShowOnly | Self::Both)
    }
}

impl ValueEnum for Choice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Choice::ShowOnly, Choice::ExportOnly, Choice::Both]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(match self {
            Choice::ShowOnly => PossibleValue::new("show").help("Only preview the mosaic."),
            Choice::ExportOnly => PossibleValue::new("export").help("Only write the mosaic to disk."),
            Choice::Both => PossibleValue::new("both").help("Write the mosaic, then preview it."),
        })
    }
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_possible_value()
            .expect("no values are skipped")
            .get_name()
            .fmt(f)
    }
}

/// Everything one mosaic run needs, fixed before the pipeline starts
#[derive(Clone, Debug)]
pub struct MosaicConfig {
    /// Directory of candidate images
    pub library: PathBuf,
    /// Image to reproduce
    pub target: PathBuf,
    /// Tile edge length in target pixels (`quality`)
    pub tile_size: u32,
    /// Edge length of each library image in the canvas
    pub render_size: u32,
    /// Edge length used when averaging library images during a scan
    pub probe_size: u32,
    /// Distance comparison used by the matcher
    pub comparison: Comparison,
    /// Export, preview, or both
    pub choice: Choice,
    /// Directory the mosaic is written into
    pub export_dir: PathBuf,
    /// Explicit export name; empty means auto-generate
    pub file_name: String,
    /// How an existing export target is handled
    pub collision: CollisionPolicy,
    /// Rebuild the color index before matching
    pub rescan: bool,
    /// Directory holding index files
    pub index_dir: PathBuf,
    /// Draw progress bars
    pub show_progress: bool,
}

impl MosaicConfig {
    /// Configuration with defaults for everything but the two inputs
    pub fn new(library: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            library: library.into(),
            target: target.into(),
            tile_size: DEFAULT_QUALITY,
            render_size: DEFAULT_RENDER_SIZE,
            probe_size: DEFAULT_PROBE_SIZE,
            comparison: Comparison::default(),
            choice: Choice::default(),
            export_dir: PathBuf::from("."),
            file_name: String::new(),
            collision: CollisionPolicy::default(),
            rescan: false,
            index_dir: PathBuf::from("."),
            show_progress: false,
        }
    }
}
