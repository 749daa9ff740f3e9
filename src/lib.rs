//! Photomosaic generation: a target image rebuilt from a library of small images
//!
//! The library's average colors are computed once and persisted, the target is
//! split into a uniform tile grid, every tile is matched to the library image
//! with the closest average color, and the matches are composited into one
//! canvas.

#![forbid(unsafe_code)]

/// Compositing matched images into the canvas
pub mod assemble;
/// Average colors and the matching distance
pub mod color;
/// Defaults and run configuration
pub mod config;
/// Error type shared by every stage
pub mod error;
/// Export naming, collision handling and preview
pub mod export;
/// Persisted average-color index
pub mod index;
/// Library directory listing and loading
pub mod library;
/// Nearest-color search
pub mod matcher;
/// Stage orchestration
pub mod pipeline;
/// Progress bar construction
pub mod progress;
/// Target image tiling
pub mod tiles;

pub use config::{Choice, MosaicConfig};
pub use error::{MosaicError, Result};
pub use pipeline::{MosaicReport, Pipeline};
