//! One mosaic run: index, tiles, matches, canvas, export

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::assemble::assemble;
use crate::config::MosaicConfig;
use crate::error::{require_positive, MosaicError, Result};
use crate::export::{resolve_export_path, write_canvas, Preview};
use crate::index::{ColorIndex, IndexStore};
use crate::library::{open_rgb, Library};
use crate::matcher::{match_tiles, LinearScan};
use crate::progress::stage_bar;
use crate::tiles::extract;

/// Summary of a finished run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MosaicReport {
    /// Tile rows
    pub rows: u32,
    /// Tile columns
    pub cols: u32,
    /// Canvas `(width, height)` in pixels
    pub canvas_size: (u32, u32),
    /// Where the canvas was written, if it was exported
    pub exported: Option<PathBuf>,
    /// Wall time of the run
    pub elapsed: Duration,
}

/// Runs every stage for a fixed configuration
#[derive(Clone, Debug)]
pub struct Pipeline {
    config: MosaicConfig,
}

impl Pipeline {
    /// Validate the size parameters of `config`
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if any of the size parameters is zero.
    pub fn new(config: MosaicConfig) -> Result<Self> {
        require_positive("quality", config.tile_size)?;
        require_positive("size", config.render_size)?;
        require_positive("probe_size", config.probe_size)?;
        Ok(Self { config })
    }

    /// The configuration this pipeline runs with
    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    /// Load the library's index, rebuilding it first when a rescan was requested
    ///
    /// # Errors
    ///
    /// Returns `IndexMissing` when no index was saved and no rescan was
    /// requested, and `IndexMismatch` when the saved index no longer matches
    /// the directory.
    pub fn prepare_index(&self, library: &Library) -> Result<ColorIndex> {
        let store = IndexStore::new(&self.config.index_dir);
        let index = if self.config.rescan {
            log::info!("[1/5] Scanning library '{}'.", library.key());
            let bar = stage_bar(self.config.show_progress, "scanning");
            let index = ColorIndex::build(library, self.config.probe_size, &bar)?;
            let path = store.save(&index)?;
            log::info!("[1/5] Saved {} colors to '{}'.", index.len(), path.display());
            index
        } else {
            log::info!("[1/5] Loading color index for '{}'.", library.key());
            store.load(library)?
        };
        index.validate(library.key(), &library.names()?)?;
        Ok(index)
    }

    /// Run the whole pipeline, handing the canvas to `preview` when the
    /// configured choice asks for it
    ///
    /// # Errors
    ///
    /// Any stage error aborts the run; nothing is written on failure.
    pub fn run(&self, preview: &dyn Preview) -> Result<MosaicReport> {
        let start = Instant::now();
        let config = &self.config;

        if !config.target.is_file() {
            return Err(MosaicError::PathNotFound {
                path: config.target.clone(),
            });
        }
        let library = Library::open(&config.library)?;
        // Settle the export target before any stage runs
        let export_path = if config.choice.exports() {
            Some(resolve_export_path(&config.export_dir, &config.file_name, config.collision)?)
        } else {
            None
        };
        let index = self.prepare_index(&library)?;

        log::info!("[2/5] Splitting '{}' into tiles.", config.target.display());
        let target = open_rgb(&config.target)?;
        let grid = extract(&target, config.tile_size)?;
        log::info!("[2/5] {} rows x {} columns.", grid.rows, grid.cols);

        log::info!("[3/5] Matching tiles with comparison '{}'.", config.comparison);
        let search = LinearScan::new(&index, config.comparison)?;
        let bar = stage_bar(config.show_progress, "matching");
        let matches = match_tiles(&grid.colors, &index, &search, &bar)?;

        log::info!("[4/5] Rendering the mosaic.");
        let bar = stage_bar(config.show_progress, "rendering");
        let canvas = assemble(
            &matches,
            &library,
            grid.rows,
            grid.cols,
            config.render_size,
            &bar,
        )?;
        log::info!("[4/5] Canvas is {}x{}.", canvas.width(), canvas.height());

        if let Some(path) = &export_path {
            write_canvas(&canvas, path)?;
            log::info!("[5/5] Exported to '{}'.", path.display());
        }
        if config.choice.shows() {
            log::info!("[5/5] Opening preview.");
            preview.show(&canvas)?;
        }

        Ok(MosaicReport {
            rows: grid.rows,
            cols: grid.cols,
            canvas_size: canvas.dimensions(),
            exported: export_path,
            elapsed: start.elapsed(),
        })
    }
}
