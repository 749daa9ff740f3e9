//! Persisted average-color index of a library

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::resize;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::color::{average_image, AverageColor};
use crate::config::{INDEX_EXTENSION, PROBE_FILTER};
use crate::error::{file_system, require_positive, MosaicError, Result};
use crate::library::Library;

/// One library image and its average color
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// File name inside the library directory
    pub name: String,
    /// Average color at the shrunk scanning resolution
    pub color: AverageColor,
}

/// Average colors of every image in a library, in listing order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorIndex {
    /// Library key (directory basename)
    pub library: String,
    /// Edge length images were shrunk to before averaging
    pub probe_size: u32,
    /// Entries in the library's sorted listing order
    pub entries: Vec<IndexEntry>,
}

impl ColorIndex {
    /// Compute the average color of every image in `library`
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a zero scanning size, or the first load
    /// error encountered while reading the library.
    pub fn build(library: &Library, probe_size: u32, progress: &ProgressBar) -> Result<Self> {
        let probe_size = require_positive("probe_size", probe_size)?;
        let names = library.names()?;
        progress.set_length(names.len() as u64);
        let entries = names
            .into_par_iter()
            .map(|name| -> Result<IndexEntry> {
                let image = library.load(&name)?;
                let shrunk = resize(&image, probe_size, probe_size, PROBE_FILTER);
                progress.inc(1);
                Ok(IndexEntry {
                    color: average_image(&shrunk),
                    name,
                })
            })
            .collect::<Result<Vec<_>>>()
            .inspect_err(|_| progress.finish_and_clear())?;
        progress.finish_and_clear();
        log::debug!(
            "Averaged {} images of library '{}' at {probe_size}x{probe_size}",
            entries.len(),
            library.key()
        );
        Ok(Self {
            library: library.key().to_string(),
            probe_size,
            entries,
        })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifier stored at `position`
    pub fn name(&self, position: usize) -> Option<&str> {
        self.entries.get(position).map(|entry| entry.name.as_str())
    }

    /// Check the index against the library's current listing
    ///
    /// # Errors
    ///
    /// Returns `IndexMismatch` if the index was built for another library key,
    /// is empty, its entry count differs from the listing, or it names a file
    /// the listing no longer contains.
    pub fn validate(&self, key: &str, live_names: &[String]) -> Result<()> {
        let mismatch = |reason: String| MosaicError::IndexMismatch {
            library: key.to_string(),
            reason,
        };
        if self.library != key {
            return Err(mismatch(format!("index was built for library '{}'", self.library)));
        }
        if self.is_empty() {
            return Err(mismatch("index has no entries".to_string()));
        }
        if self.len() != live_names.len() {
            return Err(mismatch(format!(
                "index has {} entries but the directory holds {} images",
                self.len(),
                live_names.len()
            )));
        }
        let live: HashSet<&str> = live_names.iter().map(String::as_str).collect();
        if let Some(stale) = self
            .entries
            .iter()
            .find(|entry| !live.contains(entry.name.as_str()))
        {
            return Err(mismatch(format!("'{}' is no longer in the library", stale.name)));
        }
        Ok(())
    }
}

/// Directory where color indexes are persisted, one file per library key
#[derive(Clone, Debug)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    /// Store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding the index for a library key
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{INDEX_EXTENSION}"))
    }

    /// Write (or overwrite) the index file for `index.library`
    ///
    /// # Errors
    ///
    /// Returns `FileSystem` if the directory or file cannot be written,
    /// `IndexFormat` if serialization fails.
    pub fn save(&self, index: &ColorIndex) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(file_system(&self.dir, "create directory"))?;
        let path = self.path_for(&index.library);
        let json = serde_json::to_string(index).map_err(|source| MosaicError::IndexFormat {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(file_system(&path, "write index"))?;
        log::debug!("Saved {} entries to '{}'", index.len(), path.display());
        Ok(path)
    }

    /// Load the index previously saved for `library`
    ///
    /// # Errors
    ///
    /// Returns `IndexMissing` if nothing was saved for the library key,
    /// `IndexFormat` if the file cannot be parsed.
    pub fn load(&self, library: &Library) -> Result<ColorIndex> {
        let path = self.path_for(library.key());
        if !path.is_file() {
            return Err(MosaicError::IndexMissing {
                library: library.key().to_string(),
                path,
            });
        }
        read_index(&path)
    }
}

fn read_index(path: &Path) -> Result<ColorIndex> {
    let json = fs::read_to_string(path).map_err(file_system(path, "read index"))?;
    serde_json::from_str(&json).map_err(|source| MosaicError::IndexFormat {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn entry(name: &str, rgb: [u8; 3]) -> IndexEntry {
        IndexEntry {
            name: name.to_string(),
            color: AverageColor(rgb),
        }
    }

    fn index(entries: Vec<IndexEntry>) -> ColorIndex {
        ColorIndex {
            library: "memes".to_string(),
            probe_size: 4,
            entries,
        }
    }

    #[test]
    fn test_build_averages_in_listing_order() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(8, 6, Rgb([255, 0, 0]))
            .save(dir.path().join("red.png"))
            .unwrap();
        RgbImage::from_pixel(3, 9, Rgb([0, 0, 255]))
            .save(dir.path().join("blue.png"))
            .unwrap();

        let library = Library::open(dir.path()).unwrap();
        let built = ColorIndex::build(&library, 4, &ProgressBar::hidden()).unwrap();
        assert_eq!(
            built.entries,
            vec![entry("blue.png", [0, 0, 255]), entry("red.png", [255, 0, 0])]
        );
        assert_eq!(built.probe_size, 4);
    }

    #[test]
    fn test_build_rejects_zero_scan_size() {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::open(dir.path()).unwrap();
        let result = ColorIndex::build(&library, 0, &ProgressBar::hidden());
        assert!(matches!(result, Err(MosaicError::InvalidParameter { .. })));
    }

    #[test]
    fn test_load_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::open(dir.path()).unwrap();
        let store = IndexStore::new(dir.path().join("indexes"));
        assert!(matches!(
            store.load(&library),
            Err(MosaicError::IndexMissing { .. })
        ));
    }

    #[test]
    fn test_load_malformed_index() {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::open(dir.path()).unwrap();
        let store = IndexStore::new(dir.path());
        fs::write(store.path_for(library.key()), "[[1, 2, 3]]").unwrap();
        assert!(matches!(
            store.load(&library),
            Err(MosaicError::IndexFormat { .. })
        ));
    }

    #[test]
    fn test_validate_count_mismatch() {
        let idx = index(vec![entry("a.png", [0, 0, 0]), entry("b.png", [1, 1, 1])]);
        let live = vec!["a.png".to_string(), "b.png".to_string(), "c.png".to_string()];
        assert!(matches!(
            idx.validate("memes", &live),
            Err(MosaicError::IndexMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_renamed_file() {
        let idx = index(vec![entry("a.png", [0, 0, 0]), entry("b.png", [1, 1, 1])]);
        let live = vec!["a.png".to_string(), "z.png".to_string()];
        match idx.validate("memes", &live) {
            Err(MosaicError::IndexMismatch { reason, .. }) => assert!(reason.contains("b.png")),
            _ => unreachable!("Expected IndexMismatch error type"),
        }
    }

    #[test]
    fn test_validate_empty_index() {
        let idx = index(vec![]);
        assert!(matches!(
            idx.validate("memes", &[]),
            Err(MosaicError::IndexMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_other_library_key() {
        let idx = index(vec![entry("a.png", [0, 0, 0])]);
        let live = vec!["a.png".to_string()];
        match idx.validate("cats", &live) {
            Err(MosaicError::IndexMismatch { library, reason }) => {
                assert_eq!(library, "cats");
                assert!(reason.contains("memes"));
            }
            _ => unreachable!("Expected IndexMismatch error type"),
        }
    }

    #[test]
    fn test_build_failure_clears_progress() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.png"), "not a png").unwrap();
        let library = Library::open(dir.path()).unwrap();
        let bar = ProgressBar::hidden();
        let result = ColorIndex::build(&library, 4, &bar);
        assert!(matches!(result, Err(MosaicError::ImageLoad { .. })));
        assert!(bar.is_finished());
    }

    #[test]
    fn test_validate_accepts_current_listing() {
        let idx = index(vec![entry("a.png", [0, 0, 0]), entry("b.png", [1, 1, 1])]);
        let live = vec!["a.png".to_string(), "b.png".to_string()];
        assert!(idx.validate("memes", &live).is_ok());
    }
}
