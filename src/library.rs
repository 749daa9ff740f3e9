//! Library directories: stable listing and image loading

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader, RgbImage};

use crate::error::{file_system, MosaicError, Result};

/// A directory of candidate images
#[derive(Clone, Debug)]
pub struct Library {
    root: PathBuf,
    key: String,
}

impl Library {
    /// Open a library directory
    ///
    /// # Errors
    ///
    /// Returns `PathNotFound` if `root` is not an existing directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(MosaicError::PathNotFound {
                path: root.to_path_buf(),
            });
        }
        // "." and ".." have no file name until canonicalized
        let canonical = fs::canonicalize(root).map_err(|_| MosaicError::PathNotFound {
            path: root.to_path_buf(),
        })?;
        let key = canonical
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "library".to_string());
        Ok(Self {
            root: root.to_path_buf(),
            key,
        })
    }

    /// Directory the library was opened from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Basename used to key the persisted index
    pub fn key(&self) -> &str {
        &self.key
    }

    /// File names of every decodable image, sorted by name
    ///
    /// The order is the same on every call as long as the directory is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `FileSystem` if the directory cannot be read.
    pub fn names(&self) -> Result<Vec<String>> {
        let mut names = vec![];
        for entry in fs::read_dir(&self.root).map_err(file_system(&self.root, "read directory"))? {
            let entry = entry.map_err(file_system(&self.root, "read directory"))?;
            let path = entry.path();
            if !path.is_file() || ImageFormat::from_path(&path).is_err() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => log::warn!("Skipping non UTF-8 file name {name:?}"),
            }
        }
        names.sort();
        Ok(names)
    }

    /// Path of a library entry
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Decode a library entry as 8-bit RGB
    ///
    /// # Errors
    ///
    /// Returns `MissingLibraryImage` if the file is gone, `ImageLoad` if it
    /// cannot be decoded.
    pub fn load(&self, name: &str) -> Result<RgbImage> {
        let path = self.path_of(name);
        if !path.is_file() {
            return Err(MosaicError::MissingLibraryImage {
                name: name.to_string(),
                path,
            });
        }
        open_rgb(&path)
    }
}

/// Decode any supported image file as 8-bit RGB
///
/// # Errors
///
/// Returns `PathNotFound` if the file cannot be opened, `ImageLoad` if it
/// cannot be decoded.
pub fn open_rgb(path: &Path) -> Result<RgbImage> {
    let reader = ImageReader::open(path).map_err(|_| MosaicError::PathNotFound {
        path: path.to_path_buf(),
    })?;
    let image = reader
        .with_guessed_format()
        .map_err(file_system(path, "detect image format"))?
        .decode()
        .map_err(|source| MosaicError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(image.into_rgb8())
}
