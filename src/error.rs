//! Error types for the mosaic pipeline

use std::fmt;
use std::path::PathBuf;

/// Every failure the core pipeline can report
///
/// All variants are terminal for the current run. Interactive recovery (asking
/// for another export name, rebuilding a missing index) belongs to the caller.
#[derive(Debug)]
pub enum MosaicError {
    /// Library directory or target image does not exist or is unreadable
    PathNotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// Tile edge length is zero or exceeds a target image dimension
    InvalidTileSize {
        /// Requested tile edge length
        tile_size: u32,
        /// Target image width
        width: u32,
        /// Target image height
        height: u32,
    },

    /// A size or count argument failed validation
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// No persisted index exists for the library
    IndexMissing {
        /// Library key (directory basename)
        library: String,
        /// Where the index file was expected
        path: PathBuf,
    },

    /// Persisted index is empty or out of sync with the library directory
    IndexMismatch {
        /// Library key (directory basename)
        library: String,
        /// What disagreed
        reason: String,
    },

    /// Persisted index exists but could not be parsed or written
    IndexFormat {
        /// Index file path
        path: PathBuf,
        /// Underlying serialization error
        source: serde_json::Error,
    },

    /// A matched library image vanished before assembly
    MissingLibraryImage {
        /// Identifier stored in the index
        name: String,
        /// Resolved file path
        path: PathBuf,
    },

    /// Export target exists and the collision policy forbids replacing it
    ExportCollision {
        /// Conflicting path
        path: PathBuf,
    },

    /// Failed to decode an image
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image error
        source: image::ImageError,
    },

    /// Failed to encode or write the mosaic
    ImageExport {
        /// Destination path
        path: PathBuf,
        /// Underlying image error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The preview collaborator could not display the canvas
    Preview {
        /// Description of the failure
        reason: String,
    },
}

impl fmt::Display for MosaicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PathNotFound { path } => {
                write!(f, "Path '{}' does not exist or is unreadable", path.display())
            }
            Self::InvalidTileSize {
                tile_size,
                width,
                height,
            } => {
                write!(
                    f,
                    "Tile size {tile_size} does not fit a {width}x{height} image"
                )
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::IndexMissing { library, path } => {
                write!(
                    f,
                    "No color index for library '{library}' at '{}'; rebuild it with --scan-database",
                    path.display()
                )
            }
            Self::IndexMismatch { library, reason } => {
                write!(
                    f,
                    "Color index for library '{library}' is out of date: {reason}; rebuild it with --scan-database"
                )
            }
            Self::IndexFormat { path, source } => {
                write!(f, "Malformed color index '{}': {source}", path.display())
            }
            Self::MissingLibraryImage { name, path } => {
                write!(
                    f,
                    "Library image '{name}' is missing (expected at '{}')",
                    path.display()
                )
            }
            Self::ExportCollision { path } => {
                write!(f, "Export target '{}' already exists", path.display())
            }
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Preview { reason } => write!(f, "Preview failed: {reason}"),
        }
    }
}

impl std::error::Error for MosaicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::IndexFormat { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for pipeline results
pub type Result<T> = std::result::Result<T, MosaicError>;

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> MosaicError {
    MosaicError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Reject zero for an edge length parameter
pub fn require_positive(parameter: &'static str, value: u32) -> Result<u32> {
    if value == 0 {
        Err(invalid_parameter(parameter, &value, &"must be at least 1"))
    } else {
        Ok(value)
    }
}

/// Wrap an I/O error with the path and operation it came from
pub fn file_system(
    path: impl Into<PathBuf>,
    operation: &'static str,
) -> impl FnOnce(std::io::Error) -> MosaicError {
    let path = path.into();
    move |source| MosaicError::FileSystem {
        path,
        operation,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_require_positive() {
        assert_eq!(require_positive("quality", 8).ok(), Some(8));
        match require_positive("quality", 0) {
            Err(MosaicError::InvalidParameter { parameter, .. }) => {
                assert_eq!(parameter, "quality");
            }
            _ => unreachable!("Expected InvalidParameter error type"),
        }
    }

    #[test]
    fn test_index_missing_mentions_rebuild() {
        let err = MosaicError::IndexMissing {
            library: "memes".to_string(),
            path: PathBuf::from("memes.colors.json"),
        };
        let message = err.to_string();
        assert!(message.contains("memes"));
        assert!(message.contains("--scan-database"));
    }

    #[test]
    fn test_file_system_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = file_system("lib", "read directory")(io);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("read directory"));
    }
}
