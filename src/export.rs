//! Writing and previewing the finished canvas

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use clap::{builder::PossibleValue, ValueEnum};
use image::RgbImage;

use crate::config::{EXPORT_EXTENSION, RESULT_PREFIX};
use crate::error::{file_system, MosaicError, Result};

/// What happens when the export target already exists
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Abort with `ExportCollision`
    #[default]
    Fail,
    /// Replace the existing file
    Overwrite,
    /// Append `_<n>` to the stem with the smallest free `n`
    AutoRename,
}

impl ValueEnum for CollisionPolicy {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            CollisionPolicy::Fail,
            CollisionPolicy::Overwrite,
            CollisionPolicy::AutoRename,
        ]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(match self {
            CollisionPolicy::Fail => PossibleValue::new("fail").help("Stop if the file exists."),
            CollisionPolicy::Overwrite => {
                PossibleValue::new("overwrite").help("Replace the existing file.")
            }
            CollisionPolicy::AutoRename => {
                PossibleValue::new("rename").help("Pick a free name by appending a number.")
            }
        })
    }
}

/// Append the export extension unless the name already carries it
pub fn normalize_file_name(name: &str) -> String {
    let suffix = format!(".{EXPORT_EXTENSION}");
    if name.ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}

/// First `result_<n>.jpg` that does not exist in `dir`
pub fn generate_name(dir: &Path) -> String {
    (0u64..)
        .map(|n| format!("{RESULT_PREFIX}{n}.{EXPORT_EXTENSION}"))
        .find(|name| !dir.join(name).exists())
        .unwrap_or_else(|| format!("{RESULT_PREFIX}0.{EXPORT_EXTENSION}"))
}

fn next_free(dir: &Path, file_name: &str) -> PathBuf {
    let stem = Path::new(file_name)
        .file_stem()
        .map_or_else(|| file_name.to_string(), |s| s.to_string_lossy().into_owned());
    (1u64..)
        .map(|n| dir.join(format!("{stem}_{n}.{EXPORT_EXTENSION}")))
        .find(|path| !path.exists())
        .unwrap_or_else(|| dir.join(file_name))
}

/// Decide where the mosaic is written
///
/// Creates `dir` if needed. An empty `file_name` auto-generates a free
/// `result_<n>.jpg`; otherwise the name gets a `.jpg` extension and
/// `policy` settles any collision.
///
/// # Errors
///
/// Returns `FileSystem` if `dir` cannot be created and `ExportCollision` if
/// the target exists under [`CollisionPolicy::Fail`].
pub fn resolve_export_path(dir: &Path, file_name: &str, policy: CollisionPolicy) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(file_system(dir, "create directory"))?;
    if file_name.is_empty() {
        return Ok(dir.join(generate_name(dir)));
    }
    let file_name = normalize_file_name(file_name);
    let path = dir.join(&file_name);
    if !path.exists() {
        return Ok(path);
    }
    match policy {
        CollisionPolicy::Fail => Err(MosaicError::ExportCollision { path }),
        CollisionPolicy::Overwrite => {
            log::warn!("Overwriting '{}'", path.display());
            Ok(path)
        }
        CollisionPolicy::AutoRename => Ok(next_free(dir, &file_name)),
    }
}

/// Write the canvas, replacing anything at `path`
///
/// # Errors
///
/// Returns `ImageExport` if encoding or writing fails.
pub fn write_canvas(canvas: &RgbImage, path: &Path) -> Result<()> {
    canvas.save(path).map_err(|source| MosaicError::ImageExport {
        path: path.to_path_buf(),
        source,
    })
}

/// Something that can put the finished canvas in front of the user
pub trait Preview {
    /// Display the canvas; must not wait for the user
    ///
    /// # Errors
    ///
    /// Returns `Preview` or an I/O error if the canvas cannot be shown.
    fn show(&self, canvas: &RgbImage) -> Result<()>;
}

/// Hands the canvas to the desktop's default image viewer
#[derive(Debug, Default)]
pub struct SystemViewer;

impl SystemViewer {
    fn command(path: &Path) -> Command {
        let mut command = if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(target_os = "windows") {
            let mut command = Command::new("cmd");
            command.args(["/C", "start", ""]);
            command
        } else {
            Command::new("xdg-open")
        };
        command.arg(path);
        command
    }
}

impl Preview for SystemViewer {
    fn show(&self, canvas: &RgbImage) -> Result<()> {
        let path = std::env::temp_dir().join(format!("mosaicify-preview-{}.png", std::process::id()));
        write_canvas(canvas, &path)?;
        Self::command(&path)
            .spawn()
            .map_err(|e| MosaicError::Preview {
                reason: format!("could not launch a viewer for '{}': {e}", path.display()),
            })?;
        log::info!("Preview written to '{}'", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_generate_name_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(generate_name(dir.path()), "result_0.jpg");
        fs::write(dir.path().join("result_0.jpg"), b"").unwrap();
        fs::write(dir.path().join("result_1.jpg"), b"").unwrap();
        assert_eq!(generate_name(dir.path()), "result_2.jpg");
    }

    #[test]
    fn test_generate_name_fills_gaps() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("result_1.jpg"), b"").unwrap();
        assert_eq!(generate_name(dir.path()), "result_0.jpg");
    }

    #[test]
    fn test_normalize_file_name() {
        assert_eq!(normalize_file_name("poster"), "poster.jpg");
        assert_eq!(normalize_file_name("poster.jpg"), "poster.jpg");
        assert_eq!(normalize_file_name("poster.png"), "poster.png.jpg");
    }

    #[test]
    fn test_resolve_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let path = resolve_export_path(&out, "", CollisionPolicy::Fail).unwrap();
        assert!(out.is_dir());
        assert_eq!(path, out.join("result_0.jpg"));
    }

    #[test]
    fn test_collision_policies() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("poster.jpg"), b"").unwrap();
        fs::write(dir.path().join("poster_1.jpg"), b"").unwrap();

        assert!(matches!(
            resolve_export_path(dir.path(), "poster", CollisionPolicy::Fail),
            Err(MosaicError::ExportCollision { .. })
        ));
        assert_eq!(
            resolve_export_path(dir.path(), "poster", CollisionPolicy::Overwrite).unwrap(),
            dir.path().join("poster.jpg")
        );
        assert_eq!(
            resolve_export_path(dir.path(), "poster.jpg", CollisionPolicy::AutoRename).unwrap(),
            dir.path().join("poster_2.jpg")
        );
    }

    #[test]
    fn test_write_canvas_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        fs::write(&path, b"stale").unwrap();
        write_canvas(&RgbImage::from_pixel(4, 4, Rgb([9, 9, 9])), &path).unwrap();
        let written = image::open(&path).unwrap();
        assert_eq!((written.width(), written.height()), (4, 4));
    }
}
