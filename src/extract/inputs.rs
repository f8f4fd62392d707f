use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::debug;

use crate::core::{ConsensusError, Result};

/// One image to run through the engines. `item_id` is the file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputItem {
    pub item_id: String,
    pub path: PathBuf,
}

/// Lists the image files directly inside `dir`, sorted by file name.
///
/// An image whose file name is not valid UTF-8 fails the whole listing: it
/// has no usable item id, and dropping it would leave it out of every
/// engine's result set without notice.
///
/// A file counts as an image when its extension names a format the `image`
/// crate knows, compared case-insensitively. Sorting makes the order
/// identical across runs and platforms.
pub fn collect_inputs(dir: &Path) -> Result<Vec<InputItem>> {
    let entries = fs::read_dir(dir).map_err(|source| ConsensusError::InputCollection {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut items = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConsensusError::InputCollection {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() || !is_image(&path) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return Err(ConsensusError::InputCollection {
                path: dir.to_path_buf(),
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("image file name is not valid UTF-8: {}", path.display()),
                ),
            });
        };
        items.push(InputItem {
            item_id: name.to_string(),
            path,
        });
    }

    items.sort_by(|a, b| a.item_id.cmp(&b.item_id));
    debug!(dir = %dir.display(), items = items.len(), "collected image files");
    Ok(items)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ImageFormat::from_extension(ext.to_ascii_lowercase()))
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn keeps_images_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        for name in ["b.jpg", "a.PNG", "c.jpeg", "notes.txt", "d.tiff", "README"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let ids: Vec<String> = collect_inputs(dir.path())
            .unwrap()
            .into_iter()
            .map(|item| item.item_id)
            .collect();
        assert_eq!(ids, vec!["a.PNG", "b.jpg", "c.jpeg", "d.tiff"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_image_name_fails_listing() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ok.jpg"), b"x").unwrap();
        fs::write(dir.path().join(OsStr::from_bytes(b"bad\xff.jpg")), b"x").unwrap();

        match collect_inputs(dir.path()) {
            Err(ConsensusError::InputCollection { path, source }) => {
                assert_eq!(path, dir.path());
                assert_eq!(source.kind(), io::ErrorKind::InvalidData);
            }
            other => panic!("expected input collection error, got {other:?}"),
        }
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = collect_inputs(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, ConsensusError::InputCollection { .. }));
    }
}
