pub mod ingest;

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;
pub const MAX_FILES: usize = 5;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("You can attach at most {max} images (selected {selected}).")]
    TooManyFiles { selected: usize, max: usize },
    #[error("{name} is larger than 5 MB ({size} bytes, limit {max}). Choose a smaller image.")]
    FileTooLarge { name: String, size: u64, max: u64 },
    #[error("{name} is not an image file.")]
    NotAnImage { name: String },
    #[error("Could not read {name}: {reason}")]
    Unreadable { name: String, reason: String },
}

/// A file the user picked, before any of its content has been read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl SelectedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, SelectionError> {
        let path = path.into();
        let metadata = std::fs::metadata(&path).map_err(|err| SelectionError::Unreadable {
            name: display_name(&path),
            reason: err.to_string(),
        })?;
        if !metadata.is_file() {
            return Err(SelectionError::Unreadable {
                name: display_name(&path),
                reason: "not a regular file".to_string(),
            });
        }

        Ok(Self {
            path,
            size_bytes: metadata.len(),
        })
    }

    pub fn name(&self) -> String {
        display_name(&self.path)
    }

    fn has_image_extension(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Checks a whole selection against the count and size limits. The selection
/// is accepted or rejected as a unit.
pub fn validate_selection(files: &[SelectedFile]) -> Result<(), SelectionError> {
    if files.len() > MAX_FILES {
        return Err(SelectionError::TooManyFiles {
            selected: files.len(),
            max: MAX_FILES,
        });
    }

    for file in files {
        if file.size_bytes > MAX_FILE_BYTES {
            return Err(SelectionError::FileTooLarge {
                name: file.name(),
                size: file.size_bytes,
                max: MAX_FILE_BYTES,
            });
        }
        if !file.has_image_extension() {
            return Err(SelectionError::NotAnImage { name: file.name() });
        }
    }

    Ok(())
}

/// Decoded pixels for on-screen display plus the data URL they came from.
#[derive(Clone)]
pub struct Preview {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl fmt::Debug for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preview")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data_url_len", &self.data_url.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub path: PathBuf,
    pub name: String,
    pub preview: Preview,
    /// Base64 payload with the data URL header removed.
    pub encoded: String,
}

/// Ordered attachments. Each entry carries its file, preview and encoded
/// payload together, so the three projections stay index-aligned.
#[derive(Debug, Clone, Default)]
pub struct AttachmentSet {
    items: Vec<Attachment>,
    revision: u64,
}

impl AttachmentSet {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Attachment> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.items.iter()
    }

    /// Bumped on every mutation; lets the renderer know when cached textures
    /// are stale.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn encoded(&self) -> Vec<String> {
        self.items.iter().map(|item| item.encoded.clone()).collect()
    }

    pub fn replace(&mut self, items: Vec<Attachment>) {
        self.items = items;
        self.revision += 1;
    }

    pub fn remove(&mut self, index: usize) -> Option<Attachment> {
        if index >= self.items.len() {
            return None;
        }
        self.revision += 1;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        if !self.items.is_empty() {
            self.revision += 1;
        }
        self.items.clear();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{Attachment, Preview};
    use std::path::PathBuf;

    pub fn attachment(name: &str) -> Attachment {
        Attachment {
            path: PathBuf::from(format!("/tmp/{name}")),
            name: name.to_string(),
            preview: Preview {
                data_url: format!("data:image/png;base64,{name}"),
                width: 1,
                height: 1,
                rgba: vec![0, 0, 0, 255],
            },
            encoded: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::attachment;
    use super::*;

    fn selected(name: &str, size_bytes: u64) -> SelectedFile {
        SelectedFile {
            path: PathBuf::from(format!("/photos/{name}")),
            size_bytes,
        }
    }

    #[test]
    fn five_small_images_pass_validation() {
        let files: Vec<_> = (0..5).map(|i| selected(&format!("{i}.png"), 1024)).collect();
        assert_eq!(validate_selection(&files), Ok(()));
    }

    #[test]
    fn six_files_exceed_count_limit() {
        let files: Vec<_> = (0..6).map(|i| selected(&format!("{i}.jpg"), 10)).collect();
        assert_eq!(
            validate_selection(&files),
            Err(SelectionError::TooManyFiles {
                selected: 6,
                max: MAX_FILES
            })
        );
    }

    #[test]
    fn six_megabyte_file_is_rejected() {
        let files = vec![selected("huge.jpg", 6 * 1024 * 1024)];
        assert!(matches!(
            validate_selection(&files),
            Err(SelectionError::FileTooLarge { ref name, .. }) if name == "huge.jpg"
        ));
    }

    #[test]
    fn exactly_five_megabytes_is_allowed() {
        let files = vec![selected("edge.PNG", MAX_FILE_BYTES)];
        assert_eq!(validate_selection(&files), Ok(()));
    }

    #[test]
    fn non_image_extension_is_rejected() {
        let files = vec![selected("notes.txt", 12)];
        assert_eq!(
            validate_selection(&files),
            Err(SelectionError::NotAnImage {
                name: "notes.txt".to_string()
            })
        );
    }

    #[test]
    fn missing_file_is_unreadable() {
        let path = std::env::temp_dir().join(format!(
            "ask_then_answer_missing_{}.png",
            std::process::id()
        ));
        assert!(matches!(
            SelectedFile::from_path(&path),
            Err(SelectionError::Unreadable { .. })
        ));
    }

    #[test]
    fn remove_keeps_projections_aligned() {
        let mut set = AttachmentSet::default();
        set.replace(vec![attachment("a"), attachment("b"), attachment("c"), attachment("d")]);
        let before = set.revision();

        let removed = set.remove(1).expect("index 1 exists");
        assert_eq!(removed.name, "b");
        assert_eq!(set.len(), 3);
        assert_eq!(set.encoded(), vec!["a", "c", "d"]);
        let paths: Vec<_> = set.iter().map(|item| item.path.as_path()).collect();
        assert_eq!(
            paths,
            vec![Path::new("/tmp/a"), Path::new("/tmp/c"), Path::new("/tmp/d")]
        );
        let urls: Vec<_> = set.iter().map(|item| item.preview.data_url.clone()).collect();
        assert_eq!(
            urls,
            vec![
                "data:image/png;base64,a",
                "data:image/png;base64,c",
                "data:image/png;base64,d"
            ]
        );
        assert!(set.revision() > before);
    }

    #[test]
    fn remove_out_of_range_is_a_no_op() {
        let mut set = AttachmentSet::default();
        set.replace(vec![attachment("a")]);
        let before = set.revision();
        assert!(set.remove(3).is_none());
        assert_eq!(set.len(), 1);
        assert_eq!(set.revision(), before);
    }
}
