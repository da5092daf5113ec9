//! Patch image lookup.
//!
//! Images live flat in one directory, named after the patch identifier with
//! one of [`IMAGE_EXTENSIONS`].

use std::path::{Path, PathBuf};

/// Extensions probed, in order.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "png", "jpeg"];

/// Resolves patch identifiers to image files.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// Creates a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the image directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the first existing image for `patch_id`.
    ///
    /// Identifiers that are empty or could escape the image directory never
    /// resolve.
    #[must_use]
    pub fn image_path(&self, patch_id: &str) -> Option<PathBuf> {
        if patch_id.is_empty() || patch_id.contains(['/', '\\']) || patch_id.contains("..") {
            return None;
        }

        IMAGE_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{patch_id}.{ext}")))
            .find(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"img").unwrap();
    }

    #[test]
    fn probes_extensions_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "T1.png");
        touch(tmp.path(), "T1.jpeg");
        touch(tmp.path(), "T2.jpeg");

        let store = ImageStore::new(tmp.path());
        assert_eq!(store.image_path("T1"), Some(tmp.path().join("T1.png")));
        assert_eq!(store.image_path("T2"), Some(tmp.path().join("T2.jpeg")));

        touch(tmp.path(), "T1.jpg");
        assert_eq!(store.image_path("T1"), Some(tmp.path().join("T1.jpg")));
    }

    #[test]
    fn missing_image_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ImageStore::new(tmp.path());
        assert_eq!(store.image_path("T404"), None);
    }

    #[test]
    fn traversal_and_empty_ids_never_resolve() {
        let tmp = tempfile::tempdir().unwrap();
        let images = tmp.path().join("images");
        std::fs::create_dir(&images).unwrap();
        touch(tmp.path(), "secret.jpg");

        let store = ImageStore::new(&images);
        assert_eq!(store.image_path(""), None);
        assert_eq!(store.image_path("../secret"), None);
        assert_eq!(store.image_path("a/b"), None);
        assert_eq!(store.image_path("a\\b"), None);
    }

    #[test]
    fn directories_are_not_images() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("T9.jpg")).unwrap();
        let store = ImageStore::new(tmp.path());
        assert_eq!(store.image_path("T9"), None);
    }
}
