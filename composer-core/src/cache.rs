//! Decoded layers, keyed by path and modification time.
//!
//! A hit requires the file's modification time to match the one seen when it was decoded, so an artist
//! re-exporting a fragment from their paint program is picked up on the next composite.

use crate::compositor::{self, CompositeError};

#[derive(Default)]
pub struct DecodeCache {
    entries: hashbrown::HashMap<std::path::PathBuf, Entry>,
}
struct Entry {
    modified: std::time::SystemTime,
    image: std::sync::Arc<image::RgbaImage>,
}
impl DecodeCache {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn clear(&mut self) {
        self.entries.clear();
    }
    /// Fetch the decoded layer, decoding it if it isn't cached or has changed on disk.
    pub fn get_or_load(
        &mut self,
        path: &std::path::Path,
    ) -> Result<std::sync::Arc<image::RgbaImage>, CompositeError> {
        let modified = std::fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|source| CompositeError::Io {
                path: path.to_owned(),
                source,
            })?;
        if let Some(entry) = self.entries.get(path) {
            if entry.modified == modified {
                return Ok(entry.image.clone());
            }
            log::trace!("{path:?} changed on disk, reloading");
        }
        let image = std::sync::Arc::new(compositor::load(path)?);
        self.entries.insert(
            path.to_owned(),
            Entry {
                modified,
                image: image.clone(),
            },
        );
        Ok(image)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::{solid, write_layer};

    #[test]
    fn hit_returns_same_allocation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_layer(dir.path(), "a.webp", &solid(2, 2, [1, 2, 3, 4]));
        let mut cache = DecodeCache::default();
        let first = cache.get_or_load(&path).unwrap();
        let second = cache.get_or_load(&path).unwrap();
        assert!(std::sync::Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }
    #[test]
    fn modified_file_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_layer(dir.path(), "a.webp", &solid(2, 2, [1, 2, 3, 4]));
        let mut cache = DecodeCache::default();
        let first = cache.get_or_load(&path).unwrap();

        write_layer(dir.path(), "a.webp", &solid(2, 2, [9, 9, 9, 9]));
        // Filesystem timestamps can be coarse, force a distinct one.
        let later = std::time::SystemTime::now() + std::time::Duration::from_secs(10);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        let second = cache.get_or_load(&path).unwrap();
        assert_eq!(first.get_pixel(0, 0).0, [1, 2, 3, 4]);
        assert_eq!(second.get_pixel(0, 0).0, [9, 9, 9, 9]);
    }
    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DecodeCache::default();
        assert!(matches!(
            cache.get_or_load(&dir.path().join("nope.webp")),
            Err(CompositeError::Io { .. })
        ));
        assert!(cache.is_empty());
    }
}
