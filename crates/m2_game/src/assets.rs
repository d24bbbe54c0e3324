//! CPU-side image store.
//!
//! Images are decoded once, scaled to screen size, and addressed by
//! [`ImageId`]. The simulation only ever holds ids and sizes; the render side
//! walks the store once at startup to create GPU textures.

use std::collections::HashMap;
use std::path::Path;

use image::RgbaImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub u32);

/// Handle plus pixel size of a loaded, already-scaled image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRef {
    pub id: ImageId,
    pub width: u32,
    pub height: u32,
}

pub struct LoadedImage {
    pub path: String,
    pub image: RgbaImage,
}

pub struct ImageStore {
    scale: u32,
    images: Vec<LoadedImage>,
    by_path: HashMap<String, FrameRef>,
    failed: usize,
}

impl ImageStore {
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.max(1),
            images: Vec::new(),
            by_path: HashMap::new(),
            failed: 0,
        }
    }

    /// Load and scale `path`, reusing a previous load of the same path.
    /// Failures are logged and yield `None`.
    pub fn load(&mut self, path: &str) -> Option<FrameRef> {
        if let Some(existing) = self.by_path.get(path) {
            return Some(*existing);
        }
        match m2_render::load_scaled_image(Path::new(path), self.scale) {
            Ok(image) => Some(self.insert(path, image)),
            Err(err) => {
                log::error!("{err}");
                self.failed += 1;
                None
            }
        }
    }

    /// Register an already-decoded image under `path`.
    pub fn insert(&mut self, path: &str, image: RgbaImage) -> FrameRef {
        let frame = FrameRef {
            id: ImageId(self.images.len() as u32),
            width: image.width(),
            height: image.height(),
        };
        self.images.push(LoadedImage {
            path: path.to_string(),
            image,
        });
        self.by_path.insert(path.to_string(), frame);
        frame
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImageId, &LoadedImage)> {
        self.images
            .iter()
            .enumerate()
            .map(|(i, img)| (ImageId(i as u32), img))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "m2_assets_test_{}_{}_{}.png",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn load_scales_and_deduplicates() {
        let path = temp_file_path("dedupe");
        RgbaImage::from_pixel(2, 3, Rgba([255, 0, 0, 255]))
            .save(&path)
            .expect("write png");
        let path_str = path.to_string_lossy().to_string();

        let mut store = ImageStore::new(5);
        let first = store.load(&path_str).expect("image should load");
        let second = store.load(&path_str).expect("image should load again");
        assert_eq!(first, second);
        assert_eq!((first.width, first.height), (10, 15));
        assert_eq!(store.len(), 1);
        let paths: Vec<&str> = store.iter().map(|(_, img)| img.path.as_str()).collect();
        assert_eq!(paths, vec![path_str.as_str()]);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_image_is_counted_not_fatal() {
        let path = temp_file_path("missing");
        let mut store = ImageStore::new(1);
        assert!(store.load(&path.to_string_lossy()).is_none());
        assert_eq!(store.failed_count(), 1);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn ids_are_dense_in_insertion_order() {
        let mut store = ImageStore::new(1);
        let a = store.insert("a", RgbaImage::new(1, 1));
        let b = store.insert("b", RgbaImage::new(4, 2));
        assert_eq!(a.id, ImageId(0));
        assert_eq!(b.id, ImageId(1));
        let ids: Vec<ImageId> = store.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![ImageId(0), ImageId(1)]);
    }
}
