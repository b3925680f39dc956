//! Selectable background frames.
//!
//! Backgrounds are full-canvas RGBA images drawn over the composited stills;
//! transparent regions let the slot windows show through.

use crate::export::SlotLayout;
use crate::result::{BoothError, BoothResult};
use image::{Rgba, RgbaImage};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// One background frame
#[derive(Debug, Clone)]
pub struct Background {
    name: String,
    image: Arc<RgbaImage>,
}

impl Background {
    /// Create a named background
    #[must_use]
    pub fn new(name: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            name: name.into(),
            image: Arc::new(image),
        }
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pixels
    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Shared handle to the pixels
    #[must_use]
    pub fn shared_image(&self) -> Arc<RgbaImage> {
        Arc::clone(&self.image)
    }
}

/// Ordered, read-only list of backgrounds
#[derive(Debug, Clone, Default)]
pub struct BackgroundCatalog {
    backgrounds: Vec<Background>,
}

impl BackgroundCatalog {
    /// Create a catalog
    #[must_use]
    pub fn new(backgrounds: Vec<Background>) -> Self {
        Self { backgrounds }
    }

    /// Plain frames in the given colours with a transparent window per slot
    #[must_use]
    pub fn generated(layout: &SlotLayout, colors: &[[u8; 4]]) -> Self {
        let backgrounds = colors
            .iter()
            .enumerate()
            .map(|(i, color)| {
                let mut image = RgbaImage::from_pixel(layout.width, layout.height, Rgba(*color));
                for rect in &layout.slots {
                    for y in rect.y..rect.bottom().min(layout.height) {
                        for x in rect.x..rect.right().min(layout.width) {
                            image.put_pixel(x, y, Rgba([0, 0, 0, 0]));
                        }
                    }
                }
                Background::new(format!("frame-{}", i + 1), image)
            })
            .collect();
        Self { backgrounds }
    }

    /// Load every `.png` in `dir`, ordered by file name
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be read, an image fails to
    /// decode, or no PNG files are found
    pub fn load_dir(dir: &Path) -> BoothResult<Self> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(BoothError::config(format!(
                "no PNG backgrounds in {}",
                dir.display()
            )));
        }

        let backgrounds = paths
            .iter()
            .map(|path| {
                let name = path
                    .file_stem()
                    .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
                debug!(background = %name, "loading background");
                Ok(Background::new(name, image::open(path)?.to_rgba8()))
            })
            .collect::<BoothResult<Vec<_>>>()?;
        Ok(Self { backgrounds })
    }

    /// Number of backgrounds
    #[must_use]
    pub fn len(&self) -> usize {
        self.backgrounds.len()
    }

    /// Whether the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backgrounds.is_empty()
    }

    /// Background at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Background> {
        self.backgrounds.get(index)
    }

    /// Names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.backgrounds.iter().map(Background::name)
    }

    /// Index after `index`, wrapping to the first
    #[must_use]
    pub fn next_index(&self, index: usize) -> usize {
        if self.is_empty() {
            0
        } else {
            (index + 1) % self.len()
        }
    }

    /// Index before `index`, wrapping to the last
    #[must_use]
    pub fn prev_index(&self, index: usize) -> usize {
        if self.is_empty() {
            0
        } else {
            (index % self.len() + self.len() - 1) % self.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(n: usize) -> BackgroundCatalog {
        BackgroundCatalog::new(
            (0..n)
                .map(|i| Background::new(format!("b{i}"), RgbaImage::new(1, 1)))
                .collect(),
        )
    }

    #[test]
    fn test_cycling_wraps() {
        let catalog = catalog(3);
        assert_eq!(catalog.next_index(0), 1);
        assert_eq!(catalog.next_index(2), 0);
        assert_eq!(catalog.prev_index(0), 2);
        assert_eq!(catalog.prev_index(1), 0);
    }

    #[test]
    fn test_cycling_empty_catalog() {
        let catalog = catalog(0);
        assert_eq!(catalog.next_index(4), 0);
        assert_eq!(catalog.prev_index(0), 0);
        assert!(catalog.get(0).is_none());
    }

    #[test]
    fn test_generated_has_transparent_windows() {
        let layout = SlotLayout::highlight();
        let catalog = BackgroundCatalog::generated(&layout, &[[200, 30, 30, 255], [0, 0, 0, 255]]);
        assert_eq!(catalog.len(), 2);
        let frame = catalog.get(0).unwrap().image();
        assert_eq!(frame.dimensions(), (840, 1240));
        let rect = layout.slots[2];
        assert_eq!(frame.get_pixel(rect.x + 1, rect.y + 1).0[3], 0);
        assert_eq!(*frame.get_pixel(0, 0), Rgba([200, 30, 30, 255]));
    }

    #[test]
    fn test_load_dir_sorted_pngs_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.PNG", "c.png"] {
            RgbaImage::new(2, 2).save(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let catalog = BackgroundCatalog::load_dir(dir.path()).unwrap();
        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_load_dir_without_pngs_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            BackgroundCatalog::load_dir(dir.path()),
            Err(BoothError::Config { .. })
        ));
    }
}
