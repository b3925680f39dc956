//! Slot geometry for the composited artifacts.
//!
//! Every layout has exactly six rectangles, one per session slot, in slot
//! order. The default highlight layout matches the shared background frames
//! (840x1240 with two columns of three windows).

use crate::result::{BoothError, BoothResult};
use crate::session::SLOT_COUNT;
use serde::{Deserialize, Serialize};

/// A rectangular window on a composite canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRect {
    /// Left edge in pixels
    pub x: u32,
    /// Top edge in pixels
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl SlotRect {
    /// Create a rectangle
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive)
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive)
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Whether the rectangle lies entirely inside a `width` x `height` canvas
    #[must_use]
    pub const fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0 && self.height > 0 && self.right() <= width && self.bottom() <= height
    }

    fn scaled(&self, factor: f64) -> Self {
        let scale = |v: u32| (f64::from(v) * factor).round() as u32;
        Self::new(
            scale(self.x),
            scale(self.y),
            scale(self.width).max(1),
            scale(self.height).max(1),
        )
    }
}

/// Grid arrangement for plain strips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StripOrientation {
    /// Two columns, three rows (portrait strip)
    #[default]
    Columns2Rows3,
    /// Three columns, two rows (landscape strip)
    Columns3Rows2,
}

impl StripOrientation {
    /// (columns, rows)
    #[must_use]
    pub const fn grid(self) -> (u32, u32) {
        match self {
            Self::Columns2Rows3 => (2, 3),
            Self::Columns3Rows2 => (3, 2),
        }
    }
}

/// Canvas size plus the six slot windows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotLayout {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Slot windows in slot order
    pub slots: [SlotRect; SLOT_COUNT],
}

impl SlotLayout {
    /// Highlight-video canvas: 840x1240, windows sized for the frame artwork
    #[must_use]
    pub const fn highlight() -> Self {
        Self {
            width: 840,
            height: 1240,
            slots: [
                SlotRect::new(35, 380, 360, 260),
                SlotRect::new(35, 650, 360, 260),
                SlotRect::new(35, 920, 360, 260),
                SlotRect::new(448, 380, 360, 260),
                SlotRect::new(448, 650, 360, 260),
                SlotRect::new(448, 920, 360, 260),
            ],
        }
    }

    /// Framed strip: the highlight geometry at print resolution
    #[must_use]
    pub fn framed_strip() -> Self {
        Self::highlight().scaled(2.0)
    }

    /// Plain grid strip (1200x1800 portrait or 1800x1200 landscape)
    #[must_use]
    pub fn grid_strip(orientation: StripOrientation) -> Self {
        let (long, short) = (1800, 1200);
        let (width, height) = match orientation {
            StripOrientation::Columns2Rows3 => (short, long),
            StripOrientation::Columns3Rows2 => (long, short),
        };
        Self::grid(width, height, orientation, 20, 10)
    }

    /// Evenly divide a canvas into a grid with outer padding and inner gap
    #[must_use]
    pub fn grid(
        width: u32,
        height: u32,
        orientation: StripOrientation,
        padding: u32,
        gap: u32,
    ) -> Self {
        let (columns, rows) = orientation.grid();
        let inner_w = width.saturating_sub(2 * padding + (columns - 1) * gap);
        let inner_h = height.saturating_sub(2 * padding + (rows - 1) * gap);
        let cell_w = (inner_w / columns).max(1);
        let cell_h = (inner_h / rows).max(1);

        // Fill row-major so slot order reads left-to-right, top-to-bottom
        let slots = std::array::from_fn(|i| {
            let i = i as u32;
            let col = i % columns;
            let row = i / columns;
            SlotRect::new(
                padding + col * (cell_w + gap),
                padding + row * (cell_h + gap),
                cell_w,
                cell_h,
            )
        });

        Self {
            width,
            height,
            slots,
        }
    }

    /// Uniformly scale canvas and windows
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            width: ((f64::from(self.width) * factor).round() as u32).max(1),
            height: ((f64::from(self.height) * factor).round() as u32).max(1),
            slots: self.slots.map(|rect| rect.scaled(factor)),
        }
    }

    /// Whether artwork cut for `self` lines up with `other` once stretched
    /// to `other`'s canvas (same aspect ratio, windows within 2 px)
    #[must_use]
    pub fn aligns_with(&self, other: &Self) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        let sx = f64::from(other.width) / f64::from(self.width);
        let sy = f64::from(other.height) / f64::from(self.height);
        if (sx - sy).abs() > 0.01 * sx.max(sy) {
            return false;
        }
        let near = |a: u32, scale: f64, b: u32| (f64::from(a) * scale - f64::from(b)).abs() <= 2.0;
        self.slots.iter().zip(&other.slots).all(|(a, b)| {
            near(a.x, sx, b.x)
                && near(a.y, sy, b.y)
                && near(a.right(), sx, b.right())
                && near(a.bottom(), sy, b.bottom())
        })
    }

    /// Window for a slot index
    pub fn slot(&self, index: usize) -> BoothResult<SlotRect> {
        self.slots
            .get(index)
            .copied()
            .ok_or(BoothError::SlotOutOfRange { index })
    }

    /// Check the canvas is non-empty and every window fits inside it
    pub fn validate(&self) -> BoothResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(BoothError::config("layout canvas must be non-empty"));
        }
        for (index, rect) in self.slots.iter().enumerate() {
            if !rect.fits_within(self.width, self.height) {
                return Err(BoothError::config(format!(
                    "slot {index} window {rect:?} does not fit a {}x{} canvas",
                    self.width, self.height
                )));
            }
        }
        Ok(())
    }
}

impl Default for SlotLayout {
    fn default() -> Self {
        Self::highlight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_layout_is_valid() {
        let layout = SlotLayout::highlight();
        assert_eq!((layout.width, layout.height), (840, 1240));
        assert!(layout.validate().is_ok());
        assert_eq!(layout.slots[3], SlotRect::new(448, 380, 360, 260));
    }

    #[test]
    fn test_framed_strip_doubles_geometry() {
        let layout = SlotLayout::framed_strip();
        assert_eq!((layout.width, layout.height), (1680, 2480));
        assert_eq!(layout.slots[0], SlotRect::new(70, 760, 720, 520));
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_grid_strip_portrait() {
        let layout = SlotLayout::grid_strip(StripOrientation::Columns2Rows3);
        assert_eq!((layout.width, layout.height), (1200, 1800));
        assert!(layout.validate().is_ok());
        // Slot 1 sits right of slot 0 on the same row
        assert_eq!(layout.slots[0].y, layout.slots[1].y);
        assert!(layout.slots[1].x > layout.slots[0].right());
        // Slot 2 starts the second row
        assert!(layout.slots[2].y > layout.slots[0].bottom());
    }

    #[test]
    fn test_grid_strip_landscape() {
        let layout = SlotLayout::grid_strip(StripOrientation::Columns3Rows2);
        assert_eq!((layout.width, layout.height), (1800, 1200));
        assert!(layout.validate().is_ok());
        assert_eq!(layout.slots[0].y, layout.slots[2].y);
        assert!(layout.slots[3].y > layout.slots[2].bottom());
    }

    #[test]
    fn test_framed_strip_aligns_with_highlight() {
        let highlight = SlotLayout::highlight();
        assert!(SlotLayout::framed_strip().aligns_with(&highlight));
        assert!(SlotLayout::framed_strip()
            .scaled(0.05)
            .aligns_with(&highlight.scaled(0.1)));
    }

    #[test]
    fn test_grid_strips_do_not_align_with_highlight() {
        let highlight = SlotLayout::highlight();
        for orientation in [StripOrientation::Columns2Rows3, StripOrientation::Columns3Rows2] {
            assert!(!SlotLayout::grid_strip(orientation).aligns_with(&highlight));
        }
    }

    #[test]
    fn test_validate_rejects_overflowing_window() {
        let mut layout = SlotLayout::highlight();
        layout.slots[5] = SlotRect::new(800, 1200, 100, 100);
        assert!(matches!(layout.validate(), Err(BoothError::Config { .. })));
    }

    #[test]
    fn test_slot_out_of_range() {
        let layout = SlotLayout::highlight();
        assert!(matches!(
            layout.slot(6),
            Err(BoothError::SlotOutOfRange { index: 6 })
        ));
    }

    #[test]
    fn test_scaled_keeps_windows_non_empty() {
        let layout = SlotLayout::highlight().scaled(0.001);
        assert!(layout.slots.iter().all(|r| r.width >= 1 && r.height >= 1));
    }
}
