//! Raster surface shared by the three export pipelines.

use super::layout::SlotRect;
use crate::result::{BoothError, BoothResult};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::io::Cursor;

/// Background fill used before any slot is drawn
pub const CANVAS_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// How a source image is mapped into a slot window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Scale to the window, ignoring aspect ratio
    Stretch,
    /// Crop the centre to the window's aspect ratio, then scale
    #[default]
    Cover,
}

/// An RGBA canvas that slots and overlays are drawn onto
#[derive(Debug, Clone)]
pub struct Surface {
    canvas: RgbaImage,
    filter: FilterType,
}

impl Surface {
    /// Create a canvas filled with [`CANVAS_FILL`]
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(width, height, CANVAS_FILL),
            filter: FilterType::Triangle,
        }
    }

    /// Use a different resampling filter
    #[must_use]
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Canvas width
    #[must_use]
    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    /// Canvas height
    #[must_use]
    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    /// Reset every pixel to the fill colour
    pub fn clear(&mut self) {
        for pixel in self.canvas.pixels_mut() {
            *pixel = CANVAS_FILL;
        }
    }

    /// Draw `source` into `rect`
    ///
    /// # Errors
    ///
    /// Returns error if the window falls outside the canvas or the source is empty
    pub fn draw(&mut self, source: &RgbaImage, rect: SlotRect, mode: FitMode) -> BoothResult<()> {
        if !rect.fits_within(self.width(), self.height()) {
            return Err(BoothError::image(format!(
                "window {rect:?} outside {}x{} canvas",
                self.width(),
                self.height()
            )));
        }
        if source.width() == 0 || source.height() == 0 {
            return Err(BoothError::image("cannot draw an empty image"));
        }

        let fitted = match mode {
            FitMode::Stretch => imageops::resize(source, rect.width, rect.height, self.filter),
            FitMode::Cover => {
                let cropped = crop_to_aspect(source, rect.width, rect.height);
                imageops::resize(&cropped, rect.width, rect.height, self.filter)
            }
        };

        imageops::overlay(
            &mut self.canvas,
            &fitted,
            i64::from(rect.x),
            i64::from(rect.y),
        );
        Ok(())
    }

    /// Alpha-blend a full-canvas overlay (frame artwork) on top
    pub fn overlay(&mut self, frame: &RgbaImage) {
        if frame.dimensions() == self.canvas.dimensions() {
            imageops::overlay(&mut self.canvas, frame, 0, 0);
        } else {
            let resized = imageops::resize(frame, self.width(), self.height(), self.filter);
            imageops::overlay(&mut self.canvas, &resized, 0, 0);
        }
    }

    /// Borrow the canvas
    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Take the canvas
    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.canvas
    }

    /// Rasterize to a baseline JPEG (alpha is dropped)
    pub fn encode_jpeg(&self, quality: u8) -> BoothResult<Vec<u8>> {
        encode_jpeg(&self.canvas, quality)
    }
}

/// Encode RGBA pixels as JPEG
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> BoothResult<Vec<u8>> {
    let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| BoothError::image(format!("JPEG encoding failed: {e}")))?;
    Ok(buffer.into_inner())
}

/// Centre-crop `source` to the aspect ratio of `width` x `height`
fn crop_to_aspect(source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (src_w, src_h) = source.dimensions();
    let target = f64::from(width) / f64::from(height);
    let current = f64::from(src_w) / f64::from(src_h);

    let (crop_w, crop_h) = if current > target {
        (((f64::from(src_h) * target).round() as u32).clamp(1, src_w), src_h)
    } else {
        (src_w, ((f64::from(src_w) / target).round() as u32).clamp(1, src_h))
    };

    let x = (src_w - crop_w) / 2;
    let y = (src_h - crop_h) / 2;
    imageops::crop_imm(source, x, y, crop_w, crop_h).to_image()
}
