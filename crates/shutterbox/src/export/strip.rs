//! Strip pipeline: six stills in their windows, background on top, PNG out.

use super::layout::SlotLayout;
use super::surface::{FitMode, Surface};
use crate::result::{BoothError, BoothResult};
use crate::session::SLOT_COUNT;
use image::RgbaImage;
use std::sync::Arc;

/// Compose the strip; slots without a still keep the canvas fill
///
/// # Errors
///
/// Returns error if a still cannot be drawn into the layout
pub fn render_strip(
    stills: &[Option<Arc<RgbaImage>>; SLOT_COUNT],
    layout: &SlotLayout,
    background: Option<&RgbaImage>,
) -> BoothResult<RgbaImage> {
    let mut surface = Surface::new(layout.width, layout.height);
    for (index, still) in stills.iter().enumerate() {
        if let Some(still) = still {
            surface.draw(still, layout.slot(index)?, FitMode::Cover)?;
        }
    }
    if let Some(frame) = background {
        surface.overlay(frame);
    }
    Ok(surface.into_image())
}

/// Encode RGBA8 as PNG, recording the session id in a tEXt chunk
///
/// # Errors
///
/// Returns error if PNG encoding fails
pub fn encode_png(image: &RgbaImage, session_id: &str) -> BoothResult<Vec<u8>> {
    let mut output = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut output, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder
            .add_text_chunk("Title".to_string(), session_id.to_string())
            .map_err(|e| BoothError::encode("strip", format!("PNG text chunk: {e}")))?;

        let mut writer = encoder
            .write_header()
            .map_err(|e| BoothError::encode("strip", format!("PNG header: {e}")))?;
        writer
            .write_image_data(image.as_raw())
            .map_err(|e| BoothError::encode("strip", format!("PNG data: {e}")))?;
    }
    Ok(output)
}
