//! Looping GIF of the six stills.

use super::layout::SlotRect;
use super::surface::{FitMode, Surface};
use crate::result::{BoothError, BoothResult};
use gif::{Encoder, Frame, Repeat};
use image::{Rgba, RgbaImage};
use std::sync::Arc;

const ARTIFACT: &str = "loop-animation";

/// Border colour of the generated loop frame
pub const LOOP_FRAME_COLOR: [u8; 4] = [255, 255, 255, 255];

/// Frame geometry and timing of the loop animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopAnimationConfig {
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Delay between frames in milliseconds
    pub interval_ms: u32,
    /// Quantizer quality (1-100)
    pub quality: u8,
}

impl Default for LoopAnimationConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1240,
            interval_ms: 500,
            quality: 80,
        }
    }
}

impl LoopAnimationConfig {
    /// Set the frame size
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set quality (1-100)
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Frame delay in centiseconds, as GIF stores it
    #[must_use]
    pub fn frame_delay_cs(&self) -> u16 {
        u16::try_from((self.interval_ms / 10).max(1)).unwrap_or(u16::MAX)
    }

    /// Map quality to the quantizer speed (1 = best, 30 = fastest)
    fn speed(&self) -> i32 {
        let normalized = i32::from(100 - self.quality.clamp(1, 100));
        (normalized * 29 / 100 + 1).clamp(1, 30)
    }
}

/// Plain border frame with a transparent centre, used when no loop frame
/// artwork is configured
#[must_use]
pub fn generated_loop_frame(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    let border = (width.min(height) / 24).max(1);
    RgbaImage::from_fn(width, height, |x, y| {
        let inside = x >= border
            && y >= border
            && x + border < width
            && y + border < height;
        if inside {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba(color)
        }
    })
}

/// Render one frame per still, overlay on top, and encode an endless loop
///
/// # Errors
///
/// Returns `EncodeFailure` if there are no stills, the frame size exceeds
/// GIF limits, or the encoder fails
pub fn encode_loop(
    stills: &[Arc<RgbaImage>],
    overlay: Option<&RgbaImage>,
    config: &LoopAnimationConfig,
) -> BoothResult<Vec<u8>> {
    if stills.is_empty() {
        return Err(BoothError::encode(ARTIFACT, "no stills to animate"));
    }
    let too_large = || BoothError::encode(ARTIFACT, "frame size exceeds GIF limits");
    let width = u16::try_from(config.width).map_err(|_| too_large())?;
    let height = u16::try_from(config.height).map_err(|_| too_large())?;
    let full = SlotRect::new(0, 0, config.width, config.height);

    let mut output = Vec::new();
    {
        let mut encoder = Encoder::new(&mut output, width, height, &[])
            .map_err(|e| BoothError::encode(ARTIFACT, format!("encoder setup: {e}")))?;
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| BoothError::encode(ARTIFACT, format!("loop extension: {e}")))?;

        for still in stills {
            let mut surface = Surface::new(config.width, config.height);
            surface.draw(still, full, FitMode::Stretch)?;
            if let Some(frame) = overlay {
                surface.overlay(frame);
            }
            let mut pixels = surface.into_image().into_raw();
            let mut frame = Frame::from_rgba_speed(width, height, &mut pixels, config.speed());
            frame.delay = config.frame_delay_cs();
            encoder
                .write_frame(&frame)
                .map_err(|e| BoothError::encode(ARTIFACT, format!("frame write: {e}")))?;
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::AnimationDecoder;
    use std::io::Cursor;

    fn small() -> LoopAnimationConfig {
        LoopAnimationConfig::default().with_size(24, 16)
    }

    fn stills(n: usize) -> Vec<Arc<RgbaImage>> {
        (0..n)
            .map(|i| Arc::new(RgbaImage::from_pixel(12, 8, Rgba([i as u8 * 40, 80, 160, 255]))))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = LoopAnimationConfig::default();
        assert_eq!((config.width, config.height), (1920, 1240));
        assert_eq!(config.frame_delay_cs(), 50);
    }

    #[test]
    fn test_speed_mapping() {
        assert_eq!(LoopAnimationConfig::default().with_quality(100).speed(), 1);
        assert_eq!(LoopAnimationConfig::default().with_quality(1).speed(), 29);
    }

    #[test]
    fn test_six_frames_half_second_apart() {
        let bytes = encode_loop(&stills(6), None, &small()).unwrap();
        assert_eq!(&bytes[..6], b"GIF89a");

        let decoder = image::codecs::gif::GifDecoder::new(Cursor::new(&bytes)).unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 6);
        for frame in &frames {
            let (num, den) = frame.delay().numer_denom_ms();
            assert_eq!(num / den, 500);
            assert_eq!(frame.buffer().dimensions(), (24, 16));
        }
    }

    #[test]
    fn test_loops_forever() {
        let bytes = encode_loop(&stills(2), None, &small()).unwrap();
        // NETSCAPE2.0 application extension with a zero repeat count
        let marker = bytes
            .windows(11)
            .position(|w| w == b"NETSCAPE2.0")
            .unwrap();
        assert_eq!(&bytes[marker + 12..marker + 15], &[1, 0, 0]);
    }

    #[test]
    fn test_overlay_applied() {
        let overlay = RgbaImage::from_pixel(24, 16, Rgba([255, 255, 255, 255]));
        let bytes = encode_loop(&stills(1), Some(&overlay), &small()).unwrap();
        let decoder = image::codecs::gif::GifDecoder::new(Cursor::new(&bytes)).unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        let pixel = frames[0].buffer().get_pixel(3, 3);
        assert!(pixel.0[0] > 240 && pixel.0[1] > 240);
    }

    #[test]
    fn test_generated_frame_is_a_border() {
        let frame = generated_loop_frame(48, 24, LOOP_FRAME_COLOR);
        assert_eq!(*frame.get_pixel(0, 0), Rgba(LOOP_FRAME_COLOR));
        assert_eq!(*frame.get_pixel(47, 23), Rgba(LOOP_FRAME_COLOR));
        assert_eq!(frame.get_pixel(24, 12).0[3], 0);
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(
            encode_loop(&[], None, &small()),
            Err(BoothError::EncodeFailure { .. })
        ));
    }

    #[test]
    fn test_oversized_frame_fails() {
        let config = LoopAnimationConfig::default().with_size(70_000, 10);
        assert!(encode_loop(&stills(1), None, &config).is_err());
    }
}
