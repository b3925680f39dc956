//! Video encoder seam and the built-in MJPEG-in-MP4 writer.
//!
//! Frames arrive as JPEG buffers tagged with their index and must be
//! submitted in strictly increasing order starting at zero. The MP4 writer
//! stores every buffer as one sample of a single chunk:
//!
//! ```text
//! ftyp | mdat (samples) | moov
//!                           mvhd
//!                           trak > tkhd, mdia > mdhd, hdlr, minf > vmhd, dinf, stbl
//! ```

use crate::result::{BoothError, BoothResult};

const ARTIFACT: &str = "highlight-video";
const TICKS_PER_FRAME: u32 = 100;
const COMPRESSOR_NAME: &[u8] = b"Shutterbox MJPEG";
const IDENTITY_MATRIX: [u32; 9] = [0x0001_0000, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000];

/// Output format requested from an encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSettings {
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Frames per second
    pub fps: u32,
}

/// One rasterized output frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Output frame index
    pub index: usize,
    /// JPEG bytes
    pub jpeg: Vec<u8>,
}

/// A video encoder fed one frame at a time
///
/// `finalize` may be slow; callers run it on the blocking pool.
pub trait VideoEncoder: Send {
    /// Prepare for a job
    ///
    /// # Errors
    ///
    /// Returns `EncodeFailure` if the settings cannot be honoured
    fn load(&mut self, settings: EncoderSettings) -> BoothResult<()>;

    /// Queue the next frame
    ///
    /// # Errors
    ///
    /// Returns `EncodeFailure` for frames out of order or before `load`
    fn submit_frame(&mut self, frame: FrameBuffer) -> BoothResult<()>;

    /// Produce the container bytes
    ///
    /// # Errors
    ///
    /// Returns `EncodeFailure` if no frames were submitted
    fn finalize(self: Box<Self>) -> BoothResult<Vec<u8>>;
}

/// Writes JPEG frames as an MJPEG track in an MP4 container
#[derive(Debug, Default)]
pub struct Mp4MjpegEncoder {
    settings: Option<EncoderSettings>,
    samples: Vec<Vec<u8>>,
}

impl Mp4MjpegEncoder {
    /// Create an unloaded encoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames submitted so far
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.samples.len()
    }
}

impl VideoEncoder for Mp4MjpegEncoder {
    fn load(&mut self, settings: EncoderSettings) -> BoothResult<()> {
        if settings.fps == 0 || settings.fps > 60 {
            return Err(BoothError::encode(
                ARTIFACT,
                format!("unsupported frame rate {}", settings.fps),
            ));
        }
        if settings.width == 0
            || settings.height == 0
            || settings.width > u32::from(u16::MAX)
            || settings.height > u32::from(u16::MAX)
        {
            return Err(BoothError::encode(
                ARTIFACT,
                format!("unsupported frame size {}x{}", settings.width, settings.height),
            ));
        }
        self.settings = Some(settings);
        self.samples.clear();
        Ok(())
    }

    fn submit_frame(&mut self, frame: FrameBuffer) -> BoothResult<()> {
        if self.settings.is_none() {
            return Err(BoothError::encode(ARTIFACT, "encoder not loaded"));
        }
        if frame.index != self.samples.len() {
            return Err(BoothError::encode(
                ARTIFACT,
                format!(
                    "frame {} submitted out of order, expected {}",
                    frame.index,
                    self.samples.len()
                ),
            ));
        }
        self.samples.push(frame.jpeg);
        Ok(())
    }

    fn finalize(self: Box<Self>) -> BoothResult<Vec<u8>> {
        let settings = self
            .settings
            .ok_or_else(|| BoothError::encode(ARTIFACT, "encoder not loaded"))?;
        if self.samples.is_empty() {
            return Err(BoothError::encode(ARTIFACT, "no frames submitted"));
        }
        Mp4Layout::new(settings, &self.samples)?.write(&self.samples)
    }
}

fn to_u32(value: usize, what: &str) -> BoothResult<u32> {
    u32::try_from(value).map_err(|_| BoothError::encode(ARTIFACT, format!("{what} exceeds 32 bits")))
}

fn mp4_box(kind: &[u8; 4], content: &[u8]) -> BoothResult<Vec<u8>> {
    let size = to_u32(8 + content.len(), "box size")?;
    let mut out = Vec::with_capacity(8 + content.len());
    out.extend_from_slice(&size.to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(content);
    Ok(out)
}

/// A box with a version byte and 24-bit flags ahead of its body
fn full_box(kind: &[u8; 4], flags: u32, body: &[u8]) -> BoothResult<Vec<u8>> {
    let mut content = Vec::with_capacity(4 + body.len());
    content.extend_from_slice(&(flags & 0x00FF_FFFF).to_be_bytes());
    content.extend_from_slice(body);
    mp4_box(kind, &content)
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_matrix(out: &mut Vec<u8>) {
    for value in IDENTITY_MATRIX {
        push_u32(out, value);
    }
}

struct Mp4Layout {
    settings: EncoderSettings,
    sample_count: u32,
    sample_sizes: Vec<u32>,
    mdat_len: usize,
}

impl Mp4Layout {
    fn new(settings: EncoderSettings, samples: &[Vec<u8>]) -> BoothResult<Self> {
        let sample_sizes = samples
            .iter()
            .map(|s| to_u32(s.len(), "sample size"))
            .collect::<BoothResult<Vec<_>>>()?;
        Ok(Self {
            settings,
            sample_count: to_u32(samples.len(), "sample count")?,
            sample_sizes,
            mdat_len: samples.iter().map(Vec::len).sum(),
        })
    }

    fn timescale(&self) -> u32 {
        self.settings.fps * TICKS_PER_FRAME
    }

    fn duration(&self) -> u32 {
        self.sample_count.saturating_mul(TICKS_PER_FRAME)
    }

    fn write(&self, samples: &[Vec<u8>]) -> BoothResult<Vec<u8>> {
        let ftyp = Self::ftyp()?;
        // samples start right after the ftyp box and the mdat header
        let chunk_offset = to_u32(ftyp.len() + 8, "chunk offset")?;

        let mut mdat = Vec::with_capacity(self.mdat_len);
        for sample in samples {
            mdat.extend_from_slice(sample);
        }

        let mut out = ftyp;
        out.extend(mp4_box(b"mdat", &mdat)?);
        out.extend(self.moov(chunk_offset)?);
        Ok(out)
    }

    fn ftyp() -> BoothResult<Vec<u8>> {
        let mut content = Vec::new();
        content.extend_from_slice(b"isom");
        push_u32(&mut content, 512);
        for brand in [b"isom", b"iso2", b"mp41"] {
            content.extend_from_slice(brand);
        }
        mp4_box(b"ftyp", &content)
    }

    fn moov(&self, chunk_offset: u32) -> BoothResult<Vec<u8>> {
        let mut content = self.mvhd()?;
        content.extend(self.trak(chunk_offset)?);
        mp4_box(b"moov", &content)
    }

    fn mvhd(&self) -> BoothResult<Vec<u8>> {
        let mut body = Vec::new();
        push_u32(&mut body, 0); // creation
        push_u32(&mut body, 0); // modification
        push_u32(&mut body, self.timescale());
        push_u32(&mut body, self.duration());
        push_u32(&mut body, 0x0001_0000); // rate 1.0
        push_u16(&mut body, 0x0100); // volume 1.0
        body.extend_from_slice(&[0; 10]);
        push_matrix(&mut body);
        body.extend_from_slice(&[0; 24]);
        push_u32(&mut body, 2); // next track id
        full_box(b"mvhd", 0, &body)
    }

    fn trak(&self, chunk_offset: u32) -> BoothResult<Vec<u8>> {
        let mut content = self.tkhd()?;
        content.extend(self.mdia(chunk_offset)?);
        mp4_box(b"trak", &content)
    }

    fn tkhd(&self) -> BoothResult<Vec<u8>> {
        let mut body = Vec::new();
        push_u32(&mut body, 0);
        push_u32(&mut body, 0);
        push_u32(&mut body, 1); // track id
        push_u32(&mut body, 0);
        push_u32(&mut body, self.duration());
        body.extend_from_slice(&[0; 8]);
        push_u16(&mut body, 0); // layer
        push_u16(&mut body, 0); // alternate group
        push_u16(&mut body, 0); // volume
        push_u16(&mut body, 0);
        push_matrix(&mut body);
        push_u32(&mut body, self.settings.width << 16);
        push_u32(&mut body, self.settings.height << 16);
        // enabled | in movie
        full_box(b"tkhd", 0x3, &body)
    }

    fn mdia(&self, chunk_offset: u32) -> BoothResult<Vec<u8>> {
        let mut mdhd = Vec::new();
        push_u32(&mut mdhd, 0);
        push_u32(&mut mdhd, 0);
        push_u32(&mut mdhd, self.timescale());
        push_u32(&mut mdhd, self.duration());
        push_u16(&mut mdhd, 0x55C4); // "und"
        push_u16(&mut mdhd, 0);

        let mut hdlr = Vec::new();
        push_u32(&mut hdlr, 0);
        hdlr.extend_from_slice(b"vide");
        hdlr.extend_from_slice(&[0; 12]);
        hdlr.extend_from_slice(b"Shutterbox Highlight\0");

        let mut content = full_box(b"mdhd", 0, &mdhd)?;
        content.extend(full_box(b"hdlr", 0, &hdlr)?);
        content.extend(self.minf(chunk_offset)?);
        mp4_box(b"mdia", &content)
    }

    fn minf(&self, chunk_offset: u32) -> BoothResult<Vec<u8>> {
        let vmhd = full_box(b"vmhd", 0x1, &[0; 8])?;

        let mut dref = Vec::new();
        push_u32(&mut dref, 1);
        dref.extend(full_box(b"url ", 0x1, &[])?);
        let dinf = mp4_box(b"dinf", &full_box(b"dref", 0, &dref)?)?;

        let mut content = vmhd;
        content.extend(dinf);
        content.extend(self.stbl(chunk_offset)?);
        mp4_box(b"minf", &content)
    }

    fn stbl(&self, chunk_offset: u32) -> BoothResult<Vec<u8>> {
        let mut stts = Vec::new();
        push_u32(&mut stts, 1);
        push_u32(&mut stts, self.sample_count);
        push_u32(&mut stts, TICKS_PER_FRAME);

        // one chunk holding every sample
        let mut stsc = Vec::new();
        push_u32(&mut stsc, 1);
        push_u32(&mut stsc, 1);
        push_u32(&mut stsc, self.sample_count);
        push_u32(&mut stsc, 1);

        let mut stsz = Vec::new();
        push_u32(&mut stsz, 0);
        push_u32(&mut stsz, self.sample_count);
        for size in &self.sample_sizes {
            push_u32(&mut stsz, *size);
        }

        let mut stco = Vec::new();
        push_u32(&mut stco, 1);
        push_u32(&mut stco, chunk_offset);

        let mut content = self.stsd()?;
        content.extend(full_box(b"stts", 0, &stts)?);
        content.extend(full_box(b"stsc", 0, &stsc)?);
        content.extend(full_box(b"stsz", 0, &stsz)?);
        content.extend(full_box(b"stco", 0, &stco)?);
        mp4_box(b"stbl", &content)
    }

    fn stsd(&self) -> BoothResult<Vec<u8>> {
        let mut entry = Vec::new();
        entry.extend_from_slice(&[0; 6]);
        push_u16(&mut entry, 1); // data reference index
        entry.extend_from_slice(&[0; 16]);
        // dimensions were range-checked in load
        push_u16(&mut entry, self.settings.width as u16);
        push_u16(&mut entry, self.settings.height as u16);
        push_u32(&mut entry, 0x0048_0000); // 72 dpi
        push_u32(&mut entry, 0x0048_0000);
        push_u32(&mut entry, 0);
        push_u16(&mut entry, 1); // frames per sample
        let mut name = [0u8; 32];
        name[0] = COMPRESSOR_NAME.len() as u8;
        name[1..=COMPRESSOR_NAME.len()].copy_from_slice(COMPRESSOR_NAME);
        entry.extend_from_slice(&name);
        push_u16(&mut entry, 24); // depth
        entry.extend_from_slice(&(-1i16).to_be_bytes());

        let mut body = Vec::new();
        push_u32(&mut body, 1);
        body.extend(mp4_box(b"jpeg", &entry)?);
        full_box(b"stsd", 0, &body)
    }
}
