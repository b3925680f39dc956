//! Compositing and export of a finished session.
//!
//! Three pipelines share one immutable [`CompositeJob`]:
//!
//! - **strip**: stills in the strip layout, background on top, PNG
//! - **loop animation**: one GIF frame per still, 0.5 s apart, looping forever
//! - **highlight video**: all clips sampled in lockstep into fixed slots, MJPEG in MP4
//!
//! A failure in one pipeline never prevents the others from delivering.

mod animation;
mod artifact;
mod encoder;
mod exporter;
mod layout;
mod sampler;
mod strip;
mod surface;

pub use animation::{encode_loop, generated_loop_frame, LoopAnimationConfig, LOOP_FRAME_COLOR};
pub use artifact::{sanitize_session_id, Artifact, ArtifactKind, FALLBACK_STEM};
pub use encoder::{EncoderSettings, FrameBuffer, Mp4MjpegEncoder, VideoEncoder};
pub use exporter::{
    CompositeExporter, CompositeJob, CompositeOutputs, EncoderFactory, PipelineOutcome,
    SlotSnapshot,
};
pub use layout::{SlotLayout, SlotRect, StripOrientation};
pub use sampler::{
    clamp_seek_time, frame_count, highlight_duration, ClipSource, DecodedClip, FrameSampler,
};
pub use strip::{encode_png, render_strip};
pub use surface::{encode_jpeg, FitMode, Surface, CANVAS_FILL};
