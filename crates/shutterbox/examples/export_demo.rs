//! Export Demo - strip, loop animation and highlight video from one session
//!
//! Builds six synthetic stills and clips of different lengths, runs the
//! three export pipelines concurrently, and writes the artifacts.
//!
//! # Running
//!
//! ```bash
//! cargo run --example export_demo -p shutterbox
//! ```

#![allow(clippy::unwrap_used, clippy::uninlined_format_args)]

use image::{Rgba, RgbaImage};
use shutterbox::catalog::BackgroundCatalog;
use shutterbox::clip::{ClipChunk, VideoClip};
use shutterbox::config::ExportConfig;
use shutterbox::events::{EventSink, KioskEvent};
use shutterbox::export::{encode_jpeg, CompositeExporter, CompositeJob, SlotLayout, SlotSnapshot};
use shutterbox::session::{SessionId, SLOT_COUNT};
use std::path::Path;
use std::sync::Arc;

const FRAME: (u32, u32) = (192, 144);

fn pattern(slot: usize, step: u32) -> RgbaImage {
    RgbaImage::from_fn(FRAME.0, FRAME.1, |x, y| {
        let band = ((x + step * 6) / 24) % 2 == 0;
        let tint = (slot as u8).wrapping_mul(40);
        if band {
            Rgba([tint, 90, (y % 256) as u8, 255])
        } else {
            Rgba([240, 240 - tint, 60, 255])
        }
    })
}

/// A clip of `duration_ms` with a chunk every 100 ms
fn clip(slot: usize, duration_ms: u64) -> VideoClip {
    let chunks = (0..duration_ms / 100)
        .map(|i| ClipChunk {
            timestamp_ms: i * 100,
            jpeg: encode_jpeg(&pattern(slot, i as u32), 80).unwrap(),
        })
        .collect();
    VideoClip::new(slot, FRAME, duration_ms, chunks).unwrap()
}

#[tokio::main]
async fn main() {
    println!("=== Shutterbox Export Demo ===\n");

    let mut config = ExportConfig::default();
    config.highlight_layout = SlotLayout::highlight().scaled(0.5);
    config.strip.layout = SlotLayout::framed_strip().scaled(0.25);
    config.loop_width = 480;
    config.loop_height = 310;

    // slot 4 has no clip and shows its still in the highlight video
    let inputs: [SlotSnapshot; SLOT_COUNT] = std::array::from_fn(|slot| SlotSnapshot {
        still: Some(Arc::new(pattern(slot, 0))),
        clip: (slot != 4).then(|| clip(slot, 2_000 + slot as u64 * 400)),
    });
    let job = CompositeJob::new(SessionId::new("demo party"), inputs, 0);

    let catalog = BackgroundCatalog::generated(&config.strip.layout, &[[250, 250, 250, 255]]);
    let (events, mut rx) = EventSink::channel();
    let exporter = CompositeExporter::new(config, catalog).with_events(events);
    let outputs = exporter.export(&job).await;

    while let Ok(event) = rx.try_recv() {
        match event {
            KioskEvent::HighlightProgress { frame, total } if frame % 15 == 0 => {
                println!("  highlight frame {}/{}", frame, total);
            }
            KioskEvent::HighlightProgress { .. } => {}
            other => println!("  {:?}", other),
        }
    }

    let dir = Path::new("target/shutterbox-demo");
    std::fs::create_dir_all(dir).unwrap();
    for artifact in outputs.artifacts() {
        let path = artifact.write_to(dir).unwrap();
        println!("wrote {} ({} bytes)", path.display(), artifact.bytes().len());
    }

    println!("\n=== Export Demo Complete ===");
}
