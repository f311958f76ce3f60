//! Audio playback module using rodio
//!
//! rodio decodes the WAV container itself, so the decoded payload is handed
//! over as-is.

use std::io::Cursor;

use anyhow::Result;
use rodio::{Decoder, OutputStream, Sink};
use tracing::info;

use crate::codec::PlayableResult;

/// Where playable results go to be heard.
pub trait PlaybackSink: Send + Sync {
    /// Load `result`; start playing immediately when `autoplay` is set.
    /// Blocks until playback finishes.
    fn play(&self, result: &PlayableResult, autoplay: bool) -> Result<()>;
}

/// Plays through the default output device.
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioSink;

impl PlaybackSink for RodioSink {
    fn play(&self, result: &PlayableResult, autoplay: bool) -> Result<()> {
        if !autoplay {
            info!("Loaded {} ({} bytes), not playing", result.handle(), result.len());
            return Ok(());
        }

        let (_stream, stream_handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&stream_handle)?;

        let source = Decoder::new(Cursor::new(result.bytes().to_vec()))?;
        match result.duration() {
            Some(duration) => info!("Playing {} ({:.2}s)", result.handle(), duration.as_secs_f32()),
            None => info!("Playing {}", result.handle()),
        }

        sink.append(source);
        sink.sleep_until_end();

        Ok(())
    }
}
