//! Shared protocol definitions for the Maya1 synthesis service.
//!
//! The protocol is a single JSON request/response exchange over HTTP:
//! - Client sends: `POST /api/synthesize` with a [`SynthesizeRequest`] body
//! - Server returns: a [`SynthesizeResponse`] carrying base64 WAV bytes
//!
//! Failures come back as a non-2xx status, usually with an [`ErrorBody`].

use serde::{Deserialize, Serialize};

/// Path of the synthesis endpoint, relative to the service base URL
pub const SYNTHESIZE_PATH: &str = "/api/synthesize";

/// Request from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizeRequest {
    /// The text to synthesize, may contain inline `<tag>` cues
    pub text: String,
    /// Natural-language description of the voice
    #[serde(default = "default_voice_description")]
    pub voice_description: String,
    /// Playback-rate multiplier
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_voice_description() -> String {
    "Generic female voice".to_string()
}

fn default_speed() -> f32 {
    1.0
}

impl SynthesizeRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_description: default_voice_description(),
            speed: default_speed(),
        }
    }

    pub fn with_voice_description(mut self, description: impl Into<String>) -> Self {
        self.voice_description = description.into();
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

/// Successful response from the server. Both fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizeResponse {
    /// Base64-encoded PCM WAV bytes
    pub audio_base64: String,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

/// Error body returned alongside a non-2xx status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Audio format constants
pub const SAMPLE_RATE: u32 = 24000;
pub const CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;

/// Media type of the returned payload
pub const WAV_MEDIA_TYPE: &str = "audio/wav";
