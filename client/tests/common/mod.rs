//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::sync::Notify;

use maya_protocol::{
    SynthesizeRequest, SynthesizeResponse, BITS_PER_SAMPLE, CHANNELS, SAMPLE_RATE,
};
use maya_studio::{SynthesisBackend, TransportError};

/// Minimal PCM WAV in the engine's format: 44-byte header plus `data_len` bytes.
pub fn wav_bytes(data_len: u32) -> Vec<u8> {
    let block_align = CHANNELS * (BITS_PER_SAMPLE / 8);
    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&CHANNELS.to_le_bytes());
    wav.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&(SAMPLE_RATE * u32::from(block_align)).to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend((0..data_len).map(|i| (i % 251) as u8));
    wav
}

pub fn wav_base64(data_len: u32) -> String {
    STANDARD.encode(wav_bytes(data_len))
}

pub fn ok_response(data_len: u32) -> Result<SynthesizeResponse, TransportError> {
    Ok(SynthesizeResponse {
        audio_base64: wav_base64(data_len),
        sample_rate: SAMPLE_RATE,
    })
}

pub fn server_error() -> Result<SynthesizeResponse, TransportError> {
    Err(TransportError::Status {
        status: 500,
        detail: "Internal Server Error".to_string(),
    })
}

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<SynthesizeResponse, TransportError>>>,
    requests: Mutex<Vec<SynthesizeRequest>>,
}

impl ScriptedBackend {
    pub fn new(
        responses: impl IntoIterator<Item = Result<SynthesizeResponse, TransportError>>,
    ) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<SynthesizeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SynthesisBackend for ScriptedBackend {
    async fn synthesize(
        &self,
        request: &SynthesizeRequest,
    ) -> Result<SynthesizeResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ok_response(56))
    }
}

/// Holds every call until the test releases it.
#[derive(Default)]
pub struct GatedBackend {
    pub entered: Notify,
    pub release: Notify,
    calls: AtomicUsize,
}

impl GatedBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SynthesisBackend for GatedBackend {
    async fn synthesize(
        &self,
        _request: &SynthesizeRequest,
    ) -> Result<SynthesizeResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        ok_response(56)
    }
}
