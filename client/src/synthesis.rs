//! Requests against the remote synthesis service.
//!
//! [`SynthesisClient`] validates a draft locally and hands the wire request
//! to a [`SynthesisBackend`]. [`HttpBackend`] is the real one; tests plug in
//! their own.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use maya_protocol::{ErrorBody, SynthesizeRequest, SynthesizeResponse};

use crate::config::{ClientConfig, DEFAULT_VOICE_DESCRIPTION};
use crate::error::{Error, Result, TransportError};

/// The user's editable request.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftRequest {
    pub text: String,
    pub voice_description: String,
    pub speed: f32,
}

impl Default for DraftRequest {
    fn default() -> Self {
        Self {
            text: String::new(),
            voice_description: DEFAULT_VOICE_DESCRIPTION.to_string(),
            speed: 1.0,
        }
    }
}

impl DraftRequest {
    /// Trimmed-non-empty text is required to submit.
    pub fn is_submittable(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn to_wire(&self) -> SynthesizeRequest {
        SynthesizeRequest::new(self.text.clone())
            .with_voice_description(self.voice_description.clone())
            .with_speed(self.speed)
    }
}

/// Audio returned by one successful call, still base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOutcome {
    pub audio_base64: String,
    pub sample_rate: u32,
}

impl From<SynthesizeResponse> for SynthesisOutcome {
    fn from(resp: SynthesizeResponse) -> Self {
        Self {
            audio_base64: resp.audio_base64,
            sample_rate: resp.sample_rate,
        }
    }
}

/// One network round trip to the synthesis service.
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    async fn synthesize(
        &self,
        request: &SynthesizeRequest,
    ) -> std::result::Result<SynthesizeResponse, TransportError>;
}

/// JSON over HTTP backend.
pub struct HttpBackend {
    client: Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> std::result::Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SynthesisBackend for HttpBackend {
    async fn synthesize(
        &self,
        request: &SynthesizeRequest,
    ) -> std::result::Result<SynthesizeResponse, TransportError> {
        debug!("POST {}", self.endpoint);
        let resp = self.client.post(&self.endpoint).json(request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!("Could not read error body for {}: {}", status, e);
                    String::new()
                }
            };
            let detail = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(err) => err.detail,
                Err(_) if !body.trim().is_empty() => body,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            return Err(TransportError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Validating front for a [`SynthesisBackend`].
#[derive(Clone)]
pub struct SynthesisClient {
    backend: Arc<dyn SynthesisBackend>,
}

impl SynthesisClient {
    pub fn new(backend: Arc<dyn SynthesisBackend>) -> Self {
        Self { backend }
    }

    /// Client talking HTTP to the service named in `config`.
    pub fn http(config: &ClientConfig) -> Result<Self> {
        let backend = HttpBackend::new(config)?;
        info!("Synthesis endpoint: {}", backend.endpoint());
        Ok(Self::new(Arc::new(backend)))
    }

    /// Perform exactly one call. Empty drafts are rejected before any I/O.
    pub async fn synthesize(&self, draft: &DraftRequest) -> Result<SynthesisOutcome> {
        if !draft.is_submittable() {
            return Err(Error::Validation);
        }

        info!(
            "Synthesizing {} chars (voice: {})",
            draft.text.chars().count(),
            draft.voice_description
        );
        let start = Instant::now();

        match self.backend.synthesize(&draft.to_wire()).await {
            Ok(resp) => {
                info!(
                    "Received {} base64 bytes at {} Hz in {:?}",
                    resp.audio_base64.len(),
                    resp.sample_rate,
                    start.elapsed()
                );
                Ok(resp.into())
            }
            Err(e) => {
                warn!("Synthesis failed after {:?}: {}", start.elapsed(), e);
                Err(e.into())
            }
        }
    }
}
