use std::num::NonZeroUsize;
use std::time::Duration;

use maya_protocol::SYNTHESIZE_PATH;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";
pub const DEFAULT_VOICE_DESCRIPTION: &str = "Young British female, energetic";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Settings for a studio session.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the synthesis service
    pub server: String,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Maximum history length; `None` keeps every result
    pub history_limit: Option<NonZeroUsize>,
    /// Voice description the draft starts with
    pub voice_description: String,
    pub speed: f32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
            history_limit: None,
            voice_description: DEFAULT_VOICE_DESCRIPTION.to_string(),
            speed: 1.0,
        }
    }
}

impl ClientConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_history_limit(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_voice_description(mut self, description: impl Into<String>) -> Self {
        self.voice_description = description.into();
        self
    }

    /// Full URL of the synthesis endpoint
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.server.trim_end_matches('/'), SYNTHESIZE_PATH)
    }
}
