//! The synthesis session: draft, in-flight status, current selection and
//! history, and every transition between them.
//!
//! ```text
//! Idle --submit--> InFlight --success/failure--> Idle
//! Idle --select_history--> Idle
//! any  --set_text / set_voice_description / insert_tag--> same
//! ```
//!
//! Only one synthesis call is ever outstanding; a submit while `InFlight` is
//! rejected, not queued. The state mutex is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::codec::{AudioStore, PlayableResult};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::history::{preview, EntryId, HistoryEntry, HistoryStore};
use crate::synthesis::{DraftRequest, SynthesisBackend, SynthesisClient};
use crate::tags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    InFlight,
}

#[derive(Debug, Default)]
pub struct SessionState {
    pub draft: DraftRequest,
    pub status: Status,
    pub current: Option<PlayableResult>,
    pub history: HistoryStore,
}

struct Inner {
    state: Mutex<SessionState>,
    client: SynthesisClient,
    audio: AudioStore,
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Puts the session back to `Idle` if a submit is abandoned mid-call.
struct InFlightGuard<'a> {
    state: &'a Mutex<SessionState>,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Synthesis call abandoned before completion");
            lock(self.state).status = Status::Idle;
        }
    }
}

/// Cheaply cloneable handle to one session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(client: SynthesisClient, config: &ClientConfig) -> Self {
        let history = match config.history_limit {
            Some(limit) => HistoryStore::with_capacity(limit),
            None => HistoryStore::new(),
        };
        let draft = DraftRequest {
            voice_description: config.voice_description.clone(),
            speed: config.speed,
            ..DraftRequest::default()
        };

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SessionState {
                    draft,
                    history,
                    ..SessionState::default()
                }),
                client,
                audio: AudioStore::new(),
            }),
        }
    }

    /// Session talking HTTP to the configured service.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(SynthesisClient::http(config)?, config))
    }

    pub fn with_backend(backend: Arc<dyn SynthesisBackend>, config: &ClientConfig) -> Self {
        Self::new(SynthesisClient::new(backend), config)
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.inner.state)
    }

    pub fn status(&self) -> Status {
        self.state().status
    }

    pub fn draft(&self) -> DraftRequest {
        self.state().draft.clone()
    }

    pub fn current(&self) -> Option<PlayableResult> {
        self.state().current.clone()
    }

    /// Snapshot of the history, newest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.state().history.list()
    }

    pub fn history_len(&self) -> usize {
        self.state().history.len()
    }

    /// Id of the entry at `index` (0 is the newest).
    pub fn history_id_at(&self, index: usize) -> Option<EntryId> {
        self.state().history.get(index).map(|entry| entry.id)
    }

    pub fn audio(&self) -> &AudioStore {
        &self.inner.audio
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.state().draft.text = text.into();
    }

    pub fn set_voice_description(&self, description: impl Into<String>) {
        self.state().draft.voice_description = description.into();
    }

    /// Append a `<tag>` cue to the draft text and return the new text.
    pub fn insert_tag(&self, tag: &str) -> String {
        let mut state = self.state();
        state.draft.text = tags::insert_tag(&state.draft.text, tag);
        state.draft.text.clone()
    }

    /// Synthesize the current draft.
    ///
    /// On success the result becomes current and is prepended to history.
    /// On failure current and history are untouched. Either way the session
    /// is `Idle` again when this returns.
    pub async fn submit(&self) -> Result<HistoryEntry> {
        let (draft, submitted_at, mut guard) = {
            let mut state = self.state();
            if state.status == Status::InFlight {
                debug!("Submit rejected: request already in flight");
                return Err(Error::Busy);
            }
            if !state.draft.is_submittable() {
                debug!("Submit rejected: empty draft");
                return Err(Error::Validation);
            }
            state.status = Status::InFlight;
            let guard = InFlightGuard {
                state: &self.inner.state,
                armed: true,
            };
            (state.draft.clone(), Utc::now(), guard)
        };

        let result = match self.inner.client.synthesize(&draft).await {
            Ok(outcome) => self
                .inner
                .audio
                .decode(&outcome.audio_base64, outcome.sample_rate)
                .map_err(Error::from),
            Err(e) => Err(e),
        };

        guard.disarm();
        let mut state = self.state();
        state.status = Status::Idle;

        let playable = match result {
            Ok(playable) => playable,
            Err(e) => {
                warn!("Synthesis failed: {}", e);
                return Err(e);
            }
        };

        let entry = HistoryEntry {
            id: state.history.next_id(submitted_at),
            text_preview: preview(&draft.text),
            result: playable.clone(),
            created_at: submitted_at,
        };
        state.current = Some(playable);
        let evicted = state.history.prepend(entry.clone());
        drop(state);

        if let Some(evicted) = evicted {
            debug!("History full, evicted entry {}", evicted.id);
        }
        info!(
            "Synthesis {} ready: {} bytes at {} Hz",
            entry.id,
            entry.result.len(),
            entry.result.sample_rate()
        );
        Ok(entry)
    }

    /// Make a past result current again.
    pub fn select_history(&self, id: EntryId) -> Result<PlayableResult> {
        let mut state = self.state();
        if state.status == Status::InFlight {
            return Err(Error::Busy);
        }
        let result = state
            .history
            .find(id)
            .map(|entry| entry.result.clone())
            .ok_or(Error::NotFound(id))?;
        state.current = Some(result.clone());
        debug!("Selected history entry {}", id);
        Ok(result)
    }
}
