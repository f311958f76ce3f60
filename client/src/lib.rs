//! Maya Studio
//!
//! Client-side session for the Maya1 text-to-speech service: draft a text
//! with expressive `<tag>` cues and a voice description, synthesize it, play
//! the result and browse earlier generations.

pub mod audio;
pub mod codec;
pub mod config;
pub mod error;
pub mod history;
pub mod repl;
pub mod session;
pub mod synthesis;
pub mod tags;

pub use codec::{AudioStore, PlayableResult, ResourceHandle};
pub use config::ClientConfig;
pub use error::{CodecError, Error, Result, TransportError};
pub use history::{EntryId, HistoryEntry, HistoryStore};
pub use session::{SessionController, Status};
pub use synthesis::{DraftRequest, HttpBackend, SynthesisBackend, SynthesisClient, SynthesisOutcome};
