//! Audio payload decoding and the in-memory store of playable resources.
//!
//! A decoded payload lives in an [`AudioStore`] under a generated
//! [`ResourceHandle`]. The store only keeps weak references: the bytes are
//! owned by the [`PlayableResult`] clones held in the current slot and in
//! history entries, and the handle is released when the last clone drops.

use std::collections::HashMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{Cursor, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use tracing::debug;

use maya_protocol::WAV_MEDIA_TYPE;

use crate::error::CodecError;

/// Opaque, dereferenceable handle to decoded audio bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHandle(String);

impl ResourceHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type Registry = Mutex<HashMap<ResourceHandle, Weak<AudioData>>>;

fn lock(registry: &Registry) -> MutexGuard<'_, HashMap<ResourceHandle, Weak<AudioData>>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

struct AudioData {
    handle: ResourceHandle,
    bytes: Vec<u8>,
    sample_rate: u32,
    registry: Weak<Registry>,
}

impl Drop for AudioData {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).remove(&self.handle);
            debug!("Released audio resource {}", self.handle);
        }
    }
}

/// Decoded audio ready for playback or export.
///
/// Cloning is cheap and shares the underlying bytes.
#[derive(Clone)]
pub struct PlayableResult {
    data: Arc<AudioData>,
}

impl PlayableResult {
    pub fn handle(&self) -> &ResourceHandle {
        &self.data.handle
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data.bytes
    }

    pub fn len(&self) -> usize {
        self.data.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.bytes.is_empty()
    }

    /// Sample rate reported by the synthesis service
    pub fn sample_rate(&self) -> u32 {
        self.data.sample_rate
    }

    pub fn media_type(&self) -> &'static str {
        WAV_MEDIA_TYPE
    }

    /// Playback length read from the WAV header, if the bytes parse as WAV.
    pub fn duration(&self) -> Option<Duration> {
        let reader = hound::WavReader::new(Cursor::new(self.bytes())).ok()?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return None;
        }
        Some(Duration::from_secs_f64(
            reader.duration() as f64 / spec.sample_rate as f64,
        ))
    }

    /// Write the audio into `dir` under the default export filename.
    ///
    /// Never overwrites: if the name is taken, the timestamp is bumped until
    /// a free one is found.
    pub fn export(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let path = dir.join(export_filename(millis));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(self.bytes())?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("{} exists, trying the next timestamp", path.display());
                    millis += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Whether both results refer to the same decoded resource.
    pub fn same_resource(&self, other: &PlayableResult) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for PlayableResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayableResult")
            .field("handle", &self.data.handle)
            .field("len", &self.data.bytes.len())
            .field("sample_rate", &self.data.sample_rate)
            .finish()
    }
}

impl PartialEq for PlayableResult {
    fn eq(&self, other: &Self) -> bool {
        self.same_resource(other)
    }
}

/// Default export filename: `maya1-synthesis-<unix millis>.wav`
pub fn export_filename(timestamp_millis: i64) -> String {
    format!("maya1-synthesis-{timestamp_millis}.wav")
}

/// Registry mapping handles to live decoded audio.
#[derive(Clone, Default)]
pub struct AudioStore {
    registry: Arc<Registry>,
    next_id: Arc<AtomicU64>,
}

impl AudioStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a base64 WAV payload and register it.
    pub fn decode(&self, payload: &str, sample_rate: u32) -> Result<PlayableResult, CodecError> {
        let bytes = STANDARD.decode(payload.trim())?;
        if bytes.is_empty() {
            return Err(CodecError::Empty);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = ResourceHandle(format!("maya-audio:{id}"));
        let data = Arc::new(AudioData {
            handle: handle.clone(),
            bytes,
            sample_rate,
            registry: Arc::downgrade(&self.registry),
        });

        lock(&self.registry).insert(handle, Arc::downgrade(&data));
        debug!("Registered audio resource {} ({} bytes)", data.handle, data.bytes.len());

        Ok(PlayableResult { data })
    }

    /// Look a handle up. `None` once the resource has been released.
    pub fn resolve(&self, handle: &ResourceHandle) -> Option<PlayableResult> {
        lock(&self.registry)
            .get(handle)
            .and_then(Weak::upgrade)
            .map(|data| PlayableResult { data })
    }

    /// Number of resources still reachable from some result.
    pub fn live_count(&self) -> usize {
        lock(&self.registry)
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use maya_protocol::{BITS_PER_SAMPLE, CHANNELS, SAMPLE_RATE};

    /// Minimal PCM WAV in the engine's format: 44-byte header followed by
    /// `data_len` bytes.
    fn wav_bytes(data_len: u32) -> Vec<u8> {
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
        wav.resize(44 + data_len as usize, 0);
        wav
    }

    #[test]
    fn decoded_length_matches_header_plus_samples() {
        let store = AudioStore::new();
        for n in [0u32, 2, 56, 4800] {
            let payload = STANDARD.encode(wav_bytes(n));
            let result = store.decode(&payload, SAMPLE_RATE).unwrap();
            assert_eq!(result.len(), 44 + n as usize);
            assert_eq!(result.media_type(), "audio/wav");
        }
    }

    #[test]
    fn invalid_base64_is_a_codec_error() {
        let store = AudioStore::new();
        let err = store.decode("not base64 at all!", SAMPLE_RATE).unwrap_err();
        assert!(matches!(err, CodecError::InvalidBase64(_)));
    }

    #[test]
    fn empty_payload_is_a_codec_error() {
        let store = AudioStore::new();
        assert!(matches!(store.decode("", SAMPLE_RATE), Err(CodecError::Empty)));
    }

    #[test]
    fn duration_comes_from_wav_header() {
        let store = AudioStore::new();
        let one_second = SAMPLE_RATE * u32::from(CHANNELS * BITS_PER_SAMPLE / 8);
        let payload = STANDARD.encode(wav_bytes(one_second));
        let result = store.decode(&payload, SAMPLE_RATE).unwrap();
        assert_eq!(result.duration(), Some(Duration::from_secs(1)));

        let garbage = store.decode(&STANDARD.encode(b"hello"), SAMPLE_RATE).unwrap();
        assert_eq!(garbage.duration(), None);
    }

    #[test]
    fn handle_resolves_until_last_clone_drops() {
        let store = AudioStore::new();
        let result = store
            .decode(&STANDARD.encode(wav_bytes(10)), SAMPLE_RATE)
            .unwrap();
        let handle = result.handle().clone();
        let clone = result.clone();

        let resolved = store.resolve(&handle).unwrap();
        assert!(resolved.same_resource(&result));
        drop(resolved);
        assert_eq!(store.live_count(), 1);

        drop(result);
        assert!(store.resolve(&handle).is_some());

        drop(clone);
        assert!(store.resolve(&handle).is_none());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn handles_are_distinct() {
        let store = AudioStore::new();
        let payload = STANDARD.encode(wav_bytes(4));
        let a = store.decode(&payload, SAMPLE_RATE).unwrap();
        let b = store.decode(&payload, SAMPLE_RATE).unwrap();
        assert_ne!(a.handle(), b.handle());
        assert_ne!(a, b);
    }

    #[test]
    fn export_uses_default_filename() {
        assert_eq!(export_filename(1700000000123), "maya1-synthesis-1700000000123.wav");

        let dir = tempfile::tempdir().unwrap();
        let store = AudioStore::new();
        let wav = wav_bytes(20);
        let result = store.decode(&STANDARD.encode(&wav), SAMPLE_RATE).unwrap();

        let path = result.export(dir.path()).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("maya1-synthesis-"));
        assert!(name.ends_with(".wav"));
        assert_eq!(std::fs::read(&path).unwrap(), wav);
    }

    #[test]
    fn back_to_back_exports_never_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = AudioStore::new();
        let first = store.decode(&STANDARD.encode(wav_bytes(8)), SAMPLE_RATE).unwrap();
        let second = store.decode(&STANDARD.encode(wav_bytes(16)), SAMPLE_RATE).unwrap();

        let a = first.export(dir.path()).unwrap();
        let b = second.export(dir.path()).unwrap();
        let c = first.export(dir.path()).unwrap();

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
        assert_eq!(std::fs::read(&a).unwrap(), first.bytes());
        assert_eq!(std::fs::read(&b).unwrap(), second.bytes());
    }

    #[test]
    fn export_skips_a_name_already_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = AudioStore::new();
        let result = store.decode(&STANDARD.encode(wav_bytes(4)), SAMPLE_RATE).unwrap();

        // Occupy the next few names so the first candidate is certainly taken.
        let now = Utc::now().timestamp_millis();
        for millis in now..now + 50 {
            std::fs::write(dir.path().join(export_filename(millis)), b"keep").unwrap();
        }

        let path = result.export(dir.path()).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), result.bytes());
        for millis in now..now + 50 {
            assert_eq!(std::fs::read(dir.path().join(export_filename(millis))).unwrap(), b"keep");
        }
    }
}
