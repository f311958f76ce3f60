//! Newest-first record of past synthesis results.

use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::codec::PlayableResult;

/// Number of characters kept in an entry's text preview.
pub const PREVIEW_CHARS: usize = 50;

const ELLIPSIS: &str = "...";

/// Identity of a history entry: submission time in Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(i64);

impl EntryId {
    pub fn as_millis(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(EntryId)
    }
}

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: EntryId,
    pub text_preview: String,
    pub result: PlayableResult,
    pub created_at: DateTime<Utc>,
}

/// Truncate `text` to [`PREVIEW_CHARS`] characters, marking the cut with `...`.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

#[derive(Debug, Default)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    capacity: Option<NonZeroUsize>,
    last_id: Option<EntryId>,
}

impl HistoryStore {
    /// Unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding at most `capacity` entries, dropping the oldest first.
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    pub fn capacity(&self) -> Option<NonZeroUsize> {
        self.capacity
    }

    /// Id for a submission made at `submitted_at`, strictly greater than any
    /// id handed out before.
    pub fn next_id(&mut self, submitted_at: DateTime<Utc>) -> EntryId {
        let millis = submitted_at.timestamp_millis();
        let id = match self.last_id {
            Some(last) if last.0 >= millis => EntryId(last.0 + 1),
            _ => EntryId(millis),
        };
        self.last_id = Some(id);
        id
    }

    /// Insert at the head. Returns the evicted oldest entry when the store
    /// was full; dropping it releases its audio.
    pub fn prepend(&mut self, entry: HistoryEntry) -> Option<HistoryEntry> {
        self.entries.push_front(entry);
        match self.capacity {
            Some(cap) if self.entries.len() > cap.get() => self.entries.pop_back(),
            _ => None,
        }
    }

    /// Snapshot of all entries, newest first.
    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn find(&self, id: EntryId) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Entry at `index`, 0 being the newest.
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
