use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// (chat_id, message_id) of the transcript message.
pub type TranscriptKey = (i64, i64);

/// Bounded in-memory map from transcript message to raw transcript.
///
/// Oldest entries are evicted first once `capacity` is reached.
pub struct TranscriptStore {
    capacity: usize,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<TranscriptKey, String>,
    order: VecDeque<TranscriptKey>,
}

impl TranscriptStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn insert(&self, key: TranscriptKey, transcript: String) {
        let mut inner = self.lock();
        if inner.entries.insert(key, transcript).is_some() {
            return;
        }
        inner.order.push_back(key);
        while inner.order.len() > self.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.entries.remove(&evicted);
            }
        }
    }

    pub fn get(&self, key: TranscriptKey) -> Option<String> {
        self.lock().entries.get(&key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Entries are plain strings, so a panic mid-insert leaves nothing half-written.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
