//! Conversation-state storage, keyed by external chat id.
//!
//! The trait exists so a multi-process deployment can swap the in-process
//! map for a shared store; nothing in the driver assumes memory locality.
//! There is no expiry: an abandoned dialogue keeps its entry until the
//! process restarts.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::state::Step;

pub trait ConversationStore: Send + Sync {
    fn get(&self, chat_id: i64) -> Option<Step>;
    fn set(&self, chat_id: i64, step: Step);
    fn clear(&self, chat_id: i64);
}

/// In-memory store, the single-process default.
#[derive(Default)]
pub struct MemoryStore {
    steps: Mutex<HashMap<i64, Step>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryStore {
    // A poisoned lock just means another handler panicked mid-insert; the
    // map itself is still usable.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i64, Step>> {
        self.steps.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ConversationStore for MemoryStore {
    fn get(&self, chat_id: i64) -> Option<Step> {
        self.lock().get(&chat_id).cloned()
    }

    fn set(&self, chat_id: i64, step: Step) {
        self.lock().insert(chat_id, step);
    }

    fn clear(&self, chat_id: i64) {
        self.lock().remove(&chat_id);
    }
}
