//! Per-visitor conversation history kept by the backend.
//!
//! A visitor is identified by the `ask_session` cookie. The browser sends it
//! with every same-origin `fetch`, so the widget needs no changes to carry
//! context between questions. Only the most recent [`HISTORY_WINDOW`] turns
//! are kept, and conversations idle for longer than the store's timeout are
//! dropped.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use uuid::Uuid;

/// Name of the cookie carrying the visitor's session id.
pub const SESSION_COOKIE: &str = "ask_session";

/// Number of previous turns fed back into the prompt.
pub const HISTORY_WINDOW: usize = 10;

/// Default idle timeout (30 minutes).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

impl Turn {
    #[must_use]
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

#[derive(Debug)]
struct Conversation {
    turns: VecDeque<Turn>,
    last_activity: Instant,
}

impl Conversation {
    fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_activity) > timeout
    }
}

/// Thread-safe store of conversations keyed by session id.
///
/// Cloning yields another handle to the same store.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    inner: Arc<HistoryStoreInner>,
}

#[derive(Debug)]
struct HistoryStoreInner {
    conversations: RwLock<HashMap<String, Conversation>>,
    idle_timeout: Duration,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    /// Create a store with the default idle timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }

    /// Create a store that forgets conversations idle for longer than `idle_timeout`.
    #[must_use]
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(HistoryStoreInner {
                conversations: RwLock::new(HashMap::new()),
                idle_timeout,
            }),
        }
    }

    /// Generate a fresh session id.
    #[must_use]
    pub fn new_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// The most recent turns of a conversation, oldest first.
    ///
    /// Unknown and idle sessions have no history.
    #[must_use]
    pub fn recent(&self, session_id: &str) -> Vec<Turn> {
        let guard = self
            .inner
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.get(session_id) {
            Some(conv) if !conv.is_idle(Instant::now(), self.inner.idle_timeout) => {
                conv.turns.iter().cloned().collect()
            }
            _ => Vec::new(),
        }
    }

    /// Append a turn to a conversation, starting it if needed.
    pub fn record(&self, session_id: &str, turn: Turn) {
        let now = Instant::now();
        let timeout = self.inner.idle_timeout;
        let mut guard = self
            .inner
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        guard.retain(|id, conv| id == session_id || !conv.is_idle(now, timeout));

        let conv = guard
            .entry(session_id.to_string())
            .or_insert_with(|| Conversation {
                turns: VecDeque::with_capacity(HISTORY_WINDOW),
                last_activity: now,
            });
        if conv.is_idle(now, timeout) {
            conv.turns.clear();
        }
        conv.turns.push_back(turn);
        while conv.turns.len() > HISTORY_WINDOW {
            conv.turns.pop_front();
        }
        conv.last_activity = now;
    }

    /// Forget a conversation. Returns whether one existed.
    pub fn clear(&self, session_id: &str) -> bool {
        self.inner
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id)
            .is_some()
    }

    /// Number of stored conversations, idle ones included until pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_recent() {
        let store = HistoryStore::new();
        store.record("a", Turn::new("Hello", "Hi there"));
        store.record("a", Turn::new("How are you?", "Fine"));

        assert_eq!(
            store.recent("a"),
            vec![Turn::new("Hello", "Hi there"), Turn::new("How are you?", "Fine")]
        );
        assert!(store.recent("b").is_empty());
    }

    #[test]
    fn test_window_keeps_latest_turns() {
        let store = HistoryStore::new();
        for i in 0..HISTORY_WINDOW + 3 {
            store.record("a", Turn::new(format!("q{i}"), format!("a{i}")));
        }

        let recent = store.recent("a");
        assert_eq!(recent.len(), HISTORY_WINDOW);
        assert_eq!(recent[0].question, "q3");
        assert_eq!(recent[HISTORY_WINDOW - 1].question, "q12");
    }

    #[test]
    fn test_clear_forgets_one_session() {
        let store = HistoryStore::new();
        store.record("a", Turn::new("Hello", "Hi"));
        store.record("b", Turn::new("Hey", "Yo"));

        assert!(store.clear("a"));
        assert!(!store.clear("a"));
        assert!(store.recent("a").is_empty());
        assert_eq!(store.recent("b").len(), 1);
    }

    #[test]
    fn test_idle_sessions_are_forgotten() {
        let store = HistoryStore::with_idle_timeout(Duration::from_millis(1));
        store.record("stale", Turn::new("Hello", "Hi"));
        std::thread::sleep(Duration::from_millis(20));

        assert!(store.recent("stale").is_empty());

        store.record("fresh", Turn::new("Hey", "Yo"));
        assert_eq!(store.len(), 1);

        store.record("stale", Turn::new("Again", "Back"));
        assert_eq!(store.recent("stale"), vec![Turn::new("Again", "Back")]);
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(HistoryStore::new_session_id(), HistoryStore::new_session_id());
    }

    #[test]
    fn test_handles_share_state() {
        let store = HistoryStore::new();
        let alias = store.clone();
        store.record("a", Turn::new("Hello", "Hi"));
        assert_eq!(alias.recent("a").len(), 1);
    }
}
