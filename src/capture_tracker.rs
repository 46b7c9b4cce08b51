//! Per-chat capture tokens so that only the latest recipe capture can land.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use teloxide::types::ChatId;

/// Identifies one capture request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureToken(u64);

/// Tracks the current capture token of every chat
#[derive(Debug, Default)]
pub struct CaptureTracker {
    next: AtomicU64,
    current: Mutex<HashMap<ChatId, CaptureToken>>,
}

impl CaptureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a capture, invalidating any earlier one for the chat
    pub fn begin(&self, chat_id: ChatId) -> CaptureToken {
        let token = CaptureToken(self.next.fetch_add(1, Ordering::Relaxed) + 1);
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(chat_id, token);
        token
    }

    pub fn is_current(&self, chat_id: ChatId, token: CaptureToken) -> bool {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&chat_id)
            == Some(&token)
    }

    /// Finish a capture; returns `false` when the token is stale and the result must be dropped
    pub fn finish(&self, chat_id: ChatId, token: CaptureToken) -> bool {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if current.get(&chat_id) == Some(&token) {
            current.remove(&chat_id);
            true
        } else {
            false
        }
    }

    /// Invalidate the pending capture of a chat, if any
    pub fn cancel(&self, chat_id: ChatId) {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_capture_invalidates_older() {
        let tracker = CaptureTracker::new();
        let chat = ChatId(42);
        let first = tracker.begin(chat);
        let second = tracker.begin(chat);

        assert!(!tracker.is_current(chat, first));
        assert!(!tracker.finish(chat, first));
        assert!(tracker.finish(chat, second));
        assert!(!tracker.is_current(chat, second));
    }

    #[test]
    fn test_chats_are_independent() {
        let tracker = CaptureTracker::new();
        let a = tracker.begin(ChatId(1));
        let b = tracker.begin(ChatId(2));
        assert!(tracker.finish(ChatId(1), a));
        assert!(tracker.finish(ChatId(2), b));
    }

    #[test]
    fn test_cancel_drops_pending_capture() {
        let tracker = CaptureTracker::new();
        let token = tracker.begin(ChatId(5));
        tracker.cancel(ChatId(5));
        assert!(!tracker.finish(ChatId(5), token));
    }
}
