use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

const MAX_PENDING: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A transient message meant for the person using the app, like a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Pending user-visible notices. Oldest entries are dropped past a fixed backlog.
#[derive(Clone, Default)]
pub struct NoticeService {
    pending: Arc<Mutex<VecDeque<Notice>>>,
}

impl NoticeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Success, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message.into());
    }

    fn push(&self, level: NoticeLevel, message: String) {
        let mut pending = self.pending.lock().expect("notice mutex poisoned");
        if pending.len() == MAX_PENDING {
            pending.pop_front();
        }
        pending.push_back(Notice {
            level,
            message,
            at: Utc::now(),
        });
    }

    /// Removes and returns everything queued so far.
    pub fn drain(&self) -> Vec<Notice> {
        let mut pending = self.pending.lock().expect("notice mutex poisoned");
        pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().expect("notice mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_in_order_and_empties() {
        let notices = NoticeService::new();
        notices.success("Job added");
        notices.error("Failed to delete job");
        let drained = notices.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NoticeLevel::Success);
        assert_eq!(drained[1].message, "Failed to delete job");
        assert!(notices.is_empty());
    }

    #[test]
    fn backlog_is_bounded() {
        let notices = NoticeService::new();
        for i in 0..(MAX_PENDING + 5) {
            notices.info(format!("notice {}", i));
        }
        let drained = notices.drain();
        assert_eq!(drained.len(), MAX_PENDING);
        assert_eq!(drained[0].message, "notice 5");
    }
}
