//! User Notices
//!
//! Boundary to whatever toast system the host UI uses.

use std::cell::RefCell;

use crate::error::{CheckoutError, Severity};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
    /// Needs manual follow-up; hosts keep these on screen until dismissed
    Critical,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn from_error(error: &CheckoutError) -> Self {
        let level = match error.severity() {
            Severity::Info => NoticeLevel::Info,
            Severity::Warning => NoticeLevel::Warning,
            Severity::Error => NoticeLevel::Error,
            Severity::Critical => NoticeLevel::Critical,
        };
        Self { level, message: error.user_message() }
    }
}

pub trait Notifier {
    fn notify(&self, notice: Notice);
}

/// Collects notices in memory (tests, server-side rendering)
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: RefCell<Vec<Notice>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.borrow().last().cloned()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: Notice) {
        tracing::debug!(level = ?notice.level, message = %notice.message, "Notice");
        self.notices.borrow_mut().push(notice);
    }
}
