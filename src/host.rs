//! Collaborators supplied by the host application.
//!
//! The tracker never reads the wall clock, the user's entitlement or a UI
//! directly; all three come in through these traits.

use chrono::{Days, Local, NaiveDate};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

/// Source of "today".
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The current user as reported by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub display_name: String,
    pub is_premium: bool,
}

pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> UserIdentity;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
    Upsell,
}

/// A message to show to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: Option<String>,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: None,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: None,
            message: message.into(),
        }
    }

    pub fn upsell(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Upsell,
            title: Some(title.into()),
            message: message.into(),
        }
    }
}

/// Where user-facing messages and confirmation prompts go.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);

    /// Ask a yes/no question. Returning false aborts the action.
    fn confirm(&self, prompt: &str) -> bool;
}

// --- Implementations ---

/// Local calendar date from the system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    today: RwLock<NaiveDate>,
}

impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: RwLock::new(today),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        *self.today.write() = today;
    }

    /// Move forward by whole days. Does nothing past the last representable date.
    pub fn advance(&self, days: u64) {
        let mut today = self.today.write();
        if let Some(next) = today.checked_add_days(Days::new(days)) {
            *today = next;
        }
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        *self.today.read()
    }
}

/// Fixed identity, for hosts that resolve the user once per session.
#[derive(Clone, Debug)]
pub struct StaticIdentity(pub UserIdentity);

impl StaticIdentity {
    pub fn free(display_name: impl Into<String>) -> Self {
        Self(UserIdentity {
            display_name: display_name.into(),
            is_premium: false,
        })
    }

    pub fn premium(display_name: impl Into<String>) -> Self {
        Self(UserIdentity {
            display_name: display_name.into(),
            is_premium: true,
        })
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> UserIdentity {
        self.0.clone()
    }
}

/// Sink that keeps notices in memory and answers prompts with a fixed reply.
#[derive(Debug)]
pub struct MemorySink {
    notices: Mutex<Vec<Notice>>,
    prompts: Mutex<Vec<String>>,
    answer: RwLock<bool>,
}

impl MemorySink {
    /// A sink that confirms every prompt.
    pub fn new() -> Self {
        Self::answering(true)
    }

    pub fn answering(answer: bool) -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            answer: RwLock::new(answer),
        }
    }

    pub fn set_answer(&self, answer: bool) {
        *self.answer.write() = answer;
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().last().cloned()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }

    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().push(prompt.to_string());
        *self.answer.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(NaiveDate::from_ymd_opt(2023, 12, 30).unwrap());
        clock.advance(3);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());

        clock.set(NaiveDate::from_ymd_opt(2023, 11, 25).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2023, 11, 25).unwrap());
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::answering(false);
        sink.notify(Notice::success("saved"));
        assert!(!sink.confirm("delete?"));
        sink.set_answer(true);
        assert!(sink.confirm("really?"));

        assert_eq!(sink.last(), Some(Notice::success("saved")));
        assert_eq!(sink.prompts(), vec!["delete?".to_string(), "really?".to_string()]);
    }

    #[test]
    fn test_static_identity() {
        assert!(StaticIdentity::premium("Ann").current_user().is_premium);
        assert!(!StaticIdentity::free("Bob").current_user().is_premium);
    }
}
