//! Renewal and trial-ending reminders.
//!
//! Reminders are computed, not delivered: the caller decides how to surface
//! them through its notification sink.

use crate::status::days_until;
use crate::types::{Subscription, SubscriptionId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lead times for reminders, in days.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    pub reminder_days: i64,
    pub trial_reminder_days: i64,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            reminder_days: 3,
            trial_reminder_days: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    /// The paid subscription ends soon.
    Renewal,
    /// The free trial ends soon and billing starts.
    TrialEnding,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: SubscriptionId,
    pub name: String,
    pub amount: Decimal,
    pub kind: ReminderKind,
    pub due_date: NaiveDate,
    pub days_left: i64,
}

impl Reminder {
    fn new(record: &Subscription, kind: ReminderKind, due_date: NaiveDate, days_left: i64) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            amount: record.amount,
            kind,
            due_date,
            days_left,
        }
    }

    /// Short user-facing text.
    pub fn message(&self) -> String {
        let when = match self.days_left {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            n => format!("in {n} days"),
        };
        match self.kind {
            ReminderKind::Renewal => {
                format!("{} ({}) renews {}", self.name, self.amount, when)
            }
            ReminderKind::TrialEnding => format!(
                "Free trial of {} ends {}; {} will be charged afterwards",
                self.name, when, self.amount
            ),
        }
    }
}

/// Reminders due today for active records, most urgent first.
pub fn due_reminders(
    records: &[Subscription],
    today: NaiveDate,
    settings: &ReminderSettings,
) -> Vec<Reminder> {
    let mut reminders = Vec::new();

    for record in records.iter().filter(|r| r.is_active) {
        if let Some(trial_end) = record.free_trial_end_date {
            let days_left = days_until(trial_end, today);
            if (0..=settings.trial_reminder_days).contains(&days_left) {
                reminders.push(Reminder::new(record, ReminderKind::TrialEnding, trial_end, days_left));
            }
        }

        if let Some(end) = record.end_date {
            let days_left = days_until(end, today);
            if (0..=settings.reminder_days).contains(&days_left) {
                reminders.push(Reminder::new(record, ReminderKind::Renewal, end, days_left));
            }
        }
    }

    reminders.sort_by_key(|r| r.days_left);
    reminders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryId, SubscriptionInput};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(id: u64, end: Option<NaiveDate>, trial: Option<NaiveDate>) -> Subscription {
        let mut input = SubscriptionInput::new(
            format!("s{id}"),
            Decimal::from(100),
            date(2023, 1, 1),
            CategoryId(1),
        );
        input.end_date = end;
        input.free_trial_end_date = trial;
        Subscription::from_input(SubscriptionId(id), input)
    }

    #[test]
    fn test_reminder_windows() {
        let today = date(2023, 11, 25);
        let records = vec![
            record(1, Some(date(2023, 11, 28)), None), // renewal in 3
            record(2, Some(date(2023, 11, 29)), None), // too far
            record(3, None, Some(date(2023, 11, 26))), // trial tomorrow
            record(4, None, Some(date(2023, 11, 27))), // trial too far
            record(5, Some(date(2023, 11, 24)), None), // already passed
        ];

        let reminders = due_reminders(&records, today, &ReminderSettings::default());
        let got: Vec<_> = reminders.iter().map(|r| (r.id.0, r.kind, r.days_left)).collect();
        assert_eq!(
            got,
            vec![(3, ReminderKind::TrialEnding, 1), (1, ReminderKind::Renewal, 3)]
        );
    }

    #[test]
    fn test_inactive_skipped_and_both_kinds() {
        let today = date(2023, 11, 25);
        let mut inactive = record(1, Some(today), None);
        inactive.is_active = false;
        let both = record(2, Some(today), Some(today));

        let reminders = due_reminders(&[inactive, both], today, &ReminderSettings::default());
        assert_eq!(reminders.len(), 2);
        assert!(reminders.iter().all(|r| r.id == SubscriptionId(2)));
    }

    #[test]
    fn test_message() {
        let today = date(2023, 11, 25);
        let reminders = due_reminders(
            &[record(1, None, Some(today))],
            today,
            &ReminderSettings::default(),
        );
        assert_eq!(
            reminders[0].message(),
            "Free trial of s1 ends today; 100 will be charged afterwards"
        );
    }
}
