use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::appsettings::ReminderDefaults;

pub type ReminderId = Uuid;

/// Step added to a recurring reminder's due date to reach its next candidate occurrence.
///
/// Persisted as whole seconds. A zero or negative interval cannot advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct RecurrenceInterval(TimeDelta);

impl RecurrenceInterval {
    pub fn new(inner: TimeDelta) -> Self {
        Self(inner)
    }

    pub fn from_parts(days: i64, hours: i64, minutes: i64) -> Self {
        let delta = TimeDelta::try_days(days)
            .zip(TimeDelta::try_hours(hours))
            .zip(TimeDelta::try_minutes(minutes))
            .and_then(|((d, h), m)| d.checked_add(&h)?.checked_add(&m))
            .unwrap_or_default();

        Self(delta)
    }

    pub fn delta(&self) -> TimeDelta {
        self.0
    }

    pub fn can_advance(&self) -> bool {
        self.0 > TimeDelta::zero()
    }

    pub fn is_sub_daily(&self) -> bool {
        self.0 < TimeDelta::days(1)
    }
}

impl From<i64> for RecurrenceInterval {
    fn from(seconds: i64) -> Self {
        Self(TimeDelta::try_seconds(seconds).unwrap_or_default())
    }
}

impl From<RecurrenceInterval> for i64 {
    fn from(interval: RecurrenceInterval) -> Self {
        interval.0.num_seconds()
    }
}

/// Weekdays a reminder may fire on. Empty means every day is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct EnabledDays(u8);

impl EnabledDays {
    pub fn new(days: impl IntoIterator<Item = Weekday>) -> Self {
        let mask = days.into_iter().fold(0, |mask, day| mask | Self::bit(day));
        Self(mask)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    /// True when `day` passes the filter, either because it is listed or because nothing is.
    pub fn allows(&self, day: Weekday) -> bool {
        self.is_unrestricted() || self.contains(day)
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        ALL_WEEKDAYS.into_iter().filter(|day| self.contains(*day))
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }
}

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

impl From<Vec<Weekday>> for EnabledDays {
    fn from(days: Vec<Weekday>) -> Self {
        Self::new(days)
    }
}

impl From<EnabledDays> for Vec<Weekday> {
    fn from(days: EnabledDays) -> Self {
        days.iter().collect()
    }
}

/// Presentation payload. Carried through storage untouched, never read by scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderAppearance {
    pub background_color: String,
    pub font_color: String,
    pub font_size: f32,
    pub width: u32,
    pub height: u32,
    pub sound_path: String,
}

impl Default for ReminderAppearance {
    fn default() -> Self {
        ReminderDefaults::default().appearance()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reminder {
    pub id: ReminderId,
    pub title: String,
    pub message: String,
    pub appearance: ReminderAppearance,
    pub is_recurring: bool,
    pub recurrence_interval: RecurrenceInterval,
    pub enabled_days: EnabledDays,
    pub due_date: NaiveDateTime,
    pub is_passed: bool,
}

impl Default for Reminder {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            title: String::new(),
            message: String::new(),
            appearance: ReminderAppearance::default(),
            is_recurring: false,
            recurrence_interval: RecurrenceInterval::default(),
            enabled_days: EnabledDays::default(),
            due_date: DateTime::<Utc>::UNIX_EPOCH.naive_utc(),
            is_passed: false,
        }
    }
}

impl Reminder {
    /// A one-off reminder due `lead_time_minutes` after `now`, styled from `defaults`.
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        defaults: &ReminderDefaults,
        now: NaiveDateTime,
    ) -> Self {
        let lead_time = TimeDelta::try_minutes(defaults.lead_time_minutes).unwrap_or_default();

        Self {
            title: title.into(),
            message: message.into(),
            appearance: defaults.appearance(),
            due_date: now.checked_add_signed(lead_time).unwrap_or(now),
            ..Self::default()
        }
    }

    /// Copy of every field under a fresh id.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }

    /// Recurring, but the interval cannot move the due date anywhere.
    pub fn is_stalled(&self) -> bool {
        self.is_recurring && !self.recurrence_interval.can_advance()
    }
}

impl fmt::Display for Reminder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_passed {
            write!(f, "{} (Passed)", self.title)
        } else {
            write!(f, "{}", self.title)
        }
    }
}
