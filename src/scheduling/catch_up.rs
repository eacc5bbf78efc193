use chrono::{Datelike, NaiveDateTime};

use crate::reminder::Reminder;

use super::occurrence::{MAX_OCCURRENCE_ATTEMPTS, next_occurrence};

/// Brings every reminder to a valid state relative to `now`.
///
/// Returns snapshots (taken before adjustment) of the reminders whose missed occurrence
/// should fire right away: one-offs, and recurring reminders stepping a day or more.
/// Recurring reminders with shorter intervals are fast-forwarded silently.
/// Calling this again with the same `now` changes nothing and reports nothing.
pub fn reconcile(reminders: &mut [Reminder], now: NaiveDateTime) -> Vec<Reminder> {
    let mut due_now = Vec::new();

    for reminder in reminders.iter_mut() {
        if reminder.due_date <= now && !reminder.is_passed {
            let fires_retroactively =
                !reminder.is_recurring || !reminder.recurrence_interval.is_sub_daily();

            if fires_retroactively {
                due_now.push(reminder.clone());
            } else {
                log::debug!(
                    "Skipping missed sub-daily occurrence. [reminder_id = {}, due_date = {}]",
                    reminder.id,
                    reminder.due_date
                );
            }
        }

        ensure_valid_next_occurrence(reminder, now);
    }

    due_now
}

/// Moves a recurring reminder's due date to its first occurrence after `now` on an enabled
/// day, and sets `is_passed` for one-offs. Never emits anything.
pub fn ensure_valid_next_occurrence(reminder: &mut Reminder, now: NaiveDateTime) {
    if !reminder.is_recurring {
        reminder.is_passed = reminder.due_date <= now;
        return;
    }

    reminder.is_passed = false;
    if !reminder.recurrence_interval.can_advance() {
        return;
    }

    let mut attempts = 0;
    while attempts < MAX_OCCURRENCE_ATTEMPTS {
        let is_past = reminder.due_date <= now;
        let is_day_disabled = !reminder.enabled_days.allows(reminder.due_date.weekday());
        if !is_past && !is_day_disabled {
            break;
        }

        let next = next_occurrence(reminder, reminder.due_date);
        if next <= reminder.due_date {
            break;
        }
        reminder.due_date = next;
        attempts += 1;
    }
}
