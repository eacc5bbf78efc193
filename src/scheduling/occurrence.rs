use chrono::{Datelike, NaiveDateTime, TimeDelta};

use crate::reminder::Reminder;

/// Cap on the day search in [`next_occurrence`] and on start-up validation. Interval and day
/// combinations that can never land on an enabled day stop here and keep the last candidate.
/// Such a reminder ends up far in the future, past every enabled-day reminder.
pub const MAX_OCCURRENCE_ATTEMPTS: u32 = 100_000;

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;

/// Next candidate occurrence after `from`.
///
/// With no day restriction this is `from + interval`. Otherwise the interval keeps being
/// added until the candidate falls on an enabled weekday or the attempt cap is hit, in which
/// case the last candidate is returned even though it may violate the filter.
/// A non-positive interval returns `from` unchanged.
pub fn next_occurrence(reminder: &Reminder, from: NaiveDateTime) -> NaiveDateTime {
    let interval = reminder.recurrence_interval.delta();
    if interval <= TimeDelta::zero() {
        return from;
    }

    let Some(mut next) = from.checked_add_signed(interval) else {
        return from;
    };

    let days = reminder.enabled_days;
    if days.is_unrestricted() {
        return next;
    }

    if !reaches_enabled_day(reminder, next, interval) {
        // Same candidate the capped search below would settle on.
        let skipped = interval
            .checked_mul(MAX_OCCURRENCE_ATTEMPTS as i32)
            .and_then(|span| next.checked_add_signed(span));
        if let Some(last) = skipped {
            return last;
        }
    }

    let mut attempts = 0;
    while !days.contains(next.weekday()) && attempts < MAX_OCCURRENCE_ATTEMPTS {
        match next.checked_add_signed(interval) {
            Some(candidate) => next = candidate,
            None => break,
        }
        attempts += 1;
    }

    next
}

/// Whether stepping by `interval` from `start` ever lands on an enabled weekday.
///
/// Candidates modulo one week form the offsets `start + k * gcd(interval, week)`. With a
/// step of a day or less every weekday is hit. Otherwise there are fewer than seven offsets
/// to check. Intervals with sub-second parts are assumed to reach one.
fn reaches_enabled_day(reminder: &Reminder, start: NaiveDateTime, interval: TimeDelta) -> bool {
    let seconds = interval.num_seconds();
    if interval != TimeDelta::seconds(seconds) {
        return true;
    }

    let step = gcd(seconds.rem_euclid(SECONDS_PER_WEEK), SECONDS_PER_WEEK);
    if step <= SECONDS_PER_DAY {
        return true;
    }

    (0..SECONDS_PER_WEEK / step).any(|k| {
        start
            .checked_add_signed(TimeDelta::seconds(k * step))
            .is_some_and(|candidate| reminder.enabled_days.contains(candidate.weekday()))
    })
}

fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Rolls `due_date` forward with [`next_occurrence`] until it is strictly after `now`.
///
/// Not capped: however long the gap since the last wake-up, the fired occurrence must end up
/// behind `now`. Stops only when a step no longer moves the date.
pub fn advance_past(reminder: &mut Reminder, now: NaiveDateTime) {
    while reminder.due_date <= now {
        let next = next_occurrence(reminder, reminder.due_date);
        if next <= reminder.due_date {
            break;
        }
        reminder.due_date = next;
    }
}
