mod catch_up;
mod manager;
mod occurrence;
mod timer;

pub use catch_up::{ensure_valid_next_occurrence, reconcile};
pub use manager::ReminderManager;
pub use occurrence::{MAX_OCCURRENCE_ATTEMPTS, advance_past, next_occurrence};
pub use timer::WakeupTimer;
