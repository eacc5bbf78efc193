pub mod appsettings;
pub mod clock;
pub mod delivery;
pub mod reminder;
pub mod scheduling;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_utils;
