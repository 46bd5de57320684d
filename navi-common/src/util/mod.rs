pub mod discord;
pub mod rate_tracker;
pub mod regex;

/// Formats a duration as a whole number of seconds, rounding any partial second up.
pub fn ceil_secs(duration: std::time::Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}
