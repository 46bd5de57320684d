pub mod config;
pub mod locale;
pub mod macros;
pub mod metrics_handler;
pub mod util;

use time::macros::format_description;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the filter passed in (normally `logging.filter` from
/// config.toml). Calling this more than once is harmless.
pub fn tracing_init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let timer = UtcTime::new(format_description!("[hour]:[minute]:[second]"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;
    use std::time::Duration;

    use self::util::rate_tracker::RateTracker;

    use super::*;

    #[test]
    fn rate_tracker_counts_samples_in_window() {
        let mut tracker = RateTracker::new(Duration::from_secs(60));
        tracker.add_sample();
        tracker.add_sample();
        tracker.add_sample();
        assert_eq!(tracker.get_rate(), 3);
    }

    #[test]
    fn rate_tracker_drops_old_samples() {
        let mut tracker = RateTracker::new(Duration::from_secs_f32(0.3));
        tracker.add_sample();
        tracker.add_sample();
        sleep(Duration::from_millis(350));
        tracker.add_sample();
        assert_eq!(tracker.get_rate(), 1);
    }

    #[test]
    fn rate_tracker_none() {
        let tracker = RateTracker::new(Duration::from_secs_f32(0.3));
        assert_eq!(tracker.get_rate(), 0);
    }
}
