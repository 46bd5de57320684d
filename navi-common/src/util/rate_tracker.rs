use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Struct to allow the tracking of how frequently something happens over a time period.
///
/// For example, can be used to determine how frequently a command is ran, or the rate of
/// messages being received.
pub struct RateTracker {
    tracking_length: Duration,
    samples: VecDeque<Instant>,
}
impl RateTracker {
    pub fn new(tracking_length: Duration) -> RateTracker {
        RateTracker {
            tracking_length,
            samples: VecDeque::new(),
        }
    }

    fn remove_expired(&mut self, now: Instant) {
        while let Some(oldest) = self.samples.front() {
            if now.duration_since(*oldest) > self.tracking_length {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn add_sample(&mut self) {
        let now = Instant::now();
        self.remove_expired(now);
        self.samples.push_back(now);
    }

    /// Number of samples recorded within the tracking length.
    pub fn get_rate(&self) -> usize {
        let now = Instant::now();
        self.samples
            .iter()
            .filter(|sample| now.duration_since(**sample) <= self.tracking_length)
            .count()
    }
}
