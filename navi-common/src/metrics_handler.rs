use std::sync::Mutex;
use std::time::Duration;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::util::rate_tracker::RateTracker;

/// Handler for general metrics, including rate trackers and Prometheus metrics.
///
/// Each handler owns its own registry, so several engines can live in one process.
pub struct MetricsHandler {
    registry: Registry,
    pub messages: IntCounter,
    pub middleware_aborts: IntCounter,
    pub commands: IntCounterVec,
    pub gate_rejections: IntCounterVec,
    pub handler_faults: IntCounter,
    pub commands_rate_tracker: Mutex<RateTracker>,
}
impl MetricsHandler {
    pub fn new() -> anyhow::Result<MetricsHandler> {
        let registry = Registry::new();

        let messages = IntCounter::new("messages", "Total number of inbound messages")?;
        let middleware_aborts = IntCounter::new("middleware_aborts", "Messages dropped by middleware")?;
        let commands = IntCounterVec::new(Opts::new("commands", "Commands dispatched"), &["command"])?;
        let gate_rejections = IntCounterVec::new(
            Opts::new("gate_rejections", "Invocations rejected by permission or cooldown checks"),
            &["reason"],
        )?;
        let handler_faults = IntCounter::new("handler_faults", "Unexpected command handler failures")?;

        registry.register(Box::new(messages.clone()))?;
        registry.register(Box::new(middleware_aborts.clone()))?;
        registry.register(Box::new(commands.clone()))?;
        registry.register(Box::new(gate_rejections.clone()))?;
        registry.register(Box::new(handler_faults.clone()))?;

        Ok(MetricsHandler {
            registry,
            messages,
            middleware_aborts,
            commands,
            gate_rejections,
            handler_faults,
            commands_rate_tracker: Mutex::new(RateTracker::new(Duration::from_secs(60))),
        })
    }

    pub fn add_message(&self) {
        self.messages.inc();
    }

    pub fn add_middleware_abort(&self) {
        self.middleware_aborts.inc();
    }

    pub fn add_command(&self, command_name: &str) {
        self.commands.with_label_values(&[command_name]).inc();
        self.commands_rate_tracker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .add_sample();
    }

    pub fn get_commands_rate(&self) -> usize {
        self.commands_rate_tracker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_rate()
    }

    pub fn add_gate_rejection(&self, reason: &str) {
        self.gate_rejections.with_label_values(&[reason]).inc();
    }

    pub fn add_handler_fault(&self) {
        self.handler_faults.inc();
    }

    /// Renders every metric in the Prometheus text format.
    pub fn gather(&self) -> anyhow::Result<String> {
        let mut buffer = vec![];
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handlers_do_not_share_registries() {
        let first = MetricsHandler::new().unwrap();
        let second = MetricsHandler::new().unwrap();

        first.add_command("ping");
        first.add_command("ping");
        second.add_handler_fault();

        assert_eq!(first.commands.with_label_values(&["ping"]).get(), 2);
        assert_eq!(second.commands.with_label_values(&["ping"]).get(), 0);
        assert_eq!(first.get_commands_rate(), 2);
        assert!(second.gather().unwrap().contains("handler_faults 1"));
    }
}
