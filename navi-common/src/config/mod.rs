#[allow(clippy::module_inception)]
pub mod config;

static CONFIG_LOCATION: &str = "./config.toml";

use lazy_static::lazy_static;

pub use crate::config::config::NaviConfig;

lazy_static! {
    /// Configuration for binaries, read from `./config.toml`. A missing or unreadable file yields
    /// the defaults; see [`config_source`] to find out which happened.
    pub static ref CONFIG: NaviConfig = NaviConfig::load(CONFIG_LOCATION).unwrap_or_default();
}

/// Describes where [`CONFIG`] came from, for startup logging.
pub fn config_source() -> String {
    match NaviConfig::load(CONFIG_LOCATION) {
        Ok(_) => format!("loaded {CONFIG_LOCATION}"),
        Err(e) => format!("using defaults ({e:#})"),
    }
}
