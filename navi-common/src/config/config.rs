// See config.toml for information on the variables here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct NaviConfig {
    pub bot: Bot,
    pub dev: DevAttributes,
    pub interaction: Interaction,
    pub locale: LocaleConfig,
    pub logging: Logging,
}
impl NaviConfig {
    pub fn from_toml(source: &str) -> anyhow::Result<NaviConfig> {
        toml::from_str(source).context("failed to parse config")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<NaviConfig> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&source)
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Bot {
    /// Prefix used in guilds that have not set their own.
    pub default_prefix: String,
    /// Users that bypass every permission and cooldown check.
    pub admin_users: Vec<u64>,
}
impl Default for Bot {
    fn default() -> Self {
        Self {
            default_prefix: "n!".to_owned(),
            admin_users: vec![],
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct DevAttributes {
    /// When set, this is the only accepted prefix, everywhere.
    pub prefix_override: Option<String>,
    pub disable_mention_prefix: bool,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Interaction {
    /// How long a dialog or selection waits for each answer.
    pub timeout_secs: u64,
    /// How many invalid answers a dialog prompt tolerates before giving up.
    pub dialog_retries: u32,
    /// Answer that cancels a pending dialog or selection.
    pub cancel_word: String,
}
impl Interaction {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
impl Default for Interaction {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            dialog_retries: 2,
            cancel_word: "cancel".to_owned(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct LocaleConfig {
    pub default: String,
    /// Directory of `<lang>.toml` dictionaries, merged over the built-in ones.
    pub directory: Option<PathBuf>,
}
impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default: "en".to_owned(),
            directory: None,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Logging {
    pub filter: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
        }
    }
}
