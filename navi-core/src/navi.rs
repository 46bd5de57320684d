use std::sync::Arc;

use anyhow::Context;
use navi_common::config::NaviConfig;
use navi_common::locale::Locales;
use navi_common::metrics_handler::MetricsHandler;
use tracing::info;
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;

use crate::command::Container;
use crate::command::arguments::TypeRegistry;
use crate::command::command::CommandNode;
use crate::command::errors::RegistryError;
use crate::command::registry::CommandRegistry;
use crate::middleware::{Middleware, Pipeline};
use crate::platform::{Message, TChatClient};
use crate::responder::sessions::Sessions;
use crate::settings::SettingsService;

pub type ThreadSafeNavi = Arc<Navi>;

/// Main engine structure, storing the command set and everything commands share.
///
/// Commands, middleware and type resolvers are registered while the engine is still owned, before
/// it is wrapped in an [`Arc`] and handed to the message loop.
pub struct Navi {
    pub config: NaviConfig,
    /// Outbound access to the chat platform.
    pub client: TChatClient,
    /// Guild prefix and locale storage.
    pub settings: Arc<dyn SettingsService>,
    pub commands: CommandRegistry,
    pub middleware: Pipeline,
    /// Process-wide type resolvers. Commands may shadow these with their own.
    pub types: TypeRegistry,
    /// Pending dialogs and selections.
    pub sessions: Sessions,
    pub locales: Locales,
    /// Metrics handler for Prometheus, rate trackers etc.
    pub metrics_handler: Arc<MetricsHandler>,
    /// Users that bypass permission and cooldown checks.
    pub admins: Arc<Vec<Id<UserMarker>>>,
}
impl Navi {
    pub fn new(config: NaviConfig, client: TChatClient, settings: Arc<dyn SettingsService>) -> anyhow::Result<Navi> {
        let mut locales = Locales::new(&config.locale.default)?;
        if let Some(ref dir) = config.locale.directory {
            let loaded = locales
                .load_dir(dir)
                .with_context(|| format!("failed to load locales from {}", dir.display()))?;
            info!("Loaded {loaded} locale dictionaries from {}", dir.display());
        }

        let admins = config
            .bot
            .admin_users
            .iter()
            .filter_map(|&id| Id::new_checked(id))
            .collect::<Vec<_>>();

        Ok(Navi {
            config,
            client,
            settings,
            commands: CommandRegistry::new(),
            middleware: Pipeline::with_defaults(),
            types: TypeRegistry::with_builtins(),
            sessions: Sessions::new(),
            locales,
            metrics_handler: Arc::new(MetricsHandler::new()?),
            admins: Arc::new(admins),
        })
    }

    pub fn register_command(&mut self, node: CommandNode) -> Result<(), RegistryError> {
        info!("Registering command {}", node.name());
        self.commands.register(node)
    }

    pub fn register_middleware(&mut self, middleware: impl Middleware + 'static) {
        info!("Registering middleware {} ({})", middleware.name(), middleware.priority());
        self.middleware.register(middleware);
    }

    /// A fresh container for an inbound message, before any middleware ran.
    pub fn container_for(&self, message: Message) -> Container {
        Container::new(message, self.admins.clone(), self.locales.default_language())
    }
}
