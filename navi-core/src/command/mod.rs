//! The command system.
//!
//! The key things that make up the command system are:
//!
//! - [`command::CommandNode`]: a named, triggerable command with a usage schema, options, a
//!   cooldown and optional subcommands. Nodes are declared with a [`command::CommandBuilder`] and
//!   supply one handler function per subcommand, plus a default one.
//!
//! - [`arguments::TypeRegistry`]: maps type tags (`string`, `int`, `member`, ...) to resolvers that
//!   turn raw tokens into typed values. Nodes can shadow resolvers with their own.
//!
//! - [`resolver::ArgumentResolver`]: walks a usage schema and produces an
//!   [`resolver::ArgumentRecord`].
//!
//! - [`gate`]: admin, guild, permission and cooldown checks run before resolution.
//!
//! - The registry: registry.rs maps every trigger to its node. The entry point is
//!   [`registry::CommandRegistry::find_command_by_name`].

use std::sync::Arc;

use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;

use self::resolver::ArgumentRecord;
use crate::platform::Message;
use crate::settings::GuildSettings;

pub mod arguments;
#[allow(clippy::module_inception)]
pub mod command;
pub mod errors;
pub mod gate;
pub mod registry;
pub mod resolver;
pub mod usage;

/// The context of one inbound message, threaded through middleware and into a command.
#[derive(Clone, Debug)]
pub struct Container {
    pub message: Arc<Message>,
    /// Tokens after the trigger.
    pub raw_args: Vec<String>,
    /// The matched trigger, extended with the subcommand name once one is matched.
    pub trigger: String,
    pub is_private: bool,
    pub admins: Arc<Vec<Id<UserMarker>>>,
    pub settings: GuildSettings,
    /// The prefix this message was invoked with.
    pub prefix: String,
    pub locale: String,
    /// Filled in once arguments are resolved.
    pub args: ArgumentRecord,
}
impl Container {
    pub fn new(message: Message, admins: Arc<Vec<Id<UserMarker>>>, locale: &str) -> Self {
        let is_private = message.is_private();
        Self {
            message: Arc::new(message),
            raw_args: vec![],
            trigger: String::new(),
            is_private,
            admins,
            settings: GuildSettings::default(),
            prefix: String::new(),
            locale: locale.to_owned(),
            args: ArgumentRecord::new(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.admins.contains(&self.message.author.id)
    }
}

/// How the engine finished with an inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The message answered a pending dialog or selection.
    ConsumedBySession,
    /// A middleware stopped processing.
    Aborted,
    /// No command matched the trigger.
    Ignored,
    /// The gate refused the invocation.
    Rejected,
    /// Arguments were missing or not one of the accepted choices.
    UsageError,
    ResolutionFailed,
    /// The handler gave up on a dialog or selection (timeout, cancel, bad answers).
    Interrupted,
    Handled,
    /// The handler failed unexpectedly.
    Faulted,
}
