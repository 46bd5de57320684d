//! Demo commands exercising the engine: plain replies, subcommands, entity arguments, dialogs and
//! selections.

use navi_core::Navi;
use tracing::info;

use crate::silenced::SilencedUsers;

pub mod calendar;
pub mod misc;
pub mod moderation;
pub mod roles;

/// Registers every demo command.
pub fn register_all(navi: &mut Navi, silenced: SilencedUsers) -> anyhow::Result<()> {
    let self_roles = roles::SelfRoles::default();

    let nodes = [
        misc::ping()?,
        misc::help()?,
        misc::prefix()?,
        moderation::kick()?,
        moderation::silence(silenced)?,
        roles::iamlist(self_roles.clone())?,
        roles::saradd(self_roles.clone())?,
        roles::iam(self_roles)?,
        calendar::calendar(calendar::Calendars::default())?,
    ];

    for node in nodes {
        navi.register_command(node)?;
    }

    info!("Registered {} commands", navi.commands.commands().len());
    Ok(())
}
