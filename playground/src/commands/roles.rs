//! Self-assignable roles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use navi_core::command::command::{CommandBuilder, CommandNode, CommandOptions};
use navi_core::command::errors::CommandBuildError;
use navi_core::command::usage::UsageSpec;
use navi_core::command::Container;
use navi_core::platform::Role;
use navi_core::responder::{Reply, Responder};
use navi_string_fmt::{numbered_list, Markdown};
use twilight_model::id::marker::GuildMarker;
use twilight_model::id::Id;

/// Roles members may give themselves, per guild.
#[derive(Clone, Default)]
pub struct SelfRoles(Arc<Mutex<HashMap<Id<GuildMarker>, Vec<Role>>>>);
impl SelfRoles {
    pub fn list(&self, guild_id: Id<GuildMarker>) -> Vec<Role> {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&guild_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns false if the role was already self-assignable.
    pub fn add(&self, guild_id: Id<GuildMarker>, role: Role) -> bool {
        let mut roles = self.0.lock().unwrap_or_else(|e| e.into_inner());
        let roles = roles.entry(guild_id).or_default();
        if roles.iter().any(|r| r.id == role.id) {
            return false;
        }
        roles.push(role);
        true
    }
}

fn guild(ctr: &Container) -> anyhow::Result<Id<GuildMarker>> {
    ctr.message
        .guild_id
        .ok_or_else(|| anyhow::anyhow!("{} ran outside of a guild", ctr.trigger))
}

pub fn iamlist(roles: SelfRoles) -> Result<CommandNode, CommandBuildError> {
    CommandBuilder::new("iamlist")
        .alias("lsar")
        .group("roles")
        .description("list the self-assignable roles")
        .options(CommandOptions::new().guild_only(true))
        .cooldown(Duration::from_secs(2))
        .handler(move |ctr, responder| iamlist_handler(roles.clone(), ctr, responder))
        .build()
}

async fn iamlist_handler(roles: SelfRoles, ctr: Container, responder: Responder) -> anyhow::Result<()> {
    let roles = roles.list(guild(&ctr)?);
    if roles.is_empty() {
        responder.send("{{iamlist.EMPTY}}").await?;
        return Ok(());
    }

    let names = roles.iter().map(|r| r.name.as_str());
    responder.send(Reply::new(numbered_list(names)).code("")).await?;
    Ok(())
}

pub fn saradd(roles: SelfRoles) -> Result<CommandNode, CommandBuildError> {
    CommandBuilder::new("saradd")
        .group("roles")
        .description("make a role self-assignable")
        .usage(UsageSpec::new("role", "role").last())
        .options(CommandOptions::new().guild_only(true).mod_only())
        .cooldown(Duration::from_secs(2))
        .example("Night Owls", "let members join Night Owls")
        .handler(move |ctr, responder| saradd_handler(roles.clone(), ctr, responder))
        .build()
}

async fn saradd_handler(roles: SelfRoles, ctr: Container, responder: Responder) -> anyhow::Result<()> {
    let Some(role) = ctr.args.role("role") else {
        anyhow::bail!("role argument missing after resolution");
    };

    let key = if roles.add(guild(&ctr)?, role.clone()) {
        "{{saradd.ADDED}}"
    } else {
        "{{saradd.EXISTS}}"
    };
    responder
        .success(Reply::new(key).param("role", &role.name.bold()))
        .await?;
    Ok(())
}

pub fn iam(roles: SelfRoles) -> Result<CommandNode, CommandBuildError> {
    CommandBuilder::new("iam")
        .group("roles")
        .description("give yourself a self-assignable role")
        .options(CommandOptions::new().guild_only(true))
        .cooldown(Duration::from_secs(5))
        .handler(move |ctr, responder| iam_handler(roles.clone(), ctr, responder))
        .build()
}

async fn iam_handler(roles: SelfRoles, ctr: Container, responder: Responder) -> anyhow::Result<()> {
    let roles = roles.list(guild(&ctr)?);
    let names = roles.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();

    let (_, index) = responder.selection(&names, "Which role would you like?").await?;
    responder
        .success(Reply::new("{{iam.GRANTED}}").param("role", &names[index].bold()))
        .await?;
    Ok(())
}
