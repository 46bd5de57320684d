use std::time::Duration;

use navi_core::command::command::{CommandBuilder, CommandNode, CommandOptions};
use navi_core::command::errors::CommandBuildError;
use navi_core::command::usage::UsageSpec;
use navi_core::command::Container;
use navi_core::responder::{Reply, Responder};
use navi_string_fmt::Markdown;
use twilight_model::guild::Permissions;

use crate::silenced::SilencedUsers;

pub fn kick() -> Result<CommandNode, CommandBuildError> {
    CommandBuilder::new("kick")
        .group("moderation")
        .description("kick a member from the server")
        .usage(UsageSpec::new("member", "member"))
        .usage(UsageSpec::new("reason", "string").optional().last())
        .options(
            CommandOptions::new()
                .guild_only(true)
                .permissions(Permissions::KICK_MEMBERS)
                .bot_permissions(Permissions::KICK_MEMBERS),
        )
        .cooldown(Duration::from_secs(3))
        .example("@bob", "kick bob")
        .example("bob spamming links", "kick bob with a reason")
        .handler(kick_handler)
        .build()
}

async fn kick_handler(ctr: Container, responder: Responder) -> anyhow::Result<()> {
    let Some(member) = ctr.args.member("member") else {
        anyhow::bail!("member argument missing after resolution");
    };
    let reason = ctr.args.str("reason").unwrap_or("no reason given");

    if member.id == ctr.message.author.id {
        responder.error("{{kick.SELF}}").await?;
        return Ok(());
    }

    let title = format!("Kick {} ({reason})?", member.display_name());
    let (_, index) = responder.selection(&["Yes", "No"], &title).await?;

    if index == 0 {
        responder
            .success(Reply::new("{{kick.SUCCESS}}").param("member", &member.display_name().bold()))
            .await?;
    } else {
        responder.send("{{kick.ABORTED}}").await?;
    }

    Ok(())
}

/// Toggles whether a member's messages are dropped before dispatch.
pub fn silence(silenced: SilencedUsers) -> Result<CommandNode, CommandBuildError> {
    CommandBuilder::new("silence")
        .alias("unsilence")
        .group("moderation")
        .description("ignore or stop ignoring a member")
        .usage(UsageSpec::new("member", "member").last())
        .options(CommandOptions::new().guild_only(true).admin_only(true).hidden(true))
        .cooldown(Duration::ZERO)
        .handler(move |ctr, responder| silence_handler(silenced.clone(), ctr, responder))
        .build()
}

async fn silence_handler(silenced: SilencedUsers, ctr: Container, responder: Responder) -> anyhow::Result<()> {
    let Some(member) = ctr.args.member("member") else {
        anyhow::bail!("member argument missing after resolution");
    };

    let key = if silenced.toggle(member.id) {
        "{{silence.ON}}"
    } else {
        "{{silence.OFF}}"
    };
    responder
        .success(Reply::new(key).param("member", &member.display_name().bold()))
        .await?;

    Ok(())
}
