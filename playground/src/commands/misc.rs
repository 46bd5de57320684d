use std::fmt::Write;
use std::time::{Duration, Instant};

use anyhow::{bail, ensure};
use navi_core::command::command::{CommandBuilder, CommandNode, CommandOptions, SubcommandBuilder};
use navi_core::command::errors::CommandBuildError;
use navi_core::command::usage::{UsageSpec, usage_string};
use navi_core::command::Container;
use navi_core::responder::{Reply, Responder};
use navi_string_fmt::Markdown;

pub fn ping() -> Result<CommandNode, CommandBuildError> {
    CommandBuilder::new("ping")
        .group("misc")
        .description("check that the bot is alive")
        .cooldown(Duration::from_secs(2))
        .handler(pong)
        .build()
}

async fn pong(_: Container, responder: Responder) -> anyhow::Result<()> {
    let start = Instant::now();
    responder.typing().await?;
    let sent = responder.send("{{ping.PINGING}}").await?;

    let elapsed = start.elapsed().as_millis().to_string();
    responder
        .edit(sent, Reply::new("{{ping.PONG}}").param("ms", &elapsed))
        .await?;
    Ok(())
}

pub fn help() -> Result<CommandNode, CommandBuildError> {
    CommandBuilder::new("help")
        .alias("commands")
        .group("misc")
        .description("list commands, or show how to use one")
        .usage(UsageSpec::new("command", "string").optional())
        .example("", "list every command")
        .example("calendar.select", "show help for a subcommand")
        .cooldown(Duration::from_secs(1))
        .handler(help_handler)
        .build()
}

async fn help_handler(ctr: Container, responder: Responder) -> anyhow::Result<()> {
    let navi = responder.navi();

    let Some(query) = ctr.args.str("command") else {
        let mut listing = String::new();
        for (group, nodes) in navi.commands.visible_by_group() {
            let names = nodes.iter().map(|n| n.name().codestring()).collect::<Vec<_>>();
            writeln!(listing, "{}: {}", group.bold(), names.join(", "))?;
        }
        responder.send(listing.trim_end()).await?;
        return Ok(());
    };

    let (name, sub) = match query.split_once('.') {
        Some((name, sub)) => (name, Some(sub)),
        None => (query, None),
    };
    let node = navi.commands.find_command_by_name(name).filter(|n| !n.is_hidden());
    let subcommand = match (&node, sub) {
        (Some(node), Some(sub)) => node.subcommand(sub).map(Some),
        (Some(_), None) => Some(None),
        (None, _) => None,
    };
    let (Some(node), Some(subcommand)) = (&node, subcommand) else {
        responder
            .error(Reply::new("{{help.NOT_FOUND}}").param("command", &query.codestring()))
            .await?;
        return Ok(());
    };

    let mut text = String::new();
    match subcommand {
        Some(subcommand) => {
            let usage = usage_string(&subcommand.usage);
            writeln!(text, "{}", format!("{} {}", node.name(), subcommand.name).bold())?;
            writeln!(text, "Usage: {}", format!("{}{} {} {usage}", ctr.prefix, node.name(), subcommand.name).trim_end().codestring())?;
            for example in &subcommand.examples {
                let run = format!("{}{} {} {}", ctr.prefix, node.name(), subcommand.name, example.args);
                writeln!(text, "{} - {}", run.trim_end().codestring(), example.description)?;
            }
        },
        None => {
            writeln!(text, "{}: {}", node.name().bold(), node.description)?;
            writeln!(text, "Usage: {}", format!("{}{} {}", ctr.prefix, node.name(), node.usage_string()).trim_end().codestring())?;
            if !node.aliases().is_empty() {
                writeln!(text, "Aliases: {}", node.aliases().join(", "))?;
            }
            let subcommands = node.subcommands();
            if !subcommands.is_empty() {
                let names = subcommands.iter().map(|s| s.name.as_str()).collect::<Vec<_>>();
                writeln!(text, "Subcommands: {}", names.join(", "))?;
            }
            for example in &node.examples {
                let run = format!("{}{} {}", ctr.prefix, node.name(), example.args);
                writeln!(text, "{} - {}", run.trim_end().codestring(), example.description)?;
            }
            writeln!(text, "Cooldown: {}s", node.cooldown().as_secs())?;
        },
    }

    responder.send(text.trim_end()).await?;
    Ok(())
}

pub fn prefix() -> Result<CommandNode, CommandBuildError> {
    CommandBuilder::new("prefix")
        .group("misc")
        .description("get or set the server prefix")
        .options(CommandOptions::new().guild_only(true))
        .cooldown(Duration::from_secs(2))
        .example("", "show the prefix")
        .example("set ?", "use ? as the prefix")
        .handler(get_prefix)
        .subcommand(
            SubcommandBuilder::new("set")
                .usage(UsageSpec::new("new", "string"))
                .options(CommandOptions::new().mod_only())
                .example("%", "use % as the prefix")
                .handler(set_prefix),
        )
        .build()
}

async fn get_prefix(ctr: Container, responder: Responder) -> anyhow::Result<()> {
    let prefix = ctr
        .settings
        .prefix
        .unwrap_or_else(|| responder.navi().config.bot.default_prefix.clone());

    responder
        .send(Reply::new("{{prefix.CURRENT}}").param("prefix", &prefix.codestring()))
        .await?;
    Ok(())
}

async fn set_prefix(ctr: Container, responder: Responder) -> anyhow::Result<()> {
    let Some(guild_id) = ctr.message.guild_id else {
        bail!("prefix set outside of a guild");
    };
    let new = ctr.args.str("new").unwrap_or_default();
    ensure!(!new.is_empty(), "empty prefix passed the resolver");

    if new.chars().count() > 14 {
        responder.error("{{prefix.TOO_LONG}}").await?;
        return Ok(());
    }

    let mut settings = ctr.settings.clone();
    settings.prefix = Some(new.to_owned());
    responder.navi().settings.set(guild_id, settings).await?;

    responder
        .success(Reply::new("{{prefix.UPDATED}}").param("prefix", &new.codestring()))
        .await?;
    Ok(())
}
