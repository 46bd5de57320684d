use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use navi_core::command::command::{CommandBuilder, CommandNode, CommandOptions, SubcommandBuilder};
use navi_core::command::errors::CommandBuildError;
use navi_core::command::usage::UsageSpec;
use navi_core::command::Container;
use navi_core::responder::{DialogPrompt, Reply, Responder};
use navi_string_fmt::Markdown;
use twilight_model::id::marker::GuildMarker;
use twilight_model::id::Id;

const CALENDARS: [&str; 3] = ["Events", "Raids", "Birthdays"];
const LEAD_TIMES: [&str; 3] = ["15 minutes", "1 hour", "1 day"];

#[derive(Clone, Debug, Default)]
struct CalendarSettings {
    account: Option<String>,
    sync_days: Option<i64>,
    calendar: Option<String>,
    channel: Option<String>,
    lead_time: Option<String>,
}

#[derive(Clone, Default)]
pub struct Calendars(Arc<Mutex<HashMap<Id<GuildMarker>, CalendarSettings>>>);
impl Calendars {
    fn get(&self, guild_id: Id<GuildMarker>) -> CalendarSettings {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&guild_id)
            .cloned()
            .unwrap_or_default()
    }

    fn update(&self, guild_id: Id<GuildMarker>, f: impl FnOnce(&mut CalendarSettings)) {
        f(self.0.lock().unwrap_or_else(|e| e.into_inner()).entry(guild_id).or_default());
    }
}

fn guild(ctr: &Container) -> anyhow::Result<Id<GuildMarker>> {
    ctr.message
        .guild_id
        .ok_or_else(|| anyhow::anyhow!("{} ran outside of a guild", ctr.trigger))
}

pub fn calendar(calendars: Calendars) -> Result<CommandNode, CommandBuildError> {
    let show = calendars.clone();
    let authorize = calendars.clone();
    let select = calendars.clone();
    let notify = calendars;

    CommandBuilder::new("calendar")
        .alias("cal")
        .group("calendar")
        .description("sync a calendar's events into a channel")
        .usage(UsageSpec::new("subcommand", "string").choices(["authorize", "select", "notify"]).optional())
        .options(CommandOptions::new().guild_only(true).mod_only())
        .cooldown(Duration::from_secs(3))
        .example("", "show the current setup")
        .example("select", "pick which calendar to sync")
        .handler(move |ctr, responder| show_handler(show.clone(), ctr, responder))
        .subcommand(
            SubcommandBuilder::new("authorize")
                .alias("auth")
                .example("", "link an account")
                .handler(move |ctr, responder| authorize_handler(authorize.clone(), ctr, responder)),
        )
        .subcommand(
            SubcommandBuilder::new("select")
                .handler(move |ctr, responder| select_handler(select.clone(), ctr, responder)),
        )
        .subcommand(
            SubcommandBuilder::new("notify")
                .usage(UsageSpec::new("channel", "channel"))
                .options(CommandOptions::new().permissions(twilight_model::guild::Permissions::MANAGE_CHANNELS))
                .example("#announcements", "post reminders in #announcements")
                .handler(move |ctr, responder| notify_handler(notify.clone(), ctr, responder)),
        )
        .build()
}

async fn show_handler(calendars: Calendars, ctr: Container, responder: Responder) -> anyhow::Result<()> {
    let settings = calendars.get(guild(&ctr)?);
    let unset = || "-".to_owned();

    let text = [
        ("Account", settings.account.unwrap_or_else(unset)),
        ("Sync", settings.sync_days.map_or_else(unset, |d| format!("{d} days"))),
        ("Calendar", settings.calendar.unwrap_or_else(unset)),
        ("Channel", settings.channel.unwrap_or_else(unset)),
        ("Reminders", settings.lead_time.unwrap_or_else(unset)),
    ]
    .iter()
    .map(|(k, v)| format!("{k}: {v}"))
    .collect::<Vec<_>>()
    .join("\n");

    responder.send(Reply::new(text).code("")).await?;
    Ok(())
}

async fn authorize_handler(calendars: Calendars, ctr: Container, responder: Responder) -> anyhow::Result<()> {
    let answers = responder
        .dialog(vec![
            DialogPrompt::new("Which account should I read events from?", UsageSpec::new("account", "string")),
            DialogPrompt::new(
                "How many days ahead should I sync?",
                UsageSpec::new("days", "int").display("days ahead").min(1),
            ),
        ])
        .await?;

    let account = answers.str("account").unwrap_or_default().to_owned();
    let days = answers.int("days").unwrap_or(7);
    calendars.update(guild(&ctr)?, |s| {
        s.account = Some(account.clone());
        s.sync_days = Some(days);
    });

    responder
        .success(
            Reply::new("{{calendar.AUTHORIZED}}")
                .param("account", &account.codestring())
                .param("days", &days.to_string()),
        )
        .await?;
    Ok(())
}

async fn select_handler(calendars: Calendars, ctr: Container, responder: Responder) -> anyhow::Result<()> {
    let (_, index) = responder.selection(&CALENDARS, "Which calendar should I sync?").await?;

    let picked = CALENDARS[index];
    calendars.update(guild(&ctr)?, |s| s.calendar = Some(picked.to_owned()));

    responder
        .success(Reply::new("{{calendar.SELECTED}}").param("calendar", &picked.bold()))
        .await?;
    Ok(())
}

async fn notify_handler(calendars: Calendars, ctr: Container, responder: Responder) -> anyhow::Result<()> {
    let Some(channel) = ctr.args.channel("channel") else {
        anyhow::bail!("channel argument missing after resolution");
    };

    let (_, index) = responder
        .selection(&LEAD_TIMES, "How long before an event should I post?")
        .await?;

    let lead_time = LEAD_TIMES[index];
    let mention = channel.mention();
    calendars.update(guild(&ctr)?, |s| {
        s.channel = Some(mention.clone());
        s.lead_time = Some(lead_time.to_owned());
    });

    responder
        .success(
            Reply::new("{{calendar.NOTIFYING}}")
                .param("channel", &mention)
                .param("lead", lead_time),
        )
        .await?;
    Ok(())
}
