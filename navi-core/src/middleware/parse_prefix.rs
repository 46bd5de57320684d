use async_trait::async_trait;
use tracing::debug;
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;

use super::Middleware;
use crate::command::Container;
use crate::navi::ThreadSafeNavi;

/// Returns `Some(prefix)` if the prefix is the mention of the bot, otherwise `None`
fn message_mention_prefix(content: &str, bot_id: Id<UserMarker>) -> Option<String> {
    let mention_no_nickname = format!("<@{bot_id}>");
    let mention_nickname = format!("<@!{bot_id}>");

    if content.starts_with(&mention_no_nickname) {
        Some(mention_no_nickname)
    } else if content.starts_with(&mention_nickname) {
        Some(mention_nickname)
    } else {
        None
    }
}

/// Strips the prefix and splits the rest of the message into a trigger and raw arguments.
///
/// Prefix precedence:
/// 1. prefix override (disabling other prefixes)
/// 2. mention prefix
/// 3. no prefix in direct messages (the default prefix is still accepted), guild prefix otherwise
///
/// Messages without the expected prefix, or with nothing after it, are dropped.
pub struct ParsePrefix;

#[async_trait]
impl Middleware for ParsePrefix {
    fn name(&self) -> &str {
        "parse_prefix"
    }

    fn priority(&self) -> i32 {
        3
    }

    async fn process(&self, navi: &ThreadSafeNavi, mut container: Container) -> anyhow::Result<Option<Container>> {
        let content = container.message.content.as_str();
        let config = &navi.config;

        let prefix = if let Some(ref r#override) = config.dev.prefix_override {
            r#override.clone()
        } else if let Some(mention_prefix) = message_mention_prefix(content, navi.client.bot_id())
            .filter(|_| !config.dev.disable_mention_prefix)
        {
            mention_prefix
        } else if container.is_private {
            if content.starts_with(&config.bot.default_prefix) {
                config.bot.default_prefix.clone()
            } else {
                String::new()
            }
        } else {
            container
                .settings
                .prefix
                .clone()
                .unwrap_or_else(|| config.bot.default_prefix.clone())
        };

        let Some(rest) = content.strip_prefix(prefix.as_str()) else {
            return Ok(None);
        };

        let mut tokens = rest.split_whitespace().map(str::to_owned);
        let Some(trigger) = tokens.next() else {
            return Ok(None);
        };

        debug!("parser: parsed prefix: {prefix:?}, trigger: {trigger:?}");

        container.trigger = trigger.to_lowercase();
        container.raw_args = tokens.collect();
        container.prefix = prefix;

        Ok(Some(container))
    }
}

#[cfg(test)]
mod tests {
    use navi_common::config::NaviConfig;

    use super::*;
    use crate::settings::GuildSettings;
    use crate::test_util::{BOT, MockClient, mock_navi, mock_navi_with, raw_container};

    #[test]
    fn mention_prefixes() {
        let bot = Id::new(BOT);
        assert_eq!(
            message_mention_prefix(&format!("<@{BOT}> ping"), bot),
            Some(format!("<@{BOT}>"))
        );
        assert_eq!(
            message_mention_prefix(&format!("<@!{BOT}> ping"), bot),
            Some(format!("<@!{BOT}>"))
        );
        assert_eq!(message_mention_prefix("<@1234> ping", bot), None);
    }

    #[tokio::test]
    async fn guild_prefix_is_stripped() {
        let navi = mock_navi(MockClient::new());
        let mut ctr = raw_container(7, Some(10), "?Kick  <@55>  being rude");
        ctr.settings = GuildSettings {
            prefix: Some("?".to_owned()),
            locale: None,
        };

        let ctr = ParsePrefix.process(&navi, ctr).await.unwrap().unwrap();
        assert_eq!(ctr.prefix, "?");
        assert_eq!(ctr.trigger, "kick");
        assert_eq!(ctr.raw_args, vec!["<@55>", "being", "rude"]);
    }

    #[tokio::test]
    async fn unprefixed_or_empty_messages_are_dropped() {
        let navi = mock_navi(MockClient::new());

        assert!(ParsePrefix
            .process(&navi, raw_container(7, Some(10), "hello there"))
            .await
            .unwrap()
            .is_none());
        assert!(ParsePrefix
            .process(&navi, raw_container(7, Some(10), "n!   "))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn mentions_and_direct_messages() {
        let navi = mock_navi(MockClient::new());

        let ctr = ParsePrefix
            .process(&navi, raw_container(7, Some(10), &format!("<@{BOT}> ping")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ctr.trigger, "ping");

        let ctr = ParsePrefix
            .process(&navi, raw_container(7, None, "help kick"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ctr.prefix, "");
        assert_eq!(ctr.trigger, "help");

        let ctr = ParsePrefix
            .process(&navi, raw_container(7, None, "n!help"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ctr.prefix, "n!");
        assert_eq!(ctr.trigger, "help");
    }

    #[tokio::test]
    async fn override_disables_other_prefixes() {
        let mut config = NaviConfig::default();
        config.dev.prefix_override = Some("dev!".to_owned());
        let navi = mock_navi_with(MockClient::new(), config);

        assert!(ParsePrefix
            .process(&navi, raw_container(7, Some(10), &format!("<@{BOT}> ping")))
            .await
            .unwrap()
            .is_none());

        let ctr = ParsePrefix
            .process(&navi, raw_container(7, Some(10), "dev!ping"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ctr.trigger, "ping");
    }
}
