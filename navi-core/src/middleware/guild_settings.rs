use async_trait::async_trait;

use super::Middleware;
use crate::command::Container;
use crate::navi::ThreadSafeNavi;

/// Loads the guild's settings into the container and picks the reply language.
///
/// Direct messages get the default settings.
pub struct LoadGuildSettings;

#[async_trait]
impl Middleware for LoadGuildSettings {
    fn name(&self) -> &str {
        "guild_settings"
    }

    fn priority(&self) -> i32 {
        2
    }

    async fn process(&self, navi: &ThreadSafeNavi, mut container: Container) -> anyhow::Result<Option<Container>> {
        container.is_private = container.message.is_private();

        if let Some(guild_id) = container.message.guild_id {
            container.settings = navi.settings.get(guild_id).await?.unwrap_or_default();
        }

        container.locale = match &container.settings.locale {
            Some(locale) if navi.locales.has_language(locale) => locale.clone(),
            _ => navi.locales.default_language().to_owned(),
        };

        Ok(Some(container))
    }
}

#[cfg(test)]
mod tests {
    use twilight_model::id::Id;

    use super::*;
    use crate::settings::GuildSettings;
    use crate::test_util::{MockClient, container, mock_navi};

    #[tokio::test]
    async fn settings_and_known_locales_are_applied() {
        let navi = mock_navi(MockClient::new());
        navi.settings
            .set(Id::new(10), GuildSettings {
                prefix: Some("?".to_owned()),
                locale: Some("en".to_owned()),
            })
            .await
            .unwrap();
        navi.settings
            .set(Id::new(11), GuildSettings {
                prefix: None,
                locale: Some("xx".to_owned()),
            })
            .await
            .unwrap();

        let ctr = LoadGuildSettings
            .process(&navi, container(7, Some(10), "ping"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ctr.settings.prefix.as_deref(), Some("?"));
        assert_eq!(ctr.locale, "en");
        assert!(!ctr.is_private);

        let ctr = LoadGuildSettings
            .process(&navi, container(7, Some(11), "ping"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ctr.locale, "en");

        let ctr = LoadGuildSettings
            .process(&navi, container(7, None, "ping"))
            .await
            .unwrap()
            .unwrap();
        assert!(ctr.is_private);
        assert_eq!(ctr.settings, GuildSettings::default());
    }
}
