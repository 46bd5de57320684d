//! Guild-scoped settings (prefix and locale).
//!
//! The storage behind these settings belongs to the embedding application; the engine only needs
//! the [`SettingsService`] contract.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use twilight_model::id::Id;
use twilight_model::id::marker::GuildMarker;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSettings {
    pub prefix: Option<String>,
    pub locale: Option<String>,
}

#[async_trait]
pub trait SettingsService: Send + Sync {
    async fn get(&self, guild_id: Id<GuildMarker>) -> anyhow::Result<Option<GuildSettings>>;

    async fn set(&self, guild_id: Id<GuildMarker>, settings: GuildSettings) -> anyhow::Result<()>;
}

/// Settings kept in process memory. Useful for tests and single-process deployments.
#[derive(Default)]
pub struct MemorySettings(RwLock<HashMap<Id<GuildMarker>, GuildSettings>>);
impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsService for MemorySettings {
    async fn get(&self, guild_id: Id<GuildMarker>) -> anyhow::Result<Option<GuildSettings>> {
        Ok(self
            .0
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&guild_id)
            .cloned())
    }

    async fn set(&self, guild_id: Id<GuildMarker>, settings: GuildSettings) -> anyhow::Result<()> {
        self.0
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(guild_id, settings);
        Ok(())
    }
}

/// Read-through cache in front of another settings service.
pub struct CachedSettings<S> {
    inner: S,
    cache: Cache<Id<GuildMarker>, GuildSettings>,
}
impl<S: SettingsService> CachedSettings<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            // 10,000 entries max, if settings not accessed in 5 mins then remove from cache
            cache: Cache::builder()
                .max_capacity(10000)
                .time_to_idle(Duration::from_secs(60 * 5))
                .build(),
        }
    }

    pub fn cached_entries(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

#[async_trait]
impl<S: SettingsService> SettingsService for CachedSettings<S> {
    async fn get(&self, guild_id: Id<GuildMarker>) -> anyhow::Result<Option<GuildSettings>> {
        if let Some(settings) = self.cache.get(&guild_id) {
            return Ok(Some(settings));
        }

        let settings = self.inner.get(guild_id).await?;
        if let Some(ref settings) = settings {
            self.cache.insert(guild_id, settings.clone());
        }

        Ok(settings)
    }

    async fn set(&self, guild_id: Id<GuildMarker>, settings: GuildSettings) -> anyhow::Result<()> {
        self.inner.set(guild_id, settings.clone()).await?;
        self.cache.insert(guild_id, settings);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct CountingSettings {
        inner: MemorySettings,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl SettingsService for CountingSettings {
        async fn get(&self, guild_id: Id<GuildMarker>) -> anyhow::Result<Option<GuildSettings>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(guild_id).await
        }

        async fn set(&self, guild_id: Id<GuildMarker>, settings: GuildSettings) -> anyhow::Result<()> {
            self.inner.set(guild_id, settings).await
        }
    }

    #[tokio::test]
    async fn cache_reads_through_once() {
        let guild = Id::new(1);
        let backing = CountingSettings::default();
        backing
            .inner
            .set(guild, GuildSettings {
                prefix: Some("?".to_owned()),
                locale: None,
            })
            .await
            .unwrap();

        let cached = CachedSettings::new(backing);
        for _ in 0..3 {
            let settings = cached.get(guild).await.unwrap().unwrap();
            assert_eq!(settings.prefix.as_deref(), Some("?"));
        }

        assert_eq!(cached.inner.reads.load(Ordering::SeqCst), 1);
        assert_eq!(cached.cached_entries(), 1);
    }

    #[tokio::test]
    async fn missing_settings_are_not_cached() {
        let cached = CachedSettings::new(CountingSettings::default());
        assert_eq!(cached.get(Id::new(2)).await.unwrap(), None);
        assert_eq!(cached.get(Id::new(2)).await.unwrap(), None);
        assert_eq!(cached.inner.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn writes_update_the_cache() {
        let cached = CachedSettings::new(MemorySettings::new());
        let settings = GuildSettings {
            prefix: None,
            locale: Some("fr".to_owned()),
        };
        cached.set(Id::new(3), settings.clone()).await.unwrap();
        assert_eq!(cached.get(Id::new(3)).await.unwrap(), Some(settings));
    }
}
