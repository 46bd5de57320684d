//! Interceptors run on every inbound message before dispatch.
//!
//! Middleware run one after another in ascending priority; ties keep registration order. Each one
//! receives the container produced by the previous one and may replace it, or return `None` to
//! stop processing the message. A middleware that fails is reported and also stops processing.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use navi_common::err;
use tracing::debug;

use crate::command::Container;
use crate::navi::ThreadSafeNavi;

pub mod guild_settings;
pub mod ignore_bots;
pub mod parse_prefix;

#[async_trait]
pub trait Middleware: Send + Sync {
    fn name(&self) -> &str;

    /// Lower runs first.
    fn priority(&self) -> i32;

    async fn process(&self, navi: &ThreadSafeNavi, container: Container) -> anyhow::Result<Option<Container>>;
}

/// A middleware made from a closure.
pub struct FnMiddleware<F> {
    name: String,
    priority: i32,
    f: F,
}
impl<F, Fut> FnMiddleware<F>
where
    F: Fn(ThreadSafeNavi, Container) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Option<Container>>> + Send + 'static,
{
    pub fn new(name: &str, priority: i32, f: F) -> Self {
        Self {
            name: name.to_owned(),
            priority,
            f,
        }
    }
}

#[async_trait]
impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(ThreadSafeNavi, Container) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Option<Container>>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn process(&self, navi: &ThreadSafeNavi, container: Container) -> anyhow::Result<Option<Container>> {
        (self.f)(navi.clone(), container).await
    }
}

#[derive(Default)]
pub struct Pipeline {
    middleware: Vec<Arc<dyn Middleware>>,
}
impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in middleware: ignoring bots, loading guild settings, and parsing the prefix.
    pub fn with_defaults() -> Self {
        let mut pipeline = Self::new();
        pipeline.register(ignore_bots::IgnoreBots);
        pipeline.register(guild_settings::LoadGuildSettings);
        pipeline.register(parse_prefix::ParsePrefix);
        pipeline
    }

    /// Inserts a middleware after every registered one of lower or equal priority.
    pub fn register(&mut self, middleware: impl Middleware + 'static) {
        let index = self
            .middleware
            .partition_point(|m| m.priority() <= middleware.priority());
        self.middleware.insert(index, Arc::new(middleware));
    }

    /// Removes every middleware with the given name. Returns whether any was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.middleware.len();
        self.middleware.retain(|m| m.name() != name);
        self.middleware.len() != before
    }

    /// Middleware names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    /// Runs the whole chain. `None` means the message must not be dispatched.
    pub async fn run(&self, navi: &ThreadSafeNavi, mut container: Container) -> Option<Container> {
        for middleware in &self.middleware {
            container = match middleware.process(navi, container).await {
                Ok(Some(container)) => container,
                Ok(None) => {
                    debug!("middleware {} aborted processing", middleware.name());
                    return None;
                },
                Err(e) => {
                    err!("Middleware {} failed: {e:#}", middleware.name());
                    return None;
                },
            };
        }

        Some(container)
    }
}
