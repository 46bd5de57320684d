use async_trait::async_trait;

use super::Middleware;
use crate::command::Container;
use crate::navi::ThreadSafeNavi;

/// Drops messages sent by bots and webhooks.
pub struct IgnoreBots;

#[async_trait]
impl Middleware for IgnoreBots {
    fn name(&self) -> &str {
        "ignore_bots"
    }

    fn priority(&self) -> i32 {
        1
    }

    async fn process(&self, _: &ThreadSafeNavi, container: Container) -> anyhow::Result<Option<Container>> {
        Ok((!container.message.author.bot).then_some(container))
    }
}
