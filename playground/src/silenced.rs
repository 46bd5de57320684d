use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use navi_core::command::Container;
use navi_core::middleware::Middleware;
use navi_core::ThreadSafeNavi;
use tracing::debug;
use twilight_model::id::marker::UserMarker;
use twilight_model::id::Id;

/// Users whose messages the bot ignores. Shared between the middleware and the `silence` command.
#[derive(Clone, Default)]
pub struct SilencedUsers(Arc<Mutex<HashSet<Id<UserMarker>>>>);
impl SilencedUsers {
    /// Silences the user, or lifts their silence. Returns whether they are now silenced.
    pub fn toggle(&self, user: Id<UserMarker>) -> bool {
        let mut users = self.0.lock().unwrap_or_else(|e| e.into_inner());
        if users.remove(&user) {
            false
        } else {
            users.insert(user)
        }
    }

    pub fn contains(&self, user: Id<UserMarker>) -> bool {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).contains(&user)
    }
}

/// Drops messages from silenced users before anything else looks at them. Admins cannot be
/// silenced.
pub struct Silenced(pub SilencedUsers);

#[async_trait]
impl Middleware for Silenced {
    fn name(&self) -> &str {
        "silenced"
    }

    fn priority(&self) -> i32 {
        0
    }

    async fn process(&self, _: &ThreadSafeNavi, container: Container) -> anyhow::Result<Option<Container>> {
        let author = container.message.author.id;
        if self.0.contains(author) && !container.is_admin() {
            debug!("dropping message from silenced user {author}");
            return Ok(None);
        }

        Ok(Some(container))
    }
}
