//! In-memory chat client and fixtures shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};

use anyhow::bail;
use async_trait::async_trait;
use navi_common::config::NaviConfig;
use navi_common::macros::set_error_sink;
use twilight_model::guild::Permissions;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, MessageMarker, RoleMarker, UserMarker};

use crate::command::Container;
use crate::navi::{Navi, ThreadSafeNavi};
use crate::platform::{Author, Channel, ChatClient, Member, Message, MessageBuilder, Role, SentMessage};
use crate::settings::MemorySettings;

pub const ADMIN: u64 = 1;
pub const BOT: u64 = 2;
pub const CHANNEL: u64 = 500;

#[derive(Default)]
struct MockState {
    next_message: AtomicU64,
    sent: Mutex<Vec<String>>,
    deleted: Mutex<Vec<Id<MessageMarker>>>,
    granted: Mutex<HashMap<u64, Permissions>>,
    members: Vec<Member>,
    channels: Vec<Channel>,
    roles: Vec<Role>,
    failing: bool,
}

/// Records everything sent through it and answers lookups from fixed fixtures.
#[derive(Clone, Default)]
pub struct MockClient(Arc<MockState>);
impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut MockState {
        Arc::get_mut(&mut self.0).expect("fixtures are added before the client is shared")
    }

    pub fn with_member(mut self, id: u64, name: &str) -> Self {
        self.state_mut().members.push(Member {
            id: Id::new(id),
            name: name.to_owned(),
            nick: None,
        });
        self
    }

    pub fn with_channel(mut self, id: u64, name: &str) -> Self {
        self.state_mut().channels.push(Channel {
            id: Id::new(id),
            name: name.to_owned(),
        });
        self
    }

    pub fn with_role(mut self, id: u64, name: &str) -> Self {
        self.state_mut().roles.push(Role {
            id: Id::new(id),
            name: name.to_owned(),
        });
        self
    }

    pub fn failing_lookups(mut self) -> Self {
        self.state_mut().failing = true;
        self
    }

    pub fn grant(&self, user: u64, permissions: Permissions) {
        *self.0.granted.lock().unwrap().entry(user).or_insert_with(Permissions::empty) |= permissions;
    }

    pub fn sent_contents(&self) -> Vec<String> {
        self.0.sent.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<Id<MessageMarker>> {
        self.0.deleted.lock().unwrap().clone()
    }

    fn lookup<T: Clone>(&self, items: &[T], matches: impl Fn(&T) -> bool) -> anyhow::Result<Option<T>> {
        if self.0.failing {
            bail!("lookup service unavailable");
        }
        Ok(items.iter().find(|i| matches(i)).cloned())
    }
}

#[async_trait]
impl ChatClient for MockClient {
    fn bot_id(&self) -> Id<UserMarker> {
        Id::new(BOT)
    }

    async fn create_message(&self, channel_id: Id<ChannelMarker>, builder: MessageBuilder) -> anyhow::Result<SentMessage> {
        self.0.sent.lock().unwrap().push(builder.content.unwrap_or_default());
        let id = self.0.next_message.fetch_add(1, Ordering::SeqCst) + 1;

        Ok(SentMessage {
            channel_id,
            message_id: Id::new(id),
        })
    }

    async fn update_message(&self, _: SentMessage, builder: MessageBuilder) -> anyhow::Result<()> {
        self.0.sent.lock().unwrap().push(builder.content.unwrap_or_default());
        Ok(())
    }

    async fn delete_message(&self, _: Id<ChannelMarker>, message_id: Id<MessageMarker>) -> anyhow::Result<()> {
        self.0.deleted.lock().unwrap().push(message_id);
        Ok(())
    }

    async fn trigger_typing(&self, _: Id<ChannelMarker>) -> anyhow::Result<()> {
        Ok(())
    }

    fn has_permissions(&self, _: Id<ChannelMarker>, actor: Id<UserMarker>, permissions: Permissions) -> bool {
        self.0
            .granted
            .lock()
            .unwrap()
            .get(&actor.get())
            .is_some_and(|granted| granted.contains(permissions))
    }

    async fn member(&self, _: Id<GuildMarker>, user_id: Id<UserMarker>) -> anyhow::Result<Option<Member>> {
        self.lookup(&self.0.members, |m| m.id == user_id)
    }

    async fn find_member(&self, _: Id<GuildMarker>, name: &str) -> anyhow::Result<Option<Member>> {
        self.lookup(&self.0.members, |m| m.name.eq_ignore_ascii_case(name))
    }

    async fn channel(&self, _: Id<GuildMarker>, channel_id: Id<ChannelMarker>) -> anyhow::Result<Option<Channel>> {
        self.lookup(&self.0.channels, |c| c.id == channel_id)
    }

    async fn find_channel(&self, _: Id<GuildMarker>, name: &str) -> anyhow::Result<Option<Channel>> {
        self.lookup(&self.0.channels, |c| c.name.eq_ignore_ascii_case(name))
    }

    async fn role(&self, _: Id<GuildMarker>, role_id: Id<RoleMarker>) -> anyhow::Result<Option<Role>> {
        self.lookup(&self.0.roles, |r| r.id == role_id)
    }

    async fn find_role(&self, _: Id<GuildMarker>, name: &str) -> anyhow::Result<Option<Role>> {
        self.lookup(&self.0.roles, |r| r.name.eq_ignore_ascii_case(name))
    }
}

pub fn tokens(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_owned).collect()
}

static NEXT_MESSAGE: AtomicU64 = AtomicU64::new(1);

pub fn message(author: u64, guild: Option<u64>, content: &str) -> Message {
    Message {
        id: Id::new(NEXT_MESSAGE.fetch_add(1, Ordering::Relaxed)),
        author: Author {
            id: Id::new(author),
            name: format!("user{author}"),
            bot: false,
        },
        channel_id: Id::new(CHANNEL),
        guild_id: guild.map(Id::new),
        content: content.to_owned(),
    }
}

/// A container as it looks before any middleware ran.
pub fn raw_container(author: u64, guild: Option<u64>, content: &str) -> Container {
    let mut container = Container::new(message(author, guild, content), Arc::new(vec![Id::new(ADMIN)]), "en");
    container.is_private = guild.is_none();
    container
}

/// A container as `ParsePrefix` leaves it for `n!<content>`.
pub fn container(author: u64, guild: Option<u64>, content: &str) -> Container {
    let mut container = raw_container(author, guild, content);
    let mut parts = tokens(content).into_iter();
    container.prefix = "n!".to_owned();
    container.trigger = parts.next().unwrap_or_default().to_lowercase();
    container.raw_args = parts.collect();
    container
}

/// An engine with the default middleware and no commands, still open for registration.
pub fn mock_engine(client: MockClient, mut config: NaviConfig) -> Navi {
    if !config.bot.admin_users.contains(&ADMIN) {
        config.bot.admin_users.push(ADMIN);
    }
    Navi::new(config, Arc::new(client), Arc::new(MemorySettings::new())).unwrap()
}

pub fn mock_navi_with(client: MockClient, config: NaviConfig) -> ThreadSafeNavi {
    Arc::new(mock_engine(client, config))
}

pub fn mock_navi(client: MockClient) -> ThreadSafeNavi {
    mock_navi_with(client, NaviConfig::default())
}

/// Yields until the user has a dialog or selection waiting in [`CHANNEL`].
pub async fn wait_for_session(navi: &ThreadSafeNavi, user: u64) {
    while !navi.sessions.is_pending(Id::new(user), Id::new(CHANNEL)) {
        tokio::task::yield_now().await;
    }
}

static REPORTED: Mutex<Vec<String>> = Mutex::new(Vec::new());

/// Installs an error sink that records every message passed through `err!`. The sink is
/// process-wide, so callers should look for messages they caused rather than count them.
pub fn capture_reported_errors() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        set_error_sink(Box::new(|message| REPORTED.lock().unwrap().push(message)));
    });
}

pub fn reported_errors() -> Vec<String> {
    REPORTED.lock().unwrap().clone()
}
