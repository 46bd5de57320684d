//! The contract between the engine and the chat platform.
//!
//! The engine never talks to a gateway or REST API itself. Inbound messages arrive as
//! [`Message`] values, and everything outbound (replies, permission checks, guild entity
//! lookups) goes through a [`ChatClient`].

use std::sync::Arc;

use async_trait::async_trait;
use twilight_model::guild::Permissions;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, MessageMarker, RoleMarker, UserMarker};

pub use self::messagebuilder::MessageBuilder;

pub mod messagebuilder;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Author {
    pub id: Id<UserMarker>,
    pub name: String,
    /// Whether the author is a bot or webhook.
    pub bot: bool,
}

/// An inbound chat message.
#[derive(Clone, Debug)]
pub struct Message {
    pub id: Id<MessageMarker>,
    pub author: Author,
    pub channel_id: Id<ChannelMarker>,
    /// Absent for direct messages.
    pub guild_id: Option<Id<GuildMarker>>,
    pub content: String,
}
impl Message {
    pub fn is_private(&self) -> bool {
        self.guild_id.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub id: Id<UserMarker>,
    pub name: String,
    pub nick: Option<String>,
}
impl Member {
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or(&self.name)
    }

    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel {
    pub id: Id<ChannelMarker>,
    pub name: String,
}
impl Channel {
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Role {
    pub id: Id<RoleMarker>,
    pub name: String,
}
impl Role {
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.id)
    }
}

/// A message the bot has sent, which can later be edited or deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: Id<ChannelMarker>,
    pub message_id: Id<MessageMarker>,
}

/// Outbound capabilities supplied by the platform integration.
///
/// Lookups are asynchronous and may fail; `Ok(None)` means the entity does not exist.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// The bot's own user ID, used for mention prefixes and bot permission checks.
    fn bot_id(&self) -> Id<UserMarker>;

    async fn create_message(&self, channel_id: Id<ChannelMarker>, builder: MessageBuilder) -> anyhow::Result<SentMessage>;

    async fn update_message(&self, message: SentMessage, builder: MessageBuilder) -> anyhow::Result<()>;

    async fn delete_message(&self, channel_id: Id<ChannelMarker>, message_id: Id<MessageMarker>) -> anyhow::Result<()>;

    async fn trigger_typing(&self, channel_id: Id<ChannelMarker>) -> anyhow::Result<()>;

    /// Whether `actor` holds every permission in `permissions` in the given channel.
    fn has_permissions(&self, channel_id: Id<ChannelMarker>, actor: Id<UserMarker>, permissions: Permissions) -> bool;

    async fn member(&self, guild_id: Id<GuildMarker>, user_id: Id<UserMarker>) -> anyhow::Result<Option<Member>>;

    async fn find_member(&self, guild_id: Id<GuildMarker>, name: &str) -> anyhow::Result<Option<Member>>;

    async fn channel(&self, guild_id: Id<GuildMarker>, channel_id: Id<ChannelMarker>) -> anyhow::Result<Option<Channel>>;

    async fn find_channel(&self, guild_id: Id<GuildMarker>, name: &str) -> anyhow::Result<Option<Channel>>;

    async fn role(&self, guild_id: Id<GuildMarker>, role_id: Id<RoleMarker>) -> anyhow::Result<Option<Role>>;

    async fn find_role(&self, guild_id: Id<GuildMarker>, name: &str) -> anyhow::Result<Option<Role>>;
}

/// A chat client as a shareable trait object.
pub type TChatClient = Arc<dyn ChatClient>;
