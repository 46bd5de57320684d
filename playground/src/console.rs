//! A chat platform on stdin/stdout.
//!
//! Input lines look like `alice: n!ping`, or `dm alice: help` for a direct message. Everyone
//! talks in the same `#general` channel of one guild. Replies are printed as they are sent.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use navi_core::platform::{Author, Channel, ChatClient, Member, Message, MessageBuilder, Role, SentMessage};
use twilight_model::guild::Permissions;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, MessageMarker, RoleMarker, UserMarker};

pub const GUILD: u64 = 1000;
pub const GENERAL: u64 = 2000;
pub const DM_CHANNEL: u64 = 2001;
const BOT: u64 = 1;

pub struct ConsoleClient {
    next_id: AtomicU64,
    /// Name to member, lowercased.
    members: Mutex<HashMap<String, (Member, Permissions)>>,
    channels: Vec<Channel>,
    roles: Vec<Role>,
}
impl ConsoleClient {
    pub fn new() -> Self {
        let client = Self {
            next_id: AtomicU64::new(10_000),
            members: Mutex::new(HashMap::new()),
            channels: vec![
                Channel {
                    id: Id::new(GENERAL),
                    name: "general".to_owned(),
                },
                Channel {
                    id: Id::new(GENERAL + 10),
                    name: "announcements".to_owned(),
                },
            ],
            roles: ["Mods", "Artists", "Gamers", "Night Owls"]
                .iter()
                .zip(3000..)
                .map(|(name, id)| Role {
                    id: Id::new(id),
                    name: (*name).to_owned(),
                })
                .collect(),
        };

        client.join("navi", Permissions::all());
        client.join("alice", Permissions::all());
        client.join("bob", Permissions::KICK_MEMBERS | Permissions::MANAGE_CHANNELS);
        client
    }

    /// Adds a member to the guild, or returns the existing one.
    pub fn join(&self, name: &str, permissions: Permissions) -> Member {
        let mut members = self.members.lock().unwrap_or_else(|e| e.into_inner());
        let key = name.to_lowercase();
        if let Some((member, _)) = members.get(&key) {
            return member.clone();
        }

        let id = match key.as_str() {
            "navi" => BOT,
            _ => self.next_id.fetch_add(1, Ordering::Relaxed),
        };
        let member = Member {
            id: Id::new(id),
            name: name.to_owned(),
            nick: None,
        };
        members.insert(key, (member.clone(), permissions));
        member
    }

    /// Parses one input line into a message. Unknown speakers join with no permissions.
    pub fn parse_line(&self, line: &str) -> Option<Message> {
        let (dm, line) = match line.strip_prefix("dm ") {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let (name, content) = line.split_once(':')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let member = self.join(name, Permissions::SEND_MESSAGES);
        Some(Message {
            id: Id::new(self.next_id.fetch_add(1, Ordering::Relaxed)),
            author: Author {
                id: member.id,
                name: member.name,
                bot: name.eq_ignore_ascii_case("navi"),
            },
            channel_id: Id::new(if dm { DM_CHANNEL } else { GENERAL }),
            guild_id: (!dm).then(|| Id::new(GUILD)),
            content: content.trim().to_owned(),
        })
    }

    fn members(&self) -> Vec<Member> {
        self.members
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(|(m, _)| m.clone())
            .collect()
    }
}

impl Default for ConsoleClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatClient for ConsoleClient {
    fn bot_id(&self) -> Id<UserMarker> {
        Id::new(BOT)
    }

    async fn create_message(&self, channel_id: Id<ChannelMarker>, builder: MessageBuilder) -> anyhow::Result<SentMessage> {
        let message_id = Id::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Some(content) = builder.content {
            println!("[{channel_id}] navi ({message_id}): {content}");
        }

        Ok(SentMessage { channel_id, message_id })
    }

    async fn update_message(&self, message: SentMessage, builder: MessageBuilder) -> anyhow::Result<()> {
        println!(
            "[{}] navi edited {}: {}",
            message.channel_id,
            message.message_id,
            builder.content.unwrap_or_default()
        );
        Ok(())
    }

    async fn delete_message(&self, channel_id: Id<ChannelMarker>, message_id: Id<MessageMarker>) -> anyhow::Result<()> {
        println!("[{channel_id}] navi deleted {message_id}");
        Ok(())
    }

    async fn trigger_typing(&self, channel_id: Id<ChannelMarker>) -> anyhow::Result<()> {
        println!("[{channel_id}] navi is typing...");
        Ok(())
    }

    fn has_permissions(&self, channel_id: Id<ChannelMarker>, actor: Id<UserMarker>, permissions: Permissions) -> bool {
        if channel_id == Id::new(DM_CHANNEL) {
            return true;
        }

        self.members
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .find(|(m, _)| m.id == actor)
            .is_some_and(|(_, granted)| granted.contains(permissions))
    }

    async fn member(&self, _: Id<GuildMarker>, user_id: Id<UserMarker>) -> anyhow::Result<Option<Member>> {
        Ok(self.members().into_iter().find(|m| m.id == user_id))
    }

    async fn find_member(&self, _: Id<GuildMarker>, name: &str) -> anyhow::Result<Option<Member>> {
        Ok(self.members().into_iter().find(|m| m.name.eq_ignore_ascii_case(name)))
    }

    async fn channel(&self, _: Id<GuildMarker>, channel_id: Id<ChannelMarker>) -> anyhow::Result<Option<Channel>> {
        Ok(self.channels.iter().find(|c| c.id == channel_id).cloned())
    }

    async fn find_channel(&self, _: Id<GuildMarker>, name: &str) -> anyhow::Result<Option<Channel>> {
        let name = name.trim_start_matches('#');
        Ok(self.channels.iter().find(|c| c.name.eq_ignore_ascii_case(name)).cloned())
    }

    async fn role(&self, _: Id<GuildMarker>, role_id: Id<RoleMarker>) -> anyhow::Result<Option<Role>> {
        Ok(self.roles.iter().find(|r| r.id == role_id).cloned())
    }

    async fn find_role(&self, _: Id<GuildMarker>, name: &str) -> anyhow::Result<Option<Role>> {
        Ok(self.roles.iter().find(|r| r.name.eq_ignore_ascii_case(name)).cloned())
    }
}
