//! Replies to an invocation, and multi-turn interaction with its author.
//!
//! A [`Responder`] is bound to one invocation: it knows the channel to answer in, who invoked the
//! command, and which language and locale namespace to render replies with. Besides single-shot
//! replies it drives two interactive protocols, [`Responder::dialog`] and
//! [`Responder::selection`], which suspend the handler until the author answers.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use navi_common::util::ceil_secs;
use navi_string_fmt::Markdown;
use navi_string_fmt::markdown::trim_content_fits;
use tracing::warn;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker};

pub use self::dialog::DialogPrompt;
pub use self::reply::Reply;
use crate::command::Container;
use crate::command::arguments::TypeRegistry;
use crate::command::errors::{ErrorSeverity, GetErrorSeverity, ResolveError};
use crate::command::gate::{GateRejection, format_permissions};
use crate::navi::ThreadSafeNavi;
use crate::platform::{Author, SentMessage};

pub mod dialog;
pub mod reply;
pub mod selection;
pub mod sessions;

/// How long cooldown notices stay up.
const COOLDOWN_NOTICE: Duration = Duration::from_secs(5);

/// Why a dialog or selection ended without an answer.
#[derive(Debug)]
pub enum InteractionError {
    Timeout,
    /// The user answered with the cancel word, or the session was cancelled.
    Cancelled,
    /// The answer to a selection was not one of the options, twice.
    InvalidSelection(String),
    /// Every attempt at answering a dialog prompt was rejected.
    InvalidAnswer(ResolveError),
    /// The user already has a pending session in this channel.
    SessionInUse,
    /// A selection was requested with no options.
    NoOptions,
    /// Sending a prompt failed.
    Client(anyhow::Error),
}
impl Display for InteractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => f.write_str("timed out waiting for an answer"),
            Self::Cancelled => f.write_str("interaction was cancelled"),
            Self::InvalidSelection(answer) => write!(f, "`{answer}` is not one of the options"),
            Self::InvalidAnswer(e) => write!(f, "invalid answer: {e}"),
            Self::SessionInUse => f.write_str("an answer is already pending in this channel"),
            Self::NoOptions => f.write_str("no options to select from"),
            Self::Client(e) => write!(f, "failed to send a prompt: {e:#}"),
        }
    }
}
impl std::error::Error for InteractionError {}
impl GetErrorSeverity for InteractionError {
    fn get_severity(&self) -> ErrorSeverity {
        match self {
            Self::Client(_) => ErrorSeverity::High,
            Self::InvalidAnswer(e) => e.get_severity(),
            _ => ErrorSeverity::Low,
        }
    }
}

/// Sends replies on behalf of one invocation.
#[derive(Clone)]
pub struct Responder {
    navi: ThreadSafeNavi,
    channel_id: Id<ChannelMarker>,
    guild_id: Option<Id<GuildMarker>>,
    author: Author,
    locale: String,
    namespace: Option<String>,
    /// Type resolvers of the invoked command, consulted before the global ones.
    types: Option<Arc<TypeRegistry>>,
}
impl Responder {
    pub fn new(navi: ThreadSafeNavi, container: &Container, namespace: Option<String>) -> Self {
        Self {
            navi,
            channel_id: container.message.channel_id,
            guild_id: container.message.guild_id,
            author: container.message.author.clone(),
            locale: container.locale.clone(),
            namespace,
            types: None,
        }
    }

    pub fn with_types(mut self, types: Option<Arc<TypeRegistry>>) -> Self {
        self.types = types;
        self
    }

    pub fn navi(&self) -> &ThreadSafeNavi {
        &self.navi
    }

    pub fn channel_id(&self) -> Id<ChannelMarker> {
        self.channel_id
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    /// Localizes and decorates a reply without sending it.
    pub fn render(&self, reply: &Reply) -> String {
        reply.render(&self.navi.locales, &self.locale, self.namespace.as_deref())
    }

    /// Sends a reply to the invocation's channel.
    pub async fn send(&self, reply: impl Into<Reply>) -> anyhow::Result<SentMessage> {
        let reply = reply.into();
        let mut content = self.render(&reply);
        trim_content_fits(&mut content);

        let sent = self.navi.client.create_message(self.channel_id, content.into()).await?;

        if let Some(delay) = reply.delete_after {
            let client = self.navi.client.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Err(e) = client.delete_message(sent.channel_id, sent.message_id).await {
                    warn!("Failed to delete message {}: {e:#}", sent.message_id);
                }
            });
        }

        Ok(sent)
    }

    /// Sends a reply addressed to the author by name.
    pub async fn reply(&self, reply: impl Into<Reply>) -> anyhow::Result<SentMessage> {
        self.send(reply.into().addressed_to(&self.author.name)).await
    }

    pub async fn success(&self, reply: impl Into<Reply>) -> anyhow::Result<SentMessage> {
        self.send(reply.into().emoji_or("white_check_mark")).await
    }

    pub async fn error(&self, reply: impl Into<Reply>) -> anyhow::Result<SentMessage> {
        self.send(reply.into().emoji_or("warning")).await
    }

    pub async fn typing(&self) -> anyhow::Result<()> {
        self.navi.client.trigger_typing(self.channel_id).await
    }

    pub async fn edit(&self, message: SentMessage, reply: impl Into<Reply>) -> anyhow::Result<()> {
        let mut content = self.render(&reply.into());
        trim_content_fits(&mut content);
        self.navi.client.update_message(message, content.into()).await
    }

    pub async fn delete(&self, message: SentMessage) -> anyhow::Result<()> {
        self.navi
            .client
            .delete_message(message.channel_id, message.message_id)
            .await
    }

    /// Answers a refused invocation. Admin-only refusals stay silent.
    pub(crate) async fn reject(&self, rejection: &GateRejection) {
        let result = match rejection {
            GateRejection::AdminOnly => return,
            GateRejection::GuildOnly => self.error("{{%errors.NO_PMS}}").await,
            GateRejection::MissingPermissions(p) => {
                self.error(Reply::new("{{%errors.NO_PERMS}}").param("perms", &format_permissions(*p)))
                    .await
            },
            GateRejection::BotMissingPermissions(p) => {
                self.error(Reply::new("{{%errors.NO_PERMS_BOT}}").param("perms", &format_permissions(*p)))
                    .await
            },
            GateRejection::Cooldown(left) => {
                let reply = Reply::new("{{%errors.ON_COOLDOWN}}")
                    .emoji("hourglass")
                    .param("time", &ceil_secs(*left).bold())
                    .delete_after(COOLDOWN_NOTICE);
                self.reply(reply).await
            },
        };

        if let Err(e) = result {
            warn!("Failed to send rejection: {e:#}");
        }
    }

    /// Tells the user why their dialog or selection ended.
    pub(crate) async fn interaction_failed(&self, error: &InteractionError) -> anyhow::Result<()> {
        let reply = match error {
            InteractionError::Timeout => Reply::new("{{%errors.INTERACTION_TIMEOUT}}"),
            InteractionError::Cancelled => Reply::new("{{%errors.INTERACTION_CANCELLED}}"),
            InteractionError::InvalidSelection(answer) => {
                Reply::new("{{%errors.INVALID_SELECTION}}").param("answer", &answer.escape_codestring())
            },
            InteractionError::InvalidAnswer(e) => Reply::new(format!("{{{{%errors.{}}}}}", e.kind())).params(e.params()),
            InteractionError::SessionInUse => Reply::new("{{%errors.SESSION_IN_USE}}"),
            InteractionError::NoOptions => Reply::new("{{%errors.NO_OPTIONS}}"),
            InteractionError::Client(_) => Reply::new("{{%errors.HANDLER_FAULT}}"),
        };

        self.error(reply).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{MockClient, container, mock_navi};

    #[tokio::test(start_paused = true)]
    async fn cooldown_notice_deletes_itself() {
        let client = MockClient::new();
        let navi = mock_navi(client.clone());
        let responder = Responder::new(navi, &container(7, Some(10), "ping"), None);

        responder.reject(&GateRejection::Cooldown(Duration::from_millis(2500))).await;
        assert_eq!(
            client.sent_contents(),
            vec![":hourglass:  |  **user7**, Slow down! You can use this command again in **3** seconds.".to_owned()]
        );

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(client.deleted().len(), 1);
    }

    #[tokio::test]
    async fn admin_only_rejections_are_silent() {
        let client = MockClient::new();
        let navi = mock_navi(client.clone());
        let responder = Responder::new(navi, &container(7, Some(10), "ping"), None);

        responder.reject(&GateRejection::AdminOnly).await;
        responder.reject(&GateRejection::GuildOnly).await;
        assert_eq!(
            client.sent_contents(),
            vec![":warning:  |  This command can only be used in a server.".to_owned()]
        );
    }

    #[tokio::test]
    async fn namespaced_keys_use_the_command_namespace() {
        let client = MockClient::new();
        let navi = mock_navi(client.clone());
        let responder = Responder::new(navi, &container(7, Some(10), "kick"), Some("moderation".to_owned()));

        // unknown keys fall back to the key itself
        responder
            .success(Reply::new("{{kick.SUCCESS}}").param("member", "bob"))
            .await
            .unwrap();
        assert_eq!(client.sent_contents(), vec![":white_check_mark:  |  kick.SUCCESS".to_owned()]);
    }

    #[tokio::test]
    async fn long_replies_are_trimmed() {
        let client = MockClient::new();
        let navi = mock_navi(client.clone());
        let responder = Responder::new(navi, &container(7, Some(10), "ping"), None);

        responder.send("a".repeat(2100)).await.unwrap();
        assert_eq!(client.sent_contents()[0].len(), 2000);
    }
}
