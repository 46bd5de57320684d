//! Pending dialogs and selections, keyed by (user, channel).
//!
//! While a session is open, every message from that user in that channel is routed to the waiting
//! handler instead of going through middleware and dispatch. Messages from anyone else, or from
//! the same user elsewhere, are unaffected.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::debug;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, UserMarker};

use super::InteractionError;
use crate::platform::Message;

type SessionKey = (Id<UserMarker>, Id<ChannelMarker>);

struct SessionEntry {
    id: u64,
    sender: UnboundedSender<Message>,
}

#[derive(Default)]
struct SessionTable {
    next_id: AtomicU64,
    pending: Mutex<HashMap<SessionKey, SessionEntry>>,
}

#[derive(Clone, Default)]
pub struct Sessions(Arc<SessionTable>);
impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<SessionKey, SessionEntry>> {
        self.0.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Opens a session for a user in a channel. A user can only wait on one answer per channel.
    pub fn open(&self, user: Id<UserMarker>, channel: Id<ChannelMarker>) -> Result<Session, InteractionError> {
        let mut pending = self.pending();
        if pending.contains_key(&(user, channel)) {
            return Err(InteractionError::SessionInUse);
        }

        let id = self.0.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = unbounded_channel();
        pending.insert((user, channel), SessionEntry { id, sender });

        Ok(Session {
            sessions: self.clone(),
            key: (user, channel),
            id,
            receiver,
        })
    }

    /// Hands a message to the session waiting on its author and channel. The message is given
    /// back if there is none.
    pub fn offer(&self, message: Message) -> Result<(), Message> {
        let key = (message.author.id, message.channel_id);
        let mut pending = self.pending();

        let Some(entry) = pending.get(&key) else {
            return Err(message);
        };

        match entry.sender.send(message) {
            Ok(()) => Ok(()),
            Err(returned) => {
                // the waiting side went away without cleaning up
                pending.remove(&key);
                Err(returned.0)
            },
        }
    }

    /// Cancels a pending session; the waiting handler sees [`InteractionError::Cancelled`].
    pub fn cancel(&self, user: Id<UserMarker>, channel: Id<ChannelMarker>) -> bool {
        self.pending().remove(&(user, channel)).is_some()
    }

    pub fn is_pending(&self, user: Id<UserMarker>, channel: Id<ChannelMarker>) -> bool {
        self.pending().contains_key(&(user, channel))
    }

    pub fn len(&self) -> usize {
        self.pending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An open session. Dropping it closes the session.
pub struct Session {
    sessions: Sessions,
    key: SessionKey,
    id: u64,
    receiver: UnboundedReceiver<Message>,
}
impl Session {
    /// Waits for the next message from the user.
    pub async fn next(&mut self, timeout: Duration) -> Result<Message, InteractionError> {
        match tokio::time::timeout(timeout, self.receiver.recv()).await {
            Ok(Some(message)) => Ok(message),
            Ok(None) => Err(InteractionError::Cancelled),
            Err(_) => {
                debug!("session for {:?} timed out", self.key);
                Err(InteractionError::Timeout)
            },
        }
    }
}
impl Drop for Session {
    fn drop(&mut self) {
        let mut pending = self.sessions.pending();
        // only remove our own entry, the key may already belong to a newer session
        if pending.get(&self.key).is_some_and(|e| e.id == self.id) {
            pending.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{CHANNEL, message};

    fn key(user: u64) -> (Id<UserMarker>, Id<ChannelMarker>) {
        (Id::new(user), Id::new(CHANNEL))
    }

    #[tokio::test]
    async fn messages_reach_only_their_session() {
        let sessions = Sessions::new();
        let (user, channel) = key(7);
        let mut session = sessions.open(user, channel).unwrap();

        assert!(sessions.offer(message(8, Some(10), "from someone else")).is_err());
        assert!(sessions.offer(message(7, Some(10), "answer")).is_ok());

        let received = session.next(Duration::from_secs(1)).await.unwrap();
        assert_eq!(received.content, "answer");
    }

    #[tokio::test]
    async fn one_session_per_user_and_channel() {
        let sessions = Sessions::new();
        let (user, channel) = key(7);

        let session = sessions.open(user, channel).unwrap();
        assert!(matches!(sessions.open(user, channel), Err(InteractionError::SessionInUse)));
        assert!(sessions.open(Id::new(8), channel).is_ok());

        drop(session);
        assert!(!sessions.is_pending(user, channel));
        assert!(sessions.open(user, channel).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_times_out() {
        let sessions = Sessions::new();
        let (user, channel) = key(7);
        let mut session = sessions.open(user, channel).unwrap();

        let err = session.next(Duration::from_secs(30)).await.unwrap_err();
        assert!(matches!(err, InteractionError::Timeout));
    }

    #[tokio::test]
    async fn cancelling_wakes_the_waiter() {
        let sessions = Sessions::new();
        let (user, channel) = key(7);
        let mut session = sessions.open(user, channel).unwrap();

        assert!(sessions.cancel(user, channel));
        let err = session.next(Duration::from_secs(30)).await.unwrap_err();
        assert!(matches!(err, InteractionError::Cancelled));
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn stale_guard_does_not_remove_newer_session() {
        let sessions = Sessions::new();
        let (user, channel) = key(7);

        let old = sessions.open(user, channel).unwrap();
        sessions.cancel(user, channel);
        let _new = sessions.open(user, channel).unwrap();

        drop(old);
        assert!(sessions.is_pending(user, channel));
    }
}
