//! Admission checks run before a command's arguments are resolved.

use std::fmt::Display;
use std::time::Duration;

use moka::ops::compute::{CompResult, Op};
use moka::sync::Cache;
use tokio::time::Instant;
use twilight_model::guild::Permissions;
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;

use super::Container;
use super::command::CommandOptions;
use crate::platform::ChatClient;

/// Why an invocation was not allowed to proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateRejection {
    /// The command is restricted to administrators. Never answered.
    AdminOnly,
    GuildOnly,
    MissingPermissions(Permissions),
    BotMissingPermissions(Permissions),
    /// Time left until the caller may use the command again.
    Cooldown(Duration),
}
impl GateRejection {
    /// Label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::AdminOnly => "admin_only",
            Self::GuildOnly => "guild_only",
            Self::MissingPermissions(_) => "permissions",
            Self::BotMissingPermissions(_) => "bot_permissions",
            Self::Cooldown(_) => "cooldown",
        }
    }
}
impl Display for GateRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AdminOnly => f.write_str("command is restricted to administrators"),
            Self::GuildOnly => f.write_str("command cannot be used in direct messages"),
            Self::MissingPermissions(p) => write!(f, "caller is missing {}", format_permissions(*p)),
            Self::BotMissingPermissions(p) => write!(f, "bot is missing {}", format_permissions(*p)),
            Self::Cooldown(left) => write!(f, "on cooldown for another {left:?}"),
        }
    }
}

/// Renders permission flags as `` `KICK_MEMBERS`, `BAN_MEMBERS` ``.
pub fn format_permissions(permissions: Permissions) -> String {
    permissions
        .iter_names()
        .map(|(name, _)| format!("`{name}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Last invocation time per user, for one command node.
///
/// Entries expire from the table on their own once the cooldown has passed, so the table stays
/// bounded without a sweeping task.
pub struct CooldownTimers {
    cooldown: Duration,
    table: Option<Cache<Id<UserMarker>, Instant>>,
}
impl CooldownTimers {
    /// A zero cooldown disables the timers entirely.
    pub fn new(cooldown: Duration) -> Self {
        let table = (!cooldown.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(10000)
                .time_to_live(cooldown)
                .build()
        });

        Self { cooldown, table }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Stamps the user's timer unless it is still running, in which case the remaining time is
    /// returned and the timer is left untouched. Reading and stamping happen under the key's lock,
    /// so concurrent invocations by one user admit at most one.
    pub fn check(&self, user: Id<UserMarker>) -> Result<(), Duration> {
        let Some(table) = &self.table else {
            return Ok(());
        };

        let now = Instant::now();
        let result = table.entry(user).and_compute_with(|entry| match entry {
            Some(last) if now.saturating_duration_since(*last.value()) < self.cooldown => Op::Nop,
            _ => Op::Put(now),
        });

        match result {
            CompResult::Unchanged(last) => Err(self.cooldown - now.saturating_duration_since(*last.value())),
            _ => Ok(()),
        }
    }

    pub fn tracked_users(&self) -> u64 {
        self.table.as_ref().map_or(0, |t| {
            t.run_pending_tasks();
            t.entry_count()
        })
    }
}

/// Runs every admission check for an invocation, stopping at the first failure.
///
/// Administrators pass the permission checks and the cooldown, but not the guild-only check.
pub fn check(
    container: &Container,
    options: &CommandOptions,
    timers: &CooldownTimers,
    client: &dyn ChatClient,
) -> Result<(), GateRejection> {
    let message = &container.message;
    let is_admin = container.is_admin();

    if options.is_admin_only() && !is_admin {
        return Err(GateRejection::AdminOnly);
    }

    if options.is_guild_only() && container.is_private {
        return Err(GateRejection::GuildOnly);
    }

    let permissions = options.required_permissions();
    if !permissions.is_empty()
        && !is_admin
        && !client.has_permissions(message.channel_id, message.author.id, permissions)
    {
        return Err(GateRejection::MissingPermissions(permissions));
    }

    let bot_permissions = options.required_bot_permissions();
    if !bot_permissions.is_empty() && !client.has_permissions(message.channel_id, client.bot_id(), bot_permissions) {
        return Err(GateRejection::BotMissingPermissions(bot_permissions));
    }

    if is_admin {
        return Ok(());
    }

    timers.check(message.author.id).map_err(GateRejection::Cooldown)
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use super::*;
    use crate::test_util::{ADMIN, BOT, MockClient, container};

    fn options() -> CommandOptions {
        CommandOptions::default()
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_rejects_until_expiry() {
        let client = MockClient::new();
        let timers = CooldownTimers::new(Duration::from_secs(5));
        let ctr = container(7, Some(10), "ping");

        assert_eq!(check(&ctr, &options(), &timers, &client), Ok(()));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(
            check(&ctr, &options(), &timers, &client),
            Err(GateRejection::Cooldown(Duration::from_secs(3)))
        );

        // the rejected attempt did not restart the timer
        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(check(&ctr, &options(), &timers, &client), Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn separate_invocations_six_seconds_apart_both_pass() {
        let client = MockClient::new();
        let timers = CooldownTimers::new(Duration::from_secs(5));
        let ctr = container(7, Some(10), "ping");

        assert_eq!(check(&ctr, &options(), &timers, &client), Ok(()));
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(check(&ctr, &options(), &timers, &client), Ok(()));
    }

    #[test]
    fn simultaneous_invocations_admit_one() {
        const THREADS: usize = 16;
        let timers = CooldownTimers::new(Duration::from_secs(60));

        for user in 1..=200 {
            let barrier = Barrier::new(THREADS);
            let admitted = thread::scope(|s| {
                let handles = (0..THREADS)
                    .map(|_| {
                        s.spawn(|| {
                            barrier.wait();
                            timers.check(Id::new(user)).is_ok()
                        })
                    })
                    .collect::<Vec<_>>();

                handles.into_iter().filter_map(|h| h.join().ok()).filter(|ok| *ok).count()
            });

            assert_eq!(admitted, 1, "user {user}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cooldowns_are_per_user() {
        let client = MockClient::new();
        let timers = CooldownTimers::new(Duration::from_secs(5));

        assert!(check(&container(7, Some(10), "x"), &options(), &timers, &client).is_ok());
        assert!(check(&container(8, Some(10), "x"), &options(), &timers, &client).is_ok());
        assert!(check(&container(7, Some(10), "x"), &options(), &timers, &client).is_err());
        assert_eq!(timers.tracked_users(), 2);
    }

    #[tokio::test]
    async fn zero_cooldown_is_disabled() {
        let client = MockClient::new();
        let timers = CooldownTimers::new(Duration::ZERO);
        let ctr = container(7, Some(10), "ping");

        for _ in 0..3 {
            assert_eq!(check(&ctr, &options(), &timers, &client), Ok(()));
        }
        assert_eq!(timers.tracked_users(), 0);
    }

    #[tokio::test]
    async fn admins_bypass_everything_but_guild_only() {
        let client = MockClient::new();
        let timers = CooldownTimers::new(Duration::from_secs(5));
        let opts = options().admin_only(true).permissions(Permissions::BAN_MEMBERS);

        let ctr = container(ADMIN, Some(10), "ban");
        for _ in 0..3 {
            assert_eq!(check(&ctr, &opts, &timers, &client), Ok(()));
        }

        let opts = opts.guild_only(true);
        let ctr = container(ADMIN, None, "ban");
        assert_eq!(check(&ctr, &opts, &timers, &client), Err(GateRejection::GuildOnly));
    }

    #[tokio::test]
    async fn admin_only_is_checked_first() {
        let client = MockClient::new();
        let timers = CooldownTimers::new(Duration::from_secs(5));
        let opts = options().admin_only(true).guild_only(true);

        let ctr = container(7, None, "secret");
        assert_eq!(check(&ctr, &opts, &timers, &client), Err(GateRejection::AdminOnly));
        assert_eq!(timers.tracked_users(), 0);
    }

    #[tokio::test]
    async fn caller_and_bot_permissions() {
        let client = MockClient::new();
        let timers = CooldownTimers::new(Duration::ZERO);
        let opts = options()
            .permissions(Permissions::KICK_MEMBERS)
            .bot_permissions(Permissions::KICK_MEMBERS);
        let ctr = container(7, Some(10), "kick");

        assert_eq!(
            check(&ctr, &opts, &timers, &client),
            Err(GateRejection::MissingPermissions(Permissions::KICK_MEMBERS))
        );

        client.grant(7, Permissions::KICK_MEMBERS);
        assert_eq!(
            check(&ctr, &opts, &timers, &client),
            Err(GateRejection::BotMissingPermissions(Permissions::KICK_MEMBERS))
        );

        client.grant(BOT, Permissions::KICK_MEMBERS | Permissions::SEND_MESSAGES);
        assert_eq!(check(&ctr, &opts, &timers, &client), Ok(()));
    }

    #[test]
    fn permission_names() {
        assert_eq!(
            format_permissions(Permissions::KICK_MEMBERS | Permissions::MANAGE_GUILD),
            "`KICK_MEMBERS`, `MANAGE_GUILD`"
        );
    }
}
