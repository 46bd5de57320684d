use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use navi_common::err;
use navi_common::util::discord::user_mention_to_id;
use navi_string_fmt::Markdown;
use rand::seq::SliceRandom;
use tracing::{debug, warn};
use twilight_model::guild::Permissions;

use super::arguments::{ResolveCtxt, TypeRegistry};
use super::errors::{CommandBuildError, ErrorSeverity, GetErrorSeverity, ResolveError};
use super::gate::{self, CooldownTimers};
use super::resolver::ArgumentResolver;
use super::usage::{UsageSpec, usage_string};
use super::{Container, DispatchOutcome};
use crate::navi::ThreadSafeNavi;
use crate::responder::{InteractionError, Reply, Responder};

pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// A command handler: receives the invocation with its resolved arguments and a responder bound
/// to it.
pub type HandlerFn = Arc<dyn Fn(Container, Responder) -> HandlerFuture + Send + Sync>;

fn handler_fn<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(Container, Responder) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |ctr, responder| Box::pin(f(ctr, responder)))
}

async fn noop(_: Container, _: Responder) -> anyhow::Result<()> {
    Ok(())
}

const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Restrictions on who may run a command, and where.
///
/// Every option is tri-state: unset options of a subcommand fall back to its parent's.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOptions {
    guild_only: Option<bool>,
    admin_only: Option<bool>,
    permissions: Option<Permissions>,
    bot_permissions: Option<Permissions>,
    hidden: Option<bool>,
    locale_key: Option<String>,
}
impl CommandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guild_only(mut self, guild_only: bool) -> Self {
        self.guild_only = Some(guild_only);
        self
    }

    pub fn admin_only(mut self, admin_only: bool) -> Self {
        self.admin_only = Some(admin_only);
        self
    }

    /// Adds to the permissions the caller needs.
    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(self.permissions.unwrap_or_else(Permissions::empty) | permissions);
        self
    }

    /// Restricts the command to members who can manage the guild.
    pub fn mod_only(self) -> Self {
        self.permissions(Permissions::MANAGE_GUILD)
    }

    /// Adds to the permissions the bot itself needs.
    pub fn bot_permissions(mut self, permissions: Permissions) -> Self {
        self.bot_permissions = Some(self.bot_permissions.unwrap_or_else(Permissions::empty) | permissions);
        self
    }

    /// Hides the command from help listings.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    /// Namespace for the command's own locale keys.
    pub fn locale_key(mut self, key: &str) -> Self {
        self.locale_key = Some(key.to_owned());
        self
    }

    pub fn is_guild_only(&self) -> bool {
        self.guild_only.unwrap_or(false)
    }

    pub fn is_admin_only(&self) -> bool {
        self.admin_only.unwrap_or(false)
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden.unwrap_or(false)
    }

    pub fn required_permissions(&self) -> Permissions {
        self.permissions.unwrap_or_else(Permissions::empty)
    }

    pub fn required_bot_permissions(&self) -> Permissions {
        self.bot_permissions.unwrap_or_else(Permissions::empty)
    }

    pub fn get_locale_key(&self) -> Option<&str> {
        self.locale_key.as_deref()
    }

    /// Fills every unset option from `parent`.
    pub fn inherit(&self, parent: &CommandOptions) -> CommandOptions {
        CommandOptions {
            guild_only: self.guild_only.or(parent.guild_only),
            admin_only: self.admin_only.or(parent.admin_only),
            permissions: self.permissions.or(parent.permissions),
            bot_permissions: self.bot_permissions.or(parent.bot_permissions),
            hidden: self.hidden.or(parent.hidden),
            locale_key: self.locale_key.clone().or_else(|| parent.locale_key.clone()),
        }
    }
}

/// An example invocation shown in help and usage errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Example {
    /// Arguments after the trigger.
    pub args: String,
    pub description: String,
}
impl Example {
    pub fn new(args: &str, description: &str) -> Self {
        Self {
            args: args.to_owned(),
            description: description.to_owned(),
        }
    }
}

pub struct Subcommand {
    pub name: String,
    pub usage: Vec<UsageSpec>,
    /// Already merged with the parent's options.
    pub options: CommandOptions,
    pub examples: Vec<Example>,
    handler: HandlerFn,
}

#[derive(Clone)]
pub struct SubcommandBuilder {
    name: String,
    aliases: Vec<String>,
    usage: Vec<UsageSpec>,
    options: CommandOptions,
    examples: Vec<Example>,
    handler: Option<HandlerFn>,
}
impl SubcommandBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            aliases: vec![],
            usage: vec![],
            options: CommandOptions::default(),
            examples: vec![],
            handler: None,
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_owned());
        self
    }

    pub fn usage(mut self, spec: UsageSpec) -> Self {
        self.usage.push(spec);
        self
    }

    pub fn options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }

    pub fn example(mut self, args: &str, description: &str) -> Self {
        self.examples.push(Example::new(args, description));
        self
    }

    pub fn handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Container, Responder) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.handler = Some(handler_fn(f));
        self
    }
}

/// Declarative description of a command, turned into a [`CommandNode`] by [`CommandBuilder::build`].
pub struct CommandBuilder {
    name: Option<String>,
    aliases: Vec<String>,
    description: String,
    group: String,
    usage: Vec<UsageSpec>,
    options: CommandOptions,
    cooldown: Duration,
    subcommands: Vec<SubcommandBuilder>,
    fixed_subcommand: Option<String>,
    examples: Vec<Example>,
    handler: Option<HandlerFn>,
    types: TypeRegistry,
}
impl CommandBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_owned()),
            ..Self::unnamed()
        }
    }

    /// A command known only by its aliases.
    pub fn unnamed() -> Self {
        Self {
            name: None,
            aliases: vec![],
            description: String::new(),
            group: "misc".to_owned(),
            usage: vec![],
            options: CommandOptions::default(),
            cooldown: DEFAULT_COOLDOWN,
            subcommands: vec![],
            fixed_subcommand: None,
            examples: vec![],
            handler: None,
            types: TypeRegistry::new(),
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_owned());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    pub fn group(mut self, group: &str) -> Self {
        self.group = group.to_owned();
        self
    }

    pub fn usage(mut self, spec: UsageSpec) -> Self {
        self.usage.push(spec);
        self
    }

    pub fn options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }

    /// Zero disables the cooldown.
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn subcommand(mut self, subcommand: SubcommandBuilder) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    /// Always routes to the named subcommand without consuming a token.
    pub fn fixed_subcommand(mut self, name: &str) -> Self {
        self.fixed_subcommand = Some(name.to_owned());
        self
    }

    pub fn example(mut self, args: &str, description: &str) -> Self {
        self.examples.push(Example::new(args, description));
        self
    }

    /// Registers a type resolver used only by this command.
    pub fn type_resolver(mut self, kind: &str, resolver: impl super::arguments::TypeResolver + 'static) -> Self {
        self.types.register(kind, resolver);
        self
    }

    /// The handler run when no subcommand matched. Without one, such invocations do nothing.
    pub fn handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Container, Responder) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.handler = Some(handler_fn(f));
        self
    }

    pub fn build(self) -> Result<CommandNode, CommandBuildError> {
        let triggers = self
            .name
            .iter()
            .chain(self.aliases.iter())
            .map(|t| t.to_lowercase())
            .collect::<Vec<_>>();

        if triggers.is_empty() {
            return Err(CommandBuildError::Unnamed);
        }

        let mut subcommands = HashMap::new();
        for builder in self.subcommands {
            let handler = builder
                .handler
                .ok_or_else(|| CommandBuildError::MissingHandler(builder.name.clone()))?;

            let subcommand = Arc::new(Subcommand {
                name: builder.name.clone(),
                usage: builder.usage,
                options: builder.options.inherit(&self.options),
                examples: builder.examples,
                handler,
            });

            for alias in std::iter::once(&builder.name).chain(builder.aliases.iter()) {
                subcommands.insert(alias.to_lowercase(), subcommand.clone());
            }
        }

        let fixed_subcommand = self.fixed_subcommand.map(|name| name.to_lowercase());
        if let Some(fixed) = &fixed_subcommand {
            if !subcommands.contains_key(fixed) {
                return Err(CommandBuildError::UnknownFixedSubcommand(fixed.clone()));
            }
        }

        let handler = self.handler.unwrap_or_else(|| handler_fn(noop));

        Ok(CommandNode {
            triggers,
            description: self.description,
            group: self.group,
            usage: self.usage,
            options: self.options,
            examples: self.examples,
            subcommands,
            fixed_subcommand,
            handler,
            resolver: ArgumentResolver::new(self.types),
            timers: CooldownTimers::new(self.cooldown),
        })
    }
}

/// A registered command, ready to be executed.
pub struct CommandNode {
    /// Primary name first, then aliases. Never empty.
    pub triggers: Vec<String>,
    pub description: String,
    pub group: String,
    pub usage: Vec<UsageSpec>,
    pub options: CommandOptions,
    pub examples: Vec<Example>,
    subcommands: HashMap<String, Arc<Subcommand>>,
    fixed_subcommand: Option<String>,
    handler: HandlerFn,
    resolver: ArgumentResolver,
    timers: CooldownTimers,
}
impl CommandNode {
    pub fn name(&self) -> &str {
        &self.triggers[0]
    }

    pub fn aliases(&self) -> &[String] {
        &self.triggers[1..]
    }

    /// `group.name`, for permission systems.
    pub fn permission_node(&self) -> String {
        format!("{}.{}", self.group, self.name())
    }

    pub fn usage_string(&self) -> String {
        usage_string(&self.usage)
    }

    pub fn is_hidden(&self) -> bool {
        self.options.is_hidden()
    }

    pub fn cooldown(&self) -> Duration {
        self.timers.cooldown()
    }

    pub fn subcommand(&self, alias: &str) -> Option<&Subcommand> {
        self.subcommands.get(&alias.to_lowercase()).map(Arc::as_ref)
    }

    /// Distinct subcommands, sorted by name.
    pub fn subcommands(&self) -> Vec<&Subcommand> {
        let mut subcommands = self
            .subcommands
            .iter()
            .filter(|(alias, s)| **alias == s.name)
            .map(|(_, s)| s.as_ref())
            .collect::<Vec<_>>();
        subcommands.sort_by(|a, b| a.name.cmp(&b.name));
        subcommands
    }

    fn locale_namespace(&self) -> String {
        self.options.get_locale_key().unwrap_or(&self.group).to_owned()
    }

    /// Routes to a subcommand, if one matches, adjusting the token stream and trigger.
    fn match_subcommand(&self, container: &mut Container) -> Option<Arc<Subcommand>> {
        let alias = match &self.fixed_subcommand {
            Some(fixed) => fixed.clone(),
            None => container.raw_args.first()?.to_lowercase(),
        };
        let subcommand = self.subcommands.get(&alias)?.clone();

        if self.fixed_subcommand.is_none() {
            container.raw_args.remove(0);
        }
        container.trigger = format!("{} {}", container.trigger, subcommand.name);

        Some(subcommand)
    }

    /// Runs one invocation through the gate, the argument resolver and the handler.
    ///
    /// Every user-facing failure is answered here; only handler faults are reported further.
    pub async fn execute(&self, navi: &ThreadSafeNavi, mut container: Container) -> DispatchOutcome {
        let subcommand = self.match_subcommand(&mut container);
        let (usage, examples, options, handler) = match &subcommand {
            Some(s) => (&s.usage, &s.examples, &s.options, &s.handler),
            None => (&self.usage, &self.examples, &self.options, &self.handler),
        };

        let responder = Responder::new(navi.clone(), &container, Some(self.locale_namespace()))
            .with_types(self.resolver.overlay());

        if let Err(rejection) = gate::check(&container, options, &self.timers, navi.client.as_ref()) {
            debug!("{} rejected for {}: {rejection}", container.trigger, container.message.author.id);
            navi.metrics_handler.add_gate_rejection(rejection.reason());
            responder.reject(&rejection).await;
            return DispatchOutcome::Rejected;
        }

        let ctxt = ResolveCtxt {
            client: navi.client.as_ref(),
            guild_id: container.message.guild_id,
        };
        let extra = [
            ("prefix", container.prefix.as_str()),
            ("command", container.trigger.as_str()),
        ];

        let resolved = self
            .resolver
            .resolve(&navi.types, &ctxt, &container.raw_args, &extra, usage)
            .await;

        match resolved {
            Ok(args) => container.args = args,
            Err(e) if e.is_usage_error() => {
                let prefix = display_prefix(&container, &navi.config.bot.default_prefix);
                let text = usage_error(&prefix, &container.trigger, usage, examples);
                send_or_warn(responder.error(text).await);
                return DispatchOutcome::UsageError;
            },
            Err(e) => {
                report_resolve_error(&container, &e);
                let reply = Reply::new(format!("{{{{%errors.{}}}}}", e.kind())).params(e.params());
                send_or_warn(responder.error(reply).await);
                return DispatchOutcome::ResolutionFailed;
            },
        }

        let trigger = container.trigger.clone();
        let result = AssertUnwindSafe(handler(container, responder.clone()))
            .catch_unwind()
            .await;

        let fault = match result {
            Ok(Ok(())) => return DispatchOutcome::Handled,
            Ok(Err(e)) => match e.downcast_ref::<InteractionError>() {
                Some(interaction) if interaction.get_severity() == ErrorSeverity::Low => {
                    debug!("{trigger}: interaction ended early: {interaction}");
                    send_or_warn(responder.interaction_failed(interaction).await);
                    return DispatchOutcome::Interrupted;
                },
                _ => format!("{e:#}"),
            },
            Err(panic) => panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "handler panicked".to_owned()),
        };

        err!("Command {trigger} failed: {fault}");
        navi.metrics_handler.add_handler_fault();
        send_or_warn(responder.error("{{%errors.HANDLER_FAULT}}").await);

        DispatchOutcome::Faulted
    }
}

fn report_resolve_error(container: &Container, e: &ResolveError) {
    match e.get_severity() {
        ErrorSeverity::High => err!("Resolving arguments for {} failed: {e}", container.trigger),
        ErrorSeverity::Low => debug!("{}: {e}", container.trigger),
    }
}

fn send_or_warn<T>(result: anyhow::Result<T>) {
    if let Err(e) = result {
        warn!("Failed to send reply: {e:#}");
    }
}

/// The prefix to show in help text. A mention is replaced by the guild's prefix, or the default.
fn display_prefix(container: &Container, default_prefix: &str) -> String {
    if user_mention_to_id(&container.prefix).is_none() {
        return container.prefix.clone();
    }

    container
        .settings
        .prefix
        .clone()
        .unwrap_or_else(|| default_prefix.to_owned())
}

/// Builds the reply for a missing or mismatched argument: the correct usage, a random example,
/// and where to find more help.
fn usage_error(prefix: &str, trigger: &str, usage: &[UsageSpec], examples: &[Example]) -> Reply {
    let example = examples.choose(&mut rand::thread_rng());

    let mut lines = vec!["{{%errors.usage.LINE_USAGE}}".to_owned()];
    if example.is_some() {
        lines.push(":white_small_square:  |  {{%errors.usage.LINE_EXAMPLE}}".to_owned());
    }
    lines.push(":white_small_square:  |  {{%errors.usage.LINE_HELP}}".to_owned());

    let usage = format!("{prefix}{trigger} {}", usage_string(usage));
    let mut reply = Reply::new(lines.join("\n"))
        .param("usage", &usage.trim_end().codestring())
        .param("command", &format!("{prefix}help {}", trigger.replacen(' ', ".", 1)).codestring());

    if let Some(example) = example {
        let example = format!("{prefix}{trigger} {}", example.args);
        reply = reply.param("example", &example.trim_end().codestring());
    }

    reply
}
