//! Type resolvers: turning raw tokens into typed argument values.
//!
//! A resolver is looked up by the type tag of a [`UsageSpec`]. Resolvers always see the remaining
//! tokens of the invocation; for an argument marked `last` the caller has already joined every remaining
//! token into one.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use navi_common::util::discord::{channel_mention_to_id, role_mention_to_id, snowflake, user_mention_to_id};
use twilight_model::id::Id;
use twilight_model::id::marker::GuildMarker;

use super::errors::ResolveError;
use super::usage::UsageSpec;
use crate::platform::{Channel, ChatClient, Member, Role};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    /// One value out of a fixed set, with its position in that set.
    Choice {
        index: usize,
        value: String,
    },
    Member(Member),
    Channel(Channel),
    Role(Role),
}

/// A successfully resolved value and how many tokens it used up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub consumed: usize,
    pub value: ArgValue,
}
impl Resolved {
    pub fn single(value: ArgValue) -> Self {
        Self { consumed: 1, value }
    }
}

/// What a resolver may use besides the tokens themselves.
pub struct ResolveCtxt<'a> {
    pub client: &'a dyn ChatClient,
    /// Guild the invocation happened in. Entity lookups are impossible without one.
    pub guild_id: Option<Id<GuildMarker>>,
}

#[async_trait]
pub trait TypeResolver: Send + Sync {
    async fn resolve(&self, ctxt: &ResolveCtxt<'_>, tokens: &[String], spec: &UsageSpec)
    -> Result<Resolved, ResolveError>;
}

/// Plain functions are resolvers that need no context.
#[async_trait]
impl<F> TypeResolver for F
where
    F: Fn(&[String], &UsageSpec) -> Result<Resolved, ResolveError> + Send + Sync,
{
    async fn resolve(
        &self,
        _: &ResolveCtxt<'_>,
        tokens: &[String],
        spec: &UsageSpec,
    ) -> Result<Resolved, ResolveError> {
        self(tokens, spec)
    }
}

/// Maps type tags to resolvers.
///
/// The engine holds one process-wide registry. Command nodes may carry a second, smaller registry
/// as an overlay, which shadows the global one for the tags it defines.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    resolvers: HashMap<String, Arc<dyn TypeResolver>>,
}
impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the `string`, `int`, `choice`, `member`, `channel` and `role` types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("string", resolve_string);
        registry.register("int", resolve_int);
        registry.register("choice", resolve_choice);
        registry.register("member", EntityResolver(EntityKind::Member));
        registry.register("channel", EntityResolver(EntityKind::Channel));
        registry.register("role", EntityResolver(EntityKind::Role));
        registry
    }

    /// Registers a resolver, replacing any previous one for the same tag.
    pub fn register(&mut self, kind: &str, resolver: impl TypeResolver + 'static) {
        self.resolvers.insert(kind.to_owned(), Arc::new(resolver));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.resolvers.contains_key(kind)
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Resolves one argument against the remaining tokens, preferring the overlay's resolver.
    pub async fn resolve(
        &self,
        overlay: Option<&TypeRegistry>,
        ctxt: &ResolveCtxt<'_>,
        tokens: &[String],
        spec: &UsageSpec,
    ) -> Result<Resolved, ResolveError> {
        let resolver = overlay
            .and_then(|o| o.resolvers.get(&spec.kind))
            .or_else(|| self.resolvers.get(&spec.kind))
            .ok_or_else(|| ResolveError::UnknownType(spec.kind.clone()))?;

        resolver.resolve(ctxt, tokens, spec).await
    }
}

fn first<'a>(tokens: &'a [String], spec: &UsageSpec) -> Result<&'a str, ResolveError> {
    tokens
        .first()
        .map(String::as_str)
        .ok_or_else(|| ResolveError::ArgsExhausted(spec.display_name.clone()))
}

fn find_choice(choices: &[String], token: &str) -> Option<usize> {
    choices.iter().position(|c| c.eq_ignore_ascii_case(token))
}

fn resolve_string(tokens: &[String], spec: &UsageSpec) -> Result<Resolved, ResolveError> {
    let token = first(tokens, spec)?;

    let value = match &spec.choices {
        Some(choices) if !choices.is_empty() => match find_choice(choices, token) {
            Some(index) => choices[index].clone(),
            None => {
                return Err(ResolveError::NotOneOf {
                    arg: token.to_owned(),
                    choices: choices.clone(),
                });
            },
        },
        _ => token.to_owned(),
    };

    Ok(Resolved::single(ArgValue::Str(value)))
}

fn resolve_int(tokens: &[String], spec: &UsageSpec) -> Result<Resolved, ResolveError> {
    let token = first(tokens, spec)?;
    let value = token
        .parse::<i64>()
        .map_err(|_| ResolveError::NotInt(token.to_owned()))?;

    match spec.min {
        Some(min) if value < min => Err(ResolveError::BelowMinimum {
            name: spec.display_name.clone(),
            min,
        }),
        _ => Ok(Resolved::single(ArgValue::Int(value))),
    }
}

fn resolve_choice(tokens: &[String], spec: &UsageSpec) -> Result<Resolved, ResolveError> {
    let choices = match &spec.choices {
        Some(choices) if !choices.is_empty() => choices,
        _ => return Err(ResolveError::NoChoices(spec.display_name.clone())),
    };
    let token = first(tokens, spec)?;

    let index = find_choice(choices, token).ok_or_else(|| ResolveError::NotOneOf {
        arg: token.to_owned(),
        choices: choices.clone(),
    })?;

    Ok(Resolved::single(ArgValue::Choice {
        index,
        value: choices[index].clone(),
    }))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Member,
    Channel,
    Role,
}
impl Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Member => "member",
            Self::Channel => "channel",
            Self::Role => "role",
        })
    }
}

/// Resolves a guild entity from a mention, a raw ID, or its name.
struct EntityResolver(EntityKind);
impl EntityResolver {
    async fn lookup(&self, client: &dyn ChatClient, guild_id: Id<GuildMarker>, token: &str) -> anyhow::Result<Option<ArgValue>> {
        Ok(match self.0 {
            EntityKind::Member => {
                let id = user_mention_to_id(token).or_else(|| snowflake(token)).and_then(Id::new_checked);
                let member = match id {
                    Some(id) => client.member(guild_id, id).await?,
                    None => client.find_member(guild_id, token).await?,
                };
                member.map(ArgValue::Member)
            },
            EntityKind::Channel => {
                let id = channel_mention_to_id(token).or_else(|| snowflake(token)).and_then(Id::new_checked);
                let channel = match id {
                    Some(id) => client.channel(guild_id, id).await?,
                    None => client.find_channel(guild_id, token).await?,
                };
                channel.map(ArgValue::Channel)
            },
            EntityKind::Role => {
                let id = role_mention_to_id(token).or_else(|| snowflake(token)).and_then(Id::new_checked);
                let role = match id {
                    Some(id) => client.role(guild_id, id).await?,
                    None => client.find_role(guild_id, token).await?,
                };
                role.map(ArgValue::Role)
            },
        })
    }
}

#[async_trait]
impl TypeResolver for EntityResolver {
    async fn resolve(
        &self,
        ctxt: &ResolveCtxt<'_>,
        tokens: &[String],
        spec: &UsageSpec,
    ) -> Result<Resolved, ResolveError> {
        let token = first(tokens, spec)?;
        let not_found = || ResolveError::NotFound {
            entity: self.0,
            arg: token.to_owned(),
        };

        let Some(guild_id) = ctxt.guild_id else {
            return Err(not_found());
        };

        match self.lookup(ctxt.client, guild_id, token).await {
            Ok(Some(value)) => Ok(Resolved::single(value)),
            Ok(None) => Err(not_found()),
            Err(e) => Err(ResolveError::Lookup(e)),
        }
    }
}
