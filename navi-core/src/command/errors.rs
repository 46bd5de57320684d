use std::fmt::Display;

use super::arguments::EntityKind;

pub trait GetErrorSeverity {
    fn get_severity(&self) -> ErrorSeverity;
}

/// Low severity errors are caused by user input and are only worth a debug log; high severity
/// errors are unexpected and get reported.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorSeverity {
    Low,
    High,
}

/// A failure to turn raw tokens into a typed argument.
#[derive(Debug)]
pub enum ResolveError {
    /// A required argument had no tokens left.
    ArgsExhausted(String),
    /// The token is not one of the fixed choices.
    NotOneOf { arg: String, choices: Vec<String> },
    /// A choice argument was declared without any choices.
    NoChoices(String),
    NotInt(String),
    BelowMinimum { name: String, min: i64 },
    NotFound { entity: EntityKind, arg: String },
    /// No resolver is registered for the type tag.
    UnknownType(String),
    /// A remote lookup failed.
    Lookup(anyhow::Error),
}
impl ResolveError {
    /// Stable identifier of this failure, also used as its locale key under `errors.`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ArgsExhausted(_) => "INSUFFICIENT_ARGS",
            Self::NotOneOf { .. } => "string.ONE_OF",
            Self::NoChoices(_) => "choice.NO_CHOICES",
            Self::NotInt(_) => "int.NOT_INT",
            Self::BelowMinimum { .. } => "int.NOT_MIN",
            Self::NotFound { entity, .. } => match entity {
                EntityKind::Member => "member.NOT_FOUND",
                EntityKind::Channel => "channel.NOT_FOUND",
                EntityKind::Role => "role.NOT_FOUND",
            },
            Self::UnknownType(_) => "UNKNOWN_TYPE",
            Self::Lookup(_) => "LOOKUP_FAILED",
        }
    }

    /// Whether this failure should be answered with the command's usage.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::ArgsExhausted(_) | Self::NotOneOf { .. })
    }

    /// Parameters for the localized message.
    pub fn params(&self) -> Vec<(String, String)> {
        let param = |k: &str, v: &str| (k.to_owned(), v.to_owned());
        match self {
            Self::ArgsExhausted(name) | Self::NoChoices(name) => vec![param("name", name)],
            Self::NotOneOf { arg, choices } => vec![param("arg", arg), param("choices", &choices.join(", "))],
            Self::NotInt(arg) => vec![param("arg", arg)],
            Self::BelowMinimum { name, min } => vec![param("name", name), param("min", &min.to_string())],
            Self::NotFound { arg, .. } => vec![param("arg", arg)],
            Self::UnknownType(kind) => vec![param("type", kind)],
            Self::Lookup(_) => vec![],
        }
    }
}
impl Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ArgsExhausted(name) => write!(f, "argument `{name}` is required but none were found"),
            Self::NotOneOf { arg, choices } => write!(f, "`{arg}` is not one of: {}", choices.join(", ")),
            Self::NoChoices(name) => write!(f, "argument `{name}` has no choices"),
            Self::NotInt(arg) => write!(f, "`{arg}` is not a whole number"),
            Self::BelowMinimum { name, min } => write!(f, "argument `{name}` must be at least {min}"),
            Self::NotFound { entity, arg } => write!(f, "no {entity} matching `{arg}`"),
            Self::UnknownType(kind) => write!(f, "no resolver is registered for type `{kind}`"),
            Self::Lookup(e) => write!(f, "lookup failed: {e:#}"),
        }
    }
}
impl std::error::Error for ResolveError {}
impl GetErrorSeverity for ResolveError {
    fn get_severity(&self) -> ErrorSeverity {
        match self {
            Self::Lookup(_) | Self::UnknownType(_) | Self::NoChoices(_) => ErrorSeverity::High,
            _ => ErrorSeverity::Low,
        }
    }
}

/// A command descriptor that cannot become a command node.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandBuildError {
    /// Neither a name nor any aliases were given.
    Unnamed,
    /// A subcommand was declared without a handler.
    MissingHandler(String),
    /// The fixed subcommand names no declared subcommand.
    UnknownFixedSubcommand(String),
}
impl Display for CommandBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unnamed => f.write_str("command is not named"),
            Self::MissingHandler(name) => write!(f, "subcommand `{name}` has no handler"),
            Self::UnknownFixedSubcommand(name) => write!(f, "fixed subcommand `{name}` is not declared"),
        }
    }
}
impl std::error::Error for CommandBuildError {}

#[derive(Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// Another registered command already answers to this trigger.
    DuplicateTrigger(String),
}
impl Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateTrigger(trigger) => write!(f, "trigger `{trigger}` is already registered"),
        }
    }
}
impl std::error::Error for RegistryError {}
