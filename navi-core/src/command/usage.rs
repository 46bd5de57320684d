/// Describes one expected argument of a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsageSpec {
    /// Key the resolved value is stored under.
    pub name: String,
    /// Name shown in usage strings.
    pub display_name: String,
    /// Type tag, selecting the resolver from the type registry.
    pub kind: String,
    pub optional: bool,
    /// Minimum value, for numeric types.
    pub min: Option<i64>,
    /// Consumes every remaining token as one value.
    pub last: bool,
    /// Fixed set of accepted values.
    pub choices: Option<Vec<String>>,
}
impl UsageSpec {
    pub fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_owned(),
            display_name: name.to_owned(),
            kind: kind.to_owned(),
            optional: false,
            min: None,
            last: false,
            choices: None,
        }
    }

    pub fn display(mut self, display_name: &str) -> Self {
        self.display_name = display_name.to_owned();
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn last(mut self) -> Self {
        self.last = true;
        self
    }

    pub fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Renders this argument as it appears in a usage string: `<name>` when required, `[name]`
    /// when optional, `name...` when it takes the rest of the message, and `a|b|c` for choices.
    pub fn usage_fragment(&self) -> String {
        let mut inner = match &self.choices {
            Some(choices) if !choices.is_empty() => choices.join("|"),
            _ => self.display_name.clone(),
        };
        if self.last {
            inner.push_str("...");
        }

        if self.optional {
            format!("[{inner}]")
        } else {
            format!("<{inner}>")
        }
    }
}

/// Renders a whole usage schema, e.g. `<member> [reason...]`.
pub fn usage_string(usage: &[UsageSpec]) -> String {
    usage
        .iter()
        .map(UsageSpec::usage_fragment)
        .collect::<Vec<_>>()
        .join(" ")
}
