use std::collections::HashMap;
use std::sync::Arc;

use super::arguments::{ArgValue, ResolveCtxt, TypeRegistry};
use super::errors::ResolveError;
use super::usage::UsageSpec;
use crate::platform::{Channel, Member, Role};

/// Resolved arguments of one invocation, keyed by usage name.
///
/// Optional arguments that were not given are absent rather than defaulted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArgumentRecord {
    values: HashMap<String, ArgValue>,
    /// Caller supplied pairs such as `prefix` and `command`.
    meta: HashMap<String, String>,
}
impl ArgumentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: ArgValue) {
        self.values.insert(name.to_owned(), value);
    }

    pub fn insert_meta(&mut self, key: &str, value: &str) {
        self.meta.insert(key.to_owned(), value.to_owned());
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            ArgValue::Str(s) => Some(s),
            ArgValue::Choice { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            ArgValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The chosen value and its index.
    pub fn choice(&self, name: &str) -> Option<(&str, usize)> {
        match self.get(name)? {
            ArgValue::Choice { index, value } => Some((value, *index)),
            _ => None,
        }
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        match self.get(name)? {
            ArgValue::Member(m) => Some(m),
            _ => None,
        }
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        match self.get(name)? {
            ArgValue::Channel(c) => Some(c),
            _ => None,
        }
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        match self.get(name)? {
            ArgValue::Role(r) => Some(r),
            _ => None,
        }
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }
}

/// Drives the type registry over a usage schema.
///
/// Each command node owns one of these; its overlay holds the node's own type resolvers.
#[derive(Clone, Default)]
pub struct ArgumentResolver {
    overlay: Arc<TypeRegistry>,
}
impl ArgumentResolver {
    pub fn new(overlay: TypeRegistry) -> Self {
        Self {
            overlay: Arc::new(overlay),
        }
    }

    /// The node's own type resolvers, if it registered any.
    pub fn overlay(&self) -> Option<Arc<TypeRegistry>> {
        (!self.overlay.is_empty()).then(|| self.overlay.clone())
    }

    /// Resolves `tokens` against `usage`, strictly in order.
    ///
    /// A `last` argument receives every remaining token joined by spaces. An optional argument is skipped
    /// only when no tokens remain; when tokens remain, its resolver's failure is the result. The
    /// first required argument without tokens fails the whole resolution with
    /// [`ResolveError::ArgsExhausted`].
    pub async fn resolve(
        &self,
        global: &TypeRegistry,
        ctxt: &ResolveCtxt<'_>,
        tokens: &[String],
        extra: &[(&str, &str)],
        usage: &[UsageSpec],
    ) -> Result<ArgumentRecord, ResolveError> {
        let overlay = (!self.overlay.is_empty()).then_some(self.overlay.as_ref());
        let mut record = ArgumentRecord::new();
        let mut remaining = tokens;

        for spec in usage {
            if remaining.is_empty() {
                if spec.optional {
                    continue;
                }
                return Err(ResolveError::ArgsExhausted(spec.display_name.clone()));
            }

            let joined;
            let input = if spec.last {
                joined = [remaining.join(" ")];
                &joined[..]
            } else {
                remaining
            };

            let resolved = global.resolve(overlay, ctxt, input, spec).await?;
            record.insert(&spec.name, resolved.value);

            remaining = if spec.last {
                &[]
            } else {
                remaining.get(resolved.consumed..).unwrap_or_default()
            };
        }

        for (key, value) in extra {
            record.insert_meta(key, value);
        }

        Ok(record)
    }
}
