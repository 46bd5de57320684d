//! Locale dictionaries and message interpolation.
//!
//! Messages reference dictionary entries with `{{key}}` markers:
//!
//! - `{{%errors.NO_PMS}}` is looked up from the root of the dictionary,
//! - `{{kick.SUCCESS}}` is looked up under the namespace of the invoking command first (for
//!   example `moderation.kick.SUCCESS`), then from the root.
//!
//! Lookups fall back to the default language, and finally to the key itself. After keys are
//! replaced, named parameters written as `{name}` are interpolated.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use regex::Captures;
use toml::{Table, Value};

use crate::util::regex::{LOCALE_KEY, LOCALE_PARAM};

static BUILTIN_EN: &str = include_str!("../locales/en.toml");

pub struct Locales {
    default: String,
    dictionaries: HashMap<String, Table>,
}
impl Locales {
    /// Creates a set of locales containing the built-in English dictionary.
    pub fn new(default: &str) -> anyhow::Result<Locales> {
        let en = toml::from_str::<Table>(BUILTIN_EN).context("built-in en locale is invalid")?;

        let mut locales = Locales {
            default: default.to_owned(),
            dictionaries: HashMap::new(),
        };
        locales.insert("en", en);

        Ok(locales)
    }

    pub fn default_language(&self) -> &str {
        &self.default
    }

    pub fn has_language(&self, lang: &str) -> bool {
        self.dictionaries.contains_key(lang)
    }

    /// Merges a dictionary into the given language, overriding existing entries.
    pub fn insert(&mut self, lang: &str, dictionary: Table) {
        let existing = self.dictionaries.entry(lang.to_owned()).or_default();
        merge(existing, dictionary);
    }

    /// Loads every `<lang>.toml` file in a directory. Returns how many were loaded.
    pub fn load_dir(&mut self, dir: &Path) -> anyhow::Result<usize> {
        let mut loaded = 0;

        for entry in std::fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let source = std::fs::read_to_string(&path)?;
            let dictionary =
                toml::from_str::<Table>(&source).with_context(|| format!("invalid locale {}", path.display()))?;

            self.insert(lang, dictionary);
            loaded += 1;
        }

        Ok(loaded)
    }

    /// Looks up a dotted path in one language, without any fallback.
    pub fn lookup(&self, lang: &str, path: &str) -> Option<&str> {
        let mut table = self.dictionaries.get(lang)?;
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            let value = table.get(segment)?;
            if segments.peek().is_none() {
                return value.as_str();
            }
            table = value.as_table()?;
        }

        None
    }

    fn lookup_with_fallback(&self, lang: &str, path: &str) -> Option<&str> {
        self.lookup(lang, path).or_else(|| self.lookup(&self.default, path))
    }

    fn resolve_key(&self, lang: &str, namespace: Option<&str>, global: bool, path: &str) -> String {
        let namespaced = match namespace {
            Some(ns) if !global => self.lookup_with_fallback(lang, &format!("{ns}.{path}")),
            _ => None,
        };

        namespaced
            .or_else(|| self.lookup_with_fallback(lang, path))
            .unwrap_or(path)
            .to_owned()
    }

    /// Replaces locale keys and interpolates parameters.
    pub fn translate(&self, text: &str, lang: &str, namespace: Option<&str>, params: &[(String, String)]) -> String {
        let keyed = LOCALE_KEY.replace_all(text, |caps: &Captures| {
            self.resolve_key(lang, namespace, &caps[1] == "%", &caps[2])
        });

        LOCALE_PARAM
            .replace_all(&keyed, |caps: &Captures| {
                params
                    .iter()
                    .find(|(name, _)| name == &caps[1])
                    .map_or_else(|| caps[0].to_owned(), |(_, value)| value.clone())
            })
            .into_owned()
    }
}

fn merge(into: &mut Table, from: Table) {
    for (key, value) in from {
        if let Value::Table(incoming) = value {
            if let Some(Value::Table(existing)) = into.get_mut(&key) {
                merge(existing, incoming);
                continue;
            }
            into.insert(key, Value::Table(incoming));
        } else {
            into.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn global_keys_and_params() {
        let locales = Locales::new("en").unwrap();
        let text = locales.translate("{{%errors.NO_PERMS}}", "en", None, &params(&[("perms", "`KICK_MEMBERS`")]));
        assert_eq!(
            text,
            "You need the following permissions to use this command: `KICK_MEMBERS`"
        );
    }

    #[test]
    fn namespaced_keys_prefer_the_namespace() {
        let mut locales = Locales::new("en").unwrap();
        locales.insert(
            "en",
            toml::from_str("[moderation.kick]\nSUCCESS = \"Kicked {member}\"\n[kick]\nSUCCESS = \"root\"").unwrap(),
        );

        let text = locales.translate("{{kick.SUCCESS}}", "en", Some("moderation"), &params(&[("member", "bob")]));
        assert_eq!(text, "Kicked bob");

        let text = locales.translate("{{kick.SUCCESS}}", "en", Some("admin"), &[]);
        assert_eq!(text, "root");
    }

    #[test]
    fn falls_back_to_default_language_then_key() {
        let mut locales = Locales::new("en").unwrap();
        locales.insert("fr", toml::from_str("[errors]\nNO_PMS = \"Serveur uniquement.\"").unwrap());

        assert_eq!(locales.translate("{{%errors.NO_PMS}}", "fr", None, &[]), "Serveur uniquement.");
        assert_eq!(
            locales.translate("{{%errors.INTERACTION_CANCELLED}}", "fr", None, &[]),
            "Cancelled."
        );
        assert_eq!(locales.translate("{{%errors.NOPE}}", "fr", None, &[]), "errors.NOPE");
    }

    #[test]
    fn unknown_params_are_left_alone() {
        let locales = Locales::new("en").unwrap();
        assert_eq!(locales.translate("{a} and {b}", "en", None, &params(&[("a", "1")])), "1 and {b}");
    }

    #[test]
    fn merging_keeps_untouched_entries() {
        let mut locales = Locales::new("en").unwrap();
        locales.insert("en", toml::from_str("[errors]\nNO_PMS = \"Guilds only\"").unwrap());

        assert_eq!(locales.lookup("en", "errors.NO_PMS"), Some("Guilds only"));
        assert_eq!(locales.lookup("en", "errors.INTERACTION_CANCELLED"), Some("Cancelled."));
    }
}
