use std::time::Duration;

use navi_common::locale::Locales;
use navi_string_fmt::Markdown;

/// An outbound message before localization.
///
/// Content may contain locale keys (`{{%errors.NO_PMS}}`, `{{kick.SUCCESS}}`) and `{name}`
/// parameters, which are filled in when the reply is rendered for the invoking guild's language.
#[derive(Clone, Debug, Default)]
pub struct Reply {
    pub content: String,
    pub params: Vec<(String, String)>,
    pub emoji: Option<String>,
    pub bold: bool,
    /// Wraps the content in a code block of this language.
    pub code: Option<String>,
    /// Name the reply is addressed to, shown in bold before the content.
    pub addressed: Option<String>,
    /// Deletes the sent message after this long.
    pub delete_after: Option<Duration>,
}
impl Reply {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.params.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.params.extend(params);
        self
    }

    /// Prefixes the reply with `:emoji:  |  `.
    pub fn emoji(mut self, emoji: &str) -> Self {
        self.emoji = Some(emoji.to_owned());
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn code(mut self, language: &str) -> Self {
        self.code = Some(language.to_owned());
        self
    }

    pub fn addressed_to(mut self, name: &str) -> Self {
        self.addressed = Some(name.to_owned());
        self
    }

    pub fn delete_after(mut self, delay: Duration) -> Self {
        self.delete_after = Some(delay);
        self
    }

    pub(crate) fn emoji_or(mut self, emoji: &str) -> Self {
        self.emoji.get_or_insert_with(|| emoji.to_owned());
        self
    }

    /// Localizes and decorates the content.
    pub fn render(&self, locales: &Locales, lang: &str, namespace: Option<&str>) -> String {
        let mut text = locales.translate(&self.content, lang, namespace, &self.params);

        if let Some(ref language) = self.code {
            text = text.codeblock(language);
        }
        if self.bold {
            text = text.bold();
        }
        if let Some(ref name) = self.addressed {
            text = format!("{}, {text}", name.bold());
        }
        if let Some(ref emoji) = self.emoji {
            text = format!(":{emoji}:  |  {text}");
        }

        text
    }
}

impl From<&str> for Reply {
    fn from(value: &str) -> Self {
        Reply::new(value)
    }
}
impl From<String> for Reply {
    fn from(value: String) -> Self {
        Reply::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decorations_apply_outside_in() {
        let locales = Locales::new("en").unwrap();
        let reply = Reply::new("{{%errors.ON_COOLDOWN}}")
            .param("time", "**3**")
            .emoji("hourglass")
            .addressed_to("bob");

        assert_eq!(
            reply.render(&locales, "en", None),
            ":hourglass:  |  **bob**, Slow down! You can use this command again in **3** seconds."
        );
    }

    #[test]
    fn code_and_bold() {
        let locales = Locales::new("en").unwrap();
        assert_eq!(Reply::new("hi").bold().render(&locales, "en", None), "**hi**");
        assert_eq!(
            Reply::new("let x;").code("rs").render(&locales, "en", None),
            "```rs\nlet x;\n```"
        );
    }

    #[test]
    fn emoji_or_keeps_an_explicit_emoji() {
        assert_eq!(Reply::new("x").emoji("tada").emoji_or("warning").emoji.as_deref(), Some("tada"));
        assert_eq!(Reply::new("x").emoji_or("warning").emoji.as_deref(), Some("warning"));
    }
}
