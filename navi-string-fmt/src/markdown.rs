use std::fmt::{Display, Write};

/// Discord caps message content at this many characters.
pub const MESSAGE_LIMIT: usize = 2000;

pub trait Markdown {
    fn escape_bold(&self) -> String;
    fn escape_codestring(&self) -> String;
    fn escape_codeblock(&self) -> String;

    fn bold(&self) -> String;
    fn italics(&self) -> String;
    fn codestring(&self) -> String;
    fn codeblock(&self, language: impl Display) -> String;
}

fn cut(t: impl Display, to: usize) -> String {
    t.to_string().chars().take(to).collect::<String>()
}

impl<T> Markdown for T
where
    T: Display,
{
    fn escape_bold(&self) -> String {
        cut(self, MESSAGE_LIMIT - 2).replace("**", r"\*\*")
    }

    fn escape_codestring(&self) -> String {
        cut(self, MESSAGE_LIMIT - 2).replace('`', "\u{02cb}")
    }

    fn escape_codeblock(&self) -> String {
        cut(self, MESSAGE_LIMIT - 12).replace("```", "`\u{200b}`\u{200b}`")
    }

    fn bold(&self) -> String {
        format!("**{}**", self.escape_bold())
    }

    fn italics(&self) -> String {
        format!("*{}*", cut(self, MESSAGE_LIMIT - 2).replace('*', r"\*"))
    }

    fn codestring(&self) -> String {
        format!("`{}`", self.escape_codestring())
    }

    fn codeblock(&self, language: impl Display) -> String {
        format!("```{}\n{}\n```", language, self.escape_codeblock())
    }
}

/// Renders items as `[1] first`, `[2] second`, ... one per line.
pub fn numbered_list<I, T>(items: I) -> String
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    let mut out = String::new();
    for (index, item) in items.into_iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let _ = write!(out, "[{}] {}", index + 1, item);
    }
    out
}

/// Truncates content in-place so that it fits in a single message.
pub fn trim_content_fits(content: &mut String) {
    if let Some((truncated_byte_index, _)) = content.char_indices().nth(MESSAGE_LIMIT) {
        content.truncate(truncated_byte_index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_list_is_one_based() {
        assert_eq!(numbered_list(["Yes", "No"]), "[1] Yes\n[2] No");
        assert_eq!(numbered_list(Vec::<String>::new()), "");
    }

    #[test]
    fn codestring_escapes_backticks() {
        assert_eq!("a`b".codestring(), "`a\u{02cb}b`");
    }

    #[test]
    fn bold_escapes_markers() {
        assert_eq!("**x**".bold(), r"**\*\*x\*\***");
    }

    #[test]
    fn content_is_trimmed_to_the_limit() {
        let mut content = "é".repeat(MESSAGE_LIMIT + 10);
        trim_content_fits(&mut content);
        assert_eq!(content.chars().count(), MESSAGE_LIMIT);
    }
}
