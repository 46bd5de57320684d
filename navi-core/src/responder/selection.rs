use std::fmt::Display;

use navi_string_fmt::{Markdown, numbered_list};

use super::{InteractionError, Reply, Responder};

/// Matches an answer against the options: a 1-based index, or an option's label ignoring case.
/// Returns the 0-based index.
pub fn parse_selection(options: &[String], answer: &str) -> Option<usize> {
    let answer = answer.trim();

    answer
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=options.len()).contains(n))
        .map(|n| n - 1)
        .or_else(|| options.iter().position(|o| o.eq_ignore_ascii_case(answer)))
}

impl Responder {
    /// Shows a numbered list of options and waits for the author to pick one.
    ///
    /// Resolves to the answer as typed and the 0-based index of the chosen option. An answer that
    /// matches no option is re-prompted once before failing.
    pub async fn selection<T: Display>(&self, options: &[T], title: &str) -> Result<(String, usize), InteractionError> {
        if options.is_empty() {
            return Err(InteractionError::NoOptions);
        }

        let navi = self.navi();
        let interaction = &navi.config.interaction;
        let labels = options.iter().map(ToString::to_string).collect::<Vec<_>>();
        let mut session = navi.sessions.open(self.author.id, self.channel_id)?;

        let menu = Reply::new(format!(
            "{}\n{}\n{}",
            title.bold(),
            numbered_list(&labels).codeblock(""),
            "{{%interaction.SELECTION_FOOTER}}"
        ))
        .param("cancel", &interaction.cancel_word);
        self.send(menu).await.map_err(InteractionError::Client)?;

        let mut reprompted = false;
        loop {
            let message = session.next(interaction.timeout()).await?;
            let answer = message.content.trim();

            if answer.eq_ignore_ascii_case(&interaction.cancel_word) {
                return Err(InteractionError::Cancelled);
            }

            if let Some(index) = parse_selection(&labels, answer) {
                return Ok((answer.to_owned(), index));
            }

            if reprompted {
                return Err(InteractionError::InvalidSelection(answer.to_owned()));
            }
            reprompted = true;

            let retry = Reply::new("{{%errors.INVALID_SELECTION}} {{%interaction.RETRY}}")
                .param("answer", &answer.escape_codestring())
                .emoji("warning");
            self.send(retry).await.map_err(InteractionError::Client)?;
        }
    }
}
