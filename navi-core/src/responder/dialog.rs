use tracing::debug;

use super::{InteractionError, Reply, Responder};
use crate::command::arguments::ResolveCtxt;
use crate::command::errors::{ErrorSeverity, GetErrorSeverity};
use crate::command::resolver::ArgumentRecord;
use crate::command::usage::UsageSpec;

/// One question of a dialog, and the type its answer must have.
#[derive(Clone, Debug)]
pub struct DialogPrompt {
    pub prompt: String,
    /// The whole answer is resolved against this usage entry, as if it were a `last` argument.
    pub input: UsageSpec,
}
impl DialogPrompt {
    pub fn new(prompt: &str, input: UsageSpec) -> Self {
        Self {
            prompt: prompt.to_owned(),
            input: input.last(),
        }
    }
}

impl Responder {
    /// Asks each prompt in turn and waits for the author's answer in this channel.
    ///
    /// Answers are resolved with the invoked command's own type resolvers first, then the
    /// process-wide ones. An invalid answer is re-prompted up to `interaction.dialog_retries`
    /// times. Timing out on any prompt, or answering with the cancel word, ends the whole dialog.
    pub async fn dialog(&self, prompts: Vec<DialogPrompt>) -> Result<ArgumentRecord, InteractionError> {
        let navi = self.navi();
        let interaction = &navi.config.interaction;
        let mut session = navi.sessions.open(self.author.id, self.channel_id)?;
        let mut record = ArgumentRecord::new();

        let ctxt = ResolveCtxt {
            client: navi.client.as_ref(),
            guild_id: self.guild_id,
        };

        for prompt in prompts {
            let question = Reply::new(format!("{}\n\n{}", prompt.prompt, "{{%interaction.DIALOG_FOOTER}}"))
                .param("cancel", &interaction.cancel_word);
            self.send(question).await.map_err(InteractionError::Client)?;

            let mut failures = 0;
            loop {
                let answer = session.next(interaction.timeout()).await?;
                let text = answer.content.trim();
                if text.eq_ignore_ascii_case(&interaction.cancel_word) {
                    return Err(InteractionError::Cancelled);
                }

                let tokens = if text.is_empty() { vec![] } else { vec![text.to_owned()] };
                match navi.types.resolve(self.types.as_deref(), &ctxt, &tokens, &prompt.input).await {
                    Ok(resolved) => {
                        record.insert(&prompt.input.name, resolved.value);
                        break;
                    },
                    Err(e) if e.get_severity() == ErrorSeverity::High => {
                        return Err(InteractionError::InvalidAnswer(e));
                    },
                    Err(e) if failures >= interaction.dialog_retries => {
                        return Err(InteractionError::InvalidAnswer(e));
                    },
                    Err(e) => {
                        failures += 1;
                        debug!("dialog answer rejected ({failures}): {e}");

                        let retry = Reply::new(format!("{{{{%errors.{}}}}} {{{{%interaction.RETRY}}}}", e.kind()))
                            .params(e.params())
                            .emoji("warning");
                        self.send(retry).await.map_err(InteractionError::Client)?;
                    },
                }
            }
        }

        Ok(record)
    }
}
