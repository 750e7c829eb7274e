use crate::error::Result;
use crate::model::ModelClient;
use crate::ui::{self, Prompter};
use crate::{info, status};

const FENCE: &str = "```";

/// strip a bare code fence from the first and/or last line
///
/// the two ends are handled independently; text without fences is returned as is
pub fn normalize(response: &str) -> String {
    let mut lines: Vec<&str> = response.split('\n').collect();
    let mut changed = false;

    if lines.first().is_some_and(|line| line.trim_end() == FENCE) {
        lines.remove(0);
        changed = true;
    }
    if lines.last().is_some_and(|line| line.trim_end() == FENCE) {
        lines.pop();
        changed = true;
    }

    if changed {
        lines.join("\n")
    } else {
        response.to_string()
    }
}

/// a rejected draft and what the user said about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub draft: String,
    pub feedback: String,
}

/// what the model sees: the seed, optional context, every rejected attempt so far
#[derive(Debug)]
pub struct Transcript {
    seed: String,
    context: String,
    attempts: Vec<Attempt>,
}

impl Transcript {
    pub fn new(seed: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            context: context.into(),
            attempts: Vec::new(),
        }
    }

    pub fn reject(&mut self, draft: impl Into<String>, feedback: impl Into<String>) {
        self.attempts.push(Attempt {
            draft: draft.into(),
            feedback: feedback.into(),
        });
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    /// user messages for the next query, rebuilt from scratch each time
    pub fn messages(&self) -> Vec<String> {
        let mut messages = vec![self.seed.clone()];

        let context = self.context.trim();
        if !context.is_empty() {
            messages.push(format!(
                "Additional context provided by the user:\n{context}\n"
            ));
        }

        for (number, attempt) in self.attempts.iter().enumerate() {
            messages.push(format!(
                "Previously REJECTED attempt #{}:\n<attempt>\n{}\n</attempt>\n<feedback>\n{}\n</feedback>\n---\n",
                number + 1,
                attempt.draft,
                attempt.feedback
            ));
        }

        messages
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NegotiateOptions {
    /// take the first draft without asking the user anything
    pub return_first: bool,
    /// print drafts without the surrounding panel
    pub no_panel: bool,
}

/// queries the model until the user accepts a draft
pub struct Negotiator<'a> {
    client: &'a dyn ModelClient,
    system_prompt: String,
    title: &'a str,
    verbose: bool,
}

impl<'a> Negotiator<'a> {
    pub fn new(client: &'a dyn ModelClient, system_prompt: String, title: &'a str) -> Self {
        Self {
            client,
            system_prompt,
            title,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// returns the accepted (normalized) draft, or `Error::Cancelled`
    pub fn negotiate(
        &self,
        seed: &str,
        context: &str,
        prompter: &mut dyn Prompter,
        options: NegotiateOptions,
    ) -> Result<String> {
        let mut transcript = Transcript::new(seed, context);

        loop {
            let messages = transcript.messages();
            if self.verbose {
                for message in &messages {
                    info!(message);
                }
            }

            let raw = ui::with_spinner("generating...", || {
                self.client.complete(&self.system_prompt, &messages)
            })?;
            let draft = normalize(&raw);

            ui::show_draft(self.title, &draft, options.no_panel);

            if options.return_first {
                return Ok(draft);
            }

            let feedback = prompter.ask(
                "does this look fine? <enter> to accept, otherwise describe what to improve",
            )?;
            let feedback = feedback.trim();
            if feedback.is_empty() {
                return Ok(draft);
            }

            status!("regenerating with your feedback...");
            transcript.reject(raw, feedback);
        }
    }
}
