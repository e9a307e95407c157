//! Orchestration: single questions and conditional flows of questions

use crate::error::{PromptError, Result};
use crate::prompt::confirm::ConfirmPrompt;
use crate::prompt::engine::{self, summary_line};
use crate::prompt::select::SelectPrompt;
use crate::prompt::text::TextPrompt;
use crate::prompt::{Answers, Prompt, PromptConfig, Value};
use crate::session::shutdown::EXIT_INTERRUPTED;
use crate::session::Session;

/// Turn a config into a ready-to-run prompt, dispatching on its kind
pub fn build_prompt(config: PromptConfig) -> Result<Box<dyn Prompt>> {
    let prompt: Box<dyn Prompt> = match config {
        PromptConfig::Select(mut config) => {
            config.multiple = false;
            Box::new(SelectPrompt::new(config)?)
        }
        PromptConfig::Multiselect(mut config) => {
            config.multiple = true;
            Box::new(SelectPrompt::new(config)?)
        }
        PromptConfig::Text(mut config) => {
            config.mask = None;
            Box::new(TextPrompt::new(config))
        }
        PromptConfig::Password(mut config) => {
            config.mask.get_or_insert('•');
            Box::new(TextPrompt::new(config))
        }
        PromptConfig::Confirm(config) => Box::new(ConfirmPrompt::new(config)),
    };
    Ok(prompt)
}

/// Runs prompts against one session
#[derive(Clone)]
pub struct Orchestrator {
    session: Session,
}

impl Orchestrator {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Ask one question in its own session run.
    ///
    /// On cancel the session is stopped and the shutdown registrar is asked
    /// to exit with code 130; if it returns, the result is
    /// [`PromptError::Cancelled`].
    pub async fn ask(&self, config: impl Into<PromptConfig>) -> Result<Value> {
        let mut prompt = build_prompt(config.into())?;
        let result = engine::prompt(&self.session, prompt.as_mut()).await?;
        if result.cancelled {
            return Err(self.cancel());
        }
        self.echo(&[self.summary(prompt.as_ref())]);
        Ok(result.value)
    }

    /// Ask questions in order on a single session run.
    ///
    /// Each question's `when` sees the answers given so far and skipped
    /// questions are never built or drawn. Answers are keyed by the question
    /// name, or by its message when it has none. A cancel ends the whole flow
    /// immediately.
    pub async fn flow(&self, configs: Vec<PromptConfig>) -> Result<Answers> {
        let mut answers = Answers::new();
        let mut summaries = Vec::new();

        self.session.start()?;
        match self.run_flow(configs, &mut answers, &mut summaries).await {
            Ok(()) => {
                self.session.stop()?;
                self.echo(&summaries);
                Ok(answers)
            }
            Err(PromptError::Cancelled) => Err(self.cancel()),
            Err(e) => {
                if let Err(stop_error) = self.session.stop() {
                    tracing::warn!("failed to stop session: {}", stop_error);
                }
                Err(e)
            }
        }
    }

    async fn run_flow(
        &self,
        configs: Vec<PromptConfig>,
        answers: &mut Answers,
        summaries: &mut Vec<String>,
    ) -> Result<()> {
        for config in configs {
            let common = config.common();
            if !common.should_ask(answers) {
                tracing::debug!(message = %common.message, "skipping question");
                continue;
            }
            let key = common.name.clone().unwrap_or_else(|| common.message.clone());

            let mut prompt = build_prompt(config)?;
            let result = engine::prompt_in_flow(&self.session, prompt.as_mut()).await?;
            if result.cancelled {
                return Err(PromptError::Cancelled);
            }
            summaries.push(self.summary(prompt.as_ref()));
            answers.insert(key, result.value);
        }
        Ok(())
    }

    fn cancel(&self) -> PromptError {
        if let Err(e) = self.session.stop() {
            tracing::warn!("failed to stop session: {}", e);
        }
        self.session
            .shutdown()
            .trigger_shutdown("prompt cancelled", EXIT_INTERRUPTED);
        PromptError::Cancelled
    }

    fn summary(&self, prompt: &dyn Prompt) -> String {
        let theme = self.session.theme().apply(&prompt.common().theme);
        summary_line(prompt, &theme)
    }

    /// Print answered questions on the primary screen. Inline sessions keep
    /// their final frames in place, so only alternate-screen runs echo.
    fn echo(&self, lines: &[String]) {
        let config = self.session.config();
        if !config.echo_answers || !config.alternate_screen {
            return;
        }
        for line in lines {
            if let Err(e) = self.session.terminal().write_sync(&format!("{}\n", line)) {
                tracing::warn!("failed to write answer summary: {}", e);
                return;
            }
        }
    }
}
