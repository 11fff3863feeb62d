//! Yes/no gate in front of every installation pass.

use console::Term;

use pinpick_util::errors::PinpickError;

pub trait Confirm {
    fn confirm(&self, message: &str) -> miette::Result<bool>;
}

/// Asks on the terminal. Without a terminal the answer is "no".
pub struct PromptConfirm;

impl Confirm for PromptConfirm {
    fn confirm(&self, message: &str) -> miette::Result<bool> {
        if !Term::stderr().is_term() {
            tracing::warn!("Not running in a terminal; pass --yes to proceed without a prompt");
            return Ok(false);
        }
        dialoguer::Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .map_err(|e| {
                PinpickError::Generic {
                    message: format!("Prompt failed: {e}"),
                }
                .into()
            })
    }
}

/// Answers every question with a fixed value (`--yes`, tests).
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, message: &str) -> miette::Result<bool> {
        tracing::debug!("{message} -> {}", self.0);
        Ok(self.0)
    }
}
