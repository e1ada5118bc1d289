//! Terminal confirmation prompt using `dialoguer`

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    prompt::Confirmation,
};
use dialoguer::Confirm;
use tracing::debug;

/// Interactive yes/no prompt on the controlling terminal
///
/// The prompt blocks on stdin, so it runs on Tokio's blocking pool.
#[derive(Debug, Clone, Default)]
pub struct TerminalConfirmation {
    default_answer: bool,
}

impl TerminalConfirmation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer assumed when the operator just presses enter
    pub fn with_default(mut self, answer: bool) -> Self {
        self.default_answer = answer;
        self
    }
}

#[async_trait]
impl Confirmation for TerminalConfirmation {
    async fn confirm(&self, message: &str) -> Result<bool> {
        let prompt = format!("{}\n Continue?", message);
        let default_answer = self.default_answer;

        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new()
                .with_prompt(prompt)
                .default(default_answer)
                .interact()
        })
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("prompt task failed: {}", e)))?
        .map_err(|e| BridgeError::OperationFailed(format!("prompt failed: {}", e)))?;

        debug!(answer, "Operator answered confirmation prompt");
        Ok(answer)
    }
}
