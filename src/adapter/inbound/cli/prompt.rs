//! Interactive confirmations through dialoguer.

use dialoguer::Confirm;

use crate::error::Result;
use crate::port::outbound::confirm::Confirmer;

/// Asks on the terminal before each pool or position.
#[derive(Debug, Default)]
pub struct TerminalConfirm;

impl Confirmer for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        Ok(Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()?)
    }
}
