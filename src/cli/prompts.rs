//! Interactive prompts using dialoguer

use anyhow::Result;
use dialoguer::Confirm;

use crate::pipeline::ArtifactKind;

/// Prompt user to confirm proceeding with an action
pub fn confirm_step(message: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(true)
        .interact()?;
    Ok(confirmed)
}

/// Prompt user to confirm replacing the artifacts of a previous training run
pub fn confirm_overwrite(existing: &[ArtifactKind]) -> Result<bool> {
    let names: Vec<&str> = existing.iter().map(|kind| kind.label()).collect();
    let message = format!(
        "Overwrite {} existing artifact(s) ({})?",
        existing.len(),
        names.join(", ")
    );
    confirm_step(&message)
}
