//! `check-keys`: key health diagnosis.

use sealpost_doctor::{DiagnoseOptions, Doctor};
use serde_json::json;

use crate::error::CommandResult;
use crate::outcome::CommandOutcome;

/// Run the diagnosis and shape it as a command outcome.
///
/// A failed verdict is an error-shaped outcome; its text still lists every
/// finding and fix.
///
/// # Errors
///
/// Fails only if the secret keyring cannot be listed.
pub fn check_keys(doctor: &Doctor, options: DiagnoseOptions) -> CommandResult<CommandOutcome> {
    let verdict = doctor.diagnose(options)?;
    let result =
        serde_json::to_value(&verdict).unwrap_or_else(|e| json!({ "error": e.to_string() }));
    let outcome = if verdict.passed {
        CommandOutcome::success("check-keys", verdict.message.clone(), result)
    } else {
        CommandOutcome::error("check-keys", verdict.message.clone(), result)
    };
    Ok(outcome.with_text(verdict.as_text()))
}
