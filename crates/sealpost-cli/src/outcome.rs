//! Command results and their renderings.

use serde::Serialize;
use serde_json::Value;

use crate::theme::Theme;

/// How outcomes are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{other}' (expected text or json)")),
        }
    }
}

/// Whether a command succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    /// The command did what was asked.
    Success,
    /// The command refused or found problems.
    Error,
}

/// What every command returns: a status, a summary and a structured result.
///
/// `text` is the human rendering; JSON output uses the other fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOutcome {
    /// Success or error.
    pub status: CommandStatus,
    /// Command name, e.g. `import-key`.
    pub command: &'static str,
    /// One-line summary.
    pub message: String,
    /// Structured result.
    pub result: Value,
    /// Human-readable rendering.
    #[serde(skip)]
    pub text: String,
}

impl CommandOutcome {
    /// A successful outcome whose text is the message.
    #[must_use]
    pub fn success(command: &'static str, message: impl Into<String>, result: Value) -> Self {
        let message = message.into();
        Self {
            status: CommandStatus::Success,
            command,
            text: message.clone(),
            message,
            result,
        }
    }

    /// An error-shaped outcome whose text is the message.
    #[must_use]
    pub fn error(command: &'static str, message: impl Into<String>, result: Value) -> Self {
        Self {
            status: CommandStatus::Error,
            ..Self::success(command, message, result)
        }
    }

    /// Replace the human rendering.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Whether the command succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }

    /// Process exit code for this outcome.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.is_success())
    }

    /// Render for printing.
    #[must_use]
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => self.to_json(),
            OutputFormat::Text if !self.is_success() => match self.text.split_once('\n') {
                Some((first, rest)) => format!("{}\n{rest}", Theme::error(first)),
                None => Theme::error(&self.text),
            },
            OutputFormat::Text if self.text == self.message => Theme::success(&self.text),
            OutputFormat::Text => self.text.clone(),
        }
    }

    /// JSON rendering.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            format!("{{\"status\":\"error\",\"message\":\"cannot serialize result: {e}\"}}")
        })
    }
}
