//! Diagnosis output.

use serde::Serialize;

use crate::health::KeyHealth;

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Health of one secret key.
    Key,
    /// The configured default key is bad.
    DefaultKey,
    /// A profile references a bad key.
    ProfileKey,
    /// A profile references no key at all.
    ProfileWithoutKey,
}

/// One line of the diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// What the finding is about.
    pub kind: FindingKind,
    /// Whether it counts against the verdict.
    pub serious: bool,
    /// Human-readable description.
    pub description: String,
    /// Fingerprint concerned, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Key classification, for [`FindingKind::Key`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<KeyHealth>,
    /// Profile record id, for profile findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// Result of a diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// No serious findings.
    pub passed: bool,
    /// Number of serious findings.
    pub serious: usize,
    /// Findings in discovery order.
    pub details: Vec<Finding>,
    /// Remediation step-groups in the order they should be carried out.
    pub fixes: Vec<Vec<String>>,
    /// Secret keys inspected.
    pub keys: usize,
    /// Profiles inspected.
    pub profiles: usize,
    /// Summary line.
    pub message: String,
}

impl Verdict {
    /// The minimal verdict returned for a quiet, passing check.
    #[must_use]
    pub fn quiet_ok(keys: usize, profiles: usize) -> Self {
        Self {
            passed: true,
            serious: 0,
            details: Vec::new(),
            fixes: Vec::new(),
            keys,
            profiles,
            message: "OK".to_owned(),
        }
    }

    /// Text rendering: summary, findings (or `Looks good!`), proposed fixes.
    #[must_use]
    pub fn as_text(&self) -> String {
        let mut out = if self.details.is_empty() {
            format!("{}. Looks good!", self.message)
        } else {
            let lines: Vec<&str> = self.details.iter().map(|d| d.description.as_str()).collect();
            format!("{}.\n - {}", self.message, lines.join("\n - "))
        };

        if !self.fixes.is_empty() {
            let groups: Vec<String> = self.fixes.iter().map(|g| g.join("\n    * ")).collect();
            out.push_str("\n\nProposed fixes:\n - ");
            out.push_str(&groups.join("\n - "));
        }
        out
    }
}
