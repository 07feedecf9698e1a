//! The outgoing message transform pipeline.
//!
//! Stages are registered by name into two categories. Content stages run
//! first, then crypto stages; within a category stages run in name order
//! (so `500_openpgp` runs before `900_archive`) until one reports
//! `proceed = false`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{TransformError, TransformResult};
use crate::message::OutgoingMessage;

/// Post-processing applied to a message by a wrapper before it is signed
/// or encrypted.
pub type Cleaner = Arc<dyn Fn(OutgoingMessage) -> OutgoingMessage + Send + Sync>;

/// Keyword options passed to every stage.
#[derive(Clone)]
pub struct TransformOptions {
    /// Free-form crypto policy, e.g. `openpgp-sign-encrypt` or `none`.
    pub crypto_policy: String,
    /// Prefer inline PGP over PGP/MIME.
    pub prefer_inline: bool,
    /// Cleanup callback handed to wrappers.
    pub cleaner: Cleaner,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            crypto_policy: "none".to_owned(),
            prefer_inline: false,
            cleaner: Arc::new(|m| m),
        }
    }
}

impl TransformOptions {
    /// Options with the given crypto policy.
    #[must_use]
    pub fn with_policy(policy: impl Into<String>) -> Self {
        Self {
            crypto_policy: policy.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for TransformOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformOptions")
            .field("crypto_policy", &self.crypto_policy)
            .field("prefer_inline", &self.prefer_inline)
            .finish_non_exhaustive()
    }
}

/// What a stage (or the whole pipeline) produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutcome {
    /// Sender, possibly rewritten.
    pub sender: String,
    /// Recipients, possibly rewritten.
    pub recipients: Vec<String>,
    /// The transformed message.
    pub message: OutgoingMessage,
    /// Whether the stage handled the message.
    pub matched: bool,
    /// Whether later stages in the same category should still run.
    pub proceed: bool,
}

impl TransformOutcome {
    /// An outcome that changes nothing and lets the chain continue.
    #[must_use]
    pub fn unchanged(sender: &str, recipients: &[String], message: OutgoingMessage) -> Self {
        Self {
            sender: sender.to_owned(),
            recipients: recipients.to_vec(),
            message,
            matched: false,
            proceed: true,
        }
    }
}

/// One transform stage.
pub trait OutgoingTransform: Send + Sync {
    /// Transform a message on its way out.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures that must abort sending.
    fn transform_outgoing(
        &self,
        sender: &str,
        recipients: &[String],
        message: OutgoingMessage,
        options: &TransformOptions,
    ) -> TransformResult<TransformOutcome>;
}

/// Named, ordered content and crypto stages.
#[derive(Default)]
pub struct TransformPipeline {
    content: BTreeMap<String, Arc<dyn OutgoingTransform>>,
    crypto: BTreeMap<String, Arc<dyn OutgoingTransform>>,
}

impl fmt::Debug for TransformPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformPipeline")
            .field("content", &self.content.keys().collect::<Vec<_>>())
            .field("crypto", &self.crypto.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TransformPipeline {
    /// An empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a content stage.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::DuplicateStage`] if `name` is taken.
    pub fn register_content(
        &mut self,
        name: impl Into<String>,
        stage: Arc<dyn OutgoingTransform>,
    ) -> TransformResult<()> {
        insert_stage(&mut self.content, name.into(), stage)
    }

    /// Register a crypto stage.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::DuplicateStage`] if `name` is taken.
    pub fn register_crypto(
        &mut self,
        name: impl Into<String>,
        stage: Arc<dyn OutgoingTransform>,
    ) -> TransformResult<()> {
        insert_stage(&mut self.crypto, name.into(), stage)
    }

    /// Run content stages, then crypto stages.
    ///
    /// The result is `matched` if any stage matched, and `proceed` is false
    /// if a crypto stage stopped the chain.
    ///
    /// # Errors
    ///
    /// Propagates the first stage error; no later stage runs.
    pub fn transform_outgoing(
        &self,
        sender: &str,
        recipients: &[String],
        message: OutgoingMessage,
        options: &TransformOptions,
    ) -> TransformResult<TransformOutcome> {
        let content = run_category("content", &self.content, sender, recipients, message, options)?;
        let crypto = run_category(
            "crypto",
            &self.crypto,
            &content.sender,
            &content.recipients,
            content.message,
            options,
        )?;
        Ok(TransformOutcome {
            matched: content.matched || crypto.matched,
            ..crypto
        })
    }
}

fn insert_stage(
    stages: &mut BTreeMap<String, Arc<dyn OutgoingTransform>>,
    name: String,
    stage: Arc<dyn OutgoingTransform>,
) -> TransformResult<()> {
    if stages.contains_key(&name) {
        return Err(TransformError::DuplicateStage(name));
    }
    stages.insert(name, stage);
    Ok(())
}

fn run_category(
    category: &str,
    stages: &BTreeMap<String, Arc<dyn OutgoingTransform>>,
    sender: &str,
    recipients: &[String],
    message: OutgoingMessage,
    options: &TransformOptions,
) -> TransformResult<TransformOutcome> {
    let mut current = TransformOutcome::unchanged(sender, recipients, message);
    let mut matched = false;

    for (name, stage) in stages {
        let next =
            stage.transform_outgoing(&current.sender, &current.recipients, current.message, options)?;
        debug!(category, stage = %name, matched = next.matched, proceed = next.proceed, "stage ran");
        matched |= next.matched;
        current = next;
        if !current.proceed {
            break;
        }
    }

    current.matched = matched;
    Ok(current)
}
