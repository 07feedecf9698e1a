//! `preview`: show what the outgoing stages would do to a message.

use std::sync::{Arc, Mutex};

use sealpost_core::{KeyRegistry, ProfileStore};
use sealpost_outgoing::{
    ATTACH_PUBKEY_HEADER, MessageWrapper, OPENPGP_STAGE, OpenPgpContentTransform,
    OpenPgpCryptoTransform, OutgoingMessage, TransformOptions, TransformPipeline, WrapError,
    WrapRequest, WrapperKind,
};
use serde::Serialize;

use crate::error::CommandResult;
use crate::outcome::CommandOutcome;
use crate::theme::Theme;

/// What to preview.
#[derive(Debug, Clone, Default)]
pub struct PreviewRequest {
    /// Sender, bare or `Name <addr>`.
    pub from: String,
    /// Recipients.
    pub to: Vec<String>,
    /// Crypto policy, e.g. `openpgp-sign-encrypt`.
    pub policy: String,
    /// Ask for the sender's public key to be attached.
    pub attach_key: bool,
    /// Prefer inline PGP.
    pub prefer_inline: bool,
}

/// One attachment the content stage added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentSummary {
    /// Media type.
    pub content_type: String,
    /// File name.
    pub filename: String,
    /// Content id.
    pub content_id: String,
    /// Decoded size.
    pub bytes: usize,
}

/// The transformed message, without sending anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewReport {
    /// Headers after the content stage.
    pub headers: Vec<(String, String)>,
    /// Attachments added.
    pub attachments: Vec<AttachmentSummary>,
    /// Wrapper the crypto stage selected.
    pub wrapper: WrapperKind,
    /// Whether a crypto stage matched.
    pub matched: bool,
    /// Whether later stages would still run.
    pub proceed: bool,
}

impl PreviewReport {
    fn as_text(&self) -> String {
        let mut out = vec![Theme::header("Headers:")];
        out.extend(
            self.headers
                .iter()
                .map(|(name, value)| format!("  {}", Theme::kv(name, value))),
        );
        if !self.attachments.is_empty() {
            out.push(Theme::header("Attachments:"));
            out.extend(self.attachments.iter().map(|a| {
                format!("  {} ({}, {} bytes)", a.filename, a.content_type, a.bytes)
            }));
        }
        out.push(Theme::kv("Wrapper", &self.wrapper.to_string()));
        out.join("\n")
    }
}

/// Stands in for the real wrapper: records the selection, changes nothing.
#[derive(Default)]
struct SelectionRecorder {
    selected: Mutex<Option<WrapperKind>>,
}

impl SelectionRecorder {
    fn selected(&self) -> WrapperKind {
        self.selected
            .lock()
            .ok()
            .and_then(|s| *s)
            .unwrap_or(WrapperKind::None)
    }
}

impl MessageWrapper for SelectionRecorder {
    fn wrap(
        &self,
        request: &WrapRequest<'_>,
        message: OutgoingMessage,
    ) -> Result<OutgoingMessage, WrapError> {
        if let Ok(mut selected) = self.selected.lock() {
            *selected = Some(request.kind);
        }
        Ok(message)
    }
}

/// Run both OpenPGP stages over a blank message from `request.from`.
///
/// # Errors
///
/// Fails if the pipeline cannot be assembled or a stage fails.
pub fn preview(
    registry: Arc<dyn KeyRegistry>,
    profiles: Arc<dyn ProfileStore>,
    global_preference: Option<String>,
    request: &PreviewRequest,
) -> CommandResult<CommandOutcome> {
    let recorder = Arc::new(SelectionRecorder::default());
    let mut pipeline = TransformPipeline::new();
    pipeline.register_content(
        OPENPGP_STAGE,
        Arc::new(OpenPgpContentTransform::new(registry, profiles, global_preference)),
    )?;
    pipeline.register_crypto(
        OPENPGP_STAGE,
        Arc::new(OpenPgpCryptoTransform::new(recorder.clone())),
    )?;

    let mut message = OutgoingMessage::new("")
        .with_header("From", request.from.as_str())
        .with_header("To", request.to.join(", "));
    if request.attach_key {
        message.set_header(ATTACH_PUBKEY_HEADER, "yes");
    }
    let options = TransformOptions {
        prefer_inline: request.prefer_inline,
        ..TransformOptions::with_policy(request.policy.as_str())
    };

    let out = pipeline.transform_outgoing(&request.from, &request.to, message, &options)?;
    let report = PreviewReport {
        headers: out
            .message
            .headers()
            .map(|(n, v)| (n.to_owned(), v.to_owned()))
            .collect(),
        attachments: out
            .message
            .attachments
            .iter()
            .map(|a| AttachmentSummary {
                content_type: a.content_type.clone(),
                filename: a.filename.clone(),
                content_id: a.content_id.clone(),
                bytes: a.decoded().map_or(0, |d| d.len()),
            })
            .collect(),
        wrapper: recorder.selected(),
        matched: out.matched,
        proceed: out.proceed,
    };

    let value = serde_json::to_value(&report).unwrap_or_default();
    Ok(CommandOutcome::success("preview", "Outgoing preview", value).with_text(report.as_text()))
}
