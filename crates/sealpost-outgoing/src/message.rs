//! The outgoing message model the transform stages operate on.
//!
//! This is not a MIME serializer: headers are an ordered, case-insensitive
//! list and attachments carry their already-encoded payload.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

/// Line length for base64 transfer encoding.
const BASE64_LINE_LEN: usize = 76;

/// Signature and encryption state inherited by attached parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CryptoState {
    /// Signature state, if the message is or will be signed.
    pub signature: Option<String>,
    /// Encryption state, if the message is or will be encrypted.
    pub encryption: Option<String>,
}

/// One attached part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    /// Media type, e.g. `application/pgp-keys`.
    pub content_type: String,
    /// Suggested filename.
    pub filename: String,
    /// Unique `Content-Id`.
    pub content_id: String,
    /// `Content-Disposition` (always `attachment` for keys).
    pub disposition: String,
    /// `Content-Transfer-Encoding`.
    pub transfer_encoding: String,
    /// Encoded payload.
    pub payload: String,
    /// Crypto state inherited from the parent message.
    pub crypto: CryptoState,
}

impl Attachment {
    /// A base64-encoded attachment.
    #[must_use]
    pub fn base64(
        content_type: impl Into<String>,
        filename: impl Into<String>,
        content_id: impl Into<String>,
        data: &[u8],
    ) -> Self {
        Self {
            content_type: content_type.into(),
            filename: filename.into(),
            content_id: content_id.into(),
            disposition: "attachment".to_owned(),
            transfer_encoding: "base64".to_owned(),
            payload: encode_base64_lines(data),
            crypto: CryptoState::default(),
        }
    }

    /// Decode the payload, if it is base64.
    #[must_use]
    pub fn decoded(&self) -> Option<Vec<u8>> {
        let joined: String = self.payload.split_whitespace().collect();
        STANDARD.decode(joined).ok()
    }
}

/// An outgoing message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    headers: Vec<(String, String)>,
    /// Message body.
    pub body: String,
    /// Attached parts, in order.
    pub attachments: Vec<Attachment>,
    /// Crypto state of the message itself.
    pub crypto: CryptoState,
}

impl OutgoingMessage {
    /// A message with just a body.
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// Builder-style header insertion.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// First value of header `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether header `name` is present.
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Set header `name`, replacing every existing value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(idx) => {
                self.headers[idx].1 = value;
                let mut seen = 0_usize;
                self.headers.retain(|(n, _)| {
                    if n.eq_ignore_ascii_case(&name) {
                        seen = seen.saturating_add(1);
                        seen == 1
                    } else {
                        true
                    }
                });
            },
            None => self.headers.push((name, value)),
        }
    }

    /// Remove every value of header `name`; returns whether any existed.
    pub fn remove_header(&mut self, name: &str) -> bool {
        let before = self.headers.len();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        before != self.headers.len()
    }

    /// All headers in order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Attach a part.
    pub fn attach(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }
}

/// Base64 with CRLF-free 76 character lines.
fn encode_base64_lines(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut out = String::with_capacity(
        encoded
            .len()
            .saturating_add(encoded.len().saturating_div(BASE64_LINE_LEN)),
    );
    for (i, chunk) in encoded.as_bytes().chunks(BASE64_LINE_LEN).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        // base64 output is ASCII.
        out.push_str(&String::from_utf8_lossy(chunk));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_are_case_insensitive_and_replaced() {
        let mut msg = OutgoingMessage::new("hi")
            .with_header("Subject", "one")
            .with_header("X-Test", "a");
        msg.headers.push(("x-test".to_owned(), "b".to_owned()));

        assert_eq!(msg.header("SUBJECT"), Some("one"));
        msg.set_header("X-TEST", "c");
        assert_eq!(msg.headers().filter(|(n, _)| n.eq_ignore_ascii_case("x-test")).count(), 1);
        assert_eq!(msg.header("x-test"), Some("c"));

        assert!(msg.remove_header("subject"));
        assert!(!msg.has_header("Subject"));
        assert!(!msg.remove_header("subject"));
    }

    #[test]
    fn test_base64_attachment_wraps_lines() {
        let data = vec![0x42_u8; 200];
        let att = Attachment::base64("application/pgp-keys", "k.asc", "<cid>", &data);
        assert_eq!(att.transfer_encoding, "base64");
        assert_eq!(att.disposition, "attachment");
        assert!(att.payload.lines().all(|l| l.len() <= BASE64_LINE_LEN));
        assert!(att.payload.lines().count() > 1);
        assert_eq!(att.decoded().unwrap(), data);
    }
}
