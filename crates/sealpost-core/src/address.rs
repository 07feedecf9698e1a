//! Sender address helpers.

/// Reduce a sender such as `"Alice" <alice@example.org>` to its bare address.
///
/// Returns `None` if no address can be found.
#[must_use]
pub fn extract_address(sender: &str) -> Option<&str> {
    let sender = sender.trim();
    let candidate = match (sender.rfind('<'), sender.rfind('>')) {
        (Some(open), Some(close)) if open < close => &sender[open.saturating_add(1)..close],
        _ => sender,
    };
    let candidate = candidate.trim();
    (candidate.contains('@') && !candidate.contains(char::is_whitespace)).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_address() {
        assert_eq!(
            extract_address("\"Alice A.\" <alice@example.org>"),
            Some("alice@example.org")
        );
        assert_eq!(extract_address(" bob@example.org "), Some("bob@example.org"));
        assert_eq!(extract_address("Nobody"), None);
        assert_eq!(extract_address("broken <>"), None);
    }
}
