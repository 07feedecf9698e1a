//! `openpgp_header` directive codes and their preference keywords.

use std::fmt;

use serde::Serialize;

/// Directive segment prefix selecting the header code.
const SEGMENT_PREFIX: &str = "openpgp_header:";

/// Code selected by an `openpgp_header:<code>` directive segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HeaderCode {
    /// `N`: advertise nothing.
    Unprotected,
    /// `E`: prefer encryption.
    Encrypt,
    /// `S`: prefer signatures.
    Sign,
    /// `ES`.
    EncryptSign,
    /// `SE`.
    SignEncrypt,
    /// `CFG`: defer to the global preference.
    Config,
}

impl HeaderCode {
    /// Parse a code, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "N" => Some(Self::Unprotected),
            "E" => Some(Self::Encrypt),
            "S" => Some(Self::Sign),
            "ES" => Some(Self::EncryptSign),
            "SE" => Some(Self::SignEncrypt),
            "CFG" => Some(Self::Config),
            _ => None,
        }
    }

    /// The preference keyword advertised for this code.
    ///
    /// `Config` maps to `global`, which is `None` when no global preference
    /// is set.
    #[must_use]
    pub fn preference<'a>(self, global: Option<&'a str>) -> Option<&'a str> {
        match self {
            Self::EncryptSign | Self::SignEncrypt => Some("signencrypt"),
            Self::Encrypt => Some("encrypt"),
            Self::Sign => Some("sign"),
            Self::Unprotected => Some("unprotected"),
            Self::Config => global,
        }
    }
}

impl fmt::Display for HeaderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unprotected => "N",
            Self::Encrypt => "E",
            Self::Sign => "S",
            Self::EncryptSign => "ES",
            Self::SignEncrypt => "SE",
            Self::Config => "CFG",
        })
    }
}

/// What a crypto-format directive says about the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderDirective {
    /// No `openpgp_header` segment.
    Absent,
    /// A recognised code.
    Code(HeaderCode),
    /// A segment whose code is not recognised.
    Malformed(String),
}

impl HeaderDirective {
    /// Read the first `openpgp_header:` segment of a `+`-joined directive.
    #[must_use]
    pub fn from_crypto_format(crypto_format: &str) -> Self {
        let Some(code) = crypto_format
            .split('+')
            .find_map(|segment| segment.trim().strip_prefix(SEGMENT_PREFIX))
        else {
            return Self::Absent;
        };
        match HeaderCode::parse(code) {
            Some(code) => Self::Code(code),
            None => Self::Malformed(code.to_owned()),
        }
    }

    /// Resolve to a code, falling back to `CFG` when the directive is absent
    /// and a global preference is set.
    #[must_use]
    pub fn resolve(&self, global_set: bool) -> Option<HeaderCode> {
        match self {
            Self::Code(code) => Some(*code),
            Self::Absent if global_set => Some(HeaderCode::Config),
            Self::Absent | Self::Malformed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preference_table() {
        let cases = [
            ("N", Some("unprotected")),
            ("E", Some("encrypt")),
            ("S", Some("sign")),
            ("ES", Some("signencrypt")),
            ("SE", Some("signencrypt")),
            ("CFG", Some("sign")),
        ];
        for (raw, want) in cases {
            let code = HeaderCode::parse(raw).unwrap();
            assert_eq!(code.preference(Some("sign")), want, "code {raw}");
            assert_eq!(code.to_string(), raw);
        }
        assert_eq!(HeaderCode::Config.preference(None), None);
    }

    #[test]
    fn test_codes_parse_case_insensitively() {
        assert_eq!(HeaderCode::parse("se"), Some(HeaderCode::SignEncrypt));
        assert_eq!(HeaderCode::parse("cfg"), Some(HeaderCode::Config));
        assert_eq!(HeaderCode::parse("X"), None);
        assert_eq!(HeaderCode::parse(""), None);
    }

    #[test]
    fn test_first_segment_wins() {
        assert_eq!(
            HeaderDirective::from_crypto_format("pgpmime+openpgp_header:E+openpgp_header:S"),
            HeaderDirective::Code(HeaderCode::Encrypt)
        );
        assert_eq!(
            HeaderDirective::from_crypto_format("pgpmime"),
            HeaderDirective::Absent
        );
        assert_eq!(HeaderDirective::from_crypto_format(""), HeaderDirective::Absent);
        assert_eq!(
            HeaderDirective::from_crypto_format("openpgp_header:Q"),
            HeaderDirective::Malformed("Q".to_owned())
        );
    }

    #[test]
    fn test_resolve_fallback() {
        assert_eq!(HeaderDirective::Absent.resolve(true), Some(HeaderCode::Config));
        assert_eq!(HeaderDirective::Absent.resolve(false), None);
        assert_eq!(HeaderDirective::Malformed("Q".into()).resolve(true), None);
        assert_eq!(
            HeaderDirective::Code(HeaderCode::Unprotected).resolve(false),
            Some(HeaderCode::Unprotected)
        );
    }
}
