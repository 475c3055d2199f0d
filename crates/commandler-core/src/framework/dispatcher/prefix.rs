//! Command prefixes, optionally taken from request headers.

use std::sync::LazyLock;

use regex::Regex;

use crate::foundation::event::Request;

static HEADER_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^\$\{(?<key>[A-Z\d_-]+)(?::(?<default>.*))?\}$").ok());

/// A configured command prefix.
///
/// Written as `${KEY}` or `${KEY:default}`, the prefix is read from the
/// request header `KEY`; a missing or blank header falls back to `default`,
/// and without a default the prefix is ignored for that request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prefix {
    Literal(String),
    Header {
        key: String,
        default: Option<String>,
    },
}

impl Prefix {
    pub fn parse(raw: &str) -> Self {
        let captures = HEADER_PREFIX.as_ref().and_then(|re| re.captures(raw));
        match captures {
            Some(caps) => Self::Header {
                key: caps["key"].to_string(),
                default: caps.name("default").map(|m| m.as_str().to_string()),
            },
            None => Self::Literal(raw.to_string()),
        }
    }

    /// The effective prefix text for `request`, if any.
    pub fn resolve<'a>(&'a self, request: &'a Request) -> Option<&'a str> {
        match self {
            Self::Literal(text) => Some(text.as_str()),
            Self::Header { key, default } => request
                .header(key)
                .filter(|value| !value.trim().is_empty())
                .or(default.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal() {
        assert_eq!(Prefix::parse(">"), Prefix::Literal(">".into()));
        assert_eq!(Prefix::parse("${not closed"), Prefix::Literal("${not closed".into()));
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            Prefix::parse("${guild_prefix:!}"),
            Prefix::Header {
                key: "guild_prefix".into(),
                default: Some("!".into()),
            }
        );
        assert_eq!(
            Prefix::parse("${PREFIX}"),
            Prefix::Header {
                key: "PREFIX".into(),
                default: None,
            }
        );
    }

    #[test]
    fn test_resolve_header() {
        let prefix = Prefix::parse("${prefix:!}");
        let request = Request::new("test", "1", "?ping")
            .with_header("prefix", "?")
            .unwrap();
        assert_eq!(prefix.resolve(&request), Some("?"));

        let blank = Request::new("test", "1", "!ping")
            .with_header("prefix", "  ")
            .unwrap();
        assert_eq!(prefix.resolve(&blank), Some("!"));
    }

    #[test]
    fn test_resolve_header_without_default() {
        let prefix = Prefix::parse("${prefix}");
        let request = Request::new("test", "1", "ping");
        assert_eq!(prefix.resolve(&request), None);
    }
}
