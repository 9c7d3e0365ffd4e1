//! Symbol tokens.

use std::fmt;

/// A symbol as seen by readers and writers: its text, its ID, or both.
///
/// Tokens read from binary carry the ID they were encoded with plus the text
/// the governing symbol table assigns to it, if any. Tokens with text compare
/// by text; tokens without text compare by ID and never equal a token with
/// text.
#[derive(Debug, Clone, Eq)]
pub struct SymbolToken {
    text: Option<String>,
    sid: Option<usize>,
}

impl SymbolToken {
    /// A token known only by text.
    pub fn text(text: impl Into<String>) -> SymbolToken {
        SymbolToken {
            text: Some(text.into()),
            sid: None,
        }
    }

    /// A token known only by ID.
    pub fn sid(sid: usize) -> SymbolToken {
        SymbolToken {
            text: None,
            sid: Some(sid),
        }
    }

    /// A token with ID and optional resolved text.
    pub fn resolved(text: Option<String>, sid: usize) -> SymbolToken {
        SymbolToken {
            text,
            sid: Some(sid),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn as_sid(&self) -> Option<usize> {
        self.sid
    }

    /// True when the text is not known.
    pub fn is_unknown_text(&self) -> bool {
        self.text.is_none()
    }
}

impl PartialEq for SymbolToken {
    fn eq(&self, other: &Self) -> bool {
        match (&self.text, &other.text) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.sid == other.sid,
            _ => false,
        }
    }
}

impl From<&str> for SymbolToken {
    fn from(text: &str) -> Self {
        SymbolToken::text(text)
    }
}

impl From<String> for SymbolToken {
    fn from(text: String) -> Self {
        SymbolToken::text(text)
    }
}

impl fmt::Display for SymbolToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.text, self.sid) {
            (Some(text), _) => f.write_str(text),
            (None, Some(sid)) => write!(f, "${sid}"),
            (None, None) => f.write_str("$0"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality() {
        assert_eq!(SymbolToken::resolved(Some("name".into()), 4), SymbolToken::text("name"));
        assert_eq!(SymbolToken::resolved(None, 12), SymbolToken::sid(12));
        assert_ne!(SymbolToken::resolved(None, 12), SymbolToken::text("name"));
        assert_ne!(SymbolToken::text("a"), SymbolToken::text("b"));
    }

    #[test]
    fn test_equality_is_transitive() {
        let a = SymbolToken::resolved(Some("a".into()), 1);
        let unknown = SymbolToken::sid(1);
        let b = SymbolToken::resolved(Some("b".into()), 1);
        assert_ne!(a, unknown);
        assert_ne!(unknown, b);
        assert_ne!(a, b);
        assert_eq!(unknown, SymbolToken::resolved(None, 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(SymbolToken::sid(10).to_string(), "$10");
        assert_eq!(SymbolToken::from("x").to_string(), "x");
    }
}
