//! Identifier and literal escaping.
//!
//! SQL Server accepts two mutually exclusive identifier conventions:
//! ANSI double quotes (only while `QUOTED_IDENTIFIER` is ON) and
//! square brackets. The mode is chosen once per connection and every
//! piece of generated SQL goes through the [`Escaper`] built from it.

/// Identifier quoting convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum QuotingMode {
    /// ANSI identifiers: `"name"`.
    #[default]
    Quoted,
    /// Bracketed identifiers: `[name]`.
    Bracketed,
}

impl QuotingMode {
    /// Opening delimiter.
    #[must_use]
    pub const fn open(self) -> char {
        match self {
            Self::Quoted => '"',
            Self::Bracketed => '[',
        }
    }

    /// Closing delimiter.
    #[must_use]
    pub const fn close(self) -> char {
        match self {
            Self::Quoted => '"',
            Self::Bracketed => ']',
        }
    }

    /// Whether both delimiters are the same character.
    #[must_use]
    pub const fn is_symmetric(self) -> bool {
        matches!(self, Self::Quoted)
    }
}

/// Character used to escape LIKE wildcards.
pub const LIKE_ESCAPE_CHAR: char = '!';

/// Escapes identifiers and literals for one quoting mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Escaper {
    mode: QuotingMode,
}

impl Escaper {
    /// Creates an escaper for the given mode.
    #[must_use]
    pub const fn new(mode: QuotingMode) -> Self {
        Self { mode }
    }

    /// The quoting mode in use.
    #[must_use]
    pub const fn mode(&self) -> QuotingMode {
        self.mode
    }

    /// Escapes a possibly dotted identifier such as `dbo.users`.
    ///
    /// Each segment is wrapped separately. `*` and segments that are
    /// already delimited pass through untouched. A closing delimiter
    /// inside a segment is doubled.
    #[must_use]
    pub fn identifier(&self, name: &str) -> String {
        name.split('.')
            .map(|segment| self.segment(segment.trim()))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Escapes every name in `names`.
    #[must_use]
    pub fn identifiers<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        names.iter().map(|n| self.identifier(n.as_ref())).collect()
    }

    fn segment(&self, segment: &str) -> String {
        let (open, close) = (self.mode.open(), self.mode.close());
        if segment == "*" || segment.is_empty() {
            return segment.to_string();
        }
        if segment.len() >= 2 && segment.starts_with(open) && segment.ends_with(close) {
            return segment.to_string();
        }
        let doubled: String = segment
            .chars()
            .flat_map(|c| {
                if c == close {
                    vec![c, c]
                } else {
                    vec![c]
                }
            })
            .collect();
        format!("{open}{doubled}{close}")
    }

    /// Renders a string literal, doubling embedded single quotes.
    #[must_use]
    pub fn string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Renders a Unicode string literal (`N'...'`).
    #[must_use]
    pub fn unicode_literal(&self, value: &str) -> String {
        format!("N{}", self.string_literal(value))
    }

    /// Escapes a value for use inside a LIKE pattern.
    ///
    /// Quotes are doubled and the wildcard characters `%`, `_` and the
    /// escape character itself are prefixed with [`LIKE_ESCAPE_CHAR`].
    /// The result is not wrapped in quotes.
    #[must_use]
    pub fn like_pattern(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\'' => out.push_str("''"),
                '%' | '_' | LIKE_ESCAPE_CHAR => {
                    out.push(LIKE_ESCAPE_CHAR);
                    out.push(c);
                }
                _ => out.push(c),
            }
        }
        out
    }

    /// The `ESCAPE` clause matching [`Escaper::like_pattern`].
    #[must_use]
    pub fn like_escape_clause(&self) -> String {
        format!(" ESCAPE '{LIKE_ESCAPE_CHAR}'")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_mode_delimiters() {
        assert_eq!(QuotingMode::Quoted.open(), '"');
        assert_eq!(QuotingMode::Quoted.close(), '"');
        assert!(QuotingMode::Quoted.is_symmetric());
        assert_eq!(QuotingMode::Bracketed.open(), '[');
        assert_eq!(QuotingMode::Bracketed.close(), ']');
        assert!(!QuotingMode::Bracketed.is_symmetric());
    }

    #[test]
    fn test_identifier_escaping() {
        let quoted = Escaper::new(QuotingMode::Quoted);
        let bracketed = Escaper::new(QuotingMode::Bracketed);

        assert_eq!(quoted.identifier("users"), "\"users\"");
        assert_eq!(bracketed.identifier("users"), "[users]");
        assert_eq!(bracketed.identifier("dbo.users"), "[dbo].[users]");
        assert_eq!(bracketed.identifier("users.*"), "[users].*");
        assert_eq!(bracketed.identifier("[users]"), "[users]");
        assert_eq!(bracketed.identifier("odd]name"), "[odd]]name]");
        assert_eq!(quoted.identifier("say\"hi"), "\"say\"\"hi\"");
    }

    #[test]
    fn test_identifiers_list() {
        let e = Escaper::new(QuotingMode::Bracketed);
        assert_eq!(e.identifiers(&["a", "b"]), vec!["[a]", "[b]"]);
    }

    #[test]
    fn test_string_literals() {
        let e = Escaper::default();
        assert_eq!(e.string_literal("O'Brien"), "'O''Brien'");
        assert_eq!(e.unicode_literal("x"), "N'x'");
    }

    #[test]
    fn test_like_pattern() {
        let e = Escaper::default();
        assert_eq!(e.like_pattern("app_"), "app!_");
        assert_eq!(e.like_pattern("50%!"), "50!%!!");
        assert_eq!(e.like_pattern("it's"), "it''s");
        assert_eq!(e.like_escape_clause(), " ESCAPE '!'");
    }
}
