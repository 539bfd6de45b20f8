use crate::Flags;

/// Error returned by [`Regex::compile()`](crate::Regex::compile),
/// [`Regex::with_hir()`](crate::Regex::with_hir) and
/// [`GeneratorArgs::initialize()`](crate::GeneratorArgs::initialize).
///
/// Errors that wrap another error print their own message first, followed by
/// a `caused by` line carrying the original message.
///
/// # Examples
///
/// ```
/// let err = regen::Regex::compile("(", regen::GeneratorArgs::default()).unwrap_err();
/// assert!(err.to_string().starts_with("error parsing regexp `(`\ncaused by "));
/// ```
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The arguments request dialect flags this generator cannot honor.
    #[error("unsupported flags: {0}")]
    UnsupportedFlags(Flags),

    /// The pattern uses a Unicode general category or script class such as
    /// `\pL` or `\p{Greek}`.
    #[error("unicode character classes are not supported: `{class}`")]
    UnsupportedClass {
        /// The offending class as written in the pattern.
        class: String,
    },

    /// The input regex has a syntax error.
    ///
    /// # Examples
    ///
    /// ```
    /// let gen = regen::Regex::compile(r"a{2,1}", regen::GeneratorArgs::default());
    /// assert!(matches!(gen, Err(regen::Error::Syntax { .. })));
    /// ```
    #[error("error parsing regexp `{pattern}`\ncaused by {source}")]
    Syntax {
        /// The pattern that failed to parse.
        pattern: String,
        /// The parser's own error, unchanged.
        #[source]
        source: regex_syntax::Error,
    },
}

impl Error {
    pub(crate) fn syntax(pattern: &str, source: impl Into<regex_syntax::Error>) -> Self {
        Self::Syntax {
            pattern: pattern.to_owned(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_without_cause() {
        let err = Error::UnsupportedFlags(Flags::UNICODE_CLASSES);
        assert_eq!(err.to_string(), "unsupported flags: UNICODE_CLASSES");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_display_with_cause() {
        let cause = regex_syntax::Parser::new().parse("(").unwrap_err();
        let err = Error::syntax("(", cause.clone());
        assert_eq!(
            err.to_string(),
            format!("error parsing regexp `(`\ncaused by {cause}")
        );
        assert_eq!(err.source().unwrap().to_string(), cause.to_string());
    }
}
