//! Defines error and its location
use std::fmt;

use serde::de;

use crate::budget::BudgetBreach;
use crate::location::Location;

/// Longest excerpt of offending document text quoted in an error message.
const MAX_QUOTED_CHARS: usize = 64;

/// Error type compatible with `serde::de::Error`.
///
/// Every decode failure aborts the whole call and surfaces exactly one of these.
#[derive(Debug)]
pub enum Error {
    /// Free-form error with optional source location (usually from a `Deserialize` impl).
    Message {
        msg: String,
        location: Location,
    },
    /// Input ended before the current value was complete.
    Eof {
        /// Where the decoder was, e.g. "inside <dict>".
        context: String,
        location: Location,
    },
    /// A `<` was found without a closing `>`.
    UnterminatedTag {
        location: Location,
    },
    /// A tag that is not allowed at this position.
    UnexpectedTag {
        /// The tag as written in the document.
        tag: String,
        /// Where the decoder was, e.g. "inside <dict>".
        context: String,
        location: Location,
    },
    /// The document does not start with the `<plist>` wrapper.
    NotAPlist {
        /// The first non-declaration tag, or "end of input".
        found: String,
        location: Location,
    },
    /// Something other than whitespace follows the root value or `</plist>`.
    TrailingContent {
        location: Location,
    },
    /// The decoded value kind does not fit the destination's shape.
    TypeMismatch {
        /// What the document contained (e.g. "map").
        unexpected: String,
        /// What the destination wanted (e.g. "a sequence").
        expected: String,
        location: Location,
    },
    /// A scalar body could not be converted to the destination type.
    Conversion {
        /// Name of the tag whose body failed to convert.
        tag: String,
        /// What the body was being converted to.
        expected: &'static str,
        /// The offending text (truncated).
        text: String,
        location: Location,
    },
    /// A [`crate::Budget`] limit was exceeded.
    Budget {
        breach: BudgetBreach,
        location: Location,
    },
    /// Wrap an error with a rendered excerpt of the input around its location.
    WithSnippet {
        /// Pre-rendered snippet output.
        text: String,
        crop_radius: usize,
        error: Box<Error>,
    },
}

impl Error {
    /// Construct a `Message` error with no known location.
    pub(crate) fn msg<S: Into<String>>(s: S) -> Self {
        Error::Message {
            msg: s.into(),
            location: Location::UNKNOWN,
        }
    }

    /// Construct an unexpected end-of-input error with unknown location.
    pub(crate) fn eof(context: &str) -> Self {
        Error::Eof {
            context: context.to_owned(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn unterminated_tag() -> Self {
        Error::UnterminatedTag {
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn unexpected_tag(tag: &str, context: &str) -> Self {
        Error::UnexpectedTag {
            tag: quote(tag),
            context: context.to_owned(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn not_a_plist(found: &str) -> Self {
        Error::NotAPlist {
            found: quote(found),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn trailing_content() -> Self {
        Error::TrailingContent {
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn type_mismatch(unexpected: &str, expected: &str) -> Self {
        Error::TypeMismatch {
            unexpected: unexpected.to_owned(),
            expected: expected.to_owned(),
            location: Location::UNKNOWN,
        }
    }

    /// Conversion failure for the body of `<tag>`.
    ///
    /// Arguments:
    /// - `tag`: tag name without brackets.
    /// - `expected`: destination description such as "i32" or "RFC3339 date".
    /// - `text`: the offending body, quoted back truncated.
    pub(crate) fn conversion(tag: &str, expected: &'static str, text: &str) -> Self {
        Error::Conversion {
            tag: tag.to_owned(),
            expected,
            text: quote(text),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn budget(breach: BudgetBreach) -> Self {
        Error::Budget {
            breach,
            location: Location::UNKNOWN,
        }
    }

    /// Wrap this error with a rendered source snippet.
    ///
    /// Returns the error unchanged when no snippet can be rendered (unknown
    /// location, location outside `text`).
    pub(crate) fn with_snippet(self, text: &str, crop_radius: usize) -> Self {
        // Avoid nesting snippet wrappers: keep the innermost error.
        let inner = match self {
            Error::WithSnippet { error, .. } => *error,
            other => other,
        };
        let Some(location) = inner.location() else {
            return inner;
        };
        match crate::snippet::render(text, &location, &inner.describe(), crop_radius) {
            Some(rendered) => Error::WithSnippet {
                text: rendered,
                crop_radius,
                error: Box::new(inner),
            },
            None => inner,
        }
    }

    /// Attach/override a concrete location to this error and return it.
    pub(crate) fn with_location(mut self, set_location: Location) -> Self {
        match &mut self {
            Error::Message { location, .. }
            | Error::Eof { location, .. }
            | Error::UnterminatedTag { location }
            | Error::UnexpectedTag { location, .. }
            | Error::NotAPlist { location, .. }
            | Error::TrailingContent { location }
            | Error::TypeMismatch { location, .. }
            | Error::Conversion { location, .. }
            | Error::Budget { location, .. } => {
                *location = set_location;
            }
            Error::WithSnippet { .. } => {} // already rendered
        }
        self
    }

    /// Attach `location` only if the error does not carry one yet.
    ///
    /// Used by:
    /// - Value boundaries, so that errors raised by a `Deserialize` impl point at
    ///   the value that was being decoded while the innermost location wins.
    pub(crate) fn or_location(self, location: Location) -> Self {
        if self.location().is_some() || matches!(self, Error::WithSnippet { .. }) {
            self
        } else {
            self.with_location(location)
        }
    }

    /// If the error has a known location, return it.
    pub fn location(&self) -> Option<Location> {
        match self {
            Error::Message { location, .. }
            | Error::Eof { location, .. }
            | Error::UnterminatedTag { location }
            | Error::UnexpectedTag { location, .. }
            | Error::NotAPlist { location, .. }
            | Error::TrailingContent { location }
            | Error::TypeMismatch { location, .. }
            | Error::Conversion { location, .. }
            | Error::Budget { location, .. } => {
                if location != &Location::UNKNOWN {
                    Some(*location)
                } else {
                    None
                }
            }
            Error::WithSnippet { error, .. } => error.location(),
        }
    }

    /// The underlying error with any snippet wrapper removed.
    pub fn without_snippet(&self) -> &Error {
        match self {
            Error::WithSnippet { error, .. } => error.without_snippet(),
            other => other,
        }
    }

    /// Message text without the location suffix.
    fn describe(&self) -> String {
        match self {
            Error::Message { msg, .. } => msg.clone(),
            Error::Eof { context, .. } => format!("unexpected end of input {context}"),
            Error::UnterminatedTag { .. } => "unterminated tag: `<` without a closing `>`".to_owned(),
            Error::UnexpectedTag { tag, context, .. } => format!("unexpected tag {tag} {context}"),
            Error::NotAPlist { found, .. } => {
                format!("not a plist: expected <plist> root tag, found {found}")
            }
            Error::TrailingContent { .. } => "unexpected content after the root value".to_owned(),
            Error::TypeMismatch {
                unexpected,
                expected,
                ..
            } => format!("invalid type: {unexpected}, expected {expected}"),
            Error::Conversion {
                tag,
                expected,
                text,
                ..
            } => format!("cannot convert <{tag}> body `{text}` to {expected}"),
            Error::Budget { breach, .. } => format!("plist budget breached: {breach:?}"),
            Error::WithSnippet { error, .. } => error.describe(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WithSnippet {
                text,
                crop_radius,
                error,
            } => {
                if *crop_radius == 0 {
                    // Treat as "snippet disabled".
                    return write!(f, "{error}");
                }
                write!(f, "{text}")
            }
            other => fmt_with_location(f, &other.describe(), other.location()),
        }
    }
}

impl std::error::Error for Error {}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::msg(msg.to_string())
    }

    fn invalid_type(unexp: de::Unexpected<'_>, exp: &dyn de::Expected) -> Self {
        Error::type_mismatch(&unexp.to_string(), &exp.to_string())
    }

    fn invalid_value(unexp: de::Unexpected<'_>, exp: &dyn de::Expected) -> Self {
        Error::type_mismatch(&unexp.to_string(), &exp.to_string())
    }

    fn invalid_length(len: usize, exp: &dyn de::Expected) -> Self {
        Error::type_mismatch(&format!("{len} elements"), &exp.to_string())
    }
}

/// Print a message optionally suffixed with "at line X, column Y".
fn fmt_with_location(f: &mut fmt::Formatter<'_>, msg: &str, location: Option<Location>) -> fmt::Result {
    match location {
        Some(location) => write!(
            f,
            "{msg} at line {}, column {}",
            location.line, location.column
        ),
        None => write!(f, "{msg}"),
    }
}

/// Shorten document text quoted back in a message.
fn quote(text: &str) -> String {
    if text.chars().count() <= MAX_QUOTED_CHARS {
        text.to_owned()
    } else {
        let mut out: String = text.chars().take(MAX_QUOTED_CHARS).collect();
        out.push_str("...");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::Error as _;

    #[test]
    fn display_appends_known_location() {
        let loc = Location::from_offset(b"<plist>\n<bad>", 8);
        let err = Error::unexpected_tag("<bad>", "where a value was expected").with_location(loc);
        assert_eq!(
            err.to_string(),
            "unexpected tag <bad> where a value was expected at line 2, column 1"
        );
        assert_eq!(err.location(), Some(loc));
    }

    #[test]
    fn unknown_location_is_omitted() {
        let err = Error::conversion("integer", "i64", "abc");
        assert_eq!(err.to_string(), "cannot convert <integer> body `abc` to i64");
        assert!(err.location().is_none());
    }

    #[test]
    fn or_location_keeps_the_innermost_location() {
        let inner = Location::from_offset(b"abc", 2);
        let outer = Location::from_offset(b"abc", 0);
        let err = Error::msg("x").with_location(inner).or_location(outer);
        assert_eq!(err.location(), Some(inner));
        let err = Error::msg("x").or_location(outer);
        assert_eq!(err.location(), Some(outer));
    }

    #[test]
    fn invalid_type_becomes_type_mismatch() {
        let err = Error::invalid_type(de::Unexpected::Map, &"a sequence");
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert_eq!(err.to_string(), "invalid type: map, expected a sequence");
    }

    #[test]
    fn long_text_is_truncated() {
        let long = "A".repeat(200);
        let Error::Conversion { text, .. } = Error::conversion("data", "base64 data", &long) else {
            panic!("conversion error expected");
        };
        assert_eq!(text.len(), MAX_QUOTED_CHARS + 3);
        assert!(text.ends_with("..."));
    }
}
