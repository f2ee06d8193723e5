//! The raw failure shape reported by a minifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A minifier failure before it is turned into a [`Diagnostic`](crate::Diagnostic).
///
/// The variants are mutually exclusive and checked in order of richness: a
/// stack trace wins over a position, a position wins over a bare message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawMinifyError {
    /// The minifier supplied a full stack trace.
    StackPresent {
        /// The stack trace, used verbatim as the diagnostic message.
        stack: String,
    },
    /// The minifier supplied a position in its input.
    PositionPresent {
        /// The error message without location.
        message: String,
        /// 1-based line.
        line: u32,
        /// Column as reported; used directly as the generated map column.
        col: u32,
    },
    /// The minifier supplied only a message.
    MessageOnly {
        /// The error message.
        message: String,
    },
}

impl RawMinifyError {
    /// Classifies loosely-shaped failure data into a variant.
    ///
    /// A non-empty `stack` selects [`StackPresent`](Self::StackPresent); both
    /// `line` and `col` present select [`PositionPresent`](Self::PositionPresent).
    pub fn from_parts(
        message: impl Into<String>,
        line: Option<u32>,
        col: Option<u32>,
        stack: Option<String>,
    ) -> Self {
        match (stack, line, col) {
            (Some(stack), _, _) if !stack.is_empty() => Self::StackPresent { stack },
            (_, Some(line), Some(col)) => Self::PositionPresent {
                message: message.into(),
                line,
                col,
            },
            _ => Self::MessageOnly {
                message: message.into(),
            },
        }
    }

    /// Creates a message-only failure.
    pub fn message(message: impl Into<String>) -> Self {
        Self::MessageOnly {
            message: message.into(),
        }
    }
}

impl fmt::Display for RawMinifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackPresent { stack } => f.write_str(stack),
            Self::PositionPresent { message, line, col } => {
                write!(f, "{message} ({line}:{col})")
            }
            Self::MessageOnly { message } => f.write_str(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_wins() {
        let raw = RawMinifyError::from_parts("Message", Some(1), Some(1), Some("Stack".into()));
        assert_eq!(
            raw,
            RawMinifyError::StackPresent {
                stack: "Stack".into()
            }
        );
    }

    #[test]
    fn empty_stack_ignored() {
        let raw = RawMinifyError::from_parts("Message", Some(2), Some(3), Some(String::new()));
        assert!(matches!(
            raw,
            RawMinifyError::PositionPresent { line: 2, col: 3, .. }
        ));
    }

    #[test]
    fn partial_position_is_message_only() {
        let raw = RawMinifyError::from_parts("Message", Some(2), None, None);
        assert_eq!(raw, RawMinifyError::message("Message"));
    }

    #[test]
    fn serde_tagged() {
        let raw = RawMinifyError::message("m");
        let json = serde_json::to_value(&raw).unwrap();
        assert_eq!(json["kind"], "message_only");
    }
}
