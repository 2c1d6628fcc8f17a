//! Closed error type for the demangler.
//!
//! Every parsing function in this crate returns [`Result<T>`], threading a
//! single [`Error`] enum all the way up to [`crate::parse`]. There is no
//! generic "parse failed" variant: each grammar rule that can fail reports
//! exactly which rule it was and the cursor position it failed at, so a
//! caller using [`try_demangle`](crate::try_demangle) can report something
//! more useful than "invalid input".

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Every way a mangled symbol can fail to parse.
///
/// `InvariantViolated` is the only variant that should never be observable
/// from a well-formed *or* malformed input: seeing it means this crate has a
/// bug, not that the input is bad GNU v2 mangling.
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unexpected end of input at byte {position}")]
    UnexpectedEnd { position: usize },

    #[error("expected a decimal length prefix at byte {position}")]
    ExpectedDigits { position: usize },

    #[error("unknown type code {code:#04x} ({code_char:?}) at byte {position}", code_char = *code as char)]
    UnknownTypeCode { position: usize, code: u8 },

    #[error("back-reference T{index} at byte {position} has no matching parameter yet")]
    BackRefOutOfRange { position: usize, index: usize },

    #[error("unsupported GNU v2 feature '{tag}' at byte {position}")]
    UnsupportedFeature {
        position: usize,
        tag: &'static str,
    },

    #[error("malformed name at byte {position}: {reason}")]
    MalformedName {
        position: usize,
        reason: &'static str,
    },

    #[error("trailing garbage after a complete parse, starting at byte {position}")]
    TrailingGarbage { position: usize },

    #[error("internal invariant violated: {reason}")]
    InvariantViolated { reason: &'static str },
}

impl Error {
    /// The byte offset the failure was detected at, when one is known.
    ///
    /// `InvariantViolated` carries no position since it does not originate
    /// from cursor state.
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::UnexpectedEnd { position }
            | Error::ExpectedDigits { position }
            | Error::UnknownTypeCode { position, .. }
            | Error::BackRefOutOfRange { position, .. }
            | Error::UnsupportedFeature { position, .. }
            | Error::MalformedName { position, .. }
            | Error::TrailingGarbage { position } => Some(*position),
            Error::InvariantViolated { .. } => None,
        }
    }

    /// A short, stable tag for the error kind, independent of its `Display`
    /// message. Used by the CLI's `--error-on-failure` output.
    pub fn kind_tag(&self) -> &'static str {
        match self {
            Error::UnexpectedEnd { .. } => "UnexpectedEnd",
            Error::ExpectedDigits { .. } => "ExpectedDigits",
            Error::UnknownTypeCode { .. } => "UnknownTypeCode",
            Error::BackRefOutOfRange { .. } => "BackRefOutOfRange",
            Error::UnsupportedFeature { .. } => "UnsupportedFeature",
            Error::MalformedName { .. } => "MalformedName",
            Error::TrailingGarbage { .. } => "TrailingGarbage",
            Error::InvariantViolated { .. } => "InvariantViolated",
        }
    }
}
