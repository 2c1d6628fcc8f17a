//! Decoder for GNU v2 C++ mangled symbol names — the textual encoding
//! pre-GNUv3 toolchains used to embed type and scoping information into
//! linker-visible identifiers.
//!
//! ```
//! let decl = gnu2_demangle::demangle(b"BgFilter__9ivTSolverP12ivInteractor");
//! assert_eq!(decl, "ivTSolver::BgFilter(ivInteractor *)");
//! ```
//!
//! The core is [`parse`], a recursive-descent grammar in [`parser`] built
//! on [`cursor::Cursor`] and the [`ast`] node types; [`printer`] renders
//! the resulting [`ast::CxxSymbol`] back to a C++ declaration. [`demangle`]
//! and [`try_demangle`] are thin convenience wrappers around the two.

#![forbid(unsafe_code)]

pub mod ast;
pub mod cursor;
pub mod error;
pub mod operators;
pub mod parser;
pub mod printer;

pub use ast::{
    Builtin, CvQualifiers, CxxSymbol, Name, NameSegment, SpecialFlags, SymbolKind, TemplateArg,
    TemplateLiteral, Type,
};
pub use error::{Error, Result};
pub use printer::PrintOptions;

/// Parses a mangled symbol into its structured representation.
///
/// This is the library's fallible entry point; [`demangle`] and
/// [`try_demangle`] are built on it.
pub fn parse(bytes: &[u8]) -> Result<CxxSymbol> {
    parser::symbol::parse_symbol(bytes)
}

/// Parses and renders `bytes`, propagating any parse failure.
///
/// Use this over [`demangle`] when the caller wants to distinguish a
/// successful demangle from swallow-and-echo fallback (e.g. the CLI's
/// `--error-on-failure` mode).
pub fn try_demangle(bytes: &[u8]) -> Result<String> {
    try_demangle_with(bytes, &PrintOptions::default())
}

/// Like [`try_demangle`] with explicit rendering options.
pub fn try_demangle_with(bytes: &[u8], opts: &PrintOptions) -> Result<String> {
    let symbol = parse(bytes)?;
    Ok(printer::render_symbol(&symbol, opts))
}

/// Demangles `bytes`, never failing: on any parse error the input is
/// echoed back verbatim as a lossy UTF-8 string — swallow-and-echo is the
/// default surface behavior for both this function and the CLI.
pub fn demangle(bytes: &[u8]) -> String {
    demangle_with(bytes, &PrintOptions::default())
}

/// Like [`demangle`] with explicit rendering options.
pub fn demangle_with(bytes: &[u8], opts: &PrintOptions) -> String {
    try_demangle_with(bytes, opts).unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swallow_and_echo_on_failure() {
        assert_eq!(demangle(b"aa__aa"), "aa__aa");
        assert_eq!(demangle(b""), "");
    }

    #[test]
    fn try_demangle_surfaces_the_error_kind() {
        let err = try_demangle(b"").unwrap_err();
        assert_eq!(err.kind_tag(), "UnexpectedEnd");
    }

    #[test]
    fn boundary_length_prefix_past_end() {
        let err = try_demangle(b"99ivTSolver").unwrap_err();
        assert_eq!(err.kind_tag(), "UnexpectedEnd");
    }

    #[test]
    fn boundary_q_count_zero() {
        let err = try_demangle(b"Q0").unwrap_err();
        assert_eq!(err.kind_tag(), "MalformedName");
    }

    #[test]
    fn boundary_backref_before_any_param() {
        let err = try_demangle(b"f__FT1").unwrap_err();
        assert_eq!(err.kind_tag(), "BackRefOutOfRange");
    }
}
