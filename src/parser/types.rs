//! Type grammar (C3): `<type> ::= <cv-qualifiers>? <type-core>`.
//!
//! This is the module that owns the back-reference table's semantics. Every
//! top-level parameter of a function signature — whether the symbol's own
//! signature (parsed from [`crate::parser::symbol`]) or a nested function
//! type used as e.g. a function-pointer parameter — is appended to
//! [`ParseState`]'s `btypes` as it's parsed, and a `T`/`N` code later in the
//! same parse can refer back to any earlier slot by its 1-based index.

use crate::ast::{Builtin, CvQualifiers, Name, Type};
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::parser::names::parse_single_name;
use crate::parser::ParseState;

/// Parses one type, including any leading CV-qualifier run. This is the
/// entry point recursive callers (pointer/reference/array inner types,
/// template arguments, function return types) should use.
pub fn parse_type(cursor: &mut Cursor, state: &mut ParseState) -> Result<Type> {
    log::debug!("parse_type at byte {}", cursor.position());
    state.enter()?;
    let result = parse_type_inner(cursor, state);
    state.exit();
    result
}

fn parse_type_inner(cursor: &mut Cursor, state: &mut ParseState) -> Result<Type> {
    let qualifiers = parse_cv_prefix(cursor)?;
    let base = parse_type_core(cursor, state)?;
    Ok(base.qualified(qualifiers))
}

/// Rule 1: a run of `C`/`V`/`U` prefix bytes, folded into one bitset.
fn parse_cv_prefix(cursor: &mut Cursor) -> Result<CvQualifiers> {
    let mut qualifiers = CvQualifiers::empty();
    loop {
        match cursor.peek() {
            Some(b'C') => {
                cursor.take()?;
                qualifiers |= CvQualifiers::CONST;
            }
            Some(b'V') => {
                cursor.take()?;
                qualifiers |= CvQualifiers::VOLATILE;
            }
            Some(b'U') => {
                cursor.take()?;
                qualifiers |= CvQualifiers::UNSIGNED;
            }
            _ => break,
        }
    }
    Ok(qualifiers)
}

fn parse_type_core(cursor: &mut Cursor, state: &mut ParseState) -> Result<Type> {
    let position = cursor.position();
    let code = cursor.peek().ok_or(Error::UnexpectedEnd { position })?;
    log::trace!("parse_type_core: code {:?} at byte {position}", code as char);
    match code {
        b'P' => {
            cursor.take()?;
            Ok(Type::Pointer(Box::new(parse_type(cursor, state)?)))
        }
        b'R' => {
            cursor.take()?;
            Ok(Type::Reference(Box::new(parse_type(cursor, state)?)))
        }
        b'A' => parse_array(cursor, state),
        b'F' => parse_nested_function(cursor, state),
        b'S' => parse_signed_char(cursor),
        b'T' => parse_backref(cursor, state),
        b'Q' => Ok(Type::Named(crate::parser::names::parse_qualified_name(
            cursor, state,
        )?)),
        b't' | b'0'..=b'9' => {
            let segment = parse_single_name(cursor, state)?;
            Ok(Type::Named(Name::new(vec![segment])))
        }
        b'v' => builtin(cursor, Builtin::Void),
        b'b' => builtin(cursor, Builtin::Bool),
        b'c' => builtin(cursor, Builtin::Char),
        b'w' => builtin(cursor, Builtin::WChar),
        b's' => builtin(cursor, Builtin::Short),
        b'i' => builtin(cursor, Builtin::Int),
        b'l' => builtin(cursor, Builtin::Long),
        b'x' => builtin(cursor, Builtin::LongLong),
        b'f' => builtin(cursor, Builtin::Float),
        b'd' => builtin(cursor, Builtin::Double),
        b'r' => builtin(cursor, Builtin::LongDouble),
        b'e' => Err(Error::UnsupportedFeature {
            position,
            tag: "ellipsis parameter",
        }),
        b'N' => Err(Error::UnsupportedFeature {
            position,
            tag: "repeat code outside a parameter list",
        }),
        other => Err(Error::UnknownTypeCode {
            position,
            code: other,
        }),
    }
}

fn builtin(cursor: &mut Cursor, b: Builtin) -> Result<Type> {
    cursor.take()?;
    Ok(Type::Builtin(b))
}

/// The `Sc` two-letter composite for `signed char`. `S` is not a generic
/// qualifier prefix in this dialect — it only ever appears spelled out as
/// `Sc` (unlike `U`, which composes with any builtin letter via the normal
/// CV-qualifier loop, e.g. `Us` for `unsigned short`).
fn parse_signed_char(cursor: &mut Cursor) -> Result<Type> {
    let position = cursor.position();
    cursor.take()?; // 'S'
    match cursor.take()? {
        b'c' => Ok(Type::Builtin(Builtin::Char).qualified(CvQualifiers::SIGNED)),
        other => Err(Error::UnknownTypeCode {
            position,
            code: other,
        }),
    }
}

fn parse_array(cursor: &mut Cursor, state: &mut ParseState) -> Result<Type> {
    cursor.take()?; // 'A'
    let len = if cursor.peek() == Some(b'_') {
        None
    } else {
        Some(cursor.take_digits()?)
    };
    let position = cursor.position();
    if !cursor.eat(b'_') {
        return Err(Error::MalformedName {
            position,
            reason: "array type missing '_' separator before element type",
        });
    }
    let inner = parse_type(cursor, state)?;
    Ok(Type::Array {
        len,
        inner: Box::new(inner),
    })
}

/// A nested function type, e.g. the pointee of a function-pointer
/// parameter. Per the append-to-btypes policy (§4.3 item 6) its parameters
/// are never themselves pushed onto `btypes` — only a function signature's
/// own top-level parameter list does that (see
/// [`crate::parser::symbol::parse_signature_params`]).
fn parse_nested_function(cursor: &mut Cursor, state: &mut ParseState) -> Result<Type> {
    cursor.take()?; // 'F'
    let mut params = Vec::new();
    while cursor.peek() != Some(b'_') {
        if cursor.is_empty() {
            return Err(Error::UnexpectedEnd {
                position: cursor.position(),
            });
        }
        params.push(parse_type(cursor, state)?);
    }
    cursor.take()?; // '_'
    let ret = parse_type(cursor, state)?;
    Ok(Type::Function {
        ret: Some(Box::new(ret)),
        params,
        is_variadic: false,
    })
}

/// Rule 7: `T<digits>` reads back `btypes[index - 1]` and marks that slot
/// referenced. The occurrence produced here is wrapped in
/// [`Type::RValueReference`] as the in-band marker the printer renders as
/// `&&` (see module docs on [`crate::parser::symbol`] for why the
/// *defining* occurrence gets the same decoration retroactively).
fn parse_backref(cursor: &mut Cursor, state: &mut ParseState) -> Result<Type> {
    let position = cursor.position();
    cursor.take()?; // 'T'
    let index = cursor.take_digits()?;
    resolve_backref(state, position, index)
}

pub(super) fn resolve_backref(state: &mut ParseState, position: usize, index: usize) -> Result<Type> {
    if index == 0 || index > state.btypes.len() {
        return Err(Error::BackRefOutOfRange { position, index });
    }
    state.referenced[index - 1] = true;
    Ok(mark_rvalue(state.btypes[index - 1].clone()))
}

/// Wraps `t` in `RValueReference` unless it already is one.
pub(super) fn mark_rvalue(t: Type) -> Type {
    match t {
        Type::RValueReference(_) => t,
        other => Type::RValueReference(Box::new(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(bytes: &[u8]) -> Type {
        let mut cursor = Cursor::new(bytes);
        let mut state = ParseState::new();
        parse_type(&mut cursor, &mut state).unwrap()
    }

    #[rstest]
    #[case(b"i", Type::Builtin(Builtin::Int))]
    #[case(b"Pi", Type::Pointer(Box::new(Type::Builtin(Builtin::Int))))]
    #[case(b"Ri", Type::Reference(Box::new(Type::Builtin(Builtin::Int))))]
    fn decodes_simple_types(#[case] bytes: &[u8], #[case] expected: Type) {
        assert_eq!(parse(bytes), expected);
    }

    #[test]
    fn unsigned_short_is_qualifier_plus_builtin() {
        assert_eq!(
            parse(b"Us"),
            Type::Builtin(Builtin::Short).qualified(CvQualifiers::UNSIGNED)
        );
    }

    #[test]
    fn signed_char_uses_sc_composite() {
        assert_eq!(
            parse(b"Sc"),
            Type::Builtin(Builtin::Char).qualified(CvQualifiers::SIGNED)
        );
    }

    #[test]
    fn const_volatile_prefix_folds_into_one_node() {
        assert_eq!(
            parse(b"CVi"),
            Type::Builtin(Builtin::Int)
                .qualified(CvQualifiers::CONST | CvQualifiers::VOLATILE)
        );
    }

    #[test]
    fn array_with_known_length() {
        assert_eq!(
            parse(b"A10_i"),
            Type::Array {
                len: Some(10),
                inner: Box::new(Type::Builtin(Builtin::Int)),
            }
        );
    }

    #[test]
    fn array_with_unknown_length() {
        assert_eq!(
            parse(b"A_i"),
            Type::Array {
                len: None,
                inner: Box::new(Type::Builtin(Builtin::Int)),
            }
        );
    }

    #[test]
    fn nested_function_pointer_params_are_not_appended_to_btypes() {
        let mut cursor = Cursor::new(b"PFi_v");
        let mut state = ParseState::new();
        let ty = parse_type(&mut cursor, &mut state).unwrap();
        assert_eq!(
            ty,
            Type::Pointer(Box::new(Type::Function {
                ret: Some(Box::new(Type::Builtin(Builtin::Void))),
                params: vec![Type::Builtin(Builtin::Int)],
                is_variadic: false,
            }))
        );
        assert!(state.btypes.is_empty());
    }

    #[test]
    fn unknown_code_is_reported_with_position() {
        let mut cursor = Cursor::new(b"Oi");
        let mut state = ParseState::new();
        let err = parse_type(&mut cursor, &mut state).unwrap_err();
        assert_eq!(err, Error::UnknownTypeCode { position: 0, code: b'O' });
    }
}
