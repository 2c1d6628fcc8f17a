//! Qualified-name grammar (C4): `Q`-groups, plain length-prefixed
//! identifiers, and the `t`-prefixed templated-identifier form.

use crate::ast::{Builtin, Name, NameSegment, TemplateArg, TemplateLiteral, Type};
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::parser::types::parse_type;
use crate::parser::ParseState;

/// `Q<n><n segments>`, or the extended `Q_<digits>_<n segments>` form for
/// counts too large for a single digit.
pub fn parse_qualified_name(cursor: &mut Cursor, state: &mut ParseState) -> Result<Name> {
    let start = cursor.position();
    log::debug!("parse_qualified_name at byte {start}");
    cursor.take()?; // 'Q'
    let count = parse_q_count(cursor)?;
    if count == 0 {
        return Err(Error::MalformedName {
            position: start,
            reason: "Q count of 0",
        });
    }
    let mut segments = Vec::with_capacity(count);
    for _ in 0..count {
        segments.push(parse_single_name(cursor, state)?);
    }
    Ok(Name::new(segments))
}

fn parse_q_count(cursor: &mut Cursor) -> Result<usize> {
    if cursor.peek() == Some(b'_') {
        cursor.take()?; // '_'
        let n = cursor.take_digits()?;
        let position = cursor.position();
        if !cursor.eat(b'_') {
            return Err(Error::MalformedName {
                position,
                reason: "extended Q-count missing trailing '_'",
            });
        }
        Ok(n)
    } else {
        let position = cursor.position();
        let d = cursor.take()?;
        if !d.is_ascii_digit() {
            return Err(Error::MalformedName {
                position,
                reason: "Q count must be a digit",
            });
        }
        Ok((d - b'0') as usize)
    }
}

/// One name segment: a plain length-prefixed identifier or a `t`-prefixed
/// templated identifier. Used both inside `Q`-groups and for an unqualified
/// single-segment name (a type or function's base identifier).
pub fn parse_single_name(cursor: &mut Cursor, state: &mut ParseState) -> Result<NameSegment> {
    match cursor.peek() {
        Some(b't') => parse_templated_identifier(cursor, state),
        Some(b'0'..=b'9') => {
            let identifier = cursor.take_length_prefixed_identifier()?.to_vec();
            Ok(NameSegment::plain(identifier))
        }
        Some(b'K') => Err(Error::UnsupportedFeature {
            position: cursor.position(),
            tag: "squangled name back-reference (K-code)",
        }),
        _ => Err(Error::MalformedName {
            position: cursor.position(),
            reason: "expected a name segment",
        }),
    }
}

fn parse_templated_identifier(cursor: &mut Cursor, state: &mut ParseState) -> Result<NameSegment> {
    cursor.take()?; // 't'
    let base = cursor.take_length_prefixed_identifier()?.to_vec();
    let args = parse_template_arg_list(cursor, state)?;
    Ok(NameSegment {
        identifier: base,
        template_args: args,
    })
}

/// A single decimal digit argument-count followed by that many template
/// arguments. Shared by `t`-prefixed templated identifiers and the
/// `H`-prefixed explicit template-argument form on template functions
/// (§4.5 step 4).
pub fn parse_template_arg_list(cursor: &mut Cursor, state: &mut ParseState) -> Result<Vec<TemplateArg>> {
    let position = cursor.position();
    let count_byte = cursor.take()?;
    if !count_byte.is_ascii_digit() {
        return Err(Error::MalformedName {
            position,
            reason: "template argument count must be a digit",
        });
    }
    let arg_count = (count_byte - b'0') as usize;
    let mut args = Vec::with_capacity(arg_count);
    for _ in 0..arg_count {
        args.push(parse_template_arg(cursor, state)?);
    }
    Ok(args)
}

fn parse_template_arg(cursor: &mut Cursor, state: &mut ParseState) -> Result<TemplateArg> {
    match cursor.peek() {
        Some(b'Z') => {
            cursor.take()?; // 'Z'
            Ok(TemplateArg::Type(parse_type(cursor, state)?))
        }
        Some(b'X') => Err(Error::UnsupportedFeature {
            position: cursor.position(),
            tag: "template template-parameter (X-code)",
        }),
        _ => {
            let ty = parse_type(cursor, state)?;
            let position = cursor.position();
            if !cursor.eat(b'L') {
                return Err(Error::MalformedName {
                    position,
                    reason: "expected 'L' before a template value literal",
                });
            }
            let raw = cursor.take_length_prefixed_identifier()?;
            let literal = parse_template_literal(raw, &ty, position)?;
            Ok(TemplateArg::Value { ty, literal })
        }
    }
}

fn parse_template_literal(raw: &[u8], ty: &Type, position: usize) -> Result<TemplateLiteral> {
    match scalar_builtin(ty) {
        Some(Builtin::Bool) => match raw {
            b"0" => Ok(TemplateLiteral::Bool(false)),
            b"1" => Ok(TemplateLiteral::Bool(true)),
            _ => Err(Error::MalformedName {
                position,
                reason: "boolean template literal must be '0' or '1'",
            }),
        },
        Some(Builtin::Char | Builtin::SignedChar | Builtin::UnsignedChar) => {
            let text = std::str::from_utf8(raw).map_err(|_| Error::MalformedName {
                position,
                reason: "character template literal is not ASCII decimal",
            })?;
            let code: u32 = text.parse().map_err(|_| Error::MalformedName {
                position,
                reason: "character template literal is not a decimal code",
            })?;
            let byte = u8::try_from(code).map_err(|_| Error::MalformedName {
                position,
                reason: "character template literal out of byte range",
            })?;
            Ok(TemplateLiteral::Char(byte))
        }
        Some(_) => parse_integer_literal(raw, position).map(TemplateLiteral::Integer),
        None => Ok(TemplateLiteral::Symbol(raw.to_vec())),
    }
}

/// Unwraps any CV-qualifier wrapper to find the underlying builtin, for
/// choosing how to interpret a template value literal's bytes.
fn scalar_builtin(ty: &Type) -> Option<Builtin> {
    match ty {
        Type::Builtin(b) => Some(*b),
        Type::Qualified { inner, .. } => scalar_builtin(inner),
        _ => None,
    }
}

fn parse_integer_literal(raw: &[u8], position: usize) -> Result<i64> {
    let (negative, digits) = match raw.first() {
        Some(b'm') => (true, &raw[1..]),
        _ => (false, raw),
    };
    let text = std::str::from_utf8(digits).map_err(|_| Error::MalformedName {
        position,
        reason: "integer template literal is not ASCII decimal",
    })?;
    let value: i64 = text.parse().map_err(|_| Error::MalformedName {
        position,
        reason: "integer template literal is not a decimal integer",
    })?;
    Ok(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_name(bytes: &[u8]) -> Name {
        let mut cursor = Cursor::new(bytes);
        let mut state = ParseState::new();
        parse_qualified_name(&mut cursor, &mut state).unwrap()
    }

    #[test]
    fn qualified_name_with_two_segments() {
        let name = parse_name(b"Q27CsColor4Data");
        assert_eq!(name.segments().len(), 2);
        assert_eq!(name.segments()[0].identifier, b"CsColor");
        assert_eq!(name.segments()[1].identifier, b"Data");
        assert_eq!(name.base(), b"Data");
    }

    #[test]
    fn zero_count_is_malformed() {
        let mut cursor = Cursor::new(b"Q0");
        let mut state = ParseState::new();
        let err = parse_qualified_name(&mut cursor, &mut state).unwrap_err();
        assert!(matches!(err, Error::MalformedName { .. }));
    }

    #[test]
    fn templated_identifier_with_type_argument() {
        let mut cursor = Cursor::new(b"t6Vector1Zi");
        let mut state = ParseState::new();
        let segment = parse_single_name(&mut cursor, &mut state).unwrap();
        assert_eq!(segment.identifier, b"Vector");
        assert_eq!(segment.template_args.len(), 1);
        assert!(matches!(
            segment.template_args[0],
            TemplateArg::Type(Type::Builtin(Builtin::Int))
        ));
    }

    #[test]
    fn templated_identifier_with_integer_value_argument() {
        let mut cursor = Cursor::new(b"t6Buffer1iL2m5");
        let mut state = ParseState::new();
        let segment = parse_single_name(&mut cursor, &mut state).unwrap();
        match &segment.template_args[0] {
            TemplateArg::Value { ty, literal } => {
                assert_eq!(*ty, Type::Builtin(Builtin::Int));
                assert_eq!(*literal, TemplateLiteral::Integer(-5));
            }
            other => panic!("expected a value argument, got {other:?}"),
        }
    }
}
