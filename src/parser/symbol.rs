//! Top-level symbol orchestrator (C5): classifies a whole mangled byte
//! string and assembles the final [`CxxSymbol`].
//!
//! This module owns the one piece of state that does *not* reset between
//! nested parses: each special-prefix form that wraps another mangled
//! symbol (`_GLOBAL_$I$...`, `__thunk_42_...`) recurses into a **fresh**
//! [`ParseState`] for the wrapped symbol, since its back-reference table
//! belongs to a different function's parameter list (invariant 3).

use crate::ast::{CvQualifiers, CxxSymbol, Name, NameSegment, SpecialFlags, SymbolKind, Type};
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::operators;
use crate::parser::names::{parse_qualified_name, parse_single_name, parse_template_arg_list};
use crate::parser::types::{mark_rvalue, parse_type, resolve_backref};
use crate::parser::ParseState;
use crate::printer;

/// Parses one complete mangled symbol. Fails closed: any byte left over
/// after a structurally complete parse is `TrailingGarbage` (§4.5).
pub fn parse_symbol(bytes: &[u8]) -> Result<CxxSymbol> {
    log::debug!("parse_symbol: {} byte(s)", bytes.len());
    let (symbol, consumed) = parse_symbol_prefix(bytes)?;
    if consumed != bytes.len() {
        return Err(Error::TrailingGarbage { position: consumed });
    }
    Ok(symbol)
}

/// Like [`parse_symbol`] but returns how many leading bytes of `bytes` were
/// consumed, for special-prefix forms that wrap an inner mangled symbol
/// immediately followed by nothing else.
fn parse_symbol_prefix(bytes: &[u8]) -> Result<(CxxSymbol, usize)> {
    if let Some(rest) = strip_prefix_any(bytes, &[b"_vt$", b"_vt.", b"__vt_"]) {
        let mut state = ParseState::new();
        let mut cursor = Cursor::new(rest);
        let name = parse_scope_name(&mut cursor, &mut state)?;
        let symbol = CxxSymbol {
            kind: SymbolKind::Vtable,
            ty: Type::Named(name.clone()),
            name,
            special_flags: SpecialFlags::empty(),
            thunk_delta: None,
        };
        return Ok((symbol, bytes.len() - cursor.remaining()));
    }

    if let Some((is_ctor_key, rest)) = strip_global_key_prefix(bytes) {
        let inner = parse_symbol(rest)?;
        let symbol = CxxSymbol {
            kind: if is_ctor_key {
                SymbolKind::GlobalCtorKey
            } else {
                SymbolKind::GlobalDtorKey
            },
            name: inner.name,
            ty: inner.ty,
            special_flags: inner.special_flags,
            thunk_delta: None,
        };
        return Ok((symbol, bytes.len()));
    }

    if let Some(rest) = strip_prefix_any(bytes, &[b"_$_", b"__$_"]) {
        let mut state = ParseState::new();
        let mut cursor = Cursor::new(rest);
        let class = parse_scope_name(&mut cursor, &mut state)?;
        let name = append_empty_segment(class);
        let symbol = CxxSymbol {
            kind: SymbolKind::Function,
            name,
            ty: Type::Function {
                ret: None,
                params: Vec::new(),
                is_variadic: false,
            },
            special_flags: SpecialFlags::IS_DESTRUCTOR,
            thunk_delta: None,
        };
        return Ok((symbol, bytes.len() - cursor.remaining()));
    }

    if let Some(rest) = bytes.strip_prefix(b"__thunk_") {
        let (delta, after_delta) = take_signed_decimal(rest, b'n')?;
        let after_underscore = after_delta
            .strip_prefix(b"_")
            .ok_or(Error::MalformedName {
                position: bytes.len() - after_delta.len(),
                reason: "thunk delta missing trailing '_'",
            })?;
        let inner = parse_symbol(after_underscore)?;
        let symbol = CxxSymbol {
            kind: SymbolKind::VirtualThunk,
            name: inner.name,
            ty: inner.ty,
            special_flags: inner.special_flags | SpecialFlags::IS_VIRTUAL_THUNK,
            thunk_delta: Some(delta),
        };
        return Ok((symbol, bytes.len()));
    }

    if let Some(rest) = strip_prefix_any(bytes, &[b"__tf", b"__ti"]) {
        let is_function = bytes[2] == b't' && bytes[3] == b'f';
        let mut state = ParseState::new();
        let mut cursor = Cursor::new(rest);
        let ty = parse_type(&mut cursor, &mut state)?;
        let name = name_for_type(&ty);
        let symbol = CxxSymbol {
            kind: if is_function {
                SymbolKind::TypeinfoFn
            } else {
                SymbolKind::TypeinfoNode
            },
            name,
            ty,
            special_flags: SpecialFlags::empty(),
            thunk_delta: None,
        };
        return Ok((symbol, bytes.len() - cursor.remaining()));
    }

    let symbol = parse_function_or_data(bytes)?;
    Ok((symbol, bytes.len()))
}

fn strip_prefix_any<'a>(bytes: &'a [u8], prefixes: &[&[u8]]) -> Option<&'a [u8]> {
    prefixes.iter().find_map(|p| bytes.strip_prefix(*p))
}

fn strip_global_key_prefix(bytes: &[u8]) -> Option<(bool, &[u8])> {
    for (marker, is_ctor) in [(b"$I$" as &[u8], true), (b"$D$", false), (b".I.", true), (b".D.", false)] {
        let mut needle = b"_GLOBAL_".to_vec();
        needle.extend_from_slice(marker);
        if let Some(rest) = bytes.strip_prefix(needle.as_slice()) {
            return Some((is_ctor, rest));
        }
    }
    None
}

/// Parses `n<digits>` or `<digits>` as a signed decimal using `neg_marker`
/// as the sign prefix (`n` for thunk deltas per §4.5; template value
/// literals use `m` instead, see `parser::names`).
fn take_signed_decimal(bytes: &[u8], neg_marker: u8) -> Result<(i64, &[u8])> {
    let (negative, rest) = match bytes.first() {
        Some(&b) if b == neg_marker => (true, &bytes[1..]),
        _ => (false, bytes),
    };
    let digit_count = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digit_count == 0 {
        return Err(Error::ExpectedDigits { position: 0 });
    }
    let text = std::str::from_utf8(&rest[..digit_count]).unwrap();
    let value: i64 = text.parse().map_err(|_| Error::ExpectedDigits { position: 0 })?;
    Ok((if negative { -value } else { value }, &rest[digit_count..]))
}

/// A scope/class name for contexts (vtables, destructors) that accept
/// either a `Q`-group or a single plain/templated segment.
fn parse_scope_name(cursor: &mut Cursor, state: &mut ParseState) -> Result<Name> {
    if cursor.peek() == Some(b'Q') {
        parse_qualified_name(cursor, state)
    } else {
        Ok(Name::new(vec![parse_single_name(cursor, state)?]))
    }
}

fn append_empty_segment(mut name: Name) -> Name {
    let mut segments = name.segments().to_vec();
    segments.push(NameSegment::plain(Vec::new()));
    name = Name::new(segments);
    name
}

/// Best-effort `Name` for a typeinfo payload that isn't itself a class
/// type (e.g. `typeid(int)`); falls back to the type's rendered spelling
/// as a single identifier.
fn name_for_type(ty: &Type) -> Name {
    match ty {
        Type::Named(n) => n.clone(),
        other => Name::new(vec![NameSegment::plain(
            printer::render_type(other).into_bytes(),
        )]),
    }
}

/// Step 2 onward: find the `__` split point, or fall back to a data
/// symbol if none exists.
fn parse_function_or_data(bytes: &[u8]) -> Result<CxxSymbol> {
    match find_split(bytes) {
        Some(split) => parse_function_symbol(&bytes[..split], &bytes[split + 2..]),
        None => parse_data_symbol(bytes),
    }
}

/// Leftmost `__` followed by a valid name-start byte (digit, `Q`, `K`,
/// `t`, or `F`).
fn find_split(bytes: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'_' && bytes[i + 1] == b'_' {
            if let Some(&c) = bytes.get(i + 2) {
                if c.is_ascii_digit() || matches!(c, b'Q' | b'K' | b't' | b'F') {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

fn parse_data_symbol(bytes: &[u8]) -> Result<CxxSymbol> {
    let mut state = ParseState::new();
    let mut cursor = Cursor::new(bytes);
    let name = parse_scope_name(&mut cursor, &mut state)?;
    let ty = parse_type(&mut cursor, &mut state)?;
    if !cursor.is_empty() {
        return Err(Error::TrailingGarbage {
            position: cursor.position(),
        });
    }
    Ok(CxxSymbol {
        kind: SymbolKind::Data,
        name,
        ty,
        special_flags: SpecialFlags::empty(),
        thunk_delta: None,
    })
}

fn parse_function_symbol(base: &[u8], rest: &[u8]) -> Result<CxxSymbol> {
    let (own_segment, mut special_flags) = base_identifier_segment(base)?;

    let mut state = ParseState::new();
    let mut cursor = Cursor::new(rest);
    let scope = if cursor.peek() == Some(b'Q') {
        Some(parse_qualified_name(&mut cursor, &mut state)?)
    } else if matches!(cursor.peek(), Some(b'0'..=b'9') | Some(b't')) {
        Some(Name::new(vec![parse_single_name(&mut cursor, &mut state)?]))
    } else {
        None
    };

    loop {
        match cursor.peek() {
            Some(b'C') => {
                cursor.take()?;
                special_flags |= SpecialFlags::IS_CONST_MEMBER_FN;
            }
            Some(b'V') => {
                cursor.take()?;
                special_flags |= SpecialFlags::IS_VOLATILE_MEMBER_FN;
            }
            _ => break,
        }
    }

    let mut own_segment = own_segment;
    let is_template_fn = cursor.peek() == Some(b'H');
    if is_template_fn {
        cursor.take()?;
        own_segment.template_args = parse_template_arg_list(&mut cursor, &mut state)?;
    }

    let (ret, params) = parse_signature_tail(&mut cursor, &mut state, is_template_fn)?;

    let mut segments = scope.map(|n| n.segments().to_vec()).unwrap_or_default();
    segments.push(own_segment);
    let name = Name::new(segments);

    let ty = Type::Function {
        ret: ret.map(Box::new),
        params,
        is_variadic: false,
    };

    Ok(CxxSymbol {
        kind: SymbolKind::Function,
        name,
        ty,
        special_flags,
        thunk_delta: None,
    })
}

/// Builds the function's own (innermost) `NameSegment` and any
/// `special_flags` implied purely by the base identifier: empty ⇒
/// constructor (invariant 4; destructors never reach here, they're always
/// recognized via their own Step-1 prefix), `op<type>` ⇒ conversion
/// operator, a known two-letter code ⇒ overloaded operator, otherwise a
/// plain identifier.
fn base_identifier_segment(base: &[u8]) -> Result<(NameSegment, SpecialFlags)> {
    if base.is_empty() {
        return Ok((NameSegment::plain(Vec::new()), SpecialFlags::IS_CONSTRUCTOR));
    }

    let stripped = base.strip_prefix(b"__").unwrap_or(base);

    if let Some(type_bytes) = stripped.strip_prefix(b"op") {
        if !type_bytes.is_empty() {
            let mut state = ParseState::new();
            let mut cursor = Cursor::new(type_bytes);
            let ty = parse_type(&mut cursor, &mut state)?;
            if cursor.is_empty() {
                let rendered = format!("operator {}", printer::render_type(&ty));
                return Ok((NameSegment::plain(rendered.into_bytes()), SpecialFlags::empty()));
            }
        }
    }

    if let Ok(code) = std::str::from_utf8(stripped) {
        if let Some(op) = operators::lookup(code) {
            let rendered = format!("operator{}", op.symbol);
            return Ok((NameSegment::plain(rendered.into_bytes()), SpecialFlags::empty()));
        }
    }

    Ok((NameSegment::plain(base.to_vec()), SpecialFlags::empty()))
}

/// A leading `F` is consumed as a no-op marker byte for an ordinary
/// (non-template) function — its parameter list simply runs to the end of
/// the cursor with no declared return type, matching the historical
/// convention that non-template signatures never spell out a return type
/// (§4.5 step 4, "the return type is left unspecified"). Only a template
/// function (`is_template_fn`, detected via a preceding `H`) uses the
/// explicit `<params>_<return>` form, since "an explicit return type MUST
/// follow" is stated specifically for that case.
///
/// Either way every top-level parameter is appended to `state.btypes` and,
/// at the end, any slot that was ever the target of a `T`/`N`-code is
/// retroactively decorated with the `&&` marker too (see
/// `parser::types::mark_rvalue`) — the documented rendering quirk applies
/// to the defining occurrence as well as the back-reference.
fn parse_signature_tail(
    cursor: &mut Cursor,
    state: &mut ParseState,
    is_template_fn: bool,
) -> Result<(Option<Type>, Vec<Type>)> {
    cursor.eat(b'F');
    let (ret, params) = if is_template_fn {
        let params = parse_params_until(cursor, state, true)?;
        let ret = parse_type(cursor, state)?;
        (Some(ret), params)
    } else {
        let params = parse_params_until(cursor, state, false)?;
        (None, params)
    };
    decorate_referenced(state);
    Ok((ret, params))
}

/// Shared parameter-list loop for a function signature's own top-level
/// parameters (always appended to `btypes`, unlike a nested `F`-type's
/// parameters — see `parser::types::parse_nested_function`).
fn parse_params_until(
    cursor: &mut Cursor,
    state: &mut ParseState,
    stop_at_underscore: bool,
) -> Result<Vec<Type>> {
    loop {
        if stop_at_underscore {
            if cursor.peek() == Some(b'_') {
                cursor.take()?;
                break;
            }
            if cursor.is_empty() {
                return Err(Error::UnexpectedEnd {
                    position: cursor.position(),
                });
            }
        } else if cursor.is_empty() {
            break;
        }

        if cursor.peek() == Some(b'N') {
            let position = cursor.position();
            cursor.take()?; // 'N'
            let count_byte = cursor.take()?;
            if !count_byte.is_ascii_digit() {
                return Err(Error::ExpectedDigits { position });
            }
            let count = (count_byte - b'0') as usize;
            let index = cursor.take_digits()?;
            for _ in 0..count {
                let ty = resolve_backref(state, position, index)?;
                state.btypes.push(ty);
                state.referenced.push(false);
            }
        } else {
            let ty = parse_type(cursor, state)?;
            state.btypes.push(ty);
            state.referenced.push(false);
        }
    }
    Ok(state.btypes.clone())
}

fn decorate_referenced(state: &mut ParseState) {
    for i in 0..state.btypes.len() {
        if state.referenced[i] {
            state.btypes[i] = mark_rvalue(state.btypes[i].clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Builtin;
    use rstest::rstest;

    #[rstest]
    #[case(b"saveOnQuitOverlay__Fv", "saveOnQuitOverlay")]
    fn free_function_base_identifier(#[case] bytes: &[u8], #[case] expected_base: &str) {
        let symbol = parse_symbol(bytes).unwrap();
        assert_eq!(symbol.name.base(), expected_base.as_bytes());
        assert_eq!(symbol.name.segments().len(), 1);
    }

    #[test]
    fn member_function_with_scope_and_pointer_param() {
        let symbol = parse_symbol(b"BgFilter__9ivTSolverP12ivInteractor").unwrap();
        assert_eq!(symbol.name.base(), b"BgFilter");
        assert_eq!(symbol.name.enclosing().unwrap().identifier, b"ivTSolver");
        let params = symbol.ty.function_params().unwrap();
        assert_eq!(params.len(), 1);
        assert!(matches!(params[0], Type::Pointer(_)));
    }

    #[test]
    fn empty_base_is_constructor_with_nested_scope() {
        let symbol = parse_symbol(b"__Q27CsColor4Data").unwrap();
        assert!(symbol.is_constructor());
        assert_eq!(symbol.name.base(), b"");
        assert_eq!(symbol.name.enclosing().unwrap().identifier, b"Data");
        assert_eq!(symbol.ty.function_params().unwrap().len(), 0);
    }

    #[test]
    fn global_ctor_key_wraps_inner_constructor() {
        let symbol = parse_symbol(b"_GLOBAL_$I$__Q27CsColor4Data").unwrap();
        assert_eq!(symbol.kind, SymbolKind::GlobalCtorKey);
        assert!(symbol.is_constructor());
    }

    #[test]
    fn unsplittable_input_echoes_as_garbage_error() {
        let err = parse_symbol(b"aa__aa").unwrap_err();
        assert!(matches!(err, Error::MalformedName { .. } | Error::UnknownTypeCode { .. } | Error::TrailingGarbage { .. } | Error::ExpectedDigits { .. } | Error::UnexpectedEnd { .. }));
    }

    #[test]
    fn backref_decorates_both_occurrences() {
        let symbol = parse_symbol(b"f__FiT1").unwrap();
        let params = symbol.ty.function_params().unwrap();
        assert!(matches!(params[0], Type::RValueReference(_)));
        assert!(matches!(params[1], Type::RValueReference(_)));
        assert_eq!(params.len(), 2);
        if let Type::RValueReference(inner) = &params[0] {
            assert_eq!(**inner, Type::Builtin(Builtin::Int));
        }
    }

    #[test]
    fn backref_out_of_range_before_any_param() {
        let err = parse_symbol(b"f__FT1").unwrap_err();
        assert!(matches!(err, Error::BackRefOutOfRange { index: 1, .. }));
    }
}
