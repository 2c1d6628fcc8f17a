//! Pretty-printer (C7): renders a [`CxxSymbol`] as a C++-style
//! declaration string.
//!
//! Declarator composition follows the usual "inside-out"/clockwise-spiral
//! reading: a pointer/reference/array/function wraps its inner type's
//! rendering with a suffix or prefix token, rather than walking the tree
//! twice to build a declarator around a named variable. This crate only
//! ever renders *unnamed* positions (parameter types, return types, the
//! result of `operator T` and `typeinfo` names) so the simpler suffix
//! style is sufficient — there is no variable name to wrap declarators
//! around.

use crate::ast::{Builtin, CvQualifiers, CxxSymbol, Name, NameSegment, SpecialFlags, SymbolKind, TemplateArg, TemplateLiteral, Type};

/// Rendering knobs exposed to callers (the CLI's `--no-rvalue-marker`).
#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
    /// Whether a `T`/`N`-code back-referenced parameter renders with the
    /// trailing `&&` quirk marker (§4.3 item 7). Default `true`, matching
    /// the historical tool's output.
    pub rvalue_marker: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self { rvalue_marker: true }
    }
}

/// Renders a standalone type, with no enclosing declaration context. Used
/// both as the crate's `Type -> String` surface and internally for
/// conversion-operator and typeinfo name synthesis.
pub fn render_type(ty: &Type) -> String {
    render_type_opts(ty, &PrintOptions::default())
}

fn render_type_opts(ty: &Type, opts: &PrintOptions) -> String {
    match ty {
        Type::Builtin(b) => b.as_cxx_str().to_string(),
        Type::Named(name) => render_name(name, opts),
        Type::Pointer(inner) => format!("{} *", render_type_opts(inner, opts)),
        Type::Reference(inner) => format!("{} &", render_type_opts(inner, opts)),
        Type::RValueReference(inner) => {
            if opts.rvalue_marker {
                format!("{} &&", render_type_opts(inner, opts))
            } else {
                render_type_opts(inner, opts)
            }
        }
        Type::Array { len, inner } => {
            let suffix = match len {
                Some(n) => format!("[{n}]"),
                None => "[]".to_string(),
            };
            format!("{}{}", render_type_opts(inner, opts), suffix)
        }
        Type::Function { ret, params, .. } => {
            let ret_str = ret
                .as_ref()
                .map(|r| render_type_opts(r, opts))
                .unwrap_or_else(|| "void".to_string());
            format!("{ret_str} (*)({})", render_params(params, opts))
        }
        Type::Qualified { qualifiers, inner } => {
            let mut prefix = String::new();
            // Canonical order: `const volatile`, const first, matching the
            // historical demangler's output (no encoding tiebreak exists).
            if qualifiers.contains(CvQualifiers::SIGNED) {
                prefix.push_str("signed ");
            }
            if qualifiers.contains(CvQualifiers::UNSIGNED) {
                prefix.push_str("unsigned ");
            }
            let base = render_type_opts(inner, opts);
            let base = format!("{prefix}{base}");
            let mut out = String::new();
            if qualifiers.contains(CvQualifiers::CONST) {
                out.push_str("const ");
            }
            if qualifiers.contains(CvQualifiers::VOLATILE) {
                out.push_str("volatile ");
            }
            out.push_str(&base);
            out
        }
    }
}

fn render_name(name: &Name, opts: &PrintOptions) -> String {
    name.segments()
        .iter()
        .map(|s| render_segment(s, opts))
        .collect::<Vec<_>>()
        .join("::")
}

fn render_segment(segment: &NameSegment, opts: &PrintOptions) -> String {
    let ident = String::from_utf8_lossy(&segment.identifier);
    if !segment.is_templated() {
        return ident.into_owned();
    }
    let args = segment
        .template_args
        .iter()
        .map(|a| render_template_arg(a, opts))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{ident}<{args}>")
}

fn render_template_arg(arg: &TemplateArg, opts: &PrintOptions) -> String {
    match arg {
        TemplateArg::Type(ty) => render_type_opts(ty, opts),
        TemplateArg::Value { literal, .. } => render_template_literal(literal),
    }
}

fn render_template_literal(literal: &TemplateLiteral) -> String {
    match literal {
        TemplateLiteral::Integer(n) => n.to_string(),
        TemplateLiteral::Bool(b) => b.to_string(),
        TemplateLiteral::Char(c) => format!("'{}'", *c as char),
        TemplateLiteral::Symbol(bytes) => format!("&{}", String::from_utf8_lossy(bytes)),
    }
}

/// An empty parameter list, or the single historical `void` placeholder
/// parameter, both render as the literal `void` (invariant noted in §4.5).
fn render_params(params: &[Type], opts: &PrintOptions) -> String {
    if params.is_empty() || matches!(params, [Type::Builtin(Builtin::Void)]) {
        return "void".to_string();
    }
    params
        .iter()
        .map(|p| render_type_opts(p, opts))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders a complete symbol as a C++ declaration, per the fixed phrases
/// of §4.6: vtables, thunks, global keys, and typeinfo symbols each prepend
/// their own wording around an ordinary function/data rendering.
pub fn render_symbol(symbol: &CxxSymbol, opts: &PrintOptions) -> String {
    match symbol.kind {
        SymbolKind::Vtable => format!("{} virtual table", render_name(&symbol.name, opts)),
        SymbolKind::VirtualThunk => {
            let delta = symbol.thunk_delta.unwrap_or(0);
            format!("{delta} virtual thunk to {}", render_function_declaration(symbol, opts))
        }
        SymbolKind::GlobalCtorKey => {
            format!("global constructors keyed to {}", render_function_declaration(symbol, opts))
        }
        SymbolKind::GlobalDtorKey => {
            format!("global destructors keyed to {}", render_function_declaration(symbol, opts))
        }
        SymbolKind::TypeinfoFn => format!("{} type info function", render_name(&symbol.name, opts)),
        SymbolKind::TypeinfoNode => format!("{} type info node", render_name(&symbol.name, opts)),
        SymbolKind::GuardVariable => format!("guard variable for {}", render_name(&symbol.name, opts)),
        SymbolKind::Data => {
            let ty = render_type_opts(&symbol.ty, opts);
            format!("{ty} {}", render_name(&symbol.name, opts))
        }
        SymbolKind::Function => render_function_declaration(symbol, opts),
    }
}

/// The `<scope>::<name>(<params>)` core shared by plain functions,
/// constructors, destructors, and the symbols that wrap a function
/// declaration (thunks, global keys).
fn render_function_declaration(symbol: &CxxSymbol, opts: &PrintOptions) -> String {
    let segments = symbol.name.segments();
    let params = symbol.ty.function_params().unwrap_or(&[]);

    if symbol.is_destructor() {
        let path = &segments[..segments.len().saturating_sub(1)];
        let class = path.last().map(|s| render_segment(s, opts)).unwrap_or_default();
        let scope = path.iter().map(|s| render_segment(s, opts)).collect::<Vec<_>>().join("::");
        return format!("{scope}::~{class}()");
    }

    if symbol.is_constructor() {
        let path = &segments[..segments.len().saturating_sub(1)];
        let class = path.last().map(|s| render_segment(s, opts)).unwrap_or_default();
        let scope = path.iter().map(|s| render_segment(s, opts)).collect::<Vec<_>>().join("::");
        return format!("{scope}::{class}({})", render_params(params, opts));
    }

    let qualifier_suffix = match (
        symbol.special_flags.contains(SpecialFlags::IS_CONST_MEMBER_FN),
        symbol.special_flags.contains(SpecialFlags::IS_VOLATILE_MEMBER_FN),
    ) {
        (true, true) => " const volatile",
        (true, false) => " const",
        (false, true) => " volatile",
        (false, false) => "",
    };

    format!(
        "{}({}){}",
        render_name(&symbol.name, opts),
        render_params(params, opts),
        qualifier_suffix
    )
}

impl std::fmt::Display for CxxSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&render_symbol(self, &PrintOptions::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use rstest::rstest;

    #[rstest]
    #[case(b"saveOnQuitOverlay__Fv", "saveOnQuitOverlay(void)")]
    #[case(b"BgFilter__9ivTSolverP12ivInteractor", "ivTSolver::BgFilter(ivInteractor *)")]
    #[case(
        b"AddAlignment__9ivTSolverUiP12ivInteractorP7ivTGlue",
        "ivTSolver::AddAlignment(unsigned int, ivInteractor *, ivTGlue *)"
    )]
    #[case(
        b"_GLOBAL_$I$__Q27CsColor4Data",
        "global constructors keyed to CsColor::Data::Data(void)"
    )]
    #[case(b"__opi__1X", "X::operator int(void)")]
    fn renders_concrete_scenarios(#[case] bytes: &[u8], #[case] expected: &str) {
        let symbol = parse(bytes).unwrap();
        assert_eq!(render_symbol(&symbol, &PrintOptions::default()), expected);
    }

    #[test]
    fn no_rvalue_marker_suppresses_the_quirk() {
        let symbol = parse(b"f__FiT1").unwrap();
        let opts = PrintOptions { rvalue_marker: false };
        assert_eq!(render_symbol(&symbol, &opts), "f(int, int)");
    }

    #[test]
    fn const_member_function_gets_trailing_qualifier() {
        let symbol = parse(b"Get__9ivTSolverCFv").unwrap();
        assert_eq!(render_symbol(&symbol, &PrintOptions::default()), "ivTSolver::Get(void) const");
    }
}
