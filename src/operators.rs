//! Static table of GNU v2 operator codes (C2).
//!
//! Two-letter mangling codes map to a printable C++ operator spelling and
//! an arity. Ambiguities that the encoding itself doesn't resolve (prefix
//! vs postfix `++`/`--`) are not distinguished here: both print as
//! `operator++`/`operator--`, matching the historical demangler's output.

/// Arity of an operator, for callers that want to format argument lists
/// around it (the printer does not currently need this, but it documents
/// the table per §4.2 and is exercised by tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Unary,
    Binary,
    /// `()`, `new`, `new[]` etc., which take an arbitrary argument list.
    Variadic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorInfo {
    pub code: &'static str,
    pub symbol: &'static str,
    pub arity: Arity,
}

macro_rules! op_table {
    ($($code:literal => ($symbol:literal, $arity:ident)),+ $(,)?) => {
        const OPERATORS: &[OperatorInfo] = &[
            $(OperatorInfo { code: $code, symbol: $symbol, arity: Arity::$arity }),+
        ];
    };
}

op_table! {
    "pl" => ("+", Binary),
    "mi" => ("-", Binary),
    "ml" => ("*", Binary),
    "dv" => ("/", Binary),
    "md" => ("%", Binary),
    "vc" => ("[]", Binary),
    "cl" => ("()", Variadic),
    "aS" => ("=", Binary),
    "apl" => ("+=", Binary),
    "ami" => ("-=", Binary),
    "amu" => ("*=", Binary),
    "adv" => ("/=", Binary),
    "amd" => ("%=", Binary),
    "aad" => ("&=", Binary),
    "aor" => ("|=", Binary),
    "aer" => ("^=", Binary),
    "als" => ("<<=", Binary),
    "ars" => (">>=", Binary),
    "eq" => ("==", Binary),
    "ne" => ("!=", Binary),
    "lt" => ("<", Binary),
    "gt" => (">", Binary),
    "le" => ("<=", Binary),
    "ge" => (">=", Binary),
    "aa" => ("&&", Binary),
    "oo" => ("||", Binary),
    "nt" => ("!", Unary),
    "co" => ("~", Unary),
    "an" => ("&", Binary),
    "or" => ("|", Binary),
    "er" => ("^", Binary),
    "ls" => ("<<", Binary),
    "rs" => (">>", Binary),
    "pp" => ("++", Unary),
    "mm" => ("--", Unary),
    "rf" => ("->", Unary),
    "rm" => ("->*", Binary),
    "cm" => (",", Binary),
    "nw" => ("new", Variadic),
    "dl" => ("delete", Variadic),
    "vn" => ("new[]", Variadic),
    "vd" => ("delete[]", Variadic),
}

/// Looks up a mangled operator code (without its `op`/`__` framing) and
/// returns its printable C++ spelling and arity.
pub fn lookup(code: &str) -> Option<OperatorInfo> {
    OPERATORS.iter().copied().find(|op| op.code == code)
}

/// Renders an operator code as its canonical `operator<sym>` spelling.
pub fn operator_name(code: &str) -> Option<String> {
    lookup(code).map(|op| format!("operator{}", op.symbol))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_arithmetic() {
        assert_eq!(operator_name("pl").as_deref(), Some("operator+"));
        assert_eq!(operator_name("aS").as_deref(), Some("operator="));
    }

    #[test]
    fn unknown_code_is_none() {
        assert_eq!(lookup("zz"), None);
    }

    #[test]
    fn arity_is_recorded() {
        assert_eq!(lookup("nt").unwrap().arity, Arity::Unary);
        assert_eq!(lookup("eq").unwrap().arity, Arity::Binary);
        assert_eq!(lookup("cl").unwrap().arity, Arity::Variadic);
    }
}
