//! AST node types produced by the parser (C6).
//!
//! Everything here is immutable, owned value data: a [`CxxSymbol`] owns its
//! [`Name`] and [`Type`] tree outright, there are no back-references or
//! indices left in the returned tree (invariant 2 in the spec) — by the time
//! [`crate::parse`] returns, the scratch back-reference table used during
//! parsing has already been resolved into concrete [`Type`] clones and
//! discarded.

use bitflags::bitflags;

/// A single type, after GNU v2 decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Builtin(Builtin),
    Named(Name),
    Pointer(Box<Type>),
    Reference(Box<Type>),
    /// Only produced for a `T`/`N`-code back-reference occurrence; see
    /// §4.3 item 7. This is a rendering hint, not a real C++ rvalue
    /// reference — GNU v2 predates rvalue references entirely.
    RValueReference(Box<Type>),
    Array {
        /// `None` means the historical `A_` "unknown length" form.
        len: Option<usize>,
        inner: Box<Type>,
    },
    Function {
        ret: Option<Box<Type>>,
        params: Vec<Type>,
        is_variadic: bool,
    },
    Qualified {
        qualifiers: CvQualifiers,
        inner: Box<Type>,
    },
}

impl Type {
    /// Wraps `self` in `qualifiers`, flattening nested `Qualified` nodes
    /// into one (invariant 5: CV-qualifiers never nest).
    pub fn qualified(self, qualifiers: CvQualifiers) -> Type {
        if qualifiers.is_empty() {
            return self;
        }
        match self {
            Type::Qualified {
                qualifiers: existing,
                inner,
            } => Type::Qualified {
                qualifiers: existing | qualifiers,
                inner,
            },
            other => Type::Qualified {
                qualifiers,
                inner: Box::new(other),
            },
        }
    }

    /// The parameter types of a `Function` type, or `None` for anything
    /// else (including data types).
    pub fn function_params(&self) -> Option<&[Type]> {
        match self {
            Type::Function { params, .. } => Some(params),
            _ => None,
        }
    }

    /// The declared return type of a `Function` type, if one was encoded.
    pub fn function_return(&self) -> Option<&Type> {
        match self {
            Type::Function { ret, .. } => ret.as_deref(),
            _ => None,
        }
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self, Type::Function { is_variadic: true, .. })
    }
}

/// The fixed set of built-in scalar types this dialect can encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    WChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
    LongDouble,
    /// The `...` varargs sentinel; never appears as a standalone parameter
    /// type (ellipsis parsing itself is a recognized gap, §1), but is used
    /// internally to mark a `Function`'s `is_variadic` flag's source code.
    Ellipsis,
}

impl Builtin {
    pub fn as_cxx_str(self) -> &'static str {
        match self {
            Builtin::Void => "void",
            Builtin::Bool => "bool",
            Builtin::Char => "char",
            Builtin::SignedChar => "signed char",
            Builtin::UnsignedChar => "unsigned char",
            Builtin::WChar => "wchar_t",
            Builtin::Short => "short",
            Builtin::UnsignedShort => "unsigned short",
            Builtin::Int => "int",
            Builtin::UnsignedInt => "unsigned int",
            Builtin::Long => "long",
            Builtin::UnsignedLong => "unsigned long",
            Builtin::LongLong => "long long",
            Builtin::UnsignedLongLong => "unsigned long long",
            Builtin::Float => "float",
            Builtin::Double => "double",
            Builtin::LongDouble => "long double",
            Builtin::Ellipsis => "...",
        }
    }
}

bitflags! {
    /// CV-qualifiers (and the `U`-code's signed/unsigned toggle) folded
    /// onto a `Type::Qualified` node. Never nested (invariant 5).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CvQualifiers: u8 {
        const CONST    = 1 << 0;
        const VOLATILE = 1 << 1;
        const UNSIGNED = 1 << 2;
        const SIGNED   = 1 << 3;
    }
}

/// A non-empty, ordered qualification chain (invariant 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    segments: Vec<NameSegment>,
}

impl Name {
    /// Builds a `Name` from a non-empty vector of segments.
    ///
    /// Panics if `segments` is empty: every caller in this crate goes
    /// through [`crate::parser::names::parse_qualified_name`], which never
    /// produces an empty chain (an empty `Q`-count is rejected as
    /// `MalformedName` before this constructor is reached).
    pub fn new(segments: Vec<NameSegment>) -> Self {
        assert!(!segments.is_empty(), "Name must have at least one segment");
        Self { segments }
    }

    pub fn segments(&self) -> &[NameSegment] {
        &self.segments
    }

    /// The last segment's identifier, stripped of any template arguments.
    pub fn base(&self) -> &[u8] {
        &self.segments.last().expect("Name is non-empty").identifier
    }

    /// The segment enclosing the last one, if any (the immediate scope a
    /// constructor/destructor's class is reconstructed from).
    pub fn enclosing(&self) -> Option<&NameSegment> {
        let len = self.segments.len();
        (len >= 2).then(|| &self.segments[len - 2])
    }
}

/// One link in a qualification chain: a plain identifier, optionally
/// carrying template arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSegment {
    pub identifier: Vec<u8>,
    pub template_args: Vec<TemplateArg>,
}

impl NameSegment {
    pub fn plain(identifier: Vec<u8>) -> Self {
        Self {
            identifier,
            template_args: Vec::new(),
        }
    }

    pub fn is_templated(&self) -> bool {
        !self.template_args.is_empty()
    }
}

/// A single argument to a templated name (`t<name><N><args>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateArg {
    Type(Type),
    Value { ty: Type, literal: TemplateLiteral },
}

/// The literal payload of a value template argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateLiteral {
    Integer(i64),
    Bool(bool),
    Char(u8),
    /// A symbol reference, used for pointer/function template arguments
    /// (`&some_symbol`-shaped arguments in the source C++).
    Symbol(Vec<u8>),
}

bitflags! {
    /// §3's `special_flags` bitset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SpecialFlags: u8 {
        const IS_CONSTRUCTOR        = 1 << 0;
        const IS_DESTRUCTOR         = 1 << 1;
        const IS_VIRTUAL_THUNK      = 1 << 2;
        const IS_STATIC_MEMBER_FN   = 1 << 3;
        const IS_CONST_MEMBER_FN    = 1 << 4;
        const IS_VOLATILE_MEMBER_FN = 1 << 5;
    }
}

/// What kind of linker symbol a [`CxxSymbol`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Data,
    Vtable,
    VirtualThunk,
    GlobalCtorKey,
    GlobalDtorKey,
    TypeinfoNode,
    TypeinfoFn,
    GuardVariable,
}

/// The root output of a parse: everything needed to render a C++
/// declaration for one mangled symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CxxSymbol {
    pub kind: SymbolKind,
    pub name: Name,
    pub ty: Type,
    pub special_flags: SpecialFlags,
    /// Signed `this`-adjustment, present only for `SymbolKind::VirtualThunk`.
    pub thunk_delta: Option<i64>,
}

impl CxxSymbol {
    pub fn is_constructor(&self) -> bool {
        self.special_flags.contains(SpecialFlags::IS_CONSTRUCTOR)
    }

    pub fn is_destructor(&self) -> bool {
        self.special_flags.contains(SpecialFlags::IS_DESTRUCTOR)
    }
}
