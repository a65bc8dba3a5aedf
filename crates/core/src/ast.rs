//! Shared AST types for the Bond front-end.
//!
//! These types are produced by the parser and consumed throughout all
//! semantic passes. They live here so that pass modules can import them
//! without depending on the parser.

use serde::Serialize;

// ──────────────────────────────────────────────
// Provenance
// ──────────────────────────────────────────────

/// Source location of a declaration, field, constant, or method.
/// Line and column are 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

// ──────────────────────────────────────────────
// Namespaces
// ──────────────────────────────────────────────

/// Target language tag for a language-qualified namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Language {
    Cpp,
    Cs,
    Java,
}

impl Language {
    /// Parse a language tag keyword. `csharp` is an accepted spelling of `cs`.
    pub fn from_tag(tag: &str) -> Option<Language> {
        match tag {
            "cpp" => Some(Language::Cpp),
            "cs" | "csharp" => Some(Language::Cs),
            "java" => Some(Language::Java),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Language::Cpp => "cpp",
            Language::Cs => "cs",
            Language::Java => "java",
        }
    }
}

/// A dotted namespace, optionally qualified by a target language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Namespace {
    pub lang: Option<Language>,
    pub name: String,
}

impl Namespace {
    /// Namespace matching is language-agnostic when either side is
    /// unqualified; when both carry a tag the tags must agree.
    pub fn matches(&self, other: &Namespace) -> bool {
        self.name == other.name
            && match (self.lang, other.lang) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }
}

// ──────────────────────────────────────────────
// Declaration building blocks
// ──────────────────────────────────────────────

/// An attribute `[Qualified.Name("value")]` applied to a declaration,
/// field, or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// A generic parameter, optionally constrained to value types (`T : value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub name: String,
    pub value_constraint: bool,
}

/// Field modifier. `required_optional` is the safe intermediate for
/// two-step `optional` <-> `required` migrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Optional,
    Required,
    RequiredOptional,
}

impl Modifier {
    pub fn keyword(&self) -> &'static str {
        match self {
            Modifier::Optional => "optional",
            Modifier::Required => "required",
            Modifier::RequiredOptional => "required_optional",
        }
    }
}

/// A field default value.
///
/// Variants compare structurally, never by stringification:
/// `Float(1.0)` and `Integer(1)` are distinct even though they print
/// identically.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Named constant of the field's enum type.
    Enum(String),
    Nothing,
}

// ──────────────────────────────────────────────
// Types
// ──────────────────────────────────────────────

/// Index of a declaration in the compilation's [`DeclArena`].
///
/// `UserDefined` references declarations by arena index, so rebuilding a
/// slot between resolution passes updates every reference at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclId(pub u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The Bond type sum. Closed; matches are expected to be exhaustive.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    Bool,
    String,
    WString,
    Blob,
    List(Box<Type>),
    Vector(Box<Type>),
    Set(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Nullable(Box<Type>),
    Bonded(Box<Type>),
    /// Wraps the declared type of a field whose default is `nothing`.
    Maybe(Box<Type>),
    /// Resolved reference to a declaration plus actual type arguments.
    UserDefined { decl: DeclId, args: Vec<Type> },
    /// Reference to an enclosing generic parameter.
    Parameter(TypeParam),
    /// Integer used as a generic argument.
    IntLiteral(i64),
    /// Compiler-intrinsic field type carrying the struct name.
    MetaName,
    /// Compiler-intrinsic field type carrying the qualified struct name.
    MetaFullName,
    /// Placeholder emitted by the parser; replaced during type resolution.
    Unresolved { name: String, args: Vec<Type> },
}

impl Type {
    /// Map an exact primitive keyword to its type.
    pub fn from_primitive_name(name: &str) -> Option<Type> {
        match name {
            "int8" => Some(Type::Int8),
            "int16" => Some(Type::Int16),
            "int32" => Some(Type::Int32),
            "int64" => Some(Type::Int64),
            "uint8" => Some(Type::UInt8),
            "uint16" => Some(Type::UInt16),
            "uint32" => Some(Type::UInt32),
            "uint64" => Some(Type::UInt64),
            "float" => Some(Type::Float),
            "double" => Some(Type::Double),
            "bool" => Some(Type::Bool),
            "string" => Some(Type::String),
            "wstring" => Some(Type::WString),
            "blob" => Some(Type::Blob),
            _ => None,
        }
    }

    /// True for arithmetic and bool types.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Type::Int8
                | Type::Int16
                | Type::Int32
                | Type::Int64
                | Type::UInt8
                | Type::UInt16
                | Type::UInt32
                | Type::UInt64
                | Type::Float
                | Type::Double
                | Type::Bool
        )
    }
}

// ──────────────────────────────────────────────
// Struct, enum, and service members
// ──────────────────────────────────────────────

/// A struct field. Within a struct, fields are kept sorted by ordinal.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub ordinal: u16,
    pub modifier: Modifier,
    pub ty: Type,
    pub name: String,
    pub default: Option<DefaultValue>,
    pub attributes: Vec<Attribute>,
    pub prov: Provenance,
}

/// An enum constant. Constants without an explicit value take
/// `previous + 1`, starting at 0.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumConstant {
    pub name: String,
    pub value: Option<i64>,
    pub prov: Provenance,
}

/// Compute the effective value of every constant in declaration order.
pub fn effective_values(constants: &[EnumConstant]) -> Vec<i64> {
    let mut values = Vec::with_capacity(constants.len());
    let mut next = 0i64;
    for c in constants {
        let v = c.value.unwrap_or(next);
        values.push(v);
        next = v.wrapping_add(1);
    }
    values
}

/// Result or input position of a service method.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodType {
    Void,
    Unary(Type),
    Streaming(Type),
}

/// A service method. Events have no result; their result is implicitly
/// "nothing".
#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    Function {
        name: String,
        result: MethodType,
        input: MethodType,
        attributes: Vec<Attribute>,
        prov: Provenance,
    },
    Event {
        name: String,
        input: MethodType,
        attributes: Vec<Attribute>,
        prov: Provenance,
    },
}

impl Method {
    pub fn name(&self) -> &str {
        match self {
            Method::Function { name, .. } | Method::Event { name, .. } => name,
        }
    }

    pub fn input(&self) -> &MethodType {
        match self {
            Method::Function { input, .. } | Method::Event { input, .. } => input,
        }
    }

    pub fn prov(&self) -> &Provenance {
        match self {
            Method::Function { prov, .. } | Method::Event { prov, .. } => prov,
        }
    }
}

// ──────────────────────────────────────────────
// Declarations
// ──────────────────────────────────────────────

/// The declaration sum: struct, enum, service, alias, forward.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Struct {
        name: String,
        namespaces: Vec<Namespace>,
        params: Vec<TypeParam>,
        base: Option<Type>,
        fields: Vec<Field>,
        attributes: Vec<Attribute>,
        prov: Provenance,
    },
    Enum {
        name: String,
        namespaces: Vec<Namespace>,
        constants: Vec<EnumConstant>,
        attributes: Vec<Attribute>,
        prov: Provenance,
    },
    Service {
        name: String,
        namespaces: Vec<Namespace>,
        params: Vec<TypeParam>,
        base: Option<Type>,
        methods: Vec<Method>,
        attributes: Vec<Attribute>,
        prov: Provenance,
    },
    Alias {
        name: String,
        namespaces: Vec<Namespace>,
        params: Vec<TypeParam>,
        aliased: Type,
        prov: Provenance,
    },
    Forward {
        name: String,
        namespaces: Vec<Namespace>,
        params: Vec<TypeParam>,
        prov: Provenance,
    },
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Struct { name, .. }
            | Declaration::Enum { name, .. }
            | Declaration::Service { name, .. }
            | Declaration::Alias { name, .. }
            | Declaration::Forward { name, .. } => name,
        }
    }

    pub fn namespaces(&self) -> &[Namespace] {
        match self {
            Declaration::Struct { namespaces, .. }
            | Declaration::Enum { namespaces, .. }
            | Declaration::Service { namespaces, .. }
            | Declaration::Alias { namespaces, .. }
            | Declaration::Forward { namespaces, .. } => namespaces,
        }
    }

    /// Generic parameters; empty for enums.
    pub fn params(&self) -> &[TypeParam] {
        match self {
            Declaration::Struct { params, .. }
            | Declaration::Service { params, .. }
            | Declaration::Alias { params, .. }
            | Declaration::Forward { params, .. } => params,
            Declaration::Enum { .. } => &[],
        }
    }

    pub fn prov(&self) -> &Provenance {
        match self {
            Declaration::Struct { prov, .. }
            | Declaration::Enum { prov, .. }
            | Declaration::Service { prov, .. }
            | Declaration::Alias { prov, .. }
            | Declaration::Forward { prov, .. } => prov,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Declaration::Struct { .. } => "struct",
            Declaration::Enum { .. } => "enum",
            Declaration::Service { .. } => "service",
            Declaration::Alias { .. } => "alias",
            Declaration::Forward { .. } => "forward",
        }
    }

    /// Dotted name under the first declaring namespace.
    pub fn qualified_name(&self) -> String {
        match self.namespaces().first() {
            Some(ns) => format!("{}.{}", ns.name, self.name()),
            None => self.name().to_owned(),
        }
    }
}

// ──────────────────────────────────────────────
// Arena and compiled AST
// ──────────────────────────────────────────────

/// Arena owning every declaration loaded in one compilation, root file
/// and transitive imports alike. References between declarations go
/// through [`DeclId`] indices into this arena.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclArena {
    decls: Vec<Declaration>,
}

impl DeclArena {
    pub fn new() -> Self {
        DeclArena { decls: Vec::new() }
    }

    pub fn alloc(&mut self, decl: Declaration) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(decl);
        id
    }

    pub fn get(&self, id: DeclId) -> &Declaration {
        &self.decls[id.index()]
    }

    /// Replace a slot in place. Every `UserDefined` holding this id
    /// observes the new declaration.
    pub fn replace(&mut self, id: DeclId, decl: Declaration) {
        self.decls[id.index()] = decl;
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = DeclId> {
        (0..self.decls.len() as u32).map(DeclId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, d)| (DeclId(i as u32), d))
    }
}

/// A compiled Bond file: the root file's imports, namespaces, and
/// declarations, plus the arena holding every declaration the
/// compilation loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    /// Import paths as written in the root file.
    pub imports: Vec<String>,
    /// Namespaces of the root file, in source order.
    pub namespaces: Vec<Namespace>,
    /// All declarations, imported files first, root file last.
    pub arena: DeclArena,
    /// The root file's own declarations, in source order.
    pub roots: Vec<DeclId>,
}
