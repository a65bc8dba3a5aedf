//! bond-core: Bond IDL front-end library.
//!
//! Provides the pipeline from `.bond` source text to a fully
//! type-resolved AST: lexing, parsing, import loading, symbol
//! registration, validation, and multi-pass type resolution, plus the
//! canonical JSON envelope.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`parse_file()`] / [`parse_string()`] / [`parse_content()`] -- run
//!   the full pipeline
//! - [`Ast`] -- the compiled schema (arena + root declarations)
//! - [`ParseError`] -- the shared diagnostic record
//! - [`ImportResolver`] -- the external collaborator loading imports
//!
//! Individual pass entry functions are also re-exported for selective
//! pipeline execution.

pub mod ast;
pub mod compile;
pub mod error;
pub mod flatten;
pub mod lexer;
pub mod parser;
pub mod pass1_imports;
pub mod pass2_symbols;
pub mod pass3_validate;
pub mod pass4_resolve;
pub mod pass5_serialize;
pub mod source;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{
    Ast, Attribute, DeclArena, DeclId, Declaration, DefaultValue, EnumConstant, Field, Language,
    Method, MethodType, Modifier, Namespace, Provenance, Type, TypeParam,
};
pub use compile::{Options, ParseResult};
pub use error::{ErrorKind, ParseError};
pub use source::{FsResolver, ImportResolver, InMemoryResolver};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use compile::{parse_content, parse_content_with, parse_file, parse_file_with, parse_string};
pub use flatten::flatten_type;
pub use pass1_imports::load;
pub use pass3_validate::validate;
pub use pass4_resolve::resolve;
pub use pass5_serialize::serialize;
