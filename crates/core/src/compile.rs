//! Parse facade: the one public entry point binding the pipeline
//! together -- lex, parse, import loading, validation, type resolution.
//!
//! Parse failures yield no AST. Semantic failures yield a best-effort
//! partial AST with `success` false. Cancellation is cooperative and
//! checked between stages and at import-loading boundaries.

use crate::ast::Ast;
use crate::error::ParseError;
use crate::pass1_imports;
use crate::pass3_validate;
use crate::pass4_resolve;
use crate::source::{FsResolver, ImportResolver, InMemoryResolver};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Compilation options.
#[derive(Clone, Default)]
pub struct Options {
    /// Parse import statements but do not load them. Semantic analysis
    /// still runs on local declarations; resolution is best-effort
    /// against what is locally visible. Used by compatibility diffing
    /// when loading imports would fail (old revisions lacking siblings).
    pub ignore_imports: bool,
    /// Cooperative cancellation signal.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Options {
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

/// Outcome of one compilation.
#[derive(Debug)]
pub struct ParseResult {
    /// `None` after a parse failure; a best-effort partial AST after
    /// semantic failures.
    pub ast: Option<Ast>,
    pub errors: Vec<ParseError>,
    pub success: bool,
}

impl ParseResult {
    fn failed(errors: Vec<ParseError>) -> Self {
        ParseResult {
            ast: None,
            errors,
            success: false,
        }
    }
}

/// Compile a file through the default filesystem resolver.
pub fn parse_file(path: &Path) -> ParseResult {
    parse_file_with(path, &FsResolver, &Options::default())
}

/// Compile a file through a caller-supplied resolver.
pub fn parse_file_with(
    path: &Path,
    resolver: &dyn ImportResolver,
    options: &Options,
) -> ParseResult {
    run(path, None, resolver, options)
}

/// Compile in-memory source under the virtual path `<string>`. Imports
/// are unresolvable unless `ignore_imports` is set.
pub fn parse_string(content: &str) -> ParseResult {
    parse_content_with(
        content,
        "<string>",
        &InMemoryResolver::new(),
        &Options::default(),
    )
}

/// Compile in-memory source under a virtual path, resolving imports
/// through the default filesystem resolver.
pub fn parse_content(content: &str, virtual_path: &str) -> ParseResult {
    parse_content_with(content, virtual_path, &FsResolver, &Options::default())
}

/// Compile in-memory source under a virtual path with a caller-supplied
/// resolver.
pub fn parse_content_with(
    content: &str,
    virtual_path: &str,
    resolver: &dyn ImportResolver,
    options: &Options,
) -> ParseResult {
    run(Path::new(virtual_path), Some(content), resolver, options)
}

fn run(
    path: &Path,
    content: Option<&str>,
    resolver: &dyn ImportResolver,
    options: &Options,
) -> ParseResult {
    if options.is_cancelled() {
        return ParseResult::failed(vec![ParseError::cancelled()]);
    }

    let mut loaded = match pass1_imports::load(path, content, resolver, options) {
        Ok(out) => out,
        Err(errors) => return ParseResult::failed(errors),
    };
    let mut errors = std::mem::take(&mut loaded.errors);

    if options.is_cancelled() {
        return ParseResult::failed(vec![ParseError::cancelled()]);
    }

    errors.extend(pass3_validate::validate(&loaded.arena, &loaded.symbols));

    if options.is_cancelled() {
        return ParseResult::failed(vec![ParseError::cancelled()]);
    }

    if let Err(e) = pass4_resolve::resolve(&mut loaded.arena, &loaded.symbols) {
        errors.push(e);
    }

    let ast = Ast {
        imports: loaded.imports,
        namespaces: loaded.namespaces,
        arena: loaded.arena,
        roots: loaded.roots,
    };
    ParseResult {
        success: errors.is_empty(),
        ast: Some(ast),
        errors,
    }
}
