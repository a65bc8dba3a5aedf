//! Pass 1: import graph loading -- lex and parse the root file and all
//! transitive imports, registering declarations into the shared symbol
//! table as loading proceeds.
//!
//! Loading is keyed by canonical path and idempotent: a path is marked
//! visited before its own imports are walked, so circular imports
//! terminate silently instead of recursing. Resolver failures surface
//! as `ImportFailure` diagnostics and do not abort the compilation;
//! parse failures do.

use crate::ast::{DeclArena, DeclId, Declaration, Namespace};
use crate::compile::Options;
use crate::error::ParseError;
use crate::lexer;
use crate::parser;
use crate::pass2_symbols::SymbolTable;
use crate::source::ImportResolver;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Everything pass 1 hands to the later passes.
pub struct LoadOutput {
    pub arena: DeclArena,
    pub symbols: SymbolTable,
    /// Import paths of the root file, as written.
    pub imports: Vec<String>,
    /// Namespaces of the root file.
    pub namespaces: Vec<Namespace>,
    /// The root file's declarations, in source order.
    pub roots: Vec<DeclId>,
    /// Non-fatal diagnostics: import failures and duplicate symbols.
    pub errors: Vec<ParseError>,
}

/// Load the root file (from `root_content` if given, otherwise through
/// the resolver) and every transitive import. A parse failure anywhere
/// is fatal and yields `Err`; the pipeline returns no AST for it.
pub fn load(
    root_path: &Path,
    root_content: Option<&str>,
    resolver: &dyn ImportResolver,
    options: &Options,
) -> Result<LoadOutput, Vec<ParseError>> {
    let mut loader = Loader {
        resolver,
        options,
        arena: DeclArena::new(),
        symbols: SymbolTable::new(),
        visited: HashSet::new(),
        errors: Vec::new(),
        root: None,
    };
    loader.load_file(root_path, root_content, None)?;

    // SAFETY: load_file(.., true) always records the root on success
    let root = loader.root.unwrap();
    Ok(LoadOutput {
        arena: loader.arena,
        symbols: loader.symbols,
        imports: root.imports,
        namespaces: root.namespaces,
        roots: root.decls,
        errors: loader.errors,
    })
}

struct RootInfo {
    imports: Vec<String>,
    namespaces: Vec<Namespace>,
    decls: Vec<DeclId>,
}

struct Loader<'a> {
    resolver: &'a dyn ImportResolver,
    options: &'a Options,
    arena: DeclArena,
    symbols: SymbolTable,
    visited: HashSet<PathBuf>,
    errors: Vec<ParseError>,
    root: Option<RootInfo>,
}

impl<'a> Loader<'a> {
    fn load_file(
        &mut self,
        path: &Path,
        content: Option<&str>,
        via: Option<&crate::ast::Provenance>,
    ) -> Result<(), Vec<ParseError>> {
        let is_root = via.is_none();

        // In-memory roots may not canonicalize; fall back to the path
        // as given so virtual compilations still get an identity key.
        let canon = self
            .resolver
            .canonicalize(path)
            .unwrap_or_else(|_| path.to_owned());
        if !self.visited.insert(canon) {
            return Ok(());
        }

        let src = match content {
            Some(s) => s.to_owned(),
            None => match self.resolver.read_source(path) {
                Ok(s) => s,
                Err(e) => {
                    // Attribute the failure to the import statement
                    // that requested the file.
                    let err = match via {
                        Some(prov) => ParseError::import_failure(
                            &prov.file,
                            prov.line,
                            prov.column,
                            format!("cannot read file '{}': {}", path.display(), e),
                        ),
                        None => ParseError::import_failure(
                            &path.display().to_string(),
                            0,
                            0,
                            format!("cannot read file '{}': {}", path.display(), e),
                        ),
                    };
                    if is_root {
                        return Err(vec![err]);
                    }
                    self.errors.push(err);
                    return Ok(());
                }
            },
        };

        let display = path.display().to_string();
        let lexed = lexer::lex(&src);
        let parsed = parser::parse(&lexed.tokens, &display).map_err(|e| vec![e])?;

        let base_dir = path.parent().unwrap_or(Path::new(".")).to_owned();
        for import in &parsed.imports {
            if self.options.ignore_imports {
                continue;
            }
            if self.options.is_cancelled() {
                return Err(vec![ParseError::cancelled()]);
            }
            match self.resolver.resolve_import(&base_dir, &import.path) {
                Ok(resolved) => self.load_file(&resolved, None, Some(&import.prov))?,
                Err(e) => self.errors.push(ParseError::import_failure(
                    &import.prov.file,
                    import.prov.line,
                    import.prov.column,
                    format!("cannot resolve import '{}': {}", import.path, e),
                )),
            }
        }

        let mut decl_ids = Vec::new();
        for decl in parsed.declarations {
            let is_alias = matches!(decl, Declaration::Alias { .. });
            let id = self.arena.alloc(decl);
            if is_alias {
                if let Err(e) = self.symbols.register_alias(id, &self.arena) {
                    self.errors.push(e);
                }
                decl_ids.push(id);
            } else {
                match self.symbols.register(id, &mut self.arena) {
                    Ok(resolved_id) => decl_ids.push(resolved_id),
                    Err(e) => {
                        self.errors.push(e);
                        decl_ids.push(id);
                    }
                }
            }
        }

        if is_root {
            self.root = Some(RootInfo {
                imports: parsed.imports.into_iter().map(|i| i.path).collect(),
                namespaces: parsed.namespaces,
                decls: decl_ids,
            });
        }
        Ok(())
    }
}
