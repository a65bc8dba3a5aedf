//! Pass 2: symbol registration -- the global declaration table and the
//! per-file alias scopes, with duplicate detection and forward/struct
//! reconciliation.

use crate::ast::{DeclArena, DeclId, Declaration, Namespace, Provenance};
use crate::error::{ErrorKind, ParseError};
use std::collections::HashMap;

/// Symbol table for one compilation. Owns nothing: every entry is an
/// index into the compilation's arena.
///
/// Two symbol namespaces coexist. Structs, enums, services, and forward
/// declarations are global; aliases live in a per-file scope so two
/// files may alias the same name to different types without conflict.
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// Global declarations, keyed by bare name. Qualification is
    /// resolved at lookup time against the candidates' namespaces.
    by_name: HashMap<String, Vec<DeclId>>,
    /// Alias scopes keyed by the declaring file.
    alias_scopes: HashMap<String, HashMap<String, DeclId>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Register a global declaration. Returns the id the name resolves
    /// to afterwards: the new id, or an existing id when the new
    /// declaration reconciles with (or collapses into) one already
    /// registered.
    pub fn register(&mut self, id: DeclId, arena: &mut DeclArena) -> Result<DeclId, ParseError> {
        let decl = arena.get(id).clone();
        let candidates = self.by_name.get(decl.name()).cloned().unwrap_or_default();

        enum Outcome {
            Skip,
            StructPrevails,
            Collapse,
            Conflict(Provenance),
        }

        for existing_id in candidates {
            let outcome = {
                let existing = arena.get(existing_id);
                if !namespaces_overlap(existing.namespaces(), decl.namespaces()) {
                    Outcome::Skip
                } else {
                    match (existing, &decl) {
                        // Forward declaration and struct definition
                        // reconcile when the generic parameter lists
                        // agree; the struct prevails.
                        (Declaration::Forward { params, .. }, Declaration::Struct { .. })
                            if params_match(params, decl.params()) =>
                        {
                            Outcome::StructPrevails
                        }
                        (Declaration::Struct { .. }, Declaration::Forward { params, .. })
                            if params_match(existing.params(), params) =>
                        {
                            Outcome::Collapse
                        }
                        // The same file reached along two import paths
                        // registers structurally identical declarations;
                        // collapse them.
                        _ if strip_provenance(existing) == strip_provenance(&decl) => {
                            Outcome::Collapse
                        }
                        _ => Outcome::Conflict(existing.prov().clone()),
                    }
                }
            };
            match outcome {
                Outcome::Skip => continue,
                Outcome::StructPrevails => {
                    arena.replace(existing_id, decl);
                    return Ok(existing_id);
                }
                Outcome::Collapse => return Ok(existing_id),
                Outcome::Conflict(first) => {
                    return Err(ParseError::semantic(
                        ErrorKind::DuplicateDeclaration,
                        decl.prov(),
                        format!(
                            "duplicate declaration '{}': first declared at {}:{}",
                            decl.qualified_name(),
                            first.file,
                            first.line
                        ),
                    ))
                }
            }
        }

        self.by_name
            .entry(decl.name().to_owned())
            .or_default()
            .push(id);
        Ok(id)
    }

    /// Register an alias into its file's scope.
    pub fn register_alias(
        &mut self,
        id: DeclId,
        arena: &DeclArena,
    ) -> Result<(), ParseError> {
        let decl = arena.get(id);
        let scope = self
            .alias_scopes
            .entry(decl.prov().file.clone())
            .or_default();
        if scope.contains_key(decl.name()) {
            return Err(ParseError::semantic(
                ErrorKind::DuplicateDeclaration,
                decl.prov(),
                format!("duplicate alias '{}' in this file", decl.name()),
            ));
        }
        scope.insert(decl.name().to_owned(), id);
        Ok(())
    }

    /// Look up a possibly-qualified name from a declaration whose file
    /// declares `from` namespaces. Unqualified names search within
    /// `from`; qualified names match against candidates' namespaces,
    /// language-agnostically.
    pub fn lookup(
        &self,
        name: &str,
        from: &[Namespace],
        arena: &DeclArena,
    ) -> Option<DeclId> {
        if let Some((ns_part, last)) = name.rsplit_once('.') {
            let probe = Namespace {
                lang: None,
                name: ns_part.to_owned(),
            };
            self.by_name.get(last)?.iter().copied().find(|id| {
                arena.get(*id).namespaces().iter().any(|n| n.matches(&probe))
            })
        } else {
            self.by_name.get(name)?.iter().copied().find(|id| {
                arena
                    .get(*id)
                    .namespaces()
                    .iter()
                    .any(|n| from.iter().any(|f| f.matches(n)))
            })
        }
    }

    /// Look up an alias in the scope of `file`.
    pub fn lookup_alias(&self, file: &str, name: &str) -> Option<DeclId> {
        self.alias_scopes.get(file)?.get(name).copied()
    }
}

fn namespaces_overlap(a: &[Namespace], b: &[Namespace]) -> bool {
    a.iter().any(|x| b.iter().any(|y| x.matches(y)))
}

/// Forward/struct reconciliation requires equal arity and matching
/// constraints; parameter names are not significant.
fn params_match(a: &[crate::ast::TypeParam], b: &[crate::ast::TypeParam]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| x.value_constraint == y.value_constraint)
}

/// Copy of a declaration with every provenance cleared, for structural
/// comparison across files.
fn strip_provenance(decl: &Declaration) -> Declaration {
    let mut d = decl.clone();
    match &mut d {
        Declaration::Struct { prov, fields, .. } => {
            *prov = Provenance::default();
            for f in fields {
                f.prov = Provenance::default();
            }
        }
        Declaration::Enum {
            prov, constants, ..
        } => {
            *prov = Provenance::default();
            for c in constants {
                c.prov = Provenance::default();
            }
        }
        Declaration::Service { prov, methods, .. } => {
            *prov = Provenance::default();
            for m in methods {
                match m {
                    crate::ast::Method::Function { prov, .. }
                    | crate::ast::Method::Event { prov, .. } => *prov = Provenance::default(),
                }
            }
        }
        Declaration::Alias { prov, .. } | Declaration::Forward { prov, .. } => {
            *prov = Provenance::default();
        }
    }
    d
}
