//! Pass 4: type resolution -- replace every `Unresolved` node with a
//! `UserDefined` reference or a primitive, iterating to a fixpoint.
//!
//! Each pass rebuilds every arena slot and compares it to the previous
//! pass's contents; pure stability implies a fixpoint. The pass count is
//! capped, and hitting the cap with changes still pending is an error --
//! silent divergence is forbidden. Resolution is fail-fast: the first
//! unresolvable name aborts the pass.

use crate::ast::{
    DeclArena, DeclId, Declaration, Field, Method, MethodType, Namespace, Provenance, Type,
    TypeParam,
};
use crate::error::{ErrorKind, ParseError};
use crate::pass2_symbols::SymbolTable;
use std::collections::HashMap;

/// Upper bound on fixpoint passes. Alias chains settle in two; the cap
/// only exists to turn a resolver bug into a diagnostic instead of a
/// hang.
pub const MAX_PASSES: usize = 10;

pub fn resolve(arena: &mut DeclArena, symbols: &SymbolTable) -> Result<(), ParseError> {
    let mut resolver = Resolver {
        arena,
        symbols,
        forwards: HashMap::new(),
    };
    resolver.run()
}

struct Resolver<'a> {
    arena: &'a mut DeclArena,
    symbols: &'a SymbolTable,
    /// Synthesized forward declarations for self-referential structs,
    /// one per struct, reused across passes.
    forwards: HashMap<DeclId, DeclId>,
}

/// Owned context of the declaration being resolved.
struct DeclCtx {
    id: DeclId,
    name: String,
    namespaces: Vec<Namespace>,
    params: Vec<TypeParam>,
    file: String,
    is_struct: bool,
}

impl<'a> Resolver<'a> {
    fn run(&mut self) -> Result<(), ParseError> {
        for _ in 0..MAX_PASSES {
            let ids: Vec<DeclId> = self.arena.ids().collect();
            let mut changed = false;
            for id in ids {
                let decl = self.arena.get(id).clone();
                let resolved = self.resolve_decl(id, &decl)?;
                if resolved != decl {
                    changed = true;
                    self.arena.replace(id, resolved);
                }
            }
            if !changed {
                return Ok(());
            }
        }
        Err(ParseError::new(
            ErrorKind::ResolutionDivergence,
            None,
            0,
            0,
            format!("type resolution did not converge after {} passes", MAX_PASSES),
        ))
    }

    fn resolve_decl(&mut self, id: DeclId, decl: &Declaration) -> Result<Declaration, ParseError> {
        let ctx = DeclCtx {
            id,
            name: decl.name().to_owned(),
            namespaces: decl.namespaces().to_vec(),
            params: decl.params().to_vec(),
            file: decl.prov().file.clone(),
            is_struct: matches!(decl, Declaration::Struct { .. }),
        };
        match decl {
            Declaration::Struct {
                name,
                namespaces,
                params,
                base,
                fields,
                attributes,
                prov,
            } => {
                let base = match base {
                    Some(b) => Some(self.resolve_type(b, &ctx, prov)?),
                    None => None,
                };
                let mut resolved_fields = Vec::with_capacity(fields.len());
                for f in fields {
                    resolved_fields.push(Field {
                        ty: self.resolve_type(&f.ty, &ctx, &f.prov)?,
                        ..f.clone()
                    });
                }
                Ok(Declaration::Struct {
                    name: name.clone(),
                    namespaces: namespaces.clone(),
                    params: params.clone(),
                    base,
                    fields: resolved_fields,
                    attributes: attributes.clone(),
                    prov: prov.clone(),
                })
            }
            Declaration::Service {
                name,
                namespaces,
                params,
                base,
                methods,
                attributes,
                prov,
            } => {
                let base = match base {
                    Some(b) => Some(self.resolve_type(b, &ctx, prov)?),
                    None => None,
                };
                let mut resolved_methods = Vec::with_capacity(methods.len());
                for m in methods {
                    resolved_methods.push(self.resolve_method(m, &ctx)?);
                }
                Ok(Declaration::Service {
                    name: name.clone(),
                    namespaces: namespaces.clone(),
                    params: params.clone(),
                    base,
                    methods: resolved_methods,
                    attributes: attributes.clone(),
                    prov: prov.clone(),
                })
            }
            Declaration::Alias {
                name,
                namespaces,
                params,
                aliased,
                prov,
            } => Ok(Declaration::Alias {
                name: name.clone(),
                namespaces: namespaces.clone(),
                params: params.clone(),
                aliased: self.resolve_type(aliased, &ctx, prov)?,
                prov: prov.clone(),
            }),
            Declaration::Enum { .. } | Declaration::Forward { .. } => Ok(decl.clone()),
        }
    }

    fn resolve_method(&mut self, method: &Method, ctx: &DeclCtx) -> Result<Method, ParseError> {
        match method {
            Method::Function {
                name,
                result,
                input,
                attributes,
                prov,
            } => Ok(Method::Function {
                name: name.clone(),
                result: self.resolve_method_type(result, ctx, prov)?,
                input: self.resolve_method_type(input, ctx, prov)?,
                attributes: attributes.clone(),
                prov: prov.clone(),
            }),
            Method::Event {
                name,
                input,
                attributes,
                prov,
            } => Ok(Method::Event {
                name: name.clone(),
                input: self.resolve_method_type(input, ctx, prov)?,
                attributes: attributes.clone(),
                prov: prov.clone(),
            }),
        }
    }

    fn resolve_method_type(
        &mut self,
        mt: &MethodType,
        ctx: &DeclCtx,
        prov: &Provenance,
    ) -> Result<MethodType, ParseError> {
        Ok(match mt {
            MethodType::Void => MethodType::Void,
            MethodType::Unary(t) => MethodType::Unary(self.resolve_type(t, ctx, prov)?),
            MethodType::Streaming(t) => MethodType::Streaming(self.resolve_type(t, ctx, prov)?),
        })
    }

    fn resolve_type(
        &mut self,
        ty: &Type,
        ctx: &DeclCtx,
        prov: &Provenance,
    ) -> Result<Type, ParseError> {
        Ok(match ty {
            Type::Unresolved { name, args } => {
                let mut resolved_args = Vec::with_capacity(args.len());
                for a in args {
                    resolved_args.push(self.resolve_type(a, ctx, prov)?);
                }

                // File-scoped aliases shadow global declarations.
                if !name.contains('.') {
                    if let Some(alias) = self.symbols.lookup_alias(&ctx.file, name) {
                        return Ok(Type::UserDefined {
                            decl: alias,
                            args: resolved_args,
                        });
                    }
                }

                if let Some(target) = self.symbols.lookup(name, &ctx.namespaces, self.arena) {
                    // A struct referencing itself resolves to a
                    // synthesized forward declaration, cutting the
                    // unfolding cycle at the reference site.
                    if target == ctx.id && ctx.is_struct {
                        let fwd = self.forward_of(ctx);
                        return Ok(Type::UserDefined {
                            decl: fwd,
                            args: resolved_args,
                        });
                    }
                    return Ok(Type::UserDefined {
                        decl: target,
                        args: resolved_args,
                    });
                }

                // Case-variants of primitive names resolve to the
                // primitive when they carry no arguments.
                if !name.contains('.') && resolved_args.is_empty() {
                    if let Some(prim) = Type::from_primitive_name(&name.to_lowercase()) {
                        return Ok(prim);
                    }
                }

                return Err(ParseError::semantic(
                    ErrorKind::UnresolvedType,
                    prov,
                    format!("unresolved type reference '{}'", name),
                ));
            }
            Type::UserDefined { decl, args } => {
                let mut resolved_args = Vec::with_capacity(args.len());
                for a in args {
                    resolved_args.push(self.resolve_type(a, ctx, prov)?);
                }
                Type::UserDefined {
                    decl: *decl,
                    args: resolved_args,
                }
            }
            Type::List(t) => Type::List(Box::new(self.resolve_type(t, ctx, prov)?)),
            Type::Vector(t) => Type::Vector(Box::new(self.resolve_type(t, ctx, prov)?)),
            Type::Set(t) => Type::Set(Box::new(self.resolve_type(t, ctx, prov)?)),
            Type::Map(k, v) => Type::Map(
                Box::new(self.resolve_type(k, ctx, prov)?),
                Box::new(self.resolve_type(v, ctx, prov)?),
            ),
            Type::Nullable(t) => Type::Nullable(Box::new(self.resolve_type(t, ctx, prov)?)),
            Type::Bonded(t) => Type::Bonded(Box::new(self.resolve_type(t, ctx, prov)?)),
            Type::Maybe(t) => Type::Maybe(Box::new(self.resolve_type(t, ctx, prov)?)),
            other => other.clone(),
        })
    }

    fn forward_of(&mut self, ctx: &DeclCtx) -> DeclId {
        if let Some(existing) = self.forwards.get(&ctx.id) {
            return *existing;
        }
        let prov = self.arena.get(ctx.id).prov().clone();
        let fwd = self.arena.alloc(Declaration::Forward {
            name: ctx.name.clone(),
            namespaces: ctx.namespaces.clone(),
            params: ctx.params.clone(),
            prov,
        });
        self.forwards.insert(ctx.id, fwd);
        fwd
    }
}
