//! Field validation: key-type validity, default-value compatibility,
//! and the enum-default and `nothing` rules. All checks run on the
//! alias-flattened type.

use crate::ast::{DeclArena, Declaration, DefaultValue, Field, Modifier, Type};
use crate::error::{ErrorKind, ParseError};
use crate::flatten::flatten_with_symbols;
use crate::pass2_symbols::SymbolTable;

pub(super) fn validate_field(
    field: &Field,
    owner: &Declaration,
    arena: &DeclArena,
    symbols: &SymbolTable,
) -> Result<(), ParseError> {
    let ctx = Ctx {
        owner,
        arena,
        symbols,
    };
    let flat = flatten_with_symbols(&field.ty, &owner.prov().file, arena, symbols);

    check_keys(&flat, field, &ctx)?;

    // Struct fields may never default to `nothing`; the declared type
    // sits under the `Maybe` wrapper the builder added.
    if field.default == Some(DefaultValue::Nothing) {
        let declared = match &flat {
            Type::Maybe(inner) => inner.as_ref(),
            other => other,
        };
        if ctx.is_struct(declared) {
            return Err(ParseError::semantic(
                ErrorKind::InvalidStructDefault,
                &field.prov,
                format!(
                    "struct field '{}' cannot have a default of 'nothing'",
                    field.name
                ),
            ));
        }
    }

    // A non-required enum field has no implicit zero value on the wire;
    // it must carry a default.
    if ctx.is_enum(&flat) && field.modifier != Modifier::Required && field.default.is_none() {
        return Err(ParseError::semantic(
            ErrorKind::RequiredDefault,
            &field.prov,
            format!("enum field '{}' must have a default value", field.name),
        ));
    }

    if let Some(default) = &field.default {
        check_default(&flat, default, field, &ctx)?;
    }
    Ok(())
}

struct Ctx<'a> {
    owner: &'a Declaration,
    arena: &'a DeclArena,
    symbols: &'a SymbolTable,
}

impl<'a> Ctx<'a> {
    /// The declaration a (possibly unresolved) user type refers to.
    fn target(&self, ty: &Type) -> Option<&'a Declaration> {
        match ty {
            Type::UserDefined { decl, .. } => Some(self.arena.get(*decl)),
            Type::Unresolved { name, .. } => self
                .symbols
                .lookup(name, self.owner.namespaces(), self.arena)
                .map(|id| self.arena.get(id)),
            _ => None,
        }
    }

    fn is_enum(&self, ty: &Type) -> bool {
        matches!(self.target(ty), Some(Declaration::Enum { .. }))
    }

    fn is_struct(&self, ty: &Type) -> bool {
        matches!(
            self.target(ty),
            Some(Declaration::Struct { .. }) | Some(Declaration::Forward { .. })
        )
    }

    fn enum_has_constant(&self, ty: &Type, name: &str) -> bool {
        // A qualified default names the constant in its last segment.
        let last = name.rsplit('.').next().unwrap_or(name);
        match self.target(ty) {
            Some(Declaration::Enum { constants, .. }) => {
                constants.iter().any(|c| c.name == last)
            }
            _ => false,
        }
    }
}

/// Every `set` key and `map` key in the type tree must be a scalar,
/// string, enum, or type parameter.
fn check_keys(ty: &Type, field: &Field, ctx: &Ctx) -> Result<(), ParseError> {
    match ty {
        Type::Set(key) => {
            check_key_valid(key, field, ctx)?;
            check_keys(key, field, ctx)
        }
        Type::Map(key, value) => {
            check_key_valid(key, field, ctx)?;
            check_keys(key, field, ctx)?;
            check_keys(value, field, ctx)
        }
        Type::List(t)
        | Type::Vector(t)
        | Type::Nullable(t)
        | Type::Bonded(t)
        | Type::Maybe(t) => check_keys(t, field, ctx),
        Type::UserDefined { args, .. } | Type::Unresolved { args, .. } => {
            for a in args {
                check_keys(a, field, ctx)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn check_key_valid(key: &Type, field: &Field, ctx: &Ctx) -> Result<(), ParseError> {
    let valid = key.is_scalar()
        || matches!(key, Type::String | Type::WString | Type::Parameter(_))
        || ctx.is_enum(key);
    if valid {
        Ok(())
    } else {
        Err(ParseError::semantic(
            ErrorKind::InvalidKeyType,
            &field.prov,
            format!(
                "field '{}' uses an invalid key type; keys must be scalar, string, enum, or a type parameter",
                field.name
            ),
        ))
    }
}

/// Default-value compatibility against the flattened type.
fn check_default(
    ty: &Type,
    default: &DefaultValue,
    field: &Field,
    ctx: &Ctx,
) -> Result<(), ParseError> {
    let invalid = |why: String| {
        Err(ParseError::semantic(
            ErrorKind::InvalidDefault,
            &field.prov,
            format!("invalid default for field '{}': {}", field.name, why),
        ))
    };

    match ty {
        // Instantiation sites check parameter defaults; nothing to do here.
        Type::Parameter(_) => Ok(()),

        Type::Maybe(_) => match default {
            DefaultValue::Nothing => Ok(()),
            _ => invalid("only 'nothing' is valid here".to_owned()),
        },

        Type::List(_)
        | Type::Vector(_)
        | Type::Set(_)
        | Type::Map(..)
        | Type::Nullable(_)
        | Type::Bonded(_)
        | Type::Blob => match default {
            DefaultValue::Nothing => Ok(()),
            _ => invalid("container types accept only 'nothing' as a default".to_owned()),
        },

        Type::Bool => match default {
            DefaultValue::Bool(_) | DefaultValue::Nothing => Ok(()),
            _ => invalid("expected a bool literal".to_owned()),
        },

        Type::String | Type::WString => match default {
            DefaultValue::String(_) | DefaultValue::Nothing => Ok(()),
            _ => invalid("expected a string literal".to_owned()),
        },

        Type::Float | Type::Double => match default {
            DefaultValue::Float(_) | DefaultValue::Integer(_) | DefaultValue::Nothing => Ok(()),
            _ => invalid("expected a numeric literal".to_owned()),
        },

        Type::Int8
        | Type::Int16
        | Type::Int32
        | Type::Int64
        | Type::UInt8
        | Type::UInt16
        | Type::UInt32
        | Type::UInt64 => match default {
            DefaultValue::Integer(v) => {
                if integer_in_range(ty, *v) {
                    Ok(())
                } else {
                    invalid(format!("value {} is out of range for {}", v, int_name(ty)))
                }
            }
            DefaultValue::Nothing => Ok(()),
            _ => invalid(format!("expected an integer literal for {}", int_name(ty))),
        },

        Type::MetaName | Type::MetaFullName => {
            invalid("meta fields cannot have defaults".to_owned())
        }

        Type::UserDefined { .. } | Type::Unresolved { .. } => {
            if ctx.is_enum(ty) {
                match default {
                    DefaultValue::Enum(name) => {
                        if ctx.enum_has_constant(ty, name) {
                            Ok(())
                        } else {
                            invalid(format!("'{}' is not a constant of the enum", name))
                        }
                    }
                    _ => invalid("enum fields require an enum constant default".to_owned()),
                }
            } else {
                // Structs reject non-`nothing` defaults; `nothing` on a
                // struct was already rejected above. Unknown names are
                // the resolver's to report.
                match default {
                    DefaultValue::Nothing => Ok(()),
                    _ if ctx.is_struct(ty) => {
                        invalid("struct fields cannot have defaults".to_owned())
                    }
                    _ => Ok(()),
                }
            }
        }

        Type::IntLiteral(_) => Ok(()),
    }
}

fn integer_in_range(ty: &Type, v: i64) -> bool {
    match ty {
        Type::Int8 => (i8::MIN as i64..=i8::MAX as i64).contains(&v),
        Type::Int16 => (i16::MIN as i64..=i16::MAX as i64).contains(&v),
        Type::Int32 => (i32::MIN as i64..=i32::MAX as i64).contains(&v),
        Type::Int64 => true,
        Type::UInt8 => (0..=u8::MAX as i64).contains(&v),
        Type::UInt16 => (0..=u16::MAX as i64).contains(&v),
        Type::UInt32 => (0..=u32::MAX as i64).contains(&v),
        Type::UInt64 => v >= 0,
        _ => false,
    }
}

fn int_name(ty: &Type) -> &'static str {
    match ty {
        Type::Int8 => "int8",
        Type::Int16 => "int16",
        Type::Int32 => "int32",
        Type::Int64 => "int64",
        Type::UInt8 => "uint8",
        Type::UInt16 => "uint16",
        Type::UInt32 => "uint32",
        Type::UInt64 => "uint64",
        _ => "integer",
    }
}
