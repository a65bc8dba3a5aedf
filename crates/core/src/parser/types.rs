use super::Parser;
use crate::ast::{Type, TypeParam};
use crate::error::ParseError;
use crate::lexer::Token;

impl<'a> Parser<'a> {
    // -- Type parsing -------------------------------------------

    /// Parse a type in any position except a struct field, where
    /// `parse_field_type` additionally accepts the meta types.
    pub(super) fn parse_type(&mut self) -> Result<Type, ParseError> {
        let name = self.take_word()?;
        match name.as_str() {
            "list" => Ok(Type::List(Box::new(self.parse_single_arg()?))),
            "vector" => Ok(Type::Vector(Box::new(self.parse_single_arg()?))),
            "set" => Ok(Type::Set(Box::new(self.parse_single_arg()?))),
            "nullable" => Ok(Type::Nullable(Box::new(self.parse_single_arg()?))),
            "bonded" => Ok(Type::Bonded(Box::new(self.parse_single_arg()?))),
            "map" => {
                self.expect_lt()?;
                let key = self.parse_type_arg()?;
                self.expect_comma()?;
                let value = self.parse_type_arg()?;
                self.expect_gt()?;
                Ok(Type::Map(Box::new(key), Box::new(value)))
            }
            "bond_meta" => {
                Err(self.err("bond_meta types are accepted only as field types"))
            }
            other => {
                if let Some(prim) = Type::from_primitive_name(other) {
                    return Ok(prim);
                }
                let mut dotted = other.to_owned();
                while self.peek() == &Token::Dot {
                    self.advance();
                    dotted.push('.');
                    dotted.push_str(&self.take_word()?);
                }
                let args = if self.peek() == &Token::Lt {
                    self.parse_type_args()?
                } else {
                    Vec::new()
                };
                // A single-segment name bound in the enclosing generic
                // scope is a parameter reference, not a user type.
                if !dotted.contains('.') {
                    if let Some(param) = self.lookup_param(&dotted) {
                        if !args.is_empty() {
                            return Err(self.err(format!(
                                "type parameter '{}' does not take arguments",
                                dotted
                            )));
                        }
                        return Ok(Type::Parameter(param));
                    }
                }
                Ok(Type::Unresolved { name: dotted, args })
            }
        }
    }

    fn parse_single_arg(&mut self) -> Result<Type, ParseError> {
        self.expect_lt()?;
        let inner = self.parse_type_arg()?;
        self.expect_gt()?;
        Ok(inner)
    }

    /// A generic argument is a type or an integer literal.
    fn parse_type_arg(&mut self) -> Result<Type, ParseError> {
        if let Token::Int(n) = self.peek() {
            let n = *n;
            self.advance();
            return Ok(Type::IntLiteral(n));
        }
        self.parse_type()
    }

    fn parse_type_args(&mut self) -> Result<Vec<Type>, ParseError> {
        self.expect_lt()?;
        let mut args = vec![self.parse_type_arg()?];
        while self.peek() == &Token::Comma {
            self.advance();
            args.push(self.parse_type_arg()?);
        }
        self.expect_gt()?;
        Ok(args)
    }

    // -- Generic parameter lists --------------------------------

    /// Parse `<T, U : value, ...>` if present.
    pub(super) fn parse_type_params(&mut self) -> Result<Vec<TypeParam>, ParseError> {
        if self.peek() != &Token::Lt {
            return Ok(Vec::new());
        }
        self.advance();
        let mut params = Vec::new();
        loop {
            let name = self.take_word()?;
            let value_constraint = if self.peek() == &Token::Colon {
                self.advance();
                self.expect_word("value")?;
                true
            } else {
                false
            };
            params.push(TypeParam {
                name,
                value_constraint,
            });
            match self.peek() {
                Token::Comma => {
                    self.advance();
                }
                Token::Gt => {
                    self.advance();
                    break;
                }
                _ => return Err(self.err(format!("expected ',' or '>', got {:?}", self.peek()))),
            }
        }
        Ok(params)
    }
}
