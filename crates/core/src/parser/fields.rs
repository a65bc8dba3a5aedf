use super::Parser;
use crate::ast::{DefaultValue, Field, Modifier, Type};
use crate::error::ParseError;
use crate::lexer::Token;

impl<'a> Parser<'a> {
    // -- Field parsing ------------------------------------------

    /// field := attrs? int ':' modifier? field_type ident ('=' default)?
    ///
    /// The trailing ';' is consumed by the struct body loop. A field
    /// defaulted to `nothing` has its declared type wrapped in `Maybe`;
    /// the default itself is retained.
    pub(super) fn parse_field(&mut self) -> Result<Field, ParseError> {
        let attributes = self.parse_attributes()?;
        let prov = self.prov();

        let ordinal = self.take_int()?;
        if !(0..=u16::MAX as i64).contains(&ordinal) {
            return Err(self.err(format!(
                "field ordinal {} does not fit in 16 bits",
                ordinal
            )));
        }
        self.expect_colon()?;

        let modifier = if self.is_word("optional") {
            self.advance();
            Modifier::Optional
        } else if self.is_word("required") {
            self.advance();
            Modifier::Required
        } else if self.is_word("required_optional") {
            self.advance();
            Modifier::RequiredOptional
        } else {
            Modifier::Optional
        };

        let declared = self.parse_field_type()?;
        let name = self.take_word()?;

        let default = if self.peek() == &Token::Eq {
            self.advance();
            Some(self.parse_default()?)
        } else {
            None
        };

        let ty = if default == Some(DefaultValue::Nothing) {
            Type::Maybe(Box::new(declared))
        } else {
            declared
        };

        Ok(Field {
            ordinal: ordinal as u16,
            modifier,
            ty,
            name,
            default,
            attributes,
            prov,
        })
    }

    /// A field type is any type, or one of the `bond_meta` intrinsics.
    pub(super) fn parse_field_type(&mut self) -> Result<Type, ParseError> {
        if self.is_word("bond_meta") {
            self.advance();
            self.expect_colon()?;
            self.expect_colon()?;
            let which = self.take_word()?;
            return match which.as_str() {
                "name" => Ok(Type::MetaName),
                "full_name" => Ok(Type::MetaFullName),
                other => Err(self.err(format!("unknown bond_meta type '{}'", other))),
            };
        }
        self.parse_type()
    }

    fn parse_default(&mut self) -> Result<DefaultValue, ParseError> {
        match self.peek().clone() {
            Token::Word(w) if w == "nothing" => {
                self.advance();
                Ok(DefaultValue::Nothing)
            }
            Token::Word(w) if w == "true" => {
                self.advance();
                Ok(DefaultValue::Bool(true))
            }
            Token::Word(w) if w == "false" => {
                self.advance();
                Ok(DefaultValue::Bool(false))
            }
            Token::Int(n) => {
                self.advance();
                Ok(DefaultValue::Integer(n))
            }
            Token::Float(s) => {
                self.advance();
                match s.parse::<f64>() {
                    Ok(v) => Ok(DefaultValue::Float(v)),
                    Err(_) => Err(self.err(format!("invalid floating-point literal '{}'", s))),
                }
            }
            Token::Str { value, .. } => {
                self.advance();
                Ok(DefaultValue::String(value))
            }
            Token::Word(_) => {
                // Enum constant, possibly qualified
                let name = self.parse_dotted_name()?;
                Ok(DefaultValue::Enum(name))
            }
            _ => Err(self.err(format!("expected default value, got {:?}", self.peek()))),
        }
    }
}
