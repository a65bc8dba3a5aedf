use super::Parser;
use crate::ast::{Attribute, Declaration, EnumConstant, Method, MethodType};
use crate::error::ParseError;
use crate::lexer::Token;

impl<'a> Parser<'a> {
    // -- Alias --------------------------------------------------

    /// alias := 'using' ident type_params? '=' type ';'
    pub(super) fn parse_alias(&mut self) -> Result<Declaration, ParseError> {
        let prov = self.prov();
        self.advance();
        let name = self.take_word()?;
        let params = self.parse_type_params()?;
        self.push_params(&params);
        let result = (|| {
            if self.peek() != &Token::Eq {
                return Err(self.err(format!("expected '=', got {:?}", self.peek())));
            }
            self.advance();
            let aliased = self.parse_type()?;
            self.expect_semi()?;
            Ok(aliased)
        })();
        self.pop_params();
        let aliased = result?;
        Ok(Declaration::Alias {
            name,
            namespaces: self.file_namespaces(),
            params,
            aliased,
            prov,
        })
    }

    // -- Struct / forward / view --------------------------------

    /// struct := attrs? 'struct' ident type_params? (';' | view | def)
    pub(super) fn parse_struct(
        &mut self,
        attributes: Vec<Attribute>,
    ) -> Result<Declaration, ParseError> {
        let prov = self.prov();
        self.advance();
        let name = self.take_word()?;
        let params = self.parse_type_params()?;

        // forward := 'struct' ident type_params? ';'
        if self.peek() == &Token::Semi {
            if !attributes.is_empty() {
                return Err(self.err("attributes are not allowed on forward declarations"));
            }
            self.advance();
            return Ok(Declaration::Forward {
                name,
                namespaces: self.file_namespaces(),
                params,
                prov,
            });
        }

        // Views are accepted by the grammar but not supported: reject
        // explicitly rather than emit an empty struct.
        if self.is_word("view_of") {
            return Err(self.err("view_of declarations are not supported"));
        }

        self.push_params(&params);
        let result = (|| {
            let base = if self.peek() == &Token::Colon {
                self.advance();
                Some(self.parse_type()?)
            } else {
                None
            };
            self.expect_lbrace()?;
            let mut fields = Vec::new();
            while self.peek() != &Token::RBrace {
                let field = self.parse_field()?;
                self.expect_semi()?;
                fields.push(field);
            }
            self.expect_rbrace()?;
            self.eat_semi();
            // Ordinal order is the struct's canonical field order; the
            // sort is stable so duplicate ordinals keep source order
            // for the validator to report.
            fields.sort_by_key(|f| f.ordinal);
            Ok((base, fields))
        })();
        self.pop_params();
        let (base, fields) = result?;

        Ok(Declaration::Struct {
            name,
            namespaces: self.file_namespaces(),
            params,
            base,
            fields,
            attributes,
            prov,
        })
    }

    // -- Enum ---------------------------------------------------

    /// enum := attrs? 'enum' ident '{' constant (sep constant)* sep? '}' ';'?
    pub(super) fn parse_enum(
        &mut self,
        attributes: Vec<Attribute>,
    ) -> Result<Declaration, ParseError> {
        let prov = self.prov();
        self.advance();
        let name = self.take_word()?;
        self.expect_lbrace()?;

        let mut constants = Vec::new();
        while self.peek() != &Token::RBrace {
            let const_prov = self.prov();
            let cname = self.take_word()?;
            let value = if self.peek() == &Token::Eq {
                self.advance();
                Some(self.take_int()?)
            } else {
                None
            };
            constants.push(EnumConstant {
                name: cname,
                value,
                prov: const_prov,
            });
            match self.peek() {
                Token::Comma | Token::Semi => {
                    self.advance();
                }
                Token::RBrace => {}
                _ => {
                    return Err(self.err(format!(
                        "expected ',' or ';' or '}}', got {:?}",
                        self.peek()
                    )))
                }
            }
        }
        self.expect_rbrace()?;
        self.eat_semi();

        if constants.is_empty() {
            return Err(self.err(format!("enum '{}' has no constants", name)));
        }

        Ok(Declaration::Enum {
            name,
            namespaces: self.file_namespaces(),
            constants,
            attributes,
            prov,
        })
    }

    // -- Service ------------------------------------------------

    /// service := attrs? 'service' ident type_params? (':' type)?
    ///            '{' method* '}' ';'?
    pub(super) fn parse_service(
        &mut self,
        attributes: Vec<Attribute>,
    ) -> Result<Declaration, ParseError> {
        let prov = self.prov();
        self.advance();
        let name = self.take_word()?;
        let params = self.parse_type_params()?;

        self.push_params(&params);
        let result = (|| {
            let base = if self.peek() == &Token::Colon {
                self.advance();
                Some(self.parse_type()?)
            } else {
                None
            };
            self.expect_lbrace()?;
            let mut methods = Vec::new();
            while self.peek() != &Token::RBrace {
                methods.push(self.parse_method()?);
            }
            self.expect_rbrace()?;
            self.eat_semi();
            Ok((base, methods))
        })();
        self.pop_params();
        let (base, methods) = result?;

        Ok(Declaration::Service {
            name,
            namespaces: self.file_namespaces(),
            params,
            base,
            methods,
            attributes,
            prov,
        })
    }

    /// method := attrs? ((result_type | 'nothing') ident '(' param? ')') ';'?
    fn parse_method(&mut self) -> Result<Method, ParseError> {
        let attributes = self.parse_attributes()?;
        let prov = self.prov();

        if self.is_word("nothing") {
            self.advance();
            let name = self.take_word()?;
            let input = self.parse_method_input()?;
            self.eat_semi();
            return Ok(Method::Event {
                name,
                input,
                attributes,
                prov,
            });
        }

        let result = if self.is_word("void") {
            self.advance();
            MethodType::Void
        } else if self.is_word("stream") {
            self.advance();
            MethodType::Streaming(self.parse_type()?)
        } else {
            MethodType::Unary(self.parse_type()?)
        };
        let name = self.take_word()?;
        let input = self.parse_method_input()?;
        self.eat_semi();
        Ok(Method::Function {
            name,
            result,
            input,
            attributes,
            prov,
        })
    }

    /// param := 'void' | 'stream'? type ident?
    fn parse_method_input(&mut self) -> Result<MethodType, ParseError> {
        self.expect_lparen()?;
        if self.peek() == &Token::RParen {
            self.advance();
            return Ok(MethodType::Void);
        }
        if self.is_word("void") {
            self.advance();
            self.expect_rparen()?;
            return Ok(MethodType::Void);
        }
        let streaming = if self.is_word("stream") {
            self.advance();
            true
        } else {
            false
        };
        let ty = self.parse_type()?;
        // Optional parameter name, discarded
        if matches!(self.peek(), Token::Word(_)) {
            self.advance();
        }
        self.expect_rparen()?;
        Ok(if streaming {
            MethodType::Streaming(ty)
        } else {
            MethodType::Unary(ty)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse_src;
    use crate::ast::{Declaration, Method, MethodType, Type};

    #[test]
    fn forward_declaration_parses() {
        let file = parse_src("namespace t\nstruct Node;").unwrap();
        match &file.declarations[0] {
            Declaration::Forward { name, params, .. } => {
                assert_eq!(name, "Node");
                assert!(params.is_empty());
            }
            other => panic!("expected forward, got {:?}", other),
        }
    }

    #[test]
    fn generic_forward_keeps_parameters() {
        let file = parse_src("namespace t\nstruct Box<T>;").unwrap();
        match &file.declarations[0] {
            Declaration::Forward { params, .. } => {
                assert_eq!(params.len(), 1);
                assert_eq!(params[0].name, "T");
            }
            other => panic!("expected forward, got {:?}", other),
        }
    }

    #[test]
    fn view_of_is_rejected_explicitly() {
        let err =
            parse_src("namespace t\nstruct V view_of Base { a, b };").unwrap_err();
        assert!(err.message.contains("view_of"));
        assert!(err.message.contains("not supported"));
    }

    #[test]
    fn struct_base_type_parses() {
        let file = parse_src("namespace t\nstruct Derived : Base { }").unwrap();
        match &file.declarations[0] {
            Declaration::Struct { base: Some(b), .. } => {
                assert!(matches!(b, Type::Unresolved { name, .. } if name == "Base"));
            }
            other => panic!("expected struct with base, got {:?}", other),
        }
    }

    #[test]
    fn value_constraint_parses() {
        let file = parse_src("namespace t\nstruct Box<T : value> { }").unwrap();
        match &file.declarations[0] {
            Declaration::Struct { params, .. } => {
                assert!(params[0].value_constraint);
            }
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn alias_of_generic_type_parses() {
        let file = parse_src("namespace t\nusing Items<T> = vector<T>;").unwrap();
        match &file.declarations[0] {
            Declaration::Alias {
                name,
                params,
                aliased,
                ..
            } => {
                assert_eq!(name, "Items");
                assert_eq!(params.len(), 1);
                assert!(
                    matches!(aliased, Type::Vector(el) if matches!(&**el, Type::Parameter(p) if p.name == "T"))
                );
            }
            other => panic!("expected alias, got {:?}", other),
        }
    }

    #[test]
    fn alias_requires_trailing_semicolon() {
        assert!(parse_src("namespace t\nusing S = string").is_err());
    }

    #[test]
    fn enum_constants_accept_both_separators_and_trailing() {
        let file = parse_src("namespace t\nenum E { A, B; C = 10, }").unwrap();
        match &file.declarations[0] {
            Declaration::Enum { constants, .. } => {
                assert_eq!(constants.len(), 3);
                assert_eq!(constants[2].value, Some(10));
            }
            other => panic!("expected enum, got {:?}", other),
        }
    }

    #[test]
    fn empty_enum_is_rejected() {
        let err = parse_src("namespace t\nenum E { }").unwrap_err();
        assert!(err.message.contains("no constants"));
    }

    #[test]
    fn service_methods_parse() {
        let file = parse_src(
            "namespace t\nservice Calc {\n  Result Add(Operands operands);\n  void Reset();\n  nothing Log(Entry);\n  stream Reply Subscribe(stream Query q);\n}",
        )
        .unwrap();
        match &file.declarations[0] {
            Declaration::Service { methods, .. } => {
                assert_eq!(methods.len(), 4);
                match &methods[0] {
                    Method::Function { result, input, .. } => {
                        assert!(matches!(result, MethodType::Unary(_)));
                        assert!(matches!(input, MethodType::Unary(_)));
                    }
                    other => panic!("expected function, got {:?}", other),
                }
                match &methods[1] {
                    Method::Function { result, input, .. } => {
                        assert_eq!(result, &MethodType::Void);
                        assert_eq!(input, &MethodType::Void);
                    }
                    other => panic!("expected function, got {:?}", other),
                }
                assert!(matches!(&methods[2], Method::Event { .. }));
                match &methods[3] {
                    Method::Function { result, input, .. } => {
                        assert!(matches!(result, MethodType::Streaming(_)));
                        assert!(matches!(input, MethodType::Streaming(_)));
                    }
                    other => panic!("expected function, got {:?}", other),
                }
            }
            other => panic!("expected service, got {:?}", other),
        }
    }

    #[test]
    fn service_base_parses() {
        let file = parse_src("namespace t\nservice Extended : BaseService { }").unwrap();
        match &file.declarations[0] {
            Declaration::Service { base: Some(b), .. } => {
                assert!(matches!(b, Type::Unresolved { name, .. } if name == "BaseService"));
            }
            other => panic!("expected service with base, got {:?}", other),
        }
    }

    #[test]
    fn map_and_nested_generics_parse() {
        let file = parse_src(
            "namespace t\nstruct S { 0: optional map<string, vector<int32>> m; }",
        )
        .unwrap();
        match &file.declarations[0] {
            Declaration::Struct { fields, .. } => match &fields[0].ty {
                Type::Map(k, v) => {
                    assert_eq!(**k, Type::String);
                    assert!(matches!(&**v, Type::Vector(el) if **el == Type::Int32));
                }
                other => panic!("expected map, got {:?}", other),
            },
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn integer_generic_argument_parses() {
        let file = parse_src("namespace t\nstruct S { 0: optional Fixed<16> f; }").unwrap();
        match &file.declarations[0] {
            Declaration::Struct { fields, .. } => match &fields[0].ty {
                Type::Unresolved { name, args } => {
                    assert_eq!(name, "Fixed");
                    assert_eq!(args[0], Type::IntLiteral(16));
                }
                other => panic!("expected unresolved, got {:?}", other),
            },
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn qualified_type_reference_parses() {
        let file =
            parse_src("namespace t\nstruct S { 0: optional other.ns.Widget w; }").unwrap();
        match &file.declarations[0] {
            Declaration::Struct { fields, .. } => {
                assert!(matches!(
                    &fields[0].ty,
                    Type::Unresolved { name, .. } if name == "other.ns.Widget"
                ));
            }
            other => panic!("expected struct, got {:?}", other),
        }
    }
}
