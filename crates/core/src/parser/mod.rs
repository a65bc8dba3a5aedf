//! Recursive-descent parser: token stream to typed AST.
//!
//! All declarations carry provenance (file, line, column of the opening
//! keyword). The builder policies are applied during the descent: struct
//! fields are reordered by ordinal, `= nothing` wraps the declared type
//! in `Maybe`, and single-segment names bound in the enclosing generic
//! scope become `Parameter` references. No symbol resolution happens
//! here -- that is the semantic passes' job.

use crate::ast::{Attribute, Declaration, Namespace, Provenance, TypeParam};
use crate::error::ParseError;
use crate::lexer::{Spanned, Token};

mod declarations;
mod fields;
mod types;

/// An import statement of one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub path: String,
    pub prov: Provenance,
}

/// The parse of a single Bond file, before semantic analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    pub imports: Vec<Import>,
    pub namespaces: Vec<Namespace>,
    pub declarations: Vec<Declaration>,
}

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

pub(crate) struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    filename: String,
    /// Namespaces of the file being parsed; attached to every declaration.
    namespaces: Vec<Namespace>,
    /// Stack of generic parameter lists currently in scope.
    param_scope: Vec<Vec<TypeParam>>,
}

/// Parse a lexed file. The first error terminates the parse; no AST is
/// produced for a file that fails to parse.
pub fn parse(tokens: &[Spanned], filename: &str) -> Result<ParsedFile, ParseError> {
    let mut p = Parser::new(tokens, filename);
    p.parse_file()
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned], filename: &str) -> Self {
        Parser {
            tokens,
            pos: 0,
            filename: filename.to_owned(),
            namespaces: Vec::new(),
            param_scope: Vec::new(),
        }
    }

    // -- Token access -------------------------------------------

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(super) fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn cur_line(&self) -> u32 {
        self.cur().line
    }

    fn cur_column(&self) -> u32 {
        self.cur().column
    }

    pub(super) fn advance(&mut self) -> &Spanned {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    /// Provenance of the current token.
    pub(super) fn prov(&self) -> Provenance {
        Provenance {
            file: self.filename.clone(),
            line: self.cur_line(),
            column: self.cur_column(),
        }
    }

    /// Error at the current position. An error token placed here by the
    /// lexer surfaces as a lexical diagnostic with the lexer's message.
    pub(super) fn err(&self, msg: impl Into<String>) -> ParseError {
        if let Token::Error(lex_msg) = self.peek() {
            return ParseError::lexical(
                &self.filename,
                self.cur_line(),
                self.cur_column(),
                lex_msg.clone(),
            );
        }
        ParseError::syntax(&self.filename, self.cur_line(), self.cur_column(), msg)
    }

    // -- Expectation helpers ------------------------------------

    pub(super) fn is_word(&self, w: &str) -> bool {
        matches!(self.peek(), Token::Word(x) if x == w)
    }

    pub(super) fn take_word(&mut self) -> Result<String, ParseError> {
        if let Token::Word(w) = self.peek().clone() {
            self.advance();
            Ok(w)
        } else {
            Err(self.err(format!("expected identifier, got {:?}", self.peek())))
        }
    }

    pub(super) fn take_str(&mut self) -> Result<String, ParseError> {
        if let Token::Str { value, .. } = self.peek().clone() {
            self.advance();
            Ok(value)
        } else {
            Err(self.err(format!("expected string literal, got {:?}", self.peek())))
        }
    }

    pub(super) fn take_int(&mut self) -> Result<i64, ParseError> {
        if let Token::Int(n) = self.peek() {
            let n = *n;
            self.advance();
            Ok(n)
        } else {
            Err(self.err(format!("expected integer literal, got {:?}", self.peek())))
        }
    }

    pub(super) fn expect_word(&mut self, expected: &str) -> Result<(), ParseError> {
        if self.is_word(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected '{}', got {:?}", expected, self.peek())))
        }
    }

    fn expect_token(&mut self, expected: Token, what: &str) -> Result<(), ParseError> {
        if self.peek() == &expected {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected '{}', got {:?}", what, self.peek())))
        }
    }

    pub(super) fn expect_lbrace(&mut self) -> Result<(), ParseError> {
        self.expect_token(Token::LBrace, "{")
    }

    pub(super) fn expect_rbrace(&mut self) -> Result<(), ParseError> {
        self.expect_token(Token::RBrace, "}")
    }

    pub(super) fn expect_lparen(&mut self) -> Result<(), ParseError> {
        self.expect_token(Token::LParen, "(")
    }

    pub(super) fn expect_rparen(&mut self) -> Result<(), ParseError> {
        self.expect_token(Token::RParen, ")")
    }

    pub(super) fn expect_rbracket(&mut self) -> Result<(), ParseError> {
        self.expect_token(Token::RBracket, "]")
    }

    pub(super) fn expect_lt(&mut self) -> Result<(), ParseError> {
        self.expect_token(Token::Lt, "<")
    }

    pub(super) fn expect_gt(&mut self) -> Result<(), ParseError> {
        self.expect_token(Token::Gt, ">")
    }

    pub(super) fn expect_colon(&mut self) -> Result<(), ParseError> {
        self.expect_token(Token::Colon, ":")
    }

    pub(super) fn expect_comma(&mut self) -> Result<(), ParseError> {
        self.expect_token(Token::Comma, ",")
    }

    pub(super) fn expect_semi(&mut self) -> Result<(), ParseError> {
        self.expect_token(Token::Semi, ";")
    }

    /// Consume a `;` if present. Trailing semicolons on namespaces,
    /// structs, enums, and services are optional.
    pub(super) fn eat_semi(&mut self) {
        if self.peek() == &Token::Semi {
            self.advance();
        }
    }

    // -- Generic scope ------------------------------------------

    pub(super) fn push_params(&mut self, params: &[TypeParam]) {
        self.param_scope.push(params.to_vec());
    }

    pub(super) fn pop_params(&mut self) {
        self.param_scope.pop();
    }

    pub(super) fn lookup_param(&self, name: &str) -> Option<TypeParam> {
        self.param_scope
            .iter()
            .rev()
            .flat_map(|scope| scope.iter())
            .find(|p| p.name == name)
            .cloned()
    }

    pub(super) fn file_namespaces(&self) -> Vec<Namespace> {
        self.namespaces.clone()
    }

    // -- File structure -----------------------------------------

    /// bond := import* namespace+ declaration*
    fn parse_file(&mut self) -> Result<ParsedFile, ParseError> {
        let mut imports = Vec::new();
        while self.is_word("import") {
            let prov = self.prov();
            self.advance();
            let path = self.take_str()?;
            self.eat_semi();
            imports.push(Import { path, prov });
        }

        let mut namespaces = Vec::new();
        while self.is_word("namespace") {
            self.advance();
            namespaces.push(self.parse_namespace()?);
            self.eat_semi();
        }
        if namespaces.is_empty() {
            return Err(self.err("expected at least one namespace declaration"));
        }
        self.namespaces = namespaces.clone();

        let mut declarations = Vec::new();
        while self.peek() != &Token::Eof {
            declarations.push(self.parse_declaration()?);
        }

        Ok(ParsedFile {
            imports,
            namespaces,
            declarations,
        })
    }

    /// namespace := 'namespace' lang? qualified_name
    ///
    /// A leading language tag is only taken as a tag when another word
    /// follows that cannot start a declaration; `namespace cpp` on its
    /// own declares a namespace literally named "cpp".
    fn parse_namespace(&mut self) -> Result<Namespace, ParseError> {
        use crate::ast::Language;

        let first = self.take_word()?;
        let lang = Language::from_tag(&first);
        let tag_applies = lang.is_some()
            && matches!(
                self.peek(),
                Token::Word(w) if !matches!(
                    w.as_str(),
                    "import" | "namespace" | "struct" | "enum" | "service" | "using"
                )
            );
        if tag_applies {
            let name = self.parse_dotted_name()?;
            Ok(Namespace { lang, name })
        } else {
            let name = self.parse_dotted_tail(first)?;
            Ok(Namespace { lang: None, name })
        }
    }

    pub(super) fn parse_dotted_name(&mut self) -> Result<String, ParseError> {
        let first = self.take_word()?;
        self.parse_dotted_tail(first)
    }

    fn parse_dotted_tail(&mut self, first: String) -> Result<String, ParseError> {
        let mut name = first;
        while self.peek() == &Token::Dot {
            self.advance();
            name.push('.');
            name.push_str(&self.take_word()?);
        }
        Ok(name)
    }

    /// declaration := forward | alias | struct | enum | service
    fn parse_declaration(&mut self) -> Result<Declaration, ParseError> {
        let attrs = self.parse_attributes()?;
        match self.peek().clone() {
            Token::Word(w) => match w.as_str() {
                "using" => {
                    if !attrs.is_empty() {
                        return Err(self.err("attributes are not allowed on type aliases"));
                    }
                    self.parse_alias()
                }
                "struct" => self.parse_struct(attrs),
                "enum" => self.parse_enum(attrs),
                "service" => self.parse_service(attrs),
                other => Err(self.err(format!("unexpected token '{}'", other))),
            },
            _ => Err(self.err(format!(
                "expected declaration keyword, got {:?}",
                self.peek()
            ))),
        }
    }

    /// attrs := ('[' qualified_name '(' string_literal ')' ']')*
    pub(super) fn parse_attributes(&mut self) -> Result<Vec<Attribute>, ParseError> {
        let mut attrs = Vec::new();
        while self.peek() == &Token::LBracket {
            self.advance();
            let name = self.parse_dotted_name()?;
            self.expect_lparen()?;
            let value = self.take_str()?;
            self.expect_rparen()?;
            self.expect_rbracket()?;
            attrs.push(Attribute { name, value });
        }
        Ok(attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Language, Type};
    use crate::lexer;

    pub(crate) fn parse_src(src: &str) -> Result<ParsedFile, ParseError> {
        let out = lexer::lex(src);
        parse(&out.tokens, "test.bond")
    }

    #[test]
    fn file_requires_a_namespace() {
        let err = parse_src("struct Foo {}").unwrap_err();
        assert!(err.message.contains("namespace"));
    }

    #[test]
    fn imports_precede_namespaces() {
        let file = parse_src("import \"common.bond\"; namespace tests").unwrap();
        assert_eq!(file.imports.len(), 1);
        assert_eq!(file.imports[0].path, "common.bond");
        assert_eq!(file.namespaces.len(), 1);
        assert_eq!(file.namespaces[0].name, "tests");
    }

    #[test]
    fn language_qualified_namespaces_coexist() {
        let file = parse_src("namespace cpp tests.one\nnamespace csharp Tests.One").unwrap();
        assert_eq!(file.namespaces.len(), 2);
        assert_eq!(file.namespaces[0].lang, Some(Language::Cpp));
        assert_eq!(file.namespaces[0].name, "tests.one");
        assert_eq!(file.namespaces[1].lang, Some(Language::Cs));
    }

    #[test]
    fn bare_language_word_is_a_namespace_name() {
        let file = parse_src("namespace cpp\nstruct Foo {}").unwrap();
        assert_eq!(file.namespaces[0].lang, None);
        assert_eq!(file.namespaces[0].name, "cpp");
        assert_eq!(file.declarations.len(), 1);
    }

    #[test]
    fn attributes_apply_to_the_next_declaration() {
        let file =
            parse_src("namespace t\n[Validate(\"required\")]\nstruct Foo {}").unwrap();
        match &file.declarations[0] {
            Declaration::Struct { attributes, .. } => {
                assert_eq!(attributes.len(), 1);
                assert_eq!(attributes[0].name, "Validate");
                assert_eq!(attributes[0].value, "required");
            }
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn declarations_carry_file_namespaces() {
        let file = parse_src("namespace a.b\nenum E { V }").unwrap();
        assert_eq!(file.declarations[0].namespaces()[0].name, "a.b");
    }

    #[test]
    fn lexical_error_surfaces_through_parse() {
        let err = parse_src("namespace t\nstruct \"oops").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::LexicalError);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn generic_parameter_becomes_parameter_reference() {
        let file = parse_src("namespace t\nstruct Box<T> { 0: optional T item; }").unwrap();
        match &file.declarations[0] {
            Declaration::Struct { params, fields, .. } => {
                assert_eq!(params.len(), 1);
                assert_eq!(params[0].name, "T");
                assert!(matches!(&fields[0].ty, Type::Parameter(p) if p.name == "T"));
            }
            other => panic!("expected struct, got {:?}", other),
        }
    }
}
