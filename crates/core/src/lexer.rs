//! Bond tokenizer.
//!
//! Whitespace and comments are routed to a hidden trivia channel so a
//! formatter can reconstruct source; the parser sees significant tokens
//! only. The lexer itself never fails: ill-formed input becomes
//! [`Token::Error`] entries that the parser reports through the shared
//! error channel.

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifiers and keywords -- distinguished in the parser
    Word(String),
    /// String literal, escapes resolved. `wide` is set for `L"..."`.
    Str { value: String, wide: bool },
    /// Integer literal (decimal or hex, optional leading sign)
    Int(i64),
    /// Floating-point literal -- kept as written, parsed by the builder
    Float(String),
    // Punctuation
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Lt,
    Gt,
    Semi,
    Colon,
    Comma,
    Dot,
    Eq,
    /// Lexical error at this position; reported by the parser layer
    Error(String),
    /// End of input
    Eof,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
    pub column: u32,
}

/// Hidden-channel token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriviaKind {
    Whitespace,
    LineComment,
    BlockComment,
}

/// A whitespace or comment run, with the position of its first character.
#[derive(Debug, Clone)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
    pub line: u32,
    pub column: u32,
}

/// Lexer output: the significant token stream plus the hidden channel.
#[derive(Debug, Clone, Default)]
pub struct LexOutput {
    pub tokens: Vec<Spanned>,
    pub trivia: Vec<Trivia>,
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    out: LexOutput,
}

pub fn lex(src: &str) -> LexOutput {
    let mut lx = Lexer {
        chars: src.chars().collect(),
        pos: 0,
        line: 1,
        column: 1,
        out: LexOutput::default(),
    };
    lx.run();
    lx.out
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Consume one character, keeping line and column current.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn emit(&mut self, token: Token, line: u32, column: u32) {
        self.out.tokens.push(Spanned {
            token,
            line,
            column,
        });
    }

    fn emit_trivia(&mut self, kind: TriviaKind, text: String, line: u32, column: u32) {
        self.out.trivia.push(Trivia {
            kind,
            text,
            line,
            column,
        });
    }

    fn run(&mut self) {
        while let Some(c) = self.peek() {
            let line = self.line;
            let column = self.column;

            // Whitespace run
            if c.is_whitespace() {
                let mut text = String::new();
                while let Some(w) = self.peek() {
                    if !w.is_whitespace() {
                        break;
                    }
                    text.push(w);
                    self.bump();
                }
                self.emit_trivia(TriviaKind::Whitespace, text, line, column);
                continue;
            }

            // Line comment
            if c == '/' && self.peek_at(1) == Some('/') {
                let mut text = String::new();
                while let Some(cc) = self.peek() {
                    if cc == '\n' {
                        break;
                    }
                    text.push(cc);
                    self.bump();
                }
                self.emit_trivia(TriviaKind::LineComment, text, line, column);
                continue;
            }

            // Block comment (no nesting)
            if c == '/' && self.peek_at(1) == Some('*') {
                let mut text = String::from("/*");
                self.bump();
                self.bump();
                loop {
                    match self.peek() {
                        None => {
                            self.emit(
                                Token::Error("unterminated block comment".to_owned()),
                                line,
                                column,
                            );
                            break;
                        }
                        Some('*') if self.peek_at(1) == Some('/') => {
                            self.bump();
                            self.bump();
                            text.push_str("*/");
                            self.emit_trivia(TriviaKind::BlockComment, text, line, column);
                            break;
                        }
                        Some(cc) => {
                            text.push(cc);
                            self.bump();
                        }
                    }
                }
                continue;
            }

            // Wide string prefix: `L` immediately followed by a quote
            if c == 'L' && self.peek_at(1) == Some('"') {
                self.bump();
                self.bump();
                self.scan_string(true, line, column);
                continue;
            }

            if c == '"' {
                self.bump();
                self.scan_string(false, line, column);
                continue;
            }

            // Number, with an optional leading sign glued to the digits
            if c.is_ascii_digit()
                || ((c == '-' || c == '+')
                    && self.peek_at(1).map(|d| d.is_ascii_digit()).unwrap_or(false))
            {
                self.scan_number(line, column);
                continue;
            }

            // Identifier / keyword
            if c.is_alphabetic() || c == '_' {
                let mut word = String::new();
                while let Some(w) = self.peek() {
                    if !(w.is_alphanumeric() || w == '_') {
                        break;
                    }
                    word.push(w);
                    self.bump();
                }
                self.emit(Token::Word(word), line, column);
                continue;
            }

            let punct = match c {
                '{' => Some(Token::LBrace),
                '}' => Some(Token::RBrace),
                '[' => Some(Token::LBracket),
                ']' => Some(Token::RBracket),
                '(' => Some(Token::LParen),
                ')' => Some(Token::RParen),
                '<' => Some(Token::Lt),
                '>' => Some(Token::Gt),
                ';' => Some(Token::Semi),
                ':' => Some(Token::Colon),
                ',' => Some(Token::Comma),
                '.' => Some(Token::Dot),
                '=' => Some(Token::Eq),
                _ => None,
            };
            match punct {
                Some(token) => {
                    self.bump();
                    self.emit(token, line, column);
                }
                None => {
                    self.bump();
                    self.emit(
                        Token::Error(format!("unexpected character '{}'", c)),
                        line,
                        column,
                    );
                }
            }
        }

        let line = self.line;
        let column = self.column;
        self.emit(Token::Eof, line, column);
    }

    /// Scan a string body after the opening quote, resolving escapes.
    fn scan_string(&mut self, wide: bool, line: u32, column: u32) {
        let mut value = String::new();
        loop {
            let c = match self.peek() {
                None | Some('\n') => {
                    self.emit(
                        Token::Error("unterminated string literal".to_owned()),
                        line,
                        column,
                    );
                    return;
                }
                Some(c) => c,
            };
            if c == '"' {
                self.bump();
                self.emit(Token::Str { value, wide }, line, column);
                return;
            }
            if c == '\\' {
                self.bump();
                match self.scan_escape() {
                    Ok(ch) => value.push(ch),
                    Err(msg) => {
                        self.emit(Token::Error(msg), line, column);
                        // Skip to the closing quote so the rest of the
                        // file still tokenizes.
                        while let Some(cc) = self.peek() {
                            if cc == '"' || cc == '\n' {
                                break;
                            }
                            self.bump();
                        }
                        if self.peek() == Some('"') {
                            self.bump();
                        }
                        return;
                    }
                }
                continue;
            }
            value.push(c);
            self.bump();
        }
    }

    /// Resolve one escape sequence after the backslash.
    fn scan_escape(&mut self) -> Result<char, String> {
        let c = self
            .bump()
            .ok_or_else(|| "unterminated escape in string literal".to_owned())?;
        match c {
            '\\' => Ok('\\'),
            '"' => Ok('"'),
            '\'' => Ok('\''),
            'b' => Ok('\u{0008}'),
            't' => Ok('\t'),
            'n' => Ok('\n'),
            'f' => Ok('\u{000C}'),
            'r' => Ok('\r'),
            'x' => self.scan_hex_escape(2),
            'u' => self.scan_hex_escape(4),
            'U' => self.scan_hex_escape(8),
            d if d.is_digit(8) => {
                // Octal \NNN, up to three digits including the first
                let mut v = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek() {
                        Some(o) if o.is_digit(8) => {
                            v = v * 8 + o.to_digit(8).unwrap_or(0);
                            self.bump();
                        }
                        _ => break,
                    }
                }
                char::from_u32(v).ok_or_else(|| format!("invalid octal escape \\{:o}", v))
            }
            other => Err(format!("invalid escape sequence '\\{}'", other)),
        }
    }

    fn scan_hex_escape(&mut self, digits: usize) -> Result<char, String> {
        let mut v: u32 = 0;
        for _ in 0..digits {
            let c = self
                .peek()
                .filter(|c| c.is_ascii_hexdigit())
                .ok_or_else(|| "invalid hex escape in string literal".to_owned())?;
            v = v
                .checked_mul(16)
                .and_then(|v| v.checked_add(c.to_digit(16).unwrap_or(0)))
                .ok_or_else(|| "hex escape out of range".to_owned())?;
            self.bump();
        }
        char::from_u32(v).ok_or_else(|| format!("hex escape U+{:X} is not a character", v))
    }

    fn scan_number(&mut self, line: u32, column: u32) {
        let mut text = String::new();
        if matches!(self.peek(), Some('-') | Some('+')) {
            // SAFETY: the match above guarantees a character is present
            text.push(self.bump().unwrap());
        }

        // Hex literal
        if self.peek() == Some('0')
            && matches!(self.peek_at(1), Some('x') | Some('X'))
            && self.peek_at(2).map(|c| c.is_ascii_hexdigit()).unwrap_or(false)
        {
            self.bump();
            self.bump();
            let mut digits = String::new();
            while let Some(c) = self.peek() {
                if !c.is_ascii_hexdigit() {
                    break;
                }
                digits.push(c);
                self.bump();
            }
            let negative = text.starts_with('-');
            let token = match i64::from_str_radix(&digits, 16) {
                Ok(v) => Token::Int(if negative { -v } else { v }),
                Err(_) => Token::Error(format!("hex literal '0x{}' out of range", digits)),
            };
            self.emit(token, line, column);
            return;
        }

        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            text.push(c);
            self.bump();
        }

        // Fractional part and exponent make it a float
        let mut is_float = false;
        if self.peek() == Some('.')
            && self.peek_at(1).map(|c| c.is_ascii_digit()).unwrap_or(false)
        {
            is_float = true;
            text.push('.');
            self.bump();
            while let Some(c) = self.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                text.push(c);
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign_len = match self.peek_at(1) {
                Some('+') | Some('-') => 1,
                _ => 0,
            };
            if self
                .peek_at(1 + sign_len)
                .map(|c| c.is_ascii_digit())
                .unwrap_or(false)
            {
                is_float = true;
                for _ in 0..(2 + sign_len) {
                    // SAFETY: presence checked by the peeks above
                    text.push(self.bump().unwrap());
                }
                while let Some(c) = self.peek() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    text.push(c);
                    self.bump();
                }
            }
        }

        let token = if is_float {
            Token::Float(text)
        } else {
            match text.parse::<i64>() {
                Ok(v) => Token::Int(v),
                Err(_) => Token::Error(format!("integer literal '{}' out of range", text)),
            }
        };
        self.emit(token, line, column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        lex(src).tokens.into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn punctuation_and_words() {
        let toks = tokens("struct Foo { }");
        assert_eq!(
            toks,
            vec![
                Token::Word("struct".to_owned()),
                Token::Word("Foo".to_owned()),
                Token::LBrace,
                Token::RBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn positions_are_one_based() {
        let out = lex("struct\n  Foo");
        assert_eq!((out.tokens[0].line, out.tokens[0].column), (1, 1));
        assert_eq!((out.tokens[1].line, out.tokens[1].column), (2, 3));
    }

    #[test]
    fn comments_go_to_the_hidden_channel() {
        let out = lex("// header\nstruct /* x */ Foo");
        let kinds: Vec<TriviaKind> = out.trivia.iter().map(|t| t.kind).collect();
        assert!(kinds.contains(&TriviaKind::LineComment));
        assert!(kinds.contains(&TriviaKind::BlockComment));
        assert!(kinds.contains(&TriviaKind::Whitespace));
        // Comments never surface as significant tokens
        assert_eq!(
            tokens("// header\nstruct /* x */ Foo"),
            vec![
                Token::Word("struct".to_owned()),
                Token::Word("Foo".to_owned()),
                Token::Eof,
            ]
        );
        assert_eq!(out.trivia[0].text, "// header");
    }

    #[test]
    fn integer_literals_decimal_hex_signed() {
        assert_eq!(
            tokens("10 0x1F -5 -0x10 +7"),
            vec![
                Token::Int(10),
                Token::Int(31),
                Token::Int(-5),
                Token::Int(-16),
                Token::Int(7),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn float_literals_keep_their_spelling() {
        assert_eq!(
            tokens("3.14 -0.5 2e10 1.5e-3"),
            vec![
                Token::Float("3.14".to_owned()),
                Token::Float("-0.5".to_owned()),
                Token::Float("2e10".to_owned()),
                Token::Float("1.5e-3".to_owned()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn integer_overflow_is_an_error_token() {
        let toks = tokens("99999999999999999999");
        assert!(matches!(&toks[0], Token::Error(m) if m.contains("out of range")));
    }

    #[test]
    fn string_escapes_resolve() {
        assert_eq!(
            tokens(r#""a\tb\n\x41B\101""#),
            vec![
                Token::Str {
                    value: "a\tb\nABA".to_owned(),
                    wide: false
                },
                Token::Eof,
            ]
        );
    }

    #[test]
    fn wide_string_prefix_is_flagged_and_discarded() {
        assert_eq!(
            tokens(r#"L"wide""#),
            vec![
                Token::Str {
                    value: "wide".to_owned(),
                    wide: true
                },
                Token::Eof,
            ]
        );
        // A word starting with L is still a word
        assert_eq!(
            tokens("List"),
            vec![Token::Word("List".to_owned()), Token::Eof]
        );
    }

    #[test]
    fn unterminated_string_is_an_error_token_not_a_panic() {
        let toks = tokens("\"abc\nstruct");
        assert!(matches!(&toks[0], Token::Error(m) if m.contains("unterminated")));
        // Lexing continues on the next line
        assert!(toks.contains(&Token::Word("struct".to_owned())));
    }

    #[test]
    fn bad_escape_is_an_error_token() {
        let toks = tokens(r#""a\qb""#);
        assert!(matches!(&toks[0], Token::Error(m) if m.contains("escape")));
    }

    #[test]
    fn unterminated_block_comment_is_an_error_token() {
        let toks = tokens("/* never closed");
        assert!(matches!(&toks[0], Token::Error(m) if m.contains("block comment")));
    }

    #[test]
    fn angle_brackets_lex_individually() {
        assert_eq!(
            tokens("map<string, list<int32>>"),
            vec![
                Token::Word("map".to_owned()),
                Token::Lt,
                Token::Word("string".to_owned()),
                Token::Comma,
                Token::Word("list".to_owned()),
                Token::Lt,
                Token::Word("int32".to_owned()),
                Token::Gt,
                Token::Gt,
                Token::Eof,
            ]
        );
    }
}
