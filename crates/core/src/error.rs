use crate::ast::Provenance;
use serde::Serialize;
use std::fmt;

/// Kind of a front-end diagnostic. Lexical, syntactic, and semantic
/// failures all travel through the same [`ParseError`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    LexicalError,
    SyntaxError,
    DuplicateDeclaration,
    DuplicateField,
    DuplicateOrdinal,
    DuplicateMethod,
    DuplicateConstant,
    UnresolvedType,
    InvalidDefault,
    RequiredDefault,
    InvalidKeyType,
    InvalidStructDefault,
    IllegalInheritance,
    IllegalEventInput,
    ImportFailure,
    ResolutionDivergence,
    Cancelled,
}

/// A front-end error with source attribution. Line and column are
/// 1-based; a zero line means the location is unknown (for example an
/// import the resolver could not open).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseError {
    pub kind: ErrorKind,
    #[serde(rename = "file_path", skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl ParseError {
    pub fn new(
        kind: ErrorKind,
        file: Option<&str>,
        line: u32,
        column: u32,
        message: impl Into<String>,
    ) -> Self {
        ParseError {
            kind,
            file: file.map(str::to_owned),
            line,
            column,
            message: message.into(),
        }
    }

    pub fn lexical(file: &str, line: u32, column: u32, message: impl Into<String>) -> Self {
        ParseError::new(ErrorKind::LexicalError, Some(file), line, column, message)
    }

    pub fn syntax(file: &str, line: u32, column: u32, message: impl Into<String>) -> Self {
        ParseError::new(ErrorKind::SyntaxError, Some(file), line, column, message)
    }

    /// Semantic error attributed to a declaration, field, constant, or
    /// method location.
    pub fn semantic(kind: ErrorKind, prov: &Provenance, message: impl Into<String>) -> Self {
        ParseError::new(kind, Some(&prov.file), prov.line, prov.column, message)
    }

    pub fn import_failure(file: &str, line: u32, column: u32, message: impl Into<String>) -> Self {
        ParseError::new(ErrorKind::ImportFailure, Some(file), line, column, message)
    }

    pub fn cancelled() -> Self {
        ParseError::new(ErrorKind::Cancelled, None, 0, 0, "compilation cancelled")
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(
                f,
                "{}:{}:{}: {:?}: {}",
                file, self.line, self.column, self.kind, self.message
            ),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location_and_kind() {
        let err = ParseError::syntax("a.bond", 3, 7, "expected '{'");
        let text = err.to_string();
        assert!(text.contains("a.bond:3:7"));
        assert!(text.contains("SyntaxError"));
        assert!(text.contains("expected '{'"));
    }

    #[test]
    fn serializes_file_as_file_path() {
        let err = ParseError::lexical("a.bond", 1, 2, "unterminated string literal");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["file_path"], "a.bond");
        assert_eq!(json["line"], 1);
        assert_eq!(json["column"], 2);
    }

    #[test]
    fn cancelled_has_no_file() {
        let err = ParseError::cancelled();
        let json = serde_json::to_value(&err).unwrap();
        assert!(json.get("file_path").is_none());
    }
}
