//! Schema change records -- the compatibility checker's output type.

use bond_core::Provenance;
use serde::Serialize;
use std::fmt;

/// Effect of a schema change on the wire protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeCategory {
    /// Safe for binary and text protocols alike.
    Compatible,
    /// Unsafe for ordinal-keyed binary encodings (Compact Binary,
    /// Fast Binary).
    BreakingWire,
    /// Safe for binary encodings but unsafe for name-keyed text
    /// encodings (SimpleJSON, SimpleXML).
    BreakingText,
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeCategory::Compatible => write!(f, "COMPATIBLE"),
            ChangeCategory::BreakingWire => write!(f, "BREAKING_WIRE"),
            ChangeCategory::BreakingText => write!(f, "BREAKING_TEXT"),
        }
    }
}

/// One classified structural difference between two schemas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaChange {
    pub category: ChangeCategory,
    pub description: String,
    pub location: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl SchemaChange {
    pub fn new(
        category: ChangeCategory,
        description: impl Into<String>,
        location: &Provenance,
    ) -> Self {
        SchemaChange {
            category,
            description: description.into(),
            location: location.clone(),
            recommendation: None,
        }
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }
}

/// Format a change set as human-readable text, one line per change.
pub fn format_changes(changes: &[SchemaChange]) -> String {
    let mut lines = Vec::with_capacity(changes.len());
    for c in changes {
        let mut line = format!(
            "{} {}:{}: {}",
            c.category, c.location.file, c.location.line, c.description
        );
        if let Some(rec) = &c.recommendation {
            line.push_str(&format!(" ({})", rec));
        }
        lines.push(line);
    }
    lines.join("\n")
}
