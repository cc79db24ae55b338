// ABOUTME: Error types for template parsing and rendering
// ABOUTME: Defines the failure modes surfaced by the templating engine

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Malformed control block: {0}")]
    MalformedBlock(String),

    #[error("Missing {{% endfor %}} for loop opened at byte {start}")]
    UnterminatedBlock { start: usize },

    #[error("Unterminated substitution marker starting at byte {pos}")]
    MalformedMarker { pos: usize },

    #[error("variable '{0}' already exists in this context")]
    AlreadyBound(String),

    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("Variable '{name}' is a {found}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, TemplateError>;
