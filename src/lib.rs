// ABOUTME: Main library module for the textloom templating engine
// ABOUTME: Exports all core modules and provides the public API

pub mod env;
pub mod error;
pub mod parser;
pub mod section;
pub mod template;
pub mod value;

// Re-export commonly used types
pub use env::Environment;
pub use error::{Result, TemplateError};
pub use section::{Bound, Section};
pub use template::Template;
pub use value::Value;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
