// ABOUTME: Template facade owning the source text, environment, and parsed tree
// ABOUTME: Provides value binding, memoized parsing, and the render entry point

use tracing::debug;

use crate::env::Environment;
use crate::error::Result;
use crate::parser;
use crate::section::Section;
use crate::value::Value;

/// A template plus the values it renders against.
///
/// The source is parsed on the first `render()` (or `debug_dump()`) call and
/// the tree is reused afterwards, so repeated renders with updated bindings
/// only pay for the tree walk.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    environment: Environment,
    root: Option<Section>,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            environment: Environment::new(),
            root: None,
        }
    }

    /// Bind a top-level value, overwriting any previous binding of that name.
    /// Chainable.
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.environment.set(name, value.into());
        self
    }

    /// Render the template against the current bindings
    pub fn render(&mut self) -> Result<String> {
        let root = Self::parsed_root(&mut self.root, &self.source)?;
        root.render(&mut self.environment)
    }

    /// Indented dump of the parsed section tree, diagnostic only
    pub fn debug_dump(&mut self) -> Result<String> {
        Ok(Self::parsed_root(&mut self.root, &self.source)?.dump())
    }

    /// Parse the source on first use; later calls reuse the memoized tree
    fn parsed_root<'a>(slot: &'a mut Option<Section>, source: &str) -> Result<&'a Section> {
        let root = match slot.take() {
            Some(root) => root,
            None => {
                debug!(source_len = source.len(), "parsing template source");
                parser::parse(source)?
            }
        };
        Ok(slot.insert(root))
    }
}
