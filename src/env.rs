// ABOUTME: Environment holding variable bindings during rendering
// ABOUTME: Global bindings plus a stack of loop-variable frames

use std::collections::HashMap;

use crate::error::{Result, TemplateError};
use crate::value::Value;

/// One loop-variable binding, pushed at loop entry and popped at loop exit.
#[derive(Debug, Clone)]
struct Frame {
    name: String,
    value: Value,
}

/// The live mapping from variable name to value during a render call.
///
/// Top-level bindings set through [`Environment::set`] may be freely
/// overwritten. Loop bindings live in frames: pushing a frame for a name
/// that is already bound anywhere is a hard error, which is what makes
/// shadowing impossible, and popping the frame restores the pre-loop
/// environment structurally.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    globals: HashMap<String, Value>,
    frames: Vec<Frame>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a top-level binding, overwriting any previous one of that name
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    /// Look up a binding, innermost loop frame first
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames
            .iter()
            .rev()
            .find(|frame| frame.name == name)
            .map(|frame| &frame.value)
            .or_else(|| self.globals.get(name))
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.frames.iter().any(|frame| frame.name == name) || self.globals.contains_key(name)
    }

    /// Push a loop-variable frame. Fails if the name is bound anywhere.
    pub fn push_frame(&mut self, name: &str, value: Value) -> Result<()> {
        if self.is_bound(name) {
            return Err(TemplateError::AlreadyBound(name.to_string()));
        }
        self.frames.push(Frame {
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    /// Replace the innermost frame's value (per-iteration loop update)
    pub fn set_frame_value(&mut self, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.value = value;
        }
    }

    /// Pop the innermost loop-variable frame
    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }
}
