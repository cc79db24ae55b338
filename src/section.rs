// ABOUTME: Section tree produced by parsing a template
// ABOUTME: Implements rendering, variable substitution, and the debug dump

use std::fmt;

use tracing::trace;

use crate::env::Environment;
use crate::error::{Result, TemplateError};
use crate::value::Value;

/// One end of a numeric `range(..)` loop header.
///
/// Literal bounds are fixed at parse time; variable bounds are resolved from
/// the environment each time the loop header is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Literal(i64),
    Var(String),
}

impl Bound {
    fn resolve(&self, env: &Environment) -> Result<i64> {
        match self {
            Bound::Literal(n) => Ok(*n),
            Bound::Var(name) => match env.get(name) {
                Some(Value::Int(n)) => Ok(*n),
                Some(other) => Err(TemplateError::TypeMismatch {
                    name: name.clone(),
                    expected: "integer",
                    found: other.kind(),
                }),
                None => Err(TemplateError::UndefinedVariable(name.clone())),
            },
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Literal(n) => write!(f, "{}", n),
            Bound::Var(name) => write!(f, "{}", name),
        }
    }
}

/// A node in the parsed template tree.
///
/// `Code` holds a literal slice of the source (substitution markers are
/// resolved at render time, not parse time). Loop bodies are wrapped in a
/// `Container` carrying the body's `[start, end)` byte span.
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Root {
        children: Vec<Section>,
    },
    Container {
        start: usize,
        end: usize,
        children: Vec<Section>,
    },
    Code {
        start: usize,
        end: usize,
        text: String,
    },
    For {
        var: String,
        from: Bound,
        to: Bound,
        body: Box<Section>,
    },
    ForEach {
        var: String,
        seq: String,
        body: Box<Section>,
    },
}

impl Section {
    /// Render this section against the current environment.
    ///
    /// Loop sections push one binding frame per activation, update it per
    /// iteration, and pop it on both the success and the error path so the
    /// pre-loop environment is always restored.
    pub fn render(&self, env: &mut Environment) -> Result<String> {
        match self {
            Section::Root { children } | Section::Container { children, .. } => {
                let mut out = String::new();
                for child in children {
                    out.push_str(&child.render(env)?);
                }
                Ok(out)
            }
            Section::Code { start, text, .. } => substitute(text, *start, env),
            Section::For {
                var,
                from,
                to,
                body,
            } => {
                let lo = from.resolve(env)?;
                let hi = to.resolve(env)?;
                trace!(var = %var, lo, hi, "rendering numeric loop");
                env.push_frame(var, Value::Int(lo))?;
                let mut out = String::new();
                let mut failure = None;
                for i in lo..hi {
                    env.set_frame_value(Value::Int(i));
                    match body.render(env) {
                        Ok(chunk) => out.push_str(&chunk),
                        Err(err) => {
                            failure = Some(err);
                            break;
                        }
                    }
                }
                env.pop_frame();
                match failure {
                    Some(err) => Err(err),
                    None => Ok(out),
                }
            }
            Section::ForEach { var, seq, body } => {
                let values = match env.get(seq) {
                    Some(Value::TextSeq(values)) => values.clone(),
                    Some(other) => {
                        return Err(TemplateError::TypeMismatch {
                            name: seq.clone(),
                            expected: "string sequence",
                            found: other.kind(),
                        })
                    }
                    None => return Err(TemplateError::UndefinedVariable(seq.clone())),
                };
                trace!(var = %var, seq = %seq, len = values.len(), "rendering sequence loop");
                env.push_frame(var, Value::Text(String::new()))?;
                let mut out = String::new();
                let mut failure = None;
                for element in values.iter() {
                    env.set_frame_value(Value::Text(element.clone()));
                    match body.render(env) {
                        Ok(chunk) => out.push_str(&chunk),
                        Err(err) => {
                            failure = Some(err);
                            break;
                        }
                    }
                }
                env.pop_frame();
                match failure {
                    Some(err) => Err(err),
                    None => Ok(out),
                }
            }
        }
    }

    /// Indented tree dump, diagnostic only
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, "");
        out
    }

    fn dump_into(&self, out: &mut String, prefix: &str) {
        let nested = format!("{}    ", prefix);
        match self {
            Section::Root { children } => {
                out.push_str(&format!("{}Root {{\n", prefix));
                for child in children {
                    child.dump_into(out, &nested);
                }
                out.push_str(&format!("{}}}\n", prefix));
            }
            Section::Container {
                start,
                end,
                children,
            } => {
                out.push_str(&format!("{}Container ( {}, {} ) {{\n", prefix, start, end));
                for child in children {
                    child.dump_into(out, &nested);
                }
                out.push_str(&format!("{}}}\n", prefix));
            }
            Section::Code { start, end, .. } => {
                out.push_str(&format!("{}Code ( {}, {} )\n", prefix, start, end));
            }
            Section::For {
                var,
                from,
                to,
                body,
            } => {
                out.push_str(&format!(
                    "{}For ( {} in range({}, {}) ) {{\n",
                    prefix, var, from, to
                ));
                body.dump_into(out, &nested);
                out.push_str(&format!("{}}}\n", prefix));
            }
            Section::ForEach { var, seq, body } => {
                out.push_str(&format!("{}For ( {} in {} ) {{\n", prefix, var, seq));
                body.dump_into(out, &nested);
                out.push_str(&format!("{}}}\n", prefix));
            }
        }
    }
}

/// Replace every `{{identifier}}` marker in `text` with the rendered form of
/// the corresponding binding. `base` is the byte offset of `text` within the
/// template source, used for error positions.
fn substitute(text: &str, base: usize, env: &Environment) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut offset = 0;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let inner = &rest[open + 2..];
        let close = inner.find("}}").ok_or(TemplateError::MalformedMarker {
            pos: base + offset + open,
        })?;
        let ident = inner[..close].trim();
        if ident.is_empty() {
            return Err(TemplateError::MalformedMarker {
                pos: base + offset + open,
            });
        }
        let value = env
            .get(ident)
            .ok_or_else(|| TemplateError::UndefinedVariable(ident.to_string()))?;
        let rendered = value.render().ok_or_else(|| TemplateError::TypeMismatch {
            name: ident.to_string(),
            expected: "printable value",
            found: value.kind(),
        })?;
        out.push_str(&rendered);
        let consumed = open + 2 + close + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(pairs: &[(&str, Value)]) -> Environment {
        let mut env = Environment::new();
        for (name, value) in pairs {
            env.set(*name, value.clone());
        }
        env
    }

    #[test]
    fn test_substitute_plain_text_is_identity() {
        let env = Environment::new();
        assert_eq!(substitute("no markers here", 0, &env).unwrap(), "no markers here");
    }

    #[test]
    fn test_substitute_replaces_markers() {
        let env = env_with(&[("name", Value::from("world")), ("n", Value::Int(3))]);
        assert_eq!(
            substitute("hello {{name}} x{{ n }}!", 0, &env).unwrap(),
            "hello world x3!"
        );
    }

    #[test]
    fn test_substitute_undefined_variable() {
        let env = Environment::new();
        let err = substitute("{{missing}}", 0, &env).unwrap_err();
        assert_eq!(err, TemplateError::UndefinedVariable("missing".to_string()));
    }

    #[test]
    fn test_substitute_sequence_is_type_mismatch() {
        let env = env_with(&[("items", Value::seq(["a", "b"]))]);
        let err = substitute("{{items}}", 0, &env).unwrap_err();
        assert!(matches!(err, TemplateError::TypeMismatch { .. }));
    }

    #[test]
    fn test_substitute_unterminated_marker() {
        let env = env_with(&[("x", Value::Int(1))]);
        let err = substitute("ab{{x", 7, &env).unwrap_err();
        assert_eq!(err, TemplateError::MalformedMarker { pos: 9 });
    }

    #[test]
    fn test_substitute_empty_marker() {
        let env = Environment::new();
        let err = substitute("{{  }}", 0, &env).unwrap_err();
        assert!(matches!(err, TemplateError::MalformedMarker { .. }));
    }

    #[test]
    fn test_lone_closing_braces_pass_through() {
        let env = Environment::new();
        assert_eq!(substitute("a }} b", 0, &env).unwrap(), "a }} b");
    }

    #[test]
    fn test_for_section_renders_range() {
        let mut env = Environment::new();
        let section = Section::For {
            var: "i".to_string(),
            from: Bound::Literal(0),
            to: Bound::Literal(3),
            body: Box::new(Section::Container {
                start: 0,
                end: 0,
                children: vec![Section::Code {
                    start: 0,
                    end: 0,
                    text: "{{i}}".to_string(),
                }],
            }),
        };
        assert_eq!(section.render(&mut env).unwrap(), "012");
        assert!(!env.is_bound("i"));
    }

    #[test]
    fn test_for_section_pops_frame_on_error() {
        let mut env = Environment::new();
        let section = Section::For {
            var: "i".to_string(),
            from: Bound::Literal(0),
            to: Bound::Literal(2),
            body: Box::new(Section::Code {
                start: 0,
                end: 0,
                text: "{{missing}}".to_string(),
            }),
        };
        assert!(section.render(&mut env).is_err());
        assert!(!env.is_bound("i"));
    }

    #[test]
    fn test_variable_bound_resolution() {
        let env = env_with(&[("n", Value::Int(4)), ("s", Value::from("x"))]);
        assert_eq!(Bound::Var("n".to_string()).resolve(&env).unwrap(), 4);
        assert!(matches!(
            Bound::Var("s".to_string()).resolve(&env),
            Err(TemplateError::TypeMismatch { .. })
        ));
        assert!(matches!(
            Bound::Var("q".to_string()).resolve(&env),
            Err(TemplateError::UndefinedVariable(_))
        ));
    }

    #[test]
    fn test_dump_format() {
        let section = Section::Root {
            children: vec![Section::For {
                var: "i".to_string(),
                from: Bound::Literal(0),
                to: Bound::Var("n".to_string()),
                body: Box::new(Section::Container {
                    start: 24,
                    end: 29,
                    children: vec![Section::Code {
                        start: 24,
                        end: 29,
                        text: "{{i}}".to_string(),
                    }],
                }),
            }],
        };
        let dump = section.dump();
        assert_eq!(
            dump,
            "Root {\n    For ( i in range(0, n) ) {\n        Container ( 24, 29 ) {\n            Code ( 24, 29 )\n        }\n    }\n}\n"
        );
    }
}
