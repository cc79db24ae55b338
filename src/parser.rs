// ABOUTME: Parser turning template source text into a section tree
// ABOUTME: Scans for control blocks and slices literal text into spanned Code nodes

use tracing::trace;

use crate::error::{Result, TemplateError};
use crate::section::{Bound, Section};

/// Parse template source into a `Section::Root`.
///
/// Pure function of the source text: literal regions become `Code` nodes
/// holding their slice verbatim (substitution markers included), `{% for %}`
/// blocks become `For`/`ForEach` nodes with their body wrapped in a spanned
/// `Container`. Any malformed or unterminated block is a fatal error and no
/// partial tree is returned.
pub fn parse(source: &str) -> Result<Section> {
    let mut parser = Parser {
        src: source,
        pos: 0,
    };
    let (children, _) = parser.parse_until(None)?;
    Ok(Section::Root { children })
}

enum ForHeader {
    Range(Bound, Bound),
    Sequence(String),
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Parse sections until the `endfor` matching the loop opened at
    /// `opened_at`, or until end of input at the top level. Returns the
    /// sections and the byte offset where the terminator began. Nesting is
    /// handled by recursion, so an inner loop's `endfor` can never close the
    /// outer loop.
    fn parse_until(&mut self, opened_at: Option<usize>) -> Result<(Vec<Section>, usize)> {
        let mut children = Vec::new();
        loop {
            let rest = &self.src[self.pos..];
            let rel = match rest.find("{%") {
                Some(rel) => rel,
                None => {
                    if !rest.is_empty() {
                        children.push(self.code_node(self.pos, self.src.len()));
                    }
                    self.pos = self.src.len();
                    return match opened_at {
                        Some(start) => Err(TemplateError::UnterminatedBlock { start }),
                        None => Ok((children, self.src.len())),
                    };
                }
            };

            let block_start = self.pos + rel;
            if rel > 0 {
                children.push(self.code_node(self.pos, block_start));
            }
            let after_open = block_start + 2;
            let close_rel = self.src[after_open..].find("%}").ok_or_else(|| {
                TemplateError::MalformedBlock(format!(
                    "missing '%}}' for block at byte {}",
                    block_start
                ))
            })?;
            let header = &self.src[after_open..after_open + close_rel];
            self.pos = after_open + close_rel + 2;

            let tokens: Vec<&str> = header.split_whitespace().collect();
            match tokens.first().copied() {
                Some("endfor") => {
                    if tokens.len() != 1 {
                        return Err(TemplateError::MalformedBlock(format!(
                            "unexpected tokens after 'endfor' at byte {}",
                            block_start
                        )));
                    }
                    return match opened_at {
                        Some(_) => Ok((children, block_start)),
                        None => Err(TemplateError::MalformedBlock(format!(
                            "'endfor' with no open 'for' at byte {}",
                            block_start
                        ))),
                    };
                }
                Some("for") => {
                    children.push(self.parse_for(&tokens, block_start)?);
                }
                _ => {
                    return Err(TemplateError::MalformedBlock(format!(
                        "unknown directive '{}' at byte {}",
                        header.trim(),
                        block_start
                    )));
                }
            }
        }
    }

    /// Parse a `for` block whose opening marker started at `block_start`.
    /// The scanner position is already past the `%}` of the header.
    fn parse_for(&mut self, tokens: &[&str], block_start: usize) -> Result<Section> {
        if tokens.len() < 4 || tokens[2] != "in" || !is_identifier(tokens[1]) {
            return Err(TemplateError::MalformedBlock(format!(
                "bad 'for' header at byte {}, expected 'for <name> in <target>'",
                block_start
            )));
        }
        let var = tokens[1].to_string();
        // Rejoin with a separator so token boundaries survive; a bound that
        // was split across tokens stays split and gets rejected below.
        let target: String = tokens[3..].join(" ");
        let header = self.parse_for_target(&target, tokens.len(), block_start)?;
        trace!(var = %var, target = %target, "parsing for block");

        let body_start = self.pos;
        let (children, body_end) = self.parse_until(Some(block_start))?;
        let body = Box::new(Section::Container {
            start: body_start,
            end: body_end,
            children,
        });

        Ok(match header {
            ForHeader::Range(from, to) => Section::For {
                var,
                from,
                to,
                body,
            },
            ForHeader::Sequence(seq) => Section::ForEach { var, seq, body },
        })
    }

    fn parse_for_target(
        &self,
        target: &str,
        token_count: usize,
        block_start: usize,
    ) -> Result<ForHeader> {
        if let Some(inner) = target
            .strip_prefix("range(")
            .and_then(|t| t.strip_suffix(')'))
        {
            let mut bounds = inner.split(',');
            return match (bounds.next(), bounds.next(), bounds.next()) {
                (Some(from), Some(to), None) => Ok(ForHeader::Range(
                    parse_bound(from, block_start)?,
                    parse_bound(to, block_start)?,
                )),
                _ => Err(TemplateError::MalformedBlock(format!(
                    "range(..) at byte {} takes exactly two arguments",
                    block_start
                ))),
            };
        }
        if token_count == 4 && is_identifier(target) {
            return Ok(ForHeader::Sequence(target.to_string()));
        }
        Err(TemplateError::MalformedBlock(format!(
            "bad loop target '{}' at byte {}",
            target, block_start
        )))
    }

    fn code_node(&self, start: usize, end: usize) -> Section {
        Section::Code {
            start,
            end,
            text: self.src[start..end].to_string(),
        }
    }
}

/// A range bound is an integer literal or a variable name resolved later,
/// when the loop header is evaluated.
fn parse_bound(token: &str, block_start: usize) -> Result<Bound> {
    let token = token.trim();
    if let Ok(n) = token.parse::<i64>() {
        return Ok(Bound::Literal(n));
    }
    if is_identifier(token) {
        return Ok(Bound::Var(token.to_string()));
    }
    Err(TemplateError::MalformedBlock(format!(
        "bad range bound '{}' at byte {}",
        token, block_start
    )))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
