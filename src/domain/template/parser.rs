// Template parser: classifies split segments into path parts

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use super::ast::{CompositePart, PathPart, PathVariable, SubPart, Template};
use super::options::{FixedMatchOption, MatchOptions, VarMatchOption};
use super::splitter::{Piece, Segment, SegmentSplitter};
use crate::error::ParseError;

/// Validates a raw template segment; an `Err` message becomes a parse error
pub trait SegmentCheck: Send + Sync {
    fn check(&self, segment: &str, index: usize) -> Result<(), String>;
}

/// Options given when parsing a template
///
/// The match options are bound to the template and used by every match.
#[derive(Clone, Default)]
pub struct ParseOptions {
    pub matching: MatchOptions,
    pub segment_checks: Vec<Arc<dyn SegmentCheck>>,
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("matching", &self.matching)
            .field("segment_checks", &self.segment_checks.len())
            .finish()
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixed(mut self, option: impl FixedMatchOption + 'static) -> Self {
        self.matching = self.matching.with_fixed(option);
        self
    }

    pub fn with_var(mut self, option: impl VarMatchOption + 'static) -> Self {
        self.matching = self.matching.with_var(option);
        self
    }

    pub fn with_segment_check(mut self, check: impl SegmentCheck + 'static) -> Self {
        self.segment_checks.push(Arc::new(check));
        self
    }
}

pub struct TemplateParser {
    positional_count: usize,
    named_count: usize,
}

impl TemplateParser {
    pub fn parse(template: &str) -> Result<Template, ParseError> {
        Self::parse_with(template, ParseOptions::default())
    }

    pub fn parse_with(template: &str, options: ParseOptions) -> Result<Template, ParseError> {
        if template.trim().is_empty() {
            return Err(ParseError::new("template empty", 0));
        }
        let original = slash_prefix(template);
        let segments = SegmentSplitter::split(&original)?;

        let mut parser = Self {
            positional_count: 0,
            named_count: 0,
        };
        let mut parts = Vec::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            for check in &options.segment_checks {
                check
                    .check(&segment.text, index)
                    .map_err(|msg| ParseError::new(msg, segment.start))?;
            }
            parts.push(parser.parse_segment(segment)?);
        }

        if parser.positional_count > 0 && parser.named_count > 0 {
            return Err(ParseError::new(
                "template cannot contain both positional and named path variables",
                0,
            ));
        }

        debug!(
            template = %original,
            parts = parts.len(),
            positional = parser.positional_count,
            named = parser.named_count,
            "parsed template"
        );

        Ok(Template {
            original,
            parts,
            positional_count: parser.positional_count,
            named_count: parser.named_count,
            options: options.matching,
        })
    }

    fn parse_segment(&mut self, segment: &Segment) -> Result<PathPart, ParseError> {
        if let [Piece::Literal { text, .. }] = segment.pieces.as_slice() {
            let marked = text.strip_prefix('?').or_else(|| text.strip_prefix(':'));
            return Ok(match marked {
                Some(rest) => {
                    let mut var = PathVariable::positional();
                    if !rest.is_empty() {
                        var.name = Some(rest.to_string());
                    }
                    self.count(&var);
                    PathPart::Variable(var)
                }
                None => PathPart::Fixed(text.clone()),
            });
        }

        let mut sub_parts: Vec<SubPart> = Vec::with_capacity(segment.pieces.len());
        let mut any_vars = false;
        for piece in &segment.pieces {
            match piece {
                Piece::Bracketed {
                    open: '{',
                    inner,
                    start,
                } => {
                    let var = self.parse_variable(inner, *start)?;
                    any_vars = true;
                    sub_parts.push(SubPart::Variable(var));
                }
                other => {
                    let text = other.literal_text();
                    match sub_parts.last_mut() {
                        Some(SubPart::Fixed(prev)) => prev.push_str(&text),
                        _ => sub_parts.push(SubPart::Fixed(text)),
                    }
                }
            }
        }

        if sub_parts.len() == 1 {
            return Ok(match sub_parts.remove(0) {
                SubPart::Fixed(value) => PathPart::Fixed(value),
                SubPart::Variable(var) => PathPart::Variable(var),
            });
        }
        if !any_vars {
            let value = sub_parts
                .into_iter()
                .map(|sp| match sp {
                    SubPart::Fixed(value) => value,
                    SubPart::Variable(_) => String::new(),
                })
                .collect();
            return Ok(PathPart::Fixed(value));
        }
        Ok(PathPart::Composite(CompositePart::new(sub_parts)))
    }

    /// Parses the inside of `{name}` or `{name:pattern}`
    fn parse_variable(&mut self, inner: &str, start: usize) -> Result<PathVariable, ParseError> {
        let (name, pattern) = match find_unescaped(inner, ':') {
            Some(at) => (&inner[..at], Some((&inner[at + 1..], at))),
            None => (inner, None),
        };

        let name = unescape(name.trim());
        if name.is_empty() {
            return Err(ParseError::new("path var name cannot be empty", start));
        }

        let mut var = PathVariable {
            name: Some(name),
            pattern: None,
            regex: None,
        };
        if let Some((pattern, at)) = pattern {
            let pattern = pattern.trim();
            if !pattern.is_empty() {
                let regex = Regex::new(&anchored(pattern)).map_err(|e| {
                    ParseError::with_cause("path var regexp problem", start + 1 + at, e)
                })?;
                var.pattern = Some(pattern.to_string());
                var.regex = Some(regex);
            }
        }

        self.count(&var);
        Ok(var)
    }

    fn count(&mut self, var: &PathVariable) {
        if var.is_positional() {
            self.positional_count += 1;
        } else {
            self.named_count += 1;
        }
    }
}

impl Template {
    pub fn parse(template: &str) -> Result<Template, ParseError> {
        TemplateParser::parse(template)
    }

    pub fn parse_with(template: &str, options: ParseOptions) -> Result<Template, ParseError> {
        TemplateParser::parse_with(template, options)
    }
}

impl FromStr for Template {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateParser::parse(s)
    }
}

fn slash_prefix(template: &str) -> String {
    if template.starts_with('/') {
        template.to_string()
    } else {
        format!("/{}", template)
    }
}

/// Adds `^` and `$` anchors unless already present
pub(crate) fn anchored(pattern: &str) -> String {
    let head = if pattern.starts_with('^') { "" } else { "^" };
    let tail = if pattern.ends_with('$') { "" } else { "$" };
    format!("{}{}{}", head, pattern, tail)
}

/// Removes leading `^` and trailing `$`
pub(crate) fn unanchored(pattern: &str) -> &str {
    let pattern = pattern.strip_prefix('^').unwrap_or(pattern);
    pattern.strip_suffix('$').unwrap_or(pattern)
}

fn find_unescaped(s: &str, target: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == target {
            return Some(i);
        }
    }
    None
}

fn unescape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                result.push(next);
            }
        } else {
            result.push(c);
        }
    }
    result
}
