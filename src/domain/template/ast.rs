// Parsed representation of path templates

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Serialize;

use super::matcher::CompositeMatcher;
use super::options::MatchOptions;
use crate::domain::path_vars::PathVarsType;

/// A parsed path template
///
/// Immutable once parsed; [`Template::sub`] and [`Template::resolve_to`]
/// produce new templates.
#[derive(Debug, Clone)]
pub struct Template {
    pub(crate) original: String,
    pub(crate) parts: Vec<PathPart>,
    pub(crate) positional_count: usize,
    pub(crate) named_count: usize,
    pub(crate) options: MatchOptions,
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.original == other.original && self.parts == other.parts
    }
}

impl Template {
    /// The template text as given (slash-prefixed), or as generated by the algebra
    pub fn original_template(&self) -> &str {
        &self.original
    }

    /// The template text, optionally with var patterns removed
    pub fn template(&self, remove_patterns: bool) -> String {
        if !remove_patterns {
            return self.original.clone();
        }
        if self.parts.is_empty() {
            return "/".to_string();
        }
        self.parts
            .iter()
            .map(|part| format!("/{}", part.render(false)))
            .collect()
    }

    pub fn parts(&self) -> &[PathPart] {
        &self.parts
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    pub fn vars_type(&self) -> PathVarsType {
        if self.named_count > 0 {
            PathVarsType::Names
        } else {
            PathVarsType::Positions
        }
    }

    pub fn positional_count(&self) -> usize {
        self.positional_count
    }

    pub fn named_count(&self) -> usize {
        self.named_count
    }

    /// Every variable of the template, in left-to-right order
    pub fn vars(&self) -> Vec<TemplateVar> {
        let mut result: Vec<TemplateVar> = Vec::new();
        for var in self.variables() {
            let named_position = match &var.name {
                Some(name) => result
                    .iter()
                    .filter(|v| v.name.as_deref() == Some(name.as_str()))
                    .count(),
                None => 0,
            };
            result.push(TemplateVar {
                name: var.name.clone(),
                named_position,
                position: result.len(),
                pattern: var.pattern.clone(),
            });
        }
        result
    }

    /// Variables in occurrence order, composite sub-parts included
    pub(crate) fn variables(&self) -> Vec<&PathVariable> {
        let mut result = Vec::new();
        for part in &self.parts {
            match part {
                PathPart::Fixed(_) => {}
                PathPart::Variable(var) => result.push(var),
                PathPart::Composite(composite) => {
                    for sp in &composite.sub_parts {
                        if let SubPart::Variable(var) = sp {
                            result.push(var);
                        }
                    }
                }
            }
        }
        result
    }
}

/// One `/`-delimited unit of a template
#[derive(Debug, Clone, PartialEq)]
pub enum PathPart {
    Fixed(String),
    Variable(PathVariable),
    Composite(CompositePart),
}

impl PathPart {
    /// Template text for this part (without the leading `/`)
    pub(crate) fn render(&self, with_patterns: bool) -> String {
        match self {
            PathPart::Fixed(value) => render_fixed(value, true),
            PathPart::Variable(var) => var.render(with_patterns, true),
            PathPart::Composite(composite) => composite.render(with_patterns),
        }
    }
}

/// A placeholder; `name` is `None` for positional vars
#[derive(Debug, Clone)]
pub struct PathVariable {
    pub(crate) name: Option<String>,
    pub(crate) pattern: Option<String>,
    pub(crate) regex: Option<Regex>,
}

impl PartialEq for PathVariable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.pattern == other.pattern
    }
}

impl PathVariable {
    pub(crate) fn positional() -> Self {
        Self {
            name: None,
            pattern: None,
            regex: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    pub fn is_positional(&self) -> bool {
        self.name.is_none()
    }

    fn render(&self, with_patterns: bool, whole_segment: bool) -> String {
        match (&self.name, &self.pattern) {
            (None, _) if whole_segment => "?".to_string(),
            (None, _) => "{}".to_string(),
            (Some(name), Some(pattern)) if with_patterns => {
                format!("{{{}:{}}}", escape_name(name), pattern)
            }
            (Some(name), _) => format!("{{{}}}", escape_name(name)),
        }
    }
}

/// A segment mixing literals and variables, e.g. `{name}.{ext}`
#[derive(Debug, Clone)]
pub struct CompositePart {
    pub(crate) sub_parts: Vec<SubPart>,
    pub(crate) matcher: OnceCell<Option<CompositeMatcher>>,
}

impl PartialEq for CompositePart {
    fn eq(&self, other: &Self) -> bool {
        self.sub_parts == other.sub_parts
    }
}

impl CompositePart {
    pub(crate) fn new(sub_parts: Vec<SubPart>) -> Self {
        Self {
            sub_parts,
            matcher: OnceCell::new(),
        }
    }

    pub fn sub_parts(&self) -> &[SubPart] {
        &self.sub_parts
    }

    fn render(&self, with_patterns: bool) -> String {
        self.sub_parts
            .iter()
            .map(|sp| match sp {
                SubPart::Fixed(value) => render_fixed(value, false),
                SubPart::Variable(var) => var.render(with_patterns, false),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubPart {
    Fixed(String),
    Variable(PathVariable),
}

/// Introspection record for one variable of a template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateVar {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub named_position: usize,
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Backslash-escapes characters that would end or split a `{name}`
fn escape_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, ':' | '\\' | '{' | '}' | '(' | ')' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Renders a literal so that it parses back to the same literal
///
/// Text containing delimiters, brackets or quotes is single-quoted; so is a
/// whole segment that would otherwise read as a `?`/`:` variable.
pub(crate) fn render_fixed(value: &str, whole_segment: bool) -> String {
    let needs_quotes = value
        .chars()
        .any(|c| matches!(c, '/' | '{' | '}' | '(' | ')' | '[' | ']' | '\'' | '"' | '\\'))
        || (whole_segment && (value.starts_with('?') || value.starts_with(':') || value.is_empty()));
    if !needs_quotes {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}
