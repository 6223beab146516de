// Match/transform extension points for fixed and variable path parts

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::domain::path_vars::PathVars;

/// Decides whether a fixed path part matches a path segment
///
/// Consulted only when the segment is not exactly equal to the expected value;
/// the first option returning `true` wins.
pub trait FixedMatchOption: Send + Sync {
    fn matches(&self, value: &str, expected: &str, path_pos: usize, vars: &PathVars) -> bool;
}

/// What a [`VarMatchOption`] knows about the variable being matched or built
#[derive(Clone, Copy)]
pub struct VarContext<'a> {
    /// Index of this var among all vars of the template
    pub position: usize,
    /// `None` for positional vars
    pub name: Option<&'a str>,
    pub regex: Option<&'a Regex>,
    /// The pattern as written in the template
    pub pattern: Option<&'a str>,
    /// Index of the path segment
    pub path_pos: usize,
    /// Vars collected (matching) or supplied (building) so far
    pub vars: &'a PathVars,
}

/// Validates and optionally rewrites a variable value
///
/// Every applicable option runs in order, each seeing the previous one's
/// output; the first rejection (`None`) fails the match or build.
pub trait VarMatchOption: Send + Sync {
    fn applicable(&self, value: &str, ctx: &VarContext<'_>) -> bool;
    fn apply(&self, value: &str, ctx: &VarContext<'_>) -> Option<String>;
}

/// Outcome of running var options over a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarCheck {
    Accepted(String),
    Rejected,
}

/// Ordered fixed and variable match options
#[derive(Clone, Default)]
pub struct MatchOptions {
    pub fixed: Vec<Arc<dyn FixedMatchOption>>,
    pub var: Vec<Arc<dyn VarMatchOption>>,
}

impl fmt::Debug for MatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchOptions")
            .field("fixed", &self.fixed.len())
            .field("var", &self.var.len())
            .finish()
    }
}

impl MatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixed(mut self, option: impl FixedMatchOption + 'static) -> Self {
        let option: Arc<dyn FixedMatchOption> = Arc::new(option);
        push_unique(&mut self.fixed, option);
        self
    }

    pub fn with_var(mut self, option: impl VarMatchOption + 'static) -> Self {
        let option: Arc<dyn VarMatchOption> = Arc::new(option);
        push_unique(&mut self.var, option);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fixed.is_empty() && self.var.is_empty()
    }

    /// `self` followed by the options of `other` not already present
    pub fn merged(&self, other: &MatchOptions) -> MatchOptions {
        if other.is_empty() {
            return self.clone();
        }
        let mut result = self.clone();
        for option in &other.fixed {
            push_unique(&mut result.fixed, option.clone());
        }
        for option in &other.var {
            push_unique(&mut result.var, option.clone());
        }
        result
    }

    pub fn check_fixed(&self, value: &str, expected: &str, path_pos: usize, vars: &PathVars) -> bool {
        value == expected
            || self
                .fixed
                .iter()
                .any(|option| option.matches(value, expected, path_pos, vars))
    }

    pub fn check_var(&self, value: &str, ctx: &VarContext<'_>) -> VarCheck {
        check_var(&self.var, value, ctx)
    }
}

/// Runs every applicable option in order, stopping at the first rejection
pub fn check_var(options: &[Arc<dyn VarMatchOption>], value: &str, ctx: &VarContext<'_>) -> VarCheck {
    let mut current = value.to_string();
    for option in options {
        if option.applicable(&current, ctx) {
            match option.apply(&current, ctx) {
                Some(next) => current = next,
                None => return VarCheck::Rejected,
            }
        }
    }
    VarCheck::Accepted(current)
}

fn push_unique<T: ?Sized>(list: &mut Vec<Arc<T>>, option: Arc<T>) {
    if !list.iter().any(|existing| Arc::ptr_eq(existing, &option)) {
        list.push(option);
    }
}

/// Matches fixed path parts regardless of case
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitiveFixed;

impl FixedMatchOption for CaseInsensitiveFixed {
    fn matches(&self, value: &str, expected: &str, _path_pos: usize, _vars: &PathVars) -> bool {
        value == expected || value.to_lowercase() == expected.to_lowercase()
    }
}

/// Checks values against the var's pattern; intended for building,
/// where patterns are otherwise not enforced
#[derive(Debug, Clone, Copy, Default)]
pub struct PathRegexCheck;

impl VarMatchOption for PathRegexCheck {
    fn applicable(&self, _value: &str, ctx: &VarContext<'_>) -> bool {
        ctx.regex.is_some()
    }

    fn apply(&self, value: &str, ctx: &VarContext<'_>) -> Option<String> {
        match ctx.regex {
            Some(rx) if !rx.is_match(value) => None,
            _ => Some(value.to_string()),
        }
    }
}

/// Percent-encodes var values
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeVar;

impl VarMatchOption for EncodeVar {
    fn applicable(&self, _value: &str, _ctx: &VarContext<'_>) -> bool {
        true
    }

    fn apply(&self, value: &str, _ctx: &VarContext<'_>) -> Option<String> {
        Some(urlencoding::encode(value).to_string())
    }
}

/// Wraps a closure as a var option applying to every var
pub struct VarFn<F>(F);

impl<F> VarFn<F>
where
    F: Fn(&str, &VarContext<'_>) -> Option<String> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> VarMatchOption for VarFn<F>
where
    F: Fn(&str, &VarContext<'_>) -> Option<String> + Send + Sync,
{
    fn applicable(&self, _value: &str, _ctx: &VarContext<'_>) -> bool {
        true
    }

    fn apply(&self, value: &str, ctx: &VarContext<'_>) -> Option<String> {
        (self.0)(value, ctx)
    }
}
