// Template composition and partial resolution

use tracing::debug;

use super::ast::{CompositePart, PathPart, SubPart, Template};
use super::parser::ParseOptions;
use super::resolver::PositionsTracker;
use crate::domain::path_vars::PathVars;
use crate::error::ParseError;

impl Template {
    /// A new template with `path` appended
    pub fn sub(&self, path: &str) -> Result<Template, ParseError> {
        self.sub_with(path, ParseOptions::default())
    }

    /// As [`Template::sub`], parsing the addition with `options`
    ///
    /// The result carries this template's match options followed by the addition's.
    pub fn sub_with(&self, path: &str, options: ParseOptions) -> Result<Template, ParseError> {
        let addition = Template::parse_with(path, options)?;
        if (self.positional_count > 0 && addition.named_count > 0)
            || (self.named_count > 0 && addition.positional_count > 0)
        {
            return Err(ParseError::new(
                "template cannot contain both positional and named path variables",
                0,
            ));
        }

        let base = self.original.strip_suffix('/').unwrap_or(&self.original);
        let original = format!("{}{}", base, addition.original);
        let mut parts = self.parts.clone();
        parts.extend(addition.parts.iter().cloned());

        debug!(base = %self.original, addition = %addition.original, "sub template");
        Ok(Template {
            original,
            parts,
            positional_count: self.positional_count + addition.positional_count,
            named_count: self.named_count + addition.named_count,
            options: self.options.merged(&addition.options),
        })
    }

    /// A new template with every variable that has a value in `vars` made fixed
    ///
    /// Variables without a value are carried over, so the remainder can be
    /// resolved or built later.
    pub fn resolve_to(&self, vars: &PathVars) -> Template {
        let mut tracker = PositionsTracker::new(vars);
        let mut resolved = 0;
        let mut parts = Vec::with_capacity(self.parts.len());

        for part in &self.parts {
            match part {
                PathPart::Fixed(_) => parts.push(part.clone()),
                PathPart::Variable(var) => match tracker.next_value(var).1 {
                    Ok(value) => {
                        resolved += 1;
                        parts.push(PathPart::Fixed(value));
                    }
                    Err(_) => parts.push(part.clone()),
                },
                PathPart::Composite(composite) => {
                    let mut sub_parts: Vec<SubPart> = Vec::with_capacity(composite.sub_parts.len());
                    let mut changed = false;
                    for sp in &composite.sub_parts {
                        match sp {
                            SubPart::Fixed(value) => push_fixed(&mut sub_parts, value),
                            SubPart::Variable(var) => match tracker.next_value(var).1 {
                                Ok(value) => {
                                    changed = true;
                                    push_fixed(&mut sub_parts, &value);
                                }
                                Err(_) => sub_parts.push(sp.clone()),
                            },
                        }
                    }
                    if !changed {
                        parts.push(part.clone());
                        continue;
                    }
                    resolved += 1;
                    match sub_parts.as_slice() {
                        [] => parts.push(PathPart::Fixed(String::new())),
                        [SubPart::Fixed(value)] => parts.push(PathPart::Fixed(value.clone())),
                        [SubPart::Variable(var)] => parts.push(PathPart::Variable(var.clone())),
                        _ => parts.push(PathPart::Composite(CompositePart::new(sub_parts))),
                    }
                }
            }
        }

        if resolved == 0 {
            return self.clone();
        }

        let (positional_count, named_count) = count_vars(&parts);
        let original = if parts.is_empty() {
            "/".to_string()
        } else {
            parts.iter().map(|part| format!("/{}", part.render(true))).collect()
        };
        debug!(template = %self.original, resolved = %original, "resolved template");

        Template {
            original,
            parts,
            positional_count,
            named_count,
            options: self.options.clone(),
        }
    }
}

fn push_fixed(sub_parts: &mut Vec<SubPart>, value: &str) {
    if value.is_empty() {
        return;
    }
    match sub_parts.last_mut() {
        Some(SubPart::Fixed(prev)) => prev.push_str(value),
        _ => sub_parts.push(SubPart::Fixed(value.to_string())),
    }
}

fn count_vars(parts: &[PathPart]) -> (usize, usize) {
    let mut positional = 0;
    let mut named = 0;
    let mut count = |is_positional: bool| {
        if is_positional {
            positional += 1;
        } else {
            named += 1;
        }
    };
    for part in parts {
        match part {
            PathPart::Fixed(_) => {}
            PathPart::Variable(var) => count(var.is_positional()),
            PathPart::Composite(composite) => {
                for sp in &composite.sub_parts {
                    if let SubPart::Variable(var) = sp {
                        count(var.is_positional());
                    }
                }
            }
        }
    }
    (positional, named)
}
