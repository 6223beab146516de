// Path and request generation from templates

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::{Method, Request};
use tracing::debug;

use super::ast::{PathPart, PathVariable, SubPart, Template};
use super::options::{check_var, VarCheck, VarContext, VarMatchOption};
use crate::domain::path_vars::{PathVars, PathVarsType};
use crate::domain::query::QueryParams;
use crate::domain::request::{Headers, Host};
use crate::error::BuildError;

/// Everything besides the vars that goes into a generated path or request
#[derive(Clone, Default)]
pub struct BuildOptions {
    pub host: Option<Host>,
    pub query: Option<QueryParams>,
    pub headers: Option<Headers>,
    /// Run over every supplied value before it is emitted
    pub var_match: Vec<Arc<dyn VarMatchOption>>,
}

impl fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOptions")
            .field("host", &self.host)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("var_match", &self.var_match.len())
            .finish()
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<Host>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_var(mut self, option: impl VarMatchOption + 'static) -> Self {
        self.var_match.push(Arc::new(option));
        self
    }
}

/// Maps supplied values onto template variables in occurrence order
///
/// The positional cursor advances once per variable, composite sub-parts
/// included. Named variables take the k-th supplied value of their name,
/// k being the number of earlier occurrences of that name in the template.
pub(crate) struct PositionsTracker<'a> {
    vars: &'a PathVars,
    position: usize,
    occurrences: HashMap<String, usize>,
}

impl<'a> PositionsTracker<'a> {
    pub(crate) fn new(vars: &'a PathVars) -> Self {
        Self {
            vars,
            position: 0,
            occurrences: HashMap::new(),
        }
    }

    /// The value for the next variable, with the variable's position
    pub(crate) fn next_value(&mut self, var: &PathVariable) -> (usize, Result<String, BuildError>) {
        let position = self.position;
        self.position += 1;

        let value = match (&var.name, self.vars.vars_type()) {
            (Some(name), PathVarsType::Names) => {
                let occurrence = self.occurrences.entry(name.clone()).or_insert(0);
                let k = *occurrence;
                *occurrence += 1;
                self.vars.get_named(name, k as isize).ok_or_else(|| {
                    if k == 0 {
                        BuildError::MissingNamed(name.clone())
                    } else {
                        BuildError::MissingNamedOccurrence {
                            name: name.clone(),
                            occurrence: k,
                        }
                    }
                })
            }
            _ => self
                .vars
                .get_positional(position as isize)
                .ok_or(BuildError::MissingPositional(position + 1)),
        };
        (position, value)
    }

    /// Looks up and checks the value for the next variable
    fn build_var(
        &mut self,
        var: &PathVariable,
        path_pos: usize,
        options: &[Arc<dyn VarMatchOption>],
    ) -> Result<String, BuildError> {
        let (position, value) = self.next_value(var);
        let value = value?;
        if options.is_empty() {
            return Ok(value);
        }
        let ctx = VarContext {
            position,
            name: var.name(),
            regex: var.regex(),
            pattern: var.pattern(),
            path_pos,
            vars: self.vars,
        };
        match check_var(options, &value, &ctx) {
            VarCheck::Accepted(value) => Ok(value),
            VarCheck::Rejected => Err(BuildError::Rejected { position, value }),
        }
    }
}

impl Template {
    /// Generates a path, prefixed with the host and followed by the query string when given
    pub fn path_from(&self, vars: &PathVars, options: &BuildOptions) -> Result<String, BuildError> {
        let mut tracker = PositionsTracker::new(vars);
        let mut path = String::new();
        if let Some(host) = &options.host {
            path.push_str(host.address());
        }

        for (path_pos, part) in self.parts.iter().enumerate() {
            path.push('/');
            match part {
                PathPart::Fixed(value) => path.push_str(value),
                PathPart::Variable(var) => {
                    path.push_str(&tracker.build_var(var, path_pos, &options.var_match)?)
                }
                PathPart::Composite(composite) => {
                    for sp in &composite.sub_parts {
                        match sp {
                            SubPart::Fixed(value) => path.push_str(value),
                            SubPart::Variable(var) => {
                                path.push_str(&tracker.build_var(var, path_pos, &options.var_match)?)
                            }
                        }
                    }
                }
            }
        }
        if self.parts.is_empty() {
            path.push('/');
        }

        if let Some(query) = &options.query {
            path.push_str(&query.to_query_string());
        }

        debug!(template = %self.original, path = %path, "built path");
        Ok(path)
    }

    /// Generates a request for the built URL, with headers applied afterwards
    pub fn request_from<B>(
        &self,
        method: Method,
        vars: &PathVars,
        body: B,
        options: &BuildOptions,
    ) -> Result<Request<B>, BuildError> {
        let uri = self.path_from(vars, options)?;
        let mut request = Request::builder().method(method).uri(uri).body(body)?;
        if let Some(headers) = &options.headers {
            headers.apply_to(request.headers_mut())?;
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::template::options::{EncodeVar, PathRegexCheck, VarFn};

    #[test]
    fn test_build_named() {
        let template = Template::parse("/credits/{year}/{month}").unwrap();
        let vars = PathVars::from_pairs([("year", "2022"), ("month", "11")]);
        assert_eq!(template.path_from(&vars, &BuildOptions::new()).unwrap(), "/credits/2022/11");
    }

    #[test]
    fn test_build_positional() {
        let template = Template::parse("/credits/?/?").unwrap();
        let vars = PathVars::from_values([2022, 11]);
        assert_eq!(template.path_from(&vars, &BuildOptions::new()).unwrap(), "/credits/2022/11");
    }

    #[test]
    fn test_build_positional_values_into_named_template() {
        let template = Template::parse("/credits/{year}/{month}").unwrap();
        let vars = PathVars::from_values(["2022", "11"]);
        assert_eq!(template.path_from(&vars, &BuildOptions::new()).unwrap(), "/credits/2022/11");
    }

    #[test]
    fn test_build_missing_positional() {
        let template = Template::parse("/a/?/?").unwrap();
        let vars = PathVars::from_values(["x"]);
        match template.path_from(&vars, &BuildOptions::new()) {
            Err(BuildError::MissingPositional(2)) => {}
            other => panic!("Expected MissingPositional(2), got {:?}", other),
        }
    }

    #[test]
    fn test_build_missing_named() {
        let template = Template::parse("/a/{x}/{y}").unwrap();
        let vars = PathVars::from_pairs([("x", "1")]);
        let err = template.path_from(&vars, &BuildOptions::new()).unwrap_err();
        assert_eq!(err.to_string(), "no var for 'y'");
    }

    #[test]
    fn test_build_repeated_name_uses_occurrences() {
        let template = Template::parse("/{id}/sub/{id}").unwrap();
        let vars = PathVars::from_pairs([("id", "1"), ("id", "2")]);
        assert_eq!(template.path_from(&vars, &BuildOptions::new()).unwrap(), "/1/sub/2");

        let vars = PathVars::from_pairs([("id", "1")]);
        match template.path_from(&vars, &BuildOptions::new()) {
            Err(BuildError::MissingNamedOccurrence { name, occurrence }) => {
                assert_eq!(name, "id");
                assert_eq!(occurrence, 1);
            }
            other => panic!("Expected MissingNamedOccurrence, got {:?}", other),
        }
    }

    #[test]
    fn test_build_composite() {
        let template = Template::parse("/files/{name}.{ext}").unwrap();
        let vars = PathVars::from_pairs([("ext", "json"), ("name", "report")]);
        assert_eq!(template.path_from(&vars, &BuildOptions::new()).unwrap(), "/files/report.json");
    }

    #[test]
    fn test_build_interleaved_composite_positions() {
        let template = Template::parse("/{a}/{b}-{c}/{d}").unwrap();
        let vars = PathVars::from_values(["1", "2", "3", "4"]);
        assert_eq!(template.path_from(&vars, &BuildOptions::new()).unwrap(), "/1/2-3/4");
    }

    #[test]
    fn test_build_host_and_query() {
        let template = Template::parse("/users/{id}").unwrap();
        let vars = PathVars::from_pairs([("id", 7)]);
        let query = QueryParams::from_pairs([("b", "2"), ("a", "1")]);
        let options = BuildOptions::new()
            .with_host("https://example.com")
            .with_query(query);
        assert_eq!(
            template.path_from(&vars, &options).unwrap(),
            "https://example.com/users/7?a=1&b=2"
        );
    }

    #[test]
    fn test_build_root() {
        let template = Template::parse("/").unwrap();
        assert_eq!(template.path_from(&PathVars::positional(), &BuildOptions::new()).unwrap(), "/");
    }

    #[test]
    fn test_build_regex_check_rejects() {
        let template = Template::parse("/users/{id:[0-9]+}").unwrap();
        let options = BuildOptions::new().with_var(PathRegexCheck);
        let ok = PathVars::from_pairs([("id", "42")]);
        assert_eq!(template.path_from(&ok, &options).unwrap(), "/users/42");

        let bad = PathVars::from_pairs([("id", "abc")]);
        match template.path_from(&bad, &options) {
            Err(BuildError::Rejected { position, value }) => {
                assert_eq!(position, 0);
                assert_eq!(value, "abc");
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
        // patterns are not enforced without the option
        assert_eq!(template.path_from(&bad, &BuildOptions::new()).unwrap(), "/users/abc");
    }

    #[test]
    fn test_build_var_options_chain() {
        let template = Template::parse("/search/{term}").unwrap();
        let options = BuildOptions::new()
            .with_var(VarFn::new(|v, _| Some(v.trim().to_string())))
            .with_var(EncodeVar);
        let vars = PathVars::from_pairs([("term", " hello world ")]);
        assert_eq!(template.path_from(&vars, &options).unwrap(), "/search/hello%20world");
    }

    #[test]
    fn test_request_from() {
        let template = Template::parse("/users/{id}").unwrap();
        let vars = PathVars::from_pairs([("id", 7)]);
        let options = BuildOptions::new()
            .with_host("http://localhost:8080")
            .with_headers(Headers::from_pairs([("X-Trace", "abc")]));
        let request = template
            .request_from(Method::POST, &vars, "payload", &options)
            .unwrap();
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.uri().to_string(), "http://localhost:8080/users/7");
        assert_eq!(request.headers()["x-trace"], "abc");
        assert_eq!(*request.body(), "payload");
    }

    #[test]
    fn test_request_from_missing_var() {
        let template = Template::parse("/users/{id}").unwrap();
        let result = template.request_from(Method::GET, &PathVars::named(), (), &BuildOptions::new());
        assert!(matches!(result, Err(BuildError::MissingNamed(_))));
    }
}
