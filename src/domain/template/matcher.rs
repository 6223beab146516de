// Matching live paths against templates

use axum::http::Request;
use regex::Regex;
use tracing::{debug, trace, warn};
use url::Url;

use super::ast::{CompositePart, PathPart, PathVariable, SubPart, Template};
use super::options::{MatchOptions, VarCheck, VarContext};
use super::parser::unanchored;
use super::splitter::split_path;
use crate::domain::path_vars::PathVars;

/// Whole-segment regex for a composite part, with one capture group per sub-part
#[derive(Debug, Clone)]
pub struct CompositeMatcher {
    regex: Regex,
    /// (sub-part index, capture group index) for each variable sub-part
    groups: Vec<(usize, usize)>,
}

impl CompositeMatcher {
    fn build(sub_parts: &[SubPart]) -> Option<Self> {
        let mut rx = String::from("^");
        for (i, sp) in sub_parts.iter().enumerate() {
            match sp {
                SubPart::Fixed(value) => {
                    rx.push('(');
                    rx.push_str(&regex::escape(value));
                    rx.push(')');
                }
                SubPart::Variable(var) => {
                    let pattern = var.pattern().map(unanchored).unwrap_or(".*");
                    rx.push_str(&format!("(?P<vsp{}>{})", i, pattern));
                }
            }
        }
        rx.push('$');

        let regex = match Regex::new(&rx) {
            Ok(regex) => regex,
            Err(e) => {
                warn!(regex = %rx, error = %e, "composite path part regex does not compile");
                return None;
            }
        };
        let groups = regex
            .capture_names()
            .enumerate()
            .filter_map(|(group, name)| {
                let sub_part = name?.strip_prefix("vsp")?.parse::<usize>().ok()?;
                Some((sub_part, group))
            })
            .collect();
        Some(Self { regex, groups })
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl CompositePart {
    /// The synthesized regex, compiled on first use
    pub(crate) fn compiled(&self) -> Option<&CompositeMatcher> {
        self.matcher
            .get_or_init(|| CompositeMatcher::build(&self.sub_parts))
            .as_ref()
    }

    fn match_segment(
        &self,
        segment: &str,
        path_pos: usize,
        vars: &mut PathVars,
        options: &MatchOptions,
    ) -> bool {
        let Some(matcher) = self.compiled() else {
            return false;
        };
        let Some(caps) = matcher.regex.captures(segment) else {
            return false;
        };
        for &(sub_part, group) in &matcher.groups {
            let SubPart::Variable(var) = &self.sub_parts[sub_part] else {
                continue;
            };
            let value = caps.get(group).map_or("", |m| m.as_str());
            match var.check_options(value, path_pos, vars, options) {
                Some(value) => {
                    if !var.record(value, vars) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }
}

impl PathVariable {
    fn check_options(
        &self,
        value: &str,
        path_pos: usize,
        vars: &PathVars,
        options: &MatchOptions,
    ) -> Option<String> {
        let ctx = VarContext {
            position: vars.len(),
            name: self.name(),
            regex: self.regex(),
            pattern: self.pattern(),
            path_pos,
            vars,
        };
        match options.check_var(value, &ctx) {
            VarCheck::Accepted(value) => Some(value),
            VarCheck::Rejected => None,
        }
    }

    fn record(&self, value: String, vars: &mut PathVars) -> bool {
        let added = match &self.name {
            Some(name) => vars.add_named(name.clone(), value),
            None => vars.add_positional(value),
        };
        added.is_ok()
    }
}

impl PathPart {
    fn match_segment(
        &self,
        segment: &str,
        path_pos: usize,
        vars: &mut PathVars,
        options: &MatchOptions,
    ) -> bool {
        match self {
            PathPart::Fixed(expected) => options.check_fixed(segment, expected, path_pos, vars),
            PathPart::Variable(var) => {
                if var.regex().is_some_and(|rx| !rx.is_match(segment)) {
                    return false;
                }
                match var.check_options(segment, path_pos, vars, options) {
                    Some(value) => var.record(value, vars),
                    None => false,
                }
            }
            PathPart::Composite(composite) => {
                composite.match_segment(segment, path_pos, vars, options)
            }
        }
    }
}

impl Template {
    /// Matches a path (or full URL) against the template, returning the extracted vars
    ///
    /// Any query string or fragment is ignored and the path is percent-decoded
    /// before splitting.
    pub fn matches(&self, path: &str) -> Option<PathVars> {
        self.matches_with(path, &MatchOptions::default())
    }

    /// As [`Template::matches`], with extra options merged after the template's own
    pub fn matches_with(&self, path: &str, extra: &MatchOptions) -> Option<PathVars> {
        if path.contains("://") {
            let url = Url::parse(path).ok()?;
            return self.matches_url_with(&url, extra);
        }
        self.match_path(&decode(path_component(path))?, extra)
    }

    pub fn matches_url(&self, url: &Url) -> Option<PathVars> {
        self.matches_url_with(url, &MatchOptions::default())
    }

    pub fn matches_url_with(&self, url: &Url, extra: &MatchOptions) -> Option<PathVars> {
        self.match_path(&decode(url.path())?, extra)
    }

    pub fn matches_request<B>(&self, request: &Request<B>) -> Option<PathVars> {
        self.matches_request_with(request, &MatchOptions::default())
    }

    pub fn matches_request_with<B>(&self, request: &Request<B>, extra: &MatchOptions) -> Option<PathVars> {
        self.match_path(&decode(request.uri().path())?, extra)
    }

    fn match_path(&self, path: &str, extra: &MatchOptions) -> Option<PathVars> {
        let Some(segments) = split_path(path) else {
            trace!(template = %self.original, path, "empty inner path segment");
            return None;
        };
        if segments.len() != self.parts.len() {
            trace!(
                template = %self.original,
                path,
                expected = self.parts.len(),
                actual = segments.len(),
                "segment count mismatch"
            );
            return None;
        }

        let options = self.options.merged(extra);
        let mut vars = PathVars::new(self.vars_type());
        for (path_pos, (part, segment)) in self.parts.iter().zip(segments).enumerate() {
            if !part.match_segment(segment, path_pos, &mut vars, &options) {
                trace!(template = %self.original, path, path_pos, segment, "path part did not match");
                return None;
            }
        }

        debug!(template = %self.original, path, vars = vars.len(), "path matched");
        Some(vars)
    }
}

fn path_component(path: &str) -> &str {
    let end = path.find(|c: char| c == '?' || c == '#').unwrap_or(path.len());
    &path[..end]
}

fn decode(path: &str) -> Option<String> {
    urlencoding::decode(path).ok().map(|p| p.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::path_vars::PathVarsType;
    use crate::domain::template::options::{CaseInsensitiveFixed, VarFn};
    use crate::domain::template::parser::ParseOptions;

    #[test]
    fn test_match_named_regex() {
        let template = Template::parse("/users/{id:[0-9]+}").unwrap();
        let vars = template.matches("/users/42").unwrap();
        assert_eq!(vars.get("id").as_deref(), Some("42"));
        assert!(template.matches("/users/abc").is_none());
    }

    #[test]
    fn test_match_positional() {
        let template = Template::parse("/credits/?/?").unwrap();
        let vars = template.matches("/credits/2022/11").unwrap();
        assert_eq!(vars.vars_type(), PathVarsType::Positions);
        assert_eq!(vars.get(0).as_deref(), Some("2022"));
        assert_eq!(vars.get(1).as_deref(), Some("11"));
    }

    #[test]
    fn test_match_segment_count_mismatch() {
        let template = Template::parse("/users/{id}").unwrap();
        assert!(template.matches("/users").is_none());
        assert!(template.matches("/users/1/extra").is_none());
    }

    #[test]
    fn test_match_ignores_outer_slashes_and_query() {
        let template = Template::parse("/users/{id}").unwrap();
        assert!(template.matches("users/1/").is_some());
        let vars = template.matches("/users/1?expand=true#top").unwrap();
        assert_eq!(vars.get("id").as_deref(), Some("1"));
    }

    #[test]
    fn test_match_rejects_inner_empty() {
        let template = Template::parse("/a/{b}").unwrap();
        assert!(template.matches("/a/x/").is_some());
        assert!(template.matches("/a//x").is_none());
        assert!(template.matches("//a/x").is_none());
    }

    #[test]
    fn test_match_full_url() {
        let template = Template::parse("/users/{id}").unwrap();
        let vars = template.matches("https://example.com/users/7?x=1").unwrap();
        assert_eq!(vars.get("id").as_deref(), Some("7"));
    }

    #[test]
    fn test_match_decodes_path() {
        let template = Template::parse("/search/{term}").unwrap();
        let vars = template.matches("/search/hello%20world").unwrap();
        assert_eq!(vars.get("term").as_deref(), Some("hello world"));
    }

    #[test]
    fn test_match_composite_order() {
        let template = Template::parse("/{b}-{a}").unwrap();
        let vars = template.matches("/foo-bar").unwrap();
        assert_eq!(vars.all()[0].name.as_deref(), Some("b"));
        assert_eq!(vars.get("b").as_deref(), Some("foo"));
        assert_eq!(vars.get("a").as_deref(), Some("bar"));
    }

    #[test]
    fn test_match_composite_with_patterns() {
        let template = Template::parse("/files/{name:[a-z]+}.{ext:(json|xml)}").unwrap();
        let vars = template.matches("/files/report.json").unwrap();
        assert_eq!(vars.get("name").as_deref(), Some("report"));
        assert_eq!(vars.get("ext").as_deref(), Some("json"));
        assert!(template.matches("/files/report.txt").is_none());
        assert!(template.matches("/files/Report.json").is_none());
    }

    #[test]
    fn test_match_composite_fixed_is_literal() {
        let template = Template::parse("/{a}.+{b}").unwrap();
        assert!(template.matches("/x.+y").is_some());
        assert!(template.matches("/x..y").is_none());
    }

    #[test]
    fn test_composite_regex_compiled_once() {
        let template = Template::parse("/{a}x{b}").unwrap();
        let PathPart::Composite(composite) = &template.parts()[0] else {
            panic!("Expected composite");
        };
        assert!(composite.matcher.get().is_none());
        template.matches("/1x2").unwrap();
        let first = composite.compiled().unwrap() as *const CompositeMatcher;
        template.matches("/3x4").unwrap();
        let second = composite.compiled().unwrap() as *const CompositeMatcher;
        assert_eq!(first, second);
        assert_eq!(
            composite.compiled().unwrap().regex().as_str(),
            "^(?P<vsp0>.*)(x)(?P<vsp2>.*)$"
        );
    }

    #[test]
    fn test_composite_regex_compile_failure_never_matches() {
        let template = Template::parse("/{a}-{b:(?P<vsp0>x)}").unwrap();
        let PathPart::Composite(composite) = &template.parts()[0] else {
            panic!("Expected composite");
        };
        assert!(template.matches("/y-x").is_none());
        assert!(composite.compiled().is_none());
        assert!(template.matches("/z-x").is_none());
    }

    #[test]
    fn test_match_repeated_names() {
        let template = Template::parse("/{id}/sub/{id}").unwrap();
        let vars = template.matches("/1/sub/2").unwrap();
        assert_eq!(vars.get(("id", 0)).as_deref(), Some("1"));
        assert_eq!(vars.get(("id", 1)).as_deref(), Some("2"));
        assert_eq!(vars.all()[1].named_position, 1);
    }

    #[test]
    fn test_match_case_insensitive_option() {
        let options = ParseOptions::new().with_fixed(CaseInsensitiveFixed);
        let template = Template::parse_with("/Users/{id}", options).unwrap();
        assert!(template.matches("/USERS/1").is_some());

        let plain = Template::parse("/Users/{id}").unwrap();
        assert!(plain.matches("/USERS/1").is_none());
        let extra = MatchOptions::new().with_fixed(CaseInsensitiveFixed);
        assert!(plain.matches_with("/USERS/1", &extra).is_some());
    }

    #[test]
    fn test_match_var_option_transforms_and_rejects() {
        let upper = MatchOptions::new().with_var(VarFn::new(|v, _| Some(v.to_uppercase())));
        let template = Template::parse("/{a}/{b}-{c}").unwrap();
        let vars = template.matches_with("/x/y-z", &upper).unwrap();
        assert_eq!(vars.get("a").as_deref(), Some("X"));
        assert_eq!(vars.get("c").as_deref(), Some("Z"));

        let reject_z = MatchOptions::new().with_var(VarFn::new(|v, _| (v != "z").then(|| v.to_string())));
        assert!(template.matches_with("/x/y-z", &reject_z).is_none());
        assert!(template.matches_with("/z/y-x", &reject_z).is_none());
        assert!(template.matches_with("/x/y-w", &reject_z).is_some());
    }

    #[test]
    fn test_var_option_sees_positions() {
        let check = MatchOptions::new().with_var(VarFn::new(|v, ctx| {
            let expected_path_pos = if ctx.position == 0 { 0 } else { 2 };
            let ok = ctx.path_pos == expected_path_pos && ctx.vars.len() == ctx.position;
            ok.then(|| format!("{}@{}", v, ctx.name.unwrap_or("")))
        }));
        let template = Template::parse("/{a}/x/{b}").unwrap();
        let vars = template.matches_with("/1/x/2", &check).unwrap();
        assert_eq!(vars.get("a").as_deref(), Some("1@a"));
        assert_eq!(vars.get("b").as_deref(), Some("2@b"));
    }

    #[test]
    fn test_match_root() {
        let template = Template::parse("/").unwrap();
        assert!(template.matches("/").is_some());
        assert!(template.matches("").is_some());
        assert!(template.matches("/a").is_none());
    }

    #[test]
    fn test_match_request_and_url() {
        let template = Template::parse("/credits/{year:[0-9]{4}}/{month:[0-9]{2}}").unwrap();
        let request = Request::builder()
            .uri("http://www.example.com/credits/2022/11")
            .body(())
            .unwrap();
        let vars = template.matches_request(&request).unwrap();
        assert_eq!(vars.get("year").as_deref(), Some("2022"));
        assert_eq!(vars.get("month").as_deref(), Some("11"));

        let url = Url::parse("http://www.example.com/credits/2022/1").unwrap();
        assert!(template.matches_url(&url).is_none());
    }
}
