use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::config::yml_settings::TemplateSettings;
use crate::domain::path_vars::PathVars;
use crate::domain::template::{
    BuildOptions, CaseInsensitiveFixed, ParseOptions, PathRegexCheck, Template,
};

pub const DEFAULT_CONFIG_FILE: &str = "templates.yml";

/// A parsed template together with the name it is registered under
#[derive(Debug, Clone)]
pub struct NamedTemplate {
    pub name: String,
    pub description: Option<String>,
    pub template: Template,
    regex_check: bool,
}

impl NamedTemplate {
    /// Options for building from this template; `regex_check` enforces var patterns
    pub fn build_options(&self) -> BuildOptions {
        if self.regex_check {
            BuildOptions::new().with_var(PathRegexCheck)
        } else {
            BuildOptions::new()
        }
    }
}

impl TryFrom<TemplateSettings> for NamedTemplate {
    type Error = anyhow::Error;

    fn try_from(value: TemplateSettings) -> Result<Self> {
        let mut options = ParseOptions::new();
        if value.case_insensitive.unwrap_or(false) {
            options = options.with_fixed(CaseInsensitiveFixed);
        }
        let template = Template::parse_with(&value.template, options)
            .with_context(|| format!("Invalid template '{}' for {}", value.template, value.name))?;
        Ok(Self {
            name: value.name,
            description: value.description,
            template,
            regex_check: value.regex_check.unwrap_or(false),
        })
    }
}

/// Named templates in file order
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<NamedTemplate>,
}

impl TemplateRegistry {
    fn from_named(templates: Vec<NamedTemplate>) -> Result<Self> {
        for (i, named) in templates.iter().enumerate() {
            if templates[..i].iter().any(|other| other.name == named.name) {
                bail!("Duplicate template name: {}", named.name);
            }
        }
        Ok(Self { templates })
    }

    pub fn from_settings(settings: Vec<TemplateSettings>) -> Result<Self> {
        let templates = settings
            .into_iter()
            .map(NamedTemplate::try_from)
            .collect::<Result<Vec<_>>>()?;
        Self::from_named(templates)
    }

    pub fn from_yaml(yml: &str) -> Result<Self> {
        let settings: Vec<TemplateSettings> =
            serde_yaml::from_str(yml).context("Invalid yaml configuration")?;
        Self::from_settings(settings)
    }

    /// Loads the given file, or `templates.yml` when none is given
    pub fn load(maybe_yml: Option<&str>) -> Result<Self> {
        let path = maybe_yml.unwrap_or(DEFAULT_CONFIG_FILE);
        let yml = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read file {}", path))?;
        let registry = Self::from_yaml(&yml)?;
        debug!(path, templates = registry.len(), "loaded templates");
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&NamedTemplate> {
        self.templates.iter().find(|named| named.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// The first template, in file order, that matches `path`
    pub fn route(&self, path: &str) -> Option<(&NamedTemplate, PathVars)> {
        self.templates
            .iter()
            .find_map(|named| named.template.matches(path).map(|vars| (named, vars)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YML: &str = r#"
- name: credits
  template: /credits/{year:[0-9]{4}}/{month:[0-9]{2}}
  regex_check: true
- name: user
  template: /Users/{id}
  case_insensitive: true
- name: any
  template: /{section}/{id}
"#;

    #[test]
    fn test_valid_registry() {
        let registry = TemplateRegistry::from_yaml(YML).unwrap();
        assert_eq!(registry.len(), 3);
        assert!(registry.get("credits").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_route_first_match_wins() {
        let registry = TemplateRegistry::from_yaml(YML).unwrap();
        let (named, vars) = registry.route("/credits/2022/11").unwrap();
        assert_eq!(named.name, "credits");
        assert_eq!(vars.get("year").as_deref(), Some("2022"));

        let (named, _) = registry.route("/USERS/7").unwrap();
        assert_eq!(named.name, "user");

        let (named, vars) = registry.route("/credits/22/11").unwrap();
        assert_eq!(named.name, "any");
        assert_eq!(vars.get("section").as_deref(), Some("credits"));

        assert!(registry.route("/a/b/c/d").is_none());
    }

    #[test]
    fn test_regex_check_build_options() {
        let registry = TemplateRegistry::from_yaml(YML).unwrap();
        let credits = registry.get("credits").unwrap();
        let vars = PathVars::from_pairs([("year", "22"), ("month", "11")]);
        assert!(credits.template.path_from(&vars, &credits.build_options()).is_err());

        let any = registry.get("any").unwrap();
        let vars = PathVars::from_pairs([("section", "x"), ("id", "1")]);
        assert_eq!(any.template.path_from(&vars, &any.build_options()).unwrap(), "/x/1");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let yml = "- name: a\n  template: /a\n- name: a\n  template: /b\n";
        let err = TemplateRegistry::from_yaml(yml).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate template name: a");
    }

    #[test]
    fn test_invalid_template_reported() {
        let yml = "- name: broken\n  template: /{id\n";
        let err = TemplateRegistry::from_yaml(yml).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = TemplateRegistry::load(Some("/nonexistent/templates.yml")).unwrap_err();
        assert!(err.to_string().starts_with("Could not read file"));
    }
}
