use serde::{Deserialize, Serialize};

/// One entry of a templates file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct TemplateSettings {
    pub name: String,
    pub template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_insensitive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex_check: Option<bool>,
}
