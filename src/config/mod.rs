// Configuration: named templates loaded from YAML

pub mod templates;
pub mod yml_settings;
