// Common test utilities shared across test files

use std::io::Write;

use tempfile::NamedTempFile;
use urit::Template;

/// Parse a template, panicking with the parse error on failure
#[allow(dead_code)]
pub fn template(text: &str) -> Template {
    Template::parse(text).unwrap_or_else(|e| panic!("Failed to parse '{}': {}", text, e))
}

/// Write a templates file to a temporary location
#[allow(dead_code)]
pub fn templates_file(yml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(yml.as_bytes())
        .expect("Failed to write templates file");
    file
}
