// Host and header helpers used when building full requests

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use super::value::PathValue;
use crate::error::BuildError;

/// Address prepended verbatim to a generated path, e.g. `https://example.com`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    address: String,
}

impl Host {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl From<&Url> for Host {
    /// Uses the URL's origin (`scheme://host[:port]`), dropping any path
    fn from(url: &Url) -> Self {
        Self::new(url.origin().ascii_serialization())
    }
}

impl From<&str> for Host {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

/// Headers set on a request generated from a template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headers {
    entries: Vec<(String, PathValue)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PathValue>,
    {
        let mut result = Self::new();
        for (key, value) in pairs {
            result.set(key, value);
        }
        result
    }

    /// Sets a header, replacing any previous value for the same key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PathValue>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&PathValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn del(&mut self, key: &str) -> &mut Self {
        self.entries.retain(|(k, _)| k != key);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes every header into `map`, replacing existing values
    pub fn apply_to(&self, map: &mut HeaderMap) -> Result<(), BuildError> {
        for (key, value) in &self.entries {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| BuildError::Header(format!("{}: {}", key, e)))?;
            let value = HeaderValue::from_str(&value.to_string())
                .map_err(|e| BuildError::Header(format!("{}: {}", key, e)))?;
            map.insert(name, value);
        }
        Ok(())
    }
}
