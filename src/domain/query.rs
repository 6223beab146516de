// Query string construction

use super::value::PathValue;

/// Query params appended to a generated path
///
/// Keys are emitted sorted unless sorting is switched off, in which case
/// insertion order is kept. A key whose value list is empty, or holds a single
/// bare entry, is emitted without `=`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    params: Vec<(String, Vec<Option<PathValue>>)>,
    sorted: bool,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryParams {
    pub fn new() -> Self {
        Self {
            params: Vec::new(),
            sorted: true,
        }
    }

    /// Builds params from `(key, value)` pairs; repeated keys accumulate values
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PathValue>,
    {
        let mut result = Self::new();
        for (key, value) in pairs {
            result.add(key, value);
        }
        result
    }

    pub fn get(&self, key: &str) -> Option<&PathValue> {
        self.values(key)?.first()?.as_ref()
    }

    pub fn get_index(&self, key: &str, index: isize) -> Option<&PathValue> {
        let values = self.values(key)?;
        let i = if index < 0 {
            values.len().checked_sub(index.unsigned_abs())?
        } else {
            index as usize
        };
        values.get(i)?.as_ref()
    }

    /// Replaces all values of `key`; an absent value leaves the key bare
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PathValue>) -> &mut Self {
        *self.entry(key.into()) = vec![present(value.into())];
        self
    }

    /// Appends a further value for `key`; an absent value is emitted as a bare key
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<PathValue>) -> &mut Self {
        let value = present(value.into());
        self.entry(key.into()).push(value);
        self
    }

    /// Adds `key` with no value
    pub fn add_bare(&mut self, key: impl Into<String>) -> &mut Self {
        self.entry(key.into());
        self
    }

    pub fn del(&mut self, key: &str) -> &mut Self {
        self.params.retain(|(k, _)| k != key);
        self
    }

    pub fn has(&self, key: &str) -> bool {
        self.params.iter().any(|(k, _)| k == key)
    }

    pub fn sorted(&mut self, on: bool) -> &mut Self {
        self.sorted = on;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Renders `?k=v&k2=v2`, or an empty string when there are no params
    pub fn to_query_string(&self) -> String {
        let mut entries: Vec<&(String, Vec<Option<PathValue>>)> = self.params.iter().collect();
        if self.sorted {
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let mut query = String::new();
        for (key, values) in entries {
            let key = urlencoding::encode(key);
            let bare = values.is_empty() || (values.len() == 1 && values[0].is_none());
            if bare {
                push_separator(&mut query);
                query.push_str(&key);
                continue;
            }
            for value in values {
                push_separator(&mut query);
                query.push_str(&key);
                if let Some(value) = value {
                    query.push('=');
                    query.push_str(&urlencoding::encode(&value.to_string()));
                }
            }
        }
        query
    }

    fn values(&self, key: &str) -> Option<&Vec<Option<PathValue>>> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn entry(&mut self, key: String) -> &mut Vec<Option<PathValue>> {
        let index = match self.params.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                self.params.push((key, Vec::new()));
                self.params.len() - 1
            }
        };
        &mut self.params[index].1
    }
}

fn present(value: PathValue) -> Option<PathValue> {
    (!value.is_absent()).then_some(value)
}

fn push_separator(query: &mut String) {
    query.push(if query.is_empty() { '?' } else { '&' });
}
