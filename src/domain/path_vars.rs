// Ordered containers of path variable values

use std::collections::HashMap;

use serde::Serialize;

use super::value::PathValue;
use crate::error::PathVarsError;

/// Addressing mode of a template or a path vars container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathVarsType {
    Positions,
    Names,
}

/// One realized occurrence of a path variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathVar {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Index among the occurrences of the same name
    pub named_position: usize,
    /// Index among all vars
    pub position: usize,
    pub value: PathValue,
}

/// Identifies a var for [`PathVars::get`]
///
/// Integers address by position, strings by first occurrence of a name,
/// and `(name, n)` by the n-th occurrence. Negative indices count from the end.
#[derive(Debug, Clone, PartialEq)]
pub enum VarIdent {
    Position(isize),
    Name(String),
    NameAt(String, isize),
}

impl From<isize> for VarIdent {
    fn from(value: isize) -> Self {
        VarIdent::Position(value)
    }
}

impl From<i32> for VarIdent {
    fn from(value: i32) -> Self {
        VarIdent::Position(value as isize)
    }
}

impl From<usize> for VarIdent {
    fn from(value: usize) -> Self {
        VarIdent::Position(value as isize)
    }
}

impl From<&str> for VarIdent {
    fn from(value: &str) -> Self {
        VarIdent::Name(value.to_string())
    }
}

impl From<String> for VarIdent {
    fn from(value: String) -> Self {
        VarIdent::Name(value)
    }
}

impl From<(&str, isize)> for VarIdent {
    fn from((name, position): (&str, isize)) -> Self {
        VarIdent::NameAt(name.to_string(), position)
    }
}

impl From<(&str, i32)> for VarIdent {
    fn from((name, position): (&str, i32)) -> Self {
        VarIdent::NameAt(name.to_string(), position as isize)
    }
}

/// Path vars passed into a template for building, or extracted from a path by matching
///
/// The addressing mode is fixed at construction; a positional container refuses
/// named values and vice versa.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathVars {
    #[serde(rename = "type")]
    vars_type: PathVarsType,
    #[serde(rename = "vars")]
    all: Vec<PathVar>,
    #[serde(skip)]
    named: HashMap<String, Vec<usize>>,
}

impl PathVars {
    pub fn new(vars_type: PathVarsType) -> Self {
        Self {
            vars_type,
            all: Vec::new(),
            named: HashMap::new(),
        }
    }

    /// Empty positional container
    pub fn positional() -> Self {
        Self::new(PathVarsType::Positions)
    }

    /// Empty named container
    pub fn named() -> Self {
        Self::new(PathVarsType::Names)
    }

    /// Positional container holding the given values in order
    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<PathValue>,
    {
        let mut result = Self::positional();
        for value in values {
            result.push_positional(value.into());
        }
        result
    }

    /// Named container holding the given `(name, value)` pairs in order
    ///
    /// Repeating a name adds a further occurrence of it.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PathValue>,
    {
        let mut result = Self::named();
        for (name, value) in pairs {
            result.push_named(name.into(), value.into());
        }
        result
    }

    /// Named container from a JSON object; array values add one occurrence per element
    pub fn from_json_object(map: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut result = Self::named();
        for (name, value) in map {
            match value {
                serde_json::Value::Array(items) => {
                    for item in items {
                        result.push_named(name.clone(), PathValue::from(item.clone()));
                    }
                }
                other => result.push_named(name.clone(), PathValue::from(other.clone())),
            }
        }
        result
    }

    pub fn vars_type(&self) -> PathVarsType {
        self.vars_type
    }

    /// `None` when out of range or when the stored value is absent (JSON `null`)
    pub fn get_positional(&self, position: isize) -> Option<String> {
        let i = resolve_index(self.all.len(), position)?;
        present(&self.all[i].value)
    }

    pub fn get_named(&self, name: &str, position: isize) -> Option<String> {
        let indexes = self.named.get(name)?;
        let i = resolve_index(indexes.len(), position)?;
        present(&self.all[indexes[i]].value)
    }

    pub fn get_named_first(&self, name: &str) -> Option<String> {
        self.get_named(name, 0)
    }

    pub fn get_named_last(&self, name: &str) -> Option<String> {
        self.get_named(name, -1)
    }

    pub fn get(&self, ident: impl Into<VarIdent>) -> Option<String> {
        match ident.into() {
            VarIdent::Position(position) => self.get_positional(position),
            VarIdent::Name(name) => self.get_named_first(&name),
            VarIdent::NameAt(name, position) => self.get_named(&name, position),
        }
    }

    /// Number of occurrences recorded for a name
    pub fn named_count(&self, name: &str) -> usize {
        self.named.get(name).map_or(0, |v| v.len())
    }

    pub fn all(&self) -> &[PathVar] {
        &self.all
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn clear(&mut self) {
        self.all.clear();
        self.named.clear();
    }

    pub fn add_named(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PathValue>,
    ) -> Result<(), PathVarsError> {
        if self.vars_type != PathVarsType::Names {
            return Err(PathVarsError::NamedIntoPositional);
        }
        self.push_named(name.into(), value.into());
        Ok(())
    }

    pub fn add_positional(&mut self, value: impl Into<PathValue>) -> Result<(), PathVarsError> {
        if self.vars_type != PathVarsType::Positions {
            return Err(PathVarsError::PositionalIntoNamed);
        }
        self.push_positional(value.into());
        Ok(())
    }

    fn push_named(&mut self, name: String, value: PathValue) {
        let occurrences = self.named.entry(name.clone()).or_default();
        let var = PathVar {
            name: Some(name),
            named_position: occurrences.len(),
            position: self.all.len(),
            value,
        };
        occurrences.push(self.all.len());
        self.all.push(var);
    }

    fn push_positional(&mut self, value: PathValue) {
        self.all.push(PathVar {
            name: None,
            named_position: 0,
            position: self.all.len(),
            value,
        });
    }
}

/// Maps a possibly negative index onto `0..len`
fn present(value: &PathValue) -> Option<String> {
    (!value.is_absent()).then(|| value.to_string())
}

fn resolve_index(len: usize, position: isize) -> Option<usize> {
    if position < 0 {
        let back = position.unsigned_abs();
        (back <= len).then(|| len - back)
    } else {
        let position = position as usize;
        (position < len).then_some(position)
    }
}
