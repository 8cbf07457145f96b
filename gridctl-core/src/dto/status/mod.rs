//! Status record DTOs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of an information service response
///
/// Attribute names are backend specific (e.g. `nordugrid-job-status`); every
/// attribute may carry several values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl StatusRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value to an attribute, keeping earlier values
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.attributes
            .entry(name.to_string())
            .or_default()
            .push(value.into());
    }

    /// First value of an attribute
    pub fn first(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of an attribute, empty when absent
    pub fn all(&self, name: &str) -> &[String] {
        self.attributes.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}
