//! Generic resources.
//!
//! A resource is a typed kind string plus a property map and explicit
//! ordering dependencies. The topology crate owns the concrete shapes;
//! this stays a thin, deterministic carrier.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::value::Value;

/// One provisionable resource in a template.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Resource {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Properties", skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
    #[serde(rename = "DependsOn", skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            properties: BTreeMap::new(),
            depends_on: Vec::new(),
        }
    }

    /// Set a property. Later sets of the same key win.
    pub fn prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Declare an explicit ordering dependency on another logical id.
    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.push(logical_id.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}
