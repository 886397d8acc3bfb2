//! The template document.
//!
//! Groups parameters, resources and outputs under stable logical ids.
//! All sections are BTreeMap-backed so a template's rendered form does not
//! depend on insertion order.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::resource::Resource;
use crate::value::Value;

pub const FORMAT_VERSION: &str = "2010-09-09";

/// A declared template parameter with a default.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Default")]
    pub default: Value,
}

impl Parameter {
    pub fn number(default: i64) -> Self {
        Self {
            kind: "Number".into(),
            default: Value::Num(default),
        }
    }

    pub fn string(default: impl Into<String>) -> Self {
        Self {
            kind: "String".into(),
            default: Value::Str(default.into()),
        }
    }
}

/// A value exported from a stack, optionally under a cross-stack export
/// name so other stacks can import it by reference.
#[derive(Clone, Debug, PartialEq)]
pub struct Output {
    pub value: Value,
    pub description: Option<String>,
    pub export_name: Option<String>,
}

impl Output {
    pub fn value(value: Value) -> Self {
        Self {
            value,
            description: None,
            export_name: None,
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn exported(mut self, name: impl Into<String>) -> Self {
        self.export_name = Some(name.into());
        self
    }
}

impl Serialize for Output {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut len = 1;
        if self.description.is_some() {
            len += 1;
        }
        if self.export_name.is_some() {
            len += 1;
        }
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(desc) = &self.description {
            map.serialize_entry("Description", desc)?;
        }
        if let Some(name) = &self.export_name {
            let mut export = BTreeMap::new();
            export.insert("Name", name.as_str());
            map.serialize_entry("Export", &export)?;
        }
        map.serialize_entry("Value", &self.value)?;
        map.end()
    }
}

/// A full declared-state document: the unit of stack reconciliation.
///
/// Built fresh every run and replaced wholesale, never patched.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Parameters", skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, Resource>,
    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

impl Template {
    pub fn new() -> Self {
        Self {
            format_version: FORMAT_VERSION.into(),
            ..Default::default()
        }
    }

    pub fn described(description: impl Into<String>) -> Self {
        let mut t = Self::new();
        t.description = Some(description.into());
        t
    }

    /// Add a parameter and return a reference to it.
    pub fn add_parameter(&mut self, logical_id: impl Into<String>, parameter: Parameter) -> Value {
        let id = logical_id.into();
        self.parameters.insert(id.clone(), parameter);
        Value::Ref(id)
    }

    /// Add a resource under its logical id, returning the id for wiring.
    pub fn add_resource(&mut self, logical_id: impl Into<String>, resource: Resource) -> String {
        let id = logical_id.into();
        self.resources.insert(id.clone(), resource);
        id
    }

    pub fn add_output(&mut self, logical_id: impl Into<String>, output: Output) {
        self.outputs.insert(logical_id.into(), output);
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    pub fn resource_mut(&mut self, logical_id: &str) -> Option<&mut Resource> {
        self.resources.get_mut(logical_id)
    }

    /// Logical ids of resources of the given kind.
    pub fn resources_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a str> {
        self.resources
            .iter()
            .filter(move |(_, r)| r.kind == kind)
            .map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_ref_round_trip() {
        let mut t = Template::new();
        let memory = t.add_parameter("MemorySize", Parameter::number(3008));
        assert_eq!(memory, Value::Ref("MemorySize".into()));
        assert!(t.parameters.contains_key("MemorySize"));
    }

    #[test]
    fn output_export_shape() {
        let out = Output::value(Value::reference("Gateway")).exported("AcmeStagingGateway");
        let json = serde_json::to_string(&out).unwrap();
        assert_eq!(
            json,
            r#"{"Export":{"Name":"AcmeStagingGateway"},"Value":{"Ref":"Gateway"}}"#
        );
    }

    #[test]
    fn resources_of_kind_filters() {
        let mut t = Template::new();
        t.add_resource("A", Resource::new("Service::Queue"));
        t.add_resource("B", Resource::new("Service::Topic"));
        t.add_resource("C", Resource::new("Service::Queue"));
        let queues: Vec<_> = t.resources_of_kind("Service::Queue").collect();
        assert_eq!(queues, vec!["A", "C"]);
    }
}
