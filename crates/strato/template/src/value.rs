//! Intrinsic values.
//!
//! The orchestrator emits a small closed set of intrinsics: literal
//! strings and numbers, in-template references, attribute lookups,
//! cross-stack imports and string joins. Each serializes to the control
//! plane's function-object shape (`{"Ref": …}`, `{"Fn::GetAtt": […]}` and
//! so on). Anything beyond this subset is out of scope.

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A property value: literal, intrinsic, or composite.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    Num(i64),
    Bool(bool),
    /// Reference to another resource or parameter in the same template.
    Ref(String),
    /// Attribute of another resource in the same template.
    GetAtt(String, String),
    /// Value exported by another stack, bound at reconcile time.
    ImportValue(String),
    /// Join of parts with a separator.
    Join(String, Vec<Value>),
    List(Vec<Value>),
    /// Nested property map. BTreeMap keeps rendering deterministic.
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn reference(logical_id: impl Into<String>) -> Self {
        Value::Ref(logical_id.into())
    }

    pub fn get_att(logical_id: impl Into<String>, attr: impl Into<String>) -> Self {
        Value::GetAtt(logical_id.into(), attr.into())
    }

    pub fn import(export_name: impl Into<String>) -> Self {
        Value::ImportValue(export_name.into())
    }

    pub fn join(separator: impl Into<String>, parts: Vec<Value>) -> Self {
        Value::Join(separator.into(), parts)
    }

    pub fn map(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Value::Map(entries.into_iter().collect())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Num(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Num(n as i64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Str(s) => serializer.serialize_str(s),
            Value::Num(n) => serializer.serialize_i64(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Ref(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", id)?;
                map.end()
            }
            Value::GetAtt(id, attr) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::GetAtt", &[id.as_str(), attr.as_str()])?;
                map.end()
            }
            Value::ImportValue(name) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::ImportValue", name)?;
                map.end()
            }
            Value::Join(sep, parts) => {
                #[derive(Serialize)]
                struct JoinArgs<'a>(&'a str, &'a [Value]);
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Join", &JoinArgs(sep, parts))?;
                map.end()
            }
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_json(value: &Value) -> String {
        serde_json::to_string(value).unwrap()
    }

    #[test]
    fn ref_shape() {
        assert_eq!(to_json(&Value::reference("MyQueue")), r#"{"Ref":"MyQueue"}"#);
    }

    #[test]
    fn get_att_shape() {
        assert_eq!(
            to_json(&Value::get_att("MyQueue", "Arn")),
            r#"{"Fn::GetAtt":["MyQueue","Arn"]}"#
        );
    }

    #[test]
    fn import_shape() {
        assert_eq!(
            to_json(&Value::import("AcmeStagingGateway")),
            r#"{"Fn::ImportValue":"AcmeStagingGateway"}"#
        );
    }

    #[test]
    fn join_shape() {
        let join = Value::join(
            "",
            vec![Value::str("arn:aws:lambda:"), Value::reference("Fn")],
        );
        assert_eq!(
            to_json(&join),
            r#"{"Fn::Join":["",["arn:aws:lambda:",{"Ref":"Fn"}]]}"#
        );
    }

    #[test]
    fn map_is_key_sorted() {
        let map = Value::map([
            ("zeta".to_string(), Value::from(1i64)),
            ("alpha".to_string(), Value::from(2i64)),
        ]);
        assert_eq!(to_json(&map), r#"{"alpha":2,"zeta":1}"#);
    }
}
