//! Data retriever module
//!
//! This module provides utilities for implementing DataRetriever.

use crate::provider::{DataRetriever, DataRetrieverError};
use cql_engine_types::{CqlCode, CqlInterval, CqlTuple, CqlValue};
use async_trait::async_trait;
use std::collections::HashMap;

/// NoOp data retriever for testing
pub struct NoOpDataRetriever;

#[async_trait]
impl DataRetriever for NoOpDataRetriever {
    async fn retrieve(
        &self,
        _context: &str,
        _data_type: &str,
        _code_path: Option<&str>,
        _codes: Option<&[CqlCode]>,
        _valueset: Option<&str>,
        _date_path: Option<&str>,
        _date_range: Option<&CqlInterval>,
    ) -> Result<Vec<CqlValue>, DataRetrieverError> {
        Ok(vec![])
    }
}

impl NoOpDataRetriever {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpDataRetriever {
    fn default() -> Self {
        Self::new()
    }
}

/// A `DataRetriever` backed by an in-memory JSON bundle, for CLI/test use
/// where there is no live FHIR server.
///
/// Accepts either a FHIR-style `Bundle` (`{"entry": [{"resource": {...}}]}`)
/// or a flat map keyed by resource type (`{"Patient": [{...}], ...}`).
/// Resources are converted to `CqlValue::Tuple` recursively; fields are not
/// reshaped to match any particular model's element names, so callers whose
/// `ModelInfo` expects different field names should adapt the JSON upstream.
pub struct JsonDataRetriever {
    by_type: HashMap<String, Vec<CqlValue>>,
}

impl JsonDataRetriever {
    /// Build a retriever from a parsed JSON document.
    pub fn from_json(doc: &serde_json::Value) -> Self {
        let mut by_type: HashMap<String, Vec<CqlValue>> = HashMap::new();

        if let Some(entries) = doc.get("entry").and_then(|e| e.as_array()) {
            for entry in entries {
                if let Some(resource) = entry.get("resource") {
                    Self::insert_resource(&mut by_type, resource);
                }
            }
        } else if let Some(obj) = doc.as_object() {
            for (type_name, resources) in obj {
                let list = match resources.as_array() {
                    Some(arr) => arr.clone(),
                    None => vec![resources.clone()],
                };
                for resource in &list {
                    by_type
                        .entry(type_name.clone())
                        .or_default()
                        .push(json_to_cql_value(resource));
                }
            }
        }

        log::debug!(
            "loaded {} resource types ({} resources total) from JSON",
            by_type.len(),
            by_type.values().map(Vec::len).sum::<usize>()
        );
        Self { by_type }
    }

    fn insert_resource(by_type: &mut HashMap<String, Vec<CqlValue>>, resource: &serde_json::Value) {
        if let Some(type_name) = resource.get("resourceType").and_then(|v| v.as_str()) {
            by_type
                .entry(type_name.to_string())
                .or_default()
                .push(json_to_cql_value(resource));
        }
    }
}

/// Recursively convert a `serde_json::Value` into a `CqlValue`.
///
/// Objects become `Tuple`s, arrays become `List`s; numbers round-trip through
/// `Decimal` so both integral and fractional JSON numbers survive exactly.
/// This is a structural conversion only - it does not know about CQL's
/// `Date`/`DateTime`/`Quantity` shapes, so a resource whose JSON encodes those
/// as plain strings/objects keeps that shape as a `String`/`Tuple` until an
/// operator (e.g. `ToDateTime`) converts it explicitly.
pub fn json_to_cql_value(value: &serde_json::Value) -> CqlValue {
    use rust_decimal::Decimal;
    use std::str::FromStr;

    match value {
        serde_json::Value::Null => CqlValue::Null,
        serde_json::Value::Bool(b) => CqlValue::Boolean(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                match i32::try_from(i) {
                    Ok(i32_val) => CqlValue::Integer(i32_val),
                    Err(_) => CqlValue::Long(i),
                }
            } else {
                Decimal::from_str(&n.to_string())
                    .map(CqlValue::Decimal)
                    .unwrap_or(CqlValue::Null)
            }
        }
        serde_json::Value::String(s) => CqlValue::String(s.clone()),
        serde_json::Value::Array(items) => {
            CqlValue::List(cql_engine_types::CqlList::from_elements(
                items.iter().map(json_to_cql_value).collect::<Vec<_>>(),
            ))
        }
        serde_json::Value::Object(map) => {
            let mut tuple = CqlTuple::new();
            for (key, v) in map {
                tuple.elements.insert(key.clone(), json_to_cql_value(v));
            }
            CqlValue::Tuple(tuple)
        }
    }
}

#[async_trait]
impl DataRetriever for JsonDataRetriever {
    async fn retrieve(
        &self,
        _context: &str,
        data_type: &str,
        code_path: Option<&str>,
        codes: Option<&[CqlCode]>,
        _value_set: Option<&str>,
        _date_path: Option<&str>,
        _date_range: Option<&CqlInterval>,
    ) -> Result<Vec<CqlValue>, DataRetrieverError> {
        let resources = self.by_type.get(data_type).cloned().unwrap_or_default();

        // Push down a code filter only when we were given explicit codes to
        // match against; value-set and date filtering are left to the engine.
        let Some(code_path) = code_path else {
            return Ok(resources);
        };
        let Some(codes) = codes else {
            return Ok(resources);
        };
        if codes.is_empty() {
            return Ok(resources);
        }

        let filtered = resources
            .into_iter()
            .filter(|resource| {
                let CqlValue::Tuple(tuple) = resource else {
                    return true;
                };
                match tuple.get(code_path) {
                    Some(CqlValue::Tuple(coding)) => coding
                        .get("code")
                        .and_then(|c| c.as_string())
                        .map(|code| codes.iter().any(|want| want.code == code))
                        .unwrap_or(true),
                    _ => true,
                }
            })
            .collect();

        Ok(filtered)
    }
}
