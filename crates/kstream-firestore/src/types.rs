//! Firestore REST API types and JSON conversion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Firestore document value types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String), // Firestore sends integers as strings
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayValue {
    pub values: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapValue {
    pub fields: Option<HashMap<String, Value>>,
}

/// Firestore document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name
    pub name: Option<String>,
    /// Document fields
    pub fields: Option<HashMap<String, Value>>,
    /// Create time
    pub create_time: Option<String>,
    /// Update time
    pub update_time: Option<String>,
}

impl Document {
    /// Create a new document with the given fields.
    pub fn new(fields: HashMap<String, Value>) -> Self {
        Self {
            name: None,
            fields: Some(fields),
            create_time: None,
            update_time: None,
        }
    }

    /// Document id, i.e. the last segment of the resource name.
    pub fn doc_id(&self) -> Option<&str> {
        self.name.as_deref().and_then(|n| n.rsplit('/').next())
    }
}

/// List documents response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    pub documents: Option<Vec<Document>>,
    pub next_page_token: Option<String>,
}

// ============================================================================
// Structured Query Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    pub from: Vec<CollectionSelector>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    pub collection_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Filter {
    FieldFilter(FieldFilter),
    CompositeFilter(CompositeFilter),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFilter {
    pub field: FieldReference,
    /// One of EQUAL, LESS_THAN, GREATER_THAN, ...
    pub op: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeFilter {
    /// "AND" or "OR".
    pub op: String,
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub field_path: String,
}

impl StructuredQuery {
    /// Query a collection with an equality filter on one or more fields.
    pub fn equals_all(collection: &str, conditions: Vec<(String, Value)>, limit: u32) -> Self {
        let mut filters: Vec<Filter> = conditions
            .into_iter()
            .map(|(path, value)| {
                Filter::FieldFilter(FieldFilter {
                    field: FieldReference { field_path: path },
                    op: "EQUAL".to_string(),
                    value,
                })
            })
            .collect();

        let filter = match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(Filter::CompositeFilter(CompositeFilter {
                op: "AND".to_string(),
                filters,
            })),
        };

        Self {
            from: vec![CollectionSelector {
                collection_id: collection.to_string(),
            }],
            filter,
            limit: Some(limit),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub structured_query: StructuredQuery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
}

// ============================================================================
// Scalar Conversions
// ============================================================================

/// Convert a Rust value to Firestore Value.
pub trait ToFirestoreValue {
    fn to_firestore_value(&self) -> Value;
}

impl ToFirestoreValue for String {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.clone())
    }
}

impl ToFirestoreValue for &str {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.to_string())
    }
}

impl ToFirestoreValue for i64 {
    fn to_firestore_value(&self) -> Value {
        Value::IntegerValue(self.to_string())
    }
}

impl ToFirestoreValue for u64 {
    fn to_firestore_value(&self) -> Value {
        Value::IntegerValue(self.to_string())
    }
}

impl ToFirestoreValue for bool {
    fn to_firestore_value(&self) -> Value {
        Value::BooleanValue(*self)
    }
}

impl ToFirestoreValue for DateTime<Utc> {
    fn to_firestore_value(&self) -> Value {
        Value::TimestampValue(self.to_rfc3339())
    }
}

// ============================================================================
// JSON Conversions
//
// Typed records live in kstream-models as plain Serde structs. Rather than
// hand-mapping every field, repositories serialize to serde_json and convert
// the resulting tree to/from Firestore's Value representation.
// ============================================================================

/// Convert a JSON value to the Firestore wire representation.
pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::NullValue(()),
        serde_json::Value::Bool(b) => Value::BooleanValue(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::IntegerValue(i.to_string())
            } else {
                Value::DoubleValue(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Value::StringValue(s.clone()),
        serde_json::Value::Array(items) => Value::ArrayValue(ArrayValue {
            values: Some(items.iter().map(json_to_value).collect()),
        }),
        serde_json::Value::Object(map) => Value::MapValue(MapValue {
            fields: Some(
                map.iter()
                    .map(|(k, v)| (k.clone(), json_to_value(v)))
                    .collect(),
            ),
        }),
    }
}

/// Convert a Firestore wire value back to JSON.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::NullValue(()) => serde_json::Value::Null,
        Value::BooleanValue(b) => serde_json::Value::Bool(*b),
        Value::IntegerValue(s) => s
            .parse::<i64>()
            .map(serde_json::Value::from)
            .unwrap_or_else(|_| serde_json::Value::String(s.clone())),
        Value::DoubleValue(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::TimestampValue(s)
        | Value::StringValue(s)
        | Value::BytesValue(s)
        | Value::ReferenceValue(s) => serde_json::Value::String(s.clone()),
        Value::ArrayValue(arr) => serde_json::Value::Array(
            arr.values
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(value_to_json)
                .collect(),
        ),
        Value::MapValue(map) => serde_json::Value::Object(
            map.fields
                .as_ref()
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(k, v)| (k.clone(), value_to_json(v)))
                        .collect()
                })
                .unwrap_or_default(),
        ),
    }
}

/// Convert a JSON object to Firestore document fields.
pub fn json_to_fields(json: &serde_json::Value) -> HashMap<String, Value> {
    match json {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), json_to_value(v)))
            .collect(),
        _ => HashMap::new(),
    }
}

/// Convert a document's fields back to a JSON object, adding its id under `id`.
pub fn document_to_json(doc: &Document) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    if let Some(fields) = &doc.fields {
        for (k, v) in fields {
            map.insert(k.clone(), value_to_json(v));
        }
    }
    if let Some(id) = doc.doc_id() {
        map.insert("id".to_string(), serde_json::Value::String(id.to_string()));
    }
    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let json = serde_json::json!({
            "title": "Inception",
            "epNumber": 3,
            "score": 8.5,
            "published": true,
            "tags": ["sci-fi", "thriller"],
            "fileHash": { "sha256": "abc", "size": 1024 },
            "trailer": null,
        });

        let fields = json_to_fields(&json);
        let back: serde_json::Value = serde_json::Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        );
        assert_eq!(back, json);
    }

    #[test]
    fn test_integers_cross_the_wire_as_strings() {
        let value = json_to_value(&serde_json::json!(42));
        match value {
            Value::IntegerValue(s) => assert_eq!(s, "42"),
            other => panic!("expected IntegerValue, got {other:?}"),
        }
    }

    #[test]
    fn test_doc_id_from_resource_name() {
        let doc = Document {
            name: Some(
                "projects/p/databases/(default)/documents/movies/m42".to_string(),
            ),
            fields: None,
            create_time: None,
            update_time: None,
        };
        assert_eq!(doc.doc_id(), Some("m42"));
    }

    #[test]
    fn test_equals_all_builds_composite_filter() {
        let query = StructuredQuery::equals_all(
            "movies",
            vec![
                ("fileHash.sha256".into(), Value::StringValue("abc".into())),
                ("fileHash.size".into(), Value::IntegerValue("10".into())),
            ],
            5,
        );
        match query.filter {
            Some(Filter::CompositeFilter(composite)) => {
                assert_eq!(composite.op, "AND");
                assert_eq!(composite.filters.len(), 2);
            }
            other => panic!("expected composite filter, got {other:?}"),
        }
        assert_eq!(query.limit, Some(5));
    }
}
