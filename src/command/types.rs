//! Command model shared by the normalizer, validator and dispatcher.

use std::collections::BTreeMap;
use std::fmt;

use axum::body::Bytes;
use base64::Engine;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

/// Well-known payload keys.
pub mod keys {
    pub const USER_ID: &str = "userId";
    pub const COURSE: &str = "course";
    pub const COURSE_ID: &str = "courseId";
    pub const COURSE_IDS: &str = "courseIds";
    pub const CONTENT_ID: &str = "contentId";
    pub const CONTENT_IDS: &str = "contentIds";
    pub const CONTENTS: &str = "contents";
    pub const COURSES: &str = "courses";
    pub const CONTENT_LIST: &str = "contentList";
    pub const BADGE_ID: &str = "badgeId";
    pub const IMAGE: &str = "image";
    pub const FILTERS: &str = "filters";
}

/// Operations understood by the processing subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    EnrollCourse,
    GetCourse,
    GetContent,
    AddContent,
    CreateBadgeClass,
    GetBadgeClass,
    SearchBadgeClass,
    DeleteBadgeClass,
}

impl Operation {
    /// Name the processing subsystem routes on.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::EnrollCourse => "enrollCourse",
            Operation::GetCourse => "getCourse",
            Operation::GetContent => "getContent",
            Operation::AddContent => "addContent",
            Operation::CreateBadgeClass => "createBadgeClass",
            Operation::GetBadgeClass => "getBadgeClass",
            Operation::SearchBadgeClass => "searchBadgeClass",
            Operation::DeleteBadgeClass => "deleteBadgeClass",
        }
    }

    /// Public API id reported in response envelopes.
    pub fn api_id(&self) -> &'static str {
        match self {
            Operation::EnrollCourse => "api.course.enroll",
            Operation::GetCourse => "api.user.courses",
            Operation::GetContent => "api.content.state.read",
            Operation::AddContent => "api.content.state.update",
            Operation::CreateBadgeClass => "api.issuer.badge.create",
            Operation::GetBadgeClass => "api.issuer.badge.read",
            Operation::SearchBadgeClass => "api.issuer.badge.search",
            Operation::DeleteBadgeClass => "api.issuer.badge.delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Deployment environment stamped on every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Qa,
    Prod,
}

/// A single payload value.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Json(Value),
    Binary(Bytes),
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Json(value) => value.serialize(serializer),
            Field::Binary(bytes) => serializer
                .serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes)),
        }
    }
}

/// Key-value payload of a command. JSON `null` counts as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(BTreeMap<String, Field>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(map: serde_json::Map<String, Value>) -> Self {
        Self(map.into_iter().map(|(k, v)| (k, Field::Json(v))).collect())
    }

    pub fn insert(&mut self, key: impl Into<String>, field: Field) {
        self.0.insert(key.into(), field);
    }

    pub fn insert_json(&mut self, key: impl Into<String>, value: Value) {
        self.insert(key, Field::Json(value));
    }

    /// Field under `key`, treating JSON `null` as missing.
    pub fn get(&self, key: &str) -> Option<&Field> {
        match self.0.get(key) {
            Some(Field::Json(Value::Null)) | None => None,
            Some(field) => Some(field),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn json(&self, key: &str) -> Option<&Value> {
        match self.get(key) {
            Some(Field::Json(value)) => Some(value),
            _ => None,
        }
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.json(key).and_then(Value::as_str)
    }

    pub fn array(&self, key: &str) -> Option<&Vec<Value>> {
        self.json(key).and_then(Value::as_array)
    }

    pub fn binary(&self, key: &str) -> Option<&Bytes> {
        match self.get(key) {
            Some(Field::Binary(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// Keeps only the listed keys.
    pub fn retain_keys(&mut self, keep: &[&str]) {
        self.0.retain(|k, _| keep.contains(&k.as_str()));
    }

    /// Converts the payload into a JSON object; binary fields become base64.
    pub fn into_json(self) -> serde_json::Map<String, Value> {
        self.0
            .into_iter()
            .map(|(k, field)| {
                let value = match field {
                    Field::Json(value) => value,
                    Field::Binary(bytes) => {
                        Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
                    }
                };
                (k, value)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Canonical internal representation of one inbound API call.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub operation: Operation,
    pub correlation_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(rename = "requestedBy", skip_serializing_if = "Option::is_none")]
    pub requester_id: Option<String>,
    pub environment: Environment,
    #[serde(rename = "request")]
    pub payload: Payload,
}

impl Command {
    pub fn new(operation: Operation, environment: Environment, payload: Payload) -> Self {
        Self {
            operation,
            correlation_id: Uuid::new_v4(),
            request_id: None,
            requester_id: None,
            environment,
            payload,
        }
    }

    pub fn with_requester(mut self, requester_id: Option<String>) -> Self {
        self.requester_id = requester_id;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_counts_as_absent() {
        let mut payload = Payload::new();
        payload.insert_json("courseIds", Value::Null);
        payload.insert_json("contentIds", json!(["do_1"]));

        assert!(!payload.contains("courseIds"));
        assert!(payload.contains("contentIds"));
        assert_eq!(payload.array("contentIds").map(Vec::len), Some(1));
    }

    #[test]
    fn test_binary_serializes_as_base64() {
        let mut payload = Payload::new();
        payload.insert("image", Field::Binary(Bytes::from_static(b"png")));
        payload.insert_json("name", json!("Gold"));

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, json!({ "image": "cG5n", "name": "Gold" }));
    }

    #[test]
    fn test_command_wire_shape() {
        let mut payload = Payload::new();
        payload.insert_json("userId", json!("u-1"));
        let command = Command::new(Operation::GetCourse, Environment::Qa, payload)
            .with_requester(Some("admin".to_string()));

        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value["operation"], "getCourse");
        assert_eq!(value["environment"], "qa");
        assert_eq!(value["requestedBy"], "admin");
        assert_eq!(value["request"]["userId"], "u-1");
        assert!(value.get("requestId").is_none());
    }
}
