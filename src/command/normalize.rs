//! Request normalization.
//!
//! Turns the buffered inbound body, path parameters and resolved identity
//! into a [`Command`]. JSON bodies use the platform request envelope
//! (`{"id", "ver", "params", "request"}`) and only `request` becomes the
//! payload. Multipart text fields are flattened; the first file part is
//! carried as binary under `image`.

use axum::body::Bytes;
use axum::extract::Multipart;
use serde_json::Value;
use tracing::Span;

use crate::command::error::ParseError;
use crate::command::types::{keys, Command, Environment, Field, Operation, Payload};

/// A file part of a multipart body.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub name: String,
    pub file_name: Option<String>,
    pub data: Bytes,
}

/// A fully drained multipart body.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl MultipartForm {
    /// Drain a multipart stream into memory.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ParseError> {
        let mut form = Self::default();
        while let Some(part) = multipart
            .next_field()
            .await
            .map_err(|e| ParseError::Multipart(e.to_string()))?
        {
            let name = part.name().unwrap_or_default().to_string();
            match part.file_name().map(str::to_string) {
                Some(file_name) => {
                    let data = part
                        .bytes()
                        .await
                        .map_err(|e| ParseError::Multipart(e.to_string()))?;
                    form.files.push(FilePart {
                        name,
                        file_name: Some(file_name),
                        data,
                    });
                }
                None => {
                    let text = part
                        .text()
                        .await
                        .map_err(|e| ParseError::Multipart(e.to_string()))?;
                    form.fields.push((name, text));
                }
            }
        }
        Ok(form)
    }
}

/// Buffered inbound body.
#[derive(Debug, Clone)]
pub enum RawBody {
    Empty,
    Json(Bytes),
    Multipart(MultipartForm),
}

/// Everything the normalizer needs from one HTTP request.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub body: RawBody,
    pub path_params: Vec<(&'static str, String)>,
}

impl Inbound {
    pub fn json(body: Bytes) -> Self {
        Self {
            body: RawBody::Json(body),
            path_params: Vec::new(),
        }
    }

    pub fn path(key: &'static str, value: String) -> Self {
        Self {
            body: RawBody::Empty,
            path_params: vec![(key, value)],
        }
    }

    pub fn multipart(form: MultipartForm) -> Self {
        Self {
            body: RawBody::Multipart(form),
            path_params: Vec::new(),
        }
    }
}

/// Builds commands from inbound requests.
#[derive(Debug, Clone)]
pub struct Normalizer {
    environment: Environment,
    span: Span,
}

impl Normalizer {
    pub fn new(environment: Environment, span: Span) -> Self {
        Self { environment, span }
    }

    pub fn normalize(
        &self,
        operation: Operation,
        inbound: Inbound,
        requester_id: Option<String>,
        request_id: &str,
    ) -> Result<Command, ParseError> {
        let mut payload = match inbound.body {
            RawBody::Empty => Payload::new(),
            RawBody::Json(bytes) => json_payload(&bytes)?,
            RawBody::Multipart(form) => self.multipart_payload(operation, form),
        };

        // Path parameters address the resource and win over body values.
        for (key, value) in inbound.path_params {
            payload.insert_json(key, Value::String(value));
        }

        tracing::debug!(
            parent: &self.span,
            operation = %operation,
            request_id = %request_id,
            fields = payload.len(),
            anonymous = requester_id.is_none(),
            "Request normalized"
        );

        Ok(Command::new(operation, self.environment, payload)
            .with_requester(requester_id)
            .with_request_id(request_id))
    }

    fn multipart_payload(&self, operation: Operation, form: MultipartForm) -> Payload {
        let mut payload = Payload::new();
        for (name, text) in form.fields {
            if !payload.contains(&name) {
                payload.insert_json(name, Value::String(text));
            }
        }

        let mut files = form.files.into_iter();
        if let Some(first) = files.next() {
            payload.insert(keys::IMAGE, Field::Binary(first.data));
        }
        let ignored: Vec<String> = files.map(|f| f.file_name.unwrap_or(f.name)).collect();
        if !ignored.is_empty() {
            tracing::warn!(
                parent: &self.span,
                operation = %operation,
                ignored = ?ignored,
                "Only the first file part is kept"
            );
        }
        payload
    }
}

fn json_payload(bytes: &Bytes) -> Result<Payload, ParseError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Payload::new());
    }
    let Value::Object(mut envelope) = serde_json::from_slice::<Value>(bytes)? else {
        return Err(ParseError::NotAnObject);
    };
    match envelope.remove("request") {
        None | Some(Value::Null) => Ok(Payload::new()),
        Some(Value::Object(request)) => Ok(Payload::from_json(request)),
        Some(_) => Err(ParseError::NotAnObject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalizer() -> Normalizer {
        Normalizer::new(Environment::Dev, Span::none())
    }

    fn file(name: &str, data: &'static [u8]) -> FilePart {
        FilePart {
            name: name.to_string(),
            file_name: Some(format!("{name}.png")),
            data: Bytes::from_static(data),
        }
    }

    #[test]
    fn test_json_request_passes_unknown_fields() {
        let body = json!({
            "id": "api.course.enroll",
            "params": { "msgid": "m-1" },
            "request": { "courseId": "do_1", "batchId": "b-7" }
        });
        let command = normalizer()
            .normalize(
                Operation::EnrollCourse,
                Inbound::json(Bytes::from(body.to_string())),
                Some("u-1".to_string()),
                "req-7",
            )
            .unwrap();

        assert_eq!(command.operation, Operation::EnrollCourse);
        assert_eq!(command.requester_id.as_deref(), Some("u-1"));
        assert_eq!(command.request_id.as_deref(), Some("req-7"));
        assert_eq!(command.payload.str("courseId"), Some("do_1"));
        assert_eq!(command.payload.str("batchId"), Some("b-7"));
        assert!(!command.payload.contains("params"));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let result = normalizer().normalize(
            Operation::GetContent,
            Inbound::json(Bytes::from_static(b"{\"request\": ")),
            None,
            "req-1",
        );
        assert!(matches!(result, Err(ParseError::Json(_))));

        let result = normalizer().normalize(
            Operation::GetContent,
            Inbound::json(Bytes::from_static(b"[1, 2]")),
            None,
            "req-1",
        );
        assert!(matches!(result, Err(ParseError::NotAnObject)));
    }

    #[test]
    fn test_empty_body_yields_empty_payload() {
        let command = normalizer()
            .normalize(Operation::SearchBadgeClass, Inbound::json(Bytes::new()), None, "req-1")
            .unwrap();
        assert!(command.payload.is_empty());
    }

    #[test]
    fn test_path_param_overrides_body() {
        let mut inbound = Inbound::json(Bytes::from(
            json!({ "request": { "badgeId": "from-body" } }).to_string(),
        ));
        inbound.path_params.push((keys::BADGE_ID, "from-path".to_string()));

        let command = normalizer()
            .normalize(Operation::GetBadgeClass, inbound, None, "req-1")
            .unwrap();
        assert_eq!(command.payload.str(keys::BADGE_ID), Some("from-path"));
    }

    #[test]
    fn test_multipart_single_file_goes_under_image() {
        let form = MultipartForm {
            fields: vec![
                ("name".to_string(), "Gold".to_string()),
                ("name".to_string(), "Silver".to_string()),
            ],
            files: vec![file("image", b"\x89PNG")],
        };
        let command = normalizer()
            .normalize(Operation::CreateBadgeClass, Inbound::multipart(form), None, "req-1")
            .unwrap();

        assert_eq!(command.payload.str("name"), Some("Gold"));
        assert_eq!(
            command.payload.binary(keys::IMAGE).map(|b| b.as_ref()),
            Some(&b"\x89PNG"[..])
        );
    }

    #[test]
    fn test_multipart_without_file_has_no_image() {
        let form = MultipartForm {
            fields: vec![("name".to_string(), "Gold".to_string())],
            files: Vec::new(),
        };
        let command = normalizer()
            .normalize(Operation::CreateBadgeClass, Inbound::multipart(form), None, "req-1")
            .unwrap();
        assert!(!command.payload.contains(keys::IMAGE));
    }

    #[test]
    fn test_multipart_extra_files_are_ignored() {
        let form = MultipartForm {
            fields: Vec::new(),
            files: vec![file("first", b"one"), file("second", b"two")],
        };
        let command = normalizer()
            .normalize(Operation::CreateBadgeClass, Inbound::multipart(form), None, "req-1")
            .unwrap();
        assert_eq!(
            command.payload.binary(keys::IMAGE).map(|b| b.as_ref()),
            Some(&b"one"[..])
        );
        assert_eq!(command.payload.len(), 1);
    }
}
