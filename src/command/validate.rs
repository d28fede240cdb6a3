//! Per-operation validation.
//!
//! Each operation maps to a [`Rule`]: the fields it requires, an optional
//! cross-field check, and the payload shape forwarded once the rule passes.
//! Requirements are checked in declared order and the first failure wins.

use serde_json::{Map, Value};

use crate::command::error::{ErrorCode, ValidationError};
use crate::command::types::{keys, Command, Operation, Payload};

#[derive(Debug, Clone, Copy)]
enum Requirement {
    /// Non-blank string; the code is reported when it is missing.
    Text(&'static str, ErrorCode),
    /// Non-empty JSON array.
    List(&'static str),
    /// JSON object.
    Object(&'static str),
    /// Non-empty binary field.
    Binary(&'static str),
}

type Check = fn(&Payload) -> Result<(), ValidationError>;
type Shape = fn(Payload) -> Payload;

struct Rule {
    requires: &'static [Requirement],
    check: Option<Check>,
    shape: Shape,
}

const MISSING: ErrorCode = ErrorCode::MandatoryParameterMissing;

static ENROLL_COURSE: Rule = Rule {
    requires: &[Requirement::Text(keys::COURSE_ID, ErrorCode::InvalidRequestData)],
    check: None,
    shape: nest_under_course,
};

static GET_COURSE: Rule = Rule {
    requires: &[Requirement::Text(keys::USER_ID, MISSING)],
    check: None,
    shape: unchanged,
};

static GET_CONTENT: Rule = Rule {
    requires: &[],
    check: Some(check_content_selector),
    shape: shape_content_selector,
};

static ADD_CONTENT: Rule = Rule {
    requires: &[
        Requirement::List(keys::CONTENTS),
        Requirement::Text(keys::USER_ID, MISSING),
    ],
    check: Some(check_content_entries),
    shape: keep_contents_and_user,
};

static CREATE_BADGE_CLASS: Rule = Rule {
    requires: &[
        Requirement::Text("issuerId", MISSING),
        Requirement::Text("name", MISSING),
        Requirement::Text("description", MISSING),
        Requirement::Text("criteria", MISSING),
        Requirement::Text("rootOrgId", MISSING),
        Requirement::Text("type", MISSING),
        Requirement::Text("roles", MISSING),
        Requirement::Binary(keys::IMAGE),
    ],
    check: None,
    shape: unchanged,
};

static BADGE_BY_ID: Rule = Rule {
    requires: &[Requirement::Text(keys::BADGE_ID, MISSING)],
    check: None,
    shape: unchanged,
};

static SEARCH_BADGE_CLASS: Rule = Rule {
    requires: &[Requirement::Object(keys::FILTERS)],
    check: None,
    shape: unchanged,
};

fn rule(operation: Operation) -> &'static Rule {
    match operation {
        Operation::EnrollCourse => &ENROLL_COURSE,
        Operation::GetCourse => &GET_COURSE,
        Operation::GetContent => &GET_CONTENT,
        Operation::AddContent => &ADD_CONTENT,
        Operation::CreateBadgeClass => &CREATE_BADGE_CLASS,
        Operation::GetBadgeClass | Operation::DeleteBadgeClass => &BADGE_BY_ID,
        Operation::SearchBadgeClass => &SEARCH_BADGE_CLASS,
    }
}

/// Check `command` against its operation's rule and return it in the shape
/// the processing subsystem expects.
pub fn validate(mut command: Command) -> Result<Command, ValidationError> {
    let rule = rule(command.operation);
    for requirement in rule.requires {
        requirement.check(&command.payload)?;
    }
    if let Some(check) = rule.check {
        check(&command.payload)?;
    }
    command.payload = (rule.shape)(command.payload);
    Ok(command)
}

impl Requirement {
    fn check(&self, payload: &Payload) -> Result<(), ValidationError> {
        match *self {
            Requirement::Text(key, code) => match payload.get(key) {
                None => Err(missing_with(code, key)),
                Some(_) => match payload.str(key) {
                    Some(s) if !s.trim().is_empty() => Ok(()),
                    Some(_) => Err(missing_with(code, key)),
                    None => Err(ValidationError::invalid_value(key)),
                },
            },
            Requirement::List(key) => match payload.get(key) {
                None => Err(ValidationError::missing(key)),
                Some(_) => match payload.array(key) {
                    Some(items) if !items.is_empty() => Ok(()),
                    Some(_) => Err(ValidationError::missing(key)),
                    None => Err(ValidationError::invalid_value(key)),
                },
            },
            Requirement::Object(key) => match payload.json(key) {
                Some(Value::Object(_)) => Ok(()),
                Some(_) => Err(ValidationError::invalid_value(key)),
                None if payload.contains(key) => Err(ValidationError::invalid_value(key)),
                None => Err(ValidationError::missing(key)),
            },
            Requirement::Binary(key) => match payload.binary(key) {
                Some(bytes) if !bytes.is_empty() => Ok(()),
                _ => Err(ValidationError::missing(key)),
            },
        }
    }
}

fn missing_with(code: ErrorCode, key: &str) -> ValidationError {
    match code {
        ErrorCode::InvalidRequestData => ValidationError::new(code, format!("{key} is required")),
        _ => ValidationError::missing(key),
    }
}

/// Which id sets a content-state read selects on.
enum Selector<'a> {
    Contents(&'a Vec<Value>),
    Courses(&'a Vec<Value>),
    CourseContents { course_id: &'a Value, contents: &'a Vec<Value> },
}

fn selector(payload: &Payload) -> Result<Selector<'_>, ValidationError> {
    let ids = |key| match payload.get(key) {
        None => Ok(None),
        Some(_) => payload
            .array(key)
            .map(Some)
            .ok_or_else(|| ValidationError::invalid_value(key)),
    };
    match (ids(keys::CONTENT_IDS)?, ids(keys::COURSE_IDS)?) {
        (Some(contents), None) => Ok(Selector::Contents(contents)),
        (None, Some(courses)) => Ok(Selector::Courses(courses)),
        (Some(contents), Some(courses)) if courses.len() == 1 => Ok(Selector::CourseContents {
            course_id: &courses[0],
            contents,
        }),
        _ => Err(ValidationError::invalid_request_data()),
    }
}

fn check_content_selector(payload: &Payload) -> Result<(), ValidationError> {
    selector(payload).map(|_| ())
}

fn shape_content_selector(payload: Payload) -> Payload {
    let selected = selector(&payload).ok().map(|selected| match selected {
        Selector::Contents(contents) => (keys::CONTENT_IDS, Value::Array(contents.clone())),
        Selector::Courses(courses) => (keys::COURSE_IDS, Value::Array(courses.clone())),
        Selector::CourseContents { course_id, contents } => {
            let mut course = Map::new();
            course.insert(keys::COURSE_ID.to_string(), course_id.clone());
            course.insert(keys::CONTENT_IDS.to_string(), Value::Array(contents.clone()));
            (keys::COURSE, Value::Object(course))
        }
    });
    // Rejected by the check before shaping.
    let Some((key, value)) = selected else {
        return payload;
    };

    let mut shaped = Payload::new();
    if let Some(user_id) = payload.json(keys::USER_ID) {
        shaped.insert_json(keys::USER_ID, user_id.clone());
    }
    shaped.insert_json(key, value);
    shaped
}

fn check_content_entries(payload: &Payload) -> Result<(), ValidationError> {
    let entries = payload.array(keys::CONTENTS).map(Vec::as_slice).unwrap_or_default();
    for entry in entries {
        let content_id = entry
            .as_object()
            .ok_or_else(|| ValidationError::invalid_value(keys::CONTENTS))?
            .get(keys::CONTENT_ID)
            .and_then(Value::as_str)
            .unwrap_or_default();
        if content_id.trim().is_empty() {
            return Err(ValidationError::missing(keys::CONTENT_ID));
        }
    }
    Ok(())
}

fn nest_under_course(payload: Payload) -> Payload {
    let mut shaped = Payload::new();
    shaped.insert_json(keys::COURSE, Value::Object(payload.into_json()));
    shaped
}

fn keep_contents_and_user(mut payload: Payload) -> Payload {
    payload.retain_keys(&[keys::CONTENTS, keys::USER_ID]);
    payload
}

fn unchanged(payload: Payload) -> Payload {
    payload
}
