use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::routine::{DEFAULT_DURATION, DEFAULT_MOOD, DEFAULT_PRODUCTIVITY};

pub const USER_ID_REQUIRED: &str = "userId is required";
pub const MISSING_USER_ID_PARAM: &str = "Missing userId query parameter";

/// A create request after shaping: defaults applied, numerics coerced to `f64`.
/// `date` stays `None` when omitted; the handler fills it from its clock.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRoutineRequest {
    pub user_id: String,
    pub duration: f64,
    pub mood: f64,
    pub productivity: f64,
    pub date: Option<String>,
    pub activities: Vec<String>,
}

/// Parses a raw create body.
///
/// A missing or falsy `userId` (null, "", 0, false, [], {}) is a `Validation`
/// error. Anything else that does not fit the routine shape (bad JSON,
/// non-object body, values that do not coerce) is a `Processing` error.
pub fn parse_create_request(body: &[u8]) -> Result<CreateRoutineRequest, AppError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::Processing(format!("Malformed JSON body: {e}")))?;
    let Value::Object(fields) = value else {
        return Err(AppError::Processing(
            "Request body must be a JSON object".to_string(),
        ));
    };

    let user_id = match fields.get("userId") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        None => return Err(AppError::Validation(USER_ID_REQUIRED.to_string())),
        Some(other) if is_falsy(other) => {
            return Err(AppError::Validation(USER_ID_REQUIRED.to_string()))
        }
        Some(other) => {
            return Err(AppError::Processing(format!(
                "userId must be a string, got {}",
                kind(other)
            )))
        }
    };

    Ok(CreateRoutineRequest {
        user_id,
        duration: numeric_field(&fields, "duration", DEFAULT_DURATION)?,
        mood: numeric_field(&fields, "mood", DEFAULT_MOOD)?,
        productivity: numeric_field(&fields, "productivity", DEFAULT_PRODUCTIVITY)?,
        date: date_field(&fields)?,
        activities: activities_field(&fields)?,
    })
}

/// Extracts the `userId` query parameter; absent or empty is a `Validation` error.
pub fn require_user_id_param(user_id: Option<&String>) -> Result<&str, AppError> {
    match user_id {
        Some(id) if !id.is_empty() => Ok(id.as_str()),
        _ => Err(AppError::Validation(MISSING_USER_ID_PARAM.to_string())),
    }
}

/// JSON values that count as "no value": null, false, zero, and empty strings, arrays or objects.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

/// Numbers pass through, booleans count as 1 or 0, numeric strings are parsed.
/// Everything else fails.
fn numeric_field(fields: &Map<String, Value>, name: &str, default: f64) -> Result<f64, AppError> {
    match fields.get(name) {
        None => Ok(default),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
            AppError::Processing(format!("{name} could not be converted to float: {n}"))
        }),
        Some(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            AppError::Processing(format!("could not convert string to float for {name}: '{s}'"))
        }),
        Some(other) => Err(AppError::Processing(format!(
            "{name} must be a number, got {}",
            kind(other)
        ))),
    }
}

fn date_field(fields: &Map<String, Value>) -> Result<Option<String>, AppError> {
    match fields.get("date") {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(AppError::Processing(format!(
            "date must be a string, got {}",
            kind(other)
        ))),
    }
}

fn activities_field(fields: &Map<String, Value>) -> Result<Vec<String>, AppError> {
    match fields.get("activities") {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(AppError::Processing(format!(
                    "activities must contain only strings, got {}",
                    kind(other)
                ))),
            })
            .collect(),
        Some(other) => Err(AppError::Processing(format!(
            "activities must be an array of strings, got {}",
            kind(other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
