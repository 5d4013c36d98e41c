//! Outgoing request shaping: default headers, bearer token, body reshaping.

use serde_json::{Map, Value};

use crate::envelope::iso_now;
use crate::error::AdapterError;
use crate::http::{find_header, HttpMethod};
use crate::legacy::is_truthy;

/// Body of a normalized request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Structured payload, subject to legacy reshaping.
    Json(Value),
    /// Already serialized; sent as-is.
    Raw(String),
}

/// Request as issued by callers of the normalized API.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl RequestOptions {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get() -> Self {
        Self::new(HttpMethod::Get)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn with_raw(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Raw(body.into()));
        self
    }
}

/// Headers and serialized body ready to be addressed to the legacy backend.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Apply default headers, inject the bearer token and serialize the body.
pub fn transform_request_options(
    options: RequestOptions,
    token: Option<&str>,
) -> Result<PreparedRequest, AdapterError> {
    let RequestOptions {
        method,
        mut headers,
        body,
    } = options;

    if find_header(&headers, "Content-Type").is_none() {
        headers.push(("Content-Type".to_string(), "application/json".to_string()));
    }
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        if find_header(&headers, "Authorization").is_none() {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
    }

    let body = match body {
        Some(RequestBody::Json(value)) => {
            let reshaped = transform_request_body(value);
            Some(
                serde_json::to_string(&reshaped)
                    .map_err(|e| AdapterError::Serialization(e.to_string()))?,
            )
        }
        Some(RequestBody::Raw(raw)) => Some(raw),
        None => None,
    };

    Ok(PreparedRequest {
        method,
        headers,
        body,
    })
}

/// Reshape the two payloads whose legacy form differs from the v3 form.
///
/// `{grades}` becomes `{customGrades, timestamp}`; `{batch}` is unwrapped
/// into the legacy batch-creation shape with `thicknessId` renamed
/// `thicknessValueId`. Anything else passes through.
pub fn transform_request_body(body: Value) -> Value {
    let Value::Object(mut fields) = body else {
        return body;
    };

    if fields.get("grades").is_some_and(is_truthy) {
        let mut legacy = Map::new();
        let grades = fields.remove("grades").unwrap_or_default();
        legacy.insert("customGrades".to_string(), grades);
        legacy.insert("timestamp".to_string(), Value::String(iso_now()));
        return Value::Object(legacy);
    }

    if let Some(batch) = fields.get("batch").filter(|b| is_truthy(b)) {
        // Keys absent from the v3 batch are omitted, not sent as null.
        let mut legacy = Map::new();
        for (from, to) in BATCH_FIELDS {
            if let Some(value) = batch.get(from) {
                legacy.insert(to.to_string(), value.clone());
            }
        }
        return Value::Object(legacy);
    }

    Value::Object(fields)
}

/// v3 batch field → legacy batch field.
const BATCH_FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("graderId", "graderId"),
    ("supplierId", "supplierId"),
    ("specieId", "specieId"),
    ("dryStatusId", "dryStatusId"),
    ("thicknessId", "thicknessValueId"),
    ("customGrades", "customGrades"),
];
