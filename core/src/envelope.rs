//! The normalized (v3) response envelope consumed by the UI.
//!
//! Every envelope is stamped with the time it was produced and the API
//! version, on success and failure alike. Exactly one branch is active: a
//! success carries `data` and no `error`, a failure carries `error` and a
//! null `data`.

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AdapterError;

/// Version stamped into `meta.version`.
pub const API_VERSION: &str = "3.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResponse<T> {
    pub data: Option<T>,
    pub meta: Meta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub timestamp: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: iso_now(),
            version: API_VERSION.to_string(),
            pagination: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Page coordinates for board and bundle listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub size: u64,
    pub total: u64,
}

impl<T> NormalizedResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            meta: Meta::now(),
            error: None,
        }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            data: None,
            meta: Meta::now(),
            error: Some(ErrorBody {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.meta.pagination = Some(pagination);
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl NormalizedResponse<Value> {
    /// Convert the envelope into a typed value, raising its error if set.
    ///
    /// A success with null data deserializes from `null`, so `Option<_>`
    /// and `()` targets work for empty mutation responses.
    pub fn into_typed<D: DeserializeOwned>(self) -> Result<D, AdapterError> {
        if let Some(error) = self.error {
            return Err(AdapterError::Api {
                code: error.code,
                message: error.message,
            });
        }
        let data = self.data.unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(AdapterError::from)
    }
}

/// Current UTC time in the `2024-01-01T00:00:00.000Z` form.
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
