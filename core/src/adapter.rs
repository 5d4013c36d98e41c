//! Translation between the normalized v3 contract and the legacy backend.
//!
//! # Design
//! The adapter is split the same way as the rest of the crate: a
//! `build_request` half that produces an `HttpRequest` for the legacy
//! backend, and a `parse_response` half that turns the legacy answer into a
//! `NormalizedResponse`. `request` runs both around a `Transport` and is the
//! single boundary where every failure becomes an error envelope.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AdapterConfig;
use crate::endpoint::map_to_legacy_endpoint;
use crate::envelope::NormalizedResponse;
use crate::error::{normalize_error, AdapterError};
use crate::http::{HttpRequest, HttpResponse};
use crate::legacy::LegacyPayload;
use crate::request::{transform_request_options, RequestOptions};
use crate::resource::classify;
use crate::store::{KeyValueStore, MemoryStore, AUTH_TOKEN_KEY};
use crate::transform::transform_response;
use crate::transport::Transport;

#[derive(Clone)]
pub struct ApiAdapter {
    legacy_base_url: String,
    v3_base_url: String,
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for ApiAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiAdapter")
            .field("legacy_base_url", &self.legacy_base_url)
            .field("v3_base_url", &self.v3_base_url)
            .finish_non_exhaustive()
    }
}

impl ApiAdapter {
    /// Adapter with an empty in-memory token store.
    pub fn new(legacy_base_url: &str, v3_base_url: &str) -> Self {
        Self::with_store(legacy_base_url, v3_base_url, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(
        legacy_base_url: &str,
        v3_base_url: &str,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            legacy_base_url: legacy_base_url.trim_end_matches('/').to_string(),
            v3_base_url: v3_base_url.trim_end_matches('/').to_string(),
            store,
        }
    }

    pub fn from_config(config: &AdapterConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_store(&config.legacy_base_url, &config.v3_base_url, store)
    }

    pub fn legacy_base_url(&self) -> &str {
        &self.legacy_base_url
    }

    pub fn v3_base_url(&self) -> &str {
        &self.v3_base_url
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Build the legacy request for a normalized endpoint.
    pub fn build_request(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<HttpRequest, AdapterError> {
        let legacy_endpoint = map_to_legacy_endpoint(endpoint);
        let token = self.store.get(AUTH_TOKEN_KEY);
        let prepared = transform_request_options(options, token.as_deref())?;
        debug!(
            method = %prepared.method,
            endpoint,
            legacy_endpoint = %legacy_endpoint,
            "mapped request"
        );
        Ok(HttpRequest {
            method: prepared.method,
            path: format!("{}{}", self.legacy_base_url, legacy_endpoint),
            headers: prepared.headers,
            body: prepared.body,
        })
    }

    /// Turn a legacy response into a normalized envelope.
    ///
    /// Never fails: non-2xx statuses, unparseable bodies and legacy error
    /// payloads all come back as error envelopes.
    pub fn parse_response(&self, endpoint: &str, response: HttpResponse) -> NormalizedResponse<Value> {
        match self.try_parse_response(endpoint, response) {
            Ok(envelope) => envelope,
            Err(err) => self.fail(endpoint, err),
        }
    }

    fn try_parse_response(
        &self,
        endpoint: &str,
        response: HttpResponse,
    ) -> Result<NormalizedResponse<Value>, AdapterError> {
        if !response.is_success() {
            return Err(AdapterError::Http {
                status: response.status,
                status_text: response.status_text,
            });
        }
        let legacy = LegacyPayload::parse(&response.body)?;
        if legacy.signals_error() {
            return Err(AdapterError::legacy(legacy.message()));
        }
        let kind = classify(endpoint);
        debug!(endpoint, kind = %kind, "transforming legacy response");
        Ok(transform_response(kind, &legacy))
    }

    /// Issue a normalized request through `transport`.
    pub fn request<T>(
        &self,
        transport: &T,
        endpoint: &str,
        options: RequestOptions,
    ) -> NormalizedResponse<Value>
    where
        T: Transport + ?Sized,
    {
        let outcome = self
            .build_request(endpoint, options)
            .and_then(|req| transport.execute(req));
        match outcome {
            Ok(response) => self.parse_response(endpoint, response),
            Err(err) => self.fail(endpoint, err),
        }
    }

    fn fail(&self, endpoint: &str, err: AdapterError) -> NormalizedResponse<Value> {
        warn!(endpoint, code = err.code(), error = %err, "request failed");
        normalize_error(&err)
    }
}
