//! Caching client over `ApiAdapter`, the entry point used by consumers.
//!
//! # Design
//! `ApiClient` owns the response cache and is its only mutator. GETs consult
//! the cache first and store error-free responses; POST, PUT and DELETE go
//! straight to the adapter and leave the cache alone, so callers that need
//! fresh reads after a mutation call `clear_cache`.
//!
//! Concurrent GETs for the same key are not coalesced: both miss, both hit
//! the network, the last one to finish owns the cache entry. The lock is
//! never held across a request.
//!
//! The `*_as` methods are the typed boundary: they deserialize `data` into a
//! caller-chosen type and turn an error envelope into `Err`.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::adapter::ApiAdapter;
use crate::cache::{cache_key, Clock, Params, ResponseCache, SystemClock};
use crate::config::AdapterConfig;
use crate::envelope::NormalizedResponse;
use crate::error::{normalize_error, AdapterError};
use crate::http::HttpMethod;
use crate::request::RequestOptions;
use crate::store::{open_store, KeyValueStore, StoreError};
use crate::transport::{Transport, UreqTransport};

pub struct ApiClient<T = UreqTransport> {
    adapter: ApiAdapter,
    transport: T,
    cache: Mutex<ResponseCache>,
    clock: Arc<dyn Clock>,
}

impl ApiClient<UreqTransport> {
    /// Client over ureq. The token store is the file named by
    /// `config.token_store`, or in memory when none is set.
    pub fn from_config(config: &AdapterConfig) -> Result<Self, StoreError> {
        let store = open_store(config.token_store.as_deref())?;
        Ok(Self::from_config_with_store(config, store))
    }

    pub fn from_config_with_store(config: &AdapterConfig, store: Arc<dyn KeyValueStore>) -> Self {
        ApiClient::new(ApiAdapter::from_config(config, store), UreqTransport::new())
            .with_cache(ResponseCache::new(config.cache_ttl))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(adapter: ApiAdapter, transport: T) -> Self {
        Self {
            adapter,
            transport,
            cache: Mutex::new(ResponseCache::default()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Mutex::new(cache);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn adapter(&self) -> &ApiAdapter {
        &self.adapter
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET through the cache. Params become a query string when non-empty.
    pub fn get(&self, endpoint: &str, params: Option<&Params>) -> NormalizedResponse<Value> {
        let key = cache_key(endpoint, params);
        if let Some(cached) = self.cache().get(&key, self.clock.now()) {
            debug!(key = %key, "cache hit");
            return cached;
        }
        debug!(key = %key, "cache miss");

        let target = match params.filter(|p| !p.is_empty()) {
            Some(params) => {
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(params.iter())
                    .finish();
                format!("{endpoint}?{query}")
            }
            None => endpoint.to_string(),
        };
        let response = self
            .adapter
            .request(&self.transport, &target, RequestOptions::get());

        if !response.is_error() {
            self.cache().insert(key, response.clone(), self.clock.now());
        }
        response
    }

    pub fn post<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> NormalizedResponse<Value> {
        self.send(HttpMethod::Post, endpoint, Some(body))
    }

    pub fn put<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> NormalizedResponse<Value> {
        self.send(HttpMethod::Put, endpoint, Some(body))
    }

    pub fn delete(&self, endpoint: &str) -> NormalizedResponse<Value> {
        self.send::<Value>(HttpMethod::Delete, endpoint, None)
    }

    fn send<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&B>,
    ) -> NormalizedResponse<Value> {
        let mut options = RequestOptions::new(method);
        if let Some(body) = body {
            match serde_json::to_value(body) {
                Ok(value) => options = options.with_json(value),
                Err(e) => return normalize_error(&AdapterError::Serialization(e.to_string())),
            }
        }
        self.adapter.request(&self.transport, endpoint, options)
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.cache().len()
    }

    pub fn get_as<D: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: Option<&Params>,
    ) -> Result<D, AdapterError> {
        self.get(endpoint, params).into_typed()
    }

    /// Re-read `endpoint`, bypassing cached data unless `use_cache` is set.
    pub fn refresh_as<D: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: Option<&Params>,
        use_cache: bool,
    ) -> Result<D, AdapterError> {
        if !use_cache {
            self.clear_cache();
        }
        self.get_as(endpoint, params)
    }

    pub fn post_as<B, D>(&self, endpoint: &str, body: &B) -> Result<D, AdapterError>
    where
        B: Serialize + ?Sized,
        D: DeserializeOwned,
    {
        self.post(endpoint, body).into_typed()
    }

    pub fn put_as<B, D>(&self, endpoint: &str, body: &B) -> Result<D, AdapterError>
    where
        B: Serialize + ?Sized,
        D: DeserializeOwned,
    {
        self.put(endpoint, body).into_typed()
    }

    pub fn delete_as<D: DeserializeOwned>(&self, endpoint: &str) -> Result<D, AdapterError> {
        self.delete(endpoint).into_typed()
    }

    fn cache(&self) -> MutexGuard<'_, ResponseCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use serde_json::json;

    use super::*;
    use crate::http::{HttpRequest, HttpResponse};
    use crate::types::CustomGrade;

    /// Answers every request with a fixed body and records what it saw.
    struct Scripted {
        status: u16,
        body: String,
        calls: AtomicUsize,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn new(status: u16, body: Value) -> Self {
            Self {
                status,
                body: body.to_string(),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last(&self) -> HttpRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for Scripted {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, AdapterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request);
            let text = if self.status == 200 { "OK" } else { "Bad Gateway" };
            Ok(HttpResponse::new(self.status, text, self.body.clone()))
        }
    }

    struct ManualClock {
        start: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                start: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            })
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.start + *self.offset.lock().unwrap()
        }
    }

    fn client(transport: Scripted) -> (ApiClient<Scripted>, Arc<ManualClock>) {
        let clock = ManualClock::new();
        let client = ApiClient::new(ApiAdapter::new("http://legacy", "/api/v3"), transport)
            .with_clock(clock.clone());
        (client, clock)
    }

    #[test]
    fn get_is_cached_within_ttl() {
        let (client, clock) = client(Scripted::new(200, json!({"data": [{"id": 1}]})));

        client.get("/api/v3/grades", None);
        clock.advance(Duration::from_secs(60));
        let second = client.get("/api/v3/grades", None);
        assert_eq!(client.transport().calls(), 1);
        assert_eq!(second.data.unwrap(), json!([{"id": 1}]));

        clock.advance(Duration::from_secs(5 * 60));
        client.get("/api/v3/grades", None);
        assert_eq!(client.transport().calls(), 2);
    }

    #[test]
    fn errors_are_not_cached() {
        let (client, _) = client(Scripted::new(502, json!({})));
        let first = client.get("/api/v3/grades", None);
        assert_eq!(first.error.unwrap().message, "HTTP 502: Bad Gateway");
        client.get("/api/v3/grades", None);
        assert_eq!(client.transport().calls(), 2);
        assert_eq!(client.cached_entries(), 0);
    }

    #[test]
    fn params_become_query_and_key() {
        let (client, _) = client(Scripted::new(200, json!({"data": {"boards": []}})));
        let mut params = Params::new();
        params.insert("pageNumber".to_string(), "2".to_string());
        params.insert("q".to_string(), "red oak".to_string());

        client.get("/api/v3/boards", Some(&params));
        assert_eq!(
            client.transport().last().path,
            "http://legacy/boards?pageNumber=2&q=red+oak"
        );

        client.get("/api/v3/boards", None);
        assert_eq!(client.transport().calls(), 2, "different params, different key");
        assert_eq!(client.transport().last().path, "http://legacy/boards");
    }

    #[test]
    fn mutations_bypass_and_keep_cache() {
        let (client, _) = client(Scripted::new(200, json!({"data": []})));
        client.get("/api/v3/batches", None);
        client.post("/api/v3/batches", &json!({"name": "x"}));
        client.put("/api/v3/batches/1", &json!({"name": "y"}));
        client.delete("/api/v3/batches/1");
        assert_eq!(client.transport().calls(), 4);
        assert_eq!(client.transport().last().method, HttpMethod::Delete);

        client.get("/api/v3/batches", None);
        assert_eq!(client.transport().calls(), 4, "cache survives mutations");

        client.clear_cache();
        client.get("/api/v3/batches", None);
        assert_eq!(client.transport().calls(), 5);
    }

    #[test]
    fn post_reshapes_batch_body() {
        let (client, _) = client(Scripted::new(200, json!({"data": []})));
        client.post(
            "/api/v3/batches",
            &json!({"batch": {
                "name": "B1", "graderId": 1, "supplierId": 2, "specieId": 3,
                "dryStatusId": 4, "thicknessId": 5, "customGrades": []
            }}),
        );
        let sent: Value =
            serde_json::from_str(client.transport().last().body.as_deref().unwrap()).unwrap();
        assert_eq!(sent["thicknessValueId"], 5);
        assert!(sent.get("thicknessId").is_none());
    }

    #[test]
    fn typed_get_reads_custom_grades() {
        let (client, _) = client(Scripted::new(
            200,
            json!({"data": {"data": [{"id": 1, "name": "FAS", "printLabel": "F"}]}}),
        ));
        let grades: Vec<CustomGrade> = client.get_as("/api/v3/custom-grades", None).unwrap();
        assert_eq!(grades.len(), 1);
        assert_eq!(grades[0].print_label.as_deref(), Some("F"));
        assert!(!grades[0].deleted);
    }

    #[test]
    fn typed_get_raises_error_envelope() {
        let (client, _) = client(Scripted::new(200, json!({"status": "error", "message": "boom"})));
        let err = client.get_as::<Vec<Value>>("/api/v3/grades", None).unwrap_err();
        assert_eq!(
            err,
            AdapterError::Api {
                code: "UNKNOWN_ERROR".to_string(),
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn refresh_without_cache_refetches() {
        let (client, _) = client(Scripted::new(200, json!({"data": []})));
        let _: Vec<Value> = client.get_as("/api/v3/grades", None).unwrap();
        let _: Vec<Value> = client.refresh_as("/api/v3/grades", None, true).unwrap();
        assert_eq!(client.transport().calls(), 1);
        let _: Vec<Value> = client.refresh_as("/api/v3/grades", None, false).unwrap();
        assert_eq!(client.transport().calls(), 2);
    }
}
