//! Compatibility layer between the lumber-grading admin UI and the legacy
//! grading backend.
//!
//! # Overview
//! Callers speak a versioned, normalized contract: `/api/v3/<resource>`
//! paths in, uniform `{data, meta, error}` envelopes out. The legacy backend
//! speaks different paths, inconsistent envelopes, ad-hoc error signaling
//! and its own pagination field names. This crate translates between the
//! two and memoizes GET responses for a short freshness window.
//!
//! # Design
//! - `ApiAdapter` is split into `build_request` (produces an `HttpRequest`)
//!   and `parse_response` (consumes an `HttpResponse`), so the translation
//!   is deterministic and testable without a network. A `Transport` runs
//!   the round-trip in between; `UreqTransport` is the default.
//! - `ApiAdapter::request` never fails: every error is folded into an error
//!   envelope. The typed `*_as` methods on `ApiClient` turn that envelope
//!   back into `Err` for callers that prefer `?`.
//! - `ApiClient` owns the cache; nothing else mutates it.
//!
//! ```no_run
//! use grader_adapter::{AdapterConfig, ApiClient, LookupItem};
//!
//! let config = AdapterConfig::from_env()?;
//! let client = ApiClient::from_config(&config)?;
//! let species: Vec<LookupItem> = client.get_as("/api/v3/species", None)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adapter;
pub mod cache;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod error_log;
pub mod http;
pub mod legacy;
pub mod request;
pub mod resource;
pub mod store;
pub mod transform;
pub mod transport;
pub mod types;

pub use adapter::ApiAdapter;
pub use cache::{cache_key, Clock, Params, ResponseCache, SystemClock, DEFAULT_TTL};
pub use client::ApiClient;
pub use config::{AdapterConfig, ConfigError};
pub use endpoint::map_to_legacy_endpoint;
pub use envelope::{ErrorBody, Meta, NormalizedResponse, Pagination, API_VERSION};
pub use error::{normalize_error, AdapterError, UNKNOWN_ERROR};
pub use error_log::{ErrorLog, ErrorLogConfig, ErrorLogConfigUpdate, ErrorLogger, ExportFormat, LogLevel};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use legacy::{LegacyPayload, ObjectValues};
pub use request::{RequestBody, RequestOptions};
pub use resource::{classify, ResourceKind};
pub use store::{open_store, FileStore, KeyValueStore, MemoryStore, StoreError, AUTH_TOKEN_KEY};
pub use transport::{Transport, UreqTransport};
pub use types::{
    AuthSession, AuthUser, Batch, BatchDraft, Board, BoardPage, Bundle, BundlePage, CustomGrade,
    Grade, LookupItem,
};
