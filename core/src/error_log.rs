//! Application error log.
//!
//! One `ErrorLogger` is built at startup and shared by reference (usually
//! behind an `Arc`). It keeps the most recent entries in memory, newest
//! first, optionally mirrors them to `tracing` and optionally ships them to
//! a remote collector through a `Transport`.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::http::{HttpMethod, HttpRequest};
use crate::transport::Transport;

pub const DEFAULT_MAX_LOG_ENTRIES: usize = 100;

/// Name and version attached to remotely shipped entries.
pub const APP_NAME: &str = "neural-grader";
pub const APP_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLog {
    pub id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLogConfig {
    pub enable_console_logging: bool,
    pub enable_remote_logging: bool,
    pub max_log_entries: usize,
    pub api_endpoint: Option<String>,
}

impl Default for ErrorLogConfig {
    fn default() -> Self {
        Self {
            enable_console_logging: false,
            enable_remote_logging: false,
            max_log_entries: DEFAULT_MAX_LOG_ENTRIES,
            api_endpoint: None,
        }
    }
}

/// Partial update for [`ErrorLogger::configure`]; `None` keeps the value.
#[derive(Debug, Clone, Default)]
pub struct ErrorLogConfigUpdate {
    pub enable_console_logging: Option<bool>,
    pub enable_remote_logging: Option<bool>,
    pub max_log_entries: Option<usize>,
    pub api_endpoint: Option<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

const CSV_COLUMNS: &[&str] = &["id", "message", "level", "route", "componentName", "timestamp"];

#[derive(Default)]
pub struct ErrorLogger {
    config: RwLock<ErrorLogConfig>,
    logs: Mutex<VecDeque<ErrorLog>>,
    counter: AtomicU64,
    transport: Option<Arc<dyn Transport + Send + Sync>>,
}

impl ErrorLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger able to ship entries to `config.api_endpoint`.
    pub fn with_transport(transport: Arc<dyn Transport + Send + Sync>) -> Self {
        Self {
            transport: Some(transport),
            ..Self::default()
        }
    }

    pub fn configure(&self, update: ErrorLogConfigUpdate) {
        let mut config = self.config.write().unwrap_or_else(|e| e.into_inner());
        if let Some(v) = update.enable_console_logging {
            config.enable_console_logging = v;
        }
        if let Some(v) = update.enable_remote_logging {
            config.enable_remote_logging = v;
        }
        if let Some(v) = update.max_log_entries {
            config.max_log_entries = v;
        }
        if let Some(v) = update.api_endpoint {
            config.api_endpoint = v;
        }
    }

    pub fn config(&self) -> ErrorLogConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Record a message. `context.component` becomes the component name and
    /// `context.route` the route.
    pub fn log(
        &self,
        message: impl Into<String>,
        level: LogLevel,
        context: Option<Map<String, Value>>,
    ) -> ErrorLog {
        self.record(message.into(), None, level, context)
    }

    /// Record an error, keeping its source chain as the stack.
    pub fn log_error(
        &self,
        err: &(dyn std::error::Error + 'static),
        level: LogLevel,
        context: Option<Map<String, Value>>,
    ) -> ErrorLog {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        let stack = (!chain.is_empty()).then(|| chain.join("\n"));
        self.record(err.to_string(), stack, level, context)
    }

    fn record(
        &self,
        message: String,
        stack: Option<String>,
        level: LogLevel,
        context: Option<Map<String, Value>>,
    ) -> ErrorLog {
        let now = Utc::now().timestamp_millis();
        let seq = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let lookup = |key: &str| {
            context
                .as_ref()
                .and_then(|c| c.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let entry = ErrorLog {
            id: format!("error-{now}-{seq}"),
            message,
            stack,
            component_name: lookup("component"),
            route: lookup("route"),
            timestamp: now,
            level,
            context,
        };

        let config = self.config();
        {
            let mut logs = self.entries();
            logs.push_front(entry.clone());
            logs.truncate(config.max_log_entries);
        }
        if config.enable_console_logging {
            emit(&entry);
        }
        if config.enable_remote_logging {
            if let Some(endpoint) = config.api_endpoint.as_deref() {
                self.ship(endpoint, &entry);
            }
        }
        entry
    }

    fn ship(&self, endpoint: &str, entry: &ErrorLog) {
        let Some(transport) = &self.transport else {
            warn!(endpoint, "remote logging enabled without a transport");
            return;
        };
        let mut payload = match serde_json::to_value(entry) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        payload.insert("app".to_string(), Value::from(APP_NAME));
        payload.insert("version".to_string(), Value::from(APP_VERSION));

        let request = HttpRequest {
            method: HttpMethod::Post,
            path: endpoint.to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(Value::Object(payload).to_string()),
        };
        // Failures here are reported but never logged as entries.
        match transport.execute(request) {
            Ok(resp) if resp.is_success() => {}
            Ok(resp) => warn!(
                endpoint,
                "remote logging failed: HTTP {}: {}", resp.status, resp.status_text
            ),
            Err(e) => warn!(endpoint, error = %e, "remote logging failed"),
        }
    }

    /// Entries newest first, optionally restricted to one level.
    pub fn logs(&self, level: Option<LogLevel>) -> Vec<ErrorLog> {
        self.entries()
            .iter()
            .filter(|log| level.map_or(true, |l| log.level == l))
            .cloned()
            .collect()
    }

    pub fn log_by_id(&self, id: &str) -> Option<ErrorLog> {
        self.entries().iter().find(|log| log.id == id).cloned()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn export(&self, format: ExportFormat) -> String {
        let logs = self.entries();
        match format {
            ExportFormat::Json => {
                let entries: Vec<&ErrorLog> = logs.iter().collect();
                serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
            }
            ExportFormat::Csv => {
                let mut rows = vec![CSV_COLUMNS.join(",")];
                rows.extend(logs.iter().map(csv_row));
                rows.join("\n")
            }
        }
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<ErrorLog>> {
        self.logs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn csv_row(log: &ErrorLog) -> String {
    let quote = |s: &str| format!("\"{}\"", s.replace('"', "\"\""));
    let optional = |s: &Option<String>| s.as_deref().map(quote).unwrap_or_default();
    [
        quote(&log.id),
        quote(&log.message),
        quote(&log.level.to_string()),
        optional(&log.route),
        optional(&log.component_name),
        log.timestamp.to_string(),
    ]
    .join(",")
}

fn emit(entry: &ErrorLog) {
    let component = entry.component_name.as_deref().unwrap_or("-");
    let route = entry.route.as_deref().unwrap_or("-");
    match entry.level {
        LogLevel::Error => error!(id = %entry.id, component, route, stack = ?entry.stack, "{}", entry.message),
        LogLevel::Warn => warn!(id = %entry.id, component, route, "{}", entry.message),
        LogLevel::Info => info!(id = %entry.id, component, route, "{}", entry.message),
    }
}
