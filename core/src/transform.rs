//! Response transformers: one per resource family, each turning a legacy
//! payload into the normalized envelope.
//!
//! Only the fields declared for a family are carried over. The lookup
//! transformer is the one place unknown data survives, inside its
//! `metadata` bucket.

use serde_json::{json, Map, Value};

use crate::envelope::{NormalizedResponse, Pagination};
use crate::error::{normalize_error, AdapterError};
use crate::legacy::{
    count_or, default_falsy, is_truthy, project, unwrap_items, LegacyPayload, ObjectValues,
};
use crate::resource::ResourceKind;
use crate::types::{AuthSession, AuthUser};

/// Default `expiresIn` when the legacy auth payload has none.
pub const DEFAULT_EXPIRES_IN: u64 = 3600;

/// Default page size when a legacy page carries none.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

const CUSTOM_GRADE_FIELDS: &[&str] = &["id", "name", "printLabel", "sortingBin", "deleted"];

const BATCH_FIELDS: &[&str] = &[
    "id",
    "name",
    "specie",
    "thickness",
    "dryStatus",
    "graderId",
    "supplierId",
    "status",
    "startDate",
    "closeDate",
    "boardsCount",
    "customGrades",
    "lumberStage",
];

const BOARD_FIELDS: &[&str] = &[
    "id",
    "shotId",
    "batchId",
    "bundleId",
    "gradeId",
    "customGradeId",
    "length",
    "width",
    "thickness",
    "surface",
    "createDate",
    "defects",
    "faces",
];

const BUNDLE_FIELDS: &[&str] = &[
    "id",
    "batchId",
    "status",
    "boardCount",
    "totalVolume",
    "gradeDistribution",
    "createDate",
    "closeDate",
];

/// Dispatch a legacy payload to the transformer for `kind`.
pub fn transform_response(kind: ResourceKind, legacy: &LegacyPayload) -> NormalizedResponse<Value> {
    match kind {
        ResourceKind::Auth => transform_auth(legacy),
        ResourceKind::CustomGrades => transform_custom_grades(legacy),
        ResourceKind::Grades => transform_grades(legacy),
        ResourceKind::Batches => transform_batches(legacy),
        ResourceKind::Boards => transform_boards(legacy),
        ResourceKind::Bundles => transform_bundles(legacy),
        ResourceKind::Species
        | ResourceKind::Thickness
        | ResourceKind::Suppliers
        | ResourceKind::Graders
        | ResourceKind::Markets => transform_lookup(legacy),
        ResourceKind::Default => transform_passthrough(legacy),
    }
}

/// Forward `data` untouched. A payload without data (an empty body, a
/// null `data`) succeeds with an empty object.
pub fn transform_passthrough(legacy: &LegacyPayload) -> NormalizedResponse<Value> {
    let data = match legacy.raw() {
        Value::Array(_) => Some(legacy.raw()),
        raw => raw.get("data").filter(|d| !d.is_null()),
    };
    NormalizedResponse::success(data.cloned().unwrap_or_else(|| json!({})))
}

pub fn transform_grades(legacy: &LegacyPayload) -> NormalizedResponse<Value> {
    NormalizedResponse::success(Value::Array(unwrap_items(
        legacy.data(),
        &[],
        ObjectValues::All,
    )))
}

pub fn transform_custom_grades(legacy: &LegacyPayload) -> NormalizedResponse<Value> {
    let grades = map_items(legacy.data(), &[], ObjectValues::All, |item| {
        let mut grade = project(item, CUSTOM_GRADE_FIELDS);
        default_falsy(&mut grade, "deleted", Value::Bool(false));
        grade
    });
    NormalizedResponse::success(grades)
}

pub fn transform_batches(legacy: &LegacyPayload) -> NormalizedResponse<Value> {
    let batches = map_items(legacy.data(), &[], ObjectValues::All, |item| {
        let mut batch = project(item, BATCH_FIELDS);
        default_falsy(&mut batch, "customGrades", json!([]));
        batch
    });
    NormalizedResponse::success(batches)
}

pub fn transform_boards(legacy: &LegacyPayload) -> NormalizedResponse<Value> {
    let boards = map_items(legacy.data(), &["boards"], ObjectValues::OnlyObjects, |item| {
        let mut board = project(item, BOARD_FIELDS);
        default_falsy(&mut board, "defects", json!([]));
        default_falsy(&mut board, "faces", json!([]));
        board
    });
    paged(legacy.data(), "boards", boards)
}

pub fn transform_bundles(legacy: &LegacyPayload) -> NormalizedResponse<Value> {
    let bundles = map_items(legacy.data(), &["bundles"], ObjectValues::OnlyObjects, |item| {
        let mut bundle = project(item, BUNDLE_FIELDS);
        default_falsy(&mut bundle, "gradeDistribution", json!({}));
        bundle
    });
    paged(legacy.data(), "bundles", bundles)
}

/// Shared transformer for species, thickness, suppliers, graders, markets.
pub fn transform_lookup(legacy: &LegacyPayload) -> NormalizedResponse<Value> {
    let items = map_items(legacy.data(), &[], ObjectValues::All, |item| {
        let mut entry = project(item, &["id"]);
        let name = ["name", "label", "defaultName"]
            .iter()
            .find_map(|key| item.get(*key).filter(|v| is_truthy(v)));
        if let Some(name) = name {
            entry.insert("name".to_string(), name.clone());
        }
        entry.extend(project(item, &["description"]));
        let active = item.get("active") != Some(&Value::Bool(false));
        entry.insert("active".to_string(), Value::Bool(active));
        entry.extend(project(item, &["selected"]));
        let metadata = item
            .get("metadata")
            .filter(|v| is_truthy(v))
            .cloned()
            .unwrap_or_else(|| json!({}));
        entry.insert("metadata".to_string(), metadata);
        entry
    });
    NormalizedResponse::success(items)
}

/// Accepts the token under `token`, `accessToken` or `data.token`.
pub fn transform_auth(legacy: &LegacyPayload) -> NormalizedResponse<Value> {
    let token = legacy
        .raw()
        .get("token")
        .filter(|v| is_truthy(v))
        .or_else(|| legacy.raw().get("accessToken").filter(|v| is_truthy(v)))
        .or_else(|| legacy.raw().get("data")?.get("token").filter(|v| is_truthy(v)));
    let Some(token) = token else {
        return normalize_error(&AdapterError::InvalidAuthResponse);
    };
    let token = match token {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let session = AuthSession {
        token,
        refresh_token: legacy.field("refreshToken").cloned(),
        expires_in: legacy
            .field("expiresIn")
            .cloned()
            .unwrap_or_else(|| json!(DEFAULT_EXPIRES_IN)),
        user: AuthUser {
            id: legacy.field("userId").cloned(),
            username: legacy.field("username").cloned(),
            roles: legacy.field("roles").cloned().unwrap_or_else(|| json!([])),
            permissions: legacy
                .field("permissions")
                .cloned()
                .unwrap_or_else(|| json!([])),
        },
    };
    match serde_json::to_value(session) {
        Ok(data) => NormalizedResponse::success(data),
        Err(e) => normalize_error(&AdapterError::Serialization(e.to_string())),
    }
}

fn map_items<F>(data: Option<&Value>, alt_keys: &[&str], values: ObjectValues, f: F) -> Value
where
    F: Fn(&Value) -> Map<String, Value>,
{
    Value::Array(
        unwrap_items(data, alt_keys, values)
            .iter()
            .map(|item| Value::Object(f(item)))
            .collect(),
    )
}

/// Nest `{<key>: items, pagination}` under `data` and mirror the
/// pagination into `meta`.
fn paged(wrapper: Option<&Value>, key: &str, items: Value) -> NormalizedResponse<Value> {
    let observed = items.as_array().map_or(0, |a| a.len() as u64);
    let pagination = pagination_of(wrapper, observed);
    let mut data = Map::new();
    data.insert(key.to_string(), items);
    data.insert("pagination".to_string(), json!(pagination));
    NormalizedResponse::success(Value::Object(data)).with_pagination(pagination)
}

/// An explicit `pagination` object wins; otherwise the legacy
/// `pageNumber`/`pageSize`/`totalElements` fields, defaulting to page 0,
/// size 10 and the observed item count.
pub fn pagination_of(wrapper: Option<&Value>, observed: u64) -> Pagination {
    let empty = Value::Null;
    let wrapper = wrapper.unwrap_or(&empty);
    if let Some(explicit) = wrapper.get("pagination").filter(|p| p.is_object()) {
        return Pagination {
            page: count_or(explicit, "page", 0),
            size: count_or(explicit, "size", DEFAULT_PAGE_SIZE),
            total: count_or(explicit, "total", observed),
        };
    }
    Pagination {
        page: count_or(wrapper, "pageNumber", 0),
        size: count_or(wrapper, "pageSize", DEFAULT_PAGE_SIZE),
        total: count_or(wrapper, "totalElements", observed),
    }
}
