//! Stand-in for the legacy grading backend.
//!
//! Reproduces the inconsistencies the adapter has to absorb: some lists are
//! bare arrays under `data`, some are wrapped in a second `data`, boards and
//! bundles come in paged wrappers with their own field names, markets are an
//! object keyed by code, login answers with `accessToken`, and some failures
//! are HTTP 200 with `status: "error"`.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

/// Password accepted by `/auth/login` for any username.
pub const DEMO_PASSWORD: &str = "secret";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomGradeRecord {
    pub id: u64,
    pub name: String,
    pub print_label: String,
    pub sorting_bin: u32,
    #[serde(default)]
    pub deleted: bool,
    /// Internal field the adapter must not expose.
    #[serde(default)]
    pub legacy_code: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    pub id: u64,
    pub name: String,
    pub specie: String,
    pub thickness: String,
    pub dry_status: String,
    pub grader_id: u64,
    pub supplier_id: u64,
    pub status: String,
    pub start_date: String,
    pub close_date: Option<String>,
    pub boards_count: u64,
    pub custom_grades: Vec<u64>,
    pub lumber_stage: String,
    pub thickness_value_id: u64,
}

/// Legacy batch-creation body. `thicknessId` is not part of it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateBatch {
    pub name: String,
    pub grader_id: u64,
    pub supplier_id: u64,
    pub specie_id: u64,
    pub dry_status_id: u64,
    pub thickness_value_id: u64,
    #[serde(default)]
    pub custom_grades: Vec<u64>,
}

/// Legacy custom-grade upload body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCustomGrades {
    pub custom_grades: Vec<NewCustomGrade>,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomGrade {
    pub name: String,
    #[serde(default)]
    pub print_label: String,
    #[serde(default)]
    pub sorting_bin: u32,
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page_number: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Default)]
pub struct Db {
    pub custom_grades: Vec<CustomGradeRecord>,
    pub batches: Vec<BatchRecord>,
    pub sessions: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct LegacyState {
    pub db: RwLock<Db>,
    grade_reads: AtomicUsize,
}

impl LegacyState {
    /// Number of times `/grades` has been served.
    pub fn grade_reads(&self) -> usize {
        self.grade_reads.load(Ordering::SeqCst)
    }
}

pub type SharedState = Arc<LegacyState>;

pub fn app() -> Router {
    app_with_state(Arc::new(LegacyState::seeded()))
}

pub fn app_with_state(state: SharedState) -> Router {
    Router::new()
        .route("/grades", get(list_grades))
        .route("/custom-grades", get(list_custom_grades).post(upload_custom_grades))
        .route("/batches", get(list_batches).post(create_batch))
        .route("/batches/open", get(list_open_batches))
        .route("/batches/{id}", get(get_batch).delete(delete_batch))
        .route("/boards", get(list_boards))
        .route("/bundles", get(list_bundles))
        .route("/species", get(list_species))
        .route("/thicknessValues", get(list_thickness))
        .route("/suppliers", get(list_suppliers))
        .route("/graders", get(list_graders))
        .route("/markets", get(list_markets))
        .route("/dryStatuses", get(list_dry_statuses))
        .route("/auth/login", post(login))
        .route("/auth/validate-token", get(validate_token))
        .route("/failing", get(failing))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, Arc::new(LegacyState::seeded())).await
}

pub async fn run_with_state(listener: TcpListener, state: SharedState) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "legacy backend listening");
    }
    axum::serve(listener, app_with_state(state)).await
}

impl LegacyState {
    pub fn seeded() -> Self {
        let custom_grades = vec![
            CustomGradeRecord {
                id: 1,
                name: "FAS Premium".to_string(),
                print_label: "FAS+".to_string(),
                sorting_bin: 1,
                deleted: false,
                legacy_code: "G-001".to_string(),
            },
            CustomGradeRecord {
                id: 2,
                name: "Rustic".to_string(),
                print_label: "RUS".to_string(),
                sorting_bin: 4,
                deleted: true,
                legacy_code: "G-002".to_string(),
            },
        ];
        let batches = vec![
            batch(1, "Red Oak 4/4", "open", 120),
            batch(2, "Cherry 5/4", "closed", 80),
        ];
        Self {
            db: RwLock::new(Db {
                custom_grades,
                batches,
                sessions: HashSet::new(),
            }),
            grade_reads: AtomicUsize::new(0),
        }
    }
}

fn batch(id: u64, name: &str, status: &str, boards_count: u64) -> BatchRecord {
    BatchRecord {
        id,
        name: name.to_string(),
        specie: "Red Oak".to_string(),
        thickness: "4/4".to_string(),
        dry_status: "KD".to_string(),
        grader_id: 1,
        supplier_id: 2,
        status: status.to_string(),
        start_date: "2024-03-01T08:00:00Z".to_string(),
        close_date: None,
        boards_count,
        custom_grades: vec![1],
        lumber_stage: "rough".to_string(),
        thickness_value_id: 3,
    }
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({ "status": 200, "data": data }))
}

async fn list_grades(State(state): State<SharedState>) -> Json<Value> {
    state.grade_reads.fetch_add(1, Ordering::SeqCst);
    ok(json!({
        "data": [
            {"id": 1, "name": "FAS", "type": "Hardwood", "species": "Red Oak", "keySpecs": ["Min width: 6 inches"]},
            {"id": 2, "name": "No.1 Common", "type": "Hardwood", "species": "Soft Maple", "keySpecs": []},
            {"id": 3, "name": "No.2A Common", "type": "Hardwood", "species": "Cherry", "keySpecs": []}
        ]
    }))
}

async fn list_custom_grades(State(state): State<SharedState>) -> Json<Value> {
    let db = state.db.read().await;
    ok(json!(db.custom_grades))
}

async fn upload_custom_grades(
    State(state): State<SharedState>,
    Json(input): Json<UploadCustomGrades>,
) -> Json<Value> {
    let mut db = state.db.write().await;
    let mut next_id = db.custom_grades.iter().map(|g| g.id).max().unwrap_or(0);
    for grade in input.custom_grades {
        next_id += 1;
        db.custom_grades.push(CustomGradeRecord {
            id: next_id,
            name: grade.name,
            print_label: grade.print_label,
            sorting_bin: grade.sorting_bin,
            deleted: false,
            legacy_code: format!("G-{next_id:03}@{}", input.timestamp),
        });
    }
    ok(json!(db.custom_grades))
}

async fn list_batches(State(state): State<SharedState>) -> Json<Value> {
    let db = state.db.read().await;
    ok(json!({ "data": db.batches }))
}

async fn list_open_batches(State(state): State<SharedState>) -> Json<Value> {
    let db = state.db.read().await;
    let open: Vec<&BatchRecord> = db.batches.iter().filter(|b| b.status == "open").collect();
    ok(json!(open))
}

async fn get_batch(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, StatusCode> {
    let db = state.db.read().await;
    let found = db.batches.iter().find(|b| b.id == id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(ok(json!([found])))
}

async fn create_batch(
    State(state): State<SharedState>,
    Json(input): Json<CreateBatch>,
) -> (StatusCode, Json<Value>) {
    let mut db = state.db.write().await;
    let id = db.batches.iter().map(|b| b.id).max().unwrap_or(0) + 1;
    let record = BatchRecord {
        id,
        name: input.name,
        specie: format!("specie-{}", input.specie_id),
        thickness: format!("thickness-{}", input.thickness_value_id),
        dry_status: format!("dry-{}", input.dry_status_id),
        grader_id: input.grader_id,
        supplier_id: input.supplier_id,
        status: "open".to_string(),
        start_date: "2024-03-02T08:00:00Z".to_string(),
        close_date: None,
        boards_count: 0,
        custom_grades: input.custom_grades,
        lumber_stage: "rough".to_string(),
        thickness_value_id: input.thickness_value_id,
    };
    db.batches.push(record.clone());
    (StatusCode::CREATED, Json(json!({ "status": 201, "data": [record] })))
}

async fn delete_batch(State(state): State<SharedState>, Path(id): Path<u64>) -> StatusCode {
    let mut db = state.db.write().await;
    let before = db.batches.len();
    db.batches.retain(|b| b.id != id);
    if db.batches.len() < before {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

const BOARD_COUNT: usize = 23;

async fn list_boards(Query(query): Query<PageQuery>) -> Json<Value> {
    let page = query.page_number.unwrap_or(0);
    let size = query.page_size.unwrap_or(10).max(1);
    let boards: Vec<Value> = (0..BOARD_COUNT)
        .skip(page * size)
        .take(size)
        .map(|i| {
            json!({
                "id": i + 1,
                "shotId": format!("shot-{}", i + 1),
                "batchId": 1,
                "bundleId": null,
                "gradeId": 1 + i % 3,
                "length": 8.0,
                "width": 6.5,
                "thickness": 1.0,
                "surface": 4.33,
                "createDate": "2024-03-01T09:00:00Z",
                "defects": [],
                "cameraRaw": "b64...",
            })
        })
        .collect();
    ok(json!({
        "boards": boards,
        "pageNumber": page,
        "pageSize": size,
        "totalElements": BOARD_COUNT,
    }))
}

async fn list_bundles() -> Json<Value> {
    ok(json!({
        "bundles": [
            {"id": 10, "batchId": 1, "status": "closed", "boardCount": 40, "totalVolume": 120.5,
             "gradeDistribution": {"FAS": 30, "No.1 Common": 10}, "createDate": "2024-03-01T10:00:00Z"},
            {"id": 11, "batchId": 1, "status": "open", "boardCount": 3, "totalVolume": 9.0,
             "createDate": "2024-03-02T10:00:00Z", "rfid": "E200"}
        ]
    }))
}

async fn list_species() -> Json<Value> {
    ok(json!([
        {"id": 1, "name": "Red Oak", "active": true},
        {"id": 2, "name": "White Oak"},
        {"id": 3, "name": "Cherry", "active": false}
    ]))
}

async fn list_thickness() -> Json<Value> {
    ok(json!({ "data": [
        {"id": 3, "label": "4/4", "metadata": {"inches": 1.0}},
        {"id": 4, "label": "5/4", "metadata": {"inches": 1.25}}
    ]}))
}

async fn list_suppliers() -> Json<Value> {
    ok(json!([{"id": 2, "defaultName": "Northern Mills", "description": "Wisconsin"}]))
}

async fn list_graders() -> Json<Value> {
    ok(json!([{"id": 1, "name": "A. Grader", "selected": true}]))
}

async fn list_markets() -> Json<Value> {
    let mut markets = BTreeMap::new();
    markets.insert("EU", json!({"id": 1, "name": "Europe"}));
    markets.insert("NA", json!({"id": 2, "name": "North America"}));
    markets.insert("AS", json!({"id": 3, "name": "Asia", "active": false}));
    ok(json!(markets))
}

async fn list_dry_statuses() -> Json<Value> {
    ok(json!([{"id": 1, "code": "KD"}, {"id": 2, "code": "AD"}]))
}

async fn login(State(state): State<SharedState>, Json(input): Json<Credentials>) -> Json<Value> {
    if input.password != DEMO_PASSWORD {
        return Json(json!({ "status": "error", "message": "Invalid credentials" }));
    }
    let token = Uuid::new_v4().to_string();
    state.db.write().await.sessions.insert(token.clone());
    Json(json!({
        "accessToken": token,
        "refreshToken": Uuid::new_v4().to_string(),
        "userId": 1,
        "username": input.username,
        "roles": ["grader"],
    }))
}

async fn validate_token(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let db = state.db.read().await;
    if !db.sessions.contains(token) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(ok(json!({ "token": token, "userId": 1, "expiresIn": 1800 })))
}

async fn failing() -> Json<Value> {
    Json(json!({ "status": "error", "message": "legacy failure" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_batch_rejects_v3_field_name() {
        let result: Result<CreateBatch, _> = serde_json::from_str(
            r#"{"name":"B","graderId":1,"supplierId":2,"specieId":3,"dryStatusId":4,"thicknessId":5}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn create_batch_accepts_legacy_shape() {
        let input: CreateBatch = serde_json::from_str(
            r#"{"name":"B","graderId":1,"supplierId":2,"specieId":3,"dryStatusId":4,"thicknessValueId":5}"#,
        )
        .unwrap();
        assert_eq!(input.thickness_value_id, 5);
        assert!(input.custom_grades.is_empty());
    }

    #[test]
    fn custom_grade_record_uses_camel_case() {
        let json = serde_json::to_value(&LegacyState::seeded().db.into_inner().custom_grades[0]).unwrap();
        assert_eq!(json["printLabel"], "FAS+");
        assert_eq!(json["legacyCode"], "G-001");
    }

    #[test]
    fn upload_requires_custom_grades_key() {
        let result: Result<UploadCustomGrades, _> =
            serde_json::from_str(r#"{"grades":[],"timestamp":"x"}"#);
        assert!(result.is_err());
    }
}
