use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use legacy_server::app;
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- envelope shapes ---

#[tokio::test]
async fn grades_are_double_wrapped() {
    let resp = app().oneshot(get("/grades")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], 200);
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn species_is_a_bare_array() {
    let body = body_json(app().oneshot(get("/species")).await.unwrap()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn markets_are_keyed_by_code() {
    let body = body_json(app().oneshot(get("/markets")).await.unwrap()).await;
    let markets = body["data"].as_object().unwrap();
    assert_eq!(markets.len(), 3);
    assert_eq!(markets["EU"]["name"], "Europe");
}

#[tokio::test]
async fn boards_page_with_legacy_field_names() {
    let resp = app()
        .oneshot(get("/boards?pageNumber=2&pageSize=10"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"]["pageNumber"], 2);
    assert_eq!(body["data"]["pageSize"], 10);
    assert_eq!(body["data"]["totalElements"], 23);
    assert_eq!(body["data"]["boards"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn failing_signals_error_with_http_200() {
    let resp = app().oneshot(get("/failing")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "legacy failure");
}

// --- batches ---

#[tokio::test]
async fn batch_not_found() {
    let resp = app().oneshot(get("/batches/999")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn open_batches_are_filtered() {
    let body = body_json(app().oneshot(get("/batches/open")).await.unwrap()).await;
    let open = body["data"].as_array().unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0]["status"], "open");
}

#[tokio::test]
async fn create_batch_rejects_thickness_id() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/batches",
            r#"{"name":"B","graderId":1,"supplierId":2,"specieId":3,"dryStatusId":4,"thicknessId":5}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn batch_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/batches",
            r#"{"name":"Walnut","graderId":1,"supplierId":2,"specieId":3,"dryStatusId":4,"thicknessValueId":5,"customGrades":[1]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    let id = created["data"][0]["id"].as_u64().unwrap();
    assert_eq!(created["data"][0]["thicknessValueId"], 5);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/batches/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"][0]["name"], "Walnut");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("DELETE")
                .uri(&format!("/batches/{id}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/batches/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- auth ---

#[tokio::test]
async fn login_then_validate() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/auth/login",
            r#"{"username":"grader","password":"secret"}"#,
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    let token = body["accessToken"].as_str().unwrap().to_string();
    assert!(body.get("token").is_none());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .uri("/auth/validate-token")
                .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["token"], token.as_str());
}

#[tokio::test]
async fn wrong_password_is_a_logical_error() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            r#"{"username":"grader","password":"nope"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "error");
}

#[tokio::test]
async fn validate_without_token_is_unauthorized() {
    let resp = app().oneshot(get("/auth/validate-token")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
