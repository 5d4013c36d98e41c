//! Verify endpoint mapping and response transformation against the JSON
//! test vectors stored in `test-vectors/`.
//!
//! Each transform vector pairs a legacy response with the normalized data
//! (or error) expected for a given normalized endpoint. Comparing parsed
//! JSON rather than strings avoids false negatives from key ordering.

use grader_adapter::{classify, map_to_legacy_endpoint, ApiAdapter, HttpResponse};
use serde_json::Value;

const LEGACY_BASE: &str = "http://legacy.local";

fn adapter() -> ApiAdapter {
    ApiAdapter::new(LEGACY_BASE, "/api/v3")
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

#[test]
fn endpoint_test_vectors() {
    let raw = include_str!("../../test-vectors/endpoints.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = case["input"].as_str().unwrap();

        assert_eq!(
            map_to_legacy_endpoint(input),
            case["legacy"].as_str().unwrap(),
            "{name}: legacy path"
        );
        assert_eq!(
            classify(input).as_str(),
            case["kind"].as_str().unwrap(),
            "{name}: resource kind"
        );

        let req = adapter()
            .build_request(input, grader_adapter::RequestOptions::get())
            .unwrap();
        assert_eq!(
            req.path,
            format!("{LEGACY_BASE}{}", case["legacy"].as_str().unwrap()),
            "{name}: request path"
        );
    }
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

#[test]
fn transform_test_vectors() {
    let raw = include_str!("../../test-vectors/transform.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let a = adapter();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let endpoint = case["endpoint"].as_str().unwrap();
        let response = HttpResponse::new(
            case["status"].as_u64().unwrap() as u16,
            case["status_text"].as_str().unwrap_or("OK"),
            case["body"].to_string(),
        );

        let envelope = a.parse_response(endpoint, response);
        assert_eq!(envelope.meta.version, "3.0.0", "{name}: version");
        assert!(!envelope.meta.timestamp.is_empty(), "{name}: timestamp");

        if let Some(expected_error) = case.get("expected_error") {
            assert!(envelope.data.is_none(), "{name}: data must be null");
            let error = envelope.error.expect("error envelope");
            assert_eq!(error.code, expected_error["code"].as_str().unwrap(), "{name}: code");
            assert_eq!(
                error.message,
                expected_error["message"].as_str().unwrap(),
                "{name}: message"
            );
        } else {
            assert!(envelope.error.is_none(), "{name}: unexpected error {:?}", envelope.error);
            assert_eq!(envelope.data.unwrap(), case["expected_data"], "{name}: data");
        }
    }
}
