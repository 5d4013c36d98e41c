//! Domain types of the normalized API.
//!
//! # Design
//! These are typed views over what the response transformers emit, used at
//! the typed boundary of `ApiClient` (`get_as`, `post_as`, ...). Every field
//! is defaulted so a sparse legacy record still deserializes; the
//! transformers decide which fields exist, these types only read them.
//! Identifiers are kept as JSON values because the legacy backend mixes
//! numeric and string ids.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::Pagination;

/// A standard grade, forwarded verbatim from the legacy backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Grade {
    pub id: Value,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub species: Option<String>,
    pub description: Option<String>,
    pub key_specs: Vec<String>,
    pub usage_count: Option<u64>,
    pub is_custom: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomGrade {
    pub id: Value,
    pub name: Option<String>,
    pub print_label: Option<String>,
    pub sorting_bin: Option<Value>,
    pub deleted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Batch {
    pub id: Value,
    pub name: Option<String>,
    pub specie: Option<Value>,
    pub thickness: Option<Value>,
    pub dry_status: Option<Value>,
    pub grader_id: Option<Value>,
    pub supplier_id: Option<Value>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub close_date: Option<String>,
    pub boards_count: Option<u64>,
    pub custom_grades: Vec<Value>,
    pub lumber_stage: Option<Value>,
}

/// Payload for creating a batch through `POST /api/v3/batches`.
///
/// Serialized as `{"batch": {...}}`, the shape the request transformer
/// flattens into the legacy batch-creation body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDraft {
    pub name: String,
    pub grader_id: Value,
    pub supplier_id: Value,
    pub specie_id: Value,
    pub dry_status_id: Value,
    pub thickness_id: Value,
    pub custom_grades: Vec<Value>,
}

impl BatchDraft {
    pub fn to_request_body(&self) -> Value {
        serde_json::json!({ "batch": self })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Board {
    pub id: Value,
    pub shot_id: Option<Value>,
    pub batch_id: Option<Value>,
    pub bundle_id: Option<Value>,
    pub grade_id: Option<Value>,
    pub custom_grade_id: Option<Value>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub thickness: Option<f64>,
    pub surface: Option<Value>,
    pub create_date: Option<String>,
    pub defects: Vec<Value>,
    pub faces: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardPage {
    pub boards: Vec<Board>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bundle {
    pub id: Value,
    pub batch_id: Option<Value>,
    pub status: Option<String>,
    pub board_count: Option<u64>,
    pub total_volume: Option<f64>,
    pub grade_distribution: BTreeMap<String, Value>,
    pub create_date: Option<String>,
    pub close_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundlePage {
    pub bundles: Vec<Bundle>,
    pub pagination: Pagination,
}

/// Species, thickness, supplier, grader or market entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LookupItem {
    pub id: Value,
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: bool,
    pub selected: Option<bool>,
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<Value>,
    pub expires_in: Value,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<Value>,
    #[serde(default)]
    pub roles: Value,
    #[serde(default)]
    pub permissions: Value,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn batch_draft_wraps_in_batch_key() {
        let draft = BatchDraft {
            name: "B1".to_string(),
            thickness_id: json!(5),
            ..Default::default()
        };
        let body = draft.to_request_body();
        assert_eq!(body["batch"]["name"], "B1");
        assert_eq!(body["batch"]["thicknessId"], 5);
    }

    #[test]
    fn sparse_records_deserialize() {
        let grade: CustomGrade = serde_json::from_value(json!({"id": 3})).unwrap();
        assert_eq!(grade.id, json!(3));
        assert!(!grade.deleted);

        let item: LookupItem = serde_json::from_value(json!({"id": "x", "name": "Oak"})).unwrap();
        assert_eq!(item.name.as_deref(), Some("Oak"));
        assert!(item.metadata.is_empty());
    }

    #[test]
    fn grade_type_field_is_renamed() {
        let grade: Grade =
            serde_json::from_value(json!({"id": 1, "type": "Hardwood", "keySpecs": ["a"]}))
                .unwrap();
        assert_eq!(grade.kind.as_deref(), Some("Hardwood"));
        assert_eq!(grade.key_specs, vec!["a".to_string()]);
    }
}
