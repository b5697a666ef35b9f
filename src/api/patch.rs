use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::db::{merge_value, StoreError};
use crate::error::ServiceError;

/// Reject updates touching fields the caller does not own
pub fn sanitize(patch: Map<String, Value>, protected: &[&str]) -> Result<Map<String, Value>, ServiceError> {
    if patch.is_empty() {
        return Err(ServiceError::Validation(
            "Update body must contain at least one field".to_string(),
        ));
    }
    if let Some(field) = protected.iter().find(|field| patch.contains_key(**field)) {
        return Err(ServiceError::Validation(format!(
            "Field '{}' cannot be updated",
            field
        )));
    }
    Ok(patch)
}

/// The record that would result from merging `patch` into `existing`
pub fn preview<T: DeserializeOwned>(existing: &Value, patch: &Map<String, Value>) -> Result<T, ServiceError> {
    let mut doc = existing.clone();
    merge_value(&mut doc, Value::Object(patch.clone()));
    serde_json::from_value(doc).map_err(|e| ServiceError::Validation(e.to_string()))
}

/// Fields of the merge write that persists `merged` over `existing`.
///
/// Patch keys absent from the serialized record are refused. Every field
/// whose serialized value differs from the stored document is written, so
/// fields derived from patched ones (e.g. the address of a job turned
/// remote) follow along. Protected fields are left to the server.
pub fn changed_fields<T: Serialize>(
    existing: &Value,
    patch: &Map<String, Value>,
    merged: &T,
    protected: &[&str],
) -> Result<Map<String, Value>, ServiceError> {
    let canonical = match serde_json::to_value(merged).map_err(StoreError::from)? {
        Value::Object(fields) => fields,
        _ => return Err(ServiceError::Validation("Record is not a JSON object".to_string())),
    };

    if let Some(field) = patch.keys().find(|key| !canonical.contains_key(*key)) {
        return Err(ServiceError::Validation(format!("Unknown field '{}'", field)));
    }

    Ok(canonical
        .into_iter()
        .filter(|(key, value)| !protected.contains(&key.as_str()) && existing.get(key) != Some(value))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn protected_fields_are_rejected() {
        let err = sanitize(object(json!({"id": "x", "title": "t"})), &["id"]).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(msg) if msg.contains("'id'")));
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(sanitize(Map::new(), &[]).is_err());
    }

    #[test]
    fn preview_applies_patch_on_a_copy() {
        let existing = json!({"a": 1, "b": {"c": 2}});
        let merged: Value = preview(&existing, &object(json!({"b": {"d": 3}}))).unwrap();

        assert_eq!(merged, json!({"a": 1, "b": {"c": 2, "d": 3}}));
        assert_eq!(existing, json!({"a": 1, "b": {"c": 2}}));
    }

    #[derive(Serialize)]
    struct Place {
        name: String,
        remote: bool,
        address: String,
        created_at: u32,
    }

    #[test]
    fn unknown_patch_keys_are_rejected() {
        let existing = json!({"name": "a", "remote": false, "address": "x", "created_at": 1});
        let merged = Place {
            name: "a".to_string(),
            remote: false,
            address: "x".to_string(),
            created_at: 1,
        };

        let err = changed_fields(&existing, &object(json!({"anything": 1})), &merged, &[]).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(msg) if msg.contains("'anything'")));
    }

    #[test]
    fn derived_fields_are_written_with_the_patch() {
        let existing = json!({"name": "a", "remote": false, "address": "1 Main St", "created_at": 1});
        let merged = Place {
            name: "a".to_string(),
            remote: true,
            address: "Remote".to_string(),
            created_at: 2,
        };

        let fields = changed_fields(&existing, &object(json!({"remote": true})), &merged, &["created_at"]).unwrap();

        assert_eq!(Value::Object(fields), json!({"remote": true, "address": "Remote"}));
    }
}
