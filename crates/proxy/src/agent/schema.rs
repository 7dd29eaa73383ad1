//! Creating datastore classes for generated pages.

use std::time::Duration;

use pagepilot_core::collections;
use pagepilot_core::error::CoreError;
use pagepilot_db::Datastore;
use serde_json::{json, Map, Value};

use crate::agent::plan::SchemaSpec;
use crate::error::ProxyError;

pub const SCHEMA_TIMEOUT: Duration = Duration::from_secs(15);

const FIELD_TYPES: &[&str] = &[
    "String", "Number", "Boolean", "Date", "Object", "Array", "Pointer", "File", "GeoPoint",
];

/// Field names the datastore manages itself.
const RESERVED_FIELDS: &[&str] = &["objectId", "createdAt", "updatedAt", "ACL"];

fn valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check names and types, and normalize every field to `{"type": ...}`.
pub fn normalize(spec: &SchemaSpec) -> Result<Map<String, Value>, CoreError> {
    if !valid_identifier(&spec.class_name) {
        return Err(CoreError::Validation(format!(
            "Invalid class name {:?}: use letters, digits and underscores, starting with a letter",
            spec.class_name
        )));
    }
    if collections::find(&spec.class_name).is_some() {
        return Err(CoreError::Conflict(format!(
            "Class {} is managed by PagePilot",
            spec.class_name
        )));
    }

    let mut fields = Map::new();
    for (name, definition) in &spec.fields {
        if !valid_identifier(name) || RESERVED_FIELDS.contains(&name.as_str()) {
            return Err(CoreError::Validation(format!("Invalid field name {name:?}")));
        }
        let mut definition = match definition {
            Value::String(kind) => json!({ "type": kind }),
            Value::Object(_) => definition.clone(),
            _ => {
                return Err(CoreError::Validation(format!(
                    "Field {name} must be a type name or an object"
                )))
            }
        };
        let kind = definition
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !FIELD_TYPES.contains(&kind) {
            return Err(CoreError::Validation(format!(
                "Field {name} has unsupported type {kind:?}"
            )));
        }
        if kind == "Pointer" {
            match definition.get("targetClass").and_then(Value::as_str) {
                Some(target) if valid_identifier(target) => {}
                _ => {
                    return Err(CoreError::Validation(format!(
                        "Pointer field {name} needs a targetClass"
                    )))
                }
            }
        }
        if let Some(obj) = definition.as_object_mut() {
            obj.retain(|k, _| matches!(k.as_str(), "type" | "targetClass" | "required"));
        }
        fields.insert(name.clone(), definition);
    }
    Ok(fields)
}

/// Validate `spec` and create the class, giving up after [`SCHEMA_TIMEOUT`].
pub async fn create_class(store: &dyn Datastore, spec: &SchemaSpec) -> Result<(), ProxyError> {
    let fields = normalize(spec)?;
    match tokio::time::timeout(SCHEMA_TIMEOUT, store.create_class(&spec.class_name, &fields)).await
    {
        Ok(result) => {
            result?;
            tracing::info!(
                class_name = %spec.class_name,
                fields = fields.len(),
                "Datastore class created",
            );
            Ok(())
        }
        Err(_) => Err(ProxyError::Timeout {
            operation: "Schema creation",
            secs: SCHEMA_TIMEOUT.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn spec(class_name: &str, fields: Value) -> SchemaSpec {
        SchemaSpec {
            class_name: class_name.to_string(),
            fields: fields.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn shorthand_types_are_expanded() {
        let fields = normalize(&spec("Promo", json!({"title": "String", "active": {"type": "Boolean"}})))
            .unwrap();
        assert_eq!(fields["title"], json!({"type": "String"}));
        assert_eq!(fields["active"], json!({"type": "Boolean"}));
    }

    #[test]
    fn bad_class_names_are_rejected() {
        for name in ["", "1Promo", "Promo Codes", "../x"] {
            assert_matches!(
                normalize(&spec(name, json!({}))),
                Err(CoreError::Validation(_)),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn managed_classes_are_protected() {
        assert_matches!(
            normalize(&spec("FbLead", json!({}))),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn unknown_types_and_reserved_fields_are_rejected() {
        assert!(normalize(&spec("Promo", json!({"title": "Varchar"}))).is_err());
        assert!(normalize(&spec("Promo", json!({"objectId": "String"}))).is_err());
    }

    #[test]
    fn pointers_need_a_target_class() {
        assert!(normalize(&spec("Promo", json!({"owner": "Pointer"}))).is_err());
        let fields = normalize(&spec(
            "Promo",
            json!({"owner": {"type": "Pointer", "targetClass": "Business"}}),
        ))
        .unwrap();
        assert_eq!(fields["owner"]["targetClass"], "Business");
    }

    #[tokio::test]
    async fn create_class_reaches_the_store() {
        let store = pagepilot_db::MemoryStore::new();
        create_class(&store, &spec("Promo", json!({"title": "String"})))
            .await
            .unwrap();
        assert_matches!(
            create_class(&store, &spec("Promo", json!({}))).await,
            Err(ProxyError::Datastore(_))
        );
    }
}
