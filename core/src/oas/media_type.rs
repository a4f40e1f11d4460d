#![deny(missing_docs)]

//! # Media Type Object
//!
//! One `content` entry: a content type and an optional schema. Instances are
//! validated with the content type recorded in the options; without a schema
//! they pass through unchanged.

use crate::error::{PoliceError, PoliceResult};
use crate::oas::registry::SchemaRegistry;
use crate::oas::schema_object::SchemaObject;
use crate::options::{ValidationOptions, ValidatorConfig};
use serde_json::Value;
use std::sync::Arc;

/// A Media Type Object bound to its content type.
#[derive(Debug, Clone)]
pub struct MediaTypeObject {
    content_type: String,
    schema: Option<SchemaObject>,
}

impl MediaTypeObject {
    /// Binds to the Media Type Object at `scope` inside `registry`.
    pub fn new(
        registry: Arc<SchemaRegistry>,
        scope: &str,
        content_type: &str,
    ) -> PoliceResult<Self> {
        let node = registry
            .node_str(scope)
            .ok_or_else(|| PoliceError::Document(format!("Media type '{}' not found", scope)))?;
        let node = registry.deref(node)?;
        let schema = match node.child(&["schema"]) {
            Some(child) => Some(SchemaObject::new(registry.clone(), &child.scope_str())?),
            None => None,
        };
        Ok(Self {
            content_type: content_type.to_string(),
            schema,
        })
    }

    /// Registers a standalone Media Type Object at the default base scope.
    pub fn from_value(media_type: Value, content_type: &str) -> PoliceResult<Self> {
        let config = ValidatorConfig::default();
        let mut registry = SchemaRegistry::new();
        let uri = registry.register_json(&config.base_scope, media_type)?;
        Self::new(Arc::new(registry), uri.as_str(), content_type)
    }

    /// The content type this entry applies to.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The declared schema, if any.
    pub fn schema(&self) -> Option<&SchemaObject> {
        self.schema.as_ref()
    }

    /// Validates `data` against the schema, or returns it as is when there is none.
    pub fn validate(&self, data: Value, opts: &ValidationOptions) -> PoliceResult<Value> {
        let Some(schema) = &self.schema else {
            return Ok(data);
        };
        let opts = opts.clone().content_type(self.content_type.as_str());
        schema.validate(data, &opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn person() -> MediaTypeObject {
        MediaTypeObject::from_value(
            json!({
                "schema": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "age": { "type": "integer", "minimum": 0 }
                    },
                    "required": ["name"]
                }
            }),
            "application/json",
        )
        .unwrap()
    }

    #[test]
    fn test_validates_against_schema() {
        let data = json!({ "name": "John", "age": 25 });
        assert_eq!(person().validate(data.clone(), &ValidationOptions::default()).unwrap(), data);
    }

    #[test]
    fn test_rejects_invalid_data() {
        let err = person().validate(json!({}), &ValidationOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "required");
        let err = person()
            .validate(json!({ "name": "x", "age": -1 }), &ValidationOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), "properties");
    }

    #[test]
    fn test_passes_through_without_schema() {
        let media = MediaTypeObject::from_value(json!({}), "application/json").unwrap();
        assert!(media.schema().is_none());
        let data = json!({ "arbitrary": "data" });
        assert_eq!(media.validate(data.clone(), &ValidationOptions::default()).unwrap(), data);
    }

    #[test]
    fn test_text_plain_string() {
        let media =
            MediaTypeObject::from_value(json!({ "schema": { "type": "string" } }), "text/plain")
                .unwrap();
        assert_eq!(media.content_type(), "text/plain");
        assert_eq!(
            media.validate(json!("test"), &ValidationOptions::default()).unwrap(),
            json!("test")
        );
    }
}
