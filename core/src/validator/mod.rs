#![deny(missing_docs)]

//! # Validator Module
//!
//! The base JSON Schema validator as a trait with default keyword handlers.
//!
//! - **keywords**: Standalone implementations of every supported keyword.
//!
//! Implementors provide the schema registry and override the hooks they need
//! (`type_validator`, `format_validator`, `discriminator_validator` and the
//! combinators). Overrides can still reach the base behaviour through the
//! functions in [`keywords`], which are generic over any [`Validator`], so
//! recursion always re-enters the most derived implementation.

pub mod keywords;

use crate::error::PoliceResult;
use crate::oas::registry::{SchemaNode, SchemaRegistry};
use crate::options::ValidationOptions;
use serde_json::Value;

/// Keywords understood by the base validator, in evaluation order.
pub const BASE_KEYS: &[&str] = &[
    "type",
    "enum",
    "const",
    "multipleOf",
    "maximum",
    "exclusiveMaximum",
    "minimum",
    "exclusiveMinimum",
    "maxLength",
    "minLength",
    "pattern",
    "format",
    "items",
    "additionalItems",
    "maxItems",
    "minItems",
    "uniqueItems",
    "maxProperties",
    "minProperties",
    "required",
    "properties",
    "additionalProperties",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
];

/// A schema validator with overridable keyword hooks.
///
/// Every hook receives the instance by value and returns the (possibly
/// coerced or default-filled) instance, so transformations made deep in the
/// tree surface in the final result.
pub trait Validator {
    /// The registry `$ref`s are resolved against.
    fn registry(&self) -> &SchemaRegistry;

    /// Keywords evaluated by [`Validator::root_validator`], in order.
    fn validator_keys(&self) -> &'static [&'static str] {
        BASE_KEYS
    }

    /// Validates `data` against `node`, dereferencing `$ref` first.
    fn root_validator(
        &self,
        data: Value,
        node: &SchemaNode<'_>,
        path: &str,
        opts: &ValidationOptions,
    ) -> PoliceResult<Value> {
        keywords::root(self, data, node, path, opts)
    }

    /// Dispatches one keyword to its hook.
    fn keyword_validator(
        &self,
        key: &str,
        data: Value,
        node: &SchemaNode<'_>,
        path: &str,
        opts: &ValidationOptions,
    ) -> PoliceResult<Value> {
        match key {
            "type" => self.type_validator(data, node, path, opts),
            "format" => self.format_validator(data, node, path, opts),
            "discriminator" => self.discriminator_validator(data, node, path, opts),
            "allOf" => self.all_of_validator(data, node, path, opts),
            "anyOf" => self.any_of_validator(data, node, path, opts),
            "oneOf" => self.one_of_validator(data, node, path, opts),
            _ => keywords::keyword(self, key, data, node, path, opts),
        }
    }

    /// `type`
    fn type_validator(
        &self,
        data: Value,
        node: &SchemaNode<'_>,
        path: &str,
        _opts: &ValidationOptions,
    ) -> PoliceResult<Value> {
        keywords::check_type(data, node, path)
    }

    /// `format`. The base validator does not check formats.
    fn format_validator(
        &self,
        data: Value,
        _node: &SchemaNode<'_>,
        _path: &str,
        _opts: &ValidationOptions,
    ) -> PoliceResult<Value> {
        Ok(data)
    }

    /// `discriminator`. Not a JSON Schema keyword; ignored by the base validator.
    fn discriminator_validator(
        &self,
        data: Value,
        _node: &SchemaNode<'_>,
        _path: &str,
        _opts: &ValidationOptions,
    ) -> PoliceResult<Value> {
        Ok(data)
    }

    /// `allOf`
    fn all_of_validator(
        &self,
        data: Value,
        node: &SchemaNode<'_>,
        path: &str,
        opts: &ValidationOptions,
    ) -> PoliceResult<Value> {
        keywords::all_of(self, data, node, path, opts)
    }

    /// `anyOf`
    fn any_of_validator(
        &self,
        data: Value,
        node: &SchemaNode<'_>,
        path: &str,
        opts: &ValidationOptions,
    ) -> PoliceResult<Value> {
        keywords::any_of(self, data, node, path, opts)
    }

    /// `oneOf`
    fn one_of_validator(
        &self,
        data: Value,
        node: &SchemaNode<'_>,
        path: &str,
        opts: &ValidationOptions,
    ) -> PoliceResult<Value> {
        keywords::one_of(self, data, node, path, opts)
    }
}

/// Plain JSON Schema validation with no OpenAPI extensions.
#[derive(Debug, Clone, Copy)]
pub struct BaseValidator<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> BaseValidator<'r> {
    /// Creates a validator over `registry`.
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }
}

impl Validator for BaseValidator<'_> {
    fn registry(&self) -> &SchemaRegistry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PoliceError, ValidationErrorKind};
    use serde_json::json;

    fn registry(schema: Value) -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register_json("http://example.com/schema.json", schema).unwrap();
        registry
    }

    fn run(registry: &SchemaRegistry, data: Value) -> PoliceResult<Value> {
        let node = registry.node_str("http://example.com/schema.json").unwrap();
        BaseValidator::new(registry).root_validator(data, &node, "", &ValidationOptions::default())
    }

    #[test]
    fn test_base_ignores_discriminator_and_format() {
        let reg = registry(json!({
            "type": "string",
            "format": 10,
            "discriminator": { "propertyName": "kind" }
        }));
        assert_eq!(run(&reg, json!("abc")).unwrap(), json!("abc"));
    }

    #[test]
    fn test_base_does_not_coerce() {
        let reg = registry(json!({ "type": "integer" }));
        let err = run(&reg, json!("5")).unwrap_err();
        assert_eq!(err.kind(), "type");
    }

    #[test]
    fn test_boolean_schemas() {
        let reg = registry(json!({
            "properties": { "any": true, "none": false }
        }));
        assert!(run(&reg, json!({ "any": [1, 2] })).is_ok());
        let err = run(&reg, json!({ "none": 1 })).unwrap_err();
        let PoliceError::Validation(err) = err else {
            panic!("expected validation error");
        };
        assert_eq!(err.kind, ValidationErrorKind::Properties);
        assert_eq!(err.causes[0].kind, ValidationErrorKind::Not);
        assert_eq!(err.causes[0].path, "/none");
    }
}
