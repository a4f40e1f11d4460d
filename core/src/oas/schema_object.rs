#![deny(missing_docs)]

//! # Schema Object
//!
//! The OpenAPI flavour of the base validator:
//!
//! - `nullable: true` admits `null` ahead of the `type` check.
//! - String instances are coerced to the declared primitive type on request.
//! - `format` must be a string when it applies; formats themselves are not checked.
//! - `discriminator` routes the instance to the schema its property names.
//!
//! The discriminator never exempts an instance from matching `anyOf`/`oneOf`.
//! Under a discriminator `oneOf` accepts several matches and keeps the one
//! the discriminator names.

use crate::error::{
    PoliceError, PoliceResult, SchemaError, SchemaErrorKind, ValidationError, ValidationErrorKind,
};
use crate::oas::models::SchemaType;
use crate::oas::ref_utils::{is_local_identifier, normalize_uri};
use crate::oas::registry::{SchemaNode, SchemaRegistry};
use crate::options::{ValidationOptions, ValidatorConfig};
use crate::validator::keywords::{self, child_path};
use crate::validator::Validator;
use serde_json::{Number, Value};
use std::sync::Arc;
use url::Url;

/// Keywords evaluated for a Schema Object, in order.
pub const OPENAPI_KEYS: &[&str] = &[
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
    "discriminator",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
];

/// Converts a string instance to `ty` where the string spells such a value.
///
/// Absent input requested as `null` becomes `null`. Strings that do not parse
/// are returned unchanged and left for the `type` check to reject.
pub fn coerce(data: Option<Value>, ty: SchemaType) -> Option<Value> {
    let s = match data {
        None if ty == SchemaType::Null => return Some(Value::Null),
        Some(Value::String(s)) => s,
        other => return other,
    };
    let coerced = match ty {
        SchemaType::Boolean => match s.as_str() {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        SchemaType::Number | SchemaType::Integer => parse_number(&s),
        _ => None,
    };
    Some(coerced.unwrap_or(Value::String(s)))
}

fn parse_number(s: &str) -> Option<Value> {
    let f = s.trim().parse::<f64>().ok().filter(|f| f.is_finite())?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        return Some(Value::Number(Number::from(f as i64)));
    }
    Number::from_f64(f).map(Value::Number)
}

/// A validator bound to one schema node of a registered document.
#[derive(Debug, Clone)]
pub struct SchemaObject {
    registry: Arc<SchemaRegistry>,
    scope: Url,
}

impl SchemaObject {
    /// Binds to the schema at `scope` inside `registry`.
    pub fn new(registry: Arc<SchemaRegistry>, scope: &str) -> PoliceResult<Self> {
        let node = registry
            .node_str(scope)
            .ok_or_else(|| SchemaError::new(scope, SchemaErrorKind::Ref).with_info(scope))?;
        let scope = node.scope();
        Ok(Self { registry, scope })
    }

    /// Registers a standalone schema at the default base scope.
    pub fn from_value(schema: Value) -> PoliceResult<Self> {
        Self::from_value_with_config(schema, &ValidatorConfig::default())
    }

    /// Registers a standalone schema at `config.base_scope`.
    pub fn from_value_with_config(schema: Value, config: &ValidatorConfig) -> PoliceResult<Self> {
        let mut registry = SchemaRegistry::new();
        let uri = registry.register_json(&config.base_scope, schema)?;
        Self::new(Arc::new(registry), uri.as_str())
    }

    /// Absolute location of the bound schema.
    pub fn scope(&self) -> &Url {
        &self.scope
    }

    /// The bound node, without following `$ref`.
    pub fn node(&self) -> PoliceResult<SchemaNode<'_>> {
        self.registry.node(&self.scope).ok_or_else(|| {
            SchemaError::new(self.scope.as_str(), SchemaErrorKind::Ref)
                .with_info(self.scope.as_str())
                .into()
        })
    }

    /// The bound node after following `$ref`.
    pub fn resolved(&self) -> PoliceResult<SchemaNode<'_>> {
        let node = self.node()?;
        Ok(self.registry.deref(node)?)
    }

    /// Validates `data` and returns the normalized instance.
    pub fn validate(&self, data: Value, opts: &ValidationOptions) -> PoliceResult<Value> {
        self.validate_at(data, "", opts)
    }

    /// Validates `data` located at `path` inside a larger instance.
    pub fn validate_at(
        &self,
        data: Value,
        path: &str,
        opts: &ValidationOptions,
    ) -> PoliceResult<Value> {
        let node = self.node()?;
        self.root_validator(data, &node, path, opts)
    }
}

impl Validator for SchemaObject {
    fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    fn validator_keys(&self) -> &'static [&'static str] {
        OPENAPI_KEYS
    }

    fn type_validator(
        &self,
        data: Value,
        node: &SchemaNode<'_>,
        path: &str,
        opts: &ValidationOptions,
    ) -> PoliceResult<Value> {
        let Some(Value::String(name)) = node.get("type") else {
            return Err(SchemaError::new(node.scope_str(), SchemaErrorKind::Type).into());
        };
        if data.is_null() && node.get("nullable") == Some(&Value::Bool(true)) {
            return Ok(Value::Null);
        }
        let data = match name.parse::<SchemaType>() {
            Ok(ty) if opts.coercion_enabled(false) => coerce(Some(data), ty).unwrap_or(Value::Null),
            _ => data,
        };
        keywords::check_type(data, node, path)
    }

    fn format_validator(
        &self,
        data: Value,
        node: &SchemaNode<'_>,
        _path: &str,
        _opts: &ValidationOptions,
    ) -> PoliceResult<Value> {
        if data.is_string() && !matches!(node.get("format"), Some(Value::String(_))) {
            return Err(SchemaError::new(node.scope_str(), SchemaErrorKind::Format).into());
        }
        Ok(data)
    }

    fn discriminator_validator(
        &self,
        data: Value,
        node: &SchemaNode<'_>,
        path: &str,
        opts: &ValidationOptions,
    ) -> PoliceResult<Value> {
        let target = self.discriminator_target(&data, node, path)?;
        if node.has("anyOf") || node.has("oneOf") {
            tracing::trace!(uri = %target, "discriminator deferred to combinator");
            return Ok(data);
        }

        let sub = self.registry.node(&target).ok_or_else(|| {
            SchemaError::new(discriminator_scope(node), SchemaErrorKind::Subschema)
                .with_info(target.as_str())
        })?;
        if self.registry.deref(sub.clone())?.scope_str() == node.scope_str() {
            // The remaining keywords of this node are already being evaluated.
            tracing::trace!(uri = %target, "discriminator names its own schema");
            return Ok(data);
        }
        tracing::debug!(uri = %target, "discriminator resolved");

        let sub = sub.excluding_all_of(node.scope_str());
        match self.root_validator(data, &sub, path, opts) {
            Ok(value) => Ok(value),
            Err(PoliceError::Validation(cause)) => Err(ValidationError::with_causes(
                path,
                node.scope_str(),
                ValidationErrorKind::Discriminator,
                vec![cause],
            )
            .into()),
            Err(other) => Err(other),
        }
    }

    /// Under a discriminator, several matching branches are accepted. The
    /// branch the discriminator names wins, otherwise the first match.
    fn one_of_validator(
        &self,
        data: Value,
        node: &SchemaNode<'_>,
        path: &str,
        opts: &ValidationOptions,
    ) -> PoliceResult<Value> {
        if !node.has("discriminator") {
            return keywords::one_of(self, data, node, path, opts);
        }
        let target = self.discriminator_target(&data, node, path)?;

        let mut causes = Vec::new();
        let mut first = None;
        for branch in keywords::branches(node, "oneOf") {
            let scope = self.registry.deref(branch.clone())?.scope_str();
            match self.root_validator(data.clone(), &branch, path, opts) {
                Ok(value) if scope == target.as_str() => return Ok(value),
                Ok(value) => {
                    first.get_or_insert(value);
                }
                Err(PoliceError::Validation(e)) => causes.push(e),
                Err(other) => return Err(other),
            }
        }
        first.ok_or_else(|| {
            ValidationError::with_causes(path, node.scope_str(), ValidationErrorKind::OneOf, causes)
                .into()
        })
    }
}

impl SchemaObject {
    /// Reads the discriminator property of `data` and returns the absolute
    /// reference it selects, after `mapping` substitution.
    fn discriminator_target(
        &self,
        data: &Value,
        node: &SchemaNode<'_>,
        path: &str,
    ) -> PoliceResult<Url> {
        let discriminator = node.get("discriminator");
        let Some(Value::String(property)) = discriminator.and_then(|d| d.get("propertyName"))
        else {
            return Err(SchemaError::new(node.scope_str(), SchemaErrorKind::Discriminator).into());
        };

        let Some(Value::String(mut value)) = data.get(property).cloned() else {
            let missing = ValidationError::new(
                child_path(path, property),
                node.scope_str(),
                ValidationErrorKind::Required,
            );
            return Err(ValidationError::with_causes(
                path,
                node.scope_str(),
                ValidationErrorKind::Discriminator,
                vec![missing],
            )
            .into());
        };

        if let Some(mapped) = discriminator
            .and_then(|d| d.get("mapping"))
            .and_then(|m| m.get(&value))
        {
            let Value::String(mapped) = mapped else {
                return Err(SchemaError::new(discriminator_scope(node), SchemaErrorKind::Mapping)
                    .with_info(value)
                    .into());
            };
            value = mapped.clone();
        }

        let reference = if is_local_identifier(&value) {
            format!("#/components/schemas/{}", value)
        } else {
            value
        };
        normalize_uri(&reference, node.base()).ok_or_else(|| {
            SchemaError::new(discriminator_scope(node), SchemaErrorKind::Subschema)
                .with_info(reference)
                .into()
        })
    }
}

fn discriminator_scope(node: &SchemaNode<'_>) -> String {
    node.child(&["discriminator"])
        .map(|d| d.scope_str())
        .unwrap_or_else(|| node.scope_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema(value: Value) -> SchemaObject {
        SchemaObject::from_value(value).unwrap()
    }

    fn opts() -> ValidationOptions {
        ValidationOptions::default()
    }

    #[test]
    fn test_validator_keys_include_openapi_extensions() {
        let s = schema(json!({ "type": "string" }));
        for key in ["type", "discriminator", "anyOf", "oneOf", "format"] {
            assert!(s.validator_keys().contains(&key));
        }
    }

    #[test]
    fn test_type_array_is_schema_error() {
        let err = schema(json!({ "type": ["null", "string"] }))
            .validate(json!({}), &opts())
            .unwrap_err();
        assert!(matches!(err, PoliceError::Schema(ref e) if e.kind == SchemaErrorKind::Type));
    }

    #[test]
    fn test_nullable() {
        let s = schema(json!({ "type": "integer", "nullable": true }));
        assert_eq!(s.validate(json!(5), &opts()).unwrap(), json!(5));
        assert_eq!(s.validate(Value::Null, &opts()).unwrap(), Value::Null);
        assert_eq!(s.validate(json!(5.2), &opts()).unwrap_err().kind(), "type");

        let strict = schema(json!({ "type": "string" }));
        assert_eq!(strict.validate(Value::Null, &opts()).unwrap_err().kind(), "type");
    }

    #[test]
    fn test_coercion_is_opt_in_for_schemas() {
        let s = schema(json!({ "type": "integer" }));
        assert_eq!(s.validate(json!("42"), &opts()).unwrap_err().kind(), "type");
        let on = opts().coerce_types(true);
        assert_eq!(s.validate(json!("42"), &on).unwrap(), json!(42));
        assert_eq!(s.validate(json!("4.5"), &on).unwrap_err().kind(), "type");
        assert_eq!(s.validate(json!("abc"), &on).unwrap_err().kind(), "type");

        let b = schema(json!({ "type": "boolean" }));
        assert_eq!(b.validate(json!("true"), &on).unwrap(), json!(true));
        assert_eq!(b.validate(json!("0"), &on).unwrap(), json!(false));
        assert_eq!(b.validate(json!("yes"), &on).unwrap_err().kind(), "type");

        let n = schema(json!({ "type": "number" }));
        assert_eq!(n.validate(json!("42.5"), &on).unwrap(), json!(42.5));
    }

    #[test]
    fn test_coerce_function() {
        assert_eq!(coerce(None, SchemaType::Null), Some(Value::Null));
        assert_eq!(coerce(None, SchemaType::Integer), None);
        assert_eq!(coerce(Some(json!("5")), SchemaType::Number), Some(json!(5)));
        assert_eq!(coerce(Some(json!("x")), SchemaType::Null), Some(json!("x")));
        assert_eq!(coerce(Some(json!("5")), SchemaType::String), Some(json!("5")));
        assert_eq!(coerce(Some(json!(["1"])), SchemaType::Array), Some(json!(["1"])));
    }

    #[test]
    fn test_format_must_be_string() {
        let err = schema(json!({ "format": 10 })).validate(json!("abc"), &opts()).unwrap_err();
        assert_eq!(err.kind(), "format");
        assert!(schema(json!({ "format": 10 })).validate(json!(1), &opts()).is_ok());
        let unknown = schema(json!({ "format": "not-a-real-format" }));
        assert_eq!(unknown.validate(json!("test"), &opts()).unwrap(), json!("test"));
    }

    #[test]
    fn test_discriminator_shape() {
        let err = schema(json!({ "discriminator": { "mapping": {} }, "oneOf": [{}] }))
            .validate(json!({ "type": "a" }), &opts())
            .unwrap_err();
        assert_eq!(err.kind(), "discriminator");
        assert!(matches!(err, PoliceError::Schema(_)));
    }

    #[test]
    fn test_discriminator_missing_property() {
        let s = schema(json!({
            "discriminator": { "propertyName": "petType" },
            "oneOf": [{ "type": "object" }]
        }));
        let err = s.validate(json!({ "bark": "loud" }), &opts()).unwrap_err();
        let err = err.as_validation().unwrap();
        assert_eq!(err.kind, ValidationErrorKind::Discriminator);
        assert_eq!(err.causes.len(), 1);
        assert_eq!(err.causes[0].kind, ValidationErrorKind::Required);
        assert_eq!(err.causes[0].path, "/petType");

        let err = s.validate(json!({ "petType": 3 }), &opts()).unwrap_err();
        assert_eq!(err.kind(), "discriminator");
    }

    #[test]
    fn test_discriminator_with_one_of_matches_branches() {
        let s = schema(json!({
            "discriminator": { "propertyName": "petType" },
            "oneOf": [
                {
                    "type": "object",
                    "properties": { "petType": { "type": "string" }, "bark": { "type": "string" } }
                },
                {
                    "type": "object",
                    "properties": { "petType": { "type": "string" }, "meow": { "type": "string" } }
                }
            ]
        }));
        let dog = json!({ "petType": "dog", "bark": "loud" });
        assert_eq!(s.validate(dog.clone(), &opts()).unwrap(), dog);
        let cat = json!({ "petType": "cat", "meow": "soft" });
        assert_eq!(s.validate(cat.clone(), &opts()).unwrap(), cat);
        let err = s
            .validate(json!({ "petType": "cow", "bark": 1, "meow": 2 }), &opts())
            .unwrap_err();
        let err = err.as_validation().unwrap();
        assert_eq!(err.kind, ValidationErrorKind::OneOf);
        assert_eq!(err.causes.len(), 2);
    }

    #[test]
    fn test_one_of_prefers_the_named_branch() {
        let mut registry = SchemaRegistry::new();
        registry
            .register_json(
                "http://example.com/api.json",
                json!({
                    "components": { "schemas": {
                        "Loose": { "type": "object" },
                        "Dog": {
                            "type": "object",
                            "properties": { "age": { "type": "integer", "default": 1 } }
                        },
                        "Pet": {
                            "discriminator": { "propertyName": "petType" },
                            "oneOf": [
                                { "$ref": "#/components/schemas/Loose" },
                                { "$ref": "#/components/schemas/Dog" }
                            ]
                        }
                    } }
                }),
            )
            .unwrap();
        let pet = SchemaObject::new(
            Arc::new(registry),
            "http://example.com/api.json#/components/schemas/Pet",
        )
        .unwrap();
        assert_eq!(
            pet.validate(json!({ "petType": "Dog" }), &opts()).unwrap(),
            json!({ "petType": "Dog", "age": 1 })
        );
        assert_eq!(
            pet.validate(json!({ "petType": "Cat" }), &opts()).unwrap(),
            json!({ "petType": "Cat" })
        );
    }

    #[test]
    fn test_one_of_without_discriminator_stays_strict() {
        let s = schema(json!({ "oneOf": [{ "type": "object" }, { "required": ["a"] }] }));
        assert_eq!(s.validate(json!({ "a": 1 }), &opts()).unwrap_err().kind(), "oneOf");
        assert!(s.validate(json!({ "b": 1 }), &opts()).is_ok());
    }

    #[test]
    fn test_discriminator_naming_its_own_schema() {
        let mut registry = SchemaRegistry::new();
        registry
            .register_json(
                "http://example.com/api.json",
                json!({
                    "components": { "schemas": {
                        "Pet": {
                            "type": "object",
                            "discriminator": { "propertyName": "petType" },
                            "properties": { "name": { "type": "string" } }
                        }
                    } }
                }),
            )
            .unwrap();
        let pet = SchemaObject::new(
            Arc::new(registry),
            "http://example.com/api.json#/components/schemas/Pet",
        )
        .unwrap();
        let data = json!({ "petType": "Pet", "name": "rex" });
        assert_eq!(pet.validate(data.clone(), &opts()).unwrap(), data);
        let err = pet
            .validate(json!({ "petType": "Pet", "name": 5 }), &opts())
            .unwrap_err();
        assert_eq!(err.kind(), "properties");
    }

    #[test]
    fn test_discriminator_does_not_bypass_any_of() {
        let s = schema(json!({
            "discriminator": { "propertyName": "vehicleType" },
            "anyOf": [
                { "type": "object", "properties": { "wheels": { "type": "number" } } },
                { "type": "object", "properties": { "wings": { "type": "number" } } }
            ]
        }));
        let car = json!({ "vehicleType": "car", "wheels": 4 });
        assert_eq!(s.validate(car.clone(), &opts()).unwrap(), car);
        let err = s
            .validate(json!({ "vehicleType": "car", "wheels": "four", "wings": "none" }), &opts())
            .unwrap_err();
        assert_eq!(err.kind(), "anyOf");
    }

    #[test]
    fn test_mapping_must_be_string() {
        let s = schema(json!({
            "discriminator": { "propertyName": "type", "mapping": { "test": 123 } },
            "oneOf": [{ "type": "object" }]
        }));
        let err = s.validate(json!({ "type": "test" }), &opts()).unwrap_err();
        assert_eq!(err.kind(), "mapping");
    }

    #[test]
    fn test_unresolvable_target_without_combinators() {
        let s = schema(json!({ "discriminator": { "propertyName": "type" } }));
        for value in ["Animal", "ValidIdentifier123", "https://example.com/nowhere"] {
            let err = s.validate(json!({ "type": value }), &opts()).unwrap_err();
            let PoliceError::Schema(err) = err else {
                panic!("expected schema error");
            };
            assert_eq!(err.kind, SchemaErrorKind::Subschema);
            assert!(err.scope.ends_with("/discriminator"));
        }
    }
}
