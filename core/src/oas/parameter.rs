#![deny(missing_docs)]

//! # Parameter Object
//!
//! Validates one request parameter against its Parameter Object.
//!
//! Construction enforces the metadata rules:
//! - `in` must be `path`, `query`, `header` or `cookie`.
//! - `style` must be legal for the location. A missing style defaults to the
//!   location's first legal style.
//! - Path parameters must be `required: true`.
//! - `schema` and `content` are mutually exclusive.
//!
//! At validation time a string instance is run through the style decoder once,
//! at this boundary, and the decoded value is coerced and validated by the
//! [`SchemaObject`] with style decoding switched off for the rest of the call.

use crate::error::{
    ParameterError, ParameterErrorKind, PoliceError, PoliceResult, SchemaError, SchemaErrorKind,
    ValidationError, ValidationErrorKind,
};
use crate::oas::media_type::MediaTypeObject;
use crate::oas::models::{ParamLocation, ParamStyle, ParameterSpec, SchemaType};
use crate::oas::registry::SchemaRegistry;
use crate::oas::schema_object::{coerce, SchemaObject};
use crate::oas::style::{Decoded, StyleDecoder};
use crate::options::{ValidationOptions, ValidatorConfig};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Content type that matches any requested content type.
const WILDCARD_CONTENT_TYPE: &str = "*/*";

/// A validated Parameter Object.
#[derive(Debug, Clone)]
pub struct ParameterObject {
    scope: String,
    spec: ParameterSpec,
    location: ParamLocation,
    style: ParamStyle,
    schema: Option<SchemaObject>,
    content: IndexMap<String, MediaTypeObject>,
    config: ValidatorConfig,
}

impl ParameterObject {
    /// Binds to the Parameter Object at `scope` inside `registry`.
    pub fn new(
        registry: Arc<SchemaRegistry>,
        scope: &str,
        config: ValidatorConfig,
    ) -> PoliceResult<Self> {
        let node = registry
            .node_str(scope)
            .ok_or_else(|| PoliceError::Document(format!("Parameter '{}' not found", scope)))?;
        let node = registry.deref(node)?;
        let scope = node.scope_str();

        let spec: ParameterSpec = serde_json::from_value(node.value().clone())
            .map_err(|e| {
                PoliceError::Document(format!("Invalid parameter object '{}': {}", scope, e))
            })?;

        let raw_in = spec.location.clone().unwrap_or_default();
        let location = raw_in
            .parse::<ParamLocation>()
            .map_err(|_| {
                ParameterError::new(scope.as_str(), ParameterErrorKind::In, Some(raw_in.clone()))
            })?;

        let style = match spec.style.as_deref() {
            None => location.default_style(),
            Some(raw) => raw
                .parse::<ParamStyle>()
                .ok()
                .filter(|s| location.allowed_styles().contains(s))
                .ok_or_else(|| {
                    ParameterError::new(
                        scope.as_str(),
                        ParameterErrorKind::Style,
                        Some(raw.to_string()),
                    )
                })?,
        };

        if location == ParamLocation::Path && spec.required != Some(true) {
            return Err(ParameterError::new(
                scope.as_str(),
                ParameterErrorKind::Required,
                spec.required.map(|r| r.to_string()),
            )
            .into());
        }

        if node.has("schema") && node.has("content") {
            return Err(ParameterError::new(
                scope.as_str(),
                ParameterErrorKind::Content,
                Some("schema and content are mutually exclusive".to_string()),
            )
            .into());
        }

        let schema = match node.child(&["schema"]) {
            Some(child) => Some(SchemaObject::new(registry.clone(), &child.scope_str())?),
            None => None,
        };

        let mut content = IndexMap::new();
        if let Some(raw) = node.get("content") {
            let types = raw
                .as_object()
                .filter(|m| !m.is_empty())
                .ok_or_else(|| {
                    ParameterError::new(scope.as_str(), ParameterErrorKind::Content, None)
                })?;
            for content_type in types.keys() {
                let Some(child) = node.child(&["content", content_type.as_str()]) else {
                    continue;
                };
                if !child.value().is_object() {
                    return Err(ParameterError::new(
                        scope.as_str(),
                        ParameterErrorKind::Content,
                        Some(content_type.clone()),
                    )
                    .into());
                }
                let media =
                    MediaTypeObject::new(registry.clone(), &child.scope_str(), content_type)?;
                content.insert(content_type.clone(), media);
            }
        }

        tracing::debug!(
            name = spec.name.as_str(),
            location = location.as_str(),
            style = style.as_str(),
            "parameter bound"
        );

        Ok(Self {
            scope,
            spec,
            location,
            style,
            schema,
            content,
            config,
        })
    }

    /// Registers a standalone Parameter Object at the default base scope.
    pub fn from_value(parameter: Value) -> PoliceResult<Self> {
        let config = ValidatorConfig::default();
        let mut registry = SchemaRegistry::new();
        let uri = registry.register_json(&config.base_scope, parameter)?;
        Self::new(Arc::new(registry), uri.as_str(), config)
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Parameter location.
    pub fn location(&self) -> ParamLocation {
        self.location
    }

    /// Effective style, defaulted from the location when not declared.
    pub fn style(&self) -> ParamStyle {
        self.style
    }

    /// Explode modifier; `false` unless declared.
    pub fn explode(&self) -> bool {
        self.spec.explode.unwrap_or(false)
    }

    /// Whether the parameter must be present.
    pub fn required(&self) -> bool {
        self.spec.required.unwrap_or(false)
    }

    /// Whether the parameter is marked deprecated.
    pub fn deprecated(&self) -> bool {
        self.spec.deprecated
    }

    /// Absolute location of the Parameter Object.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Validates a parameter value. `None` stands for a parameter that was
    /// not supplied; `Ok(None)` means it may stay absent.
    pub fn validate(
        &self,
        data: Option<Value>,
        opts: &ValidationOptions,
    ) -> PoliceResult<Option<Value>> {
        if !self.content.is_empty() {
            return self.validate_content(data, opts);
        }
        let Some(schema) = &self.schema else {
            return self.check_presence(data);
        };

        let node = schema.resolved()?;
        let ty = match node.get("type") {
            None => None,
            Some(Value::String(name)) => Some(name.parse::<SchemaType>().map_err(|_| {
                SchemaError::new(node.scope_str(), SchemaErrorKind::Type).with_info(name.as_str())
            })?),
            Some(_) => return Err(SchemaError::new(node.scope_str(), SchemaErrorKind::Type).into()),
        };
        let nullable = node.get("nullable") == Some(&Value::Bool(true));
        let coerce_types = opts.coercion_enabled(true);

        let data = match (ty, data) {
            (Some(ty), Some(Value::String(raw))) => {
                if raw.is_empty() && nullable {
                    return Ok(Some(Value::Null));
                }
                let decoded = if opts.parse_style {
                    self.decode(&raw, ty)?
                } else {
                    Some(Value::String(raw))
                };
                if coerce_types {
                    coerce(decoded, ty)
                } else {
                    decoded
                }
            }
            (_, other) => other,
        };

        let Some(data) = self.check_presence(data)? else {
            return Ok(None);
        };

        let nested = ValidationOptions {
            coerce_types: Some(coerce_types),
            parse_style: false,
            content_type: opts.content_type.clone(),
        };
        schema.validate(data, &nested).map(Some)
    }

    fn decode(&self, raw: &str, ty: SchemaType) -> PoliceResult<Option<Value>> {
        let decoder = StyleDecoder::new(&self.spec.name, self.style, self.explode());
        let decoded = decoder.decode(raw, ty).map_err(|e| {
            ParameterError::new(self.scope.as_str(), ParameterErrorKind::Style, Some(e.to_string()))
        })?;
        tracing::debug!(
            name = self.spec.name.as_str(),
            style = self.style.as_str(),
            explode = self.explode(),
            absent = decoded.is_none(),
            "decoded parameter"
        );
        Ok(decoded.map(Decoded::into_value))
    }

    fn check_presence(&self, data: Option<Value>) -> PoliceResult<Option<Value>> {
        match data {
            None if self.required() => {
                let scope = self.scope.as_str();
                Err(ValidationError::new("", scope, ValidationErrorKind::Required).into())
            }
            other => Ok(other),
        }
    }

    /// Picks the media type for the requested content type, falling back to
    /// the configured default and then to `*/*`.
    pub fn select_media_type(&self, opts: &ValidationOptions) -> PoliceResult<&MediaTypeObject> {
        let wanted = opts
            .content_type
            .as_deref()
            .unwrap_or(self.config.default_content_type.as_str());
        let media = self
            .content
            .get(wanted)
            .or_else(|| self.content.get(WILDCARD_CONTENT_TYPE))
            .ok_or_else(|| {
                ValidationError::new("", self.scope.as_str(), ValidationErrorKind::ContentType)
            })?;
        tracing::debug!(
            requested = wanted,
            selected = media.content_type(),
            "content type selected"
        );
        Ok(media)
    }

    fn validate_content(
        &self,
        data: Option<Value>,
        opts: &ValidationOptions,
    ) -> PoliceResult<Option<Value>> {
        let Some(data) = self.check_presence(data)? else {
            return Ok(None);
        };
        let media = self.select_media_type(opts)?;
        media.validate(data, opts).map(Some)
    }
}
