#![deny(missing_docs)]

//! # Error Handling
//!
//! Structured failures produced while validating OpenAPI parameters, media
//! types and schemas.
//!
//! Three families are distinguished:
//! - [`SchemaError`]: the schema document itself is unusable.
//! - [`ValidationError`]: the instance does not satisfy a well-formed schema.
//! - [`ParameterError`]: the Parameter Object metadata is invalid.
//!
//! [`PoliceError`] unifies them for callers that do not care which one fired.

use derive_more::{Display, From};

/// Reason codes for [`SchemaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SchemaErrorKind {
    /// `type` is missing a usable value (e.g. an array of types).
    #[display("type")]
    Type,
    /// `format` is declared but is not a string.
    #[display("format")]
    Format,
    /// `discriminator` is not an object with a string `propertyName`.
    #[display("discriminator")]
    Discriminator,
    /// A `discriminator.mapping` entry is not a string.
    #[display("mapping")]
    Mapping,
    /// The discriminator target could not be resolved.
    #[display("subschema")]
    Subschema,
    /// A `$ref` could not be resolved.
    #[display("ref")]
    Ref,
    /// `pattern` is not a valid regular expression.
    #[display("pattern")]
    Pattern,
}

/// The schema document is malformed; the caller cannot fix this by changing the input.
#[derive(Debug, Clone, PartialEq, Display)]
#[display("schema error: {kind} ({scope})")]
pub struct SchemaError {
    /// Scope URI of the offending schema node.
    pub scope: String,
    /// Reason code.
    pub kind: SchemaErrorKind,
    /// Optional detail, such as the unresolved reference.
    pub info: Option<String>,
}

impl SchemaError {
    /// Creates a schema error without detail.
    pub fn new(scope: impl Into<String>, kind: SchemaErrorKind) -> Self {
        Self {
            scope: scope.into(),
            kind,
            info: None,
        }
    }

    /// Attaches a detail string.
    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }
}

impl std::error::Error for SchemaError {}

/// Reason codes for [`ValidationError`], named after the keyword that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ValidationErrorKind {
    /// Instance type does not match `type`.
    #[display("type")]
    Type,
    /// A required property or parameter is missing.
    #[display("required")]
    Required,
    /// Value is not listed in `enum`.
    #[display("enum")]
    Enum,
    /// Value differs from `const`.
    #[display("const")]
    Const,
    /// `multipleOf` violated.
    #[display("multipleOf")]
    MultipleOf,
    /// `maximum` violated.
    #[display("maximum")]
    Maximum,
    /// `exclusiveMaximum` violated.
    #[display("exclusiveMaximum")]
    ExclusiveMaximum,
    /// `minimum` violated.
    #[display("minimum")]
    Minimum,
    /// `exclusiveMinimum` violated.
    #[display("exclusiveMinimum")]
    ExclusiveMinimum,
    /// `maxLength` violated.
    #[display("maxLength")]
    MaxLength,
    /// `minLength` violated.
    #[display("minLength")]
    MinLength,
    /// `pattern` did not match.
    #[display("pattern")]
    Pattern,
    /// One or more array items failed.
    #[display("items")]
    Items,
    /// An item past a tuple `items` list failed or is forbidden.
    #[display("additionalItems")]
    AdditionalItems,
    /// `maxItems` violated.
    #[display("maxItems")]
    MaxItems,
    /// `minItems` violated.
    #[display("minItems")]
    MinItems,
    /// Duplicate array items.
    #[display("uniqueItems")]
    UniqueItems,
    /// `maxProperties` violated.
    #[display("maxProperties")]
    MaxProperties,
    /// `minProperties` violated.
    #[display("minProperties")]
    MinProperties,
    /// One or more properties failed.
    #[display("properties")]
    Properties,
    /// An additional property failed or is forbidden.
    #[display("additionalProperties")]
    AdditionalProperties,
    /// Discriminator property missing or the selected subschema failed.
    #[display("discriminator")]
    Discriminator,
    /// An `allOf` branch failed.
    #[display("allOf")]
    AllOf,
    /// No `anyOf` branch matched.
    #[display("anyOf")]
    AnyOf,
    /// Zero or several `oneOf` branches matched.
    #[display("oneOf")]
    OneOf,
    /// The `not` schema matched.
    #[display("not")]
    Not,
    /// No media type matches the requested content type.
    #[display("content-type")]
    ContentType,
}

/// The instance fails an otherwise valid schema.
#[derive(Debug, Clone, PartialEq, Display)]
#[display("validation error: {kind} at '{path}' ({scope})")]
pub struct ValidationError {
    /// JSON-pointer-like path into the instance (`""` is the root).
    pub path: String,
    /// Scope URI of the schema node that raised the error.
    pub scope: String,
    /// Reason code.
    pub kind: ValidationErrorKind,
    /// Nested failures for aggregate keywords.
    pub causes: Vec<ValidationError>,
}

impl ValidationError {
    /// Creates a leaf validation error.
    pub fn new(
        path: impl Into<String>,
        scope: impl Into<String>,
        kind: ValidationErrorKind,
    ) -> Self {
        Self {
            path: path.into(),
            scope: scope.into(),
            kind,
            causes: Vec::new(),
        }
    }

    /// Creates an aggregate error carrying nested causes.
    pub fn with_causes(
        path: impl Into<String>,
        scope: impl Into<String>,
        kind: ValidationErrorKind,
        causes: Vec<ValidationError>,
    ) -> Self {
        Self {
            path: path.into(),
            scope: scope.into(),
            kind,
            causes,
        }
    }
}

impl std::error::Error for ValidationError {}

/// Reason codes for [`ParameterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ParameterErrorKind {
    /// `in` is not one of path, query, header, cookie.
    #[display("in")]
    In,
    /// `style` is unknown, illegal for the location, or unusable for the schema type.
    #[display("style")]
    Style,
    /// A path parameter is not marked `required: true`.
    #[display("required")]
    Required,
    /// `schema` and `content` are both declared, or `content` is malformed.
    #[display("content")]
    Content,
}

/// The Parameter Object metadata is invalid.
#[derive(Debug, Clone, PartialEq, Display)]
#[display("parameter error: {kind} ({scope})")]
pub struct ParameterError {
    /// Scope URI of the Parameter Object.
    pub scope: String,
    /// Reason code.
    pub kind: ParameterErrorKind,
    /// The offending value, when there is one.
    pub info: Option<String>,
}

impl ParameterError {
    /// Creates a parameter error.
    pub fn new(scope: impl Into<String>, kind: ParameterErrorKind, info: Option<String>) -> Self {
        Self {
            scope: scope.into(),
            kind,
            info,
        }
    }
}

impl std::error::Error for ParameterError {}

/// The unified error enum.
#[derive(Debug, Clone, PartialEq, Display, From)]
pub enum PoliceError {
    /// Schema definition defect.
    #[display("{_0}")]
    Schema(SchemaError),
    /// Instance failed validation.
    #[display("{_0}")]
    Validation(ValidationError),
    /// Parameter metadata defect.
    #[display("{_0}")]
    Parameter(ParameterError),
    /// A document could not be loaded or registered.
    #[from(ignore)]
    #[display("Document Error: {_0}")]
    Document(String),
}

impl PoliceError {
    /// Short reason code of the underlying failure (e.g. `"required"`).
    pub fn kind(&self) -> String {
        match self {
            Self::Schema(e) => e.kind.to_string(),
            Self::Validation(e) => e.kind.to_string(),
            Self::Parameter(e) => e.kind.to_string(),
            Self::Document(_) => "document".to_string(),
        }
    }

    /// Returns the validation error, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for PoliceError {}

/// Helper type alias for Result using PoliceError.
pub type PoliceResult<T> = Result<T, PoliceError>;
