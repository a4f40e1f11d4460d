#![deny(missing_docs)]

//! # Police Core
//!
//! Validation and coercion of request values against OpenAPI 3.x Parameter,
//! Media Type and Schema Objects.

/// Shared error types.
pub mod error;

/// Per-call options and per-document configuration.
pub mod options;

/// OpenAPI (OAS) validators and the schema registry.
pub mod oas;

/// Base JSON Schema validator.
pub mod validator;

pub use error::{
    ParameterError, ParameterErrorKind, PoliceError, PoliceResult, SchemaError, SchemaErrorKind,
    ValidationError, ValidationErrorKind,
};
pub use oas::{
    Decoded, MediaTypeObject, ParamLocation, ParamStyle, ParameterObject, SchemaNode, SchemaObject,
    SchemaRegistry, SchemaType, StyleDecoder,
};
pub use options::{ValidationOptions, ValidatorConfig};
pub use validator::{BaseValidator, Validator};
