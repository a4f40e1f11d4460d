#![deny(missing_docs)]

//! # OpenAPI Module
//!
//! - **models**: Schema types, parameter styles and locations.
//! - **ref_utils**: URI normalization and JSON Pointer helpers.
//! - **registry**: Document arena and `$ref` resolution.
//! - **style**: Parameter style/explode decoder.
//! - **schema_object**: OpenAPI Schema Object validator.
//! - **parameter**: Parameter Object validator.
//! - **media_type**: Media Type Object validator.

pub mod media_type;
pub mod models;
pub mod parameter;
pub mod ref_utils;
pub mod registry;
pub mod schema_object;
pub mod style;

pub use media_type::MediaTypeObject;
pub use models::{ParamLocation, ParamStyle, ParameterSpec, SchemaType};
pub use parameter::ParameterObject;
pub use registry::{SchemaNode, SchemaRegistry};
pub use schema_object::SchemaObject;
pub use style::{Decoded, StyleDecoder, UnsupportedStyle};
