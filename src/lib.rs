#![deny(missing_docs)]

//! # openapi-police
//!
//! Validates and coerces HTTP parameters, bodies and schema instances against
//! OpenAPI 3.x documents.
//!
//! ```
//! use openapi_police::{ParameterObject, ValidationOptions};
//! use serde_json::json;
//!
//! let param = ParameterObject::from_value(json!({
//!     "name": "color",
//!     "in": "path",
//!     "required": true,
//!     "style": "label",
//!     "schema": { "type": "array", "items": { "type": "string" } }
//! }))
//! .unwrap();
//!
//! let value = param
//!     .validate(Some(json!(".blue.black")), &ValidationOptions::default())
//!     .unwrap();
//! assert_eq!(value, Some(json!(["blue", "black"])));
//! ```

pub use police_core::*;
