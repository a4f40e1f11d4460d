#![deny(missing_docs)]

//! # OpenAPI Models
//!
//! Enumerations and raw shapes for the parts of an OpenAPI document the
//! validators need: parameter locations, serialization styles, schema types
//! and the scalar fields of a Parameter Object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The primitive and structured types of a Schema Object `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    /// `null`
    Null,
    /// `boolean`
    Boolean,
    /// `number`
    Number,
    /// `integer`
    Integer,
    /// `string`
    String,
    /// `object`
    Object,
    /// `array`
    Array,
}

impl SchemaType {
    /// Every type.
    pub const ALL: &'static [SchemaType] = &[
        SchemaType::Null,
        SchemaType::Boolean,
        SchemaType::Number,
        SchemaType::Integer,
        SchemaType::String,
        SchemaType::Object,
        SchemaType::Array,
    ];

    /// Returns the keyword spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Null => "null",
            SchemaType::Boolean => "boolean",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::String => "string",
            SchemaType::Object => "object",
            SchemaType::Array => "array",
        }
    }
}

impl FromStr for SchemaType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "null" => Ok(SchemaType::Null),
            "boolean" => Ok(SchemaType::Boolean),
            "number" => Ok(SchemaType::Number),
            "integer" => Ok(SchemaType::Integer),
            "string" => Ok(SchemaType::String),
            "object" => Ok(SchemaType::Object),
            "array" => Ok(SchemaType::Array),
            _ => Err(()),
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter serialization style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamStyle {
    /// `matrix`
    Matrix,
    /// `label`
    Label,
    /// `form`
    Form,
    /// `simple`
    Simple,
    /// `spaceDelimited`
    SpaceDelimited,
    /// `pipeDelimited`
    PipeDelimited,
    /// `deepObject`
    DeepObject,
}

impl ParamStyle {
    /// Returns the keyword spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamStyle::Matrix => "matrix",
            ParamStyle::Label => "label",
            ParamStyle::Form => "form",
            ParamStyle::Simple => "simple",
            ParamStyle::SpaceDelimited => "spaceDelimited",
            ParamStyle::PipeDelimited => "pipeDelimited",
            ParamStyle::DeepObject => "deepObject",
        }
    }

    /// Schema types a value serialized with this style can carry.
    pub fn allowed_types(&self) -> &'static [SchemaType] {
        match self {
            ParamStyle::Matrix | ParamStyle::Label | ParamStyle::Form | ParamStyle::Simple => {
                SchemaType::ALL
            }
            ParamStyle::SpaceDelimited | ParamStyle::PipeDelimited => {
                &[SchemaType::Array, SchemaType::Object]
            }
            ParamStyle::DeepObject => &[SchemaType::Object],
        }
    }

    /// Whether a value of type `ty` can be serialized with this style.
    pub fn supports(&self, ty: SchemaType) -> bool {
        self.allowed_types().contains(&ty)
    }
}

impl FromStr for ParamStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "matrix" => Ok(ParamStyle::Matrix),
            "label" => Ok(ParamStyle::Label),
            "form" => Ok(ParamStyle::Form),
            "simple" => Ok(ParamStyle::Simple),
            "spaceDelimited" => Ok(ParamStyle::SpaceDelimited),
            "pipeDelimited" => Ok(ParamStyle::PipeDelimited),
            "deepObject" => Ok(ParamStyle::DeepObject),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ParamStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The location of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    /// Path.
    Path,
    /// Query.
    Query,
    /// Header.
    Header,
    /// Cookie.
    Cookie,
}

impl ParamLocation {
    /// Styles legal for this location. The first entry is the default.
    pub fn allowed_styles(&self) -> &'static [ParamStyle] {
        match self {
            ParamLocation::Path => &[ParamStyle::Simple, ParamStyle::Label, ParamStyle::Matrix],
            ParamLocation::Query => &[
                ParamStyle::Simple,
                ParamStyle::Form,
                ParamStyle::SpaceDelimited,
                ParamStyle::PipeDelimited,
                ParamStyle::DeepObject,
            ],
            ParamLocation::Header => &[
                ParamStyle::Simple,
                ParamStyle::Form,
                ParamStyle::SpaceDelimited,
                ParamStyle::PipeDelimited,
            ],
            ParamLocation::Cookie => &[
                ParamStyle::Simple,
                ParamStyle::Form,
                ParamStyle::SpaceDelimited,
                ParamStyle::PipeDelimited,
            ],
        }
    }

    /// The style used when the parameter does not declare one.
    pub fn default_style(&self) -> ParamStyle {
        self.allowed_styles()[0]
    }

    /// Returns the keyword spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Cookie => "cookie",
        }
    }
}

impl FromStr for ParamLocation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path" => Ok(ParamLocation::Path),
            "query" => Ok(ParamLocation::Query),
            "header" => Ok(ParamLocation::Header),
            "cookie" => Ok(ParamLocation::Cookie),
            _ => Err(()),
        }
    }
}

/// The scalar fields of a Parameter Object as written in the document.
///
/// `schema` and `content` are read straight from the schema node so their
/// subtrees keep their scope; only presence matters here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Name of the parameter.
    #[serde(default)]
    pub name: String,
    /// Location as written (validated later).
    #[serde(rename = "in", default)]
    pub location: Option<String>,
    /// Serialization style as written.
    #[serde(default)]
    pub style: Option<String>,
    /// Explode modifier.
    #[serde(default)]
    pub explode: Option<bool>,
    /// Whether the parameter is required.
    #[serde(default)]
    pub required: Option<bool>,
    /// Whether the parameter is deprecated.
    #[serde(default)]
    pub deprecated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_round_trips_keyword() {
        let keywords = [
            "matrix",
            "label",
            "form",
            "simple",
            "spaceDelimited",
            "pipeDelimited",
            "deepObject",
        ];
        for s in keywords {
            assert_eq!(s.parse::<ParamStyle>().unwrap().as_str(), s);
        }
        assert!("cookie".parse::<ParamStyle>().is_err());
    }

    #[test]
    fn test_style_type_support() {
        assert!(ParamStyle::Simple.supports(SchemaType::Null));
        assert!(ParamStyle::PipeDelimited.supports(SchemaType::Array));
        assert!(!ParamStyle::SpaceDelimited.supports(SchemaType::Number));
        assert!(ParamStyle::DeepObject.supports(SchemaType::Object));
        assert!(!ParamStyle::DeepObject.supports(SchemaType::Array));
    }

    #[test]
    fn test_location_defaults() {
        assert_eq!(ParamLocation::Path.default_style(), ParamStyle::Simple);
        assert_eq!(ParamLocation::Query.default_style(), ParamStyle::Simple);
        assert_eq!(ParamLocation::Header.default_style(), ParamStyle::Simple);
        assert_eq!(ParamLocation::Cookie.default_style(), ParamStyle::Simple);
        assert!(!ParamLocation::Path.allowed_styles().contains(&ParamStyle::Form));
    }

    #[test]
    fn test_parameter_spec_deserialize() {
        let spec: ParameterSpec = serde_json::from_value(serde_json::json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer" }
        }))
        .unwrap();
        assert_eq!(spec.location.as_deref(), Some("path"));
        assert_eq!(spec.required, Some(true));
        assert!(spec.style.is_none());
        assert!(spec.explode.is_none());
    }
}
