#![deny(missing_docs)]

//! # Parameter Style Decoder
//!
//! Turns one raw, already percent-decoded parameter string into the shape the
//! parameter schema expects, following the OpenAPI `style`/`explode` grammar:
//!
//! | style            | object                    | array                  | primitive            |
//! |------------------|---------------------------|------------------------|----------------------|
//! | `matrix`         | `;c=R,1,G,2` / `;R=1;G=2` | `;c=a,b` / `;c=a;c=b`  | `;c=a`               |
//! | `label`          | `.R.1.G.2` / `.R=1.G=2`   | `.a.b`                 | `.a`                 |
//! | `form`           | `c=R,1,G,2` / `R=1&G=2`   | `c=a,b` / `c=a&c=b`    | `c=a`                |
//! | `simple`         | `R,1,G,2` / `R=1,G=2`     | `a,b`                  | `a`                  |
//! | `spaceDelimited` | `R 1 G 2`                 | `a b`                  | -                    |
//! | `pipeDelimited`  | `R|1|G|2`                 | `a|b`                  | -                    |
//! | `deepObject`     | `c[R]=1&c[G]=2`           | -                      | -                    |
//!
//! Decoding is a pure function of its inputs. An empty raw string always
//! decodes to `None`.

use crate::oas::models::{ParamStyle, SchemaType};
use derive_more::Display;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static TUPLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^=]+)(?:=(.*))?$").expect("static regex"));
static MATRIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^;([^=]+)(?:=(.*))?$").expect("static regex"));
static DEEP_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^\[\]]+)\[([^\[\]]*)\]$").expect("static regex"));

/// The style cannot carry a value of the requested type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("style '{style}' cannot encode type '{ty}'")]
pub struct UnsupportedStyle {
    /// The parameter style.
    pub style: ParamStyle,
    /// The schema type requested.
    pub ty: SchemaType,
}

impl std::error::Error for UnsupportedStyle {}

/// A decoded parameter value, before type coercion.
///
/// Missing values (`;X=` or a trailing key in a pair list) are kept as `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A single scalar string.
    Primitive(String),
    /// A list of values.
    Array(Vec<Option<String>>),
    /// An ordered key/value map. The last value wins for a repeated key.
    Object(IndexMap<String, Option<String>>),
}

impl Decoded {
    /// Converts into a JSON value: missing array entries become `null`,
    /// missing object values drop their key.
    pub fn into_value(self) -> Value {
        match self {
            Decoded::Primitive(s) => Value::String(s),
            Decoded::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|v| v.map(Value::String).unwrap_or(Value::Null))
                    .collect(),
            ),
            Decoded::Object(entries) => {
                let mut map = Map::new();
                for (k, v) in entries {
                    if let Some(v) = v {
                        map.insert(k, Value::String(v));
                    }
                }
                Value::Object(map)
            }
        }
    }
}

/// Decoder for one parameter's serialization settings.
#[derive(Debug, Clone, Copy)]
pub struct StyleDecoder<'a> {
    name: &'a str,
    style: ParamStyle,
    explode: bool,
}

impl<'a> StyleDecoder<'a> {
    /// Creates a decoder. `name` only matters for `deepObject`.
    pub fn new(name: &'a str, style: ParamStyle, explode: bool) -> Self {
        Self { name, style, explode }
    }

    /// Decodes `raw` as a value of type `ty`.
    ///
    /// The style/type compatibility check runs before anything else, so an
    /// unsupported combination fails even for empty input.
    pub fn decode(&self, raw: &str, ty: SchemaType) -> Result<Option<Decoded>, UnsupportedStyle> {
        if !self.style.supports(ty) {
            return Err(UnsupportedStyle { style: self.style, ty });
        }
        if raw.is_empty() {
            return Ok(None);
        }
        tracing::trace!(
            style = %self.style,
            explode = self.explode,
            ty = %ty,
            "decoding parameter"
        );
        let out = match ty {
            SchemaType::Object => self.decode_object(raw).map(Decoded::Object),
            SchemaType::Array => self.decode_array(raw).map(Decoded::Array),
            _ => self.decode_primitive(raw).map(Decoded::Primitive),
        };
        Ok(out)
    }

    fn decode_object(&self, raw: &str) -> Option<IndexMap<String, Option<String>>> {
        match (self.style, self.explode) {
            (ParamStyle::Matrix, true) => Some(tuples_to_object(raw.split(';').skip(1))),
            (ParamStyle::Matrix, false) => prefixed_list(&MATRIX, raw).map(pairs_to_object),
            (ParamStyle::Label, true) => Some(tuples_to_object(raw.split('.').skip(1))),
            (ParamStyle::Label, false) => Some(pairs_to_object(raw.split('.').skip(1))),
            (ParamStyle::Form, true) => Some(tuples_to_object(raw.split('&'))),
            (ParamStyle::Form, false) => prefixed_list(&TUPLE, raw).map(pairs_to_object),
            (ParamStyle::Simple, true) => Some(tuples_to_object(raw.split(','))),
            (ParamStyle::Simple, false) => Some(pairs_to_object(raw.split(','))),
            (ParamStyle::SpaceDelimited, _) => Some(pairs_to_object(raw.split(' '))),
            (ParamStyle::PipeDelimited, _) => Some(pairs_to_object(raw.split('|'))),
            (ParamStyle::DeepObject, _) => self.deep_object(raw),
        }
    }

    fn decode_array(&self, raw: &str) -> Option<Vec<Option<String>>> {
        match (self.style, self.explode) {
            (ParamStyle::Matrix, true) => Some(tuples_to_array(raw.split(';').skip(1))),
            (ParamStyle::Matrix, false) => prefixed_list(&MATRIX, raw).map(owned),
            (ParamStyle::Label, _) => Some(owned(raw.split('.').skip(1))),
            (ParamStyle::Form, true) => Some(tuples_to_array(raw.split('&'))),
            (ParamStyle::Form, false) => prefixed_list(&TUPLE, raw).map(owned),
            (ParamStyle::Simple, _) => Some(owned(raw.split(','))),
            (ParamStyle::SpaceDelimited, _) => Some(owned(raw.split(' '))),
            (ParamStyle::PipeDelimited, _) => Some(owned(raw.split('|'))),
            (ParamStyle::DeepObject, _) => None,
        }
    }

    fn decode_primitive(&self, raw: &str) -> Option<String> {
        match self.style {
            ParamStyle::Matrix => MATRIX
                .captures(raw)
                .and_then(|c| c.get(2))
                .map(|m| m.as_str().to_string()),
            ParamStyle::Label => raw.split('.').nth(1).map(str::to_string),
            ParamStyle::Form => TUPLE
                .captures(raw)
                .and_then(|c| c.get(2))
                .map(|m| m.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            ParamStyle::Simple => Some(raw.to_string()),
            ParamStyle::SpaceDelimited | ParamStyle::PipeDelimited | ParamStyle::DeepObject => None,
        }
    }

    /// `name[key]=value` pairs joined by `&`. Entries for other names are
    /// ignored; a bracketed key without `=` maps to the empty string.
    fn deep_object(&self, raw: &str) -> Option<IndexMap<String, Option<String>>> {
        let mut out = IndexMap::new();
        for segment in raw.split('&') {
            let (key, value) = match segment.split_once('=') {
                Some((k, v)) => (k, v),
                None => (segment, ""),
            };
            let Some(caps) = DEEP_KEY.captures(key) else {
                continue;
            };
            if &caps[1] != self.name {
                continue;
            }
            out.insert(caps[2].to_string(), Some(value.to_string()));
        }
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }
}

/// Splits the value part of `;name=a,b` or `name=a,b` on `,`. An empty value yields `None`.
fn prefixed_list<'r>(re: &Regex, raw: &'r str) -> Option<std::str::Split<'r, char>> {
    let caps = re.captures(raw)?;
    let value = caps.get(2)?.as_str();
    if value.is_empty() {
        None
    } else {
        Some(value.split(','))
    }
}

/// `[k1, v1, k2, v2, ...]` into a map. Stops at the first empty key; a key
/// without a following value maps to `None`.
fn pairs_to_object<'s>(
    mut list: impl Iterator<Item = &'s str>,
) -> IndexMap<String, Option<String>> {
    let mut out = IndexMap::new();
    while let Some(k) = list.next() {
        if k.is_empty() {
            break;
        }
        out.insert(k.to_string(), list.next().map(str::to_string));
    }
    out
}

fn owned<'s>(list: impl Iterator<Item = &'s str>) -> Vec<Option<String>> {
    list.map(|s| Some(s.to_string())).collect()
}

fn parse_tuple(segment: &str) -> Option<(String, Option<String>)> {
    let caps = TUPLE.captures(segment)?;
    let value = caps
        .get(2)
        .map(|m| m.as_str())
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    Some((caps[1].to_string(), value))
}

/// `["k1=v1", "k2=v2"]` into a map. Segments without a key are skipped.
fn tuples_to_object<'s>(list: impl Iterator<Item = &'s str>) -> IndexMap<String, Option<String>> {
    let mut out = IndexMap::new();
    for (k, v) in list.filter_map(parse_tuple) {
        out.insert(k, v);
    }
    out
}

/// `["name=v1", "name=v2"]` into the list of values.
fn tuples_to_array<'s>(list: impl Iterator<Item = &'s str>) -> Vec<Option<String>> {
    list.map(|s| parse_tuple(s).and_then(|(_, v)| v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(style: ParamStyle, explode: bool, ty: SchemaType, raw: &str) -> Option<Value> {
        StyleDecoder::new("color", style, explode)
            .decode(raw, ty)
            .unwrap()
            .map(Decoded::into_value)
    }

    #[test]
    fn test_empty_input_is_absent_for_every_style() {
        for style in [
            ParamStyle::Matrix,
            ParamStyle::Label,
            ParamStyle::Form,
            ParamStyle::Simple,
            ParamStyle::SpaceDelimited,
            ParamStyle::PipeDelimited,
        ] {
            for explode in [false, true] {
                assert_eq!(decode(style, explode, SchemaType::Array, ""), None);
                assert_eq!(decode(style, explode, SchemaType::Object, ""), None);
            }
        }
        assert_eq!(decode(ParamStyle::DeepObject, true, SchemaType::Object, ""), None);
    }

    #[test]
    fn test_unsupported_style_rejected_before_parsing() {
        let decoder = StyleDecoder::new("q", ParamStyle::SpaceDelimited, false);
        let err = decoder.decode("", SchemaType::Number).unwrap_err();
        assert_eq!(err.style, ParamStyle::SpaceDelimited);
        assert!(decoder.decode("1 2", SchemaType::Number).is_err());
        let deep = StyleDecoder::new("q", ParamStyle::DeepObject, true);
        assert!(deep.decode("q[a]=1", SchemaType::Array).is_err());
    }

    #[test]
    fn test_matrix() {
        assert_eq!(
            decode(ParamStyle::Matrix, false, SchemaType::Object, ";color=R,100,G,200,B,150"),
            Some(json!({ "R": "100", "G": "200", "B": "150" }))
        );
        assert_eq!(
            decode(ParamStyle::Matrix, true, SchemaType::Object, ";R=100;G=200;B=150;;X=;Y"),
            Some(json!({ "R": "100", "G": "200", "B": "150" }))
        );
        assert_eq!(
            decode(ParamStyle::Matrix, false, SchemaType::Array, ";color=blue,black,brown"),
            Some(json!(["blue", "black", "brown"]))
        );
        assert_eq!(
            decode(
                ParamStyle::Matrix,
                true,
                SchemaType::Array,
                ";color=blue;color=black;color=brown"
            ),
            Some(json!(["blue", "black", "brown"]))
        );
        assert_eq!(
            decode(ParamStyle::Matrix, false, SchemaType::String, ";color=blue"),
            Some(json!("blue"))
        );
        assert_eq!(decode(ParamStyle::Matrix, false, SchemaType::String, ";color"), None);
    }

    #[test]
    fn test_matrix_explode_keeps_missing_values() {
        let decoded = StyleDecoder::new("color", ParamStyle::Matrix, true)
            .decode(";R=100;X=;Y", SchemaType::Object)
            .unwrap()
            .unwrap();
        let Decoded::Object(map) = decoded else {
            panic!("expected object");
        };
        assert_eq!(map.get("R"), Some(&Some("100".to_string())));
        assert_eq!(map.get("X"), Some(&None));
        assert_eq!(map.get("Y"), Some(&None));
    }

    #[test]
    fn test_label() {
        assert_eq!(
            decode(ParamStyle::Label, false, SchemaType::Object, ".R.100.G.200.B.150"),
            Some(json!({ "R": "100", "G": "200", "B": "150" }))
        );
        assert_eq!(
            decode(ParamStyle::Label, true, SchemaType::Object, ".R=100.G=200.B=150"),
            Some(json!({ "R": "100", "G": "200", "B": "150" }))
        );
        assert_eq!(
            decode(ParamStyle::Label, true, SchemaType::Array, ".blue.black.brown"),
            Some(json!(["blue", "black", "brown"]))
        );
        assert_eq!(decode(ParamStyle::Label, false, SchemaType::Number, ".5"), Some(json!("5")));
    }

    #[test]
    fn test_form() {
        assert_eq!(decode(ParamStyle::Form, false, SchemaType::Object, "color="), None);
        assert_eq!(
            decode(ParamStyle::Form, false, SchemaType::Object, "color=R,100,G,200,B,150"),
            Some(json!({ "R": "100", "G": "200", "B": "150" }))
        );
        assert_eq!(
            decode(ParamStyle::Form, true, SchemaType::Object, "R=100&G=200&B=150"),
            Some(json!({ "R": "100", "G": "200", "B": "150" }))
        );
        assert_eq!(
            decode(ParamStyle::Form, true, SchemaType::Array, "color=blue&color=black&color=brown"),
            Some(json!(["blue", "black", "brown"]))
        );
        assert_eq!(decode(ParamStyle::Form, false, SchemaType::Boolean, "color="), None);
        assert_eq!(
            decode(ParamStyle::Form, false, SchemaType::Boolean, "color=true"),
            Some(json!("true"))
        );
    }

    #[test]
    fn test_simple_and_delimited() {
        assert_eq!(
            decode(ParamStyle::Simple, false, SchemaType::Object, "R,100,G,200,B,150"),
            Some(json!({ "R": "100", "G": "200", "B": "150" }))
        );
        assert_eq!(
            decode(ParamStyle::Simple, true, SchemaType::Object, "R=100,G=200,B=150"),
            Some(json!({ "R": "100", "G": "200", "B": "150" }))
        );
        assert_eq!(
            decode(ParamStyle::SpaceDelimited, false, SchemaType::Object, "R 100 G 200 B 150"),
            Some(json!({ "R": "100", "G": "200", "B": "150" }))
        );
        assert_eq!(
            decode(ParamStyle::PipeDelimited, false, SchemaType::Array, "1|2|3"),
            Some(json!(["1", "2", "3"]))
        );
    }

    #[test]
    fn test_pairs_stop_at_empty_key_and_last_value_wins() {
        assert_eq!(
            decode(ParamStyle::Simple, false, SchemaType::Object, "a,1,a,2,,x,y"),
            Some(json!({ "a": "2" }))
        );
        assert_eq!(
            decode(ParamStyle::Simple, false, SchemaType::Object, "a,1,b"),
            Some(json!({ "a": "1" }))
        );
    }

    #[test]
    fn test_deep_object_filters_by_name() {
        let decoder = StyleDecoder::new("search", ParamStyle::DeepObject, true);
        let out = decoder
            .decode(
                "filter[status]=active&search[term]=hello&other[value]=ignored",
                SchemaType::Object,
            )
            .unwrap()
            .map(Decoded::into_value);
        assert_eq!(out, Some(json!({ "term": "hello" })));
        assert_eq!(decoder.decode("filter[status]=active", SchemaType::Object).unwrap(), None);
    }

    #[test]
    fn test_deep_object_bare_key_is_empty_string() {
        let decoder = StyleDecoder::new("filter", ParamStyle::DeepObject, false);
        let out = decoder
            .decode("filter[empty]&filter[hasValue]=test", SchemaType::Object)
            .unwrap()
            .map(Decoded::into_value);
        assert_eq!(out, Some(json!({ "empty": "", "hasValue": "test" })));
    }

    #[test]
    fn test_decoding_is_repeatable() {
        let decoder = StyleDecoder::new("color", ParamStyle::Matrix, true);
        let first = decoder.decode(";color=a;color=b", SchemaType::Array).unwrap();
        let second = decoder.decode(";color=a;color=b", SchemaType::Array).unwrap();
        assert_eq!(first, second);
    }
}
