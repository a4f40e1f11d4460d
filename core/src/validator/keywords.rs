#![deny(missing_docs)]

//! # Keyword Implementations
//!
//! The base behaviour of every keyword in [`super::BASE_KEYS`]. Functions that
//! recurse take the calling [`Validator`] so nested schemas are validated with
//! the caller's overrides.

use crate::error::{
    PoliceError, PoliceResult, SchemaError, SchemaErrorKind, ValidationError, ValidationErrorKind,
};
use crate::oas::models::SchemaType;
use crate::oas::ref_utils::escape_pointer_segment;
use crate::oas::registry::SchemaNode;
use crate::options::ValidationOptions;
use crate::validator::Validator;
use regex::Regex;
use serde_json::{Map, Value};

/// Relative tolerance for `multipleOf` on non-integral operands.
const MULTIPLE_OF_EPSILON: f64 = 1e-9;

/// Appends one segment to an instance path.
pub fn child_path(path: &str, segment: &str) -> String {
    format!("{}/{}", path, escape_pointer_segment(segment))
}

/// Dereferences `node` and evaluates every keyword it declares.
pub fn root<V: Validator + ?Sized>(
    v: &V,
    mut data: Value,
    node: &SchemaNode<'_>,
    path: &str,
    opts: &ValidationOptions,
) -> PoliceResult<Value> {
    let node = v.registry().deref(node.clone())?;
    match node.value() {
        Value::Object(_) => {}
        // `false` rejects everything, like `not: {}`.
        Value::Bool(false) => {
            return Err(validation_error(path, &node, ValidationErrorKind::Not));
        }
        _ => return Ok(data),
    }
    for key in v.validator_keys() {
        if node.has(key) {
            tracing::trace!(keyword = key, path, "evaluating keyword");
            data = v.keyword_validator(key, data, &node, path, opts)?;
        }
    }
    Ok(data)
}

/// Keywords without an overridable hook.
pub fn keyword<V: Validator + ?Sized>(
    v: &V,
    key: &str,
    data: Value,
    node: &SchemaNode<'_>,
    path: &str,
    opts: &ValidationOptions,
) -> PoliceResult<Value> {
    match key {
        "enum" => enumeration(data, node, path),
        "const" => constant(data, node, path),
        "multipleOf" | "maximum" | "exclusiveMaximum" | "minimum" | "exclusiveMinimum" => {
            numeric(key, data, node, path)
        }
        "maxLength" | "minLength" => length(key, data, node, path),
        "pattern" => pattern(data, node, path),
        "items" => items(v, data, node, path, opts),
        "additionalItems" => additional_items(v, data, node, path, opts),
        "maxItems" | "minItems" | "maxProperties" | "minProperties" => size(key, data, node, path),
        "uniqueItems" => unique_items(data, node, path),
        "required" => required(data, node, path),
        "properties" => properties(v, data, node, path, opts),
        "additionalProperties" => additional_properties(v, data, node, path, opts),
        "not" => not(v, data, node, path, opts),
        _ => Ok(data),
    }
}

fn validation_error(path: &str, node: &SchemaNode<'_>, kind: ValidationErrorKind) -> PoliceError {
    ValidationError::new(path, node.scope_str(), kind).into()
}

fn aggregate_error(
    path: &str,
    node: &SchemaNode<'_>,
    kind: ValidationErrorKind,
    causes: Vec<ValidationError>,
) -> PoliceError {
    ValidationError::with_causes(path, node.scope_str(), kind, causes).into()
}

/// Whether `data` is an instance of the named type.
pub fn is_type(data: &Value, ty: SchemaType) -> bool {
    match ty {
        SchemaType::Null => data.is_null(),
        SchemaType::Boolean => data.is_boolean(),
        SchemaType::Number => data.is_number(),
        SchemaType::Integer => match data {
            Value::Number(n) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            _ => false,
        },
        SchemaType::String => data.is_string(),
        SchemaType::Object => data.is_object(),
        SchemaType::Array => data.is_array(),
    }
}

/// `type`, accepting a single name or a list of names.
pub fn check_type(data: Value, node: &SchemaNode<'_>, path: &str) -> PoliceResult<Value> {
    let names: Vec<&str> = match node.get("type") {
        Some(Value::String(name)) => vec![name.as_str()],
        Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
        _ => return Err(SchemaError::new(node.scope_str(), SchemaErrorKind::Type).into()),
    };
    let mut matched = false;
    for name in names {
        let ty = name
            .parse::<SchemaType>()
            .map_err(|_| {
                SchemaError::new(node.scope_str(), SchemaErrorKind::Type).with_info(name)
            })?;
        if is_type(&data, ty) {
            matched = true;
            break;
        }
    }
    if matched {
        Ok(data)
    } else {
        Err(validation_error(path, node, ValidationErrorKind::Type))
    }
}

fn enumeration(data: Value, node: &SchemaNode<'_>, path: &str) -> PoliceResult<Value> {
    let Some(Value::Array(allowed)) = node.get("enum") else {
        return Ok(data);
    };
    if allowed.contains(&data) {
        Ok(data)
    } else {
        Err(validation_error(path, node, ValidationErrorKind::Enum))
    }
}

fn constant(data: Value, node: &SchemaNode<'_>, path: &str) -> PoliceResult<Value> {
    match node.get("const") {
        Some(expected) if expected != &data => {
            Err(validation_error(path, node, ValidationErrorKind::Const))
        }
        _ => Ok(data),
    }
}

fn numeric(key: &str, data: Value, node: &SchemaNode<'_>, path: &str) -> PoliceResult<Value> {
    let (Some(x), Some(limit)) = (data.as_f64(), node.get(key)) else {
        return Ok(data);
    };
    let ok = match key {
        "multipleOf" => match limit.as_f64() {
            Some(m) if m > 0.0 => {
                let q = x / m;
                (q - q.round()).abs() <= MULTIPLE_OF_EPSILON * q.abs().max(1.0)
            }
            _ => true,
        },
        "maximum" => match limit.as_f64() {
            // OpenAPI 3.0 spells an exclusive bound as `exclusiveMaximum: true`.
            Some(max) if node.get("exclusiveMaximum") == Some(&Value::Bool(true)) => {
                return if x < max {
                    Ok(data)
                } else {
                    Err(validation_error(path, node, ValidationErrorKind::ExclusiveMaximum))
                };
            }
            Some(max) => x <= max,
            None => true,
        },
        "minimum" => match limit.as_f64() {
            Some(min) if node.get("exclusiveMinimum") == Some(&Value::Bool(true)) => {
                return if x > min {
                    Ok(data)
                } else {
                    Err(validation_error(path, node, ValidationErrorKind::ExclusiveMinimum))
                };
            }
            Some(min) => x >= min,
            None => true,
        },
        "exclusiveMaximum" => limit.as_f64().map(|max| x < max).unwrap_or(true),
        "exclusiveMinimum" => limit.as_f64().map(|min| x > min).unwrap_or(true),
        _ => true,
    };
    if ok {
        return Ok(data);
    }
    let kind = match key {
        "multipleOf" => ValidationErrorKind::MultipleOf,
        "maximum" => ValidationErrorKind::Maximum,
        "minimum" => ValidationErrorKind::Minimum,
        "exclusiveMaximum" => ValidationErrorKind::ExclusiveMaximum,
        _ => ValidationErrorKind::ExclusiveMinimum,
    };
    Err(validation_error(path, node, kind))
}

fn length(key: &str, data: Value, node: &SchemaNode<'_>, path: &str) -> PoliceResult<Value> {
    let (Some(s), Some(limit)) = (data.as_str(), node.get(key).and_then(Value::as_u64)) else {
        return Ok(data);
    };
    let len = s.chars().count() as u64;
    match key {
        "maxLength" if len > limit => {
            Err(validation_error(path, node, ValidationErrorKind::MaxLength))
        }
        "minLength" if len < limit => {
            Err(validation_error(path, node, ValidationErrorKind::MinLength))
        }
        _ => Ok(data),
    }
}

fn pattern(data: Value, node: &SchemaNode<'_>, path: &str) -> PoliceResult<Value> {
    let (Some(s), Some(source)) = (data.as_str(), node.get("pattern")) else {
        return Ok(data);
    };
    let re = source
        .as_str()
        .and_then(|p| Regex::new(p).ok())
        .ok_or_else(|| SchemaError::new(node.scope_str(), SchemaErrorKind::Pattern))?;
    if re.is_match(s) {
        Ok(data)
    } else {
        Err(validation_error(path, node, ValidationErrorKind::Pattern))
    }
}

fn size(key: &str, data: Value, node: &SchemaNode<'_>, path: &str) -> PoliceResult<Value> {
    let Some(limit) = node.get(key).and_then(Value::as_u64) else {
        return Ok(data);
    };
    let len = match (key, &data) {
        ("maxItems" | "minItems", Value::Array(items)) => Some(items.len() as u64),
        ("maxProperties" | "minProperties", Value::Object(map)) => Some(map.len() as u64),
        _ => None,
    };
    let Some(len) = len else {
        return Ok(data);
    };
    let kind = match key {
        "maxItems" if len > limit => ValidationErrorKind::MaxItems,
        "minItems" if len < limit => ValidationErrorKind::MinItems,
        "maxProperties" if len > limit => ValidationErrorKind::MaxProperties,
        "minProperties" if len < limit => ValidationErrorKind::MinProperties,
        _ => return Ok(data),
    };
    Err(validation_error(path, node, kind))
}

fn unique_items(data: Value, node: &SchemaNode<'_>, path: &str) -> PoliceResult<Value> {
    let unique = node.get("uniqueItems").and_then(Value::as_bool);
    let (Some(items), Some(true)) = (data.as_array(), unique) else {
        return Ok(data);
    };
    for (i, a) in items.iter().enumerate() {
        if items[i + 1..].contains(a) {
            return Err(validation_error(path, node, ValidationErrorKind::UniqueItems));
        }
    }
    Ok(data)
}

fn required(data: Value, node: &SchemaNode<'_>, path: &str) -> PoliceResult<Value> {
    let (Some(map), Some(Value::Array(names))) = (data.as_object(), node.get("required")) else {
        return Ok(data);
    };
    let missing: Vec<ValidationError> = names
        .iter()
        .filter_map(Value::as_str)
        .filter(|name| !map.contains_key(*name))
        .map(|name| {
            ValidationError::new(
                child_path(path, name),
                node.scope_str(),
                ValidationErrorKind::Required,
            )
        })
        .collect();
    if missing.is_empty() {
        Ok(data)
    } else {
        Err(aggregate_error(path, node, ValidationErrorKind::Required, missing))
    }
}

/// Runs `v` on `data`, sorting the outcome into a value or a collected cause.
fn collect<V: Validator + ?Sized>(
    v: &V,
    data: Value,
    node: &SchemaNode<'_>,
    path: &str,
    opts: &ValidationOptions,
    causes: &mut Vec<ValidationError>,
) -> PoliceResult<Option<Value>> {
    match v.root_validator(data, node, path, opts) {
        Ok(value) => Ok(Some(value)),
        Err(PoliceError::Validation(e)) => {
            causes.push(e);
            Ok(None)
        }
        Err(other) => Err(other),
    }
}

fn items<V: Validator + ?Sized>(
    v: &V,
    data: Value,
    node: &SchemaNode<'_>,
    path: &str,
    opts: &ValidationOptions,
) -> PoliceResult<Value> {
    let Value::Array(list) = data else {
        return Ok(data);
    };
    let tuple = matches!(node.get("items"), Some(Value::Array(_)));
    let mut out = Vec::with_capacity(list.len());
    let mut causes = Vec::new();
    for (i, item) in list.into_iter().enumerate() {
        let index = i.to_string();
        let child = if tuple {
            node.child(&["items", index.as_str()])
        } else {
            node.child(&["items"])
        };
        let Some(child) = child else {
            out.push(item);
            continue;
        };
        let original = item.clone();
        let item_path = child_path(path, &index);
        let validated = collect(v, item, &child, &item_path, opts, &mut causes)?;
        out.push(validated.unwrap_or(original));
    }
    if causes.is_empty() {
        Ok(Value::Array(out))
    } else {
        Err(aggregate_error(path, node, ValidationErrorKind::Items, causes))
    }
}

/// `additionalItems`. Only applies past a tuple-form `items` list.
fn additional_items<V: Validator + ?Sized>(
    v: &V,
    data: Value,
    node: &SchemaNode<'_>,
    path: &str,
    opts: &ValidationOptions,
) -> PoliceResult<Value> {
    let Some(Value::Array(tuple)) = node.get("items") else {
        return Ok(data);
    };
    let Value::Array(list) = data else {
        return Ok(data);
    };
    let skip = tuple.len();
    let forbidden = node.get("additionalItems") == Some(&Value::Bool(false));
    let child = node.child(&["additionalItems"]);

    let mut out = Vec::with_capacity(list.len());
    let mut causes = Vec::new();
    for (i, item) in list.into_iter().enumerate() {
        if i < skip {
            out.push(item);
            continue;
        }
        let item_path = child_path(path, &i.to_string());
        if forbidden {
            causes.push(ValidationError::new(
                item_path,
                node.scope_str(),
                ValidationErrorKind::AdditionalItems,
            ));
            continue;
        }
        match &child {
            Some(child) => {
                let original = item.clone();
                let validated = collect(v, item, child, &item_path, opts, &mut causes)?;
                out.push(validated.unwrap_or(original));
            }
            None => out.push(item),
        }
    }
    if causes.is_empty() {
        Ok(Value::Array(out))
    } else {
        Err(aggregate_error(path, node, ValidationErrorKind::AdditionalItems, causes))
    }
}

fn properties<V: Validator + ?Sized>(
    v: &V,
    data: Value,
    node: &SchemaNode<'_>,
    path: &str,
    opts: &ValidationOptions,
) -> PoliceResult<Value> {
    let (Value::Object(mut map), Some(Value::Object(declared))) =
        (data.clone(), node.get("properties"))
    else {
        return Ok(data);
    };
    let mut causes = Vec::new();
    for name in declared.keys() {
        let Some(child) = node.child(&["properties", name.as_str()]) else {
            continue;
        };
        match map.remove(name) {
            Some(value) => {
                let original = value.clone();
                let prop_path = child_path(path, name);
                let validated = collect(v, value, &child, &prop_path, opts, &mut causes)?;
                map.insert(name.clone(), validated.unwrap_or(original));
            }
            None => {
                let target = v.registry().deref(child)?;
                if let Some(default) = target.get("default") {
                    map.insert(name.clone(), default.clone());
                }
            }
        }
    }
    if causes.is_empty() {
        Ok(Value::Object(reorder(map, &data)))
    } else {
        Err(aggregate_error(path, node, ValidationErrorKind::Properties, causes))
    }
}

/// Restores the instance's key order; defaults are appended at the end.
fn reorder(mut map: Map<String, Value>, original: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    if let Some(original) = original.as_object() {
        for key in original.keys() {
            if let Some(value) = map.remove(key) {
                out.insert(key.clone(), value);
            }
        }
    }
    out.extend(map);
    out
}

fn additional_properties<V: Validator + ?Sized>(
    v: &V,
    data: Value,
    node: &SchemaNode<'_>,
    path: &str,
    opts: &ValidationOptions,
) -> PoliceResult<Value> {
    let Value::Object(map) = data else {
        return Ok(data);
    };
    let declared = node.get("properties").and_then(Value::as_object);
    let is_declared = |name: &str| declared.map(|d| d.contains_key(name)).unwrap_or(false);
    let forbidden = node.get("additionalProperties") == Some(&Value::Bool(false));
    let child = node.child(&["additionalProperties"]);

    let mut out = Map::new();
    let mut causes = Vec::new();
    for (name, value) in map {
        if is_declared(&name) {
            out.insert(name, value);
            continue;
        }
        let prop_path = child_path(path, &name);
        if forbidden {
            causes.push(ValidationError::new(
                prop_path,
                node.scope_str(),
                ValidationErrorKind::AdditionalProperties,
            ));
            continue;
        }
        match &child {
            Some(child) => {
                let original = value.clone();
                let validated = collect(v, value, child, &prop_path, opts, &mut causes)?;
                out.insert(name, validated.unwrap_or(original));
            }
            None => {
                out.insert(name, value);
            }
        }
    }
    if causes.is_empty() {
        Ok(Value::Object(out))
    } else {
        Err(aggregate_error(path, node, ValidationErrorKind::AdditionalProperties, causes))
    }
}

fn not<V: Validator + ?Sized>(
    v: &V,
    data: Value,
    node: &SchemaNode<'_>,
    path: &str,
    opts: &ValidationOptions,
) -> PoliceResult<Value> {
    let Some(child) = node.child(&["not"]) else {
        return Ok(data);
    };
    match v.root_validator(data.clone(), &child, path, opts) {
        Ok(_) => Err(validation_error(path, node, ValidationErrorKind::Not)),
        Err(PoliceError::Validation(_)) => Ok(data),
        Err(other) => Err(other),
    }
}

/// Subschemas of the combinator `key`, each as a child node.
pub fn branches<'a>(node: &SchemaNode<'a>, key: &str) -> Vec<SchemaNode<'a>> {
    let count = node.get(key).and_then(Value::as_array).map(Vec::len).unwrap_or(0);
    (0..count)
        .filter_map(|i| {
            let index = i.to_string();
            node.child(&[key, index.as_str()])
        })
        .collect()
}

/// `allOf`. Members resolving to the node's excluded scope are skipped.
pub fn all_of<V: Validator + ?Sized>(
    v: &V,
    mut data: Value,
    node: &SchemaNode<'_>,
    path: &str,
    opts: &ValidationOptions,
) -> PoliceResult<Value> {
    for branch in branches(node, "allOf") {
        if let Some(excluded) = node.excluded_all_of() {
            let target = v.registry().deref(branch.clone())?;
            if target.scope_str() == excluded {
                tracing::trace!(scope = excluded, "skipping self-referencing allOf member");
                continue;
            }
        }
        data = match v.root_validator(data, &branch, path, opts) {
            Ok(value) => value,
            Err(PoliceError::Validation(e)) => {
                return Err(aggregate_error(path, node, ValidationErrorKind::AllOf, vec![e]))
            }
            Err(other) => return Err(other),
        };
    }
    Ok(data)
}

/// `anyOf`: the first matching branch's result wins.
pub fn any_of<V: Validator + ?Sized>(
    v: &V,
    data: Value,
    node: &SchemaNode<'_>,
    path: &str,
    opts: &ValidationOptions,
) -> PoliceResult<Value> {
    let mut causes = Vec::new();
    for branch in branches(node, "anyOf") {
        if let Some(value) = collect(v, data.clone(), &branch, path, opts, &mut causes)? {
            return Ok(value);
        }
    }
    Err(aggregate_error(path, node, ValidationErrorKind::AnyOf, causes))
}

/// `oneOf`: exactly one branch must match.
pub fn one_of<V: Validator + ?Sized>(
    v: &V,
    data: Value,
    node: &SchemaNode<'_>,
    path: &str,
    opts: &ValidationOptions,
) -> PoliceResult<Value> {
    let mut causes = Vec::new();
    let mut matched = Vec::new();
    for branch in branches(node, "oneOf") {
        if let Some(value) = collect(v, data.clone(), &branch, path, opts, &mut causes)? {
            matched.push(value);
        }
    }
    match matched.len() {
        1 => Ok(matched.remove(0)),
        0 => Err(aggregate_error(path, node, ValidationErrorKind::OneOf, causes)),
        n => {
            tracing::debug!(matches = n, path, "oneOf matched more than one branch");
            Err(validation_error(path, node, ValidationErrorKind::OneOf))
        }
    }
}
