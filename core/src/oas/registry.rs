#![deny(missing_docs)]

//! # Schema Registry
//!
//! An arena of registered OpenAPI / JSON Schema documents keyed by normalized
//! document URI. Every schema node is addressed by its absolute scope
//! (`<document>#<json-pointer>`), which is also what error values report.
//!
//! Embedded `$id` and `$anchor` values are indexed at registration time so that
//! `$ref`s written against them resolve without a network round trip.

use crate::error::{PoliceError, PoliceResult, SchemaError, SchemaErrorKind};
use crate::oas::ref_utils::{
    decode_pointer_segment, decoded_fragment, document_part, escape_pointer_segment,
    normalize_uri, parse_base_url,
};
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

/// `$ref` chains longer than this are treated as cycles.
const MAX_REF_HOPS: usize = 32;

/// Keys whose values are instance data, not subschemas.
const DATA_KEYS: &[&str] = &["enum", "const", "default", "example", "examples"];

/// A location inside a registered document.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    doc: String,
    pointer: String,
}

/// Registry of documents available for `$ref` resolution.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    docs: HashMap<String, Value>,
    ids: HashMap<String, Target>,
    anchors: HashMap<String, Target>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document from YAML.
    pub fn register_yaml(&mut self, retrieval_uri: &str, yaml: &str) -> PoliceResult<Url> {
        let raw: Value = serde_yaml::from_str(yaml)
            .map_err(|e| {
                PoliceError::Document(format!("Failed to parse YAML '{}': {}", retrieval_uri, e))
            })?;
        self.register_json(retrieval_uri, raw)
    }

    /// Registers a document from a JSON value and returns its normalized URI.
    pub fn register_json(&mut self, retrieval_uri: &str, raw: Value) -> PoliceResult<Url> {
        let url = parse_base_url(retrieval_uri)
            .ok_or_else(|| {
                PoliceError::Document(format!("Invalid retrieval URI '{}'", retrieval_uri))
            })?;
        let doc = document_part(&url);
        let key = doc.to_string();
        if self.docs.contains_key(&key) {
            return Err(PoliceError::Document(format!(
                "Document registry URI collision for '{}'",
                key
            )));
        }

        let mut ids = Vec::new();
        let mut anchors = Vec::new();
        collect_identifiers(&raw, &doc, &key, String::new(), &mut ids, &mut anchors);
        for (uri, target) in ids {
            self.ids.entry(uri).or_insert(target);
        }
        for (uri, target) in anchors {
            self.anchors.entry(uri).or_insert(target);
        }

        tracing::debug!(uri = %key, "registered schema document");
        self.docs.insert(key, raw);
        Ok(doc)
    }

    /// Whether a document is registered under `uri`.
    pub fn contains(&self, uri: &str) -> bool {
        parse_base_url(uri)
            .map(|u| self.docs.contains_key(document_part(&u).as_str()))
            .unwrap_or(false)
    }

    /// Looks up the node addressed by an absolute URI.
    pub fn node(&self, uri: &Url) -> Option<SchemaNode<'_>> {
        let target = self.locate(uri)?;
        let root = self.docs.get(&target.doc)?;
        let value = root.pointer(&target.pointer)?;
        let doc_url = Url::parse(&target.doc).ok()?;
        let base = base_at(root, &doc_url, &target.pointer);
        Some(SchemaNode {
            value,
            doc: doc_url,
            pointer: target.pointer,
            base,
            excluded_all_of: None,
        })
    }

    /// Looks up the node addressed by a URI string.
    pub fn node_str(&self, uri: &str) -> Option<SchemaNode<'_>> {
        let url = parse_base_url(uri)?;
        self.node(&url)
    }

    /// Resolves `reference` against `base` and returns the addressed node.
    pub fn resolve(&self, reference: &str, base: &Url) -> Option<SchemaNode<'_>> {
        let url = normalize_uri(reference, base)?;
        self.node(&url)
    }

    /// Follows `$ref` chains until a node without `$ref` is reached.
    pub fn deref<'a>(&'a self, node: SchemaNode<'a>) -> Result<SchemaNode<'a>, SchemaError> {
        let mut current = node;
        for _ in 0..MAX_REF_HOPS {
            let Some(reference) = current.value.get("$ref") else {
                return Ok(current);
            };
            let Some(reference) = reference.as_str() else {
                return Err(SchemaError::new(current.scope_str(), SchemaErrorKind::Ref));
            };
            let excluded = current.excluded_all_of.take();
            let next = self.resolve(reference, &current.base).ok_or_else(|| {
                SchemaError::new(current.scope_str(), SchemaErrorKind::Ref).with_info(reference)
            })?;
            current = SchemaNode {
                excluded_all_of: excluded,
                ..next
            };
        }
        Err(SchemaError::new(current.scope_str(), SchemaErrorKind::Ref)
            .with_info("reference cycle"))
    }

    fn locate(&self, uri: &Url) -> Option<Target> {
        let doc = document_part(uri);
        let fragment = decoded_fragment(uri);

        if !fragment.is_empty() && !fragment.starts_with('/') {
            return self.anchors.get(uri.as_str()).cloned();
        }

        if self.docs.contains_key(doc.as_str()) {
            return Some(Target {
                doc: doc.to_string(),
                pointer: fragment,
            });
        }

        self.ids.get(doc.as_str()).map(|t| Target {
            doc: t.doc.clone(),
            pointer: format!("{}{}", t.pointer, fragment),
        })
    }
}

/// A borrowed view of one schema node together with its addressing context.
#[derive(Debug, Clone)]
pub struct SchemaNode<'a> {
    value: &'a Value,
    doc: Url,
    pointer: String,
    base: Url,
    excluded_all_of: Option<String>,
}

impl<'a> SchemaNode<'a> {
    /// The raw schema value.
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Returns keyword `key` of this node, if it is an object.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.value.get(key)
    }

    /// Whether this node declares keyword `key`.
    pub fn has(&self, key: &str) -> bool {
        self.value.as_object().map(|o| o.contains_key(key)).unwrap_or(false)
    }

    /// The canonical location of this node.
    pub fn scope(&self) -> Url {
        let mut scope = self.doc.clone();
        scope.set_fragment(Some(&self.pointer));
        scope
    }

    /// The canonical location as a string.
    pub fn scope_str(&self) -> String {
        self.scope().to_string()
    }

    /// The base URI relative references inside this node resolve against.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Descends into the subschema at `segments` below this node.
    pub fn child(&self, segments: &[&str]) -> Option<SchemaNode<'a>> {
        let mut value = self.value;
        let mut pointer = self.pointer.clone();
        let mut base = self.base.clone();
        for segment in segments {
            value = match value {
                Value::Object(map) => map.get(*segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
            pointer.push('/');
            pointer.push_str(&escape_pointer_segment(segment));
            if let Some(id) = value.get("$id").and_then(Value::as_str) {
                if let Some(next) = normalize_uri(id, &base) {
                    base = next;
                }
            }
        }
        Some(SchemaNode {
            value,
            doc: self.doc.clone(),
            pointer,
            base,
            excluded_all_of: None,
        })
    }

    /// Returns a view of this node whose `allOf` skips members resolving to `scope`.
    pub fn excluding_all_of(mut self, scope: impl Into<String>) -> Self {
        self.excluded_all_of = Some(scope.into());
        self
    }

    /// Scope filtered out of `allOf`, if any.
    pub fn excluded_all_of(&self) -> Option<&str> {
        self.excluded_all_of.as_deref()
    }
}

/// Computes the `$id`-aware base URI of the node at `pointer`.
fn base_at(root: &Value, doc: &Url, pointer: &str) -> Url {
    let mut base = doc.clone();
    let mut value = root;
    if let Some(id) = value.get("$id").and_then(Value::as_str) {
        if let Some(next) = normalize_uri(id, &base) {
            base = next;
        }
    }
    for raw in pointer.split('/').skip(1) {
        let segment = decode_pointer_segment(raw);
        let next = match value {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        let Some(next) = next else {
            break;
        };
        value = next;
        if let Some(id) = value.get("$id").and_then(Value::as_str) {
            if let Some(url) = normalize_uri(id, &base) {
                base = url;
            }
        }
    }
    base
}

fn collect_identifiers(
    value: &Value,
    base: &Url,
    doc_key: &str,
    pointer: String,
    ids: &mut Vec<(String, Target)>,
    anchors: &mut Vec<(String, Target)>,
) {
    match value {
        Value::Object(map) => {
            let mut base = base.clone();
            if let Some(id) = map.get("$id").and_then(Value::as_str) {
                if let Some(url) = normalize_uri(id, &base) {
                    base = document_part(&url);
                    ids.push((
                        base.to_string(),
                        Target {
                            doc: doc_key.to_string(),
                            pointer: pointer.clone(),
                        },
                    ));
                }
            }
            if let Some(anchor) = map.get("$anchor").and_then(Value::as_str) {
                let mut anchored = base.clone();
                anchored.set_fragment(Some(anchor));
                anchors.push((
                    anchored.to_string(),
                    Target {
                        doc: doc_key.to_string(),
                        pointer: pointer.clone(),
                    },
                ));
            }
            for (key, child) in map {
                if DATA_KEYS.contains(&key.as_str()) {
                    continue;
                }
                let child_pointer = format!("{}/{}", pointer, escape_pointer_segment(key));
                collect_identifiers(child, &base, doc_key, child_pointer, ids, anchors);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                let child_pointer = format!("{}/{}", pointer, i);
                collect_identifiers(child, base, doc_key, child_pointer, ids, anchors);
            }
        }
        _ => {}
    }
}
