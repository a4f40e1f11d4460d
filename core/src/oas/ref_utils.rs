#![deny(missing_docs)]

//! # Reference Utilities
//!
//! URI normalization and JSON Pointer helpers shared by the registry and the
//! discriminator resolver. Nothing here fetches remote documents.

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

const DUMMY_BASE: &str = "http://example.invalid/";

/// A bare token with no scheme, slash or fragment marker; eligible for
/// `#/components/schemas/<name>` shorthand expansion.
static LOCAL_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-.]*$").expect("static regex"));

/// Whether `value` matches the local identifier pattern.
pub fn is_local_identifier(value: &str) -> bool {
    LOCAL_IDENTIFIER.is_match(value)
}

/// Resolves `reference` against `base`, yielding an absolute URI.
pub fn normalize_uri(reference: &str, base: &Url) -> Option<Url> {
    if let Ok(url) = Url::parse(reference) {
        return Some(url);
    }
    base.join(reference).ok()
}

/// Parses a retrieval URI, accepting relative paths by anchoring them on a dummy host.
pub(crate) fn parse_base_url(base_str: &str) -> Option<Url> {
    if let Ok(url) = Url::parse(base_str) {
        return Some(url);
    }
    let dummy = Url::parse(DUMMY_BASE).ok()?;
    dummy.join(base_str).ok()
}

/// Returns `url` without its fragment.
pub(crate) fn document_part(url: &Url) -> Url {
    let mut doc = url.clone();
    doc.set_fragment(None);
    doc
}

/// Returns the percent-decoded fragment of `url`, or `""` when absent.
pub(crate) fn decoded_fragment(url: &Url) -> String {
    url.fragment()
        .map(|f| percent_decode_str(f).decode_utf8_lossy().into_owned())
        .unwrap_or_default()
}

/// Escapes a single JSON Pointer segment (`~` -> `~0`, `/` -> `~1`).
pub(crate) fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Decodes a single JSON Pointer segment.
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
