//! Request fingerprinting
//!
//! A fingerprint is the BLAKE3 digest of the canonical JSON of the parts of a
//! request that decide its outcome: the intent, the text and, for wiki
//! updates, the resolved update mode. Correlation data (`request_id`,
//! `context`) never takes part, so replays with fresh ids still hit the cache.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::protocol::{Intent, RequestEnvelope};
use crate::wiki::WikiDefaults;

/// Stable cache key for a request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 hex digits, for log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives fingerprints for validated requests
#[derive(Debug, Clone, Copy, Default)]
pub struct Fingerprinter {
    wiki_defaults: WikiDefaults,
}

impl Fingerprinter {
    pub fn new(wiki_defaults: WikiDefaults) -> Self {
        Self { wiki_defaults }
    }

    /// The request subset that is hashed (also recorded in cache entries)
    pub fn subject(&self, request: &RequestEnvelope) -> Value {
        let mut input = serde_json::Map::new();
        if let Some(text) = &request.input.text {
            input.insert("text".to_string(), Value::String(text.clone()));
        }
        if request.intent == Intent::UpdateWiki {
            let mode = self.wiki_defaults.resolve_mode(&request.input.metadata);
            input.insert("update_mode".to_string(), json!(mode));
        }

        json!({
            "intent": request.intent,
            "input": input,
        })
    }

    pub fn fingerprint(&self, request: &RequestEnvelope) -> Fingerprint {
        fingerprint_value(&self.subject(request))
    }
}

/// Hash any JSON value canonically
pub fn fingerprint_value(value: &Value) -> Fingerprint {
    let canonical = canonical_json(value);
    Fingerprint(blake3::hash(canonical.as_bytes()).to_hex().to_string())
}

/// Digest of a document's current text
pub fn fingerprint_text(text: &str) -> Fingerprint {
    Fingerprint(blake3::hash(text.as_bytes()).to_hex().to_string())
}

/// Serialize with object keys sorted at every depth
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{RequestContext, RequestInput};

    fn wiki_request(request_id: &str, input: RequestInput, user: &str) -> RequestEnvelope {
        RequestEnvelope::new(
            request_id,
            "KnowledgeBaseBuilderAgent",
            Intent::UpdateWiki,
            input,
            RequestContext::for_user(user),
        )
    }

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let value = json!({ "b": { "z": 1, "a": [ { "y": 2, "x": 3 } ] }, "a": "s" });
        assert_eq!(
            canonical_json(&value),
            r#"{"a":"s","b":{"a":[{"x":3,"y":2}],"z":1}}"#
        );
    }

    #[test]
    fn test_canonical_json_escapes_keys_and_strings() {
        let value = json!({ "q\"k": "line\nbreak" });
        assert_eq!(canonical_json(&value), r#"{"q\"k":"line\nbreak"}"#);
    }

    #[test]
    fn test_correlation_data_is_ignored() {
        let fp = Fingerprinter::default();
        let a = wiki_request("r-1", RequestInput::from_text("hello"), "u1");
        let mut b = wiki_request("r-2", RequestInput::from_text("hello"), "u2");
        b.context.conversation_id = Some("conv".to_string());
        b.context.timestamp = Some("2025-01-01T00:00:00Z".to_string());

        assert_eq!(fp.fingerprint(&a), fp.fingerprint(&b));
    }

    #[test]
    fn test_default_mode_equals_explicit_overwrite() {
        let fp = Fingerprinter::default();
        let implicit = wiki_request("r", RequestInput::from_text("hello"), "u");
        let explicit = wiki_request(
            "r",
            RequestInput::from_text("hello").with_metadata("update_mode", "overwrite"),
            "u",
        );

        assert_eq!(fp.fingerprint(&implicit), fp.fingerprint(&explicit));
    }

    #[test]
    fn test_mode_changes_fingerprint() {
        let fp = Fingerprinter::default();
        let overwrite = wiki_request("r", RequestInput::from_text("hello"), "u");
        let append = wiki_request(
            "r",
            RequestInput::from_text("hello").with_metadata("update_mode", "append"),
            "u",
        );

        assert_ne!(fp.fingerprint(&overwrite), fp.fingerprint(&append));
    }

    #[test]
    fn test_intent_changes_fingerprint() {
        let fp = Fingerprinter::default();
        let wiki = wiki_request("r", RequestInput::from_text("hello"), "u");
        let mut task = wiki.clone();
        task.intent = Intent::CreateTask;

        assert_ne!(fp.fingerprint(&wiki), fp.fingerprint(&task));
    }

    #[test]
    fn test_unrelated_metadata_is_ignored() {
        let fp = Fingerprinter::default();
        let plain = wiki_request("r", RequestInput::from_text("hello"), "u");
        let tagged = wiki_request(
            "r",
            RequestInput::from_text("hello").with_metadata("source", "slack"),
            "u",
        );

        assert_eq!(fp.fingerprint(&plain), fp.fingerprint(&tagged));
    }

    #[test]
    fn test_text_digest_tracks_content() {
        assert_eq!(fingerprint_text("B"), fingerprint_text("B"));
        assert_ne!(fingerprint_text("A"), fingerprint_text("B"));
        assert_ne!(fingerprint_text(""), fingerprint_text("\n"));
    }

    #[test]
    fn test_fingerprint_is_hex_digest() {
        let fp = Fingerprinter::default().fingerprint(&wiki_request(
            "r",
            RequestInput::from_text("hello"),
            "u",
        ));
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp.short().len(), 8);
    }
}
