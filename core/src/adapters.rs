//! Format adapters normalize tool payloads before a builder sees them.
//!
//! Backends wrap the same data in different envelopes: stringified JSON,
//! `{"data": ...}` wrappers, bare arrays. Each adapter recognizes one shape and
//! rewrites it into the canonical one. The registry keeps applying adapters
//! until none matches, then hands the value to the builder.

use serde_json::{Map, Value};

use crate::error::AdapterError;

/// Upper bound on adapter applications for one payload.
pub const MAX_ADAPTER_PASSES: usize = 8;

/// Name reported when no adapter matched.
pub const PASSTHROUGH: &str = "passthrough";

const ENVELOPE_KEYS: &[&str] = &["data", "result", "payload", "response"];

pub trait FormatAdapter: Send + Sync {
    fn name(&self) -> &'static str;
    fn matches(&self, value: &Value) -> bool;
    fn adapt(&self, value: Value) -> Result<Value, AdapterError>;
}

/// A JSON string whose content is itself an object or array.
pub struct StringifiedJson;

impl FormatAdapter for StringifiedJson {
    fn name(&self) -> &'static str {
        "stringified_json"
    }

    fn matches(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|raw| {
            let trimmed = raw.trim_start();
            trimmed.starts_with('{') || trimmed.starts_with('[')
        })
    }

    fn adapt(&self, value: Value) -> Result<Value, AdapterError> {
        let raw = value.as_str().unwrap_or_default();
        match serde_json::from_str::<Value>(raw) {
            Ok(parsed @ (Value::Object(_) | Value::Array(_))) => Ok(parsed),
            Ok(_) => Err(AdapterError::Rejected {
                adapter: self.name(),
                reason: "decoded value is not an object or array".to_string(),
            }),
            Err(e) => Err(AdapterError::Rejected {
                adapter: self.name(),
                reason: e.to_string(),
            }),
        }
    }
}

/// `{"data": {...}}`-style wrappers with exactly one known envelope key.
pub struct Envelope;

impl Envelope {
    fn envelope_key(map: &Map<String, Value>) -> Option<&'static str> {
        let mut found = ENVELOPE_KEYS
            .iter()
            .copied()
            .filter(|key| map.contains_key(*key));
        let key = found.next()?;
        if found.next().is_some() {
            return None;
        }
        match map.get(key) {
            Some(Value::Object(_) | Value::Array(_)) => Some(key),
            _ => None,
        }
    }
}

impl FormatAdapter for Envelope {
    fn name(&self) -> &'static str {
        "envelope"
    }

    fn matches(&self, value: &Value) -> bool {
        value.as_object().and_then(Self::envelope_key).is_some()
    }

    fn adapt(&self, value: Value) -> Result<Value, AdapterError> {
        let Value::Object(mut map) = value else {
            return Err(AdapterError::Rejected {
                adapter: self.name(),
                reason: "payload is not an object".to_string(),
            });
        };
        let key = Self::envelope_key(&map).ok_or(AdapterError::Rejected {
            adapter: self.name(),
            reason: "no unique envelope key".to_string(),
        })?;
        Ok(map.remove(key).unwrap_or(Value::Null))
    }
}

/// A bare top-level array becomes `{"items": [...]}`.
pub struct ItemsArray;

impl FormatAdapter for ItemsArray {
    fn name(&self) -> &'static str {
        "items_array"
    }

    fn matches(&self, value: &Value) -> bool {
        value.is_array()
    }

    fn adapt(&self, value: Value) -> Result<Value, AdapterError> {
        let mut map = Map::new();
        map.insert("items".to_string(), value);
        Ok(Value::Object(map))
    }
}

/// `null` becomes an empty object so builders with all-optional input still work.
pub struct NullPayload;

impl FormatAdapter for NullPayload {
    fn name(&self) -> &'static str {
        "null_payload"
    }

    fn matches(&self, value: &Value) -> bool {
        value.is_null()
    }

    fn adapt(&self, _value: Value) -> Result<Value, AdapterError> {
        Ok(Value::Object(Map::new()))
    }
}

/// Normalized payload plus the adapters that produced it, in application order.
#[derive(Debug, Clone, PartialEq)]
pub struct Adapted {
    pub value: Value,
    pub applied: Vec<String>,
}

pub struct AdapterRegistry {
    adapters: Vec<Box<dyn FormatAdapter>>,
}

impl AdapterRegistry {
    /// Registry with no adapters; every payload passes through unchanged.
    pub fn empty() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(StringifiedJson);
        registry.register(Envelope);
        registry.register(ItemsArray);
        registry.register(NullPayload);
        registry
    }

    pub fn register(&mut self, adapter: impl FormatAdapter + 'static) {
        self.adapters.push(Box::new(adapter));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub fn normalize(&self, value: Value) -> Adapted {
        let mut current = value;
        let mut applied = Vec::new();

        'passes: for _ in 0..MAX_ADAPTER_PASSES {
            for adapter in &self.adapters {
                if !adapter.matches(&current) {
                    continue;
                }
                match adapter.adapt(current.clone()) {
                    Ok(next) => {
                        tracing::debug!(adapter = adapter.name(), "payload adapted");
                        applied.push(adapter.name().to_string());
                        current = next;
                        continue 'passes;
                    }
                    Err(e) => {
                        tracing::warn!(adapter = adapter.name(), error = %e, "adapter failed, trying next");
                    }
                }
            }
            break;
        }

        if applied.is_empty() {
            applied.push(PASSTHROUGH.to_string());
        }

        Adapted {
            value: current,
            applied,
        }
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
