//! Local JSON reference resolution.
//!
//! GitHub's OpenAPI document is heavily `$ref`-linked; the classifier
//! needs fully inlined schemas. Only document-local references
//! (`#/components/...`) are supported: remote references would require
//! network access mid-resolution and fail fast instead.

use std::collections::HashMap;

use anyhow::{Result, anyhow, bail};
use serde_json::Value;

/// Returns a copy of `document` with every local `$ref` inlined.
pub(crate) fn resolve(document: &Value) -> Result<Value> {
    Resolver {
        document,
        resolving: Vec::new(),
        resolved: HashMap::new(),
    }
    .resolve_value(document)
}

struct Resolver<'doc> {
    document: &'doc Value,
    /// Pointers currently being expanded, for cycle detection.
    resolving: Vec<String>,
    /// Memoized expansions; shared targets resolve once.
    resolved: HashMap<String, Value>,
}

impl Resolver<'_> {
    fn resolve_value(&mut self, value: &Value) -> Result<Value> {
        match value {
            Value::Object(fields) => {
                // A `$ref` replaces its entire node, including any
                // sibling keys.
                if let Some(Value::String(reference)) = fields.get("$ref") {
                    return self.resolve_reference(reference);
                }

                let mut out = serde_json::Map::with_capacity(fields.len());
                for (key, child) in fields {
                    out.insert(key.clone(), self.resolve_value(child)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_value(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn resolve_reference(&mut self, reference: &str) -> Result<Value> {
        let Some(pointer) = reference.strip_prefix('#') else {
            bail!("unsupported non-local reference: {reference}");
        };

        if let Some(resolved) = self.resolved.get(pointer) {
            return Ok(resolved.clone());
        }

        if self.resolving.iter().any(|seen| seen == pointer) {
            bail!("reference cycle at {reference}");
        }

        let target = self
            .document
            .pointer(pointer)
            .ok_or_else(|| anyhow!("dangling reference: {reference}"))?;

        self.resolving.push(pointer.into());
        let resolved = self.resolve_value(target)?;
        self.resolving.pop();

        self.resolved.insert(pointer.into(), resolved.clone());
        Ok(resolved)
    }
}
