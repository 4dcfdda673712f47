//! Retrieval and carving of GitHub's webhook OpenAPI document.
//!
//! Built on synchronous reqwest; a single document fetch doesn't justify
//! tainting the codebase with async.

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use github_webhook_capabilities::Schema;
use indexmap::IndexMap;
use serde_json::Value;

use crate::resolve;

/// Where octokit/openapi-webhooks publishes its generated document.
fn document_url(webhooks_ref: &str) -> String {
    // Tags are conventionally `v`-prefixed; anything else is a branch.
    let git_ref = if webhooks_ref.starts_with('v') {
        format!("refs/tags/{webhooks_ref}")
    } else {
        format!("refs/heads/{webhooks_ref}")
    };

    format!(
        "https://github.com/octokit/openapi-webhooks/raw/{git_ref}/packages/openapi-webhooks/generated/api.github.com.json"
    )
}

/// Fetches the OpenAPI document at the given octokit/openapi-webhooks ref.
pub(crate) fn fetch(webhooks_ref: &str) -> Result<Value> {
    let url = document_url(webhooks_ref);
    tracing::info!("downloading OpenAPI document (ref={webhooks_ref})");

    let client = reqwest::blocking::Client::builder()
        .user_agent("webhooks-to-contexts")
        .build()?;

    client
        .get(&url)
        .send()
        .and_then(|response| response.error_for_status())
        .with_context(|| format!("couldn't fetch {url}"))?
        .json()
        .with_context(|| format!("couldn't parse response from {url}"))
}

/// Loads a previously fetched document from disk.
pub(crate) fn load(path: &Utf8Path) -> Result<Value> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("couldn't read {path}"))?;

    serde_json::from_str(&raw).with_context(|| format!("couldn't parse {path}"))
}

/// Extracts every webhook payload schema from the document, with all
/// local references inlined.
///
/// Only `components.schemas` entries named `webhook-*` describe webhook
/// payloads; everything else in the document is REST API surface we
/// don't care about.
pub(crate) fn webhook_schemas(document: &Value) -> Result<IndexMap<String, Schema>> {
    tracing::info!("resolving references, this can take a moment");
    let resolved = resolve::resolve(document)?;

    let Some(Value::Object(components)) = resolved.pointer("/components/schemas") else {
        bail!("document has no components.schemas");
    };

    let mut schemas = IndexMap::new();
    for (name, schema) in components {
        if !name.starts_with("webhook-") {
            continue;
        }

        let schema = Schema::from_value(schema)
            .with_context(|| format!("couldn't parse schema {name}"))?;
        schemas.insert(name.clone(), schema);
    }

    Ok(schemas)
}
