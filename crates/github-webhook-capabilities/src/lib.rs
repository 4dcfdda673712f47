//! Capability classification for GitHub webhook payload schemas.
//!
//! GitHub Actions workflows can interpolate pieces of their triggering
//! webhook's payload (e.g. `github.event.pull_request.title`) directly
//! into shell commands and other injection-sensitive sinks. Whether that's
//! dangerous depends on how much an attacker can influence the interpolated
//! value: a pull request title is free text, while a numeric ID is not.
//!
//! This crate turns the JSON Schema descriptions of webhook payloads into
//! a mapping from dotted, wildcard-capable context patterns
//! (`github.event.issue.labels.*.name`) to a [`Capability`], suitable for
//! consumption by a template injection analyzer.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod capability;
pub mod schema;
pub mod triggers;
pub mod walk;

pub use capability::{Capability, CapabilityMap};
pub use schema::{Schema, SchemaError};
pub use triggers::{ClassifyError, WORKFLOW_TRIGGERS, classify, webhook_key};
pub use walk::Leaves;
