//! Workflow trigger events and the aggregation of their schemas into one
//! capability mapping.

use indexmap::IndexMap;
use thiserror::Error;

use crate::capability::CapabilityMap;
use crate::schema::Schema;

/// A mapping of workflow trigger event names to subevents.
///
/// Keep in sync with:
/// <https://docs.github.com/en/actions/writing-workflows/choosing-when-your-workflow-runs/events-that-trigger-workflows>
///
/// Triggers that aren't webhooks (`schedule`, `workflow_call`) or that
/// reuse another webhook's payload (`pull_request_target`) are omitted.
pub static WORKFLOW_TRIGGERS: &[(&str, &[&str])] = &[
    ("branch_protection_rule", &["created", "edited", "deleted"]),
    (
        "check_run",
        &["created", "rerequested", "completed", "requested_action"],
    ),
    ("check_suite", &["completed"]),
    ("create", &[]),
    ("delete", &[]),
    // GitHub doesn't specify the subevent for `deployment` or
    // `deployment_status`, but the docs imply that it's `created`.
    ("deployment", &["created"]),
    ("deployment_status", &["created"]),
    (
        "discussion",
        &[
            "created",
            "edited",
            "deleted",
            "transferred",
            "pinned",
            "unpinned",
            "labeled",
            "unlabeled",
            "locked",
            "unlocked",
            "category_changed",
            "answered",
            "unanswered",
        ],
    ),
    ("discussion_comment", &["created", "edited", "deleted"]),
    ("fork", &[]),
    ("gollum", &[]),
    ("issue_comment", &["created", "edited", "deleted"]),
    (
        "issues",
        &[
            "opened",
            "edited",
            "deleted",
            "transferred",
            "pinned",
            "unpinned",
            "closed",
            "reopened",
            "assigned",
            "unassigned",
            "labeled",
            "unlabeled",
            "locked",
            "unlocked",
            "milestoned",
            "demilestoned",
            "typed",
            "untyped",
        ],
    ),
    ("label", &["created", "edited", "deleted"]),
    ("merge_group", &["checks_requested"]),
    (
        "milestone",
        &["created", "closed", "opened", "edited", "deleted"],
    ),
    ("page_build", &[]),
    ("public", &[]),
    (
        "pull_request",
        &[
            "assigned",
            "unassigned",
            "labeled",
            "unlabeled",
            "opened",
            "edited",
            "closed",
            "reopened",
            "synchronize",
            "converted_to_draft",
            "locked",
            "unlocked",
            "enqueued",
            "dequeued",
            "milestoned",
            "demilestoned",
            "ready_for_review",
            "review_requested",
            "review_request_removed",
            "auto_merge_enabled",
            "auto_merge_disabled",
        ],
    ),
    ("pull_request_review", &["submitted", "edited", "dismissed"]),
    (
        "pull_request_review_comment",
        &["created", "edited", "deleted"],
    ),
    ("push", &[]),
    ("registry_package", &["published", "updated"]),
    (
        "release",
        &[
            "published",
            "unpublished",
            "created",
            "edited",
            "deleted",
            "prereleased",
            "released",
        ],
    ),
    // GitHub's OpenAPI document uses `sample` to provide an example payload.
    ("repository_dispatch", &["sample"]),
    ("status", &[]),
    ("watch", &["started"]),
    ("workflow_dispatch", &[]),
    ("workflow_run", &["completed", "in_progress", "requested"]),
];

/// Derives the OpenAPI component name for an event (and optionally one of
/// its subevents), e.g. `webhook-pull-request-opened`.
pub fn webhook_key(event: &str, subevent: Option<&str>) -> String {
    let event = event.replace('_', "-");
    match subevent {
        Some(subevent) => format!("webhook-{event}-{}", subevent.replace('_', "-")),
        None => format!("webhook-{event}"),
    }
}

/// Possible errors when aggregating schemas across trigger events.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// The schema registry has no entry for a required webhook key.
    ///
    /// This is fatal: silently skipping an event would leave its payload
    /// unclassified, which the downstream consumer can't distinguish from
    /// "safe".
    #[error("missing webhook schema: {0}")]
    MissingSchema(String),
}

/// Classifies every context reachable from the given webhook schemas.
///
/// For each trigger event, walks the schema of each of its subevents (or
/// the event's own schema when it has none), all rooted at `root`, and
/// merges the findings into one map: findings for an already-seen pattern
/// unify toward the more permissive capability, so the processing order of
/// events and schemas doesn't affect the result.
///
/// `schemas` is keyed by webhook component name (see [`webhook_key`]);
/// a missing key for any required event/subevent is fatal.
pub fn classify(
    schemas: &IndexMap<String, Schema>,
    triggers: &[(&str, &[&str])],
    root: &str,
) -> Result<CapabilityMap, ClassifyError> {
    let mut capabilities = CapabilityMap::new();

    for (event, subevents) in triggers {
        let keys = if subevents.is_empty() {
            vec![webhook_key(event, None)]
        } else {
            subevents
                .iter()
                .map(|&subevent| webhook_key(event, Some(subevent)))
                .collect()
        };

        for key in keys {
            let schema = schemas
                .get(&key)
                .ok_or(ClassifyError::MissingSchema(key))?;

            capabilities.extend(schema.leaves(root));
        }
    }

    Ok(capabilities)
}
