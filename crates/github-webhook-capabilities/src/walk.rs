//! Lazy traversal of schema nodes into classified leaves.

use crate::capability::Capability;
use crate::schema::Schema;

impl Schema {
    /// Walks the schema, yielding a `(pattern, capability)` pair for every
    /// leaf reachable from it.
    ///
    /// Patterns are dotted paths rooted at `root`, with `*` standing in for
    /// "any array index" (and, for open objects, "any extra property").
    /// The same pattern can be yielded more than once (e.g. once per
    /// branch of a type union); it's the caller's job to unify the
    /// duplicates, see [`CapabilityMap`](crate::CapabilityMap).
    ///
    /// Each call produces a fresh, single-use traversal.
    pub fn leaves(&self, root: &str) -> Leaves<'_> {
        Leaves {
            stack: vec![Frame::Visit {
                path: root.into(),
                schema: self,
            }],
        }
    }
}

/// An iterator over every classifiable leaf reachable from a schema node.
///
/// Created by [`Schema::leaves`].
pub struct Leaves<'s> {
    stack: Vec<Frame<'s>>,
}

enum Frame<'s> {
    Visit { path: String, schema: &'s Schema },
    Emit { path: String, capability: Capability },
}

impl Iterator for Leaves<'_> {
    type Item = (String, Capability);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            let (path, schema) = match frame {
                Frame::Emit { path, capability } => return Some((path, capability)),
                Frame::Visit { path, schema } => (path, schema),
            };

            // Children are pushed in reverse so that they pop in
            // declaration order.
            match schema {
                // Union and composition branches all land on the same path;
                // their findings get unified downstream.
                Schema::Union(branches) | Schema::Composition(branches) => {
                    for branch in branches.iter().rev() {
                        self.stack.push(Frame::Visit {
                            path: path.clone(),
                            schema: branch,
                        });
                    }
                }
                Schema::Object { properties, open } => {
                    // An open object admits arbitrary content under any
                    // extra key, independently of its declared properties.
                    if *open {
                        self.stack.push(Frame::Emit {
                            path: format!("{path}.*"),
                            capability: Capability::Arbitrary,
                        });
                    }

                    if properties.is_empty() {
                        // No declared properties: the object itself is one
                        // open-ended leaf.
                        return Some((path, Capability::Arbitrary));
                    }

                    for (name, child) in properties.iter().rev() {
                        self.stack.push(Frame::Visit {
                            path: format!("{path}.{name}"),
                            schema: child,
                        });
                    }
                }
                Schema::Array(items) => {
                    self.stack.push(Frame::Visit {
                        path: format!("{path}.*"),
                        schema: items,
                    });
                }
                Schema::Scalar(scalar) => return Some((path, scalar.capability())),
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::capability::Capability;
    use crate::schema::Schema;

    fn leaves(fragment: serde_json::Value, root: &str) -> Vec<(String, Capability)> {
        Schema::from_value(&fragment)
            .unwrap()
            .leaves(root)
            .collect()
    }

    #[test]
    fn test_scalar_leaf() {
        assert_eq!(
            leaves(json!({"type": "integer"}), "p"),
            vec![("p".into(), Capability::Fixed)]
        );
    }

    #[test]
    fn test_type_union_leaves() {
        // Both branches of the union land on the same path; unification
        // of the two happens in the aggregator.
        assert_eq!(
            leaves(json!({"type": ["string", "null"]}), "p"),
            vec![
                ("p".into(), Capability::Arbitrary),
                ("p".into(), Capability::Fixed),
            ]
        );
    }

    #[test]
    fn test_object_properties() {
        assert_eq!(
            leaves(
                json!({
                    "type": "object",
                    "properties": {
                        "title": {"type": "string"},
                        "id": {"type": "integer"},
                        "html_url": {"type": "string", "format": "uri"},
                    },
                }),
                "github.event.issue",
            ),
            vec![
                ("github.event.issue.title".into(), Capability::Arbitrary),
                ("github.event.issue.id".into(), Capability::Fixed),
                ("github.event.issue.html_url".into(), Capability::Structured),
            ]
        );
    }

    #[test]
    fn test_empty_object_is_arbitrary() {
        assert_eq!(
            leaves(json!({"type": "object"}), "p"),
            vec![("p".into(), Capability::Arbitrary)]
        );

        assert_eq!(
            leaves(json!({"type": "object", "properties": {}}), "p"),
            vec![("p".into(), Capability::Arbitrary)]
        );
    }

    #[test]
    fn test_open_object_wildcard() {
        // Declared properties and the additionalProperties wildcard are
        // independent: both are emitted.
        assert_eq!(
            leaves(
                json!({
                    "type": "object",
                    "properties": {"id": {"type": "integer"}},
                    "additionalProperties": true,
                }),
                "p",
            ),
            vec![
                ("p.id".into(), Capability::Fixed),
                ("p.*".into(), Capability::Arbitrary),
            ]
        );

        // Same for an open object without declared properties.
        assert_eq!(
            leaves(
                json!({"type": "object", "additionalProperties": {}}),
                "p",
            ),
            vec![
                ("p".into(), Capability::Arbitrary),
                ("p.*".into(), Capability::Arbitrary),
            ]
        );
    }

    #[test]
    fn test_array_of_objects() {
        assert_eq!(
            leaves(
                json!({
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"name": {"type": "string"}},
                    },
                }),
                "p",
            ),
            vec![("p.*.name".into(), Capability::Arbitrary)]
        );
    }

    #[test]
    fn test_nested_arrays() {
        assert_eq!(
            leaves(
                json!({
                    "type": "array",
                    "items": {"type": "array", "items": {"type": "integer"}},
                }),
                "p",
            ),
            vec![("p.*.*".into(), Capability::Fixed)]
        );
    }

    #[test]
    fn test_composition_leaves() {
        assert_eq!(
            leaves(
                json!({
                    "oneOf": [
                        {
                            "type": "object",
                            "properties": {"sha": {"type": "string"}},
                        },
                        {"type": "null"},
                    ],
                }),
                "p",
            ),
            vec![
                ("p.sha".into(), Capability::Arbitrary),
                ("p".into(), Capability::Fixed),
            ]
        );
    }

    #[test]
    fn test_realistic_payload() {
        // A trimmed-down pull_request payload exercising most shapes at once.
        assert_eq!(
            leaves(
                json!({
                    "type": "object",
                    "properties": {
                        "action": {"type": "string", "enum": ["opened"]},
                        "pull_request": {
                            "type": "object",
                            "properties": {
                                "title": {"type": "string"},
                                "merged_at": {
                                    "type": ["string", "null"],
                                    "format": "date-time",
                                },
                                "labels": {
                                    "type": "array",
                                    "items": {
                                        "type": "object",
                                        "properties": {
                                            "name": {"type": "string"},
                                            "color": {"type": "string"},
                                        },
                                    },
                                },
                            },
                        },
                    },
                }),
                "github.event",
            ),
            vec![
                ("github.event.action".into(), Capability::Fixed),
                (
                    "github.event.pull_request.title".into(),
                    Capability::Arbitrary
                ),
                (
                    "github.event.pull_request.merged_at".into(),
                    Capability::Fixed
                ),
                (
                    "github.event.pull_request.merged_at".into(),
                    Capability::Fixed
                ),
                (
                    "github.event.pull_request.labels.*.name".into(),
                    Capability::Arbitrary
                ),
                (
                    "github.event.pull_request.labels.*.color".into(),
                    Capability::Arbitrary
                ),
            ]
        );
    }
}
