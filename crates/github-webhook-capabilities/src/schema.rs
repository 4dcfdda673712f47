//! Validated schema nodes for webhook payloads.
//!
//! GitHub's webhook payloads are described by OpenAPI-style JSON Schemas.
//! Rather than re-inspecting loosely typed JSON at every step of the walk,
//! we parse each schema up front into a closed set of node kinds and fail
//! fast on anything outside the subset GitHub actually uses. Silently
//! defaulting an unrecognized shape to `fixed` would hide attacker-controlled
//! fields from the downstream analyzer, so every unsupported shape is an
//! error instead of a guess.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::capability::Capability;

/// Possible errors when parsing a webhook payload schema.
///
/// Each variant carries the offending fragment (or the relevant piece of
/// it) for diagnosis; schemas that trip these come from upstream drift in
/// GitHub's OpenAPI document and need a human to look at them.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The fragment isn't a JSON object at all.
    #[error("expected a schema object, got: {0}")]
    NotAnObject(Value),
    /// The schema's `type` isn't one we know how to classify.
    #[error("unknown schema type: {0}")]
    UnknownType(Value),
    /// The schema has no `type` and no composition keys.
    #[error("schema has no type: {0}")]
    MissingType(Value),
    /// A composition key (`allOf`/`anyOf`/`oneOf`) isn't a list of schemas.
    #[error("malformed `{key}` composition: {value}")]
    MalformedComposition {
        /// The composition key at fault.
        key: &'static str,
        /// The value found under that key.
        value: Value,
    },
    /// The schema's `properties` isn't a mapping.
    #[error("malformed properties: {0}")]
    MalformedProperties(Value),
    /// The schema's `additionalProperties` is something other than a
    /// boolean or an empty schema.
    #[error("unknown additionalProperties: {0}")]
    UnknownAdditionalProperties(Value),
    /// An array schema with missing or empty `items`.
    #[error("empty array schema: {0}")]
    EmptyArraySchema(Value),
    /// A string `format` we can't bound the capability of.
    #[error("unknown string format: {0}")]
    UnknownStringFormat(String),
}

/// String formats whose values we know how to bound.
///
/// Anything else is rejected at parse time rather than guessed at.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StringFormat {
    /// RFC 3339 timestamps; attacker-uninfluenced.
    DateTime,
    /// URIs, which can embed limited attacker-chosen components.
    Uri,
    /// RFC 6570 URI templates.
    UriTemplate,
    /// Email addresses.
    Email,
}

/// A scalar schema leaf.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scalar {
    /// `type: boolean`
    Boolean,
    /// `type: integer`
    Integer,
    /// `type: number`
    Number,
    /// `type: null`
    Null,
    /// `type: string`, possibly constrained by a format or an enum.
    String {
        /// The declared `format`, if any.
        format: Option<StringFormat>,
        /// Whether the schema closes the value set with an `enum`.
        enumerated: bool,
    },
}

impl Scalar {
    /// Returns the capability an attacker has over this scalar's value.
    pub fn capability(&self) -> Capability {
        match self {
            Scalar::Boolean | Scalar::Integer | Scalar::Number | Scalar::Null => Capability::Fixed,
            Scalar::String {
                format: Some(StringFormat::DateTime),
                ..
            } => Capability::Fixed,
            Scalar::String {
                format: Some(_), ..
            } => Capability::Structured,
            // A closed value set, even of strings, isn't attacker-chosen.
            Scalar::String {
                format: None,
                enumerated: true,
            } => Capability::Fixed,
            // No format and no enum means we can't assume anything.
            Scalar::String {
                format: None,
                enumerated: false,
            } => Capability::Arbitrary,
        }
    }
}

/// A single webhook payload schema node, reduced to the closed set of
/// shapes the classifier understands.
#[derive(Clone, Debug, PartialEq)]
pub enum Schema {
    /// A `type: [...]` union, e.g. `["string", "null"]`.
    ///
    /// Each branch is the same underlying node re-parsed under one of the
    /// alternative type tags; all branches contribute leaves at the same
    /// path for subsequent unification.
    Union(Vec<Schema>),
    /// An `allOf`/`anyOf`/`oneOf` composition.
    ///
    /// All three are treated identically: every branch contributes leaves
    /// at the same path. For `anyOf`/`oneOf` this over-approximates, which
    /// is the conservative direction for injection analysis.
    Composition(Vec<Schema>),
    /// An object schema.
    Object {
        /// Declared properties, in declaration order.
        properties: IndexMap<String, Schema>,
        /// Whether unconstrained additional properties are allowed
        /// (`additionalProperties: true` or `{}`).
        open: bool,
    },
    /// An array schema; the boxed schema describes every element.
    Array(Box<Schema>),
    /// A scalar leaf.
    Scalar(Scalar),
}

const COMPOSITION_KEYS: &[&str] = &["allOf", "anyOf", "oneOf"];

impl Schema {
    /// Parses a raw JSON Schema fragment into a validated [`Schema`].
    ///
    /// The fragment must already have all of its references resolved.
    /// Fails on any shape outside the supported subset; see [`SchemaError`].
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let Value::Object(fields) = value else {
            return Err(SchemaError::NotAnObject(value.clone()));
        };

        Self::parse(fields, value, fields.get("type"))
    }

    /// Parses a schema whose `type` has (possibly) been forced to one
    /// alternative of a type union.
    fn parse(
        fields: &Map<String, Value>,
        whole: &Value,
        typ: Option<&Value>,
    ) -> Result<Self, SchemaError> {
        // A type like `["string", "null"]` means "string OR null": re-parse
        // the same node once per alternative and union the results.
        if let Some(Value::Array(alternatives)) = typ {
            return alternatives
                .iter()
                .map(|alternative| Self::parse(fields, whole, Some(alternative)))
                .collect::<Result<Vec<_>, _>>()
                .map(Schema::Union);
        }

        // Composition wins over a declared `type`; only the first present
        // key (in this order) is honored.
        for &key in COMPOSITION_KEYS {
            match fields.get(key) {
                Some(Value::Array(branches)) => {
                    return branches
                        .iter()
                        .map(Self::from_value)
                        .collect::<Result<Vec<_>, _>>()
                        .map(Schema::Composition);
                }
                Some(other) => {
                    return Err(SchemaError::MalformedComposition {
                        key,
                        value: other.clone(),
                    });
                }
                None => {}
            }
        }

        let typ = match typ {
            Some(Value::String(tag)) => tag.as_str(),
            Some(other) => return Err(SchemaError::UnknownType(other.clone())),
            None => return Err(SchemaError::MissingType(whole.clone())),
        };

        match typ {
            "object" => {
                let properties = match fields.get("properties") {
                    Some(Value::Object(properties)) => properties
                        .iter()
                        .map(|(name, child)| Ok((name.clone(), Self::from_value(child)?)))
                        .collect::<Result<IndexMap<_, _>, SchemaError>>()?,
                    Some(other) => return Err(SchemaError::MalformedProperties(other.clone())),
                    None => IndexMap::new(),
                };

                // `true` and `{}` both mean "any extra properties, no
                // constraints". In principle additionalProperties can also
                // be a constraining subschema, but GitHub's document doesn't
                // use that, so we reject it rather than under-approximate.
                let open = match fields.get("additionalProperties") {
                    Some(Value::Bool(true)) => true,
                    Some(Value::Object(constraint)) if constraint.is_empty() => true,
                    Some(Value::Bool(false)) | None => false,
                    Some(other) => {
                        return Err(SchemaError::UnknownAdditionalProperties(other.clone()));
                    }
                };

                Ok(Schema::Object { properties, open })
            }
            "array" => match fields.get("items") {
                Some(items @ Value::Object(item_fields)) if !item_fields.is_empty() => {
                    Ok(Schema::Array(Box::new(Self::from_value(items)?)))
                }
                _ => Err(SchemaError::EmptyArraySchema(whole.clone())),
            },
            "boolean" => Ok(Schema::Scalar(Scalar::Boolean)),
            "integer" => Ok(Schema::Scalar(Scalar::Integer)),
            "number" => Ok(Schema::Scalar(Scalar::Number)),
            "null" => Ok(Schema::Scalar(Scalar::Null)),
            "string" => {
                let format = match fields.get("format") {
                    Some(Value::String(format)) => Some(match format.as_str() {
                        "date-time" => StringFormat::DateTime,
                        "uri" => StringFormat::Uri,
                        "uri-template" => StringFormat::UriTemplate,
                        "email" => StringFormat::Email,
                        other => return Err(SchemaError::UnknownStringFormat(other.into())),
                    }),
                    Some(other) => {
                        return Err(SchemaError::UnknownStringFormat(other.to_string()));
                    }
                    None => None,
                };

                Ok(Schema::Scalar(Scalar::String {
                    format,
                    enumerated: fields.contains_key("enum"),
                }))
            }
            _ => Err(SchemaError::UnknownType(Value::String(typ.into()))),
        }
    }
}
