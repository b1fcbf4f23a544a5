//! Schema validation helpers.
//!
//! Declared configuration arrives as `serde_json::Value`. Before it is decoded
//! into a typed resource configuration it is checked against the resource
//! [`Schema`], so that problems are reported as attribute-level diagnostics
//! rather than as opaque decoding failures.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_azure_automation::schema::{Attribute, Schema};
//! use hemmer_provider_azure_automation::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute("frequency", Attribute::string_enum(&["Day", "Week"]));
//!
//! assert!(validate(&schema, &json!({"name": "nightly", "frequency": "week"})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "nightly", "frequency": "Fortnight"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("frequency".to_string()));
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeType, Block, Diagnostic, NestedBlock, Schema};

/// Maximum number of tags Azure accepts on a resource.
pub const MAX_TAGS: usize = 15;
/// Maximum length of a tag key.
pub const MAX_TAG_KEY_LEN: usize = 512;
/// Maximum length of a tag value.
pub const MAX_TAG_VALUE_LEN: usize = 256;

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// - Required attributes must be present and non-null
/// - Computed-only attributes are skipped
/// - Attribute types must match the schema
/// - Enumerated attributes must hold one of the allowed values
/// - Nested blocks must respect their min/max item counts
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

/// Collapse error diagnostics into a single [`ProviderError::Validation`].
///
/// Warnings are ignored.
pub fn into_result(diagnostics: Vec<Diagnostic>) -> Result<(), ProviderError> {
    let errors: Vec<String> = diagnostics
        .into_iter()
        .filter(Diagnostic::is_error)
        .map(|d| match d.detail {
            Some(detail) => format!("{}: {}", d.summary, detail),
            None => d.summary,
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ProviderError::Validation(errors.join("; ")))
    }
}

/// Check Azure's limits on resource tags.
pub fn validate_tags(tags: &BTreeMap<String, String>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if tags.len() > MAX_TAGS {
        diagnostics.push(
            Diagnostic::error(format!(
                "A maximum of {} tags can be applied to each resource",
                MAX_TAGS
            ))
            .with_detail(format!("Got {}", tags.len()))
            .with_attribute("tags"),
        );
    }

    for (key, value) in tags {
        let path = format!("tags.{}", key);
        if key.chars().count() > MAX_TAG_KEY_LEN {
            diagnostics.push(
                Diagnostic::error(format!(
                    "Tag key exceeds the maximum length of {} characters",
                    MAX_TAG_KEY_LEN
                ))
                .with_attribute(path.clone()),
            );
        }
        if value.chars().count() > MAX_TAG_VALUE_LEN {
            diagnostics.push(
                Diagnostic::error(format!(
                    "Tag value exceeds the maximum length of {} characters",
                    MAX_TAG_VALUE_LEN
                ))
                .with_attribute(path),
            );
        }
    }

    diagnostics
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        _ => {
            let diag = Diagnostic::error("Expected object")
                .with_detail(format!("Got {}", value_type_name(value)));
            diagnostics.push(if path.is_empty() {
                diag
            } else {
                diag.with_attribute(path)
            });
            return;
        },
    };

    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        validate_attribute(attr, obj.get(name), &attr_path, diagnostics);
    }

    for (name, nested) in &block.blocks {
        let block_path = join_path(path, name);
        validate_nested_block(nested, obj.get(name), &block_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.computed && !attr.flags.optional && !attr.flags.required {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        },
        Some(v) => {
            if validate_attribute_type(&attr.attr_type, v, path, diagnostics) {
                validate_one_of(attr, v, path, diagnostics);
            }
        },
    }
}

/// Returns `false` if a type error was recorded.
fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    let (ok, expected) = match attr_type {
        AttributeType::String => (value.is_string(), "string"),
        AttributeType::Int64 => (value.is_i64(), "int64"),
        AttributeType::Bool => (value.is_boolean(), "bool"),
        AttributeType::Map(value_type) => {
            let Some(obj) = value.as_object() else {
                diagnostics.push(type_error(path, "map", value));
                return false;
            };
            let before = diagnostics.len();
            for (key, val) in obj {
                let key_path = format!("{}.{}", path, key);
                validate_attribute_type(value_type, val, &key_path, diagnostics);
            }
            return diagnostics.len() == before;
        },
    };

    if !ok {
        diagnostics.push(type_error(path, expected, value));
    }
    ok
}

fn validate_one_of(attr: &Attribute, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    if attr.one_of.is_empty() {
        return;
    }
    let Some(s) = value.as_str() else {
        return;
    };

    let allowed = attr.one_of.iter().any(|candidate| {
        if attr.ignore_case {
            candidate.eq_ignore_ascii_case(s)
        } else {
            candidate == s
        }
    });

    if !allowed {
        diagnostics.push(
            Diagnostic::error(format!("Invalid value for attribute '{}'", path))
                .with_detail(format!(
                    "Expected one of [{}], got {:?}",
                    attr.one_of.join(", "),
                    s
                ))
                .with_attribute(path),
        );
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let items: Vec<&Value> = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(arr)) => arr.iter().collect(),
        Some(obj @ Value::Object(_)) => vec![obj],
        Some(v) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
            return;
        },
    };

    let len = items.len() as u32;
    if len < nested.min_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' requires at least {} item(s), got {}",
                path, nested.min_items, len
            ))
            .with_attribute(path),
        );
    }
    if nested.max_items > 0 && len > nested.max_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' allows at most {} item(s), got {}",
                path, nested.max_items, len
            ))
            .with_attribute(path),
        );
    }

    for (i, item) in items.into_iter().enumerate() {
        let item_path = format!("{}.{}", path, i);
        validate_block(&nested.block, item, &item_path, diagnostics);
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, value_type_name(got)))
        .with_attribute(path)
}
