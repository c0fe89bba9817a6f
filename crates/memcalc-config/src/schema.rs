use schemars::schema::{
    InstanceType, Metadata, RootSchema, Schema, SchemaObject, SingleOrVec, StringValidation,
};
use schemars::schema_for;
use serde_json::json;

use crate::MemcalcConfig;

/// Size literals: digits with an optional `b`, `k`, `m`, `g` or `t` unit (case-insensitive,
/// `kb`/`kib` spellings allowed).
const SIZE_PATTERN: &str = r"^\s*[0-9]+\s*([bBkKmMgGtT]([iI]?[bB])?)?\s*$";
/// A size literal, or a range of them with either side optional.
const RANGE_PATTERN: &str = r"^\s*([0-9]+\s*([bBkKmMgGtT]([iI]?[bB])?)?)?\s*(\.\.\s*([0-9]+\s*([bBkKmMgGtT]([iI]?[bB])?)?)?)?\s*$";

/// JSON schema for `memcalc.toml`.
///
/// Intended for editor tooling (TOML JSON schema integration) and CI validation.
#[must_use]
pub fn json_schema() -> RootSchema {
    let mut schema = schema_for!(MemcalcConfig);
    apply_semantic_constraints(&mut schema);
    schema
}

/// Schema for [`crate::ByteSize`]: a raw byte count or a size literal.
pub(crate) fn byte_size_schema(_: &mut schemars::r#gen::SchemaGenerator) -> Schema {
    SchemaObject {
        metadata: Some(Box::new(Metadata {
            description: Some("Byte count, or a size such as `512m` or `1G`.".to_owned()),
            ..Default::default()
        })),
        instance_type: Some(SingleOrVec::Vec(vec![
            InstanceType::Integer,
            InstanceType::String,
        ])),
        string: Some(Box::new(StringValidation {
            pattern: Some(SIZE_PATTERN.to_owned()),
            ..Default::default()
        })),
        ..Default::default()
    }
    .into()
}

fn apply_semantic_constraints(schema: &mut RootSchema) {
    // Map values are only typed by the derive; constrain them to what the calculator accepts.
    set_property(
        schema,
        "weights",
        json!({
            "description": "Region name to weight, as a percentage of the total memory.",
            "type": "object",
            "additionalProperties": { "type": "integer", "minimum": 0 }
        }),
    );
    set_property(
        schema,
        "sizes",
        json!({
            "description": "Region name to size range: `64m..`, `..1g`, `128m..256m` or `256m`.",
            "type": "object",
            "additionalProperties": { "type": "string", "pattern": RANGE_PATTERN }
        }),
    );
}

fn set_property(root: &mut RootSchema, name: &str, value: serde_json::Value) {
    let Ok(property) = serde_json::from_value::<SchemaObject>(value) else {
        return;
    };
    root.schema
        .object()
        .properties
        .insert(name.to_owned(), property.into());
}
