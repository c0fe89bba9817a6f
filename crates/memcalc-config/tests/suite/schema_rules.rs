use memcalc_config::json_schema;

fn schema() -> serde_json::Value {
    serde_json::to_value(json_schema()).expect("schema serializes")
}

#[test]
fn json_schema_rejects_unknown_top_level_keys() {
    let value = schema();
    assert_eq!(
        value.get("additionalProperties").and_then(|v| v.as_bool()),
        Some(false)
    );
}

#[test]
fn json_schema_constrains_weights_to_non_negative_integers() {
    let value = schema();
    let weights = value
        .pointer("/properties/weights/additionalProperties")
        .expect("weights value schema exists");
    assert_eq!(weights["type"], "integer");
    assert_eq!(weights["minimum"].as_f64(), Some(0.0));
}

#[test]
fn json_schema_describes_size_ranges() {
    let value = schema();
    let pattern = value
        .pointer("/properties/sizes/additionalProperties/pattern")
        .and_then(|v| v.as_str())
        .expect("sizes carry a pattern");
    assert!(pattern.contains(r"\.\."), "{pattern}");
}

#[test]
fn json_schema_accepts_byte_sizes_as_integers_or_strings() {
    let value = schema();
    let byte_size = value
        .pointer("/definitions/ByteSize")
        .expect("ByteSize definition exists");
    assert_eq!(byte_size["type"], serde_json::json!(["integer", "string"]));
}

#[test]
fn json_schema_documents_logging() {
    let value = schema();
    assert!(value
        .pointer("/definitions/LoggingConfig/properties/file")
        .is_some());
}
