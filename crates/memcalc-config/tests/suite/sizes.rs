use memcalc_config::{ByteSize, MemcalcConfig};
use memcalc_memory::{GB, KB, MB};

#[test]
fn byte_sizes_accept_human_friendly_literals() {
    let text = r#"
total_memory = "1G"
thread_stack_size = "256KiB"
"#;

    let (config, diagnostics) =
        MemcalcConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert!(
        diagnostics.errors.is_empty(),
        "expected no diagnostics errors, got: {:?}",
        diagnostics.errors
    );
    assert_eq!(config.total_memory, Some(ByteSize(GB)));
    assert_eq!(config.thread_stack_size, ByteSize(256 * KB));
}

#[test]
fn byte_sizes_accept_raw_byte_counts() {
    let (config, _) = MemcalcConfig::load_from_str_with_diagnostics("total_memory = 536870912\n")
        .expect("config should parse");
    assert_eq!(config.total_memory, Some(ByteSize(512 * MB)));
}

#[test]
fn malformed_byte_size_fails_to_parse() {
    let err = MemcalcConfig::load_from_str_with_diagnostics("total_memory = \"lots\"\n")
        .expect_err("size literal is malformed");
    assert!(err.to_string().contains("lots"), "{err}");
}
