use midas_encoding::{CodeLookup, DictionaryCodec, EncodingError};
use midas_schema::{parse_schema, ScanResult, SchemaScanner};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

fn scan(value: Value) -> ScanResult {
    let tree = parse_schema(&value).expect("schema");
    SchemaScanner::new(&tree).scan()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn first_schema() -> Value {
    json!({
        "Id": {"User": "string"},
        "Flags": {"A": "boolean", "B": "boolean"}
    })
}

fn second_schema() -> Value {
    json!({
        "Id": {"User": "string"},
        "Flags": {"A": "boolean", "B": "boolean", "C": "boolean"}
    })
}

#[test]
fn schema_growth_appends_without_touching_issued_codes() {
    let dir = TempDir::new().expect("tempdir");
    let codec = DictionaryCodec::new(dir.path().join("midas.cache"), '~');

    codec.update(&scan(first_schema())).expect("first run");
    let first = codec.load().expect("load first");
    assert_eq!(first.patterns, strings(&["Id", "User", "Flags", "A", "B"]));
    assert_eq!(first.arrays["Flags"], strings(&["A", "B"]));

    let mut previous_len = 0;
    for token in &first.patterns {
        let code = first.property_code(token).expect("code");
        assert!(code.starts_with('~'), "{code}");
        assert!(code.chars().count() >= previous_len);
        previous_len = code.chars().count();
    }

    let report = codec.update(&scan(second_schema())).expect("second run");
    assert_eq!(report.merge.appended_tokens, strings(&["C"]));
    assert_eq!(report.merge.extended_bitfields, strings(&["Flags"]));

    let second = codec.load().expect("load second");
    assert_eq!(second.patterns[..first.patterns.len()], first.patterns[..]);
    assert_eq!(second.patterns[5], "C");
    assert_eq!(second.position("C"), Some(6));
    for token in &first.patterns {
        assert_eq!(second.property_code(token), first.property_code(token));
    }
    assert_eq!(second.property_code("C"), Some(codec.alphabet().code(6).as_str()));
    assert_eq!(second.arrays["Flags"], strings(&["A", "B", "C"]));
}

#[test]
fn rerunning_an_unchanged_schema_is_byte_identical() {
    let dir = TempDir::new().expect("tempdir");
    let codec = DictionaryCodec::new(dir.path().join("midas.cache"), '~');
    let schema = json!({
        "Player": {"Team": ["Red", "Blue"], "Level": "integer"},
        "Settings": {"Muted": "boolean", "Hints": "boolean"}
    });

    codec.update(&scan(schema.clone())).expect("first run");
    let before = std::fs::read(codec.path()).expect("read");

    let report = codec.update(&scan(schema)).expect("second run");
    assert!(report.merge.is_empty());
    assert_eq!(report.codes_assigned, 0);
    let after = std::fs::read(codec.path()).expect("read");
    assert_eq!(before, after);
}

#[test]
fn removed_tokens_stay_decodable() {
    let dir = TempDir::new().expect("tempdir");
    let codec = DictionaryCodec::new(dir.path().join("midas.cache"), '~');

    codec
        .update(&scan(json!({"Legacy": "string", "Team": ["Red"]})))
        .expect("first run");
    let legacy_code = codec
        .load()
        .expect("load")
        .property_code("Legacy")
        .map(str::to_string)
        .expect("legacy code");

    codec
        .update(&scan(json!({"Team": ["Red", "Green"]})))
        .expect("second run");
    let artifact = codec.load().expect("load");
    assert_eq!(artifact.property_code("Legacy"), Some(legacy_code.as_str()));
    assert_eq!(artifact.patterns, strings(&["Legacy", "Team", "Red", "Green"]));

    let lookup = CodeLookup::new(&artifact).expect("lookup");
    assert_eq!(lookup.token(&legacy_code), Some("Legacy"));
    assert_eq!(
        artifact.variant_code("Team", "Green"),
        lookup.code("Green")
    );
}

#[test]
fn incompatible_bitfield_change_is_not_persisted() {
    let dir = TempDir::new().expect("tempdir");
    let codec = DictionaryCodec::new(dir.path().join("midas.cache"), '~');
    codec.update(&scan(first_schema())).expect("first run");
    let before = std::fs::read(codec.path()).expect("read");

    let reordered = json!({
        "Id": {"User": "string", "Extra": "string"},
        "Flags": {"B": "boolean", "A": "boolean"}
    });
    let err = codec.update(&scan(reordered)).expect_err("desync");
    assert!(
        matches!(err, EncodingError::BitfieldDesync { index: 0, .. }),
        "{err}"
    );

    let shrunk = json!({"Id": {"User": "string"}, "Flags": {"A": "boolean"}});
    let err = codec.update(&scan(shrunk)).expect_err("shrunk");
    assert!(matches!(err, EncodingError::BitfieldShrunk { .. }), "{err}");

    let mixed = json!({
        "Id": {"User": "string"},
        "Flags": {"A": "boolean", "B": "boolean", "Count": "integer"}
    });
    let err = codec.update(&scan(mixed)).expect_err("mixed");
    assert!(matches!(err, EncodingError::BitfieldMixed { .. }), "{err}");

    assert_eq!(std::fs::read(codec.path()).expect("read"), before);
}

#[test]
fn marker_is_bound_to_the_artifact() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("midas.cache");
    DictionaryCodec::new(&path, '~')
        .update(&scan(first_schema()))
        .expect("first run");

    let err = DictionaryCodec::new(&path, '#')
        .update(&scan(first_schema()))
        .expect_err("marker mismatch");
    match err {
        EncodingError::MarkerMismatch {
            persisted,
            configured,
        } => {
            assert_eq!(persisted, "~");
            assert_eq!(configured, '#');
        }
        other => panic!("unexpected error: {other}"),
    }
}
