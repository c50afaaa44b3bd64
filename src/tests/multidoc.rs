use super::utils::{decode_ok, decode_with};
use crate::{DecoderOptions, Value, ValueType};

const BODY: &str = r#"{ "bio": "bada bing bada boom", "id": 1, "name": "Charles" }
{ "bio": "bada bing bada boom", "id": 2, "name": "Charles" }
{ "bio": "bada bing bada boom", "id": 3, "name": "Charles" }
{ "bio": "bada bing bada boom", "id": 4, "name": "Charles" }
{ "bio": "bada bing bada boom", "id": 5, "name": "Charles" }
"#;

#[test]
fn whitespace_separated_documents_emit_at_depth_zero() {
    let values = decode_ok(BODY, 0);
    assert_eq!(values.len(), 5);
    for (i, mv) in values.iter().enumerate() {
        assert_eq!(mv.value_type, ValueType::Object);
        assert_eq!(mv.depth, 0);
        let Value::Object(map) = &mv.value else {
            panic!("expected an object, got {:?}", mv.value);
        };
        assert_eq!(map.get("id"), Some(&Value::Integer(1 + i as i64)));
    }
}

#[test]
fn document_fields_emit_at_depth_one() {
    let values = decode_ok(BODY, 1);
    assert_eq!(values.len(), 15);
    let kv_count = values
        .iter()
        .filter(|mv| matches!(mv.value, Value::KeyValue(_)))
        .count();
    assert_eq!(kv_count, 0);
}

#[test]
fn document_fields_emit_as_pairs_with_emit_kv() {
    let (values, err) = decode_with(
        BODY,
        DecoderOptions {
            emit_depth: 1,
            emit_kv: true,
            ..Default::default()
        },
    );
    assert!(err.is_none());
    assert_eq!(values.len(), 15);
    for mv in &values {
        let Value::KeyValue(kv) = &mv.value else {
            panic!("expected a key/value pair, got {:?}", mv.value);
        };
        assert!(["bio", "id", "name"].contains(&kv.key.as_str()));
        assert_eq!(mv.keys.len(), 1);
        assert_eq!(mv.keys[0], kv.key);
    }
}

#[test]
fn scalars_can_be_concatenated_too() {
    let values = decode_ok("1 2.5 \"three\"\nnull  true", 0);
    assert_eq!(
        values.iter().map(|mv| mv.value.clone()).collect::<Vec<_>>(),
        vec![
            Value::Integer(1),
            Value::Float(2.5),
            Value::String("three".into()),
            Value::Null,
            Value::Boolean(true),
        ]
    );
}
