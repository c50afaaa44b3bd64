use super::utils::{decode_at, decode_ok};
use crate::{Value, ValueType};

#[test]
fn simple_object_in_array() {
    let body = r#"[{
	"bio": "bada bing bada boom",
	"id": 1,
	"name": "Charles",
	"falseVal": false
}]"#;

    let values = decode_ok(body, 1);
    assert_eq!(values.len(), 1);

    let mv = &values[0];
    assert_eq!(mv.depth, 1);
    assert_eq!(mv.keys, vec![String::new()]);
    assert_eq!(mv.value_type, ValueType::Object);

    let Value::Object(map) = &mv.value else {
        panic!("expected an object, got {:?}", mv.value);
    };
    assert_eq!(
        map.get("bio"),
        Some(&Value::String("bada bing bada boom".into()))
    );
    assert_eq!(map.get("id"), Some(&Value::Integer(1)));
    assert_eq!(map.get("name"), Some(&Value::String("Charles".into())));
    assert_eq!(map.get("falseVal"), Some(&Value::Boolean(false)));
}

#[test]
fn flat_array_keeps_scalar_types() {
    let body = r#"[
  "1st test string",
  "Roberto*Maestro", "Charles",
  0, null, false,
  1, 2.5
]"#;

    let expected = [
        (Value::String("1st test string".into()), ValueType::String),
        (Value::String("Roberto*Maestro".into()), ValueType::String),
        (Value::String("Charles".into()), ValueType::String),
        (Value::Integer(0), ValueType::Number),
        (Value::Null, ValueType::Null),
        (Value::Boolean(false), ValueType::Boolean),
        (Value::Integer(1), ValueType::Number),
        (Value::Float(2.5), ValueType::Number),
    ];

    let values = decode_ok(body, 1);
    assert_eq!(values.len(), expected.len());
    for (mv, (value, value_type)) in values.iter().zip(&expected) {
        assert_eq!(&mv.value, value);
        assert_eq!(&mv.value_type, value_type);
        assert_eq!(mv.depth, 1);
        assert_eq!(mv.keys, vec![String::new()]);
    }
}

#[test]
fn arrays_inside_two_levels_of_objects() {
    let body = r#"{
	"1787005804808765": {
		"fun1": [1, 2, 3],
		"fun2": [2, 3, 4],
		"fun3": [3, 4, 5]
	},
	"1786133652424674": {
		"fun4": [4, 5, 6],
		"fun5": [5, 6, 7]
	}
}"#;

    let expected_keys = [
        ["1787005804808765", "fun1"],
        ["1787005804808765", "fun2"],
        ["1787005804808765", "fun3"],
        ["1786133652424674", "fun4"],
        ["1786133652424674", "fun5"],
    ];

    let values = decode_ok(body, 2);
    assert_eq!(values.len(), 5);
    for (i, mv) in values.iter().enumerate() {
        assert_eq!(mv.depth, 2);
        assert_eq!(mv.keys, expected_keys[i]);
        let start = 1 + i as i64;
        assert_eq!(
            mv.value,
            Value::Array(vec![
                Value::Integer(start),
                Value::Integer(start + 1),
                Value::Integer(start + 2),
            ])
        );
    }
}

#[test]
fn emit_depth_three() {
    let body = r#"{
	"1787005804808765": {
		"service1": {
			"fun1": [1, 2, 3],
			"fun2": [2, 3, 4]
		},
		"service2": {
			"fun1": [3, 4, 5],
			"fun2": [4, 5, 6]
		}
	},
	"1786133652424674": {
		"service3": {
			"fun1": [5, 6, 7],
			"fun2": [6, 7, 8]
		}
	}
}"#;

    let expected_keys = [
        ["1787005804808765", "service1", "fun1"],
        ["1787005804808765", "service1", "fun2"],
        ["1787005804808765", "service2", "fun1"],
        ["1787005804808765", "service2", "fun2"],
        ["1786133652424674", "service3", "fun1"],
        ["1786133652424674", "service3", "fun2"],
    ];

    let values = decode_ok(body, 3);
    assert_eq!(values.len(), 6);
    for (i, mv) in values.iter().enumerate() {
        assert_eq!(mv.depth, 3);
        assert_eq!(mv.keys, expected_keys[i]);
        let start = 1 + 2 * (i as i64 / 2) + (i as i64 % 2);
        assert_eq!(
            mv.value,
            Value::Array(vec![
                Value::Integer(start),
                Value::Integer(start + 1),
                Value::Integer(start + 2),
            ])
        );
    }
}

#[test]
fn emit_kv_carries_the_member_name() {
    let body = r#"{
	"1787005804808765": {
		"fun1": [1, 2, 3],
		"fun2": [2, 3, 4]
	},
	"1786133652424674": {
		"fun3": [3, 4, 5]
	}
}"#;

    let (values, err) = super::utils::decode_with(
        body,
        crate::DecoderOptions {
            emit_depth: 2,
            emit_kv: true,
            ..Default::default()
        },
    );
    assert!(err.is_none());
    assert_eq!(values.len(), 3);

    for (i, mv) in values.iter().enumerate() {
        let name = format!("fun{}", i + 1);
        assert_eq!(mv.keys.len(), 2);
        assert_eq!(mv.keys[1], name);
        // Tag reflects the wrapped value, not the pair.
        assert_eq!(mv.value_type, ValueType::Array);
        let Value::KeyValue(kv) = &mv.value else {
            panic!("expected a key/value pair, got {:?}", mv.value);
        };
        assert_eq!(kv.key, name);
        let start = 1 + i as i64;
        assert_eq!(
            kv.value,
            Value::Array(vec![
                Value::Integer(start),
                Value::Integer(start + 1),
                Value::Integer(start + 2),
            ])
        );
    }
}

#[test]
fn offsets_and_lengths_span_valid_json() {
    let body = r#"{"a": [1, 2.5, "x"], "b": {"c": null, "d": [true, false]}, "e": 9}"#;

    for depth in 0..4 {
        let values = decode_ok(body, depth);
        let mut last_end = 0u64;
        for mv in &values {
            assert!(mv.length >= 1);
            assert_eq!(mv.keys.len(), mv.depth);
            let start = mv.offset as usize;
            let end = (mv.offset + mv.length) as usize;
            let slice = &body[start..end];
            serde_json::from_str::<serde_json::Value>(slice)
                .unwrap_or_else(|e| panic!("slice {slice:?} is not valid JSON: {e}"));
            assert!(
                mv.offset + mv.length >= last_end,
                "emissions must move forward"
            );
            last_end = mv.offset + mv.length;
        }
    }
}

#[test]
fn recursive_mode_emits_children_before_containers() {
    let body = "[[1,2],[3]]";

    let (values, err) = decode_at(body, -1);
    assert!(err.is_none());

    let expected: Vec<(Value, usize)> = vec![
        (Value::Integer(1), 2),
        (Value::Integer(2), 2),
        (
            Value::Array(vec![Value::Integer(1), Value::Integer(2)]),
            1,
        ),
        (Value::Integer(3), 2),
        (Value::Array(vec![Value::Integer(3)]), 1),
        (
            Value::Array(vec![
                Value::Array(vec![Value::Integer(1), Value::Integer(2)]),
                Value::Array(vec![Value::Integer(3)]),
            ]),
            0,
        ),
    ];

    assert_eq!(values.len(), expected.len());
    for (mv, (value, depth)) in values.iter().zip(&expected) {
        assert_eq!(&mv.value, value);
        assert_eq!(mv.depth, *depth);
        assert_eq!(mv.keys.len(), *depth);
    }
}

#[test]
fn recursive_flag_with_positive_depth() {
    let body = r#"{"a": {"b": [1]}}"#;

    let (values, err) = super::utils::decode_with(
        body,
        crate::DecoderOptions {
            emit_depth: 2,
            recursive: true,
            ..Default::default()
        },
    );
    assert!(err.is_none());

    // Depth 3 element, then the array at depth 2; nothing shallower.
    assert_eq!(values.len(), 2);
    assert_eq!(values[0].value, Value::Integer(1));
    assert_eq!(values[0].depth, 3);
    assert_eq!(values[1].value, Value::Array(vec![Value::Integer(1)]));
    assert_eq!(values[1].depth, 2);
    assert_eq!(values[1].keys, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn top_level_scalar_emits_once() {
    let values = decode_ok("123", 0);
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].value, Value::Integer(123));
    assert_eq!(values[0].offset, 0);
    assert_eq!(values[0].length, 3);
    assert_eq!(values[0].depth, 0);
    assert!(values[0].keys.is_empty());
}

#[test]
fn empty_containers_have_length_two() {
    for body in ["[]", "{}"] {
        let values = decode_ok(body, 0);
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].offset, 0);
        assert_eq!(values[0].length, 2);
    }
}

#[test]
fn leading_zero_terminates_the_digit_run() {
    // A leading zero stands alone, so the remaining digits begin a new
    // top-level value.
    let values = decode_ok("012", 0);
    assert_eq!(values.len(), 2);
    assert_eq!(values[0].value, Value::Integer(0));
    assert_eq!(values[0].length, 1);
    assert_eq!(values[1].value, Value::Integer(12));
    assert_eq!(values[1].offset, 1);
    assert_eq!(values[1].length, 2);
}

#[test]
fn deep_values_are_not_retained_outside_the_emit_frontier() {
    // At emit depth 3 the shallower containers are traversed but never
    // populated; the integers inside must still come through.
    let body = r#"{"a": {"b": [1, 2]}, "c": {"d": [3]}}"#;
    let values = decode_ok(body, 3);
    assert_eq!(values.len(), 3);
    assert_eq!(values[0].value, Value::Integer(1));
    assert_eq!(values[1].value, Value::Integer(2));
    assert_eq!(values[2].value, Value::Integer(3));
}

#[test]
fn consumed_byte_count_is_reported() {
    let body = r#"[1, 2, 3]"#;
    let reader = std::io::Cursor::new(body.as_bytes().to_vec());
    let mut stream = crate::Decoder::new(reader, 1).stream();
    assert_eq!(stream.pos(), 0);
    let count = (&mut stream).count();
    assert_eq!(count, 3);
    assert_eq!(stream.finish().expect("clean run"), body.len() as u64);
}
