// ABOUTME: Conformance tests for the BSON to JSON transcoder's public API.
// ABOUTME: Checks output against serde_json parses and textual patterns.

mod common;

use common::{from_json, nested, DocBuilder};
use regex::Regex;
use serde_bsonjson::{
    from_bson_slice, to_json, to_json_string, to_json_with_config, ElementType, Error, TranscoderConfig,
};
use serde_json::{json, Value as JsonValue};

const OID: [u8; 12] = [0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef, 0x01, 0x23, 0x45, 0x67];

/// Known error types and an input producing each.
fn error_cases() -> Vec<(&'static str, Vec<u8>)> {
    let mut trailing = DocBuilder::new().build();
    trailing.push(0);
    let mut unclosed = DocBuilder::new().int32("a", 1).build();
    unclosed.pop();

    vec![
        ("truncated", vec![0x05, 0x00, 0x00]),
        ("truncated", DocBuilder::new().raw(0x10, "a", &[1, 2]).build()),
        ("trailing_bytes", trailing),
        ("invalid_type_code", DocBuilder::new().raw(0x05, "bin", &[]).build()),
        ("unsupported_type", DocBuilder::new().raw(0x11, "ts", &[0; 8]).build()),
        ("unsupported_type", DocBuilder::new().raw(0x13, "dec", &[0; 16]).build()),
        ("invalid_utf8", DocBuilder::new().raw(0x02, "s", &[2, 0, 0, 0, 0xff, 0]).build()),
        ("invalid_data", DocBuilder::new().raw(0x02, "s", &[0, 0, 0, 0]).build()),
        ("invalid_data", DocBuilder::new().double("nan", f64::NAN).build()),
        ("value_out_of_range", DocBuilder::new().datetime("d", i64::MAX).build()),
        ("max_depth_exceeded", nested(65)),
        ("unclosed_container", unclosed),
    ]
}

fn parse(bytes: &[u8]) -> JsonValue {
    let json = to_json(bytes).unwrap_or_else(|e| panic!("transcode failed: {e}"));
    serde_json::from_slice(&json).unwrap_or_else(|e| panic!("output is not JSON ({e}): {}", String::from_utf8_lossy(&json)))
}

#[test]
fn empty_document() {
    assert_eq!(to_json_string(&DocBuilder::new().build()).unwrap(), "{}");
}

#[test]
fn output_matches_logical_content() {
    let bytes = DocBuilder::new()
        .double("pi", 3.25)
        .string("name", "bson")
        .document("inner", DocBuilder::new().boolean("ok", true).null("nothing"))
        .array("list", DocBuilder::new().int32("0", 1).int64("1", 1 << 40).string("2", "three"))
        .object_id("_id", OID)
        .datetime("when", 0)
        .int32("small", -7)
        .int64("big", i64::MIN)
        .build();

    assert_eq!(
        parse(&bytes),
        json!({
            "pi": 3.25,
            "name": "bson",
            "inner": {"ok": true, "nothing": null},
            "list": [1, 1_099_511_627_776_i64, "three"],
            "_id": "0123456789abcdef01234567",
            "when": "1970-01-01T00:00:00Z",
            "small": -7,
            "big": i64::MIN,
        })
    );
}

#[test]
fn field_order_is_preserved() {
    let bytes = DocBuilder::new().int32("z", 1).int32("a", 2).int32("m", 3).build();
    assert_eq!(to_json_string(&bytes).unwrap(), r#"{"z":1,"a":2,"m":3}"#);
}

#[test]
fn containers_close_in_reverse_order() {
    let bytes = DocBuilder::new()
        .array(
            "a",
            DocBuilder::new()
                .document("0", DocBuilder::new().array("b", DocBuilder::new().int32("0", 1)))
                .array("1", DocBuilder::new()),
        )
        .document("c", DocBuilder::new())
        .build();
    assert_eq!(to_json_string(&bytes).unwrap(), r#"{"a":[{"b":[1]},[]],"c":{}}"#);
}

#[test]
fn depth_is_preserved() {
    let json = to_json_string(&nested(64)).unwrap();
    let opening = Regex::new(r#"\{"a":"#).unwrap();
    assert_eq!(opening.find_iter(&json).count(), 63);
    assert!(json.ends_with(&"}".repeat(64)));
}

#[test]
fn depth_limit() {
    assert!(to_json(&nested(64)).is_ok());
    assert_eq!(to_json(&nested(65)), Err(Error::MaxDepthExceeded));

    let shallow = TranscoderConfig {
        max_depth: 3,
        ..TranscoderConfig::default()
    };
    assert!(to_json_with_config(&nested(3), shallow.clone()).is_ok());
    assert_eq!(to_json_with_config(&nested(4), shallow), Err(Error::MaxDepthExceeded));
}

#[test]
fn string_escapes_round_trip() {
    let text = "say \"hi\"\\\nnew line\ttab\rreturn\u{1}bell";
    let bytes = DocBuilder::new().string("s", text).build();
    assert_eq!(parse(&bytes)["s"], text);

    let json = to_json_string(&bytes).unwrap();
    assert!(json.contains(r#"\"hi\""#));
    assert!(json.contains(r"\\"));
    assert!(json.contains(r"\n"));
    assert!(json.contains(r"\t"));
    assert!(json.contains(r"\r"));
    assert!(json.contains(r"\u0001"));
}

#[test]
fn multibyte_strings_pass_through() {
    let bytes = DocBuilder::new().string("größe", "日本語 🎉").build();
    assert_eq!(to_json_string(&bytes).unwrap(), r#"{"größe":"日本語 🎉"}"#);
}

#[test]
fn object_id_is_lowercase_hex() {
    let bytes = DocBuilder::new().object_id("_id", OID).build();
    let json = to_json_string(&bytes).unwrap();
    assert_eq!(json, r#"{"_id":"0123456789abcdef01234567"}"#);
    assert!(Regex::new(r#"^\{"_id":"[0-9a-f]{24}"\}$"#).unwrap().is_match(&json));
}

#[test]
fn datetimes_are_rfc3339_utc() {
    let pattern = Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?Z$").unwrap();
    for millis in [0, 1, -1, 1_578_915_133_222, 253_402_300_799_999] {
        let value = parse(&DocBuilder::new().datetime("t", millis).build());
        let text = value["t"].as_str().unwrap();
        assert!(pattern.is_match(text), "{millis} rendered as {text}");
    }
    let value = parse(&DocBuilder::new().datetime("t", 0).build());
    assert_eq!(value["t"], "1970-01-01T00:00:00Z");
    let value = parse(&DocBuilder::new().datetime("t", 1_578_915_133_222).build());
    assert_eq!(value["t"], "2020-01-13T11:32:13.222Z");
}

#[test]
fn unsupported_types_produce_no_output() {
    for (code, payload) in [(0x11u8, vec![0u8; 8]), (0x13, vec![0u8; 16])] {
        let bytes = DocBuilder::new().int32("before", 1).raw(code, "x", &payload).build();
        let err = to_json(&bytes).unwrap_err();
        let expected = ElementType::from_code(code).unwrap();
        assert_eq!(err, Error::UnsupportedType(expected));
    }
}

#[test]
fn array_member_names_never_appear() {
    let items = (0..12).fold(DocBuilder::new(), |arr, i| arr.int32(&i.to_string(), i * 10));
    let json = to_json_string(&DocBuilder::new().array("list", items).build()).unwrap();
    assert_eq!(json, r#"{"list":[0,10,20,30,40,50,60,70,80,90,100,110]}"#);
    assert!(!Regex::new(r#""\d+":"#).unwrap().is_match(&json));

    let named = DocBuilder::new().string("weird", "x").string("names", "y");
    let json = to_json_string(&DocBuilder::new().array("list", named).build()).unwrap();
    assert_eq!(json, r#"{"list":["x","y"]}"#);
}

#[test]
fn negative_integers_keep_their_sign() {
    let bytes = DocBuilder::new()
        .int32("a", -1)
        .int32("b", i32::MIN)
        .int64("c", -1)
        .int64("d", i64::MIN)
        .build();
    assert_eq!(
        to_json_string(&bytes).unwrap(),
        format!(r#"{{"a":-1,"b":{},"c":-1,"d":{}}}"#, i32::MIN, i64::MIN)
    );
}

#[test]
fn every_prefix_fails_cleanly() {
    let bytes = DocBuilder::new()
        .string("s", "text")
        .document("d", DocBuilder::new().double("x", 1.5))
        .array("a", DocBuilder::new().object_id("0", OID).datetime("1", 5))
        .build();
    assert!(to_json(&bytes).is_ok());
    for len in 0..bytes.len() {
        assert!(to_json(&bytes[..len]).is_err(), "prefix of {len} bytes was accepted");
    }
}

#[test]
fn error_types() {
    for (expected, input) in error_cases() {
        match to_json(&input) {
            Ok(json) => panic!("expected {expected}, got {}", String::from_utf8_lossy(&json)),
            Err(err) => assert_eq!(err.error_type(), expected, "{err}"),
        }
    }
}

#[test]
fn document_size_limit() {
    let bytes = DocBuilder::new().string("s", &"x".repeat(100)).build();
    let config = TranscoderConfig {
        max_document_size: 64,
        ..TranscoderConfig::default()
    };
    assert_eq!(to_json_with_config(&bytes, config), Err(Error::MaxDocumentSizeExceeded));
}

#[test]
fn typed_decoding() {
    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Account {
        #[serde(rename = "_id")]
        id: String,
        balance: i64,
        tags: Vec<String>,
        created: String,
    }

    let bytes = from_json(&json!({"balance": -250, "tags": ["a", "b"]}));
    assert!(from_bson_slice::<Account>(&bytes).is_err());

    let bytes = DocBuilder::new()
        .object_id("_id", OID)
        .int64("balance", -250)
        .array("tags", DocBuilder::new().string("0", "a").string("1", "b"))
        .datetime("created", 86_400_000)
        .build();
    assert_eq!(
        from_bson_slice::<Account>(&bytes).unwrap(),
        Account {
            id: "0123456789abcdef01234567".into(),
            balance: -250,
            tags: vec!["a".into(), "b".into()],
            created: "1970-01-02T00:00:00Z".into(),
        }
    );
}
