use c5_canonical::{
    content_hash, to_json, traverse, CanonicalValue, Canonicalizer, Event, EventLog, EventSink,
    JsonProps, Leaf, Path,
};
use chrono::DateTime;
use serde_json::json;
use sha2::{Digest, Sha256};

#[test]
fn payload_shape_hashes_to_golden_value() {
    let value = CanonicalValue::from(json!({
        "kind": "test",
        "data": {
            "name": "object",
            "date": "2021-05-20"
        }
    }));
    assert_eq!(
        content_hash(&value).b58,
        "5zWhdtvKuGob1FbW9vUGPQKobcLtYYr5wU8AxQRVraeB"
    );
}

#[test]
fn compact_output_matches_rfc8785_reference() {
    let value = json!({
        "zeta": [3, "three", {"b": null, "a": false}],
        "alpha": {"nested": {"y": -2, "x": 0.5}},
        "mid": "quote \" and \\ backslash",
        "empty": {"list": [], "map": {}}
    });
    let reference = canonical_json::to_string(&value).unwrap();
    assert_eq!(
        to_json(&CanonicalValue::from(&value), &JsonProps::compact()),
        reference
    );
}

#[test]
fn integers_beyond_2_pow_53_use_shortest_digits() {
    let value = json!({
        "big": 2f64.powi(60),
        "wide": 1.2345678901234568e20,
        "id": 9007199254740993.0
    });
    let compact = to_json(&CanonicalValue::from(&value), &JsonProps::compact());
    assert_eq!(
        compact,
        r#"{"big":1152921504606847000,"id":9007199254740992,"wide":123456789012345680000}"#
    );
    assert_eq!(compact, canonical_json::to_string(&value).unwrap());

    // Leaf text feeds the hash too.
    let mut log = EventLog::new();
    traverse(&CanonicalValue::from(2f64.powi(60)), &mut log);
    assert_eq!(log.entries(), &[" =1152921504606847000"]);
}

#[test]
fn permuted_objects_share_text_and_hash() {
    let first = CanonicalValue::record([
        ("name", "object".into()),
        ("date", "2021-05-20".into()),
        (
            "tags",
            CanonicalValue::record([("b", 2i64.into()), ("a", 1i64.into())]),
        ),
    ]);
    let second = CanonicalValue::record([
        (
            "tags",
            CanonicalValue::record([("a", 1i64.into()), ("b", 2i64.into())]),
        ),
        ("date", "2021-05-20".into()),
        ("name", "object".into()),
    ]);

    let canonicalizer = Canonicalizer::default();
    assert_eq!(
        canonicalizer.canonicalize(&first),
        canonicalizer.canonicalize(&second)
    );
}

#[test]
fn repeated_traversal_is_deterministic() {
    let value = CanonicalValue::from(json!({"a": [1, {"c": "d", "b": [true]}], "e": null}));
    let mut first = EventLog::new();
    let mut second = EventLog::new();
    traverse(&value, &mut first);
    traverse(&value, &mut second);
    assert_eq!(first, second);

    let props = JsonProps::indented(3);
    assert_eq!(to_json(&value, &props), to_json(&value, &props));
}

/// Hashes the content stream without going through `HashDigest`.
#[derive(Default)]
struct ContentStream(Vec<u8>);

impl EventSink for ContentStream {
    fn append(&mut self, event: &Event<'_>, _path: &Path) {
        match event {
            Event::Attribute(name) => self.0.extend_from_slice(name.as_bytes()),
            Event::Value(Leaf::String(s)) => self.0.extend_from_slice(s.as_bytes()),
            Event::Value(Leaf::Timestamp(ts)) => self
                .0
                .extend_from_slice(ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string().as_bytes()),
            Event::Value(leaf) => self.0.extend_from_slice(leaf.json_text().as_bytes()),
            _ => {}
        }
    }
}

#[test]
fn digest_is_reproducible_from_event_sequence() {
    let value = CanonicalValue::record([
        ("when", DateTime::from_timestamp_millis(1_624_140_000_000).unwrap().into()),
        ("count", 7i64.into()),
        ("ratio", 0.25.into()),
        ("ok", true.into()),
        ("none", CanonicalValue::Null),
        ("list", CanonicalValue::Array(vec!["x".into(), 1e21.into()])),
    ]);

    let mut stream = ContentStream::default();
    traverse(&value, &mut stream);
    let expected = bs58::encode(Sha256::digest(&stream.0)).into_string();

    assert_eq!(content_hash(&value).b58, expected);
    assert_eq!(
        String::from_utf8(stream.0).unwrap(),
        "count7list\
         x1e+21nonenulloktrueratio0.25when2021-06-19T22:00:00.000Z"
    );
}

#[test]
fn timestamps_render_as_quoted_iso_text() {
    let value = CanonicalValue::record([(
        "t",
        DateTime::from_timestamp_millis(444).unwrap().into(),
    )]);
    assert_eq!(
        to_json(&value, &JsonProps::compact()),
        r#"{"t":"1970-01-01T00:00:00.444Z"}"#
    );
}
