//! Smoke command implementation.

use c5_canonical::JsonProps;
use c5_envelope::{Envelope, Payload, SimpleEnvelope, SimpleEnvelopeProps};
use serde_json::json;
use tracing::info;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    for indent in [0, 2] {
        let payload = Payload::new(
            "smoke",
            json!({
                "name": "object",
                "date": "2021-05-20",
                "tags": ["a", "b"],
                "nested": {"y": 4, "x": [1.5, null, true]}
            }),
        );
        let first = SimpleEnvelope::new(
            SimpleEnvelopeProps::new("c5-smoke", payload)
                .with_dst(["c5-smoke"])
                .with_json(JsonProps::indented(indent)),
        );
        let text = first.as_json()?;

        let decoded = Envelope::from_json(text)?;
        let second = SimpleEnvelope::new(
            SimpleEnvelopeProps::try_from(&decoded)?.with_json(JsonProps::indented(indent)),
        );
        let again = second.as_json()?;

        if text != again {
            return Err(format!("round trip diverged:\n{}\n{}", text, again).into());
        }
        info!(indent, id = %decoded.id, "round trip ok");
        println!("{}", text);
    }
    Ok(())
}
