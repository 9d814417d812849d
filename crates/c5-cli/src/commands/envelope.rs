//! Envelope command implementation.

use c5_canonical::JsonProps;
use c5_envelope::{HashIdGenerator, Payload, SimpleEnvelope, SimpleEnvelopeProps};

use crate::input::read_value;

pub struct EnvelopeArgs {
    pub input: Option<String>,
    pub src: String,
    pub kind: String,
    pub dst: Vec<String>,
    pub id: Option<String>,
    pub t: Option<i64>,
    pub ttl: Option<u32>,
    pub indent: usize,
    pub hash_id: bool,
}

pub fn run(args: EnvelopeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_value(args.input)?;

    let mut props = SimpleEnvelopeProps::new(args.src, Payload::new(args.kind, data))
        .with_dst(args.dst)
        .with_json(JsonProps::indented(args.indent));
    if let Some(id) = args.id {
        props = props.with_id(id);
    }
    if let Some(t) = args.t {
        props = props.with_t(t);
    }
    if let Some(ttl) = args.ttl {
        props = props.with_ttl(ttl);
    }
    if args.hash_id {
        props = props.with_id_generator(HashIdGenerator);
    }

    let envelope = SimpleEnvelope::new(props);
    println!("{}", envelope.as_json()?);
    Ok(())
}
