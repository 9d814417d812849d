//! Envelope assembly.
//!
//! [`SimpleEnvelope`] turns [`SimpleEnvelopeProps`] into a finished
//! [`Envelope`] and its canonical JSON text. The payload data is rendered
//! exactly once; that text both feeds the content hash used for identity and
//! is spliced verbatim into the envelope text.

use c5_canonical::{
    traverse_with_splice, CanonicalValue, Canonicalizer, ContentHash, JsonEmitter, JsonProps,
    Path, Splice, ToCanonical,
};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::errors::EnvelopeError;
use crate::identity::{IdGenerator, IdInput, TimeHashIdGenerator};
use crate::schema::{Envelope, Payload, CURRENT_VERSION};

/// TTL applied when none (or zero) is given.
pub const DEFAULT_TTL: u32 = 10;

/// Where the payload data sits inside an envelope.
fn data_slot() -> Path {
    Path::from_fields(["data", "data"])
}

/// Creation time supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeTime {
    /// Milliseconds since the Unix epoch.
    Millis(i64),
    /// An instant.
    At(DateTime<Utc>),
}

impl EnvelopeTime {
    /// Milliseconds since the Unix epoch.
    pub fn as_millis(&self) -> i64 {
        match self {
            EnvelopeTime::Millis(millis) => *millis,
            EnvelopeTime::At(at) => at.timestamp_millis(),
        }
    }
}

impl From<i64> for EnvelopeTime {
    fn from(millis: i64) -> Self {
        EnvelopeTime::Millis(millis)
    }
}

impl From<DateTime<Utc>> for EnvelopeTime {
    fn from(at: DateTime<Utc>) -> Self {
        EnvelopeTime::At(at)
    }
}

/// Inputs for building an envelope.
#[derive(Clone, Default)]
pub struct SimpleEnvelopeProps {
    /// Explicit id; when absent or empty, one is derived.
    pub id: Option<String>,
    /// Sender.
    pub src: String,
    /// Destinations.
    pub dst: Vec<String>,
    /// Creation time; when absent or zero, taken from the clock.
    pub t: Option<EnvelopeTime>,
    /// Time to live in seconds; zero means [`DEFAULT_TTL`].
    pub ttl: Option<u32>,
    /// Payload.
    pub data: Payload,
    /// Formatting of the envelope text.
    pub json: JsonProps,
    /// Clock override; defaults to [`SystemClock`].
    pub clock: Option<Arc<dyn Clock>>,
    /// Identity policy override; defaults to [`TimeHashIdGenerator`].
    pub id_generator: Option<Arc<dyn IdGenerator>>,
}

impl SimpleEnvelopeProps {
    /// Props for `data` sent from `src`.
    pub fn new(src: impl Into<String>, data: Payload) -> Self {
        Self {
            src: src.into(),
            data,
            ..Self::default()
        }
    }

    /// Sets an explicit id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the destinations.
    pub fn with_dst<I, S>(mut self, dst: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dst = dst.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the creation time.
    pub fn with_t(mut self, t: impl Into<EnvelopeTime>) -> Self {
        self.t = Some(t.into());
        self
    }

    /// Sets the time to live.
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets the text formatting.
    pub fn with_json(mut self, json: JsonProps) -> Self {
        self.json = json;
        self
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Replaces the identity policy.
    pub fn with_id_generator(mut self, generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Some(Arc::new(generator));
        self
    }
}

impl fmt::Debug for SimpleEnvelopeProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleEnvelopeProps")
            .field("id", &self.id)
            .field("src", &self.src)
            .field("dst", &self.dst)
            .field("t", &self.t)
            .field("ttl", &self.ttl)
            .field("data", &self.data)
            .field("json", &self.json)
            .field("clock", &self.clock.is_some())
            .field("id_generator", &self.id_generator.is_some())
            .finish()
    }
}

/// Props that re-encode a decoded envelope.
///
/// Fails with [`EnvelopeError::Validation`] when `t` is not whole epoch
/// millis or `ttl` is not a whole number of seconds that fits a `u32`.
impl TryFrom<&Envelope> for SimpleEnvelopeProps {
    type Error = EnvelopeError;

    fn try_from(envelope: &Envelope) -> Result<Self, EnvelopeError> {
        Ok(Self {
            id: Some(envelope.id.clone()),
            src: envelope.src.clone(),
            dst: envelope.dst.clone(),
            t: Some(EnvelopeTime::At(envelope.sent_at()?)),
            ttl: Some(envelope.ttl_secs()?),
            data: envelope.data.clone(),
            ..Self::default()
        })
    }
}

#[derive(Debug)]
struct Finalized {
    json: String,
    data_json: String,
    data_hash: Option<ContentHash>,
    envelope: Envelope,
}

/// An envelope under construction.
///
/// The creation time is fixed by [`SimpleEnvelope::new`]. Everything else is
/// computed on the first accessor call and cached; later calls return the
/// cached values.
pub struct SimpleEnvelope {
    props: SimpleEnvelopeProps,
    t: i64,
    finalized: OnceCell<Finalized>,
}

impl SimpleEnvelope {
    /// Fixes the creation time and stores `props` for later finalization.
    pub fn new(props: SimpleEnvelopeProps) -> Self {
        let t = match props.t {
            Some(t) if t.as_millis() != 0 => t.as_millis(),
            _ => match &props.clock {
                Some(clock) => clock.now().timestamp_millis(),
                None => SystemClock.now().timestamp_millis(),
            },
        };
        debug!(t, src = %props.src, kind = %props.data.kind, "envelope created");
        Self {
            props,
            t,
            finalized: OnceCell::new(),
        }
    }

    /// Resolved creation time in milliseconds since the Unix epoch.
    pub fn t(&self) -> i64 {
        self.t
    }

    /// Props this envelope was built from.
    pub fn props(&self) -> &SimpleEnvelopeProps {
        &self.props
    }

    /// Canonical JSON text of the whole envelope.
    pub fn as_json(&self) -> Result<&str, EnvelopeError> {
        Ok(&self.ensure_finalized()?.json)
    }

    /// Structured envelope; `data.data` is the original payload value.
    pub fn as_envelope(&self) -> Result<&Envelope, EnvelopeError> {
        Ok(&self.ensure_finalized()?.envelope)
    }

    /// Canonical JSON text of the payload data, as embedded in [`Self::as_json`].
    pub fn as_data_json(&self) -> Result<&str, EnvelopeError> {
        Ok(&self.ensure_finalized()?.data_json)
    }

    /// Content hash of the payload data; only computed when the id was derived.
    pub fn data_hash(&self) -> Result<Option<&ContentHash>, EnvelopeError> {
        Ok(self.ensure_finalized()?.data_hash.as_ref())
    }

    fn ensure_finalized(&self) -> Result<&Finalized, EnvelopeError> {
        self.finalized.get_or_try_init(|| self.finalize())
    }

    /// Formatting for the payload data, rendered standalone but indented as
    /// if it sat at its slot inside the envelope.
    fn data_json_props(&self) -> JsonProps {
        let indent = self.props.json.indent;
        JsonProps {
            indent,
            newline: format!(
                "{}{}",
                self.props.json.newline,
                " ".repeat(data_slot().depth() * indent)
            ),
        }
    }

    fn finalize(&self) -> Result<Finalized, EnvelopeError> {
        let data = &self.props.data.data;
        let canonicalizer = Canonicalizer::new(self.data_json_props());
        let explicit_id = self.props.id.as_deref().filter(|id| !id.is_empty());

        let (id, data_json, data_hash) = match explicit_id {
            Some(id) => (id.to_string(), canonicalizer.render(data), None),
            None => {
                let rendered = canonicalizer.canonicalize(data);
                let id = self.derive_id(&rendered.hash)?;
                (id, rendered.json, Some(rendered.hash))
            }
        };

        let ttl = self.props.ttl.filter(|ttl| *ttl != 0).unwrap_or(DEFAULT_TTL);
        let mut envelope = Envelope {
            v: CURRENT_VERSION,
            id,
            src: self.props.src.clone(),
            dst: self.props.dst.clone(),
            t: self.t as f64,
            ttl: f64::from(ttl),
            data: Payload {
                kind: self.props.data.kind.clone(),
                data: CanonicalValue::Null,
            },
        };

        let splice = Splice {
            slot: data_slot(),
            json: &data_json,
        };
        let mut emitter = JsonEmitter::new(String::new(), &self.props.json);
        traverse_with_splice(&envelope.to_canonical(), &splice, &mut emitter);
        let json = emitter.into_output();

        envelope.data.data = data.clone();
        debug!(
            id = %envelope.id,
            derived = data_hash.is_some(),
            bytes = json.len(),
            "envelope finalized"
        );
        Ok(Finalized {
            json,
            data_json,
            data_hash,
            envelope,
        })
    }

    fn derive_id(&self, hash: &ContentHash) -> Result<String, EnvelopeError> {
        let input = IdInput {
            t: self.t,
            hash,
            props: &self.props,
        };
        let generated = match &self.props.id_generator {
            Some(generator) => generator.generate(&input),
            None => TimeHashIdGenerator.generate(&input),
        };
        generated.map_err(EnvelopeError::IdGenerator)
    }
}

impl fmt::Debug for SimpleEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleEnvelope")
            .field("props", &self.props)
            .field("t", &self.t)
            .field("finalized", &self.finalized.get().is_some())
            .finish()
    }
}
