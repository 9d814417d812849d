use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};
use std::fmt;

use crate::traversal::{traverse, Event, EventSink, Path};
use crate::value::CanonicalValue;

/// Supported digest algorithms for content hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigestAlg {
    /// SHA-256 (the only algorithm in use).
    #[serde(rename = "sha-256")]
    Sha256,
}

/// Algorithm + digest bytes, encoded as Base58 (Bitcoin alphabet).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash {
    /// Digest algorithm (currently always `sha-256`).
    pub alg: DigestAlg,
    /// Base58 digest bytes.
    pub b58: String,
}

impl ContentHash {
    /// The Base58 text.
    pub fn as_str(&self) -> &str {
        &self.b58
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.b58)
    }
}

/// Streaming content hash over canonical events.
///
/// Container boundaries are not hashed. Attribute names and leaf plain text
/// are fed, in event order, into one running SHA-256.
#[derive(Debug, Clone, Default)]
pub struct HashDigest {
    hasher: Sha256,
}

impl HashDigest {
    /// Fresh digest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finalizes the running hash.
    pub fn digest(self) -> ContentHash {
        ContentHash {
            alg: DigestAlg::Sha256,
            b58: bs58::encode(self.hasher.finalize()).into_string(),
        }
    }
}

impl EventSink for HashDigest {
    fn append(&mut self, event: &Event<'_>, _path: &Path) {
        match event {
            Event::Attribute(name) => self.hasher.update(name.as_bytes()),
            Event::Value(leaf) => self.hasher.update(leaf.plain_text().as_bytes()),
            Event::ArrayStart | Event::ArrayEnd | Event::ObjectStart | Event::ObjectEnd => {}
        }
    }
}

/// Content hash of `value`.
pub fn content_hash(value: &CanonicalValue) -> ContentHash {
    let mut digest = HashDigest::new();
    traverse(value, &mut digest);
    digest.digest()
}
