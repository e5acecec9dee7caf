//! Protocol message contract.
//!
//! A message is a plain value: it encodes to bytes deterministically,
//! decodes all-or-nothing, and has structural equality and hashing that
//! agree with each other. The byte codec is the JSON form of the message
//! with fields in declaration order; framing is left to the transport.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::hash::StructuralHash;

/// Malformed or truncated message bytes.
///
/// Local to this process; never sent over the wire.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No bytes at all.
    #[error("Message body is empty")]
    Empty,

    /// Input ended before the message was complete.
    #[error("Message truncated: {0}")]
    Truncated(#[source] serde_json::Error),

    /// Input is complete but not a valid message of the expected type.
    #[error("Malformed message: {0}")]
    Malformed(#[source] serde_json::Error),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_eof() {
            DecodeError::Truncated(err)
        } else {
            DecodeError::Malformed(err)
        }
    }
}

/// A message value could not be encoded.
#[derive(Debug, Error)]
#[error("Failed to encode message: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// Contract implemented by every protocol message type.
///
/// Implementors list all equality-relevant fields in
/// [`structural_hash!`](crate::structural_hash) so that `a == b` implies
/// `hash(a) == hash(b)`. Optional fields stay `Option<T>` so that an absent
/// field and a present default remain distinguishable.
pub trait ProtoMessage:
    Serialize + DeserializeOwned + Clone + PartialEq + Debug + StructuralHash + Send + Sync + 'static
{
    /// Encode to wire bytes.
    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from wire bytes. On failure nothing is returned.
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        Ok(serde_json::from_slice(bytes)?)
    }
}
