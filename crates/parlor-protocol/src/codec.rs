//! Codec trait and implementations for the event stream.
//!
//! The gateway doesn't care HOW events become frames — it goes through
//! the [`Codec`] trait. [`JsonCodec`] is the only implementation today
//! because the browser client speaks JSON text frames, but the seam
//! keeps a binary codec possible without touching the gateway.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts events to and from text frames.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a frame back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the frame is malformed or
    /// doesn't match the expected type.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON via `serde_json`.
///
/// ## Example
///
/// ```rust
/// use parlor_protocol::{Codec, JsonCodec, Move};
///
/// let codec = JsonCodec;
/// let frame = codec.encode(&Move::CellClick { cell_index: 4 }).unwrap();
/// let back: Move = codec.decode(&frame).unwrap();
/// assert_eq!(back, Move::CellClick { cell_index: 4 });
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
