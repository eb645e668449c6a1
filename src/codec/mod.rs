//! Byte codecs — convert between typed values and body bytes.
//!
//! An [`Unmarshaller`] declares the content-type ranges it can decode from;
//! a [`Marshaller`] declares the concrete content types it can encode to.
//! Declaration order is significant: the negotiation algorithms in
//! [`crate::negotiate`] use it as the tie-break.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::negotiate::{ContentType, ContentTypeRange};

/// Error produced when encoding or decoding a body fails.
///
/// A decode failure means the negotiated representation matched but the
/// payload itself was malformed; it maps to an internal failure, not a
/// negotiation rejection.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode {content_type} payload: {message}")]
    Decode { content_type: String, message: String },

    #[error("failed to encode {content_type} payload: {message}")]
    Encode { content_type: String, message: String },
}

impl CodecError {
    pub fn decode(content_type: &ContentType, message: impl Into<String>) -> Self {
        Self::Decode {
            content_type: content_type.to_string(),
            message: message.into(),
        }
    }

    pub fn encode(content_type: &ContentType, message: impl Into<String>) -> Self {
        Self::Encode {
            content_type: content_type.to_string(),
            message: message.into(),
        }
    }
}

/// Decodes request bodies into values of type `T`.
pub trait Unmarshaller<T>: Send + Sync {
    /// The non-empty, ordered ranges this decoder accepts.
    fn ranges(&self) -> &[ContentTypeRange];

    /// Decodes `bytes`, which arrived with the given (already matched)
    /// content type.
    fn unmarshal(&self, content_type: &ContentType, bytes: &[u8]) -> Result<T, CodecError>;
}

/// Encodes response values of type `R` into body bytes.
pub trait Marshaller<R>: Send + Sync {
    /// The non-empty, ordered content types this encoder can produce.
    fn produces(&self) -> &[ContentType];

    /// Encodes `value` as the given (already selected) content type.
    fn marshal(&self, value: &R, content_type: &ContentType) -> Result<Vec<u8>, CodecError>;
}

/// JSON codec backed by serde_json.
///
/// Decodes any `application/json` body regardless of charset and encodes as
/// `application/json; charset=UTF-8`.
pub struct Json {
    ranges: Vec<ContentTypeRange>,
    produces: Vec<ContentType>,
}

impl Json {
    pub fn new() -> Self {
        Self {
            ranges: vec![ContentTypeRange::new("application", "json")],
            produces: vec![ContentType::with_charset("application", "json", "UTF-8")],
        }
    }
}

impl Default for Json {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> Unmarshaller<T> for Json {
    fn ranges(&self) -> &[ContentTypeRange] {
        &self.ranges
    }

    fn unmarshal(&self, content_type: &ContentType, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::decode(content_type, e.to_string()))
    }
}

impl<R: Serialize> Marshaller<R> for Json {
    fn produces(&self) -> &[ContentType] {
        &self.produces
    }

    fn marshal(&self, value: &R, content_type: &ContentType) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::encode(content_type, e.to_string()))
    }
}
