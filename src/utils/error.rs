//! The `error` module defines the error types used across `acksub`.
//!
//! Validation failures are returned to the publisher before the broker
//! touches any queue. A duplicate ack and a query against a topic nobody has
//! used yet are not errors at all: the first surfaces as
//! [`AckOutcome::AlreadyRemoved`](crate::broker::AckOutcome) and the second
//! as an empty result.

use thiserror::Error;

/// Error type a subscriber returns to report that it could not handle a
/// delivery. The broker logs it and moves on to the next subscriber.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync>;

/// Reasons a publish is rejected. No queue or subscriber is touched when
/// one of these is returned.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("message must be a mapping of field names to values, got {found}")]
    InvalidMessageType { found: &'static str },

    #[error("failed to encode message: {0}")]
    Encoding(#[from] EncodingError),
}

/// A message field that cannot be written to the wire.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("{name:?} is not a valid element name")]
    InvalidElementName { name: String },

    #[error("field {field:?} contains {character:?}, which is not allowed on the wire")]
    InvalidCharacter { field: String, character: char },

    #[error("field {field:?} holds a {kind} value, which cannot be stringified")]
    UnsupportedValue { field: String, kind: &'static str },

    #[error("failed to write wire form: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write wire form: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("wire form is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Wire text that does not describe a message.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed wire form: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("element name is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("wire form has no root element")]
    MissingRoot,

    #[error("expected root element {expected:?}, found {found:?}")]
    UnexpectedRoot { expected: String, found: String },

    #[error("field {field:?} contains a nested element")]
    NestedField { field: String },

    #[error("text found outside of a field: {text:?}")]
    StrayText { text: String },

    #[error("wire form ended before element {element:?} was closed")]
    Unclosed { element: String },
}
