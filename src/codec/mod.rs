//! The `codec` module turns a [`Message`](crate::broker::Message) into its
//! wire form and back.
//!
//! The wire form is a small XML document: one root element (named
//! `message` unless configured otherwise) with one child per field, the
//! field name as the tag and the value as text, in field order. The broker
//! stores this form in topic queues; subscribers are handed the in-memory
//! message, so `decode` is for tooling and tests rather than the hot path.

mod xml;

pub use xml::{DEFAULT_ROOT, EncodedMessage, XmlCodec};
