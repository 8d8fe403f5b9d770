//! # acksub
//!
//! `acksub` is an in-process publish/subscribe broker with explicit delivery
//! confirmation. Producers publish messages to named topics; every
//! subscriber of the topic is called synchronously with the message and a
//! confirmation handle, and must `ack` (remove the queued copy) or `nack`
//! (leave it queued).
//!
//! ## Core Modules
//!
//! - `broker`: topics, queues, subscriptions and ack/nack handling.
//! - `codec`: the XML wire form messages are queued in.
//! - `config`: loading settings from file and environment.
//! - `utils`: error types and logging setup.

pub mod broker;
pub mod codec;
pub mod config;
pub mod utils;
