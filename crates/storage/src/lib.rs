//! Storage layer for Social Confidence
//!
//! This crate provides the on-device key-value store that backs the
//! session, theme, settings and advice library.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod kv;

pub use kv::{
    keys, AccountStore, KeyValueStore, KeyValueStoreExt, KvConfig, KvError, KvStore, Result,
};
