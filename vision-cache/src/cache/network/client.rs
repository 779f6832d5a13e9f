//! Client abstraction for the shared network store.
//!
//! The network tier never speaks a wire protocol itself. Applications hand
//! it an implementation of [`SharedStoreClient`] wrapping whatever store
//! they run (a key-value server, a cluster proxy, ...). Values cross this
//! boundary as already-serialized bytes.

use std::time::Duration;
use thiserror::Error;

use crate::cache::traits::BoxFuture;

/// Errors reported by a shared store client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SharedStoreError {
    /// Store cannot be reached
    #[error("Shared store unavailable: {0}")]
    Unavailable(String),

    /// Connection dropped or request failed mid-flight
    #[error("Shared store transport error: {0}")]
    Transport(String),

    /// Store answered with something the client could not interpret
    #[error("Shared store protocol error: {0}")]
    Protocol(String),
}

/// Operations the network tier needs from a shared store.
///
/// Keys passed in are already namespaced by the tier's key prefix.
pub trait SharedStoreClient: Send + Sync {
    /// Establish (or re-establish) the connection.
    fn connect(&self) -> BoxFuture<'_, Result<(), SharedStoreError>>;

    /// Fetch raw bytes for a key.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Vec<u8>>, SharedStoreError>>;

    /// Store raw bytes, expiring after `ttl` when given.
    fn set<'a>(
        &'a self,
        key: &'a str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> BoxFuture<'a, Result<(), SharedStoreError>>;

    /// Remove a key. Returns true if it existed.
    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<bool, SharedStoreError>>;

    /// True if the key exists and has not expired.
    fn exists<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<bool, SharedStoreError>>;

    /// Remaining TTL of a key; `None` if missing or without expiry.
    fn ttl<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Duration>, SharedStoreError>>;

    /// Fetch several keys at once, in request order.
    fn get_many<'a>(
        &'a self,
        keys: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Option<Vec<u8>>>, SharedStoreError>>;

    /// Store several values with a shared TTL.
    fn set_many(
        &self,
        items: Vec<(String, Vec<u8>)>,
        ttl: Option<Duration>,
    ) -> BoxFuture<'_, Result<(), SharedStoreError>>;

    /// All keys starting with `prefix`.
    fn keys<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<Vec<String>, SharedStoreError>>;
}
