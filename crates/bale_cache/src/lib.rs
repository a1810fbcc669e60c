//! Incremental-build fingerprint cache.
//!
//! This crate decides whether a compilation step can be skipped. A
//! [`Fingerprint`] captures the content hashes of every input file plus a set of
//! build-invariant properties; the [`FingerprintCache`] compares a freshly
//! computed fingerprint with the one persisted after the previous successful
//! build. Any doubt resolves to "rebuild".

#![warn(missing_docs)]

pub mod cache;
pub mod depfile;
pub mod error;
pub mod fingerprint;
pub mod hasher;

pub use cache::{BuildInputs, FingerprintCache, Freshness, StaleReason};
pub use depfile::Depfile;
pub use error::CacheError;
pub use fingerprint::{FileStamp, Fingerprint};
pub use hasher::FileHasher;
