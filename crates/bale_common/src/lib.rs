//! Shared foundational types used across the Bale packaging toolchain.
//!
//! This crate provides content hashing for cache invalidation and the
//! [`ContentSource`] handle that every build stage uses to describe archive
//! payloads.

#![warn(missing_docs)]

pub mod hash;
pub mod source;

pub use hash::{ContentHash, ParseHashError};
pub use source::{Content, ContentSource};
