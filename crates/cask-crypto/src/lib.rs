//! Hashing primitives for Cask.
//!
//! Wraps BLAKE3 with domain separation so that the hash of an encoded blob
//! can never collide with the hash of some other structure that happens to
//! contain the same bytes.

pub mod hasher;

pub use hasher::ContentHasher;
