//! # Chain Types
//!
//! Core entities shared by the Meridian consensus crates: blocks, block
//! heads, transactions, receipts, hashing, merkle roots, and the Ed25519
//! wrapper types used for witness identities.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every cross-crate chain type is defined
//!   here; consensus crates never re-declare entities.
//! - **Deterministic Encoding**: the bytes a signature covers are produced
//!   by fixed-width big-endian encoding, never by a serializer whose layout
//!   could drift between versions.

pub mod crypto;
pub mod entities;
pub mod hashing;
pub mod merkle;

pub use crypto::{CryptoError, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use entities::*;
pub use hashing::sha3_256;
pub use merkle::merkle_root;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
