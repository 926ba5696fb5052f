//! # Meridian Test Suite
//!
//! Unified test crate for cross-crate behavior:
//!
//! ```text
//! tests/src/
//! ├── support.rs        # In-memory port adapters and chain fixtures
//! └── integration/      # Multi-crate consensus flows
//!     ├── consensus_flows.rs
//!     └── production_flows.rs
//! ```
//!
//! ## Running
//!
//! ```bash
//! cargo test -p mc-tests
//! cargo bench -p mc-tests
//! ```

#![allow(dead_code)]

pub mod support;
