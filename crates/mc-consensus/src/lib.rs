//! # Consensus Engine
//!
//! Witness-rotation consensus: slot-based block production, a five-step
//! verification pipeline, and structure-only finality over the fork
//! tree kept by `mc-block-cache`.
//!
//! ## Architecture
//!
//! ```text
//!                        +--------------------+
//!     IncomingBlock ---> |    verify loop     | ---> gossip digests
//!     (mpsc queue)       |  basics + admit    |
//!                        +---------+----------+
//!                                  |
//!                                  v
//!   +-----------------+   +-----------------+   +------------------+
//!   | production loop |-->| ConsensusEngine |<--|  cleanup loop    |
//!   | slot wakeups    |   |  cache + lock   |   | slot occupancy   |
//!   +-----------------+   +--------+--------+   +------------------+
//!                                  |
//!                 +----------------+----------------+
//!                 |         outbound ports          |
//!                 |  TxPool  StateDb  ChainStore    |
//!                 |          NetService             |
//!                 +---------------------------------+
//! ```
//!
//! Produced blocks re-enter through the same admission path received
//! blocks take; the state version committed at production time lets the
//! self-feed skip re-execution. Finality is purely structural: a block
//! becomes irreversible once `floor(2N/3) + 1` distinct witnesses have
//! built on it with live watermarks.

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod schedule;
pub mod verify;

pub use config::ConsensusConfig;
pub use engine::{BlockOutcome, ConsensusEngine, EngineDependencies};
pub use error::{ConsensusError, ConsensusResult};
pub use ports::inbound::{ChainInfo, ChainStatus};
pub use ports::outbound::{
    BlockSource, ChainStore, IncomingBlock, MessageKind, NetService, Priority, StateDb,
    SystemTimeSource, TimeSource, TxExistence, TxPool,
};
pub use schedule::WitnessSchedule;
pub use verify::{verify_basics, verify_block, verify_block_head, VerifyContext};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
