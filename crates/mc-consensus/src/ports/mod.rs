//! Hexagonal architecture ports.
//!
//! Inbound ports are the surface other components drive the engine
//! through; outbound ports are the collaborators the engine drives.
//! Production adapters live in the node runtime, test doubles next to
//! the tests that use them.

pub mod inbound;
pub mod outbound;

pub use inbound::{ChainInfo, ChainStatus};
pub use outbound::{
    BlockSource, ChainStore, IncomingBlock, MessageKind, NetService, Priority, StateDb,
    SystemTimeSource, TimeSource, TxExistence, TxPool,
};
