//! Error types for the block cache.

use mc_chain_types::BlockHash;

/// Block cache error types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("block not in cache: {0:?}")]
    BlockNotFound(BlockHash),

    #[error("parent of {0:?} is not linked")]
    ParentNotLinked(BlockHash),

    #[error("node {0:?} is a placeholder without a block")]
    VirtualNode(BlockHash),

    #[error("node {0:?} is already linked")]
    AlreadyLinked(BlockHash),

    #[error("the root {0:?} cannot be removed")]
    RootUntouchable(BlockHash),

    #[error("flush target {0:?} is not a linked descendant of the root")]
    NotDescendant(BlockHash),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
