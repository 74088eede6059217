//! # Services
//!
//! - **[`transport`]**: HTTP chat transport with primary/fallback failover
//! - **[`storage`]**: Durable client storage and the records kept in it

pub mod storage;
pub mod transport;

pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use transport::{ChatTransport, ConnectionStatus, TransportError, TransportResult};
