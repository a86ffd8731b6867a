pub mod error;
pub mod memory;
pub mod metadata;
pub mod persistence;
pub mod sink;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryIndex;
pub use metadata::IndexMetadata;
pub use persistence::IndexPersistence;
pub use sink::{IndexEntry, IndexSink};
