pub mod cli;
pub mod config;
pub mod error;
pub mod indexing;
pub mod logging;
pub mod model;
pub mod storage;
pub mod types;

pub use config::Settings;
pub use error::{IndexError, IndexResult};
pub use indexing::{
    BulkIndexer, BulkReport, IndexReader, IndexWriter, SequenceCounters, SourceDocument,
    UserAgentRegistry,
};
pub use model::{
    FunctionElement, Member, MetadataReader, ParameterElement, PropertyElement, ReturnTypeElement,
    TypeElement, UserAgent,
};
pub use storage::{IndexEntry, IndexPersistence, IndexSink, MemoryIndex};
pub use types::{Category, Location};
