pub mod bulk;
pub mod codec;
pub mod constants;
pub mod reader;
pub mod records;
pub mod registry;
pub mod walker;
pub mod writer;

pub use bulk::{BulkIndexer, BulkReport, SourceDocument};
pub use constants::{
    DELIMITER, LIST_DELIMITER, METADATA_LOCATION, NO_ENTRY, SUB_DELIMITER, metadata_location,
};
pub use reader::IndexReader;
pub use records::{
    DescriptionRecord, FlatRecord, FunctionRecord, KeyedRecord, ParametersRecord, PropertyRecord,
    ReturnTypeField, ReturnTypesRecord, TypeRecord, UserAgentRecord,
};
pub use registry::UserAgentRegistry;
pub use walker::DocumentWalker;
pub use writer::{IndexWriter, SequenceCounters};
