pub mod elements;
pub mod metadata;

pub use elements::{
    FunctionElement, Member, ParameterElement, PropertyElement, ROOT_TYPE, ReturnTypeElement,
    TypeElement, UserAgent,
};
pub use metadata::{MetadataDocument, MetadataReader};
