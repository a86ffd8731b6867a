use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of the document a record came from.
///
/// The codec never interprets it; the sink uses it for provenance and for
/// dropping a document's records before it is re-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(Box<str>);

/// Record categories of the flat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Type,
    Function,
    Property,
    Parameters,
    ReturnTypes,
    Description,
    UserAgent,
}

impl Location {
    pub fn new(value: impl Into<Box<str>>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Location {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Type,
        Category::Function,
        Category::Property,
        Category::Parameters,
        Category::ReturnTypes,
        Category::Description,
        Category::UserAgent,
    ];

    /// Stable tag stored alongside every record.
    pub fn tag(&self) -> &'static str {
        match self {
            Category::Type => "type",
            Category::Function => "function",
            Category::Property => "property",
            Category::Parameters => "parameters",
            Category::ReturnTypes => "return_types",
            Category::Description => "description",
            Category::UserAgent => "user_agent",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.tag() == tag)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
