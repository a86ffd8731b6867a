//! One typed record per category.
//!
//! Each struct owns the positional layout of its category. Writers build a
//! record and call [`FlatRecord::encode`]; readers call
//! [`FlatRecord::decode`] and never index into raw fields themselves.
//!
//! | category       | fields                                                            |
//! |----------------|-------------------------------------------------------------------|
//! | `type`         | name, parents, description key                                    |
//! | `function`     | name, owner, description key, parameters key, return types key, user agents |
//! | `property`     | name, owner, description key, types key, user agents              |
//! | `parameters`   | key, then `name,usage,types...` per parameter                     |
//! | `return_types` | key, then `type,description key` per entry                        |
//! | `description`  | key, text                                                         |
//! | `user_agent`   | key, description, os, platform, version                           |

use super::codec::{join, split, split_fields};
use super::constants::{DELIMITER, LIST_DELIMITER, SUB_DELIMITER};
use crate::model::{ParameterElement, ROOT_TYPE, TypeElement, UserAgent};
use crate::types::Category;
use crate::{IndexError, IndexResult};

/// A record with a fixed category and positional layout.
pub trait FlatRecord: Sized {
    const CATEGORY: Category;

    fn encode(&self) -> String;

    fn decode(value: &str) -> IndexResult<Self>;
}

/// A record that other records point at through its first field.
pub trait KeyedRecord: FlatRecord {
    /// Key of an encoded value without decoding the rest.
    fn key_of(value: &str) -> &str {
        value.split(DELIMITER).next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRecord {
    pub name: String,
    pub parent_types: Vec<String>,
    pub description_key: String,
}

impl TypeRecord {
    /// Build the record for a type, applying the implicit-root policy:
    /// declared parents win, otherwise every type but the root inherits
    /// from the root.
    pub fn for_type(type_element: &TypeElement, description_key: String) -> Self {
        let parent_types = if !type_element.parent_types.is_empty() {
            type_element.parent_types.clone()
        } else if !type_element.is_root() {
            vec![ROOT_TYPE.to_string()]
        } else {
            Vec::new()
        };

        Self {
            name: type_element.name.clone(),
            parent_types,
            description_key,
        }
    }
}

impl FlatRecord for TypeRecord {
    const CATEGORY: Category = Category::Type;

    fn encode(&self) -> String {
        join(
            DELIMITER,
            [
                self.name.as_str(),
                join(LIST_DELIMITER, &self.parent_types).as_str(),
                self.description_key.as_str(),
            ],
        )
    }

    fn decode(value: &str) -> IndexResult<Self> {
        let fields = split_fields(Self::CATEGORY, DELIMITER, value, 3)?;
        Ok(Self {
            name: fields[0].to_string(),
            parent_types: owned(split(LIST_DELIMITER, fields[1])),
            description_key: fields[2].to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRecord {
    pub name: String,
    pub owning_type: String,
    pub description_key: String,
    pub types_key: String,
    pub user_agent_keys: Vec<String>,
}

impl FlatRecord for PropertyRecord {
    const CATEGORY: Category = Category::Property;

    fn encode(&self) -> String {
        join(
            DELIMITER,
            [
                self.name.as_str(),
                self.owning_type.as_str(),
                self.description_key.as_str(),
                self.types_key.as_str(),
                join(SUB_DELIMITER, &self.user_agent_keys).as_str(),
            ],
        )
    }

    fn decode(value: &str) -> IndexResult<Self> {
        let fields = split_fields(Self::CATEGORY, DELIMITER, value, 5)?;
        Ok(Self {
            name: fields[0].to_string(),
            owning_type: fields[1].to_string(),
            description_key: fields[2].to_string(),
            types_key: fields[3].to_string(),
            user_agent_keys: owned(split(SUB_DELIMITER, fields[4])),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord {
    pub name: String,
    pub owning_type: String,
    pub description_key: String,
    pub parameters_key: String,
    pub return_types_key: String,
    pub user_agent_keys: Vec<String>,
}

impl FlatRecord for FunctionRecord {
    const CATEGORY: Category = Category::Function;

    fn encode(&self) -> String {
        join(
            DELIMITER,
            [
                self.name.as_str(),
                self.owning_type.as_str(),
                self.description_key.as_str(),
                self.parameters_key.as_str(),
                self.return_types_key.as_str(),
                join(SUB_DELIMITER, &self.user_agent_keys).as_str(),
            ],
        )
    }

    fn decode(value: &str) -> IndexResult<Self> {
        let fields = split_fields(Self::CATEGORY, DELIMITER, value, 6)?;
        Ok(Self {
            name: fields[0].to_string(),
            owning_type: fields[1].to_string(),
            description_key: fields[2].to_string(),
            parameters_key: fields[3].to_string(),
            return_types_key: fields[4].to_string(),
            user_agent_keys: owned(split(SUB_DELIMITER, fields[5])),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParametersRecord {
    pub key: String,
    pub parameters: Vec<ParameterElement>,
}

impl FlatRecord for ParametersRecord {
    const CATEGORY: Category = Category::Parameters;

    fn encode(&self) -> String {
        let fields = self.parameters.iter().map(|parameter| {
            format!(
                "{}{LIST_DELIMITER}{}{LIST_DELIMITER}{}",
                parameter.name,
                parameter.usage,
                join(LIST_DELIMITER, &parameter.types)
            )
        });
        join(DELIMITER, std::iter::once(self.key.clone()).chain(fields))
    }

    fn decode(value: &str) -> IndexResult<Self> {
        let mut fields = value.split(DELIMITER);
        let key = fields.next().unwrap_or_default().to_string();

        let parameters = fields
            .map(|field| {
                let mut parts = field.splitn(3, LIST_DELIMITER);
                match (parts.next(), parts.next()) {
                    (Some(name), Some(usage)) => Ok(ParameterElement {
                        name: name.to_string(),
                        usage: usage.to_string(),
                        types: owned(split(LIST_DELIMITER, parts.next().unwrap_or_default())),
                    }),
                    _ => Err(IndexError::malformed(
                        Self::CATEGORY,
                        value,
                        format!("parameter {field:?} lacks a usage"),
                    )),
                }
            })
            .collect::<IndexResult<Vec<_>>>()?;

        Ok(Self { key, parameters })
    }
}

impl KeyedRecord for ParametersRecord {}

/// One `type,descriptionKey` pair of a return-types record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnTypeField {
    pub type_name: String,
    pub description_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnTypesRecord {
    pub key: String,
    pub return_types: Vec<ReturnTypeField>,
}

impl FlatRecord for ReturnTypesRecord {
    const CATEGORY: Category = Category::ReturnTypes;

    fn encode(&self) -> String {
        let fields = self.return_types.iter().map(|field| {
            format!("{}{LIST_DELIMITER}{}", field.type_name, field.description_key)
        });
        join(DELIMITER, std::iter::once(self.key.clone()).chain(fields))
    }

    fn decode(value: &str) -> IndexResult<Self> {
        let mut fields = value.split(DELIMITER);
        let key = fields.next().unwrap_or_default().to_string();

        let return_types = fields
            .map(|field| {
                field
                    .rsplit_once(LIST_DELIMITER)
                    .map(|(type_name, description_key)| ReturnTypeField {
                        type_name: type_name.to_string(),
                        description_key: description_key.to_string(),
                    })
                    .ok_or_else(|| {
                        IndexError::malformed(
                            Self::CATEGORY,
                            value,
                            format!("return type {field:?} lacks a description key"),
                        )
                    })
            })
            .collect::<IndexResult<Vec<_>>>()?;

        Ok(Self { key, return_types })
    }
}

impl KeyedRecord for ReturnTypesRecord {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionRecord {
    pub key: String,
    pub text: String,
}

impl FlatRecord for DescriptionRecord {
    const CATEGORY: Category = Category::Description;

    fn encode(&self) -> String {
        join(DELIMITER, [&self.key, &self.text])
    }

    fn decode(value: &str) -> IndexResult<Self> {
        let fields = split_fields(Self::CATEGORY, DELIMITER, value, 2)?;
        Ok(Self {
            key: fields[0].to_string(),
            text: fields[1].to_string(),
        })
    }
}

impl KeyedRecord for DescriptionRecord {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentRecord {
    pub key: String,
    pub user_agent: UserAgent,
}

impl FlatRecord for UserAgentRecord {
    const CATEGORY: Category = Category::UserAgent;

    fn encode(&self) -> String {
        let ua = &self.user_agent;
        join(
            DELIMITER,
            [
                &self.key,
                &ua.description,
                &ua.os,
                &ua.platform,
                &ua.version,
            ],
        )
    }

    fn decode(value: &str) -> IndexResult<Self> {
        let fields = split_fields(Self::CATEGORY, DELIMITER, value, 5)?;
        Ok(Self {
            key: fields[0].to_string(),
            user_agent: UserAgent::new(fields[1], fields[2], fields[3], fields[4]),
        })
    }
}

impl KeyedRecord for UserAgentRecord {}

fn owned(items: Vec<&str>) -> Vec<String> {
    items.into_iter().map(str::to_string).collect()
}
