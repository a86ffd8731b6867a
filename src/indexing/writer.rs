//! Encodes the symbol model into flat index records.
//!
//! Children are written before the record that references them: parameters,
//! return types, descriptions and user agents first, then the owning
//! function/property/type record carrying their keys.

use super::constants::{NO_ENTRY, metadata_location};
use super::records::{
    DescriptionRecord, FlatRecord, FunctionRecord, ParametersRecord, PropertyRecord,
    ReturnTypeField, ReturnTypesRecord, TypeRecord,
};
use super::registry::UserAgentRegistry;
use crate::{IndexError, IndexResult};
use crate::model::{
    FunctionElement, MetadataReader, Member, ParameterElement, PropertyElement, ReturnTypeElement,
    TypeElement, UserAgent,
};
use crate::storage::IndexSink;
use crate::types::{Category, Location};
use std::path::Path;
use std::sync::Arc;

/// Next sequence number for each keyed category a writer produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceCounters {
    pub descriptions: u64,
    pub parameters: u64,
    pub return_types: u64,
}

impl SequenceCounters {
    fn take(counter: &mut u64, category: Category) -> IndexResult<String> {
        let key = counter.to_string();
        *counter = counter
            .checked_add(1)
            .ok_or(IndexError::SequenceExhausted { category })?;
        Ok(key)
    }
}

/// Writes one indexing session's worth of records.
///
/// Counters belong to the writer and are never shared; the user-agent
/// registry is shared with every other writer of the session. A writer is
/// meant to be driven from one thread at a time.
#[derive(Debug)]
pub struct IndexWriter {
    reader: MetadataReader,
    user_agents: Arc<UserAgentRegistry>,
    counters: SequenceCounters,
}

impl IndexWriter {
    pub fn new(user_agents: Arc<UserAgentRegistry>) -> Self {
        Self::with_counters(user_agents, SequenceCounters::default())
    }

    /// Writer that continues numbering from `counters`.
    pub fn with_counters(user_agents: Arc<UserAgentRegistry>, counters: SequenceCounters) -> Self {
        Self {
            reader: MetadataReader::new(),
            user_agents,
            counters,
        }
    }

    pub fn counters(&self) -> SequenceCounters {
        self.counters
    }

    pub fn user_agents(&self) -> &Arc<UserAgentRegistry> {
        &self.user_agents
    }

    pub fn metadata(&self) -> &MetadataReader {
        &self.reader
    }

    /// Load a metadata file for [`write_to_index`](Self::write_to_index).
    pub fn load_metadata(&mut self, path: &Path) -> IndexResult<usize> {
        self.reader.load_file(path)
    }

    pub fn load_metadata_str(&mut self, json: &str) -> IndexResult<usize> {
        self.reader.load_str(json)
    }

    /// Write every loaded type at the metadata location.
    ///
    /// Returns the number of types written.
    pub fn write_to_index(&mut self, index: &dyn IndexSink) -> IndexResult<usize> {
        let reader = std::mem::take(&mut self.reader);
        let location = metadata_location();

        let result = reader
            .types()
            .iter()
            .try_for_each(|type_element| self.write_type(index, type_element, &location));
        let written = reader.types().len();
        self.reader = reader;

        result?;
        tracing::info!(target: "writer", "wrote {written} metadata types");
        Ok(written)
    }

    /// Write a type at the metadata location.
    pub fn write_type_default(
        &mut self,
        index: &dyn IndexSink,
        type_element: &TypeElement,
    ) -> IndexResult<()> {
        self.write_type(index, type_element, &metadata_location())
    }

    /// Write a type record followed by one record per member.
    pub fn write_type(
        &mut self,
        index: &dyn IndexSink,
        type_element: &TypeElement,
        location: &Location,
    ) -> IndexResult<()> {
        let description_key =
            self.write_description(index, type_element.description.as_deref(), location)?;
        let record = TypeRecord::for_type(type_element, description_key);
        index.add_entry(TypeRecord::CATEGORY, &record.encode(), location)?;

        for member in &type_element.members {
            self.write_owned_member(index, member, &type_element.name, location)?;
        }

        tracing::debug!(
            target: "writer",
            "type {} ({} members) at {location}",
            type_element.name,
            type_element.members.len()
        );
        Ok(())
    }

    /// Write a member under its own `owning_type`.
    pub fn write_member(
        &mut self,
        index: &dyn IndexSink,
        member: &Member,
        location: &Location,
    ) -> IndexResult<()> {
        let owner = member.property().owning_type.clone();
        self.write_owned_member(index, member, &owner, location)
    }

    /// Write a member of `owner`; the enclosing type always wins over the
    /// member's own `owning_type`.
    fn write_owned_member(
        &mut self,
        index: &dyn IndexSink,
        member: &Member,
        owner: &str,
        location: &Location,
    ) -> IndexResult<()> {
        match member {
            Member::Function(function) => self.encode_function(index, function, owner, location),
            Member::Property(property) => self.encode_property(index, property, owner, location),
        }
    }

    pub fn write_function(
        &mut self,
        index: &dyn IndexSink,
        function: &FunctionElement,
        location: &Location,
    ) -> IndexResult<()> {
        self.encode_function(index, function, &function.property.owning_type, location)
    }

    pub fn write_property(
        &mut self,
        index: &dyn IndexSink,
        property: &PropertyElement,
        location: &Location,
    ) -> IndexResult<()> {
        self.encode_property(index, property, &property.owning_type, location)
    }

    fn encode_function(
        &mut self,
        index: &dyn IndexSink,
        function: &FunctionElement,
        owner: &str,
        location: &Location,
    ) -> IndexResult<()> {
        let parameters_key = self.write_parameters(index, &function.parameters, location)?;
        let return_types_key = self.write_return_types(index, &function.return_types, location)?;
        let property = &function.property;
        let description_key =
            self.write_description(index, property.description.as_deref(), location)?;

        let record = FunctionRecord {
            name: property.name.clone(),
            owning_type: owner.to_string(),
            description_key,
            parameters_key,
            return_types_key,
            user_agent_keys: self.write_user_agents(index, &property.user_agents)?,
        };
        index.add_entry(FunctionRecord::CATEGORY, &record.encode(), location)?;
        Ok(())
    }

    fn encode_property(
        &mut self,
        index: &dyn IndexSink,
        property: &PropertyElement,
        owner: &str,
        location: &Location,
    ) -> IndexResult<()> {
        let types_key = self.write_return_types(index, &property.types, location)?;
        let description_key =
            self.write_description(index, property.description.as_deref(), location)?;

        let record = PropertyRecord {
            name: property.name.clone(),
            owning_type: owner.to_string(),
            description_key,
            types_key,
            user_agent_keys: self.write_user_agents(index, &property.user_agents)?,
        };
        index.add_entry(PropertyRecord::CATEGORY, &record.encode(), location)?;
        Ok(())
    }

    /// Write a parameter group. A key is consumed even for an empty list.
    pub fn write_parameters(
        &mut self,
        index: &dyn IndexSink,
        parameters: &[ParameterElement],
        location: &Location,
    ) -> IndexResult<String> {
        let record = ParametersRecord {
            key: SequenceCounters::take(&mut self.counters.parameters, Category::Parameters)?,
            parameters: parameters.to_vec(),
        };
        index.add_entry(ParametersRecord::CATEGORY, &record.encode(), location)?;
        Ok(record.key)
    }

    /// Write a return-type group and the descriptions it references. A key
    /// is consumed even for an empty list.
    pub fn write_return_types(
        &mut self,
        index: &dyn IndexSink,
        return_types: &[ReturnTypeElement],
        location: &Location,
    ) -> IndexResult<String> {
        let key = SequenceCounters::take(&mut self.counters.return_types, Category::ReturnTypes)?;

        let mut fields = Vec::with_capacity(return_types.len());
        for return_type in return_types {
            fields.push(ReturnTypeField {
                type_name: return_type.type_name.clone(),
                description_key: self.write_description(
                    index,
                    return_type.description.as_deref(),
                    location,
                )?,
            });
        }

        let record = ReturnTypesRecord {
            key,
            return_types: fields,
        };
        index.add_entry(ReturnTypesRecord::CATEGORY, &record.encode(), location)?;
        Ok(record.key)
    }

    /// Write a description, or return [`NO_ENTRY`] without writing when
    /// there is no text.
    pub fn write_description(
        &mut self,
        index: &dyn IndexSink,
        description: Option<&str>,
        location: &Location,
    ) -> IndexResult<String> {
        let Some(text) = description.filter(|text| !text.is_empty()) else {
            return Ok(NO_ENTRY.to_string());
        };

        let record = DescriptionRecord {
            key: SequenceCounters::take(&mut self.counters.descriptions, Category::Description)?,
            text: text.to_string(),
        };
        index.add_entry(DescriptionRecord::CATEGORY, &record.encode(), location)?;
        Ok(record.key)
    }

    pub fn write_user_agents(
        &self,
        index: &dyn IndexSink,
        user_agents: &[UserAgent],
    ) -> IndexResult<Vec<String>> {
        self.user_agents.intern_all(index, user_agents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryIndex;

    fn writer() -> IndexWriter {
        IndexWriter::new(Arc::new(UserAgentRegistry::new()))
    }

    fn values(index: &MemoryIndex, category: Category) -> Vec<String> {
        index
            .query(category, None)
            .into_iter()
            .map(|entry| entry.value)
            .collect()
    }

    #[test]
    fn test_description_keys_start_at_zero_and_increase() {
        let index = MemoryIndex::new();
        let mut writer = writer();
        let loc = Location::from("a.js");

        let keys: Vec<String> = (0..4)
            .map(|i| {
                writer
                    .write_description(&index, Some(&format!("text {i}")), &loc)
                    .unwrap()
            })
            .collect();
        assert_eq!(keys, vec!["0", "1", "2", "3"]);
        assert_eq!(index.count(Category::Description), 4);
    }

    #[test]
    fn test_missing_description_is_sentinel() {
        let index = MemoryIndex::new();
        let mut writer = writer();
        let loc = Location::from("a.js");

        assert_eq!(writer.write_description(&index, None, &loc).unwrap(), NO_ENTRY);
        assert_eq!(writer.write_description(&index, Some(""), &loc).unwrap(), NO_ENTRY);
        assert_eq!(index.count(Category::Description), 0);
        assert_eq!(writer.counters().descriptions, 0);
    }

    #[test]
    fn test_empty_groups_still_consume_keys() {
        let index = MemoryIndex::new();
        let mut writer = writer();
        let loc = Location::from("a.js");

        assert_eq!(writer.write_parameters(&index, &[], &loc).unwrap(), "0");
        assert_eq!(writer.write_parameters(&index, &[], &loc).unwrap(), "1");
        assert_eq!(writer.write_return_types(&index, &[], &loc).unwrap(), "0");
        assert_eq!(values(&index, Category::Parameters), vec!["0", "1"]);
        assert_eq!(values(&index, Category::ReturnTypes), vec!["0"]);
    }

    #[test]
    fn test_return_types_write_descriptions_first() {
        let index = MemoryIndex::new();
        let mut writer = writer();
        let loc = Location::from("a.js");

        let key = writer
            .write_return_types(
                &index,
                &[
                    ReturnTypeElement::new("Number").with_description("the length"),
                    ReturnTypeElement::new("undefined"),
                ],
                &loc,
            )
            .unwrap();
        assert_eq!(key, "0");
        assert_eq!(values(&index, Category::ReturnTypes), vec!["0\0Number,0\0undefined,-1"]);
        assert_eq!(values(&index, Category::Description), vec!["0\0the length"]);
    }

    #[test]
    fn test_function_record_field_order() {
        let index = MemoryIndex::new();
        let mut writer = writer();
        let loc = Location::from("a.js");

        let mut function = FunctionElement::new("f")
            .with_parameter(ParameterElement::new("a", "optional").with_type("String"))
            .with_return_type(ReturnTypeElement::new("Number").with_description("desc"))
            .with_user_agent(UserAgent::new("Firefox", "", "Mozilla", "2.0"));
        function.property.owning_type = "T".to_string();

        writer.write_function(&index, &function, &loc).unwrap();

        // no own description; the return type's description took key "0"
        assert_eq!(values(&index, Category::Function), vec!["f\0T\0-1\00\00\00"]);
        assert_eq!(values(&index, Category::Parameters), vec!["0\0a,optional,String"]);
        assert_eq!(values(&index, Category::ReturnTypes), vec!["0\0Number,0"]);
    }

    #[test]
    fn test_property_record_field_order() {
        let index = MemoryIndex::new();
        let mut writer = writer();
        let loc = Location::from("a.js");

        let mut property = PropertyElement::new("length")
            .with_description("Number of elements")
            .with_type(ReturnTypeElement::new("Number"));
        property.owning_type = "Array".to_string();

        writer.write_property(&index, &property, &loc).unwrap();
        assert_eq!(values(&index, Category::Property), vec!["length\0Array\00\00\0"]);
    }

    #[test]
    fn test_write_type_dispatches_members() {
        let index = MemoryIndex::new();
        let mut writer = writer();
        let loc = Location::from("a.js");

        let array = TypeElement::new("Array")
            .with_description("An ordered list")
            .with_member(PropertyElement::new("length"))
            .with_member(FunctionElement::new("push"));
        writer.write_type(&index, &array, &loc).unwrap();

        assert_eq!(values(&index, Category::Type), vec!["Array\0Object\00"]);
        assert_eq!(values(&index, Category::Property), vec!["length\0Array\0-1\00\0"]);
        assert_eq!(values(&index, Category::Function), vec!["push\0Array\0-1\00\01\0"]);
    }

    #[test]
    fn test_write_type_default_uses_metadata_location() {
        let index = MemoryIndex::new();
        let mut writer = writer();
        writer
            .write_type_default(&index, &TypeElement::new("Object"))
            .unwrap();

        let records = index.query(Category::Type, None);
        assert_eq!(records[0].value, "Object\0\0-1");
        assert_eq!(records[0].location, metadata_location());
    }

    #[test]
    fn test_write_to_index_writes_loaded_types() {
        let index = MemoryIndex::new();
        let mut writer = writer();
        writer
            .load_metadata_str(r#"{ "types": [{ "name": "Object" }, { "name": "Date" }] }"#)
            .unwrap();

        assert_eq!(writer.write_to_index(&index).unwrap(), 2);
        assert_eq!(
            values(&index, Category::Type),
            vec!["Object\0\0-1", "Date\0Object\0-1"]
        );
        assert_eq!(writer.metadata().types().len(), 2);
    }

    #[test]
    fn test_with_counters_resumes_numbering() {
        let index = MemoryIndex::new();
        let counters = SequenceCounters {
            descriptions: 10,
            parameters: 3,
            return_types: 7,
        };
        let mut writer = IndexWriter::with_counters(Arc::new(UserAgentRegistry::new()), counters);
        let loc = Location::from("a.js");

        assert_eq!(writer.write_description(&index, Some("x"), &loc).unwrap(), "10");
        assert_eq!(writer.write_parameters(&index, &[], &loc).unwrap(), "3");
        assert_eq!(writer.write_return_types(&index, &[], &loc).unwrap(), "7");
    }

    #[test]
    fn test_exhausted_counter_is_an_error() {
        let index = MemoryIndex::new();
        let counters = SequenceCounters {
            descriptions: u64::MAX,
            ..Default::default()
        };
        let mut writer = IndexWriter::with_counters(Arc::new(UserAgentRegistry::new()), counters);
        let loc = Location::from("a.js");

        let err = writer.write_description(&index, Some("x"), &loc).unwrap_err();
        assert!(matches!(
            err,
            IndexError::SequenceExhausted {
                category: Category::Description
            }
        ));
        assert!(index.is_empty());
        assert_eq!(writer.write_parameters(&index, &[], &loc).unwrap(), "0");
    }

    #[test]
    fn test_write_type_owns_its_members() {
        let index = MemoryIndex::new();
        let mut writer = writer();
        let loc = Location::from("a.js");

        let mut constructor = PropertyElement::new("constructor");
        constructor.owning_type = "Object".to_string();
        let array = TypeElement {
            name: "Array".to_string(),
            members: vec![Member::Property(constructor)],
            ..Default::default()
        };
        writer.write_type(&index, &array, &loc).unwrap();

        assert_eq!(
            values(&index, Category::Property),
            vec!["constructor\0Array\0-1\00\0"]
        );
    }
}
