//! Rebuilds the symbol model from flat index records.
//!
//! Each symbol record decodes on its own. A broken record (wrong field
//! count, or a key with no target record) fails that one symbol and leaves
//! the rest of the category readable.

use super::constants::{NO_ENTRY, metadata_location};
use super::records::{
    DescriptionRecord, FlatRecord, FunctionRecord, KeyedRecord, ParametersRecord, PropertyRecord,
    ReturnTypesRecord, TypeRecord, UserAgentRecord,
};
use crate::model::{
    FunctionElement, Member, ParameterElement, PropertyElement, ReturnTypeElement, TypeElement,
    UserAgent,
};
use crate::storage::IndexSink;
use crate::types::{Category, Location};
use crate::{IndexError, IndexResult};
use std::collections::HashMap;

/// Raw values of one keyed category at one location, by key.
struct KeyTable {
    category: Category,
    location: Location,
    values: HashMap<String, String>,
}

impl KeyTable {
    fn load<R: KeyedRecord>(index: &dyn IndexSink, location: &Location) -> Self {
        let mut values = HashMap::new();
        for entry in index.query(R::CATEGORY, Some(location)) {
            let key = R::key_of(&entry.value).to_string();
            values.entry(key).or_insert(entry.value);
        }
        Self {
            category: R::CATEGORY,
            location: location.clone(),
            values,
        }
    }

    fn get<R: KeyedRecord>(&self, key: &str) -> IndexResult<R> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| IndexError::missing(self.category, key, &self.location))?;
        R::decode(value)
    }
}

/// Key tables needed to resolve references from records at one location.
struct Tables {
    descriptions: KeyTable,
    parameters: KeyTable,
    return_types: KeyTable,
    user_agents: KeyTable,
}

impl Tables {
    fn load(index: &dyn IndexSink, location: &Location, user_agent_location: &Location) -> Self {
        Self {
            descriptions: KeyTable::load::<DescriptionRecord>(index, location),
            parameters: KeyTable::load::<ParametersRecord>(index, location),
            return_types: KeyTable::load::<ReturnTypesRecord>(index, location),
            user_agents: KeyTable::load::<UserAgentRecord>(index, user_agent_location),
        }
    }

    fn description(&self, key: &str) -> IndexResult<Option<String>> {
        if key == NO_ENTRY {
            return Ok(None);
        }
        let record: DescriptionRecord = self.descriptions.get(key)?;
        Ok(Some(record.text))
    }

    fn parameters(&self, key: &str) -> IndexResult<Vec<ParameterElement>> {
        let record: ParametersRecord = self.parameters.get(key)?;
        Ok(record.parameters)
    }

    fn return_types(&self, key: &str) -> IndexResult<Vec<ReturnTypeElement>> {
        let record: ReturnTypesRecord = self.return_types.get(key)?;
        record
            .return_types
            .into_iter()
            .map(|field| {
                Ok(ReturnTypeElement {
                    description: self.description(&field.description_key)?,
                    type_name: field.type_name,
                })
            })
            .collect()
    }

    fn user_agents(&self, keys: &[String]) -> IndexResult<Vec<UserAgent>> {
        keys.iter()
            .map(|key| {
                let record: UserAgentRecord = self.user_agents.get(key)?;
                Ok(record.user_agent)
            })
            .collect()
    }

    fn property(&self, value: &str) -> IndexResult<PropertyElement> {
        let record = PropertyRecord::decode(value)?;
        Ok(PropertyElement {
            description: self.description(&record.description_key)?,
            types: self.return_types(&record.types_key)?,
            user_agents: self.user_agents(&record.user_agent_keys)?,
            name: record.name,
            owning_type: record.owning_type,
        })
    }

    fn function(&self, value: &str) -> IndexResult<FunctionElement> {
        let record = FunctionRecord::decode(value)?;
        Ok(FunctionElement {
            parameters: self.parameters(&record.parameters_key)?,
            return_types: self.return_types(&record.return_types_key)?,
            property: PropertyElement {
                description: self.description(&record.description_key)?,
                types: Vec::new(),
                user_agents: self.user_agents(&record.user_agent_keys)?,
                name: record.name,
                owning_type: record.owning_type,
            },
        })
    }

    fn type_element(&self, value: &str) -> IndexResult<TypeElement> {
        let record = TypeRecord::decode(value)?;
        Ok(TypeElement {
            description: self.description(&record.description_key)?,
            name: record.name,
            parent_types: record.parent_types,
            user_agents: Vec::new(),
            members: Vec::new(),
        })
    }
}

/// Read side of the index.
pub struct IndexReader<'a> {
    index: &'a dyn IndexSink,
    user_agent_location: Location,
}

impl<'a> IndexReader<'a> {
    pub fn new(index: &'a dyn IndexSink) -> Self {
        Self::with_user_agent_location(index, metadata_location())
    }

    /// Reader resolving user-agent keys against records at `location`.
    pub fn with_user_agent_location(index: &'a dyn IndexSink, location: Location) -> Self {
        Self {
            index,
            user_agent_location: location,
        }
    }

    fn tables(&self, location: &Location) -> Tables {
        Tables::load(self.index, location, &self.user_agent_location)
    }

    /// Text for a description key. The sentinel key resolves to `None`
    /// without a lookup.
    pub fn read_description(&self, key: &str, location: &Location) -> IndexResult<Option<String>> {
        if key == NO_ENTRY {
            return Ok(None);
        }
        KeyTable::load::<DescriptionRecord>(self.index, location)
            .get::<DescriptionRecord>(key)
            .map(|record| Some(record.text))
    }

    pub fn read_parameters(
        &self,
        key: &str,
        location: &Location,
    ) -> IndexResult<Vec<ParameterElement>> {
        KeyTable::load::<ParametersRecord>(self.index, location)
            .get::<ParametersRecord>(key)
            .map(|record| record.parameters)
    }

    pub fn read_return_types(
        &self,
        key: &str,
        location: &Location,
    ) -> IndexResult<Vec<ReturnTypeElement>> {
        self.tables(location).return_types(key)
    }

    pub fn read_user_agent(&self, key: &str) -> IndexResult<UserAgent> {
        KeyTable::load::<UserAgentRecord>(self.index, &self.user_agent_location)
            .get::<UserAgentRecord>(key)
            .map(|record| record.user_agent)
    }

    /// Every decodable user agent by key. Malformed records are skipped.
    pub fn read_user_agents(&self) -> HashMap<String, UserAgent> {
        self.index
            .query(Category::UserAgent, Some(&self.user_agent_location))
            .into_iter()
            .filter_map(|entry| match UserAgentRecord::decode(&entry.value) {
                Ok(record) => Some((record.key, record.user_agent)),
                Err(e) => {
                    tracing::warn!(target: "reader", "skipping user agent: {e}");
                    None
                }
            })
            .collect()
    }

    pub fn read_properties(&self, location: &Location) -> Vec<IndexResult<PropertyElement>> {
        let tables = self.tables(location);
        self.index
            .query(Category::Property, Some(location))
            .iter()
            .map(|entry| tables.property(&entry.value))
            .collect()
    }

    pub fn read_functions(&self, location: &Location) -> Vec<IndexResult<FunctionElement>> {
        let tables = self.tables(location);
        self.index
            .query(Category::Function, Some(location))
            .iter()
            .map(|entry| tables.function(&entry.value))
            .collect()
    }

    /// Type records without their members.
    pub fn read_type_records(&self, location: &Location) -> Vec<IndexResult<TypeElement>> {
        let tables = self.tables(location);
        self.index
            .query(Category::Type, Some(location))
            .iter()
            .map(|entry| tables.type_element(&entry.value))
            .collect()
    }

    /// Types at `location` with their members attached.
    ///
    /// Type records sharing a name are merged into the first one: parents
    /// are unioned in order, the first description wins. Members are
    /// matched to types by owning type name: properties first, then
    /// functions, each in write order. Members that fail to decode are
    /// logged and left out; members whose owner is not a type at this
    /// location are only reachable through `read_properties` and
    /// `read_functions`.
    pub fn read_types(&self, location: &Location) -> Vec<IndexResult<TypeElement>> {
        let tables = self.tables(location);
        let mut types: Vec<IndexResult<TypeElement>> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for entry in self.index.query(Category::Type, Some(location)) {
            let decoded = match tables.type_element(&entry.value) {
                Ok(decoded) => decoded,
                Err(e) => {
                    types.push(Err(e));
                    continue;
                }
            };
            match positions.get(&decoded.name) {
                Some(&i) => {
                    if let Ok(existing) = types[i].as_mut() {
                        merge_type(existing, decoded);
                    }
                }
                None => {
                    positions.insert(decoded.name.clone(), types.len());
                    types.push(Ok(decoded));
                }
            }
        }

        let properties = self
            .index
            .query(Category::Property, Some(location))
            .into_iter()
            .map(|entry| tables.property(&entry.value).map(Member::Property));
        let functions = self
            .index
            .query(Category::Function, Some(location))
            .into_iter()
            .map(|entry| tables.function(&entry.value).map(Member::Function));

        for member in properties.chain(functions) {
            let member = match member {
                Ok(member) => member,
                Err(e) => {
                    tracing::warn!(target: "reader", "skipping member at {location}: {e}");
                    continue;
                }
            };

            let owner = positions
                .get(&member.property().owning_type)
                .and_then(|&i| types[i].as_mut().ok());
            match owner {
                Some(type_element) => type_element.members.push(member),
                None => tracing::warn!(
                    target: "reader",
                    "member {} has no owning type {} at {location}",
                    member.name(),
                    member.property().owning_type
                ),
            }
        }

        types
    }

    /// First type named `name` at `location`, with members.
    pub fn find_type(&self, name: &str, location: &Location) -> IndexResult<Option<TypeElement>> {
        for result in self.read_types(location) {
            match result {
                Ok(type_element) if type_element.name == name => return Ok(Some(type_element)),
                Ok(_) => {}
                Err(e) if e.is_decode_error() => {
                    tracing::warn!(target: "reader", "skipping type at {location}: {e}");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}

/// Fold a repeated declaration of a type into the first one.
fn merge_type(existing: &mut TypeElement, repeated: TypeElement) {
    for parent in repeated.parent_types {
        if !existing.parent_types.contains(&parent) {
            existing.parent_types.push(parent);
        }
    }
    if existing.description.is_none() {
        existing.description = repeated.description;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryIndex;

    fn loc() -> Location {
        Location::from("doc.js")
    }

    #[test]
    fn test_sentinel_description_needs_no_record() {
        let index = MemoryIndex::new();
        let reader = IndexReader::new(&index);
        assert_eq!(reader.read_description(NO_ENTRY, &loc()).unwrap(), None);
    }

    #[test]
    fn test_missing_description_is_reference_error() {
        let index = MemoryIndex::new();
        let reader = IndexReader::new(&index);
        let err = reader.read_description("4", &loc()).unwrap_err();
        assert!(matches!(
            err,
            IndexError::MissingReference {
                category: Category::Description,
                ..
            }
        ));
    }

    #[test]
    fn test_descriptions_resolve_per_location() {
        let index = MemoryIndex::new();
        index
            .add_entry(Category::Description, "0\0in doc", &loc())
            .unwrap();
        index
            .add_entry(Category::Description, "0\0elsewhere", &Location::from("other.js"))
            .unwrap();

        let reader = IndexReader::new(&index);
        assert_eq!(
            reader.read_description("0", &loc()).unwrap().as_deref(),
            Some("in doc")
        );
    }

    #[test]
    fn test_empty_parent_field_decodes_to_no_parents() {
        let index = MemoryIndex::new();
        index.add_entry(Category::Type, "Object\0\0-1", &loc()).unwrap();
        let reader = IndexReader::new(&index);

        let types = reader.read_type_records(&loc());
        let object = types[0].as_ref().unwrap();
        assert!(object.parent_types.is_empty());
        assert_eq!(object.description, None);
    }

    #[test]
    fn test_broken_member_does_not_hide_others() {
        let index = MemoryIndex::new();
        let l = loc();
        index.add_entry(Category::Type, "T\0Object\0-1", &l).unwrap();
        index.add_entry(Category::ReturnTypes, "0", &l).unwrap();
        index.add_entry(Category::Property, "good\0T\0-1\00\0", &l).unwrap();
        // dangling return-types key
        index.add_entry(Category::Property, "dangling\0T\0-1\09\0", &l).unwrap();
        // wrong field count
        index.add_entry(Category::Property, "short\0T", &l).unwrap();

        let reader = IndexReader::new(&index);
        let properties = reader.read_properties(&l);
        assert_eq!(properties.len(), 3);
        assert!(properties[0].is_ok());
        assert!(matches!(
            properties[1],
            Err(IndexError::MissingReference {
                category: Category::ReturnTypes,
                ..
            })
        ));
        assert!(matches!(properties[2], Err(IndexError::MalformedRecord { .. })));

        let types = reader.read_types(&l);
        let t = types[0].as_ref().unwrap();
        assert_eq!(t.members.len(), 1);
        assert_eq!(t.members[0].name(), "good");
    }

    #[test]
    fn test_unknown_user_agent_key_fails_symbol() {
        let index = MemoryIndex::new();
        let l = loc();
        index.add_entry(Category::ReturnTypes, "0", &l).unwrap();
        index.add_entry(Category::Property, "p\0T\0-1\00\07", &l).unwrap();

        let reader = IndexReader::new(&index);
        let properties = reader.read_properties(&l);
        assert!(matches!(
            properties[0],
            Err(IndexError::MissingReference {
                category: Category::UserAgent,
                ..
            })
        ));
    }

    #[test]
    fn test_find_type() {
        let index = MemoryIndex::new();
        let l = loc();
        index.add_entry(Category::Type, "A\0Object\0-1", &l).unwrap();
        index.add_entry(Category::Type, "B\0A\0-1", &l).unwrap();

        let reader = IndexReader::new(&index);
        let b = reader.find_type("B", &l).unwrap().unwrap();
        assert_eq!(b.parent_types, vec!["A"]);
        assert!(reader.find_type("C", &l).unwrap().is_none());
    }

    #[test]
    fn test_read_parameters() {
        let index = MemoryIndex::new();
        let l = loc();
        index
            .add_entry(Category::Parameters, "0\0items,one-or-more,Array,Object\0cb,optional,", &l)
            .unwrap();
        index.add_entry(Category::Parameters, "1", &l).unwrap();

        let reader = IndexReader::new(&index);
        let parameters = reader.read_parameters("0", &l).unwrap();
        assert_eq!(
            parameters,
            vec![
                ParameterElement::new("items", "one-or-more")
                    .with_type("Array")
                    .with_type("Object"),
                ParameterElement::new("cb", "optional"),
            ]
        );
        assert!(reader.read_parameters("1", &l).unwrap().is_empty());

        let err = reader.read_parameters("2", &l).unwrap_err();
        assert!(matches!(
            err,
            IndexError::MissingReference {
                category: Category::Parameters,
                ..
            }
        ));
    }

    #[test]
    fn test_read_return_types_resolves_descriptions() {
        let index = MemoryIndex::new();
        let l = loc();
        index.add_entry(Category::Description, "0\0the new length", &l).unwrap();
        index
            .add_entry(Category::ReturnTypes, "0\0Number,0\0undefined,-1", &l)
            .unwrap();

        let reader = IndexReader::new(&index);
        let return_types = reader.read_return_types("0", &l).unwrap();
        assert_eq!(
            return_types,
            vec![
                ReturnTypeElement::new("Number").with_description("the new length"),
                ReturnTypeElement::new("undefined"),
            ]
        );
    }

    #[test]
    fn test_read_return_types_missing_references() {
        let index = MemoryIndex::new();
        let l = loc();
        // description key 5 has no record
        index.add_entry(Category::ReturnTypes, "0\0Number,5", &l).unwrap();

        let reader = IndexReader::new(&index);
        assert!(matches!(
            reader.read_return_types("0", &l).unwrap_err(),
            IndexError::MissingReference {
                category: Category::Description,
                ..
            }
        ));
        assert!(matches!(
            reader.read_return_types("1", &l).unwrap_err(),
            IndexError::MissingReference {
                category: Category::ReturnTypes,
                ..
            }
        ));
    }

    #[test]
    fn test_read_user_agent() {
        let index = MemoryIndex::new();
        index
            .add_entry(
                Category::UserAgent,
                "0\0Firefox\0Windows\0Mozilla\03.0",
                &metadata_location(),
            )
            .unwrap();
        // same key at a document location is not a user-agent record
        index
            .add_entry(Category::UserAgent, "1\0Opera\0\0\09", &loc())
            .unwrap();

        let reader = IndexReader::new(&index);
        assert_eq!(
            reader.read_user_agent("0").unwrap(),
            UserAgent::new("Firefox", "Windows", "Mozilla", "3.0")
        );
        assert!(matches!(
            reader.read_user_agent("1").unwrap_err(),
            IndexError::MissingReference {
                category: Category::UserAgent,
                ..
            }
        ));
    }

    #[test]
    fn test_repeated_type_records_merge() {
        let index = MemoryIndex::new();
        let l = loc();
        index.add_entry(Category::Type, "Window\0Object\0-1", &l).unwrap();
        index.add_entry(Category::Description, "0\0The window", &l).unwrap();
        index.add_entry(Category::Type, "Window\0EventTarget\00", &l).unwrap();
        index.add_entry(Category::ReturnTypes, "0", &l).unwrap();
        index.add_entry(Category::Property, "document\0Window\0-1\00\0", &l).unwrap();
        index.add_entry(Category::Property, "history\0Window\0-1\00\0", &l).unwrap();

        let reader = IndexReader::new(&index);
        let types = reader.read_types(&l);
        assert_eq!(types.len(), 1);

        let window = reader.find_type("Window", &l).unwrap().unwrap();
        assert_eq!(window.parent_types, vec!["Object", "EventTarget"]);
        assert_eq!(window.description.as_deref(), Some("The window"));
        let names: Vec<&str> = window.members.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["document", "history"]);
    }
}
