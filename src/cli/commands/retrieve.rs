//! Retrieve command: decode records back into the symbol model.

use std::path::Path;

use anyhow::Context;

use crate::cli::args::RetrieveQuery;
use crate::indexing::{IndexReader, metadata_location};
use crate::model::{Member, TypeElement};
use crate::storage::{IndexPersistence, MemoryIndex};
use crate::types::Location;

fn load_index(index_path: &Path) -> anyhow::Result<MemoryIndex> {
    let persistence = IndexPersistence::new(index_path);
    if !persistence.exists() {
        anyhow::bail!(
            "No index found at: {}\nRun 'symdex index' first",
            index_path.display()
        );
    }
    persistence
        .load()
        .with_context(|| format!("loading index at {}", index_path.display()))
}

fn location_or_default(location: Option<String>) -> Location {
    location.map(Location::from).unwrap_or_else(metadata_location)
}

fn print_type(type_element: &TypeElement) {
    if type_element.parent_types.is_empty() {
        println!("{}", type_element.name);
    } else {
        println!(
            "{} : {}",
            type_element.name,
            type_element.parent_types.join(", ")
        );
    }
    if let Some(description) = &type_element.description {
        println!("  {description}");
    }
    for member in &type_element.members {
        let property = member.property();
        let types: Vec<&str> = property.types.iter().map(|t| t.type_name.as_str()).collect();
        match member {
            Member::Function(function) => {
                let params: Vec<&str> = function.parameters.iter().map(|p| p.name.as_str()).collect();
                let returns: Vec<&str> = function
                    .return_types
                    .iter()
                    .map(|t| t.type_name.as_str())
                    .collect();
                println!(
                    "  fn {}({}) -> {}",
                    property.name,
                    params.join(", "),
                    returns.join(" | ")
                );
            }
            Member::Property(_) => println!("  {}: {}", property.name, types.join(" | ")),
        }
    }
}

/// Run retrieve command.
pub fn run_retrieve(index_path: &Path, query: RetrieveQuery) -> anyhow::Result<()> {
    let index = load_index(index_path)?;
    let reader = IndexReader::new(&index);

    match query {
        RetrieveQuery::Types { location, json } => {
            let location = location_or_default(location);
            let mut types = Vec::new();
            for result in reader.read_types(&location) {
                match result {
                    Ok(type_element) => types.push(type_element),
                    Err(e) => eprintln!("Skipping type: {e}"),
                }
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&types)?);
            } else {
                for type_element in &types {
                    println!(
                        "{} ({} members)",
                        type_element.name,
                        type_element.members.len()
                    );
                }
            }
        }
        RetrieveQuery::Type {
            name,
            location,
            json,
        } => {
            let location = location_or_default(location);
            let Some(type_element) = reader.find_type(&name, &location)? else {
                anyhow::bail!("Type '{name}' not found at {location}");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&type_element)?);
            } else {
                print_type(&type_element);
            }
        }
        RetrieveQuery::UserAgents { json } => {
            let mut user_agents: Vec<_> = reader.read_user_agents().into_iter().collect();
            user_agents.sort_by_key(|(key, _)| key.parse::<u64>().unwrap_or(u64::MAX));
            if json {
                let map: serde_json::Map<String, serde_json::Value> = user_agents
                    .into_iter()
                    .map(|(key, ua)| Ok((key, serde_json::to_value(ua)?)))
                    .collect::<Result<_, serde_json::Error>>()?;
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                for (key, ua) in &user_agents {
                    println!(
                        "{key}: {} ({} {} {})",
                        ua.description, ua.os, ua.platform, ua.version
                    );
                }
            }
        }
        RetrieveQuery::Locations => {
            for location in index.locations() {
                println!("{location}");
            }
        }
    }
    Ok(())
}
