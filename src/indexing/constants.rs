//! Fixed strings of the flat encoding. Changing any of them invalidates
//! every index written before.

use crate::types::Location;

/// Separates the top-level fields of a record.
pub const DELIMITER: &str = "\0";

/// Separates repeated keys inside one field (user-agent key lists).
pub const SUB_DELIMITER: &str = "/";

/// Separates the parts of a parameter or return-type tuple and the names
/// of a type list.
pub const LIST_DELIMITER: &str = ",";

/// Key meaning "no record"; never produced by a sequence counter.
pub const NO_ENTRY: &str = "-1";

/// Location of built-in platform metadata and shared user-agent records.
pub const METADATA_LOCATION: &str = "/metadata";

pub fn metadata_location() -> Location {
    Location::from(METADATA_LOCATION)
}
