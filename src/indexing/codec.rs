//! Join/split primitives for the delimiter tiers.
//!
//! Nothing is escaped. A value that contains a delimiter is mis-split on
//! the way back; producers keep delimiters out of metadata text.

use crate::types::Category;
use crate::{IndexError, IndexResult};

/// Concatenate items with `delimiter` between them. No trailing delimiter.
pub fn join<I, S>(delimiter: &str, items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            joined.push_str(delimiter);
        }
        joined.push_str(item.as_ref());
    }
    joined
}

/// Inverse of [`join`] for list fields: an empty value is an empty list.
pub fn split<'a>(delimiter: &str, value: &'a str) -> Vec<&'a str> {
    if value.is_empty() {
        Vec::new()
    } else {
        value.split(delimiter).collect()
    }
}

/// Split a record value into exactly `count` fields.
pub fn split_fields<'a>(
    category: Category,
    delimiter: &str,
    value: &'a str,
    count: usize,
) -> IndexResult<Vec<&'a str>> {
    let fields: Vec<&str> = value.split(delimiter).collect();
    if fields.len() != count {
        return Err(IndexError::malformed(
            category,
            value,
            format!("expected {count} fields, found {}", fields.len()),
        ));
    }
    Ok(fields)
}
