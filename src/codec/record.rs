//! The `Tag: value` text record syntax shared by requirement and constraint records.
//!
//! ```text
//! # comment lines attach to the next entry
//! Name: Speed
//! Description: The system must be fast.
//!   Indented lines continue the previous entry.
//! Depends on: R1 R2
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::ReqGraphError,
    properties::{FieldMap, RecordEntry},
};

static TAG_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^\s#:][^:]*):[ \t]?(.*)$").expect("tag line pattern is a valid regex")
});

/// Parse record text into its entries.
///
/// Fails on a line that neither starts a new entry, continues one, nor is a comment, and on a
/// tag that appears twice.
pub fn parse_record(content: &str) -> Result<FieldMap, ReqGraphError> {
    let mut fields = FieldMap::new();
    let mut comment: Vec<&str> = Vec::new();
    let mut current: Option<(String, RecordEntry)> = None;

    for (line_no, line) in content.lines().enumerate() {
        if let Some(text) = line.strip_prefix('#') {
            comment.push(text.trim());
            continue;
        }
        if line.trim().is_empty() || line.starts_with([' ', '\t']) {
            match current.as_mut() {
                Some((_, entry)) => {
                    entry.content.push('\n');
                    entry.content.push_str(line.trim());
                }
                None if line.trim().is_empty() => {}
                None => {
                    return Err(ReqGraphError::Serialization(format!(
                        "line {}: continuation line without a preceding tag",
                        line_no + 1
                    )))
                }
            }
            continue;
        }
        let Some(caps) = TAG_LINE.captures(line) else {
            return Err(ReqGraphError::Serialization(format!(
                "line {}: expected 'Tag: value', found '{}'",
                line_no + 1,
                line
            )));
        };
        if let Some((tag, entry)) = current.take() {
            insert_entry(&mut fields, tag, entry)?;
        }
        let entry = RecordEntry {
            content: caps[2].trim_end().to_string(),
            comment: comment.join("\n"),
        };
        comment.clear();
        current = Some((caps[1].trim().to_string(), entry));
    }
    if let Some((tag, entry)) = current.take() {
        insert_entry(&mut fields, tag, entry)?;
    }
    Ok(fields)
}

fn insert_entry(fields: &mut FieldMap, tag: String, mut entry: RecordEntry) -> Result<(), ReqGraphError> {
    let trimmed_len = entry.content.trim_end().len();
    entry.content.truncate(trimmed_len);
    if fields.contains_key(&tag) {
        return Err(ReqGraphError::Serialization(format!(
            "tag '{tag}' is given more than once"
        )));
    }
    fields.insert(tag, entry);
    Ok(())
}
