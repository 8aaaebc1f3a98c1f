//! The compact `"<list>-<index>"` key that names one vocabulary entry.
//!
//! The same text serves as the lookup key into the word store and as one line
//! of the wrongbook file. Parsing is lenient about the separator (a hyphen or
//! an en-dash) and surrounding whitespace; formatting always emits a plain
//! hyphen so that stored references are normalized.

use std::fmt;

const SEPARATORS: [char; 2] = ['-', '\u{2013}'];

/// Identity of an entry: its list number and its position within that list.
///
/// Field order gives the canonical ordering: by list, then by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryKey {
    pub list: u32,
    pub index: u32,
}

impl EntryKey {
    pub const fn new(list: u32, index: u32) -> Self {
        Self { list, index }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_reference(self.list, self.index))
    }
}

fn parse_number(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parses `"10-1"` or `"10–1"` into a key. Returns `None` for any other shape.
pub fn parse_reference(text: &str) -> Option<EntryKey> {
    let (list, index) = text.trim().split_once(SEPARATORS)?;
    Some(EntryKey::new(parse_number(list)?, parse_number(index)?))
}

pub fn format_reference(list: u32, index: u32) -> String {
    format!("{list}-{index}")
}
