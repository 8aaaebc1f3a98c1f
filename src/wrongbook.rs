//! The wrongbook: a persisted set of references to entries that were missed.
//!
//! On disk it is plain UTF-8 text, one reference per line, rewritten in
//! canonical `(list, index)` order on every save so repeated runs produce
//! stable diffs. Lines that cannot be parsed (the file is meant to be
//! hand-editable) are carried along untouched and written after the sorted
//! references; they never take part in resolution.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::Result;
use crate::reference::{EntryKey, parse_reference};
use crate::wordstore::{Entry, WordStore};
use crate::{debug_log, info_log};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wrongbook {
    refs: BTreeSet<EntryKey>,
    unparsable: BTreeSet<String>,
}

impl Wrongbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a wrongbook from raw lines, trimming and dropping blanks.
    pub fn from_lines<'a, I: IntoIterator<Item = &'a str>>(lines: I) -> Self {
        let mut book = Self::new();
        for line in lines.into_iter().map(str::trim).filter(|l| !l.is_empty()) {
            match parse_reference(line) {
                Some(key) => {
                    book.refs.insert(key);
                }
                None => {
                    log::warn!("Unparsable wrongbook reference {line:?}; skipping it");
                    book.unparsable.insert(line.to_string());
                }
            }
        }
        book
    }

    /// Reads the wrongbook at `path`. A missing file is an empty wrongbook.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => {
                let book = Self::from_lines(contents.lines());
                info_log!("Loaded {} wrongbook references from {}", book.len(), path.display());
                Ok(book)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug_log!("No wrongbook at {}; starting empty", path.display());
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrites `path` with one reference per line in canonical order.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let mut contents = String::new();
        for line in self.lines() {
            contents.push_str(&line);
            contents.push('\n');
        }
        fs::write(path, contents)?;
        debug_log!("Saved {} wrongbook references to {}", self.len(), path.display());
        Ok(())
    }

    /// The lines `save` would write, in order.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.refs
            .iter()
            .map(ToString::to_string)
            .chain(self.unparsable.iter().cloned())
    }

    /// Returns `true` if the reference was not already present.
    pub fn add(&mut self, key: EntryKey) -> bool {
        self.refs.insert(key)
    }

    /// Returns `true` if the reference was present. Removing an absent one is a no-op.
    pub fn remove(&mut self, key: EntryKey) -> bool {
        self.refs.remove(&key)
    }

    pub fn contains(&self, key: EntryKey) -> bool {
        self.refs.contains(&key)
    }

    /// Number of valid references; unparsable lines are not counted.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Entries for every reference present in `store`, in canonical order.
    /// References with no matching entry are skipped with a warning.
    pub fn resolve(&self, store: &WordStore) -> Vec<Entry> {
        self.refs
            .iter()
            .filter_map(|&key| {
                let entry = store.lookup(key);
                if entry.is_none() {
                    log::warn!("Wrongbook reference {key} has no vocabulary entry; skipping it");
                }
                entry.cloned()
            })
            .collect()
    }
}
