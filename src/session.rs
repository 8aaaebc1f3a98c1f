use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::reference::{EntryKey, parse_reference};
use crate::wordstore::WordStore;
use crate::wrongbook::Wrongbook;
use crate::{debug_log, info_log};

const END_WORDS: [&str; 3] = ["q", "quit", "exit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditInput {
    Line(String),
    End,
}

/// Result of one edit, reported before the next input is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Added(EntryKey),
    AlreadyPresent(EntryKey),
    Removed(EntryKey),
    NotInWrongbook(EntryKey),
    FormatError(String),
    NotFound(EntryKey),
}

impl EditOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, EditOutcome::Added(_) | EditOutcome::Removed(_))
    }
}

/// Front end for an interactive add/remove session.
pub trait EditInterface {
    fn display_banner(&mut self, action: EditAction, count: usize);
    fn read_input(&mut self) -> EditInput;
    fn report(&mut self, outcome: &EditOutcome);
    fn display_summary(&mut self, count: usize, path: &Path);
}

/// Empty input, `q`, `quit` or `exit` ends a session.
pub fn is_end_sentinel(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || END_WORDS.iter().any(|w| line.eq_ignore_ascii_case(w))
}

/// Applies one line of input to `book`. Removal does not require the
/// reference to exist in `store`, so dangling references can be cleared.
pub fn apply_edit(
    action: EditAction,
    store: &WordStore,
    book: &mut Wrongbook,
    line: &str,
) -> EditOutcome {
    let Some(key) = parse_reference(line) else {
        return EditOutcome::FormatError(line.trim().to_string());
    };
    match action {
        EditAction::Add if !store.contains(key) => EditOutcome::NotFound(key),
        EditAction::Add if book.add(key) => EditOutcome::Added(key),
        EditAction::Add => EditOutcome::AlreadyPresent(key),
        EditAction::Remove if book.remove(key) => EditOutcome::Removed(key),
        EditAction::Remove if !store.contains(key) => EditOutcome::NotFound(key),
        EditAction::Remove => EditOutcome::NotInWrongbook(key),
    }
}

/// A bounded edit loop over the wrongbook stored at `path`.
pub struct EditSession<'a> {
    store: &'a WordStore,
    path: PathBuf,
    flush_after_each_edit: bool,
}

impl<'a> EditSession<'a> {
    pub fn new<P: AsRef<Path>>(store: &'a WordStore, path: P) -> Self {
        Self {
            store,
            path: path.as_ref().to_path_buf(),
            flush_after_each_edit: true,
        }
    }

    pub fn flush_after_each_edit(mut self, enabled: bool) -> Self {
        self.flush_after_each_edit = enabled;
        self
    }

    /// Runs until the interface yields [`EditInput::End`], then saves and
    /// returns the final wrongbook.
    pub fn run<I: EditInterface + ?Sized>(
        &self,
        action: EditAction,
        interface: &mut I,
    ) -> Result<Wrongbook> {
        let mut book = Wrongbook::load(&self.path)?;
        interface.display_banner(action, book.len());
        info_log!("Starting {:?} session on {}", action, self.path.display());

        loop {
            let line = match interface.read_input() {
                EditInput::End => break,
                EditInput::Line(line) if is_end_sentinel(&line) => break,
                EditInput::Line(line) => line,
            };
            let outcome = apply_edit(action, self.store, &mut book, &line);
            debug_log!("{:?} -> {:?}", line, outcome);
            if outcome.changed() && self.flush_after_each_edit {
                book.save(&self.path)?;
            }
            interface.report(&outcome);
        }

        book.save(&self.path)?;
        interface.display_summary(book.len(), &self.path);
        Ok(book)
    }
}
