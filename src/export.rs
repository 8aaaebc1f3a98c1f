//! One selection-and-render cycle: pick entries, project them into answer
//! and dictation rows, and write both sheets into an output directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::info_log;
use crate::render::Renderer;
use crate::selector::{Mode, SelectionRequest, answer_rows, dictation_rows, select};
use crate::wordstore::{Entry, WordStore};
use crate::wrongbook::Wrongbook;

const WRONGBOOK_BASE_NAME: &str = "wrongbook";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub answer: PathBuf,
    pub dictation: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrongbookExport {
    /// The wrongbook has no references; nothing written.
    Empty,
    /// None of the references exist in the vocabulary; nothing written.
    Unresolved,
    Written(ExportPaths),
}

/// `"sample_2-3"` for a sample of lists 2 and 3.
pub fn base_name(mode: Mode, lists: &[u32]) -> String {
    let lists: Vec<String> = lists.iter().map(ToString::to_string).collect();
    format!("{}_{}", mode.name(), lists.join("-"))
}

/// Renders the answer and dictation sheets for `entries` as
/// `<base>_answer.pdf` and `<base>_dictation.pdf`.
pub fn write_sheets<R: Renderer + ?Sized>(
    renderer: &R,
    entries: &[Entry],
    output_dir: &Path,
    base: &str,
) -> Result<ExportPaths> {
    fs::create_dir_all(output_dir)?;
    let paths = ExportPaths {
        answer: output_dir.join(format!("{base}_answer.pdf")),
        dictation: output_dir.join(format!("{base}_dictation.pdf")),
    };
    renderer.render(&answer_rows(entries), &paths.answer)?;
    renderer.render(&dictation_rows(entries), &paths.dictation)?;
    Ok(paths)
}

/// Selects entries for `request` and writes both sheets. The wrongbook at
/// `wrongbook_path` is read only when the request includes it.
pub fn generate<R: Renderer + ?Sized>(
    store: &WordStore,
    request: &SelectionRequest,
    wrongbook_path: &Path,
    renderer: &R,
    output_dir: &Path,
) -> Result<ExportPaths> {
    let wrongbook = if request.include_wrongbook {
        Some(Wrongbook::load(wrongbook_path)?)
    } else {
        None
    };
    let entries = select(store, request, wrongbook.as_ref())?;
    info_log!(
        "Selected {} entries ({} mode) from lists {:?}",
        entries.len(),
        request.mode.name(),
        request.lists
    );
    write_sheets(
        renderer,
        &entries,
        output_dir,
        &base_name(request.mode, &request.lists),
    )
}

/// Writes the resolvable wrongbook entries, in canonical order, as
/// `wrongbook_answer.pdf` and `wrongbook_dictation.pdf`.
pub fn export_wrongbook<R: Renderer + ?Sized>(
    store: &WordStore,
    wrongbook_path: &Path,
    renderer: &R,
    output_dir: &Path,
) -> Result<WrongbookExport> {
    let book = Wrongbook::load(wrongbook_path)?;
    if book.is_empty() {
        return Ok(WrongbookExport::Empty);
    }
    let entries = book.resolve(store);
    if entries.is_empty() {
        return Ok(WrongbookExport::Unresolved);
    }
    let paths = write_sheets(renderer, &entries, output_dir, WRONGBOOK_BASE_NAME)?;
    Ok(WrongbookExport::Written(paths))
}
