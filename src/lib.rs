// Library interface for dictation-sheets
// This allows integration tests to access internal modules

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod reference;
pub mod render;
pub mod selector;
pub mod session;
pub mod wordstore;
pub mod wrongbook;

// Re-export commonly used items for easier testing
pub use error::{DictationError, Result};
pub use export::{ExportPaths, WrongbookExport, export_wrongbook, generate};
pub use reference::{EntryKey, format_reference, parse_reference};
pub use render::{PdfRenderer, RenderConfig, Renderer};
pub use selector::{Mode, SelectionRequest, parse_list_numbers, select};
pub use session::{EditAction, EditSession};
pub use wordstore::{Entry, WordStore};
pub use wrongbook::Wrongbook;
