use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::{AppConfig, SelectionConfig};
use crate::error::Result;
use crate::export::{WrongbookExport, export_wrongbook, generate};
use crate::render::PdfRenderer;
use crate::selector::{Mode, SelectionRequest, parse_list_numbers};
use crate::session::{EditAction, EditInput, EditInterface, EditOutcome, EditSession};
use crate::wordstore::WordStore;
use crate::{debug_log, info_log};

/// Dictation sheet generator CLI options
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Vocabulary table: .xlsx, .xls, .ods, .csv, .tsv or .txt, no header row
    #[arg(long = "source", visible_alias = "excel")]
    pub source: PathBuf,

    /// Wrongbook storage file
    #[arg(long = "wb-file")]
    pub wrongbook: Option<PathBuf>,

    /// Config file (defaults to <config dir>/dictation/config.toml)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate answer and dictation PDFs (full or sample)
    Generate(GenerateArgs),
    /// Manage or output the wrongbook
    #[command(name = "wb")]
    Wrongbook(WrongbookArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[arg(long, value_enum)]
    pub mode: ModeArg,

    /// Comma-separated list numbers, e.g. 1,3,5
    #[arg(long)]
    pub lists: String,

    /// Number of words to sample (sample mode)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub count: i64,

    /// Random seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output directory
    #[arg(long, default_value = "output")]
    pub output: PathBuf,

    /// Include wrongbook entries in the result
    #[arg(long = "include-wb")]
    pub include_wrongbook: bool,

    /// Keep full-mode output in list/index order instead of shuffling
    #[arg(long = "keep-order")]
    pub keep_order: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Full,
    Sample,
}

#[derive(Args, Debug)]
pub struct WrongbookArgs {
    #[arg(value_enum)]
    pub action: WrongbookAction,

    /// Output directory when action=output
    #[arg(long, default_value = "output")]
    pub output: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrongbookAction {
    Add,
    Remove,
    Output,
}

#[must_use]
pub fn parse_cli() -> Cli {
    Cli::parse()
}

impl GenerateArgs {
    pub fn to_request(&self, selection: &SelectionConfig) -> Result<SelectionRequest> {
        let lists = parse_list_numbers(&self.lists)?;
        let mode = match self.mode {
            ModeArg::Full => Mode::Full,
            ModeArg::Sample => Mode::Sample { count: self.count },
        };
        Ok(SelectionRequest {
            lists,
            mode,
            seed: self.seed,
            include_wrongbook: self.include_wrongbook,
            shuffle_full: selection.shuffle_full && !self.keep_order,
        })
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => Ok(AppConfig::load()),
    }
}

/// Executes one command. Interactive wrongbook edits read from `input`.
pub fn run<R: BufRead>(cli: &Cli, input: R) -> Result<()> {
    let config = load_config(cli)?;
    let wrongbook_path = config.wrongbook_path(cli.wrongbook.as_deref());
    let store = WordStore::load_from_path(&cli.source)?;
    info_log!("Loaded {} entries from {}", store.len(), cli.source.display());

    match &cli.command {
        Command::Generate(args) => {
            let request = args.to_request(&config.selection)?;
            debug_log!("Generate request: {:?}", request);
            let renderer = PdfRenderer::new(config.render.clone());
            let paths = generate(&store, &request, &wrongbook_path, &renderer, &args.output)?;
            println!(
                "Generated:\n  {}\n  {}",
                paths.answer.display(),
                paths.dictation.display()
            );
        }
        Command::Wrongbook(args) => match args.action {
            WrongbookAction::Add | WrongbookAction::Remove => {
                let action = if args.action == WrongbookAction::Add {
                    EditAction::Add
                } else {
                    EditAction::Remove
                };
                let mut interface = CliInterface::new(input);
                EditSession::new(&store, &wrongbook_path)
                    .flush_after_each_edit(config.wrongbook.flush_after_each_edit)
                    .run(action, &mut interface)?;
            }
            WrongbookAction::Output => {
                let renderer = PdfRenderer::new(config.render.clone());
                match export_wrongbook(&store, &wrongbook_path, &renderer, &args.output)? {
                    WrongbookExport::Empty => println!("Wrongbook is empty."),
                    WrongbookExport::Unresolved => {
                        println!("No wrongbook entries were found in the vocabulary.")
                    }
                    WrongbookExport::Written(paths) => println!(
                        "Wrote:\n  {}\n  {}",
                        paths.answer.display(),
                        paths.dictation.display()
                    ),
                }
            }
        },
    }
    Ok(())
}

// UI Input/Output functions

pub fn display_banner(action: EditAction, count: usize) {
    let verb = match action {
        EditAction::Add => "add",
        EditAction::Remove => "remove",
    };
    println!(
        "Wrongbook has {count} entries. Enter references to {verb} (e.g. 10-1); empty line or 'q' to finish."
    );
}

pub fn read_input<R: BufRead>(reader: &mut R) -> EditInput {
    print!("> ");
    let _ = io::stdout().flush();
    let mut input = String::new();
    match reader.read_line(&mut input) {
        Ok(0) => EditInput::End,
        Ok(_) => EditInput::Line(input.trim().to_string()),
        Err(e) => {
            log::warn!("Failed to read input: {e}");
            EditInput::End
        }
    }
}

pub fn outcome_message(outcome: &EditOutcome) -> String {
    match outcome {
        EditOutcome::Added(key) => format!("Added {key}"),
        EditOutcome::AlreadyPresent(key) => format!("{key} is already in the wrongbook"),
        EditOutcome::Removed(key) => format!("Removed {key}"),
        EditOutcome::NotInWrongbook(key) => format!("{key} is not in the wrongbook"),
        EditOutcome::FormatError(text) => {
            format!("Invalid reference {text:?}; expected ListIndex-WordIndex (e.g. 10-1)")
        }
        EditOutcome::NotFound(key) => format!("{key} does not exist in the vocabulary"),
    }
}

pub fn display_summary(count: usize, path: &Path) {
    println!("Saved {}: {count} entries.", path.display());
}

/// CLI implementation of the EditInterface trait
/// This struct wraps a BufRead reader and implements the session interface for CLI interaction
pub struct CliInterface<R: BufRead> {
    reader: R,
}

impl<R: BufRead> CliInterface<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> EditInterface for CliInterface<R> {
    fn display_banner(&mut self, action: EditAction, count: usize) {
        display_banner(action, count);
    }

    fn read_input(&mut self) -> EditInput {
        read_input(&mut self.reader)
    }

    fn report(&mut self, outcome: &EditOutcome) {
        println!("{}", outcome_message(outcome));
    }

    fn display_summary(&mut self, count: usize, path: &Path) {
        display_summary(count, path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::EntryKey;
    use std::io::Cursor;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parse_generate_sample() {
        let cli = parse(&[
            "dictation", "--excel", "words.xlsx", "generate", "--mode", "sample", "--lists",
            "2,3", "--count", "30", "--seed", "42", "--include-wb",
        ]);
        assert_eq!(cli.source, PathBuf::from("words.xlsx"));
        assert!(cli.wrongbook.is_none());
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.mode, ModeArg::Sample);
                assert_eq!(args.count, 30);
                assert_eq!(args.seed, Some(42));
                assert!(args.include_wrongbook);
                assert_eq!(args.output, PathBuf::from("output"));
                let request = args.to_request(&SelectionConfig::default()).unwrap();
                assert_eq!(request.lists, vec![2, 3]);
                assert_eq!(request.mode, Mode::Sample { count: 30 });
            }
            other => panic!("Expected Generate, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_negative_count_reaches_validation() {
        let cli = parse(&[
            "dictation", "--source", "w.csv", "generate", "--mode", "sample", "--lists", "1",
            "--count", "-2",
        ]);
        let Command::Generate(args) = cli.command else {
            panic!("Expected Generate");
        };
        assert_eq!(args.count, -2);
    }

    #[test]
    fn test_keep_order_disables_shuffle() {
        let cli = parse(&[
            "dictation", "--source", "w.csv", "generate", "--mode", "full", "--lists", "1",
            "--keep-order",
        ]);
        let Command::Generate(args) = cli.command else {
            panic!("Expected Generate");
        };
        let request = args.to_request(&SelectionConfig::default()).unwrap();
        assert!(!request.shuffle_full);
    }

    #[test]
    fn test_parse_wrongbook_actions() {
        let cli = parse(&[
            "dictation", "--source", "w.tsv", "--wb-file", "mine.txt", "wb", "remove",
        ]);
        assert_eq!(cli.wrongbook, Some(PathBuf::from("mine.txt")));
        match cli.command {
            Command::Wrongbook(args) => assert_eq!(args.action, WrongbookAction::Remove),
            other => panic!("Expected Wrongbook, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        assert!(
            Cli::try_parse_from([
                "dictation", "--source", "w.tsv", "generate", "--mode", "random", "--lists", "1",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_read_input_variants() {
        let mut reader = Cursor::new("  10-1 \n\n");
        assert_eq!(read_input(&mut reader), EditInput::Line("10-1".to_string()));
        assert_eq!(read_input(&mut reader), EditInput::Line(String::new()));
        assert_eq!(read_input(&mut reader), EditInput::End);
    }

    #[test]
    fn test_outcome_messages() {
        let key = EntryKey::new(10, 1);
        assert_eq!(outcome_message(&EditOutcome::Added(key)), "Added 10-1");
        assert_eq!(
            outcome_message(&EditOutcome::NotFound(key)),
            "10-1 does not exist in the vocabulary"
        );
    }
}
