use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::error::{DictationError, Result};
use crate::wordstore::{Entry, WordStore};
use crate::wrongbook::Wrongbook;
use crate::{debug_log, info_log};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every entry of the requested lists.
    Full,
    /// `count` entries drawn without replacement.
    Sample { count: i64 },
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Full => "full",
            Mode::Sample { .. } => "sample",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectionRequest {
    /// List numbers in the order the caller gave them.
    pub lists: Vec<u32>,
    pub mode: Mode,
    pub seed: Option<u64>,
    pub include_wrongbook: bool,
    /// Full mode only: shuffle the output instead of keeping canonical order.
    pub shuffle_full: bool,
}

impl SelectionRequest {
    pub fn new(lists: Vec<u32>, mode: Mode) -> Self {
        Self {
            lists,
            mode,
            seed: None,
            include_wrongbook: false,
            shuffle_full: true,
        }
    }
}

/// Parses `"1,5,7"` (ASCII or full-width commas). Tokens that are not plain
/// digits are ignored; duplicates keep their first position.
pub fn parse_list_numbers(text: &str) -> Result<Vec<u32>> {
    let mut lists = Vec::new();
    for token in text.split([',', '\u{ff0c}']).map(str::trim) {
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let Ok(list) = token.parse::<u32>() else {
            continue;
        };
        if !lists.contains(&list) {
            lists.push(list);
        }
    }
    if lists.is_empty() {
        return Err(DictationError::InvalidArgument(format!(
            "no valid list numbers in {text:?}"
        )));
    }
    Ok(lists)
}

/// A seeded generator, or one seeded from OS entropy when `seed` is `None`.
pub fn make_rng(seed: Option<u64>) -> ChaCha8Rng {
    let seed = seed.unwrap_or_else(|| {
        let drawn = rand::random();
        debug_log!("No seed given; drew {drawn}");
        drawn
    });
    ChaCha8Rng::seed_from_u64(seed)
}

pub fn shuffle_entries(mut entries: Vec<Entry>, rng: &mut ChaCha8Rng) -> Vec<Entry> {
    entries.shuffle(rng);
    entries
}

/// Draws exactly `count` distinct entries uniformly from `pool`, returned in
/// canonical order.
pub fn random_sample(pool: &[Entry], count: i64, rng: &mut ChaCha8Rng) -> Result<Vec<Entry>> {
    if count <= 0 {
        return Err(DictationError::InvalidArgument(format!(
            "sample count must be positive, got {count}"
        )));
    }
    let requested = usize::try_from(count).unwrap_or(usize::MAX);
    if requested > pool.len() {
        return Err(DictationError::InsufficientData {
            requested,
            available: pool.len(),
        });
    }
    let mut drawn: Vec<Entry> = pool.choose_multiple(rng, requested).cloned().collect();
    drawn.sort_by_key(|e| e.key);
    Ok(drawn)
}

/// Unions `extra` into `selection` by identity key and sorts canonically.
/// Entries already in `selection` are kept as they are.
pub fn merge_entries(selection: Vec<Entry>, extra: Vec<Entry>) -> Vec<Entry> {
    let mut merged: BTreeMap<_, Entry> = selection.into_iter().map(|e| (e.key, e)).collect();
    for entry in extra {
        merged.entry(entry.key).or_insert(entry);
    }
    merged.into_values().collect()
}

/// Computes the ordered entries for one generate request.
///
/// `wrongbook` is consulted only when the request asks for it; callers that
/// do not include it need not load one.
pub fn select(
    store: &WordStore,
    request: &SelectionRequest,
    wrongbook: Option<&Wrongbook>,
) -> Result<Vec<Entry>> {
    if request.lists.is_empty() {
        return Err(DictationError::InvalidArgument(
            "no list numbers requested".to_string(),
        ));
    }
    let mut rng = make_rng(request.seed);
    let pool = store.filter_by_lists(&request.lists);
    debug_log!("{} entries in lists {:?}", pool.len(), request.lists);

    let base = match request.mode {
        Mode::Sample { count } => random_sample(&pool, count, &mut rng)?,
        Mode::Full if request.shuffle_full => shuffle_entries(pool, &mut rng),
        Mode::Full => pool,
    };

    if !request.include_wrongbook {
        return Ok(base);
    }
    let extra = wrongbook.map(|book| book.resolve(store)).unwrap_or_default();
    if extra.is_empty() {
        debug_log!("Wrongbook contributed no entries; keeping the base selection order");
        return Ok(base);
    }
    let base_len = base.len();
    let merged = merge_entries(base, extra);
    info_log!(
        "Merged wrongbook: {} base entries, {} after merge",
        base_len,
        merged.len()
    );
    Ok(merged)
}

/// `"<list>-<index>. <translation> (<pos>) — <word>"`
pub fn answer_row(entry: &Entry) -> String {
    format!(
        "{}. {} ({}) \u{2014} {}",
        entry.key, entry.translation, entry.part_of_speech, entry.word
    )
}

/// `"<translation> (<pos>)"`
pub fn dictation_row(entry: &Entry) -> String {
    format!("{} ({})", entry.translation, entry.part_of_speech)
}

pub fn answer_rows(entries: &[Entry]) -> Vec<String> {
    entries.iter().map(answer_row).collect()
}

pub fn dictation_rows(entries: &[Entry]) -> Vec<String> {
    entries.iter().map(dictation_row).collect()
}
