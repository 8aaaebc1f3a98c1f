use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use calamine::Reader;

use crate::debug_log;
use crate::error::{DictationError, Result};
use crate::reference::{EntryKey, parse_reference};

const COLUMNS: usize = 4;
const IDENTIFIER_PREFIX: &str = "list";

/// One vocabulary item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: EntryKey,
    pub translation: String,
    pub part_of_speech: String,
    pub word: String,
}

impl Entry {
    pub fn new(key: EntryKey, translation: &str, part_of_speech: &str, word: &str) -> Self {
        Self {
            key,
            translation: translation.to_string(),
            part_of_speech: part_of_speech.to_string(),
            word: word.to_string(),
        }
    }

    pub fn list(&self) -> u32 {
        self.key.list
    }

    pub fn index(&self) -> u32 {
        self.key.index
    }
}

/// Anything that yields the raw cells of a headerless four-column table:
/// identifier, translation, part of speech, word.
pub trait RowSource {
    fn read_rows(&mut self) -> Result<Vec<Vec<String>>>;
}

impl RowSource for Vec<Vec<String>> {
    fn read_rows(&mut self) -> Result<Vec<Vec<String>>> {
        Ok(std::mem::take(self))
    }
}

/// First worksheet of an `.xlsx`/`.xls`/`.ods` workbook.
pub struct WorkbookSource {
    path: PathBuf,
}

impl WorkbookSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RowSource for WorkbookSource {
    fn read_rows(&mut self) -> Result<Vec<Vec<String>>> {
        let mut workbook = calamine::open_workbook_auto(&self.path)?;
        let range = workbook.worksheet_range_at(0).ok_or_else(|| {
            DictationError::InvalidArgument(format!(
                "workbook {} has no worksheets",
                self.path.display()
            ))
        })??;
        // The range starts at the first used row; pad so row numbers match the sheet.
        let leading = range.start().map_or(0, |(row, _)| row as usize);
        let mut rows: Vec<Vec<String>> = vec![Vec::new(); leading];
        rows.extend(
            range
                .rows()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect()),
        );
        Ok(rows)
    }
}

/// UTF-8 text with one row per line and a single-character delimiter.
pub struct DelimitedSource {
    path: PathBuf,
    delimiter: char,
}

impl DelimitedSource {
    pub fn new<P: AsRef<Path>>(path: P, delimiter: char) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            delimiter,
        }
    }
}

impl RowSource for DelimitedSource {
    fn read_rows(&mut self) -> Result<Vec<Vec<String>>> {
        let data = fs::read_to_string(&self.path)?;
        Ok(split_delimited(&data, self.delimiter))
    }
}

fn split_delimited(data: &str, delimiter: char) -> Vec<Vec<String>> {
    let data = data.strip_prefix('\u{feff}').unwrap_or(data);
    data.lines()
        .map(|line| {
            line.trim_end_matches('\r')
                .splitn(COLUMNS, delimiter)
                .map(str::to_string)
                .collect()
        })
        .collect()
}

/// Picks a row source from the file extension.
pub fn open_source<P: AsRef<Path>>(path: P) -> Result<Box<dyn RowSource>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Box::new(WorkbookSource::new(path))),
        "csv" => Ok(Box::new(DelimitedSource::new(path, ','))),
        "tsv" | "txt" => Ok(Box::new(DelimitedSource::new(path, '\t'))),
        _ => Err(DictationError::InvalidArgument(format!(
            "unsupported vocabulary source {} (expected .xlsx, .xls, .ods, .csv, .tsv or .txt)",
            path.display()
        ))),
    }
}

/// Parses `List10-1` (case-insensitive prefix, optional space) into a key.
pub fn parse_identifier(raw: &str) -> Option<EntryKey> {
    let trimmed = raw.trim();
    let prefix = trimmed.get(..IDENTIFIER_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(IDENTIFIER_PREFIX) {
        return None;
    }
    parse_reference(&trimmed[IDENTIFIER_PREFIX.len()..])
}

fn cell(row: &[String], column: usize) -> &str {
    row.get(column).map(|c| c.trim()).unwrap_or("")
}

fn parse_row(row_number: usize, row: &[String]) -> Result<Option<Entry>> {
    if row.iter().all(|c| c.trim().is_empty()) {
        return Ok(None);
    }
    let identifier = cell(row, 0);
    if row.len() < COLUMNS {
        return Err(DictationError::MalformedRow {
            row: row_number,
            identifier: identifier.to_string(),
            reason: format!("expected {COLUMNS} columns, found {}", row.len()),
        });
    }
    let key = parse_identifier(identifier).ok_or_else(|| DictationError::MalformedRow {
        row: row_number,
        identifier: identifier.to_string(),
        reason: "identifier does not match List<N>-<M>".to_string(),
    })?;
    Ok(Some(Entry::new(key, cell(row, 1), cell(row, 2), cell(row, 3))))
}

/// Vocabulary entries indexed by identity key, iterated in canonical order.
#[derive(Debug, Clone, Default)]
pub struct WordStore {
    entries: BTreeMap<EntryKey, Entry>,
}

impl WordStore {
    pub fn from_rows<I, R>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[String]>,
    {
        let mut entries = BTreeMap::new();
        for (i, row) in rows.into_iter().enumerate() {
            let Some(entry) = parse_row(i + 1, row.as_ref())? else {
                continue;
            };
            if entries.contains_key(&entry.key) {
                log::warn!(
                    "Duplicate vocabulary key {} at row {}; keeping the first occurrence",
                    entry.key,
                    i + 1
                );
                continue;
            }
            entries.insert(entry.key, entry);
        }
        debug_log!("Indexed {} vocabulary entries", entries.len());
        Ok(Self { entries })
    }

    pub fn load<S: RowSource + ?Sized>(source: &mut S) -> Result<Self> {
        Self::from_rows(source.read_rows()?)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut source = open_source(path)?;
        Self::load(source.as_mut())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn lookup(&self, key: EntryKey) -> Option<&Entry> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: EntryKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Entries whose list number is in `lists`, in canonical order.
    pub fn filter_by_lists(&self, lists: &[u32]) -> Vec<Entry> {
        let wanted: BTreeSet<u32> = lists.iter().copied().collect();
        wanted
            .into_iter()
            .flat_map(|list| {
                self.entries
                    .range(EntryKey::new(list, 0)..=EntryKey::new(list, u32::MAX))
                    .map(|(_, entry)| entry.clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sample_store() -> WordStore {
        WordStore::from_rows(vec![
            row(&["List2-1", "狗", "n.", "dog"]),
            row(&["List1-2", "跑", "v.", "run"]),
            row(&["List1-1", "苹果", "n.", "apple"]),
            row(&["List3-1", "快的", "adj.", "fast"]),
            row(&["List1-10", "书", "n.", "book"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_parse_identifier_variants() {
        assert_eq!(parse_identifier("List10-1"), Some(EntryKey::new(10, 1)));
        assert_eq!(parse_identifier(" list 3-4 "), Some(EntryKey::new(3, 4)));
        assert_eq!(parse_identifier("LIST5\u{2013}6"), Some(EntryKey::new(5, 6)));
        assert_eq!(parse_identifier("10-1"), None);
        assert_eq!(parse_identifier("List-1"), None);
        assert_eq!(parse_identifier("Lista1-1"), None);
        assert_eq!(parse_identifier("单词1-1"), None);
    }

    #[test]
    fn test_from_rows_indexes_in_canonical_order() {
        let store = sample_store();
        assert_eq!(store.len(), 5);
        let keys: Vec<String> = store.entries().map(|e| e.key.to_string()).collect();
        assert_eq!(keys, vec!["1-1", "1-2", "1-10", "2-1", "3-1"]);
    }

    #[test]
    fn test_malformed_identifier_reports_row() {
        let err = WordStore::from_rows(vec![
            row(&["List1-1", "苹果", "n.", "apple"]),
            row(&["Word1", "跑", "v.", "run"]),
        ])
        .unwrap_err();
        match err {
            DictationError::MalformedRow {
                row, identifier, ..
            } => {
                assert_eq!(row, 2);
                assert_eq!(identifier, "Word1");
            }
            other => panic!("Expected MalformedRow, got {other:?}"),
        }
    }

    #[test]
    fn test_short_row_is_malformed() {
        let err = WordStore::from_rows(vec![row(&["List1-1", "苹果"])]).unwrap_err();
        assert!(matches!(err, DictationError::MalformedRow { row: 1, .. }));
    }

    #[test]
    fn test_load_from_in_memory_source() {
        let mut rows = vec![row(&["List4-2", "猫", "n.", "cat"])];
        let store = WordStore::load(&mut rows).unwrap();
        assert!(store.contains(EntryKey::new(4, 2)));
        assert!(rows.is_empty());
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let store = WordStore::from_rows(vec![
            row(&["", "", "", ""]),
            row(&["List1-1", "苹果", "n.", "apple"]),
            row(&[""]),
        ])
        .unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_key_keeps_first() {
        let store = WordStore::from_rows(vec![
            row(&["List1-1", "苹果", "n.", "apple"]),
            row(&["List1-1", "梨", "n.", "pear"]),
        ])
        .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup(EntryKey::new(1, 1)).unwrap().word, "apple");
    }

    #[test]
    fn test_filter_by_lists_is_canonical_subset() {
        let store = sample_store();
        let filtered = store.filter_by_lists(&[3, 1]);
        let keys: Vec<String> = filtered.iter().map(|e| e.key.to_string()).collect();
        assert_eq!(keys, vec!["1-1", "1-2", "1-10", "3-1"]);
        assert!(filtered.iter().all(|e| store.lookup(e.key) == Some(e)));
    }

    #[test]
    fn test_filter_by_unknown_list_is_empty() {
        assert!(sample_store().filter_by_lists(&[42]).is_empty());
    }

    #[test]
    fn test_lookup() {
        let store = sample_store();
        let entry = store.lookup(EntryKey::new(2, 1)).unwrap();
        assert_eq!(entry.translation, "狗");
        assert_eq!(entry.part_of_speech, "n.");
        assert_eq!(entry.word, "dog");
        assert!(store.lookup(EntryKey::new(5, 9)).is_none());
    }

    #[test]
    fn test_load_delimited_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.tsv");
        {
            let mut file = fs::File::create(&path).unwrap();
            writeln!(file, "List1-1\t苹果\tn.\tapple").unwrap();
            writeln!(file, "List1-2\t跑\tv.\trun\r").unwrap();
            writeln!(file).unwrap();
        }
        let store = WordStore::load_from_path(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup(EntryKey::new(1, 2)).unwrap().word, "run");
    }

    #[test]
    fn test_csv_keeps_commas_in_last_column() {
        let rows = split_delimited("List1-1,你好,int.,hello, there\n", ',');
        assert_eq!(rows[0].len(), 4);
        assert_eq!(rows[0][3], "hello, there");
    }

    #[test]
    fn test_csv_with_byte_order_mark() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.csv");
        fs::write(&path, "\u{feff}List1-1,苹果,n.,apple\r\nList1-2,跑,v.,run\r\n").unwrap();
        let store = WordStore::load_from_path(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup(EntryKey::new(1, 1)).unwrap().translation, "苹果");
    }

    const SHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
    const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    /// Writes a one-sheet `.xlsx` with inline-string cells. `rows` are
    /// (sheet row number, cells) pairs.
    fn write_xlsx(path: &Path, rows: &[(u32, [&str; 4])]) {
        use zip::write::SimpleFileOptions;

        let mut sheet = String::new();
        for (number, cells) in rows {
            sheet.push_str(&format!("<row r=\"{number}\">"));
            for (column, value) in ["A", "B", "C", "D"].iter().zip(cells) {
                sheet.push_str(&format!(
                    "<c r=\"{column}{number}\" t=\"inlineStr\"><is><t>{value}</t></is></c>"
                ));
            }
            sheet.push_str("</row>");
        }
        let parts = [
            (
                "[Content_Types].xml",
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
<Override PartName=\"/xl/worksheets/sheet1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\
</Types>"
                    .to_string(),
            ),
            (
                "_rels/.rels",
                format!(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"{REL_NS}/officeDocument\" Target=\"xl/workbook.xml\"/>\
</Relationships>"
                ),
            ),
            (
                "xl/workbook.xml",
                format!(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<workbook xmlns=\"{SHEET_NS}\" xmlns:r=\"{REL_NS}\">\
<sheets><sheet name=\"Sheet1\" sheetId=\"1\" r:id=\"rId1\"/></sheets></workbook>"
                ),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                format!(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"{REL_NS}/worksheet\" Target=\"worksheets/sheet1.xml\"/>\
</Relationships>"
                ),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<worksheet xmlns=\"{SHEET_NS}\"><sheetData>{sheet}</sheetData></worksheet>"
                ),
            ),
        ];

        let file = fs::File::create(path).unwrap();
        let mut archive = zip::ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, body) in parts {
            archive.start_file(name, options).unwrap();
            archive.write_all(body.as_bytes()).unwrap();
        }
        archive.finish().unwrap();
    }

    #[test]
    fn test_load_xlsx_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.xlsx");
        write_xlsx(
            &path,
            &[
                (1, ["List2-1", "狗", "n.", "dog"]),
                (2, ["List1-1", "苹果", "n.", "apple"]),
            ],
        );
        let store = WordStore::load_from_path(&path).unwrap();
        let keys: Vec<String> = store.entries().map(|e| e.key.to_string()).collect();
        assert_eq!(keys, vec!["1-1", "2-1"]);
        assert_eq!(store.lookup(EntryKey::new(2, 1)).unwrap().word, "dog");
    }

    #[test]
    fn test_xlsx_malformed_row_reports_sheet_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.xlsx");
        write_xlsx(
            &path,
            &[
                (2, ["List1-1", "苹果", "n.", "apple"]),
                (3, ["List1-2", "跑", "v.", "run"]),
                (4, ["Bad", "狗", "n.", "dog"]),
            ],
        );
        let err = WordStore::load_from_path(&path).unwrap_err();
        match err {
            DictationError::MalformedRow {
                row, identifier, ..
            } => {
                assert_eq!(row, 4);
                assert_eq!(identifier, "Bad");
            }
            other => panic!("Expected MalformedRow, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = open_source("words.docx").err().unwrap();
        assert!(matches!(err, DictationError::InvalidArgument(_)));
    }
}
