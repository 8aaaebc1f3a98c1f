//! Two-column PDF output for answer and dictation sheets.
//!
//! Rows are laid out top to bottom, left column first, then the right
//! column, then a new page. Text is set in a non-embedded CID font through a
//! Unicode CMap so CJK translations and Latin words share one font resource.

use std::path::Path;

use chrono::Local;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::{debug_log, info_log};

const FONT_RESOURCE: &str = "F1";
const PRODUCER: &str = concat!("dictation-sheets ", env!("CARGO_PKG_VERSION"));

/// Page geometry and typography, constructed once and handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub column_gap: f32,
    /// Inner padding on the side of each column facing the gap.
    pub column_padding: f32,
    pub font_size: f32,
    pub leading: f32,
    /// Extra vertical space after each row.
    pub row_spacing: f32,
    pub font_name: String,
    pub font_encoding: String,
    pub cid_ordering: String,
    pub cid_supplement: i64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page_width: 595.2756,
            page_height: 841.8898,
            margin_left: 12.0,
            margin_right: 12.0,
            margin_top: 36.0,
            margin_bottom: 36.0,
            column_gap: 18.0,
            column_padding: 6.0,
            font_size: 15.0,
            leading: 17.0,
            row_spacing: 8.0,
            font_name: "STSong-Light".to_string(),
            font_encoding: "UniGB-UCS2-H".to_string(),
            cid_ordering: "GB1".to_string(),
            cid_supplement: 2,
        }
    }
}

impl RenderConfig {
    pub fn column_width(&self) -> f32 {
        (self.page_width - self.margin_left - self.margin_right - self.column_gap) / 2.0
    }

    /// Usable text width of one column after padding.
    pub fn text_width(&self) -> f32 {
        self.column_width() - self.column_padding
    }

    fn column_x(&self, column: usize) -> f32 {
        if column == 0 {
            self.margin_left
        } else {
            self.margin_left + self.column_width() + self.column_gap + self.column_padding
        }
    }

    fn first_baseline(&self) -> f32 {
        self.page_height - self.margin_top - self.font_size
    }
}

/// Turns ordered rows into a document at `destination`.
pub trait Renderer {
    fn render(&self, rows: &[String], destination: &Path) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub lines: Vec<PlacedLine>,
}

/// Estimated advance of one glyph in ems: half for ASCII, full otherwise.
fn glyph_width(c: char) -> f32 {
    if c.is_ascii() { 0.5 } else { 1.0 }
}

fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(glyph_width).sum::<f32>() * font_size
}

/// Splits text into wrap units: ASCII words with their trailing spaces, and
/// every other character on its own.
fn wrap_units(text: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut word = String::new();
    for c in text.chars() {
        if c.is_ascii() {
            word.push(c);
            if c == ' ' {
                units.push(std::mem::take(&mut word));
            }
        } else {
            if !word.is_empty() {
                units.push(std::mem::take(&mut word));
            }
            units.push(c.to_string());
        }
    }
    if !word.is_empty() {
        units.push(word);
    }
    units
}

/// Greedy line wrapping against the estimated glyph widths.
pub fn wrap_text(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for unit in wrap_units(text) {
        let candidate = format!("{current}{unit}");
        if text_width(candidate.trim_end(), font_size) <= max_width {
            current = candidate;
            continue;
        }
        if !current.trim().is_empty() {
            lines.push(current.trim_end().to_string());
        }
        current = String::new();
        // A unit wider than the column is broken by character.
        for c in unit.chars() {
            let width = text_width(&current, font_size) + glyph_width(c) * font_size;
            if width > max_width && !current.is_empty() {
                lines.push(current.trim_end().to_string());
                current = String::new();
            }
            if current.is_empty() && c == ' ' {
                continue;
            }
            current.push(c);
        }
    }
    if !current.trim().is_empty() || lines.is_empty() {
        lines.push(current.trim_end().to_string());
    }
    lines
}

/// Places every wrapped line of every row on pages and columns.
pub fn layout_rows(rows: &[String], config: &RenderConfig) -> Vec<PageLayout> {
    let mut pages = vec![PageLayout::default()];
    let mut column = 0;
    let mut y = config.first_baseline();
    for row in rows {
        for line in wrap_text(row, config.text_width(), config.font_size) {
            if y < config.margin_bottom {
                if column == 0 {
                    column = 1;
                } else {
                    column = 0;
                    pages.push(PageLayout::default());
                }
                y = config.first_baseline();
            }
            if let Some(page) = pages.last_mut() {
                page.lines.push(PlacedLine {
                    x: config.column_x(column),
                    y,
                    text: line,
                });
            }
            y -= config.leading;
        }
        y -= config.row_spacing;
    }
    pages
}

/// UCS-2 big-endian code units for the `UniGB-UCS2-H` family of CMaps.
fn encode_ucs2(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len() * 2);
    for c in text.chars() {
        let unit = u16::try_from(u32::from(c)).unwrap_or(u16::from(b'?'));
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}

/// PDF text string in UTF-16BE with a byte order mark.
fn encode_text_string(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xfe, 0xff];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

pub struct PdfRenderer {
    config: RenderConfig,
}

impl PdfRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    fn add_font(&self, doc: &mut Document) -> ObjectId {
        let config = &self.config;
        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => name(&config.font_name),
            "Flags" => 6,
            "FontBBox" => vec![
                Object::Integer(-25),
                Object::Integer(-254),
                Object::Integer(1000),
                Object::Integer(880),
            ],
            "ItalicAngle" => 0,
            "Ascent" => 880,
            "Descent" => -120,
            "CapHeight" => 880,
            "StemV" => 93,
        });
        let descendant_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType0",
            "BaseFont" => name(&config.font_name),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal(config.cid_ordering.as_str()),
                "Supplement" => config.cid_supplement,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => 1000,
            "W" => vec![Object::Integer(1), Object::Integer(95), Object::Integer(500)],
        });
        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => name(&format!("{}-{}", config.font_name, config.font_encoding)),
            "Encoding" => name(&config.font_encoding),
            "DescendantFonts" => vec![Object::Reference(descendant_id)],
        })
    }

    fn page_content(&self, page: &PageLayout) -> Content {
        let mut operations = Vec::with_capacity(page.lines.len() * 5);
        for line in &page.lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![name(FONT_RESOURCE), Object::Real(self.config.font_size)],
            ));
            operations.push(Operation::new(
                "Td",
                vec![Object::Real(line.x), Object::Real(line.y)],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(
                    encode_ucs2(&line.text),
                    StringFormat::Hexadecimal,
                )],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        Content { operations }
    }

    /// Builds the full document in memory.
    pub fn build_document(&self, rows: &[String], title: &str) -> Result<Document> {
        let config = &self.config;
        let pages = layout_rows(rows, config);
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = self.add_font(&mut doc);
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                FONT_RESOURCE => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for page in &pages {
            let content = self.page_content(page);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let page_count = kids.len() as i64;
        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", "Pages");
        pages_dict.set("Kids", kids);
        pages_dict.set("Count", page_count);
        pages_dict.set("Resources", resources_id);
        pages_dict.set(
            "MediaBox",
            vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(config.page_width),
                Object::Real(config.page_height),
            ],
        );
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(encode_text_string(title), StringFormat::Hexadecimal),
            "Producer" => Object::string_literal(PRODUCER),
            "CreationDate" => Object::string_literal(
                Local::now().format("D:%Y%m%d%H%M%S").to_string()
            ),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        debug_log!("Laid out {} rows on {} pages", rows.len(), page_count);
        Ok(doc)
    }
}

impl Renderer for PdfRenderer {
    fn render(&self, rows: &[String], destination: &Path) -> Result<()> {
        let title = destination
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut doc = self.build_document(rows, &title)?;
        doc.compress();
        doc.save(destination)?;
        info_log!("Wrote {} rows to {}", rows.len(), destination.display());
        Ok(())
    }
}
