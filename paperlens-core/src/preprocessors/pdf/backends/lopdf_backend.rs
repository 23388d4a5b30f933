//! In-process PDF backend built on lopdf.
//!
//! Walks each page's decoded content stream, tracking the text state machine
//! (BT/ET, Tf, Td/TD/Tm/T*/TL) and emitting positioned text runs for the
//! show operators (Tj, TJ, ', "). Runs are grouped into lines by baseline
//! proximity and lines into blocks by vertical gaps.
//!
//! Glyph-perfect layout reconstruction is out of scope: glyph widths are
//! estimated from font size, CID/ToUnicode mapping is not consulted, and the
//! current transformation matrix is ignored. That is enough for font-size
//! heading statistics and reading-order text, which is all the pipeline
//! consumes.

use crate::types::*;
use anyhow::{Context, Result};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::char::decode_utf16;
use std::collections::HashMap;

use super::PdfBackend;

/// Negative TJ adjustment (thousandths of an em) treated as a word gap.
const WORD_GAP_KERN: f32 = -180.0;

/// Ascender/descender estimates as fractions of font size, used to give
/// each line a vertical extent around its baseline.
const ASCENT_RATIO: f32 = 0.8;
const DESCENT_RATIO: f32 = 0.2;

/// Vertical gap between lines (relative to line height) that starts a new
/// block.
const BLOCK_GAP_MULTIPLIER: f32 = 0.8;

#[derive(Default)]
pub struct LopdfBackend;

impl LopdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for LopdfBackend {
    fn extract(&self, pdf_bytes: &[u8]) -> Result<PreprocessorOutput> {
        let doc = Document::load_mem(pdf_bytes).context("failed to open PDF")?;

        let metadata = extract_metadata(&doc);
        let mut pages = Vec::new();
        let mut potential_figures = Vec::new();

        for (page_index, page_id) in doc.page_iter().enumerate() {
            pages.push(extract_page(&doc, page_id));
            potential_figures.extend(extract_page_figures(&doc, page_id, page_index));
        }

        Ok(PreprocessorOutput {
            pages,
            metadata,
            potential_figures,
        })
    }

    fn name(&self) -> &str {
        "LopdfBackend"
    }
}

// ===== METADATA =====

fn extract_metadata(doc: &Document) -> DocumentMetadata {
    let page_count = doc.get_pages().len();

    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| obj.as_reference().ok())
        .and_then(|id| doc.get_object(id).ok())
        .and_then(|obj| obj.as_dict().ok());

    let field = |key: &str| -> String {
        info.and_then(|dict| info_string(dict, key)).unwrap_or_default()
    };

    DocumentMetadata {
        title: field("Title"),
        author: field("Author"),
        subject: field("Subject"),
        keywords: field("Keywords"),
        page_count,
    }
}

fn info_string(dict: &Dictionary, key: &str) -> Option<String> {
    dict.get(key.as_bytes())
        .ok()
        .and_then(|obj| obj.as_str().ok())
        .map(decode_pdf_string)
}

/// Decode PDF string bytes: UTF-16BE when BOM-prefixed, Latin-1 otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

// ===== FIGURES =====

/// Enumerate raster XObjects on one page. Best-effort: anything that fails
/// to resolve or decode is skipped, never an error.
fn extract_page_figures(doc: &Document, page_id: ObjectId, page_index: usize) -> Vec<PotentialFigure> {
    let mut figures = Vec::new();

    let Some(page_dict) = doc.get_object(page_id).ok().and_then(|o| o.as_dict().ok()) else {
        return figures;
    };
    let Some(resources) = page_dict
        .get(b"Resources")
        .ok()
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok())
    else {
        return figures;
    };
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok())
    else {
        return figures;
    };

    for (_name, obj) in xobjects.iter() {
        let Some(stream) = resolve(doc, obj).as_stream().ok() else {
            continue;
        };
        let is_image = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|s| s.as_name().ok())
            .map(|name| name == b"Image")
            .unwrap_or(false);
        if !is_image {
            continue;
        }

        let width = stream.dict.get(b"Width").ok().and_then(object_f32);
        let height = stream.dict.get(b"Height").ok().and_then(object_f32);
        if let (Some(width), Some(height)) = (width, height) {
            // Intrinsic image dimensions; placement would need full
            // graphics-state emulation.
            figures.push(PotentialFigure {
                page: page_index,
                bbox: BoundingBox::new(0.0, 0.0, width, height),
            });
        }
    }

    figures
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj.as_reference() {
        Ok(id) => doc.get_object(id).unwrap_or(obj),
        Err(_) => obj,
    }
}

fn object_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

// ===== TEXT EXTRACTION =====

/// One show-operator emission with its resolved font and baseline position.
#[derive(Debug, Clone)]
struct PositionedRun {
    text: String,
    font: String,
    size: f32,
    x: f32,
    y: f32,
    width: f32,
}

/// Interpreter state for one page's text objects.
struct TextState {
    font_key: String,
    font_size: f32,
    /// Vertical scale from the last Tm; many producers set size via Tm with
    /// Tf size 1.
    tm_scale: f32,
    leading: f32,
    line_x: f32,
    line_y: f32,
    cursor_x: f32,
}

impl TextState {
    fn new() -> Self {
        Self {
            font_key: String::new(),
            font_size: 0.0,
            tm_scale: 1.0,
            leading: 0.0,
            line_x: 0.0,
            line_y: 0.0,
            cursor_x: 0.0,
        }
    }

    fn effective_size(&self) -> f32 {
        let size = self.font_size * self.tm_scale;
        if size > 0.0 {
            size
        } else {
            self.font_size.max(1.0)
        }
    }

    fn next_line(&mut self, tx: f32, ty: f32) {
        self.line_x += tx;
        self.line_y += ty;
        self.cursor_x = self.line_x;
    }
}

fn extract_page(doc: &Document, page_id: ObjectId) -> StructuredPage {
    let Ok(content_bytes) = doc.get_page_content(page_id) else {
        return StructuredPage::default();
    };
    let Ok(content) = Content::decode(&content_bytes) else {
        return StructuredPage::default();
    };

    let font_names = page_font_names(doc, page_id);
    let runs = interpret_operations(&content, &font_names);
    assemble_page(runs)
}

/// Map font resource keys (e.g. "F1") to BaseFont names with any subset
/// prefix ("ABCDEF+") stripped. Falls back to the resource key itself.
fn page_font_names(doc: &Document, page_id: ObjectId) -> HashMap<String, String> {
    let mut names = HashMap::new();
    let Ok(fonts) = doc.get_page_fonts(page_id) else {
        return names;
    };
    for (key, font_dict) in fonts {
        let resource_key = String::from_utf8_lossy(&key).into_owned();
        let base_font = font_dict
            .get(b"BaseFont")
            .ok()
            .and_then(|obj| obj.as_name().ok())
            .map(|name| {
                let start = name
                    .iter()
                    .position(|&b| b == b'+')
                    .map(|i| i + 1)
                    .unwrap_or(0);
                String::from_utf8_lossy(&name[start..]).into_owned()
            })
            .unwrap_or_else(|| resource_key.clone());
        names.insert(resource_key, base_font);
    }
    names
}

fn interpret_operations(content: &Content, font_names: &HashMap<String, String>) -> Vec<PositionedRun> {
    let mut runs = Vec::new();
    let mut state = TextState::new();

    for operation in &content.operations {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "BT" => {
                state.line_x = 0.0;
                state.line_y = 0.0;
                state.cursor_x = 0.0;
                state.tm_scale = 1.0;
            }
            "Tf" => {
                if operands.len() >= 2 {
                    if let Ok(name) = operands[0].as_name() {
                        state.font_key = String::from_utf8_lossy(name).into_owned();
                    }
                    if let Some(size) = object_f32(&operands[1]) {
                        state.font_size = size;
                    }
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(object_f32) {
                    state.leading = leading;
                }
            }
            "Td" => {
                if operands.len() >= 2 {
                    let tx = object_f32(&operands[0]).unwrap_or(0.0);
                    let ty = object_f32(&operands[1]).unwrap_or(0.0);
                    state.next_line(tx, ty);
                }
            }
            "TD" => {
                if operands.len() >= 2 {
                    let tx = object_f32(&operands[0]).unwrap_or(0.0);
                    let ty = object_f32(&operands[1]).unwrap_or(0.0);
                    state.leading = -ty;
                    state.next_line(tx, ty);
                }
            }
            "Tm" => {
                if operands.len() >= 6 {
                    let d = object_f32(&operands[3]).unwrap_or(1.0);
                    let e = object_f32(&operands[4]).unwrap_or(0.0);
                    let f = object_f32(&operands[5]).unwrap_or(0.0);
                    state.tm_scale = if d.abs() > 0.0 { d.abs() } else { 1.0 };
                    state.line_x = e;
                    state.line_y = f;
                    state.cursor_x = e;
                }
            }
            "T*" => {
                let leading = state.leading;
                state.next_line(0.0, -leading);
            }
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = decode_pdf_string(bytes);
                    emit_run(&mut runs, &mut state, font_names, text);
                }
            }
            "'" => {
                let leading = state.leading;
                state.next_line(0.0, -leading);
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = decode_pdf_string(bytes);
                    emit_run(&mut runs, &mut state, font_names, text);
                }
            }
            "\"" => {
                let leading = state.leading;
                state.next_line(0.0, -leading);
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    let text = decode_pdf_string(bytes);
                    emit_run(&mut runs, &mut state, font_names, text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(elements)) = operands.first() {
                    let mut text = String::new();
                    for element in elements {
                        match element {
                            Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
                            Object::Integer(i) => {
                                if (*i as f32) < WORD_GAP_KERN {
                                    text.push(' ');
                                }
                            }
                            Object::Real(r) => {
                                if *r < WORD_GAP_KERN {
                                    text.push(' ');
                                }
                            }
                            _ => {}
                        }
                    }
                    emit_run(&mut runs, &mut state, font_names, text);
                }
            }
            _ => {}
        }
    }

    runs
}

fn emit_run(
    runs: &mut Vec<PositionedRun>,
    state: &mut TextState,
    font_names: &HashMap<String, String>,
    text: String,
) {
    if text.is_empty() {
        return;
    }
    let size = state.effective_size();
    // Advance estimate: average glyph width ~ half the font size.
    let width = 0.5 * size * text.chars().count() as f32;
    let font = font_names
        .get(&state.font_key)
        .cloned()
        .unwrap_or_else(|| state.font_key.clone());

    runs.push(PositionedRun {
        text,
        font,
        size,
        x: state.cursor_x,
        y: state.line_y,
        width,
    });
    state.cursor_x += width;
}

// ===== LINE AND BLOCK ASSEMBLY =====

fn assemble_page(mut runs: Vec<PositionedRun>) -> StructuredPage {
    if runs.is_empty() {
        return StructuredPage::default();
    }

    // Reading order: top of page first, then left to right.
    runs.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<PositionedRun> = Vec::new();

    for run in runs {
        let same_line = current.last().map(|prev| {
            let tolerance = (0.25 * prev.size.max(run.size)).max(2.0);
            (prev.y - run.y).abs() <= tolerance
        });
        if same_line == Some(true) || current.is_empty() {
            current.push(run);
        } else {
            lines.push(build_line(std::mem::take(&mut current)));
            current.push(run);
        }
    }
    if !current.is_empty() {
        lines.push(build_line(current));
    }

    StructuredPage {
        blocks: group_blocks(lines),
    }
}

fn build_line(mut runs: Vec<PositionedRun>) -> TextLine {
    runs.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

    let max_size = runs.iter().map(|r| r.size).fold(0.0f32, f32::max);
    let baseline = runs[0].y;
    let x0 = runs.iter().map(|r| r.x).fold(f32::INFINITY, f32::min);
    let x1 = runs
        .iter()
        .map(|r| r.x + r.width)
        .fold(f32::NEG_INFINITY, f32::max);

    let mut text = String::new();
    let mut fonts: Vec<String> = Vec::new();
    let mut sizes: Vec<f32> = Vec::new();
    let mut pen_x: Option<f32> = None;

    for run in &runs {
        // Insert a space when the horizontal gap between runs is wider than
        // a quarter of the font size; PDF producers often split words.
        if let Some(pen) = pen_x {
            if run.x - pen > 0.25 * run.size && !text.ends_with(' ') && !run.text.starts_with(' ') {
                text.push(' ');
            }
        }
        text.push_str(&run.text);
        pen_x = Some(run.x + run.width);

        if !fonts.iter().any(|f| f == &run.font) {
            fonts.push(run.font.clone());
        }
        if !sizes.iter().any(|&s| (s - run.size).abs() < 0.05) {
            sizes.push(run.size);
        }
    }

    TextLine {
        text,
        bbox: BoundingBox::new(
            x0,
            baseline - DESCENT_RATIO * max_size,
            x1,
            baseline + ASCENT_RATIO * max_size,
        ),
        fonts,
        sizes,
    }
}

fn group_blocks(lines: Vec<TextLine>) -> Vec<TextBlock> {
    let mut blocks: Vec<TextBlock> = Vec::new();
    let mut current: Vec<TextLine> = Vec::new();

    for line in lines {
        let starts_new_block = current.last().map(|prev| {
            let line_height = (prev.bbox.top() - prev.bbox.bottom()).max(1.0);
            let gap = prev.bbox.bottom() - line.bbox.top();
            gap > BLOCK_GAP_MULTIPLIER * line_height
        });
        if starts_new_block == Some(true) {
            blocks.push(build_block(std::mem::take(&mut current)));
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(build_block(current));
    }

    blocks
}

fn build_block(lines: Vec<TextLine>) -> TextBlock {
    let x0 = lines.iter().map(|l| l.bbox.x0).fold(f32::INFINITY, f32::min);
    let y0 = lines.iter().map(|l| l.bbox.y0).fold(f32::INFINITY, f32::min);
    let x1 = lines
        .iter()
        .map(|l| l.bbox.x1)
        .fold(f32::NEG_INFINITY, f32::max);
    let y1 = lines
        .iter()
        .map(|l| l.bbox.y1)
        .fold(f32::NEG_INFINITY, f32::max);

    TextBlock {
        bbox: BoundingBox::new(x0, y0, x1, y1),
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_latin1_string() {
        assert_eq!(decode_pdf_string(b"Hello"), "Hello");
    }

    #[test]
    fn decode_utf16be_string() {
        // BOM + "Hi"
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_pdf_string(&bytes), "Hi");
    }

    fn run(text: &str, size: f32, x: f32, y: f32) -> PositionedRun {
        PositionedRun {
            text: text.to_string(),
            font: "Times".to_string(),
            size,
            x,
            y,
            width: 0.5 * size * text.chars().count() as f32,
        }
    }

    #[test]
    fn runs_on_same_baseline_join_into_one_line() {
        let page = assemble_page(vec![run("Deep", 10.0, 10.0, 700.0), run("Learning", 10.0, 40.0, 700.5)]);
        let lines: Vec<_> = page.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].text.contains("Deep"));
        assert!(lines[0].text.contains("Learning"));
    }

    #[test]
    fn distant_lines_split_into_blocks() {
        let page = assemble_page(vec![run("Title", 14.0, 10.0, 700.0), run("Body", 10.0, 10.0, 500.0)]);
        assert_eq!(page.blocks.len(), 2);
    }

    #[test]
    fn line_bbox_wraps_baseline() {
        let page = assemble_page(vec![run("A", 10.0, 0.0, 100.0)]);
        let line = page.lines().next().unwrap();
        assert!(line.bbox.bottom() < 100.0);
        assert!(line.bbox.top() > 100.0);
    }

    #[test]
    fn unopenable_pdf_is_an_error() {
        let backend = LopdfBackend::new();
        assert!(backend.extract(b"not a pdf").is_err());
    }
}
