//! Minimal PDF 1.4 writer for story text
//!
//! Single column on US Letter. Text is set in embedded `TrueType` fonts
//! (Type0, Identity-H) so any script the fonts cover survives export.
//! `DejaVu Sans` is built in; extra fonts act as fallbacks for characters
//! it lacks. Characters no font covers are drawn as the missing glyph and
//! carried in an `ActualText` span so the text layer stays complete.

use super::DocumentExporter;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ttf_parser::{Face, GlyphId};

const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const BUNDLED_FONT_NAME: &str = "DejaVuSans";

const PAGE_WIDTH: u32 = 612;
const PAGE_HEIGHT: u32 = 792;
const MARGIN: u32 = 72;
/// Text width inside the margins, in points
pub const CONTENT_WIDTH: u32 = PAGE_WIDTH - 2 * MARGIN;
const BODY_SIZE: u32 = 12;
const BODY_LEADING: u32 = 16;
const TITLE_SIZE: u32 = 16;
const TITLE_LEADING: u32 = 22;

#[derive(Clone)]
struct EmbeddedFont {
    name: String,
    data: Arc<[u8]>,
}

/// Exports stories as PDF
#[derive(Clone)]
pub struct PdfExporter {
    fonts: Vec<EmbeddedFont>,
}

impl Default for PdfExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExporter {
    /// Exporter using only the built-in font
    pub fn new() -> Self {
        Self {
            fonts: vec![EmbeddedFont {
                name: BUNDLED_FONT_NAME.to_string(),
                data: Arc::from(BUNDLED_FONT),
            }],
        }
    }

    /// Add fallback fonts read from disk; unreadable files are skipped
    pub fn with_font_files(paths: &[PathBuf]) -> Self {
        let mut exporter = Self::new();
        for path in paths {
            match load_font(path) {
                Ok(font) => {
                    tracing::info!(path = %path.display(), font = %font.name, "Loaded export font");
                    exporter.fonts.push(font);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping export font");
                }
            }
        }
        exporter
    }
}

fn load_font(path: &Path) -> Result<EmbeddedFont, String> {
    let data = std::fs::read(path).map_err(|e| e.to_string())?;
    Face::parse(&data, 0).map_err(|e| e.to_string())?;
    let stem: String = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    let name = if stem.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        stem
    };
    Ok(EmbeddedFont {
        name,
        data: Arc::from(data),
    })
}

impl DocumentExporter for PdfExporter {
    fn export(&self, title: &str, text: &str) -> Vec<u8> {
        let fonts: Vec<(&EmbeddedFont, Face<'_>)> = self
            .fonts
            .iter()
            .filter_map(|font| Face::parse(&font.data, 0).ok().map(|face| (font, face)))
            .collect();
        if fonts.is_empty() {
            tracing::error!("No usable font for PDF export");
            return Vec::new();
        }

        let typesetter = Typesetter {
            faces: fonts.iter().map(|(_, face)| face).collect(),
        };
        let mut lines = typesetter.wrap(title, TITLE_SIZE, TITLE_LEADING);
        lines.push(Line::blank(BODY_SIZE, BODY_LEADING));
        lines.extend(typesetter.wrap(text, BODY_SIZE, BODY_LEADING));

        let pages = paginate(lines);
        assemble(&fonts, &pages)
    }

    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn extension(&self) -> &'static str {
        "pdf"
    }
}

// ============================================================================
// Layout
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Glyph {
    /// Index into the font list
    font: usize,
    id: u16,
    /// Advance in thousandths of an em
    width: u32,
    ch: char,
    /// False when no font has the character and `.notdef` stands in
    found: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    size: u32,
    leading: u32,
    glyphs: Vec<Glyph>,
}

impl Line {
    fn blank(size: u32, leading: u32) -> Self {
        Self {
            size,
            leading,
            glyphs: Vec::new(),
        }
    }
}

fn text_width(glyphs: &[Glyph]) -> u32 {
    glyphs.iter().map(|g| g.width).sum()
}

struct Typesetter<'a> {
    faces: Vec<&'a Face<'a>>,
}

impl Typesetter<'_> {
    /// First font with a glyph for `ch`, else the primary font's `.notdef`
    fn glyph(&self, ch: char) -> Glyph {
        for (font, face) in self.faces.iter().enumerate() {
            if let Some(id) = face.glyph_index(ch) {
                return Glyph {
                    font,
                    id: id.0,
                    width: advance(face, id),
                    ch,
                    found: true,
                };
            }
        }
        Glyph {
            font: 0,
            id: 0,
            width: self.faces.first().map_or(0, |face| advance(face, GlyphId(0))),
            ch,
            found: false,
        }
    }

    /// Wrap each input line to the content width at word boundaries.
    /// Blank lines are kept; words wider than a line are split.
    fn wrap(&self, text: &str, size: u32, leading: u32) -> Vec<Line> {
        let max = CONTENT_WIDTH * 1000 / size;
        let space = self.glyph(' ');
        let mut lines = Vec::new();
        let line = |glyphs: Vec<Glyph>| Line {
            size,
            leading,
            glyphs,
        };

        for raw in text.lines() {
            let mut current: Vec<Glyph> = Vec::new();
            let mut width = 0;
            for word in raw.split_whitespace() {
                let mut word: Vec<Glyph> = word
                    .chars()
                    .filter(|c| !c.is_control())
                    .map(|c| self.glyph(c))
                    .collect();
                let mut word_width = text_width(&word);
                while word_width > max {
                    if !current.is_empty() {
                        lines.push(line(std::mem::take(&mut current)));
                        width = 0;
                    }
                    let rest = word.split_off(split_point(&word, max));
                    lines.push(line(word));
                    word = rest;
                    word_width = text_width(&word);
                }
                if word.is_empty() {
                    continue;
                }
                let needed = if current.is_empty() {
                    word_width
                } else {
                    width + space.width + word_width
                };
                if needed > max {
                    lines.push(line(std::mem::take(&mut current)));
                    width = 0;
                }
                if !current.is_empty() {
                    current.push(space);
                    width += space.width;
                }
                width += word_width;
                current.extend(word);
            }
            lines.push(line(current));
        }
        if lines.is_empty() {
            lines.push(Line::blank(size, leading));
        }
        lines
    }
}

fn advance(face: &Face<'_>, id: GlyphId) -> u32 {
    let units = u32::from(face.glyph_hor_advance(id).unwrap_or(0));
    units * 1000 / u32::from(face.units_per_em())
}

/// Number of glyphs that fit in `max`, at least one
fn split_point(word: &[Glyph], max: u32) -> usize {
    let mut width = 0;
    let mut count = 0;
    for glyph in word {
        if count > 0 && width + glyph.width > max {
            break;
        }
        width += glyph.width;
        count += 1;
    }
    count
}

/// A line with its baseline position
struct Placed {
    y: u32,
    line: Line,
}

fn paginate(lines: Vec<Line>) -> Vec<Vec<Placed>> {
    let top = PAGE_HEIGHT - MARGIN;
    let height = PAGE_HEIGHT - 2 * MARGIN;
    let mut pages = Vec::new();
    let mut current: Vec<Placed> = Vec::new();
    let mut used = 0;
    for line in lines {
        if used + line.leading > height && !current.is_empty() {
            pages.push(std::mem::take(&mut current));
            used = 0;
        }
        used += line.leading;
        let y = (top + line.leading.saturating_sub(line.size)).saturating_sub(used);
        current.push(Placed { y, line });
    }
    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    pages
}

// ============================================================================
// Serialization
// ============================================================================

fn utf16_hex(text: &str) -> String {
    text.encode_utf16().fold(String::new(), |mut out, unit| {
        let _ = write!(out, "{unit:04X}");
        out
    })
}

fn page_content(placed: &[Placed]) -> String {
    let mut content = String::new();
    for Placed { y, line } in placed {
        if line.glyphs.is_empty() {
            continue;
        }
        let _ = writeln!(content, "BT");
        let _ = writeln!(content, "{MARGIN} {y} Td");
        for run in line.glyphs.chunk_by(|a, b| a.font == b.font && a.found == b.found) {
            let codes = run.iter().fold(String::new(), |mut out, g| {
                let _ = write!(out, "{:04X}", g.id);
                out
            });
            let show = format!("/F{} {} Tf <{codes}> Tj", run[0].font, line.size);
            if run[0].found {
                let _ = writeln!(content, "{show}");
            } else {
                let original: String = run.iter().map(|g| g.ch).collect();
                let _ = writeln!(
                    content,
                    "/Span << /ActualText <FEFF{}> >> BDC {show} EMC",
                    utf16_hex(&original)
                );
            }
        }
        let _ = writeln!(content, "ET");
    }
    content
}

/// Glyphs a font draws: width per glyph id, plus the character it stands for
#[derive(Default)]
struct FontUsage {
    widths: BTreeMap<u16, u32>,
    chars: BTreeMap<u16, char>,
}

fn font_usage(font_count: usize, pages: &[Vec<Placed>]) -> Vec<FontUsage> {
    let mut usage: Vec<FontUsage> = (0..font_count).map(|_| FontUsage::default()).collect();
    let glyphs = pages
        .iter()
        .flatten()
        .flat_map(|placed| placed.line.glyphs.iter());
    for glyph in glyphs {
        let entry = &mut usage[glyph.font];
        entry.widths.insert(glyph.id, glyph.width);
        if glyph.found {
            entry.chars.entry(glyph.id).or_insert(glyph.ch);
        }
    }
    usage
}

fn to_unicode_cmap(chars: &BTreeMap<u16, char>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    let entries: Vec<(&u16, &char)> = chars.iter().collect();
    // bfchar blocks hold at most 100 entries
    for block in entries.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", block.len());
        for (id, ch) in block {
            let _ = writeln!(cmap, "<{id:04X}> <{}>", utf16_hex(&ch.to_string()));
        }
        let _ = writeln!(cmap, "endbfchar");
    }
    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap
}

fn scaled(value: i16, units_per_em: u16) -> i32 {
    i32::from(value) * 1000 / i32::from(units_per_em)
}

/// Numbered PDF objects, written out with a cross-reference table
#[derive(Default)]
struct ObjectWriter {
    objects: Vec<Vec<u8>>,
}

impl ObjectWriter {
    /// Claim an object number to fill in later
    fn reserve(&mut self) -> usize {
        self.objects.push(Vec::new());
        self.objects.len()
    }

    fn set(&mut self, id: usize, body: impl Into<Vec<u8>>) {
        self.objects[id - 1] = body.into();
    }

    fn add(&mut self, body: impl Into<Vec<u8>>) -> usize {
        self.objects.push(body.into());
        self.objects.len()
    }

    fn add_stream(&mut self, extra: &str, data: &[u8]) -> usize {
        let mut body = format!("<< /Length {}{extra} >>\nstream\n", data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.add(body)
    }

    fn finish(self, root: usize) -> Vec<u8> {
        let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets = Vec::with_capacity(self.objects.len());
        for (i, body) in self.objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_offset = out.len();
        let mut tail = format!("xref\n0 {}\n0000000000 65535 f \n", self.objects.len() + 1);
        for offset in offsets {
            let _ = write!(tail, "{offset:010} 00000 n \n");
        }
        let _ = write!(
            tail,
            "trailer\n<< /Size {} /Root {root} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            self.objects.len() + 1
        );
        out.extend_from_slice(tail.as_bytes());
        out
    }
}

/// Embed one font as Type0 over a `CIDFontType2`; returns the Type0 object
fn write_font(
    writer: &mut ObjectWriter,
    font: &EmbeddedFont,
    face: &Face<'_>,
    usage: &FontUsage,
) -> usize {
    let upem = face.units_per_em();
    let name = &font.name;
    let bbox = face.global_bounding_box();

    let font_file = writer.add_stream(&format!(" /Length1 {}", font.data.len()), &font.data);
    let descriptor = writer.add(format!(
        "<< /Type /FontDescriptor /FontName /{name} /Flags 32 /FontBBox [{} {} {} {}] \
         /ItalicAngle 0 /Ascent {} /Descent {} /CapHeight {} /StemV 80 /FontFile2 {font_file} 0 R >>",
        scaled(bbox.x_min, upem),
        scaled(bbox.y_min, upem),
        scaled(bbox.x_max, upem),
        scaled(bbox.y_max, upem),
        scaled(face.ascender(), upem),
        scaled(face.descender(), upem),
        scaled(face.capital_height().unwrap_or_else(|| face.ascender()), upem),
    ));

    let widths = usage
        .widths
        .iter()
        .fold(String::new(), |mut out, (id, width)| {
            let _ = write!(out, "{id} [{width}] ");
            out
        });
    let cid_font = writer.add(format!(
        "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{name} \
         /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
         /FontDescriptor {descriptor} 0 R /DW 1000 /W [{}] /CIDToGIDMap /Identity >>",
        widths.trim_end()
    ));
    let to_unicode = writer.add_stream("", to_unicode_cmap(&usage.chars).as_bytes());

    writer.add(format!(
        "<< /Type /Font /Subtype /Type0 /BaseFont /{name} /Encoding /Identity-H \
         /DescendantFonts [{cid_font} 0 R] /ToUnicode {to_unicode} 0 R >>"
    ))
}

fn assemble(fonts: &[(&EmbeddedFont, Face<'_>)], pages: &[Vec<Placed>]) -> Vec<u8> {
    let mut writer = ObjectWriter::default();
    let catalog = writer.reserve();
    let page_tree = writer.reserve();

    let usage = font_usage(fonts.len(), pages);
    let mut resources = String::new();
    for (index, ((font, face), used)) in fonts.iter().zip(&usage).enumerate() {
        if used.widths.is_empty() {
            continue;
        }
        let id = write_font(&mut writer, font, face, used);
        let _ = write!(resources, "/F{index} {id} 0 R ");
    }

    let mut kids = Vec::with_capacity(pages.len());
    for placed in pages {
        let content = page_content(placed);
        let content_id = writer.add_stream("", content.as_bytes());
        kids.push(writer.add(format!(
            "<< /Type /Page /Parent {page_tree} 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << {} >> >> /Contents {content_id} 0 R >>",
            resources.trim_end()
        )));
    }

    let kids_refs: Vec<String> = kids.iter().map(|id| format!("{id} 0 R")).collect();
    writer.set(
        page_tree,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids_refs.join(" "),
            kids.len()
        ),
    );
    writer.set(catalog, format!("<< /Type /Catalog /Pages {page_tree} 0 R >>"));
    writer.finish(catalog)
}
