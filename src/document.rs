// Document Renderer
// Paginated PDF and CSV output for tabular reports
//
// PDF template: centered title on every page, "Page N" footer, a shaded bold
// header row at the top of each page's table, bordered fixed-width cells.
// Values are written exactly as the table holds them.

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rect, Rgb,
};
use std::fs::{self, File};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::RenderError;
use crate::table::Table;

const PT_TO_MM: f32 = 0.352_778;

/// Anything that can turn a table into a file on disk.
pub trait DocumentRenderer {
    /// Write `table` to `path` and return the path written.
    fn render(&self, table: &Table, path: &Path) -> Result<PathBuf, RenderError>;

    /// File extension this renderer produces, without the dot.
    fn extension(&self) -> &'static str;
}

// ============================================================================
// PDF TEMPLATE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PdfTemplate {
    /// Header text printed at the top of every page
    pub title: String,
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub column_width: f32,
    pub row_height: f32,
    pub title_font_size: f32,
    pub header_font_size: f32,
    pub body_font_size: f32,
    pub footer_font_size: f32,
    /// TrueType font used for every text role instead of built-in Helvetica.
    pub font_file: Option<PathBuf>,
}

impl Default for PdfTemplate {
    /// A4 landscape, so fourteen 19.5mm columns fit between the margins.
    fn default() -> Self {
        PdfTemplate {
            title: "Milk Dairy Report".to_string(),
            page_width: 297.0,
            page_height: 210.0,
            margin: 10.0,
            column_width: 19.5,
            row_height: 8.0,
            title_font_size: 16.0,
            header_font_size: 10.0,
            body_font_size: 9.0,
            footer_font_size: 8.0,
            font_file: None,
        }
    }
}

impl PdfTemplate {
    pub fn with_title(title: &str) -> Self {
        PdfTemplate {
            title: title.to_string(),
            ..PdfTemplate::default()
        }
    }

    pub fn with_font(mut self, font_file: Option<PathBuf>) -> Self {
        self.font_file = font_file;
        self
    }

    /// Distance from the top edge to the first table row.
    fn table_top(&self) -> f32 {
        self.margin + 15.0
    }

    /// Space kept free at the bottom for the footer.
    fn bottom_reserve(&self) -> f32 {
        20.0
    }

    /// Data rows that fit under the header row on one page (at least one).
    pub fn rows_per_page(&self) -> usize {
        let usable = self.page_height - self.table_top() - self.bottom_reserve();
        let slots = (usable / self.row_height).floor() as usize;
        slots.saturating_sub(1).max(1)
    }
}

/// Split `row_count` rows into per-page ranges. An empty table still gets
/// one (empty) page so the header row is printed.
pub fn paginate(row_count: usize, rows_per_page: usize) -> Vec<Range<usize>> {
    let per_page = rows_per_page.max(1);
    if row_count == 0 {
        return vec![0..0];
    }
    (0..row_count)
        .step_by(per_page)
        .map(|start| start..(start + per_page).min(row_count))
        .collect()
}

/// What goes on one PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    pub number: usize,
    pub title: String,
    pub footer: String,
    /// Table rows drawn under the header row.
    pub rows: Range<usize>,
}

// ============================================================================
// PDF RENDERER
// ============================================================================

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference, template: &PdfTemplate) -> Result<Self, RenderError> {
        let Some(path) = &template.font_file else {
            return Ok(Fonts {
                regular: builtin(doc, BuiltinFont::Helvetica)?,
                bold: builtin(doc, BuiltinFont::HelveticaBold)?,
                italic: builtin(doc, BuiltinFont::HelveticaOblique)?,
            });
        };

        let bytes = fs::read(path).map_err(|source| RenderError::Io {
            path: path.clone(),
            source,
        })?;
        let font = doc
            .add_external_font(&bytes[..])
            .map_err(|e| RenderError::Pdf(format!("{}: {:?}", path.display(), e)))?;
        debug!(font = %path.display(), "embedded pdf font");

        // One embedded face serves all roles
        Ok(Fonts {
            regular: font.clone(),
            bold: font.clone(),
            italic: font,
        })
    }
}

fn builtin(doc: &PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef, RenderError> {
    doc.add_builtin_font(font)
        .map_err(|e| RenderError::Pdf(format!("{:?}", e)))
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

/// Rough Helvetica width, good enough for centering short labels.
fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.5 * PT_TO_MM
}

#[derive(Debug, Clone, Default)]
pub struct PdfRenderer {
    pub template: PdfTemplate,
}

impl PdfRenderer {
    pub fn new(template: PdfTemplate) -> Self {
        PdfRenderer { template }
    }

    /// Pages `render_bytes` will draw for `table`, in order.
    pub fn layout(&self, table: &Table) -> Vec<PageLayout> {
        paginate(table.len(), self.template.rows_per_page())
            .into_iter()
            .enumerate()
            .map(|(index, rows)| PageLayout {
                number: index + 1,
                title: self.template.title.clone(),
                footer: format!("Page {}", index + 1),
                rows,
            })
            .collect()
    }

    /// Build the whole document in memory.
    pub fn render_bytes(&self, table: &Table) -> Result<Vec<u8>, RenderError> {
        let t = &self.template;
        let (doc, first_page, first_layer) = PdfDocument::new(
            table.title.clone(),
            Mm(t.page_width),
            Mm(t.page_height),
            "Layer 1".to_string(),
        );
        let fonts = Fonts::load(&doc, t)?;

        let pages = self.layout(table);
        debug!(rows = table.len(), pages = pages.len(), "laying out pdf");

        for page in pages {
            let layer = if page.number == 1 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (index, layer) = doc.add_page(
                    Mm(t.page_width),
                    Mm(t.page_height),
                    format!("Page {}, Layer 1", page.number),
                );
                doc.get_page(index).get_layer(layer)
            };

            self.draw_title(&layer, &fonts, &page.title);
            self.draw_footer(&layer, &fonts, &page.footer);
            self.draw_table(&layer, &fonts, table, page.rows);
        }

        doc.save_to_bytes()
            .map_err(|e| RenderError::Pdf(format!("{:?}", e)))
    }

    fn draw_title(&self, layer: &PdfLayerReference, fonts: &Fonts, title: &str) {
        let t = &self.template;
        let x = (t.page_width - text_width(title, t.title_font_size)) / 2.0;
        let y = t.page_height - t.margin - 7.0;

        layer.set_fill_color(rgb(0, 51, 102));
        layer.use_text(title, t.title_font_size, Mm(x), Mm(y), &fonts.bold);
    }

    fn draw_footer(&self, layer: &PdfLayerReference, fonts: &Fonts, label: &str) {
        let t = &self.template;
        let x = (t.page_width - text_width(label, t.footer_font_size)) / 2.0;

        layer.set_fill_color(rgb(169, 169, 169));
        layer.use_text(label, t.footer_font_size, Mm(x), Mm(8.0), &fonts.italic);
    }

    fn draw_table(
        &self,
        layer: &PdfLayerReference,
        fonts: &Fonts,
        table: &Table,
        rows: Range<usize>,
    ) {
        let t = &self.template;
        let mut top = t.page_height - t.table_top();

        layer.set_outline_color(rgb(0, 0, 0));
        layer.set_outline_thickness(0.5);

        // Header row
        for (col, label) in table.columns().iter().enumerate() {
            let x = t.margin + col as f32 * t.column_width;
            layer.set_fill_color(rgb(224, 235, 255));
            self.draw_cell(layer, x, top, PaintMode::FillStroke);

            let inset = ((t.column_width - text_width(label, t.header_font_size)) / 2.0).max(1.0);
            layer.set_fill_color(rgb(0, 0, 0));
            layer.use_text(
                label.as_str(),
                t.header_font_size,
                Mm(x + inset),
                Mm(self.baseline(top, t.header_font_size)),
                &fonts.bold,
            );
        }
        top -= t.row_height;

        // Data rows
        layer.set_fill_color(rgb(0, 0, 0));
        for row in &table.rows()[rows] {
            for (col, value) in row.iter().enumerate() {
                let x = t.margin + col as f32 * t.column_width;
                self.draw_cell(layer, x, top, PaintMode::Stroke);
                layer.use_text(
                    value.as_str(),
                    t.body_font_size,
                    Mm(x + 1.0),
                    Mm(self.baseline(top, t.body_font_size)),
                    &fonts.regular,
                );
            }
            top -= t.row_height;
        }
    }

    fn draw_cell(&self, layer: &PdfLayerReference, x: f32, top: f32, mode: PaintMode) {
        let t = &self.template;
        let rect = Rect::new(
            Mm(x),
            Mm(top - t.row_height),
            Mm(x + t.column_width),
            Mm(top),
        )
        .with_mode(mode);
        layer.add_rect(rect);
    }

    /// Vertically centre text of `font_size` inside the row starting at `top`.
    fn baseline(&self, top: f32, font_size: f32) -> f32 {
        top - self.template.row_height / 2.0 - font_size * PT_TO_MM * 0.35
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, table: &Table, path: &Path) -> Result<PathBuf, RenderError> {
        let bytes = self.render_bytes(table)?;
        ensure_parent(path)?;
        fs::write(path, bytes).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), rows = table.len(), "pdf report written");
        Ok(path.to_path_buf())
    }

    fn extension(&self) -> &'static str {
        "pdf"
    }
}

// ============================================================================
// CSV RENDERER
// ============================================================================

/// Header record of column labels followed by one record per row.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRenderer;

impl DocumentRenderer for CsvRenderer {
    fn render(&self, table: &Table, path: &Path) -> Result<PathBuf, RenderError> {
        ensure_parent(path)?;
        let io_err = |source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_err)?;
        let mut wtr = csv::Writer::from_writer(file);
        wtr.write_record(table.columns())?;
        for row in table.rows() {
            wtr.write_record(row)?;
        }
        wtr.flush().map_err(io_err)?;

        info!(path = %path.display(), rows = table.len(), "csv report written");
        Ok(path.to_path_buf())
    }

    fn extension(&self) -> &'static str {
        "csv"
    }
}

fn ensure_parent(path: &Path) -> Result<(), RenderError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| RenderError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table(rows: usize) -> Table {
        let mut table = Table::new("Sample", &["ID", "Customer", "Paid"]);
        for i in 0..rows {
            table
                .push_row(vec![i.to_string(), format!("Customer {}", i), "100".to_string()])
                .unwrap();
        }
        table
    }

    #[test]
    fn test_default_rows_per_page() {
        // (210 - 25 - 20) / 8 = 20 slots, minus the header row
        assert_eq!(PdfTemplate::default().rows_per_page(), 19);
    }

    #[test]
    fn test_rows_per_page_never_zero() {
        let template = PdfTemplate {
            row_height: 500.0,
            ..PdfTemplate::default()
        };
        assert_eq!(template.rows_per_page(), 1);
    }

    #[test]
    fn test_paginate_splits_rows() {
        assert_eq!(paginate(45, 19), vec![0..19, 19..38, 38..45]);
        assert_eq!(paginate(19, 19), vec![0..19]);
        assert_eq!(paginate(3, 0), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_paginate_empty_table_has_one_page() {
        assert_eq!(paginate(0, 19), vec![0..0]);
    }

    #[test]
    fn test_pdf_bytes_have_pdf_header() {
        let bytes = PdfRenderer::default().render_bytes(&sample_table(3)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_fifty_rows_span_three_titled_pages() {
        let renderer = PdfRenderer::new(PdfTemplate::with_title("Malik Dairy"));

        let pages = renderer.layout(&sample_table(50));

        assert_eq!(pages.len(), 3);
        assert_eq!(
            pages.iter().map(|p| p.rows.clone()).collect::<Vec<_>>(),
            vec![0..19, 19..38, 38..50]
        );
        for (i, page) in pages.iter().enumerate() {
            assert_eq!(page.number, i + 1);
            assert_eq!(page.title, "Malik Dairy");
            assert_eq!(page.footer, format!("Page {}", i + 1));
        }
    }

    #[test]
    fn test_empty_table_lays_out_one_page() {
        let pages = PdfRenderer::default().layout(&sample_table(0));

        assert_eq!(pages.len(), 1);
        assert!(pages[0].rows.is_empty());
        assert_eq!(pages[0].title, "Milk Dairy Report");
    }

    #[test]
    fn test_missing_font_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let font = dir.path().join("missing.ttf");
        let template = PdfTemplate::default().with_font(Some(font.clone()));

        let result = PdfRenderer::new(template).render_bytes(&sample_table(1));

        match result {
            Err(RenderError::Io { path, .. }) => assert_eq!(path, font),
            other => panic!("expected io error, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_pdf_multi_page_and_empty() {
        let renderer = PdfRenderer::default();

        let many = renderer.render_bytes(&sample_table(50)).unwrap();
        let empty = renderer.render_bytes(&sample_table(0)).unwrap();

        assert!(many.starts_with(b"%PDF"));
        assert!(empty.starts_with(b"%PDF"));
        assert!(many.len() > empty.len());
    }

    #[test]
    fn test_pdf_written_to_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("weekly_report.pdf");

        let written = PdfRenderer::new(PdfTemplate::with_title("Malik Dairy"))
            .render(&sample_table(2), &path)
            .unwrap();

        assert_eq!(written, path);
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_csv_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily.csv");

        CsvRenderer.render(&sample_table(2), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines, vec!["ID,Customer,Paid", "0,Customer 0,100", "1,Customer 1,100"]);
    }

    #[test]
    fn test_unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file cannot be used as a parent directory
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let path = blocker.join("report.csv");

        let result = CsvRenderer.render(&sample_table(1), &path);

        assert!(matches!(result, Err(RenderError::Io { .. })));
    }
}
