//! PDF canvas backed by `printpdf`.
//!
//! Uses the built-in Helvetica faces, so nothing is embedded and the output
//! stays small. printpdf measures from the bottom-left corner; the engine
//! measures from the top-left, so every y coordinate is flipped here.
//!
//! The document id and every metadata date derive from the generation time
//! passed in, so equal inputs serialize to equal bytes.

use crate::canvas::{Align, Canvas, PageSize, TextStyle, Weight};
use crate::metrics::text_width;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use printpdf::lopdf::{self, Object, StringFormat};
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, OffsetDateTime, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};
use std::io::BufWriter;

const LAYER_NAME: &str = "Layer 1";
const DOCUMENT_ID_PREFIX: &str = "rxdoc";

/// Canvas producing a multi-page PDF document
pub struct PdfCanvas {
    doc: PdfDocumentReference,
    document_id: String,
    size: PageSize,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Layer of the page printpdf creates together with the document
    initial_layer: Option<PdfLayerReference>,
    layer: Option<PdfLayerReference>,
    pages: usize,
}

fn pdf_error(e: impl std::fmt::Display) -> Error {
    Error::Pdf(e.to_string())
}

impl PdfCanvas {
    /// Create an empty PDF with the given document title and page size
    ///
    /// `generated_at` is stamped as the creation, modification and metadata
    /// date, and seeds the document id.
    pub fn new(title: &str, size: PageSize, generated_at: DateTime<Utc>) -> Result<Self> {
        let stamp =
            OffsetDateTime::from_unix_timestamp(generated_at.timestamp()).map_err(pdf_error)?;
        let document_id = format!(
            "{}{}",
            DOCUMENT_ID_PREFIX,
            generated_at.format("%Y%m%d%H%M%S")
        );

        let (doc, page, layer) =
            PdfDocument::new(title, Mm(size.width), Mm(size.height), LAYER_NAME);
        let doc = doc
            .with_document_id(document_id.clone())
            .with_creation_date(stamp)
            .with_mod_date(stamp)
            .with_metadata_date(stamp);
        let initial_layer = doc.get_page(page).get_layer(layer);

        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;

        Ok(Self {
            doc,
            document_id,
            size,
            regular,
            bold,
            initial_layer: Some(initial_layer),
            layer: None,
            pages: 0,
        })
    }

    fn active_layer(&mut self) -> Result<&PdfLayerReference> {
        if self.layer.is_none() {
            tracing::warn!("Draw call before the first page; starting one implicitly");
            self.new_page()?;
        }
        self.layer
            .as_ref()
            .ok_or_else(|| Error::Pdf("no active page".into()))
    }

    fn flip(&self, y: f32) -> Mm {
        Mm(self.size.height - y)
    }
}

/// Replace the per-save instance id in the trailer with the document id
fn pin_trailer_id(bytes: &[u8], document_id: &str) -> Result<Vec<u8>> {
    let mut doc = lopdf::Document::load_mem(bytes).map_err(pdf_error)?;
    let id = Object::String(document_id.as_bytes().to_vec(), StringFormat::Literal);
    doc.trailer.set("ID", Object::Array(vec![id.clone(), id]));

    let mut pinned = Vec::with_capacity(bytes.len());
    doc.save_to(&mut pinned).map_err(pdf_error)?;
    Ok(pinned)
}

impl Canvas for PdfCanvas {
    fn new_page(&mut self) -> Result<()> {
        let layer = match self.initial_layer.take() {
            Some(layer) => layer,
            None => {
                let (page, layer) = self.doc.add_page(
                    Mm(self.size.width),
                    Mm(self.size.height),
                    LAYER_NAME,
                );
                self.doc.get_page(page).get_layer(layer)
            }
        };

        self.layer = Some(layer);
        self.pages += 1;
        tracing::debug!("Started PDF page {}", self.pages);
        Ok(())
    }

    fn text(&mut self, x: f32, y: f32, text: &str, style: TextStyle) -> Result<()> {
        let x = match style.align {
            Align::Left => x,
            Align::Center => x - text_width(text, style.size) / 2.0,
            Align::Right => x - text_width(text, style.size),
        };
        let font = match style.weight {
            Weight::Regular => self.regular.clone(),
            Weight::Bold => self.bold.clone(),
        };
        let baseline = self.flip(y);

        self.active_layer()?
            .use_text(text, style.size, Mm(x), baseline, &font);
        Ok(())
    }

    fn hline(&mut self, x1: f32, x2: f32, y: f32) -> Result<()> {
        let y = self.flip(y);
        let line = Line {
            points: vec![
                (Point::new(Mm(x1), y), false),
                (Point::new(Mm(x2), y), false),
            ],
            is_closed: false,
        };

        self.active_layer()?.add_line(line);
        Ok(())
    }

    fn page_dimensions(&self) -> PageSize {
        self.size
    }

    fn page_count(&self) -> usize {
        self.pages
    }

    fn finish(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc.save(&mut buf).map_err(pdf_error)?;
        let bytes = buf.into_inner().map_err(pdf_error)?;
        pin_trailer_id(&bytes, &self.document_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 7, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_empty_pages_produce_pdf() {
        let mut canvas = PdfCanvas::new("Receita", PageSize::A4, generated_at()).unwrap();
        canvas.new_page().unwrap();
        canvas.new_page().unwrap();
        assert_eq!(canvas.page_count(), 2);

        let bytes = canvas.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_draws_text_and_rules() {
        let mut canvas = PdfCanvas::new("Receita", PageSize::A4, generated_at()).unwrap();
        canvas.new_page().unwrap();
        canvas
            .text(105.0, 25.0, "RECEITA MÉDICA", TextStyle::bold(16.0).centered())
            .unwrap();
        canvas
            .text(190.0, 75.0, "Página 1 de 2", TextStyle::regular(10.0).right_aligned())
            .unwrap();
        canvas.hline(20.0, 190.0, 55.0).unwrap();

        let bytes = canvas.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 100);
    }

    fn draw_sample() -> Vec<u8> {
        let mut canvas = PdfCanvas::new("Receita", PageSize::A4, generated_at()).unwrap();
        canvas.new_page().unwrap();
        canvas
            .text(20.0, 100.0, "1. Dipirona 500mg", TextStyle::bold(12.0))
            .unwrap();
        canvas.new_page().unwrap();
        canvas.hline(105.0, 190.0, 237.0).unwrap();
        canvas.finish().unwrap()
    }

    #[test]
    fn test_same_inputs_give_identical_bytes() {
        let first = draw_sample();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let second = draw_sample();

        assert!(first.starts_with(b"%PDF"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_trailer_id_derives_from_generation_time() {
        let bytes = draw_sample();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let ids = doc.trailer.get(b"ID").unwrap().as_array().unwrap();

        assert_eq!(ids.len(), 2);
        for id in ids {
            assert_eq!(id.as_str().unwrap(), b"rxdoc20240307143000");
        }
    }
}
