//! Page composition.
//!
//! [`PageComposer`] draws the fixed chrome of one page (letterhead, patient
//! block, medicine entries, footer) through the injected [`Canvas`]. Each
//! method takes the current vertical cursor and returns the advanced one, so
//! blocks never overlap and the composer itself stays stateless.
//!
//! [`PageGeometry`] answers the same vertical questions without drawing,
//! which is what the overflow planner needs before any page exists.

use crate::calendar::format_display;
use crate::canvas::{Canvas, PageSize, TextStyle};
use crate::config::{LayoutConfig, LetterheadConfig};
use crate::metrics::wrap_text;
use crate::{MedicineLine, Patient, Result};
use chrono::NaiveDate;

const LETTERHEAD_TITLE_SIZE: f32 = 14.0;
const LETTERHEAD_DETAIL_SIZE: f32 = 12.0;
const DOCUMENT_TITLE_SIZE: f32 = 16.0;
const MARKER_SIZE: f32 = 10.0;
const BODY_SIZE: f32 = 12.0;
const SIGNATURE_SIZE: f32 = 10.0;

// Offsets below the last letterhead line
const RULE_GAP: f32 = 9.0;
const TITLE_GAP: f32 = 13.0;
const MARKER_GAP: f32 = 7.0;
const HEADER_BOTTOM_GAP: f32 = 17.0;

const PATIENT_BLOCK_TRAILER: f32 = 13.0;
const OBSERVATIONS_TEXT_GAP: f32 = 8.0;
const OBSERVATIONS_TRAILER: f32 = 10.0;
const SIGNATURE_CAPTION_GAP: f32 = 8.0;
const SIGNATURE_CAPTION_INDENT: f32 = 10.0;
const ENTRY_INDENT: f32 = 5.0;
const DETAIL_INDENT: f32 = 10.0;

const PATIENT_HEADING: &str = "DADOS DO PACIENTE:";
const MEDICINES_HEADING: &str = "MEDICAMENTOS PRESCRITOS:";
const OBSERVATIONS_HEADING: &str = "OBSERVAÇÕES:";
const CONTROLLED_NOTICE: &str = "*** MEDICAMENTO CONTROLADO ***";
const SIGNATURE_CAPTION: &str = "Assinatura e Carimbo do Médico";

/// Vertical space kept free above and below the medicine entries
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReservedSpace {
    /// Top of the first entry on the first page of a copy
    pub first_top: f32,
    /// Top of the first entry on continuation pages
    pub later_top: f32,
    /// Space below the last entry needed by the footer
    pub bottom: f32,
}

/// Pure vertical measurements of the page chrome
#[derive(Clone, Copy, Debug)]
pub struct PageGeometry<'a> {
    layout: &'a LayoutConfig,
    letterhead: &'a LetterheadConfig,
    size: PageSize,
}

impl<'a> PageGeometry<'a> {
    pub fn new(layout: &'a LayoutConfig, letterhead: &'a LetterheadConfig, size: PageSize) -> Self {
        Self {
            layout,
            letterhead,
            size,
        }
    }

    pub fn size(&self) -> PageSize {
        self.size
    }

    pub fn content_width(&self) -> f32 {
        (self.size.width - 2.0 * self.layout.margin).max(0.0)
    }

    fn letterhead_lines(&self) -> usize {
        self.letterhead.title_lines.len() + self.letterhead.detail_lines.len()
    }

    fn last_letterhead_baseline(&self) -> f32 {
        let steps = self.letterhead_lines().saturating_sub(1);
        self.layout.header_top + steps as f32 * self.layout.letterhead_spacing
    }

    fn rule_y(&self) -> f32 {
        self.last_letterhead_baseline() + RULE_GAP
    }

    fn title_y(&self) -> f32 {
        self.rule_y() + TITLE_GAP
    }

    /// Cursor immediately below the header
    pub fn header_bottom(&self) -> f32 {
        self.title_y() + HEADER_BOTTOM_GAP
    }

    pub fn patient_block_height(&self) -> f32 {
        4.0 * self.layout.patient_field_spacing + PATIENT_BLOCK_TRAILER
    }

    /// Wrapped observation lines as they will be printed
    pub fn observation_lines(&self, observations: Option<&str>) -> Vec<String> {
        observations
            .map(|text| wrap_text(text, self.content_width(), BODY_SIZE))
            .unwrap_or_default()
    }

    /// Height of the observations block, zero when there is nothing to print
    pub fn observations_height(&self, observations: Option<&str>) -> f32 {
        let lines = self.observation_lines(observations);
        if lines.is_empty() {
            0.0
        } else {
            OBSERVATIONS_TEXT_GAP
                + lines.len() as f32 * self.layout.line_height
                + OBSERVATIONS_TRAILER
        }
    }

    /// Reserved regions for a copy with the given observations
    ///
    /// The footer only prints on the last page of a copy, but the last page is
    /// unknown until the list is split, so every page keeps room for it.
    pub fn reserved_space(&self, observations: Option<&str>) -> ReservedSpace {
        let heading = self.layout.medicines_heading_gap;
        ReservedSpace {
            first_top: self.header_bottom() + self.patient_block_height() + heading,
            later_top: self.header_bottom() + heading,
            bottom: self.layout.footer_gap
                + self.observations_height(observations)
                + self.layout.signature_offset,
        }
    }
}

/// Draws the blocks of a single page onto a canvas
pub struct PageComposer<'a, C: Canvas> {
    canvas: &'a mut C,
    geometry: PageGeometry<'a>,
}

impl<'a, C: Canvas> PageComposer<'a, C> {
    pub fn new(canvas: &'a mut C, geometry: PageGeometry<'a>) -> Self {
        Self { canvas, geometry }
    }

    fn layout(&self) -> &'a LayoutConfig {
        self.geometry.layout
    }

    /// Start a page and draw the letterhead, title and page marker
    ///
    /// The "page X of Y" marker only appears when the copy has more than one
    /// page. Returns the cursor immediately below the header.
    pub fn begin_page(&mut self, page_index: usize, total_pages: usize) -> Result<f32> {
        self.canvas.new_page()?;

        let size = self.geometry.size;
        let center = size.width / 2.0;
        let letterhead = self.geometry.letterhead;
        let mut y = self.layout().header_top;

        for line in &letterhead.title_lines {
            self.canvas
                .text(center, y, line, TextStyle::bold(LETTERHEAD_TITLE_SIZE).centered())?;
            y += self.layout().letterhead_spacing;
        }
        for line in &letterhead.detail_lines {
            self.canvas
                .text(center, y, line, TextStyle::regular(LETTERHEAD_DETAIL_SIZE).centered())?;
            y += self.layout().letterhead_spacing;
        }

        let margin = self.layout().margin;
        self.canvas
            .hline(margin, size.width - margin, self.geometry.rule_y())?;

        let title_y = self.geometry.title_y();
        self.canvas.text(
            center,
            title_y,
            &letterhead.document_title,
            TextStyle::bold(DOCUMENT_TITLE_SIZE).centered(),
        )?;

        if total_pages > 1 {
            self.canvas.text(
                size.width - margin,
                title_y + MARKER_GAP,
                &format!("Página {} de {}", page_index, total_pages),
                TextStyle::bold(MARKER_SIZE).right_aligned(),
            )?;
        }

        Ok(self.geometry.header_bottom())
    }

    /// Draw the patient identification block
    pub fn write_patient_block(
        &mut self,
        cursor_y: f32,
        patient: &Patient,
        birth_date: NaiveDate,
        issue_date: NaiveDate,
    ) -> Result<f32> {
        let x = self.layout().margin;
        let spacing = self.layout().patient_field_spacing;

        self.canvas
            .text(x, cursor_y, PATIENT_HEADING, TextStyle::bold(BODY_SIZE))?;

        let fields = [
            format!("Nome: {}", patient.name),
            format!("CPF/Cartão SUS: {}", patient.identifier),
            format!("Data de Nascimento: {}", format_display(birth_date)),
            format!("Data da Receita: {}", format_display(issue_date)),
        ];
        for (i, field) in fields.iter().enumerate() {
            let y = cursor_y + (i + 1) as f32 * spacing;
            self.canvas.text(x, y, field, TextStyle::regular(BODY_SIZE))?;
        }

        Ok(cursor_y + self.geometry.patient_block_height())
    }

    /// Draw the medicines heading and one entry per line
    ///
    /// Every entry advances the cursor by the same fixed height whether or not
    /// it carries the controlled-substance notice. `first_number` is the
    /// ordinal printed for the first entry.
    pub fn write_medicine_block(
        &mut self,
        cursor_y: f32,
        lines: &[MedicineLine],
        first_number: usize,
    ) -> Result<f32> {
        let margin = self.layout().margin;
        let line_height = self.layout().line_height;
        let entry_height = self.layout().entry_height();
        let entry_x = margin + ENTRY_INDENT;
        let detail_x = margin + DETAIL_INDENT;

        self.canvas
            .text(margin, cursor_y, MEDICINES_HEADING, TextStyle::bold(BODY_SIZE))?;

        let mut entry_top = cursor_y + self.layout().medicines_heading_gap;
        for (offset, medicine) in lines.iter().enumerate() {
            let title = format!(
                "{}. {} {}",
                first_number + offset,
                medicine.name.trim(),
                medicine.dosage.trim()
            );
            let mut y = entry_top;

            self.canvas
                .text(entry_x, y, title.trim_end(), TextStyle::bold(BODY_SIZE))?;
            y += line_height;

            self.canvas.text(
                detail_x,
                y,
                &format!("Apresentação: {}", medicine.presentation),
                TextStyle::regular(BODY_SIZE),
            )?;
            y += line_height;

            self.canvas.text(
                detail_x,
                y,
                &format!("Posologia: {}", medicine.instructions),
                TextStyle::regular(BODY_SIZE),
            )?;
            y += line_height;

            if medicine.controlled {
                self.canvas
                    .text(detail_x, y, CONTROLLED_NOTICE, TextStyle::bold(BODY_SIZE))?;
            }

            entry_top += entry_height;
        }

        Ok(entry_top)
    }

    /// Draw the observations (if any) and the signature line
    ///
    /// The signature rule is anchored `signature_offset` above the bottom edge
    /// but never above the cursor. Returns the y of the signature rule.
    pub fn write_footer(&mut self, cursor_y: f32, observations: Option<&str>) -> Result<f32> {
        let margin = self.layout().margin;
        let line_height = self.layout().line_height;
        let size = self.geometry.size;
        let mut y = cursor_y + self.layout().footer_gap;

        let lines = self.geometry.observation_lines(observations);
        if !lines.is_empty() {
            self.canvas
                .text(margin, y, OBSERVATIONS_HEADING, TextStyle::bold(BODY_SIZE))?;
            let text_top = y + OBSERVATIONS_TEXT_GAP;
            for (i, line) in lines.iter().enumerate() {
                self.canvas.text(
                    margin,
                    text_top + i as f32 * line_height,
                    line,
                    TextStyle::regular(BODY_SIZE),
                )?;
            }
            y += self.geometry.observations_height(observations);
        }

        let signature_y = y.max(size.height - self.layout().signature_offset);
        let center = size.width / 2.0;
        self.canvas
            .hline(center, size.width - margin, signature_y)?;
        self.canvas.text(
            center + SIGNATURE_CAPTION_INDENT,
            signature_y + SIGNATURE_CAPTION_GAP,
            SIGNATURE_CAPTION,
            TextStyle::regular(SIGNATURE_SIZE),
        )?;

        Ok(signature_y)
    }
}
