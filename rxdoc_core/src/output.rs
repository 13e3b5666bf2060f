//! Output serialization.
//!
//! Turns a fully composed canvas into the final byte sequence and derives a
//! deterministic file name for it. Storage is left to a [`DocumentSink`].
//!
//! [`DocumentSink`]: crate::sink::DocumentSink

use crate::canvas::Canvas;
use crate::config::{LayoutConfig, LetterheadConfig};
use crate::replicator::MonthReplicator;
use crate::{Error, MonthlyCopy, Patient, PrescriptionDocument, Result};
use chrono::{DateTime, Utc};

/// Extension of the rendered prescription document
pub const DOCUMENT_EXTENSION: &str = "pdf";

const FILENAME_PREFIX: &str = "Receita";
const UNNAMED_PATIENT: &str = "paciente";
const RESERVED_FILENAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// A finished document and the name it should be stored under
#[derive(Clone, Debug)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub copies: Vec<MonthlyCopy>,
}

impl RenderedDocument {
    /// Pages across every copy
    pub fn page_count(&self) -> usize {
        self.copies.iter().map(|c| c.pages.len()).sum()
    }
}

/// Finalize the canvas holding every page of every copy
///
/// Pages are already on the canvas in copy order, then page order; there are
/// no markers between copies. Fails if the canvas does not hold exactly the
/// pages the copies describe.
pub fn serialize<C: Canvas>(copies: &[MonthlyCopy], canvas: C) -> Result<Vec<u8>> {
    let expected: usize = copies.iter().map(|c| c.pages.len()).sum();
    let actual = canvas.page_count();
    if expected != actual {
        return Err(Error::PageCountMismatch { expected, actual });
    }

    let bytes = canvas.finish()?;
    tracing::debug!("Serialized {} pages into {} bytes", expected, bytes.len());
    Ok(bytes)
}

/// File name for the rendered prescription
///
/// `Receita_<patient name>_<YYYY-MM-DD>.pdf`, with runs of whitespace in the
/// name collapsed to a single `_`.
pub fn suggest_filename(patient: &Patient, generated_at: DateTime<Utc>) -> String {
    suggest_filename_with_extension(patient, generated_at, DOCUMENT_EXTENSION)
}

/// Same as [`suggest_filename`] with a caller-chosen extension
pub fn suggest_filename_with_extension(
    patient: &Patient,
    generated_at: DateTime<Utc>,
    extension: &str,
) -> String {
    format!(
        "{}_{}_{}.{}",
        FILENAME_PREFIX,
        sanitize_name(&patient.name),
        generated_at.format("%Y-%m-%d"),
        extension
    )
}

fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !RESERVED_FILENAME_CHARS.contains(c) && !c.is_control() || c.is_whitespace())
        .collect();
    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join("_");

    if joined.is_empty() {
        UNNAMED_PATIENT.to_string()
    } else {
        joined
    }
}

/// Generate and serialize a prescription in one call
///
/// The canvas is consumed: either the whole multi-copy document comes back,
/// or nothing does.
pub fn render_prescription<C: Canvas>(
    document: &PrescriptionDocument,
    layout: &LayoutConfig,
    letterhead: &LetterheadConfig,
    mut canvas: C,
    generated_at: DateTime<Utc>,
) -> Result<RenderedDocument> {
    let copies = MonthReplicator::new(layout, letterhead).generate(document, &mut canvas)?;
    let bytes = serialize(&copies, canvas)?;
    let filename = suggest_filename(&document.patient, generated_at);

    let rendered = RenderedDocument {
        bytes,
        filename,
        copies,
    };
    tracing::info!(
        "Rendered {} ({} pages, {} bytes)",
        rendered.filename,
        rendered.page_count(),
        rendered.bytes.len()
    );
    Ok(rendered)
}
