#![forbid(unsafe_code)]

//! Core composition engine for rxdoc prescription documents.
//!
//! This crate provides:
//! - Domain types (patient, medicine lines, pages, monthly copies)
//! - Page composition onto an abstract canvas
//! - Overflow planning for long medicine lists
//! - Monthly replication of a prescription
//! - PDF and layout-dump canvases, output serialization and file sinks

pub mod types;
pub mod error;
pub mod calendar;
pub mod metrics;
pub mod canvas;
pub mod pdf;
pub mod config;
pub mod logging;
pub mod composer;
pub mod planner;
pub mod replicator;
pub mod output;
pub mod sink;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use canvas::{Canvas, PageSize, RecordingCanvas};
pub use pdf::PdfCanvas;
pub use planner::{OverflowPlanner, PageKind};
pub use replicator::MonthReplicator;
pub use output::{render_prescription, serialize, suggest_filename, RenderedDocument};
pub use sink::{DocumentSink, FileSink};
