//! Core domain types for the prescription document engine.
//!
//! This module defines:
//! - The prescription input handed over by the persistence layer
//! - The layout output (copies, pages, regions) produced by the engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Input Types
// ============================================================================

/// Patient identity as printed on the prescription
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Patient {
    pub name: String,
    /// Tax number or health card number
    pub identifier: String,
    /// Birth date as stored (`YYYY-MM-DD`, RFC 3339 or `dd/mm/yyyy`)
    pub birth_date: String,
}

/// A single prescribed medicine with its dosing text
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicineLine {
    pub name: String,
    pub dosage: String,
    pub presentation: String,
    pub instructions: String,
    #[serde(default)]
    pub controlled: bool,
}

/// A complete prescription ready for layout
///
/// Medicine order is prescriptive and is preserved on every page of every copy.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrescriptionDocument {
    pub patient: Patient,
    #[serde(default)]
    pub medicines: Vec<MedicineLine>,
    #[serde(default)]
    pub observations: Option<String>,
    /// Issue date as stored (`YYYY-MM-DD`, RFC 3339 or `dd/mm/yyyy`)
    pub issue_date: String,
    /// Number of consecutive monthly copies
    #[serde(default = "default_replication_count", alias = "months")]
    pub replication_count: u32,
}

fn default_replication_count() -> u32 {
    1
}

impl PrescriptionDocument {
    /// Observations with surrounding whitespace removed, `None` when blank
    pub fn observations(&self) -> Option<&str> {
        self.observations
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

// ============================================================================
// Layout Types
// ============================================================================

/// The kind of block a region of a page holds
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Header,
    PatientBlock,
    Medicines,
    Footer,
}

/// A vertical span of a page occupied by one block
///
/// Offsets are millimetres from the top edge of the page.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Region {
    pub kind: RegionKind,
    pub top: f32,
    pub bottom: f32,
}

/// One rendered page of a copy
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Page {
    /// 1-based index within the copy
    pub index: usize,
    /// Pages in this copy
    pub total: usize,
    pub regions: Vec<Region>,
    /// The chunk of medicine lines laid out on this page
    pub medicines: Vec<MedicineLine>,
    /// Ordinal printed next to the first medicine on this page
    pub first_entry_number: usize,
}

impl Page {
    /// Check whether the page holds a region of the given kind
    pub fn has_region(&self, kind: RegionKind) -> bool {
        self.regions.iter().any(|r| r.kind == kind)
    }

    /// Find the region of the given kind
    pub fn region(&self, kind: RegionKind) -> Option<&Region> {
        self.regions.iter().find(|r| r.kind == kind)
    }

    /// Check that every region ends on the page
    ///
    /// False when the footer was pushed past the bottom edge, which happens
    /// when the observations alone do not fit on a page.
    pub fn fits(&self, page_height: f32) -> bool {
        self.regions.iter().all(|r| r.bottom <= page_height)
    }
}

/// One replicated instance of the document for a single issue date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MonthlyCopy {
    /// Months added to the original issue date
    pub month_offset: u32,
    pub issue_date: NaiveDate,
    /// Entries planned for the first page
    pub first_page_capacity: usize,
    /// Entries planned for each continuation page
    pub continuation_capacity: usize,
    pub pages: Vec<Page>,
}

impl MonthlyCopy {
    /// Medicine lines across all pages, in page order
    pub fn medicines(&self) -> impl Iterator<Item = &MedicineLine> {
        self.pages.iter().flat_map(|p| p.medicines.iter())
    }
}
