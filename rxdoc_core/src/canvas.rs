//! Rendering surface abstraction.
//!
//! The engine never talks to a rendering library directly. Everything it draws
//! goes through [`Canvas`]: place text, draw a horizontal rule, start a page.
//! Coordinates are millimetres from the top-left corner, y growing downward.

use crate::Result;
use serde::{Deserialize, Serialize};

/// Physical page size in millimetres
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// ISO A4 portrait
    pub const A4: PageSize = PageSize {
        width: 210.0,
        height: 297.0,
    };
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

/// Font weight
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Weight {
    #[default]
    Regular,
    Bold,
}

/// Horizontal anchoring of a text run relative to its x coordinate
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// How a text run is drawn
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub weight: Weight,
    pub align: Align,
}

impl TextStyle {
    pub fn regular(size: f32) -> Self {
        Self {
            size,
            weight: Weight::Regular,
            align: Align::Left,
        }
    }

    pub fn bold(size: f32) -> Self {
        Self {
            size,
            weight: Weight::Bold,
            align: Align::Left,
        }
    }

    pub fn centered(self) -> Self {
        Self {
            align: Align::Center,
            ..self
        }
    }

    pub fn right_aligned(self) -> Self {
        Self {
            align: Align::Right,
            ..self
        }
    }
}

/// Drawing surface the engine renders onto
pub trait Canvas {
    /// Start a new page; every draw call after it lands on that page
    fn new_page(&mut self) -> Result<()>;

    /// Place a run of text with its baseline at `y`
    fn text(&mut self, x: f32, y: f32, text: &str, style: TextStyle) -> Result<()>;

    /// Draw a horizontal rule from `x1` to `x2` at `y`
    fn hline(&mut self, x1: f32, x2: f32, y: f32) -> Result<()>;

    fn page_dimensions(&self) -> PageSize;

    /// Pages started so far
    fn page_count(&self) -> usize;

    /// Finalize the surface into its output bytes
    fn finish(self) -> Result<Vec<u8>>
    where
        Self: Sized;
}

/// A single recorded draw call
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        text: String,
        style: TextStyle,
    },
    Hline {
        x1: f32,
        x2: f32,
        y: f32,
    },
}

/// Canvas that records draw calls per page
///
/// `finish` emits the recorded pages as JSON, which makes it a deterministic
/// backend for tests and for inspecting a layout without a PDF viewer.
#[derive(Clone, Debug, Default)]
pub struct RecordingCanvas {
    size: PageSize,
    pages: Vec<Vec<DrawOp>>,
}

#[derive(Serialize)]
struct RecordedLayout<'a> {
    page_size: PageSize,
    pages: &'a [Vec<DrawOp>],
}

impl RecordingCanvas {
    pub fn new(size: PageSize) -> Self {
        Self {
            size,
            pages: Vec::new(),
        }
    }

    /// Recorded operations, one vector per page
    pub fn pages(&self) -> &[Vec<DrawOp>] {
        &self.pages
    }

    /// Text runs of one page, in drawing order
    pub fn page_texts(&self, index: usize) -> Vec<&str> {
        self.pages
            .get(index)
            .map(|ops| {
                ops.iter()
                    .filter_map(|op| match op {
                        DrawOp::Text { text, .. } => Some(text.as_str()),
                        DrawOp::Hline { .. } => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn current_page(&mut self) -> &mut Vec<DrawOp> {
        if self.pages.is_empty() {
            tracing::warn!("Draw call before the first page; starting one implicitly");
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }
}

impl Canvas for RecordingCanvas {
    fn new_page(&mut self) -> Result<()> {
        self.pages.push(Vec::new());
        Ok(())
    }

    fn text(&mut self, x: f32, y: f32, text: &str, style: TextStyle) -> Result<()> {
        self.current_page().push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
            style,
        });
        Ok(())
    }

    fn hline(&mut self, x1: f32, x2: f32, y: f32) -> Result<()> {
        self.current_page().push(DrawOp::Hline { x1, x2, y });
        Ok(())
    }

    fn page_dimensions(&self) -> PageSize {
        self.size
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn finish(self) -> Result<Vec<u8>> {
        let layout = RecordedLayout {
            page_size: self.size,
            pages: &self.pages,
        };
        Ok(serde_json::to_vec_pretty(&layout)?)
    }
}
