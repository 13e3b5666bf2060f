//! Configuration file support for rxdoc.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/rxdoc/config.toml`.
//! Every field has a default, so a partial file (or none at all) is valid.

use crate::canvas::PageSize;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lines the composer draws for a controlled medicine entry
pub const MIN_LINES_PER_ENTRY: u32 = 4;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub page: PageConfig,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub letterhead: LetterheadConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Physical page size
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageConfig {
    #[serde(default = "default_page_width")]
    pub width_mm: f32,

    #[serde(default = "default_page_height")]
    pub height_mm: f32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            width_mm: default_page_width(),
            height_mm: default_page_height(),
        }
    }
}

impl PageConfig {
    pub fn size(&self) -> PageSize {
        PageSize {
            width: self.width_mm,
            height: self.height_mm,
        }
    }
}

/// Vertical rhythm and spacing of the page, in millimetres
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_margin")]
    pub margin: f32,

    #[serde(default = "default_line_height")]
    pub line_height: f32,

    /// Extra space after each medicine entry
    #[serde(default = "default_entry_gap")]
    pub entry_gap: f32,

    /// Text lines reserved per medicine entry, controlled annotation included
    #[serde(default = "default_lines_per_entry")]
    pub lines_per_entry: u32,

    /// Baseline of the first letterhead line
    #[serde(default = "default_header_top")]
    pub header_top: f32,

    #[serde(default = "default_letterhead_spacing")]
    pub letterhead_spacing: f32,

    #[serde(default = "default_patient_field_spacing")]
    pub patient_field_spacing: f32,

    /// Distance from the medicines heading to the first entry
    #[serde(default = "default_medicines_heading_gap")]
    pub medicines_heading_gap: f32,

    /// Distance from the last medicine entry to the footer
    #[serde(default = "default_footer_gap")]
    pub footer_gap: f32,

    /// Signature rule sits at least this far above the bottom edge
    #[serde(default = "default_signature_offset")]
    pub signature_offset: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: default_margin(),
            line_height: default_line_height(),
            entry_gap: default_entry_gap(),
            lines_per_entry: default_lines_per_entry(),
            header_top: default_header_top(),
            letterhead_spacing: default_letterhead_spacing(),
            patient_field_spacing: default_patient_field_spacing(),
            medicines_heading_gap: default_medicines_heading_gap(),
            footer_gap: default_footer_gap(),
            signature_offset: default_signature_offset(),
        }
    }
}

impl LayoutConfig {
    /// Vertical space one medicine entry consumes
    pub fn entry_height(&self) -> f32 {
        self.lines_per_entry as f32 * self.line_height + self.entry_gap
    }

    /// Check the values can produce a layout at all
    pub fn validate(&self) -> Result<()> {
        if self.lines_per_entry < MIN_LINES_PER_ENTRY {
            return Err(Error::Config(format!(
                "lines_per_entry must be at least {}, got {}",
                MIN_LINES_PER_ENTRY, self.lines_per_entry
            )));
        }
        if self.line_height.is_nan() || self.line_height <= 0.0 {
            return Err(Error::Config("line_height must be positive".into()));
        }
        if self.entry_gap < 0.0 || self.margin < 0.0 {
            return Err(Error::Config("entry_gap and margin must not be negative".into()));
        }
        Ok(())
    }
}

/// Institution letterhead printed at the top of every page
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LetterheadConfig {
    /// Bold lines (institution names)
    #[serde(default = "default_title_lines")]
    pub title_lines: Vec<String>,

    /// Regular lines (address, phone)
    #[serde(default = "default_detail_lines")]
    pub detail_lines: Vec<String>,

    #[serde(default = "default_document_title")]
    pub document_title: String,
}

impl Default for LetterheadConfig {
    fn default() -> Self {
        Self {
            title_lines: default_title_lines(),
            detail_lines: default_detail_lines(),
            document_title: default_document_title(),
        }
    }
}

/// Where rendered documents are written
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Replace an existing file instead of picking a numbered name
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            overwrite: false,
        }
    }
}

// Default value functions
fn default_page_width() -> f32 {
    PageSize::A4.width
}

fn default_page_height() -> f32 {
    PageSize::A4.height
}

fn default_margin() -> f32 {
    20.0
}

fn default_line_height() -> f32 {
    6.0
}

fn default_entry_gap() -> f32 {
    3.0
}

fn default_lines_per_entry() -> u32 {
    4
}

fn default_header_top() -> f32 {
    25.0
}

fn default_letterhead_spacing() -> f32 {
    7.0
}

fn default_patient_field_spacing() -> f32 {
    8.0
}

fn default_medicines_heading_gap() -> f32 {
    12.0
}

fn default_footer_gap() -> f32 {
    10.0
}

fn default_signature_offset() -> f32 {
    60.0
}

fn default_title_lines() -> Vec<String> {
    vec![
        "PREFEITURA MUNICIPAL DE PEROBAL".into(),
        "SECRETARIA MUNICIPAL DE SAÚDE".into(),
    ]
}

fn default_detail_lines() -> Vec<String> {
    vec![
        "Rua Principal, 123 - Centro - Perobal/PR".into(),
        "Telefone: (44) 3000-0000".into(),
    ]
}

fn default_document_title() -> String {
    "RECEITA MÉDICA".into()
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_output_dir() -> PathBuf {
    let base = dirs::document_dir().unwrap_or_else(home_dir);
    base.join("rxdoc")
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.layout.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir().join(".config"));
        base.join("rxdoc").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
