use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use rxdoc_core::calendar::format_display;
use rxdoc_core::output::suggest_filename_with_extension;
use rxdoc_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rxdoc")]
#[command(about = "Prescription document composer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override config file location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a prescription and write it to the output directory
    Render {
        /// Prescription document (JSON)
        file: PathBuf,

        /// Number of monthly copies (overrides the document)
        #[arg(long)]
        months: Option<u32>,

        /// Override output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pdf)]
        format: Format,

        /// Replace an existing file instead of picking a numbered name
        #[arg(long)]
        overwrite: bool,

        /// Dry run - show the page plan without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show how the document would be paginated
    Plan {
        /// Prescription document (JSON)
        file: PathBuf,

        /// Number of monthly copies (overrides the document)
        #[arg(long)]
        months: Option<u32>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// PDF document
    Pdf,
    /// JSON dump of the drawing operations per page
    Layout,
}

fn main() -> Result<()> {
    rxdoc_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Render {
            file,
            months,
            output_dir,
            format,
            overwrite,
            dry_run,
        } => {
            let document = load_document(&file, months)?;
            if dry_run {
                return print_plan(&document, &config);
            }

            let output_dir = output_dir.unwrap_or_else(|| config.output.output_dir.clone());
            let overwrite = overwrite || config.output.overwrite;
            cmd_render(&document, &config, format, output_dir, overwrite)
        }
        Commands::Plan { file, months } => {
            let document = load_document(&file, months)?;
            print_plan(&document, &config)
        }
    }
}

fn load_document(path: &Path, months: Option<u32>) -> Result<PrescriptionDocument> {
    let contents = std::fs::read_to_string(path)?;
    let mut document: PrescriptionDocument = serde_json::from_str(&contents)?;
    if let Some(months) = months {
        document.replication_count = months;
    }
    tracing::debug!(
        "Loaded {:?}: {} medicines, {} copies requested",
        path,
        document.medicines.len(),
        document.replication_count
    );
    Ok(document)
}

fn cmd_render(
    document: &PrescriptionDocument,
    config: &Config,
    format: Format,
    output_dir: PathBuf,
    overwrite: bool,
) -> Result<()> {
    let size = config.page.size();
    let generated_at = Utc::now();

    let rendered = match format {
        Format::Pdf => {
            let title = format!("Receita - {}", document.patient.name);
            let canvas = PdfCanvas::new(&title, size, generated_at)?;
            render_prescription(
                document,
                &config.layout,
                &config.letterhead,
                canvas,
                generated_at,
            )?
        }
        Format::Layout => {
            let mut rendered = render_prescription(
                document,
                &config.layout,
                &config.letterhead,
                RecordingCanvas::new(size),
                generated_at,
            )?;
            rendered.filename =
                suggest_filename_with_extension(&document.patient, generated_at, "json");
            rendered
        }
    };

    let mut sink = FileSink::new(output_dir).with_overwrite(overwrite);
    let path = sink.write(&rendered.bytes, &rendered.filename)?;

    println!(
        "✓ {} copies, {} pages written to {}",
        rendered.copies.len(),
        rendered.page_count(),
        path.display()
    );
    Ok(())
}

fn print_plan(document: &PrescriptionDocument, config: &Config) -> Result<()> {
    let size = config.page.size();
    let mut canvas = RecordingCanvas::new(size);
    let copies = MonthReplicator::new(&config.layout, &config.letterhead)
        .generate(document, &mut canvas)?;

    println!("Patient:   {}", document.patient.name);
    println!("Medicines: {}", document.medicines.len());
    if let Some(copy) = copies.first() {
        println!(
            "Capacity:  {} on first page, {} on continuation pages",
            copy.first_page_capacity, copy.continuation_capacity
        );
    }
    println!();

    for copy in &copies {
        let sizes: Vec<String> = copy
            .pages
            .iter()
            .map(|p| p.medicines.len().to_string())
            .collect();
        println!(
            "Copy {}: {} - {} page(s) [{}]",
            copy.month_offset + 1,
            format_display(copy.issue_date),
            copy.pages.len(),
            sizes.join(", ")
        );
        for page in copy.pages.iter().filter(|p| !p.fits(size.height)) {
            println!("  ⚠ page {} runs past the bottom of the page", page.index);
        }
    }

    println!();
    println!(
        "Total: {} copies, {} pages",
        copies.len(),
        copies.iter().map(|c| c.pages.len()).sum::<usize>()
    );
    Ok(())
}
