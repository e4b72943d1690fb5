//! Batch front end for the editing pipeline.
//!
//! Drives a whole session from the command line: load a PDF, replay a
//! JSON edit script through the document session, and export the
//! flattened result. The same script format backs single-page PNG
//! captures for quick inspection.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pagemark_core::{
    load_pdf_file, Color, DocumentSession, EffectKind, PixelRect, RenderOutcome, SessionConfig,
};
use pagemark_engine::{PageRasterizer, RasterPdfBuilder, RasterSource};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "pagemark")]
#[command(about = "Blur, erase, and label regions of a PDF, then flatten to a new PDF")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Apply a JSON edit script and export a flattened PDF.
    Apply {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, value_name = "EDITS.json")]
        script: PathBuf,
        #[arg(short, long, value_name = "OUT.pdf")]
        output: PathBuf,
    },
    /// Composite one page (with optional edits) and write it as PNG.
    PagePng {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, value_name = "EDITS.json")]
        script: Option<PathBuf>,
        #[arg(short, long, value_name = "OUT.png")]
        output: Option<PathBuf>,
    },
    /// Print CLI version.
    Version,
}

/// Edit script: per-page operation lists, applied in order.
#[derive(Debug, Deserialize)]
struct EditScript {
    pages: Vec<PageEdits>,
}

#[derive(Debug, Deserialize)]
struct PageEdits {
    page: u32,
    ops: Vec<EditOp>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum EditOp {
    Blur {
        rect: RectSpec,
    },
    Erase {
        rect: RectSpec,
    },
    Annotate {
        rect: RectSpec,
        text: String,
        #[serde(default)]
        color: Option<ColorSpec>,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RectSpec {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl From<RectSpec> for PixelRect {
    fn from(rect: RectSpec) -> Self {
        PixelRect::new(rect.x, rect.y, rect.width, rect.height)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct ColorSpec {
    r: u8,
    g: u8,
    b: u8,
    #[serde(default = "default_alpha")]
    a: u8,
}

/// The editor's translucent annotation fill (~30% opacity).
fn default_alpha() -> u8 {
    77
}

impl From<ColorSpec> for Color {
    fn from(color: ColorSpec) -> Self {
        Color::new(color.r, color.g, color.b, color.a)
    }
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    first_page_size_pt: Option<PageSizeOutput>,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let _ = env_logger::try_init();

    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Apply {
            file,
            script,
            output,
        } => run_apply(&file, &script, &output),
        Commands::PagePng {
            file,
            page,
            script,
            output,
        } => run_page_png(&file, page, script.as_deref(), output.as_deref()),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

#[cfg(feature = "pdfium")]
fn open_rasterizer() -> Result<pagemark_engine::PdfiumRasterizer> {
    pagemark_engine::PdfiumRasterizer::from_system_library()
        .context("PDFium library unavailable")
}

#[cfg(not(feature = "pdfium"))]
fn open_rasterizer() -> Result<pagemark_engine::LopdfRasterizer> {
    Ok(pagemark_engine::LopdfRasterizer::new())
}

fn run_info(file: &Path) -> Result<()> {
    let config = SessionConfig::default();
    let loaded = load_pdf_file(file, &config).context("failed to load PDF")?;

    let mut rasterizer = open_rasterizer()?;
    let handle = rasterizer
        .open(RasterSource::Bytes(loaded.bytes))
        .context("failed to open PDF")?;

    let page_count = rasterizer.page_count(handle)?;
    let first_page_size_pt = if page_count > 0 {
        let size = rasterizer.page_size(handle, 0)?;
        Some(PageSizeOutput {
            width: size.width,
            height: size.height,
        })
    } else {
        None
    };

    let payload = InfoOutput {
        path: file.display().to_string(),
        page_count,
        first_page_size_pt,
    };

    println!("{}", serde_json::to_string_pretty(&payload)?);

    rasterizer.close(handle)?;

    Ok(())
}

fn run_apply(file: &Path, script: &Path, output: &Path) -> Result<()> {
    let script = read_script(script)?;

    let mut rasterizer = open_rasterizer()?;
    let mut session = open_session(file, &mut rasterizer)?;

    apply_script(&mut session, &rasterizer, &script)?;

    let mut builder = RasterPdfBuilder::new();
    let bytes = session
        .export_document(&rasterizer, &mut builder)
        .context("export failed")?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("{}", output.display());
    Ok(())
}

fn run_page_png(
    file: &Path,
    page: u32,
    script: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    if page == 0 {
        bail!("--page is 1-based and must be >= 1");
    }

    let mut rasterizer = open_rasterizer()?;
    let mut session = open_session(file, &mut rasterizer)?;

    if let Some(script) = script {
        let script = read_script(script)?;
        apply_script(&mut session, &rasterizer, &script)?;
    }

    render_or_bail(&mut session, &rasterizer, page)?;
    let png = session.capture_page_png()?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_png_output(file, page));
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, png)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("{}", output.display());
    Ok(())
}

fn open_session<R: PageRasterizer>(
    file: &Path,
    rasterizer: &mut R,
) -> Result<DocumentSession> {
    let config = SessionConfig::default();
    let loaded = load_pdf_file(file, &config).context("failed to load PDF")?;
    DocumentSession::open(rasterizer, loaded, config).context("failed to open session")
}

fn read_script(path: &Path) -> Result<EditScript> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("invalid edit script {}", path.display()))
}

fn apply_script<R: PageRasterizer>(
    session: &mut DocumentSession,
    rasterizer: &R,
    script: &EditScript,
) -> Result<()> {
    for edits in &script.pages {
        if edits.page == 0 || edits.page > session.page_count() {
            bail!(
                "script targets page {} but the document has {} pages",
                edits.page,
                session.page_count()
            );
        }

        render_or_bail(session, rasterizer, edits.page)?;

        for op in &edits.ops {
            let applied = match op {
                EditOp::Blur { rect } => session.apply_effect(EffectKind::Blur, (*rect).into()),
                EditOp::Erase { rect } => session.apply_effect(EffectKind::Erase, (*rect).into()),
                EditOp::Annotate { rect, text, color } => session.apply_annotation(
                    (*rect).into(),
                    text,
                    color.map(Color::from).unwrap_or_else(Color::random_light),
                ),
            };
            if !applied {
                bail!(
                    "edit rejected on page {} (empty rectangle or empty text)",
                    edits.page
                );
            }
        }
    }
    Ok(())
}

fn render_or_bail<R: PageRasterizer>(
    session: &mut DocumentSession,
    rasterizer: &R,
    page: u32,
) -> Result<()> {
    match session
        .render_page(rasterizer, page)
        .with_context(|| format!("failed to render page {page}"))?
    {
        RenderOutcome::Rendered { .. } => Ok(()),
        RenderOutcome::Cancelled => bail!("render of page {page} was cancelled"),
    }
}

fn default_png_output(file: &Path, page: u32) -> PathBuf {
    let stem = file
        .file_stem()
        .and_then(|name| name.to_str())
        .unwrap_or("page");

    file.with_file_name(format!("{stem}-page-{page}.png"))
}
