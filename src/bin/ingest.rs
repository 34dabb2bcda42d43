use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use docchat::{
    config::Config,
    ingest::{ChunkingConfig, IngestService, chunk_document, extract_pages},
    logging,
    weaviate::WeaviateService,
};
use serde_json::json;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "docchat-ingest",
    about = "Chunk PDF documents and insert them into Weaviate"
)]
struct Cli {
    /// PDF file, or directory searched recursively for PDFs.
    path: PathBuf,
    /// Print the chunks as JSON instead of inserting them.
    #[arg(long)]
    dry_run: bool,
    /// Window length in characters (defaults to CHUNK_WINDOW_CHARS).
    #[arg(long)]
    window: Option<usize>,
    /// Overlap between consecutive windows (defaults to CHUNK_OVERLAP_CHARS).
    #[arg(long)]
    overlap: Option<usize>,
    /// Chunks per insert call (defaults to INGEST_BATCH_SIZE).
    #[arg(long)]
    batch_size: Option<usize>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    logging::init_cli_tracing();

    let config = Config::from_env().context("failed to load configuration")?;
    let chunking = ChunkingConfig::new(
        cli.window.unwrap_or(config.chunk_window_chars),
        cli.overlap.unwrap_or(config.chunk_overlap_chars),
    )?;
    let batch_size = cli.batch_size.unwrap_or(config.ingest_batch_size);

    let files = collect_pdfs(&cli.path)?;
    if files.is_empty() {
        bail!("no PDF files found under {}", cli.path.display());
    }

    if cli.dry_run {
        return print_chunks(&files, &chunking);
    }

    let store = WeaviateService::new(config.weaviate_settings())?;
    store
        .ensure_chunk_class()
        .await
        .context("failed to prepare the Weaviate chunk class")?;
    let service = IngestService::new(store, chunking, batch_size, &config.upload_dir)?;

    let mut total_chunks = 0;
    for file in &files {
        let pages = read_pages(file)?;
        let outcome = service
            .ingest_pages(&display_name(file), &pages)
            .await
            .with_context(|| format!("failed to ingest {}", file.display()))?;
        println!(
            "{}: {} page(s), {} chunk(s) inserted",
            outcome.file_name, outcome.total_pages, outcome.inserted
        );
        total_chunks += outcome.inserted;
    }
    println!("{} document(s), {total_chunks} chunk(s)", files.len());
    Ok(())
}

fn collect_pdfs(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("{} does not exist", path.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", path.display()))?;
        if entry.file_type().is_file() && is_pdf(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_pages(path: &Path) -> Result<Vec<docchat::ingest::Page>> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    extract_pages(&bytes).with_context(|| format!("failed to extract text from {}", path.display()))
}

fn print_chunks(files: &[PathBuf], chunking: &ChunkingConfig) -> Result<()> {
    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        let pages = read_pages(file)?;
        let chunks = chunk_document(&pages, &display_name(file), chunking)?;
        documents.push(json!({
            "fileName": display_name(file),
            "totalPages": pages.len(),
            "chunkCount": chunks.len(),
            "chunks": chunks,
        }));
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, &documents).context("failed to write chunks")?;
    writeln!(handle)?;
    Ok(())
}
