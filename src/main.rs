//! # chunksmith CLI
//!
//! Chunk files, directories or stdin and print the chunks as JSON.
//!
//! ```bash
//! # Chunk a Markdown file into 256-token chunks with 32 tokens of overlap
//! chunksmith docs/guide.md --max-tokens 256 --overlap-tokens 32
//!
//! # Chunk every Markdown file under docs/ as JSON Lines and check the result
//! chunksmith docs --recursive --ext md --format jsonl --validate
//!
//! # Read from stdin
//! cat notes.txt | chunksmith
//! ```

use anyhow::{bail, Context, Result};
use chunksmith::files::{collect_files, read_text};
use chunksmith::{
    CharacterTokenizer, Chunk, ChunkSmith, ChunkerConfig, ParserRegistry, Tokenizer,
    WordTokenizer,
};
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "chunksmith")]
#[command(about = "Deterministic structure-aware text chunking for RAG pipelines")]
#[command(version)]
struct Cli {
    /// Files or directories to chunk (reads stdin when empty)
    paths: Vec<PathBuf>,

    /// JSON file with chunker settings; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum tokens per chunk
    #[arg(short, long)]
    max_tokens: Option<usize>,

    /// Tokens of trailing context repeated in the next chunk
    #[arg(short, long)]
    overlap_tokens: Option<usize>,

    /// Token counting backend
    #[arg(short, long, default_value = "chars")]
    tokenizer: TokenizerKind,

    /// Characters per token for the chars backend
    #[arg(long, default_value = "1.0")]
    chars_per_token: f64,

    /// Path to a tokenizer.json for the huggingface backend
    #[cfg(feature = "huggingface")]
    #[arg(long)]
    hf_tokenizer: Option<PathBuf>,

    /// OpenAI model (e.g. gpt-4o) or encoding (e.g. cl100k_base) for the
    /// tiktoken backend
    #[cfg(feature = "tiktoken")]
    #[arg(long, default_value = "cl100k_base")]
    tiktoken_model: String,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Only chunk files with these extensions (repeatable)
    #[arg(long = "ext")]
    extensions: Vec<String>,

    /// Allow code blocks to be split by line
    #[arg(long)]
    split_code: bool,

    /// Allow lists to be split by line
    #[arg(long)]
    split_lists: bool,

    /// Output format
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Check the chunks and exit non-zero when a check fails
    #[arg(long)]
    validate: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Json,
    Jsonl,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum TokenizerKind {
    #[default]
    Chars,
    Words,
    #[cfg(feature = "huggingface")]
    Huggingface,
    #[cfg(feature = "tiktoken")]
    Tiktoken,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = load_config(&cli)?;
    let smith = ChunkSmith::from_config(config).tokenizer(build_tokenizer(&cli)?);

    let documents = read_documents(&cli)?;
    let registry = ParserRegistry::with_defaults();
    let mut all_chunks: Vec<Chunk> = Vec::new();
    let mut failed_checks = 0;

    for (source, text) in &documents {
        let mut per_doc = smith.clone();
        if let Some(path) = source {
            per_doc = per_doc
                .parser(registry.select(path))
                .source(path.display().to_string());
        }
        let (chunks, report) = if cli.validate {
            let (chunks, report) = per_doc
                .chunk_and_report(text)
                .with_context(|| format!("Failed to chunk {}", describe(source.as_deref())))?;
            (chunks, Some(report))
        } else {
            let chunks = per_doc
                .chunk(text)
                .with_context(|| format!("Failed to chunk {}", describe(source.as_deref())))?;
            (chunks, None)
        };
        info!(
            source = %describe(source.as_deref()),
            chunks = chunks.len(),
            "chunked"
        );

        if let Some(report) = report {
            for violation in &report.token_violations {
                warn!("{}", violation);
            }
            if let Some(roundtrip) = &report.roundtrip {
                info!(ratio = roundtrip.ratio, passed = roundtrip.passed, "roundtrip");
            }
            for warning in &report.reference_warnings {
                warn!("{}", warning);
            }
            if !report.is_valid() {
                failed_checks += 1;
            }
        }

        all_chunks.extend(chunks);
    }

    write_chunks(&all_chunks, cli.format, cli.pretty)?;

    if failed_checks > 0 {
        bail!("{} document(s) failed validation", failed_checks);
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ChunkerConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            ChunkerConfig::from_json_str(&json)?
        }
        None => ChunkerConfig::default(),
    };

    if let Some(max_tokens) = cli.max_tokens {
        config.max_tokens = max_tokens;
    }
    if let Some(overlap_tokens) = cli.overlap_tokens {
        config.overlap_tokens = overlap_tokens;
    }
    if cli.split_code {
        config.preserve_code_blocks = false;
    }
    if cli.split_lists {
        config.preserve_lists = false;
    }
    config.validate()?;
    Ok(config)
}

fn build_tokenizer(cli: &Cli) -> Result<Arc<dyn Tokenizer>> {
    let tokenizer: Arc<dyn Tokenizer> = match cli.tokenizer {
        TokenizerKind::Chars => Arc::new(CharacterTokenizer::with_chars_per_token(
            cli.chars_per_token,
        )?),
        TokenizerKind::Words => Arc::new(WordTokenizer),
        #[cfg(feature = "huggingface")]
        TokenizerKind::Huggingface => {
            let Some(path) = &cli.hf_tokenizer else {
                bail!("--hf-tokenizer is required with --tokenizer huggingface");
            };
            Arc::new(chunksmith::tokenizer::HuggingFaceTokenizer::from_file(path)?)
        }
        #[cfg(feature = "tiktoken")]
        TokenizerKind::Tiktoken => {
            use chunksmith::tokenizer::TiktokenTokenizer;
            let name = cli.tiktoken_model.as_str();
            Arc::new(if name.ends_with("_base") || name == "p50k_edit" {
                TiktokenTokenizer::for_encoding(name)?
            } else {
                TiktokenTokenizer::for_model(name)?
            })
        }
    };
    Ok(tokenizer)
}

/// Resolve the inputs into `(path, text)` pairs; `None` is stdin
fn read_documents(cli: &Cli) -> Result<Vec<(Option<PathBuf>, String)>> {
    if cli.paths.is_empty() {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(vec![(None, text)]);
    }

    let extensions: Vec<&str> = cli.extensions.iter().map(String::as_str).collect();
    let filter = (!extensions.is_empty()).then_some(extensions.as_slice());

    let mut documents = Vec::new();
    for path in &cli.paths {
        let files = if path.is_dir() {
            collect_files(path, cli.recursive, filter)?
        } else {
            vec![path.clone()]
        };
        for file in files {
            let text = read_text(&file)?;
            documents.push((Some(file), text));
        }
    }
    Ok(documents)
}

fn describe(source: Option<&Path>) -> String {
    source.map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string())
}

fn write_chunks(chunks: &[Chunk], format: OutputFormat, pretty: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match format {
        OutputFormat::Json => {
            let values: Vec<serde_json::Value> = chunks.iter().map(Chunk::to_json_value).collect();
            if pretty {
                serde_json::to_writer_pretty(&mut out, &values)?;
            } else {
                serde_json::to_writer(&mut out, &values)?;
            }
            writeln!(out)?;
        }
        OutputFormat::Jsonl => {
            for chunk in chunks {
                writeln!(out, "{}", chunk.to_json(false)?)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}
