//! audiobook-maker - Turn PDF, EPUB, DOCX and text files into chaptered MP3 audiobooks

mod audio;
mod config;
mod error;
mod extract;
mod manifest;
mod pipeline;
mod text;
mod tools;
mod tts;

use anyhow::{Context, Result};
use audio::FfmpegAssembler;
use clap::{Parser, Subcommand};
use config::AudiobookConfig;
use extract::ExtractOptions;
use pipeline::RenderOptions;
use std::path::{Path, PathBuf};
use tts::TtsEngine;

#[derive(Parser, Debug)]
#[command(name = "audiobook-maker")]
#[command(about = "Convert a book to a cleaned, chaptered audiobook using free TTS engines", long_about = None)]
#[command(version)]
struct Args {
    /// Input file (.pdf, .epub, .docx, .doc, .txt, .md)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "audiobook_out")]
    outdir: PathBuf,

    /// Book title (default: document metadata, then "Untitled Book")
    #[arg(short, long)]
    title: Option<String>,

    /// Book author (default: document metadata, then "Unknown Author")
    #[arg(short, long)]
    author: Option<String>,

    /// Force OCR for PDFs
    #[arg(long, default_value_t = false)]
    ocr: bool,

    /// OCR render DPI [default: 300]
    #[arg(long)]
    dpi: Option<u32>,

    /// Tesseract language code, e.g. eng or hin [default: eng]
    #[arg(long)]
    ocr_lang: Option<String>,

    /// TTS engine [default: gtts]
    #[arg(long, value_enum)]
    tts_engine: Option<TtsEngine>,

    /// Voice name substring for the offline engine
    #[arg(long)]
    voice: Option<String>,

    /// Maximum characters per TTS chunk [default: 4000]
    #[arg(long)]
    max_chars: Option<usize>,

    /// Concurrent synthesis requests [default: 2]
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Config file (default: ~/.config/cli-programs/audiobook.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write the manifest and chapter list, then stop before synthesis
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(action, args.config.as_deref());
    }

    let input = args.input.clone().ok_or_else(|| {
        anyhow::anyhow!("Input file is required. Run 'audiobook-maker --help' for usage.")
    })?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);
    config.validate()?;
    log::debug!("configuration: {:?}", config);

    std::fs::create_dir_all(&args.outdir)
        .with_context(|| format!("Failed to create {}", args.outdir.display()))?;
    let outdir = std::fs::canonicalize(&args.outdir)
        .with_context(|| format!("Failed to resolve {}", args.outdir.display()))?;

    let options = ExtractOptions::from_config(args.ocr, &config.ocr);
    let extracted = extract::extract_text(&input, &options).await?;

    let book = pipeline::prepare_book(extracted, args.title.clone(), args.author.clone(), &config)?;
    eprintln!(
        "Book: \"{}\" by {} ({} chapters, {} chunks)",
        book.title,
        book.author,
        book.chapters.len(),
        book.chunk_count()
    );
    book.manifest().write_to(&outdir)?;

    if args.dry_run {
        let listing = book.write_chapter_listing(&outdir)?;
        eprintln!("Dry run: wrote {}", listing.display());
        return Ok(());
    }

    let synthesizer = tts::create_synthesizer(&config.synthesis, &book.language).await?;
    let assembler = FfmpegAssembler::new(audio::assembler::MERGE_TIMEOUT)?;
    log::info!("Using {} with {} worker(s)", synthesizer.name(), config.synthesis.workers);

    let full = pipeline::render_audiobook(
        &book,
        &outdir,
        synthesizer.as_ref(),
        &assembler,
        RenderOptions::from(&config.synthesis),
    )
    .await?;

    let size_mb = std::fs::metadata(&full)?.len() as f64 / (1024.0 * 1024.0);
    eprintln!("Output: {} ({:.1} MB)", full.display(), size_mb);

    Ok(())
}

/// Log at info by default, debug with --debug; RUST_LOG overrides both.
fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(AudiobookConfig::config_path()?),
    }
}

fn load_config(explicit: Option<&Path>) -> Result<AudiobookConfig> {
    let path = config_path(explicit)?;
    if explicit.is_some() && !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }
    Ok(AudiobookConfig::load_from(&path)?)
}

/// Command-line flags win over the config file.
fn apply_overrides(config: &mut AudiobookConfig, args: &Args) {
    if let Some(dpi) = args.dpi {
        config.ocr.dpi = dpi;
    }
    if let Some(lang) = &args.ocr_lang {
        config.ocr.language = lang.clone();
    }
    if let Some(engine) = args.tts_engine {
        config.synthesis.engine = engine;
    }
    if let Some(voice) = &args.voice {
        config.synthesis.voice = Some(voice.clone());
    }
    if let Some(max_chars) = args.max_chars {
        config.chunker.max_chars = max_chars;
    }
    if let Some(jobs) = args.jobs {
        config.synthesis.workers = jobs;
    }
}

fn handle_config_command(action: &ConfigAction, explicit: Option<&Path>) -> Result<()> {
    let path = config_path(explicit)?;
    match action {
        ConfigAction::Show => {
            let config = AudiobookConfig::load_from(&path)?;
            println!("Configuration file: {:?}", path);
            println!();
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists: {} (use --force to overwrite)",
                    path.display()
                );
            }
            AudiobookConfig::default().save_to(&path)?;
            println!("Wrote default configuration to: {}", path.display());
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
    }
    Ok(())
}
