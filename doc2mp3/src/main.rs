//! doc2mp3 - Convert DOCX/TXT manuscripts into MP3 audiobooks using neural TTS

mod audio;
mod chapters;
mod config;
mod document;
mod error;
mod naming;
mod synth;
mod text;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{Doc2Mp3Config, OutputSpec};
use error::ConvertError;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tts_client::{SpeechConfig, SpeechProvider, VoiceSettings};

#[derive(Parser, Debug)]
#[command(name = "doc2mp3")]
#[command(about = "Convert DOCX/TXT manuscripts into per-chapter MP3s plus a combined audiobook", long_about = None)]
#[command(version)]
struct Args {
    /// Input manuscript (.docx or .txt)
    source: Option<PathBuf>,

    /// Output directory for MP3 files
    #[arg(long, default_value = "output_mp3")]
    outdir: PathBuf,

    /// Filename prefix (default: derived from title/heading/filename)
    #[arg(long)]
    prefix: Option<String>,

    /// Album tag for MP3 metadata
    #[arg(long, default_value = "Audiobook")]
    album: String,

    /// Artist/author tag for MP3 metadata
    #[arg(long, default_value = "Unknown Author")]
    author: String,

    /// Neural voice (e.g. fi-FI-SelmaNeural)
    #[arg(long)]
    voice: Option<String>,

    /// Speech rate (accepts -5 or -5%)
    #[arg(long)]
    rate: Option<String>,

    /// Volume (accepts +3, +3% or +3dB)
    #[arg(long)]
    volume: Option<String>,

    /// Skip per-chapter export; only write the combined file
    #[arg(long)]
    no_per_chapter: bool,

    /// Filename for the combined audiobook
    #[arg(long, default_value = "book_combined.mp3")]
    combined_name: String,

    /// Silence between chapters in the combined file (ms)
    #[arg(long)]
    chapter_gap_ms: Option<u64>,

    /// MP3 bitrate (128k-320k)
    #[arg(long)]
    bitrate: Option<String>,

    /// Concurrent synthesis requests
    #[arg(long)]
    concurrency: Option<usize>,

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
    /// Print the combined-output path for an input without converting
    ///
    /// Uses the same prefix precedence as conversion, so batch wrappers can
    /// implement skip-if-exists checks against the exact output path.
    Predict {
        /// Input manuscript (.docx or .txt)
        source: PathBuf,

        /// Filename prefix override
        #[arg(long)]
        prefix: Option<String>,
    },
    /// List voices offered by the synthesis service
    Voices,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the default voice
    SetVoice {
        /// Neural voice identifier
        voice: String,
    },
    /// Set the default speech rate
    SetRate {
        /// Rate value (e.g. -5 or -5%)
        rate: String,
    },
    /// Set the default volume
    SetVolume {
        /// Volume value (e.g. +3, +3% or +3dB)
        volume: String,
    },
    /// Set the default MP3 bitrate
    SetBitrate {
        /// Bitrate (e.g. 192k)
        bitrate: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle subcommands
    match &args.command {
        Some(Commands::Config { action }) => {
            return handle_config_command(action);
        }
        Some(Commands::Predict { source, prefix }) => {
            return handle_predict(source, prefix.as_deref(), &args);
        }
        Some(Commands::Voices) => {
            return handle_voices().await;
        }
        None => {}
    }

    // Require an input file for conversion
    let source = args.source.clone().ok_or_else(|| {
        anyhow::anyhow!("Input file path is required. Run 'doc2mp3 --help' for usage.")
    })?;

    if !source.exists() {
        anyhow::bail!("Input file not found: {}", source.display());
    }

    // Load configuration and resolve run settings
    let config = Doc2Mp3Config::load().context("Failed to load configuration")?;
    let spec = resolve_output_spec(&args, &config);
    spec.validate()?;

    // Validate voice parameters before any synthesis starts
    let settings = VoiceSettings::new(&spec.voice, &spec.rate, &spec.volume)
        .map_err(|e| ConvertError::InvalidConfiguration(e.to_string()))?;

    if !audio::is_ffmpeg_available() {
        anyhow::bail!("ffmpeg not found on PATH (required for MP3 assembly)");
    }

    if args.debug {
        eprintln!("Source: {}", source.display());
        eprintln!("Output dir: {}", spec.outdir.display());
        eprintln!("Voice: {}", settings.voice);
        eprintln!("Rate: {}, Volume: {}", settings.rate, settings.volume);
        eprintln!("Bitrate: {}, Gap: {}ms", spec.bitrate, spec.chapter_gap_ms);
        eprintln!("Concurrency: {}", spec.concurrency);
    }

    convert(&source, &spec, settings, args.debug).await
}

/// Merge CLI flags over the config file over built-in defaults.
fn resolve_output_spec(args: &Args, config: &Doc2Mp3Config) -> OutputSpec {
    OutputSpec {
        outdir: args.outdir.clone(),
        prefix: args.prefix.clone(),
        album: args.album.clone(),
        author: args.author.clone(),
        voice: args.voice.clone().unwrap_or_else(|| config.voice.clone()),
        rate: args.rate.clone().unwrap_or_else(|| config.rate.clone()),
        volume: args.volume.clone().unwrap_or_else(|| config.volume.clone()),
        per_chapter: !args.no_per_chapter,
        combined_name: args.combined_name.clone(),
        chapter_gap_ms: args.chapter_gap_ms.unwrap_or(config.chapter_gap_ms),
        bitrate: args.bitrate.clone().unwrap_or_else(|| config.bitrate.clone()),
        max_chunk_chars: config.max_chunk_chars,
        concurrency: args.concurrency.unwrap_or(config.concurrency),
        untitled_title: config.untitled_title.clone(),
    }
}

/// Full pipeline: load, segment, chunk, synthesize, assemble.
///
/// Chapters are processed strictly in order. A synthesis failure aborts the
/// run but leaves already-written chapter files in place, so an external
/// wrapper can resume at chapter granularity via skip-if-exists.
async fn convert(
    source: &Path,
    spec: &OutputSpec,
    settings: VoiceSettings,
    debug: bool,
) -> Result<()> {
    eprintln!("Reading {}", source.display());
    let manuscript = document::load_document(source)?;

    let segmented = chapters::segment(&manuscript, source);
    if segmented.is_empty() {
        anyhow::bail!("No text found in {}", source.display());
    }

    // Prefix resolution sees the raw first chapter title; the placeholder
    // rename below must not leak into filenames derived from real titles.
    let prefix = naming::resolve_prefix(
        spec.prefix.as_deref(),
        manuscript.title.as_deref(),
        segmented.first().map(|c| c.title.as_str()),
        source,
    );
    let book = chapters::apply_untitled_title(segmented, &spec.untitled_title);

    eprintln!("Chapters: {}", book.len());

    let speech_config = SpeechConfig::load().context("Failed to load speech service config")?;
    let provider: Arc<dyn SpeechProvider> = Arc::from(
        tts_client::get_provider(&speech_config)
            .context("Failed to initialize synthesis provider")?,
    );
    let pool = synth::SynthesisPool::new(provider, settings, spec.concurrency);

    std::fs::create_dir_all(&spec.outdir)
        .with_context(|| format!("Failed to create {}", spec.outdir.display()))?;

    // Chapters not exported individually still need rendering for the
    // combined file; they live here until it is written.
    let temp_dir = tempfile::TempDir::new()?;

    let pb = ProgressBar::new(book.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut rendered: Vec<audio::ChapterAudio> = Vec::new();
    for chapter in &book {
        pb.set_message(chapter.title.clone());

        let chunks = text::chunk_chapter(chapter, spec.max_chunk_chars);
        if debug {
            eprintln!(
                "Chapter {} \"{}\": {} chunk(s)",
                chapter.ordinal,
                chapter.title,
                chunks.len()
            );
        }

        let synthesized = pool.synthesize_chapter(&chunks).await?;

        let (out_path, tags) = if spec.per_chapter {
            (
                spec.outdir
                    .join(naming::chapter_file_name(&prefix, chapter.ordinal, &chapter.title)),
                Some(audio::TrackTags::new(&spec.album, &spec.author, &chapter.title)),
            )
        } else {
            (
                temp_dir.path().join(format!("ch{:02}.mp3", chapter.ordinal)),
                None,
            )
        };

        let chapter_audio = audio::render_chapter(
            &synthesized,
            chapter.ordinal,
            &chapter.title,
            &out_path,
            &spec.bitrate,
            tags.as_ref(),
        )?;
        rendered.push(chapter_audio);
        pb.inc(1);
    }
    pb.finish_with_message("synthesis complete");

    let combined_path = spec
        .outdir
        .join(naming::combined_file_name(&prefix, &spec.combined_name));
    let combined_tags = audio::TrackTags::new(&spec.album, &spec.author, &spec.album);
    let total_ms = audio::write_combined(
        &rendered,
        spec.chapter_gap_ms,
        &spec.bitrate,
        &combined_tags,
        &combined_path,
    )?;

    eprintln!(
        "Combined audiobook: {} ({})",
        combined_path.display(),
        format_duration(total_ms)
    );

    Ok(())
}

/// Print the combined-output path for an input, without converting.
fn handle_predict(source: &Path, prefix: Option<&str>, args: &Args) -> Result<()> {
    let manuscript = document::load_document(source)?;
    let segmented = chapters::segment(&manuscript, source);

    let resolved = naming::resolve_prefix(
        prefix.or(args.prefix.as_deref()),
        manuscript.title.as_deref(),
        segmented.first().map(|c| c.title.as_str()),
        source,
    );

    let path = args
        .outdir
        .join(naming::combined_file_name(&resolved, &args.combined_name));
    println!("{}", path.display());
    Ok(())
}

async fn handle_voices() -> Result<()> {
    let speech_config = SpeechConfig::load().context("Failed to load speech service config")?;
    let provider = tts_client::get_provider(&speech_config)
        .context("Failed to initialize synthesis provider")?;

    let mut voices = provider.voices().await.context("Failed to list voices")?;
    voices.sort_by(|a, b| a.short_name.cmp(&b.short_name));

    for voice in &voices {
        println!("{:<44} {:<8} {}", voice.short_name, voice.locale, voice.gender);
    }
    Ok(())
}

fn format_duration(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!(
        "{}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    )
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Doc2Mp3Config::load()?;
            println!("Configuration file: {:?}", Doc2Mp3Config::config_path()?);
            println!();
            println!("voice = \"{}\"", config.voice);
            println!("rate = \"{}\"", config.rate);
            println!("volume = \"{}\"", config.volume);
            println!("bitrate = \"{}\"", config.bitrate);
            println!("chapter_gap_ms = {}", config.chapter_gap_ms);
            println!("max_chunk_chars = {}", config.max_chunk_chars);
            println!("concurrency = {}", config.concurrency);
            println!("untitled_title = \"{}\"", config.untitled_title);
        }
        ConfigAction::SetVoice { voice } => {
            let mut config = Doc2Mp3Config::load()?;
            config.voice = voice.clone();
            config.save()?;
            println!("Default voice set to: {}", config.voice);
        }
        ConfigAction::SetRate { rate } => {
            let normalized = tts_client::normalize_rate(rate)
                .map_err(|e| ConvertError::InvalidConfiguration(e.to_string()))?;
            let mut config = Doc2Mp3Config::load()?;
            config.rate = normalized;
            config.save()?;
            println!("Default rate set to: {}", config.rate);
        }
        ConfigAction::SetVolume { volume } => {
            let normalized = tts_client::normalize_volume(volume)
                .map_err(|e| ConvertError::InvalidConfiguration(e.to_string()))?;
            let mut config = Doc2Mp3Config::load()?;
            config.volume = normalized;
            config.save()?;
            println!("Default volume set to: {}", config.volume);
        }
        ConfigAction::SetBitrate { bitrate } => {
            let mut config = Doc2Mp3Config::load()?;
            config.bitrate = bitrate.clone();
            config.save()?;
            println!("Default bitrate set to: {}", config.bitrate);
        }
    }
    Ok(())
}
