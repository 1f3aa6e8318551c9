//! Book pipeline: text stages into a [`PreparedBook`], audio stages into MP3 files.

use crate::audio::{AudioAssembler, TrackTags};
use crate::config::{AudiobookConfig, SynthesisConfig};
use crate::error::Result;
use crate::extract::ExtractedText;
use crate::manifest::{Manifest, ManifestChapter};
use crate::text::{Chunk, ChapterSegmenter, Chunker, TextNormalizer, detect_language};
use crate::tts::Synthesizer;
use futures_util::{StreamExt, TryStreamExt, stream};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TITLE: &str = "Untitled Book";
pub const DEFAULT_AUTHOR: &str = "Unknown Author";
pub const CHAPTER_LISTING_FILE: &str = "chapters.txt";

/// A chapter ready for synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedChapter {
    pub title: String,
    /// Body length in characters
    pub char_len: usize,
    pub chunks: Vec<Chunk>,
}

/// Everything the audio stages need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedBook {
    pub title: String,
    pub author: String,
    pub language: String,
    pub chapters: Vec<PreparedChapter>,
}

impl PreparedBook {
    pub fn manifest(&self) -> Manifest {
        Manifest {
            title: self.title.clone(),
            author: self.author.clone(),
            language: self.language.clone(),
            chapters: self
                .chapters
                .iter()
                .map(|c| ManifestChapter {
                    title: c.title.clone(),
                    char_len: c.char_len,
                })
                .collect(),
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chapters.iter().map(|c| c.chunks.len()).sum()
    }

    /// One line per chapter with its chunk count.
    pub fn chapter_listing(&self) -> String {
        let mut listing = String::new();
        for (i, chapter) in self.chapters.iter().enumerate() {
            let _ = writeln!(
                listing,
                "{:03}. {} ({} chunks, {} chars)",
                i + 1,
                chapter.title,
                chapter.chunks.len(),
                chapter.char_len
            );
        }
        listing
    }

    pub fn write_chapter_listing(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(CHAPTER_LISTING_FILE);
        std::fs::write(&path, self.chapter_listing())?;
        Ok(path)
    }
}

/// Run the text stages: normalize, detect language, segment, chunk.
///
/// Explicit `title`/`author` win over document metadata.
pub fn prepare_book(
    extracted: ExtractedText,
    title: Option<String>,
    author: Option<String>,
    config: &AudiobookConfig,
) -> Result<PreparedBook> {
    let normalizer = TextNormalizer::new(&config.normalizer);
    let segmenter = ChapterSegmenter::new(&config.segmenter)?;
    let chunker = Chunker::new(&config.chunker)?;

    log::info!("Cleaning text...");
    let cleaned = normalizer.normalize(&extracted.text);

    let language = detect_language(&cleaned);
    log::info!("Detected language: {}", language);

    log::info!("Detecting chapters...");
    let segmentation = segmenter.segment(&cleaned);
    if segmentation.is_fallback() {
        log::info!("No chapter headings found; treating the text as one chapter");
    } else {
        log::info!("Found {} chapter(s)", segmentation.chapters().len());
    }

    let chapters: Vec<PreparedChapter> = segmentation
        .into_chapters()
        .into_iter()
        .map(|chapter| PreparedChapter {
            char_len: chapter.char_len(),
            chunks: chunker.split(&chapter.body),
            title: chapter.title,
        })
        .collect();
    log::debug!(
        "{} chunk(s) of at most {} chars",
        chapters.iter().map(|c| c.chunks.len()).sum::<usize>(),
        chunker.max_chars()
    );

    Ok(PreparedBook {
        title: title.or(extracted.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        author: author.or(extracted.author).unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
        language,
        chapters,
    })
}

/// How synthesis calls are scheduled and bounded.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub workers: usize,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl From<&SynthesisConfig> for RenderOptions {
    fn from(config: &SynthesisConfig) -> Self {
        Self {
            workers: config.workers.max(1),
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
        }
    }
}

pub fn chapter_file_name(chapter: usize) -> String {
    format!("chapter{:03}.mp3", chapter)
}

pub fn part_file_name(chapter: usize, part: usize) -> String {
    format!("chapter{:03}_part{:03}.mp3", chapter, part)
}

/// Synthesize every chapter, assemble chapter tracks, then the whole book.
///
/// Returns the path of the full audiobook. Any synthesis failure aborts the run.
pub async fn render_audiobook(
    book: &PreparedBook,
    outdir: &Path,
    synthesizer: &dyn Synthesizer,
    assembler: &dyn AudioAssembler,
    options: RenderOptions,
) -> Result<PathBuf> {
    let pb = ProgressBar::new(book.chunk_count() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut chapter_files = Vec::with_capacity(book.chapters.len());
    let total = book.chapters.len();

    for (index, chapter) in book.chapters.iter().enumerate() {
        let number = index + 1;
        log::info!("TTS Chapter {}/{}: {}", number, total, chapter.title);
        pb.set_message(chapter.title.clone());

        let parts = synthesize_chapter(number, chapter, outdir, synthesizer, options, &pb).await?;
        if parts.is_empty() {
            log::warn!("Chapter {} has nothing to speak; skipping", number);
            continue;
        }

        let chapter_out = outdir.join(chapter_file_name(number));
        let tags = TrackTags {
            title: format!("{} - {}", book.title, chapter.title),
            artist: book.author.clone(),
            album: book.title.clone(),
        };
        assembler.merge(&parts, &chapter_out, &tags).await?;
        chapter_files.push(chapter_out);

        remove_parts(&parts).await;
    }

    pb.finish_with_message("Synthesis complete");

    let full_out = outdir.join(format!("{}_audiobook.mp3", slugify(&book.title)));
    log::info!("Merging full audiobook...");
    let tags = TrackTags {
        title: book.title.clone(),
        artist: book.author.clone(),
        album: book.title.clone(),
    };
    assembler.merge(&chapter_files, &full_out, &tags).await?;

    log::info!("Done. Full audiobook at: {}", full_out.display());
    Ok(full_out)
}

/// Synthesize a chapter's chunks on a bounded pool, returning part files in order.
async fn synthesize_chapter(
    number: usize,
    chapter: &PreparedChapter,
    outdir: &Path,
    synthesizer: &dyn Synthesizer,
    options: RenderOptions,
    pb: &ProgressBar,
) -> Result<Vec<PathBuf>> {
    let parts: Vec<(usize, &Chunk, PathBuf)> = chapter
        .chunks
        .iter()
        .enumerate()
        .filter(|(i, chunk)| {
            let speakable = chunk.is_speakable();
            if !speakable {
                log::debug!("chapter {} chunk {} is blank; skipping", number, i + 1);
                pb.inc(1);
            }
            speakable
        })
        .map(|(i, chunk)| (i + 1, chunk, outdir.join(part_file_name(number, i + 1))))
        .collect();
    let paths: Vec<PathBuf> = parts.iter().map(|(_, _, path)| path.clone()).collect();

    let jobs = parts.into_iter().map(|(part, chunk, path)| {
        let segment = format!("chapter {} part {}", number, part);
        async move {
            let audio = synthesizer
                .synthesize_with_retry(&segment, &chunk.text, options.timeout, options.max_retries)
                .await?;
            tokio::fs::write(&path, audio).await?;
            log::debug!("wrote {}", path.display());
            pb.inc(1);
            Ok::<_, crate::error::PipelineError>(path)
        }
    });

    let result: Result<Vec<PathBuf>> = stream::iter(jobs)
        .buffered(options.workers)
        .try_collect()
        .await;
    if result.is_err() {
        remove_parts(&paths).await;
    }
    result
}

/// Delete part files, ignoring ones that were never written.
async fn remove_parts(parts: &[PathBuf]) {
    for part in parts {
        if let Err(e) = tokio::fs::remove_file(part).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::debug!("could not remove {}: {}", part.display(), e);
            }
        }
    }
}

/// Lowercase, with every run of characters outside `[a-z0-9]` turned into `-`.
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut pending_dash = false;

    for c in s.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "audiobook".to_string()
    } else {
        slug
    }
}
