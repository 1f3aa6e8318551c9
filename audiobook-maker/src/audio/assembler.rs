//! Audio file assembly using FFmpeg.

use super::{AudioAssembler, TrackTags};
use crate::error::{PipelineError, Result};
use crate::tools;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;

const FFMPEG_HINT: &str = "Install FFmpeg to encode and merge audio.";

/// Upper bound for one merge; a full book re-encodes every chapter.
pub const MERGE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Merges parts with FFmpeg's concat demuxer, re-encoding to MP3 128k.
pub struct FfmpegAssembler {
    ffmpeg: PathBuf,
    timeout: Duration,
}

impl FfmpegAssembler {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            ffmpeg: tools::locate(&["ffmpeg"], FFMPEG_HINT)?,
            timeout,
        })
    }
}

#[async_trait]
impl AudioAssembler for FfmpegAssembler {
    async fn merge(&self, parts: &[PathBuf], output: &Path, tags: &TrackTags) -> Result<()> {
        if parts.is_empty() {
            return Err(PipelineError::assembly(output, "No audio parts to merge"));
        }

        // Create a temporary file list for ffmpeg
        let temp_dir = TempDir::new()?;
        let list_file = temp_dir.path().join("concat_list.txt");
        let list = concat_list(parts).map_err(|e| PipelineError::assembly(output, e))?;
        tokio::fs::write(&list_file, list).await?;

        let mut command = Command::new(&self.ffmpeg);
        command.args(ffmpeg_args(&list_file, output, tags));

        log::debug!("merging {} parts into {}", parts.len(), output.display());
        tools::run(command, None, self.timeout)
            .await
            .map_err(|e| PipelineError::assembly(output, e))?;

        Ok(())
    }
}

/// Concat demuxer list, one `file '<path>'` line per part.
///
/// The demuxer resolves relative entries against the list's own directory,
/// so every part is written as an absolute path.
fn concat_list(parts: &[PathBuf]) -> std::io::Result<String> {
    let mut list_content = String::new();
    for path in parts {
        let absolute = std::path::absolute(path)?;
        // Escape single quotes in path
        let path_str = absolute.to_string_lossy().replace('\'', "'\\''");
        list_content.push_str(&format!("file '{}'\n", path_str));
    }
    Ok(list_content)
}

fn ffmpeg_args(list_file: &Path, output: &Path, tags: &TrackTags) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(list_file.into());

    for arg in ["-map_metadata", "-1", "-codec:a", "libmp3lame", "-b:a", "128k", "-id3v2_version", "3"] {
        args.push(arg.into());
    }

    for (key, value) in [
        ("title", tags.title.as_str()),
        ("artist", tags.artist.as_str()),
        ("album", tags.album.as_str()),
        ("genre", "Audiobook"),
    ] {
        args.push("-metadata".into());
        args.push(format!("{}={}", key, value).into());
    }

    args.push(output.into());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> TrackTags {
        TrackTags {
            title: "My Book - Chapter 1".to_string(),
            artist: "Jo Writer".to_string(),
            album: "My Book".to_string(),
        }
    }

    #[test]
    fn test_concat_list_escapes_quotes() {
        let parts = vec![
            PathBuf::from("/out/chapter001_part001.mp3"),
            PathBuf::from("/out/it's here/chapter001_part002.mp3"),
        ];
        assert_eq!(
            concat_list(&parts).unwrap(),
            "file '/out/chapter001_part001.mp3'\nfile '/out/it'\\''s here/chapter001_part002.mp3'\n"
        );
    }

    #[test]
    fn test_concat_list_resolves_relative_parts() {
        let parts = vec![
            Path::new("audiobook_out").join("chapter001_part001.mp3"),
            Path::new("audiobook_out").join("chapter001_part002.mp3"),
        ];
        let cwd = std::env::current_dir().unwrap();
        let list = concat_list(&parts).unwrap();

        for (line, part) in list.lines().zip(&parts) {
            let entry = line.strip_prefix("file '").unwrap().strip_suffix('\'').unwrap();
            assert!(Path::new(entry).is_absolute(), "relative entry: {}", line);
            assert_eq!(Path::new(entry), cwd.join(part));
        }
        assert_eq!(list.lines().count(), 2);
    }

    #[test]
    fn test_ffmpeg_args() {
        let args = ffmpeg_args(Path::new("/tmp/list.txt"), Path::new("/out/chapter001.mp3"), &tags());
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(&args[..9], &["-y", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i", "/tmp/list.txt"]);
        assert!(args.windows(2).any(|w| w == ["-b:a", "128k"]));
        assert!(args.windows(2).any(|w| w == ["-codec:a", "libmp3lame"]));
        assert!(args.windows(2).any(|w| w == ["-metadata", "title=My Book - Chapter 1"]));
        assert!(args.windows(2).any(|w| w == ["-metadata", "artist=Jo Writer"]));
        assert!(args.windows(2).any(|w| w == ["-metadata", "album=My Book"]));
        assert!(args.windows(2).any(|w| w == ["-metadata", "genre=Audiobook"]));
        assert_eq!(args.last().unwrap(), "/out/chapter001.mp3");
    }

    #[tokio::test]
    async fn test_merge_rejects_empty_parts() {
        let assembler = FfmpegAssembler {
            ffmpeg: PathBuf::from("ffmpeg"),
            timeout: Duration::from_secs(5),
        };
        let err = assembler
            .merge(&[], Path::new("/out/empty.mp3"), &tags())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No audio parts to merge"));
    }
}
