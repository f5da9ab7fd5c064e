use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

pub mod local;
pub mod youtube;

pub use local::validate_local_file;
pub use youtube::YtDlpFetcher;

use crate::{Result, SubtitlrError};

/// Where the audio of one invocation comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A YouTube video to download and convert
    Video(VideoId),

    /// An MP3 file on disk, transcribed as is
    LocalFile(PathBuf),
}

impl Source {
    /// Build the source from the two mutually exclusive command line inputs.
    ///
    /// Exactly one of `id` and `file` must be given. Nothing touches the
    /// network or the filesystem here.
    pub fn from_flags(id: Option<&str>, file: Option<&Path>) -> Result<Self> {
        let id = id.map(str::trim).filter(|s| !s.is_empty());
        let file = file.filter(|p| !p.as_os_str().is_empty());

        match (id, file) {
            (Some(id), None) => Ok(Source::Video(VideoId::parse(id)?)),
            (None, Some(file)) => Ok(Source::LocalFile(file.to_path_buf())),
            (Some(_), Some(_)) => Err(SubtitlrError::Validation(
                "either --id or --file must be provided, but not both".into(),
            )),
            (None, None) => Err(SubtitlrError::Validation(
                "either --id or --file must be provided".into(),
            )),
        }
    }
}

/// A validated YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoId(String);

impl VideoId {
    /// Accept a bare 11-character id or any common YouTube URL form
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if is_video_id(input) {
            return Ok(Self(input.to_string()));
        }

        let invalid =
            || SubtitlrError::Retrieval(format!("invalid YouTube video identifier: {}", input));
        let url = Url::parse(input).map_err(|_| invalid())?;

        let host = url
            .host_str()
            .unwrap_or_default()
            .trim_start_matches("www.")
            .trim_start_matches("m.");
        let candidate = match host {
            "youtu.be" => url.path_segments().and_then(|mut s| s.next()).map(str::to_string),
            "youtube.com" | "music.youtube.com" => {
                let segments = url
                    .path_segments()
                    .map(|s| s.collect::<Vec<_>>())
                    .unwrap_or_default();
                match segments.as_slice() {
                    ["watch"] => url
                        .query_pairs()
                        .find(|(k, _)| k == "v")
                        .map(|(_, v)| v.into_owned()),
                    ["embed" | "shorts" | "v" | "live", id, ..] => Some(id.to_string()),
                    _ => None,
                }
            }
            _ => None,
        };

        candidate
            .filter(|id| is_video_id(id))
            .map(Self)
            .ok_or_else(invalid)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for the downloader
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_video_id(s: &str) -> bool {
    s.len() == 11 && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Retrieves the audio-bearing stream of a video into a container file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoFetcher: Send + Sync {
    /// Download the video into `work_dir` and return the container path
    async fn fetch(&self, video: &VideoId, work_dir: &Path) -> Result<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_id() {
        assert_eq!(VideoId::parse("dQw4w9WgXcQ").unwrap().as_str(), "dQw4w9WgXcQ");
        assert_eq!(VideoId::parse(" a-b_c1234XY ").unwrap().as_str(), "a-b_c1234XY");
    }

    #[test]
    fn test_parse_urls() {
        let cases = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=42",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
        ];
        for case in cases {
            assert_eq!(VideoId::parse(case).unwrap().as_str(), "dQw4w9WgXcQ", "{}", case);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let cases = [
            "",
            "short",
            "https://vimeo.com/12345678901",
            "https://www.youtube.com/feed",
            "not an id!!",
        ];
        for case in cases {
            assert!(matches!(VideoId::parse(case), Err(SubtitlrError::Retrieval(_))), "{}", case);
        }
    }

    #[test]
    fn test_watch_url() {
        let id = VideoId::parse("dQw4w9WgXcQ").unwrap();
        assert_eq!(id.watch_url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_source_requires_exactly_one_input() {
        let both = Source::from_flags(Some("dQw4w9WgXcQ"), Some(Path::new("a.mp3")));
        assert!(matches!(both, Err(SubtitlrError::Validation(_))));

        let neither = Source::from_flags(None, None);
        assert!(matches!(neither, Err(SubtitlrError::Validation(_))));

        let blank = Source::from_flags(Some("  "), None);
        assert!(matches!(blank, Err(SubtitlrError::Validation(_))));
    }

    #[test]
    fn test_source_variants() {
        assert_eq!(
            Source::from_flags(Some("dQw4w9WgXcQ"), None).unwrap(),
            Source::Video(VideoId::parse("dQw4w9WgXcQ").unwrap())
        );
        assert_eq!(
            Source::from_flags(None, Some(Path::new("talk.mp3"))).unwrap(),
            Source::LocalFile(PathBuf::from("talk.mp3"))
        );
    }
}
