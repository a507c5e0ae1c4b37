//! Transcript retrieval for YouTube videos.
//!
//! A [`TranscriptSource`] knows how to list and download caption tracks; the
//! [`TranscriptFetcher`] walks an ordered list of preferred languages over it and
//! assembles the first successful track into a [`Transcript`].

mod youtube;

pub use youtube::{normalize_video_id, YoutubeTranscriptSource};

use crate::error::{Result, VidQueryError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// The spoken text of one video, with timing discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Video ID this transcript belongs to.
    pub video_id: String,
    /// Language code of the caption track it came from.
    pub language_code: String,
    /// Segment texts joined with single spaces.
    pub text: String,
}

impl Transcript {
    pub fn new(video_id: impl Into<String>, language_code: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            language_code: language_code.into(),
            text: text.into(),
        }
    }

    /// Assemble a transcript from time-ordered segments.
    pub fn from_segments(video_id: &str, language_code: &str, segments: &[TranscriptSegment]) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self::new(video_id, language_code, text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A single timed caption line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// Duration in seconds.
    pub duration_seconds: f64,
    /// Caption text.
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start_seconds: f64, duration_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            duration_seconds,
            text: text.into(),
        }
    }
}

/// One caption track available for a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// Video the track belongs to.
    pub video_id: String,
    /// Language code, e.g. "en" or "hi".
    pub language_code: String,
    /// Human-readable language name.
    pub name: String,
    /// Whether the track was generated by speech recognition.
    pub is_generated: bool,
    /// Where to download the timed text from.
    pub url: String,
}

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// List the caption tracks available for a video.
    ///
    /// Fails with [`VidQueryError::TranscriptsDisabled`] when the video has none.
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>>;

    /// Download the segments of one track.
    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<TranscriptSegment>>;
}

/// Pick the track for a language, preferring manually created captions.
pub fn select_track<'a>(tracks: &'a [CaptionTrack], language: &str) -> Option<&'a CaptionTrack> {
    tracks
        .iter()
        .find(|t| !t.is_generated && t.language_code == language)
        .or_else(|| tracks.iter().find(|t| t.is_generated && t.language_code == language))
}

/// Fetches transcripts, trying preferred languages in order.
pub struct TranscriptFetcher {
    source: Arc<dyn TranscriptSource>,
    languages: Vec<String>,
}

impl TranscriptFetcher {
    /// Create a fetcher over a source with an ordered language preference.
    pub fn new(source: Arc<dyn TranscriptSource>, languages: Vec<String>) -> Self {
        let languages = languages
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        Self { source, languages }
    }

    /// The language preference, in order.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Fetch the transcript of a video.
    ///
    /// Each preferred language is attempted in turn and the first success wins.
    /// When every attempt fails, the outcome of the last attempt decides the
    /// error: no track in that language is [`VidQueryError::NoTranscriptFound`],
    /// a download failure is returned as-is.
    #[instrument(skip(self))]
    pub async fn fetch(&self, video_id: &str) -> Result<Transcript> {
        let tracks = self.source.list_tracks(video_id).await?;
        debug!("{} caption tracks available", tracks.len());

        let mut last_failure: Option<VidQueryError> = None;

        for language in &self.languages {
            let Some(track) = select_track(&tracks, language) else {
                debug!("No '{}' transcript for {}", language, video_id);
                last_failure = None;
                continue;
            };

            match self.source.fetch_track(track).await {
                Ok(segments) => {
                    let transcript = Transcript::from_segments(video_id, &track.language_code, &segments);
                    if transcript.is_empty() {
                        warn!("'{}' transcript for {} is empty", language, video_id);
                        last_failure = Some(VidQueryError::Transcript(format!(
                            "the '{}' transcript for {} is empty",
                            language, video_id
                        )));
                        continue;
                    }
                    info!(
                        "Fetched '{}' transcript for {} ({} segments, {} chars)",
                        track.language_code,
                        video_id,
                        segments.len(),
                        transcript.char_len()
                    );
                    return Ok(transcript);
                }
                Err(e) => {
                    warn!("Fetching '{}' transcript for {} failed: {}", language, video_id, e);
                    last_failure = Some(e);
                }
            }
        }

        Err(last_failure.unwrap_or_else(|| VidQueryError::NoTranscriptFound {
            video_id: video_id.to_string(),
            languages: self.languages.clone(),
        }))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{track, FakeTranscriptSource};
    use super::*;

    fn languages() -> Vec<String> {
        vec!["hi".to_string(), "en".to_string()]
    }

    #[test]
    fn test_transcript_from_segments() {
        let segments = vec![
            TranscriptSegment::new(0.0, 5.0, "Hello world"),
            TranscriptSegment::new(5.0, 5.0, "This is a test"),
        ];

        let transcript = Transcript::from_segments("test_video", "en", &segments);

        assert_eq!(transcript.video_id, "test_video");
        assert_eq!(transcript.text, "Hello world This is a test");
        assert_eq!(transcript.language_code, "en");
    }

    #[test]
    fn test_select_track_prefers_manual() {
        let tracks = vec![track("v", "en", true), track("v", "en", false), track("v", "hi", true)];

        assert!(!select_track(&tracks, "en").unwrap().is_generated);
        assert!(select_track(&tracks, "hi").unwrap().is_generated);
        assert!(select_track(&tracks, "de").is_none());
    }

    #[tokio::test]
    async fn test_fetch_prefers_first_language() {
        let source = FakeTranscriptSource::new().with_tracks(
            "vid",
            vec![
                (track("vid", "en", false), vec![TranscriptSegment::new(0.0, 1.0, "english")]),
                (track("vid", "hi", false), vec![TranscriptSegment::new(0.0, 1.0, "hindi")]),
            ],
        );
        let fetcher = TranscriptFetcher::new(Arc::new(source), languages());

        let transcript = fetcher.fetch("vid").await.unwrap();
        assert_eq!(transcript.text, "hindi");
        assert_eq!(transcript.language_code, "hi");
    }

    #[tokio::test]
    async fn test_fetch_falls_back_to_next_language() {
        let source = FakeTranscriptSource::new().with_transcript("vid", "en", &["first line", "second line"]);
        let fetcher = TranscriptFetcher::new(Arc::new(source), languages());

        let transcript = fetcher.fetch("vid").await.unwrap();
        assert_eq!(transcript.text, "first line second line");
        assert_eq!(transcript.language_code, "en");
    }

    #[tokio::test]
    async fn test_fetch_falls_back_after_download_failure() {
        let source = FakeTranscriptSource::new()
            .with_tracks(
                "vid",
                vec![
                    (track("vid", "hi", false), vec![TranscriptSegment::new(0.0, 1.0, "hindi")]),
                    (track("vid", "en", true), vec![TranscriptSegment::new(0.0, 1.0, "english")]),
                ],
            )
            .failing("hi");
        let fetcher = TranscriptFetcher::new(Arc::new(source), languages());

        let transcript = fetcher.fetch("vid").await.unwrap();
        assert_eq!(transcript.text, "english");
    }

    #[tokio::test]
    async fn test_blank_track_falls_back_to_next_language() {
        let source = FakeTranscriptSource::new().with_tracks(
            "vid",
            vec![
                (
                    track("vid", "hi", false),
                    vec![TranscriptSegment::new(0.0, 1.0, "  "), TranscriptSegment::new(1.0, 1.0, "\n")],
                ),
                (track("vid", "en", false), vec![TranscriptSegment::new(0.0, 1.0, "english")]),
            ],
        );
        let fetcher = TranscriptFetcher::new(Arc::new(source), languages());

        let transcript = fetcher.fetch("vid").await.unwrap();
        assert_eq!(transcript.language_code, "en");
    }

    #[tokio::test]
    async fn test_only_blank_tracks_is_an_error() {
        let source = FakeTranscriptSource::new().with_transcript("vid", "en", &[" ", ""]);
        let fetcher = TranscriptFetcher::new(Arc::new(source), languages());

        let err = fetcher.fetch("vid").await.unwrap_err();
        assert!(matches!(err, VidQueryError::Transcript(_)));
        assert!(err.to_string().contains("is empty"));
    }

    #[tokio::test]
    async fn test_disabled_transcripts_are_not_found() {
        let source = FakeTranscriptSource::new().with_disabled("vid");
        let fetcher = TranscriptFetcher::new(Arc::new(source), languages());

        let err = fetcher.fetch("vid").await.unwrap_err();
        assert!(matches!(err, VidQueryError::TranscriptsDisabled(_)));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_no_matching_language_is_not_found() {
        let source = FakeTranscriptSource::new().with_transcript("vid", "de", &["hallo"]);
        let fetcher = TranscriptFetcher::new(Arc::new(source), languages());

        let err = fetcher.fetch("vid").await.unwrap_err();
        match &err {
            VidQueryError::NoTranscriptFound { video_id, languages } => {
                assert_eq!(video_id, "vid");
                assert_eq!(languages, &vec!["hi".to_string(), "en".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_last_attempt_failure_is_internal() {
        let source = FakeTranscriptSource::new()
            .with_transcript("vid", "en", &["english"])
            .failing("en");
        let fetcher = TranscriptFetcher::new(Arc::new(source), languages());

        let err = fetcher.fetch("vid").await.unwrap_err();
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("download of 'en' failed"));
    }

    #[tokio::test]
    async fn test_listing_failure_is_internal() {
        let source = FakeTranscriptSource::new().with_broken("vid", "connection reset");
        let fetcher = TranscriptFetcher::new(Arc::new(source), languages());

        let err = fetcher.fetch("vid").await.unwrap_err();
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_blank_languages_are_dropped() {
        let fetcher = TranscriptFetcher::new(
            Arc::new(FakeTranscriptSource::new()),
            vec![" en ".to_string(), "".to_string()],
        );
        assert_eq!(fetcher.languages(), &["en".to_string()]);
    }
}
