//! YouTube transcript source.
//!
//! Talks to the public watch page and the innertube player endpoint to discover
//! caption tracks, then downloads the timed-text XML of a track.

use super::{CaptionTrack, TranscriptSegment, TranscriptSource};
use crate::error::{Result, VidQueryError};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const WATCH_URL: &str = "https://www.youtube.com/watch";
const INNERTUBE_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

/// Normalize user input to a video ID.
///
/// YouTube URLs yield their 11-character ID; anything else is returned trimmed.
pub fn normalize_video_id(input: &str) -> String {
    static VIDEO_URL: OnceLock<Regex> = OnceLock::new();
    let regex = VIDEO_URL.get_or_init(|| {
        Regex::new(
            r"(?x)
            (?:https?://)?
            (?:www\.|m\.|music\.)?
            (?:
                youtube\.com/(?:watch\?(?:[^\s]*&)?v=|embed/|v/|shorts/|live/)
                |youtu\.be/
                |youtube-nocookie\.com/embed/
            )
            ([a-zA-Z0-9_-]{11})
        ",
        )
        .expect("Invalid regex")
    });

    let input = input.trim();
    regex
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| input.to_string())
}

/// YouTube transcript source.
pub struct YoutubeTranscriptSource {
    http: reqwest::Client,
    api_key_regex: Regex,
    consent_regex: Regex,
    text_regex: Regex,
    start_regex: Regex,
    dur_regex: Regex,
    tag_regex: Regex,
}

impl YoutubeTranscriptSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VidQueryError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key_regex: Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("Invalid regex"),
            consent_regex: Regex::new(r#"name="v" value="([^"]*)""#).expect("Invalid regex"),
            text_regex: Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").expect("Invalid regex"),
            start_regex: Regex::new(r#"\bstart="([^"]*)""#).expect("Invalid regex"),
            dur_regex: Regex::new(r#"\bdur="([^"]*)""#).expect("Invalid regex"),
            tag_regex: Regex::new(r"(?i)<[^>]*>").expect("Invalid regex"),
        })
    }

    /// Fetch the watch page, accepting the cookie consent form once if shown.
    async fn fetch_watch_html(&self, video_id: &str) -> Result<String> {
        let html = self.get_watch_page(video_id, None).await?;

        if !html.contains("action=\"https://consent.youtube.com/s\"") {
            return Ok(html);
        }

        let consent = self
            .consent_regex
            .captures(&html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| VidQueryError::Transcript("Failed to accept YouTube cookie consent".to_string()))?;

        debug!("Accepting cookie consent for {}", video_id);
        let html = self
            .get_watch_page(video_id, Some(&format!("CONSENT=YES+{}", consent)))
            .await?;

        if html.contains("action=\"https://consent.youtube.com/s\"") {
            return Err(VidQueryError::Transcript(
                "Failed to accept YouTube cookie consent".to_string(),
            ));
        }
        Ok(html)
    }

    async fn get_watch_page(&self, video_id: &str, cookie: Option<&str>) -> Result<String> {
        let mut request = self
            .http
            .get(WATCH_URL)
            .query(&[("v", video_id)])
            .header("Accept-Language", "en-US");
        if let Some(cookie) = cookie {
            request = request.header("Cookie", cookie);
        }

        Ok(request.send().await?.error_for_status()?.text().await?)
    }

    fn extract_api_key(&self, html: &str, video_id: &str) -> Result<String> {
        if let Some(key) = self.api_key_regex.captures(html).and_then(|caps| caps.get(1)) {
            return Ok(key.as_str().to_string());
        }

        if html.contains("class=\"g-recaptcha\"") {
            return Err(VidQueryError::Transcript(
                "YouTube is blocking requests from this IP (captcha required)".to_string(),
            ));
        }

        Err(VidQueryError::Transcript(format!(
            "Could not parse the YouTube page for {}",
            video_id
        )))
    }

    async fn fetch_player(&self, video_id: &str, api_key: &str) -> Result<Value> {
        let body = json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        Ok(self
            .http
            .post(INNERTUBE_PLAYER_URL)
            .query(&[("key", api_key)])
            .header("Accept-Language", "en-US")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    /// Extract caption tracks from an innertube player response.
    fn parse_tracks(video_id: &str, player: &Value) -> Result<Vec<CaptionTrack>> {
        let status = &player["playabilityStatus"];
        let state = status["status"].as_str().unwrap_or("OK");
        if state != "OK" {
            let reason = status["reason"].as_str().unwrap_or_default();
            if state == "LOGIN_REQUIRED" && reason.contains("bot") {
                return Err(VidQueryError::Transcript(
                    "YouTube is blocking requests from this IP (sign-in required)".to_string(),
                ));
            }
            if state == "ERROR" && reason == "This video is unavailable" {
                return Err(VidQueryError::VideoUnavailable(video_id.to_string()));
            }
            return Err(VidQueryError::VideoUnavailable(if reason.is_empty() {
                format!("{} ({})", video_id, state)
            } else {
                format!("{} ({})", video_id, reason)
            }));
        }

        let tracks = player["captions"]["playerCaptionsTracklistRenderer"]["captionTracks"]
            .as_array()
            .ok_or_else(|| VidQueryError::TranscriptsDisabled(video_id.to_string()))?;

        Ok(tracks
            .iter()
            .filter_map(|track| {
                let base_url = track["baseUrl"].as_str()?;
                let language_code = track["languageCode"].as_str()?.to_string();
                let name = track["name"]["runs"][0]["text"]
                    .as_str()
                    .or_else(|| track["name"]["simpleText"].as_str())
                    .unwrap_or(&language_code)
                    .to_string();

                Some(CaptionTrack {
                    video_id: video_id.to_string(),
                    language_code,
                    name,
                    is_generated: track["kind"].as_str() == Some("asr"),
                    url: strip_format_param(base_url),
                })
            })
            .collect())
    }

    /// Parse timed-text XML into segments, dropping markup and empty lines.
    fn parse_timed_text(&self, xml: &str) -> Vec<TranscriptSegment> {
        self.text_regex
            .captures_iter(xml)
            .filter_map(|caps| {
                let attrs = caps.get(1).map_or("", |m| m.as_str());
                let raw = caps.get(2).map_or("", |m| m.as_str());

                // Entities are escaped once for XML and once more for HTML.
                let unescaped = unescape_entities(raw);
                let stripped = self.tag_regex.replace_all(&unescaped, "");
                let text = unescape_entities(&stripped).trim().to_string();
                if text.is_empty() {
                    return None;
                }

                let number = |re: &Regex| {
                    re.captures(attrs)
                        .and_then(|c| c.get(1))
                        .and_then(|m| m.as_str().parse::<f64>().ok())
                        .unwrap_or(0.0)
                };

                Some(TranscriptSegment::new(number(&self.start_regex), number(&self.dur_regex), text))
            })
            .collect()
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    #[instrument(skip(self))]
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
        let html = self.fetch_watch_html(video_id).await?;
        let api_key = self.extract_api_key(&html, video_id)?;
        let player = self.fetch_player(video_id, &api_key).await?;
        Self::parse_tracks(video_id, &player)
    }

    #[instrument(skip(self, track), fields(video_id = %track.video_id, language = %track.language_code))]
    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<TranscriptSegment>> {
        if track.url.contains("&exp=xpe") {
            return Err(VidQueryError::Transcript(format!(
                "the '{}' transcript requires a PO token",
                track.language_code
            )));
        }

        let xml = self
            .http
            .get(&track.url)
            .header("Accept-Language", "en-US")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let segments = self.parse_timed_text(&xml);
        debug!("Parsed {} segments", segments.len());
        Ok(segments)
    }
}

/// Drop the `fmt` query parameter so YouTube serves the plain timed-text format.
fn strip_format_param(base_url: &str) -> String {
    let Ok(mut url) = Url::parse(base_url) else {
        return base_url.replace("&fmt=srv3", "");
    };

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "fmt")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    url.to_string()
}

/// Decode named and numeric HTML entities.
fn unescape_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let decoded = tail[1..].find(';').filter(|&end| end <= 10).and_then(|end| {
            let entity = &tail[1..1 + end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse::<u32>().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, end + 2))
        });

        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
