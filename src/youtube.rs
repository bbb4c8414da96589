use eyre::{Result, bail};
use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::captions;
use crate::{Metadata, Segment, publish_year};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Substring carried by errors raised when YouTube serves a sign-in
/// interstitial instead of the watch page.
pub const BOT_CHECK_MARKER: &str = "bot check";

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    captions: Option<CaptionsData>,
    #[serde(rename = "videoDetails")]
    video_details: Option<VideoDetails>,
    microformat: Option<Microformat>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    title: Option<String>,
    author: Option<String>,
    keywords: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct Microformat {
    #[serde(rename = "playerMicroformatRenderer")]
    player_microformat_renderer: Option<MicroformatRenderer>,
}

#[derive(Debug, Deserialize)]
struct MicroformatRenderer {
    #[serde(rename = "publishDate")]
    publish_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    #[serde(rename = "languageCode")]
    pub language_code: String,
    pub kind: Option<String>,
}

impl CaptionTrack {
    /// Auto-generated (speech recognition) tracks carry kind "asr".
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Everything the watch page yields in one fetch: scraped metadata plus the
/// caption tracks listed in the player response.
#[derive(Debug)]
pub struct WatchPage {
    pub metadata: Metadata,
    pub caption_tracks: Vec<CaptionTrack>,
}

/// Fetch and scrape the watch page for a video.
///
/// Sends a desktop-browser User-Agent and Accept-Language; `ucbcb=1`
/// suppresses the consent interstitial on EU egress IPs.
pub async fn fetch_watch_page(
    client: &reqwest::Client,
    video_id: &str,
    user_agent: &str,
    max_keywords: usize,
) -> Result<WatchPage> {
    let watch_url = format!("https://www.youtube.com/watch?v={video_id}&ucbcb=1");
    debug!("Fetching watch page: {watch_url}");

    let html = client
        .get(&watch_url)
        .header("User-Agent", user_agent)
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    scrape_watch_html(&html, max_keywords)
}

/// Scrape metadata and caption tracks out of watch-page HTML.
///
/// The player-response blob is the primary source; when it is absent the
/// LD+JSON block and individual meta tags still fill what they can, unless
/// the page is a sign-in interstitial, which is a hard failure.
pub fn scrape_watch_html(html: &str, max_keywords: usize) -> Result<WatchPage> {
    let player = match extract_player_response(html) {
        Ok(player) => Some(player),
        Err(e) if e.to_string().contains(BOT_CHECK_MARKER) => return Err(e),
        Err(e) => {
            debug!("No player response in watch page: {e}");
            None
        }
    };

    let mut metadata = Metadata::default();
    if let Some(ref player) = player {
        metadata.merge_missing(metadata_from_player(player, max_keywords));
    }
    metadata.merge_missing(metadata_from_ld_json(html));
    metadata.merge_missing(metadata_from_meta_tags(html, max_keywords));

    let caption_tracks = player
        .and_then(|p| p.captions)
        .and_then(|c| c.player_captions_tracklist_renderer)
        .and_then(|r| r.caption_tracks)
        .unwrap_or_default();

    Ok(WatchPage {
        metadata,
        caption_tracks,
    })
}

fn extract_player_response(html: &str) -> Result<PlayerResponse> {
    let re = Regex::new(r"ytInitialPlayerResponse\s*=\s*(\{.+?\});")?;
    if let Some(caps) = re.captures(html) {
        let player: PlayerResponse = serde_json::from_str(&caps[1])?;
        return Ok(player);
    }

    if html.contains(r#"class="g-recaptcha""#) || html.contains("Sign in to confirm") {
        bail!("YouTube served a {BOT_CHECK_MARKER} instead of the watch page");
    }

    bail!("could not extract player response from watch page");
}

fn metadata_from_player(player: &PlayerResponse, max_keywords: usize) -> Metadata {
    let mut meta = Metadata::default();

    if let Some(ref details) = player.video_details {
        meta.title = details.title.clone().unwrap_or_default();
        meta.author = details.author.clone().unwrap_or_default();
        if let Some(ref keywords) = details.keywords {
            meta.keywords = join_keywords(keywords, max_keywords);
        }
    }

    if let Some(date) = player
        .microformat
        .as_ref()
        .and_then(|m| m.player_microformat_renderer.as_ref())
        .and_then(|r| r.publish_date.as_deref())
    {
        meta.year = publish_year(date);
    }

    meta
}

fn metadata_from_ld_json(html: &str) -> Metadata {
    let mut meta = Metadata::default();

    let re = Regex::new(r#"(?s)<script[^>]*type="application/ld\+json"[^>]*>(.*?)</script>"#).unwrap();
    let Some(caps) = re.captures(html) else {
        return meta;
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(caps[1].trim()) else {
        debug!("Unparseable LD+JSON block in watch page");
        return meta;
    };

    if let Some(name) = value.get("name").and_then(|v| v.as_str()) {
        meta.title = name.to_string();
    }
    // "author" is either a plain string or a {name: ...} object
    if let Some(author) = value.get("author") {
        if let Some(s) = author.as_str() {
            meta.author = s.to_string();
        } else if let Some(s) = author.get("name").and_then(|v| v.as_str()) {
            meta.author = s.to_string();
        }
    }
    if let Some(date) = value.get("uploadDate").and_then(|v| v.as_str()) {
        meta.year = publish_year(date);
    }
    if let Some(thumb) = value
        .get("thumbnailUrl")
        .and_then(|v| v.as_array())
        .and_then(|a| a.first())
        .and_then(|v| v.as_str())
    {
        meta.thumbnail = thumb.to_string();
    }

    meta
}

fn metadata_from_meta_tags(html: &str, max_keywords: usize) -> Metadata {
    let mut meta = Metadata::default();

    if let Some(title) = meta_tag(html, r#"property="og:title""#)
        .or_else(|| meta_tag(html, r#"name="title""#))
    {
        meta.title = title;
    }
    if let Some(date) = meta_tag(html, r#"itemprop="datePublished""#) {
        meta.year = publish_year(&date);
    }
    if let Some(keywords) = meta_tag(html, r#"name="keywords""#) {
        let list: Vec<String> = keywords.split(',').map(|k| k.trim().to_string()).collect();
        meta.keywords = join_keywords(&list, max_keywords);
    }

    meta
}

fn meta_tag(html: &str, attr: &str) -> Option<String> {
    let pattern = format!(r#"<meta\s+{}\s+content="([^"]*)""#, regex::escape(attr));
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(html)?;
    let content = html_escape::decode_html_entities(&caps[1]).trim().to_string();
    if content.is_empty() { None } else { Some(content) }
}

fn join_keywords(keywords: &[String], max_keywords: usize) -> String {
    keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .take(max_keywords)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Pick a caption track: manual track in language priority order, then any
/// manual track, then an auto-generated one in priority order, then whatever
/// is first.
pub fn select_track<'a>(tracks: &'a [CaptionTrack], langs: &[String]) -> Option<&'a CaptionTrack> {
    for lang in langs {
        if let Some(track) = tracks
            .iter()
            .find(|t| t.language_code == *lang && !t.is_generated())
        {
            return Some(track);
        }
    }
    if let Some(track) = tracks.iter().find(|t| !t.is_generated()) {
        return Some(track);
    }
    for lang in langs {
        if let Some(track) = tracks.iter().find(|t| t.language_code == *lang) {
            return Some(track);
        }
    }
    tracks.first()
}

/// Download a caption track body and parse it into segments, trying JSON3,
/// then WebVTT, then the legacy timedtext XML the bare URL serves.
pub async fn fetch_caption_segments(
    client: &reqwest::Client,
    track: &CaptionTrack,
    user_agent: &str,
) -> Result<Vec<Segment>> {
    let attempts: [(&str, fn(&str) -> Result<Vec<Segment>>); 3] = [
        ("&fmt=json3", captions::parse_json3),
        ("&fmt=vtt", captions::parse_vtt),
        ("", captions::parse_timedtext_xml),
    ];

    let mut last_err = None;
    for (fmt, parse) in attempts {
        let url = format!("{}{fmt}", track.base_url);
        debug!("Fetching caption body: {url}");
        let result = async {
            let body = client
                .get(&url)
                .header("User-Agent", user_agent)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            parse(&body)
        }
        .await;

        match result {
            Ok(segments) if !segments.is_empty() => return Ok(segments),
            Ok(_) => debug!("Caption body at {url} parsed to zero segments"),
            Err(e) => {
                debug!("Caption fetch failed for {url}: {e}");
                last_err = Some(e);
            }
        }
    }

    match last_err {
        Some(e) => Err(e.wrap_err("no caption format yielded usable segments")),
        None => bail!("caption track contained no text"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATCH_HTML: &str = r#"<html><head>
<meta name="title" content="Scraped Title">
<meta itemprop="datePublished" content="2019-07-01">
<meta name="keywords" content="rust, parsing, youtube">
<script type="application/ld+json">{"name":"LD Title","author":"LD Channel","uploadDate":"2019-07-01"}</script>
</head><body>
<script>var ytInitialPlayerResponse = {"videoDetails":{"title":"Player Title","author":"Player Channel","keywords":["one","two","three"]},"microformat":{"playerMicroformatRenderer":{"publishDate":"2019-07-01"}},"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://example.test/tt","languageCode":"en"}]}}};</script>
</body></html>"#;

    fn track(lang: &str, kind: Option<&str>) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://example.test/{lang}"),
            language_code: lang.to_string(),
            kind: kind.map(|k| k.to_string()),
        }
    }

    #[test]
    fn test_extract_player_response() {
        let player = extract_player_response(WATCH_HTML).unwrap();
        let details = player.video_details.unwrap();
        assert_eq!(details.title.as_deref(), Some("Player Title"));
        assert_eq!(details.author.as_deref(), Some("Player Channel"));
    }

    #[test]
    fn test_extract_player_response_missing() {
        let err = extract_player_response("<html></html>").unwrap_err();
        assert!(!err.to_string().contains(BOT_CHECK_MARKER));
    }

    #[test]
    fn test_extract_player_response_bot_page() {
        let html = r#"<html><body><div class="g-recaptcha"></div>Sign in to confirm you're not a bot</body></html>"#;
        let err = extract_player_response(html).unwrap_err();
        assert!(err.to_string().contains(BOT_CHECK_MARKER));
    }

    #[test]
    fn test_scrape_watch_html_full() {
        let page = scrape_watch_html(WATCH_HTML, 15).unwrap();
        assert_eq!(page.metadata.title, "Player Title");
        assert_eq!(page.metadata.author, "Player Channel");
        assert_eq!(page.metadata.year, "2019");
        assert_eq!(page.metadata.keywords, "one, two, three");
        assert!(page.metadata.thumbnail.is_empty());
        assert_eq!(page.caption_tracks.len(), 1);
        assert_eq!(page.caption_tracks[0].language_code, "en");
    }

    #[test]
    fn test_scrape_watch_html_falls_back_to_ld_json() {
        let html = r#"<html><script type="application/ld+json">{"name":"LD Title","author":{"name":"LD Channel"},"uploadDate":"2022-01-15"}</script></html>"#;
        let page = scrape_watch_html(html, 15).unwrap();
        assert_eq!(page.metadata.title, "LD Title");
        assert_eq!(page.metadata.author, "LD Channel");
        assert_eq!(page.metadata.year, "2022");
        assert!(page.caption_tracks.is_empty());
    }

    #[test]
    fn test_scrape_watch_html_meta_tags_only() {
        let html = r#"<html><meta name="title" content="Tag Title"><meta itemprop="datePublished" content="2018-03-09"><meta name="keywords" content="a, b, c, d"></html>"#;
        let page = scrape_watch_html(html, 2).unwrap();
        assert_eq!(page.metadata.title, "Tag Title");
        assert_eq!(page.metadata.year, "2018");
        assert_eq!(page.metadata.keywords, "a, b");
    }

    #[test]
    fn test_scrape_watch_html_bot_page_is_fatal() {
        let html = "<html>Sign in to confirm you're not a bot</html>";
        let err = scrape_watch_html(html, 15).unwrap_err();
        assert!(err.to_string().contains(BOT_CHECK_MARKER));
    }

    #[test]
    fn test_keywords_truncated() {
        let keywords: Vec<String> = (1..=20).map(|i| format!("kw{i}")).collect();
        let joined = join_keywords(&keywords, 15);
        assert_eq!(joined.split(", ").count(), 15);
        assert!(joined.starts_with("kw1, kw2"));
        assert!(joined.ends_with("kw15"));
    }

    #[test]
    fn test_select_track_prefers_language_priority() {
        let tracks = vec![track("en", None), track("id", None)];
        let langs = vec!["id".to_string(), "en".to_string()];
        assert_eq!(select_track(&tracks, &langs).unwrap().language_code, "id");
    }

    #[test]
    fn test_select_track_prefers_manual_over_generated() {
        let tracks = vec![track("id", Some("asr")), track("en", None)];
        let langs = vec!["id".to_string(), "en".to_string()];
        assert_eq!(select_track(&tracks, &langs).unwrap().language_code, "en");
    }

    #[test]
    fn test_select_track_generated_when_nothing_else() {
        let tracks = vec![track("id", Some("asr"))];
        let langs = vec!["id".to_string()];
        assert!(select_track(&tracks, &langs).unwrap().is_generated());
    }

    #[test]
    fn test_select_track_falls_back_to_first() {
        let tracks = vec![track("fr", Some("asr")), track("de", Some("asr"))];
        let langs = vec!["id".to_string(), "en".to_string()];
        assert_eq!(select_track(&tracks, &langs).unwrap().language_code, "fr");
    }

    #[test]
    fn test_select_track_empty() {
        assert!(select_track(&[], &["en".to_string()]).is_none());
    }
}
