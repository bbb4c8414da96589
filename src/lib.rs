pub mod captions;
pub mod config;
pub mod oembed;
pub mod output;
pub mod server;
pub mod youtube;

use serde::Serialize;

/// A single captioned segment
#[derive(Debug, Clone, Serialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Complete transcript for a video, reconstructed from one caption track
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub segments: Vec<Segment>,
}

/// Video metadata, merged best-effort across sources
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub year: String,
    pub keywords: String,
    pub thumbnail: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata {
            title: String::new(),
            author: String::new(),
            publisher: "YouTube".to_string(),
            year: String::new(),
            keywords: String::new(),
            thumbnail: String::new(),
        }
    }
}

impl Metadata {
    /// Fill empty fields from a lower-priority source. Non-empty fields are
    /// never overwritten.
    pub fn merge_missing(&mut self, other: Metadata) {
        fn fill(field: &mut String, value: String) {
            if field.is_empty() && !value.is_empty() {
                *field = value;
            }
        }
        fill(&mut self.title, other.title);
        fill(&mut self.author, other.author);
        fill(&mut self.year, other.year);
        fill(&mut self.keywords, other.keywords);
        fill(&mut self.thumbnail, other.thumbnail);
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.author.is_empty()
    }
}

/// Reduce a date string like "2021-03-04" to its 4-digit year, or empty.
pub fn publish_year(date: &str) -> String {
    let year: String = date.chars().take(4).collect();
    if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
        year
    } else {
        String::new()
    }
}

/// Extract video ID from various YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    // Bare 11-character video ID
    if regex::Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap().is_match(input) {
        return Some(input.to_string());
    }

    // youtube.com/watch?v=ID
    if let Some(caps) = regex::Regex::new(r"(?:youtube\.com/watch\?.*v=)([a-zA-Z0-9_-]{11})")
        .unwrap()
        .captures(input)
    {
        return Some(caps[1].to_string());
    }

    // youtu.be/ID
    if let Some(caps) = regex::Regex::new(r"youtu\.be/([a-zA-Z0-9_-]{11})")
        .unwrap()
        .captures(input)
    {
        return Some(caps[1].to_string());
    }

    // youtube.com/embed/ID
    if let Some(caps) = regex::Regex::new(r"youtube\.com/embed/([a-zA-Z0-9_-]{11})")
        .unwrap()
        .captures(input)
    {
        return Some(caps[1].to_string());
    }

    // youtube.com/shorts/ID
    if let Some(caps) = regex::Regex::new(r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})")
        .unwrap()
        .captures(input)
    {
        return Some(caps[1].to_string());
    }

    // youtube.com/live/ID
    if let Some(caps) = regex::Regex::new(r"youtube\.com/live/([a-zA-Z0-9_-]{11})")
        .unwrap()
        .captures(input)
    {
        return Some(caps[1].to_string());
    }

    None
}
