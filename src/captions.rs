use eyre::{Result, bail};
use regex::Regex;
use serde::Deserialize;

use crate::Segment;

#[derive(Debug, Deserialize)]
struct Json3Body {
    events: Option<Vec<Json3Event>>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs")]
    t_start_ms: Option<f64>,
    #[serde(rename = "dDurationMs")]
    d_duration_ms: Option<f64>,
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    utf8: Option<String>,
}

/// Parse a JSON3 caption body (`&fmt=json3`) into segments.
///
/// Events without segs carry window styling, not text, and are skipped.
/// Multiple segs on one event are concatenated as-is; the utf8 pieces
/// already carry their own spacing, so no separator is inserted.
pub fn parse_json3(body: &str) -> Result<Vec<Segment>> {
    let parsed: Json3Body = serde_json::from_str(body)?;
    let events = match parsed.events {
        Some(events) => events,
        None => bail!("caption body has no events array"),
    };

    let mut segments = Vec::new();
    for event in events {
        let segs = match event.segs {
            Some(segs) => segs,
            None => continue,
        };
        let raw: String = segs.into_iter().filter_map(|s| s.utf8).collect();
        let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            continue;
        }
        segments.push(Segment {
            text,
            start: event.t_start_ms.unwrap_or(0.0) / 1000.0,
            duration: event.d_duration_ms.unwrap_or(0.0) / 1000.0,
        });
    }

    Ok(segments)
}

/// Parse a WebVTT caption body (`&fmt=vtt`) into segments.
///
/// Cue tags, cue numbers, NOTE blocks, and the WEBVTT header are stripped;
/// consecutive identical cue lines (rolling captions) collapse to one.
pub fn parse_vtt(body: &str) -> Result<Vec<Segment>> {
    let cue_re = Regex::new(r"((?:\d+:)?\d{2}:\d{2}\.\d{3})\s*-->\s*((?:\d+:)?\d{2}:\d{2}\.\d{3})")?;
    let tag_re = Regex::new(r"<[^>]+>")?;

    let mut segments: Vec<Segment> = Vec::new();
    let mut current_start = 0.0;
    let mut current_end = 0.0;

    for line in body.lines() {
        let line = line.trim();

        if line.is_empty() || line == "WEBVTT" || line.starts_with("Kind:") || line.starts_with("Language:") || line.starts_with("NOTE") {
            continue;
        }

        if let Some(caps) = cue_re.captures(line) {
            current_start = vtt_timestamp_seconds(&caps[1]);
            current_end = vtt_timestamp_seconds(&caps[2]);
            continue;
        }

        // Cue numbers
        if line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let stripped = tag_re.replace_all(line, "");
        let text = html_escape::decode_html_entities(stripped.trim()).to_string();
        if text.is_empty() {
            continue;
        }

        // Rolling captions repeat the previous line in the next cue
        if segments.last().is_some_and(|prev| prev.text == text) {
            continue;
        }

        segments.push(Segment {
            text,
            start: current_start,
            duration: (current_end - current_start).max(0.0),
        });
    }

    Ok(segments)
}

fn vtt_timestamp_seconds(ts: &str) -> f64 {
    ts.split(':')
        .filter_map(|part| part.parse::<f64>().ok())
        .fold(0.0, |acc, part| acc * 60.0 + part)
}

/// Parse a legacy timedtext XML caption body into segments.
pub fn parse_timedtext_xml(xml: &str) -> Result<Vec<Segment>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current_start: Option<f64> = None;
    let mut current_dur: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = None;
                let mut dur = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"start" => {
                            start = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        b"dur" => {
                            dur = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        _ => {}
                    }
                }
                current_start = start;
                current_dur = dur;
            }
            Ok(Event::Empty(_)) => {
                // Self-closing <text .../> with no content — skip
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(start), Some(dur)) = (current_start.take(), current_dur.take()) {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    let text = html_escape::decode_html_entities(&raw_text).to_string();
                    if !text.is_empty() {
                        segments.push(Segment {
                            text,
                            start,
                            duration: dur,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("error parsing caption XML: {e}"),
            _ => {}
        }
    }

    Ok(segments)
}
