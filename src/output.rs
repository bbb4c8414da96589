use crate::Transcript;

/// Render a transcript as timestamped lines, one `[m:ss] text` per segment.
/// Consecutive segments with identical text collapse to one line.
pub fn render_timestamped(transcript: &Transcript) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut last_text: Option<&str> = None;

    for segment in &transcript.segments {
        let text = segment.text.trim();
        if text.is_empty() || last_text == Some(text) {
            continue;
        }
        let total = segment.start as u64;
        let minutes = total / 60;
        let seconds = total % 60;
        lines.push(format!("[{minutes}:{seconds:02}] {text}"));
        last_text = Some(text);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Segment;

    fn transcript(segments: Vec<Segment>) -> Transcript {
        Transcript { segments }
    }

    fn seg(text: &str, start: f64) -> Segment {
        Segment {
            text: text.to_string(),
            start,
            duration: 1.0,
        }
    }

    #[test]
    fn test_render_timestamped() {
        let t = transcript(vec![seg("Hello world", 0.0), seg("This is a test", 65.4)]);
        assert_eq!(render_timestamped(&t), "[0:00] Hello world\n[1:05] This is a test");
    }

    #[test]
    fn test_render_pads_seconds() {
        let t = transcript(vec![seg("x", 61.0), seg("y", 3601.0)]);
        assert_eq!(render_timestamped(&t), "[1:01] x\n[60:01] y");
    }

    #[test]
    fn test_render_collapses_consecutive_duplicates() {
        let t = transcript(vec![seg("same", 0.0), seg("same", 2.0), seg("other", 4.0)]);
        assert_eq!(render_timestamped(&t), "[0:00] same\n[0:04] other");
    }

    #[test]
    fn test_render_skips_blank_segments() {
        let t = transcript(vec![seg("  ", 0.0), seg("text", 1.0)]);
        assert_eq!(render_timestamped(&t), "[0:01] text");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_timestamped(&transcript(vec![])), "");
    }
}
