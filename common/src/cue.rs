//! WebVTT cue parsing.
//!
//! Only cue timing and text are kept. Cue settings, `NOTE`, `STYLE` and
//! `REGION` blocks are accepted and ignored.

use std::path::Path;
use tracing::debug;

/// A single subtitle cue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start_ms: i64,
    pub end_ms: i64,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CueError {
    #[error("failed to read subtitle file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("missing WEBVTT header")]
    MissingHeader,
    #[error("line {line}: cue block has no timing line")]
    MissingTiming { line: usize },
    #[error("line {line}: invalid timestamp {value:?}")]
    BadTimestamp { line: usize, value: String },
    #[error("line {line}: cue ends before it starts")]
    Inverted { line: usize },
}

/// Read and parse a WebVTT file.
pub fn load_vtt(path: &Path) -> Result<Vec<Cue>, CueError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CueError::ReadFile(path.display().to_string(), e))?;
    let cues = parse_vtt(&content)?;
    debug!(path = %path.display(), cues = cues.len(), "loaded subtitle cues");
    Ok(cues)
}

/// Parse WebVTT text into cues, in file order.
pub fn parse_vtt(content: &str) -> Result<Vec<Cue>, CueError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let lines: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .collect();

    match lines.first() {
        Some((_, first)) if is_keyword(first, "WEBVTT") => {}
        _ => return Err(CueError::MissingHeader),
    }

    let mut cues = Vec::new();
    // The header block runs until the first blank line.
    for block in blocks(&lines).skip(1) {
        let (first_no, first) = block[0];
        if is_keyword(first, "NOTE") || is_keyword(first, "STYLE") || is_keyword(first, "REGION")
        {
            continue;
        }

        let timing_idx = if first.contains("-->") {
            0
        } else if block.len() > 1 && block[1].1.contains("-->") {
            1
        } else {
            return Err(CueError::MissingTiming { line: first_no });
        };

        let (line, timing) = block[timing_idx];
        let (start_ms, end_ms) = parse_timing(line, timing)?;
        if end_ms < start_ms {
            return Err(CueError::Inverted { line });
        }

        let text = block[timing_idx + 1..]
            .iter()
            .map(|(_, l)| *l)
            .collect::<Vec<_>>()
            .join("\n");

        cues.push(Cue {
            start_ms,
            end_ms,
            text,
        });
    }

    Ok(cues)
}

/// Split numbered lines into runs of non-blank lines.
fn blocks<'a>(lines: &'a [(usize, &'a str)]) -> impl Iterator<Item = &'a [(usize, &'a str)]> {
    lines
        .split(|(_, l)| l.trim().is_empty())
        .filter(|block| !block.is_empty())
}

/// `line` is exactly `keyword` or starts with `keyword` followed by whitespace.
fn is_keyword(line: &str, keyword: &str) -> bool {
    match line.strip_prefix(keyword) {
        Some(rest) => rest.is_empty() || rest.starts_with([' ', '\t']),
        None => false,
    }
}

fn parse_timing(line: usize, timing: &str) -> Result<(i64, i64), CueError> {
    let (start, rest) = timing
        .split_once("-->")
        .ok_or(CueError::MissingTiming { line })?;
    let end = rest.split_whitespace().next().unwrap_or("");
    Ok((
        parse_timestamp(line, start.trim())?,
        parse_timestamp(line, end)?,
    ))
}

/// Parse `hh:mm:ss.ttt` or `mm:ss.ttt` into milliseconds.
fn parse_timestamp(line: usize, value: &str) -> Result<i64, CueError> {
    let bad = || CueError::BadTimestamp {
        line,
        value: value.to_string(),
    };

    let parts: Vec<&str> = value.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (number(h).ok_or_else(bad)?, *m, *s),
        [m, s] => (0, *m, *s),
        _ => return Err(bad()),
    };

    let (secs, millis) = seconds.split_once('.').ok_or_else(bad)?;
    if minutes.len() != 2 || secs.len() != 2 || millis.len() != 3 {
        return Err(bad());
    }
    let minutes = number(minutes).ok_or_else(bad)?;
    let secs = number(secs).ok_or_else(bad)?;
    let millis = number(millis).ok_or_else(bad)?;
    if minutes > 59 || secs > 59 {
        return Err(bad());
    }

    hours
        .checked_mul(60)
        .and_then(|m| m.checked_add(minutes))
        .and_then(|m| m.checked_mul(60))
        .and_then(|s| s.checked_add(secs))
        .and_then(|s| s.checked_mul(1000))
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(bad)
}

fn number(digits: &str) -> Option<i64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "WEBVTT - sample\n\
        \n\
        NOTE produced by hand\n\
        \n\
        1\n\
        00:00:01.000 --> 00:00:04.000\n\
        Hello there.\n\
        \n\
        00:05.500 --> 00:07.250 align:start line:90%\n\
        Two lines\n\
        of text\n";

    #[test]
    fn parses_cues_in_order() {
        let cues = parse_vtt(SAMPLE).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start_ms, 1000);
        assert_eq!(cues[0].end_ms, 4000);
        assert_eq!(cues[0].text, "Hello there.");
        assert_eq!(cues[1].start_ms, 5500);
        assert_eq!(cues[1].end_ms, 7250);
        assert_eq!(cues[1].text, "Two lines\nof text");
    }

    #[test]
    fn tolerates_bom_and_crlf() {
        let text = "\u{feff}WEBVTT\r\n\r\n00:00.000 --> 00:01.000\r\nhi\r\n";
        let cues = parse_vtt(text).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "hi");
    }

    #[test]
    fn hours_field() {
        let cues = parse_vtt("WEBVTT\n\n01:02:03.004 --> 01:02:04.000\nx\n").unwrap();
        assert_eq!(cues[0].start_ms, 3_723_004);
    }

    #[test]
    fn empty_file_has_no_cues() {
        assert!(parse_vtt("WEBVTT\n").unwrap().is_empty());
    }

    #[test]
    fn missing_header() {
        assert!(matches!(
            parse_vtt("00:00.000 --> 00:01.000\nhi\n"),
            Err(CueError::MissingHeader)
        ));
        assert!(matches!(parse_vtt("WEBVTTX\n"), Err(CueError::MissingHeader)));
    }

    #[test]
    fn block_without_timing() {
        let result = parse_vtt("WEBVTT\n\njust some text\nmore text\n");
        assert!(matches!(result, Err(CueError::MissingTiming { line: 3 })));
    }

    #[test]
    fn bad_timestamp_reports_line() {
        let result = parse_vtt("WEBVTT\n\n00:00:1.000 --> 00:00:02.000\nx\n");
        assert!(matches!(result, Err(CueError::BadTimestamp { line: 3, .. })));

        let result = parse_vtt("WEBVTT\n\n00:61.000 --> 01:02.000\nx\n");
        assert!(matches!(result, Err(CueError::BadTimestamp { .. })));
    }

    #[test]
    fn huge_hours_field_rejected() {
        let result = parse_vtt("WEBVTT\n\n999999999999999999:00:00.000 --> 999999999999999999:00:01.000\nx\n");
        assert!(matches!(result, Err(CueError::BadTimestamp { line: 3, .. })));

        // Too many digits for i64 at all.
        let result = parse_vtt("WEBVTT\n\n99999999999999999999:00:00.000 --> 00:01.000\nx\n");
        assert!(matches!(result, Err(CueError::BadTimestamp { line: 3, .. })));
    }

    #[test]
    fn inverted_cue_rejected() {
        let result = parse_vtt("WEBVTT\n\n00:05.000 --> 00:04.000\nx\n");
        assert!(matches!(result, Err(CueError::Inverted { line: 3 })));
    }

    #[test]
    fn style_and_region_blocks_skipped() {
        let text = "WEBVTT\n\nSTYLE\n::cue { color: red }\n\nREGION\nid:r1\n\n00:01.000 --> 00:02.000\nok\n";
        let cues = parse_vtt(text).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start_ms, 1000);
    }
}
