use tracing::debug;

use super::{RANGE_SEPARATOR, clock_to_seconds, cue_from_range, split_blocks};
use crate::{segment::normalize_text, types::Cue};

/// Decode a WebVTT document.
///
/// Only blocks whose first line is a timing line become cues. Header, NOTE,
/// STYLE and identifier-first blocks are dropped.
pub fn decode_vtt(content: &str) -> Vec<Cue> {
    let mut cues = Vec::new();

    for block in split_blocks(content) {
        let Some((timing, body)) = block.split_first() else {
            continue;
        };
        if !timing.contains(RANGE_SEPARATOR) {
            continue;
        }

        let Some((start, end)) = parse_timing(timing) else {
            debug!("Skipping VTT block with malformed timing line: {}", timing);
            continue;
        };

        let text = strip_markup(&body.join(" "));
        if normalize_text(&text).is_empty() {
            continue;
        }

        cues.push(cue_from_range(start, end, text));
    }

    cues
}

fn parse_timing(line: &str) -> Option<(u64, u64)> {
    let (start, rest) = line.split_once(RANGE_SEPARATOR)?;
    // Cue settings may follow the end timestamp.
    let end = rest.split_whitespace().next()?;
    Some((parse_timestamp(start.trim())?, parse_timestamp(end)?))
}

/// `HH:MM:SS.mmm` or `MM:SS.mmm`, truncated to whole seconds.
fn parse_timestamp(token: &str) -> Option<u64> {
    let parts: Vec<&str> = token.split(':').collect();
    match parts.as_slice() {
        [h, m, s] => clock_to_seconds(h, m, s),
        [m, s] => clock_to_seconds("0", m, s),
        _ => None,
    }
}

/// Drop inline tags (`<c>`, `<i>`, `<v Name>`, `<00:00:01.000>`) and decode
/// the handful of entities VTT allows in cue text. A `<` with no closing `>`
/// after it is literal text.
fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                rest = &rest[open..];
                break;
            }
        }
    }
    out.push_str(rest);

    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cue() {
        let cues = decode_vtt("00:00:01.000 --> 00:00:03.000\nHello world");
        assert_eq!(cues, vec![Cue::new(1.0, 2.0, "Hello world")]);
    }

    #[test]
    fn test_header_and_metadata_blocks_are_ignored() {
        let doc = "WEBVTT\nKind: captions\nLanguage: ar\n\n\
                   NOTE produced by hand\n\n\
                   00:05.500 --> 00:07.900\nfirst\nline two\n\n\
                   01:00:00.000 --> 01:00:04.250\nlate cue";
        let cues = decode_vtt(doc);
        assert_eq!(
            cues,
            vec![
                Cue::new(5.0, 2.0, "first line two"),
                Cue::new(3600.0, 4.0, "late cue"),
            ]
        );
    }

    #[test]
    fn test_identifier_first_block_is_dropped() {
        let doc = "intro\n00:00:01.000 --> 00:00:02.000\nskipped\n\n\
                   00:00:03.000 --> 00:00:04.000\nkept";
        let cues = decode_vtt(doc);
        assert_eq!(cues, vec![Cue::new(3.0, 1.0, "kept")]);
    }

    #[test]
    fn test_malformed_timestamp_skips_only_that_block() {
        let doc = "00:00:01.000 --> 00:xx:03.000\nbroken\n\n\
                   00:00:04.000 --> 00:00:06.000\nfine\n\n\
                   00:00:07 --> 1:2:3:4\nalso broken";
        let cues = decode_vtt(doc);
        assert_eq!(cues, vec![Cue::new(4.0, 2.0, "fine")]);
    }

    #[test]
    fn test_cue_settings_after_end_timestamp() {
        let cues =
            decode_vtt("00:00:10.000 --> 00:00:12.500 align:start position:0%\nwith settings");
        assert_eq!(cues, vec![Cue::new(10.0, 2.0, "with settings")]);
    }

    #[test]
    fn test_end_before_start_gives_zero_duration() {
        let cues = decode_vtt("00:00:09.000 --> 00:00:03.000\nbackwards");
        assert_eq!(cues, vec![Cue::new(9.0, 0.0, "backwards")]);
    }

    #[test]
    fn test_empty_and_markup_only_bodies_are_skipped() {
        let doc = "00:00:01.000 --> 00:00:02.000\n\n\
                   00:00:02.000 --> 00:00:03.000\n<c> </c>\n\n\
                   00:00:03.000 --> 00:00:04.000\n<v Sam>Hi &amp; bye</v>";
        let cues = decode_vtt(doc);
        assert_eq!(cues, vec![Cue::new(3.0, 1.0, "Hi & bye")]);
    }

    #[test]
    fn test_inline_timestamps_are_removed() {
        let cues = decode_vtt(
            "00:00:01.000 --> 00:00:04.000\nso<00:00:01.500><c> this</c><00:00:02.000><c> works</c>",
        );
        assert_eq!(cues[0].text, "so this works");
    }

    #[test]
    fn test_overflowing_hours_skip_only_that_block() {
        let doc = "00:00:01.000 --> 00:00:02.000\nkept\n\n\
                   9999999999999999:00:00.000 --> 9999999999999999:00:01.000\nhuge";
        let cues = decode_vtt(doc);
        assert_eq!(cues, vec![Cue::new(1.0, 1.0, "kept")]);
    }

    #[test]
    fn test_unclosed_angle_bracket_is_literal() {
        let cues = decode_vtt("00:00:01.000 --> 00:00:02.000\n1 < 2 is true");
        assert_eq!(cues[0].text, "1 < 2 is true");

        let cues = decode_vtt("00:00:01.000 --> 00:00:02.000\n<i>a</i> < b");
        assert_eq!(cues[0].text, "a < b");
    }
}
