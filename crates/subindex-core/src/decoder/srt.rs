use tracing::debug;

use super::{RANGE_SEPARATOR, clock_to_seconds, cue_from_range, split_blocks};
use crate::{segment::normalize_text, types::Cue};

/// Decode a SubRip document. The numeric index line is optional.
pub fn decode_srt(content: &str) -> Vec<Cue> {
    let mut cues = Vec::new();

    for block in split_blocks(content) {
        if block.len() < 2 {
            continue;
        }

        let timing_idx = if block[0].contains(RANGE_SEPARATOR) {
            0
        } else if block[1].contains(RANGE_SEPARATOR) {
            1
        } else {
            continue;
        };

        let Some((start, end)) = parse_timing(&block[timing_idx]) else {
            debug!("Skipping SRT block with malformed timing line: {}", block[timing_idx]);
            continue;
        };

        let text = block[timing_idx + 1..].join(" ");
        if normalize_text(&text).is_empty() {
            continue;
        }

        cues.push(cue_from_range(start, end, text));
    }

    cues
}

fn parse_timing(line: &str) -> Option<(u64, u64)> {
    let (start, end) = line.split_once(RANGE_SEPARATOR)?;
    Some((parse_timestamp(start.trim())?, parse_timestamp(end.trim())?))
}

/// `HH:MM:SS,mmm`. Milliseconds are discarded, all three clock fields are
/// required.
fn parse_timestamp(token: &str) -> Option<u64> {
    let clock = token.split(',').next()?;
    let parts: Vec<&str> = clock.split(':').collect();
    match parts.as_slice() {
        [h, m, s] if s.bytes().all(|b| b.is_ascii_digit()) => clock_to_seconds(h, m, s),
        _ => None,
    }
}
