use crate::types::VideoRecord;

/// Format seconds as MM:SS timestamp, or H:MM:SS past the first hour
pub fn format_timestamp(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Format a record's chunks with timestamps
pub fn format_chunks_with_timestamps(record: &VideoRecord) -> String {
    record
        .terms
        .iter()
        .map(|term| format!("[{}] {}", format_timestamp(term.t), term.text))
        .collect::<Vec<_>>()
        .join("\n")
}
