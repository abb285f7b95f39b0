pub mod item;
pub mod records;

/// Current time as epoch seconds.
pub fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

/// `YYYY-MM-DD HH:MM` (UTC) for list and detail panes.
pub fn format_epoch(epoch: i64) -> String {
    match chrono::DateTime::from_timestamp(epoch, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => String::from("-"),
    }
}
