use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use time::macros::format_description;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^a-zA-Z0-9\s]").unwrap();
}

/// Timestamped destination folder name for a topic,
/// e.g. `19102026_1430_UTC_morning_routine_tips`
pub fn project_folder_name(topic: &str, now: OffsetDateTime) -> String {
    let now = now.to_offset(time::UtcOffset::UTC);
    let timestamp = now
        .format(format_description!("[day][month][year]_[hour][minute]"))
        .unwrap_or_else(|_| now.unix_timestamp().to_string());

    format!("{}_UTC_{}", timestamp, topic_slug(topic))
}

/// First three words of the topic, alphanumerics only, at most 30 characters
fn topic_slug(topic: &str) -> String {
    let cleaned = NON_WORD.replace_all(topic, "");

    let slug: String = cleaned
        .split_whitespace()
        .take(3)
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
        .chars()
        .take(30)
        .collect();

    if slug.is_empty() {
        "batch".to_string()
    } else {
        slug
    }
}
