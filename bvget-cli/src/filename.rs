use chrono::{Local, TimeZone};

/// Replace the characters no mainstream filesystem accepts with `_`, one for
/// one, and trim surrounding whitespace. Nothing is collapsed: the result
/// stays the same length as the trimmed input.
pub fn sanitize(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Publish date rendered in local time, for the optional filename suffix.
pub fn date_suffix(pubdate: i64) -> Option<String> {
    Local
        .timestamp_opt(pubdate, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Final output filename: sanitized title, optional `_YYYY-MM-DD`, extension.
pub fn final_name(title: &str, pubdate: i64, with_date: bool, ext: &str) -> String {
    let mut stem = sanitize(title);
    if with_date && let Some(date) = date_suffix(pubdate) {
        stem.push('_');
        stem.push_str(&date);
    }
    format!("{stem}.{ext}")
}
