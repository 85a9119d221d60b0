use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// `MM:SS`, minutes keep counting past 99
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// `1h 5m` for an hour or more, otherwise `45m`
pub fn format_minutes(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

/// Cuts `text` to at most `max_width` display columns, appending `...` when cut.
pub fn truncate_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}
