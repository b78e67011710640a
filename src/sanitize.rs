//! Turns titles and channel names into tokens that are safe to use as a path
//! segment on every platform we archive to.

/// Lowercases `text`, turns spaces into dashes and drops everything that is
/// not a word character (`_` or alphanumeric) or a dash.
pub fn sanitize(text: &str) -> String {
    text.to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Shared base filename for every artifact of a video:
/// `{title}_{channel}`, both sanitized.
pub fn base_filename(title: &str, channel: &str) -> String {
    format!("{}_{}", sanitize(title), sanitize(channel))
}
