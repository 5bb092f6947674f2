/// Number of leading characters of a token kept visible when masking
const TOKEN_VISIBLE_CHARS: usize = 6;

/// Mask a bearer token for display and logging.
/// Only the first few characters are kept so two tokens can be told apart.
pub fn mask_token(token: &str) -> String {
    let count = token.chars().count();
    if count <= TOKEN_VISIBLE_CHARS {
        "*".repeat(count)
    } else {
        let prefix: String = token.chars().take(TOKEN_VISIBLE_CHARS).collect();
        format!("{}...({} chars)", prefix, count)
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None or blank
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}
