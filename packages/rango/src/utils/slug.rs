/// Turn a display name into a URL-safe identifier.
///
/// Keeps ASCII letters, digits and `_`, lowercases them, collapses runs of
/// whitespace and hyphens into a single `-`, and trims `-`/`_` from both
/// ends. Everything else is dropped.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }

    out.trim_matches(|c| c == '-' || c == '_').to_string()
}
