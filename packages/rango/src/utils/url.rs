use url::Url;

/// Longest URL accepted by the forms, in characters.
pub const URL_MAX_LENGTH: usize = 200;

/// Prefix `http://` when the user typed a bare host.
pub fn ensure_scheme(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

/// An absolute `http(s)` URL with a host, no whitespace, and at most
/// [`URL_MAX_LENGTH`] characters.
pub fn is_valid_http_url(url: &str) -> bool {
    if url.chars().count() > URL_MAX_LENGTH
        || url.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.has_host(),
        Err(_) => false,
    }
}
