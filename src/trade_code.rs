/// Normalize a trade code to the canonical form the backend stores:
/// uppercase with a leading `#` marker.
///
/// Input is case-insensitive and the marker is optional; normalization is
/// idempotent so it can be applied at every boundary before a backend call.
pub fn normalize(raw: &str) -> String {
    let code = raw.trim().to_uppercase();
    if code.starts_with('#') {
        code
    } else {
        format!("#{}", code)
    }
}

/// Find the first `#`-prefixed token in free text, if any.
pub fn extract(text: &str) -> Option<&str> {
    text.split_whitespace()
        .find(|word| word.starts_with('#') && word.len() > 1)
}
