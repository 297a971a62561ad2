//! Header spelling normalization.

/// Normalize a raw CSV header into its canonical lookup spelling.
///
/// Strips a single leading UTF-8 BOM, trims surrounding whitespace,
/// lowercases ASCII letters, and collapses every internal whitespace run
/// into one underscore. Idempotent: normalizing an already-normalized
/// header returns it unchanged.
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    let stripped = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let trimmed = stripped.trim();

    let mut out = String::with_capacity(trimmed.len());
    let mut in_whitespace = false;
    for ch in trimmed.chars() {
        if ch.is_whitespace() {
            in_whitespace = true;
            continue;
        }
        if in_whitespace {
            out.push('_');
            in_whitespace = false;
        }
        out.push(ch.to_ascii_lowercase());
    }
    out
}
