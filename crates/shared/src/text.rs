/// Normalizes free text into a slug: lowercase ASCII alphanumerics separated
/// by single hyphens, with no leading or trailing hyphen.
///
/// ```
/// use petplates_shared::text::slug;
///
/// assert_eq!(slug("Kidney Disease"), "kidney-disease");
/// assert_eq!(slug("  Skin & Coat!! "), "skin-coat");
/// assert_eq!(slug("---"), "");
/// ```
pub fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_hyphen = false;

    for ch in value.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    out
}

/// Two slugs match when either contains the other. Empty slugs never match.
pub fn slugs_overlap(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a == b || a.contains(b) || b.contains(a))
}

/// Case-insensitive substring test.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    !needle.is_empty() && haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
