//! Project name slugs.
//!
//! A slug is the filesystem-safe form of a project's display name: lowercase,
//! every run of non-alphanumerics collapsed to a single `-`, no leading or
//! trailing `-`. "My Project" becomes `my-project`.

/// Convert a display name to its slug.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars().flat_map(|c| c.to_lowercase()) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }

    out
}
