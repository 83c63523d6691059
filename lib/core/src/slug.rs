//! Slug derivation for roles and permissions.

const SEPARATOR: char = '-';

/// Derives a slug from a human-readable name.
///
/// The name is trimmed and lowercased; every run of characters outside
/// `[a-z0-9]` becomes a single `-`, and separators are never emitted at
/// either end. A name with no ASCII alphanumerics yields an empty slug.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push(SEPARATOR);
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    slug
}
