//! URL slugs for blog posts.
//!
//! A slug is derived from the post title. When the derived slug is already
//! owned by another post, a six-digit fragment of the current millisecond
//! timestamp is appended (`rumah-minimalis-482913`). The fragment is bumped
//! until the candidate is free, so two posts with the same title created in
//! the same millisecond still end up with distinct slugs.

use std::sync::LazyLock;

use regex::Regex;

/// Slug used when a title contains no sluggable characters at all.
pub const FALLBACK_SLUG: &str = "post";

const FRAGMENT_MODULUS: u64 = 1_000_000;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s_-]").expect("valid slug regex"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_-]+").expect("valid separator regex"));

/// Derive a URL-safe slug from a title.
pub fn generate_slug(title: &str) -> String {
    let lower = title.trim().to_lowercase();
    let stripped = DISALLOWED.replace_all(&lower, "");
    let dashed = SEPARATORS.replace_all(&stripped, "-");
    let slug = dashed.trim_matches('-');
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// Last six digits of a millisecond timestamp, zero padded.
pub fn timestamp_fragment(millis: u64) -> String {
    format!("{:06}", millis % FRAGMENT_MODULUS)
}

/// Pick a slug that `is_taken` reports as free.
///
/// Returns `base` untouched when it is free. Otherwise appends the timestamp
/// fragment and increments it (wrapping at one million) until a free
/// candidate turns up. Fails only if every one of the million suffixed
/// candidates is taken.
pub fn resolve_slug<E>(
    base: &str,
    millis: u64,
    mut is_taken: impl FnMut(&str) -> Result<bool, E>,
) -> Result<Option<String>, E> {
    if !is_taken(base)? {
        return Ok(Some(base.to_string()));
    }
    let start = millis % FRAGMENT_MODULUS;
    for step in 0..FRAGMENT_MODULUS {
        let fragment = timestamp_fragment((start + step) % FRAGMENT_MODULUS);
        let candidate = format!("{}-{}", base, fragment);
        if !is_taken(&candidate)? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// True when `slug` is `base` itself or `base` plus a six-digit fragment.
///
/// Used on update so that re-saving a post whose slug was suffixed on
/// creation does not mint a fresh suffix every time.
pub fn slug_matches_base(slug: &str, base: &str) -> bool {
    if slug == base {
        return true;
    }
    match slug.strip_prefix(base).and_then(|rest| rest.strip_prefix('-')) {
        Some(fragment) => fragment.len() == 6 && fragment.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// True when a blog lookup key should be treated as a numeric id.
pub fn is_numeric_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}
