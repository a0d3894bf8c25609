//! Page-path and visitor-id hygiene for the tracking beacon.

use uuid::Uuid;

/// Name of the cookie that pins a browser to a visitor id.
pub const VISITOR_COOKIE: &str = "brick_vid";

pub const MAX_PAGE_LEN: usize = 512;
pub const MAX_VISITOR_ID_LEN: usize = 64;

/// One year, in seconds.
const COOKIE_MAX_AGE: u64 = 365 * 24 * 60 * 60;

/// Strip query and fragment, force a leading slash and cap the length.
pub fn normalize_page(raw: &str) -> String {
    let path = raw
        .trim()
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let mut page = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    if page.len() > MAX_PAGE_LEN {
        let mut cut = MAX_PAGE_LEN;
        while !page.is_char_boundary(cut) {
            cut -= 1;
        }
        page.truncate(cut);
    }
    page
}

/// Accept a client-supplied visitor id only if it is short and URL-safe.
pub fn sanitize_visitor_id(raw: &str) -> Option<String> {
    let id = raw.trim();
    let valid = !id.is_empty()
        && id.len() <= MAX_VISITOR_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    valid.then(|| id.to_string())
}

/// Extract the visitor id from a raw `Cookie` header value.
pub fn visitor_from_cookie_header(header: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == VISITOR_COOKIE {
            sanitize_visitor_id(value)
        } else {
            None
        }
    })
}

pub fn new_visitor_id() -> String {
    Uuid::new_v4().to_string()
}

/// `Set-Cookie` value that persists `visitor_id`.
pub fn visitor_cookie(visitor_id: &str) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Lax; HttpOnly",
        VISITOR_COOKIE, visitor_id, COOKIE_MAX_AGE
    )
}
