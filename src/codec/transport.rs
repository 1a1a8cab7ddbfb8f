//! Transport strings: `<origin><path>#w=<payload>`.
//!
//! The payload always lives in the URL fragment. Browsers never send the
//! fragment to the server, so opening a share link reveals nothing to the
//! host that serves the page.

/// Fragment prefix that identifies a wish payload.
pub const MARKER: &str = "w=";

/// Builds a transport string from a base URL and a compressed payload.
///
/// Any fragment already present on `base_url` is dropped.
pub fn pack(base_url: &str, payload: &str) -> String {
    let base = match base_url.find('#') {
        Some(idx) => &base_url[..idx],
        None => base_url,
    };
    format!("{}#{}{}", base, MARKER, payload)
}

/// Locates the payload in a transport string.
///
/// Accepts full URLs as well as bare fragments (`#w=...`). Returns `None`
/// when there is no fragment or the fragment does not start with the marker.
pub fn extract_payload(transport: &str) -> Option<&str> {
    let (_, fragment) = transport.trim().split_once('#')?;
    fragment.strip_prefix(MARKER)
}

/// Returns true if the string carries the payload marker.
pub fn has_marker(transport: &str) -> bool {
    extract_payload(transport).is_some()
}
