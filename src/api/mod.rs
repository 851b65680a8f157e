//! Remote backend and object-store clients.

pub mod auth;
pub mod envelope;
pub mod upload;
pub mod work_items;

/// Build a form-urlencoded POST body from key/value pairs.
pub(crate) fn form_body(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
