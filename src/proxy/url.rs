//! Display URL helpers.

/// Join a host and a request path into a display URL for log lines.
///
/// Logging only; routing never uses this value.
pub fn concat_path(host: &str, path: &str) -> String {
    let host = host.trim_end_matches('/');
    if path.is_empty() {
        return host.to_string();
    }
    if path.starts_with('/') {
        format!("{host}{path}")
    } else {
        format!("{host}/{path}")
    }
}
