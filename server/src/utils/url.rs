//! URL helpers for connection strings

/// Sanitize a Redis URL for logging (masks the password)
///
/// Handles `redis://[user:password@]host:port/db` and the TLS variant.
pub fn sanitize_redis_url(url: &str) -> String {
    // rfind: passwords may themselves contain '@'
    if let Some(at_pos) = url.rfind('@') {
        let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
        if scheme_end <= at_pos
            && let Some(colon_pos) = url[scheme_end..at_pos].find(':')
        {
            let abs_colon = scheme_end + colon_pos;
            return format!("{}***{}", &url[..abs_colon + 1], &url[at_pos..]);
        }
    }
    url.to_string()
}
