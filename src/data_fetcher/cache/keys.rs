//! Deterministic cache keys for upstream requests

use sha2::{Digest, Sha256};

/// Parameters that never change the upstream answer and are left out of the key.
const IGNORED_PARAMS: &[&str] = &["sport"];

/// Builds the cache key for an endpoint and its query parameters.
///
/// Parameters are trimmed, empty values and ignored names are dropped, and the
/// remainder is sorted, so the same logical request always maps to the same key
/// regardless of parameter order.
///
/// # Example
///
/// ```
/// use statline::data_fetcher::cache::cache_key;
///
/// let a = cache_key("/teams", &[("name", "Cowboys"), ("league", "NFL")]);
/// let b = cache_key("/teams", &[("league", "NFL"), ("name", "Cowboys"), ("sport", "")]);
/// assert_eq!(a, b);
/// ```
pub fn cache_key<K, V>(endpoint: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut normalized: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_ref().trim(), v.as_ref().trim()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty() && !IGNORED_PARAMS.contains(k))
        .collect();
    normalized.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(endpoint.trim().as_bytes());
    for (k, v) in normalized {
        hasher.update(b"\x1f");
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(v.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ignores_param_order() {
        let a = cache_key("/matches", &[("date", "2024-09-08"), ("league", "NFL")]);
        let b = cache_key("/matches", &[("league", "NFL"), ("date", "2024-09-08")]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_key_drops_empty_and_ignored_params() {
        let plain = cache_key("/teams", &[("name", "Bears")]);
        let noisy = cache_key(
            "/teams",
            &[("name", " Bears "), ("league", ""), ("sport", "american-football")],
        );
        assert_eq!(plain, noisy);
    }

    #[test]
    fn test_key_distinguishes_endpoints_and_values() {
        let teams = cache_key("/teams", &[("name", "Bears")]);
        assert_ne!(teams, cache_key("/matches", &[("name", "Bears")]));
        assert_ne!(teams, cache_key("/teams", &[("name", "Bengals")]));
        assert_ne!(teams, cache_key::<&str, &str>("/teams", &[]));
    }
}
