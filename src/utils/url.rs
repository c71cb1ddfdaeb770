//! URL helpers for engine endpoints.

/// Strip trailing slashes from a base URL so endpoint joins never produce
/// double slashes.
pub fn normalize_base_url(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// Join a base URL and an endpoint path.
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        normalize_base_url(base_url),
        endpoint.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_handles_stray_slashes() {
        assert_eq!(
            construct_api_url("https://api.groq.com/openai/v1", "chat/completions"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(
            construct_api_url("https://api.groq.com/openai/v1///", "/chat/completions"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn normalize_strips_trailing_slashes_only() {
        assert_eq!(normalize_base_url("https://a.example/v1/"), "https://a.example/v1");
        assert_eq!(normalize_base_url("https://a.example/v1"), "https://a.example/v1");
    }
}
