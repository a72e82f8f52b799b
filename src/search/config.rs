use std::env;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub http_timeout_ms: u64,
}

impl SearchConfig {
    const BASE_URL_VARS: [&'static str; 2] = ["OPENSEARCH_URL", "AIE_OPENSEARCH_URL"];
    const USERNAME_VARS: [&'static str; 2] = ["OPENSEARCH_USERNAME", "AIE_OPENSEARCH_USERNAME"];
    const PASSWORD_VARS: [&'static str; 2] = ["OPENSEARCH_PASSWORD", "AIE_OPENSEARCH_PASSWORD"];
    const TIMEOUT_VARS: [&'static str; 2] = [
        "OPENSEARCH_HTTP_TIMEOUT_MS",
        "AIE_OPENSEARCH_HTTP_TIMEOUT_MS",
    ];

    pub fn from_env() -> Self {
        let base_url = Self::read_env(&Self::BASE_URL_VARS)
            .unwrap_or_else(|| "http://localhost:9200".to_string());
        let http_timeout_ms = Self::read_env(&Self::TIMEOUT_VARS)
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(10_000);

        Self {
            base_url,
            username: Self::read_env(&Self::USERNAME_VARS).or_else(|| Some("admin".to_string())),
            password: Self::read_env(&Self::PASSWORD_VARS).or_else(|| Some("admin".to_string())),
            http_timeout_ms,
        }
    }

    /// Unauthenticated config pointing at `base_url`.
    #[cfg(test)]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            password: None,
            http_timeout_ms: 10_000,
        }
    }

    fn read_env(candidates: &[&'static str]) -> Option<String> {
        candidates.iter().find_map(|key| env::var(key).ok())
    }
}
