use serde::{Deserialize, Serialize};

/// HTTP ingress configuration, read from the `api_ingress` module section.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ApiIngressConfig {
    pub bind_addr: String,
    /// Per-request timeout in seconds; 0 disables it.
    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,
    #[serde(default)]
    pub cors_enabled: bool,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

const fn default_timeout_sec() -> u64 {
    30
}

const fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            timeout_sec: default_timeout_sec(),
            cors_enabled: false,
            body_limit_bytes: default_body_limit(),
        }
    }
}
