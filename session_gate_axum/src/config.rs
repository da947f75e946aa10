//! Central configuration for the session_gate_axum crate

use std::sync::LazyLock;

use http::{HeaderName, HeaderValue};
use regex::Regex;
use thiserror::Error;

use session_gate::GATE_API_PREFIX;

/// Request header carrying the username on protected calls
/// Default: "x-username"
pub static GATE_IDENTITY_HEADER: LazyLock<String> = LazyLock::new(|| {
    std::env::var("GATE_IDENTITY_HEADER").unwrap_or_else(|_| "x-username".to_string())
});

/// Request header carrying the session token on protected calls
/// Default: "x-session-token"
pub static GATE_TOKEN_HEADER: LazyLock<String> = LazyLock::new(|| {
    std::env::var("GATE_TOKEN_HEADER").unwrap_or_else(|_| "x-session-token".to_string())
});

pub(crate) const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

#[derive(Debug, Error)]
pub enum GateConfigError {
    #[error("Invalid header name: {0}")]
    InvalidHeader(String),

    #[error("Invalid route pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Routing rules of the access gate
#[derive(Debug, Clone)]
pub struct GateConfig {
    api_prefix: String,
    identity_header: HeaderName,
    token_header: HeaderName,
    public_patterns: Vec<Regex>,
    cors_allow_headers: HeaderValue,
}

impl GateConfig {
    /// Build from `GATE_API_PREFIX`, `GATE_IDENTITY_HEADER` and `GATE_TOKEN_HEADER`
    pub fn from_env() -> Result<Self, GateConfigError> {
        Self::new(
            GATE_API_PREFIX.as_str(),
            GATE_IDENTITY_HEADER.as_str(),
            GATE_TOKEN_HEADER.as_str(),
        )
    }

    /// Build with the default public routes: `/`, `/login` and `{prefix}/auth/(login|logout)`
    pub fn new(
        api_prefix: &str,
        identity_header: &str,
        token_header: &str,
    ) -> Result<Self, GateConfigError> {
        let api_prefix = normalize_prefix(api_prefix);
        let identity_header = parse_header_name(identity_header)?;
        let token_header = parse_header_name(token_header)?;

        let public_patterns = default_public_patterns(&api_prefix)
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        let cors_allow_headers = HeaderValue::from_str(&format!(
            "Content-Type, Authorization, {}, {}",
            identity_header.as_str(),
            token_header.as_str()
        ))
        .map_err(|e| GateConfigError::InvalidHeader(e.to_string()))?;

        Ok(Self {
            api_prefix,
            identity_header,
            token_header,
            public_patterns,
            cors_allow_headers,
        })
    }

    /// Replace the public route patterns
    ///
    /// Patterns are matched in order against the request path; anchor them explicitly.
    pub fn with_public_patterns<S: AsRef<str>>(
        mut self,
        patterns: &[S],
    ) -> Result<Self, GateConfigError> {
        self.public_patterns = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self)
    }

    /// Protected prefix without a trailing slash, empty when the whole site is the API
    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    pub fn identity_header(&self) -> &HeaderName {
        &self.identity_header
    }

    pub fn token_header(&self) -> &HeaderName {
        &self.token_header
    }

    pub(crate) fn cors_allow_headers(&self) -> &HeaderValue {
        &self.cors_allow_headers
    }

    pub fn session_check_path(&self) -> String {
        format!("{}/auth/session", self.api_prefix)
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_patterns.iter().any(|p| p.is_match(path))
    }

    /// Whether `path` lies under the protected prefix
    pub fn is_protected(&self, path: &str) -> bool {
        path.strip_prefix(self.api_prefix.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn parse_header_name(name: &str) -> Result<HeaderName, GateConfigError> {
    HeaderName::from_bytes(name.trim().to_ascii_lowercase().as_bytes())
        .map_err(|_| GateConfigError::InvalidHeader(name.to_string()))
}

fn default_public_patterns(api_prefix: &str) -> Vec<String> {
    vec![
        "^/$".to_string(),
        "^/login$".to_string(),
        format!("^{}/auth/(login|logout)$", regex::escape(api_prefix)),
    ]
}
