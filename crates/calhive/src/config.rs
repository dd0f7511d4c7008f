use std::{env, time::Duration};

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line, for CloudWatch.
    Json,
    /// Human-readable, for local runs.
    Pretty,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Table holding every row (default: "calhive")
    pub table_name: String,
    /// Deadline of each request in milliseconds (default: 10,000)
    pub request_timeout_ms: u64,
    /// HS256 secret. When absent, tokens are decoded without verification.
    pub jwt_secret: Option<String>,
    /// Required `iss` claim, if any.
    pub jwt_issuer: Option<String>,
    pub log_format: LogFormat,
    /// Set when the Lambda runtime API is available.
    pub running_in_lambda: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TABLE_NAME` - Table name (default: "calhive")
    /// - `REQUEST_TIMEOUT_MS` - Per-request deadline (default: 10,000)
    /// - `JWT_SECRET` - HS256 verification secret (default: none)
    /// - `JWT_ISSUER` - Expected token issuer (default: none)
    /// - `LOG_FORMAT` - "json" or "pretty" (default: json under Lambda, pretty otherwise)
    /// - `AWS_LAMBDA_RUNTIME_API` - Set by the Lambda runtime
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let running_in_lambda = non_empty("AWS_LAMBDA_RUNTIME_API").is_some();
        let log_format = match non_empty("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            _ if running_in_lambda => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            table_name: non_empty("TABLE_NAME").unwrap_or_else(|| "calhive".to_string()),
            request_timeout_ms: non_empty("REQUEST_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            jwt_secret: non_empty("JWT_SECRET"),
            jwt_issuer: non_empty("JWT_ISSUER"),
            log_format,
            running_in_lambda,
        }
    }

    /// Get the request deadline as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = config(&[]);

        assert_eq!(config.table_name, "calhive");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.jwt_secret, None);
        assert_eq!(config.jwt_issuer, None);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.running_in_lambda);
    }

    #[test]
    fn test_lambda_defaults_to_json_logs() {
        let config = config(&[("AWS_LAMBDA_RUNTIME_API", "127.0.0.1:9001")]);
        assert!(config.running_in_lambda);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_log_format_override() {
        let config = config(&[
            ("AWS_LAMBDA_RUNTIME_API", "127.0.0.1:9001"),
            ("LOG_FORMAT", "pretty"),
        ]);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let config = config(&[
            ("TABLE_NAME", "calendars-prod"),
            ("REQUEST_TIMEOUT_MS", "250"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_ISSUER", "https://issuer.example"),
        ]);
        assert_eq!(config.table_name, "calendars-prod");
        assert_eq!(config.request_timeout(), Duration::from_millis(250));
        assert_eq!(config.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.jwt_issuer.as_deref(), Some("https://issuer.example"));

        let fallback = Config::from_lookup(|key| {
            (key == "REQUEST_TIMEOUT_MS").then(|| "soon".to_string())
        });
        assert_eq!(fallback.request_timeout_ms, 10_000);
    }

    #[test]
    fn test_empty_secret_is_absent() {
        let config = config(&[("JWT_SECRET", "  ")]);
        assert_eq!(config.jwt_secret, None);
    }
}
