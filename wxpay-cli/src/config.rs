//! Command-line tool configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax, so the
//! shared key can stay out of the file.
//!
//! # Example Configuration
//!
//! ```toml
//! [merchant]
//! app_id = "wx8888888888888888"
//! mch_id = "10000100"
//! key = "$WXPAY_KEY"
//! client_ip = "203.0.113.7"
//! cert_path = "/etc/wxpay/apiclient.pem"
//!
//! [gateway]
//! url = "https://api.mch.weixin.qq.com/"
//! timeout_secs = 10
//!
//! [log]
//! filter = "info,wxpay=debug"
//! ```
//!
//! # Environment Variables
//!
//! - `WXPAY_CONFIG`: Path to configuration file (default: `wxpay.toml`)
//! - Any variable referenced by `$VAR` in the config file

use std::path::Path;

use serde::Deserialize;
use wxpay::MerchantConfig;
use wxpay_http::constants::DEFAULT_GATEWAY_URL;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "wxpay.toml";

/// Top-level tool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Merchant credentials.
    pub merchant: MerchantConfig,

    /// Gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Gateway connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Gateway base URL (default: production).
    #[serde(default = "default_gateway_url")]
    pub url: String,

    /// Request timeout in seconds. No timeout when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            timeout_secs: None,
        }
    }
}

/// Logging settings, applied once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `tracing-subscriber` filter directive. `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_gateway_url() -> String {
    DEFAULT_GATEWAY_URL.to_owned()
}

fn default_log_filter() -> String {
    "info".to_owned()
}

impl AppConfig {
    /// Loads configuration from a file path.
    ///
    /// All `$VAR` / `${VAR}` references are expanded from the process
    /// environment before parsing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text, expanding environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let expanded = expand_env_vars(content);
        Ok(toml::from_str(&expanded)?)
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }

        let mut var_name = String::new();
        while let Some(&c) = chars.peek() {
            if braced {
                if c == '}' {
                    chars.next();
                    break;
                }
            } else if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            var_name.push(c);
            chars.next();
        }

        match std::env::var(&var_name) {
            Ok(val) if !var_name.is_empty() => result.push_str(&val),
            _ => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&var_name);
                if braced && !var_name.is_empty() {
                    result.push('}');
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_leaves_plain_text_alone() {
        assert_eq!(expand_env_vars("no vars here"), "no vars here");
        assert_eq!(expand_env_vars("cost: 5$"), "cost: 5$");
    }

    #[test]
    fn test_expand_known_variables() {
        // PATH is set in every test environment.
        let path = std::env::var("PATH").unwrap();
        assert_eq!(expand_env_vars("$PATH"), path);
        assert_eq!(expand_env_vars("a=${PATH};"), format!("a={path};"));
    }

    #[test]
    fn test_expand_keeps_unresolved_variables() {
        assert_eq!(
            expand_env_vars("key = \"$WXPAY_TEST_SURELY_UNSET_VAR\""),
            "key = \"$WXPAY_TEST_SURELY_UNSET_VAR\""
        );
        assert_eq!(
            expand_env_vars("${WXPAY_TEST_SURELY_UNSET_VAR}"),
            "${WXPAY_TEST_SURELY_UNSET_VAR}"
        );
    }

    #[test]
    fn test_parse_full_config() {
        let config = AppConfig::parse(
            r#"
            [merchant]
            app_id = "wx8888888888888888"
            mch_id = "10000100"
            key = "192006250b4c09247ec02edce69f6a2d"
            client_ip = "127.0.0.1"
            cert_path = "/etc/wxpay/apiclient.pem"

            [gateway]
            url = "http://127.0.0.1:8080"
            timeout_secs = 5

            [log]
            filter = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.merchant.mch_id, "10000100");
        assert_eq!(config.merchant.key.expose(), "192006250b4c09247ec02edce69f6a2d");
        assert!(config.merchant.validate().is_ok());
        assert_eq!(config.gateway.url, "http://127.0.0.1:8080");
        assert_eq!(config.gateway.timeout_secs, Some(5));
        assert_eq!(config.log.filter, "debug");
    }

    #[test]
    fn test_parse_defaults() {
        let config = AppConfig::parse(
            r#"
            [merchant]
            app_id = "wx8888888888888888"
            mch_id = "10000100"
            key = "k"
            client_ip = "127.0.0.1"
            cert_path = "apiclient.pem"
            "#,
        )
        .unwrap();
        assert_eq!(config.gateway.url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.gateway.timeout_secs, None);
        assert_eq!(config.log.filter, "info");
        assert_eq!(config.merchant.notify_url, None);
    }

    #[test]
    fn test_parse_rejects_missing_merchant() {
        assert!(AppConfig::parse("[log]\nfilter = \"info\"\n").is_err());
    }
}
