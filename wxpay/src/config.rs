//! Merchant configuration and signing context.
//!
//! Configuration is supplied by the caller, treated as read-only for the
//! lifetime of a client, and shared between concurrent calls behind an `Arc`.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ValidationError;

/// The merchant's shared API key.
///
/// The value is never printed by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SecretKey(String);

impl SecretKey {
    /// Wraps a shared key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the raw key for signing.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if no key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Credentials and call-site settings for one merchant account.
///
/// # Example
///
/// ```rust
/// use wxpay::config::{MerchantConfig, SecretKey};
///
/// let config = MerchantConfig {
///     app_id: "wx8888888888888888".into(),
///     mch_id: "10000100".into(),
///     key: SecretKey::new("192006250b4c09247ec02edce69f6a2d"),
///     client_ip: "127.0.0.1".into(),
///     notify_url: None,
///     cert_path: "/etc/wxpay/apiclient.pem".into(),
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MerchantConfig {
    /// Official account / app id (`wxappid` on the wire).
    pub app_id: String,

    /// Merchant id (`mch_id` on the wire). Also selects the client certificate.
    pub mch_id: String,

    /// Shared key used for MD5 signing.
    pub key: SecretKey,

    /// IP address of the machine calling the API (`client_ip`).
    pub client_ip: String,

    /// Payment notification URL. Not used by red-envelope calls.
    #[serde(default)]
    pub notify_url: Option<String>,

    /// PEM bundle (certificate chain and private key) issued for `mch_id`.
    pub cert_path: PathBuf,
}

impl MerchantConfig {
    /// Checks that every mandatory credential is present.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first empty field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.app_id.trim().is_empty() {
            return Err(ValidationError::missing("app_id"));
        }
        if self.mch_id.trim().is_empty() {
            return Err(ValidationError::missing("mch_id"));
        }
        if self.key.is_empty() {
            return Err(ValidationError::missing("key"));
        }
        if self.client_ip.trim().is_empty() {
            return Err(ValidationError::missing("client_ip"));
        }
        if self.cert_path.as_os_str().is_empty() {
            return Err(ValidationError::missing("cert_path"));
        }
        Ok(())
    }

    /// Borrows the identifiers and key needed to sign a request.
    #[must_use]
    pub fn signing_context(&self) -> SigningContext<'_> {
        SigningContext {
            mch_id: &self.mch_id,
            app_id: &self.app_id,
            key: &self.key,
        }
    }
}

/// Read-only view of the credentials used for one signing operation.
#[derive(Debug, Clone, Copy)]
pub struct SigningContext<'a> {
    /// Merchant id.
    pub mch_id: &'a str,
    /// App id.
    pub app_id: &'a str,
    /// Shared key.
    pub key: &'a SecretKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MerchantConfig {
        MerchantConfig {
            app_id: "wx8888888888888888".into(),
            mch_id: "10000100".into(),
            key: SecretKey::new("192006250b4c09247ec02edce69f6a2d"),
            client_ip: "127.0.0.1".into(),
            notify_url: None,
            cert_path: "apiclient.pem".into(),
        }
    }

    #[test]
    fn test_secret_key_is_redacted() {
        let config = config();
        let debug = format!("{config:?}");
        assert!(!debug.contains("192006250b4c09247ec02edce69f6a2d"));
        assert!(debug.contains("SecretKey(***)"));
        assert_eq!(config.key.to_string(), "***");
    }

    #[test]
    fn test_validate_names_first_missing_field() {
        assert!(config().validate().is_ok());

        let mut missing_mch = config();
        missing_mch.mch_id = String::new();
        assert_eq!(missing_mch.validate().unwrap_err().field, "mch_id");

        let mut missing_key = config();
        missing_key.key = SecretKey::new("");
        assert_eq!(missing_key.validate().unwrap_err().field, "key");

        let mut blank_ip = config();
        blank_ip.client_ip = "  ".into();
        assert_eq!(blank_ip.validate().unwrap_err().field, "client_ip");

        let mut no_cert = config();
        no_cert.cert_path = PathBuf::new();
        assert_eq!(no_cert.validate().unwrap_err().field, "cert_path");
    }

    #[test]
    fn test_signing_context_borrows_config() {
        let config = config();
        let ctx = config.signing_context();
        assert_eq!(ctx.mch_id, "10000100");
        assert_eq!(ctx.app_id, "wx8888888888888888");
        assert_eq!(ctx.key.expose(), "192006250b4c09247ec02edce69f6a2d");
    }
}
