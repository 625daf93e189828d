//! Client certificate loading and the per-merchant client registry.
//!
//! Each merchant id maps to one `reqwest::Client` carrying that merchant's
//! TLS identity. Clients are built once, on first use or through
//! [`ClientRegistry::preload`], and are then shared read-only by every
//! concurrent call for that merchant.

use std::path::Path;
use std::sync::Once;
use std::time::Duration;

use dashmap::DashMap;
use reqwest::{Client, Identity};
use wxpay::TransportError;

static CRYPTO_PROVIDER: Once = Once::new();

/// Installs the process-wide rustls crypto provider if none is installed yet.
fn install_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        // Another component may already have installed one.
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Reads a PEM bundle holding the certificate chain and private key.
///
/// # Errors
///
/// Returns a certificate [`TransportError`] if the file cannot be read or
/// does not contain a usable identity.
pub fn load_identity(mch_id: &str, cert_path: &Path) -> Result<Identity, TransportError> {
    let pem = std::fs::read(cert_path).map_err(|e| {
        TransportError::certificate(format!(
            "failed to read client certificate {} for merchant {mch_id}",
            cert_path.display()
        ))
        .with_source(e)
    })?;
    Identity::from_pem(&pem).map_err(|e| {
        TransportError::certificate(format!(
            "invalid client certificate {} for merchant {mch_id}",
            cert_path.display()
        ))
        .with_source(e)
    })
}

/// Cache of mutual-TLS clients keyed by merchant id.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    timeout: Option<Duration>,
    clients: DashMap<String, Client>,
}

impl ClientRegistry {
    /// Creates an empty registry whose clients apply `timeout` to every request.
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            clients: DashMap::new(),
        }
    }

    /// Loads the identity for `mch_id` now, replacing any cached client.
    ///
    /// # Errors
    ///
    /// Returns a certificate [`TransportError`] if the identity cannot be loaded.
    pub fn preload(&self, mch_id: &str, cert_path: &Path) -> Result<(), TransportError> {
        let client = self.build(mch_id, cert_path)?;
        self.clients.insert(mch_id.to_owned(), client);
        Ok(())
    }

    /// Returns the client for `mch_id`, building it from `cert_path` on first use.
    ///
    /// # Errors
    ///
    /// Returns a certificate [`TransportError`] if the identity cannot be loaded.
    pub fn client_for(&self, mch_id: &str, cert_path: &Path) -> Result<Client, TransportError> {
        if let Some(client) = self.clients.get(mch_id) {
            return Ok(client.value().clone());
        }
        let client = self.build(mch_id, cert_path)?;
        let entry = self.clients.entry(mch_id.to_owned()).or_insert(client);
        Ok(entry.value().clone())
    }

    /// Returns `true` if a client is cached for `mch_id`.
    #[must_use]
    pub fn contains(&self, mch_id: &str) -> bool {
        self.clients.contains_key(mch_id)
    }

    fn build(&self, mch_id: &str, cert_path: &Path) -> Result<Client, TransportError> {
        install_crypto_provider();
        let identity = load_identity(mch_id, cert_path)?;
        let mut builder = Client::builder()
            .identity(identity)
            .redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            TransportError::certificate(format!(
                "failed to build TLS client for merchant {mch_id}"
            ))
            .with_source(e)
        })?;

        #[cfg(feature = "telemetry")]
        tracing::info!(mch_id, cert_path = %cert_path.display(), "Loaded client certificate");

        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use wxpay::TransportErrorKind;

    fn fixture() -> PathBuf {
        PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/apiclient.pem"
        ))
    }

    #[test]
    fn test_load_identity_from_pem_bundle() {
        assert!(load_identity("10000100", &fixture()).is_ok());
    }

    #[test]
    fn test_missing_certificate_file() {
        let err = load_identity("10000100", Path::new("/nonexistent/apiclient.pem")).unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Certificate);
        assert!(err.to_string().contains("10000100"));
    }

    #[test]
    fn test_garbage_certificate_file() {
        let path = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let err = load_identity("10000100", &path).unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Certificate);
    }

    #[test]
    fn test_client_is_built_once_per_merchant() {
        let registry = ClientRegistry::new(None);
        assert!(!registry.contains("10000100"));
        registry.preload("10000100", &fixture()).unwrap();
        assert!(registry.contains("10000100"));

        // Cached: the path is not read again.
        assert!(
            registry
                .client_for("10000100", Path::new("/nonexistent/apiclient.pem"))
                .is_ok()
        );
        let err = registry
            .client_for("10000200", Path::new("/nonexistent/apiclient.pem"))
            .unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Certificate);
        assert!(!registry.contains("10000200"));
    }
}
