//! Error types for the HTTP transport layer.
//!
//! Per-request failures are reported as [`wxpay::TransportError`]; the types
//! here cover transport construction only.

/// Errors raised while configuring a [`crate::MutualTlsTransport`].
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// URL parse error.
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
}
