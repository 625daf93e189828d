//! Error types for a single red-envelope disbursement attempt.
//!
//! Every failure is scoped to one call. Nothing here is retried by the
//! library: the merchant order number is the only idempotency token the
//! gateway honors, so retry policy belongs to the caller.

use std::fmt;

/// Boxed error source carried by [`TransportError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error returned by a disbursement call.
#[derive(Debug, thiserror::Error)]
pub enum RedPackError {
    /// A required field is missing, empty or out of range. Raised before any
    /// network call.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The signed request record could not be serialized to XML.
    #[error("failed to encode request XML: {0}")]
    Encode(#[from] quick_xml::SeError),

    /// Connection, TLS handshake or certificate loading failed.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// The gateway rejected the request before business logic ran.
    #[error("{0}")]
    Rejected(#[from] ProtocolRejection),

    /// The gateway processed the request but the disbursement was not executed.
    #[error("{0}")]
    Business(#[from] BusinessError),

    /// The response body is not a well-formed response document.
    #[error("{0}")]
    Parse(#[from] ParseError),
}

impl RedPackError {
    /// Returns `true` when the request may have reached the gateway and its
    /// outcome is unknown.
    ///
    /// Callers must reconcile such calls by merchant order number instead of
    /// assuming success or failure.
    #[must_use]
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_indeterminate())
    }
}

/// A disbursement field failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Wire name of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub reason: String,
}

impl ValidationError {
    /// Creates a validation error for `field`.
    #[must_use]
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    /// Creates an error for a mandatory field that is missing or empty.
    #[must_use]
    pub fn missing(field: &'static str) -> Self {
        Self::new(field, "is required and must not be empty")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid field `{}`: {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

/// Classification of a [`TransportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The client certificate could not be read, parsed or installed.
    Certificate,
    /// The request never reached the gateway (DNS, TCP connect, TLS handshake).
    Connect,
    /// The request may have reached the gateway but no complete response was
    /// received (timeout, cancellation, truncated body).
    Indeterminate,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Certificate => "certificate",
            Self::Connect => "connect",
            Self::Indeterminate => "indeterminate",
        };
        f.write_str(s)
    }
}

/// Failure in the HTTPS transport.
#[derive(Debug)]
pub struct TransportError {
    /// What kind of failure occurred.
    pub kind: TransportErrorKind,
    /// Human-readable context.
    pub message: String,
    source: Option<BoxError>,
}

impl TransportError {
    /// Creates a transport error of the given kind.
    #[must_use]
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a certificate loading error.
    #[must_use]
    pub fn certificate(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Certificate, message)
    }

    /// Creates an error for a request that never reached the gateway.
    #[must_use]
    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    /// Creates an error for a request whose outcome is unknown.
    #[must_use]
    pub fn indeterminate(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Indeterminate, message)
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns `true` if the gateway may have processed the request.
    #[must_use]
    pub fn is_indeterminate(&self) -> bool {
        self.kind == TransportErrorKind::Indeterminate
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport error ({}): {}", self.kind, self.message)?;
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// `return_code` was not `SUCCESS`: the gateway refused the request itself.
///
/// A mismatched signature is the usual cause. `signed_params` is the canonical
/// string without the trailing `&key=` segment, so it can be compared byte for
/// byte with the gateway's signature debugging tool without leaking the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolRejection {
    /// The `return_code` value received.
    pub return_code: String,
    /// The `return_msg` diagnostic, if any.
    pub return_msg: Option<String>,
    /// Raw response body.
    pub raw_body: String,
    /// Canonical parameter string that was signed, key suffix excluded.
    pub signed_params: String,
    /// Signature sent with the request.
    pub sign: String,
}

impl fmt::Display for ProtocolRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gateway rejected request [return_code: {}] [return_msg: {}] [raw: {}] [params: {}] [sign: {}]",
            self.return_code,
            self.return_msg.as_deref().unwrap_or_default(),
            self.raw_body,
            self.signed_params,
            self.sign
        )
    }
}

impl std::error::Error for ProtocolRejection {}

/// `return_code` was `SUCCESS` but `result_code` was not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessError {
    /// The `result_code` value received (usually `FAIL`).
    pub result_code: Option<String>,
    /// Gateway error code, e.g. `NOTENOUGH`.
    pub err_code: Option<String>,
    /// Human-readable description of `err_code`.
    pub err_code_des: Option<String>,
    /// Merchant order number echoed by the gateway.
    pub mch_billno: Option<String>,
}

impl fmt::Display for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "red envelope not sent, errcode={}, errmsg={}",
            self.err_code.as_deref().unwrap_or_default(),
            self.err_code_des.as_deref().unwrap_or_default()
        )
    }
}

impl std::error::Error for BusinessError {}

/// The response body could not be decoded.
#[derive(Debug, thiserror::Error)]
#[error("malformed gateway response: {source} [raw: {raw_body}]")]
pub struct ParseError {
    /// Raw response body, lossily decoded as UTF-8.
    pub raw_body: String,
    /// Why decoding failed.
    #[source]
    pub source: DecodeError,
}

/// Underlying cause of a [`ParseError`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The body is not valid UTF-8.
    #[error("response body is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    /// The body is not a well-formed response document.
    #[error("{0}")]
    Xml(#[from] quick_xml::DeError),
}
