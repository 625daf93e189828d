//! Transport seam between request signing and the network.
//!
//! The core crate performs no I/O. A [`Transport`] posts a serialized body to
//! a gateway endpoint using the client certificate issued for the merchant and
//! hands back the raw response bytes. HTTP status is not interpreted: the
//! protocol reports success and failure inside the XML body.
//!
//! Implementations must not retry. A retried disbursement after an ambiguous
//! failure can pay twice.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::TransportError;

/// A boxed, `Send` future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Gateway endpoints of the red-envelope API family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Single-recipient red envelope.
    SendRedPack,
    /// Group (fission) red envelope.
    SendGroupRedPack,
}

impl Endpoint {
    /// Path of the endpoint relative to the gateway base URL.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::SendRedPack => "mmpaymkttransfers/sendredpack",
            Self::SendGroupRedPack => "mmpaymkttransfers/sendgroupredpack",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// One POST to the gateway.
#[derive(Debug, Clone)]
pub struct TransportRequest<'a> {
    /// Target endpoint.
    pub endpoint: Endpoint,
    /// Serialized XML body.
    pub body: String,
    /// Merchant id that selects the client certificate.
    pub mch_id: &'a str,
    /// PEM bundle to load if no certificate is cached for `mch_id` yet.
    pub cert_path: &'a Path,
}

/// Posts signed request bodies over mutually authenticated TLS.
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the raw response body.
    ///
    /// Must return the body of any completed HTTP exchange regardless of
    /// status code, and must never retry.
    fn post_xml<'a>(
        &'a self,
        request: TransportRequest<'a>,
    ) -> BoxFuture<'a, Result<Vec<u8>, TransportError>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn post_xml<'a>(
        &'a self,
        request: TransportRequest<'a>,
    ) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
        (**self).post_xml(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn post_xml<'a>(
        &'a self,
        request: TransportRequest<'a>,
    ) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
        (**self).post_xml(request)
    }
}
