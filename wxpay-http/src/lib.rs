//! HTTPS transport for the WeChat Pay merchant API.
//!
//! Implements [`wxpay::transport::Transport`] over mutually authenticated TLS:
//! every request is sent with the client certificate issued to the calling
//! merchant. Certificates are loaded once per merchant id and shared by all
//! concurrent calls.
//!
//! # Modules
//!
//! - [`constants`]: Gateway URL and content type
//! - [`error`]: Transport construction errors
//! - [`gateway`]: Endpoint URL resolution
//! - [`identity`]: Client certificate loading and per-merchant client cache
//! - [`transport`]: The `reqwest` transport
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod constants;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod transport;

pub use gateway::GatewayUrls;
pub use transport::MutualTlsTransport;
