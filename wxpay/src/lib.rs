#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the WeChat Pay merchant red-envelope API.
//!
//! This crate contains everything needed to authorize a disbursement except
//! the network itself: canonical parameter ordering, MD5 signing, the XML
//! wire records and the classification of gateway replies. The HTTPS
//! transport lives in `wxpay-http` behind the [`transport::Transport`] trait.
//!
//! # Overview
//!
//! A disbursement is validated, given a fresh nonce, signed with the
//! merchant's shared key, serialized to XML and posted over mutual TLS. The
//! reply carries two status axes: `return_code` (did the gateway accept the
//! request) and `result_code` (was money actually moved).
//!
//! # Modules
//!
//! - [`config`] - Merchant credentials and signing context
//! - [`error`] - Error taxonomy for a disbursement attempt
//! - [`nonce`] - Per-request nonce generation
//! - [`proto`] - Wire records and XML codec
//! - [`redpack`] - Request building, dispatch and response interpretation
//! - [`sign`] - Canonical serializer and MD5 signer
//! - [`transport`] - Network seam implemented by `wxpay-http`
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod config;
pub mod error;
pub mod nonce;
pub mod proto;
pub mod redpack;
pub mod sign;
pub mod transport;

pub use config::{MerchantConfig, SecretKey};
pub use error::{RedPackError, TransportError, TransportErrorKind};
pub use redpack::{RedPackClient, RedPackKind, RedPackParams, RedPackReceipt};
