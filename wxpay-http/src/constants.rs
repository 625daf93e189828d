//! HTTP-specific constants for the merchant API.

/// Production gateway base URL.
pub const DEFAULT_GATEWAY_URL: &str = "https://api.mch.weixin.qq.com/";

/// Content type of request bodies.
pub const CONTENT_TYPE_XML: &str = "text/xml; charset=utf-8";
