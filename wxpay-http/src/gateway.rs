//! Gateway endpoint resolution.

use url::Url;
use wxpay::transport::Endpoint;

use crate::constants::DEFAULT_GATEWAY_URL;
use crate::error::GatewayError;

/// Absolute URLs of every [`Endpoint`] under one gateway base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayUrls {
    base_url: Url,
    send_redpack: Url,
    send_group_redpack: Url,
}

impl GatewayUrls {
    /// Resolves endpoint paths relative to `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if an endpoint URL cannot be constructed.
    pub fn try_new(base_url: Url) -> Result<Self, GatewayError> {
        let send_redpack = base_url
            .join(Endpoint::SendRedPack.path())
            .map_err(|e| GatewayError::UrlParse {
                context: "Failed to construct sendredpack URL",
                source: e,
            })?;
        let send_group_redpack = base_url
            .join(Endpoint::SendGroupRedPack.path())
            .map_err(|e| GatewayError::UrlParse {
                context: "Failed to construct sendgroupredpack URL",
                source: e,
            })?;
        Ok(Self {
            base_url,
            send_redpack,
            send_group_redpack,
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the absolute URL of `endpoint`.
    #[must_use]
    pub const fn url_for(&self, endpoint: Endpoint) -> &Url {
        match endpoint {
            Endpoint::SendRedPack => &self.send_redpack,
            Endpoint::SendGroupRedPack => &self.send_group_redpack,
        }
    }
}

impl Default for GatewayUrls {
    fn default() -> Self {
        Self::try_from(DEFAULT_GATEWAY_URL).expect("default gateway URL is valid")
    }
}

/// Parses a base URL, normalizing it to a single trailing slash.
impl TryFrom<&str> for GatewayUrls {
    type Error = GatewayError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut normalized = value.trim_end_matches('/').to_owned();
        normalized.push('/');
        let url = Url::parse(&normalized).map_err(|e| GatewayError::UrlParse {
            context: "Failed to parse gateway base url",
            source: e,
        })?;
        Self::try_new(url)
    }
}

impl TryFrom<String> for GatewayUrls {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gateway_urls() {
        let urls = GatewayUrls::default();
        assert_eq!(
            urls.url_for(Endpoint::SendRedPack).as_str(),
            "https://api.mch.weixin.qq.com/mmpaymkttransfers/sendredpack"
        );
        assert_eq!(
            urls.url_for(Endpoint::SendGroupRedPack).as_str(),
            "https://api.mch.weixin.qq.com/mmpaymkttransfers/sendgroupredpack"
        );
    }

    #[test]
    fn test_base_url_is_normalized() {
        let bare = GatewayUrls::try_from("http://127.0.0.1:8080").unwrap();
        let slashed = GatewayUrls::try_from("http://127.0.0.1:8080///").unwrap();
        assert_eq!(bare, slashed);
        assert_eq!(
            bare.url_for(Endpoint::SendRedPack).as_str(),
            "http://127.0.0.1:8080/mmpaymkttransfers/sendredpack"
        );
    }

    #[test]
    fn test_base_url_with_prefix() {
        let urls = GatewayUrls::try_from("https://sandbox.example/sandboxnew").unwrap();
        assert_eq!(
            urls.url_for(Endpoint::SendRedPack).as_str(),
            "https://sandbox.example/sandboxnew/mmpaymkttransfers/sendredpack"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            GatewayUrls::try_from("not a url"),
            Err(GatewayError::UrlParse { .. })
        ));
    }
}
