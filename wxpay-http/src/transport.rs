//! Mutual-TLS [`Transport`] implementation backed by `reqwest`.
//!
//! ## Error Handling
//!
//! Failures are classified so callers can decide what is safe to do next:
//!
//! - certificate problems and connection failures mean the gateway never saw
//!   the request,
//! - timeouts and failures while reading the response are indeterminate: the
//!   disbursement may have been executed and must be reconciled by order number.
//!
//! Nothing is retried.

use std::path::Path;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use wxpay::TransportError;
use wxpay::transport::{BoxFuture, Transport, TransportRequest};

#[cfg(feature = "telemetry")]
use tracing::{Instrument, Span};

use crate::constants::CONTENT_TYPE_XML;
use crate::gateway::GatewayUrls;
use crate::identity::ClientRegistry;

/// Posts XML bodies to the merchant gateway using per-merchant client
/// certificates.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use wxpay_http::MutualTlsTransport;
///
/// let transport = MutualTlsTransport::new().with_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug)]
pub struct MutualTlsTransport {
    gateway: GatewayUrls,
    timeout: Option<Duration>,
    registry: ClientRegistry,
}

impl Default for MutualTlsTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MutualTlsTransport {
    /// Creates a transport for the production gateway with no timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gateway: GatewayUrls::default(),
            timeout: None,
            registry: ClientRegistry::new(None),
        }
    }

    /// Targets a different gateway, e.g. a sandbox or a mock server.
    #[must_use]
    pub fn with_gateway(mut self, gateway: GatewayUrls) -> Self {
        self.gateway = gateway;
        self
    }

    /// Sets a timeout for all future requests.
    ///
    /// Clients already loaded, including those from [`Self::preload`], are
    /// discarded and rebuilt on next use. Call this before `preload`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self.registry = ClientRegistry::new(Some(timeout));
        self
    }

    /// Loads the client certificate for `mch_id` ahead of the first call.
    ///
    /// # Errors
    ///
    /// Returns a certificate [`TransportError`] if the identity cannot be loaded.
    pub fn preload(&self, mch_id: &str, cert_path: &Path) -> Result<(), TransportError> {
        self.registry.preload(mch_id, cert_path)
    }

    /// Returns the gateway URLs.
    #[must_use]
    pub const fn gateway(&self) -> &GatewayUrls {
        &self.gateway
    }

    /// Returns the configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn post(&self, request: TransportRequest<'_>) -> Result<Vec<u8>, TransportError> {
        let url = self.gateway.url_for(request.endpoint).clone();
        let client = self.registry.client_for(request.mch_id, request.cert_path)?;

        let response = client
            .post(url)
            .header(CONTENT_TYPE, CONTENT_TYPE_XML)
            .body(request.body)
            .send()
            .await
            .map_err(|e| send_error(request.endpoint.path(), e))?;

        let status = response.status();
        #[cfg(feature = "telemetry")]
        tracing::debug!(%status, "Gateway responded");

        let body = response.bytes().await.map_err(|e| {
            TransportError::indeterminate(format!(
                "failed to read {} response body (HTTP {status})",
                request.endpoint
            ))
            .with_source(e)
        })?;
        Ok(body.to_vec())
    }
}

impl Transport for MutualTlsTransport {
    fn post_xml<'a>(
        &'a self,
        request: TransportRequest<'a>,
    ) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
        #[cfg(feature = "telemetry")]
        let span = tracing::info_span!(
            "wxpay.http.post",
            endpoint = %request.endpoint,
            mch_id = request.mch_id,
            timeout = ?self.timeout,
            otel.status_code = tracing::field::Empty,
            error.message = tracing::field::Empty,
        );

        let fut = async move {
            let result = self.post(request).await;
            record_result_on_span(&result);
            result
        };
        #[cfg(feature = "telemetry")]
        let fut = fut.instrument(span);

        Box::pin(fut)
    }
}

/// Maps a `send()` failure onto the transport error taxonomy.
fn send_error(context: &str, err: reqwest::Error) -> TransportError {
    if err.is_connect() {
        TransportError::connect(format!("failed to connect for {context}")).with_source(err)
    } else if err.is_builder() {
        TransportError::connect(format!("failed to build request for {context}")).with_source(err)
    } else if err.is_timeout() {
        TransportError::indeterminate(format!("{context} timed out, outcome unknown"))
            .with_source(err)
    } else {
        TransportError::indeterminate(format!("{context} failed, outcome unknown"))
            .with_source(err)
    }
}

/// Records the outcome of a request on the current span, including status and errors.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R>(result: &Result<R, TransportError>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(
                tracing::Level::ERROR,
                error = %err,
                indeterminate = err.is_indeterminate(),
                "Request to gateway failed"
            );
        }
    }
}

/// Records the outcome of a request on the current span.
/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<R>(_result: &Result<R, TransportError>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use wxpay::TransportErrorKind;
    use wxpay::transport::Endpoint;

    fn fixture() -> PathBuf {
        PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/apiclient.pem"
        ))
    }

    fn transport_for(server: &MockServer) -> MutualTlsTransport {
        MutualTlsTransport::new().with_gateway(GatewayUrls::try_from(server.uri()).unwrap())
    }

    fn request<'a>(endpoint: Endpoint, cert_path: &'a Path) -> TransportRequest<'a> {
        TransportRequest {
            endpoint,
            body: "<xml><mch_billno>1234</mch_billno></xml>".to_owned(),
            mch_id: "10000100",
            cert_path,
        }
    }

    #[tokio::test]
    async fn test_posts_xml_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mmpaymkttransfers/sendredpack"))
            .and(header("content-type", CONTENT_TYPE_XML))
            .and(body_string_contains("<mch_billno>1234</mch_billno>"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<xml>ok</xml>"))
            .expect(1)
            .mount(&server)
            .await;

        let cert = fixture();
        let body = transport_for(&server)
            .post_xml(request(Endpoint::SendRedPack, &cert))
            .await
            .unwrap();
        assert_eq!(body, b"<xml>ok</xml>");
    }

    #[tokio::test]
    async fn test_group_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mmpaymkttransfers/sendgroupredpack"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<xml/>"))
            .expect(1)
            .mount(&server)
            .await;

        let cert = fixture();
        transport_for(&server)
            .post_xml(request(Endpoint::SendGroupRedPack, &cert))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_returns_body_regardless_of_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500).set_body_string("<xml><return_code>FAIL</return_code></xml>"),
            )
            .mount(&server)
            .await;

        let cert = fixture();
        let body = transport_for(&server)
            .post_xml(request(Endpoint::SendRedPack, &cert))
            .await
            .unwrap();
        assert_eq!(body, b"<xml><return_code>FAIL</return_code></xml>");
    }

    #[tokio::test]
    async fn test_missing_certificate_never_reaches_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let missing = PathBuf::from("/nonexistent/apiclient.pem");
        let err = transport_for(&server)
            .post_xml(request(Endpoint::SendRedPack, &missing))
            .await
            .unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Certificate);
        assert!(!err.is_indeterminate());
    }

    #[test]
    fn test_with_timeout_discards_loaded_clients() {
        let transport = MutualTlsTransport::new();
        transport.preload("10000100", &fixture()).unwrap();
        assert!(transport.registry.contains("10000100"));

        let transport = transport.with_timeout(Duration::from_secs(5));
        assert!(!transport.registry.contains("10000100"));
        assert_eq!(transport.timeout(), Some(Duration::from_secs(5)));

        transport.preload("10000100", &fixture()).unwrap();
        assert!(transport.registry.contains("10000100"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_not_indeterminate() {
        let transport = MutualTlsTransport::new()
            .with_gateway(GatewayUrls::try_from("http://127.0.0.1:1").unwrap());
        let cert = fixture();
        let err = transport
            .post_xml(request(Endpoint::SendRedPack, &cert))
            .await
            .unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Connect);
    }

    #[tokio::test]
    async fn test_timeout_is_indeterminate_and_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .expect(1)
            .mount(&server)
            .await;

        let cert = fixture();
        let err = transport_for(&server)
            .with_timeout(Duration::from_millis(100))
            .post_xml(request(Endpoint::SendRedPack, &cert))
            .await
            .unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Indeterminate);
        assert!(err.is_indeterminate());
    }

    #[tokio::test]
    async fn test_send_red_envelope_through_mock_gateway() {
        use wxpay::config::{MerchantConfig, SecretKey};
        use wxpay::redpack::{RedPackClient, RedPackParams};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mmpaymkttransfers/sendredpack"))
            .and(body_string_contains("<wxappid>wx8888888888888888</wxappid>"))
            .and(body_string_contains("<total_amount>1000</total_amount>"))
            .and(body_string_contains("<sign>"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<xml><return_code><![CDATA[SUCCESS]]></return_code>\
                 <result_code><![CDATA[SUCCESS]]></result_code>\
                 <mch_billno><![CDATA[1234]]></mch_billno>\
                 <total_amount>1000</total_amount>\
                 <send_listid><![CDATA[1000041701201610163000090813093]]></send_listid></xml>",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let config = MerchantConfig {
            app_id: "wx8888888888888888".into(),
            mch_id: "10000100".into(),
            key: SecretKey::new("192006250b4c09247ec02edce69f6a2d"),
            client_ip: "127.0.0.1".into(),
            notify_url: None,
            cert_path: fixture(),
        };
        let client = RedPackClient::new(config, transport_for(&server)).unwrap();
        let receipt = client
            .send(&RedPackParams {
                act_name: "test".into(),
                mch_billno: "1234".into(),
                re_openid: "oxTWIuGaIt6gTKsQRLau2M0yL16E".into(),
                remark: "test".into(),
                send_name: "Test".into(),
                total_amount: 1000,
                total_num: 1,
                wishing: "test".into(),
                ..RedPackParams::default()
            })
            .await
            .unwrap();
        assert_eq!(receipt.mch_billno, "1234");
        assert_eq!(receipt.re_openid, "oxTWIuGaIt6gTKsQRLau2M0yL16E");
        assert_eq!(
            receipt.send_listid.as_deref(),
            Some("1000041701201610163000090813093")
        );
    }
}
