//! Red-envelope disbursement.
//!
//! A call flows through four steps, each usable on its own:
//!
//! 1. [`RedPackParams::validate`] rejects incomplete input before anything is signed,
//! 2. [`SignedRedPack::build`] assigns a fresh nonce and signs the request record,
//! 3. a [`Transport`] posts the XML body over mutual TLS,
//! 4. [`interpret_response`] classifies the reply.
//!
//! [`RedPackClient`] runs the whole sequence. It holds no mutable state, so a
//! single client may serve any number of overlapping calls.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::config::MerchantConfig;
use crate::error::{BusinessError, ProtocolRejection, RedPackError, ValidationError};
use crate::nonce::{NonceSource, RandomNonce};
use crate::proto::{RedPackRequest, RedPackResponse, xml};
use crate::transport::{Endpoint, Transport, TransportRequest};

/// `amt_type` sent with group red envelopes: the total is split at random.
pub const AMT_TYPE_ALL_RAND: &str = "ALL_RAND";

/// Smallest `total_num` accepted for a group red envelope.
pub const GROUP_MIN_RECIPIENTS: u32 = 3;

/// Which send endpoint a disbursement targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedPackKind {
    /// One recipient receives the whole amount.
    #[default]
    Normal,
    /// The amount is split at random among `total_num` recipients.
    Group,
}

impl RedPackKind {
    /// Gateway endpoint for this kind.
    #[must_use]
    pub const fn endpoint(self) -> Endpoint {
        match self {
            Self::Normal => Endpoint::SendRedPack,
            Self::Group => Endpoint::SendGroupRedPack,
        }
    }
}

/// Caller-supplied fields of one disbursement.
///
/// Merchant id, app id, client IP, nonce and signature are filled in from the
/// [`MerchantConfig`] when the request is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedPackParams {
    /// Campaign name.
    pub act_name: String,
    /// Merchant-unique order number. Reusing it is how a caller discovers
    /// whether an earlier attempt was already processed.
    pub mch_billno: String,
    /// Recipient openid.
    pub re_openid: String,
    /// Remark text.
    pub remark: String,
    /// Sender display name.
    pub send_name: String,
    /// Total amount in cents.
    pub total_amount: u64,
    /// Number of recipients.
    pub total_num: u32,
    /// Blessing text.
    pub wishing: String,
    /// Usage scene, e.g. `PRODUCT_1`.
    pub scene_id: Option<String>,
    /// Risk-control information.
    pub risk_info: Option<String>,
    /// Merchant id authorizing the funds.
    pub consume_mch_id: Option<String>,
}

impl RedPackParams {
    /// Checks mandatory fields in wire-name order.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first offending field.
    pub fn validate(&self, kind: RedPackKind) -> Result<(), ValidationError> {
        require("act_name", &self.act_name)?;
        require("mch_billno", &self.mch_billno)?;
        require("re_openid", &self.re_openid)?;
        require("remark", &self.remark)?;
        require("send_name", &self.send_name)?;
        if self.total_amount == 0 {
            return Err(ValidationError::new(
                "total_amount",
                "must be a positive number of cents",
            ));
        }
        if self.total_num == 0 {
            return Err(ValidationError::new("total_num", "must be positive"));
        }
        if kind == RedPackKind::Normal && self.total_num != 1 {
            return Err(ValidationError::new(
                "total_num",
                "must be 1 for a single-recipient red envelope",
            ));
        }
        if kind == RedPackKind::Group && self.total_num < GROUP_MIN_RECIPIENTS {
            return Err(ValidationError::new(
                "total_num",
                format!("group red envelopes need at least {GROUP_MIN_RECIPIENTS} recipients"),
            ));
        }
        require("wishing", &self.wishing)?;
        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::missing(field))
    } else {
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_owned)
}

/// A signed request record, built fresh for exactly one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRedPack {
    /// Endpoint the record is destined for.
    pub kind: RedPackKind,
    /// The request record, `sign` included.
    pub request: RedPackRequest,
    /// Canonical string that was signed, key suffix excluded.
    pub signed_params: String,
}

impl SignedRedPack {
    /// Validates the input, populates the request record and signs it.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the configuration or parameters are
    /// incomplete, or `nonce_str` is empty.
    pub fn build(
        kind: RedPackKind,
        params: &RedPackParams,
        config: &MerchantConfig,
        nonce_str: String,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        params.validate(kind)?;
        if nonce_str.is_empty() {
            return Err(ValidationError::missing("nonce_str"));
        }

        let ctx = config.signing_context();
        let mut request = RedPackRequest {
            act_name: params.act_name.clone(),
            amt_type: (kind == RedPackKind::Group).then(|| AMT_TYPE_ALL_RAND.to_owned()),
            client_ip: config.client_ip.clone(),
            consume_mch_id: non_empty(params.consume_mch_id.as_deref()),
            mch_billno: params.mch_billno.clone(),
            mch_id: ctx.mch_id.to_owned(),
            nonce_str,
            re_openid: params.re_openid.clone(),
            remark: params.remark.clone(),
            risk_info: non_empty(params.risk_info.as_deref()),
            scene_id: non_empty(params.scene_id.as_deref()),
            send_name: params.send_name.clone(),
            sign: String::new(),
            total_amount: params.total_amount,
            total_num: params.total_num,
            wishing: params.wishing.clone(),
            wxappid: ctx.app_id.to_owned(),
        };
        let signed = request.canonical_params().sign(ctx.key);
        request.sign = signed.sign;

        Ok(Self {
            kind,
            request,
            signed_params: signed.signed_params,
        })
    }

    /// Serializes the record to its wire XML.
    ///
    /// # Errors
    ///
    /// Returns [`quick_xml::SeError`] if serialization fails.
    pub fn to_xml(&self) -> Result<String, quick_xml::SeError> {
        xml::encode(&self.request)
    }
}

/// Confirmation of an executed disbursement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedPackReceipt {
    /// Merchant order number.
    pub mch_billno: String,
    /// Recipient openid.
    pub re_openid: String,
    /// Amount sent, in cents.
    pub total_amount: u64,
    /// Send time reported by the gateway.
    pub send_time: Option<String>,
    /// Gateway-side order id.
    pub send_listid: Option<String>,
}

/// Classifies a raw gateway reply to `signed`.
///
/// | `return_code` | `result_code` | outcome                         |
/// |---------------|---------------|---------------------------------|
/// | `SUCCESS`     | `SUCCESS`     | [`RedPackReceipt`]              |
/// | `SUCCESS`     | other         | [`RedPackError::Business`]      |
/// | other         | any           | [`RedPackError::Rejected`]      |
///
/// A body that is not a well-formed response yields [`RedPackError::Parse`].
///
/// # Errors
///
/// See the table above.
pub fn interpret_response(
    raw: &[u8],
    signed: &SignedRedPack,
) -> Result<RedPackReceipt, RedPackError> {
    let response: RedPackResponse = match xml::decode(raw) {
        Ok(response) => response,
        Err(err) => {
            #[cfg(feature = "telemetry")]
            tracing::error!(raw_body = %err.raw_body, error = %err.source, "Malformed gateway response");
            return Err(err.into());
        }
    };

    if !response.is_accepted() {
        let rejection = ProtocolRejection {
            return_code: response.return_code,
            return_msg: response.return_msg,
            raw_body: String::from_utf8_lossy(raw).into_owned(),
            signed_params: signed.signed_params.clone(),
            sign: signed.request.sign.clone(),
        };
        #[cfg(feature = "telemetry")]
        tracing::warn!(
            return_code = %rejection.return_code,
            return_msg = ?rejection.return_msg,
            raw_body = %rejection.raw_body,
            params = %rejection.signed_params,
            sign = %rejection.sign,
            "Gateway rejected request"
        );
        return Err(rejection.into());
    }

    if !response.is_executed() {
        let err = BusinessError {
            result_code: response.result_code,
            err_code: response.err_code,
            err_code_des: response.err_code_des,
            mch_billno: response.mch_billno,
        };
        #[cfg(feature = "telemetry")]
        tracing::warn!(err_code = ?err.err_code, err_code_des = ?err.err_code_des, "Red envelope not sent");
        return Err(err.into());
    }

    let request = &signed.request;
    let total_amount = response.total_amount().unwrap_or(request.total_amount);
    Ok(RedPackReceipt {
        mch_billno: non_empty(response.mch_billno.as_deref())
            .unwrap_or_else(|| request.mch_billno.clone()),
        re_openid: non_empty(response.re_openid.as_deref())
            .unwrap_or_else(|| request.re_openid.clone()),
        total_amount,
        send_time: non_empty(response.send_time.as_deref()),
        send_listid: non_empty(response.send_listid.as_deref()),
    })
}

/// Sends red envelopes for one merchant.
///
/// # Example
///
/// ```no_run
/// # async fn run(transport: impl wxpay::transport::Transport) -> Result<(), Box<dyn std::error::Error>> {
/// use wxpay::config::{MerchantConfig, SecretKey};
/// use wxpay::redpack::{RedPackClient, RedPackParams};
///
/// let config = MerchantConfig {
///     app_id: "wx8888888888888888".into(),
///     mch_id: "10000100".into(),
///     key: SecretKey::new("192006250b4c09247ec02edce69f6a2d"),
///     client_ip: "127.0.0.1".into(),
///     notify_url: None,
///     cert_path: "/etc/wxpay/apiclient.pem".into(),
/// };
/// let client = RedPackClient::new(config, transport)?;
/// let receipt = client
///     .send(&RedPackParams {
///         act_name: "launch".into(),
///         mch_billno: "10000100201610160000000001".into(),
///         re_openid: "oxTWIuGaIt6gTKsQRLau2M0yL16E".into(),
///         remark: "thanks".into(),
///         send_name: "Shop".into(),
///         total_amount: 100,
///         total_num: 1,
///         wishing: "enjoy".into(),
///         ..RedPackParams::default()
///     })
///     .await?;
/// # let _ = receipt;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedPackClient<T> {
    config: Arc<MerchantConfig>,
    transport: T,
    nonces: Arc<dyn NonceSource>,
}

impl<T> fmt::Debug for RedPackClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedPackClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> RedPackClient<T> {
    /// Creates a client bound to one merchant configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if a mandatory credential is empty.
    pub fn new(
        config: impl Into<Arc<MerchantConfig>>,
        transport: T,
    ) -> Result<Self, ValidationError> {
        let config = config.into();
        config.validate()?;
        Ok(Self {
            config,
            transport,
            nonces: Arc::new(RandomNonce),
        })
    }

    /// Replaces the nonce generator.
    #[must_use]
    pub fn with_nonce_source(mut self, source: impl NonceSource + 'static) -> Self {
        self.nonces = Arc::new(source);
        self
    }

    /// Returns the merchant configuration.
    #[must_use]
    pub fn config(&self) -> &MerchantConfig {
        &self.config
    }

    /// Returns the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a single-recipient red envelope.
    ///
    /// # Errors
    ///
    /// Returns [`RedPackError`] on validation, transport, protocol, business
    /// or parse failure. Nothing is retried.
    pub async fn send(&self, params: &RedPackParams) -> Result<RedPackReceipt, RedPackError> {
        self.dispatch(RedPackKind::Normal, params).await
    }

    /// Sends a group red envelope split among `total_num` recipients.
    ///
    /// # Errors
    ///
    /// Same as [`Self::send`].
    pub async fn send_group(
        &self,
        params: &RedPackParams,
    ) -> Result<RedPackReceipt, RedPackError> {
        self.dispatch(RedPackKind::Group, params).await
    }

    /// Builds, signs, posts and interprets one disbursement of `kind`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::send`].
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "wxpay.redpack.send",
            skip_all,
            fields(kind = ?kind, mch_billno = %params.mch_billno),
            err
        )
    )]
    pub async fn dispatch(
        &self,
        kind: RedPackKind,
        params: &RedPackParams,
    ) -> Result<RedPackReceipt, RedPackError> {
        let signed = SignedRedPack::build(kind, params, &self.config, self.nonces.nonce())?;
        #[cfg(feature = "telemetry")]
        tracing::debug!(
            nonce_str = %signed.request.nonce_str,
            sign = %signed.request.sign,
            "Signed red envelope request"
        );

        let body = signed.to_xml()?;
        let raw = self
            .transport
            .post_xml(TransportRequest {
                endpoint: kind.endpoint(),
                body,
                mch_id: &self.config.mch_id,
                cert_path: &self.config.cert_path,
            })
            .await?;

        let receipt = interpret_response(&raw, &signed)?;
        #[cfg(feature = "telemetry")]
        tracing::info!(send_listid = ?receipt.send_listid, "Red envelope sent");
        Ok(receipt)
    }
}
