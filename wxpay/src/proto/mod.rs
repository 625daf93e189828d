//! Wire format types for the red-envelope API.
//!
//! Requests and responses are flat XML documents rooted at `<xml>`, one child
//! element per field. Field names below are the exact wire names.

pub mod xml;

use serde::{Deserialize, Serialize};

use crate::sign::CanonicalParams;

/// Value of `return_code` / `result_code` that denotes success.
pub const SUCCESS: &str = "SUCCESS";

/// A fully populated, signed red-envelope request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedPackRequest {
    /// Campaign name.
    pub act_name: String,
    /// Amount split mode, present only on group calls (`ALL_RAND`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amt_type: Option<String>,
    /// IP address of the calling machine.
    pub client_ip: String,
    /// Merchant id authorizing the funds, when different from `mch_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consume_mch_id: Option<String>,
    /// Merchant-unique order number.
    pub mch_billno: String,
    /// Merchant id.
    pub mch_id: String,
    /// Per-request random string.
    pub nonce_str: String,
    /// Recipient openid under `wxappid`.
    pub re_openid: String,
    /// Remark text.
    pub remark: String,
    /// URL-encoded risk-control information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_info: Option<String>,
    /// Usage scene identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<String>,
    /// Sender display name.
    pub send_name: String,
    /// MD5 signature over all other fields.
    pub sign: String,
    /// Total amount in cents.
    pub total_amount: u64,
    /// Number of recipients.
    pub total_num: u32,
    /// Blessing text.
    pub wishing: String,
    /// App id.
    pub wxappid: String,
}

impl RedPackRequest {
    /// Lists every signed field by wire name. `sign` is never included.
    #[must_use]
    pub fn canonical_params(&self) -> CanonicalParams<'_> {
        let mut params = CanonicalParams::new();
        params
            .insert("act_name", &self.act_name)
            .insert_opt("amt_type", self.amt_type.as_deref())
            .insert("client_ip", &self.client_ip)
            .insert_opt("consume_mch_id", self.consume_mch_id.as_deref())
            .insert("mch_billno", &self.mch_billno)
            .insert("mch_id", &self.mch_id)
            .insert("nonce_str", &self.nonce_str)
            .insert("re_openid", &self.re_openid)
            .insert("remark", &self.remark)
            .insert_opt("risk_info", self.risk_info.as_deref())
            .insert_opt("scene_id", self.scene_id.as_deref())
            .insert("send_name", &self.send_name)
            .insert("total_amount", self.total_amount)
            .insert("total_num", self.total_num)
            .insert("wishing", &self.wishing)
            .insert("wxappid", &self.wxappid);
        params
    }
}

/// Response document returned by the send endpoints.
///
/// `return_code` reports whether the gateway accepted the request at all;
/// `result_code` is only meaningful when it did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RedPackResponse {
    /// Transport-level status. An absent element reads as empty, which is
    /// not [`SUCCESS`].
    #[serde(default)]
    pub return_code: String,
    /// Diagnostic accompanying `return_code`.
    #[serde(default)]
    pub return_msg: Option<String>,
    /// Business-level status.
    #[serde(default)]
    pub result_code: Option<String>,
    /// Business error code.
    #[serde(default)]
    pub err_code: Option<String>,
    /// Business error description.
    #[serde(default)]
    pub err_code_des: Option<String>,
    /// Merchant id echoed back.
    #[serde(default)]
    pub mch_id: Option<String>,
    /// App id echoed back.
    #[serde(default)]
    pub wxappid: Option<String>,
    /// Recipient openid echoed back.
    #[serde(default)]
    pub re_openid: Option<String>,
    /// Amount in cents echoed back, as sent on the wire. The gateway may
    /// echo an empty element, so this is only parsed on success.
    #[serde(default)]
    pub total_amount: Option<String>,
    /// Merchant order number echoed back.
    #[serde(default)]
    pub mch_billno: Option<String>,
    /// Send time, `yyyyMMddHHmmss`.
    #[serde(default)]
    pub send_time: Option<String>,
    /// Gateway-side order id for the disbursement.
    #[serde(default)]
    pub send_listid: Option<String>,
}

impl RedPackResponse {
    /// Returns `true` if the gateway accepted the request.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.return_code == SUCCESS
    }

    /// Returns `true` if the disbursement was executed.
    #[must_use]
    pub fn is_executed(&self) -> bool {
        self.is_accepted() && self.result_code.as_deref() == Some(SUCCESS)
    }

    /// Echoed amount in cents, if present and numeric.
    #[must_use]
    pub fn total_amount(&self) -> Option<u64> {
        self.total_amount
            .as_deref()
            .and_then(|amount| amount.trim().parse().ok())
    }
}
