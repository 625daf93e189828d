//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use wxpay::{RedPackKind, RedPackParams};

use crate::config::DEFAULT_CONFIG_PATH;

/// Send WeChat Pay red envelopes.
#[derive(Debug, Parser)]
#[command(name = "wxpay", version, about)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "WXPAY_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// What to send.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a red envelope to one recipient.
    Send(RedPackArgs),
    /// Send a group red envelope split at random among `--num` recipients.
    SendGroup(RedPackArgs),
}

impl Command {
    /// Returns the red-envelope kind and its arguments.
    #[must_use]
    pub const fn split(&self) -> (RedPackKind, &RedPackArgs) {
        match self {
            Self::Send(args) => (RedPackKind::Normal, args),
            Self::SendGroup(args) => (RedPackKind::Group, args),
        }
    }
}

/// Disbursement arguments shared by both subcommands.
#[derive(Debug, Clone, Args)]
pub struct RedPackArgs {
    /// Merchant-unique order number.
    #[arg(long)]
    pub bill_no: String,

    /// Recipient openid.
    #[arg(long)]
    pub openid: String,

    /// Total amount in cents.
    #[arg(long)]
    pub amount: u64,

    /// Number of recipients.
    #[arg(long, default_value_t = 1)]
    pub num: u32,

    /// Campaign name.
    #[arg(long)]
    pub act_name: String,

    /// Sender display name.
    #[arg(long)]
    pub send_name: String,

    /// Blessing text.
    #[arg(long)]
    pub wishing: String,

    /// Remark text.
    #[arg(long)]
    pub remark: String,

    /// Usage scene, e.g. `PRODUCT_1`.
    #[arg(long)]
    pub scene_id: Option<String>,

    /// Risk-control information.
    #[arg(long)]
    pub risk_info: Option<String>,

    /// Merchant id authorizing the funds.
    #[arg(long)]
    pub consume_mch_id: Option<String>,
}

impl From<&RedPackArgs> for RedPackParams {
    fn from(args: &RedPackArgs) -> Self {
        Self {
            act_name: args.act_name.clone(),
            mch_billno: args.bill_no.clone(),
            re_openid: args.openid.clone(),
            remark: args.remark.clone(),
            send_name: args.send_name.clone(),
            total_amount: args.amount,
            total_num: args.num,
            wishing: args.wishing.clone(),
            scene_id: args.scene_id.clone(),
            risk_info: args.risk_info.clone(),
            consume_mch_id: args.consume_mch_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const ARGS: [&str; 16] = [
        "--bill-no",
        "1234",
        "--openid",
        "oxTWIuGaIt6gTKsQRLau2M0yL16E",
        "--amount",
        "1000",
        "--act-name",
        "test",
        "--send-name",
        "Test",
        "--wishing",
        "test",
        "--remark",
        "test",
        "--scene-id",
        "PRODUCT_1",
    ];

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_send_maps_to_params() {
        let cli = Cli::try_parse_from(
            ["wxpay", "--config", "custom.toml", "send"]
                .into_iter()
                .chain(ARGS),
        )
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("custom.toml"));

        let (kind, args) = cli.command.split();
        assert_eq!(kind, RedPackKind::Normal);
        let params = RedPackParams::from(args);
        assert_eq!(params.mch_billno, "1234");
        assert_eq!(params.total_amount, 1000);
        assert_eq!(params.total_num, 1);
        assert_eq!(params.scene_id.as_deref(), Some("PRODUCT_1"));
        assert_eq!(params.risk_info, None);
        assert!(params.validate(kind).is_ok());
    }

    #[test]
    fn test_send_group_kind() {
        let cli = Cli::try_parse_from(
            ["wxpay", "send-group", "--num", "5"].into_iter().chain(ARGS),
        )
        .unwrap();
        let (kind, args) = cli.command.split();
        assert_eq!(kind, RedPackKind::Group);
        assert_eq!(args.num, 5);
    }

    #[test]
    fn test_amount_is_required() {
        let without_amount: Vec<&str> = ["wxpay", "send"]
            .into_iter()
            .chain(ARGS.into_iter().filter(|a| *a != "--amount" && *a != "1000"))
            .collect();
        assert!(Cli::try_parse_from(without_amount).is_err());
    }
}
