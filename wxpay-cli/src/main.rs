//! `wxpay` command-line tool.
//!
//! # Usage
//!
//! ```bash
//! # Send a single red envelope using ./wxpay.toml
//! wxpay send --bill-no 10000100201610160000000001 --openid oxTWIuGaIt6gTKsQRLau2M0yL16E \
//!     --amount 100 --act-name launch --send-name Shop --wishing enjoy --remark thanks
//!
//! # Send a group red envelope with a custom config path
//! WXPAY_CONFIG=/etc/wxpay/prod.toml wxpay send-group --num 5 ...
//!
//! # Configure logging level
//! RUST_LOG=debug wxpay send ...
//! ```
//!
//! # Environment Variables
//!
//! - `WXPAY_CONFIG`: Path to TOML configuration file (default: `wxpay.toml`)
//! - `RUST_LOG`: Log level filter, overrides `[log] filter`
//!
//! A `.env` file in the working directory is loaded first.

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use wxpay::{RedPackClient, RedPackParams};
use wxpay_http::{GatewayUrls, MutualTlsTransport};

use wxpay_cli::cli::Cli;
use wxpay_cli::config::{AppConfig, LogConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let loaded = AppConfig::load_from(&cli.config);
    let log = loaded
        .as_ref()
        .map_or_else(|_| LogConfig::default(), |config| config.log.clone());
    init_tracing(&log);

    let result = match loaded {
        Ok(config) => run(&cli, config).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::error!("wxpay failed: {e}");
        std::process::exit(1);
    }
}

/// Installs the global subscriber from explicit log settings.
fn init_tracing(log: &LogConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter)),
        )
        .init();
}

async fn run(cli: &Cli, config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        mch_id = %config.merchant.mch_id,
        app_id = %config.merchant.app_id,
        gateway = %config.gateway.url,
        "Loaded configuration"
    );

    let gateway = GatewayUrls::try_from(config.gateway.url.as_str())?;
    let mut transport = MutualTlsTransport::new().with_gateway(gateway);
    if let Some(secs) = config.gateway.timeout_secs {
        transport = transport.with_timeout(Duration::from_secs(secs));
    }

    let client = RedPackClient::new(config.merchant, transport)?;
    client
        .transport()
        .preload(&client.config().mch_id, &client.config().cert_path)?;

    let (kind, args) = cli.command.split();
    let params = RedPackParams::from(args);
    match client.dispatch(kind, &params).await {
        Ok(receipt) => {
            tracing::info!(
                mch_billno = %receipt.mch_billno,
                re_openid = %receipt.re_openid,
                total_amount = receipt.total_amount,
                send_time = ?receipt.send_time,
                send_listid = ?receipt.send_listid,
                "Red envelope sent"
            );
            Ok(())
        }
        Err(err) if err.is_indeterminate() => {
            tracing::error!(
                mch_billno = %params.mch_billno,
                "Outcome unknown: reconcile this order number before sending again"
            );
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}
