use std::time::Duration;

use clap::Parser;
use mediapass::{
    clock::{DurationSecs, System},
    AccessDecision, Authority, AuthorityConfig, SweepConfig, Sweeper, TokenStore,
};
use tokio::time;

#[derive(Debug, Parser)]
struct Opts {
    /// The resource to mint tokens for
    #[arg(short, long, env, default_value = "/videos/intro.mp4")]
    resource: String,

    /// The requester the tokens are bound to
    #[arg(short = 'u', long, env, default_value = "USER_001")]
    requester: String,

    /// Lifetime of each minted token, in seconds
    #[arg(short, long, env = "TOKEN_TTL_SECS", default_value_t = 120)]
    ttl: u64,

    /// Seconds between background sweeps of expired tokens
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value_t = 30)]
    sweep_interval: u64,

    /// Seconds between simulated redemptions
    #[arg(long, env = "REDEEM_INTERVAL_SECS", default_value_t = 5)]
    redeem_interval: u64,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();

    let store = TokenStore::new();
    let config = AuthorityConfig::new(DurationSecs(opts.ttl)).with_sweep_on_mint(false);
    let authority = Authority::with_config(store.clone(), config);

    let sweeper = Sweeper::spawn(
        store,
        System,
        SweepConfig::new(Duration::from_secs(opts.sweep_interval)),
    );

    let minted = authority.mint(&opts.resource, &opts.requester)?;
    tracing::info!(
        token = format_args!("{:#?}", minted.token()),
        expiry = minted.expiry().0,
        "minted access token"
    );

    let mut interval = time::interval(Duration::from_secs(opts.redeem_interval.max(1)));
    loop {
        interval.tick().await;

        let decision = authority.redeem(minted.token().as_str(), &opts.resource, &opts.requester);
        let stats = authority.stats();
        match decision {
            AccessDecision::Granted { remaining } => {
                tracing::info!(
                    remaining = remaining.0,
                    total_issued = stats.total_issued,
                    active = stats.active,
                    "redeemed token"
                )
            }
            AccessDecision::Rejected(reason) => {
                tracing::warn!(
                    %reason,
                    total_issued = stats.total_issued,
                    active = stats.active,
                    "token no longer redeemable"
                );
                break;
            }
        }
    }

    sweeper.shutdown().await;
    Ok(())
}
