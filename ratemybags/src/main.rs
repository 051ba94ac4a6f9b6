use anyhow::Context;
use ratemybags::config::AppConfig;
use ratemybags::logging::init_tracing;
use ratemybags::server::{self, AppResources};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(config.log_format).context("installing tracing subscriber")?;

    let addr = config.socket_addr()?;
    tracing::info!(
        %addr,
        public_host = %config.public_host,
        portfolio_api = config.portfolio.api_url.is_some(),
        "Starting RateMyBags frame server"
    );

    let resources = AppResources::from_config(config).context("building portfolio client")?;
    server::routes()
        .bind(addr.to_string())
        .run(resources)
        .await?;

    Ok(())
}
