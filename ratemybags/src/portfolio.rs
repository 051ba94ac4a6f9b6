//! Portfolio lookups.
//!
//! Only the image endpoints call into this module. A failing or missing source
//! is never fatal: [`PortfolioService::portfolio_or_demo`] falls back to a fixed
//! demonstration portfolio.

use crate::config::PortfolioConfig;
use async_trait::async_trait;
use framekit_core::Synapse;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenHolding {
    pub symbol: String,
    pub name: String,
    pub balance: f64,
    #[serde(default)]
    pub balance_usd: f64,
    #[serde(default, alias = "logo")]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub tokens: Vec<TokenHolding>,
}

impl Portfolio {
    pub fn total_usd(&self) -> f64 {
        self.tokens.iter().map(|t| t.balance_usd).sum()
    }
}

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("portfolio source unavailable: {0}")]
    Unavailable(String),

    #[error("portfolio request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid portfolio API url '{0}'")]
    InvalidBaseUrl(String),
}

type PortfolioSource =
    Arc<dyn Synapse<Input = String, Output = Portfolio, Error = PortfolioError>>;

fn holding(symbol: &str, name: &str, balance: f64, balance_usd: f64, logo: &str) -> TokenHolding {
    TokenHolding {
        symbol: symbol.to_string(),
        name: name.to_string(),
        balance,
        balance_usd,
        logo_url: Some(logo.to_string()),
    }
}

/// Fixed dataset shown when no real portfolio can be loaded.
pub fn demo_portfolio() -> Portfolio {
    Portfolio {
        tokens: vec![
            holding("ETH", "Ethereum", 1.5, 4_875.0, "https://assets.coingecko.com/coins/images/279/small/ethereum.png"),
            holding("USDC", "USD Coin", 2_500.0, 2_500.0, "https://assets.coingecko.com/coins/images/6319/small/usdc.png"),
            holding("UNI", "Uniswap", 120.0, 1_104.0, "https://assets.coingecko.com/coins/images/12504/small/uni.jpg"),
            holding("LINK", "Chainlink", 85.0, 1_530.0, "https://assets.coingecko.com/coins/images/877/small/chainlink.png"),
            holding("ARB", "Arbitrum", 900.0, 720.0, "https://assets.coingecko.com/coins/images/16547/small/arb.jpg"),
        ],
    }
}

/// Always answers with [`demo_portfolio`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoPortfolio;

#[async_trait]
impl Synapse for DemoPortfolio {
    type Input = String;
    type Output = Portfolio;
    type Error = PortfolioError;

    async fn call(&self, _address: String) -> Result<Portfolio, PortfolioError> {
        Ok(demo_portfolio())
    }
}

/// Fetches `GET {base_url}/portfolio/{address}` from a portfolio API.
///
/// The address is always sent as one escaped path segment.
#[derive(Debug, Clone)]
pub struct HttpPortfolioSource {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpPortfolioSource {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PortfolioError> {
        let raw = base_url.into();
        let base_url = Url::parse(&raw)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or(PortfolioError::InvalidBaseUrl(raw))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn portfolio_url(&self, address: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("portfolio").push(address);
        }
        url
    }
}

#[async_trait]
impl Synapse for HttpPortfolioSource {
    type Input = String;
    type Output = Portfolio;
    type Error = PortfolioError;

    async fn call(&self, address: String) -> Result<Portfolio, PortfolioError> {
        let url = self.portfolio_url(&address);
        let mut request = self.client.get(url.clone());
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PortfolioError::Unavailable(format!("{url} answered {status}")));
        }
        Ok(response.json::<Portfolio>().await?)
    }
}

/// The portfolio collaborator as seen by the HTTP handlers.
#[derive(Clone)]
pub struct PortfolioService {
    source: PortfolioSource,
}

impl PortfolioService {
    pub fn new(source: impl Synapse<Input = String, Output = Portfolio, Error = PortfolioError> + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Every lookup yields the demo portfolio.
    pub fn demo_only() -> Self {
        Self::new(DemoPortfolio)
    }

    pub fn from_config(config: &PortfolioConfig) -> Result<Self, PortfolioError> {
        match &config.api_url {
            Some(url) => {
                let source = HttpPortfolioSource::new(
                    url.clone(),
                    config.api_key.clone(),
                    Duration::from_millis(config.timeout_ms),
                )?;
                Ok(Self::new(source))
            }
            None => Ok(Self::demo_only()),
        }
    }

    pub async fn fetch(&self, address: &str) -> Result<Portfolio, PortfolioError> {
        self.source.call(address.to_string()).await
    }

    pub async fn portfolio_or_demo(&self, address: &str) -> Portfolio {
        match self.fetch(address).await {
            Ok(portfolio) => {
                debug!(address = %address, tokens = portfolio.tokens.len(), "Portfolio loaded");
                portfolio
            }
            Err(e) => {
                warn!(address = %address, error = %e, "Portfolio lookup failed, using demo portfolio");
                demo_portfolio()
            }
        }
    }
}

impl std::fmt::Debug for PortfolioService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioService").finish_non_exhaustive()
    }
}
