//! Frame descriptor builder.
//!
//! A descriptor is everything the client needs to draw the next frame. Image
//! URLs point at the renderer endpoints; nothing here renders or fetches.

use crate::error::FrameError;
use crate::state::{Reaction, SessionState, Step};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Most buttons a frame may carry.
pub const MAX_BUTTONS: usize = 4;

/// The rating step is allowed past [`MAX_BUTTONS`]: one button per score.
pub const RATING_BUTTONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Button {
    pub label: String,
    /// 1-based action index posted back when pressed
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FrameDescriptor {
    #[serde(skip)]
    pub step: Step,
    pub image_url: String,
    pub buttons: Vec<Button>,
    pub post_url: String,
    /// Encoded session state for the next round-trip
    pub state: String,
}

#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    host: String,
}

impl DescriptorBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            host: host.trim_end_matches('/').to_string(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn post_url(&self) -> String {
        format!("{}/api/frame", self.host)
    }

    pub fn build(&self, state: &SessionState, token: &str) -> Result<FrameDescriptor, FrameError> {
        let image_url = self.image_url(state, token)?;
        let labels = button_labels(state.step);
        let cap = button_cap(state.step);

        let buttons = labels
            .into_iter()
            .take(cap)
            .zip(1u32..)
            .map(|(label, index)| Button { label, index })
            .collect();

        Ok(FrameDescriptor {
            step: state.step,
            image_url,
            buttons,
            post_url: self.post_url(),
            state: token.to_string(),
        })
    }

    fn image_url(&self, state: &SessionState, token: &str) -> Result<String, FrameError> {
        let host = &self.host;
        let url = match state.step {
            Step::Initial => format!("{host}/api/og"),
            Step::ConnectWallet => format!("{host}/images/connect-wallet.png"),
            Step::PortfolioDisplay => {
                let show_usd = if state.shows_usd() { "true" } else { "false" };
                let query = serde_urlencoded::to_string([
                    ("address", state.wallet_address.as_deref().unwrap_or_default()),
                    ("showUsd", show_usd),
                ])?;
                format!("{host}/api/portfolio?{query}")
            }
            Step::CommunityRating => format!("{host}/images/rating.png"),
            Step::EmojiReactions => format!("{host}/images/emoji-reactions.png"),
            Step::ResultsDisplay => {
                let query = serde_urlencoded::to_string([("state", token)])?;
                format!("{host}/api/results?{query}")
            }
            Step::NftMinting => format!("{host}/images/nft-minting.png"),
            Step::ShareResults => {
                let query = serde_urlencoded::to_string([("state", token)])?;
                format!("{host}/api/share?{query}")
            }
        };
        Ok(url)
    }
}

fn button_cap(step: Step) -> usize {
    match step {
        Step::CommunityRating => RATING_BUTTONS,
        _ => MAX_BUTTONS,
    }
}

fn button_labels(step: Step) -> Vec<String> {
    let fixed: &[&str] = match step {
        Step::Initial => &["Connect Wallet"],
        Step::ConnectWallet => &["Connect Ethereum Wallet"],
        Step::PortfolioDisplay => &["Hide USD", "Show USD", "Continue to Rating"],
        Step::ResultsDisplay => &["Mint as NFT (0.001 ETH)", "Share Results"],
        Step::NftMinting => &["Confirm Mint & Share"],
        Step::ShareResults => &["Rate Another Portfolio"],
        Step::CommunityRating => {
            return (1..=RATING_BUTTONS).map(|n| n.to_string()).collect();
        }
        Step::EmojiReactions => {
            return Reaction::ALL.iter().map(|r| r.emoji().to_string()).collect();
        }
    };
    fixed.iter().map(|label| label.to_string()).collect()
}
