//! The session state carried inside the state token.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest and highest accepted community rating.
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// Named stage of the interaction graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    #[default]
    Initial,
    ConnectWallet,
    PortfolioDisplay,
    CommunityRating,
    EmojiReactions,
    ResultsDisplay,
    NftMinting,
    ShareResults,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::Initial,
        Step::ConnectWallet,
        Step::PortfolioDisplay,
        Step::CommunityRating,
        Step::EmojiReactions,
        Step::ResultsDisplay,
        Step::NftMinting,
        Step::ShareResults,
    ];

    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Initial => "initial",
            Step::ConnectWallet => "connectWallet",
            Step::PortfolioDisplay => "portfolioDisplay",
            Step::CommunityRating => "communityRating",
            Step::EmojiReactions => "emojiReactions",
            Step::ResultsDisplay => "resultsDisplay",
            Step::NftMinting => "nftMinting",
            Step::ShareResults => "shareResults",
        }
    }

    pub fn parse(name: &str) -> Option<Step> {
        Step::ALL.into_iter().find(|step| step.as_str() == name)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the four reactions offered after rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Fire,
    Diamond,
    Rocket,
    ThumbsUp,
}

impl Reaction {
    pub const ALL: [Reaction; 4] = [
        Reaction::Fire,
        Reaction::Diamond,
        Reaction::Rocket,
        Reaction::ThumbsUp,
    ];

    /// Maps a 1-based button index to a reaction.
    pub fn from_action(action: u32) -> Option<Reaction> {
        let index = usize::try_from(action).ok()?.checked_sub(1)?;
        Reaction::ALL.get(index).copied()
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Reaction::Fire => "🔥",
            Reaction::Diamond => "💎",
            Reaction::Rocket => "🚀",
            Reaction::ThumbsUp => "👍",
        }
    }
}

/// Reaction counters. Counters only ever increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct EmojiReactions {
    pub fire: u32,
    pub diamond: u32,
    pub rocket: u32,
    pub thumbs_up: u32,
}

impl EmojiReactions {
    pub fn count(&self, reaction: Reaction) -> u32 {
        match reaction {
            Reaction::Fire => self.fire,
            Reaction::Diamond => self.diamond,
            Reaction::Rocket => self.rocket,
            Reaction::ThumbsUp => self.thumbs_up,
        }
    }

    pub fn record(&mut self, reaction: Reaction) {
        let counter = match reaction {
            Reaction::Fire => &mut self.fire,
            Reaction::Diamond => &mut self.diamond,
            Reaction::Rocket => &mut self.rocket,
            Reaction::ThumbsUp => &mut self.thumbs_up,
        };
        *counter = counter.saturating_add(1);
    }

    pub fn total(&self) -> u64 {
        Reaction::ALL
            .iter()
            .map(|r| u64::from(self.count(*r)))
            .sum()
    }
}

/// The entire durable record of a session. Lives only inside the token.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub step: Step,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_usd_values: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji_reactions: Option<EmojiReactions>,
}

impl SessionState {
    pub fn initial() -> Self {
        Self::default()
    }

    pub fn at(step: Step) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }

    pub fn ratings(&self) -> &[u8] {
        self.ratings.as_deref().unwrap_or_default()
    }

    pub fn reactions(&self) -> EmojiReactions {
        self.emoji_reactions.unwrap_or_default()
    }

    pub fn shows_usd(&self) -> bool {
        self.show_usd_values.unwrap_or(false)
    }

    pub fn average_rating(&self) -> Option<f64> {
        let ratings = self.ratings();
        if ratings.is_empty() {
            return None;
        }
        let sum: u32 = ratings.iter().map(|r| u32::from(*r)).sum();
        Some(f64::from(sum) / ratings.len() as f64)
    }

    /// Checks invariants a token can violate but the type cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(bad) = self.ratings().iter().find(|r| !RATING_RANGE.contains(*r)) {
            return Err(format!("rating {bad} is outside 1..=10"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_wire_names_match_serde() {
        for step in Step::ALL {
            let json = serde_json::to_string(&step).expect("serializes");
            assert_eq!(json, format!("\"{}\"", step.as_str()));
            assert_eq!(Step::parse(step.as_str()), Some(step));
        }
        assert_eq!(Step::parse("checkout"), None);
    }

    #[test]
    fn reaction_mapping_is_one_based() {
        assert_eq!(Reaction::from_action(0), None);
        assert_eq!(Reaction::from_action(1), Some(Reaction::Fire));
        assert_eq!(Reaction::from_action(4), Some(Reaction::ThumbsUp));
        assert_eq!(Reaction::from_action(5), None);
    }

    #[test]
    fn initial_state_serializes_to_step_only() {
        let json = serde_json::to_string(&SessionState::initial()).expect("serializes");
        assert_eq!(json, r#"{"step":"initial"}"#);
    }

    #[test]
    fn average_rating_over_ratings() {
        let mut state = SessionState::at(Step::ResultsDisplay);
        assert_eq!(state.average_rating(), None);
        state.ratings = Some(vec![4, 7]);
        assert_eq!(state.average_rating(), Some(5.5));
    }

    #[test]
    fn validate_rejects_out_of_range_ratings() {
        let mut state = SessionState::at(Step::EmojiReactions);
        state.ratings = Some(vec![3, 11]);
        assert!(state.validate().is_err());
        state.ratings = Some(vec![3, 10]);
        assert!(state.validate().is_ok());
    }

    #[test]
    fn record_increments_only_the_chosen_counter() {
        let mut reactions = EmojiReactions::default();
        reactions.record(Reaction::Rocket);
        reactions.record(Reaction::Rocket);
        assert_eq!(reactions.rocket, 2);
        assert_eq!(reactions.fire, 0);
        assert_eq!(reactions.total(), 2);
    }
}
