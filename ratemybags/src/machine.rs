//! The frame transition function.
//!
//! Every legal move of the interaction is one row of [`TRANSITIONS`]. Anything
//! not in the table is a no-op: the state is kept and the current step is
//! shown again.

use crate::state::{Reaction, SessionState, Step};
use framekit_core::schematic::{Edge, EdgeType, Node, NodeKind, Schematic};
use std::fmt;

/// Condition on the 1-based action index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Exactly(u32),
    /// Inclusive range.
    Within(u32, u32),
}

impl Guard {
    pub fn admits(self, action: u32) -> bool {
        match self {
            Guard::Exactly(expected) => action == expected,
            Guard::Within(low, high) => (low..=high).contains(&action),
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::Exactly(expected) => write!(f, "action == {expected}"),
            Guard::Within(low, high) => write!(f, "{low} <= action <= {high}"),
        }
    }
}

/// What a rule does to the state besides moving it to the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Keep,
    ConnectWallet,
    HideUsd,
    ShowUsd,
    AppendRating,
    React,
    Reset,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Effect::Keep => "none",
            Effect::ConnectWallet => "set walletAddress",
            Effect::HideUsd => "showUsdValues = false",
            Effect::ShowUsd => "showUsdValues = true",
            Effect::AppendRating => "append rating",
            Effect::React => "increment reaction",
            Effect::Reset => "reset state",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub from: Step,
    pub guard: Guard,
    pub effect: Effect,
    pub to: Step,
}

const fn rule(from: Step, guard: Guard, effect: Effect, to: Step) -> Rule {
    Rule {
        from,
        guard,
        effect,
        to,
    }
}

/// The complete interaction graph. First matching row wins.
pub const TRANSITIONS: &[Rule] = &[
    rule(Step::Initial, Guard::Exactly(1), Effect::Keep, Step::ConnectWallet),
    rule(Step::ConnectWallet, Guard::Exactly(1), Effect::ConnectWallet, Step::PortfolioDisplay),
    rule(Step::PortfolioDisplay, Guard::Exactly(1), Effect::HideUsd, Step::PortfolioDisplay),
    rule(Step::PortfolioDisplay, Guard::Exactly(2), Effect::ShowUsd, Step::PortfolioDisplay),
    rule(Step::PortfolioDisplay, Guard::Exactly(3), Effect::Keep, Step::CommunityRating),
    rule(Step::CommunityRating, Guard::Within(1, 10), Effect::AppendRating, Step::EmojiReactions),
    rule(Step::EmojiReactions, Guard::Within(1, 4), Effect::React, Step::ResultsDisplay),
    rule(Step::ResultsDisplay, Guard::Exactly(1), Effect::Keep, Step::NftMinting),
    rule(Step::ResultsDisplay, Guard::Exactly(2), Effect::Keep, Step::ShareResults),
    rule(Step::NftMinting, Guard::Exactly(1), Effect::Keep, Step::ShareResults),
    rule(Step::ShareResults, Guard::Exactly(1), Effect::Reset, Step::Initial),
];

/// Inputs the table needs that do not travel in the token.
#[derive(Debug, Clone, Copy)]
pub struct MachineEnv<'a> {
    /// Address recorded when the wallet-connect rule fires
    pub wallet_address: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Move {
    /// A rule fired; the new state already carries its next step.
    Advanced(SessionState),
    /// No rule matched; keep the state and show the same step again.
    NoOp,
}

pub fn rules_from(step: Step) -> impl Iterator<Item = &'static Rule> {
    TRANSITIONS.iter().filter(move |r| r.from == step)
}

pub fn find_rule(step: Step, action: u32) -> Option<&'static Rule> {
    rules_from(step).find(|r| r.guard.admits(action))
}

/// Pure and total: the same inputs always give the same move.
pub fn transition(state: &SessionState, action: Option<u32>, env: &MachineEnv<'_>) -> Move {
    let Some(action) = action else {
        return Move::NoOp;
    };
    let Some(rule) = find_rule(state.step, action) else {
        return Move::NoOp;
    };

    match apply(rule.effect, state, action, env) {
        Some(mut next) => {
            next.step = rule.to;
            Move::Advanced(next)
        }
        None => Move::NoOp,
    }
}

fn apply(
    effect: Effect,
    state: &SessionState,
    action: u32,
    env: &MachineEnv<'_>,
) -> Option<SessionState> {
    let mut next = state.clone();
    match effect {
        Effect::Keep => {}
        Effect::ConnectWallet => {
            // Once connected the address is fixed until a restart.
            next.wallet_address
                .get_or_insert_with(|| env.wallet_address.to_string());
        }
        Effect::HideUsd => next.show_usd_values = Some(false),
        Effect::ShowUsd => next.show_usd_values = Some(true),
        Effect::AppendRating => {
            let rating = u8::try_from(action).ok()?;
            next.ratings.get_or_insert_with(Vec::new).push(rating);
        }
        Effect::React => {
            let reaction = Reaction::from_action(action)?;
            next.emoji_reactions.get_or_insert_with(Default::default).record(reaction);
        }
        Effect::Reset => next = SessionState::initial(),
    }
    Some(next)
}

/// The transition table as a graph: one node per step, one edge per rule.
pub fn interaction_graph() -> Schematic {
    let mut schematic = Schematic::new("RateMyBags Frame")
        .with_description("Legal (step, action) moves; every other pair re-displays the step");

    for step in Step::ALL {
        schematic.nodes.push(Node {
            id: step.as_str().to_string(),
            kind: match step {
                Step::Initial => NodeKind::Ingress,
                Step::ShareResults => NodeKind::Egress,
                _ => NodeKind::Atom,
            },
            label: step.as_str().to_string(),
            input_type: "SessionState".to_string(),
            output_type: "SessionState".to_string(),
            description: None,
        });
    }

    for rule in TRANSITIONS {
        schematic.edges.push(Edge {
            from: rule.from.as_str().to_string(),
            to: rule.to.as_str().to_string(),
            kind: if rule.from == rule.to {
                EdgeType::Loop
            } else {
                EdgeType::Linear
            },
            label: Some(format!("{} / {}", rule.guard, rule.effect)),
        });
    }

    schematic
}
