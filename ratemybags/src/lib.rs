//! # RateMyBags
//!
//! A Farcaster Frame that walks a caller through connecting a wallet, viewing
//! a portfolio, rating it and reacting to it. Every button press is a full
//! round-trip; the whole session travels in an opaque state token.
//!
//! The pure core is [`codec`], [`machine`] and [`descriptor`]. [`driver`]
//! wires them into a framekit circuit, and [`server`] exposes the circuit and
//! the image collaborators over HTTP.

pub mod codec;
pub mod config;
pub mod descriptor;
pub mod driver;
pub mod error;
pub mod html;
pub mod logging;
pub mod machine;
pub mod payload;
pub mod portfolio;
pub mod render;
pub mod server;
pub mod state;

pub use config::AppConfig;
pub use descriptor::{Button, DescriptorBuilder, FrameDescriptor};
pub use driver::{FrameDriver, FrameResources};
pub use error::FrameError;
pub use payload::ActionPayload;
pub use state::{EmojiReactions, Reaction, SessionState, Step};
