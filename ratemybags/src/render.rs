//! SVG image renderer for the frame image endpoints.
//!
//! Output is intentionally plain. All layouts are 1200x630, the size frame
//! clients expect for a 1.91:1 image.

use crate::html::escape;
use crate::portfolio::Portfolio;
use crate::state::{Reaction, SessionState};
use async_trait::async_trait;
use bytes::Bytes;
use framekit_core::Synapse;
use std::fmt::{self, Write};
use thiserror::Error;

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 630;

/// Token rows drawn in the portfolio view.
pub const MAX_ROWS: usize = 5;

const BACKGROUND: &str = "#f8fafc";
const INK: &str = "#0f172a";
const MUTED: &str = "#64748b";
const RULE: &str = "#e2e8f0";
const ACCENT: &str = "#3b82f6";
const MONEY: &str = "#059669";

#[derive(Debug, Clone, PartialEq)]
pub enum RenderRequest {
    Og,
    Portfolio {
        address: String,
        show_usd: bool,
        portfolio: Portfolio,
    },
    Results {
        state: SessionState,
    },
    Share {
        state: SessionState,
    },
}

impl RenderRequest {
    /// Cache lifetime for the rendered image. Static art lives longer than data views.
    pub fn max_age_secs(&self) -> u32 {
        match self {
            RenderRequest::Og => 60,
            _ => 10,
        }
    }

    pub fn view(&self) -> &'static str {
        match self {
            RenderRequest::Og => "og",
            RenderRequest::Portfolio { .. } => "portfolio",
            RenderRequest::Results { .. } => "results",
            RenderRequest::Share { .. } => "share",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub content_type: &'static str,
    pub body: Bytes,
    pub max_age_secs: u32,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write image template: {0}")]
    Template(#[from] fmt::Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SvgRenderer;

impl SvgRenderer {
    pub fn render(&self, request: &RenderRequest) -> Result<RenderedImage, RenderError> {
        let mut svg = Canvas::new()?;
        match request {
            RenderRequest::Og => draw_og(&mut svg)?,
            RenderRequest::Portfolio {
                address,
                show_usd,
                portfolio,
            } => draw_portfolio(&mut svg, address, *show_usd, portfolio)?,
            RenderRequest::Results { state } => draw_results(&mut svg, state)?,
            RenderRequest::Share { state } => draw_share(&mut svg, state)?,
        }

        Ok(RenderedImage {
            content_type: "image/svg+xml",
            body: Bytes::from(svg.finish()?),
            max_age_secs: request.max_age_secs(),
        })
    }
}

#[async_trait]
impl Synapse for SvgRenderer {
    type Input = RenderRequest;
    type Output = RenderedImage;
    type Error = RenderError;

    async fn call(&self, request: RenderRequest) -> Result<RenderedImage, RenderError> {
        self.render(&request)
    }
}

struct Canvas {
    out: String,
}

impl Canvas {
    fn new() -> Result<Self, fmt::Error> {
        let mut out = String::new();
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="Arial, Helvetica, sans-serif">"#
        )?;
        writeln!(out, r#"<rect width="100%" height="100%" fill="{BACKGROUND}"/>"#)?;
        Ok(Self { out })
    }

    #[allow(clippy::too_many_arguments)]
    fn text(&mut self, x: u32, y: u32, size: u32, fill: &str, anchor: &str, bold: bool, content: &str) -> fmt::Result {
        let weight = if bold { "bold" } else { "normal" };
        writeln!(
            self.out,
            r#"<text x="{x}" y="{y}" font-size="{size}" font-weight="{weight}" fill="{fill}" text-anchor="{anchor}">{}</text>"#,
            escape(content)
        )
    }

    fn centered(&mut self, y: u32, size: u32, fill: &str, bold: bool, content: &str) -> fmt::Result {
        self.text(WIDTH / 2, y, size, fill, "middle", bold, content)
    }

    fn line(&mut self, y: u32, width: u32) -> fmt::Result {
        writeln!(
            self.out,
            r#"<line x1="100" y1="{y}" x2="{}" y2="{y}" stroke="{RULE}" stroke-width="{width}"/>"#,
            WIDTH - 100
        )
    }

    fn circle(&mut self, cx: u32, cy: u32, r: u32, fill: &str) -> fmt::Result {
        writeln!(self.out, r#"<circle cx="{cx}" cy="{cy}" r="{r}" fill="{fill}"/>"#)
    }

    fn image(&mut self, x: u32, y: u32, size: u32, href: &str) -> fmt::Result {
        writeln!(
            self.out,
            r#"<image x="{x}" y="{y}" width="{size}" height="{size}" href="{0}" xlink:href="{0}"/>"#,
            escape(href)
        )
    }

    fn finish(mut self) -> Result<String, fmt::Error> {
        writeln!(self.out, "</svg>")?;
        Ok(self.out)
    }
}

fn draw_og(svg: &mut Canvas) -> fmt::Result {
    svg.centered(200, 72, INK, true, "RateMyBags")?;
    svg.centered(260, 32, MUTED, false, "Rate your crypto portfolio and share it with the community")?;
    svg.circle(WIDTH / 2, 380, 60, ACCENT)?;
    svg.centered(HEIGHT - 80, 24, MUTED, false, "A Farcaster Frame app for portfolio rating")
}

fn draw_portfolio(svg: &mut Canvas, address: &str, show_usd: bool, portfolio: &Portfolio) -> fmt::Result {
    svg.centered(80, 40, INK, true, "Your Crypto Portfolio")?;
    svg.centered(120, 20, INK, false, &format!("Wallet: {}", shorten_address(address)))?;

    let table_top = 180;
    svg.text(100, table_top, 24, "#475569", "start", true, "Token")?;
    svg.text(500, table_top, 24, "#475569", "start", true, "Balance")?;
    if show_usd {
        svg.text(800, table_top, 24, "#475569", "start", true, "USD Value")?;
    }
    svg.line(table_top + 10, 2)?;

    let rows = portfolio.tokens.len().min(MAX_ROWS);
    let mut y = table_top + 50;
    for (i, token) in portfolio.tokens.iter().take(MAX_ROWS).enumerate() {
        match token.logo_url.as_deref().filter(|url| !url.is_empty()) {
            Some(logo) => svg.image(100, y - 25, 30, logo)?,
            None => svg.circle(115, y - 10, 15, ACCENT)?,
        }
        svg.text(150, y, 22, INK, "start", true, &token.symbol)?;
        svg.text(150, y + 25, 18, MUTED, "start", false, &token.name)?;
        svg.text(500, y, 22, INK, "start", false, &format_amount(token.balance))?;
        if show_usd {
            svg.text(800, y, 22, MONEY, "start", false, &format_usd(token.balance_usd))?;
        }
        if i + 1 < rows {
            svg.line(y + 35, 1)?;
        }
        y += 70;
    }

    if show_usd {
        svg.text(
            WIDTH - 100,
            HEIGHT - 80,
            22,
            MONEY,
            "end",
            true,
            &format!("Total {}", format_usd(portfolio.total_usd())),
        )?;
    }
    svg.centered(HEIGHT - 40, 18, MUTED, false, "RateMyBags - Crypto Portfolio Rating on Farcaster")
}

fn draw_results(svg: &mut Canvas, state: &SessionState) -> fmt::Result {
    svg.centered(90, 44, INK, true, "Community Rating")?;
    if let Some(wallet) = state.wallet_address.as_deref() {
        svg.centered(135, 20, MUTED, false, &format!("Wallet: {}", shorten_address(wallet)))?;
    }
    svg.centered(290, 120, ACCENT, true, &rating_headline(state))?;
    let votes = state.ratings().len();
    let noun = if votes == 1 { "rating" } else { "ratings" };
    svg.centered(350, 24, MUTED, false, &format!("{votes} {noun}"))?;
    draw_reactions(svg, state, 460)?;
    svg.centered(HEIGHT - 40, 18, MUTED, false, "RateMyBags - Crypto Portfolio Rating on Farcaster")
}

fn draw_share(svg: &mut Canvas, state: &SessionState) -> fmt::Result {
    svg.centered(110, 52, INK, true, "My bags got rated!")?;
    svg.centered(280, 140, ACCENT, true, &rating_headline(state))?;
    draw_reactions(svg, state, 420)?;
    svg.centered(HEIGHT - 60, 26, MUTED, false, "Rate yours on RateMyBags")
}

fn draw_reactions(svg: &mut Canvas, state: &SessionState, y: u32) -> fmt::Result {
    let reactions = state.reactions();
    let spacing = 200;
    let start = WIDTH / 2 - spacing * 3 / 2;
    for (i, reaction) in (0u32..).zip(Reaction::ALL) {
        let x = start + i * spacing;
        svg.text(x, y, 48, INK, "middle", false, reaction.emoji())?;
        svg.text(x, y + 50, 28, INK, "middle", true, &reactions.count(reaction).to_string())?;
    }
    Ok(())
}

fn rating_headline(state: &SessionState) -> String {
    match state.average_rating() {
        Some(average) => format!("{average:.1}/10"),
        None => "No ratings yet".to_string(),
    }
}

/// `0x1234...abcd` for anything long enough to shorten.
pub fn shorten_address(address: &str) -> String {
    if address.is_ascii() && address.len() > 10 {
        format!("{}...{}", &address[..6], &address[address.len() - 4..])
    } else {
        address.to_string()
    }
}

/// Token balance with thousands separators and up to four decimals.
pub fn format_amount(value: f64) -> String {
    let decimals = if value.abs() >= 1.0 { 2 } else { 4 };
    let formatted = group_thousands(value, decimals);
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => formatted,
    }
}

pub fn format_usd(value: f64) -> String {
    let formatted = group_thousands(value.abs(), 2);
    if value < 0.0 {
        format!("-${formatted}")
    } else {
        format!("${formatted}")
    }
}

fn group_thousands(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut out = String::with_capacity(fixed.len() + whole.len() / 3 + 1);
    if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        out.push('-');
    }
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::{TokenHolding, demo_portfolio};
    use crate::state::{EmojiReactions, Step};

    fn render(request: &RenderRequest) -> String {
        let image = SvgRenderer.render(request).expect("renders");
        assert_eq!(image.content_type, "image/svg+xml");
        String::from_utf8(image.body.to_vec()).expect("utf-8")
    }

    #[test]
    fn formats_numbers_for_display() {
        assert_eq!(format_amount(1_234_567.891), "1,234,567.89");
        assert_eq!(format_amount(1.5), "1.5");
        assert_eq!(format_amount(0.00012345), "0.0001");
        assert_eq!(format_amount(100.0), "100");
        assert_eq!(format_usd(4_875.0), "$4,875.00");
        assert_eq!(format_usd(-12.5), "-$12.50");
    }

    #[test]
    fn shortens_wallets() {
        assert_eq!(
            shorten_address("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"),
            "0xd8dA...6045"
        );
        assert_eq!(shorten_address("0xabc"), "0xabc");
    }

    #[test]
    fn og_is_cached_longer_than_data_views() {
        let og = SvgRenderer.render(&RenderRequest::Og).expect("renders");
        assert_eq!(og.max_age_secs, 60);
        let results = RenderRequest::Results {
            state: SessionState::initial(),
        };
        assert_eq!(results.max_age_secs(), 10);
    }

    #[test]
    fn portfolio_shows_at_most_five_rows() {
        let mut portfolio = demo_portfolio();
        portfolio.tokens.push(TokenHolding {
            symbol: "PEPE".into(),
            name: "Pepe".into(),
            balance: 1.0,
            balance_usd: 0.0,
            logo_url: None,
        });
        let svg = render(&RenderRequest::Portfolio {
            address: "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".into(),
            show_usd: false,
            portfolio,
        });
        assert!(svg.contains("ARB"));
        assert!(!svg.contains("PEPE"));
        assert!(!svg.contains("USD Value"));
        assert!(svg.contains("Wallet: 0xd8dA...6045"));
    }

    #[test]
    fn usd_column_and_placeholder_logo() {
        let portfolio = Portfolio {
            tokens: vec![TokenHolding {
                symbol: "PEPE".into(),
                name: "Pepe".into(),
                balance: 1_000_000.0,
                balance_usd: 12.0,
                logo_url: None,
            }],
        };
        let svg = render(&RenderRequest::Portfolio {
            address: "0xabc".into(),
            show_usd: true,
            portfolio,
        });
        assert!(svg.contains("USD Value"));
        assert!(svg.contains("$12.00"));
        assert!(svg.contains(&format!(r#"<circle cx="115" cy="220" r="15" fill="{ACCENT}"/>"#)));
    }

    #[test]
    fn results_show_average_and_reactions() {
        let state = SessionState {
            step: Step::ResultsDisplay,
            ratings: Some(vec![7, 8]),
            emoji_reactions: Some(EmojiReactions {
                rocket: 3,
                ..Default::default()
            }),
            ..Default::default()
        };
        let svg = render(&RenderRequest::Results { state });
        assert!(svg.contains("7.5/10"));
        assert!(svg.contains("2 ratings"));
        assert!(svg.contains("🚀"));
        assert!(svg.contains(">3</text>"));
    }

    #[test]
    fn share_without_ratings() {
        let svg = render(&RenderRequest::Share {
            state: SessionState::at(Step::ShareResults),
        });
        assert!(svg.contains("No ratings yet"));
    }

    #[test]
    fn text_is_escaped() {
        let portfolio = Portfolio {
            tokens: vec![TokenHolding {
                symbol: "<B&B>".into(),
                name: "x".into(),
                balance: 1.0,
                balance_usd: 1.0,
                logo_url: None,
            }],
        };
        let svg = render(&RenderRequest::Portfolio {
            address: "0xabc".into(),
            show_usd: false,
            portfolio,
        });
        assert!(svg.contains("&lt;B&amp;B&gt;"));
    }
}
