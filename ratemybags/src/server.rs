//! HTTP surface of the frame.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /` | landing page with the initial frame tags |
//! | `POST /api/frame` | one button press through the frame driver |
//! | `GET /api/frame/graph` | the transition table as a schematic |
//! | `GET /api/frame/schema` | driver circuit plus payload/descriptor JSON Schemas |
//! | `GET /api/og`, `/api/portfolio`, `/api/results`, `/api/share` | SVG images |
//! | `GET /images/<file>` | static assets from the public directory |

use crate::codec;
use crate::config::AppConfig;
use crate::descriptor::{DescriptorBuilder, FrameDescriptor};
use crate::driver::{FrameDriver, FrameResources};
use crate::html::{self, FrameResponse};
use crate::machine;
use crate::payload::{ActionPayload, is_eth_address};
use crate::portfolio::{PortfolioError, PortfolioService};
use crate::render::{RenderRequest, SvgRenderer};
use crate::state::SessionState;
use framekit_core::{Bus, Synapse};
use framekit_http::prelude::*;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info_span};

/// Shared, read-only state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppResources {
    pub config: Arc<AppConfig>,
    pub driver: FrameDriver,
    pub portfolio: PortfolioService,
    pub renderer: SvgRenderer,
}

impl AppResources {
    pub fn new(config: AppConfig, portfolio: PortfolioService) -> Self {
        let driver = FrameDriver::new(FrameResources {
            builder: DescriptorBuilder::new(config.public_host.clone()),
            demo_wallet: config.demo_wallet_address.clone(),
        });
        Self {
            config: Arc::new(config),
            driver,
            portfolio,
            renderer: SvgRenderer,
        }
    }

    pub fn from_config(config: AppConfig) -> Result<Self, PortfolioError> {
        let portfolio = PortfolioService::from_config(&config.portfolio)?;
        Ok(Self::new(config, portfolio))
    }
}

pub fn routes() -> HttpIngress<AppResources> {
    HttpIngress::new()
        .get("/", landing)
        .post("/api/frame", frame)
        .get("/api/frame/graph", frame_graph)
        .get("/api/frame/schema", frame_schema)
        .get("/api/og", og_image)
        .get("/api/portfolio", portfolio_image)
        .get("/api/results", results_image)
        .get("/api/share", share_image)
        .fallback(static_asset)
}

async fn landing(_req: HttpRequest, app: Arc<AppResources>) -> HttpResponse {
    match app.driver.initial_frame() {
        Ok(descriptor) => response::html(html::landing_page(&descriptor, &app.config.public_host)),
        Err(e) => {
            error!(error = %e, "Failed to build initial frame");
            response::internal_error()
        }
    }
}

async fn frame(req: HttpRequest, app: Arc<AppResources>) -> HttpResponse {
    let payload = ActionPayload::from_body(&req.body);
    let user = payload.user();
    let span = info_span!("Frame", fid = ?user.fid, username = ?user.username);

    let mut bus = Bus::new();
    match app.driver.handle(payload, &mut bus).instrument(span).await {
        Ok(descriptor) => response::json(&FrameResponse::from(descriptor)),
        Err(e) => {
            error!(error = %e, "Frame request failed");
            response::internal_error()
        }
    }
}

async fn frame_graph(_req: HttpRequest, _app: Arc<AppResources>) -> HttpResponse {
    response::json(&machine::interaction_graph())
}

async fn frame_schema(_req: HttpRequest, app: Arc<AppResources>) -> HttpResponse {
    response::json(&serde_json::json!({
        "circuit": app.driver.schematic(),
        "payload": schemars::schema_for!(ActionPayload),
        "descriptor": schemars::schema_for!(FrameDescriptor),
        "state": schemars::schema_for!(SessionState),
    }))
}

async fn og_image(_req: HttpRequest, app: Arc<AppResources>) -> HttpResponse {
    image_response(&app, RenderRequest::Og).await
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortfolioQuery {
    address: Option<String>,
    show_usd: Option<String>,
}

async fn portfolio_image(req: HttpRequest, app: Arc<AppResources>) -> HttpResponse {
    let query: PortfolioQuery = req.query().unwrap_or_default();
    let address = query
        .address
        .filter(|a| is_eth_address(a))
        .unwrap_or_else(|| app.config.demo_wallet_address.clone());
    let show_usd = query.show_usd.as_deref() == Some("true");

    let portfolio = app.portfolio.portfolio_or_demo(&address).await;
    let request = RenderRequest::Portfolio {
        address,
        show_usd,
        portfolio,
    };
    image_response(&app, request).await
}

#[derive(Debug, Default, Deserialize)]
struct StateQuery {
    state: Option<String>,
}

/// Decodes `?state=`; anything unusable renders as a fresh session.
fn state_from_query(req: &HttpRequest) -> SessionState {
    let query: StateQuery = req.query().unwrap_or_default();
    match query.state.as_deref().map(codec::decode) {
        Some(Ok(state)) => state,
        Some(Err(e)) => {
            debug!(error = %e, "Unreadable state in image query, rendering initial state");
            SessionState::initial()
        }
        None => SessionState::initial(),
    }
}

async fn results_image(req: HttpRequest, app: Arc<AppResources>) -> HttpResponse {
    let state = state_from_query(&req);
    image_response(&app, RenderRequest::Results { state }).await
}

async fn share_image(req: HttpRequest, app: Arc<AppResources>) -> HttpResponse {
    let state = state_from_query(&req);
    image_response(&app, RenderRequest::Share { state }).await
}

async fn image_response(app: &AppResources, request: RenderRequest) -> HttpResponse {
    let view = request.view();
    match app.renderer.call(request).await {
        Ok(image) => response::cached(
            response::with_content_type(StatusCode::OK, image.content_type, image.body),
            image.max_age_secs,
        ),
        Err(e) => {
            error!(view, error = %e, "Image render failed");
            response::internal_error()
        }
    }
}

async fn static_asset(req: HttpRequest, app: Arc<AppResources>) -> HttpResponse {
    if req.method != Method::GET {
        return response::not_found();
    }
    let Some(name) = req.path().strip_prefix("/images/").filter(|n| is_safe_file_name(n)) else {
        return response::not_found();
    };

    let path = app.config.images_dir().join(name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => response::cached(
            response::with_content_type(StatusCode::OK, content_type_for(&path), bytes),
            3_600,
        ),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Static asset not found");
            response::not_found()
        }
    }
}

/// A single path segment with no traversal or hidden-file tricks.
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
