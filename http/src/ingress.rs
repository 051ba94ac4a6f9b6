//! # Ingress Module
//!
//! `HttpIngress` wires HTTP inputs to application handlers. It is a route table
//! plus a connection loop, not a web framework.
//!
//! - `bind(addr)` sets the listen address
//! - `route(method, path, handler)` registers an exact-match route
//! - `fallback(handler)` handles everything else
//! - `into_raw_service()` exposes the table as a `tower::Service`
//!
//! Every request is collected (bounded), tagged with a request id, executed in
//! an `HTTPRequest` span, and guarded: a panicking handler produces the opaque
//! 500 response instead of tearing down the connection.

use crate::error::IngressError;
use crate::request::HttpRequest;
use crate::response::{self, HttpResponse};
use bytes::Bytes;
use futures_util::FutureExt;
use http::{HeaderValue, Method, Request};
use http_body::Body;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::Service;
use tracing::Instrument;

/// Largest request body the ingress will buffer.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Route handler type: boxed async function returning Response
type RouteHandler<R> = Arc<dyn Fn(HttpRequest, Arc<R>) -> BoxFuture<HttpResponse> + Send + Sync>;

fn boxed_handler<R, F, Fut>(handler: F) -> RouteHandler<R>
where
    F: Fn(HttpRequest, Arc<R>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResponse> + Send + 'static,
{
    Arc::new(move |req, res| Box::pin(handler(req, res)))
}

/// HTTP Ingress builder.
pub struct HttpIngress<R> {
    /// Bind address (e.g., "127.0.0.1:3000")
    addr: Option<String>,
    /// Routes: (Method, Path) -> Handler
    routes: HashMap<(Method, String), RouteHandler<R>>,
    /// Fallback for unmatched routes
    fallback: Option<RouteHandler<R>>,
}

impl<R> HttpIngress<R>
where
    R: Send + Sync + 'static,
{
    /// Create a new empty HttpIngress builder.
    pub fn new() -> Self {
        Self {
            addr: None,
            routes: HashMap::new(),
            fallback: None,
        }
    }

    /// Set the bind address for the server.
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.addr = Some(addr.into());
        self
    }

    /// Register a handler for an exact method and path.
    pub fn route<F, Fut>(mut self, method: Method, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpRequest, Arc<R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HttpResponse> + Send + 'static,
    {
        self.routes
            .insert((method, path.into()), boxed_handler(handler));
        self
    }

    pub fn get<F, Fut>(self, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpRequest, Arc<R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HttpResponse> + Send + 'static,
    {
        self.route(Method::GET, path, handler)
    }

    pub fn post<F, Fut>(self, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpRequest, Arc<R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HttpResponse> + Send + 'static,
    {
        self.route(Method::POST, path, handler)
    }

    /// Set a fallback handler for unmatched routes.
    pub fn fallback<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(HttpRequest, Arc<R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HttpResponse> + Send + 'static,
    {
        self.fallback = Some(boxed_handler(handler));
        self
    }

    /// Run the HTTP server until `shutdown` resolves.
    pub async fn run_until<S>(self, resources: R, shutdown: S) -> Result<(), IngressError>
    where
        S: Future<Output = ()> + Send,
    {
        let addr_str = self.addr.clone().unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|source| IngressError::InvalidAddress {
                addr: addr_str.clone(),
                source,
            })?;

        let service = self.into_raw_service(resources);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| IngressError::Bind {
                addr: addr_str.clone(),
                source,
            })?;
        tracing::info!("HTTP ingress listening on http://{}", addr);

        tokio::pin!(shutdown);
        loop {
            let (stream, peer) = tokio::select! {
                accepted = listener.accept() => accepted.map_err(IngressError::Accept)?,
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received, no longer accepting connections");
                    return Ok(());
                }
            };
            let io = TokioIo::new(stream);
            let service = service.clone();

            tokio::task::spawn(async move {
                let hyper_service = service_fn(move |req: Request<Incoming>| {
                    let service = service.clone();
                    async move { Ok::<_, Infallible>(service.dispatch(req).await) }
                });

                if let Err(err) = http1::Builder::new()
                    .serve_connection(io, hyper_service)
                    .await
                {
                    tracing::warn!(%peer, "Error serving connection: {:?}", err);
                }
            });
        }
    }

    /// Run the HTTP server until Ctrl-C.
    pub async fn run(self, resources: R) -> Result<(), IngressError> {
        self.run_until(resources, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Convert to a raw Tower Service, e.g. to drive the routes in tests
    /// without binding a socket.
    pub fn into_raw_service(self, resources: R) -> RawIngressService<R> {
        RawIngressService {
            routes: Arc::new(self.routes),
            fallback: self.fallback,
            resources: Arc::new(resources),
        }
    }
}

impl<R> Default for HttpIngress<R>
where
    R: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// The route table as a service.
pub struct RawIngressService<R> {
    routes: Arc<HashMap<(Method, String), RouteHandler<R>>>,
    fallback: Option<RouteHandler<R>>,
    resources: Arc<R>,
}

impl<R> Clone for RawIngressService<R> {
    fn clone(&self) -> Self {
        Self {
            routes: self.routes.clone(),
            fallback: self.fallback.clone(),
            resources: self.resources.clone(),
        }
    }
}

impl<R> RawIngressService<R>
where
    R: Send + Sync + 'static,
{
    /// Collect, route and guard a single request.
    pub async fn dispatch<B>(&self, req: Request<B>) -> HttpResponse
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();
        let body = match Limited::new(body, MAX_BODY_BYTES).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                tracing::warn!(
                    path = %parts.uri.path(),
                    limit = MAX_BODY_BYTES,
                    "Rejected oversized request body"
                );
                return response::payload_too_large();
            }
            Err(e) => {
                tracing::warn!(
                    path = %parts.uri.path(),
                    error = %IngressError::Body(e.to_string()),
                    "Failed to read request body"
                );
                return response::bad_request();
            }
        };

        let request = HttpRequest::new(parts.method, parts.uri, parts.headers, body);
        let request_id = request.request_id.clone();
        let span = tracing::info_span!(
            "HTTPRequest",
            framekit.http.method = %request.method,
            framekit.http.path = %request.path(),
            framekit.http.request_id = %request_id,
        );

        let handler = self
            .routes
            .get(&(request.method.clone(), request.path().to_string()))
            .or(self.fallback.as_ref())
            .cloned();

        let resources = self.resources.clone();
        let mut res = async move {
            let Some(handler) = handler else {
                return response::not_found();
            };

            match AssertUnwindSafe(handler(request, resources))
                .catch_unwind()
                .await
            {
                Ok(res) => {
                    tracing::debug!(status = res.status().as_u16(), "Request completed");
                    res
                }
                Err(_) => {
                    tracing::error!("Handler panicked; responding with internal error");
                    response::internal_error()
                }
            }
        }
        .instrument(span)
        .await;

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            res.headers_mut().insert("x-request-id", value);
        }
        res
    }
}

impl<R, B> Service<Request<B>> for RawIngressService<R>
where
    R: Send + Sync + 'static,
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Response = HttpResponse;
    type Error = Infallible;
    type Future = BoxFuture<Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.dispatch(req).await) })
    }
}
