//! # framekit-http
//!
//! Hyper 1.0 ingress for framekit applications. `HttpIngress` is a route
//! table, not a framework: handlers receive a fully collected [`HttpRequest`]
//! and return an [`HttpResponse`].

pub mod error;
pub mod ingress;
pub mod request;
pub mod response;

pub use error::IngressError;
pub use ingress::{HttpIngress, RawIngressService};
pub use request::HttpRequest;
pub use response::HttpResponse;

pub mod prelude {
    pub use crate::error::IngressError;
    pub use crate::ingress::{HttpIngress, RawIngressService};
    pub use crate::request::HttpRequest;
    pub use crate::response::{self, HttpResponse};
    pub use http::{Method, StatusCode};
}
