use crate::error::IngressError;
use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;

/// A request whose body has already been collected by the ingress.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Correlation id generated by the ingress for logs and the `x-request-id` header
    pub request_id: String,
}

impl HttpRequest {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Decode the query string into `T`. A missing query decodes like an empty one.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, IngressError> {
        Ok(serde_urlencoded::from_str(self.uri.query().unwrap_or(""))?)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, IngressError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct View {
        address: Option<String>,
        #[serde(rename = "showUsd")]
        show_usd: Option<bool>,
    }

    fn request(uri: &str, body: &'static str) -> HttpRequest {
        HttpRequest::new(
            Method::GET,
            uri.parse().expect("valid uri"),
            HeaderMap::new(),
            Bytes::from_static(body.as_bytes()),
        )
    }

    #[test]
    fn decodes_query_parameters() {
        let req = request("/api/portfolio?address=0xabc&showUsd=true", "");
        let view: View = req.query().expect("query decodes");
        assert_eq!(view.address.as_deref(), Some("0xabc"));
        assert_eq!(view.show_usd, Some(true));
        assert_eq!(req.path(), "/api/portfolio");
    }

    #[test]
    fn missing_query_is_empty() {
        let view: View = request("/api/og", "").query().expect("query decodes");
        assert_eq!(view, View { address: None, show_usd: None });
    }

    #[test]
    fn json_errors_are_reported() {
        let req = request("/api/frame", "not json");
        assert!(matches!(
            req.json::<serde_json::Value>(),
            Err(IngressError::Json(_))
        ));
    }
}
