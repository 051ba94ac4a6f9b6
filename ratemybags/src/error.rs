use thiserror::Error;

/// Failures of the frame pipeline. Every variant is an internal fault: domain
/// anomalies (bad tokens, illegal actions) never become a `FrameError`.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("failed to encode session state: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to build image query: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),

    #[error("circuit left through unexpected branch '{0}'")]
    UnexpectedBranch(String),
}
