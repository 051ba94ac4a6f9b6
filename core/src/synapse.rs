use async_trait::async_trait;

/// Synapse: The Integration Layer
///
/// A Synapse represents a connection to an external system or side-effect
/// (a portfolio API, an image renderer). Transitions stay pure; synapses do I/O.
#[async_trait]
pub trait Synapse: Send + Sync {
    type Input: Send;
    type Output: Send;
    type Error: std::fmt::Debug + Send;

    /// Executes the integration logic (e.g., API call, rendering)
    async fn call(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;
}
