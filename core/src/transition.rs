use crate::bus::Bus;
use crate::outcome::Outcome;
use async_trait::async_trait;

/// The contract for a Typed State Transition.
///
/// `Transition` converts state `From` to `Outcome<To, Error>`, reading shared
/// read-only `Resources` and the per-request [`Bus`].
#[async_trait]
pub trait Transition<From, To>: Send + Sync + 'static
where
    From: Send + 'static,
    To: Send + 'static,
{
    /// Domain-specific error type (e.g., FrameError)
    type Error: Send + Sync + 'static;

    /// Shared, read-only resources injected by the circuit owner
    type Resources: Send + Sync + 'static;

    /// Human readable label for schematics. Defaults to the type name.
    fn label(&self) -> String {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full).to_string()
    }

    /// Optional description shown in schematics
    fn description(&self) -> Option<String> {
        None
    }

    /// Execute the transition
    async fn run(
        &self,
        state: From,
        resources: &Self::Resources,
        bus: &mut Bus,
    ) -> Outcome<To, Self::Error>;
}
