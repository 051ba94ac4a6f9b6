//! # Axon: Executable Circuit
//!
//! The `Axon` is the **runtime execution path** of a chain of transitions.
//! It functions as a reusable, thread-safe `In -> Outcome<Out, E>` pipeline.
//!
//! * **Axon flows, Schematic shows**: Axon executes; Schematic describes
//! * **Builder pattern**: `Axon::new().then().then()`
//! * **Short circuit**: `Branch` and `Fault` stop the chain and are returned as-is

use framekit_core::bus::Bus;
use framekit_core::outcome::Outcome;
use framekit_core::schematic::{Edge, EdgeType, Node, NodeKind, Schematic};
use framekit_core::transition::Transition;
use std::any::type_name;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Type alias for async boxed futures used in Axon execution.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Executor type for Axon steps.
/// Takes an input state `In` plus shared resources and returns an `Outcome<Out, E>`.
pub type Executor<In, Out, E, Res> = Arc<
    dyn for<'a> Fn(In, &'a Res, &'a mut Bus) -> BoxFuture<'a, Outcome<Out, E>> + Send + Sync,
>;

/// Pins the higher-ranked signature of an executor closure.
fn executor<In, Out, E, Res, F>(f: F) -> Executor<In, Out, E, Res>
where
    F: for<'a> Fn(In, &'a Res, &'a mut Bus) -> BoxFuture<'a, Outcome<Out, E>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Helper to extract a readable type name from a type.
fn type_name_of<T: ?Sized>() -> String {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full).to_string()
}

/// The Axon Builder and Runtime.
///
/// ## Example
///
/// ```rust,ignore
/// let circuit = Axon::<Payload, Payload, FrameError, FrameResources>::new("FrameAction")
///     .then(DecodeState)
///     .then(ApplyAction)
///     .then(BuildDescriptor);
///
/// let outcome = circuit.execute(payload, &resources, &mut Bus::new()).await;
/// ```
pub struct Axon<In, Out, E, Res = ()> {
    /// The static structure (for visualization/analysis)
    pub schematic: Schematic,
    /// The runtime executor
    executor: Executor<In, Out, E, Res>,
}

impl<In, Out, E, Res> Clone for Axon<In, Out, E, Res> {
    fn clone(&self) -> Self {
        Self {
            schematic: self.schematic.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl<In, E, Res> Axon<In, In, E, Res>
where
    In: Send + 'static,
    E: Send + 'static,
    Res: Send + Sync + 'static,
{
    /// Start defining a new Axon flow.
    /// This creates an Identity Axon (In -> In).
    pub fn new(label: &str) -> Self {
        let node = Node {
            id: uuid::Uuid::new_v4().to_string(),
            kind: NodeKind::Ingress,
            label: label.to_string(),
            input_type: "void".to_string(),
            output_type: type_name_of::<In>(),
            description: None,
        };

        let mut schematic = Schematic::new(label);
        schematic.nodes.push(node);

        let executor = executor(|input: In, _res: &Res, _bus: &mut Bus| {
            Box::pin(std::future::ready(Outcome::Next(input))) as BoxFuture<'_, Outcome<In, E>>
        });

        Self {
            schematic,
            executor,
        }
    }
}

impl<In, Out, E, Res> Axon<In, Out, E, Res>
where
    In: Send + 'static,
    Out: Send + 'static,
    E: Send + 'static,
    Res: Send + Sync + 'static,
{
    /// Chain a transition to this Axon.
    pub fn then<Next, Trans>(self, transition: Trans) -> Axon<In, Next, E, Res>
    where
        Next: Send + 'static,
        Trans: Transition<Out, Next, Error = E, Resources = Res> + Clone,
    {
        let trans_label = transition.label();

        // Decompose self to avoid partial move issues
        let Axon {
            mut schematic,
            executor: prev_executor,
        } = self;

        let next_node_id = uuid::Uuid::new_v4().to_string();
        let next_node = Node {
            id: next_node_id.clone(),
            kind: NodeKind::Atom,
            label: trans_label.clone(),
            input_type: type_name_of::<Out>(),
            output_type: type_name_of::<Next>(),
            description: transition.description(),
        };

        let last_node_id = schematic
            .nodes
            .last()
            .map(|n| n.id.clone())
            .unwrap_or_default();

        schematic.nodes.push(next_node);
        schematic.edges.push(Edge {
            from: last_node_id,
            to: next_node_id,
            kind: EdgeType::Linear,
            label: Some("Next".to_string()),
        });

        let next_executor = executor(move |input: In, res: &Res, bus: &mut Bus| {
            let prev = prev_executor.clone();
            let trans = transition.clone();
            let label = trans_label.clone();

            Box::pin(async move {
                let state = match prev(input, res, bus).await {
                    Outcome::Next(t) => t,
                    Outcome::Branch(id, payload) => return Outcome::Branch(id, payload),
                    Outcome::Fault(e) => return Outcome::Fault(e),
                };

                let span = tracing::debug_span!("Node", framekit.node = %label);
                async move {
                    let started = Instant::now();
                    let outcome = trans.run(state, res, bus).await;
                    tracing::debug!(
                        outcome = outcome.kind(),
                        elapsed_us = started.elapsed().as_micros() as u64,
                        "Transition completed"
                    );
                    outcome
                }
                .instrument(span)
                .await
            }) as BoxFuture<'_, Outcome<Next, E>>
        });

        Axon {
            schematic,
            executor: next_executor,
        }
    }

    /// Execute the Axon with the given input.
    pub async fn execute(&self, input: In, resources: &Res, bus: &mut Bus) -> Outcome<Out, E> {
        let label = self.schematic.name.clone();
        (self.executor)(input, resources, bus)
            .instrument(tracing::info_span!("Circuit", framekit.circuit = %label))
            .await
    }

    /// Get a reference to the Schematic (structural view).
    pub fn schematic(&self) -> &Schematic {
        &self.schematic
    }
}
