//! The frame state machine driver.
//!
//! One button press runs the `FrameAction` circuit:
//!
//! ```text
//! ActionPayload -> DecodeState -> ApplyAction -> BuildDescriptor -> FrameDescriptor
//! ```
//!
//! Bad tokens and illegal actions are normalized inside the circuit. Only
//! internal failures leave as `Fault`. An unrecognized step leaves through the
//! `reset` branch, which the driver answers with the initial frame.

use crate::codec::{self, DecodeError};
use crate::descriptor::{DescriptorBuilder, FrameDescriptor};
use crate::error::FrameError;
use crate::machine::{self, MachineEnv, Move};
use crate::payload::{ActionPayload, FrameUser};
use crate::state::SessionState;
use async_trait::async_trait;
use framekit_core::prelude::*;
use framekit_runtime::Axon;
use tracing::{debug, error};

/// Branch taken when the token names a step we do not know.
pub const RESET_BRANCH: &str = "reset";

/// Read-only resources shared by every execution of the circuit.
#[derive(Debug, Clone)]
pub struct FrameResources {
    pub builder: DescriptorBuilder,
    /// Recorded on wallet connect when the caller supplies no usable address
    pub demo_wallet: String,
}

/// A decoded state plus the action to apply to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub state: SessionState,
    pub action: Option<u32>,
    pub caller_address: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct DecodeState;

#[async_trait]
impl Transition<ActionPayload, PendingAction> for DecodeState {
    type Error = FrameError;
    type Resources = FrameResources;

    fn description(&self) -> Option<String> {
        Some("Decodes the state token, falling back to the initial state".to_string())
    }

    async fn run(
        &self,
        payload: ActionPayload,
        _resources: &FrameResources,
        bus: &mut Bus,
    ) -> Outcome<PendingAction, FrameError> {
        bus.insert(payload.user());

        let state = match payload.token().map(codec::decode) {
            None => SessionState::initial(),
            Some(Ok(state)) => state,
            Some(Err(DecodeError::UnknownStep(step))) => {
                debug!(step = %step, "Unrecognized step, resetting session");
                return Outcome::branch(RESET_BRANCH, Some(serde_json::json!({ "step": step })));
            }
            Some(Err(e)) => {
                debug!(error = %e, "Unreadable state token, starting from initial state");
                SessionState::initial()
            }
        };

        Outcome::Next(PendingAction {
            state,
            action: payload.action(),
            caller_address: payload.caller_address().map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ApplyAction;

#[async_trait]
impl Transition<PendingAction, SessionState> for ApplyAction {
    type Error = FrameError;
    type Resources = FrameResources;

    fn description(&self) -> Option<String> {
        Some("Looks up (step, action) in the transition table".to_string())
    }

    async fn run(
        &self,
        pending: PendingAction,
        resources: &FrameResources,
        bus: &mut Bus,
    ) -> Outcome<SessionState, FrameError> {
        let fid = bus.get::<FrameUser>().and_then(|user| user.fid);
        let env = MachineEnv {
            wallet_address: pending
                .caller_address
                .as_deref()
                .unwrap_or(&resources.demo_wallet),
        };

        match machine::transition(&pending.state, pending.action, &env) {
            Move::Advanced(next) => {
                debug!(
                    fid = ?fid,
                    from = %pending.state.step,
                    to = %next.step,
                    action = ?pending.action,
                    "Frame advanced"
                );
                Outcome::Next(next)
            }
            Move::NoOp => {
                debug!(
                    fid = ?fid,
                    step = %pending.state.step,
                    action = ?pending.action,
                    "No transition for action, re-displaying step"
                );
                Outcome::Next(pending.state)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuildDescriptor;

#[async_trait]
impl Transition<SessionState, FrameDescriptor> for BuildDescriptor {
    type Error = FrameError;
    type Resources = FrameResources;

    fn description(&self) -> Option<String> {
        Some("Encodes the state and assembles the next frame".to_string())
    }

    async fn run(
        &self,
        state: SessionState,
        resources: &FrameResources,
        _bus: &mut Bus,
    ) -> Outcome<FrameDescriptor, FrameError> {
        let descriptor = codec::encode(&state).and_then(|token| resources.builder.build(&state, &token));
        descriptor.into()
    }
}

pub type FrameCircuit = Axon<ActionPayload, FrameDescriptor, FrameError, FrameResources>;

pub fn frame_circuit() -> FrameCircuit {
    Axon::<ActionPayload, ActionPayload, FrameError, FrameResources>::new("FrameAction")
        .then(DecodeState)
        .then(ApplyAction)
        .then(BuildDescriptor)
}

/// Runs the frame circuit against fixed resources.
#[derive(Clone)]
pub struct FrameDriver {
    circuit: FrameCircuit,
    resources: FrameResources,
}

impl FrameDriver {
    pub fn new(resources: FrameResources) -> Self {
        Self {
            circuit: frame_circuit(),
            resources,
        }
    }

    pub fn resources(&self) -> &FrameResources {
        &self.resources
    }

    pub fn schematic(&self) -> &Schematic {
        self.circuit.schematic()
    }

    /// Handles one button press.
    pub async fn handle(
        &self,
        payload: ActionPayload,
        bus: &mut Bus,
    ) -> Result<FrameDescriptor, FrameError> {
        match self.circuit.execute(payload, &self.resources, bus).await {
            Outcome::Next(descriptor) => Ok(descriptor),
            Outcome::Branch(id, _) if id == RESET_BRANCH => self.initial_frame(),
            Outcome::Branch(id, _) => {
                error!(branch = %id, "Frame circuit left through an unknown branch");
                Err(FrameError::UnexpectedBranch(id))
            }
            Outcome::Fault(e) => {
                error!(error = %e, "Frame circuit faulted");
                Err(e)
            }
        }
    }

    /// The frame shown before any interaction.
    pub fn initial_frame(&self) -> Result<FrameDescriptor, FrameError> {
        let state = SessionState::initial();
        let token = codec::encode(&state)?;
        self.resources.builder.build(&state, &token)
    }
}

impl std::fmt::Debug for FrameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDriver")
            .field("circuit", &self.circuit.schematic.name)
            .field("resources", &self.resources)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Step;

    const DEMO: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

    fn driver() -> FrameDriver {
        FrameDriver::new(FrameResources {
            builder: DescriptorBuilder::new("http://localhost:3000"),
            demo_wallet: DEMO.to_string(),
        })
    }

    #[tokio::test]
    async fn decode_records_the_caller() {
        let payload = ActionPayload::from_body(br#"{"untrustedData":{"fid":7}}"#);
        let mut bus = Bus::new();
        let outcome = DecodeState.run(payload, driver().resources(), &mut bus).await;
        assert!(outcome.is_next());
        assert_eq!(bus.get::<FrameUser>().and_then(|u| u.fid), Some(7));
    }

    #[tokio::test]
    async fn unknown_step_takes_the_reset_branch() {
        let payload = ActionPayload::with_action(1, Some(r#"{"step":"checkout"}"#.to_string()));
        let outcome = DecodeState
            .run(payload, driver().resources(), &mut Bus::new())
            .await;
        assert_eq!(outcome.kind(), "Branch");
    }

    #[tokio::test]
    async fn apply_prefers_the_caller_address() {
        let caller = "0x00000000000000000000000000000000000000aa";
        let pending = PendingAction {
            state: SessionState::at(Step::ConnectWallet),
            action: Some(1),
            caller_address: Some(caller.to_string()),
        };
        let outcome = ApplyAction
            .run(pending, driver().resources(), &mut Bus::new())
            .await;
        let Outcome::Next(state) = outcome else {
            panic!("apply never faults");
        };
        assert_eq!(state.wallet_address.as_deref(), Some(caller));
    }

    #[tokio::test]
    async fn handle_without_state_starts_from_initial() {
        let descriptor = driver()
            .handle(ActionPayload::with_action(1, None), &mut Bus::new())
            .await
            .expect("handles");
        assert_eq!(descriptor.step, Step::ConnectWallet);
    }

    #[test]
    fn circuit_schematic_lists_the_pipeline() {
        let driver = driver();
        let labels: Vec<_> = driver
            .schematic()
            .nodes
            .iter()
            .map(|n| n.label.as_str())
            .collect();
        assert_eq!(labels, ["FrameAction", "DecodeState", "ApplyAction", "BuildDescriptor"]);
    }
}
