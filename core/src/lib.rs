//! # framekit-core
//!
//! Protocol-agnostic building blocks shared by the runtime and the HTTP ingress:
//!
//! * [`Transition`]: a typed state change `From -> Outcome<To, E>`
//! * [`Outcome`]: control flow as data
//! * [`Bus`]: per-request, type-keyed scratch space
//! * [`Synapse`]: the seam for side-effecting collaborators
//! * [`Schematic`]: the static, serializable view of a circuit or graph

pub mod bus;
pub mod outcome;
pub mod schematic;
pub mod synapse;
pub mod transition;

pub use bus::Bus;
pub use outcome::{BranchId, Outcome};
pub use schematic::{Edge, EdgeType, Node, NodeKind, Schematic};
pub use synapse::Synapse;
pub use transition::Transition;

pub mod prelude {
    pub use crate::bus::Bus;
    pub use crate::outcome::{BranchId, Outcome};
    pub use crate::schematic::{Edge, EdgeType, Node, NodeKind, Schematic};
    pub use crate::synapse::Synapse;
    pub use crate::transition::Transition;
}
