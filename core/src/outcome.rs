use serde::{Deserialize, Serialize};

pub type BranchId = String;

/// The explicit result of a transition in a circuit.
///
/// `Outcome` represents "Control Flow as Data".
/// Instead of implicit returns or panics, every transition returns an `Outcome`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome<T, E> {
    /// Proceed to the next transition with the new state
    Next(T),

    /// Leave the linear path through a named branch.
    /// The circuit stops and hands the branch to its caller.
    Branch(BranchId, Option<serde_json::Value>),

    /// A structural fault (Error path)
    Fault(E),
}

impl<T, E> Outcome<T, E> {
    pub fn next(value: T) -> Self {
        Outcome::Next(value)
    }

    pub fn branch(id: impl Into<BranchId>, payload: Option<serde_json::Value>) -> Self {
        Outcome::Branch(id.into(), payload)
    }

    pub fn is_next(&self) -> bool {
        matches!(self, Outcome::Next(_))
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Outcome::Fault(_))
    }

    /// Short label used in logs and timelines.
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Next(_) => "Next",
            Outcome::Branch(_, _) => "Branch",
            Outcome::Fault(_) => "Fault",
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, op: F) -> Outcome<U, E> {
        match self {
            Outcome::Next(t) => Outcome::Next(op(t)),
            Outcome::Branch(id, payload) => Outcome::Branch(id, payload),
            Outcome::Fault(e) => Outcome::Fault(e),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Next(value),
            Err(e) => Outcome::Fault(e),
        }
    }
}
