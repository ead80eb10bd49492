use crate::engine::Command;
use crate::request::RequestState;

/// Every way a lifecycle command can be refused. All variants are expected,
/// recoverable outcomes; the engine never panics on bad input and never
/// partially mutates a request when returning one of these.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("amount {amount} is below the minimum of {min}")]
    AmountTooLow { amount: u64, min: u64 },
    #[error("term of {term} months is outside the allowed range {min}..={max}")]
    TermOutOfRange { term: u32, min: u32, max: u32 },
    #[error("{field} is not a whole number: {input:?}")]
    MalformedNumber { field: &'static str, input: String },
    #[error("request is only editable in Draft, current state is {state}")]
    NotEditable { state: RequestState },
    #[error("cannot {command} a request in state {state}")]
    InvalidTransition {
        state: RequestState,
        command: Command,
    },
    #[error("actor {actor_id} is not allowed to {command} this request")]
    Unauthorized { actor_id: String, command: Command },
    #[error("a reason is required to {command} this request")]
    MissingReason { command: Command },
}
