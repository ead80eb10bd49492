//! Lifecycle engine: the single authority for mutating a [`CdtRequest`]
//!
//! Each command validates the actor, the current state, and the payload in
//! full before touching the request. A returned error means nothing changed:
//! no field, no state, no history entry.
use chrono::Duration;

use crate::error::LifecycleError;
use crate::request::{Actor, CdtRequest, History, HistoryEntry, RequestState, Role, TimeStamp};
use crate::validation;

/// The command set. Carried inside errors so a refusal names what was
/// attempted, not just where it stood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Create,
    Edit,
    Submit,
    Cancel,
    Approve,
    Reject,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::Create => "create",
            Command::Edit => "edit",
            Command::Submit => "submit",
            Command::Cancel => "cancel",
            Command::Approve => "approve",
            Command::Reject => "reject",
        };
        f.write_str(name)
    }
}

/// Approval constraints. The defaults are the bounds the business runs with;
/// tests and deployments may override them.
#[derive(Debug, Clone)]
pub struct Policy {
    pub min_amount: u64,
    pub min_term_months: u32,
    pub max_term_months: u32,
    /// Upper bound on the assigned interest rate, in percent.
    pub rate_cap: f64,
    /// Drafts older than this are swept into review by the system actor.
    pub stale_draft_age: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            min_amount: validation::MIN_AMOUNT,
            min_term_months: validation::MIN_TERM_MONTHS,
            max_term_months: validation::MAX_TERM_MONTHS,
            rate_cap: 12.0,
            stale_draft_age: Duration::hours(24),
        }
    }
}

/// Partial update applied to a draft; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct EditPatch {
    pub amount: Option<u64>,
    pub term_months: Option<u32>,
}

pub struct LifecycleEngine {
    policy: Policy,
}

impl LifecycleEngine {
    pub fn new(policy: Policy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Open a new request in `Draft` for the acting customer.
    pub fn create(
        &self,
        id: impl Into<String>,
        actor: &Actor,
        amount: u64,
        term_months: u32,
    ) -> Result<CdtRequest, LifecycleError> {
        if actor.role != Role::Customer {
            return Err(LifecycleError::Unauthorized {
                actor_id: actor.id.clone(),
                command: Command::Create,
            });
        }
        validation::validate_amount(amount, self.policy.min_amount)?;
        validation::validate_term(
            term_months,
            self.policy.min_term_months,
            self.policy.max_term_months,
        )?;

        let now = TimeStamp::now();
        let mut request = CdtRequest {
            id: id.into(),
            owner_id: actor.id.clone(),
            amount,
            term_months,
            interest_rate: None,
            state: RequestState::Draft,
            rejection_reason: None,
            created_at: now.clone(),
            updated_at: now,
            history: History::default(),
        };
        record(&mut request, actor, Command::Create, None);
        Ok(request)
    }

    /// Change amount and/or term. Only drafts are editable, and edited values
    /// go through the same validation as creation.
    pub fn edit(
        &self,
        request: &mut CdtRequest,
        actor: &Actor,
        patch: &EditPatch,
    ) -> Result<(), LifecycleError> {
        require_owner(request, actor, Command::Edit)?;
        if request.state != RequestState::Draft {
            return Err(LifecycleError::NotEditable {
                state: request.state,
            });
        }

        let amount = patch.amount.unwrap_or(request.amount);
        let term_months = patch.term_months.unwrap_or(request.term_months);
        validation::validate_amount(amount, self.policy.min_amount)?;
        validation::validate_term(
            term_months,
            self.policy.min_term_months,
            self.policy.max_term_months,
        )?;

        request.amount = amount;
        request.term_months = term_months;
        record(
            request,
            actor,
            Command::Edit,
            Some(format!("amount={amount}, term_months={term_months}")),
        );
        Ok(())
    }

    /// Hand a draft over for agent review. The owning customer submits, or the
    /// system actor does when sweeping stale drafts.
    pub fn submit(&self, request: &mut CdtRequest, actor: &Actor) -> Result<(), LifecycleError> {
        match actor.role {
            Role::System => {}
            Role::Customer if actor.id == request.owner_id => {}
            _ => {
                return Err(LifecycleError::Unauthorized {
                    actor_id: actor.id.clone(),
                    command: Command::Submit,
                });
            }
        }
        if request.state != RequestState::Draft {
            return Err(LifecycleError::InvalidTransition {
                state: request.state,
                command: Command::Submit,
            });
        }
        // the draft may predate a policy change
        validation::validate_amount(request.amount, self.policy.min_amount)?;
        validation::validate_term(
            request.term_months,
            self.policy.min_term_months,
            self.policy.max_term_months,
        )?;

        request.state = RequestState::PendingReview;
        record(request, actor, Command::Submit, None);
        Ok(())
    }

    /// Cancel a draft or a pending request. A reason is optional while still
    /// in `Draft` and required once the request is under review.
    pub fn cancel(
        &self,
        request: &mut CdtRequest,
        actor: &Actor,
        reason: Option<&str>,
    ) -> Result<(), LifecycleError> {
        require_owner(request, actor, Command::Cancel)?;
        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        match request.state {
            RequestState::Draft => {}
            RequestState::PendingReview => {
                if reason.is_none() {
                    return Err(LifecycleError::MissingReason {
                        command: Command::Cancel,
                    });
                }
            }
            state => {
                return Err(LifecycleError::InvalidTransition {
                    state,
                    command: Command::Cancel,
                });
            }
        }

        request.state = RequestState::Cancelled;
        record(request, actor, Command::Cancel, reason.map(str::to_owned));
        Ok(())
    }

    /// Agent approval. Assigns the system rate unless one is already set.
    pub fn approve(&self, request: &mut CdtRequest, actor: &Actor) -> Result<(), LifecycleError> {
        if actor.role != Role::Agent {
            return Err(LifecycleError::Unauthorized {
                actor_id: actor.id.clone(),
                command: Command::Approve,
            });
        }
        if request.state != RequestState::PendingReview {
            return Err(LifecycleError::InvalidTransition {
                state: request.state,
                command: Command::Approve,
            });
        }

        let rate = request
            .interest_rate
            .unwrap_or_else(|| self.quoted_rate(request.amount, request.term_months));
        request.interest_rate = Some(rate);
        request.state = RequestState::Approved;
        record(
            request,
            actor,
            Command::Approve,
            Some(format!("rate {rate:.2}%")),
        );
        Ok(())
    }

    /// Agent rejection with a mandatory reason. The reason is stored on the
    /// request and echoed into the history entry.
    pub fn reject(
        &self,
        request: &mut CdtRequest,
        actor: &Actor,
        reason: &str,
    ) -> Result<(), LifecycleError> {
        if actor.role != Role::Agent {
            return Err(LifecycleError::Unauthorized {
                actor_id: actor.id.clone(),
                command: Command::Reject,
            });
        }
        if request.state != RequestState::PendingReview {
            return Err(LifecycleError::InvalidTransition {
                state: request.state,
                command: Command::Reject,
            });
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LifecycleError::MissingReason {
                command: Command::Reject,
            });
        }

        request.rejection_reason = Some(reason.to_owned());
        request.state = RequestState::Rejected;
        record(request, actor, Command::Reject, Some(reason.to_owned()));
        Ok(())
    }

    /// Rate assigned at approval: a base of 5% plus a term and amount spread,
    /// capped by policy and rounded to two decimals.
    pub fn quoted_rate(&self, amount: u64, term_months: u32) -> f64 {
        let raw = 5.0
            + (term_months as f64 / 12.0) * 0.5
            + (amount as f64 / 1_000_000.0) * 0.2;
        (raw.min(self.policy.rate_cap) * 100.0).round() / 100.0
    }
}

impl Default for LifecycleEngine {
    fn default() -> Self {
        Self::new(Policy::default())
    }
}

fn require_owner(
    request: &CdtRequest,
    actor: &Actor,
    command: Command,
) -> Result<(), LifecycleError> {
    if actor.role != Role::Customer || actor.id != request.owner_id {
        return Err(LifecycleError::Unauthorized {
            actor_id: actor.id.clone(),
            command,
        });
    }
    Ok(())
}

// Every applied transition refreshes updated_at and appends exactly one
// history entry, in the same call.
fn record(request: &mut CdtRequest, actor: &Actor, command: Command, detail: Option<String>) {
    let timestamp = TimeStamp::now();
    request.updated_at = timestamp.clone();
    request.history.append(HistoryEntry {
        timestamp,
        actor_id: actor.id.clone(),
        actor_role: actor.role,
        action: command.to_string(),
        detail,
    });
}
