//! Persistence collaborator over sled
//!
//! One record per request, keyed by id, CBOR-encoded. Commands load the
//! record, run the engine, and store the result with compare-and-swap against
//! the bytes originally loaded: when two actors race on the same request the
//! loser observes the winner's state and fails, never half-writes.
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::Utc;
use sled::Db;
use tracing::{debug, info};

use crate::engine::{Command, EditPatch, LifecycleEngine, Policy};
use crate::error::LifecycleError;
use crate::request::{Actor, CdtRequest, RequestState};
use crate::utils;

pub struct RequestService {
    db: Arc<Db>,
    engine: LifecycleEngine,
}

impl RequestService {
    pub fn new(db: Arc<Db>) -> Self {
        Self::with_policy(db, Policy::default())
    }

    pub fn with_policy(db: Arc<Db>, policy: Policy) -> Self {
        Self {
            db,
            engine: LifecycleEngine::new(policy),
        }
    }

    pub fn engine(&self) -> &LifecycleEngine {
        &self.engine
    }

    /// Open a new draft for the acting customer and persist it.
    pub fn create_request(
        &self,
        actor: &Actor,
        amount: u64,
        term_months: u32,
    ) -> anyhow::Result<CdtRequest> {
        let id = utils::new_prefixed_id("cdt")?;
        let request = self.engine.create(id, actor, amount, term_months)?;

        self.db
            .insert(request.id().as_bytes(), minicbor::to_vec(&request)?)?;
        info!(id = request.id(), owner = actor.id.as_str(), "draft created");
        Ok(request)
    }

    pub fn edit_request(
        &self,
        id: &str,
        actor: &Actor,
        patch: &EditPatch,
    ) -> anyhow::Result<CdtRequest> {
        self.mutate(id, Command::Edit, |engine, request| {
            engine.edit(request, actor, patch)
        })
    }

    pub fn submit_request(&self, id: &str, actor: &Actor) -> anyhow::Result<CdtRequest> {
        self.mutate(id, Command::Submit, |engine, request| {
            engine.submit(request, actor)
        })
    }

    pub fn cancel_request(
        &self,
        id: &str,
        actor: &Actor,
        reason: Option<&str>,
    ) -> anyhow::Result<CdtRequest> {
        self.mutate(id, Command::Cancel, |engine, request| {
            engine.cancel(request, actor, reason)
        })
    }

    pub fn approve_request(&self, id: &str, actor: &Actor) -> anyhow::Result<CdtRequest> {
        self.mutate(id, Command::Approve, |engine, request| {
            engine.approve(request, actor)
        })
    }

    pub fn reject_request(
        &self,
        id: &str,
        actor: &Actor,
        reason: &str,
    ) -> anyhow::Result<CdtRequest> {
        self.mutate(id, Command::Reject, |engine, request| {
            engine.reject(request, actor, reason)
        })
    }

    pub fn get_request(&self, id: &str) -> anyhow::Result<CdtRequest> {
        let bytes = self
            .db
            .get(id.as_bytes())?
            .with_context(|| format!("request {id} not found"))?;
        Ok(minicbor::decode(&bytes)?)
    }

    /// Every stored request in creation order.
    pub fn list_requests(&self) -> anyhow::Result<Vec<CdtRequest>> {
        let mut requests = Vec::new();
        for record in self.db.iter() {
            let (_, bytes) = record?;
            requests.push(minicbor::decode::<CdtRequest>(&bytes)?);
        }
        requests.sort_by(|a, b| a.created_at().cmp(b.created_at()));
        Ok(requests)
    }

    /// Submit every draft older than the policy age on behalf of the system
    /// actor. Returns how many moved; a draft that loses a race to a
    /// concurrent command is skipped, not an error.
    pub fn sweep_stale_drafts(&self) -> anyhow::Result<usize> {
        let cutoff = Utc::now() - self.engine.policy().stale_draft_age;
        let system = Actor::system();
        let mut moved = 0;

        for request in self.list_requests()? {
            if request.state() != RequestState::Draft
                || request.created_at().to_datetime_utc() > cutoff
            {
                continue;
            }
            match self.submit_request(request.id(), &system) {
                Ok(_) => {
                    debug!(id = request.id(), "stale draft swept into review");
                    moved += 1;
                }
                Err(err) if err.downcast_ref::<LifecycleError>().is_some() => continue,
                Err(err) => return Err(err),
            }
        }
        if moved > 0 {
            info!(moved, "stale draft sweep finished");
        }
        Ok(moved)
    }

    // Load, run the engine command, and CAS the result back. On a CAS miss
    // the request changed underneath the command; re-read and refuse with the
    // state that actually won.
    fn mutate<F>(&self, id: &str, command: Command, op: F) -> anyhow::Result<CdtRequest>
    where
        F: Fn(&LifecycleEngine, &mut CdtRequest) -> Result<(), LifecycleError>,
    {
        let key = id.as_bytes();
        let Some(old_bytes) = self.db.get(key)? else {
            bail!("request {id} not found");
        };
        let mut request: CdtRequest = minicbor::decode(&old_bytes)?;

        op(&self.engine, &mut request)?;
        let new_bytes = minicbor::to_vec(&request)?;

        match self
            .db
            .compare_and_swap(key, Some(&old_bytes), Some(new_bytes))?
        {
            Ok(()) => {
                debug!(id, %command, state = %request.state(), "transition applied");
                Ok(request)
            }
            Err(cas) => {
                let Some(current_bytes) = cas.current else {
                    bail!("request {id} disappeared during {command}");
                };
                let current: CdtRequest = minicbor::decode(&current_bytes)?;
                debug!(id, %command, state = %current.state(), "lost update race");
                Err(LifecycleError::InvalidTransition {
                    state: current.state(),
                    command,
                }
                .into())
            }
        }
    }
}
