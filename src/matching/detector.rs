use serde::{Deserialize, Serialize};
use serde_json::{json, Map};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::ledger::{decision_op, Decision, InconsistentDecision, Recorded, SwipeLedger, WorkerSwipes};
use crate::db::{DocPath, DocumentStore, StoreError, WriteOp, JOBS, USERS};
use crate::ids::pair_key;
use crate::models::{Job, Profile, Role, User};

/// Lifecycle of one (worker, job) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairState {
    Unseen,
    WorkerLiked,
    BusinessLiked,
    /// Both sides liked but no match is recorded yet; `reconcile` promotes it
    MutualLike,
    Matched,
    /// One side disliked the other; the pair can no longer match
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(tag = "role", content = "id")]
pub enum Actor {
    Worker(Uuid),
    Business(Uuid),
}

impl Actor {
    pub fn id(&self) -> Uuid {
        match *self {
            Actor::Worker(id) | Actor::Business(id) => id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Actor::Worker(_) => Role::Worker,
            Actor::Business(_) => Role::Business,
        }
    }
}

/// A decision by a worker on a job, or by a business on a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwipeEvent {
    pub actor: Actor,
    pub target: Uuid,
    pub decision: Decision,
}

impl SwipeEvent {
    pub fn worker(worker: Uuid, job: Uuid, decision: Decision) -> Self {
        Self {
            actor: Actor::Worker(worker),
            target: job,
            decision,
        }
    }

    pub fn business(business: Uuid, worker: Uuid, decision: Decision) -> Self {
        Self {
            actor: Actor::Business(business),
            target: worker,
            decision,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwipeError {
    #[error(transparent)]
    Inconsistent(#[from] InconsistentDecision),

    #[error("Unknown worker: {0}")]
    UnknownWorker(Uuid),

    #[error("Unknown business: {0}")]
    UnknownBusiness(Uuid),

    #[error("Unknown job: {0}")]
    UnknownJob(Uuid),

    #[error("Job {job} belongs to business {owner}, not {claimed}")]
    OwnerMismatch { job: Uuid, owner: Uuid, claimed: Uuid },
}

/// A mutual like between a worker and a business on one of its jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Match {
    pub worker_id: Uuid,
    pub job_id: Uuid,
    pub business_id: Uuid,
}

impl Match {
    /// Writes recording the match on the worker, the business and the job.
    /// Array unions keep re-delivery from duplicating entries.
    pub fn write_ops(&self) -> Vec<WriteOp> {
        vec![
            WriteOp::merge(DocPath::user(self.worker_id), Map::new())
                .with_array_union("matched_jobs", vec![json!(self.job_id)])
                .with_server_timestamp("last_updated_at"),
            WriteOp::merge(DocPath::user(self.business_id), Map::new())
                .with_array_union("matched_workers", vec![json!(self.worker_id)])
                .with_server_timestamp("last_updated_at"),
            WriteOp::merge(DocPath::job(self.job_id), Map::new())
                .with_array_union("matches", vec![json!(self.worker_id)])
                .with_server_timestamp("updated_at"),
        ]
    }
}

/// Outcome of an event, computed but not yet applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipePlan {
    pub event: SwipeEvent,
    pub recorded: Recorded,
    pub matches: Vec<Match>,
}

impl SwipePlan {
    /// Everything the event needs persisted, in one group
    pub fn write_ops(&self) -> Vec<WriteOp> {
        let mut ops = Vec::new();
        if self.recorded == Recorded::New {
            let SwipeEvent { actor, target, decision } = self.event;
            ops.push(decision_op(actor.role(), actor.id(), target, decision));
            if let (Actor::Worker(worker), Decision::Like) = (actor, decision) {
                ops.push(
                    WriteOp::merge(DocPath::job(target), Map::new())
                        .with_array_union("applicants", vec![json!(worker)]),
                );
            }
        }
        for m in &self.matches {
            ops.extend(m.write_ops());
        }
        ops
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwipeOutcome {
    pub recorded: Recorded,
    pub matches: Vec<Match>,
}

/// Tracks decisions of both sides and promotes reciprocal likes to matches.
///
/// Business likes target a worker and apply to every job that business owns;
/// worker likes target a single job and consult its owner.
#[derive(Debug, Clone, Default)]
pub struct MatchDetector {
    ledger: SwipeLedger,
    workers: HashSet<Uuid>,
    businesses: HashSet<Uuid>,
    job_owner: HashMap<Uuid, Uuid>,
    jobs_by_business: HashMap<Uuid, Vec<Uuid>>,
    matched: HashSet<(Uuid, Uuid)>,
    matched_jobs: HashMap<Uuid, BTreeSet<Uuid>>,
    matched_workers: HashMap<Uuid, BTreeSet<Uuid>>,
}

impl MatchDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger(&self) -> &SwipeLedger {
        &self.ledger
    }

    pub fn register_worker(&mut self, worker: Uuid) {
        self.workers.insert(worker);
    }

    pub fn register_business(&mut self, business: Uuid) {
        self.businesses.insert(business);
    }

    pub fn is_worker(&self, id: Uuid) -> bool {
        self.workers.contains(&id)
    }

    pub fn is_business(&self, id: Uuid) -> bool {
        self.businesses.contains(&id)
    }

    pub fn owner_of(&self, job: Uuid) -> Option<Uuid> {
        self.job_owner.get(&job).copied()
    }

    /// Attach a job to its business. Ownership is fixed once registered.
    pub fn register_job(&mut self, job: Uuid, business: Uuid) -> Result<(), SwipeError> {
        if !self.businesses.contains(&business) {
            return Err(SwipeError::UnknownBusiness(business));
        }
        match self.job_owner.get(&job) {
            Some(&owner) if owner == business => Ok(()),
            Some(&owner) => Err(SwipeError::OwnerMismatch {
                job,
                owner,
                claimed: business,
            }),
            None => {
                self.job_owner.insert(job, business);
                self.jobs_by_business.entry(business).or_default().push(job);
                Ok(())
            }
        }
    }

    /// Stop accepting swipes on a deleted job. Recorded history stays.
    pub fn remove_job(&mut self, job: Uuid) {
        if let Some(owner) = self.job_owner.remove(&job) {
            if let Some(jobs) = self.jobs_by_business.get_mut(&owner) {
                jobs.retain(|j| *j != job);
            }
        }
    }

    pub fn remove_user(&mut self, user: Uuid) {
        self.workers.remove(&user);
        self.businesses.remove(&user);
    }

    /// Evaluate an event against current state without changing it
    pub fn plan(&self, event: &SwipeEvent) -> Result<SwipePlan, SwipeError> {
        let (recorded, matches) = match event.actor {
            Actor::Worker(worker) => {
                if !self.workers.contains(&worker) {
                    return Err(SwipeError::UnknownWorker(worker));
                }
                let job = event.target;
                let business = self.owner_of(job).ok_or(SwipeError::UnknownJob(job))?;
                let recorded = self.ledger.check(worker, job, event.decision)?;

                let mut matches = Vec::new();
                if event.decision == Decision::Like
                    && self.ledger.has_liked(business, worker)
                    && !self.matched.contains(&(worker, job))
                {
                    matches.push(Match {
                        worker_id: worker,
                        job_id: job,
                        business_id: business,
                    });
                }
                (recorded, matches)
            }
            Actor::Business(business) => {
                if !self.businesses.contains(&business) {
                    return Err(SwipeError::UnknownBusiness(business));
                }
                let worker = event.target;
                if !self.workers.contains(&worker) {
                    return Err(SwipeError::UnknownWorker(worker));
                }
                let recorded = self.ledger.check(business, worker, event.decision)?;

                let mut matches = Vec::new();
                if event.decision == Decision::Like {
                    for &job in self.jobs_by_business.get(&business).into_iter().flatten() {
                        if self.ledger.has_liked(worker, job) && !self.matched.contains(&(worker, job)) {
                            matches.push(Match {
                                worker_id: worker,
                                job_id: job,
                                business_id: business,
                            });
                        }
                    }
                }
                (recorded, matches)
            }
        };

        Ok(SwipePlan {
            event: *event,
            recorded,
            matches,
        })
    }

    /// Apply a plan produced by [`MatchDetector::plan`]
    pub fn commit(&mut self, plan: SwipePlan) -> Result<SwipeOutcome, SwipeError> {
        let SwipeEvent { actor, target, decision } = plan.event;
        let recorded = self.ledger.record(actor.id(), target, decision)?;

        let mut matches = Vec::with_capacity(plan.matches.len());
        for m in plan.matches {
            if self.insert_match(m) {
                info!(
                    pair = %pair_key(m.worker_id, m.job_id),
                    business = %m.business_id,
                    "Match formed"
                );
                matches.push(m);
            }
        }

        debug!(actor = %actor.id(), %target, %decision, "Swipe recorded: {:?}", recorded);
        Ok(SwipeOutcome { recorded, matches })
    }

    pub fn apply(&mut self, event: SwipeEvent) -> Result<SwipeOutcome, SwipeError> {
        let plan = self.plan(&event)?;
        self.commit(plan)
    }

    fn insert_match(&mut self, m: Match) -> bool {
        if !self.matched.insert((m.worker_id, m.job_id)) {
            return false;
        }
        self.matched_jobs.entry(m.worker_id).or_default().insert(m.job_id);
        self.matched_workers.entry(m.business_id).or_default().insert(m.worker_id);
        true
    }

    pub fn pair_state(&self, worker: Uuid, job: Uuid) -> PairState {
        if self.matched.contains(&(worker, job)) {
            return PairState::Matched;
        }
        let owner = self.owner_of(job);
        let worker_liked = self.ledger.has_liked(worker, job);
        let business_liked = owner.is_some_and(|b| self.ledger.has_liked(b, worker));
        let declined = self.ledger.has_disliked(worker, job)
            || owner.is_some_and(|b| self.ledger.has_disliked(b, worker));

        match (worker_liked, business_liked) {
            _ if declined => PairState::Declined,
            (true, true) => PairState::MutualLike,
            (true, false) => PairState::WorkerLiked,
            (false, true) => PairState::BusinessLiked,
            (false, false) => PairState::Unseen,
        }
    }

    pub fn matched_jobs(&self, worker: Uuid) -> Vec<Uuid> {
        self.matched_jobs
            .get(&worker)
            .map(|jobs| jobs.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn matched_workers(&self, business: Uuid) -> Vec<Uuid> {
        self.matched_workers
            .get(&business)
            .map(|workers| workers.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn match_count(&self) -> usize {
        self.matched.len()
    }

    /// Find pairs liked by both sides that have no match recorded yet,
    /// record them and return them for persisting.
    pub fn reconcile(&mut self) -> Vec<Match> {
        let mut missing = Vec::new();
        for (&business, jobs) in &self.jobs_by_business {
            for &worker in self.ledger.liked(business) {
                for &job in jobs {
                    if self.ledger.has_liked(worker, job) && !self.matched.contains(&(worker, job)) {
                        missing.push(Match {
                            worker_id: worker,
                            job_id: job,
                            business_id: business,
                        });
                    }
                }
            }
        }
        for m in &missing {
            self.insert_match(*m);
        }
        if !missing.is_empty() {
            warn!("Reconciliation found {} unrecorded matches", missing.len());
        }
        missing
    }

    /// Register a persisted user together with its recorded decisions and
    /// matches. Worker swipes live in a separate document.
    pub fn load_user(&mut self, user: &User, swipes: Option<WorkerSwipes>) {
        match &user.profile {
            Profile::Worker(worker) => {
                self.register_worker(user.id);
                if let Some(swipes) = swipes {
                    self.ledger
                        .load(user.id, swipes.liked_jobs, disliked_ids(swipes.disliked_jobs));
                }
                for &job in &worker.matched_jobs {
                    if let Some(business) = self.owner_of(job) {
                        self.insert_match(Match {
                            worker_id: user.id,
                            job_id: job,
                            business_id: business,
                        });
                    }
                }
            }
            Profile::Business(business) => {
                self.register_business(user.id);
                self.ledger.load(
                    user.id,
                    business.liked_workers.iter().copied(),
                    disliked_ids(business.disliked_workers.clone()),
                );
            }
        }
    }

    /// Register a persisted job, trusting its stored owner
    pub fn load_job(&mut self, job: &Job) -> Result<(), SwipeError> {
        self.register_business(job.business_id);
        self.register_job(job.id, job.business_id)
    }

    /// Rebuild state from persisted users, jobs and swipe documents.
    ///
    /// Documents that fail to parse are logged and skipped.
    pub async fn hydrate(store: &dyn DocumentStore) -> Result<Self, StoreError> {
        let mut detector = Self::new();

        let mut users = Vec::new();
        for doc in store.list(USERS).await? {
            match serde_json::from_value::<User>(doc.data) {
                Ok(user) => users.push(user),
                Err(e) => warn!("Skipping unreadable user document {}: {}", doc.id, e),
            }
        }

        // owners before jobs, jobs before worker matches
        for user in users.iter().filter(|u| u.role() == Role::Business) {
            detector.load_user(user, None);
        }

        for doc in store.list(JOBS).await? {
            match serde_json::from_value::<Job>(doc.data) {
                Ok(job) => {
                    if !detector.is_business(job.business_id) {
                        warn!("Skipping job {}: owner {} is not a business", job.id, job.business_id);
                        continue;
                    }
                    if let Err(e) = detector.load_job(&job) {
                        warn!("Skipping job {}: {}", job.id, e);
                    }
                }
                Err(e) => warn!("Skipping unreadable job document {}: {}", doc.id, e),
            }
        }

        for user in users.iter().filter(|u| u.role() == Role::Worker) {
            let swipes = match store.get(&DocPath::swipes(user.id)).await? {
                Some(data) => match serde_json::from_value::<WorkerSwipes>(data) {
                    Ok(swipes) => Some(swipes),
                    Err(e) => {
                        warn!("Skipping unreadable swipes of worker {}: {}", user.id, e);
                        None
                    }
                },
                None => None,
            };
            detector.load_user(user, swipes);
        }

        info!(
            "Hydrated match state: {} workers, {} businesses, {} jobs, {} matches",
            detector.workers.len(),
            detector.businesses.len(),
            detector.job_owner.len(),
            detector.matched.len()
        );
        Ok(detector)
    }
}

fn disliked_ids(map: impl IntoIterator<Item = (Uuid, bool)>) -> Vec<Uuid> {
    map.into_iter()
        .filter_map(|(id, flag)| flag.then_some(id))
        .collect()
}
