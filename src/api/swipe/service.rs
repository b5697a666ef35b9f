use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::{PairResponse, SwipeResponse};
use crate::api::records;
use crate::db::SharedStore;
use crate::error::ServiceError;
use crate::matching::{Actor, MatchDetector, SharedDetector, SwipeError, SwipeEvent};
use crate::models::Role;

/// Drives swipe events through the match detector and persists their effects
pub struct SwipeService {
    store: SharedStore,
    detector: SharedDetector,
}

impl SwipeService {
    pub fn new(store: SharedStore, detector: SharedDetector) -> Self {
        Self { store, detector }
    }

    /// Record one decision and any match it completes.
    ///
    /// The detector lock is held from planning until the plan is committed,
    /// and the plan is committed in memory only after its writes landed.
    pub async fn swipe(&self, event: SwipeEvent) -> Result<SwipeResponse, ServiceError> {
        let mut detector = self.detector.lock().await;

        let plan = match detector.plan(&event) {
            Ok(plan) => plan,
            Err(SwipeError::UnknownWorker(_) | SwipeError::UnknownBusiness(_) | SwipeError::UnknownJob(_)) => {
                self.load_missing(&mut detector, &event).await?;
                detector.plan(&event)?
            }
            Err(e) => return Err(e.into()),
        };

        // all writes of one event commit together
        let ops = plan.write_ops();
        if !ops.is_empty() {
            if let Err(e) = self.store.commit(&ops).await {
                error!(
                    actor = %event.actor.id(),
                    target = %event.target,
                    "Failed to persist {} swipe operations: {}",
                    ops.len(),
                    e
                );
                return Err(e.into());
            }
        }

        let outcome = detector.commit(plan)?;
        let state = match event.actor {
            Actor::Worker(worker) => Some(detector.pair_state(worker, event.target)),
            Actor::Business(_) => None,
        };

        if !outcome.matches.is_empty() {
            info!("Service: Swipe by {} formed {} match(es)", event.actor.id(), outcome.matches.len());
        }
        Ok(SwipeResponse {
            event,
            recorded: outcome.recorded,
            matches: outcome.matches,
            state,
        })
    }

    pub async fn pair(&self, worker: Uuid, job: Uuid) -> Result<PairResponse, ServiceError> {
        let mut detector = self.detector.lock().await;
        self.load_pair(&mut detector, worker, job).await?;

        if !detector.is_worker(worker) {
            return Err(ServiceError::NotFound(format!("Worker with id {}", worker)));
        }
        if detector.owner_of(job).is_none() {
            return Err(ServiceError::NotFound(format!("Job with id {}", job)));
        }
        Ok(PairResponse {
            worker_id: worker,
            job_id: job,
            state: detector.pair_state(worker, job),
        })
    }

    /// Pull users and jobs created after start-up into the detector
    async fn load_missing(&self, detector: &mut MatchDetector, event: &SwipeEvent) -> Result<(), ServiceError> {
        match event.actor {
            Actor::Worker(worker) => self.load_pair(detector, worker, event.target).await,
            Actor::Business(business) => {
                self.load_user(detector, business).await?;
                self.load_user(detector, event.target).await
            }
        }
    }

    async fn load_pair(&self, detector: &mut MatchDetector, worker: Uuid, job: Uuid) -> Result<(), ServiceError> {
        if detector.owner_of(job).is_none() {
            if let Some(job) = records::fetch_job(self.store.as_ref(), job).await? {
                self.load_user(detector, job.business_id).await?;
                if detector.is_business(job.business_id) {
                    if let Err(e) = detector.load_job(&job) {
                        warn!("Service: Could not register job {}: {}", job.id, e);
                    }
                }
            }
        }
        self.load_user(detector, worker).await
    }

    async fn load_user(&self, detector: &mut MatchDetector, id: Uuid) -> Result<(), ServiceError> {
        if detector.is_worker(id) || detector.is_business(id) {
            return Ok(());
        }
        let Some(user) = records::fetch_user(self.store.as_ref(), id).await? else {
            return Ok(());
        };
        let swipes = match user.role() {
            Role::Worker => records::fetch_swipes(self.store.as_ref(), id).await?,
            Role::Business => None,
        };
        info!("Service: Loading {} {} into match state", user.role(), id);
        detector.load_user(&user, swipes);
        Ok(())
    }
}
