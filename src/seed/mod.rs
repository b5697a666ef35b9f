pub mod fake;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::db::{BatchReport, DocPath, DocumentStore, RecordBatcher, StoreError, WriteOp, MAX_OPS_PER_BATCH};
use crate::ids::id_from_rng;
use crate::matching::{Decision, Match, MatchDetector, SwipeError, SwipeEvent};
use crate::models::{Job, User};

/// Why a generated record was dropped before reaching the batcher
#[derive(Debug, thiserror::Error)]
pub enum RecordRejected {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("referential check failed: {0}")]
    Referential(#[from] SwipeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub num_workers: usize,
    pub num_businesses: usize,
    pub num_jobs: usize,
    /// Fixed seed for a reproducible population, ids included
    pub rng_seed: Option<u64>,
    pub business_swipes: bool,
    pub batch_max_ops: usize,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            num_workers: 10,
            num_businesses: 5,
            num_jobs: 20,
            rng_seed: None,
            business_swipes: true,
            batch_max_ops: MAX_OPS_PER_BATCH,
        }
    }
}

/// Summary of one population run
#[derive(Debug, Default, Serialize)]
pub struct PopulationReport {
    pub workers: usize,
    pub businesses: usize,
    pub jobs: usize,
    pub rejected: usize,
    pub swipes: usize,
    pub likes: usize,
    pub matches: usize,
    pub batches: BatchReport,
}

/// Populates users, then jobs, then swipes through one [`RecordBatcher`].
///
/// Every swipe goes through a [`MatchDetector`], so reciprocal likes leave
/// the store with the matches they imply.
pub struct SeedOrchestrator {
    options: SeedOptions,
    rng: StdRng,
    detector: MatchDetector,
    report: PopulationReport,
}

impl SeedOrchestrator {
    pub fn new(options: SeedOptions) -> Self {
        let rng = match options.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            options,
            rng,
            detector: MatchDetector::new(),
            report: PopulationReport::default(),
        }
    }

    pub async fn run(mut self, store: &dyn DocumentStore) -> PopulationReport {
        info!(
            "Starting population: {} workers, {} businesses, {} jobs",
            self.options.num_workers, self.options.num_businesses, self.options.num_jobs
        );
        let mut batcher = RecordBatcher::with_limit(store, self.options.batch_max_ops);

        let (workers, businesses) = self.populate_users(&mut batcher).await;

        let jobs = if businesses.is_empty() {
            warn!("No business users created, skipping job population");
            Vec::new()
        } else {
            self.populate_jobs(&mut batcher, &businesses).await
        };

        if workers.is_empty() || jobs.is_empty() {
            warn!("Skipping swipe population due to missing workers or jobs");
        } else {
            self.populate_worker_swipes(&mut batcher, &workers, &jobs).await;
            if self.options.business_swipes {
                self.populate_business_swipes(&mut batcher, &businesses, &workers).await;
            }
        }

        self.report.batches = batcher.finalize().await;
        if self.report.batches.is_clean() {
            info!(
                "Population complete: {} users, {} jobs, {} swipes, {} matches",
                self.report.workers + self.report.businesses,
                self.report.jobs,
                self.report.swipes,
                self.report.matches
            );
        } else {
            warn!(
                "Population finished with {} of {} chunks failed",
                self.report.batches.chunks_failed, self.report.batches.chunks_attempted
            );
        }
        self.report
    }

    async fn populate_users(&mut self, batcher: &mut RecordBatcher<'_>) -> (Vec<Uuid>, Vec<Uuid>) {
        let mut workers = Vec::with_capacity(self.options.num_workers);
        let mut businesses = Vec::with_capacity(self.options.num_businesses);

        for n in 0..self.options.num_workers {
            let id = id_from_rng(&mut self.rng);
            let user = fake::worker(&mut self.rng, id, n);
            match self.stage_user(batcher, &user).await {
                Ok(()) => {
                    self.detector.register_worker(user.id);
                    workers.push(user.id);
                }
                Err(e) => self.reject("worker", user.id, e),
            }
        }

        for n in 0..self.options.num_businesses {
            let id = id_from_rng(&mut self.rng);
            let user = fake::business(&mut self.rng, id, self.options.num_workers + n);
            match self.stage_user(batcher, &user).await {
                Ok(()) => {
                    self.detector.register_business(user.id);
                    businesses.push(user.id);
                }
                Err(e) => self.reject("business", user.id, e),
            }
        }

        self.report.workers = workers.len();
        self.report.businesses = businesses.len();
        info!("Staged {} workers and {} businesses", workers.len(), businesses.len());
        (workers, businesses)
    }

    async fn stage_user(&self, batcher: &mut RecordBatcher<'_>, user: &User) -> Result<(), RecordRejected> {
        user.validate()?;
        let op = WriteOp::set(DocPath::user(user.id), user)?
            .with_server_timestamp("created_at")
            .with_server_timestamp("last_updated_at");
        batcher.push(op).await;
        Ok(())
    }

    async fn populate_jobs(&mut self, batcher: &mut RecordBatcher<'_>, businesses: &[Uuid]) -> Vec<Uuid> {
        let mut jobs = Vec::with_capacity(self.options.num_jobs);
        for _ in 0..self.options.num_jobs {
            let Some(&owner) = businesses.choose(&mut self.rng) else {
                break;
            };
            let id = id_from_rng(&mut self.rng);
            let job = fake::job(&mut self.rng, id, owner);
            match self.stage_job(batcher, &job).await {
                Ok(()) => jobs.push(job.id),
                Err(e) => self.reject("job", job.id, e),
            }
        }
        self.report.jobs = jobs.len();
        info!("Staged {} jobs", jobs.len());
        jobs
    }

    /// Validate a job and check its owner before anything is enqueued
    pub async fn stage_job(&mut self, batcher: &mut RecordBatcher<'_>, job: &Job) -> Result<(), RecordRejected> {
        job.validate()?;
        let op = WriteOp::set(DocPath::job(job.id), job)?
            .with_server_timestamp("created_at")
            .with_server_timestamp("updated_at");
        self.detector.register_job(job.id, job.business_id)?;
        batcher.push(op).await;
        Ok(())
    }

    /// Each worker swipes on 30-80% of the jobs and likes 20-70% of those
    async fn populate_worker_swipes(&mut self, batcher: &mut RecordBatcher<'_>, workers: &[Uuid], jobs: &[Uuid]) {
        let mut applicants: HashMap<Uuid, Vec<Value>> = HashMap::new();

        for &worker in workers {
            let (liked, disliked) = self.split_sample(jobs);
            let events = liked
                .iter()
                .map(|&job| SwipeEvent::worker(worker, job, Decision::Like))
                .chain(disliked.iter().map(|&job| SwipeEvent::worker(worker, job, Decision::Dislike)));
            let matches = self.apply_all(events.collect());

            for &job in &liked {
                applicants.entry(job).or_default().push(json!(worker));
            }

            let mut group = vec![self.detector.ledger().worker_swipes_op(worker)];
            group.extend(matches.iter().flat_map(Match::write_ops));
            batcher.push_group(group).await;
        }

        for &job in jobs {
            if let Some(workers) = applicants.remove(&job) {
                let op = WriteOp::merge(DocPath::job(job), Map::new()).with_array_union("applicants", workers);
                batcher.push(op).await;
            }
        }
    }

    /// Each business swipes on 30-80% of the workers and likes 20-70% of those
    async fn populate_business_swipes(
        &mut self,
        batcher: &mut RecordBatcher<'_>,
        businesses: &[Uuid],
        workers: &[Uuid],
    ) {
        for &business in businesses {
            let (liked, disliked) = self.split_sample(workers);
            let events = liked
                .iter()
                .map(|&worker| SwipeEvent::business(business, worker, Decision::Like))
                .chain(disliked.iter().map(|&worker| SwipeEvent::business(business, worker, Decision::Dislike)));
            let matches = self.apply_all(events.collect());

            let mut group = vec![self.detector.ledger().business_swipes_op(business)];
            group.extend(matches.iter().flat_map(Match::write_ops));
            batcher.push_group(group).await;
        }
    }

    /// Random sample of `targets`, split into (liked, disliked)
    fn split_sample(&mut self, targets: &[Uuid]) -> (Vec<Uuid>, Vec<Uuid>) {
        let n = targets.len();
        let swiped = self
            .rng
            .gen_range(n * 3 / 10..=n * 8 / 10)
            .max(1)
            .min(n);
        let mut sample: Vec<Uuid> = targets.choose_multiple(&mut self.rng, swiped).copied().collect();
        let likes = self.rng.gen_range(swiped * 2 / 10..=swiped * 7 / 10);
        let disliked = sample.split_off(likes);
        (sample, disliked)
    }

    fn apply_all(&mut self, events: Vec<SwipeEvent>) -> Vec<Match> {
        let mut matches = Vec::new();
        for event in events {
            match self.detector.apply(event) {
                Ok(outcome) => {
                    self.report.swipes += 1;
                    if event.decision == Decision::Like {
                        self.report.likes += 1;
                    }
                    self.report.matches += outcome.matches.len();
                    matches.extend(outcome.matches);
                }
                Err(e) => warn!("Skipping swipe {:?}: {}", event, e),
            }
        }
        matches
    }

    fn reject(&mut self, kind: &str, id: Uuid, err: RecordRejected) {
        warn!("Rejected generated {} {}: {}", kind, id, err);
        self.report.rejected += 1;
    }
}
