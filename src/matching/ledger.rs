use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

use crate::db::{DocPath, WriteOp};
use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Like,
    Dislike,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Like => f.write_str("like"),
            Decision::Dislike => f.write_str("dislike"),
        }
    }
}

/// Raised when an actor tries to both like and dislike the same target
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{actor} already recorded {existing} for {target}")]
pub struct InconsistentDecision {
    pub actor: Uuid,
    pub target: Uuid,
    pub existing: Decision,
}

/// Whether a record call changed the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recorded {
    New,
    AlreadyRecorded,
}

/// Insertion-ordered, duplicate-free id list.
///
/// Inserts are amortized O(1), membership is O(1); re-inserting an id
/// keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikedList {
    order: Vec<Uuid>,
    index: HashSet<Uuid>,
}

impl LikedList {
    /// Returns false if the id was already present
    pub fn insert(&mut self, id: Uuid) -> bool {
        if self.index.insert(id) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.index.contains(id)
    }

    pub fn as_slice(&self) -> &[Uuid] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl FromIterator<Uuid> for LikedList {
    fn from_iter<I: IntoIterator<Item = Uuid>>(iter: I) -> Self {
        let mut list = LikedList::default();
        for id in iter {
            list.insert(id);
        }
        list
    }
}

/// One actor's decisions; `liked` and `disliked` never overlap
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwipeRecord {
    pub liked: LikedList,
    pub disliked: BTreeSet<Uuid>,
}

/// Persisted swipe document of a worker (`users/{id}/swipes/data`)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkerSwipes {
    #[serde(default)]
    pub liked_jobs: Vec<Uuid>,
    #[serde(default)]
    pub disliked_jobs: BTreeMap<Uuid, bool>,
}

/// Like/dislike decisions of every actor, keyed by actor id
#[derive(Debug, Clone, Default)]
pub struct SwipeLedger {
    records: HashMap<Uuid, SwipeRecord>,
}

impl SwipeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_like(&mut self, actor: Uuid, target: Uuid) -> Result<Recorded, InconsistentDecision> {
        self.record(actor, target, Decision::Like)
    }

    pub fn record_dislike(&mut self, actor: Uuid, target: Uuid) -> Result<Recorded, InconsistentDecision> {
        self.record(actor, target, Decision::Dislike)
    }

    /// Record a decision. Repeating a decision is a no-op; contradicting one
    /// fails and leaves the ledger untouched.
    pub fn record(
        &mut self,
        actor: Uuid,
        target: Uuid,
        decision: Decision,
    ) -> Result<Recorded, InconsistentDecision> {
        let outcome = self.check(actor, target, decision)?;
        if outcome == Recorded::New {
            let record = self.records.entry(actor).or_default();
            match decision {
                Decision::Like => {
                    record.liked.insert(target);
                }
                Decision::Dislike => {
                    record.disliked.insert(target);
                }
            }
        }
        Ok(outcome)
    }

    /// What `record` would do, without doing it
    pub fn check(
        &self,
        actor: Uuid,
        target: Uuid,
        decision: Decision,
    ) -> Result<Recorded, InconsistentDecision> {
        let (same, opposite) = match decision {
            Decision::Like => (self.has_liked(actor, target), self.has_disliked(actor, target)),
            Decision::Dislike => (self.has_disliked(actor, target), self.has_liked(actor, target)),
        };
        if opposite {
            let existing = match decision {
                Decision::Like => Decision::Dislike,
                Decision::Dislike => Decision::Like,
            };
            return Err(InconsistentDecision {
                actor,
                target,
                existing,
            });
        }
        Ok(if same { Recorded::AlreadyRecorded } else { Recorded::New })
    }

    pub fn has_liked(&self, actor: Uuid, target: Uuid) -> bool {
        self.records
            .get(&actor)
            .is_some_and(|record| record.liked.contains(&target))
    }

    pub fn has_disliked(&self, actor: Uuid, target: Uuid) -> bool {
        self.records
            .get(&actor)
            .is_some_and(|record| record.disliked.contains(&target))
    }

    pub fn liked(&self, actor: Uuid) -> &[Uuid] {
        self.records
            .get(&actor)
            .map(|record| record.liked.as_slice())
            .unwrap_or(&[])
    }

    pub fn disliked(&self, actor: Uuid) -> Vec<Uuid> {
        self.records
            .get(&actor)
            .map(|record| record.disliked.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Load persisted decisions. Ids found in both collections keep the like,
    /// since a like may already back a match.
    pub fn load(
        &mut self,
        actor: Uuid,
        liked: impl IntoIterator<Item = Uuid>,
        disliked: impl IntoIterator<Item = Uuid>,
    ) {
        let record = self.records.entry(actor).or_default();
        for id in liked {
            record.disliked.remove(&id);
            record.liked.insert(id);
        }
        for id in disliked {
            if !record.liked.contains(&id) {
                record.disliked.insert(id);
            }
        }
    }

    /// Full swipe document of a worker, as a merge write
    pub fn worker_swipes_op(&self, worker: Uuid) -> WriteOp {
        let disliked: Map<String, Value> = self
            .disliked(worker)
            .into_iter()
            .map(|id| (id.to_string(), Value::Bool(true)))
            .collect();

        let mut data = Map::new();
        data.insert("liked_jobs".to_string(), json!(self.liked(worker)));
        data.insert("disliked_jobs".to_string(), Value::Object(disliked));
        WriteOp::merge(DocPath::swipes(worker), data)
    }

    /// Business decisions live on the business's user document
    pub fn business_swipes_op(&self, business: Uuid) -> WriteOp {
        let disliked: Map<String, Value> = self
            .disliked(business)
            .into_iter()
            .map(|id| (id.to_string(), Value::Bool(true)))
            .collect();

        let mut data = Map::new();
        data.insert("liked_workers".to_string(), json!(self.liked(business)));
        data.insert("disliked_workers".to_string(), Value::Object(disliked));
        WriteOp::merge(DocPath::user(business), data).with_server_timestamp("last_updated_at")
    }
}

/// Incremental write persisting one new decision
pub fn decision_op(role: Role, actor: Uuid, target: Uuid, decision: Decision) -> WriteOp {
    let (path, liked_field, disliked_field) = match role {
        Role::Worker => (DocPath::swipes(actor), "liked_jobs", "disliked_jobs"),
        Role::Business => (DocPath::user(actor), "liked_workers", "disliked_workers"),
    };

    match decision {
        Decision::Like => WriteOp::merge(path, Map::new())
            .with_array_union(liked_field, vec![json!(target)]),
        Decision::Dislike => {
            let mut entry = Map::new();
            entry.insert(target.to_string(), Value::Bool(true));
            let mut data = Map::new();
            data.insert(disliked_field.to_string(), Value::Object(entry));
            WriteOp::merge(path, data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{apply_write, WriteMode};
    use chrono::Utc;

    #[test]
    fn like_is_visible_and_not_disliked() {
        let mut ledger = SwipeLedger::new();
        let (actor, target) = (Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(ledger.record_like(actor, target), Ok(Recorded::New));

        assert!(ledger.has_liked(actor, target));
        assert!(!ledger.has_disliked(actor, target));
    }

    #[test]
    fn dislike_is_visible_and_not_liked() {
        let mut ledger = SwipeLedger::new();
        let (actor, target) = (Uuid::new_v4(), Uuid::new_v4());

        ledger.record_dislike(actor, target).unwrap();

        assert!(ledger.has_disliked(actor, target));
        assert!(!ledger.has_liked(actor, target));
    }

    #[test]
    fn repeated_like_leaves_state_unchanged() {
        let mut ledger = SwipeLedger::new();
        let (actor, target) = (Uuid::new_v4(), Uuid::new_v4());

        ledger.record_like(actor, target).unwrap();
        let once = ledger.liked(actor).to_vec();
        assert_eq!(ledger.record_like(actor, target), Ok(Recorded::AlreadyRecorded));

        assert_eq!(ledger.liked(actor), once.as_slice());
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn dislike_after_like_is_rejected_and_like_kept() {
        let mut ledger = SwipeLedger::new();
        let (actor, target) = (Uuid::new_v4(), Uuid::new_v4());
        ledger.record_like(actor, target).unwrap();

        let err = ledger.record_dislike(actor, target).unwrap_err();

        assert_eq!(err.existing, Decision::Like);
        assert!(ledger.has_liked(actor, target));
        assert!(!ledger.has_disliked(actor, target));
    }

    #[test]
    fn like_after_dislike_is_rejected() {
        let mut ledger = SwipeLedger::new();
        let (actor, target) = (Uuid::new_v4(), Uuid::new_v4());
        ledger.record_dislike(actor, target).unwrap();

        assert!(ledger.record_like(actor, target).is_err());
        assert!(ledger.has_disliked(actor, target));
    }

    #[test]
    fn liked_list_keeps_insertion_order() {
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let mut list: LikedList = ids.iter().copied().collect();

        assert!(!list.insert(ids[2]));
        assert_eq!(list.as_slice(), ids.as_slice());
        assert_eq!(list.len(), 5);
    }

    #[test]
    fn load_keeps_collections_disjoint() {
        let mut ledger = SwipeLedger::new();
        let (actor, a, b) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        ledger.load(actor, vec![a], vec![a, b]);

        assert!(ledger.has_liked(actor, a));
        assert!(!ledger.has_disliked(actor, a));
        assert!(ledger.has_disliked(actor, b));
    }

    #[test]
    fn worker_swipes_op_matches_document_shape() {
        let mut ledger = SwipeLedger::new();
        let (worker, liked, disliked) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        ledger.record_like(worker, liked).unwrap();
        ledger.record_dislike(worker, disliked).unwrap();

        let op = ledger.worker_swipes_op(worker);
        let doc = apply_write(None, &op, Utc::now());
        let parsed: WorkerSwipes = serde_json::from_value(doc).unwrap();

        assert_eq!(op.path, DocPath::swipes(worker));
        assert_eq!(op.mode, WriteMode::Merge);
        assert_eq!(parsed.liked_jobs, vec![liked]);
        assert_eq!(parsed.disliked_jobs.get(&disliked), Some(&true));
    }

    #[test]
    fn incremental_ops_accumulate_in_the_document() {
        let (worker, j1, j2, j3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();

        let doc = apply_write(None, &decision_op(Role::Worker, worker, j1, Decision::Like), now);
        let doc = apply_write(Some(doc), &decision_op(Role::Worker, worker, j2, Decision::Like), now);
        let doc = apply_write(Some(doc), &decision_op(Role::Worker, worker, j3, Decision::Dislike), now);
        let parsed: WorkerSwipes = serde_json::from_value(doc).unwrap();

        assert_eq!(parsed.liked_jobs, vec![j1, j2]);
        assert_eq!(parsed.disliked_jobs.len(), 1);
    }
}
