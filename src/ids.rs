use rand::Rng;
use uuid::{Builder, Uuid};

/// Allocate a fresh document id.
///
/// Ids are random v4 UUIDs, so allocation needs no shared counter and two
/// processes seeding the same store will not collide.
pub fn new_id() -> Uuid {
    Uuid::new_v4()
}

/// Id drawn from a caller-supplied generator, for reproducible seeding.
pub fn id_from_rng<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    Builder::from_random_bytes(rng.gen()).into_uuid()
}

/// Composite key identifying one (worker, job) pair.
pub fn pair_key(worker_id: Uuid, job_id: Uuid) -> String {
    format!("{}:{}", worker_id, job_id)
}
