//! # Ballot Store
//!
//! Ballots live in a `parking_lot::RwLock<BTreeMap>`: reads are parallel,
//! creation takes the write lock just long enough to assign the next id.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use zkvote_core::{BallotId, Clock, Timestamp, VoteError};

use crate::ballot::{Ballot, BallotSpec, BallotStatus};

#[derive(Debug, Default)]
struct Inner {
    ballots: BTreeMap<BallotId, Ballot>,
    last_id: u64,
}

pub struct BallotStore {
    clock: Arc<dyn Clock>,
    inner: RwLock<Inner>,
}

impl std::fmt::Debug for BallotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BallotStore")
            .field("ballots", &self.inner.read().ballots.len())
            .finish()
    }
}

impl BallotStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Validate `spec` and store it under the next ballot id.
    pub fn create(&self, spec: BallotSpec) -> Result<Ballot, VoteError> {
        spec.validate()?;
        let created_at = self.clock.now();
        let mut inner = self.inner.write();
        inner.last_id += 1;
        let id = BallotId(inner.last_id);
        let ballot = Ballot::from_spec(id, spec, created_at);
        inner.ballots.insert(id, ballot.clone());
        drop(inner);

        tracing::info!(ballot = %id, options = ballot.options.len(), "ballot created");
        Ok(ballot)
    }

    pub fn get(&self, id: BallotId) -> Result<Ballot, VoteError> {
        self.inner
            .read()
            .ballots
            .get(&id)
            .cloned()
            .ok_or_else(|| VoteError::NotFound(format!("{id} does not exist")))
    }

    /// Status of ballot `id` at `now`.
    pub fn status_at(&self, id: BallotId, now: Timestamp) -> Result<BallotStatus, VoteError> {
        Ok(self.get(id)?.status(now))
    }

    /// Status of ballot `id` by the store's clock.
    pub fn status(&self, id: BallotId) -> Result<BallotStatus, VoteError> {
        self.status_at(id, self.clock.now())
    }

    /// All ballots in id order.
    pub fn list(&self) -> Vec<Ballot> {
        self.inner.read().ballots.values().cloned().collect()
    }

    /// Drop a ballot that could not be anchored on the ledger. Ids are not
    /// reused.
    pub fn discard(&self, id: BallotId) -> bool {
        self.inner.write().ballots.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.read().ballots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkvote_core::{ErrorKind, ManualClock};

    fn store() -> (Arc<ManualClock>, BallotStore) {
        let clock = Arc::new(ManualClock::new(Timestamp::from_epoch_secs(1_000).unwrap()));
        (clock.clone(), BallotStore::new(clock))
    }

    fn spec(open: i64, close: i64) -> BallotSpec {
        BallotSpec {
            title: "Referendum".to_string(),
            description: "d".to_string(),
            open_at: Timestamp::from_epoch_secs(open).unwrap(),
            close_at: Timestamp::from_epoch_secs(close).unwrap(),
            options: vec!["yes".to_string(), "no".to_string()],
            eligibility_criteria: String::new(),
            public_key: "pk".to_string(),
        }
    }

    #[test]
    fn ids_increase_from_one() {
        let (_, store) = store();
        assert_eq!(store.create(spec(0, 10)).unwrap().id, BallotId(1));
        assert_eq!(store.create(spec(0, 10)).unwrap().id, BallotId(2));
        store.discard(BallotId(2));
        assert_eq!(store.create(spec(0, 10)).unwrap().id, BallotId(3));
        let ids: Vec<_> = store.list().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![BallotId(1), BallotId(3)]);
    }

    #[test]
    fn invalid_spec_stores_nothing() {
        let (_, store) = store();
        let err = store.create(spec(10, 10)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidBallotSpec);
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_ballot_is_not_found() {
        let (_, store) = store();
        assert_eq!(store.get(BallotId(42)).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(store.status(BallotId(42)).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn status_follows_clock() {
        let (clock, store) = store();
        let b = store.create(spec(1_010, 1_020)).unwrap();
        assert_eq!(store.status(b.id).unwrap(), BallotStatus::Created);
        clock.advance_secs(10);
        assert_eq!(store.status(b.id).unwrap(), BallotStatus::Open);
        clock.advance_secs(10);
        assert_eq!(store.status(b.id).unwrap(), BallotStatus::Closed);
        assert_eq!(b.created_at.epoch_secs(), 1_000);
    }
}
