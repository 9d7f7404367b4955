//! The circular record store.
//!
//! A [`CircularStore`] owns a fixed number of slots, a write cursor and a
//! round counter. Appends fill the slots in order; when the cursor would run
//! past the last slot it wraps to slot 0 and the round advances. Readers ask
//! for "everything from slot R of round N to the present" through
//! [`CircularStore::query`].
//!
//! # Design
//!
//! - The `(slots, cursor, round)` triple is guarded by a single mutex. Both
//!   appends and queries hold it for their whole critical section, so a reader
//!   always sees a cursor, a round and slot contents that belong together.
//! - Queries copy the requested records out before releasing the lock.
//! - Overwritten slots are gone: only the current round is queryable.
//!
//! # Query rules
//!
//! | requested round       | result                                           |
//! |-----------------------|--------------------------------------------------|
//! | behind current round  | every populated slot of the current round        |
//! | ahead of current round| [`QueryError::InvalidRound`]                     |
//! | equal, slot <= cursor | slots `slot..=cursor` in ascending order         |
//! | equal, slot > cursor  | [`QueryError::InvalidSlot`]                      |
//!
//! # Example Usage
//!
//! ```rust
//! use roundlog::config::StoreConfig;
//! use roundlog::store::CircularStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CircularStore::new(StoreConfig::new(3)?)?;
//!
//! for i in 0..4 {
//!     store.append(format!("reading {i}"), "2024-01-01 00:00:00", None);
//! }
//!
//! // The fourth append wrapped into round 2.
//! let records = store.query(2, 0)?;
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].payload(), "reading 3");
//!
//! // A caller still on round 1 gets the whole current round.
//! assert_eq!(store.query(1, 2)?, records);
//! # Ok(())
//! # }
//! ```

use std::cmp::Ordering;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::error::{QueryError, Result};
use crate::record::{Entry, Record};

/// Fixed-capacity circular store with a round counter.
///
/// # Thread Safety
///
/// `CircularStore` is `Send + Sync`. Share it behind an `Arc`: one writer
/// calls [`append`](Self::append), any number of readers call
/// [`query`](Self::query) concurrently.
#[derive(Debug)]
pub struct CircularStore {
    capacity: usize,
    state: Mutex<RingState>,
}

/// A consistent view of the write position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// The round currently being written.
    pub round: u64,
    /// The most recently written slot, `None` before the first append.
    pub cursor: Option<usize>,
}

#[derive(Debug)]
struct RingState {
    slots: Vec<Option<Record>>,
    cursor: Option<usize>,
    round: u64,
}

impl RingState {
    /// Moves the cursor to the next slot, wrapping into a new round.
    fn advance(&mut self) -> (u64, usize) {
        let next = self.cursor.map_or(0, |cursor| cursor + 1);
        let slot = if next >= self.slots.len() {
            self.round += 1;
            tracing::debug!(round = self.round, "store wrapped into new round");
            0
        } else {
            next
        };
        self.cursor = Some(slot);
        (self.round, slot)
    }

    /// Clones the populated slots `from..=cursor`.
    fn collect_from(&self, from: usize) -> Vec<Record> {
        match self.cursor {
            Some(cursor) if from <= cursor => {
                self.slots[from..=cursor].iter().flatten().cloned().collect()
            }
            _ => Vec::new(),
        }
    }

    fn cursor_i64(&self) -> i64 {
        self.cursor
            .map_or(-1, |cursor| i64::try_from(cursor).unwrap_or(i64::MAX))
    }
}

impl CircularStore {
    /// Creates an empty store in round 1.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`](crate::error::ConfigError) if the configuration
    /// is invalid.
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_capacity(config.capacity))
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(RingState {
                slots: vec![None; capacity],
                cursor: None,
                round: 1,
            }),
        }
    }

    /// Returns the number of slots per round.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the current round and cursor as one consistent snapshot.
    pub fn position(&self) -> Position {
        let state = self.state.lock();
        Position {
            round: state.round,
            cursor: state.cursor,
        }
    }

    /// Returns `true` if nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.state.lock().cursor.is_none()
    }

    /// Appends a record to the next slot and returns a copy of it.
    ///
    /// Advances the cursor, wrapping to slot 0 and incrementing the round when
    /// the last slot has been written. Never fails.
    pub fn append(
        &self,
        payload: impl Into<String>,
        timestamp: impl Into<String>,
        resource_url: Option<String>,
    ) -> Record {
        let entry = Entry::new(payload, timestamp, resource_url);
        self.append_with(move |_, _| entry)
    }

    /// Appends a record whose contents depend on its own position.
    ///
    /// `build` receives the `(round, slot)` the record is about to be written
    /// to and runs while the store is locked, so it must be short and must not
    /// call back into the store.
    pub fn append_with<F>(&self, build: F) -> Record
    where
        F: FnOnce(u64, usize) -> Entry,
    {
        let mut state = self.state.lock();
        let (round, slot) = state.advance();
        let record = Record::new(round, slot, build(round, slot));
        state.slots[slot] = Some(record.clone());
        record
    }

    /// Returns records from the current round starting at the caller's
    /// position.
    ///
    /// Coordinates are signed because they usually come straight from caller
    /// input. A round behind the current one (including zero or negative) is
    /// stale: the slot is ignored and the whole current round is returned.
    ///
    /// # Errors
    ///
    /// - [`QueryError::InvalidRound`] if `round` is ahead of the current round.
    /// - [`QueryError::InvalidSlot`] if `round` is current and `slot` is
    ///   negative or past the cursor.
    pub fn query(&self, round: i64, slot: i64) -> Result<Vec<Record>> {
        let state = self.state.lock();

        let ordering = u64::try_from(round).map_or(Ordering::Less, |r| r.cmp(&state.round));
        match ordering {
            Ordering::Less => Ok(state.collect_from(0)),
            Ordering::Greater => Err(QueryError::InvalidRound {
                requested: round,
                current: state.round,
            }
            .into()),
            Ordering::Equal => {
                let from = usize::try_from(slot)
                    .ok()
                    .filter(|from| state.cursor.is_some_and(|cursor| *from <= cursor));
                match from {
                    Some(from) => Ok(state.collect_from(from)),
                    None => Err(QueryError::InvalidSlot {
                        requested: slot,
                        current: state.cursor_i64(),
                    }
                    .into()),
                }
            }
        }
    }
}

impl Default for CircularStore {
    fn default() -> Self {
        Self::with_capacity(StoreConfig::default().capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoundlogError;

    fn create_test_store(capacity: usize) -> CircularStore {
        CircularStore::new(StoreConfig::new(capacity).unwrap()).unwrap()
    }

    fn fill(store: &CircularStore, count: usize) -> Vec<Record> {
        (0..count)
            .map(|i| store.append(format!("r{i}"), "2024-01-01 00:00:00", None))
            .collect()
    }

    #[test]
    fn test_empty_store() {
        let store = create_test_store(10);

        assert!(store.is_empty());
        assert_eq!(store.capacity(), 10);
        assert_eq!(store.position(), Position { round: 1, cursor: None });
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = CircularStore::new(StoreConfig { capacity: 0 }).unwrap_err();
        assert!(matches!(err, RoundlogError::Config(_)));
        assert_eq!(CircularStore::default().capacity(), 100);
    }

    #[test]
    fn test_single_append() {
        let store = create_test_store(10);

        let record = store.append("hello", "2024-01-01 00:00:00", Some("http://x/a.png".into()));

        assert!(!store.is_empty());
        assert_eq!(record.round(), 1);
        assert_eq!(record.slot(), 0);
        assert_eq!(record.payload(), "hello");
        assert_eq!(store.position(), Position { round: 1, cursor: Some(0) });
    }

    #[test]
    fn test_wraparound() {
        let store = create_test_store(3);

        let records = fill(&store, 3);
        assert_eq!(records.iter().map(Record::slot).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(store.position(), Position { round: 1, cursor: Some(2) });

        let wrapped = store.append("r3", "t", None);
        assert_eq!(wrapped.round(), 2);
        assert_eq!(wrapped.slot(), 0);
        assert_eq!(store.position(), Position { round: 2, cursor: Some(0) });
    }

    #[test]
    fn test_capacity_one_wraps_every_append() {
        let store = create_test_store(1);

        for expected_round in 1..=5 {
            let record = store.append("x", "t", None);
            assert_eq!(record.round(), expected_round);
            assert_eq!(record.slot(), 0);
        }
    }

    #[test]
    fn test_append_with_sees_own_position() {
        let store = create_test_store(2);

        for _ in 0..3 {
            store.append_with(|round, slot| Entry::new(format!("{round} + {slot}"), "t", None));
        }

        let records = store.query(2, 0).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload(), "2 + 0");
    }

    #[test]
    fn test_query_current_round_range() {
        let store = create_test_store(10);
        let written = fill(&store, 5);

        assert_eq!(store.query(1, 0).unwrap(), written);
        assert_eq!(store.query(1, 3).unwrap(), written[3..].to_vec());
        assert_eq!(store.query(1, 4).unwrap(), written[4..].to_vec());
    }

    #[test]
    fn test_query_slot_past_cursor() {
        let store = create_test_store(10);
        fill(&store, 5);

        let err = store.query(1, 5).unwrap_err();
        assert!(matches!(
            err,
            RoundlogError::Query(QueryError::InvalidSlot { requested: 5, current: 4 })
        ));
    }

    #[test]
    fn test_query_negative_slot_in_current_round() {
        let store = create_test_store(10);
        fill(&store, 2);

        let err = store.query(1, -1).unwrap_err();
        assert!(matches!(
            err,
            RoundlogError::Query(QueryError::InvalidSlot { requested: -1, current: 1 })
        ));
    }

    #[test]
    fn test_query_empty_store() {
        let store = create_test_store(4);

        let err = store.query(1, 0).unwrap_err();
        assert!(matches!(
            err,
            RoundlogError::Query(QueryError::InvalidSlot { requested: 0, current: -1 })
        ));

        // A stale round on an empty store is an empty dump, not an error.
        assert!(store.query(0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_query_round_ahead() {
        let store = create_test_store(10);
        fill(&store, 1);

        let err = store.query(2, 0).unwrap_err();
        assert!(matches!(
            err,
            RoundlogError::Query(QueryError::InvalidRound { requested: 2, current: 1 })
        ));
    }

    #[test]
    fn test_query_stale_round_ignores_slot() {
        let store = create_test_store(3);
        fill(&store, 5); // round 2, cursor 1

        let expected = store.query(2, 0).unwrap();
        assert_eq!(expected.len(), 2);

        for slot in [-5, 0, 1, 2, 9999] {
            assert_eq!(store.query(1, slot).unwrap(), expected);
        }
        assert_eq!(store.query(-3, 0).unwrap(), expected);
        assert_eq!(store.query(i64::MIN, i64::MAX).unwrap(), expected);
    }

    #[test]
    fn test_query_results_are_snapshots() {
        let store = create_test_store(2);
        fill(&store, 2);

        let before = store.query(1, 0).unwrap();
        fill(&store, 2); // overwrites both slots in round 2

        assert_eq!(before.len(), 2);
        assert!(before.iter().all(|r| r.round() == 1));
        assert!(store.query(2, 0).unwrap().iter().all(|r| r.round() == 2));
    }
}
