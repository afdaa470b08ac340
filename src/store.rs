// Puzzle record storage
// every mutating op is one atomic unit per puzzle code

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleRecord {
    pub stars: u64,
    pub solves: u64,
    pub sum_time: u64,
    pub min_time: u32,
    pub last_updated: DateTime<Utc>,
}

impl PuzzleRecord {
    /// Record for the first solve of a puzzle.
    pub fn first_solve(time: u32, now: DateTime<Utc>) -> Self {
        Self {
            stars: 0,
            solves: 1,
            sum_time: u64::from(time),
            min_time: time,
            last_updated: now,
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt record for {code}: {reason}")]
    Corrupt { code: String, reason: String },
}

pub trait PuzzleStore: Send + Sync {
    fn find(&self, code: &str) -> Result<Option<PuzzleRecord>, StoreError>;

    /// Adds one solve to an existing record: `solves += 1`,
    /// `sum_time += time`, `min_time = min(min_time, time)`.
    /// Returns `false` when no record exists for `code`.
    fn increment_solve(&self, code: &str, time: u32, now: DateTime<Utc>)
    -> Result<bool, StoreError>;

    /// Returns `false` if a record was already there.
    fn insert_if_absent(&self, code: &str, record: PuzzleRecord) -> Result<bool, StoreError>;

    /// Returns `false` when no record exists for `code`.
    fn increment_stars(&self, code: &str, now: DateTime<Utc>) -> Result<bool, StoreError>;
}

// In-process store - each op holds the DashMap shard lock for its key
#[derive(Default)]
pub struct MemoryStore {
    puzzles: DashMap<String, PuzzleRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            puzzles: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }
}

impl PuzzleStore for MemoryStore {
    fn find(&self, code: &str) -> Result<Option<PuzzleRecord>, StoreError> {
        Ok(self.puzzles.get(code).map(|record| record.value().clone()))
    }

    fn increment_solve(
        &self,
        code: &str,
        time: u32,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let Some(mut record) = self.puzzles.get_mut(code) else {
            return Ok(false);
        };

        // all or nothing
        let (Some(solves), Some(sum_time)) = (
            record.solves.checked_add(1),
            record.sum_time.checked_add(u64::from(time)),
        ) else {
            return Err(StoreError::Corrupt {
                code: code.to_string(),
                reason: "counter overflow".to_string(),
            });
        };

        record.solves = solves;
        record.sum_time = sum_time;
        record.min_time = record.min_time.min(time);
        record.last_updated = now;
        Ok(true)
    }

    fn insert_if_absent(&self, code: &str, record: PuzzleRecord) -> Result<bool, StoreError> {
        match self.puzzles.entry(code.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    fn increment_stars(&self, code: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let Some(mut record) = self.puzzles.get_mut(code) else {
            return Ok(false);
        };
        record.stars = record.stars.saturating_add(1);
        record.last_updated = now;
        Ok(true)
    }
}
