// Solve times get clipped to MIN_TIME..=MAX_TIME seconds
// A time that is present but unparseable counts as MIN_TIME, it is never rejected

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::store::{PuzzleRecord, PuzzleStore, StoreError};

pub const MIN_TIME: u32 = 1;
pub const MAX_TIME: u32 = 3600;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Puzzle not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

// What GET /puzzle/stats returns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PuzzleStats {
    pub code: String,
    pub stars: u64,
    pub solves: u64,
    pub min_time: u32,
    pub avg_time: f64,
}

pub fn clip_seconds(seconds: i64) -> u32 {
    seconds.clamp(i64::from(MIN_TIME), i64::from(MAX_TIME)) as u32
}

// Clip a raw JSON time value into seconds
// floats truncate first, booleans count as 1 or 0
pub fn clip_time(raw: &Value) -> u32 {
    let seconds = match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_int(s),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    };
    seconds.map_or(MIN_TIME, clip_seconds)
}

// integer text like " 42 ", "-7" or "1_000"; anything else is not a number
fn parse_int(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    // underscores only as single separators between digits
    if body.is_empty()
        || body.starts_with('_')
        || body.ends_with('_')
        || body.contains("__")
        || !body.bytes().all(|b| b.is_ascii_digit() || b == b'_')
    {
        return None;
    }

    let digits: String = body.chars().filter(|&c| c != '_').collect();
    match digits.parse::<i64>() {
        Ok(n) if negative => Some(-n),
        Ok(n) => Some(n),
        // all digits but too long for i64
        Err(_) if negative => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}

// one decimal place, halves go to the even digit of the exact value
pub fn average_time(sum_time: u64, solves: u64) -> f64 {
    if solves == 0 {
        return 0.0;
    }
    let avg = sum_time as f64 / solves as f64;
    format!("{avg:.1}").parse().unwrap_or(avg)
}

fn require_code<'a>(code: Option<&'a str>, message: &'static str) -> Result<&'a str, StatsError> {
    match code {
        Some(code) if !code.is_empty() => Ok(code),
        _ => Err(StatsError::Validation(message)),
    }
}

pub struct StatsAggregator {
    store: Arc<dyn PuzzleStore>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn PuzzleStore>) -> Self {
        Self { store }
    }

    pub fn submit_solve(&self, code: Option<&str>, raw_time: Option<&Value>) -> Result<(), StatsError> {
        let code = require_code(code, "Missing required fields")?;
        let raw_time = match raw_time {
            Some(Value::Null) | None => return Err(StatsError::Validation("Missing required fields")),
            Some(raw) => raw,
        };

        let time = clip_time(raw_time);
        let now = Utc::now();

        // Update first; if the record is missing try to create it. Losing the
        // create race means someone else inserted, so the update now matches.
        loop {
            if self.store.increment_solve(code, time, now)? {
                break;
            }
            if self.store.insert_if_absent(code, PuzzleRecord::first_solve(time, now))? {
                debug!(code, time, "Created puzzle record");
                break;
            }
        }
        Ok(())
    }

    pub fn submit_star(&self, code: Option<&str>) -> Result<(), StatsError> {
        let code = require_code(code, "Missing puzzle code")?;

        if !self.store.increment_stars(code, Utc::now())? {
            return Err(StatsError::NotFound);
        }
        Ok(())
    }

    pub fn get_stats(&self, code: &str) -> Result<PuzzleStats, StatsError> {
        let record = self.store.find(code)?.ok_or(StatsError::NotFound)?;

        Ok(PuzzleStats {
            code: code.to_string(),
            stars: record.stars,
            solves: record.solves,
            min_time: record.min_time,
            avg_time: average_time(record.sum_time, record.solves),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn aggregator() -> (StatsAggregator, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (StatsAggregator::new(store.clone()), store)
    }

    #[test]
    fn clip_keeps_values_in_range() {
        assert_eq!(clip_seconds(0), 1);
        assert_eq!(clip_seconds(-40), 1);
        assert_eq!(clip_seconds(1), 1);
        assert_eq!(clip_seconds(45), 45);
        assert_eq!(clip_seconds(3600), 3600);
        assert_eq!(clip_seconds(9999), 3600);
        assert_eq!(clip_seconds(i64::MAX), 3600);
    }

    #[test]
    fn clip_handles_json_shapes() {
        assert_eq!(clip_time(&json!(45)), 45);
        assert_eq!(clip_time(&json!(9999)), 3600);
        assert_eq!(clip_time(&json!(0)), 1);
        assert_eq!(clip_time(&json!(12.9)), 12);
        assert_eq!(clip_time(&json!(-3.5)), 1);
        assert_eq!(clip_time(&json!(u64::MAX)), 3600);
        assert_eq!(clip_time(&json!("120")), 120);
        assert_eq!(clip_time(&json!(" 75 ")), 75);
        assert_eq!(clip_time(&json!("99999999999999999999999")), 3600);
        assert_eq!(clip_time(&json!("not-a-number")), 1);
        assert_eq!(clip_time(&json!("12.5")), 1);
        assert_eq!(clip_time(&json!(true)), 1);
        assert_eq!(clip_time(&json!([1, 2])), 1);
        assert_eq!(clip_time(&json!({"t": 3})), 1);
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        assert_eq!(average_time(65, 2), 32.5);
        assert_eq!(average_time(3665, 3), 1221.7);
        assert_eq!(average_time(10, 3), 3.3);
        assert_eq!(average_time(0, 0), 0.0);
        // exact halves go to the even digit
        assert_eq!(average_time(5, 4), 1.2);
        assert_eq!(average_time(13, 4), 3.2);
        assert_eq!(average_time(7, 4), 1.8);
    }

    #[test]
    fn underscored_digits_parse_like_int_literals() {
        assert_eq!(clip_time(&json!("1_000")), 1000);
        assert_eq!(clip_time(&json!("+1_2")), 12);
        assert_eq!(clip_time(&json!("-5_0")), 1);
        assert_eq!(clip_time(&json!("_10")), 1);
        assert_eq!(clip_time(&json!("10_")), 1);
        assert_eq!(clip_time(&json!("1__0")), 1);
        assert_eq!(clip_time(&json!("-")), 1);
    }

    #[test]
    fn solves_accumulate_into_stats() {
        let (stats, store) = aggregator();

        stats.submit_solve(Some("ABC"), Some(&json!(45))).unwrap();
        assert_eq!(
            stats.get_stats("ABC").unwrap(),
            PuzzleStats {
                code: "ABC".to_string(),
                stars: 0,
                solves: 1,
                min_time: 45,
                avg_time: 45.0,
            }
        );

        stats.submit_solve(Some("ABC"), Some(&json!(20))).unwrap();
        let second = stats.get_stats("ABC").unwrap();
        assert_eq!((second.solves, second.min_time, second.avg_time), (2, 20, 32.5));

        stats.submit_solve(Some("ABC"), Some(&json!(9999))).unwrap();
        let third = stats.get_stats("ABC").unwrap();
        assert_eq!((third.solves, third.min_time, third.avg_time), (3, 20, 1221.7));
        assert_eq!(store.find("ABC").unwrap().unwrap().sum_time, 3665);
    }

    #[test]
    fn star_requires_existing_puzzle() {
        let (stats, store) = aggregator();

        assert!(matches!(stats.submit_star(Some("ZZZ")), Err(StatsError::NotFound)));
        assert!(store.is_empty());

        stats.submit_solve(Some("ABC"), Some(&json!(45))).unwrap();
        stats.submit_solve(Some("ABC"), Some(&json!(20))).unwrap();
        stats.submit_star(Some("ABC")).unwrap();

        let record = store.find("ABC").unwrap().unwrap();
        assert_eq!(record.stars, 1);
        assert_eq!(record.solves, 2);
        assert_eq!(record.min_time, 20);
        assert_eq!(record.sum_time, 65);
    }

    #[test]
    fn missing_fields_are_rejected() {
        let (stats, store) = aggregator();

        assert!(matches!(
            stats.submit_solve(None, Some(&json!(10))),
            Err(StatsError::Validation(_))
        ));
        assert!(matches!(
            stats.submit_solve(Some(""), Some(&json!(10))),
            Err(StatsError::Validation(_))
        ));
        assert!(matches!(
            stats.submit_solve(Some("ABC"), None),
            Err(StatsError::Validation(_))
        ));
        assert!(matches!(
            stats.submit_solve(Some("ABC"), Some(&Value::Null)),
            Err(StatsError::Validation(_))
        ));
        assert!(matches!(stats.submit_star(Some("")), Err(StatsError::Validation(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn unparseable_time_is_clipped_not_rejected() {
        let (stats, _) = aggregator();

        stats.submit_solve(Some("ABC"), Some(&json!("soon"))).unwrap();
        let result = stats.get_stats("ABC").unwrap();
        assert_eq!((result.solves, result.min_time, result.avg_time), (1, 1, 1.0));
    }

    #[test]
    fn unknown_code_has_no_stats() {
        let (stats, _) = aggregator();
        assert!(matches!(stats.get_stats("ZZZ"), Err(StatsError::NotFound)));
    }

    #[test]
    fn zero_solve_record_reports_zero_average() {
        let (stats, store) = aggregator();
        let record = PuzzleRecord {
            solves: 0,
            sum_time: 0,
            ..PuzzleRecord::first_solve(1, Utc::now())
        };
        store.insert_if_absent("EMPTY", record).unwrap();

        assert_eq!(stats.get_stats("EMPTY").unwrap().avg_time, 0.0);
    }

    struct FailingStore;

    impl PuzzleStore for FailingStore {
        fn find(&self, _code: &str) -> Result<Option<PuzzleRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn increment_solve(
            &self,
            _code: &str,
            _time: u32,
            _now: chrono::DateTime<Utc>,
        ) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn insert_if_absent(&self, _code: &str, _record: PuzzleRecord) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn increment_stars(&self, _code: &str, _now: chrono::DateTime<Utc>) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[test]
    fn store_failures_surface_as_store_errors() {
        let stats = StatsAggregator::new(Arc::new(FailingStore));

        assert!(matches!(
            stats.submit_solve(Some("ABC"), Some(&json!(10))),
            Err(StatsError::Store(StoreError::Unavailable(_)))
        ));
        assert!(matches!(
            stats.submit_star(Some("ABC")),
            Err(StatsError::Store(StoreError::Unavailable(_)))
        ));
        assert!(matches!(
            stats.get_stats("ABC"),
            Err(StatsError::Store(StoreError::Unavailable(_)))
        ));
        // validation still runs before the store is touched
        assert!(matches!(stats.submit_star(None), Err(StatsError::Validation(_))));
    }

    #[test]
    fn concurrent_solves_lose_no_updates() {
        let (stats, store) = aggregator();
        let times: Vec<i64> = (0..64).map(|i| 5 + (i * 37) % 500).collect();

        std::thread::scope(|s| {
            for &t in &times {
                let stats = &stats;
                s.spawn(move || stats.submit_solve(Some("RACE"), Some(&json!(t))).unwrap());
            }
        });

        let record = store.find("RACE").unwrap().unwrap();
        assert_eq!(record.solves, times.len() as u64);
        assert_eq!(record.sum_time, times.iter().sum::<i64>() as u64);
        assert_eq!(i64::from(record.min_time), *times.iter().min().unwrap());
    }
}
