use std::sync::Arc;

use crate::config::Limits;
use crate::rate_limit::RateLimiter;
use crate::stats::StatsAggregator;
use crate::store::PuzzleStore;

// app's shared state
pub struct AppState {
    pub stats: StatsAggregator,
    pub rate_limiter: RateLimiter,
    pub limits: Limits, // per-endpoint quotas
}

impl AppState {
    pub fn new(store: Arc<dyn PuzzleStore>, limits: Limits) -> Arc<Self> {
        Arc::new(Self {
            stats: StatsAggregator::new(store),
            rate_limiter: RateLimiter::new(),
            limits,
        })
    }
}
