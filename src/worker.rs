use std::sync::Arc;
use tokio::time::{Duration, interval};
use tracing::{debug, info};

use crate::metrics::RATE_LIMIT_CLIENTS;
use crate::state::AppState;

// Sweeper - drops rate limit entries with nothing left in their window
// Admission already prunes per client, this only bounds the map size
pub async fn rate_limit_sweeper(state: Arc<AppState>, sweep_interval: Duration) {
    let mut interval = interval(sweep_interval);
    let window = state.limits.longest_window();

    info!("Rate limit sweeper started (interval: {:?})", sweep_interval);

    loop {
        interval.tick().await;
        sweep_once(&state, window);
    }
}

pub fn sweep_once(state: &AppState, window: Duration) -> usize {
    let purged = state.rate_limiter.purge_idle(window);
    RATE_LIMIT_CLIENTS.set(state.rate_limiter.tracked_clients() as f64);

    if purged > 0 {
        debug!(purged, "Swept idle rate limit entries");
    }
    purged
}
