use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, register_counter, register_counter_vec, register_gauge,
    register_histogram,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: CounterVec = register_counter_vec!(
        "puzzle_requests_total",
        "Total number of requests per endpoint",
        &["endpoint"]
    )
    .unwrap();
    pub static ref RATE_LIMITED: CounterVec = register_counter_vec!(
        "puzzle_rate_limited_total",
        "Requests rejected by the rate limiter",
        &["endpoint"]
    )
    .unwrap();
    pub static ref SOLVES_RECORDED: Counter =
        register_counter!("puzzle_solves_recorded_total", "Total solves recorded").unwrap();
    pub static ref STARS_RECORDED: Counter =
        register_counter!("puzzle_stars_recorded_total", "Total stars recorded").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "puzzle_request_latency_seconds",
        "Request latency in seconds"
    )
    .unwrap();
    pub static ref RATE_LIMIT_CLIENTS: Gauge = register_gauge!(
        "puzzle_rate_limit_clients",
        "Client identifiers currently tracked by the rate limiter"
    )
    .unwrap();
}
