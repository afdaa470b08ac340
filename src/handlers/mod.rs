mod client;
mod health;
mod metrics;
mod puzzle;

pub use client::ClientId;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use puzzle::{solve_handler, star_handler, stats_handler};
