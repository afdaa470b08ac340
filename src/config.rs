use clap::Parser;
use std::time::Duration;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "puzzle-stats")]
#[command(about = "Puzzle solve statistics service with per-client rate limiting")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 5000)]
    pub port: u16,

    // Allowed CORS origins (comma-separated)
    #[arg(long, default_value = "https://qdiag.xyz")]
    pub allowed_origins: String,

    // Max solve submissions per client per window
    #[arg(long, default_value_t = 1)]
    pub solve_rate_limit: u32,

    // Max star submissions per client per window
    #[arg(long, default_value_t = 1)]
    pub star_rate_limit: u32,

    // Max stats queries per client per window
    #[arg(long, default_value_t = 5)]
    pub stats_rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, default_value_t = 1)]
    pub rate_window: u64,

    // How often idle rate limit entries get swept, in seconds
    #[arg(long, default_value_t = 60)]
    pub sweep_interval: u64,
}

// Quota for one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub max_requests: u32,
    pub window: Duration,
}

// Per-endpoint quotas handed to the handlers
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub solve: Quota,
    pub star: Quota,
    pub stats: Quota,
}

impl Default for Limits {
    fn default() -> Self {
        let window = Duration::from_secs(1);
        Self {
            solve: Quota { max_requests: 1, window },
            star: Quota { max_requests: 1, window },
            stats: Quota { max_requests: 5, window },
        }
    }
}

impl Limits {
    pub fn longest_window(&self) -> Duration {
        self.solve.window.max(self.star.window).max(self.stats.window)
    }
}

impl Args {
    pub fn limits(&self) -> Limits {
        let window = Duration::from_secs(self.rate_window.max(1));
        Limits {
            solve: Quota { max_requests: self.solve_rate_limit, window },
            star: Quota { max_requests: self.star_rate_limit, window },
            stats: Quota { max_requests: self.stats_rate_limit, window },
        }
    }

    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(|s| s.trim()) // remove spaces
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
