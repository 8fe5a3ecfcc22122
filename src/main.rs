//! Collects user badges from many upstream sources into a shared Redis cache.
//!
//! # Usage
//!
//! Keep the cache fresh until interrupted:
//!
//! ```bash
//! badge-aggregator run --redis-url redis://127.0.0.1:6379
//! ```
//!
//! Refresh one source right away, then look at what was stored:
//!
//! ```bash
//! badge-aggregator refresh aero
//! badge-aggregator get aero
//! ```
//!
//! Show one user's badges, grouped by source:
//!
//! ```bash
//! badge-aggregator badges 1234567890 --separated
//! ```
//!
//! Settings are read from `badges.toml` (or `.yml`, `.yaml`, `.json`) in the current directory;
//! `badge-aggregator init` writes one with every default.

use badge_aggregator::{Host, run};
use std::io::Write;
use std::io::{stderr, stdout};

/// Host writing to the real standard streams.
#[derive(Debug, Clone, Default)]
pub struct RealHost;

impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }

    fn exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}

#[tokio::main]
async fn main() -> Result<(), ohno::AppError> {
    run(&mut RealHost, std::env::args()).await
}
