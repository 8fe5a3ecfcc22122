//! Command-line interface for badge-aggregator
//!
//! # Implementation Model
//!
//! The `run` function parses the command line with clap and routes to one handler per
//! subcommand:
//!
//! - **run**: connect to the store, run the startup cycle, then refresh on a timer until Ctrl-C
//! - **refresh**: refresh one source, or all of them, right now
//! - **clear**: remove cached data for one source, or all of them
//! - **get**: print the cached data of one source as JSON
//! - **badges**: print one user's badges as JSON, combined or per source
//! - **init**: write a configuration file holding the defaults
//!
//! Every handler that touches the store goes through `Common`, which loads the configuration,
//! sets up logging, connects to Redis and pings it. The part of each handler that works on an
//! [`Orchestrator`](crate::refresh::Orchestrator) is generic over the store so it can be driven
//! against an in-memory store.
//!
//! Output goes through a [`Host`] so tests can capture it.

mod badges;
mod clear;
mod common;
mod get;
mod host;
mod init;
mod refresh;
mod run;
mod service;

pub use badges::{BadgesArgs, print_badges, show_badges};
pub use clear::{ClearArgs, clear_cache, clear_sources};
pub use common::{Common, CommonArgs, LogLevel};
pub use get::{GetArgs, get_source, print_source};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use refresh::{RefreshArgs, refresh_now, refresh_sources};
pub use run::run;
pub use service::{ServiceArgs, run_service};
