//! Setup shared by every command that talks to the store.

use crate::Result;
use crate::config::Config;
use crate::refresh::Orchestrator;
use crate::sources::SourceRegistry;
use crate::store::RedisStore;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Arguments shared by every command that talks to the store
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Redis connection URL
    #[arg(long, value_name = "URL", env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    /// GitHub personal access token, used when syncing git-backed sources
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Path to configuration file (default is `badges.toml` in the current directory)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    pub log_level: LogLevel,
}

/// A loaded configuration and an orchestrator connected to Redis
#[derive(Debug)]
pub struct Common {
    pub config: Config,
    pub orchestrator: Orchestrator<RedisStore>,
}

impl Common {
    /// Loads the configuration, connects to Redis and verifies the connection
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the store cannot be reached
    pub async fn new(args: &CommonArgs) -> Result<Self> {
        Self::init_logging(args.log_level);

        let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
        let registry = SourceRegistry::builtin()?.with_overrides(&config.sources)?;

        let store = RedisStore::connect(&args.redis_url, config.redis_timeout()).await?;
        let orchestrator = Orchestrator::new(store, &config, registry, args.github_token.clone())?;
        orchestrator.initialize().await?;

        Ok(Self { config, orchestrator })
    }

    fn init_logging(log_level: LogLevel) {
        let level = match log_level {
            LogLevel::None => return,
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };

        let env = env_logger::Env::default().filter_or("RUST_LOG", level);

        env_logger::Builder::from_env(env)
            .format_timestamp(None)
            .format_module_path(false)
            .init();
    }
}
