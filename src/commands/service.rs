use super::{Common, CommonArgs, Host};
use crate::Result;
use crate::refresh::Scheduler;
use clap::Parser;
use ohno::IntoAppError;
use std::io::Write;
use std::sync::Arc;

const LOG_TARGET: &str = "   service";

#[derive(Parser, Debug)]
pub struct ServiceArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Keeps the cache fresh until interrupted with Ctrl-C
pub async fn run_service<H: Host>(host: &mut H, args: &ServiceArgs) -> Result<()> {
    let common = Common::new(&args.common).await?;
    let period = common.config.refresh_interval();
    let orchestrator = Arc::new(common.orchestrator);

    let scheduler = Scheduler::start(Arc::clone(&orchestrator), period, common.config.preload_on_startup).await;
    let _ = writeln!(host.output(), "Badge refresh running every {}s, press Ctrl-C to stop", period.as_secs());

    let signal = tokio::signal::ctrl_c().await.into_app_err("waiting for the shutdown signal");

    log::info!(target: LOG_TARGET, "Shutting down");
    scheduler.stop().await;

    let metrics = orchestrator.metrics();
    log::info!(
        target: LOG_TARGET,
        "Cache reads: {} hits, {} misses, {} errors",
        metrics.hits,
        metrics.misses,
        metrics.errors
    );

    signal
}
