use super::{Common, CommonArgs, Host};
use crate::Result;
use crate::refresh::Orchestrator;
use crate::store::KvStore;
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct RefreshArgs {
    /// Source to refresh (default is every cached source)
    #[arg(value_name = "SOURCE")]
    pub source: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn refresh_sources<H: Host>(host: &mut H, args: &RefreshArgs) -> Result<()> {
    let common = Common::new(&args.common).await?;
    refresh_now(host, &common.orchestrator, args.source.as_deref()).await
}

/// Refreshes immediately, ignoring freshness, and prints one line per source
///
/// Exits with status 1 when any source failed. Naming an unknown source is an error.
pub async fn refresh_now<H: Host, S: KvStore>(host: &mut H, orchestrator: &Orchestrator<S>, source: Option<&str>) -> Result<()> {
    let report = orchestrator.force_refresh(source).await?;

    for (id, outcome) in report.iter() {
        let _ = writeln!(host.output(), "{id}: {outcome}");
    }

    if report.failures() > 0 {
        let _ = writeln!(host.error(), "{} of {} sources failed to refresh", report.failures(), report.len());
        host.exit(1);
    }

    Ok(())
}
