use super::{Common, CommonArgs, Host};
use crate::Result;
use crate::refresh::Orchestrator;
use crate::store::KvStore;
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Source whose cached data to remove (default is every cached source)
    #[arg(value_name = "SOURCE")]
    pub source: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn clear_cache<H: Host>(host: &mut H, args: &ClearArgs) -> Result<()> {
    let common = Common::new(&args.common).await?;
    clear_sources(host, &common.orchestrator, args.source.as_deref()).await
}

pub async fn clear_sources<H: Host, S: KvStore>(host: &mut H, orchestrator: &Orchestrator<S>, source: Option<&str>) -> Result<()> {
    let cleared = orchestrator.clear(source).await?;
    let _ = writeln!(host.output(), "Cleared {cleared} cache keys");
    Ok(())
}
