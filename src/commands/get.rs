use super::{Common, CommonArgs, Host};
use crate::Result;
use crate::refresh::Orchestrator;
use crate::store::KvStore;
use clap::Parser;
use ohno::{IntoAppError, bail};
use std::io::Write;

#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Source whose cached data to print
    #[arg(value_name = "SOURCE")]
    pub source: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn get_source<H: Host>(host: &mut H, args: &GetArgs) -> Result<()> {
    let common = Common::new(&args.common).await?;
    print_source(host, &common.orchestrator, &args.source).await
}

/// Prints the cached data of one source as a JSON object keyed by user id
///
/// Exits with status 1 when the source has no cached data.
pub async fn print_source<H: Host, S: KvStore>(host: &mut H, orchestrator: &Orchestrator<S>, source: &str) -> Result<()> {
    let descriptor = orchestrator.registry().find(source)?;
    if !descriptor.kind.is_cached() {
        bail!("source '{}' is served live and has no cached data", descriptor.id);
    }

    let Some(badges) = orchestrator.query().get_one(descriptor.id).await else {
        let _ = writeln!(host.error(), "No cached data for source {}", descriptor.id);
        host.exit(1);
        return Ok(());
    };

    let mut out = host.output();
    serde_json::to_writer_pretty(&mut out, &badges).into_app_err("writing JSON output")?;
    let _ = writeln!(out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badge::{Badge, BadgeMap};
    use crate::commands::host::TestHost;
    use crate::config::Config;
    use crate::sources::{SourceId, SourceRegistry};
    use crate::store::{BadgeCache, CacheKeys, MemoryStore};
    use chrono::Utc;

    #[tokio::test]
    async fn test_prints_cached_map() {
        let store = MemoryStore::new();
        let config = Config::default();
        let cache = BadgeCache::new(store.clone(), CacheKeys::new(&config.cache_version), config.cache_ttl(), SourceRegistry::builtin().unwrap());

        let mut badges = BadgeMap::new();
        badges.push("42", Badge::new("Tester", "/i.png"));
        cache.write(SourceId::Nekocord, &badges, Utc::now()).await.unwrap();

        let orchestrator = Orchestrator::new(store, &config, SourceRegistry::builtin().unwrap(), None).unwrap();
        let mut host = TestHost::new();
        print_source(&mut host, &orchestrator, "nekocord").await.unwrap();

        let printed: serde_json::Value = serde_json::from_str(&host.output_text()).unwrap();
        assert_eq!(printed, serde_json::json!({ "42": [{ "tooltip": "Tester", "badge": "/i.png" }] }));
        assert_eq!(host.exit_code, None);
    }

    #[tokio::test]
    async fn test_missing_data_exits_with_failure() {
        let orchestrator = Orchestrator::new(MemoryStore::new(), &Config::default(), SourceRegistry::builtin().unwrap(), None).unwrap();
        let mut host = TestHost::new();

        print_source(&mut host, &orchestrator, "aero").await.unwrap();
        assert_eq!(host.error_text(), "No cached data for source aero\n");
        assert_eq!(host.exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_live_source_is_error() {
        let orchestrator = Orchestrator::new(MemoryStore::new(), &Config::default(), SourceRegistry::builtin().unwrap(), None).unwrap();
        let mut host = TestHost::new();

        assert!(print_source(&mut host, &orchestrator, "replugged").await.is_err());
    }
}
