use super::{Common, CommonArgs, Host};
use crate::Result;
use crate::refresh::Orchestrator;
use crate::sources::SourceId;
use crate::store::KvStore;
use clap::Parser;
use ohno::IntoAppError;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct BadgesArgs {
    /// Discord user id
    #[arg(value_name = "USER_ID")]
    pub user_id: String,

    /// Source to include; repeat for several (default is every cached source)
    #[arg(long = "source", value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Group badges by source instead of printing one list
    #[arg(long)]
    pub separated: bool,

    /// Origin prefixed to server-relative icon paths, such as `https://badges.example.com`
    #[arg(long, value_name = "URL")]
    pub origin: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn show_badges<H: Host>(host: &mut H, args: &BadgesArgs) -> Result<()> {
    let common = Common::new(&args.common).await?;
    print_badges(host, &common.orchestrator, args).await
}

/// Prints one user's badges as JSON
///
/// Naming an unknown source is an error. Sources served live are ignored.
pub async fn print_badges<H: Host, S: KvStore>(host: &mut H, orchestrator: &Orchestrator<S>, args: &BadgesArgs) -> Result<()> {
    let registry = orchestrator.registry();
    let sources: Vec<SourceId> = if args.sources.is_empty() {
        registry.cached().map(|d| d.id).collect()
    } else {
        args.sources.iter().map(|name| registry.find(name).map(|d| d.id)).collect::<Result<_>>()?
    };

    let badges = orchestrator
        .query()
        .badges_for_user(&args.user_id, &sources, args.origin.as_deref())
        .await;

    let mut out = host.output();
    let written = if args.separated {
        serde_json::to_writer_pretty(&mut out, &badges.separated())
    } else {
        serde_json::to_writer_pretty(&mut out, &badges.combined())
    };
    written.into_app_err("writing JSON output")?;
    let _ = writeln!(out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badge::{Badge, BadgeMap};
    use crate::commands::host::TestHost;
    use crate::commands::{CommonArgs, LogLevel};
    use crate::config::Config;
    use crate::sources::SourceRegistry;
    use crate::store::{BadgeCache, CacheKeys, MemoryStore};
    use chrono::Utc;
    use serde_json::json;

    fn args(sources: &[&str], separated: bool) -> BadgesArgs {
        BadgesArgs {
            user_id: "7".to_string(),
            sources: sources.iter().map(ToString::to_string).collect(),
            separated,
            origin: Some("https://badges.example.com".to_string()),
            common: CommonArgs {
                redis_url: String::new(),
                github_token: None,
                config: None,
                log_level: LogLevel::None,
            },
        }
    }

    async fn orchestrator() -> Orchestrator<MemoryStore> {
        let store = MemoryStore::new();
        let config = Config::default();
        let cache = BadgeCache::new(store.clone(), CacheKeys::new(&config.cache_version), config.cache_ttl(), SourceRegistry::builtin().unwrap());

        let mut aero = BadgeMap::new();
        aero.push("7", Badge::new("Aero Developer", "/public/badges/aero/developer.png"));
        cache.write(SourceId::Aero, &aero, Utc::now()).await.unwrap();

        let mut ra1ncord = BadgeMap::new();
        ra1ncord.push("7", Badge::new("Booster", "https://cdn.example.com/b.png"));
        cache.write(SourceId::Ra1ncord, &ra1ncord, Utc::now()).await.unwrap();

        Orchestrator::new(store, &config, SourceRegistry::builtin().unwrap(), None).unwrap()
    }

    #[tokio::test]
    async fn test_combined_output() {
        let orchestrator = orchestrator().await;
        let mut host = TestHost::new();

        print_badges(&mut host, &orchestrator, &args(&["ra1ncord", "aero"], false)).await.unwrap();

        let printed: serde_json::Value = serde_json::from_str(&host.output_text()).unwrap();
        assert_eq!(
            printed,
            json!([
                { "tooltip": "Booster", "badge": "https://cdn.example.com/b.png" },
                { "tooltip": "Aero Developer", "badge": "https://badges.example.com/public/badges/aero/developer.png" },
            ])
        );
    }

    #[tokio::test]
    async fn test_separated_output_covers_all_cached_sources() {
        let orchestrator = orchestrator().await;
        let mut host = TestHost::new();

        print_badges(&mut host, &orchestrator, &args(&[], true)).await.unwrap();

        let printed: serde_json::Value = serde_json::from_str(&host.output_text()).unwrap();
        let object = printed.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["ra1ncord"][0]["tooltip"], "Booster");
        assert_eq!(object["aero"][0]["tooltip"], "Aero Developer");
    }

    #[tokio::test]
    async fn test_unknown_source_is_error() {
        let orchestrator = orchestrator().await;
        let mut host = TestHost::new();

        assert!(print_badges(&mut host, &orchestrator, &args(&["velocity"], false)).await.is_err());
    }
}
