//! Command dispatch logic for badge-aggregator

use super::{
    BadgesArgs, ClearArgs, GetArgs, InitArgs, RefreshArgs, ServiceArgs, clear_cache, get_source, init_config, refresh_sources,
    run_service, show_badges,
};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "badge-aggregator", author, version, long_about = None)]
#[command(about = "Collect user badges from many sources into a shared cache")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keep the cache fresh on a timer until interrupted
    Run(ServiceArgs),
    /// Refresh one source, or every source, immediately
    Refresh(RefreshArgs),
    /// Remove cached data for one source, or every source
    Clear(ClearArgs),
    /// Print the cached data of one source
    Get(GetArgs),
    /// Print one user's badges
    Badges(Box<BadgesArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// # Errors
///
/// Returns an error if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        Command::Run(service_args) => run_service(host, service_args).await,
        Command::Refresh(refresh_args) => refresh_sources(host, refresh_args).await,
        Command::Clear(clear_args) => clear_cache(host, clear_args).await,
        Command::Get(get_args) => get_source(host, get_args).await,
        Command::Badges(badges_args) => show_badges(host, badges_args).await,
        Command::Init(init_args) => init_config(host, init_args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_badges_arguments() {
        let cli = Cli::try_parse_from([
            "badge-aggregator",
            "badges",
            "1234",
            "--source",
            "aero",
            "--source",
            "enmity",
            "--separated",
            "--redis-url",
            "redis://cache:6379",
        ])
        .unwrap();

        let Command::Badges(args) = cli.command else {
            panic!("expected the badges command");
        };
        assert_eq!(args.user_id, "1234");
        assert_eq!(args.sources, ["aero", "enmity"]);
        assert!(args.separated);
        assert_eq!(args.common.redis_url, "redis://cache:6379");
    }

    #[test]
    fn test_get_requires_source() {
        assert!(Cli::try_parse_from(["badge-aggregator", "get"]).is_err());
    }
}
