use super::Host;
use crate::Result;
use crate::config::Config;
use camino::Utf8PathBuf;
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output configuration file path; the extension picks TOML, YAML, or JSON
    #[arg(value_name = "PATH", default_value = "badges.toml")]
    pub output: Utf8PathBuf,
}

/// Writes a configuration file holding every default
pub fn init_config<H: Host>(host: &mut H, args: &InitArgs) -> Result<()> {
    Config::default().save(&args.output)?;
    let _ = writeln!(host.output(), "Generated default configuration file: {}", args.output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::host::TestHost;
    use camino::Utf8Path;

    #[test]
    fn test_generated_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        for name in ["badges.toml", "badges.yaml", "badges.json"] {
            let output = root.join(name);
            let mut host = TestHost::new();
            init_config(&mut host, &InitArgs { output: output.clone() }).unwrap();
            assert!(host.output_text().contains(name));

            let loaded = Config::load(Utf8Path::new("."), Some(&output)).unwrap();
            assert_eq!(loaded.refresh_interval_ms, Config::default().refresh_interval_ms);
            assert_eq!(loaded.cache_version, "v1");
        }
    }

    #[test]
    fn test_unsupported_extension_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = Utf8PathBuf::from_path_buf(dir.path().join("badges.ini")).unwrap();

        let mut host = TestHost::new();
        assert!(init_config(&mut host, &InitArgs { output }).is_err());
        assert!(host.output_buf.is_empty());
    }
}
