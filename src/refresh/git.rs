//! Keeps local working trees of git-backed sources in sync with their remotes.

use crate::Result;
use core::time::Duration;
use ohno::{IntoAppError, app_err, bail};
use std::path::Path;
use tokio::process::Command;
use url::Url;

const LOG_TARGET: &str = "       git";

const GIT_TIMEOUT: Duration = Duration::from_mins(5);

/// Whether `path` holds a git working tree.
#[must_use]
pub fn has_working_tree(path: &Path) -> bool {
    path.join(".git").join("config").exists()
}

/// Returns `remote` with `token` embedded as credentials, or unchanged without a token.
pub fn authenticated_url(remote: &Url, token: Option<&str>) -> Result<Url> {
    let mut url = remote.clone();
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        url.set_username(token)
            .map_err(|()| app_err!("cannot embed credentials in remote '{remote}'"))?;
    }
    Ok(url)
}

/// Clones `remote` into `path`, or fast-forwards an existing working tree.
///
/// A directory at `path` that is not a working tree is removed first. The token is never logged.
pub async fn sync_repo(path: &Path, remote: &Url, token: Option<&str>) -> Result<()> {
    let start_time = std::time::Instant::now();

    sync_repo_core(path, remote, token).await?;

    log::debug!(target: LOG_TARGET, "Synced '{remote}' in {:.3}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

async fn sync_repo_core(path: &Path, remote: &Url, token: Option<&str>) -> Result<()> {
    let path_str = path.to_str().into_app_err("invalid UTF-8 in working tree path")?;

    if has_working_tree(path) {
        log::info!(target: LOG_TARGET, "Pulling latest changes from '{remote}'");
        let output = run_git_with_timeout(&["-C", path_str, "pull", "--ff-only"]).await?;
        return check_git_output(&output, "git pull", token);
    }

    if path.exists() {
        log::warn!(target: LOG_TARGET, "'{path_str}' exists but is not a git working tree, re-cloning");
        tokio::fs::remove_dir_all(path)
            .await
            .into_app_err_with(|| format!("could not remove '{path_str}'"))?;
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .into_app_err_with(|| format!("could not create directory '{}'", parent.display()))?;
    }

    log::info!(target: LOG_TARGET, "Cloning '{remote}' into '{path_str}'");
    let url = authenticated_url(remote, token)?;
    let output = run_git_with_timeout(&["clone", "--single-branch", "--no-tags", url.as_str(), path_str]).await?;
    check_git_output(&output, "git clone", token)
}

fn check_git_output(output: &std::process::Output, operation: &str, token: Option<&str>) -> Result<()> {
    if !output.status.success() {
        let stderr = redact(&String::from_utf8_lossy(&output.stderr), token);
        bail!("{operation} failed: {}", stderr.trim());
    }
    Ok(())
}

fn redact(text: &str, token: Option<&str>) -> String {
    match token.filter(|t| !t.is_empty()) {
        Some(token) => text.replace(token, "***"),
        None => text.to_string(),
    }
}

async fn run_git_with_timeout(args: &[&str]) -> Result<std::process::Output> {
    let child = Command::new("git")
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .into_app_err("could not spawn git command")?;

    // args may carry a credentialed URL, so only the subcommand is reported
    let subcommand = if args.first() == Some(&"-C") { args.get(2) } else { args.first() }
        .copied()
        .unwrap_or_default();

    match tokio::time::timeout(GIT_TIMEOUT, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(e).into_app_err_with(|| format!("'git {subcommand}' failed to run")),
        Err(_) => {
            bail!("'git {subcommand}' timed out after {} seconds", GIT_TIMEOUT.as_secs());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use std::os::unix::process::ExitStatusExt;
    #[cfg(unix)]
    use std::process::{ExitStatus, Output};

    #[cfg(unix)]
    fn output(code: i32, stderr: &[u8]) -> Output {
        Output {
            status: ExitStatus::from_raw(code << 8),
            stdout: vec![],
            stderr: stderr.to_vec(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_check_git_output_success() {
        check_git_output(&output(0, b""), "git pull", None).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_check_git_output_failure_redacts_token() {
        let stderr = b"fatal: could not read from https://s3cret@github.com/o/r.git";
        let err = check_git_output(&output(128, stderr), "git clone", Some("s3cret")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("git clone failed"));
        assert!(message.contains("https://***@github.com/o/r.git"));
        assert!(!message.contains("s3cret"));
    }

    #[test]
    fn test_authenticated_url() {
        let remote = Url::parse("https://github.com/enmity-mod/badges.git").unwrap();
        assert_eq!(authenticated_url(&remote, None).unwrap(), remote);
        assert_eq!(authenticated_url(&remote, Some("")).unwrap(), remote);
        assert_eq!(
            authenticated_url(&remote, Some("tok")).unwrap().as_str(),
            "https://tok@github.com/enmity-mod/badges.git"
        );
    }

    #[test]
    fn test_has_working_tree() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!has_working_tree(dir.path()));

        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        assert!(!has_working_tree(dir.path()));

        std::fs::write(dir.path().join(".git").join("config"), "[core]\n").unwrap();
        assert!(has_working_tree(dir.path()));
    }
}
