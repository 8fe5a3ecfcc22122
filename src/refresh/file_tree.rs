//! Reads the JSON files of a synced working tree.

use crate::Result;
use crate::sources::{TreeLayout, TreeSnapshot};
use ohno::{IntoAppError, bail};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const LOG_TARGET: &str = " file_tree";

/// Reads user and definition files from the working tree at `root`.
///
/// Missing directories inside the tree read as empty. Files that cannot be read or parsed are
/// skipped.
pub async fn read_tree(root: PathBuf, layout: TreeLayout) -> Result<TreeSnapshot> {
    tokio::task::spawn_blocking(move || read_tree_blocking(&root, &layout))
        .await
        .into_app_err("working tree reader panicked")?
}

fn read_tree_blocking(root: &Path, layout: &TreeLayout) -> Result<TreeSnapshot> {
    if !root.is_dir() {
        bail!("working tree '{}' does not exist", root.display());
    }

    let users = json_files(&root.join(&layout.users_dir))
        .filter_map(|(path, value)| {
            let user_id = path.file_stem()?.to_str()?.to_string();
            Some((user_id, value))
        })
        .collect();

    let definitions = layout
        .definitions_dir
        .as_ref()
        .map(|dir| json_files(&root.join(dir)).map(|(_, value)| value).collect())
        .unwrap_or_default();

    Ok(TreeSnapshot { users, definitions })
}

/// Parsed `*.json` files directly inside `dir`, ordered by file name.
fn json_files(dir: &Path) -> impl Iterator<Item = (PathBuf, Value)> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "json"))
        .filter_map(|entry| {
            let path = entry.into_path();
            let parsed = fs::read_to_string(&path)
                .into_app_err("reading file")
                .and_then(|text| serde_json::from_str::<Value>(&text).into_app_err("parsing JSON"));
            match parsed {
                Ok(value) => Some((path, value)),
                Err(e) => {
                    log::debug!(target: LOG_TARGET, "Skipping '{}': {e:#}", path.display());
                    None
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(users_dir: &str, definitions_dir: Option<&str>) -> TreeLayout {
        TreeLayout {
            users_dir: users_dir.to_string(),
            definitions_dir: definitions_dir.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_reads_users_and_definitions() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("data")).unwrap();
        fs::write(root.join("200.json"), r#"["dev"]"#).unwrap();
        fs::write(root.join("100.json"), r#"["staff"]"#).unwrap();
        fs::write(root.join("broken.json"), "{").unwrap();
        fs::write(root.join("README.md"), "# badges").unwrap();
        fs::write(root.join("data").join("dev.json"), r#"{"id": "dev", "name": "Developer"}"#).unwrap();

        let tree = read_tree(root.to_path_buf(), layout("", Some("data"))).await.unwrap();

        let ids: Vec<&str> = tree.users.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["100", "200"]);
        assert_eq!(tree.definitions.len(), 1);
        assert_eq!(tree.definitions[0]["name"], "Developer");
    }

    #[tokio::test]
    async fn test_missing_subdirectory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let tree = read_tree(dir.path().to_path_buf(), layout("User", None)).await.unwrap();
        assert!(tree.users.is_empty());
        assert!(tree.definitions.is_empty());
    }

    #[tokio::test]
    async fn test_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_tree(dir.path().join("nope"), layout("", None)).await;
        assert!(result.is_err());
    }
}
