use crate::badge::Badge;
use serde_json::Value;

/// Unnormalized data as retrieved from a source.
#[derive(Debug, Clone)]
pub enum RawPayload {
    /// A single JSON document.
    Json(Value),

    /// A badge document and a plugin manifest. Either part may be missing when its fetch was refused.
    JsonWithManifest {
        badges: Option<Value>,
        manifest: Option<Value>,
        contributor: Badge,
    },

    /// Parsed files from a git working tree.
    Tree(TreeSnapshot),
}

/// The JSON files read from a working tree.
#[derive(Debug, Clone, Default)]
pub struct TreeSnapshot {
    /// `(user id, file contents)` for every user file, ordered by user id.
    pub users: Vec<(String, Value)>,

    /// Contents of every definition file.
    pub definitions: Vec<Value>,
}
