use serde::{Deserialize, Serialize};

/// Project-level switches that live outside the graph.
///
/// They never mutate the graph; they only select which fragment generators run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(default, alias = "persistenceEnabled")]
    pub persistence_enabled: bool,
    #[serde(default, alias = "commentsEnabled")]
    pub comments_enabled: bool,
    /// Telegram user ids allowed through `is_admin`.
    #[serde(default, alias = "adminIds")]
    pub admin_ids: Vec<i64>,
}

impl ProjectSettings {
    pub fn with_persistence(mut self, enabled: bool) -> Self {
        self.persistence_enabled = enabled;
        self
    }

    pub fn with_comments(mut self, enabled: bool) -> Self {
        self.comments_enabled = enabled;
        self
    }

    pub fn with_admin_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.admin_ids = ids.into_iter().collect();
        self
    }
}
