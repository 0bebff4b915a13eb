use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitStatusSnapshot {
    /// Branch name, or the short commit id when HEAD is detached
    pub branch: String,
    pub detached: bool,
    pub staged: u32,
    pub modified: u32,
    pub untracked: u32,
    /// Line delta of the work tree against upstream (or HEAD)
    pub lines_added: u64,
    pub lines_removed: u64,
    /// Browsable `https://host/owner/repo` form of the remote
    pub web_url: Option<String>,
}

impl GitStatusSnapshot {
    /// Hyperlink target for the branch segment.
    pub fn branch_url(&self) -> Option<String> {
        let base = self.web_url.as_deref()?;
        if self.detached {
            Some(format!("{base}/commit/{}", self.branch))
        } else {
            Some(format!("{base}/tree/{}", self.branch))
        }
    }
}

/// Cached probe result. `NotARepo` is cached too so non-repo directories are
/// not re-probed on every render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GitState {
    Repo(GitStatusSnapshot),
    NotARepo,
}

impl GitState {
    pub fn snapshot(&self) -> Option<&GitStatusSnapshot> {
        match self {
            GitState::Repo(s) => Some(s),
            GitState::NotARepo => None,
        }
    }
}
