//! # Git Module
//!
//! Repository inspection for the status bar.
//!
//! Discovery, HEAD, config and upstream resolution go through gix (feature
//! `git`). File counts and line stats come from the `git` CLI, which already
//! knows how to honour every ignore rule and filter, run under a timeout.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::error::{StatusResult, StatuslineError};
use crate::models::GitState;
#[cfg(feature = "git")]
use crate::models::GitStatusSnapshot;
use crate::process::run_with_timeout;

static SCP_LIKE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[^@/]+@)?([^:/]+):/?(.+?)(?:\.git)?/?$").expect("scp regex is valid")
});
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(ssh|git|https?)://(?:[^@/]+@)?([^/:]+)(?::\d+)?/(.+?)(?:\.git)?/?$")
        .expect("url regex is valid")
});

/// Rewrite a fetch/push URL into the browsable `https://host/owner/repo` form.
///
/// Returns `None` for local paths and `file://` remotes.
pub fn web_url_for_remote(remote: &str) -> Option<String> {
    let remote = remote.trim();
    if remote.contains("://") {
        let caps = URL_RE.captures(remote)?;
        let scheme = if &caps[1] == "http" { "http" } else { "https" };
        return Some(format!("{scheme}://{}/{}", &caps[2], &caps[3]));
    }
    if remote.starts_with('/') || remote.starts_with('.') {
        return None;
    }
    let caps = SCP_LIKE_RE.captures(remote)?;
    Some(format!("https://{}/{}", &caps[1], &caps[2]))
}

/// Count `(staged, modified, untracked)` from `git status --porcelain` (v1).
pub fn parse_porcelain(out: &str) -> (u32, u32, u32) {
    let (mut staged, mut modified, mut untracked) = (0, 0, 0);
    for line in out.lines() {
        let mut chars = line.chars();
        let (Some(index), Some(worktree)) = (chars.next(), chars.next()) else {
            continue;
        };
        match (index, worktree) {
            ('?', '?') => untracked += 1,
            ('!', '!') => {}
            _ => {
                if index != ' ' {
                    staged += 1;
                }
                if worktree != ' ' {
                    modified += 1;
                }
            }
        }
    }
    (staged, modified, untracked)
}

/// Sum `(added, removed)` from `git diff --numstat`. Binary files (`-\t-`) are skipped.
pub fn parse_numstat(out: &str) -> (u64, u64) {
    out.lines()
        .filter_map(|line| {
            let mut cols = line.split('\t');
            let added = cols.next()?.parse::<u64>().ok()?;
            let removed = cols.next()?.parse::<u64>().ok()?;
            Some((added, removed))
        })
        .fold((0, 0), |(a, r), (da, dr)| (a + da, r + dr))
}

/// Produces a fresh [`GitState`] for a directory, bypassing any cache.
pub trait StatusProbe {
    fn probe(&self, dir: &Path) -> StatusResult<GitState>;
}

pub struct GitCli {
    timeout: Duration,
}

impl GitCli {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn run(&self, dir: &Path, args: &[&str]) -> StatusResult<String> {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(dir)
            // Status must not take the index lock away from the user's own git commands.
            .env("GIT_OPTIONAL_LOCKS", "0");
        run_with_timeout(&mut cmd, self.timeout)
            .map_err(|e| StatuslineError::GitCommandFailed(format!("git {}: {e}", args.join(" "))))
    }
}

#[cfg(feature = "git")]
fn gix_err(e: impl std::fmt::Display) -> StatuslineError {
    StatuslineError::GitCommandFailed(e.to_string())
}

#[cfg(feature = "git")]
impl StatusProbe for GitCli {
    fn probe(&self, dir: &Path) -> StatusResult<GitState> {
        let Ok(repo) = gix::discover(dir) else {
            return Ok(GitState::NotARepo);
        };
        // Bare repositories have no work tree to report on.
        let Some(work_dir) = repo.work_dir().map(Path::to_path_buf) else {
            return Ok(GitState::NotARepo);
        };

        let mut head = repo.head().map_err(gix_err)?;
        let branch_name = head.referent_name().map(|name| name.shorten().to_string());
        let head_id: Option<String> = head
            .try_peel_to_id_in_place()
            .map_err(gix_err)?
            .map(|id| id.to_hex().to_string());

        let mut snapshot = GitStatusSnapshot::default();
        match (&branch_name, &head_id) {
            (Some(branch), _) => snapshot.branch = branch.clone(),
            (None, Some(id)) => {
                snapshot.branch = id.chars().take(7).collect();
                snapshot.detached = true;
            }
            (None, None) => snapshot.branch = "HEAD".to_string(),
        }

        // Upstream from branch.<name>.remote / branch.<name>.merge
        let cfg = repo.config_snapshot();
        let mut remote_name = "origin".to_string();
        let mut diff_base: Option<String> = None;
        if let Some(branch) = branch_name.as_deref() {
            let key_remote = format!("branch.{}.remote", branch);
            let key_merge = format!("branch.{}.merge", branch);
            if let (Some(remote), Some(merge_ref)) = (
                cfg.string(key_remote.as_str()),
                cfg.string(key_merge.as_str()),
            ) {
                let remote_s = remote.to_string();
                let merge_s = merge_ref.to_string();
                let merge_short = merge_s
                    .strip_prefix("refs/heads/")
                    .unwrap_or(merge_s.as_str());
                let upstream_ref = format!("refs/remotes/{}/{}", remote_s, merge_short);
                if repo.find_reference(upstream_ref.as_str()).is_ok() {
                    diff_base = Some(upstream_ref);
                }
                remote_name = remote_s;
            }
        }
        if diff_base.is_none() && head_id.is_some() {
            diff_base = Some("HEAD".to_string());
        }

        let push_key = format!("remote.{}.pushurl", remote_name);
        let fetch_key = format!("remote.{}.url", remote_name);
        snapshot.web_url = cfg
            .string(push_key.as_str())
            .or_else(|| cfg.string(fetch_key.as_str()))
            .and_then(|url| web_url_for_remote(&url.to_string()));

        let porcelain = self.run(
            &work_dir,
            &["status", "--porcelain=v1", "--untracked-files=normal"],
        )?;
        let (staged, modified, untracked) = parse_porcelain(&porcelain);
        snapshot.staged = staged;
        snapshot.modified = modified;
        snapshot.untracked = untracked;

        // Unborn branch: nothing to diff against yet.
        if let Some(base) = diff_base {
            let numstat = self.run(&work_dir, &["diff", "--numstat", base.as_str()])?;
            let (added, removed) = parse_numstat(&numstat);
            snapshot.lines_added = added;
            snapshot.lines_removed = removed;
        }

        Ok(GitState::Repo(snapshot))
    }
}

#[cfg(not(feature = "git"))]
impl StatusProbe for GitCli {
    fn probe(&self, _dir: &Path) -> StatusResult<GitState> {
        Ok(GitState::NotARepo)
    }
}
