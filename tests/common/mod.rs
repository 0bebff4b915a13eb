#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use anyhow::bail;
use chrono::{DateTime, TimeDelta, Utc};
use claude_statusbar::cache::Clock;
use claude_statusbar::credentials::{Credential, CredentialSource};
use claude_statusbar::error::{StatusResult, StatuslineError};
use claude_statusbar::git::StatusProbe;
use claude_statusbar::models::{GitState, RateLimitSnapshot};
use claude_statusbar::usage_api::UsageSource;

pub fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub struct FakeClock(Cell<DateTime<Utc>>);

impl FakeClock {
    pub fn at(ts: &str) -> Self {
        FakeClock(Cell::new(utc(ts)))
    }

    pub fn advance(&self, secs: i64) {
        self.0.set(self.0.get() + TimeDelta::seconds(secs));
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.get()
    }
}

pub struct StaticCredential(pub Option<&'static str>);

impl CredentialSource for StaticCredential {
    fn name(&self) -> &'static str {
        "static"
    }

    fn load(&self) -> anyhow::Result<Credential> {
        match self.0 {
            Some(token) => Ok(Credential::new(token, None)),
            None => bail!("no token"),
        }
    }
}

/// Usage source returning queued results and recording each call's token.
#[derive(Default)]
pub struct ScriptedUsage {
    pub results: RefCell<Vec<StatusResult<RateLimitSnapshot>>>,
    pub tokens: RefCell<Vec<String>>,
}

impl ScriptedUsage {
    pub fn push(&self, result: StatusResult<RateLimitSnapshot>) {
        self.results.borrow_mut().push(result);
    }

    pub fn calls(&self) -> usize {
        self.tokens.borrow().len()
    }
}

impl UsageSource for ScriptedUsage {
    fn fetch(&self, credential: &Credential) -> StatusResult<RateLimitSnapshot> {
        self.tokens.borrow_mut().push(credential.token().to_string());
        let mut results = self.results.borrow_mut();
        if results.is_empty() {
            return Err(StatuslineError::RemoteFetchFailed("no scripted response".into()));
        }
        results.remove(0)
    }
}

/// Probe returning queued results and recording probed directories.
#[derive(Default)]
pub struct ScriptedProbe {
    pub results: RefCell<Vec<StatusResult<GitState>>>,
    pub dirs: RefCell<Vec<PathBuf>>,
}

impl ScriptedProbe {
    pub fn push(&self, result: StatusResult<GitState>) {
        self.results.borrow_mut().push(result);
    }

    pub fn calls(&self) -> usize {
        self.dirs.borrow().len()
    }
}

impl StatusProbe for ScriptedProbe {
    fn probe(&self, dir: &Path) -> StatusResult<GitState> {
        self.dirs.borrow_mut().push(dir.to_path_buf());
        let mut results = self.results.borrow_mut();
        if results.is_empty() {
            return Err(StatuslineError::GitCommandFailed("no scripted result".into()));
        }
        results.remove(0)
    }
}
