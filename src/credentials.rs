//! # Credentials Module
//!
//! Locates the OAuth access token used for the usage endpoint. Sources are
//! tried in order and the first non-empty token wins; each source's failure is
//! logged and skipped. Nothing here is cached: the token's lifetime is managed
//! by the host, so callers cache what they fetch with it instead.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tracing::debug;

use crate::error::{StatusResult, StatuslineError};
use crate::process::run_with_timeout;

/// Base keychain service name used by the host application.
pub const KEYCHAIN_SERVICE: &str = "Claude Code-credentials";
pub const CREDENTIALS_FILE: &str = ".credentials.json";

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| t <= now)
    }
}

// Never print the bearer token.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Parse the host's credentials document:
/// `{"claudeAiOauth": {"accessToken": "...", "expiresAt": <epoch ms>}}`
pub fn parse_credentials_json(raw: &str) -> Result<Credential> {
    let json: Value = serde_json::from_str(raw).context("credentials are not JSON")?;
    let oauth = json
        .get("claudeAiOauth")
        .context("missing claudeAiOauth section")?;
    let token = oauth
        .get("accessToken")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if token.is_empty() {
        bail!("empty accessToken");
    }
    let expires_at = oauth
        .get("expiresAt")
        .and_then(Value::as_i64)
        .and_then(DateTime::<Utc>::from_timestamp_millis);
    Ok(Credential::new(token, expires_at))
}

pub trait CredentialSource {
    fn name(&self) -> &'static str;
    fn load(&self) -> Result<Credential>;
}

/// Token passed explicitly through the environment.
pub struct EnvTokenSource {
    vars: Vec<&'static str>,
}

impl EnvTokenSource {
    pub fn new(vars: Vec<&'static str>) -> Self {
        Self { vars }
    }
}

impl Default for EnvTokenSource {
    fn default() -> Self {
        Self::new(vec!["CLAUDE_CODE_OAUTH_TOKEN", "ANTHROPIC_AUTH_TOKEN"])
    }
}

impl CredentialSource for EnvTokenSource {
    fn name(&self) -> &'static str {
        "env"
    }

    fn load(&self) -> Result<Credential> {
        for var in &self.vars {
            if let Ok(val) = env::var(var) {
                let trimmed = val.trim();
                if !trimmed.is_empty() {
                    return Ok(Credential::new(trimmed, None));
                }
            }
        }
        bail!("none of {:?} set", self.vars)
    }
}

/// `.credentials.json` files, first readable one with a token wins.
pub struct CredentialsFileSource {
    paths: Vec<PathBuf>,
}

impl CredentialsFileSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// One candidate per Claude data directory, then the legacy `~/.claude`
    /// location.
    pub fn for_dirs(claude_dirs: &[PathBuf]) -> Self {
        let mut paths: Vec<PathBuf> = claude_dirs
            .iter()
            .map(|d| d.join(CREDENTIALS_FILE))
            .collect();
        if let Some(base_dirs) = directories::BaseDirs::new() {
            let legacy = base_dirs.home_dir().join(".claude").join(CREDENTIALS_FILE);
            if !paths.contains(&legacy) {
                paths.push(legacy);
            }
        }
        Self::new(paths)
    }
}

impl CredentialSource for CredentialsFileSource {
    fn name(&self) -> &'static str {
        "credentials-file"
    }

    fn load(&self) -> Result<Credential> {
        for path in &self.paths {
            let raw = match fs::read_to_string(path) {
                Ok(raw) => raw,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "credentials file unreadable");
                    continue;
                }
            };
            match parse_credentials_json(&raw) {
                Ok(cred) => return Ok(cred),
                Err(e) => debug!(path = %path.display(), error = %e, "credentials file rejected"),
            }
        }
        bail!("no usable credentials file among {} candidates", self.paths.len())
    }
}

/// First 8 hex chars of the SHA-256 of a custom `CLAUDE_CONFIG_DIR`, which
/// tells accounts apart. `None` for the default directory.
pub fn config_dir_suffix(config_dir: Option<&str>) -> Option<String> {
    let dir = config_dir.filter(|d| !d.is_empty())?;
    let hash = Sha256::digest(dir.as_bytes());
    Some(format!("{:x}", hash).chars().take(8).collect())
}

/// Service name for the OS store. A custom `CLAUDE_CONFIG_DIR` gets its own
/// entry.
pub fn keychain_service_name(config_dir: Option<&str>) -> String {
    match config_dir_suffix(config_dir) {
        Some(suffix) => format!("{KEYCHAIN_SERVICE}-{suffix}"),
        None => KEYCHAIN_SERVICE.to_string(),
    }
}

/// OS-native secure storage: macOS Keychain or the freedesktop secret service.
pub struct OsStoreSource {
    service: String,
    account: Option<String>,
    timeout: Duration,
}

impl OsStoreSource {
    pub fn new(service: String, account: Option<String>, timeout: Duration) -> Self {
        Self {
            service,
            account,
            timeout,
        }
    }

    pub fn from_env(timeout: Duration) -> Self {
        let config_dir = env::var("CLAUDE_CONFIG_DIR").ok();
        Self::new(
            keychain_service_name(config_dir.as_deref()),
            env::var("USER").ok().filter(|u| !u.is_empty()),
            timeout,
        )
    }

    fn command(&self) -> Result<Command> {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("security");
            cmd.arg("find-generic-password");
            if let Some(account) = &self.account {
                cmd.args(["-a", account]);
            }
            cmd.args(["-s", &self.service, "-w"]);
            Ok(cmd)
        } else if cfg!(target_os = "linux") {
            let mut cmd = Command::new("secret-tool");
            cmd.args(["lookup", "service", &self.service]);
            if let Some(account) = &self.account {
                cmd.args(["account", account]);
            }
            Ok(cmd)
        } else {
            bail!("no OS credential store on this platform")
        }
    }
}

impl CredentialSource for OsStoreSource {
    fn name(&self) -> &'static str {
        "os-store"
    }

    fn load(&self) -> Result<Credential> {
        let mut cmd = self.command()?;
        let out = run_with_timeout(&mut cmd, self.timeout)
            .with_context(|| format!("query OS store for {}", self.service))?;
        let secret = out.trim();
        if secret.is_empty() {
            bail!("OS store entry is empty");
        }
        // The host stores the whole credentials document; accept a bare token too.
        if secret.starts_with('{') {
            parse_credentials_json(secret)
        } else {
            Ok(Credential::new(secret, None))
        }
    }
}

pub struct CredentialResolver {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl CredentialResolver {
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self { sources }
    }

    /// Environment, then credentials files, then the OS store.
    pub fn standard(claude_dirs: &[PathBuf], timeout: Duration) -> Self {
        Self::new(vec![
            Box::new(EnvTokenSource::default()),
            Box::new(CredentialsFileSource::for_dirs(claude_dirs)),
            Box::new(OsStoreSource::from_env(timeout)),
        ])
    }

    /// First source yielding an unexpired token. An expired token would only
    /// earn a 401, so the next source is tried instead.
    pub fn resolve(&self) -> StatusResult<Credential> {
        let now = Utc::now();
        for source in &self.sources {
            match source.load() {
                Ok(cred) if cred.is_expired(now) => {
                    debug!(source = source.name(), "credential expired, skipping");
                }
                Ok(cred) => {
                    debug!(source = source.name(), "credential resolved");
                    return Ok(cred);
                }
                Err(e) => debug!(source = source.name(), error = %e, "credential source failed"),
            }
        }
        Err(StatuslineError::NoCredentialFound)
    }
}
