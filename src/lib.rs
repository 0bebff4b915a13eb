//! # Claude Statusbar
//!
//! A two-line status bar for Claude Code sessions: model, directory and git
//! state on the first line; context and plan usage on the second.
//!
//! ## Overview
//!
//! Each render is a fresh process reading the session JSON from stdin. The
//! expensive inputs are cached across processes with short TTLs:
//! - usage limits from the OAuth usage API (60 s)
//! - git status per working directory (5 s)
//!
//! A failure in any source only removes or staleness-marks its segments.
//!
//! ## Features
//!
//! - `git` (default): Enables repository inspection via gix
//! - `colors` (default): Enables terminal color output via owo-colors

/// Generic TTL cache entries
pub mod cache;

/// Command-line argument parsing and configuration
pub mod cli;

/// OAuth credential resolution
pub mod credentials;

/// SQLite cache store
pub mod db;

/// Rendering and ANSI serialization
pub mod display;

/// Failure taxonomy
pub mod error;

/// Git repository inspection
pub mod git;

/// Per-directory git status cache
pub mod git_status;

/// stderr diagnostics
pub mod logging;

/// Data models for session input, rate limits and git state
pub mod models;

/// Subprocesses with timeouts
pub mod process;

/// Usage-limit cache
pub mod rate_limits;

/// Cache aggregation
pub mod status;

/// Cache store abstraction
pub mod store;

/// Online usage limits retrieved from the Claude OAuth API
pub mod usage_api;

/// Utility functions for paths, formatting, and time
pub mod utils;
