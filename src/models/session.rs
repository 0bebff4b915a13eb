use serde_json::Value;

use crate::error::{StatusResult, StatuslineError};

/// Fraction of the context window at which the host compacts history.
/// Context usage is displayed relative to this threshold, not the raw window.
pub const AUTOCOMPACT_FRACTION: f64 = 0.8;

/// Window size assumed when the payload reports usage but no capacity.
pub const DEFAULT_CONTEXT_WINDOW: u64 = 200_000;

/// One render call's view of the host session, built from the stdin payload.
///
/// Only the model is required. Every other field is extracted leniently: a
/// missing or mistyped value becomes `None` and its segment is omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub model_id: String,
    pub model_name: String,
    pub cwd: Option<String>,
    pub tokens_used: Option<u64>,
    pub tokens_total: Option<u64>,
    /// Session cost so far, as reported by the host
    pub cost_usd: Option<f64>,
    /// Host version, used for the outbound User-Agent
    pub version: Option<String>,
}

fn non_empty_str(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn as_tokens(v: Option<&Value>) -> Option<u64> {
    let v = v?;
    v.as_u64()
        .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
}

impl SessionSnapshot {
    pub fn from_slice(bytes: &[u8]) -> StatusResult<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(StatuslineError::InvalidInput("empty input".into()));
        }
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| StatuslineError::InvalidInput(format!("parse session json: {e}")))?;
        Self::from_value(&value)
    }

    pub fn from_value(v: &Value) -> StatusResult<Self> {
        if !v.is_object() {
            return Err(StatuslineError::InvalidInput(
                "session payload is not an object".into(),
            ));
        }

        // `model` is either {"id", "display_name"} or a bare string.
        let model = v.get("model");
        let (model_id, model_name) = match model {
            Some(Value::String(s)) if !s.trim().is_empty() => {
                (s.trim().to_string(), s.trim().to_string())
            }
            Some(obj @ Value::Object(_)) => {
                let id = non_empty_str(obj.get("id"));
                let name = non_empty_str(obj.get("display_name"));
                match (id, name) {
                    (Some(id), Some(name)) => (id, name),
                    (Some(id), None) => (id.clone(), id),
                    (None, Some(name)) => (name.clone(), name),
                    (None, None) => {
                        return Err(StatuslineError::InvalidInput("model has no id".into()));
                    }
                }
            }
            _ => return Err(StatuslineError::InvalidInput("missing model".into())),
        };

        let cwd = non_empty_str(v.get("workspace").and_then(|w| w.get("current_dir")))
            .or_else(|| non_empty_str(v.get("cwd")));

        let ctx = v.get("context_window");
        let tokens_used = ctx
            .and_then(|c| c.get("current_usage"))
            .filter(|u| u.is_object())
            .and_then(|u| {
                let parts = [
                    "input_tokens",
                    "cache_creation_input_tokens",
                    "cache_read_input_tokens",
                ]
                .map(|k| as_tokens(u.get(k)));
                if parts.iter().all(Option::is_none) {
                    None
                } else {
                    Some(parts.iter().flatten().sum())
                }
            })
            .or_else(|| as_tokens(v.get("tokens_used")));
        let tokens_total = as_tokens(ctx.and_then(|c| c.get("context_window_size")))
            .or_else(|| as_tokens(v.get("tokens_total")));

        let cost_usd = v
            .get("cost")
            .and_then(|c| c.get("total_cost_usd"))
            .and_then(Value::as_f64)
            .filter(|c| c.is_finite() && *c >= 0.0);

        Ok(SessionSnapshot {
            model_id,
            model_name,
            cwd,
            tokens_used,
            tokens_total,
            cost_usd,
            version: non_empty_str(v.get("version")),
        })
    }

    /// Reported window size, else [`DEFAULT_CONTEXT_WINDOW`].
    pub fn context_capacity(&self) -> u64 {
        self.tokens_total
            .filter(|t| *t > 0)
            .unwrap_or(DEFAULT_CONTEXT_WINDOW)
    }

    /// Context usage relative to the autocompact threshold, unclamped.
    pub fn context_percent(&self) -> Option<f64> {
        let used = self.tokens_used?;
        let total = self.context_capacity();
        Some(100.0 * used as f64 / (total as f64 * AUTOCOMPACT_FRACTION))
    }
}
