//! Pure rendering of the two status lines, and their serialization to text.

use chrono::{DateTime, Local, Utc};

#[cfg(feature = "colors")]
use owo_colors::OwoColorize;

use crate::models::{ExtraUsage, GitState, RateLimits, SessionSnapshot, UsageWindow};
use crate::utils::{format_countdown, format_currency, format_tokens, shorten_home};

const SEPARATOR: &str = " | ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    Green,
    Yellow,
    Red,
    Dim,
    Path,
    Branch,
    Opus,
    Sonnet,
    Haiku,
    Model,
}

/// Threshold colour for any percentage. Classifies the rounded value the user
/// sees, before clamping.
pub fn classify_percent(pct: f64) -> ColorClass {
    let pct = pct.round();
    if pct >= 90.0 {
        ColorClass::Red
    } else if pct >= 70.0 {
        ColorClass::Yellow
    } else {
        ColorClass::Green
    }
}

/// Percentages over 100 (or under 0) are clamped for display only.
pub fn display_percent(pct: f64) -> String {
    format!("{:.0}%", pct.clamp(0.0, 100.0).round())
}

pub fn model_color(model_id: &str) -> ColorClass {
    let lower = model_id.to_lowercase();
    if lower.contains("opus") {
        ColorClass::Opus
    } else if lower.contains("sonnet") {
        ColorClass::Sonnet
    } else if lower.contains("haiku") {
        ColorClass::Haiku
    } else {
        ColorClass::Model
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub color: Option<ColorClass>,
    pub link: Option<String>,
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            link: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: ColorClass) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
            link: None,
        }
    }

    pub fn linked(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub segments: Vec<Segment>,
}

impl Line {
    /// Append a group of segments, separated from the previous group.
    fn push_group(&mut self, group: Vec<Segment>) {
        if group.is_empty() {
            return;
        }
        if !self.segments.is_empty() {
            self.segments
                .push(Segment::colored(SEPARATOR, ColorClass::Dim));
        }
        self.segments.extend(group);
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Text only, no escapes.
    pub fn plain(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn to_ansi(&self, colors: bool, links: bool) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            let text = match seg.color {
                Some(color) if colors => paint(&seg.text, color),
                _ => seg.text.clone(),
            };
            match seg.link.as_deref() {
                Some(url) if links => out.push_str(&hyperlink(url, &text)),
                _ => out.push_str(&text),
            }
        }
        out
    }
}

/// OSC-8 hyperlink escape.
pub fn hyperlink(url: &str, text: &str) -> String {
    format!("\x1b]8;;{url}\x1b\\{text}\x1b]8;;\x1b\\")
}

#[cfg(feature = "colors")]
fn paint(text: &str, color: ColorClass) -> String {
    match color {
        ColorClass::Green => text.green().to_string(),
        ColorClass::Yellow => text.yellow().to_string(),
        ColorClass::Red => text.red().bold().to_string(),
        ColorClass::Dim => text.bright_black().dimmed().to_string(),
        ColorClass::Path => text.bright_blue().to_string(),
        ColorClass::Branch => text.bright_white().to_string(),
        ColorClass::Opus => text.bright_magenta().to_string(),
        ColorClass::Sonnet => text.bright_yellow().to_string(),
        ColorClass::Haiku => text.bright_cyan().to_string(),
        ColorClass::Model => text.bright_white().to_string(),
    }
}

#[cfg(not(feature = "colors"))]
fn paint(text: &str, _color: ColorClass) -> String {
    text.to_string()
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub now: DateTime<Utc>,
    pub home: Option<String>,
    pub use_12h: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStatus {
    pub line1: Line,
    pub line2: Line,
}

impl RenderedStatus {
    pub fn to_text(&self, colors: bool, links: bool) -> String {
        format!(
            "{}\n{}\n",
            self.line1.to_ansi(colors, links),
            self.line2.to_ansi(colors, links)
        )
    }
}

fn git_groups(git: &GitState) -> Vec<Vec<Segment>> {
    let Some(gs) = git.snapshot() else {
        return Vec::new();
    };

    let mut branch =
        vec![Segment::colored(gs.branch.clone(), ColorClass::Branch).linked(gs.branch_url())];
    for (count, prefix, color) in [
        (gs.staged, "+", ColorClass::Green),
        (gs.modified, "~", ColorClass::Yellow),
        (gs.untracked, "?", ColorClass::Dim),
    ] {
        if count > 0 {
            branch.push(Segment::plain(" "));
            branch.push(Segment::colored(format!("{prefix}{count}"), color));
        }
    }

    let mut groups = vec![branch];
    if gs.lines_added > 0 || gs.lines_removed > 0 {
        groups.push(vec![
            Segment::colored(format!("+{}", gs.lines_added), ColorClass::Green),
            Segment::colored("/", ColorClass::Dim),
            Segment::colored(format!("-{}", gs.lines_removed), ColorClass::Red),
        ]);
    }
    groups
}

fn window_group(label: &str, window: &UsageWindow, reset: Option<String>) -> Vec<Segment> {
    let Some(pct) = window.utilization else {
        return Vec::new();
    };
    let mut group = vec![
        Segment::colored(format!("{label} "), ColorClass::Dim),
        Segment::colored(display_percent(pct), classify_percent(pct)),
    ];
    if let Some(reset) = reset {
        group.push(Segment::colored(format!(" ({reset})"), ColorClass::Dim));
    }
    group
}

fn extra_group(extra: &ExtraUsage) -> Vec<Segment> {
    if !extra.is_enabled {
        return Vec::new();
    }
    let Some(used) = extra.used_credits else {
        return Vec::new();
    };
    let mut amount = format!("${}", format_currency(used / 100.0));
    if let Some(limit) = extra.monthly_limit {
        amount.push_str(&format!("/${}", format_currency(limit / 100.0)));
    }
    let amount = match extra.utilization {
        Some(pct) => Segment::colored(amount, classify_percent(pct)),
        None => Segment::plain(amount),
    };
    vec![Segment::colored("extra ", ColorClass::Dim), amount]
}

pub fn weekly_reset(reset: DateTime<Utc>, use_12h: bool) -> String {
    let fmt = if use_12h { "%b %-d %-I:%M %p" } else { "%b %-d %H:%M" };
    reset.with_timezone(&Local).format(fmt).to_string()
}

/// Build both lines. `rate_limits` is `None` when fetching is disabled, which
/// omits the usage segments instead of marking them unknown.
pub fn render(
    session: &SessionSnapshot,
    rate_limits: Option<&RateLimits>,
    git: &GitState,
    opts: &RenderOptions,
) -> RenderedStatus {
    let mut line1 = Line::default();
    line1.push_group(vec![Segment::colored(
        session.model_name.clone(),
        model_color(&session.model_id),
    )]);
    if let Some(cost) = session.cost_usd {
        line1.push_group(vec![Segment::colored(
            format!("${}", format_currency(cost)),
            ColorClass::Dim,
        )]);
    }
    if let Some(cwd) = session.cwd.as_deref() {
        line1.push_group(vec![Segment::colored(
            shorten_home(cwd, opts.home.as_deref()),
            ColorClass::Path,
        )]);
    }
    for group in git_groups(git) {
        line1.push_group(group);
    }

    let mut line2 = Line::default();
    if let (Some(pct), Some(used)) = (session.context_percent(), session.tokens_used) {
        line2.push_group(vec![
            Segment::colored("ctx ", ColorClass::Dim),
            Segment::colored(display_percent(pct), classify_percent(pct)),
            Segment::colored(
                format!(
                    " {}/{}",
                    format_tokens(used),
                    format_tokens(session.context_capacity())
                ),
                ColorClass::Dim,
            ),
        ]);
    }
    match rate_limits {
        Some(RateLimits::Unknown) => {
            line2.push_group(vec![Segment::colored("limits: n/a", ColorClass::Dim)]);
        }
        Some(limits) => {
            if let Some(snap) = limits.snapshot() {
                let short_reset = snap
                    .five_hour
                    .resets_at
                    .map(|r| format_countdown(r - opts.now));
                line2.push_group(window_group("5h", &snap.five_hour, short_reset));
                let week_reset = snap
                    .seven_day
                    .resets_at
                    .map(|r| weekly_reset(r, opts.use_12h));
                line2.push_group(window_group("7d", &snap.seven_day, week_reset));
                if let Some(extra) = &snap.extra_usage {
                    line2.push_group(extra_group(extra));
                }
            }
        }
        None => {}
    }

    RenderedStatus { line1, line2 }
}
