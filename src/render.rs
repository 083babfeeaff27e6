//! Text and JSON rendering of a status snapshot.
//!
//! One row per node: tier indicator, display name, region label and the
//! displayed latency, followed by a footer noting the refresh period.

use crate::error::Result;
use crate::feed::StatusSnapshot;
use crossterm::style::Stylize;
use std::fmt::Write;
use std::time::Duration;

/// Rendering options for [`render_board`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardStyle {
    /// Colour rows by tier using ANSI escapes
    pub color: bool,
    /// Refresh period shown in the footer (`None` hides the footer)
    pub interval: Option<Duration>,
}

impl Default for BoardStyle {
    fn default() -> Self {
        Self {
            color: true,
            interval: Some(crate::feed::DEFAULT_INTERVAL),
        }
    }
}

impl BoardStyle {
    pub fn plain() -> Self {
        Self {
            color: false,
            interval: None,
        }
    }
}

/// Render the snapshot as aligned text rows.
pub fn render_board(snapshot: &StatusSnapshot, style: &BoardStyle) -> String {
    let name_width = snapshot
        .nodes
        .iter()
        .map(|n| display_width(&n.display_name))
        .max()
        .unwrap_or(0);
    let region_width = snapshot
        .nodes
        .iter()
        .map(|n| display_width(&n.region))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for node in &snapshot.nodes {
        let name = pad(&node.display_name, name_width);
        let region = pad(&node.region, region_width);
        let latency = format!("{:>4}ms", node.current_latency_ms);

        if style.color {
            let color = node.tier.color();
            let _ = writeln!(
                out,
                "{} {}  {}  {}",
                node.tier.indicator().with(color),
                name.bold(),
                region.dark_grey(),
                latency.with(color).bold()
            );
        } else {
            let _ = writeln!(
                out,
                "{} {}  {}  {}",
                node.tier.indicator(),
                name,
                region,
                latency
            );
        }
    }

    if let Some(interval) = style.interval {
        out.push_str(&footer(interval));
        out.push('\n');
    }
    out
}

/// Render the snapshot as pretty JSON.
pub fn render_json(snapshot: &StatusSnapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Footer text for the given refresh period, e.g. "updates every 2.5s".
pub fn footer(interval: Duration) -> String {
    format!("updates every {:.1}s", interval.as_secs_f64())
}

// CJK characters occupy two terminal columns.
fn display_width(s: &str) -> usize {
    s.chars()
        .map(|c| if is_wide(c) { 2 } else { 1 })
        .sum()
}

fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6)
}

fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(s));
    format!("{}{}", s, " ".repeat(fill))
}
