//! Shared UI theme constants and status colors.

use ratatui::style::Color;

use crate::charts::GaugeTier;
use crate::notify::Level;
use crate::types::{AgentStatus, Metric, Severity};
use crate::view::StatusTier;

// Scrollbar colors
pub const SB_ARROW: Color = Color::Rgb(170, 170, 180);
pub const SB_TRACK: Color = Color::Rgb(170, 170, 180);
pub const SB_THUMB: Color = Color::Rgb(170, 170, 180);

pub const ACCENT: Color = Color::Cyan;
pub const MUTED: Color = Color::DarkGray;

pub fn tier_color(t: StatusTier) -> Color {
    match t {
        StatusTier::Normal => Color::Green,
        StatusTier::Warning => Color::Yellow,
        StatusTier::Danger => Color::Red,
    }
}

pub fn gauge_color(t: GaugeTier) -> Color {
    match t {
        GaugeTier::Normal => Color::Green,
        GaugeTier::Warning => Color::Yellow,
        GaugeTier::Danger => Color::Red,
    }
}

pub fn series_color(m: Metric) -> Color {
    match m {
        Metric::Cpu => Color::Cyan,
        Metric::Memory => Color::Magenta,
        Metric::Disk => Color::Yellow,
    }
}

pub fn status_color(s: AgentStatus) -> Color {
    match s {
        AgentStatus::Online => Color::Green,
        AgentStatus::Warning => Color::Yellow,
        AgentStatus::Offline => Color::Red,
        AgentStatus::Unknown => MUTED,
    }
}

pub fn severity_color(s: Severity) -> Color {
    match s {
        Severity::Critical | Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::Blue,
    }
}

pub fn level_color(l: Level) -> Color {
    match l {
        Level::Success => Color::Green,
        Level::Info => Color::Blue,
        Level::Warning => Color::Yellow,
        Level::Error => Color::Red,
    }
}
