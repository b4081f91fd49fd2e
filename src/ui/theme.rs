use ratatui::style::{Color, Modifier, Style};
use rust_decimal::Decimal;

use crate::engine::{SyncState, SyncStatus};
use crate::models::Bucket;

pub(crate) const BASE: Color = Color::Rgb(30, 30, 46);
pub(crate) const MANTLE: Color = Color::Rgb(24, 24, 37);
const SURFACE: Color = Color::Rgb(49, 50, 68);
const OVERLAY: Color = Color::Rgb(69, 71, 90);
const TEXT: Color = Color::Rgb(205, 214, 244);
pub(crate) const SUBTEXT: Color = Color::Rgb(127, 132, 156);
pub(crate) const ACCENT: Color = Color::Rgb(137, 180, 250);
pub(crate) const GREEN: Color = Color::Rgb(166, 227, 161);
pub(crate) const RED: Color = Color::Rgb(243, 139, 168);
const PEACH: Color = Color::Rgb(250, 179, 135);
pub(crate) const YELLOW: Color = Color::Rgb(249, 226, 175);

// ── Text ──────────────────────────────────────────────────────

pub(crate) fn normal_style() -> Style {
    Style::default().fg(TEXT)
}

pub(crate) fn dim_style() -> Style {
    Style::default().fg(SUBTEXT)
}

pub(crate) fn heading_style() -> Style {
    Style::default().fg(YELLOW).add_modifier(Modifier::BOLD)
}

pub(crate) fn border_style() -> Style {
    Style::default().fg(OVERLAY)
}

pub(crate) fn block_title_style() -> Style {
    Style::default().fg(SUBTEXT).add_modifier(Modifier::BOLD)
}

// ── Grid ──────────────────────────────────────────────────────

pub(crate) fn header_style() -> Style {
    Style::default().fg(TEXT).bg(BASE).add_modifier(Modifier::BOLD)
}

pub(crate) fn striped_row_style() -> Style {
    Style::default().fg(TEXT).bg(SURFACE)
}

pub(crate) fn selected_row_style() -> Style {
    Style::default().fg(TEXT).bg(OVERLAY)
}

/// The single cell under the cursor.
pub(crate) fn cursor_style() -> Style {
    Style::default().fg(BASE).bg(ACCENT)
}

/// A cell whose value is still only in the edit buffer.
pub(crate) fn pending_style(base: Style) -> Style {
    base.fg(YELLOW).add_modifier(Modifier::ITALIC)
}

pub(crate) fn bucket_color(bucket: Bucket) -> Color {
    match bucket {
        Bucket::Income => GREEN,
        Bucket::FixedExpense => RED,
        Bucket::VariableExpense => PEACH,
    }
}

pub(crate) fn bucket_style(bucket: Bucket) -> Style {
    Style::default().fg(bucket_color(bucket))
}

/// Green for a surplus (or break-even), red for a deficit.
pub(crate) fn signed_color(amount: Decimal) -> Color {
    if amount < Decimal::ZERO {
        RED
    } else {
        GREEN
    }
}

// ── Bars ──────────────────────────────────────────────────────

pub(crate) fn badge_style(bg: Color) -> Style {
    Style::default().fg(BASE).bg(bg).add_modifier(Modifier::BOLD)
}

pub(crate) fn command_bar_style() -> Style {
    Style::default().fg(TEXT).bg(MANTLE)
}

pub(crate) fn status_bar_style() -> Style {
    Style::default().fg(SUBTEXT).bg(SURFACE)
}

/// Status-bar label and colour for the save state.
pub(crate) fn sync_badge(status: &SyncStatus) -> (String, Style) {
    let (label, color) = match (&status.last_error, status.state) {
        (Some(_), SyncState::Armed) => (
            format!(" unsaved: {} (save failed) ", status.pending_count),
            RED,
        ),
        (_, SyncState::Idle) => (" saved ".to_string(), GREEN),
        (_, SyncState::Armed) => (format!(" {} pending ", status.pending_count), YELLOW),
        (_, SyncState::Flushing) => (" saving… ".to_string(), ACCENT),
    };
    let style = Style::default()
        .fg(color)
        .bg(SURFACE)
        .add_modifier(Modifier::BOLD);
    (label, style)
}
