pub mod commit_list;
pub mod header_bar;
pub mod help_panel;
pub mod input;
pub mod issue_list;
pub mod rate_banner;
pub mod repo_summary;
pub mod resource_view;
pub mod status_bar;
pub mod theme;
pub mod toast;
pub mod token_input;

use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer as Buf,
    layout::{Constraint, Layout, Rect},
    style::Style,
};
use unicode_width::UnicodeWidthStr;

pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    if UnicodeWidthStr::width(s) <= max {
        return s.to_string();
    }
    if max <= 1 {
        return "\u{2026}".to_string();
    }
    let mut result = String::new();
    let mut w = 0;
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if w + cw > max - 1 {
            break;
        }
        result.push(ch);
        w += cw;
    }
    result.push('\u{2026}');
    result
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vert = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Min(0),
    ])
    .split(area);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Min(0),
    ])
    .split(vert[1])[1]
}

pub fn fill(buf: &mut Buf, area: Rect, style: Style) {
    for y in area.y..area.bottom() {
        for x in area.x..area.right() {
            buf[(x, y)].set_style(style);
        }
    }
}

fn duration_bucket(secs: i64) -> (i64, &'static str) {
    let minutes = secs / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    if secs < 60 {
        (secs, "second")
    } else if minutes < 60 {
        (minutes, "minute")
    } else if hours < 24 {
        (hours, "hour")
    } else if days < 30 {
        (days, "day")
    } else if days < 365 {
        (days / 30, "month")
    } else {
        (days / 365, "year")
    }
}

/// "3 minutes ago" for past times, "in 3 minutes" for future ones.
pub fn format_relative(time: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(*time).num_seconds();
    if secs.abs() < 10 {
        return "just now".to_string();
    }
    let (val, unit) = duration_bucket(secs.abs());
    let plural = if val == 1 { "" } else { "s" };
    if secs >= 0 {
        format!("{val} {unit}{plural} ago")
    } else {
        format!("in {val} {unit}{plural}")
    }
}

pub fn format_time_ago(time: &DateTime<Utc>) -> String {
    format_relative(time, &Utc::now())
}
