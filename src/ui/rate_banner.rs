use crate::github::rate_limit::RateLimitSnapshot;
use crate::ui::{format_relative, theme::ThemePalette};
use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer as Buf,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Banner text, or `None` when the quota is healthy or unknown.
pub fn banner_text(snapshot: &RateLimitSnapshot, now: &DateTime<Utc>) -> Option<String> {
    if !snapshot.should_warn() {
        return None;
    }
    let remaining = snapshot.remaining?;
    let limit = snapshot
        .limit
        .map(|l| l.to_string())
        .unwrap_or_else(|| "?".to_string());
    let mut text = format!("API rate limit: {remaining} / {limit} requests remaining.");
    if let Some(reset) = snapshot.reset_at {
        text.push_str(&format!(" Resets {}", format_relative(&reset, now)));
    }
    Some(text)
}

pub struct RateBanner<'a> {
    pub snapshot: &'a RateLimitSnapshot,
    pub palette: &'a ThemePalette,
}

impl<'a> Widget for RateBanner<'a> {
    fn render(self, area: Rect, buf: &mut Buf) {
        if area.height == 0 {
            return;
        }
        let Some(text) = banner_text(self.snapshot, &Utc::now()) else {
            return;
        };
        let line = Line::from(vec![
            Span::styled(
                " \u{26a0} ",
                Style::default()
                    .fg(self.palette.warn_fg)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(text, Style::default().fg(self.palette.warn_fg)),
        ]);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
