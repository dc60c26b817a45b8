use crate::ui::{theme::ThemePalette, truncate_with_ellipsis};
use ratatui::{
    buffer::Buffer as Buf,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Error,
    Success,
    Info,
}

impl NotifyLevel {
    pub fn ttl(&self) -> Duration {
        match self {
            NotifyLevel::Error => Duration::from_secs(10),
            NotifyLevel::Success => Duration::from_secs(4),
            NotifyLevel::Info => Duration::from_secs(4),
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            NotifyLevel::Error => "\u{2716}",
            NotifyLevel::Success => "\u{2714}",
            NotifyLevel::Info => "\u{2139}",
        }
    }

    pub fn color(&self, palette: &ThemePalette) -> Color {
        match self {
            NotifyLevel::Error => palette.error_fg,
            NotifyLevel::Success => palette.ok_fg,
            NotifyLevel::Info => palette.accent,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotifyLevel,
    pub created: Instant,
}

impl Notification {
    pub fn new(level: NotifyLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
            created: Instant::now(),
        }
    }

    pub fn expired(&self) -> bool {
        self.created.elapsed() >= self.level.ttl()
    }
}

/// Top-right popup under the header bar. Long messages wrap onto a second
/// line before truncating.
pub struct Toast<'a> {
    pub notification: &'a Notification,
    pub palette: &'a ThemePalette,
}

const MAX_TOAST_W: usize = 60;

impl<'a> Widget for Toast<'a> {
    fn render(self, area: Rect, buf: &mut Buf) {
        let n = self.notification;
        let color = n.level.color(self.palette);
        let text = format!("{} {}", n.level.icon(), n.message.replace('\n', " "));

        let max_inner = MAX_TOAST_W.min((area.width as usize).saturating_sub(4));
        if max_inner < 4 || area.height < 5 {
            return;
        }
        let rows = wrap_two(&text, max_inner);
        let inner_w = rows
            .iter()
            .map(|r| UnicodeWidthStr::width(r.as_str()))
            .max()
            .unwrap_or(0);

        let box_w = inner_w as u16 + 2;
        let box_h = rows.len() as u16 + 2;
        let toast_area = Rect::new(
            area.right().saturating_sub(box_w + 1),
            area.y + 1,
            box_w,
            box_h,
        );

        Clear.render(toast_area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(self.palette.app_bg));
        let inner = block.inner(toast_area);
        block.render(toast_area, buf);

        for (i, row) in rows.into_iter().enumerate() {
            buf.set_line(
                inner.x,
                inner.y + i as u16,
                &Line::from(Span::styled(row, Style::default().fg(color))),
                inner.width,
            );
        }
    }
}

/// Splits on the last space that fits; the overflow goes on a second,
/// ellipsized row.
fn wrap_two(text: &str, width: usize) -> Vec<String> {
    if UnicodeWidthStr::width(text) <= width {
        return vec![text.to_string()];
    }
    let mut first = String::new();
    let mut used = 0;
    let mut split_at = None;
    for (idx, ch) in text.char_indices() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width {
            break;
        }
        if ch == ' ' {
            split_at = Some(idx);
        }
        used += w;
        first.push(ch);
    }
    let cut = if text[first.len()..].starts_with(' ') {
        first.len()
    } else {
        split_at.unwrap_or(first.len())
    };
    let head = text[..cut].trim_end().to_string();
    let tail = text[cut..].trim_start();
    vec![head, truncate_with_ellipsis(tail, width)]
}
