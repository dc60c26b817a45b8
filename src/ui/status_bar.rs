use crate::github::rate_limit::RateLimitSnapshot;
use crate::ui::theme::{Theme, ThemePalette};
use ratatui::{
    buffer::Buffer as Buf,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

pub struct StatusBar<'a> {
    pub refresh_secs: u64,
    pub theme: Theme,
    pub has_token: bool,
    pub rate_limit: Option<&'a RateLimitSnapshot>,
    pub palette: &'a ThemePalette,
}

impl<'a> Widget for StatusBar<'a> {
    fn render(self, area: Rect, buf: &mut Buf) {
        let p = self.palette;
        let bg = Style::default().bg(p.status_bg).fg(p.text);
        for x in area.x..area.right() {
            buf[(x, area.y)].set_style(bg);
        }
        let sep = || Span::styled("\u{2502}", Style::default().fg(p.border).bg(p.status_bg));

        let refresh = if self.refresh_secs > 0 {
            format!(" auto {}s ", self.refresh_secs)
        } else {
            " manual ".to_string()
        };

        let mut spans = vec![
            Span::styled(refresh, bg),
            sep(),
            Span::styled(format!(" theme: {} ", self.theme), bg),
            sep(),
        ];

        if self.has_token {
            spans.push(Span::styled(
                " token \u{2713} ",
                Style::default().fg(p.ok_fg).bg(p.status_bg),
            ));
        } else {
            spans.push(Span::styled(
                " anonymous ",
                Style::default().fg(p.dim_text).bg(p.status_bg),
            ));
        }

        if let Some(remaining) = self.rate_limit.and_then(|r| r.remaining) {
            spans.push(sep());
            let limit = self
                .rate_limit
                .and_then(|r| r.limit)
                .map(|l| format!("/{l}"))
                .unwrap_or_default();
            let style = if self.rate_limit.is_some_and(|r| r.should_warn()) {
                Style::default()
                    .fg(p.warn_fg)
                    .bg(p.status_bg)
                    .add_modifier(Modifier::BOLD)
            } else {
                bg
            };
            spans.push(Span::styled(format!(" API: {remaining}{limit} "), style));
        }

        spans.push(sep());
        spans.push(Span::styled(" ? help ", Style::default().fg(p.dim_text).bg(p.status_bg)));

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
