use crate::ui::theme::{Theme, ThemePalette};
use ratatui::{
    buffer::Buffer as Buf,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigate",
        &[
            ("j/k  \u{2191}/\u{2193}", "Move selection"),
            ("h/l  Tab", "Switch tab"),
        ],
    ),
    (
        "Data",
        &[
            ("r", "Refresh now"),
            ("a", "Toggle auto-refresh"),
            ("i", "Cycle refresh interval"),
        ],
    ),
    (
        "Settings",
        &[
            ("t", "Cycle theme"),
            ("T", "GitHub token"),
            ("e", "Embed URLs"),
            ("i / t", "In embed panel: widget refresh / theme"),
        ],
    ),
    ("", &[("?", "Toggle this help"), ("q  Esc", "Quit / close popup")]),
];

const KEY_COL_W: usize = 12;

pub struct HelpPanel<'a> {
    pub palette: &'a ThemePalette,
}

impl<'a> Widget for HelpPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buf) {
        let p = self.palette;
        let popup = super::centered_rect(50, 70, area);
        Clear.render(popup, buf);

        let block = Block::default()
            .title(" Keybindings ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.accent))
            .style(Style::default().bg(p.app_bg).fg(p.text));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let mut lines: Vec<Line> = Vec::new();
        for (title, bindings) in SECTIONS {
            if !lines.is_empty() {
                lines.push(Line::raw(""));
            }
            if !title.is_empty() {
                lines.push(Line::from(Span::styled(
                    title.to_string(),
                    Style::default().fg(p.dim_text).add_modifier(Modifier::UNDERLINED),
                )));
            }
            for (key, desc) in bindings.iter() {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!(" {key:<KEY_COL_W$}"),
                        Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(desc.to_string()),
                ]));
            }
        }

        for (i, line) in lines.iter().take(inner.height as usize).enumerate() {
            buf.set_line(inner.x + 1, inner.y + i as u16, line, inner.width.saturating_sub(1));
        }
    }
}

/// Embeddable widget URLs for the current repository with the settings
/// baked into them.
pub struct EmbedPanel<'a> {
    pub urls: &'a [(String, String)],
    pub refresh_secs: u64,
    pub theme: Theme,
    pub snippet: &'a str,
    pub palette: &'a ThemePalette,
}

impl<'a> Widget for EmbedPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buf) {
        let p = self.palette;
        let popup = super::centered_rect(90, 60, area);
        Clear.render(popup, buf);

        let block = Block::default()
            .title(" Embed URLs ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.accent))
            .style(Style::default().bg(p.app_bg).fg(p.text));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let heading = Style::default().fg(p.accent).add_modifier(Modifier::BOLD);
        let dim = Style::default().fg(p.dim_text);
        let refresh = match self.refresh_secs {
            0 => "off".to_string(),
            n => format!("{n}s"),
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Refresh ", dim),
                Span::raw(refresh),
                Span::styled("   Theme ", dim),
                Span::raw(self.theme.to_string()),
                Span::styled("   (i / t to change)", dim),
            ]),
            Line::raw(""),
        ];
        for (label, url) in self.urls {
            lines.push(Line::from(Span::styled(label.clone(), heading)));
            lines.push(Line::raw(url.clone()));
            lines.push(Line::raw(""));
        }
        if !self.snippet.is_empty() {
            lines.push(Line::from(Span::styled("Example iframe", heading)));
            lines.push(Line::raw(self.snippet.to_string()));
            lines.push(Line::raw(""));
        }
        lines.push(Line::from(Span::styled(
            "Refresh 0 disables auto-refresh in widgets (avoids rate limiting).",
            dim,
        )));

        for (i, line) in lines.iter().take(inner.height as usize).enumerate() {
            buf.set_line(inner.x + 1, inner.y + i as u16, line, inner.width.saturating_sub(1));
        }
    }
}
