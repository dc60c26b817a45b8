use crate::ui::theme::ThemePalette;
use ratatui::{
    buffer::Buffer as Buf,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

#[derive(Debug, Clone, Default)]
pub struct TokenInputState {
    pub draft: String,
    pub validating: bool,
    pub error: Option<String>,
}

pub struct TokenInput<'a> {
    pub state: &'a TokenInputState,
    pub has_token: bool,
    pub palette: &'a ThemePalette,
}

impl<'a> Widget for TokenInput<'a> {
    fn render(self, area: Rect, buf: &mut Buf) {
        let p = self.palette;
        let popup = super::centered_rect(70, 50, area);
        Clear.render(popup, buf);

        let block = Block::default()
            .title(" GitHub token ")
            .title_style(Style::default().fg(p.accent).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.accent))
            .style(Style::default().bg(p.app_bg).fg(p.text));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let masked = "\u{2022}".repeat(self.state.draft.chars().count());
        let status = if self.state.validating {
            Span::styled("Validating...", Style::default().fg(p.warn_fg))
        } else if self.has_token {
            Span::styled("A token is saved.", Style::default().fg(p.ok_fg))
        } else {
            Span::styled("No token saved.", Style::default().fg(p.dim_text))
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled("> ", Style::default().fg(p.accent)),
                Span::raw(masked),
                Span::styled("\u{258c}", Style::default().fg(p.accent)),
            ]),
            Line::from(status),
        ];
        if let Some(err) = &self.state.error {
            lines.push(Line::from(Span::styled(
                err.clone(),
                Style::default().fg(p.error_fg),
            )));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "A personal access token raises the API limit from 60 to 5,000 requests per hour.",
            Style::default().fg(p.dim_text),
        )));
        lines.push(Line::from(Span::styled(
            "Create one with public_repo scope at github.com/settings/tokens",
            Style::default().fg(p.dim_text),
        )));
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "Enter save \u{00b7} Ctrl-D clear saved token \u{00b7} Esc cancel",
            Style::default().fg(p.dim_text),
        )));

        for (i, line) in lines.iter().enumerate() {
            if i >= inner.height as usize {
                break;
            }
            buf.set_line(inner.x + 1, inner.y + i as u16, line, inner.width.saturating_sub(1));
        }
    }
}
