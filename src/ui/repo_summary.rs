use crate::github::types::RepositorySummary;
use crate::ui::{format_time_ago, theme::ThemePalette, truncate_with_ellipsis};
use ratatui::{
    buffer::Buffer as Buf,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Thousands separators, e.g. `12,345`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub struct RepoSummaryView<'a> {
    pub summary: &'a RepositorySummary,
    pub palette: &'a ThemePalette,
    pub compact: bool,
}

impl<'a> Widget for RepoSummaryView<'a> {
    fn render(self, area: Rect, buf: &mut Buf) {
        let p = self.palette;
        let s = self.summary;
        let w = area.width as usize;
        let mut lines: Vec<Line> = Vec::new();

        let title = if s.full_name.is_empty() { &s.name } else { &s.full_name };
        lines.push(Line::from(Span::styled(
            title.clone(),
            Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
        )));

        if let Some(desc) = s.description.as_deref().filter(|d| !d.is_empty()) {
            lines.push(Line::from(Span::styled(
                truncate_with_ellipsis(desc, w),
                Style::default().fg(p.text),
            )));
        }

        let stat = |icon: &str, label: &str, value: u64| -> Vec<Span<'static>> {
            vec![
                Span::styled(format!("{icon} "), Style::default().fg(p.star)),
                Span::styled(
                    format_count(value),
                    Style::default().fg(p.text).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" {label}   "), Style::default().fg(p.dim_text)),
            ]
        };

        let mut stats = stat("\u{2605}", "stars", s.stargazers_count);
        stats.extend(stat("\u{2442}", "forks", s.forks_count));
        if self.compact {
            lines.push(Line::from(stats));
            let mut second = stat("\u{25c9}", "watchers", s.watchers_count);
            second.extend(stat("\u{25cb}", "open issues", s.open_issues_count));
            lines.push(Line::from(second));
        } else {
            stats.extend(stat("\u{25c9}", "watchers", s.watchers_count));
            stats.extend(stat("\u{25cb}", "open issues", s.open_issues_count));
            lines.push(Line::from(stats));
        }

        let mut meta: Vec<Span> = Vec::new();
        if let Some(lang) = s.language.as_deref() {
            meta.push(Span::styled(format!("{lang}  "), Style::default().fg(p.ok_fg)));
        }
        if let Some(updated) = &s.updated_at {
            meta.push(Span::styled(
                format!("updated {}  ", format_time_ago(updated)),
                Style::default().fg(p.dim_text),
            ));
        }
        if !self.compact {
            if let Some(created) = &s.created_at {
                meta.push(Span::styled(
                    format!("created {}", created.format("%Y-%m-%d")),
                    Style::default().fg(p.dim_text),
                ));
            }
        }
        if !meta.is_empty() {
            lines.push(Line::from(meta));
        }

        if !self.compact && !s.topics.is_empty() {
            let topics: Vec<Span> = s
                .topics
                .iter()
                .map(|t| Span::styled(format!("[{t}] "), Style::default().fg(p.accent)))
                .collect();
            lines.push(Line::from(topics));
        }

        for (i, line) in lines.iter().enumerate() {
            if i >= area.height as usize {
                break;
            }
            buf.set_line(area.x, area.y + i as u16, line, area.width);
        }
    }
}
