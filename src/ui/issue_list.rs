use crate::github::types::{IssueRecord, Label, PullRequestRecord};
use crate::ui::{format_time_ago, theme::ThemePalette, truncate_with_ellipsis};
use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer as Buf,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

/// Issues and pull requests share one row layout.
pub trait TicketRow {
    fn number(&self) -> u64;
    fn title(&self) -> &str;
    fn opened_by(&self) -> &str;
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn labels(&self) -> &[Label];
    fn comments(&self) -> u64 {
        0
    }
    fn marker(&self) -> &'static str;
}

impl TicketRow for IssueRecord {
    fn number(&self) -> u64 {
        self.number
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn opened_by(&self) -> &str {
        &self.user.login
    }
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
    fn labels(&self) -> &[Label] {
        &self.labels
    }
    fn comments(&self) -> u64 {
        self.comments
    }
    fn marker(&self) -> &'static str {
        "\u{25cb}"
    }
}

impl TicketRow for PullRequestRecord {
    fn number(&self) -> u64 {
        self.number
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn opened_by(&self) -> &str {
        &self.user.login
    }
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
    fn labels(&self) -> &[Label] {
        &self.labels
    }
    fn marker(&self) -> &'static str {
        if self.draft {
            "\u{25cc}"
        } else {
            "\u{2387}"
        }
    }
}

/// Label hex color, falling back to the palette accent.
pub fn label_color(label: &Label, fallback: Color) -> Color {
    let hex = label.color.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return fallback;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => fallback,
    }
}

pub struct TicketList<'a, T: TicketRow> {
    pub items: &'a [T],
    pub palette: &'a ThemePalette,
    pub scroll: usize,
    pub selected: Option<usize>,
    pub compact: bool,
}

impl<'a, T: TicketRow> Widget for TicketList<'a, T> {
    fn render(self, area: Rect, buf: &mut Buf) {
        let p = self.palette;
        let max_labels = if self.compact { 2 } else { 3 };
        let rows_per_item: usize = if self.compact { 1 } else { 2 };
        let visible = area.height as usize / rows_per_item;
        let w = area.width as usize;

        for (slot, (idx, item)) in self
            .items
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(visible)
            .enumerate()
        {
            let y = area.y + (slot * rows_per_item) as u16;
            let base = if self.selected == Some(idx) {
                Style::default().bg(p.selected_bg)
            } else {
                Style::default()
            };

            let prefix = format!("{} #{} ", item.marker(), item.number());
            let mut label_spans: Vec<Span> = Vec::new();
            for label in item.labels().iter().take(max_labels) {
                label_spans.push(Span::styled(
                    format!(" {} ", label.name),
                    base.fg(label_color(label, p.accent)),
                ));
            }
            if item.labels().len() > max_labels {
                label_spans.push(Span::styled(
                    format!(" +{} more", item.labels().len() - max_labels),
                    base.fg(p.dim_text),
                ));
            }
            let labels_w: usize = label_spans
                .iter()
                .map(|s| UnicodeWidthStr::width(s.content.as_ref()))
                .sum();

            let budget = w
                .saturating_sub(UnicodeWidthStr::width(prefix.as_str()))
                .saturating_sub(labels_w);
            let mut spans = vec![
                Span::styled(prefix, base.fg(p.ok_fg)),
                Span::styled(
                    truncate_with_ellipsis(item.title(), budget),
                    base.fg(p.text).add_modifier(Modifier::BOLD),
                ),
            ];
            spans.extend(label_spans);
            buf.set_line(area.x, y, &Line::from(spans), area.width);

            if self.compact || y + 1 >= area.bottom() {
                continue;
            }
            let when = item
                .created_at()
                .map(|t| format_time_ago(&t))
                .unwrap_or_default();
            let mut meta = format!("    opened by {} {when}", item.opened_by());
            if item.comments() > 0 {
                meta.push_str(&format!("  \u{1f4ac} {}", item.comments()));
            }
            buf.set_line(
                area.x,
                y + 1,
                &Line::from(Span::styled(meta, base.fg(p.dim_text))),
                area.width,
            );
        }
    }
}
