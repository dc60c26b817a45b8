use crate::ui::theme::ThemePalette;
use ratatui::{
    buffer::Buffer as Buf,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

pub struct HeaderBar<'a> {
    pub repo_name: &'a str,
    pub updated: &'a str,
    pub palette: &'a ThemePalette,
    pub show_brand: bool,
}

impl<'a> Widget for HeaderBar<'a> {
    fn render(self, area: Rect, buf: &mut Buf) {
        let p = self.palette;
        let bg = Style::default().bg(p.header_bg);
        for x in area.x..area.right() {
            buf[(x, area.y)].set_style(bg);
        }

        let mut spans: Vec<Span> = Vec::new();
        if self.show_brand {
            spans.push(Span::styled(
                " repolens",
                Style::default()
                    .fg(p.accent)
                    .bg(p.header_bg)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                " \u{2503} ",
                Style::default().fg(p.border).bg(p.header_bg),
            ));
        } else {
            spans.push(Span::styled(" ", bg));
        }
        spans.push(Span::styled(
            self.repo_name.to_string(),
            Style::default()
                .fg(p.text)
                .bg(p.header_bg)
                .add_modifier(Modifier::BOLD),
        ));
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);

        let right = format!("Updated {} ", self.updated);
        let right_w = UnicodeWidthStr::width(right.as_str());
        let area_w = area.width as usize;
        if area_w > right_w {
            let right_x = area.x + (area_w - right_w) as u16;
            let span = Span::styled(right, Style::default().fg(p.dim_text).bg(p.header_bg));
            buf.set_line(right_x, area.y, &Line::from(span), right_w as u16);
        }
    }
}

pub struct TabBar<'a> {
    pub labels: &'a [&'a str],
    pub active: usize,
    pub palette: &'a ThemePalette,
}

impl<'a> Widget for TabBar<'a> {
    fn render(self, area: Rect, buf: &mut Buf) {
        let p = self.palette;
        let mut x = area.x + 1;
        for (i, label) in self.labels.iter().enumerate() {
            let style = if i == self.active {
                Style::default()
                    .fg(p.accent)
                    .bg(p.selected_bg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(p.dim_text)
            };
            let text = format!(" {label} ");
            let w = UnicodeWidthStr::width(text.as_str()) as u16;
            if x + w > area.right() {
                break;
            }
            buf.set_line(x, area.y, &Line::from(Span::styled(text, style)), w);
            x += w + 1;
        }
    }
}
