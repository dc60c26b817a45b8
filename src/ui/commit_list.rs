use crate::github::types::CommitRecord;
use crate::ui::{format_time_ago, theme::ThemePalette, truncate_with_ellipsis};
use ratatui::{
    buffer::Buffer as Buf,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

pub struct CommitList<'a> {
    pub commits: &'a [CommitRecord],
    pub palette: &'a ThemePalette,
    pub scroll: usize,
    pub selected: Option<usize>,
    pub compact: bool,
}

impl<'a> Widget for CommitList<'a> {
    fn render(self, area: Rect, buf: &mut Buf) {
        let p = self.palette;
        let rows_per_item: usize = if self.compact { 1 } else { 2 };
        let visible = area.height as usize / rows_per_item;
        let w = area.width as usize;

        for (slot, (idx, commit)) in self
            .commits
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(visible)
            .enumerate()
        {
            let y = area.y + (slot * rows_per_item) as u16;
            let selected = self.selected == Some(idx);
            let base = if selected {
                Style::default().bg(p.selected_bg)
            } else {
                Style::default()
            };

            let sha = format!("{} ", commit.short_sha());
            let when = commit
                .authored_at()
                .map(|t| format_time_ago(&t))
                .unwrap_or_default();
            let author = commit.author_name();

            if self.compact {
                let tail = format!("  {author} \u{00b7} {when}");
                let budget = w
                    .saturating_sub(UnicodeWidthStr::width(sha.as_str()))
                    .saturating_sub(UnicodeWidthStr::width(tail.as_str()));
                let line = Line::from(vec![
                    Span::styled(sha, base.fg(p.accent)),
                    Span::styled(truncate_with_ellipsis(commit.summary(), budget), base.fg(p.text)),
                    Span::styled(tail, base.fg(p.dim_text)),
                ]);
                buf.set_line(area.x, y, &line, area.width);
                continue;
            }

            let budget = w.saturating_sub(UnicodeWidthStr::width(sha.as_str()));
            let title = Line::from(vec![
                Span::styled(sha, base.fg(p.accent)),
                Span::styled(
                    truncate_with_ellipsis(commit.summary(), budget),
                    base.fg(p.text).add_modifier(Modifier::BOLD),
                ),
            ]);
            buf.set_line(area.x, y, &title, area.width);

            if y + 1 < area.bottom() {
                let meta = Line::from(Span::styled(
                    format!("        {author} committed {when}"),
                    base.fg(p.dim_text),
                ));
                buf.set_line(area.x, y + 1, &meta, area.width);
            }
        }
    }
}
