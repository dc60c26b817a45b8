use crate::github::resource::{Payload, ResourceKind};
use crate::poller::{PollStatus, PollerState};
use crate::ui::{
    commit_list::CommitList,
    issue_list::TicketList,
    rate_banner::RateBanner,
    repo_summary::RepoSummaryView,
    theme::ThemePalette,
};
use ratatui::{
    buffer::Buffer as Buf,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};

pub fn empty_message(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Repository => "No stats found for this repository.",
        ResourceKind::Commits => "No commits found for this repository.",
        ResourceKind::Issues => "No open issues found for this repository.",
        ResourceKind::PullRequests => "No open pull requests found for this repository.",
    }
}

/// Loading / error / empty / data rendering for one poller slot.
pub struct ResourceView<'a> {
    pub state: &'a PollerState,
    pub palette: &'a ThemePalette,
    pub scroll: usize,
    pub selected: Option<usize>,
    pub compact: bool,
    pub skeleton_rows: usize,
}

impl<'a> Widget for ResourceView<'a> {
    fn render(self, area: Rect, buf: &mut Buf) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let p = self.palette;
        let state = self.state;
        let mut area = area;

        if let Some(snapshot) = state.rate_limit.as_ref().filter(|s| s.should_warn()) {
            RateBanner {
                snapshot,
                palette: p,
            }
            .render(Rect { height: 1, ..area }, buf);
            area.y += 1;
            area.height -= 1;
            if area.height == 0 {
                return;
            }
        }

        // Embeds keep showing the last data while a refresh is in flight.
        let show_skeleton = state.is_loading()
            && (state.data.is_none() || (!self.compact && state.kind.is_list()));
        if show_skeleton {
            render_skeleton(buf, area, self.skeleton_rows.max(1), p);
            return;
        }

        if let PollStatus::Failed(_) = state.status {
            let msg = state.error_message().unwrap_or_default();
            let line = Line::from(vec![
                Span::styled(" \u{2716} ", Style::default().fg(p.error_fg)),
                Span::styled(
                    format!("Error loading {}: {msg}", state.kind.noun()),
                    Style::default().fg(p.error_fg),
                ),
            ]);
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        let Some(data) = &state.data else {
            return;
        };
        if data.is_empty() {
            buf.set_line(
                area.x,
                area.y,
                &Line::from(Span::styled(
                    empty_message(state.kind),
                    Style::default().fg(p.dim_text),
                )),
                area.width,
            );
            return;
        }

        match data {
            Payload::Repository(summary) => RepoSummaryView {
                summary,
                palette: p,
                compact: self.compact,
            }
            .render(area, buf),
            Payload::Commits(commits) => CommitList {
                commits: commits.as_slice(),
                palette: p,
                scroll: self.scroll,
                selected: self.selected,
                compact: self.compact,
            }
            .render(area, buf),
            Payload::Issues(issues) => TicketList {
                items: issues.as_slice(),
                palette: p,
                scroll: self.scroll,
                selected: self.selected,
                compact: self.compact,
            }
            .render(area, buf),
            Payload::PullRequests(pulls) => TicketList {
                items: pulls.as_slice(),
                palette: p,
                scroll: self.scroll,
                selected: self.selected,
                compact: self.compact,
            }
            .render(area, buf),
        }
    }
}

fn render_skeleton(buf: &mut Buf, area: Rect, rows: usize, p: &ThemePalette) {
    let style = Style::default().fg(p.border);
    let widths = [0.9, 0.7, 0.8, 0.6];
    for i in 0..rows.min(area.height as usize) {
        let w = (area.width as f32 * widths[i % widths.len()]) as usize;
        let bar = "\u{2591}".repeat(w);
        buf.set_line(area.x, area.y + i as u16, &Line::from(Span::styled(bar, style)), area.width);
    }
}
