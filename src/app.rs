use crate::config::{Config, REFRESH_CHOICES};
use crate::embed::{
    embed_urls, iframe_snippet, next_embed_refresh, EmbedKind, EmbedRoute, DEFAULT_AMOUNT,
    DEFAULT_EMBED_REFRESH_SECS,
};
use crate::error::Result;
use crate::event::AppEvent;
use crate::github::client::Fetcher;
use crate::github::rate_limit::RateLimitSnapshot;
use crate::github::resource::ResourceKind;
use crate::poller::{FetchParameters, PollUpdate, Poller};
use crate::storage::KeyValueStore;
use crate::token::{self, Credential, TokenStore};
use crate::ui::{
    fill, format_time_ago,
    header_bar::{HeaderBar, TabBar},
    help_panel::{EmbedPanel, HelpPanel},
    input::{self, Action, InputMode},
    resource_view::ResourceView,
    status_bar::StatusBar,
    theme::{palette_for, Theme, ThemePalette},
    toast::{Notification, NotifyLevel, Toast},
    token_input::{TokenInput, TokenInputState},
};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    Frame,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Dashboard,
    Embed(EmbedKind),
}

/// Repository to show and how to poll it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewTarget {
    pub owner: String,
    pub repo: String,
    pub mode: ViewMode,
    pub refresh_secs: u64,
    pub amount: usize,
    pub theme: Theme,
    pub anonymous: bool,
}

impl ViewTarget {
    pub fn dashboard(owner: &str, repo: &str, config: &Config) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            mode: ViewMode::Dashboard,
            refresh_secs: config.effective_refresh(),
            amount: config.page_size,
            theme: config.theme,
            anonymous: false,
        }
    }

    fn slots(&self) -> Vec<(ResourceKind, usize)> {
        match self.mode {
            ViewMode::Dashboard => vec![
                (ResourceKind::Repository, self.amount),
                (ResourceKind::Commits, self.amount),
                (ResourceKind::Issues, self.amount),
                (ResourceKind::PullRequests, self.amount),
            ],
            ViewMode::Embed(EmbedKind::All) => vec![
                (ResourceKind::Repository, DEFAULT_AMOUNT),
                (ResourceKind::Commits, DEFAULT_AMOUNT),
                (ResourceKind::Issues, DEFAULT_AMOUNT),
            ],
            ViewMode::Embed(EmbedKind::Commits) => vec![(ResourceKind::Commits, self.amount)],
            ViewMode::Embed(EmbedKind::Issues) => vec![(ResourceKind::Issues, self.amount)],
            ViewMode::Embed(EmbedKind::Stats) => vec![(ResourceKind::Repository, self.amount)],
        }
    }

    fn is_embed(&self) -> bool {
        matches!(self.mode, ViewMode::Embed(_))
    }
}

impl From<EmbedRoute> for ViewTarget {
    fn from(route: EmbedRoute) -> Self {
        Self {
            owner: route.owner,
            repo: route.repo,
            mode: ViewMode::Embed(route.kind),
            refresh_secs: route.refresh_secs,
            amount: route.amount,
            theme: route.theme,
            anonymous: route.anonymous,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Tab {
    label: &'static str,
    slot: usize,
}

fn tab_label(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Repository => "Stats",
        ResourceKind::Commits => "Commits",
        ResourceKind::Issues => "Issues",
        ResourceKind::PullRequests => "Pull requests",
    }
}

pub struct App<F: Fetcher, S: KeyValueStore> {
    pub config: Config,
    pub target: ViewTarget,
    fetcher: Arc<F>,
    tokens: TokenStore<S>,
    tx: mpsc::UnboundedSender<AppEvent>,

    pub pollers: Vec<Poller>,
    tabs: Vec<Tab>,
    summary_slot: Option<usize>,
    pub active_tab: usize,
    selected: Vec<usize>,
    scroll: Vec<usize>,

    pub refresh_secs: u64,
    resume_refresh_secs: u64,
    pub theme: Theme,
    palette: ThemePalette,

    pub input_mode: InputMode,
    pub token_input: TokenInputState,
    validation: Option<JoinHandle<()>>,
    pub show_help: bool,
    pub show_embed: bool,
    /// Settings baked into generated widget URLs, separate from the live view.
    pub embed_refresh_secs: u64,
    pub embed_theme: Theme,
    pub notification: Option<Notification>,

    pub should_quit: bool,
}

impl<F: Fetcher, S: KeyValueStore> App<F, S> {
    /// Builds one poller per view slot. Nothing is fetched until `start`.
    pub fn new(
        config: Config,
        target: ViewTarget,
        fetcher: Arc<F>,
        store: S,
        tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let pollers: Vec<Poller> = target
            .slots()
            .into_iter()
            .map(|(kind, page_size)| {
                Poller::new(FetchParameters {
                    owner: target.owner.clone(),
                    repo: target.repo.clone(),
                    kind,
                    page_size,
                    refresh_secs: target.refresh_secs,
                    theme: target.theme,
                })
            })
            .collect();

        let tabs: Vec<Tab> = pollers
            .iter()
            .enumerate()
            .filter(|(_, p)| p.params.kind.is_list())
            .map(|(slot, p)| Tab {
                label: tab_label(p.params.kind),
                slot,
            })
            .collect();
        let summary_slot = if tabs.is_empty() {
            None
        } else {
            pollers
                .iter()
                .position(|p| p.params.kind == ResourceKind::Repository)
        };

        let resume_refresh_secs = if target.refresh_secs > 0 {
            target.refresh_secs
        } else {
            config.refresh_secs
        };
        let slot_count = pollers.len();

        Self {
            refresh_secs: target.refresh_secs,
            resume_refresh_secs,
            theme: target.theme,
            palette: palette_for(target.theme),
            embed_theme: target.theme,
            config,
            target,
            fetcher,
            tokens: TokenStore::new(store),
            tx,
            pollers,
            tabs,
            summary_slot,
            active_tab: 0,
            selected: vec![0; slot_count],
            scroll: vec![0; slot_count],
            input_mode: InputMode::Normal,
            token_input: TokenInputState::default(),
            validation: None,
            show_help: false,
            show_embed: false,
            embed_refresh_secs: DEFAULT_EMBED_REFRESH_SECS,
            notification: None,
            should_quit: false,
        }
    }

    pub fn repo_name(&self) -> String {
        format!("{}/{}", self.target.owner, self.target.repo)
    }

    pub fn has_token(&mut self) -> bool {
        self.credential().is_some()
    }

    /// Credential the pollers run with; legacy embeds always go anonymous.
    fn credential(&mut self) -> Option<Credential> {
        if self.target.anonymous {
            None
        } else {
            self.tokens.get()
        }
    }

    /// (Re)arms every slot with the current credential.
    pub fn start(&mut self) {
        let credential = self.credential();
        info!(
            repo = %self.repo_name(),
            slots = self.pollers.len(),
            refresh = self.refresh_secs,
            authenticated = credential.is_some(),
            "starting pollers"
        );
        for (slot, poller) in self.pollers.iter_mut().enumerate() {
            poller.restart(
                Arc::clone(&self.fetcher),
                credential.clone(),
                slot,
                self.tx.clone(),
            );
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(task) = self.validation.take() {
            task.abort();
        }
        for poller in &mut self.pollers {
            poller.cancel();
        }
    }

    /// Pushes refresh and theme changes into every slot. Only a refresh
    /// change restarts polling.
    fn reconfigure(&mut self) {
        let credential = self.credential();
        for (slot, poller) in self.pollers.iter_mut().enumerate() {
            let params = FetchParameters {
                refresh_secs: self.refresh_secs,
                theme: self.theme,
                ..poller.params.clone()
            };
            if poller.update_params(
                params,
                Arc::clone(&self.fetcher),
                credential.clone(),
                slot,
                self.tx.clone(),
            ) {
                debug!(slot, refresh = self.refresh_secs, "poller restarted");
            }
        }
    }

    fn set_refresh(&mut self, secs: u64) {
        self.refresh_secs = secs;
        if secs > 0 {
            self.resume_refresh_secs = secs;
        }
        self.reconfigure();
    }

    fn next_refresh_choice(&self) -> u64 {
        let current = if self.refresh_secs > 0 {
            self.refresh_secs
        } else {
            self.resume_refresh_secs
        };
        REFRESH_CHOICES
            .iter()
            .position(|&c| c == current)
            .map(|i| REFRESH_CHOICES[(i + 1) % REFRESH_CHOICES.len()])
            .unwrap_or(REFRESH_CHOICES[0])
    }

    fn active_slot(&self) -> usize {
        self.tabs.get(self.active_tab).map(|t| t.slot).unwrap_or(0)
    }

    fn item_count(&self, slot: usize) -> usize {
        self.pollers
            .get(slot)
            .and_then(|p| p.state.data.as_ref())
            .map(|d| d.len())
            .unwrap_or(0)
    }

    fn clamp_selection(&mut self, slot: usize) {
        let count = self.item_count(slot);
        if let Some(sel) = self.selected.get_mut(slot) {
            *sel = (*sel).min(count.saturating_sub(1));
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key) => {
                let action = input::map_key(key, self.input_mode);
                self.handle_action(action);
            }
            AppEvent::Poll(update) => self.apply_update(update),
            AppEvent::TokenChecked(result) => self.finish_validation(result),
            AppEvent::Resize | AppEvent::Tick => {}
        }
        if self.notification.as_ref().is_some_and(|n| n.expired()) {
            self.notification = None;
        }
    }

    fn apply_update(&mut self, update: PollUpdate) {
        let slot = update.slot;
        match self.pollers.get_mut(slot) {
            Some(poller) => {
                poller.apply(update);
            }
            None => debug!(slot, "update for unknown slot"),
        }
        self.clamp_selection(slot);
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::ScrollDown => {
                let slot = self.active_slot();
                let count = self.item_count(slot);
                if let Some(sel) = self.selected.get_mut(slot) {
                    if *sel + 1 < count {
                        *sel += 1;
                    }
                }
            }
            Action::ScrollUp => {
                let slot = self.active_slot();
                if let Some(sel) = self.selected.get_mut(slot) {
                    *sel = sel.saturating_sub(1);
                }
            }
            Action::NextTab => {
                if !self.tabs.is_empty() {
                    self.active_tab = (self.active_tab + 1) % self.tabs.len();
                }
            }
            Action::PrevTab => {
                if !self.tabs.is_empty() {
                    self.active_tab = (self.active_tab + self.tabs.len() - 1) % self.tabs.len();
                }
            }
            Action::Refresh => {
                for poller in &self.pollers {
                    poller.refresh();
                }
            }
            Action::ToggleAutoRefresh => {
                let next = if self.refresh_secs > 0 {
                    0
                } else {
                    self.resume_refresh_secs
                };
                self.set_refresh(next);
                let msg = if next > 0 {
                    format!("Auto-refresh every {next}s")
                } else {
                    "Auto-refresh off".to_string()
                };
                self.notification = Some(Notification::new(NotifyLevel::Info, msg));
            }
            Action::CycleInterval if self.show_embed => {
                self.embed_refresh_secs = next_embed_refresh(self.embed_refresh_secs);
            }
            Action::CycleTheme if self.show_embed => {
                self.embed_theme = self.embed_theme.next();
            }
            Action::CycleInterval => {
                let next = self.next_refresh_choice();
                self.set_refresh(next);
                self.notification = Some(Notification::new(
                    NotifyLevel::Info,
                    format!("Auto-refresh every {next}s"),
                ));
            }
            Action::CycleTheme => {
                self.theme = self.theme.next();
                self.embed_theme = self.theme;
                self.palette = palette_for(self.theme);
                self.reconfigure();
            }
            Action::TokenEntry if self.target.anonymous => {
                self.notification = Some(Notification::new(
                    NotifyLevel::Info,
                    "This widget always fetches anonymously",
                ));
            }
            Action::TokenEntry => {
                self.input_mode = InputMode::Token;
                self.token_input = TokenInputState::default();
            }
            Action::EmbedUrls => self.show_embed = !self.show_embed,
            Action::Help => self.show_help = !self.show_help,
            Action::ClosePopup => {
                self.show_help = false;
                self.show_embed = false;
            }
            Action::InputChar(c) => {
                if !self.token_input.validating {
                    self.token_input.draft.push(c);
                    self.token_input.error = None;
                }
            }
            Action::InputBackspace => {
                self.token_input.draft.pop();
            }
            Action::InputSubmit => {
                if !self.token_input.validating {
                    let value = self.token_input.draft.trim().to_string();
                    if value.is_empty() {
                        self.clear_token();
                    } else {
                        self.token_input.validating = true;
                        self.token_input.error = None;
                        self.spawn_validation(value);
                    }
                }
            }
            Action::InputClear => self.clear_token(),
            Action::InputCancel => self.close_token_input(),
            Action::None => {}
        }
    }

    fn close_token_input(&mut self) {
        if let Some(task) = self.validation.take() {
            task.abort();
        }
        self.input_mode = InputMode::Normal;
        self.token_input = TokenInputState::default();
    }

    fn clear_token(&mut self) {
        match self.tokens.clear() {
            Ok(()) => {
                self.close_token_input();
                self.notification = Some(Notification::new(NotifyLevel::Info, "Token cleared"));
                self.start();
            }
            Err(e) => {
                warn!("could not clear token: {e}");
                self.token_input.error = Some(e.to_string());
                self.notification = Some(Notification::new(
                    NotifyLevel::Error,
                    format!("Could not clear token: {e}"),
                ));
            }
        }
    }

    /// Checks the token off the UI loop; the result comes back as
    /// `AppEvent::TokenChecked`.
    fn spawn_validation(&mut self, value: String) {
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        self.validation = Some(tokio::spawn(async move {
            let result = token::validate(fetcher.as_ref(), &value).await;
            let _ = tx.send(AppEvent::TokenChecked(result));
        }));
    }

    /// Adopts a validated token and restarts pollers with it. On failure the
    /// modal stays open with the message and the previous credential remains
    /// in effect.
    fn finish_validation(&mut self, result: Result<Credential>) {
        self.validation = None;
        if self.input_mode != InputMode::Token || !self.token_input.validating {
            debug!("token check finished after the modal closed");
            return;
        }
        self.token_input.validating = false;
        match result.and_then(|credential| self.tokens.adopt(credential)) {
            Ok(()) => {
                self.close_token_input();
                self.notification = Some(Notification::new(NotifyLevel::Success, "Token saved"));
                self.start();
            }
            Err(e) => self.token_input.error = Some(e.to_string()),
        }
    }

    fn embed_url_rows(&self) -> Vec<(String, String)> {
        embed_urls(
            &self.config.embed_base_url,
            &self.target.owner,
            &self.target.repo,
            self.embed_refresh_secs,
            DEFAULT_AMOUNT,
            self.embed_theme,
        )
        .into_iter()
        .map(|(kind, url)| (kind.segment().to_string(), url))
        .collect()
    }

    fn rate_limit(&self) -> Option<&RateLimitSnapshot> {
        self.pollers
            .get(self.active_slot())
            .and_then(|p| p.state.rate_limit.as_ref())
            .or_else(|| self.pollers.iter().find_map(|p| p.state.rate_limit.as_ref()))
    }

    fn updated_label(&self) -> String {
        self.pollers
            .iter()
            .filter_map(|p| p.state.fetched_at)
            .max()
            .map(|t| format_time_ago(&t))
            .unwrap_or_else(|| "never".to_string())
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();
        let has_token = self.has_token();
        let compact = self.target.is_embed();
        let p = &self.palette;

        fill(frame.buffer_mut(), size, Style::default().bg(p.app_bg).fg(p.text));

        let summary_height = if compact { 4 } else { 5 };
        let mut constraints = vec![Constraint::Length(1)];
        if self.summary_slot.is_some() {
            constraints.push(Constraint::Length(summary_height));
        }
        if self.tabs.len() > 1 {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Min(1));
        constraints.push(Constraint::Length(1));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(size);
        let mut next = 0;
        let mut take = || {
            let rect = chunks[next];
            next += 1;
            rect
        };

        let repo_name = self.repo_name();
        let updated = self.updated_label();
        frame.render_widget(
            HeaderBar {
                repo_name: &repo_name,
                updated: &updated,
                palette: p,
                show_brand: !compact,
            },
            take(),
        );

        if let Some(slot) = self.summary_slot {
            let area = take();
            frame.render_widget(
                ResourceView {
                    state: &self.pollers[slot].state,
                    palette: p,
                    scroll: 0,
                    selected: None,
                    compact,
                    skeleton_rows: summary_height as usize,
                },
                area,
            );
        }

        if self.tabs.len() > 1 {
            let labels: Vec<&str> = self.tabs.iter().map(|t| t.label).collect();
            frame.render_widget(
                TabBar {
                    labels: &labels,
                    active: self.active_tab,
                    palette: p,
                },
                take(),
            );
        }

        let body = take();
        let status_area = take();

        let slot = self.active_slot();
        if let Some(poller) = self.pollers.get(slot) {
            let rows_per_item = if compact { 1 } else { 2 };
            let visible = (body.height as usize / rows_per_item).max(1);
            let selected = self.selected[slot];
            let scroll = &mut self.scroll[slot];
            if selected >= *scroll + visible {
                *scroll = selected + 1 - visible;
            }
            if selected < *scroll {
                *scroll = selected;
            }

            frame.render_widget(
                ResourceView {
                    state: &poller.state,
                    palette: p,
                    scroll: *scroll,
                    selected: (!compact && poller.params.kind.is_list()).then_some(selected),
                    compact,
                    skeleton_rows: poller.params.page_size,
                },
                body,
            );
        }

        frame.render_widget(
            StatusBar {
                refresh_secs: self.refresh_secs,
                theme: self.theme,
                has_token,
                rate_limit: self.rate_limit(),
                palette: p,
            },
            status_area,
        );

        if self.input_mode == InputMode::Token {
            frame.render_widget(
                TokenInput {
                    state: &self.token_input,
                    has_token,
                    palette: p,
                },
                size,
            );
        } else if self.show_help {
            frame.render_widget(HelpPanel { palette: p }, size);
        } else if self.show_embed {
            let urls = self.embed_url_rows();
            let snippet = urls
                .iter()
                .find(|(kind, _)| kind == EmbedKind::Stats.segment())
                .map(|(_, url)| iframe_snippet(url))
                .unwrap_or_default();
            frame.render_widget(
                EmbedPanel {
                    urls: &urls,
                    refresh_secs: self.embed_refresh_secs,
                    theme: self.embed_theme,
                    snippet: &snippet,
                    palette: p,
                },
                size,
            );
        }

        if let Some(n) = &self.notification {
            frame.render_widget(
                Toast {
                    notification: n,
                    palette: p,
                },
                size,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepolensError;
    use crate::poller::PollStatus;
    use crate::storage::MemoryStore;
    use std::time::Duration;
    use crate::test_utils::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};

    type TestApp = App<FakeFetcher, MemoryStore>;

    fn embed_target(kind: EmbedKind, refresh_secs: u64, amount: usize) -> ViewTarget {
        ViewTarget {
            owner: "o".to_string(),
            repo: "r".to_string(),
            mode: ViewMode::Embed(kind),
            refresh_secs,
            amount,
            theme: Theme::Light,
            anonymous: false,
        }
    }

    fn make_app(
        target: ViewTarget,
        fetcher: FakeFetcher,
    ) -> (TestApp, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(
            Config::default(),
            target,
            Arc::new(fetcher),
            MemoryStore::default(),
            tx,
        );
        (app, rx)
    }

    async fn drain(app: &mut TestApp, rx: &mut mpsc::UnboundedReceiver<AppEvent>, count: usize) {
        for _ in 0..count {
            let event = rx.recv().await.expect("channel open");
            app.handle_event(event);
        }
    }

    fn press(app: &mut TestApp, code: KeyCode) {
        app.handle_event(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    #[test]
    fn test_dashboard_slots_and_tabs() {
        let config = Config::default();
        let target = ViewTarget::dashboard("o", "r", &config);
        let (app, _rx) = make_app(target, FakeFetcher::always(Ok(ok_response(commits_body(1)))));

        let kinds: Vec<ResourceKind> = app.pollers.iter().map(|p| p.params.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ResourceKind::Repository,
                ResourceKind::Commits,
                ResourceKind::Issues,
                ResourceKind::PullRequests
            ]
        );
        assert!(app.pollers.iter().all(|p| p.params.page_size == 10));
        assert!(app.pollers.iter().all(|p| p.params.refresh_secs == 30));
        assert_eq!(app.tabs.len(), 3);
        assert_eq!(app.summary_slot, Some(0));
    }

    #[test]
    fn test_embed_all_uses_three_items() {
        let (app, _rx) = make_app(
            embed_target(EmbedKind::All, 60, 10),
            FakeFetcher::always(Ok(ok_response(commits_body(1)))),
        );
        assert_eq!(app.pollers.len(), 3);
        assert!(app.pollers.iter().all(|p| p.params.page_size == 3));
        assert!(app.pollers.iter().all(|p| p.params.refresh_secs == 60));
        assert_eq!(app.tabs.len(), 2);
    }

    #[test]
    fn test_single_embed_has_no_tabs() {
        let (app, _rx) = make_app(
            embed_target(EmbedKind::Stats, 0, 3),
            FakeFetcher::always(Ok(ok_response(repo_body("r")))),
        );
        assert_eq!(app.pollers.len(), 1);
        assert!(app.tabs.is_empty());
        assert_eq!(app.summary_slot, None);
    }

    #[tokio::test]
    async fn test_start_loads_commits() {
        let (mut app, mut rx) = make_app(
            embed_target(EmbedKind::Commits, 0, 5),
            FakeFetcher::always(Ok(ok_response(commits_body(5)))),
        );
        app.start();
        drain(&mut app, &mut rx, 2).await;

        let state = &app.pollers[0].state;
        assert_eq!(state.status, PollStatus::Ready);
        assert_eq!(state.data.as_ref().map(|d| d.len()), Some(5));
        assert_eq!(state.rate_limit.and_then(|r| r.remaining), Some(57));
    }

    #[tokio::test]
    async fn test_theme_change_does_not_refetch() {
        let fetcher = FakeFetcher::always(Ok(ok_response(commits_body(2))));
        let (mut app, mut rx) = make_app(embed_target(EmbedKind::Commits, 0, 3), fetcher.clone());
        app.start();
        drain(&mut app, &mut rx, 2).await;
        let generation = app.pollers[0].state.generation();

        press(&mut app, KeyCode::Char('t'));
        tokio::task::yield_now().await;

        assert_eq!(app.theme, Theme::Dark);
        assert_eq!(app.pollers[0].params.theme, Theme::Dark);
        assert_eq!(app.pollers[0].state.generation(), generation);
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_toggle_auto_refresh_restarts() {
        let (mut app, mut rx) = make_app(
            embed_target(EmbedKind::Commits, 30, 3),
            FakeFetcher::always(Ok(ok_response(commits_body(2)))),
        );
        app.start();
        drain(&mut app, &mut rx, 2).await;
        let generation = app.pollers[0].state.generation();

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.refresh_secs, 0);
        assert_eq!(app.pollers[0].params.refresh_secs, 0);
        assert_eq!(app.pollers[0].state.generation(), generation + 1);

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.refresh_secs, 30);
    }

    #[tokio::test]
    async fn test_cycle_interval() {
        let (mut app, _rx) = make_app(
            embed_target(EmbedKind::Commits, 30, 3),
            FakeFetcher::always(Ok(ok_response(commits_body(2)))),
        );
        press(&mut app, KeyCode::Char('i'));
        assert_eq!(app.refresh_secs, 60);
        press(&mut app, KeyCode::Char('i'));
        assert_eq!(app.refresh_secs, 300);
        press(&mut app, KeyCode::Char('i'));
        assert_eq!(app.refresh_secs, 10);
    }

    #[tokio::test]
    async fn test_token_entry_flow() {
        let fetcher = FakeFetcher::always(Ok(ok_response(commits_body(1))));
        let (mut app, mut rx) = make_app(embed_target(EmbedKind::Commits, 0, 3), fetcher.clone());

        press(&mut app, KeyCode::Char('T'));
        assert_eq!(app.input_mode, InputMode::Token);
        for c in "abc".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert!(app.token_input.validating);

        // Token check result, then Loading and Finished from the restarted poller.
        drain(&mut app, &mut rx, 3).await;

        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.has_token());
        assert_eq!(app.pollers[0].state.status, PollStatus::Ready);
        let calls = fetcher.calls.lock().unwrap();
        assert!(calls[0].url.ends_with("/user"));
        assert_eq!(calls.last().and_then(|c| c.credential.as_deref()), Some("abc"));
    }

    #[tokio::test]
    async fn test_rejected_token_keeps_modal_open() {
        let fetcher = FakeFetcher::always(Ok(status_response(401, "Unauthorized")));
        let (mut app, mut rx) = make_app(embed_target(EmbedKind::Commits, 0, 3), fetcher);

        press(&mut app, KeyCode::Char('T'));
        for c in "bad".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        drain(&mut app, &mut rx, 1).await;

        assert_eq!(app.input_mode, InputMode::Token);
        assert!(!app.token_input.validating);
        assert_eq!(
            app.token_input.error.as_deref(),
            Some("Invalid token. Please check and try again.")
        );
        assert!(!app.has_token());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_validation_keeps_ui_responsive() {
        let fetcher = FakeFetcher::always(Ok(ok_response(Vec::new())))
            .with_delay(Duration::from_secs(5));
        let (mut app, mut rx) = make_app(embed_target(EmbedKind::Commits, 0, 3), fetcher.clone());

        press(&mut app, KeyCode::Char('T'));
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Enter);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fetcher.call_count(), 1);

        app.handle_event(AppEvent::Tick);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
        assert!(!app.has_token());
    }

    #[tokio::test]
    async fn test_clear_failure_raises_error_toast() {
        struct ReadOnlyStore;
        impl KeyValueStore for ReadOnlyStore {
            fn get(&self, _key: &str) -> Result<Option<String>> {
                Ok(Some("kept".to_string()))
            }
            fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
                Err(RepolensError::Storage("read-only".to_string()))
            }
            fn remove(&mut self, _key: &str) -> Result<()> {
                Err(RepolensError::Storage("read-only".to_string()))
            }
        }

        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(
            Config::default(),
            embed_target(EmbedKind::Commits, 0, 3),
            Arc::new(FakeFetcher::always(Ok(ok_response(Vec::new())))),
            ReadOnlyStore,
            tx,
        );
        app.handle_event(AppEvent::Key(KeyEvent::new(KeyCode::Char('T'), KeyModifiers::NONE)));
        app.handle_event(AppEvent::Key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL)));

        let toast = app.notification.as_ref().expect("toast");
        assert_eq!(toast.level, NotifyLevel::Error);
        assert!(toast.message.contains("read-only"));
        assert_eq!(app.input_mode, InputMode::Token);
        assert!(app.has_token());
    }

    #[tokio::test]
    async fn test_legacy_embed_fetches_anonymously() {
        let fetcher = FakeFetcher::always(Ok(ok_response(commits_body(3))));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut store = MemoryStore::default();
        store.set(token::TOKEN_KEY, "stored").unwrap();
        let route = EmbedRoute::parse("/embed/commits/o/r").unwrap();
        let mut app = App::new(Config::default(), route.into(), Arc::new(fetcher.clone()), store, tx);

        assert_eq!(app.pollers[0].params.refresh_secs, 60);
        assert_eq!(app.pollers[0].params.page_size, 3);
        assert!(!app.has_token());

        app.start();
        drain(&mut app, &mut rx, 2).await;
        let calls = fetcher.calls.lock().unwrap();
        assert_eq!(calls[0].url, "https://api.test/repos/o/r/commits?per_page=3");
        assert_eq!(calls[0].credential, None);
        drop(calls);

        press(&mut app, KeyCode::Char('T'));
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[tokio::test]
    async fn test_scroll_is_bounded_by_items() {
        let (mut app, mut rx) = make_app(
            embed_target(EmbedKind::Commits, 0, 2),
            FakeFetcher::always(Ok(ok_response(commits_body(2)))),
        );
        app.start();
        drain(&mut app, &mut rx, 2).await;

        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.selected[0], 1);
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.selected[0], 0);
    }

    #[tokio::test]
    async fn test_render_shows_repo_and_error() {
        let (mut app, mut rx) = make_app(
            embed_target(EmbedKind::Issues, 0, 3),
            FakeFetcher::always(Ok(status_response(404, "Not Found"))),
        );
        app.start();
        drain(&mut app, &mut rx, 2).await;

        let mut terminal = Terminal::new(TestBackend::new(80, 10)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let buf = terminal.backend().buffer().clone();
        let text: String = (0..10u16)
            .map(|y| (0..80u16).map(|x| buf[(x, y)].symbol().to_string()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");

        assert!(text.contains("o/r"));
        assert!(text.contains("Error loading issues: Failed to fetch issues: Not Found"));
    }

    #[test]
    fn test_embed_panel_lists_four_urls() {
        let (mut app, _rx) = make_app(
            embed_target(EmbedKind::Stats, 0, 3),
            FakeFetcher::always(Ok(ok_response(repo_body("r")))),
        );
        press(&mut app, KeyCode::Char('e'));
        assert!(app.show_embed);
        let urls = app.embed_url_rows();
        assert_eq!(urls.len(), 4);
        assert_eq!(urls[1].1, "http://localhost:3000/o/r/embed/commits/90/3/light");

        press(&mut app, KeyCode::Esc);
        assert!(!app.show_embed);
    }

    #[tokio::test]
    async fn test_embed_settings_are_independent_of_the_view() {
        let config = Config::default();
        let (mut app, _rx) = make_app(
            ViewTarget::dashboard("o", "r", &config),
            FakeFetcher::always(Ok(ok_response(commits_body(1)))),
        );

        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Char('i'));
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.embed_refresh_secs, 300);
        assert_eq!(app.embed_theme, Theme::Dark);
        assert_eq!(app.refresh_secs, 30);
        assert_eq!(app.theme, Theme::Light);

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.refresh_secs, 0);
        let urls = app.embed_url_rows();
        assert_eq!(urls[0].1, "http://localhost:3000/o/r/embed/all/300/dark");

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let buf = terminal.backend().buffer().clone();
        let text: String = (0..40u16)
            .map(|y| (0..120u16).map(|x| buf[(x, y)].symbol().to_string()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.contains("<iframe src=\"http://localhost:3000/o/r/embed/stats/300/dark\""));
    }
}
