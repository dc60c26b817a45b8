use crate::error::FetchError;
use crate::github::client::Fetcher;
use crate::github::rate_limit::RateLimitSnapshot;
use crate::github::resource::{decode_payload, Payload, ResourceKind};
use crate::token::Credential;
use crate::ui::theme::Theme;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchParameters {
    pub owner: String,
    pub repo: String,
    pub kind: ResourceKind,
    pub page_size: usize,
    pub refresh_secs: u64,
    pub theme: Theme,
}

impl FetchParameters {
    /// Theme is presentation only; every other field restarts polling.
    pub fn requires_restart(&self, other: &FetchParameters) -> bool {
        self.owner != other.owner
            || self.repo != other.repo
            || self.kind != other.kind
            || self.page_size != other.page_size
            || self.refresh_secs != other.refresh_secs
    }

    pub fn url(&self, api_base: &str) -> String {
        self.kind
            .url(api_base, &self.owner, &self.repo, self.page_size)
    }
}

#[derive(Debug, Clone)]
pub enum PollEvent {
    Loading,
    Finished {
        result: Result<Payload, FetchError>,
        rate_limit: Option<RateLimitSnapshot>,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub struct PollUpdate {
    pub slot: usize,
    pub generation: u64,
    pub event: PollEvent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus {
    Idle,
    Loading,
    Ready,
    Failed(FetchError),
}

/// Owner-side view of one poller. Updates from superseded generations are
/// ignored, so a slow response from before a restart never lands.
#[derive(Debug, Clone)]
pub struct PollerState {
    pub kind: ResourceKind,
    pub status: PollStatus,
    pub data: Option<Payload>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub rate_limit: Option<RateLimitSnapshot>,
    generation: u64,
}

impl PollerState {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            status: PollStatus::Idle,
            data: None,
            fetched_at: None,
            rate_limit: None,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// A freshly armed generation starts out loading.
    fn reset(&mut self, kind: ResourceKind, generation: u64) {
        *self = PollerState::new(kind);
        self.status = PollStatus::Loading;
        self.generation = generation;
    }

    /// Returns false when the update belongs to a stale generation.
    pub fn apply(&mut self, update: PollUpdate) -> bool {
        if update.generation != self.generation {
            debug!(
                slot = update.slot,
                stale = update.generation,
                current = self.generation,
                "dropping stale poll update"
            );
            return false;
        }
        match update.event {
            PollEvent::Loading => self.status = PollStatus::Loading,
            PollEvent::Finished {
                result,
                rate_limit,
                at,
            } => {
                if rate_limit.is_some() {
                    self.rate_limit = rate_limit;
                }
                match result {
                    Ok(payload) => {
                        self.data = Some(payload);
                        self.fetched_at = Some(at);
                        self.status = PollStatus::Ready;
                    }
                    Err(e) => {
                        // Lists blank out on failure; the summary keeps its last value.
                        if self.kind.is_list() {
                            self.data = None;
                        }
                        self.status = PollStatus::Failed(e);
                    }
                }
            }
        }
        true
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, PollStatus::Loading | PollStatus::Idle)
    }

    pub fn error_message(&self) -> Option<String> {
        match &self.status {
            PollStatus::Failed(FetchError::Http { status_text, .. }) => {
                Some(format!("Failed to fetch {}: {status_text}", self.kind.noun()))
            }
            PollStatus::Failed(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

/// Cancels the polling task when dropped.
pub struct PollHandle {
    task: JoinHandle<()>,
    refresh_tx: mpsc::UnboundedSender<()>,
}

impl PollHandle {
    pub fn refresh(&self) {
        let _ = self.refresh_tx.send(());
    }

    /// Stops the timer and abandons any in-flight request. Idempotent.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn start_polling<F, T>(
    fetcher: Arc<F>,
    params: FetchParameters,
    credential: Option<Credential>,
    slot: usize,
    generation: u64,
    tx: mpsc::UnboundedSender<T>,
) -> PollHandle
where
    F: Fetcher,
    T: From<PollUpdate> + Send + 'static,
{
    let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(
        fetcher, params, credential, slot, generation, tx, refresh_rx,
    ));
    PollHandle { task, refresh_tx }
}

async fn run<F, T>(
    fetcher: Arc<F>,
    params: FetchParameters,
    credential: Option<Credential>,
    slot: usize,
    generation: u64,
    tx: mpsc::UnboundedSender<T>,
    mut refresh_rx: mpsc::UnboundedReceiver<()>,
) where
    F: Fetcher,
    T: From<PollUpdate> + Send + 'static,
{
    let mut ticker = recurring_interval(params.refresh_secs);

    loop {
        if !poll_once(fetcher.as_ref(), &params, credential.as_ref(), slot, generation, &tx).await {
            debug!(slot, "poll receiver gone, stopping");
            break;
        }

        tokio::select! {
            _ = next_tick(&mut ticker) => {}
            msg = refresh_rx.recv() => {
                if msg.is_none() {
                    break;
                }
            }
        }
    }
}

fn recurring_interval(refresh_secs: u64) -> Option<Interval> {
    if refresh_secs == 0 {
        return None;
    }
    let period = Duration::from_secs(refresh_secs);
    let Some(first) = Instant::now().checked_add(period) else {
        warn!(refresh_secs, "refresh interval out of range, timer disabled");
        return None;
    };
    let mut interval = tokio::time::interval_at(first, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(interval)
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn poll_once<F, T>(
    fetcher: &F,
    params: &FetchParameters,
    credential: Option<&Credential>,
    slot: usize,
    generation: u64,
    tx: &mpsc::UnboundedSender<T>,
) -> bool
where
    F: Fetcher,
    T: From<PollUpdate>,
{
    let send = |event: PollEvent| {
        tx.send(
            PollUpdate {
                slot,
                generation,
                event,
            }
            .into(),
        )
        .is_ok()
    };

    if !send(PollEvent::Loading) {
        return false;
    }

    let url = params.url(fetcher.api_base());
    let (result, rate_limit) = match fetcher.fetch(&url, credential).await {
        Ok(resp) => {
            let rate_limit = RateLimitSnapshot::extract(&resp.headers);
            let result = if resp.is_success() {
                decode_payload(params.kind, &resp.body, params.page_size)
            } else {
                Err(FetchError::Http {
                    status: resp.status.as_u16(),
                    status_text: resp.status_text,
                })
            };
            (result, Some(rate_limit))
        }
        Err(e) => (Err(e), None),
    };

    if let Err(e) = &result {
        warn!(slot, %url, "fetch failed: {e}");
    }

    send(PollEvent::Finished {
        result,
        rate_limit,
        at: Utc::now(),
    })
}

/// One view slot: parameters, owner-side state and the live task.
pub struct Poller {
    pub params: FetchParameters,
    pub state: PollerState,
    handle: Option<PollHandle>,
}

impl Poller {
    pub fn new(params: FetchParameters) -> Self {
        let state = PollerState::new(params.kind);
        Self {
            params,
            state,
            handle: None,
        }
    }

    /// Cancels any running task before arming a new generation.
    pub fn restart<F, T>(
        &mut self,
        fetcher: Arc<F>,
        credential: Option<Credential>,
        slot: usize,
        tx: mpsc::UnboundedSender<T>,
    ) where
        F: Fetcher,
        T: From<PollUpdate> + Send + 'static,
    {
        self.cancel();
        let generation = self.state.generation() + 1;
        self.state.reset(self.params.kind, generation);
        self.handle = Some(start_polling(
            fetcher,
            self.params.clone(),
            credential,
            slot,
            generation,
            tx,
        ));
    }

    /// Returns true when the change restarted polling.
    pub fn update_params<F, T>(
        &mut self,
        params: FetchParameters,
        fetcher: Arc<F>,
        credential: Option<Credential>,
        slot: usize,
        tx: mpsc::UnboundedSender<T>,
    ) -> bool
    where
        F: Fetcher,
        T: From<PollUpdate> + Send + 'static,
    {
        let restart = self.params.requires_restart(&params);
        self.params = params;
        if restart {
            self.restart(fetcher, credential, slot, tx);
        }
        restart
    }

    pub fn refresh(&self) {
        if let Some(h) = &self.handle {
            h.refresh();
        }
    }

    pub fn cancel(&mut self) {
        if let Some(h) = self.handle.take() {
            h.cancel();
        }
    }

    pub fn apply(&mut self, update: PollUpdate) -> bool {
        self.state.apply(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::{EmbedRoute, MAX_REFRESH_SECS};
    use crate::test_utils::*;

    fn params(kind: ResourceKind, refresh_secs: u64) -> FetchParameters {
        FetchParameters {
            owner: "o".to_string(),
            repo: "r".to_string(),
            kind,
            page_size: 3,
            refresh_secs,
            theme: Theme::Light,
        }
    }

    async fn next_update(rx: &mut mpsc::UnboundedReceiver<PollUpdate>) -> PollUpdate {
        rx.recv().await.expect("poller closed")
    }

    #[tokio::test]
    async fn test_loading_then_ready_once_per_trigger() {
        let fetcher = Arc::new(FakeFetcher::always(Ok(ok_response(repo_body("r")))));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = PollerState::new(ResourceKind::Repository);
        let _handle = start_polling(
            fetcher.clone(),
            params(ResourceKind::Repository, 0),
            None,
            0,
            0,
            tx,
        );

        assert_eq!(state.status, PollStatus::Idle);
        let first = next_update(&mut rx).await;
        assert!(matches!(first.event, PollEvent::Loading));
        state.apply(first);
        assert_eq!(state.status, PollStatus::Loading);

        let second = next_update(&mut rx).await;
        assert!(matches!(second.event, PollEvent::Finished { .. }));
        state.apply(second);
        assert_eq!(state.status, PollStatus::Ready);
        assert!(state.fetched_at.is_some());
        assert_eq!(state.rate_limit.unwrap().remaining, Some(57));

        // No recurring fetch when refresh is 0.
        assert!(rx.try_recv().is_err());
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_http_error_message_contains_status_text() {
        let fetcher = Arc::new(FakeFetcher::always(Ok(status_response(404, "Not Found"))));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = PollerState::new(ResourceKind::Commits);
        let _handle = start_polling(fetcher, params(ResourceKind::Commits, 0), None, 0, 0, tx);

        state.apply(next_update(&mut rx).await);
        state.apply(next_update(&mut rx).await);
        assert!(matches!(
            state.status,
            PollStatus::Failed(FetchError::Http { status: 404, .. })
        ));
        let msg = state.error_message().unwrap();
        assert!(msg.contains("Not Found"), "{msg}");
    }

    #[tokio::test]
    async fn test_manual_refresh_is_not_deduplicated() {
        let fetcher = Arc::new(FakeFetcher::always(Ok(ok_response(commits_body(2)))));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = start_polling(
            fetcher.clone(),
            params(ResourceKind::Commits, 0),
            None,
            0,
            0,
            tx,
        );

        next_update(&mut rx).await;
        next_update(&mut rx).await;
        handle.refresh();
        assert!(matches!(next_update(&mut rx).await.event, PollEvent::Loading));
        assert!(matches!(
            next_update(&mut rx).await.event,
            PollEvent::Finished { result: Ok(_), .. }
        ));
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_two_starts_with_same_params_fetch_twice() {
        let fetcher = Arc::new(FakeFetcher::always(Ok(ok_response(repo_body("r")))));
        let (tx, mut rx) = mpsc::unbounded_channel::<PollUpdate>();
        let p = params(ResourceKind::Repository, 0);
        let _a = start_polling(fetcher.clone(), p.clone(), None, 0, 1, tx.clone());
        let _b = start_polling(fetcher.clone(), p, None, 0, 2, tx);

        for _ in 0..4 {
            next_update(&mut rx).await;
        }
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_cadence() {
        let fetcher = Arc::new(FakeFetcher::always(Ok(ok_response(commits_body(1)))));
        let (tx, mut rx) = mpsc::unbounded_channel::<PollUpdate>();
        let start = Instant::now();
        let _handle = start_polling(
            fetcher.clone(),
            params(ResourceKind::Commits, 30),
            None,
            0,
            0,
            tx,
        );

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(fetcher.call_count(), 1);

        tokio::time::sleep(Duration::from_secs(16)).await;
        let calls = fetcher.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].at.duration_since(start).as_secs(), 0);
        assert_eq!(calls[1].at.duration_since(start).as_secs(), 30);
        while rx.try_recv().is_ok() {}
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_timer() {
        let fetcher = Arc::new(FakeFetcher::always(Ok(ok_response(commits_body(1)))));
        let (tx, _rx) = mpsc::unbounded_channel::<PollUpdate>();
        let handle = start_polling(
            fetcher.clone(),
            params(ResourceKind::Commits, 10),
            None,
            0,
            0,
            tx,
        );
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.cancel();
        handle.cancel();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_refresh_still_fetches() {
        let route = EmbedRoute::parse("/o/r/embed/commits/18446744073709551615/3/dark").unwrap();
        assert_eq!(route.refresh_secs, MAX_REFRESH_SECS);

        let fetcher = Arc::new(FakeFetcher::always(Ok(ok_response(commits_body(3)))));
        let (tx, mut rx) = mpsc::unbounded_channel::<PollUpdate>();
        let p = FetchParameters {
            refresh_secs: route.refresh_secs,
            theme: route.theme,
            ..params(ResourceKind::Commits, 0)
        };
        let _handle = start_polling(fetcher.clone(), p, None, 0, 0, tx);

        assert!(matches!(next_update(&mut rx).await.event, PollEvent::Loading));
        assert!(matches!(
            next_update(&mut rx).await.event,
            PollEvent::Finished { result: Ok(_), .. }
        ));
        tokio::time::sleep(Duration::from_secs(60 * 60)).await;
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_interval_disables_timer() {
        assert!(recurring_interval(u64::MAX).is_none());
        assert!(recurring_interval(0).is_none());
        assert!(recurring_interval(30).is_some());
    }

    #[tokio::test]
    async fn test_credential_is_attached() {
        let fetcher = Arc::new(FakeFetcher::always(Ok(ok_response(repo_body("r")))));
        let (tx, mut rx) = mpsc::unbounded_channel::<PollUpdate>();
        let _h = start_polling(
            fetcher.clone(),
            params(ResourceKind::Repository, 0),
            Some(Credential::new("tok")),
            0,
            0,
            tx,
        );
        next_update(&mut rx).await;
        next_update(&mut rx).await;
        let calls = fetcher.calls.lock().unwrap().clone();
        assert_eq!(calls[0].credential.as_deref(), Some("tok"));
        assert_eq!(calls[0].url, "https://api.test/repos/o/r");
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let mut state = PollerState::new(ResourceKind::Commits);
        state.reset(ResourceKind::Commits, 2);
        let applied = state.apply(PollUpdate {
            slot: 0,
            generation: 1,
            event: PollEvent::Loading,
        });
        assert!(!applied);
        assert_eq!(state.status, PollStatus::Loading);
        assert_eq!(state.generation(), 2);
    }

    #[test]
    fn test_list_failure_clears_data_summary_keeps_it() {
        let ok = |kind| PollUpdate {
            slot: 0,
            generation: 0,
            event: PollEvent::Finished {
                result: decode_payload(
                    kind,
                    &match kind {
                        ResourceKind::Repository => repo_body("r"),
                        _ => commits_body(2),
                    },
                    3,
                ),
                rate_limit: None,
                at: Utc::now(),
            },
        };
        let fail = || PollUpdate {
            slot: 0,
            generation: 0,
            event: PollEvent::Finished {
                result: Err(FetchError::Network("offline".into())),
                rate_limit: None,
                at: Utc::now(),
            },
        };

        let mut list = PollerState::new(ResourceKind::Commits);
        list.apply(ok(ResourceKind::Commits));
        list.apply(fail());
        assert!(list.data.is_none());
        assert!(list.fetched_at.is_some());

        let mut summary = PollerState::new(ResourceKind::Repository);
        summary.apply(ok(ResourceKind::Repository));
        summary.apply(fail());
        assert!(summary.data.is_some());
        assert!(matches!(summary.status, PollStatus::Failed(_)));
    }

    #[test]
    fn test_theme_change_does_not_restart() {
        let a = params(ResourceKind::Issues, 30);
        let mut b = a.clone();
        b.theme = Theme::Retro;
        assert!(!a.requires_restart(&b));
        b.page_size = 5;
        assert!(a.requires_restart(&b));
    }

    #[tokio::test]
    async fn test_poller_restart_drops_old_generation() {
        let fetcher = Arc::new(FakeFetcher::always(Ok(ok_response(commits_body(1)))));
        let (tx, mut rx) = mpsc::unbounded_channel::<PollUpdate>();
        let mut poller = Poller::new(params(ResourceKind::Commits, 0));

        poller.restart(fetcher.clone(), None, 0, tx.clone());
        let old = next_update(&mut rx).await;

        let mut changed = params(ResourceKind::Commits, 0);
        changed.repo = "other".to_string();
        assert!(poller.update_params(changed, fetcher.clone(), None, 0, tx));

        assert!(!poller.apply(old));
        loop {
            let u = next_update(&mut rx).await;
            let done = u.generation == poller.state.generation()
                && matches!(u.event, PollEvent::Finished { .. });
            poller.apply(u);
            if done {
                break;
            }
        }
        assert_eq!(poller.state.status, PollStatus::Ready);
        let calls = fetcher.calls.lock().unwrap().clone();
        assert!(calls.last().unwrap().url.contains("/repos/o/other/"));
    }
}
