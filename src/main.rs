mod app;
mod config;
mod embed;
mod error;
mod event;
mod github;
mod poller;
mod storage;
#[cfg(test)]
mod test_utils;
mod token;
mod ui;

use app::{App, ViewTarget};
use clap::{builder::PossibleValuesParser, Parser, Subcommand};
use config::Config;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use embed::{embed_urls, iframe_snippet, parse_repo_ref, EmbedKind, EmbedRoute, DEFAULT_AMOUNT};
use error::FetchError;
use event::AppEvent;
use futures::StreamExt;
use github::client::{Fetcher, GitHubClient};
use github::resource::ResourceKind;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storage::{FileStore, KeyValueStore};
use token::{Credential, TokenStore};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};
use ui::theme::{Theme, THEME_NAMES};

#[derive(Parser, Debug)]
#[command(name = "repolens", version, about = "Live GitHub repository metadata in the terminal")]
struct Cli {
    #[arg(long, global = true, help = "Write debug logs to the log file")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dashboard for a repository (owner/repo or a GitHub URL)
    View { repo: String },
    /// Open an embeddable view, e.g. /owner/repo/embed/commits/30/5/dark or /embed/stats/owner/repo
    Embed { path: String },
    /// Manage the stored GitHub token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Print the embeddable URLs for a repository
    Urls {
        repo: String,
        #[arg(long, default_value_t = 0, help = "Refresh interval in seconds, 0 disables")]
        refresh: u64,
        #[arg(long, default_value_t = DEFAULT_AMOUNT)]
        amount: usize,
        #[arg(long, default_value = "light", value_parser = PossibleValuesParser::new(THEME_NAMES.iter().copied()))]
        theme: String,
        #[arg(long, help = "Public base URL (defaults to embed_base_url)")]
        base: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum TokenAction {
    /// Validate and store a personal access token
    Set { value: String },
    /// Forget the stored token
    Clear,
    /// Show whether a token is stored
    Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load();

    if cli.debug || std::env::var_os("REPOLENS_LOG").is_some() {
        init_tracing(&config.log_file())?;
    }

    if let Err(e) = dispatch(cli.command, config).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter =
        EnvFilter::try_from_env("REPOLENS_LOG").unwrap_or_else(|_| EnvFilter::new("repolens=debug"));
    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false);
    Registry::default().with(filter).with(fmt_layer).init();
    info!(log = %path.display(), "tracing initialized");
    Ok(())
}

async fn dispatch(command: Command, config: Config) -> error::Result<()> {
    let client = GitHubClient::new(&config.api_base_url);
    let store = FileStore::new(config.storage_path());

    match command {
        Command::View { repo } => {
            let (owner, repo) = parse_repo_ref(&repo)?;
            let target = ViewTarget::dashboard(&owner, &repo, &config);
            let mut tokens = TokenStore::new(FileStore::new(config.storage_path()));
            preflight(&client, &target, tokens.get().as_ref()).await?;
            run_tui(config, target, client, store).await
        }
        Command::Embed { path } => {
            let route = EmbedRoute::parse(&path)?;
            run_tui(config, route.into(), client, store).await
        }
        Command::Token { action } => run_token(action, &client, store).await,
        Command::Urls {
            repo,
            refresh,
            amount,
            theme,
            base,
        } => {
            let (owner, repo) = parse_repo_ref(&repo)?;
            let base = base.unwrap_or_else(|| config.embed_base_url.clone());
            let amount = if amount == 0 { DEFAULT_AMOUNT } else { amount };
            let urls = embed_urls(&base, &owner, &repo, refresh, amount, Theme::from_name(&theme));
            for (kind, url) in &urls {
                println!("{:<8} {url}", kind.segment());
            }
            if let Some((_, url)) = urls.iter().find(|(kind, _)| *kind == EmbedKind::Stats) {
                println!("{:<8} {}", "iframe", iframe_snippet(url));
            }
            Ok(())
        }
    }
}

/// Fails fast on a repository that cannot be read before entering the TUI.
async fn preflight<F: Fetcher>(
    fetcher: &F,
    target: &ViewTarget,
    credential: Option<&Credential>,
) -> error::Result<()> {
    let url = ResourceKind::Repository.url(fetcher.api_base(), &target.owner, &target.repo, target.amount);
    let resp = fetcher.fetch(&url, credential).await?;
    if !resp.is_success() {
        return Err(FetchError::Http {
            status: resp.status.as_u16(),
            status_text: resp.status_text,
        }
        .into());
    }
    Ok(())
}

async fn run_token<F: Fetcher, S: KeyValueStore>(
    action: TokenAction,
    fetcher: &F,
    store: S,
) -> error::Result<()> {
    let mut tokens = TokenStore::new(store);
    match action {
        TokenAction::Set { value } => match tokens.set(fetcher, &value).await? {
            Some(_) => println!("Token validated and saved."),
            None => println!("Token cleared."),
        },
        TokenAction::Clear => {
            tokens.clear()?;
            println!("Token cleared.");
        }
        TokenAction::Status => {
            if tokens.get().is_some() {
                println!("A token is saved (up to 5,000 requests per hour).");
            } else {
                println!("No token saved (anonymous, 60 requests per hour).");
            }
        }
    }
    Ok(())
}

async fn run_tui<F: Fetcher, S: KeyValueStore>(
    config: Config,
    target: ViewTarget,
    fetcher: F,
    store: S,
) -> error::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();
    let mut app = App::new(config, target, Arc::new(fetcher), store, tx.clone());

    // Install panic hook before entering raw mode so terminal is restored on panic
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
        default_hook(info);
    }));

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    app.start();

    let input_tx = tx.clone();
    let input_task = tokio::spawn(async move {
        let mut reader = EventStream::new();
        while let Some(Ok(event)) = reader.next().await {
            let app_event = match event {
                Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
                Event::Resize(_, _) => Some(AppEvent::Resize),
                _ => None,
            };
            if let Some(e) = app_event {
                if input_tx.send(e).is_err() {
                    break;
                }
            }
        }
    });

    // Keeps relative timestamps and toasts current between fetches
    let tick_tx = tx;
    let tick_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            if tick_tx.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });

    loop {
        terminal.draw(|f| app.render(f))?;

        let first = match rx.recv().await {
            Some(e) => e,
            None => break,
        };
        app.handle_event(first);
        while let Ok(pending) = rx.try_recv() {
            app.handle_event(pending);
        }

        if app.should_quit {
            break;
        }
    }

    app.shutdown();
    input_task.abort();
    tick_task.abort();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_cli_parses_urls_defaults() {
        let cli = Cli::try_parse_from(["repolens", "urls", "o/r"]).unwrap();
        match cli.command {
            Command::Urls {
                repo,
                refresh,
                amount,
                theme,
                base,
            } => {
                assert_eq!(repo, "o/r");
                assert_eq!(refresh, 0);
                assert_eq!(amount, 3);
                assert_eq!(theme, "light");
                assert!(base.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_token_subcommands() {
        let cli = Cli::try_parse_from(["repolens", "--debug", "token", "set", "abc"]).unwrap();
        assert!(cli.debug);
        assert!(matches!(
            cli.command,
            Command::Token {
                action: TokenAction::Set { ref value }
            } if value == "abc"
        ));
        assert!(Cli::try_parse_from(["repolens", "token", "bogus"]).is_err());
    }

    #[tokio::test]
    async fn test_preflight_reports_http_status() {
        let fetcher = FakeFetcher::always(Ok(status_response(404, "Not Found")));
        let target = ViewTarget::dashboard("o", "missing", &Config::default());
        let err = preflight(&fetcher, &target, None).await.unwrap_err();
        assert_eq!(err.to_string(), "Not Found (404)");
        assert_eq!(
            fetcher.calls.lock().unwrap()[0].url,
            "https://api.test/repos/o/missing"
        );
    }

    #[tokio::test]
    async fn test_token_status_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.toml");
        let fetcher = FakeFetcher::always(Ok(ok_response(Vec::new())));
        FileStore::new(&path).set(token::TOKEN_KEY, "abc").unwrap();

        run_token(TokenAction::Status, &fetcher, FileStore::new(&path)).await.unwrap();
        assert_eq!(
            FileStore::new(&path).get(token::TOKEN_KEY).unwrap().as_deref(),
            Some("abc")
        );

        run_token(TokenAction::Clear, &fetcher, FileStore::new(&path)).await.unwrap();
        assert_eq!(FileStore::new(&path).get(token::TOKEN_KEY).unwrap(), None);
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_token_set_persists_validated_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.toml");
        let fetcher = FakeFetcher::always(Ok(ok_response(Vec::new())));

        run_token(TokenAction::Set { value: "ghp_new".to_string() }, &fetcher, FileStore::new(&path))
            .await
            .unwrap();
        assert_eq!(
            FileStore::new(&path).get(token::TOKEN_KEY).unwrap().as_deref(),
            Some("ghp_new")
        );
        assert!(fetcher.calls.lock().unwrap()[0].url.ends_with("/user"));
    }
}
