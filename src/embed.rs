//! Embeddable view routes: `/{owner}/{repo}/embed/{kind}/{refresh}[/{amount}]/{theme}`,
//! plus the older `/embed/{kind}/{owner}/{repo}` form.

use crate::error::{RepolensError, Result};
use crate::ui::theme::Theme;
use url::Url;

pub const DEFAULT_AMOUNT: usize = 3;
pub const DEFAULT_REFRESH_SECS: u64 = 0;
/// The aggregate widget refreshes every minute unless told otherwise.
pub const DEFAULT_ALL_REFRESH_SECS: u64 = 60;
/// Legacy routes always poll once a minute.
pub const LEGACY_REFRESH_SECS: u64 = 60;
pub const MAX_REFRESH_SECS: u64 = 24 * 60 * 60;
/// GitHub caps `per_page` at 100.
pub const MAX_AMOUNT: usize = 100;

/// Refresh intervals offered for generated widget URLs; 0 means no auto-refresh.
pub const EMBED_REFRESH_CHOICES: &[u64] = &[0, 30, 60, 90, 300, 600];
pub const DEFAULT_EMBED_REFRESH_SECS: u64 = 90;

const PATH_BASE: &str = "http://localhost/";
const GITHUB_BASE: &str = "https://github.com/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedKind {
    All,
    Commits,
    Issues,
    Stats,
}

impl EmbedKind {
    pub const ALL: &'static [EmbedKind] = &[
        EmbedKind::All,
        EmbedKind::Commits,
        EmbedKind::Issues,
        EmbedKind::Stats,
    ];

    pub fn segment(self) -> &'static str {
        match self {
            EmbedKind::All => "all",
            EmbedKind::Commits => "commits",
            EmbedKind::Issues => "issues",
            EmbedKind::Stats => "stats",
        }
    }

    fn from_segment(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.segment() == s)
    }

    pub fn has_amount(self) -> bool {
        matches!(self, EmbedKind::Commits | EmbedKind::Issues)
    }

    fn default_refresh(self) -> u64 {
        match self {
            EmbedKind::All => DEFAULT_ALL_REFRESH_SECS,
            _ => DEFAULT_REFRESH_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedRoute {
    pub owner: String,
    pub repo: String,
    pub kind: EmbedKind,
    pub refresh_secs: u64,
    pub amount: usize,
    pub theme: Theme,
    /// Legacy widgets never send the stored token.
    pub anonymous: bool,
}

impl EmbedRoute {
    /// Accepts a bare path or a full URL; query and fragment are ignored.
    pub fn parse(input: &str) -> Result<Self> {
        let url = to_url(input, PATH_BASE)?;
        let segments = path_segments(&url);
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        match segments.as_slice() {
            [owner, repo, "embed", kind, rest @ ..] => {
                let kind = EmbedKind::from_segment(kind)
                    .ok_or_else(|| RepolensError::Route(format!("unknown embed kind {kind:?}")))?;
                Ok(Self::from_parts(owner, repo, kind, rest))
            }
            ["embed", kind, owner, repo] => {
                let kind = EmbedKind::from_segment(kind)
                    .filter(|k| *k != EmbedKind::All)
                    .ok_or_else(|| RepolensError::Route(format!("unknown embed kind {kind:?}")))?;
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    kind,
                    refresh_secs: LEGACY_REFRESH_SECS,
                    amount: DEFAULT_AMOUNT,
                    theme: Theme::default(),
                    anonymous: true,
                })
            }
            _ => Err(RepolensError::Route(format!(
                "expected /{{owner}}/{{repo}}/embed/{{kind}}/..., got {:?}",
                url.path()
            ))),
        }
    }

    fn from_parts(owner: &str, repo: &str, kind: EmbedKind, rest: &[&str]) -> Self {
        let refresh_secs = rest
            .first()
            .and_then(|s| parse_positive(s))
            .map(|n| n.min(MAX_REFRESH_SECS))
            .unwrap_or_else(|| kind.default_refresh());

        let (amount, theme_seg) = if kind.has_amount() {
            let amount = rest
                .get(1)
                .and_then(|s| parse_positive(s))
                .map(|n| usize::try_from(n).unwrap_or(MAX_AMOUNT).min(MAX_AMOUNT))
                .unwrap_or(DEFAULT_AMOUNT);
            (amount, rest.get(2))
        } else {
            (DEFAULT_AMOUNT, rest.get(1))
        };
        let theme = theme_seg.map(|s| Theme::from_name(s)).unwrap_or_default();

        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            kind,
            refresh_secs,
            amount,
            theme,
            anonymous: false,
        }
    }

    pub fn path(&self) -> String {
        if self.anonymous {
            return format!("/embed/{}/{}/{}", self.kind.segment(), self.owner, self.repo);
        }
        let base = format!(
            "/{}/{}/embed/{}/{}",
            self.owner,
            self.repo,
            self.kind.segment(),
            self.refresh_secs
        );
        if self.kind.has_amount() {
            format!("{base}/{}/{}", self.amount, self.theme)
        } else {
            format!("{base}/{}", self.theme)
        }
    }
}

/// Leading-integer parse: optional sign, then digits; trailing junk is
/// ignored. Zero, negative or unparsable input yields `None` so the caller
/// falls back to its default. Values past `u64::MAX` saturate.
fn parse_positive(s: &str) -> Option<u64> {
    let s = s.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        return None;
    }
    let n = digits.parse::<u64>().unwrap_or(u64::MAX);
    if negative || n == 0 {
        None
    } else {
        Some(n)
    }
}

/// Absolute URLs parse as-is; anything else is resolved against `base`.
fn to_url(input: &str, base: &str) -> Result<Url> {
    let input = input.trim();
    let parsed = match Url::parse(input) {
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(base).and_then(|base| base.join(input))
        }
        other => other,
    };
    parsed.map_err(|e| RepolensError::Route(format!("{input:?}: {e}")))
}

fn path_segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Accepts `owner/repo` or a github.com URL (scheme optional, `.git`,
/// query, fragment and trailing path ignored).
pub fn parse_repo_ref(input: &str) -> Result<(String, String)> {
    let trimmed = input.trim();
    let first = trimmed.split('/').next().unwrap_or_default();
    let url = if !trimmed.contains("://") && first.contains('.') {
        to_url(&format!("https://{trimmed}"), GITHUB_BASE)?
    } else {
        to_url(trimmed, GITHUB_BASE)?
    };

    let host = url.host_str().unwrap_or_default();
    if host != "github.com" && host != "www.github.com" {
        return Err(RepolensError::Route(format!(
            "expected owner/repo or a GitHub URL, got {input:?}"
        )));
    }

    match path_segments(&url).as_slice() {
        [owner, repo, ..] => {
            let repo = repo.trim_end_matches(".git");
            if repo.is_empty() {
                return Err(RepolensError::Route(format!("not a repository: {input:?}")));
            }
            Ok((owner.clone(), repo.to_string()))
        }
        _ => Err(RepolensError::Route(format!(
            "expected owner/repo or a GitHub URL, got {input:?}"
        ))),
    }
}

/// Builds the four embeddable URLs for a repository under `base_url`.
pub fn embed_urls(
    base_url: &str,
    owner: &str,
    repo: &str,
    refresh_secs: u64,
    amount: usize,
    theme: Theme,
) -> Vec<(EmbedKind, String)> {
    let base = base_url.trim_end_matches('/');
    EmbedKind::ALL
        .iter()
        .map(|&kind| {
            let route = EmbedRoute {
                owner: owner.to_string(),
                repo: repo.to_string(),
                kind,
                refresh_secs,
                amount,
                theme,
                anonymous: false,
            };
            (kind, format!("{base}{}", route.path()))
        })
        .collect()
}

pub fn iframe_snippet(url: &str) -> String {
    format!(r#"<iframe src="{url}" width="300" height="200" frameborder="0"></iframe>"#)
}

/// Steps through `EMBED_REFRESH_CHOICES`; unknown values restart the cycle.
pub fn next_embed_refresh(current: u64) -> u64 {
    EMBED_REFRESH_CHOICES
        .iter()
        .position(|&c| c == current)
        .map(|i| EMBED_REFRESH_CHOICES[(i + 1) % EMBED_REFRESH_CHOICES.len()])
        .unwrap_or(EMBED_REFRESH_CHOICES[0])
}
