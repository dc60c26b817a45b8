use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserRef {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// Hex color without the leading `#`.
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RepositorySummary {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub subscribers_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub owner: Option<UserRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub name: String,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub message: String,
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub commit: CommitDetail,
    /// Null when the commit email is not linked to an account.
    pub author: Option<UserRef>,
}

impl CommitRecord {
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }

    pub fn summary(&self) -> &str {
        self.commit.message.lines().next().unwrap_or("")
    }

    pub fn author_name(&self) -> &str {
        match &self.author {
            Some(user) if !user.login.is_empty() => &user.login,
            _ => self
                .commit
                .author
                .as_ref()
                .map(|a| a.name.as_str())
                .unwrap_or("unknown"),
        }
    }

    pub fn authored_at(&self) -> Option<DateTime<Utc>> {
        self.commit.author.as_ref().and_then(|a| a.date)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IssueRecord {
    pub id: u64,
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub state: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub user: UserRef,
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Present only when the issues endpoint returns a pull request.
    pub pull_request: Option<serde_json::Value>,
}

impl IssueRecord {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PullRequestRecord {
    pub id: u64,
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub draft: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: UserRef,
    #[serde(default)]
    pub labels: Vec<Label>,
}
