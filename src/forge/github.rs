//! forge::github
//!
//! GitHub forge implementation using the REST API.
//!
//! # Design
//!
//! This module implements the `Forge` trait for GitHub. Every listing is
//! fetched with `per_page=100` and the next page is read from the `Link`
//! response header; absence of a `rel="next"` link ends the listing.
//!
//! # Authentication
//!
//! A personal access token is optional. Without one, requests are anonymous
//! and GitHub allows only a small number of requests per hour.
//!
//! # Rate Limiting
//!
//! GitHub signals an exhausted quota with `403` plus
//! `x-ratelimit-remaining: 0`, or with `429`. Both map to
//! `ForgeError::RateLimited`. No automatic retry is attempted.
//!
//! # Example
//!
//! ```ignore
//! use tagscribe::forge::github::GitHubForge;
//! use tagscribe::forge::Forge;
//!
//! let forge = GitHubForge::new(Some("ghp_xxx".to_string()), "octocat", "hello-world");
//! let page = forge.list_tags(1).await?;
//! println!("{} tags on the first page", page.items.len());
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::traits::{Forge, ForgeError, Page, PullRequestSummary};
use crate::core::types::{parse_instant, Commit, Event, EventKind, Item, RepoInfo, Tag};

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "tagscribe";

/// Page size for every listing (GitHub's maximum).
const PER_PAGE: u32 = 100;

/// Header carrying the remaining request quota.
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// GitHub forge implementation.
pub struct GitHubForge {
    /// HTTP client for making requests
    client: Client,
    /// Personal access token, if any
    token: Option<String>,
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// API base URL (configurable for GitHub Enterprise)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("has_token", &self.token.is_some())
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubForge {
    /// Create a GitHub forge against the public API.
    pub fn new(token: Option<String>, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self::with_api_base(token, owner, repo, DEFAULT_API_BASE)
    }

    /// Create a GitHub forge with a custom API base URL.
    ///
    /// Use this for GitHub Enterprise (e.g. `https://github.example.com/api/v3`)
    /// and for tests against a local mock server.
    pub fn with_api_base(
        token: Option<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        let api_base: String = api_base.into();
        Self {
            client: Client::new(),
            token: token.filter(|t| !t.is_empty()),
            owner: owner.into(),
            repo: repo.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Get the repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Whether requests are authenticated.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        let mut headers = HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                ForgeError::AuthFailed("token contains characters not allowed in a header".into())
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}/repos/{}/{}", self.api_base, self.owner, self.repo)
        } else {
            format!(
                "{}/repos/{}/{}/{}",
                self.api_base, self.owner, self.repo, path
            )
        }
    }

    /// GET a URL and decode the body, returning the next page index as well.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<(T, Option<u32>), ForgeError> {
        tracing::trace!(url, "GET");
        let response = self
            .client
            .get(url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        let next_page = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_next_page);

        let body = self.handle_response(response).await?;
        Ok((body, next_page))
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            let remaining = response
                .headers()
                .get(RATE_LIMIT_REMAINING)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            // Try to get error message from body
            let message = match response.json::<GitHubErrorResponse>().await {
                Ok(err) => err.message,
                Err(_) => "Unknown error".to_string(),
            };

            Err(map_error_status(status, remaining.as_deref(), message))
        }
    }
}

/// Map a non-success status to a typed error.
fn map_error_status(status: StatusCode, rate_remaining: Option<&str>, message: String) -> ForgeError {
    match status {
        StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("Invalid or expired token".into()),
        StatusCode::FORBIDDEN if rate_remaining == Some("0") => ForgeError::RateLimited,
        StatusCode::FORBIDDEN => ForgeError::AuthFailed(format!("Permission denied: {}", message)),
        StatusCode::NOT_FOUND => ForgeError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
        _ if status.is_server_error() => ForgeError::ApiError {
            status: status.as_u16(),
            message: format!("GitHub server error: {}", message),
        },
        _ => ForgeError::ApiError {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn list_tags(&self, page: u32) -> Result<Page<Tag>, ForgeError> {
        let url = self.repo_url(&format!("tags?per_page={}&page={}", PER_PAGE, page));
        let (tags, next_page): (Vec<GitHubTag>, _) = self.get_json(&url).await?;
        Ok(Page {
            items: tags.into_iter().map(Into::into).collect(),
            next_page,
        })
    }

    async fn list_closed_issues(&self, page: u32) -> Result<Page<Item>, ForgeError> {
        let url = self.repo_url(&format!(
            "issues?state=closed&filter=all&per_page={}&page={}",
            PER_PAGE, page
        ));
        let (issues, next_page): (Vec<GitHubIssue>, _) = self.get_json(&url).await?;
        Ok(Page {
            items: issues.into_iter().map(Into::into).collect(),
            next_page,
        })
    }

    async fn list_closed_pull_requests(
        &self,
        page: u32,
        base: Option<&str>,
    ) -> Result<Page<PullRequestSummary>, ForgeError> {
        let mut path = format!("pulls?state=closed&per_page={}&page={}", PER_PAGE, page);
        if let Some(base) = base {
            path.push_str(&format!("&base={}", base));
        }
        let url = self.repo_url(&path);
        let (pulls, next_page): (Vec<GitHubPullListItem>, _) = self.get_json(&url).await?;
        Ok(Page {
            items: pulls
                .into_iter()
                .map(|p| PullRequestSummary {
                    number: p.number,
                    merged_at: p.merged_at,
                })
                .collect(),
            next_page,
        })
    }

    async fn get_commit(&self, sha: &str) -> Result<Commit, ForgeError> {
        let url = self.repo_url(&format!("git/commits/{}", sha));
        let (commit, _): (GitHubCommit, _) = self.get_json(&url).await?;
        Ok(Commit {
            sha: commit.sha,
            author_date: commit.author.and_then(|a| a.date),
            committer_date: commit.committer.and_then(|c| c.date),
        })
    }

    async fn get_repo(&self) -> Result<RepoInfo, ForgeError> {
        let url = self.repo_url("");
        let (repo, _): (GitHubRepo, _) = self.get_json(&url).await?;
        Ok(RepoInfo {
            created_at: repo.created_at,
        })
    }

    async fn list_issue_events(&self, number: u64, page: u32) -> Result<Page<Event>, ForgeError> {
        let url = self.repo_url(&format!(
            "issues/{}/events?per_page={}&page={}",
            number, PER_PAGE, page
        ));
        let (events, next_page): (Vec<GitHubEvent>, _) = self.get_json(&url).await?;
        Ok(Page {
            items: events.into_iter().map(Into::into).collect(),
            next_page,
        })
    }
}

// --------------------------------------------------------------------------
// API Response Types
// --------------------------------------------------------------------------

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

#[derive(Deserialize)]
struct GitHubTag {
    name: String,
    commit: GitHubShaRef,
}

#[derive(Deserialize)]
struct GitHubShaRef {
    sha: String,
}

impl From<GitHubTag> for Tag {
    fn from(tag: GitHubTag) -> Self {
        Tag::release(tag.name, tag.commit.sha)
    }
}

/// Closed issue (or pull request) from the issues listing.
#[derive(Deserialize)]
struct GitHubIssue {
    number: u64,
    title: String,
    html_url: String,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
    milestone: Option<GitHubMilestone>,
    user: Option<GitHubUser>,
    closed_at: Option<String>,
    /// Present only when the issue is a pull request.
    pull_request: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GitHubLabel {
    name: String,
}

#[derive(Deserialize)]
struct GitHubMilestone {
    title: String,
}

#[derive(Deserialize)]
struct GitHubUser {
    login: String,
    html_url: String,
}

impl From<GitHubIssue> for Item {
    fn from(gh: GitHubIssue) -> Self {
        let item = if gh.pull_request.is_some() {
            Item::pull_request(gh.number, gh.title)
        } else {
            Item::issue(gh.number, gh.title)
        };

        let mut item = item
            .with_url(gh.html_url)
            .with_labels(gh.labels.into_iter().map(|l| l.name));
        item.milestone = gh.milestone.map(|m| m.title);
        if let Some(user) = gh.user {
            item = item.with_author(user.login, user.html_url);
        }
        item.closed_at = gh.closed_at.as_deref().and_then(|s| parse_instant(s).ok());
        item
    }
}

#[derive(Deserialize)]
struct GitHubPullListItem {
    number: u64,
    merged_at: Option<String>,
}

/// Git database commit (`/git/commits/{sha}`).
#[derive(Deserialize)]
struct GitHubCommit {
    sha: String,
    author: Option<GitHubSignature>,
    committer: Option<GitHubSignature>,
}

#[derive(Deserialize)]
struct GitHubSignature {
    date: Option<String>,
}

#[derive(Deserialize)]
struct GitHubRepo {
    created_at: String,
}

#[derive(Deserialize)]
struct GitHubEvent {
    event: String,
    commit_id: Option<String>,
    created_at: String,
}

impl From<GitHubEvent> for Event {
    fn from(gh: GitHubEvent) -> Self {
        // Attribution reads only kind and commit.
        let created_at = match parse_instant(&gh.created_at) {
            Ok(at) => Some(at),
            Err(e) => {
                tracing::warn!(event = %gh.event, "event has {}", e);
                None
            }
        };
        Event {
            kind: EventKind::from(gh.event),
            commit_id: gh.commit_id,
            created_at,
        }
    }
}

// --------------------------------------------------------------------------
// Link header and URL parsing
// --------------------------------------------------------------------------

/// Extract the `page` query parameter of the `rel="next"` link.
///
/// # Example
///
/// ```
/// use tagscribe::forge::github::parse_next_page;
///
/// let link = r#"<https://api.github.com/repos/o/r/tags?page=3>; rel="next", <https://api.github.com/repos/o/r/tags?page=9>; rel="last""#;
/// assert_eq!(parse_next_page(link), Some(3));
/// ```
pub fn parse_next_page(link: &str) -> Option<u32> {
    link.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        let is_next = segments.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        let url = Url::parse(target).ok()?;
        let page = url
            .query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok());
        page
    })
}

/// Parse a repository reference into `(owner, repo)`.
///
/// Supports, for the given site (e.g. `github.com`):
/// - `git@site:owner/repo.git`
/// - `ssh://git@site/owner/repo.git`
/// - `https://site/owner/repo` (with or without `.git`)
/// - a bare `owner/repo` slug
///
/// # Example
///
/// ```
/// use tagscribe::forge::github::parse_repo_reference;
///
/// let (owner, repo) = parse_repo_reference("git@github.com:octocat/hello-world.git", "github.com").unwrap();
/// assert_eq!(owner, "octocat");
/// assert_eq!(repo, "hello-world");
/// ```
pub fn parse_repo_reference(input: &str, site: &str) -> Option<(String, String)> {
    let input = input.trim();
    let ssh_prefix = format!("git@{}:", site);
    let prefixes = [
        ssh_prefix,
        format!("ssh://git@{}/", site),
        format!("https://{}/", site),
        format!("http://{}/", site),
    ];

    let rest = prefixes
        .iter()
        .find_map(|p| input.strip_prefix(p.as_str()))
        .or_else(|| {
            // Bare slug: exactly one '/', no scheme
            (!input.contains(':') && input.matches('/').count() == 1).then_some(input)
        })?;

    let rest = rest.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);
    let mut parts = rest.splitn(2, '/');
    let owner = parts.next()?;
    let repo = parts.next()?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parse_next_page {
        use super::*;

        #[test]
        fn next_and_last() {
            let link = r#"<https://api.github.com/repositories/1/issues?state=closed&page=2>; rel="next", <https://api.github.com/repositories/1/issues?state=closed&page=5>; rel="last""#;
            assert_eq!(parse_next_page(link), Some(2));
        }

        #[test]
        fn next_not_first() {
            let link = r#"<https://api.github.com/x?page=1>; rel="prev", <https://api.github.com/x?per_page=100&page=3>; rel="next""#;
            assert_eq!(parse_next_page(link), Some(3));
        }

        #[test]
        fn no_next_on_last_page() {
            let link = r#"<https://api.github.com/x?page=1>; rel="first", <https://api.github.com/x?page=4>; rel="prev""#;
            assert_eq!(parse_next_page(link), None);
        }

        #[test]
        fn garbage_yields_none() {
            assert_eq!(parse_next_page(""), None);
            assert_eq!(parse_next_page("nonsense"), None);
            assert_eq!(parse_next_page(r#"<not a url>; rel="next""#), None);
        }
    }

    mod parse_repo_reference {
        use super::*;

        #[test]
        fn ssh_with_git_suffix() {
            assert_eq!(
                parse_repo_reference("git@github.com:octocat/hello-world.git", "github.com"),
                Some(("octocat".to_string(), "hello-world".to_string()))
            );
        }

        #[test]
        fn ssh_url_form() {
            assert_eq!(
                parse_repo_reference("ssh://git@github.com/octocat/hello-world.git", "github.com"),
                Some(("octocat".to_string(), "hello-world".to_string()))
            );
        }

        #[test]
        fn https_without_git_suffix() {
            assert_eq!(
                parse_repo_reference("https://github.com/octocat/hello-world", "github.com"),
                Some(("octocat".to_string(), "hello-world".to_string()))
            );
        }

        #[test]
        fn bare_slug() {
            assert_eq!(
                parse_repo_reference("octocat/hello-world", "github.com"),
                Some(("octocat".to_string(), "hello-world".to_string()))
            );
        }

        #[test]
        fn enterprise_site() {
            assert_eq!(
                parse_repo_reference("git@git.corp.example:team/tool.git", "git.corp.example"),
                Some(("team".to_string(), "tool".to_string()))
            );
            assert!(parse_repo_reference("git@github.com:team/tool.git", "git.corp.example").is_none());
        }

        #[test]
        fn repo_with_dots() {
            assert_eq!(
                parse_repo_reference("git@github.com:owner/repo.name.git", "github.com"),
                Some(("owner".to_string(), "repo.name".to_string()))
            );
        }

        #[test]
        fn invalid_format() {
            assert!(parse_repo_reference("not a url", "github.com").is_none());
            assert!(parse_repo_reference("https://github.com/", "github.com").is_none());
            assert!(parse_repo_reference("https://github.com/owner", "github.com").is_none());
            assert!(parse_repo_reference("https://gitlab.com/owner/repo", "github.com").is_none());
            assert!(parse_repo_reference("a/b/c", "github.com").is_none());
        }
    }

    mod github_forge {
        use super::*;

        #[test]
        fn new_creates_forge() {
            let forge = GitHubForge::new(Some("token".into()), "owner", "repo");
            assert_eq!(forge.name(), "github");
            assert_eq!(forge.owner(), "owner");
            assert_eq!(forge.repo(), "repo");
            assert!(forge.has_token());
        }

        #[test]
        fn empty_token_is_anonymous() {
            let forge = GitHubForge::new(Some(String::new()), "owner", "repo");
            assert!(!forge.has_token());
            let headers = forge.headers().unwrap();
            assert!(headers.get(AUTHORIZATION).is_none());
        }

        #[test]
        fn with_api_base_trims_slash() {
            let forge = GitHubForge::with_api_base(
                None,
                "owner",
                "repo",
                "https://github.example.com/api/v3/",
            );
            assert_eq!(forge.api_base, "https://github.example.com/api/v3");
        }

        #[test]
        fn repo_url_format() {
            let forge = GitHubForge::new(None, "octocat", "hello-world");
            assert_eq!(
                forge.repo_url("tags"),
                "https://api.github.com/repos/octocat/hello-world/tags"
            );
            assert_eq!(
                forge.repo_url(""),
                "https://api.github.com/repos/octocat/hello-world"
            );
        }

        #[test]
        fn debug_redacts_token() {
            let forge = GitHubForge::new(Some("secret_token_abc123".into()), "owner", "repo");
            let debug_output = format!("{:?}", forge);
            assert!(!debug_output.contains("secret_token_abc123"));
            assert!(debug_output.contains("has_token"));
        }

        #[test]
        fn invalid_token_characters_rejected() {
            let forge = GitHubForge::new(Some("bad\ntoken".into()), "owner", "repo");
            assert!(matches!(forge.headers(), Err(ForgeError::AuthFailed(_))));
        }
    }

    mod error_mapping {
        use super::*;

        #[test]
        fn forbidden_with_exhausted_quota_is_rate_limit() {
            let err = map_error_status(StatusCode::FORBIDDEN, Some("0"), "API rate limit".into());
            assert_eq!(err, ForgeError::RateLimited);
        }

        #[test]
        fn forbidden_with_quota_is_permission() {
            let err = map_error_status(StatusCode::FORBIDDEN, Some("12"), "nope".into());
            assert_eq!(err, ForgeError::AuthFailed("Permission denied: nope".into()));
        }

        #[test]
        fn too_many_requests_is_rate_limit() {
            let err = map_error_status(StatusCode::TOO_MANY_REQUESTS, None, String::new());
            assert_eq!(err, ForgeError::RateLimited);
        }

        #[test]
        fn not_found() {
            let err = map_error_status(StatusCode::NOT_FOUND, None, "Not Found".into());
            assert_eq!(err, ForgeError::NotFound("Not Found".into()));
        }

        #[test]
        fn server_error() {
            let err = map_error_status(StatusCode::BAD_GATEWAY, None, "oops".into());
            assert_eq!(
                err,
                ForgeError::ApiError {
                    status: 502,
                    message: "GitHub server error: oops".into()
                }
            );
        }
    }

    mod conversions {
        use super::*;

        #[test]
        fn issue_payload_to_item() {
            let gh: GitHubIssue = serde_json::from_value(serde_json::json!({
                "number": 12,
                "title": "Crash on start",
                "html_url": "https://github.com/o/r/issues/12",
                "labels": [{"name": "bug"}, {"name": "ui"}],
                "milestone": {"title": "v1.0"},
                "user": {"login": "alice", "html_url": "https://github.com/alice"},
                "closed_at": "2020-05-01T10:00:00Z"
            }))
            .unwrap();

            let item: Item = gh.into();
            assert_eq!(item.number, 12);
            assert!(!item.is_pull_request());
            assert!(item.labels.contains("bug"));
            assert_eq!(item.milestone.as_deref(), Some("v1.0"));
            assert_eq!(item.author.as_ref().unwrap().login, "alice");
            assert!(item.closed_at.is_some());
            assert!(item.merged_at.is_none());
        }

        #[test]
        fn pull_request_marker_sets_kind() {
            let gh: GitHubIssue = serde_json::from_value(serde_json::json!({
                "number": 13,
                "title": "Add thing",
                "html_url": "https://github.com/o/r/pull/13",
                "milestone": null,
                "user": null,
                "closed_at": null,
                "pull_request": {"url": "https://api.github.com/repos/o/r/pulls/13"}
            }))
            .unwrap();

            let item: Item = gh.into();
            assert!(item.is_pull_request());
            assert!(item.labels.is_empty());
            assert!(item.author.is_none());
        }

        #[test]
        fn event_with_bad_date_keeps_kind_and_commit() {
            let gh = GitHubEvent {
                event: "closed".into(),
                commit_id: Some("abc".into()),
                created_at: "soon".into(),
            };
            let event = Event::from(gh);
            assert_eq!(event.kind, EventKind::Closed);
            assert_eq!(event.commit_id.as_deref(), Some("abc"));
            assert_eq!(event.created_at, None);
        }
    }
}
