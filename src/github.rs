use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Utc};
use reqwest::header::{ACCEPT, LINK};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{self, Error, Result};
use crate::languages::LanguageBytes;
use crate::source::{RawData, Repository, StatsSource};
use crate::stats::ActivityStats;

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("profile-cards/", env!("CARGO_PKG_VERSION"));
const PER_PAGE: usize = 100;
const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct CountObj {
    #[serde(rename = "totalCount")]
    total_count: u64,
}

#[derive(Deserialize)]
struct Owner {
    login: String,
}

#[derive(Deserialize)]
struct RepoItem {
    name: String,
    owner: Owner,
    #[serde(default)]
    fork: bool,
    #[serde(default)]
    stargazers_count: u64,
}

#[derive(Clone)]
pub struct GithubClient {
    token: Option<Arc<String>>,
    http: Arc<Client>,
}

impl GithubClient {
    /// Create a client; without a token every request is anonymous.
    pub fn new(token: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(TIMEOUT)
            .build()?;

        Ok(Self {
            token: token.map(Arc::new),
            http: Arc::new(http),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Low-level REST GET. Non-success statuses become typed errors.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
        let mut req = self
            .http
            .get(format!("{API_BASE}{path}"))
            .header(ACCEPT, "application/vnd.github+json")
            .query(query);

        if let Some(token) = &self.token {
            req = req.bearer_auth(token.as_str());
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(error::from_status(status, path, &body))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let bytes = self.get(path, query).await?.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| Error::Decode {
            path: path.to_string(),
            source,
        })
    }

    /// GraphQL request with `errors` checking; only available with a token.
    async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let Some(token) = &self.token else {
            return Err(Error::Config("GraphQL queries need a TOKEN".into()));
        };

        let resp = self
            .http
            .post(format!("{API_BASE}/graphql"))
            .bearer_auth(token.as_str())
            .json(&serde_json::json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(error::from_status(status, "/graphql", &body));
        }

        let mut json: Value = serde_json::from_str(&body).map_err(|source| Error::Decode {
            path: "/graphql".into(),
            source,
        })?;

        // If GraphQL returned an `errors` field, treat it as an error.
        if let Some(errors) = json.get("errors") {
            return Err(Error::GraphQl(format!("{errors:#}")));
        }

        let data = json.get_mut("data").map(Value::take).unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|source| Error::Decode {
            path: "/graphql".into(),
            source,
        })
    }

    /// Owned, non-fork repositories, without language data yet.
    ///
    /// With a token this is `/user/repos` so private repositories are included.
    pub async fn list_repos(&self, username: &str) -> Result<Vec<Repository>> {
        let (path, filter) = if self.is_authenticated() {
            ("/user/repos".to_string(), ("affiliation", "owner"))
        } else {
            (format!("/users/{username}/repos"), ("type", "owner"))
        };

        let mut out = Vec::new();
        let mut page = 1usize;

        loop {
            let query = [
                (filter.0, filter.1.to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            let items: Vec<RepoItem> = self.get_json(&path, &query).await?;
            let count = items.len();
            debug!(page, count, "fetched repository page");

            out.extend(
                items
                    .into_iter()
                    .filter(|r| !r.fork && r.owner.login.eq_ignore_ascii_case(username))
                    .map(|r| Repository {
                        owner: r.owner.login,
                        name: r.name,
                        stars: r.stargazers_count,
                        languages: LanguageBytes::new(),
                    }),
            );

            if count < PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(out)
    }

    pub async fn languages(&self, owner: &str, repo: &str) -> Result<LanguageBytes> {
        self.get_json(&format!("/repos/{owner}/{repo}/languages"), &[])
            .await
    }

    /// `total_count` of an issue search.
    pub async fn search_count(&self, query: &str) -> Result<u64> {
        #[derive(Deserialize)]
        struct SearchResult {
            total_count: u64,
        }

        let result: SearchResult = self
            .get_json("/search/issues", &[("q", query.to_string()), ("per_page", "1".into())])
            .await?;
        Ok(result.total_count)
    }

    /// Commit contributions and contributed-to repositories since January 1st of `year`.
    async fn graphql_activity(&self, username: &str, year: i32) -> Result<(u64, u64)> {
        const QUERY: &str = r#"
            query($login: String!, $from: DateTime!) {
                user(login: $login) {
                    contributionsCollection(from: $from) {
                        totalCommitContributions
                    }
                    repositoriesContributedTo(
                        first: 1,
                        contributionTypes: [COMMIT, PULL_REQUEST, ISSUE, PULL_REQUEST_REVIEW]
                    ) {
                        totalCount
                    }
                }
            }
        "#;

        #[derive(Deserialize)]
        struct ActivityData {
            user: Option<ActivityUser>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ActivityUser {
            contributions_collection: ContribCollection,
            repositories_contributed_to: CountObj,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ContribCollection {
            total_commit_contributions: u64,
        }

        let variables = serde_json::json!({
            "login": username,
            "from": format!("{year}-01-01T00:00:00Z"),
        });
        let data: ActivityData = self.graphql(QUERY, variables).await?;

        match data.user {
            Some(user) => Ok((
                user.contributions_collection.total_commit_contributions,
                user.repositories_contributed_to.total_count,
            )),
            None => {
                warn!(username, "GraphQL returned no user; activity counts are zero");
                Ok((0, 0))
            }
        }
    }

    /// Commits authored by `username` since January 1st of `year`, summed over `repos`.
    ///
    /// Asks for one commit per page, so the `rel="last"` page number is the count.
    async fn rest_commit_count(&self, username: &str, repos: &[Repository], year: i32) -> Result<u64> {
        let since = format!("{year}-01-01T00:00:00Z");
        let mut total = 0u64;

        for repo in repos {
            let path = format!("/repos/{}/{}/commits", repo.owner, repo.name);
            let query = [
                ("author", username.to_string()),
                ("since", since.clone()),
                ("per_page", "1".to_string()),
            ];

            let resp = match self.get(&path, &query).await {
                Ok(resp) => resp,
                // Empty repositories answer 409 Conflict.
                Err(Error::Api { status, .. }) if status == StatusCode::CONFLICT => continue,
                Err(e) => return Err(e),
            };

            let last_page = resp
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(last_page_from_link);

            let count = match last_page {
                Some(n) => n,
                None => {
                    let bytes = resp.bytes().await?;
                    let items: Vec<Value> =
                        serde_json::from_slice(&bytes).map_err(|source| Error::Decode {
                            path: path.clone(),
                            source,
                        })?;
                    items.len() as u64
                }
            };

            debug!(repo = %repo.name, count, "counted commits");
            total = total.saturating_add(count);
        }

        Ok(total)
    }

    /// Number of `repos` whose contributor list includes `username`.
    async fn rest_contributed_repos(&self, username: &str, repos: &[Repository]) -> Result<u64> {
        #[derive(Deserialize)]
        struct Contributor {
            #[serde(default)]
            login: String,
        }

        let mut count = 0u64;
        for repo in repos {
            let path = format!("/repos/{}/{}/contributors", repo.owner, repo.name);
            let resp = self.get(&path, &[("per_page", PER_PAGE.to_string())]).await?;

            // Empty repositories answer 204 with no body.
            if resp.status() == StatusCode::NO_CONTENT {
                continue;
            }

            let bytes = resp.bytes().await?;
            let contributors: Vec<Contributor> =
                serde_json::from_slice(&bytes).map_err(|source| Error::Decode {
                    path: path.clone(),
                    source,
                })?;

            if contributors
                .iter()
                .any(|c| c.login.eq_ignore_ascii_case(username))
            {
                count += 1;
            }
        }

        Ok(count)
    }
}

/// Page number of the `rel="last"` link in a GitHub `Link` header.
fn last_page_from_link(header: &str) -> Option<u64> {
    header
        .split(',')
        .find(|part| part.contains("rel=\"last\""))
        .and_then(|part| {
            let start = part.find('<')? + 1;
            let end = part.find('>')?;
            Url::parse(part.get(start..end)?).ok()
        })
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| *key == "page")
                .and_then(|(_, value)| value.parse().ok())
        })
}

impl StatsSource for GithubClient {
    async fn fetch(&self, username: &str) -> Result<RawData> {
        let year = Utc::now().year();

        let mut repositories = self.list_repos(username).await?;
        info!(
            count = repositories.len(),
            authenticated = self.is_authenticated(),
            "found non-fork repositories"
        );

        for repo in &mut repositories {
            repo.languages = self.languages(&repo.owner, &repo.name).await?;
            debug!(repo = %repo.name, languages = repo.languages.len(), "fetched languages");
        }

        let stars = repositories.iter().map(|r| r.stars).sum();
        let pull_requests = self
            .search_count(&format!(
                "type:pr author:{username} created:{year}-01-01..{year}-12-31"
            ))
            .await?;
        let issues = self
            .search_count(&format!(
                "type:issue author:{username} created:{year}-01-01..{year}-12-31"
            ))
            .await?;

        let (commits, repositories_contributed_to) = if self.is_authenticated() {
            self.graphql_activity(username, year).await?
        } else {
            (
                self.rest_commit_count(username, &repositories, year).await?,
                self.rest_contributed_repos(username, &repositories).await?,
            )
        };

        let activity = ActivityStats {
            commits,
            pull_requests,
            issues,
            stars,
            repositories_contributed_to,
        };
        info!(?activity, "fetched activity");

        Ok(RawData {
            repositories,
            activity,
        })
    }
}
