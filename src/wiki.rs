//! HTTP collaborator (ambient, §10): talks to the MediaWiki `action=query`
//! and `action=compare` endpoints and adapts their JSON into the types the
//! core's [`RevisionSource`] trait expects. No diff-row classification or
//! reply-chain logic lives here.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::block::User;
use crate::diffrow::DiffRow;
use crate::html::parse_diff_rows;
use crate::revision::{RevisionMeta, RevisionSource};

const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";

pub struct WikiClient {
    api_url: String,
    http: reqwest::Client,
}

impl WikiClient {
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            http: reqwest::Client::new(),
        }
    }

    async fn query(&self, params: &[(&str, String)]) -> Result<serde_json::Value> {
        let mut params: Vec<(&str, String)> = params.to_vec();
        params.push(("format", "json".to_string()));
        let response = self
            .http
            .get(&self.api_url)
            .query(&params)
            .send()
            .await
            .context("failed to reach the wiki API")?;
        response
            .json::<serde_json::Value>()
            .await
            .context("wiki API response was not valid JSON")
    }
}

impl Default for WikiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct RevisionsResponse {
    query: RevisionsQuery,
    #[serde(rename = "continue")]
    cont: Option<RevisionsContinue>,
}

#[derive(Debug, Deserialize)]
struct RevisionsQuery {
    pages: Vec<RevisionsPage>,
}

#[derive(Debug, Deserialize)]
struct RevisionsPage {
    #[serde(default)]
    revisions: Vec<ApiRevision>,
}

#[derive(Debug, Deserialize)]
struct RevisionsContinue {
    rvcontinue: String,
}

#[derive(Debug, Deserialize)]
struct ApiRevision {
    revid: u64,
    timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    userhidden: bool,
}

impl ApiRevision {
    fn into_meta(self) -> RevisionMeta {
        let user = if self.userhidden {
            User::Hidden
        } else {
            match self.user {
                Some(name) => User::named(name),
                None => User::Hidden,
            }
        };
        RevisionMeta {
            id: self.revid,
            timestamp: self.timestamp,
            user,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompareResponse {
    compare: CompareBody,
}

#[derive(Debug, Deserialize)]
struct CompareBody {
    #[serde(rename = "*")]
    html: String,
}

impl RevisionSource for WikiClient {
    async fn list_revisions(
        &self,
        title: &str,
        since_id: Option<u64>,
    ) -> Result<Vec<RevisionMeta>> {
        let mut revisions = Vec::new();
        let mut params = vec![
            ("action", "query".to_string()),
            ("prop", "revisions".to_string()),
            ("titles", title.to_string()),
            ("rvprop", "ids|timestamp|user|userhidden".to_string()),
            ("rvlimit", "500".to_string()),
            ("rvdir", "newer".to_string()),
            ("formatversion", "2".to_string()),
        ];
        if let Some(id) = since_id {
            params.push(("rvstartid", id.to_string()));
        }

        loop {
            let value = self.query(&params).await?;
            let response: RevisionsResponse =
                serde_json::from_value(value).context("unexpected shape for revisions response")?;
            let page = response
                .query
                .pages
                .into_iter()
                .next()
                .context("no page in revisions response")?;
            revisions.extend(page.revisions.into_iter().map(ApiRevision::into_meta));

            match response.cont {
                Some(c) => {
                    params.retain(|(k, _)| *k != "rvcontinue");
                    params.push(("rvcontinue", c.rvcontinue));
                }
                None => break,
            }
        }

        Ok(revisions)
    }

    async fn fetch_diff(&self, _title: &str, from_id: u64, to_id: u64) -> Result<Vec<DiffRow>> {
        let params = vec![
            ("action", "compare".to_string()),
            ("fromrev", from_id.to_string()),
            ("torev", to_id.to_string()),
        ];
        let value = self.query(&params).await?;
        let response: CompareResponse =
            serde_json::from_value(value).context("unexpected shape for compare response")?;
        Ok(parse_diff_rows(&response.compare.html))
    }

    async fn last_revision_id(&self, title: &str) -> Result<u64> {
        let params = vec![
            ("action", "query".to_string()),
            ("prop", "revisions".to_string()),
            ("titles", title.to_string()),
            ("rvprop", "ids".to_string()),
            ("rvdir", "older".to_string()),
            ("rvlimit", "1".to_string()),
            ("formatversion", "2".to_string()),
        ];
        let value = self.query(&params).await?;
        let response: RevisionsResponse =
            serde_json::from_value(value).context("unexpected shape for revisions response")?;
        let page = response
            .query
            .pages
            .into_iter()
            .next()
            .context("no page in revisions response")?;
        page.revisions
            .first()
            .map(|r| r.revid)
            .context("page has no revisions")
    }
}
