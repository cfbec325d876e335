use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{HeaderMap, HeaderValue, LINK};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::traits::{ByteStream, ExportStatus, GitlabApi};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::project::Project;

const TOKEN_HEADER: &str = "private-token";
const NEXT_PAGE_HEADER: &str = "x-next-page";

/// reqwest-backed client for the GitLab v4 REST API.
#[derive(Debug, Clone)]
pub struct GitlabClient {
    http: reqwest::Client,
    api_base: Url,
    per_page: u32,
    request_timeout: Duration,
}

#[derive(Deserialize)]
struct ExportInfo {
    export_status: ExportStatus,
}

impl GitlabClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut token =
            HeaderValue::from_str(&config.access_token).map_err(|_| ApiError::InvalidToken)?;
        token.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, token);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("glbackup/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(config.request_timeout)
            .read_timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            api_base: api_base(&config.server_url)?,
            per_page: config.per_page,
            request_timeout: config.request_timeout,
        })
    }

    /// Base URL all endpoints hang off, e.g. `https://gitlab.com/api/v4/`.
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Each segment is percent-encoded, so `team/sub` becomes `team%2Fsub`.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn list_projects(&self, mut url: Url) -> Result<Vec<Project>> {
        url.query_pairs_mut()
            .append_pair("per_page", &self.per_page.to_string());

        let mut projects = Vec::new();
        let mut next = Some(url);
        while let Some(page_url) = next.take() {
            debug!("GET {}", page_url);
            let resp = self
                .http
                .get(page_url.clone())
                .timeout(self.request_timeout)
                .send()
                .await?;
            let resp = check_status(resp)?;
            let following = next_page(resp.headers(), &page_url);

            let page: Vec<Project> = resp.json().await.map_err(|e| ApiError::Decode {
                url: page_url.to_string(),
                reason: e.to_string(),
            })?;
            let exhausted = page.is_empty();
            projects.extend(page);

            next = following.filter(|u| *u != page_url && !exhausted);
        }

        debug!("Listed {} projects", projects.len());
        Ok(projects)
    }
}

#[async_trait]
impl GitlabApi for GitlabClient {
    async fn user_projects(&self, username: &str) -> Result<Vec<Project>> {
        let url = self.endpoint(&["users", username, "projects"])?;
        self.list_projects(url).await
    }

    async fn group_projects(&self, group: &str) -> Result<Vec<Project>> {
        let mut url = self.endpoint(&["groups", group, "projects"])?;
        url.query_pairs_mut()
            .append_pair("include_subgroups", "true");
        self.list_projects(url).await
    }

    async fn start_export(&self, project_id: u64) -> Result<()> {
        let id = project_id.to_string();
        let url = self.endpoint(&["projects", &id, "export"])?;
        debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .timeout(self.request_timeout)
            .send()
            .await?;
        check_status(resp)?;
        Ok(())
    }

    async fn export_status(&self, project_id: u64) -> Result<ExportStatus> {
        let id = project_id.to_string();
        let url = self.endpoint(&["projects", &id, "export"])?;
        let resp = self
            .http
            .get(url.clone())
            .timeout(self.request_timeout)
            .send()
            .await?;
        let info: ExportInfo = check_status(resp)?
            .json()
            .await
            .map_err(|e| ApiError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(info.export_status)
    }

    async fn download_export(&self, project_id: u64) -> Result<ByteStream> {
        let id = project_id.to_string();
        let url = self.endpoint(&["projects", &id, "export", "download"])?;
        debug!("GET {}", url);
        // No overall timeout, archives can take long to stream. A stalled
        // body still fails through the client's read timeout.
        let resp = check_status(self.http.get(url).send().await?)?;
        Ok(Box::pin(resp.bytes_stream().map_err(ApiError::from)))
    }
}

fn api_base(server: &Url) -> Result<Url> {
    let mut base = server.clone();
    base.set_query(None);
    base.set_fragment(None);
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join("api/v4/")?)
}

fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    Err(match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(url),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized {
            status: status.as_u16(),
        },
        _ => ApiError::Status {
            status: status.as_u16(),
            url,
        },
    })
}

/// Next page from `Link: <...>; rel="next"`, else from `X-Next-Page`.
///
/// A `Link` target on another origin is ignored so the token never leaves
/// the configured server.
fn next_page(headers: &HeaderMap, current: &Url) -> Option<Url> {
    let linked = headers
        .get(LINK)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_next_link)
        .and_then(|next| Url::parse(next).ok());
    match linked {
        Some(next) if next.origin() == current.origin() => return Some(next),
        Some(next) => debug!("Ignoring cross-origin next link {}", next),
        None => {}
    }

    let page: u32 = headers
        .get(NEXT_PAGE_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;

    let pairs: Vec<(String, String)> = current
        .query_pairs()
        .filter(|(k, _)| *k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let mut url = current.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("page", &page.to_string());
    Some(url)
}

fn parse_next_link(header: &str) -> Option<&str> {
    header.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| matches!(p.trim(), "rel=\"next\"" | "rel=next"));
        if !is_next {
            return None;
        }
        target.trim().strip_prefix('<')?.strip_suffix('>')
    })
}
