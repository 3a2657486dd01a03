//! Gitee provider adapter over the v5 REST API.
//!
//! Gitee has no maintained Rust SDK, so this adapter speaks the REST API
//! directly through reqwest. Authentication is an `access_token` query
//! parameter on every call.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{MirrorError, Result};
use crate::model::{
    AccountKind, Organization, Owner, ProviderKind, Repository, RepositoryRequest,
};
use crate::provider::Provider;

const DEFAULT_BASE_URL: &str = "https://gitee.com/api/v5";
const MAX_PER_PAGE: u32 = 100;

pub struct GiteeProvider {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Wire shape of a Gitee project (subset of fields this engine reads).
#[derive(Debug, Deserialize)]
struct GiteeProject {
    name: String,
    full_name: Option<String>,
    description: Option<String>,
    html_url: String,
    ssh_url: Option<String>,
    homepage: Option<String>,
    #[serde(default)]
    fork: bool,
    #[serde(default)]
    private: bool,
    owner: Option<GiteeUser>,
    namespace: Option<GiteeNamespace>,
}

#[derive(Debug, Deserialize)]
struct GiteeUser {
    login: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GiteeNamespace {
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GiteeGroup {
    login: String,
    description: Option<String>,
}

impl GiteeProvider {
    pub fn new(token: Option<&str>) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    /// Constructor with an explicit API base, used by HTTP-mock tests.
    pub fn with_base_url(base_url: &str, token: Option<&str>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("repomirror/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| api_err(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_query(&self) -> Vec<(&'static str, String)> {
        match &self.token {
            Some(token) => vec![("access_token", token.clone())],
            None => Vec::new(),
        }
    }

    async fn get_response(
        &self,
        path: &str,
        extra_query: &[(&'static str, String)],
    ) -> Result<reqwest::Response> {
        let mut query = self.auth_query();
        query.extend_from_slice(extra_query);

        self.http
            .get(self.url(path))
            .query(&query)
            .send()
            .await
            .map_err(|e| api_err(e.to_string()))
    }

    /// Page through a listing endpoint until a short page comes back.
    async fn list_projects(&self, path: &str) -> Result<Vec<GiteeProject>> {
        let mut projects: Vec<GiteeProject> = Vec::new();
        let mut page = 1u32;

        loop {
            let query = [
                ("page", page.to_string()),
                ("per_page", MAX_PER_PAGE.to_string()),
            ];
            let resp = self.get_response(path, &query).await?;

            if resp.status() == StatusCode::NOT_FOUND {
                return Err(MirrorError::not_found("Repository listing", path));
            }
            let resp = check_status(resp).await?;

            let items: Vec<GiteeProject> =
                resp.json().await.map_err(|e| api_err(e.to_string()))?;
            let count = items.len();
            projects.extend(items);

            if count < MAX_PER_PAGE as usize {
                break;
            }
            page += 1;
        }

        Ok(projects)
    }
}

#[async_trait]
impl Provider for GiteeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gitee
    }

    async fn list_organizations(&self, user: &str) -> Result<Vec<Organization>> {
        let path = format!("/users/{}/orgs", user);
        let query = [("per_page", MAX_PER_PAGE.to_string())];
        let resp = check_status(self.get_response(&path, &query).await?).await?;

        let groups: Vec<GiteeGroup> = resp.json().await.map_err(|e| api_err(e.to_string()))?;
        Ok(groups.into_iter().map(map_group).collect())
    }

    async fn get_organization(&self, name: &str) -> Result<Organization> {
        let resp = self.get_response(&format!("/orgs/{}", name), &[]).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(MirrorError::not_found("Organization", name));
        }
        let resp = check_status(resp).await?;

        let group: GiteeGroup = resp.json().await.map_err(|e| api_err(e.to_string()))?;
        Ok(map_group(group))
    }

    async fn list_repositories(&self, account: &str, kind: AccountKind) -> Result<Vec<Repository>> {
        let path = match kind {
            // /user/repos lists the token's own repositories.
            AccountKind::User => "/user/repos".to_string(),
            AccountKind::Org => format!("/orgs/{}/repos", account),
        };

        let projects = self.list_projects(&path).await?;
        let repos: Vec<Repository> = projects.into_iter().map(map_project).collect();

        info!("found {} repositories for gitee/{}", repos.len(), account);
        Ok(repos)
    }

    async fn get_repository(&self, owner: &str, name: &str) -> Result<Repository> {
        let path = format!("/repos/{}/{}", owner, name);
        let resp = self.get_response(&path, &[]).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(MirrorError::not_found(
                "Repository",
                format!("{}/{}", owner, name),
            ));
        }
        let resp = check_status(resp).await?;

        let project: GiteeProject = resp.json().await.map_err(|e| api_err(e.to_string()))?;
        Ok(map_project(project))
    }

    async fn create_repository(&self, owner: &str, req: &RepositoryRequest) -> Result<Repository> {
        if req.name.is_empty() {
            return Err(MirrorError::config("new repo name must not be empty"));
        }

        // An organization and a user account take different create
        // endpoints; probe which one the destination account is.
        let path = match self.get_organization(owner).await {
            Ok(_) => format!("/orgs/{}/repos", owner),
            Err(_) => "/user/repos".to_string(),
        };

        let body = request_body(req);
        let result = self
            .http
            .post(self.url(&path))
            .query(&self.auth_query())
            .json(&body)
            .send()
            .await
            .map_err(|e| api_err(e.to_string()))?;

        if result.status().is_success() {
            let project: GiteeProject =
                result.json().await.map_err(|e| api_err(e.to_string()))?;
            return Ok(map_project(project));
        }

        // Gitee rejects duplicate names with a 4xx; treat an existing
        // repository as the create result (idempotent create).
        let detail = response_detail(result).await;
        if let Ok(existing) = self.get_repository(owner, &req.name).await {
            debug!("repository {} already exists, re-fetching", req.name);
            return Ok(existing);
        }

        Err(MirrorError::CreateFailed {
            name: req.name.clone(),
            detail,
        })
    }

    async fn update_repository(
        &self,
        owner: &str,
        name: &str,
        req: &RepositoryRequest,
    ) -> Result<Repository> {
        // Gitee requires the (unchanged) name in every PATCH body.
        let mut body = request_body(req);
        body["name"] = serde_json::Value::String(name.to_string());

        let result = self
            .http
            .patch(self.url(&format!("/repos/{}/{}", owner, name)))
            .query(&self.auth_query())
            .json(&body)
            .send()
            .await
            .map_err(|e| api_err(e.to_string()))?;

        if !result.status().is_success() {
            return Err(MirrorError::UpdateFailed {
                owner: owner.to_string(),
                name: name.to_string(),
                detail: response_detail(result).await,
            });
        }

        let project: GiteeProject = result.json().await.map_err(|e| api_err(e.to_string()))?;
        Ok(map_project(project))
    }
}

fn request_body(req: &RepositoryRequest) -> serde_json::Value {
    let mut body = serde_json::Map::new();
    body.insert("name".into(), req.name.clone().into());
    if let Some(description) = &req.description {
        body.insert("description".into(), description.clone().into());
    }
    if let Some(homepage) = &req.homepage {
        body.insert("homepage".into(), homepage.clone().into());
    }
    body.insert("private".into(), req.private.into());
    serde_json::Value::Object(body)
}

fn map_project(project: GiteeProject) -> Repository {
    let html_url = project.html_url.trim_end_matches(".git").to_string();

    Repository {
        owner: project
            .owner
            .map(|o| Owner {
                name: o.login,
                kind: o.kind,
            })
            .unwrap_or_default(),
        name: project.name,
        full_name: project.full_name,
        description: project.description,
        homepage: project.homepage,
        html_url: Some(html_url),
        clone_url: Some(project.html_url),
        ssh_url: project.ssh_url,
        fork: project.fork,
        private: project.private,
        // Gitee's repository listing carries no topic set.
        topics: Vec::new(),
        archived: false,
        organization: project.namespace.map(|ns| Organization {
            name: ns.name,
            description: None,
            kind: ns.kind,
        }),
    }
}

fn map_group(group: GiteeGroup) -> Organization {
    Organization {
        name: group.login,
        description: group.description,
        kind: None,
    }
}

fn api_err(detail: String) -> MirrorError {
    MirrorError::Api {
        provider: "gitee",
        detail,
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(api_err(response_detail(resp).await))
    }
}

async fn response_detail(resp: reqwest::Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    format!("status {}: {}", status, body)
}
