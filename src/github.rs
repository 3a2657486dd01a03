//! GitHub provider adapter built on octocrab.

use async_trait::async_trait;
use octocrab::models;
use octocrab::Octocrab;
use tracing::{debug, info, warn};

use crate::error::{MirrorError, Result};
use crate::model::{
    AccountKind, Organization, Owner, ProviderKind, Repository, RepositoryRequest,
};
use crate::provider::Provider;

const MAX_PER_PAGE: u8 = 100;

/// GitHub adapter. Listing, create and update all go through one octocrab
/// client scoped to this run.
pub struct GithubProvider {
    client: Octocrab,
    /// Login of the token's user, used to pick the create endpoint.
    login: Option<String>,
}

impl GithubProvider {
    pub async fn new(token: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder();
        if let Some(token) = token {
            builder = builder.personal_token(token.to_string());
        }
        let client = builder.build().map_err(api_err)?;

        // Resolve the authenticated login up front; create-repository under
        // the token's own account uses a different endpoint than an org.
        let login = if token.is_some() {
            match client.current().user().await {
                Ok(user) => Some(user.login),
                Err(e) => {
                    warn!("could not resolve authenticated GitHub user: {}", e);
                    None
                }
            }
        } else {
            None
        };

        if let Some(login) = &login {
            info!("authenticated as GitHub user: {}", login);
        }

        Ok(Self { client, login })
    }

    async fn list_user_repositories(&self, account: &str) -> Result<Vec<Repository>> {
        debug!("fetching repositories for user: {}", account);

        let mut repositories = Vec::new();
        let mut page = 1u32;

        loop {
            let route = format!(
                "/users/{}/repos?type=owner&per_page={}&page={}",
                account, MAX_PER_PAGE, page
            );
            let items: Vec<models::Repository> =
                self.client.get(route, None::<&()>).await.map_err(api_err)?;

            let count = items.len();
            repositories.extend(items.into_iter().map(map_repository));

            if count < MAX_PER_PAGE as usize {
                break;
            }
            page += 1;
        }

        Ok(repositories)
    }

    async fn list_org_repositories(&self, org: &str) -> Result<Vec<Repository>> {
        debug!("fetching repositories for organization: {}", org);

        let mut repositories = Vec::new();
        let mut page = 1u8;

        loop {
            let page_repos = self
                .client
                .orgs(org)
                .list_repos()
                .per_page(MAX_PER_PAGE)
                .page(page)
                .send()
                .await
                .map_err(api_err)?;

            let items = page_repos.items;
            let count = items.len();
            repositories.extend(items.into_iter().map(map_repository));

            if count < MAX_PER_PAGE as usize {
                break;
            }
            // GitHub API pagination limit for u8
            if page == u8::MAX {
                warn!("reached maximum pagination limit for org: {}", org);
                break;
            }
            page += 1;
        }

        Ok(repositories)
    }
}

#[async_trait]
impl Provider for GithubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Github
    }

    async fn list_organizations(&self, user: &str) -> Result<Vec<Organization>> {
        let mut organizations = Vec::new();
        let mut page = 1u32;

        loop {
            let route = format!("/users/{}/orgs?per_page={}&page={}", user, MAX_PER_PAGE, page);
            let items: Vec<models::orgs::Organization> =
                self.client.get(route, None::<&()>).await.map_err(api_err)?;

            let count = items.len();
            organizations.extend(items.into_iter().map(map_organization));

            if count < MAX_PER_PAGE as usize {
                break;
            }
            page += 1;
        }

        Ok(organizations)
    }

    async fn get_organization(&self, name: &str) -> Result<Organization> {
        match self.client.orgs(name).get().await {
            Ok(org) => Ok(map_organization(org)),
            Err(e) if status_of(&e) == Some(404) => {
                Err(MirrorError::not_found("Organization", name))
            }
            Err(e) => Err(api_err(e)),
        }
    }

    async fn list_repositories(&self, account: &str, kind: AccountKind) -> Result<Vec<Repository>> {
        let repos = match kind {
            AccountKind::User => self.list_user_repositories(account).await?,
            AccountKind::Org => self.list_org_repositories(account).await?,
        };

        info!("found {} repositories for github/{}", repos.len(), account);
        Ok(repos)
    }

    async fn get_repository(&self, owner: &str, name: &str) -> Result<Repository> {
        match self.client.repos(owner, name).get().await {
            Ok(repo) => Ok(map_repository(repo)),
            Err(e) if status_of(&e) == Some(404) => Err(MirrorError::not_found(
                "Repository",
                format!("{}/{}", owner, name),
            )),
            Err(e) => Err(api_err(e)),
        }
    }

    async fn create_repository(&self, owner: &str, req: &RepositoryRequest) -> Result<Repository> {
        if req.name.is_empty() {
            return Err(MirrorError::config("new repo name must not be empty"));
        }

        let route = match &self.login {
            // Creating under the token's own account uses /user/repos.
            Some(login) if login == owner => "/user/repos".to_string(),
            _ => format!("/orgs/{}/repos", owner),
        };

        let body = request_body(req);
        match self
            .client
            .post::<_, models::Repository>(route, Some(&body))
            .await
        {
            Ok(repo) => Ok(map_repository(repo)),
            // 422: name already exists on this account; resolve and return
            // the existing repository instead (idempotent create).
            Err(e) if status_of(&e) == Some(422) => {
                debug!("repository {} already exists, re-fetching", req.name);
                self.get_repository(owner, &req.name).await.map_err(|_| {
                    MirrorError::CreateFailed {
                        name: req.name.clone(),
                        detail: e.to_string(),
                    }
                })
            }
            Err(e) => Err(MirrorError::CreateFailed {
                name: req.name.clone(),
                detail: e.to_string(),
            }),
        }
    }

    async fn update_repository(
        &self,
        owner: &str,
        name: &str,
        req: &RepositoryRequest,
    ) -> Result<Repository> {
        let route = format!("/repos/{}/{}", owner, name);
        let body = request_body(req);

        match self
            .client
            .patch::<models::Repository, _, _>(route, Some(&body))
            .await
        {
            Ok(repo) => Ok(map_repository(repo)),
            Err(e) => Err(MirrorError::UpdateFailed {
                owner: owner.to_string(),
                name: name.to_string(),
                detail: e.to_string(),
            }),
        }
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
    if !req.topics.is_empty() {
        body.insert("topics".into(), req.topics.clone().into());
    }
    body.insert("private".into(), req.private.into());
    serde_json::Value::Object(body)
}

fn map_repository(repo: models::Repository) -> Repository {
    Repository {
        owner: Owner {
            name: repo
                .owner
                .as_ref()
                .map(|o| o.login.clone())
                .unwrap_or_default(),
            kind: None,
        },
        name: repo.name.clone(),
        full_name: repo.full_name.clone(),
        description: repo.description.clone(),
        homepage: repo.homepage.clone(),
        html_url: repo.html_url.as_ref().map(|u| u.to_string()),
        clone_url: repo.clone_url.as_ref().map(|u| u.to_string()),
        ssh_url: repo.ssh_url.clone(),
        fork: repo.fork.unwrap_or(false),
        private: repo.private.unwrap_or(false),
        topics: repo.topics.clone().unwrap_or_default(),
        archived: repo.archived.unwrap_or(false),
        organization: None,
    }
}

fn map_organization(org: models::orgs::Organization) -> Organization {
    Organization {
        name: org.login,
        description: org.description,
        kind: None,
    }
}

fn api_err(err: octocrab::Error) -> MirrorError {
    MirrorError::Api {
        provider: "github",
        detail: err.to_string(),
    }
}

fn status_of(err: &octocrab::Error) -> Option<u16> {
    match err {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn org_json(n: u32) -> serde_json::Value {
        json!({
            "login": format!("org{}", n),
            "id": n,
            "node_id": format!("o{}", n),
            "url": format!("https://api.github.com/orgs/org{}", n),
            "repos_url": format!("https://api.github.com/orgs/org{}/repos", n),
            "events_url": format!("https://api.github.com/orgs/org{}/events", n),
            "hooks_url": format!("https://api.github.com/orgs/org{}/hooks", n),
            "issues_url": format!("https://api.github.com/orgs/org{}/issues", n),
            "members_url": format!("https://api.github.com/orgs/org{}/members{{/member}}", n),
            "public_members_url":
                format!("https://api.github.com/orgs/org{}/public_members{{/member}}", n),
            "avatar_url": format!("https://avatars.example/o/{}", n)
        })
    }

    #[tokio::test]
    async fn test_list_organizations_walks_past_the_first_page() {
        let server = MockServer::start().await;
        let full_page: Vec<_> = (0..u32::from(MAX_PER_PAGE)).map(org_json).collect();
        Mock::given(method("GET"))
            .and(path("/users/octocat/orgs"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&full_page))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/octocat/orgs"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![org_json(100)]))
            .mount(&server)
            .await;

        let client = Octocrab::builder()
            .base_uri(server.uri())
            .expect("base uri")
            .build()
            .expect("client");
        let provider = GithubProvider {
            client,
            login: None,
        };

        let orgs = provider
            .list_organizations("octocat")
            .await
            .expect("list organizations");
        assert_eq!(orgs.len(), 101);
        assert_eq!(orgs[0].name, "org0");
        assert_eq!(orgs[100].name, "org100");
    }

    #[test]
    fn test_map_repository_fields() {
        let raw = json!({
            "id": 1,
            "node_id": "n1",
            "name": "widget",
            "full_name": "octocat/widget",
            "url": "https://api.github.com/repos/octocat/widget",
            "owner": {
                "login": "octocat",
                "id": 2,
                "node_id": "n2",
                "avatar_url": "https://avatars.example/u/2",
                "gravatar_id": "",
                "url": "https://api.github.com/users/octocat",
                "html_url": "https://github.com/octocat",
                "followers_url": "https://api.github.com/users/octocat/followers",
                "following_url": "https://api.github.com/users/octocat/following{/other_user}",
                "gists_url": "https://api.github.com/users/octocat/gists{/gist_id}",
                "starred_url": "https://api.github.com/users/octocat/starred{/owner}{/repo}",
                "subscriptions_url": "https://api.github.com/users/octocat/subscriptions",
                "organizations_url": "https://api.github.com/users/octocat/orgs",
                "repos_url": "https://api.github.com/users/octocat/repos",
                "events_url": "https://api.github.com/users/octocat/events{/privacy}",
                "received_events_url": "https://api.github.com/users/octocat/received_events",
                "type": "User",
                "site_admin": false
            },
            "description": "a widget",
            "homepage": "https://widget.example",
            "html_url": "https://github.com/octocat/widget",
            "clone_url": "https://github.com/octocat/widget.git",
            "ssh_url": "git@github.com:octocat/widget.git",
            "fork": true,
            "private": true,
            "topics": ["rust", "mirror"],
            "archived": false
        });

        let repo: models::Repository = serde_json::from_value(raw).expect("model parse");
        let mapped = map_repository(repo);

        assert_eq!(mapped.owner.name, "octocat");
        assert_eq!(mapped.name, "widget");
        assert_eq!(mapped.full_name.as_deref(), Some("octocat/widget"));
        assert_eq!(mapped.description.as_deref(), Some("a widget"));
        assert_eq!(mapped.homepage.as_deref(), Some("https://widget.example"));
        assert_eq!(
            mapped.clone_url.as_deref(),
            Some("https://github.com/octocat/widget.git")
        );
        assert_eq!(
            mapped.ssh_url.as_deref(),
            Some("git@github.com:octocat/widget.git")
        );
        assert!(mapped.fork);
        assert!(mapped.private);
        assert_eq!(mapped.topics, vec!["rust", "mirror"]);
    }

    #[test]
    fn test_request_body_skips_absent_fields() {
        let req = RepositoryRequest {
            name: "widget".to_string(),
            description: None,
            homepage: Some("https://widget.example".to_string()),
            topics: vec![],
            private: false,
        };

        let body = request_body(&req);
        assert_eq!(body["name"], "widget");
        assert_eq!(body["homepage"], "https://widget.example");
        assert_eq!(body["private"], false);
        assert!(body.get("description").is_none());
        assert!(body.get("topics").is_none());
    }
}
