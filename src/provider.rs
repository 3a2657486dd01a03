//! Hosting-provider capability interface.
//!
//! One adapter instance exists per provider per run (source and
//! destination). Each adapter owns its own pagination and field-mapping
//! logic and produces the canonical [`Repository`] shape.

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::gitee::GiteeProvider;
use crate::github::GithubProvider;
use crate::model::{AccountKind, Organization, ProviderKind, Repository, RepositoryRequest};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Organizations the given user belongs to.
    async fn list_organizations(&self, user: &str) -> Result<Vec<Organization>>;

    /// A single organization, or `NotFound`.
    async fn get_organization(&self, name: &str) -> Result<Organization>;

    /// All repositories of an account. `kind` selects the user or the
    /// organization listing endpoint; page order is preserved.
    async fn list_repositories(&self, account: &str, kind: AccountKind) -> Result<Vec<Repository>>;

    /// A single repository, or `NotFound`.
    async fn get_repository(&self, owner: &str, name: &str) -> Result<Repository>;

    /// Create a repository under the given account. Idempotent: when the
    /// provider reports the name as already taken, the existing repository
    /// is fetched and returned instead of an error.
    async fn create_repository(&self, owner: &str, req: &RepositoryRequest) -> Result<Repository>;

    /// Update the mutable fields of an existing repository.
    async fn update_repository(
        &self,
        owner: &str,
        name: &str,
        req: &RepositoryRequest,
    ) -> Result<Repository>;
}

/// Build the adapter for one side of the run.
pub async fn new_provider(kind: ProviderKind, token: Option<&str>) -> Result<Box<dyn Provider>> {
    info!(
        "init {} API use accessToken(len: {})",
        kind,
        token.map(str::len).unwrap_or(0)
    );

    match kind {
        ProviderKind::Github => Ok(Box::new(GithubProvider::new(token).await?)),
        ProviderKind::Gitee => Ok(Box::new(GiteeProvider::new(token)?)),
    }
}
