//! Metadata synchronization: make the destination repository record match
//! the source before any git history moves.
//!
//! Metadata is best-effort relative to the git sync: a failed update keeps
//! the run going, because commit history is the actual promise of a mirror.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::{opt_str_eq, Catalog, Repository, RepositoryRequest};
use crate::provider::Provider;

pub struct MetadataSync<'a> {
    provider: &'a dyn Provider,
    dest_account: &'a str,
}

impl<'a> MetadataSync<'a> {
    pub fn new(provider: &'a dyn Provider, dest_account: &'a str) -> Self {
        Self {
            provider,
            dest_account,
        }
    }

    /// Create or update the destination repository for one sync unit and
    /// return the resolved destination record.
    ///
    /// Absent destination: create it carrying the source's description,
    /// homepage, topics and visibility (a `CreateFailed` error propagates
    /// to the caller). Present destination: submit one update if any
    /// tracked field drifted; update failures are downgraded to warnings
    /// and the existing record is returned.
    pub async fn sync(
        &self,
        src: &Repository,
        dest_name: &str,
        dest_catalog: &Catalog,
    ) -> Result<Repository> {
        let req = RepositoryRequest::from_source(src, dest_name);

        let Some(existing) = dest_catalog.get(dest_name) else {
            info!("creating destination repository {}", dest_name);
            return self.provider.create_repository(self.dest_account, &req).await;
        };

        if !needs_update(src, existing) {
            debug!("destination repository {} metadata is up to date", dest_name);
            return Ok(existing.clone());
        }

        let owner = if existing.owner.name.is_empty() {
            self.dest_account
        } else {
            &existing.owner.name
        };

        match self.provider.update_repository(owner, dest_name, &req).await {
            Ok(updated) => Ok(updated),
            Err(e) => {
                warn!("update repo {}/{} err: {}", owner, dest_name, e);
                Ok(existing.clone())
            }
        }
    }
}

/// Whether any tracked metadata field drifted between source and
/// destination.
///
/// The topic comparison is by cardinality only: topic content changes of
/// equal size are not detected. This mirrors the observed behavior of the
/// original tool and is a documented limitation.
fn needs_update(src: &Repository, dst: &Repository) -> bool {
    !opt_str_eq(dst.description.as_deref(), src.description.as_deref())
        || !opt_str_eq(dst.homepage.as_deref(), src.homepage.as_deref())
        || dst.topics.len() != src.topics.len()
        || dst.private != src.private
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MirrorError;
    use crate::model::Owner;
    use crate::provider::MockProvider;

    fn src_repo() -> Repository {
        Repository {
            name: "widget".to_string(),
            description: Some("D1".to_string()),
            homepage: Some("H1".to_string()),
            topics: vec!["rust".to_string()],
            private: true,
            ..Default::default()
        }
    }

    fn dest_repo() -> Repository {
        Repository {
            owner: Owner {
                name: "mirror".to_string(),
                kind: None,
            },
            ..src_repo()
        }
    }

    #[tokio::test]
    async fn test_absent_destination_is_created_with_source_values() {
        let mut provider = MockProvider::new();
        provider
            .expect_create_repository()
            .withf(|owner, req| {
                owner == "mirror"
                    && req.name == "widget"
                    && req.description.as_deref() == Some("D1")
                    && req.homepage.as_deref() == Some("H1")
                    && req.private
            })
            .times(1)
            .returning(|_, req| {
                Ok(Repository {
                    name: req.name.clone(),
                    private: req.private,
                    ..Default::default()
                })
            });

        let sync = MetadataSync::new(&provider, "mirror");
        let created = sync
            .sync(&src_repo(), "widget", &Catalog::new())
            .await
            .unwrap();

        assert_eq!(created.name, "widget");
        assert!(created.private);
    }

    #[tokio::test]
    async fn test_unchanged_destination_issues_no_update() {
        // No update_repository expectation: any call would panic.
        let provider = MockProvider::new();
        let catalog = Catalog::from_repos(vec![dest_repo()]);

        let sync = MetadataSync::new(&provider, "mirror");
        let resolved = sync.sync(&src_repo(), "widget", &catalog).await.unwrap();

        assert_eq!(resolved.name, "widget");
    }

    #[tokio::test]
    async fn test_description_drift_issues_exactly_one_update() {
        let mut dst = dest_repo();
        dst.description = Some("D2".to_string());
        let catalog = Catalog::from_repos(vec![dst]);

        let mut provider = MockProvider::new();
        provider
            .expect_update_repository()
            .withf(|owner, name, req| {
                owner == "mirror" && name == "widget" && req.description.as_deref() == Some("D1")
            })
            .times(1)
            .returning(|_, _, req| {
                Ok(Repository {
                    name: req.name.clone(),
                    description: req.description.clone(),
                    ..Default::default()
                })
            });

        let sync = MetadataSync::new(&provider, "mirror");
        let updated = sync.sync(&src_repo(), "widget", &catalog).await.unwrap();

        assert_eq!(updated.description.as_deref(), Some("D1"));
    }

    #[tokio::test]
    async fn test_topic_diff_is_cardinality_only() {
        // Same number of topics, different content: no update issued.
        let mut dst = dest_repo();
        dst.topics = vec!["golang".to_string()];
        let catalog = Catalog::from_repos(vec![dst]);

        let provider = MockProvider::new();
        let sync = MetadataSync::new(&provider, "mirror");
        sync.sync(&src_repo(), "widget", &catalog).await.unwrap();

        // Different cardinality does trigger an update.
        let mut dst = dest_repo();
        dst.topics = vec![];
        let catalog = Catalog::from_repos(vec![dst]);

        let mut provider = MockProvider::new();
        provider
            .expect_update_repository()
            .times(1)
            .returning(|_, _, req| {
                Ok(Repository {
                    name: req.name.clone(),
                    topics: req.topics.clone(),
                    ..Default::default()
                })
            });

        let sync = MetadataSync::new(&provider, "mirror");
        sync.sync(&src_repo(), "widget", &catalog).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_failure_is_recovered_with_existing_record() {
        let mut dst = dest_repo();
        dst.homepage = Some("H-old".to_string());
        let catalog = Catalog::from_repos(vec![dst]);

        let mut provider = MockProvider::new();
        provider
            .expect_update_repository()
            .times(1)
            .returning(|owner, name, _| {
                Err(MirrorError::UpdateFailed {
                    owner: owner.to_string(),
                    name: name.to_string(),
                    detail: "forbidden".to_string(),
                })
            });

        let sync = MetadataSync::new(&provider, "mirror");
        let resolved = sync.sync(&src_repo(), "widget", &catalog).await.unwrap();

        // Best-effort: the pre-existing destination record comes back.
        assert_eq!(resolved.homepage.as_deref(), Some("H-old"));
    }

    #[tokio::test]
    async fn test_none_and_empty_description_are_equal() {
        let mut src = src_repo();
        src.description = None;
        src.homepage = None;
        let mut dst = dest_repo();
        dst.description = Some(String::new());
        dst.homepage = Some(String::new());
        let catalog = Catalog::from_repos(vec![dst]);

        let provider = MockProvider::new();
        let sync = MetadataSync::new(&provider, "mirror");
        sync.sync(&src, "widget", &catalog).await.unwrap();
    }
}
