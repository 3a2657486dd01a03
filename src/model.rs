//! Canonical, provider-agnostic repository model.
//!
//! Both hosting providers are normalized into the shapes below before any
//! reconciliation happens. Instances are snapshots taken at run start; the
//! engine never mutates a fetched source repository.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Hosting providers supported for one end of a mirror run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Github,
    Gitee,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Github => "github",
            ProviderKind::Gitee => "gitee",
        }
    }

    /// Host used when a clone URL has to be synthesized from a coordinate.
    pub fn host(&self) -> &'static str {
        match self {
            ProviderKind::Github => "github.com",
            ProviderKind::Gitee => "gitee.com",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "github" => Some(ProviderKind::Github),
            "gitee" => Some(ProviderKind::Gitee),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account kind selecting the listing endpoint on a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    User,
    Org,
}

impl AccountKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(AccountKind::User),
            "org" => Some(AccountKind::Org),
            _ => None,
        }
    }
}

/// Preferred transport for clone/push URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneProtocol {
    Ssh,
    Https,
}

impl CloneProtocol {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ssh" => Some(CloneProtocol::Ssh),
            "https" => Some(CloneProtocol::Https),
            _ => None,
        }
    }
}

/// Repository owner as reported by the provider. `kind` keeps the
/// provider's native account-type string ("User", "Organization",
/// "personal", ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
    pub description: Option<String>,
    pub kind: Option<String>,
}

/// Canonical repository record shared by both provider adapters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Repository {
    pub owner: Owner,
    pub name: String,
    pub full_name: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub html_url: Option<String>,
    pub clone_url: Option<String>,
    pub ssh_url: Option<String>,
    pub fork: bool,
    pub private: bool,
    pub topics: Vec<String>,
    pub archived: bool,
    pub organization: Option<Organization>,
}

impl Repository {
    /// Clone/push URL for the requested protocol, falling back to whichever
    /// URL the provider reported.
    pub fn remote_url(&self, protocol: CloneProtocol) -> Option<String> {
        match protocol {
            CloneProtocol::Ssh => self.ssh_url.clone().or_else(|| self.clone_url.clone()),
            CloneProtocol::Https => self.clone_url.clone().or_else(|| self.ssh_url.clone()),
        }
    }
}

/// Mutable fields submitted on repository create/update calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub topics: Vec<String>,
    pub private: bool,
}

impl RepositoryRequest {
    /// Request carrying the source repository's mutable fields under a
    /// resolved destination name.
    pub fn from_source(src: &Repository, dest_name: &str) -> Self {
        Self {
            name: dest_name.to_string(),
            description: src.description.clone(),
            homepage: src.homepage.clone(),
            topics: src.topics.clone(),
            private: src.private,
        }
    }
}

/// Repositories owned by one account on one provider, keyed by name.
///
/// Insertion order reflects page order from the listing endpoints and is
/// preserved for deterministic processing.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    repos: Vec<Repository>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_repos(repos: Vec<Repository>) -> Self {
        let mut catalog = Self::new();
        for repo in repos {
            catalog.insert(repo);
        }
        catalog
    }

    /// Insert a repository; a later entry with the same name replaces the
    /// earlier one in place without disturbing catalog order.
    pub fn insert(&mut self, repo: Repository) {
        match self.index.get(&repo.name) {
            Some(&pos) => self.repos[pos] = repo,
            None => {
                self.index.insert(repo.name.clone(), self.repos.len());
                self.repos.push(repo);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Repository> {
        self.index.get(name).map(|&pos| &self.repos[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Repository> {
        self.repos.iter()
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}

/// Synthesize a remote URL from a coordinate when the destination
/// repository record is unavailable (for example after a failed create).
pub fn synthesized_remote_url(
    provider: ProviderKind,
    account: &str,
    name: &str,
    protocol: CloneProtocol,
) -> String {
    match protocol {
        CloneProtocol::Ssh => format!("git@{}:{}/{}.git", provider.host(), account, name),
        CloneProtocol::Https => format!("https://{}/{}/{}.git", provider.host(), account, name),
    }
}

/// Optional-string equality where an absent value and an empty string are
/// the same thing; providers report missing metadata either way.
pub fn opt_str_eq(a: Option<&str>, b: Option<&str>) -> bool {
    a.unwrap_or("") == b.unwrap_or("")
}

/// Drop duplicate names while keeping first-occurrence order.
pub fn dedup_preserving(names: &[String]) -> Vec<String> {
    let mut seen = HashMap::with_capacity(names.len());
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        if seen.insert(name.clone(), ()).is_none() {
            out.push(name.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str) -> Repository {
        Repository {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_opt_str_eq_treats_none_and_empty_alike() {
        assert!(opt_str_eq(None, None));
        assert!(opt_str_eq(None, Some("")));
        assert!(opt_str_eq(Some(""), None));
        assert!(opt_str_eq(Some("a"), Some("a")));
        assert!(!opt_str_eq(Some("a"), Some("b")));
        assert!(!opt_str_eq(Some("a"), None));
    }

    #[test]
    fn test_catalog_preserves_insertion_order() {
        let catalog = Catalog::from_repos(vec![repo("zeta"), repo("alpha"), repo("mid")]);

        let names: Vec<&str> = catalog.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(catalog.len(), 3);
        assert!(catalog.get("alpha").is_some());
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_catalog_replaces_duplicate_names_in_place() {
        let mut first = repo("dup");
        first.description = Some("old".to_string());
        let mut second = repo("dup");
        second.description = Some("new".to_string());

        let catalog = Catalog::from_repos(vec![repo("a"), first, repo("b"), second]);

        assert_eq!(catalog.len(), 3);
        let names: Vec<&str> = catalog.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "dup", "b"]);
        assert_eq!(catalog.get("dup").unwrap().description.as_deref(), Some("new"));
    }

    #[test]
    fn test_remote_url_prefers_requested_protocol() {
        let mut r = repo("x");
        r.clone_url = Some("https://github.com/u/x.git".to_string());
        r.ssh_url = Some("git@github.com:u/x.git".to_string());

        assert_eq!(
            r.remote_url(CloneProtocol::Https).as_deref(),
            Some("https://github.com/u/x.git")
        );
        assert_eq!(
            r.remote_url(CloneProtocol::Ssh).as_deref(),
            Some("git@github.com:u/x.git")
        );

        // Falls back to the other style when the preferred one is missing.
        r.ssh_url = None;
        assert_eq!(
            r.remote_url(CloneProtocol::Ssh).as_deref(),
            Some("https://github.com/u/x.git")
        );
    }

    #[test]
    fn test_synthesized_remote_url() {
        assert_eq!(
            synthesized_remote_url(ProviderKind::Gitee, "acct", "repo", CloneProtocol::Ssh),
            "git@gitee.com:acct/repo.git"
        );
        assert_eq!(
            synthesized_remote_url(ProviderKind::Github, "acct", "repo", CloneProtocol::Https),
            "https://github.com/acct/repo.git"
        );
    }

    #[test]
    fn test_dedup_preserving_keeps_first_occurrence() {
        let names = vec![
            "b".to_string(),
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "a".to_string(),
        ];
        assert_eq!(dedup_preserving(&names), vec!["b", "a", "c"]);
    }
}
