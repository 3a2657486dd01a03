//! repomirror - One-way git repository mirroring between hosting providers
//!
//! repomirror keeps every repository of a source account mirrored under a
//! destination account, metadata and git history both, on a
//! list-reconcile-push cycle that is safe to re-run.
//!
//! ## Core Features
//!
//! - **Account Mirroring**: Mirrors all repositories of a user or
//!   organization, GitHub to Gitee or the reverse
//! - **Filtering**: Deny-list, allow-list and per-repository renames
//! - **Metadata Sync**: Description, homepage, topics and visibility follow
//!   the source
//! - **Honest Mirrors**: Branches and tags deleted at the source are pruned
//!   from the destination
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`provider`]: Hosting-provider adapters (GitHub, Gitee)
//! - [`reconcile`]: Filter policy and run planning
//! - [`mirror`]: The sequential mirror driver

pub mod config;
pub mod error;
pub mod gitee;
pub mod github;
pub mod git;
pub mod metasync;
pub mod mirror;
pub mod model;
pub mod provider;
pub mod reconcile;

pub use config::{Config, RunSpec};
pub use error::{MirrorError, Result};
pub use mirror::{MirrorDriver, MirrorSummary};
pub use model::{Catalog, Repository};
pub use provider::Provider;
