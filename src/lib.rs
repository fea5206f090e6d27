//! Mirror the repositories of one or more Bitbucket workspaces onto local
//! disk.
//!
//! The crate walks the Bitbucket REST API (workspaces, then optionally
//! projects, then repositories), decides for each repository whether to
//! clone it, skip it, or replace an existing checkout, and shells out to
//! `git` for the actual transfer. Everything runs sequentially over blocking
//! I/O; the only "state" is the directory tree left behind by previous runs.
//!
//! The pieces fit together like so:
//!
//! - [`Bitbucket`] is the API handle. It exposes the typed listings
//!   ([`Workspace`], [`Project`], [`Repository`]) and the page-following
//!   walker underneath them.
//! - [`Driver`] clones every repository of the target workspaces into
//!   `{workspace}/{repo}` directories, honouring the skip-existing policy.
//! - [`ProjectCloner`] is the project-aware variant, building a
//!   `{root}/{workspace}/{project}/{repo}` tree from a
//!   [`ProjectCloneRequest`].
//! - [`Cloner`] abstracts the clone side effect so the orchestration can be
//!   exercised without touching the network or spawning `git`.

pub mod bitbucket;
mod config;
mod credentials;
mod driver;
mod git;
mod projects;

pub use crate::bitbucket::{
    Bitbucket, CloneLink, Project, Repository, RetryPolicy, Workspace,
};
pub use crate::config::{Config, General};
pub use crate::credentials::add_credentials;
pub use crate::driver::{CloneOptions, Driver};
pub use crate::git::{Cloner, GitClone};
pub use crate::projects::{
    folder_name, ProjectCloneRequest, ProjectCloneSummary, ProjectCloner,
};
