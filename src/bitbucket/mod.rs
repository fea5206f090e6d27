//! A typed client for the parts of the Bitbucket 2.0 REST API this tool
//! consumes.

mod pagination;

pub use self::pagination::{Paginated, RetryPolicy};

use failure::{Error, ResultExt};
use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;

use self::pagination::Page;

pub const DEFAULT_API_ROOT: &str = "https://api.bitbucket.org/2.0";

/// A handle to the Bitbucket REST API, authenticated with a username and
/// app password.
#[derive(Debug, Clone)]
pub struct Bitbucket {
    client: Client,
    api_root: String,
    username: String,
    password: String,
    retry: RetryPolicy,
    follow_all_pages: bool,
}

impl Bitbucket {
    pub fn new<U, P>(username: U, password: P) -> Bitbucket
    where
        U: Into<String>,
        P: Into<String>,
    {
        Bitbucket {
            client: Client::new(),
            api_root: DEFAULT_API_ROOT.to_string(),
            username: username.into(),
            password: password.into(),
            retry: RetryPolicy::default(),
            follow_all_pages: false,
        }
    }

    /// Point the client at a different API root.
    pub fn with_api_root(mut self, api_root: &str) -> Bitbucket {
        self.api_root = api_root.trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Bitbucket {
        self.retry = retry;
        self
    }

    /// Follow `next` links on the project and per-project repository
    /// listings instead of fetching just their first page. Off by default.
    pub fn follow_all_pages(mut self, follow: bool) -> Bitbucket {
        self.follow_all_pages = follow;
        self
    }

    pub(crate) fn credentials(&self) -> (&str, &str) {
        (&self.username, &self.password)
    }

    /// Every workspace visible to these credentials, in API order.
    ///
    /// A failing first page leaves this empty rather than being an error;
    /// the walker will already have logged the failure.
    pub fn workspaces(&self) -> Result<Vec<Workspace>, Error> {
        debug!("Fetching workspaces");

        let mut workspaces = Vec::new();

        let url = format!("{}/workspaces", self.api_root);
        for workspace in self.paginated::<RawWorkspace>(url) {
            workspaces.push(Workspace::from(workspace?));
        }

        debug!("Found {} workspaces", workspaces.len());
        Ok(workspaces)
    }

    /// The projects of a workspace. A non-200 response is treated as "no
    /// projects".
    pub fn projects(&self, slug: &str) -> Result<Vec<Project>, Error> {
        debug!("Fetching the projects of {}", slug);

        let url = format!("{}/workspaces/{}/projects", self.api_root, slug);
        let raw: Vec<RawProject> = self.fetch_values(&url)?;

        Ok(raw.into_iter().map(Project::from).collect())
    }

    /// Walk every repository of a workspace, ten to a page, optionally
    /// restricted to a single project key.
    pub fn repositories<'a>(
        &'a self,
        workspace: &str,
        project: Option<&str>,
    ) -> impl Iterator<Item = Result<Repository, Error>> + 'a {
        let mut url = format!("{}/repositories/{}?pagelen=10", self.api_root, workspace);
        if let Some(key) = project {
            url.push_str(&format!("&q=project.key%3D%22{}%22", key));
        }

        self.paginated::<RawRepository>(url)
            .map(|item| item.map(Repository::from))
    }

    /// The repositories behind a project's `repositories` link. A non-200
    /// response is treated as "no repositories".
    pub fn repositories_at(&self, url: &str) -> Result<Vec<Repository>, Error> {
        let raw: Vec<RawRepository> = self.fetch_values(url)?;
        Ok(raw.into_iter().map(Repository::from).collect())
    }

    fn paginated<T: DeserializeOwned>(&self, first_page: String) -> Paginated<T> {
        Paginated::new(
            self.client.clone(),
            &self.username,
            &self.password,
            self.retry,
            first_page,
        )
    }

    fn fetch_values<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, Error> {
        if self.follow_all_pages {
            return self.paginated(url.to_string()).collect();
        }

        let response = pagination::get(
            &self.client,
            &self.username,
            &self.password,
            self.retry,
            url,
        )?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!("The url {} returned status code {}.", url, status);
            return Ok(Vec::new());
        }

        let page: Page<T> = response
            .json()
            .context("Unable to deserialize the response")?;

        Ok(page.values)
    }
}

/// A top-level namespace grouping repositories.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub name: String,
    /// The url-safe identifier, used both as an API path segment and as the
    /// default local directory name.
    pub slug: String,
    /// The human-facing link to the workspace.
    pub url: String,
}

/// A named sub-grouping of repositories within a workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub name: String,
    /// The endpoint listing the repositories under this project.
    pub repositories_link: String,
}

/// A single repository, as reported by the listing endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Repository {
    pub name: String,
    /// The version control system backing the repository. Only `"git"`
    /// repositories can be cloned.
    pub scm: String,
    pub clone_links: Vec<CloneLink>,
}

impl Repository {
    /// The `https` clone URL, if the repository advertises one.
    pub fn https_clone_link(&self) -> Option<&str> {
        self.clone_links
            .iter()
            .find(|link| link.name == "https")
            .map(|link| link.href.as_str())
    }
}

/// A protocol-labelled URL a repository can be cloned from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CloneLink {
    pub name: String,
    pub href: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawWorkspace {
    name: String,
    slug: String,
    links: RawWorkspaceLinks,
}

#[derive(Debug, Clone, Deserialize)]
struct RawWorkspaceLinks {
    html: RawLink,
}

#[derive(Debug, Clone, Deserialize)]
struct RawLink {
    href: String,
}

impl From<RawWorkspace> for Workspace {
    fn from(raw: RawWorkspace) -> Workspace {
        Workspace {
            name: raw.name,
            slug: raw.slug,
            url: raw.links.html.href,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawProject {
    name: String,
    links: RawProjectLinks,
}

#[derive(Debug, Clone, Deserialize)]
struct RawProjectLinks {
    repositories: RawLink,
}

impl From<RawProject> for Project {
    fn from(raw: RawProject) -> Project {
        Project {
            name: raw.name,
            repositories_link: raw.links.repositories.href,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawRepository {
    name: String,
    scm: String,
    links: RawRepositoryLinks,
}

#[derive(Debug, Clone, Deserialize)]
struct RawRepositoryLinks {
    #[serde(default)]
    clone: Vec<CloneLink>,
}

impl From<RawRepository> for Repository {
    fn from(raw: RawRepository) -> Repository {
        Repository {
            name: raw.name,
            scm: raw.scm,
            clone_links: raw.links.clone,
        }
    }
}
