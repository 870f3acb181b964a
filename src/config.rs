//! Loads the project file (`ephemeris.yaml`) and resolves it into the
//! immutable settings every stage of a build reads. Nothing here is global:
//! [`SiteConfig`] is passed explicitly into the coordinator and each job.

use crate::entry::DEFAULT_RECENT_COUNT;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "ephemeris.yaml";

#[derive(Deserialize)]
struct RecentCount(usize);
impl Default for RecentCount {
    fn default() -> Self {
        RecentCount(DEFAULT_RECENT_COUNT)
    }
}

fn default_posts_path() -> PathBuf {
    PathBuf::from("data/")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output")
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    /// `posts` is the key older project files used.
    #[serde(default = "default_posts_path", alias = "posts")]
    posts_path: PathBuf,

    #[serde(default = "default_output_path")]
    output_path: PathBuf,

    prefix: Url,

    #[serde(default)]
    comment_api: String,

    #[serde(default)]
    theme_path: Option<PathBuf>,

    #[serde(default)]
    recent_count: RecentCount,
}

/// The settings the rendering stages need, resolved once per run.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteConfig {
    /// The root of the output tree.
    pub output_root: PathBuf,

    /// The URL prefix of the site, made available to every template.
    pub prefix: String,

    /// The endpoint the newest entry's comment form submits to.
    pub comment_api: String,

    /// Whether the newest entry accepts comments at all.
    pub allow_comments: bool,

    /// The bound on the recent view.
    pub recent_count: usize,
}

/// The fully resolved configuration for a run.
#[derive(Clone, Debug)]
pub struct Config {
    /// Where post sources are read from.
    pub posts_directory: PathBuf,

    /// A theme directory overriding the embedded theme, if any.
    pub theme_directory: Option<PathBuf>,

    /// The site URL prefix. Entry links without an explicit `link` are
    /// resolved against it.
    pub prefix: Url,

    pub site: SiteConfig,
}

impl Config {
    /// Loads configuration from `path`, which may name the project file
    /// itself or a directory to start searching from.
    pub fn load(path: &Path, allow_comments: bool) -> Result<Config> {
        if path.is_file() {
            Config::from_project_file(path, allow_comments)
        } else {
            Config::from_directory(path, allow_comments)
        }
    }

    /// Searches `dir` and then each of its ancestors for [`PROJECT_FILE`].
    pub fn from_directory(dir: &Path, allow_comments: bool) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, allow_comments)
                .with_context(|| format!("Loading configuration `{}`", path.display()))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, allow_comments),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    /// Parses the project file at `path`. Relative paths inside it are
    /// resolved against the directory containing it.
    pub fn from_project_file(path: &Path, allow_comments: bool) -> Result<Config> {
        let file = File::open(path)
            .with_context(|| format!("Opening project file `{}`", path.display()))?;
        let project: Project = serde_yaml::from_reader(file)?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;

        Ok(Config {
            posts_directory: project_root.join(&project.posts_path),
            theme_directory: project.theme_path.map(|p| project_root.join(p)),
            site: SiteConfig {
                output_root: project_root.join(&project.output_path),
                prefix: project.prefix.to_string(),
                comment_api: project.comment_api,
                allow_comments,
                recent_count: project.recent_count.0,
            },
            prefix: project.prefix,
        })
    }
}
