//! Loads the project configuration from a `feedsite.yaml` file. The file is
//! searched for in the given directory and then in each of its parents.

use crate::select::{Category, Limit};
use crate::theme::DEFAULT_FALLBACK_IMAGE;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// The name of the project file.
pub const PROJECT_FILE: &str = "feedsite.yaml";

/// The default `id` of the element a page's feed is rendered into.
pub const DEFAULT_FEED_CONTAINER: &str = "content-feed";

/// The default manifest location, relative to the site directory.
pub const DEFAULT_MANIFEST: &str = "content.json";

fn default_site_directory() -> PathBuf {
    PathBuf::from("site")
}

fn default_manifest() -> String {
    DEFAULT_MANIFEST.to_owned()
}

fn default_feed_container() -> String {
    DEFAULT_FEED_CONTAINER.to_owned()
}

fn default_fallback_image() -> String {
    DEFAULT_FALLBACK_IMAGE.to_owned()
}

fn default_components() -> Vec<Component> {
    vec![
        Component {
            source: PathBuf::from("_header.html"),
            target: "header-placeholder".to_owned(),
        },
        Component {
            source: PathBuf::from("_footer.html"),
            target: "footer-placeholder".to_owned(),
        },
    ]
}

#[derive(Deserialize)]
struct Project {
    #[serde(default = "default_site_directory")]
    site_directory: PathBuf,

    #[serde(default = "default_manifest")]
    manifest: String,

    #[serde(default = "default_feed_container")]
    feed_container: String,

    #[serde(default = "default_fallback_image")]
    fallback_image: String,

    #[serde(default)]
    strict: bool,

    #[serde(default = "default_components")]
    components: Vec<Component>,

    #[serde(default)]
    pages: Vec<PageConfig>,
}

/// A fragment injected into every page, e.g. the shared header.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Component {
    /// The fragment file, relative to the site directory.
    pub source: PathBuf,

    /// The `id` of the element that receives the fragment.
    pub target: String,
}

/// A page to post-process.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PageConfig {
    /// The page file, relative to the site directory.
    pub page: PathBuf,

    /// The feed selection. Pages without a category get no feed.
    #[serde(default)]
    pub category: Option<Category>,

    #[serde(default)]
    pub limit: Limit,
}

/// The resolved build configuration.
pub struct Config {
    pub site_source_directory: PathBuf,
    pub output_directory: PathBuf,
    pub theme_directory: PathBuf,
    pub manifest: String,
    pub feed_container: String,
    pub fallback_image: String,
    pub strict: bool,
    pub components: Vec<Component>,
    pub pages: Vec<PageConfig>,
}

impl Config {
    /// Looks for [`PROJECT_FILE`] in `dir` and then in each parent directory.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(Error::NotFound),
            }
        }
    }

    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let file = std::fs::File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file).map_err(|err| Error::Parse {
            path: path.to_owned(),
            err,
        })?;
        let project_root = path.parent().ok_or_else(|| Error::NoParent(path.to_owned()))?;
        Ok(Config {
            site_source_directory: project_root.join(&project.site_directory),
            output_directory: output_directory.to_owned(),
            theme_directory: project_root.join("theme"),
            manifest: project.manifest,
            feed_container: project.feed_container,
            fallback_image: project.fallback_image,
            strict: project.strict,
            components: project.components,
            pages: project.pages,
        })
    }
}

/// The result of loading configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the project file.
#[derive(Debug)]
pub enum Error {
    /// Returned when no project file exists in the directory or its parents.
    NotFound,

    /// Returned when the project file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't valid.
    Parse { path: PathBuf, err: serde_yaml::Error },

    /// Returned when the project file path has no parent directory.
    NoParent(PathBuf),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::Open { path, err } => {
                write!(f, "Opening project file `{}`: {}", path.display(), err)
            }
            Error::Parse { path, err } => {
                write!(f, "Loading configuration `{}`: {}", path.display(), err)
            }
            Error::NoParent(path) => write!(
                f,
                "Can't get parent directory for provided project file path '{:?}'",
                path
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound => None,
            Error::Open { path: _, err } => Some(err),
            Error::Parse { path: _, err } => Some(err),
            Error::NoParent(_) => None,
        }
    }
}
