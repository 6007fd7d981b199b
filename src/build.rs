//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output site: copying the site source tree into the
//! output directory, injecting the shared components into each configured
//! page, and rendering each page's content feed ([`crate::render`]).

use crate::config::{Config, PageConfig};
use crate::include::inject_components;
use crate::render::{RenderRequest, Renderer};
use crate::source;
use crate::surface::Document;
use crate::theme::{Error as ThemeError, Theme};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Counts what a build did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Pages post-processed.
    pub pages: usize,

    /// Feeds rendered successfully (including empty states).
    pub feeds: usize,

    /// Feeds that ended in the error state or had no container.
    pub failed_feeds: usize,
}

/// Builds the site from a [`Config`] object. Pages are processed in order,
/// and each feed fetches the manifest again.
pub fn build_site(config: &Config) -> Result<Summary> {
    let theme_directory = match config.theme_directory.is_dir() {
        true => Some(config.theme_directory.as_path()),
        false => None,
    };
    let theme = Theme::load(theme_directory, &config.fallback_image)?;
    let source = source::resolve(&config.manifest, &config.site_source_directory);

    // Blow away the old output directory so stale pages don't survive, but
    // never when that would take the site source with it.
    check_output_directory(&config.site_source_directory, &config.output_directory)?;
    rmdir(&config.output_directory)?;
    copy_dir(&config.site_source_directory, &config.output_directory)?;

    let renderer = Renderer {
        source: source.as_ref(),
        theme: &theme,
        strict: config.strict,
    };

    let mut summary = Summary::default();
    for page in &config.pages {
        build_page(config, &renderer, page, &mut summary)?;
    }
    info!(
        pages = summary.pages,
        feeds = summary.feeds,
        failed_feeds = summary.failed_feeds,
        output = %config.output_directory.display(),
        "built site"
    );
    Ok(summary)
}

fn build_page(
    config: &Config,
    renderer: &Renderer,
    page: &PageConfig,
    summary: &mut Summary,
) -> Result<()> {
    let path = config.output_directory.join(&page.page);
    if !path.is_file() {
        return Err(Error::MissingPage(page.page.clone()));
    }
    let mut doc = Document::new(std::fs::read_to_string(&path)?);
    inject_components(&mut doc, &config.site_source_directory, &config.components);

    if let Some(category) = &page.category {
        match doc.surface(&config.feed_container) {
            Err(err) => {
                error!(page = %page.page.display(), error = %err, "rendering content");
                summary.failed_feeds += 1;
            }
            Ok(mut surface) => {
                let request = RenderRequest::new(category.clone(), page.limit);
                match renderer.render(&mut surface, &request) {
                    Ok(view) => {
                        info!(page = %page.page.display(), cards = view.len(), "rendered feed");
                        summary.feeds += 1;
                    }
                    Err(err) => {
                        warn!(page = %page.page.display(), error = %err, "feed shows error state");
                        summary.failed_feeds += 1;
                    }
                }
            }
        }
    }

    std::fs::write(&path, doc.as_str())?;
    summary.pages += 1;
    Ok(())
}

// Copies the tree at `src` into `dst`, skipping `dst` itself in case it lives
// inside `src`.
fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    use walkdir::WalkDir;
    std::fs::create_dir_all(dst)?;
    let skip = dst.canonicalize()?;
    for result in WalkDir::new(src)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.path().canonicalize().map_or(true, |p| p != skip))
    {
        let entry = result?;
        // strip_prefix() should never fail since every entry is below `src`
        let relative = entry.path().strip_prefix(src).map_err(|_| Error::Copy {
            path: entry.path().to_owned(),
            err: std::io::Error::new(std::io::ErrorKind::Other, "entry outside source tree"),
        })?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|err| Error::Copy {
                path: entry.path().to_owned(),
                err,
            })?;
        }
    }
    Ok(())
}

// Fails if deleting `output` would also delete `site`.
fn check_output_directory(site: &Path, output: &Path) -> Result<()> {
    let output = match output.canonicalize() {
        Ok(output) => output,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err.into()),
    };
    let site = site.canonicalize()?;
    if site.starts_with(&output) {
        return Err(Error::OutputContainsSite { output, site });
    }
    Ok(())
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during theme loading,
/// cleaning the output directory, copying the site tree, and other I/O.
/// Feed render failures are not errors here: they are shown on the page.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading the theme.
    Theme(ThemeError),

    /// Returned when the output directory is the site source directory or
    /// one of its ancestors.
    OutputContainsSite { output: PathBuf, site: PathBuf },

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while copying the site tree.
    Copy { path: PathBuf, err: std::io::Error },

    /// Returned for errors walking the site tree.
    WalkDir(walkdir::Error),

    /// Returned when a configured page isn't in the site tree.
    MissingPage(PathBuf),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Theme(err) => err.fmt(f),
            Error::OutputContainsSite { output, site } => write!(
                f,
                "Refusing to clean output directory '{}': it contains the site source '{}'",
                output.display(),
                site.display()
            ),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::Copy { path, err } => {
                write!(f, "Copying '{}': {}", path.display(), err)
            }
            Error::WalkDir(err) => err.fmt(f),
            Error::MissingPage(path) => {
                write!(f, "Configured page '{}' not found in site", path.display())
            }
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Theme(err) => Some(err),
            Error::OutputContainsSite { .. } => None,
            Error::Clean { path: _, err } => Some(err),
            Error::Copy { path: _, err } => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::MissingPage(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ThemeError> for Error {
    fn from(err: ThemeError) -> Error {
        Error::Theme(err)
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}
