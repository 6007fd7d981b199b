//! Defines the [`ManifestSource`] trait and its implementations: a local file
//! ([`FileSource`]) and an HTTP(S) document ([`HttpSource`]). Every call to
//! [`ManifestSource::fetch`] re-reads the document; nothing is cached.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Retrieves the raw manifest document.
pub trait ManifestSource {
    /// Fetches the manifest body as text.
    fn fetch(&self) -> Result<String>;

    /// A human-readable location for diagnostics.
    fn location(&self) -> String;
}

/// Reads the manifest from a file on disk.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> FileSource {
        FileSource { path: path.into() }
    }
}

impl ManifestSource for FileSource {
    fn fetch(&self) -> Result<String> {
        debug!(path = %self.path.display(), "reading manifest");
        std::fs::read_to_string(&self.path).map_err(|err| Error::Io {
            path: self.path.clone(),
            err,
        })
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fetches the manifest over HTTP(S) with a blocking client.
pub struct HttpSource {
    url: Url,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(url: Url) -> HttpSource {
        HttpSource {
            url,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl ManifestSource for HttpSource {
    fn fetch(&self) -> Result<String> {
        debug!(url = %self.url, "fetching manifest");
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .map_err(|err| Error::Http(self.url.clone(), err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(self.url.clone(), status));
        }
        response
            .text()
            .map_err(|err| Error::Http(self.url.clone(), err))
    }

    fn location(&self) -> String {
        self.url.to_string()
    }
}

/// Picks a source for a manifest reference: an absolute `http`/`https` URL is
/// fetched over the network, anything else is a path relative to `base`.
pub fn resolve(manifest: &str, base: &Path) -> Box<dyn ManifestSource> {
    match Url::parse(manifest) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
            Box::new(HttpSource::new(url))
        }
        _ => Box::new(FileSource::new(base.join(manifest))),
    }
}

/// The result of a fetch.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure retrieving the manifest.
#[derive(Debug)]
pub enum Error {
    /// Returned when the manifest file can't be read.
    Io { path: PathBuf, err: std::io::Error },

    /// Returned for network-level failures.
    Http(Url, reqwest::Error),

    /// Returned when the server answers with a non-success status.
    Status(Url, reqwest::StatusCode),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, err } => {
                write!(f, "Failed to read {}: {}", path.display(), err)
            }
            Error::Http(url, err) => write!(f, "Failed to fetch {}: {}", url, err),
            Error::Status(url, status) => write!(f, "Failed to fetch {}: {}", url, status),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { path: _, err } => Some(err),
            Error::Http(_, err) => Some(err),
            Error::Status(_, _) => None,
        }
    }
}
