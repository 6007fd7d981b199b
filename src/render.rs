//! Exports the [`Renderer`], which runs the content-feed pipeline for one
//! request: show the loading placeholder, fetch the manifest, order, filter,
//! limit, and write either the cards, the empty state or an error message to
//! a [`DisplaySink`].

use crate::escape::EscapeHtml;
use crate::item::{self, parse_manifest};
use crate::select::{select, Category, Limit};
use crate::source::{self, ManifestSource};
use crate::surface::DisplaySink;
use crate::theme::{self, Theme};
use crate::view::RenderedView;
use std::fmt;
use tracing::{debug, error, warn};

/// The selection a page asks for.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderRequest {
    pub category: Category,
    pub limit: Limit,
}

impl RenderRequest {
    pub fn new(category: Category, limit: Limit) -> RenderRequest {
        RenderRequest { category, limit }
    }
}

/// Renders content feeds from a manifest source with a theme.
pub struct Renderer<'a> {
    /// Where the manifest comes from. It is fetched anew on every render.
    pub source: &'a dyn ManifestSource,

    /// The templates for each display state.
    pub theme: &'a Theme,

    /// Fail the render on the first malformed manifest entry instead of
    /// skipping it.
    pub strict: bool,
}

impl Renderer<'_> {
    /// Renders `request` into `sink`. The sink first receives the loading
    /// placeholder and then exactly one final state. On a fetch or parse
    /// failure the final state is the error message, and the failure is also
    /// returned so the caller can report it. If the error template itself
    /// fails, the escaped reason is written as plain text instead.
    pub fn render<D: DisplaySink + ?Sized>(
        &self,
        sink: &mut D,
        request: &RenderRequest,
    ) -> Result<RenderedView> {
        sink.set_content(&self.theme.loading()?);

        let items = match self.load() {
            Ok(items) => items,
            Err(err) => {
                error!(source = %self.source.location(), error = %err, "rendering content");
                let reason = err.to_string();
                let markup = match self.theme.error(&reason) {
                    Ok(markup) => markup,
                    Err(template_err) => {
                        warn!(error = %template_err, "error template failed, showing the reason as text");
                        EscapeHtml(&reason).to_string()
                    }
                };
                sink.set_content(&markup);
                return Err(err);
            }
        };

        let selected = select(items, &request.category, request.limit);
        let view = RenderedView::from_items(&selected);
        debug!(cards = view.len(), "rendered feed");
        sink.set_content(&self.theme.view(&view)?);
        Ok(view)
    }

    fn load(&self) -> Result<Vec<item::ContentItem>> {
        let body = self.source.fetch()?;
        Ok(parse_manifest(&body, self.strict)?)
    }
}

/// The result of a render.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failed render.
#[derive(Debug)]
pub enum Error {
    /// Returned when the manifest couldn't be retrieved.
    Fetch(source::Error),

    /// Returned when the manifest isn't a valid document.
    Parse(item::Error),

    /// Returned when a theme template fails to execute.
    Template(theme::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Fetch(err) => err.fmt(f),
            Error::Parse(err) => err.fmt(f),
            Error::Template(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Fetch(err) => Some(err),
            Error::Parse(err) => Some(err),
            Error::Template(err) => Some(err),
        }
    }
}

impl From<source::Error> for Error {
    fn from(err: source::Error) -> Error {
        Error::Fetch(err)
    }
}

impl From<item::Error> for Error {
    fn from(err: item::Error) -> Error {
        Error::Parse(err)
    }
}

impl From<theme::Error> for Error {
    fn from(err: theme::Error) -> Error {
        Error::Template(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::source::test::serve_once;
    use crate::source::HttpSource;
    use crate::theme::DEFAULT_FALLBACK_IMAGE;
    use std::cell::Cell;
    use std::path::PathBuf;

    const MANIFEST: &str = r#"[
        {"title": "Old Recipe", "description": "d", "date": "2022-03-01", "category": "recipe",
         "linkUrl": "https://example.org/old", "imageUrl": "https://example.org/old.jpg"},
        {"title": "New Review", "description": "d", "date": "2024-02-10", "category": "review",
         "linkUrl": "https://example.org/review", "imageUrl": "https://example.org/review.jpg"},
        {"title": "Pancakes", "description": "d", "date": "2024-01-05", "category": "recipe",
         "linkUrl": "https://example.org/pancakes", "imageUrl": "https://example.org/pancakes.jpg",
         "aspect": "aspect-square"},
        {"title": "Update", "description": "d", "date": "2023-07-04", "category": "news",
         "linkUrl": "https://example.org/news", "imageUrl": "https://example.org/news.jpg"}
    ]"#;

    struct StaticSource {
        body: &'static str,
        fetches: Cell<usize>,
    }

    impl StaticSource {
        fn new(body: &'static str) -> StaticSource {
            StaticSource {
                body,
                fetches: Cell::new(0),
            }
        }
    }

    impl ManifestSource for StaticSource {
        fn fetch(&self) -> source::Result<String> {
            self.fetches.set(self.fetches.get() + 1);
            Ok(self.body.to_owned())
        }

        fn location(&self) -> String {
            "memory".to_owned()
        }
    }

    struct FailingSource;

    impl ManifestSource for FailingSource {
        fn fetch(&self) -> source::Result<String> {
            Err(source::Error::Io {
                path: PathBuf::from("content.json"),
                err: std::io::Error::new(std::io::ErrorKind::NotFound, "connection refused"),
            })
        }

        fn location(&self) -> String {
            "content.json".to_owned()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<String>,
    }

    impl DisplaySink for RecordingSink {
        fn set_content(&mut self, markup: &str) {
            self.writes.push(markup.to_owned());
        }
    }

    impl RecordingSink {
        fn last(&self) -> &str {
            self.writes.last().map(String::as_str).unwrap_or("")
        }
    }

    fn request(category: &str, limit: Option<usize>) -> RenderRequest {
        RenderRequest::new(
            category.parse().unwrap(),
            match limit {
                Some(n) => Limit::at_most(n).unwrap(),
                None => Limit::UNBOUNDED,
            },
        )
    }

    fn titles(view: &RenderedView) -> Vec<&str> {
        match view {
            RenderedView::Empty => Vec::new(),
            RenderedView::Cards(cards) => cards.iter().map(|c| c.title.as_str()).collect(),
        }
    }

    #[test]
    fn test_render_shows_loading_first() -> Result<()> {
        let theme = Theme::builtin(DEFAULT_FALLBACK_IMAGE)?;
        let source = StaticSource::new(MANIFEST);
        let renderer = Renderer {
            source: &source,
            theme: &theme,
            strict: false,
        };
        let mut sink = RecordingSink::default();
        renderer.render(&mut sink, &request("all", None))?;
        assert_eq!(2, sink.writes.len());
        assert_eq!(theme.loading()?, sink.writes[0]);
        Ok(())
    }

    #[test]
    fn test_render_wildcard_orders_newest_first() -> Result<()> {
        let theme = Theme::builtin(DEFAULT_FALLBACK_IMAGE)?;
        let source = StaticSource::new(MANIFEST);
        let renderer = Renderer {
            source: &source,
            theme: &theme,
            strict: false,
        };
        let mut sink = String::new();
        let view = renderer.render(&mut sink, &request("all", None))?;
        assert_eq!(vec!["New Review", "Pancakes", "Update", "Old Recipe"], titles(&view));

        let positions: Vec<usize> = titles(&view)
            .iter()
            .map(|t| sink.find(t).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(sink.contains("January 5, 2024"));
        assert!(sink.contains(r#"class="aspect-square w-full overflow-hidden""#));
        Ok(())
    }

    #[test]
    fn test_render_filters_and_limits() -> Result<()> {
        let theme = Theme::builtin(DEFAULT_FALLBACK_IMAGE)?;
        let source = StaticSource::new(MANIFEST);
        let renderer = Renderer {
            source: &source,
            theme: &theme,
            strict: false,
        };
        let mut sink = String::new();

        let view = renderer.render(&mut sink, &request("recipe", None))?;
        assert_eq!(vec!["Pancakes", "Old Recipe"], titles(&view));

        let view = renderer.render(&mut sink, &request("recipe,review", Some(2)))?;
        assert_eq!(vec!["New Review", "Pancakes"], titles(&view));
        assert_eq!(2, sink.matches("<h3").count());

        let view = renderer.render(&mut sink, &request("news", Some(10)))?;
        assert_eq!(vec!["Update"], titles(&view));
        assert_eq!(3, source.fetches.get());
        Ok(())
    }

    #[test]
    fn test_render_empty_state() -> Result<()> {
        let theme = Theme::builtin(DEFAULT_FALLBACK_IMAGE)?;
        let source = StaticSource::new(MANIFEST);
        let renderer = Renderer {
            source: &source,
            theme: &theme,
            strict: false,
        };
        let mut sink = String::new();
        let view = renderer.render(&mut sink, &request("Recipe", None))?;
        assert_eq!(RenderedView::Empty, view);
        assert_eq!(theme.view(&RenderedView::Empty)?, sink);
        assert!(sink.contains("No content found for this category."));
        Ok(())
    }

    #[test]
    fn test_render_fetch_failure() -> Result<()> {
        let theme = Theme::builtin(DEFAULT_FALLBACK_IMAGE)?;
        let renderer = Renderer {
            source: &FailingSource,
            theme: &theme,
            strict: false,
        };
        let mut sink = String::new();
        let err = renderer.render(&mut sink, &request("all", None)).unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        assert_eq!(1, sink.matches("Failed to load content.").count());
        assert!(sink.contains("connection refused"));
        assert!(!sink.contains("<h3"));
        Ok(())
    }

    #[test]
    fn test_render_parse_failure() -> Result<()> {
        let theme = Theme::builtin(DEFAULT_FALLBACK_IMAGE)?;
        let source = StaticSource::new("<html>not json</html>");
        let renderer = Renderer {
            source: &source,
            theme: &theme,
            strict: false,
        };
        let mut sink = String::new();
        let err = renderer.render(&mut sink, &request("all", None)).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(sink.starts_with(r#"<p class="text-red-400"#));
        assert!(sink.contains("invalid manifest"));
        Ok(())
    }

    #[test]
    fn test_render_broken_error_template() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("error.html"), "<p>{{.nope}}</p>")?;
        let theme = Theme::load(Some(dir.path()), DEFAULT_FALLBACK_IMAGE)?;
        let renderer = Renderer {
            source: &FailingSource,
            theme: &theme,
            strict: false,
        };
        let mut sink = RecordingSink::default();
        let err = renderer.render(&mut sink, &request("all", None)).unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        assert_eq!(2, sink.writes.len());
        assert!(sink.last().contains("connection refused"));
        assert!(!sink.last().contains("Loading content..."));
        Ok(())
    }

    #[test]
    fn test_render_http_status_failure() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let theme = Theme::builtin(DEFAULT_FALLBACK_IMAGE)?;
        let url = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")?;
        let source = HttpSource::new(url);
        let renderer = Renderer {
            source: &source,
            theme: &theme,
            strict: false,
        };
        let mut sink = String::new();
        let err = renderer.render(&mut sink, &request("all", None)).unwrap_err();
        assert!(matches!(err, Error::Fetch(source::Error::Status(_, _))));
        assert!(sink.contains("Failed to load content."));
        assert!(sink.contains("404 Not Found"));
        Ok(())
    }

    #[test]
    fn test_render_is_idempotent() -> Result<()> {
        let theme = Theme::builtin(DEFAULT_FALLBACK_IMAGE)?;
        let source = StaticSource::new(MANIFEST);
        let renderer = Renderer {
            source: &source,
            theme: &theme,
            strict: false,
        };
        let (mut first, mut second) = (String::new(), String::new());
        let request = request("recipe,review", Some(3));
        let first_view = renderer.render(&mut first, &request)?;
        let second_view = renderer.render(&mut second, &request)?;
        assert_eq!(first, second);
        assert_eq!(first_view, second_view);
        Ok(())
    }
}
