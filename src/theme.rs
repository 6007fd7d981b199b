//! Defines the [`Theme`], the set of templates used to produce feed markup:
//! the loading placeholder, the card list, the empty state and the error
//! state. Each template has a built-in default which a project can override
//! by placing a file with the same name in its theme directory.

use crate::view::RenderedView;
use gtmpl::{Context, Template, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The image shown when a card's image fails to load in the browser.
pub const DEFAULT_FALLBACK_IMAGE: &str =
    "https://placehold.co/600x400/1f2937/d1d5db?text=Image+Missing";

const LOADING_TEMPLATE: &str = r#"
<div class="bg-gray-800/50 rounded-2xl shadow-lg p-6 md:col-span-2 lg:col-span-3 flex items-center justify-center space-x-4">
    <svg class="animate-spin h-8 w-8 text-sky-400" xmlns="http://www.w3.org/2000/svg" fill="none" viewBox="0 0 24 24">
        <circle class="opacity-25" cx="12" cy="12" r="10" stroke="currentColor" stroke-width="4"></circle>
        <path class="opacity-75" fill="currentColor" d="M4 12a8 8 0 018-8V0C5.373 0 0 5.373 0 12h4zm2 5.291A7.962 7.962 0 014 12H0c0 3.042 1.135 5.824 3 7.938l3-2.647z"></path>
    </svg>
    <span class="text-xl font-semibold text-gray-300">Loading content...</span>
</div>"#;

const FEED_TEMPLATE: &str = r#"{{range .cards}}
<div class="group bg-gray-800/50 rounded-2xl shadow-lg overflow-hidden flex flex-col transition duration-300 ease-in-out transform hover:-translate-y-1 hover:shadow-lg hover:shadow-sky-400/20">
    <a href="{{.link_url}}" target="_blank" rel="noopener noreferrer" class="block">
        <div class="{{.aspect}} w-full overflow-hidden">
            <img src="{{.image_url}}"
                 alt="{{.title}}"
                 class="w-full h-full object-cover transition-transform duration-300 group-hover:scale-105"
                 onerror="this.src='{{.fallback_image}}'; this.onerror=null;">
        </div>
    </a>
    <div class="p-5 flex flex-col flex-grow">
        <p class="text-sm text-gray-400 mb-2">{{.date}}</p>
        <h3 class="text-xl font-semibold text-white mb-2">
            <a href="{{.link_url}}" target="_blank" rel="noopener noreferrer" class="hover:text-sky-400">{{.title}}</a>
        </h3>
        <p class="text-gray-300 text-base flex-grow">{{.description}}</p>
    </div>
</div>{{end}}
"#;

const EMPTY_TEMPLATE: &str =
    r#"<p class="text-gray-400 md:col-span-3 text-center">No content found for this category.</p>"#;

const ERROR_TEMPLATE: &str =
    r#"<p class="text-red-400 md:col-span-3 text-center">Failed to load content. {{.reason}}</p>"#;

/// The parsed feed templates.
pub struct Theme {
    loading: Template,
    feed: Template,
    empty: Template,
    error: Template,

    /// Substituted for card images that fail to load.
    fallback_image: String,
}

impl Theme {
    /// Builds a theme from the built-in templates only.
    pub fn builtin(fallback_image: &str) -> Result<Theme> {
        Theme::load(None, fallback_image)
    }

    /// Builds a theme, preferring `loading.html`, `feed.html`, `empty.html`
    /// and `error.html` from `dir` when they exist.
    pub fn load(dir: Option<&Path>, fallback_image: &str) -> Result<Theme> {
        Ok(Theme {
            loading: parse_template(dir, "loading.html", LOADING_TEMPLATE)?,
            feed: parse_template(dir, "feed.html", FEED_TEMPLATE)?,
            empty: parse_template(dir, "empty.html", EMPTY_TEMPLATE)?,
            error: parse_template(dir, "error.html", ERROR_TEMPLATE)?,
            fallback_image: fallback_image.to_owned(),
        })
    }

    /// Markup shown while the manifest is being fetched.
    pub fn loading(&self) -> Result<String> {
        execute(&self.loading, Value::Object(HashMap::new()))
    }

    /// Markup for a rendered view: the card list or the empty state.
    pub fn view(&self, view: &RenderedView) -> Result<String> {
        match view {
            RenderedView::Empty => execute(&self.empty, Value::Object(HashMap::new())),
            RenderedView::Cards(cards) => {
                let fallback_image =
                    Value::String(crate::escape::EscapeHtml(&self.fallback_image).to_string());
                let cards = cards
                    .iter()
                    .map(|card| {
                        let mut value = Value::from(card);
                        if let Value::Object(obj) = &mut value {
                            obj.insert("fallback_image".to_owned(), fallback_image.clone());
                        }
                        value
                    })
                    .collect();
                let mut m: HashMap<String, Value> = HashMap::new();
                m.insert("cards".to_owned(), Value::Array(cards));
                execute(&self.feed, Value::Object(m))
            }
        }
    }

    /// Markup for a failed render. `reason` is escaped before templating.
    pub fn error(&self, reason: &str) -> Result<String> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "reason".to_owned(),
            Value::String(crate::escape::EscapeHtml(reason).to_string()),
        );
        execute(&self.error, Value::Object(m))
    }
}

// Loads `name` from `dir` if present, otherwise falls back to `default`, and
// parses the result into a template.
fn parse_template(dir: Option<&Path>, name: &str, default: &str) -> Result<Template> {
    let contents = match dir.map(|dir| dir.join(name)) {
        Some(path) if path.is_file() => {
            debug!(path = %path.display(), "using theme override");
            std::fs::read_to_string(&path).map_err(|err| Error::OpenTemplateFile {
                path: path.clone(),
                err,
            })?
        }
        _ => default.to_owned(),
    };

    let mut template = Template::default();
    template
        .parse(&contents)
        .map_err(|err| Error::ParseTemplate(name.to_owned(), err))?;
    Ok(template)
}

fn execute(template: &Template, value: Value) -> Result<String> {
    let context = Context::from(value).map_err(Error::Execute)?;
    let mut out: Vec<u8> = Vec::new();
    template.execute(&mut out, &context).map_err(Error::Execute)?;
    String::from_utf8(out).map_err(|err| Error::Execute(err.to_string()))
}

/// The result of a theme operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or applying a theme template.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String, String),

    /// Returned for errors applying a template.
    Execute(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(name, err) => write!(f, "Parsing template `{}`: {}", name, err),
            Error::Execute(err) => write!(f, "Executing template: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_, _) => None,
            Error::Execute(_) => None,
        }
    }
}
