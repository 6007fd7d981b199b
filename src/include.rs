//! Injects shared fragments (the site header and footer) into their
//! placeholder elements.

use crate::config::Component;
use crate::surface::{DisplaySink, Document};
use std::path::Path;
use tracing::{debug, error};

/// Sets the contents of each component's target element in `doc` to the
/// fragment read from `site_directory`. A fragment that can't be read, or a
/// target that doesn't exist, is logged and skipped. Returns the number of
/// components injected.
pub fn inject_components(doc: &mut Document, site_directory: &Path, components: &[Component]) -> usize {
    let mut injected = 0;
    for component in components {
        let path = site_directory.join(&component.source);
        let fragment = match std::fs::read_to_string(&path) {
            Ok(fragment) => fragment,
            Err(err) => {
                error!(path = %path.display(), error = %err, "loading component");
                continue;
            }
        };
        match doc.surface(&component.target) {
            Ok(mut surface) => {
                surface.set_content(&fragment);
                debug!(element = %component.target, "injected component");
                injected += 1;
            }
            Err(err) => error!(path = %path.display(), error = %err, "injecting component"),
        }
    }
    injected
}
