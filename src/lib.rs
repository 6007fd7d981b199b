//! The library code for the `feedsite` static site builder. A build copies
//! the site source tree to the output directory and then post-processes each
//! configured page in two steps:
//!
//! 1. Injecting shared fragments such as the header and footer
//!    ([`crate::include`])
//! 2. Rendering the page's content feed ([`crate::render`])
//!
//! The second step is the more involved. A feed is rendered from a JSON
//! manifest of content items ([`crate::item`]) fetched from a file or URL
//! ([`crate::source`]). The items are ordered newest first, filtered by
//! category and truncated to a limit ([`crate::select`]), then turned into
//! cards ([`crate::view`]) and templated ([`crate::theme`]) into the page's
//! feed container ([`crate::surface`]). A fetch or parse failure puts an error
//! message in the container instead, and a selection with no items puts an
//! empty-state placeholder there.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod escape;
pub mod include;
pub mod item;
pub mod render;
pub mod select;
pub mod source;
pub mod surface;
pub mod theme;
pub mod view;
