//! Defines the [`DisplaySink`] trait and the [`Document`]/[`Surface`] pair
//! which lets a renderer replace the inner content of an element, looked up
//! by `id`, inside an HTML page.

use std::fmt;
use std::ops::Range;

/// Receives markup. Each call fully replaces whatever was there before.
pub trait DisplaySink {
    fn set_content(&mut self, markup: &str);
}

impl DisplaySink for String {
    fn set_content(&mut self, markup: &str) {
        self.clear();
        self.push_str(markup);
    }
}

/// An HTML page held in memory.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    html: String,
}

impl Document {
    pub fn new<S: Into<String>>(html: S) -> Document {
        Document { html: html.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.html
    }

    /// Looks up the element whose `id` attribute equals `id` and returns a
    /// sink over its inner content. Returns [`MissingSurface`] when there is
    /// no such element or when it has no closing tag.
    pub fn surface(&mut self, id: &str) -> Result<Surface<'_>, MissingSurface> {
        match inner_range(&self.html, id) {
            Some(range) => Ok(Surface {
                html: &mut self.html,
                range,
            }),
            None => Err(MissingSurface(id.to_owned())),
        }
    }
}

/// The inner content of one element of a [`Document`].
pub struct Surface<'a> {
    html: &'a mut String,
    range: Range<usize>,
}

impl DisplaySink for Surface<'_> {
    fn set_content(&mut self, markup: &str) {
        self.html.replace_range(self.range.clone(), markup);
        self.range = self.range.start..self.range.start + markup.len();
    }
}

impl Surface<'_> {
    /// The element's current inner content.
    pub fn content(&self) -> &str {
        &self.html[self.range.clone()]
    }
}

/// Returned when a page has no usable element with the requested `id`.
#[derive(Debug, PartialEq, Eq)]
pub struct MissingSurface(pub String);

impl fmt::Display for MissingSurface {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{} element not found", self.0)
    }
}

impl std::error::Error for MissingSurface {}

// Finds the byte range of the inner content of the element with `id`.
fn inner_range(html: &str, id: &str) -> Option<Range<usize>> {
    for (tag_start, tag_end) in Tags::new(html, 0) {
        let tag = &html[tag_start + 1..tag_end];
        let name = tag_name(tag);
        if name.is_empty() || !has_id(tag, id) {
            continue;
        }
        if tag.trim_end().ends_with('/') {
            return None;
        }
        let content_start = tag_end + 1;
        let content_end = match is_raw_text(name) {
            true => find_close(html, name, content_start)?,
            false => matching_close(html, name, content_start)?,
        };
        return Some(content_start..content_end);
    }
    None
}

// Iterates over the start and end tags of a page as `(index of '<', index of
// '>')` pairs. Comments and declarations are skipped, and so is the raw text
// inside `<script>` and `<style>`. A `<` that doesn't begin a complete tag is
// treated as text.
struct Tags<'a> {
    html: &'a str,
    pos: usize,
}

impl<'a> Tags<'a> {
    fn new(html: &'a str, from: usize) -> Tags<'a> {
        Tags { html, pos: from }
    }
}

impl Iterator for Tags<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        let html = self.html;
        loop {
            let start = find_from(html, "<", self.pos)?;
            let rest = &html[start..];
            if rest.starts_with("<!--") {
                self.pos = find_from(html, "-->", start + 4).map_or(html.len(), |i| i + 3);
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                self.pos = find_from(html, ">", start).map_or(html.len(), |i| i + 1);
                continue;
            }
            let name_start = match rest.as_bytes().get(1) {
                Some(b'/') => start + 2,
                _ => start + 1,
            };
            if !html
                .as_bytes()
                .get(name_start)
                .map_or(false, u8::is_ascii_alphabetic)
            {
                self.pos = start + 1;
                continue;
            }
            let end = match start_tag_end(html, start) {
                Some(end) => end,
                None => {
                    self.pos = start + 1;
                    continue;
                }
            };
            self.pos = end + 1;

            let tag = &html[start + 1..end];
            let name = tag_name(tag);
            if is_raw_text(name) && !tag.trim_end().ends_with('/') {
                self.pos = find_close(html, name, self.pos).unwrap_or_else(|| html.len());
            }
            return Some((start, end));
        }
    }
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack.get(from..)?.find(needle).map(|i| i + from)
}

// Returns the index of the `>` ending the tag that starts at `tag_start`,
// skipping over quoted attribute values.
fn start_tag_end(html: &str, tag_start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, b) in html.bytes().enumerate().skip(tag_start + 1) {
        match (quote, b) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"') | (None, b'\'') => quote = Some(b),
            (None, b'>') => return Some(i),
            (None, _) => {}
        }
    }
    None
}

fn tag_name(tag: &str) -> &str {
    let end = tag
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or_else(|| tag.len());
    &tag[..end]
}

fn is_raw_text(name: &str) -> bool {
    name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style")
}

// Finds the next `</name` at or after `from`, ignoring ASCII case.
fn find_close(html: &str, name: &str, from: usize) -> Option<usize> {
    let needle = format!("</{}", name.to_ascii_lowercase());
    find_from(&html.to_ascii_lowercase(), &needle, from)
}

fn has_id(tag: &str, id: &str) -> bool {
    tag.contains(&format!(r#" id="{}""#, id))
        || tag.contains(&format!(" id='{}'", id))
        || tag.contains(&format!("\tid=\"{}\"", id))
        || tag.contains(&format!("\nid=\"{}\"", id))
}

// Finds the start of the close tag matching an element named `name` whose
// content begins at `from`, counting nested elements of the same name.
fn matching_close(html: &str, name: &str, from: usize) -> Option<usize> {
    let mut depth = 1;
    for (tag_start, tag_end) in Tags::new(html, from) {
        let tag = &html[tag_start + 1..tag_end];
        let (closing, tag) = match tag.strip_prefix('/') {
            Some(tag) => (true, tag),
            None => (false, tag),
        };
        if !tag_name(tag).eq_ignore_ascii_case(name) {
            continue;
        }
        if closing {
            depth -= 1;
            if depth == 0 {
                return Some(tag_start);
            }
        } else if !tag.trim_end().ends_with('/') {
            depth += 1;
        }
    }
    None
}
