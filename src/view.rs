//! Defines [`RenderedView`] and [`Card`], the display-ready form of a
//! selected list of [`ContentItem`]s, along with their conversions into
//! template [`Value`]s.

use crate::escape::{EscapeHref, EscapeHtml};
use crate::item::ContentItem;
use chrono::NaiveDate;
use gtmpl::Value;
use std::collections::HashMap;

/// The long date style used on cards, e.g. `January 5, 2024`.
pub const DISPLAY_DATE_FORMAT: &str = "%B %-d, %Y";

/// Formats a calendar date for display. The date carries no time or zone, so
/// the displayed day is always the stored day.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// The outcome of a successful render.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderedView {
    /// Nothing survived filtering; the empty-state placeholder was shown.
    Empty,

    /// One card per selected item, in display order.
    Cards(Vec<Card>),
}

impl RenderedView {
    pub fn from_items(items: &[ContentItem]) -> RenderedView {
        match items.is_empty() {
            true => RenderedView::Empty,
            false => RenderedView::Cards(items.iter().map(Card::from).collect()),
        }
    }

    /// The number of cards shown.
    pub fn len(&self) -> usize {
        match self {
            RenderedView::Empty => 0,
            RenderedView::Cards(cards) => cards.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single feed card.
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    pub date: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub link_url: String,
    pub image_url: String,
    pub aspect: String,
}

impl From<&ContentItem> for Card {
    fn from(item: &ContentItem) -> Card {
        Card {
            date: format_date(item.date),
            title: item.title.clone(),
            description: item.description.clone(),
            category: item.category.clone(),
            link_url: item.link_url.to_string(),
            image_url: item.image_url.to_string(),
            aspect: item.aspect().to_owned(),
        }
    }
}

impl From<&Card> for Value {
    /// Converts a [`Card`] into a [`Value::Object`] for templating. Every
    /// field is escaped here, so templates can insert them verbatim.
    fn from(card: &Card) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        let mut insert = |key: &str, value: String| {
            m.insert(key.to_owned(), Value::String(value));
        };
        insert("date", EscapeHtml(&card.date).to_string());
        insert("title", EscapeHtml(&card.title).to_string());
        insert("description", EscapeHtml(&card.description).to_string());
        insert("category", EscapeHtml(&card.category).to_string());
        insert("link_url", EscapeHref(&card.link_url).to_string());
        insert("image_url", EscapeHref(&card.image_url).to_string());
        insert("aspect", EscapeHtml(&card.aspect).to_string());
        Value::Object(m)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use url::Url;

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!("January 5, 2024", format_date(date));

        let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        assert_eq!("December 31, 1999", format_date(date));
    }

    #[test]
    fn test_view_from_items() -> Result<(), url::ParseError> {
        assert_eq!(RenderedView::Empty, RenderedView::from_items(&[]));

        let item = ContentItem {
            title: "Tea & Toast".to_owned(),
            description: "Breakfast".to_owned(),
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            category: "recipe".to_owned(),
            link_url: Url::parse("https://example.org/tea")?,
            image_url: Url::parse("https://example.org/tea.jpg")?,
            aspect: None,
        };
        let view = RenderedView::from_items(&[item]);
        assert_eq!(1, view.len());
        match &view {
            RenderedView::Cards(cards) => {
                assert_eq!("March 9, 2024", cards[0].date);
                assert_eq!("aspect-video", cards[0].aspect);
                match Value::from(&cards[0]) {
                    Value::Object(m) => assert!(matches!(
                        m.get("title"),
                        Some(Value::String(s)) if s == "Tea &amp; Toast"
                    )),
                    _ => panic!("wanted object"),
                }
            }
            RenderedView::Empty => panic!("wanted cards"),
        }
        Ok(())
    }
}
