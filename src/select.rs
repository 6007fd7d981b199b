//! Defines the [`Category`] and [`Limit`] selectors and [`select`], which
//! derives the ordered, filtered and truncated view of a manifest.

use crate::item::ContentItem;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// The wildcard selector value meaning "no category filtering".
pub const WILDCARD: &str = "all";

/// Selects which manifest items belong in a feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Category {
    /// Keeps every item.
    All,

    /// Keeps items whose category equals the identifier exactly.
    One(String),

    /// Keeps items whose category is a member of the set.
    AnyOf(BTreeSet<String>),
}

impl Category {
    /// Reports whether `category` passes the selector.
    pub fn matches(&self, category: &str) -> bool {
        match self {
            Category::All => true,
            Category::One(id) => id == category,
            Category::AnyOf(ids) => ids.contains(category),
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::All
    }
}

impl FromStr for Category {
    type Err = SelectorError;

    /// Parses `all`, a single identifier, or a comma-separated set of
    /// identifiers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.contains(',') {
            return any_of(s.split(',').map(str::trim).filter(|id| !id.is_empty()));
        }
        match s {
            WILDCARD => Ok(Category::All),
            "" => Err(SelectorError::EmptyCategory),
            id => Ok(Category::One(id.to_owned())),
        }
    }
}

fn any_of<I, S>(ids: I) -> Result<Category, SelectorError>
where
    I: Iterator<Item = S>,
    S: Into<String>,
{
    let ids: BTreeSet<String> = ids.map(Into::into).collect();
    match ids.is_empty() {
        true => Err(SelectorError::EmptyCategory),
        false => Ok(Category::AnyOf(ids)),
    }
}

impl<'de> Deserialize<'de> for Category {
    /// Deserializes a [`Category`] from either a string (`all` or a single
    /// identifier) or a non-empty list of identifiers.
    fn deserialize<D>(deserializer: D) -> Result<Category, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<String>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::One(s) if s == WILDCARD => Ok(Category::All),
            Raw::One(s) if s.is_empty() => Err(D::Error::custom(SelectorError::EmptyCategory)),
            Raw::One(s) => Ok(Category::One(s)),
            Raw::Many(ids) => any_of(ids.into_iter()).map_err(D::Error::custom),
        }
    }
}

/// Caps the number of items in a feed. A limit is either absent (unbounded)
/// or positive; zero is rejected when parsing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Limit(Option<NonZeroUsize>);

impl Limit {
    /// A limit that keeps every item.
    pub const UNBOUNDED: Limit = Limit(None);

    /// Creates a limit of at most `n` items. Returns an error for zero.
    pub fn at_most(n: usize) -> Result<Limit, SelectorError> {
        NonZeroUsize::new(n)
            .map(|n| Limit(Some(n)))
            .ok_or(SelectorError::ZeroLimit)
    }

    /// Returns the cap, if any.
    pub fn get(self) -> Option<usize> {
        self.0.map(NonZeroUsize::get)
    }
}

impl FromStr for Limit {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: usize = s
            .trim()
            .parse()
            .map_err(|_| SelectorError::InvalidLimit(s.to_owned()))?;
        Limit::at_most(n)
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D>(deserializer: D) -> Result<Limit, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<usize>::deserialize(deserializer)? {
            None => Ok(Limit::UNBOUNDED),
            Some(n) => Limit::at_most(n).map_err(D::Error::custom),
        }
    }
}

/// Orders `items` by date (most recent first), keeps those matching
/// `category`, and truncates the result to `limit`. The sort is stable, so
/// items sharing a date keep their manifest order.
pub fn select(mut items: Vec<ContentItem>, category: &Category, limit: Limit) -> Vec<ContentItem> {
    items.sort_by(|a, b| b.date.cmp(&a.date));
    let filtered = items.into_iter().filter(|item| category.matches(&item.category));
    match limit.get() {
        Some(n) => filtered.take(n).collect(),
        None => filtered.collect(),
    }
}

/// Represents an invalid [`Category`] or [`Limit`].
#[derive(Debug, PartialEq, Eq)]
pub enum SelectorError {
    /// Returned for an empty identifier or an empty set.
    EmptyCategory,

    /// Returned for a limit of zero.
    ZeroLimit,

    /// Returned when a limit isn't a non-negative integer.
    InvalidLimit(String),
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SelectorError::EmptyCategory => write!(f, "category must not be empty"),
            SelectorError::ZeroLimit => write!(f, "limit must be positive"),
            SelectorError::InvalidLimit(s) => write!(f, "invalid limit `{}`", s),
        }
    }
}

impl std::error::Error for SelectorError {}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;
    use url::Url;

    fn item(title: &str, date: &str, category: &str) -> ContentItem {
        ContentItem {
            title: title.to_owned(),
            description: format!("About {}", title),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            category: category.to_owned(),
            link_url: Url::parse("https://example.org/").unwrap(),
            image_url: Url::parse("https://example.org/image.jpg").unwrap(),
            aspect: None,
        }
    }

    fn manifest() -> Vec<ContentItem> {
        vec![
            item("old recipe", "2022-03-01", "recipe"),
            item("new review", "2024-02-10", "review"),
            item("mid recipe", "2023-06-15", "recipe"),
            item("news", "2024-01-01", "news"),
            item("tied recipe", "2023-06-15", "recipe"),
            item("Upper", "2021-01-01", "Recipe"),
        ]
    }

    fn titles(items: &[ContentItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_select_orders_by_date_descending() {
        let selected = select(manifest(), &Category::All, Limit::UNBOUNDED);
        assert!(selected.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn test_select_wildcard_keeps_everything() {
        let selected = select(manifest(), &Category::All, Limit::UNBOUNDED);
        assert_eq!(
            vec!["new review", "news", "mid recipe", "tied recipe", "old recipe", "Upper"],
            titles(&selected)
        );
    }

    #[test]
    fn test_select_single_category_is_exact() {
        let selected = select(manifest(), &"recipe".parse().unwrap(), Limit::UNBOUNDED);
        assert_eq!(vec!["mid recipe", "tied recipe", "old recipe"], titles(&selected));
        assert!(selected.iter().all(|i| i.category == "recipe"));
    }

    #[test]
    fn test_select_category_set() {
        let category: Category = "recipe,review".parse().unwrap();
        let selected = select(manifest(), &category, Limit::UNBOUNDED);
        assert_eq!(
            vec!["new review", "mid recipe", "tied recipe", "old recipe"],
            titles(&selected)
        );
        assert!(selected
            .iter()
            .all(|i| i.category == "recipe" || i.category == "review"));
    }

    #[test]
    fn test_select_limit_truncates() -> Result<(), SelectorError> {
        let selected = select(manifest(), &"recipe".parse::<Category>()?, Limit::at_most(2)?);
        assert_eq!(vec!["mid recipe", "tied recipe"], titles(&selected));

        let selected = select(manifest(), &"news".parse::<Category>()?, Limit::at_most(5)?);
        assert_eq!(vec!["news"], titles(&selected));
        Ok(())
    }

    #[test]
    fn test_select_unknown_category_is_empty() {
        let selected = select(manifest(), &"podcast".parse().unwrap(), Limit::UNBOUNDED);
        assert!(selected.is_empty());
    }

    #[test]
    fn test_parse_category() {
        assert_eq!(Ok(Category::All), "all".parse());
        assert_eq!(Ok(Category::All), " all ".parse());
        assert_eq!(Ok(Category::One("recipe".to_owned())), "recipe".parse());
        assert_eq!(
            Ok(Category::AnyOf(
                vec!["recipe".to_owned(), "review".to_owned()].into_iter().collect()
            )),
            "recipe, review,".parse()
        );
        assert_eq!(Err(SelectorError::EmptyCategory), "".parse::<Category>());
        assert_eq!(Err(SelectorError::EmptyCategory), " , ".parse::<Category>());
    }

    #[test]
    fn test_parse_limit_rejects_zero() {
        assert_eq!(Err(SelectorError::ZeroLimit), "0".parse::<Limit>());
        assert!(matches!("-3".parse::<Limit>(), Err(SelectorError::InvalidLimit(_))));
        assert_eq!(Some(3), "3".parse::<Limit>().unwrap().get());
    }

    #[test]
    fn test_deserialize_selectors() -> Result<(), serde_yaml::Error> {
        assert_eq!(Category::All, serde_yaml::from_str::<Category>("all")?);
        assert_eq!(
            Category::One("review".to_owned()),
            serde_yaml::from_str::<Category>("review")?
        );
        assert!(matches!(
            serde_yaml::from_str::<Category>("[recipe, review]")?,
            Category::AnyOf(ids) if ids.len() == 2
        ));
        assert!(serde_yaml::from_str::<Category>("[]").is_err());
        assert_eq!(Some(4), serde_yaml::from_str::<Limit>("4")?.get());
        assert!(serde_yaml::from_str::<Limit>("0").is_err());
        Ok(())
    }
}
