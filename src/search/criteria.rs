//! Filter criteria, looked up by name.
//!
//! Each criterion is a factory that turns a normalized filter value into
//! a predicate over content. Unknown criteria are satisfied by every
//! entry, as are filters with an empty value.

use std::collections::HashMap;

use crate::domain::{Content, Genre};

use super::query::{mutual_contains, normalize, FilterTerm, QueryError};

/// Compiled filter
pub type Predicate = Box<dyn Fn(&Content) -> bool + Send + Sync>;

/// Builds a predicate from a normalized filter value
pub type CriterionFactory = fn(&str) -> Result<Predicate, QueryError>;

/// Category value that matches every entry regardless of kind
pub const ANY_CATEGORY: &str = "content";

/// Registry mapping criterion names to factories
#[derive(Clone)]
pub struct CriteriaRegistry {
    factories: HashMap<String, CriterionFactory>,
}

impl std::fmt::Debug for CriteriaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("CriteriaRegistry")
            .field("criteria", &names)
            .finish()
    }
}

impl Default for CriteriaRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl CriteriaRegistry {
    /// Registry with no criteria (every filter passes)
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// category, minrating, genre, suitableforminors
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry
            .register("category", category)
            .register("minrating", min_rating)
            .register("genre", genre)
            .register("suitableforminors", suitable_for_minors);
        registry
    }

    /// Register (or replace) a criterion; the name is normalized
    pub fn register(&mut self, name: &str, factory: CriterionFactory) -> &mut Self {
        self.factories.insert(normalize(name), factory);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.factories.keys().map(String::as_str)
    }

    /// Compile one filter; `None` means the filter always passes
    pub fn compile(&self, term: &FilterTerm) -> Result<Option<Predicate>, QueryError> {
        if term.value.is_empty() {
            return Ok(None);
        }
        match self.factories.get(&term.criterion) {
            Some(factory) => factory(&term.value).map(Some),
            None => Ok(None),
        }
    }
}

/// Match the entry's category label. `content` matches everything.
pub fn category(value: &str) -> Result<Predicate, QueryError> {
    if value == ANY_CATEGORY {
        return Ok(Box::new(|_: &Content| true));
    }
    let value = value.to_string();
    Ok(Box::new(move |content: &Content| {
        mutual_contains(content.kind().label(), &value)
    }))
}

/// Average rating at least the threshold; unreviewed entries never pass
pub fn min_rating(value: &str) -> Result<Predicate, QueryError> {
    let threshold: f64 = value
        .parse()
        .ok()
        .filter(|t: &f64| t.is_finite())
        .ok_or_else(|| QueryError::InvalidRating {
            value: value.to_string(),
        })?;

    Ok(Box::new(move |content: &Content| {
        content
            .average_rating()
            .is_some_and(|avg| avg >= threshold)
    }))
}

/// Genre of viewable content; plain content never passes
pub fn genre(value: &str) -> Result<Predicate, QueryError> {
    let parsed = value.parse::<Genre>().ok();
    let value = value.to_string();
    Ok(Box::new(move |content: &Content| {
        content.viewing().is_some_and(|viewing| {
            Some(viewing.genre) == parsed
                || mutual_contains(&normalize(viewing.genre.name()), &value)
        })
    }))
}

/// Suitability of viewable content; plain content never passes
pub fn suitable_for_minors(value: &str) -> Result<Predicate, QueryError> {
    let bucket = SuitabilityBucket::classify(value);
    Ok(Box::new(move |content: &Content| {
        content
            .viewing()
            .is_some_and(|viewing| bucket.matches(viewing.suitable_for_minors))
    }))
}

/// How a normalized value reads as a suitability statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuitabilityBucket {
    NotSuitable,
    Suitable,
    /// Compared against the flag spelled as "yes" / "no"
    Literal(String),
}

const NOT_SUITABLE_MARKERS: [&str; 5] = ["notsuitable", "nosuitable", "unsuitable", ">18", ">=18"];
const SUITABLE_MARKERS: [&str; 2] = ["suitable", "<18"];

impl SuitabilityBucket {
    pub fn classify(value: &str) -> Self {
        if NOT_SUITABLE_MARKERS.iter().any(|m| value.contains(m)) {
            SuitabilityBucket::NotSuitable
        } else if SUITABLE_MARKERS.iter().any(|m| value.contains(m)) {
            SuitabilityBucket::Suitable
        } else {
            SuitabilityBucket::Literal(value.to_string())
        }
    }

    pub fn matches(&self, suitable_for_minors: bool) -> bool {
        match self {
            SuitabilityBucket::NotSuitable => !suitable_for_minors,
            SuitabilityBucket::Suitable => suitable_for_minors,
            SuitabilityBucket::Literal(value) => {
                let flag = if suitable_for_minors { "yes" } else { "no" };
                mutual_contains(flag, value)
            }
        }
    }
}
