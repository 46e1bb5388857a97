//! Query parsing.
//!
//! A query is an ordered list of strings. Pairs are `(criterion, value)`
//! filters; an odd trailing string is free text.

use thiserror::Error;

/// Errors in a query that can't be absorbed into "no match"
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("minimum rating must be a number, got {value:?}")]
    InvalidRating { value: String },
}

/// Lowercase with every whitespace character removed
pub fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Bidirectional substring test on normalized strings.
/// An empty field never matches.
pub fn mutual_contains(field: &str, value: &str) -> bool {
    !field.is_empty() && (field.contains(value) || value.contains(field))
}

/// A `(criterion, value)` pair, both normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTerm {
    pub criterion: String,
    pub value: String,
}

impl FilterTerm {
    pub fn new(criterion: &str, value: &str) -> Self {
        Self {
            criterion: normalize(criterion),
            value: normalize(value),
        }
    }
}

/// Shape of a parsed query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// No terms: everything matches
    All,

    /// Even number of terms: filters only
    Filters(Vec<FilterTerm>),

    /// A single free-text term
    Text(String),

    /// Filters followed by mandatory free text
    FiltersAndText(Vec<FilterTerm>, String),
}

impl Query {
    pub fn parse<S: AsRef<str>>(terms: &[S]) -> Self {
        if terms.is_empty() {
            return Query::All;
        }

        let pair_count = terms.len() / 2;
        let filters: Vec<FilterTerm> = terms[..pair_count * 2]
            .chunks_exact(2)
            .map(|pair| FilterTerm::new(pair[0].as_ref(), pair[1].as_ref()))
            .collect();

        if terms.len() % 2 == 0 {
            return Query::Filters(filters);
        }

        let text = normalize(terms[terms.len() - 1].as_ref());
        if filters.is_empty() {
            Query::Text(text)
        } else {
            Query::FiltersAndText(filters, text)
        }
    }

    pub fn filters(&self) -> &[FilterTerm] {
        match self {
            Query::Filters(filters) | Query::FiltersAndText(filters, _) => filters,
            Query::All | Query::Text(_) => &[],
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Query::Text(text) | Query::FiltersAndText(_, text) => Some(text),
            Query::All | Query::Filters(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Science Fiction\t"), "sciencefiction");
        assert_eq!(normalize("Min Rating"), "minrating");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_mutual_contains() {
        assert!(mutual_contains("movies", "movie"));
        assert!(mutual_contains("movie", "actionmovie"));
        assert!(!mutual_contains("series", "movie"));
        assert!(!mutual_contains("", "anything"));
    }

    #[test]
    fn test_parse_shapes() {
        let empty: [&str; 0] = [];
        assert_eq!(Query::parse(&empty), Query::All);

        let q = Query::parse(&["Genre", "Action"]);
        assert_eq!(q.filters(), &[FilterTerm::new("genre", "action")]);
        assert_eq!(q.text(), None);

        let q = Query::parse(&["Heat"]);
        assert_eq!(q, Query::Text("heat".to_string()));

        let q = Query::parse(&["category", "movies", "genre", "drama", "The Wire"]);
        assert_eq!(q.filters().len(), 2);
        assert_eq!(q.text(), Some("thewire"));
    }
}
