//! Ranked search over a content snapshot.

use std::collections::HashSet;

use crate::domain::Content;

use super::criteria::{CriteriaRegistry, Predicate, SuitabilityBucket};
use super::query::{mutual_contains, normalize, Query, QueryError};

/// A matching entry and how many criteria/fields it satisfied
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub content: &'a Content,
    pub score: usize,
}

/// Stateless query evaluator
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    registry: CriteriaRegistry,
}

impl SearchEngine {
    pub fn new(registry: CriteriaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CriteriaRegistry {
        &self.registry
    }

    /// Matching content, best first
    ///
    /// - no terms: everything, unordered
    /// - even count: `(criterion, value)` filters, all must hold
    /// - one term: free text, scored by matching fields
    /// - odd count > 1: filters plus free text; the text must match at
    ///   least one field
    pub fn search<'a, I, S>(
        &self,
        content: I,
        terms: &[S],
    ) -> Result<Vec<&'a Content>, QueryError>
    where
        I: IntoIterator<Item = &'a Content>,
        S: AsRef<str>,
    {
        Ok(self
            .rank(content, terms)?
            .into_iter()
            .map(|hit| hit.content)
            .collect())
    }

    /// Like [`SearchEngine::search`] but keeps the scores
    pub fn rank<'a, I, S>(
        &self,
        content: I,
        terms: &[S],
    ) -> Result<Vec<SearchHit<'a>>, QueryError>
    where
        I: IntoIterator<Item = &'a Content>,
        S: AsRef<str>,
    {
        let query = Query::parse(terms);
        let filters = self.compile(&query)?;
        let passes = |content: &Content| filters.iter().all(|pred| pred(content));

        let mut hits: Vec<SearchHit<'a>> = match &query {
            Query::All => content
                .into_iter()
                .map(|content| SearchHit { content, score: 0 })
                .collect(),
            Query::Filters(_) => content
                .into_iter()
                .filter(|content| passes(*content))
                .map(|content| SearchHit { content, score: 1 })
                .collect(),
            Query::Text(text) => content
                .into_iter()
                .filter_map(|content| {
                    let score = text_score(content, text);
                    (score > 0).then_some(SearchHit { content, score })
                })
                .collect(),
            Query::FiltersAndText(_, text) => content
                .into_iter()
                .filter(|content| passes(*content))
                .filter_map(|content| {
                    let score = 1 + text_score(content, text);
                    (score > 1).then_some(SearchHit { content, score })
                })
                .collect(),
        };

        hits.sort_by(|a, b| b.score.cmp(&a.score));

        let mut seen = HashSet::new();
        hits.retain(|hit| seen.insert(hit.content.id));
        Ok(hits)
    }

    fn compile(&self, query: &Query) -> Result<Vec<Predicate>, QueryError> {
        query
            .filters()
            .iter()
            .filter_map(|term| self.registry.compile(term).transpose())
            .collect()
    }
}

/// Number of fields of `content` a normalized free-text token matches
///
/// Fields: title, people involved, category label, and for viewable
/// content the genre and the suitability flag. An empty token counts
/// as one extra match.
pub fn text_score(content: &Content, token: &str) -> usize {
    let mut score = usize::from(token.is_empty());

    let fields = [
        normalize(&content.title),
        normalize(&content.people_involved),
        content.kind().label().to_string(),
    ];
    score += fields
        .iter()
        .filter(|field| mutual_contains(field, token))
        .count();

    if let Some(viewing) = content.viewing() {
        if mutual_contains(&normalize(viewing.genre.name()), token) {
            score += 1;
        }
        let bucket = SuitabilityBucket::classify(token);
        if !matches!(bucket, SuitabilityBucket::Literal(_))
            && bucket.matches(viewing.suitable_for_minors)
        {
            score += 1;
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Genre, Viewing};

    fn movie(title: &str, people: &str, genre: Genre) -> Content {
        Content::movie(title, people, Viewing::new("s", genre, true), 2000, 100)
    }

    #[test]
    fn test_text_score_counts_fields() {
        let m = movie("Movie1", "Daniel Day-Lewis", Genre::Action);
        assert_eq!(text_score(&m, "movie1"), 1);
        assert_eq!(text_score(&m, "daniel"), 1);
        assert_eq!(text_score(&m, "action"), 1);
        assert_eq!(text_score(&m, "zzz"), 0);
    }

    #[test]
    fn test_text_score_suitability() {
        let kids = movie("Heat", "Michael Mann", Genre::Comedy);
        assert_eq!(text_score(&kids, "suitable"), 1);
        assert_eq!(text_score(&kids, "notsuitable"), 0);
    }

    #[test]
    fn test_empty_token_is_wildcard() {
        let plain = Content::new("Title", "People");
        // wildcard + title + people + label
        assert_eq!(text_score(&plain, ""), 4);
    }

    #[test]
    fn test_results_sorted_by_score() {
        let a = movie("Action Movie", "Action Studios", Genre::Action);
        let b = movie("Quiet", "Nobody", Genre::Drama);
        let c = Content::new("Movie", "Host");
        let engine = SearchEngine::default();

        let hits = engine.rank([&c, &b, &a], &["actionmovie"]).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content.title, "Action Movie");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_filters_with_text_require_text_match() {
        let a = movie("Heat", "Michael Mann", Genre::Action);
        let b = movie("Ronin", "John Frankenheimer", Genre::Action);
        let engine = SearchEngine::default();

        let hits = engine.rank([&a, &b], &["genre", "action", "heat"]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content.title, "Heat");
        assert_eq!(hits[0].score, 2);
    }

    #[test]
    fn test_duplicate_input_suppressed() {
        let a = movie("Heat", "Michael Mann", Genre::Action);
        let engine = SearchEngine::default();
        let hits = engine.search([&a, &a], &["genre", "action"]).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_invalid_rating_is_an_error() {
        let a = movie("Heat", "Michael Mann", Genre::Action);
        let engine = SearchEngine::default();
        let result = engine.search([&a], &["minrating", "high"]);
        assert!(matches!(result, Err(QueryError::InvalidRating { .. })));
    }
}
