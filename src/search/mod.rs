//! Multi-criterion content search.
//!
//! Queries mix `(criterion, value)` filters with an optional trailing
//! free-text term. Filters are ANDed; free text scores each entry by the
//! number of fields it matches. Matching is case- and whitespace-
//! insensitive and, unless a criterion says otherwise, a substring test
//! in both directions.
//!
//! | criterion           | matches                                       |
//! |---------------------|-----------------------------------------------|
//! | `category`          | movies / series / viewablecontent / content   |
//! | `minrating`         | average rating >= value (reviewed only)       |
//! | `genre`             | genre of viewable content                     |
//! | `suitableforminors` | suitability flag of viewable content          |

pub mod criteria;
pub mod engine;
pub mod query;

pub use criteria::{CriteriaRegistry, CriterionFactory, Predicate, SuitabilityBucket};
pub use engine::{text_score, SearchEngine, SearchHit};
pub use query::{normalize, FilterTerm, Query, QueryError};
