//! Catalog content: generic entries, viewable content, movies and series.
//!
//! Relationships to other entities are stored by id, never by reference,
//! so a cycle of related-content links is just a set of graph edges.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::review::Review;
use super::user::UserId;

/// Stable identifier of a content entity inside the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(Uuid);

impl ContentId {
    /// Allocate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Concrete kind of a content entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Plain content with no viewing information
    Generic,

    /// Viewable content that is neither a movie nor a series
    Viewable,

    /// Movie
    Movie,

    /// Series
    Series,
}

/// Derived subsets of the content collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentSubset {
    Viewable,
    Movies,
    Series,
}

impl ContentKind {
    /// Derived subsets an entity of this kind belongs to
    pub fn subsets(self) -> &'static [ContentSubset] {
        match self {
            ContentKind::Generic => &[],
            ContentKind::Viewable => &[ContentSubset::Viewable],
            ContentKind::Movie => &[ContentSubset::Viewable, ContentSubset::Movies],
            ContentKind::Series => &[ContentSubset::Viewable, ContentSubset::Series],
        }
    }

    pub fn is_viewable(self) -> bool {
        !matches!(self, ContentKind::Generic)
    }

    /// Category label used by search (already normalized)
    pub fn label(self) -> &'static str {
        match self {
            ContentKind::Generic => "content",
            ContentKind::Viewable => "viewablecontent",
            ContentKind::Movie => "movies",
            ContentKind::Series => "series",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Generic => write!(f, "content"),
            ContentKind::Viewable => write!(f, "viewable"),
            ContentKind::Movie => write!(f, "movie"),
            ContentKind::Series => write!(f, "series"),
        }
    }
}

/// Fixed set of genres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    Comedy,
    Drama,
    Action,
    ScienceFiction,
    Horror,
}

impl Genre {
    /// Display name, e.g. "Science fiction"
    pub fn name(self) -> &'static str {
        match self {
            Genre::Comedy => "Comedy",
            Genre::Drama => "Drama",
            Genre::Action => "Action",
            Genre::ScienceFiction => "Science fiction",
            Genre::Horror => "Horror",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Genre {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "comedy" => Ok(Genre::Comedy),
            "drama" => Ok(Genre::Drama),
            "action" => Ok(Genre::Action),
            "horror" => Ok(Genre::Horror),
            k if k.contains("scifi") || k.contains("sci-fi") || k.contains("sciencefiction") => {
                Ok(Genre::ScienceFiction)
            }
            _ => anyhow::bail!(
                "Unknown genre: {} (expected one of: Action, Drama, Horror, Science fiction, Comedy)",
                s
            ),
        }
    }
}

/// Viewing information shared by every viewable kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewing {
    pub synopsis: String,
    pub genre: Genre,
    pub suitable_for_minors: bool,
}

impl Viewing {
    pub fn new(synopsis: impl Into<String>, genre: Genre, suitable_for_minors: bool) -> Self {
        Self {
            synopsis: synopsis.into(),
            genre,
            suitable_for_minors,
        }
    }
}

/// A single episode of a season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Episode {
    /// Duration in minutes
    pub duration: u32,
}

impl Episode {
    pub fn new(duration: u32) -> Self {
        Self { duration }
    }
}

/// A season of a series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub number: u32,
    pub year: u16,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

impl Season {
    pub fn new(number: u32, year: u16) -> Self {
        Self {
            number,
            year,
            episodes: Vec::new(),
        }
    }

    pub fn with_episodes(mut self, episodes: impl IntoIterator<Item = Episode>) -> Self {
        self.episodes.extend(episodes);
        self
    }

    pub fn add_episodes(&mut self, episodes: impl IntoIterator<Item = Episode>) {
        self.episodes.extend(episodes);
    }

    /// Remove the first episode equal to each given one
    pub fn remove_episodes(&mut self, episodes: &[Episode]) {
        for episode in episodes {
            if let Some(pos) = self.episodes.iter().position(|e| e == episode) {
                self.episodes.remove(pos);
            }
        }
    }

    /// Total running time in minutes
    pub fn total_duration(&self) -> u32 {
        self.episodes.iter().map(|e| e.duration).sum()
    }
}

/// Kind-specific details of a content entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentDetails {
    Generic,
    Viewable {
        viewing: Viewing,
    },
    Movie {
        viewing: Viewing,
        year: u16,
        /// Duration in minutes
        duration: u32,
    },
    Series {
        viewing: Viewing,
        /// Sorted by season number
        seasons: Vec<Season>,
    },
}

impl ContentDetails {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentDetails::Generic => ContentKind::Generic,
            ContentDetails::Viewable { .. } => ContentKind::Viewable,
            ContentDetails::Movie { .. } => ContentKind::Movie,
            ContentDetails::Series { .. } => ContentKind::Series,
        }
    }

    pub fn viewing(&self) -> Option<&Viewing> {
        match self {
            ContentDetails::Generic => None,
            ContentDetails::Viewable { viewing }
            | ContentDetails::Movie { viewing, .. }
            | ContentDetails::Series { viewing, .. } => Some(viewing),
        }
    }
}

/// A catalog entry
///
/// Two entries are the same entry when title and people involved match;
/// see [`Content::same_entry`]. The store keys its deduplication on that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub id: ContentId,
    pub title: String,
    pub people_involved: String,

    /// Outgoing related-content links (not symmetric)
    #[serde(default)]
    pub related: BTreeSet<ContentId>,

    /// One review per reviewer
    #[serde(default)]
    pub reviews: BTreeMap<UserId, Review>,

    #[serde(flatten)]
    pub details: ContentDetails,
}

impl Content {
    /// Create plain content
    pub fn new(title: impl Into<String>, people_involved: impl Into<String>) -> Self {
        Self::with_details(title, people_involved, ContentDetails::Generic)
    }

    pub fn viewable(
        title: impl Into<String>,
        people_involved: impl Into<String>,
        viewing: Viewing,
    ) -> Self {
        Self::with_details(title, people_involved, ContentDetails::Viewable { viewing })
    }

    pub fn movie(
        title: impl Into<String>,
        people_involved: impl Into<String>,
        viewing: Viewing,
        year: u16,
        duration: u32,
    ) -> Self {
        Self::with_details(
            title,
            people_involved,
            ContentDetails::Movie {
                viewing,
                year,
                duration,
            },
        )
    }

    pub fn series(
        title: impl Into<String>,
        people_involved: impl Into<String>,
        viewing: Viewing,
        seasons: impl IntoIterator<Item = Season>,
    ) -> Self {
        let mut content = Self::with_details(
            title,
            people_involved,
            ContentDetails::Series {
                viewing,
                seasons: Vec::new(),
            },
        );
        content.add_seasons(seasons);
        content
    }

    fn with_details(
        title: impl Into<String>,
        people_involved: impl Into<String>,
        details: ContentDetails,
    ) -> Self {
        Self {
            id: ContentId::new(),
            title: title.into(),
            people_involved: people_involved.into(),
            related: BTreeSet::new(),
            reviews: BTreeMap::new(),
            details,
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.details.kind()
    }

    pub fn viewing(&self) -> Option<&Viewing> {
        self.details.viewing()
    }

    /// Domain equality: same title and same people involved
    pub fn same_entry(&self, other: &Content) -> bool {
        self.title == other.title && self.people_involved == other.people_involved
    }

    pub(crate) fn entry_key(&self) -> (String, String) {
        (self.title.clone(), self.people_involved.clone())
    }

    /// Mean rating, undefined when nobody reviewed this content
    pub fn average_rating(&self) -> Option<f64> {
        if self.reviews.is_empty() {
            return None;
        }
        let sum: u64 = self.reviews.values().map(|r| u64::from(r.rating)).sum();
        Some(sum as f64 / self.reviews.len() as f64)
    }

    /// Average rating with one decimal, or "-" without reviews
    pub fn formatted_average_rating(&self) -> String {
        match self.average_rating() {
            Some(avg) => format!("{:.1}", avg),
            None => "-".to_string(),
        }
    }

    /// Seasons of a series; empty for every other kind
    pub fn seasons(&self) -> &[Season] {
        match &self.details {
            ContentDetails::Series { seasons, .. } => seasons,
            _ => &[],
        }
    }

    /// Add seasons to a series, skipping duplicates and keeping them sorted.
    /// Returns false when this content is not a series.
    pub fn add_seasons(&mut self, new: impl IntoIterator<Item = Season>) -> bool {
        let ContentDetails::Series { seasons, .. } = &mut self.details else {
            return false;
        };
        for season in new {
            if !seasons.contains(&season) {
                seasons.push(season);
            }
        }
        seasons.sort_by_key(|s| s.number);
        true
    }

    /// Remove every season with the given number
    pub fn remove_season(&mut self, number: u32) -> bool {
        let ContentDetails::Series { seasons, .. } = &mut self.details else {
            return false;
        };
        let before = seasons.len();
        seasons.retain(|s| s.number != number);
        seasons.len() != before
    }
}

impl PartialEq for Content {
    fn eq(&self, other: &Self) -> bool {
        self.same_entry(other)
    }
}

impl Eq for Content {}
