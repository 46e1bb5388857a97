//! Command-line interface for cinedb.
//!
//! Thin surface over [`CatalogStore`]: searching, listing, inspecting and
//! removing catalog entries.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{self, ResolvedConfig};
use crate::domain::{Content, ContentId, ContentSubset, User, UserId, UserRole};
use crate::store::CatalogStore;

/// cinedb - catalog of movies, series and their subscribers
#[derive(Parser, Debug)]
#[command(name = "cinedb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search content
    ///
    /// Pairs of terms are (criterion, value) filters; an odd trailing
    /// term is free text. With no terms everything matches.
    Search {
        /// Query terms, e.g. `category movies minrating 4 heat`
        terms: Vec<String>,
    },

    /// List content
    List {
        /// Restrict to one subset
        #[arg(short, long, value_enum, default_value = "all")]
        scope: ScopeArg,

        /// Maximum number of entries to show (config default if omitted)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List users
    Users {
        /// Restrict to one role
        #[arg(short, long, value_enum)]
        role: Option<RoleArg>,
    },

    /// Show details of a content entry or user
    Show {
        /// Content or user ID (UUID)
        id: String,
    },

    /// Remove content entries and every reference to them
    Remove {
        /// Content IDs (UUID)
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show collection sizes
    Stats,

    /// Show resolved configuration (debug)
    Config,
}

/// Content subset for CLI (maps to ContentSubset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    /// Everything
    All,

    /// Movies and series
    Viewable,

    Movies,

    Series,
}

impl ScopeArg {
    fn subset(self) -> Option<ContentSubset> {
        match self {
            ScopeArg::All => None,
            ScopeArg::Viewable => Some(ContentSubset::Viewable),
            ScopeArg::Movies => Some(ContentSubset::Movies),
            ScopeArg::Series => Some(ContentSubset::Series),
        }
    }
}

/// User role for CLI (maps to UserRole)
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Admin,
    Subscriber,
}

impl From<RoleArg> for UserRole {
    fn from(r: RoleArg) -> Self {
        match r {
            RoleArg::Admin => UserRole::Admin,
            RoleArg::Subscriber => UserRole::Subscriber,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let cfg = config::config()?;

        match self.command {
            Commands::Search { terms } => search(cfg, &terms),
            Commands::List { scope, limit } => list_content(cfg, scope, limit),
            Commands::Users { role } => list_users(cfg, role),
            Commands::Show { id } => show(cfg, &id),
            Commands::Remove { ids } => remove(cfg, &ids),
            Commands::Stats => show_stats(cfg),
            Commands::Config => show_config(cfg),
        }
    }
}

fn open_store(cfg: &ResolvedConfig) -> Result<CatalogStore> {
    CatalogStore::open_from_config(cfg).with_context(|| {
        format!(
            "Failed to open catalog at {} / {}",
            cfg.content_file.display(),
            cfg.users_file.display()
        )
    })
}

fn print_content_header() {
    println!("{:<38} {:<16} {:<6} {:<40}", "ID", "KIND", "RATING", "TITLE");
    println!("{}", "-".repeat(100));
}

fn print_content_row(item: &Content) {
    println!(
        "{:<38} {:<16} {:<6} {:<40}",
        item.id.to_string(),
        item.kind().label(),
        item.formatted_average_rating(),
        truncate(&item.title, 40)
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Run a query against the catalog
fn search(cfg: &ResolvedConfig, terms: &[String]) -> Result<()> {
    let store = open_store(cfg)?;
    let results = store.search(terms).context("Search failed")?;

    let query = terms.join(" ");
    if results.is_empty() {
        println!("No results found for: {}", query);
        return Ok(());
    }

    println!("Found {} result(s) for \"{}\":\n", results.len(), query);
    print_content_header();
    for item in results {
        print_content_row(item);
    }

    Ok(())
}

/// List content, sorted by title
fn list_content(cfg: &ResolvedConfig, scope: ScopeArg, limit: Option<usize>) -> Result<()> {
    let store = open_store(cfg)?;

    let mut items: Vec<&Content> = match scope.subset() {
        None => store.contents().collect(),
        Some(subset) => store.content_in(subset).collect(),
    };

    if items.is_empty() {
        println!("No content found.");
        return Ok(());
    }

    items.sort_by(|a, b| a.title.cmp(&b.title));
    let total = items.len();
    let limit = limit.unwrap_or(cfg.display_limit);

    print_content_header();
    for item in items.into_iter().take(limit) {
        print_content_row(item);
    }

    println!("\nTotal: {} entries", total);
    Ok(())
}

/// List users, sorted by username
fn list_users(cfg: &ResolvedConfig, role: Option<RoleArg>) -> Result<()> {
    let store = open_store(cfg)?;

    let mut users: Vec<&User> = match role {
        None => store.users().collect(),
        Some(role) => store.users_in(role.into()).collect(),
    };

    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    users.sort_by(|a, b| a.username.cmp(&b.username));

    println!("{:<38} {:<12} {:<20} {:<30}", "ID", "ROLE", "USERNAME", "NAME");
    println!("{}", "-".repeat(100));
    for user in &users {
        println!(
            "{:<38} {:<12} {:<20} {:<30}",
            user.id.to_string(),
            user.user_role().to_string(),
            truncate(&user.username, 20),
            truncate(&format!("{} {}", user.name, user.surname), 30)
        );
    }

    println!("\nTotal: {} users", users.len());
    Ok(())
}

/// Show a content entry or a user, whichever the id names
fn show(cfg: &ResolvedConfig, id: &str) -> Result<()> {
    let store = open_store(cfg)?;

    if let Ok(content_id) = id.parse::<ContentId>() {
        if let Some(item) = store.content(&content_id) {
            show_content(&store, item);
            return Ok(());
        }
    }

    let user_id: UserId = id
        .parse()
        .with_context(|| format!("Invalid ID: {}", id))?;
    let user = store
        .user(&user_id)
        .with_context(|| format!("No content or user with ID {}", id))?;
    show_user(&store, user);
    Ok(())
}

fn show_content(store: &CatalogStore, item: &Content) {
    println!("ID:      {}", item.id);
    println!("Title:   {}", item.title);
    println!("People:  {}", item.people_involved);
    println!("Kind:    {}", item.kind());
    println!("Rating:  {}", item.formatted_average_rating());

    if let Some(viewing) = item.viewing() {
        println!("Genre:   {}", viewing.genre);
        println!(
            "Minors:  {}",
            if viewing.suitable_for_minors { "suitable" } else { "not suitable" }
        );
        if !viewing.synopsis.is_empty() {
            println!("\n{}\n", viewing.synopsis);
        }
    }

    for season in item.seasons() {
        println!(
            "  Season {} ({}): {} episode(s), {} min",
            season.number,
            season.year,
            season.episodes.len(),
            season.total_duration()
        );
    }

    if !item.related.is_empty() {
        println!("Related:");
        for related in item.related.iter().filter_map(|id| store.content(id)) {
            println!("  {} {}", related.id, related.title);
        }
    }

    if !item.reviews.is_empty() {
        println!("Reviews:");
        for review in item.reviews.values() {
            let reviewer = store
                .user(&review.reviewer)
                .map(|u| u.username.as_str())
                .unwrap_or("?");
            println!(
                "  [{}] {} {}/5 {}",
                review.formatted_date(),
                reviewer,
                review.rating,
                review.text
            );
        }
    }
}

fn show_user(store: &CatalogStore, user: &User) {
    println!("ID:      {}", user.id);
    println!("Profile: {}", user.public_profile());
    println!("Role:    {}", user.user_role());

    if let Some(favorites) = user.favorites() {
        println!("Favorites: {}", favorites.len());
        for item in favorites.iter().filter_map(|id| store.content(id)) {
            println!("  {} {}", item.id, item.title);
        }
    }
}

/// Remove content by id
fn remove(cfg: &ResolvedConfig, ids: &[String]) -> Result<()> {
    let ids = ids
        .iter()
        .map(|id| {
            id.parse::<ContentId>()
                .with_context(|| format!("Invalid content ID: {}", id))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut store = open_store(cfg)?;
    let removed = store.remove_content(ids).context("Failed to remove content")?;

    println!("Removed {} entr{}", removed, if removed == 1 { "y" } else { "ies" });
    Ok(())
}

fn show_stats(cfg: &ResolvedConfig) -> Result<()> {
    let store = open_store(cfg)?;
    let stats = store.stats();

    println!("Content:     {}", stats.content);
    println!("  viewable:  {}", stats.viewable);
    println!("  movies:    {}", stats.movies);
    println!("  series:    {}", stats.series);
    println!("Users:       {}", stats.users);
    println!("  admins:    {}", stats.admins);
    println!("  subscribers: {}", stats.subscribers);
    println!("Reviews:     {}", stats.reviews);

    Ok(())
}

fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    println!("cinedb configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:    {}", cfg.home.display());
    println!("  Content: {}", cfg.content_file.display());
    println!("  Users:   {}", cfg.users_file.display());
    println!();
    println!("Display limit: {}", cfg.display_limit);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_terms() {
        let cli = Cli::try_parse_from(["cinedb", "search", "category", "movies", "heat"]).unwrap();
        match cli.command {
            Commands::Search { terms } => assert_eq!(terms, vec!["category", "movies", "heat"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_list_scope() {
        let cli = Cli::try_parse_from(["cinedb", "list", "--scope", "series", "-l", "5"]).unwrap();
        match cli.command {
            Commands::List { scope, limit } => {
                assert_eq!(scope.subset(), Some(ContentSubset::Series));
                assert_eq!(limit, Some(5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_remove_requires_ids() {
        assert!(Cli::try_parse_from(["cinedb", "remove"]).is_err());
    }

    #[test]
    fn test_role_mapping() {
        assert_eq!(UserRole::from(RoleArg::Admin), UserRole::Admin);
        assert_eq!(UserRole::from(RoleArg::Subscriber), UserRole::Subscriber);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long title indeed", 10), "a very ...");
    }
}
