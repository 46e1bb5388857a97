//! The catalog store: sole owner of the content and user collections.
//!
//! Every derived index (kind subsets, role subsets, the username lookup,
//! the title/people dedup key) is maintained here and nowhere else. All
//! cross-entity cleanup after a removal goes through [`CatalogStore::detach_content`]
//! and [`CatalogStore::detach_users`].

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{Content, ContentId, ContentSubset, Review, User, UserId, UserRole};
use crate::search::{QueryError, SearchEngine};

use super::index::SubsetIndex;
use super::persistence::{JsonlPersistence, Persistence, PersistenceError};

/// Errors surfaced by the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Invalid query: {0}")]
    Query(#[from] QueryError),
}

/// Which content a bulk delete targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentScope {
    All,
    Viewable,
    Movies,
    Series,
}

impl ContentScope {
    fn subset(self) -> Option<ContentSubset> {
        match self {
            ContentScope::All => None,
            ContentScope::Viewable => Some(ContentSubset::Viewable),
            ContentScope::Movies => Some(ContentSubset::Movies),
            ContentScope::Series => Some(ContentSubset::Series),
        }
    }
}

/// Which users a bulk delete targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserScope {
    All,
    Admins,
    Subscribers,
}

impl UserScope {
    fn role(self) -> Option<UserRole> {
        match self {
            UserScope::All => None,
            UserScope::Admins => Some(UserRole::Admin),
            UserScope::Subscribers => Some(UserRole::Subscriber),
        }
    }
}

/// Collection sizes at a glance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogStats {
    pub content: usize,
    pub viewable: usize,
    pub movies: usize,
    pub series: usize,
    pub users: usize,
    pub admins: usize,
    pub subscribers: usize,
    pub reviews: usize,
}

type EntryKey = (String, String);

/// In-memory catalog with hand-maintained secondary indices
pub struct CatalogStore<P: Persistence = JsonlPersistence> {
    content: HashMap<ContentId, Content>,
    content_keys: HashMap<EntryKey, ContentId>,
    content_subsets: SubsetIndex<ContentSubset, ContentId>,

    users: HashMap<UserId, User>,
    user_subsets: SubsetIndex<UserRole, UserId>,
    usernames: HashMap<String, UserId>,

    search_engine: SearchEngine,
    persistence: P,
}

impl CatalogStore<JsonlPersistence> {
    /// Open the store at the configured file locations
    pub fn open_from_config(config: &crate::config::ResolvedConfig) -> Result<Self, StoreError> {
        Self::open(JsonlPersistence::from_config(config))
    }
}

impl<P: Persistence> CatalogStore<P> {
    /// Create an empty store without reading anything
    pub fn new(persistence: P) -> Self {
        Self {
            content: HashMap::new(),
            content_keys: HashMap::new(),
            content_subsets: SubsetIndex::new(),
            users: HashMap::new(),
            user_subsets: SubsetIndex::new(),
            usernames: HashMap::new(),
            search_engine: SearchEngine::default(),
            persistence,
        }
    }

    /// Load both collections and rebuild every index
    ///
    /// Duplicate entries, taken usernames and references to entities that
    /// are not in the files are dropped.
    pub fn open(persistence: P) -> Result<Self, StoreError> {
        let mut store = Self::new(persistence);
        let users = store.persistence.load_users()?;
        let content = store.persistence.load_content()?;

        for user in users {
            if let Err(user) = store.insert_user(user) {
                warn!(username = %user.username, "Dropping user with duplicate username on load");
            }
        }
        store.insert_content_batch(content);

        let ids: Vec<ContentId> = store.content.keys().copied().collect();
        let mut pruned = 0;
        for id in ids {
            pruned += store.prune_content_refs(id);
        }
        let user_ids: Vec<UserId> = store.users.keys().copied().collect();
        for id in user_ids {
            pruned += store.prune_favorites(id);
        }
        if pruned > 0 {
            warn!(pruned, "Dropped dangling references on load");
        }

        info!(
            content = store.content.len(),
            users = store.users.len(),
            "Catalog loaded"
        );
        Ok(store)
    }

    /// Replace the search engine (e.g. one with extra criteria)
    pub fn with_search_engine(mut self, search_engine: SearchEngine) -> Self {
        self.search_engine = search_engine;
        self
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Add content, skipping entries equal to ones already stored.
    ///
    /// Returns the id each given entry is stored under. Related links and
    /// reviews pointing outside the store are dropped.
    pub fn add_content(
        &mut self,
        items: impl IntoIterator<Item = Content>,
    ) -> Result<Vec<ContentId>, StoreError> {
        let (ids, inserted) = self.insert_content_batch(items);

        // Pruned after the batch so entries may link to each other
        for id in &inserted {
            self.prune_content_refs(*id);
        }

        debug!(added = inserted.len(), "Added content");
        self.save_content()?;
        Ok(ids)
    }

    /// Remove content and every reference to it
    ///
    /// Returns how many entries were actually removed.
    pub fn remove_content(
        &mut self,
        ids: impl IntoIterator<Item = ContentId>,
    ) -> Result<usize, StoreError> {
        if self.content.is_empty() {
            return Ok(0);
        }

        let removed: HashSet<ContentId> = ids
            .into_iter()
            .filter(|id| self.take_content(*id).is_some())
            .collect();

        self.detach_content(&removed);
        debug!(removed = removed.len(), "Removed content");
        self.save_all()?;
        Ok(removed.len())
    }

    /// Delete every entry in a scope, scrubbing references to each
    pub fn bulk_delete_content(&mut self, scope: ContentScope) -> Result<usize, StoreError> {
        let targets: Vec<ContentId> = match scope.subset() {
            None => self.content.keys().copied().collect(),
            Some(subset) => self.content_subsets.members(subset),
        };
        if targets.is_empty() {
            return Ok(0);
        }

        let removed: HashSet<ContentId> = targets
            .into_iter()
            .filter(|id| self.take_content(*id).is_some())
            .collect();

        self.detach_content(&removed);
        info!(?scope, removed = removed.len(), "Bulk deleted content");
        self.save_all()?;
        Ok(removed.len())
    }

    /// Look up content by id
    pub fn content(&self, id: &ContentId) -> Option<&Content> {
        self.content.get(id)
    }

    /// Look up content by its domain key
    pub fn find_content(&self, title: &str, people_involved: &str) -> Option<&Content> {
        let key = (title.to_string(), people_involved.to_string());
        self.content_keys.get(&key).and_then(|id| self.content.get(id))
    }

    pub fn contents(&self) -> impl Iterator<Item = &Content> + '_ {
        self.content.values()
    }

    /// Content in one derived subset
    pub fn content_in(&self, subset: ContentSubset) -> impl Iterator<Item = &Content> + '_ {
        self.content_subsets
            .iter(subset)
            .filter_map(|id| self.content.get(id))
    }

    pub fn is_in_subset(&self, subset: ContentSubset, id: &ContentId) -> bool {
        self.content_subsets.contains(subset, id)
    }

    pub fn content_len(&self) -> usize {
        self.content.len()
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Add users, skipping accounts already stored.
    ///
    /// A user whose username belongs to a different stored account is
    /// skipped with a warning and has no id in the result.
    pub fn add_users(
        &mut self,
        users: impl IntoIterator<Item = User>,
    ) -> Result<Vec<UserId>, StoreError> {
        let mut ids = Vec::new();

        for user in users {
            match self.insert_user(user) {
                Ok(id) => {
                    self.prune_favorites(id);
                    ids.push(id);
                }
                Err(user) => {
                    warn!(username = %user.username, "Username already taken, skipping user");
                }
            }
        }

        debug!(added = ids.len(), "Added users");
        self.save_users()?;
        Ok(ids)
    }

    /// Remove users and every review they wrote
    pub fn remove_users(
        &mut self,
        ids: impl IntoIterator<Item = UserId>,
    ) -> Result<usize, StoreError> {
        if self.users.is_empty() {
            return Ok(0);
        }

        let removed: HashSet<UserId> = ids
            .into_iter()
            .filter(|id| self.take_user(*id).is_some())
            .collect();

        self.detach_users(&removed);
        debug!(removed = removed.len(), "Removed users");
        self.save_all()?;
        Ok(removed.len())
    }

    /// Delete every user in a scope along with their reviews
    pub fn bulk_delete_users(&mut self, scope: UserScope) -> Result<usize, StoreError> {
        let targets: Vec<UserId> = match scope.role() {
            None => self.users.keys().copied().collect(),
            Some(role) => self.user_subsets.members(role),
        };
        if targets.is_empty() {
            return Ok(0);
        }

        let removed: HashSet<UserId> = targets
            .into_iter()
            .filter(|id| self.take_user(*id).is_some())
            .collect();

        self.detach_users(&removed);
        info!(?scope, removed = removed.len(), "Bulk deleted users");
        self.save_all()?;
        Ok(removed.len())
    }

    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.users.get(id)
    }

    /// Username lookup used for authentication
    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.usernames
            .get(username.trim())
            .and_then(|id| self.users.get(id))
    }

    pub fn users(&self) -> impl Iterator<Item = &User> + '_ {
        self.users.values()
    }

    pub fn users_in(&self, role: UserRole) -> impl Iterator<Item = &User> + '_ {
        self.user_subsets
            .iter(role)
            .filter_map(|id| self.users.get(id))
    }

    pub fn user_len(&self) -> usize {
        self.users.len()
    }

    // ------------------------------------------------------------------
    // Relationships and in-place edits
    // ------------------------------------------------------------------

    /// Link `from` to `to`. The reverse link is not created.
    pub fn link_related(&mut self, from: ContentId, to: ContentId) -> Result<bool, StoreError> {
        if !self.content.contains_key(&to) {
            return Ok(false);
        }
        let changed = match self.content.get_mut(&from) {
            Some(content) => content.related.insert(to),
            None => false,
        };
        if changed {
            self.save_content()?;
        }
        Ok(changed)
    }

    pub fn unlink_related(&mut self, from: ContentId, to: ContentId) -> Result<bool, StoreError> {
        let changed = match self.content.get_mut(&from) {
            Some(content) => content.related.remove(&to),
            None => false,
        };
        if changed {
            self.save_content()?;
        }
        Ok(changed)
    }

    /// Store `review` under its reviewer, replacing any earlier one
    pub fn add_review(
        &mut self,
        content_id: ContentId,
        review: Review,
    ) -> Result<bool, StoreError> {
        if !self.users.contains_key(&review.reviewer) {
            return Ok(false);
        }
        let Some(content) = self.content.get_mut(&content_id) else {
            return Ok(false);
        };
        content.reviews.insert(review.reviewer, review);
        self.save_content()?;
        Ok(true)
    }

    pub fn remove_review(
        &mut self,
        content_id: ContentId,
        reviewer: UserId,
    ) -> Result<bool, StoreError> {
        let changed = match self.content.get_mut(&content_id) {
            Some(content) => content.reviews.remove(&reviewer).is_some(),
            None => false,
        };
        if changed {
            self.save_content()?;
        }
        Ok(changed)
    }

    /// Mark content as a subscriber's favorite
    pub fn add_favorite(
        &mut self,
        user_id: UserId,
        content_id: ContentId,
    ) -> Result<bool, StoreError> {
        if !self.content.contains_key(&content_id) {
            return Ok(false);
        }
        let changed = self
            .users
            .get_mut(&user_id)
            .and_then(User::favorites_mut)
            .is_some_and(|favorites| favorites.insert(content_id));
        if changed {
            self.save_users()?;
        }
        Ok(changed)
    }

    pub fn remove_favorite(
        &mut self,
        user_id: UserId,
        content_id: ContentId,
    ) -> Result<bool, StoreError> {
        let changed = self
            .users
            .get_mut(&user_id)
            .and_then(User::favorites_mut)
            .is_some_and(|favorites| favorites.remove(&content_id));
        if changed {
            self.save_users()?;
        }
        Ok(changed)
    }

    /// Edit content in place.
    ///
    /// The edit is rejected (returns false) when it would make the entry
    /// equal to another stored entry. Kind subsets and the dedup key are
    /// re-derived; related links and reviews are pruned to entities still
    /// in the store. The id cannot be changed.
    pub fn update_content<F>(&mut self, id: ContentId, edit: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut Content),
    {
        let Some(current) = self.content.get(&id) else {
            return Ok(false);
        };
        let old_key = current.entry_key();
        let old_kind = current.kind();

        let mut edited = current.clone();
        edit(&mut edited);
        edited.id = id;

        let new_key = edited.entry_key();
        if self.content_keys.get(&new_key).is_some_and(|other| *other != id) {
            warn!(title = %edited.title, "Edit would duplicate another entry, rejected");
            return Ok(false);
        }

        self.content_keys.remove(&old_key);
        self.content_keys.insert(new_key, id);
        self.content_subsets.remove(id, old_kind.subsets());
        self.content_subsets.insert(id, edited.kind().subsets());
        self.content.insert(id, edited);
        self.prune_content_refs(id);

        debug!(%id, "Updated content");
        self.save_content()?;
        Ok(true)
    }

    /// Edit a user in place.
    ///
    /// Rejected (returns false) when the new username belongs to another
    /// user. Role subsets and the username index are re-derived.
    pub fn update_user<F>(&mut self, id: UserId, edit: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut User),
    {
        let Some(current) = self.users.get(&id) else {
            return Ok(false);
        };
        let old_username = current.username.clone();
        let old_role = current.user_role();

        let mut edited = current.clone();
        edit(&mut edited);
        edited.id = id;
        edited.username = edited.username.trim().to_string();

        if self
            .usernames
            .get(&edited.username)
            .is_some_and(|other| *other != id)
        {
            warn!(username = %edited.username, "Username already taken, edit rejected");
            return Ok(false);
        }

        self.usernames.remove(&old_username);
        self.usernames.insert(edited.username.clone(), id);
        self.user_subsets.remove(id, &[old_role]);
        self.user_subsets.insert(id, &[edited.user_role()]);
        self.users.insert(id, edited);
        self.prune_favorites(id);

        debug!(%id, "Updated user");
        self.save_users()?;
        Ok(true)
    }

    /// Write both collections unconditionally
    pub fn flush(&self) -> Result<(), StoreError> {
        self.save_all()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Ranked search over all content; see [`SearchEngine::search`]
    pub fn search<S: AsRef<str>>(&self, terms: &[S]) -> Result<Vec<&Content>, StoreError> {
        Ok(self.search_engine.search(self.content.values(), terms)?)
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            content: self.content.len(),
            viewable: self.content_subsets.len(ContentSubset::Viewable),
            movies: self.content_subsets.len(ContentSubset::Movies),
            series: self.content_subsets.len(ContentSubset::Series),
            users: self.users.len(),
            admins: self.user_subsets.len(UserRole::Admin),
            subscribers: self.user_subsets.len(UserRole::Subscriber),
            reviews: self.content.values().map(|c| c.reviews.len()).sum(),
        }
    }

    // ------------------------------------------------------------------
    // Index maintenance
    // ------------------------------------------------------------------

    /// Insert a batch without pruning or writing.
    ///
    /// Returns the stored id of every item and the ids that were newly
    /// inserted. Links between batch items follow re-assigned ids and
    /// duplicates to the entry they resolved to.
    fn insert_content_batch(
        &mut self,
        items: impl IntoIterator<Item = Content>,
    ) -> (Vec<ContentId>, Vec<ContentId>) {
        let mut ids = Vec::new();
        let mut inserted = Vec::new();
        let mut stored_as: HashMap<ContentId, ContentId> = HashMap::new();

        for item in items {
            let original = item.id;
            let before = self.content.len();
            let id = self.insert_content(item);
            if self.content.len() > before {
                inserted.push(id);
            }
            if original != id {
                stored_as.insert(original, id);
            }
            ids.push(id);
        }

        if !stored_as.is_empty() {
            for id in &inserted {
                if let Some(item) = self.content.get_mut(id) {
                    item.related = item
                        .related
                        .iter()
                        .map(|other| stored_as.get(other).copied().unwrap_or(*other))
                        .collect();
                }
            }
        }

        (ids, inserted)
    }

    /// Insert without pruning or writing; returns the stored id
    fn insert_content(&mut self, mut item: Content) -> ContentId {
        let key = item.entry_key();
        if let Some(existing) = self.content_keys.get(&key) {
            return *existing;
        }
        if self.content.contains_key(&item.id) {
            item.id = ContentId::new();
        }

        let id = item.id;
        self.content_subsets.insert(id, item.kind().subsets());
        self.content_keys.insert(key, id);
        self.content.insert(id, item);
        id
    }

    fn take_content(&mut self, id: ContentId) -> Option<Content> {
        let item = self.content.remove(&id)?;
        self.content_subsets.remove(id, item.kind().subsets());
        self.content_keys.remove(&item.entry_key());
        Some(item)
    }

    /// Strip removed content from related links and favorites
    fn detach_content(&mut self, removed: &HashSet<ContentId>) {
        if removed.is_empty() {
            return;
        }
        for content in self.content.values_mut() {
            content.related.retain(|id| !removed.contains(id));
        }
        for user in self.users.values_mut() {
            if let Some(favorites) = user.favorites_mut() {
                favorites.retain(|id| !removed.contains(id));
            }
        }
    }

    /// Drop links and reviews of one entry that point outside the store
    fn prune_content_refs(&mut self, id: ContentId) -> usize {
        let Some(mut item) = self.content.remove(&id) else {
            return 0;
        };
        let before = item.related.len() + item.reviews.len();
        item.related
            .retain(|other| *other == id || self.content.contains_key(other));
        item.reviews.retain(|user, _| self.users.contains_key(user));
        let pruned = before - item.related.len() - item.reviews.len();
        self.content.insert(id, item);
        pruned
    }

    /// Insert a user; gives the user back if its username is taken by
    /// a different account
    fn insert_user(&mut self, mut user: User) -> Result<UserId, User> {
        user.username = user.username.trim().to_string();
        if let Some(existing) = self.usernames.get(&user.username) {
            return match self.users.get(existing) {
                Some(stored) if stored.same_account(&user) => Ok(*existing),
                _ => Err(user),
            };
        }
        if self.users.contains_key(&user.id) {
            user.id = UserId::new();
        }

        let id = user.id;
        self.user_subsets.insert(id, &[user.user_role()]);
        self.usernames.insert(user.username.clone(), id);
        self.users.insert(id, user);
        Ok(id)
    }

    fn take_user(&mut self, id: UserId) -> Option<User> {
        let user = self.users.remove(&id)?;
        self.user_subsets.remove(id, &[user.user_role()]);
        if self.usernames.get(&user.username) == Some(&id) {
            self.usernames.remove(&user.username);
        }
        Some(user)
    }

    /// Strip removed users' reviews from every entry
    fn detach_users(&mut self, removed: &HashSet<UserId>) {
        if removed.is_empty() {
            return;
        }
        for content in self.content.values_mut() {
            content.reviews.retain(|user, _| !removed.contains(user));
        }
    }

    fn prune_favorites(&mut self, id: UserId) -> usize {
        let content = &self.content;
        let Some(favorites) = self.users.get_mut(&id).and_then(User::favorites_mut) else {
            return 0;
        };
        let before = favorites.len();
        favorites.retain(|fav| content.contains_key(fav));
        before - favorites.len()
    }

    fn save_content(&self) -> Result<(), StoreError> {
        let all: Vec<&Content> = self.content.values().collect();
        self.persistence.save_content(&all)?;
        Ok(())
    }

    fn save_users(&self) -> Result<(), StoreError> {
        let all: Vec<&User> = self.users.values().collect();
        self.persistence.save_users(&all)?;
        Ok(())
    }

    fn save_all(&self) -> Result<(), StoreError> {
        self.save_content()?;
        self.save_users()
    }
}
