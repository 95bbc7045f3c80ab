//! Post Store
//!
//! The post list (with filters and pagination), the post currently being viewed,
//! and the category/tag vocabularies. Posts, categories, tags, pagination and
//! filters survive restarts through the persistence port; loading and error state
//! do not.

use crate::client::services::PostService;
use crate::client::storage::{load_json, Storage};
use crate::client::stores::optimistic::{EntityList, OptimisticLedger, Slot};
use crate::client::stores::{persist, StoreError};
use crate::client::transport::MultipartPart;
use crate::shared::envelope::ApiEnvelope;
use crate::shared::models::{Pagination, Post, PostDraft, PostFilters, PostPage, PostQuery, PostUpdate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const STORAGE_KEY: &str = "pressroom.posts";

/// The persisted subset of post state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PersistedPosts {
    posts: Vec<Post>,
    categories: Vec<String>,
    tags: Vec<String>,
    pagination: Pagination,
    filters: PostFilters,
}

/// Everything the store shows for one post
#[derive(Debug, Clone, PartialEq)]
pub struct PostSnapshot {
    pub listed: Option<Slot<Post>>,
    /// Set when the post is the one currently viewed
    pub current: Option<Post>,
}

#[derive(Debug, Default)]
struct PostState {
    posts: EntityList<Post>,
    current: Option<Post>,
    categories: Vec<String>,
    tags: Vec<String>,
    pagination: Pagination,
    filters: PostFilters,
    loading: bool,
    error: Option<String>,
    errors: HashMap<String, String>,
    ledger: OptimisticLedger<String, PostSnapshot>,
}

impl PostState {
    fn restored(persisted: PersistedPosts) -> Self {
        Self {
            posts: EntityList::new(persisted.posts),
            categories: persisted.categories,
            tags: persisted.tags,
            pagination: persisted.pagination,
            filters: persisted.filters,
            ..Self::default()
        }
    }

    fn persisted(&self) -> PersistedPosts {
        PersistedPosts {
            posts: self.posts.to_vec(),
            categories: self.categories.clone(),
            tags: self.tags.clone(),
            pagination: self.pagination.clone(),
            filters: self.filters.clone(),
        }
    }

    fn is_current(&self, id: &str) -> bool {
        self.current.as_ref().is_some_and(|post| post.id == id)
    }

    fn capture(&self, id: &str) -> PostSnapshot {
        PostSnapshot {
            listed: self.posts.snapshot(id),
            current: self.current.clone().filter(|post| post.id == id),
        }
    }

    fn restore(&mut self, id: &str, snapshot: PostSnapshot) {
        self.posts.restore(id, snapshot.listed);
        let is_current = self.is_current(id);
        match snapshot.current {
            Some(post) if is_current || self.current.is_none() => self.current = Some(post),
            None if is_current => self.current = None,
            _ => {}
        }
    }

    /// Server copy of a post placed where the entity sits in `base`
    fn canonical(&self, base: &PostSnapshot, post: &Post) -> PostSnapshot {
        PostSnapshot {
            listed: base.listed.as_ref().map(|slot| Slot {
                index: slot.index,
                value: post.clone(),
            }),
            current: self.is_current(&post.id).then(|| post.clone()),
        }
    }

    /// Put a fetched post everywhere it is shown
    fn store_post(&mut self, post: &Post) {
        if let Some(listed) = self.posts.get_mut(&post.id) {
            *listed = post.clone();
        }
        if self.is_current(&post.id) {
            self.current = Some(post.clone());
        }
    }
}

pub struct PostStore {
    service: PostService,
    storage: Arc<dyn Storage>,
    state: RwLock<PostState>,
}

impl PostStore {
    /// Create the store, restoring the persisted subset if present
    pub fn new(service: PostService, storage: Arc<dyn Storage>) -> Self {
        let persisted: PersistedPosts =
            load_json(storage.as_ref(), STORAGE_KEY).unwrap_or_default();
        Self {
            service,
            storage,
            state: RwLock::new(PostState::restored(persisted)),
        }
    }

    pub async fn posts(&self) -> Vec<Post> {
        self.state.read().await.posts.to_vec()
    }

    pub async fn post(&self, id: &str) -> Option<Post> {
        let state = self.state.read().await;
        state
            .posts
            .get(id)
            .cloned()
            .or_else(|| state.current.clone().filter(|post| post.id == id))
    }

    pub async fn current_post(&self) -> Option<Post> {
        self.state.read().await.current.clone()
    }

    pub async fn categories(&self) -> Vec<String> {
        self.state.read().await.categories.clone()
    }

    pub async fn tags(&self) -> Vec<String> {
        self.state.read().await.tags.clone()
    }

    pub async fn pagination(&self) -> Pagination {
        self.state.read().await.pagination.clone()
    }

    pub async fn filters(&self) -> PostFilters {
        self.state.read().await.filters.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    /// Error of the last list or fetch action
    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Error of the last failed mutation of post `id`
    pub async fn entity_error(&self, id: &str) -> Option<String> {
        self.state.read().await.errors.get(id).cloned()
    }

    /// Whether a mutation of post `id` is in flight
    pub async fn is_pending(&self, id: &str) -> bool {
        self.state.read().await.ledger.is_pending(&id.to_string())
    }

    pub async fn clear_errors(&self) {
        let mut state = self.state.write().await;
        state.error = None;
        state.errors.clear();
    }

    /// Load a page of posts using the current filters
    pub async fn fetch_posts(&self, page: u32) -> Result<PostPage, StoreError> {
        let query = {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
            PostQuery {
                page: Some(page.max(1)),
                limit: Some(state.pagination.limit),
                filters: state.filters.clone(),
            }
        };

        let envelope = self.service.list(&query).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match unwrap_data(envelope) {
            Ok(page) => {
                state.posts.replace_all(page.posts.clone());
                state.pagination = page.pagination.clone();
                persist(self.storage.as_ref(), STORAGE_KEY, &state.persisted());
                tracing::debug!("[STORE] Loaded {} post(s)", page.posts.len());
                Ok(page)
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Replace the filters and reload from the first page
    pub async fn set_filters(&self, filters: PostFilters) -> Result<PostPage, StoreError> {
        {
            let mut state = self.state.write().await;
            state.filters = filters;
            state.pagination.page = 1;
            persist(self.storage.as_ref(), STORAGE_KEY, &state.persisted());
        }
        self.fetch_posts(1).await
    }

    pub async fn fetch_post(&self, id: &str) -> Result<Post, StoreError> {
        let envelope = self.service.get(id).await;
        self.finish_fetch(envelope).await
    }

    pub async fn fetch_post_by_slug(&self, slug: &str) -> Result<Post, StoreError> {
        let envelope = self.service.get_by_slug(slug).await;
        self.finish_fetch(envelope).await
    }

    async fn finish_fetch(&self, envelope: ApiEnvelope<Post>) -> Result<Post, StoreError> {
        let mut state = self.state.write().await;
        match unwrap_data(envelope) {
            Ok(post) => {
                state.current = Some(post.clone());
                state.store_post(&post);
                state.error = None;
                Ok(post)
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn fetch_categories(&self) -> Result<Vec<String>, StoreError> {
        let categories = unwrap_data(self.service.categories().await)?;
        let mut state = self.state.write().await;
        state.categories = categories.clone();
        persist(self.storage.as_ref(), STORAGE_KEY, &state.persisted());
        Ok(categories)
    }

    pub async fn fetch_tags(&self) -> Result<Vec<String>, StoreError> {
        let tags = unwrap_data(self.service.tags().await)?;
        let mut state = self.state.write().await;
        state.tags = tags.clone();
        persist(self.storage.as_ref(), STORAGE_KEY, &state.persisted());
        Ok(tags)
    }

    /// Create a post; it is listed first once the server has accepted it
    pub async fn create_post(&self, draft: &PostDraft) -> Result<Post, StoreError> {
        let post = unwrap_data(self.service.create(draft).await);
        let mut state = self.state.write().await;
        match post {
            Ok(post) => {
                state.posts.insert_front(post.clone());
                state.pagination.total += 1;
                state.current = Some(post.clone());
                persist(self.storage.as_ref(), STORAGE_KEY, &state.persisted());
                tracing::info!("[STORE] Created post {}", post.id);
                Ok(post)
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Optimistically patch post `id`, then reconcile with the server copy
    pub async fn update_post(&self, id: &str, update: PostUpdate) -> Result<Post, StoreError> {
        let (ticket, base, applied) = {
            let mut state = self.state.write().await;
            let base = state.capture(id);
            if base.listed.is_none() && base.current.is_none() {
                return Err(not_found(id));
            }
            if let Some(post) = state.posts.get_mut(id) {
                update.apply_to(post);
            }
            if let Some(post) = state.current.as_mut().filter(|post| post.id == id) {
                update.apply_to(post);
            }
            state.errors.remove(id);
            let applied = state.capture(id);
            let ticket = state.ledger.begin(id.to_string(), base.clone());
            (ticket, base, applied)
        };

        let envelope = self.service.update(id, &update).await;

        let mut state = self.state.write().await;
        match envelope.into_result() {
            Ok(data) => {
                let canonical = match &data {
                    Some(post) => state.canonical(&base, post),
                    None => applied.clone(),
                };
                if let Some(snapshot) = state.ledger.confirm(&ticket, canonical).into_value() {
                    state.restore(id, snapshot);
                }
                persist(self.storage.as_ref(), STORAGE_KEY, &state.persisted());
                data.or_else(|| applied.listed.map(|slot| slot.value))
                    .or(applied.current)
                    .ok_or_else(|| not_found(id))
            }
            Err(message) => {
                tracing::warn!("[STORE] Update of post {} failed, rolling back: {}", id, message);
                if let Some(snapshot) = state.ledger.fail(&ticket).into_value() {
                    state.restore(id, snapshot);
                }
                state.errors.insert(id.to_string(), message.clone());
                Err(StoreError::Rejected(message))
            }
        }
    }

    /// Optimistically remove post `id`
    pub async fn delete_post(&self, id: &str) -> Result<(), StoreError> {
        let ticket = {
            let mut state = self.state.write().await;
            let base = state.capture(id);
            if base.listed.is_none() && base.current.is_none() {
                return Err(not_found(id));
            }
            state.restore(
                id,
                PostSnapshot {
                    listed: None,
                    current: None,
                },
            );
            state.pagination.total = state.pagination.total.saturating_sub(1);
            state.errors.remove(id);
            state.ledger.begin(id.to_string(), base)
        };

        let envelope = self.service.delete(id).await;

        let mut state = self.state.write().await;
        match envelope.into_result() {
            Ok(_) => {
                let gone = PostSnapshot {
                    listed: None,
                    current: None,
                };
                if let Some(snapshot) = state.ledger.confirm(&ticket, gone).into_value() {
                    state.restore(id, snapshot);
                }
                persist(self.storage.as_ref(), STORAGE_KEY, &state.persisted());
                tracing::info!("[STORE] Deleted post {}", id);
                Ok(())
            }
            Err(message) => {
                tracing::warn!("[STORE] Delete of post {} failed, rolling back: {}", id, message);
                if let Some(snapshot) = state.ledger.fail(&ticket).into_value() {
                    if snapshot.listed.is_some() {
                        state.pagination.total += 1;
                    }
                    state.restore(id, snapshot);
                }
                state.errors.insert(id.to_string(), message.clone());
                Err(StoreError::Rejected(message))
            }
        }
    }

    pub async fn upload_media(&self, id: &str, files: Vec<MultipartPart>) -> Result<Post, StoreError> {
        let result = unwrap_data(self.service.upload_media(id, files).await);
        let mut state = self.state.write().await;
        match result {
            Ok(post) => {
                state.store_post(&post);
                persist(self.storage.as_ref(), STORAGE_KEY, &state.persisted());
                Ok(post)
            }
            Err(e) => {
                state.errors.insert(id.to_string(), e.to_string());
                Err(e)
            }
        }
    }

    /// Drop all state, persisted and in memory
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        *state = PostState::default();
        if let Err(e) = self.storage.remove(STORAGE_KEY) {
            tracing::warn!("[STORE] Failed to clear persisted posts: {}", e);
        }
    }
}

fn not_found(id: &str) -> StoreError {
    StoreError::NotFound {
        kind: "post",
        id: id.to_string(),
    }
}

/// Payload of a successful envelope; a success without data is a rejection here
pub(crate) fn unwrap_data<T>(envelope: ApiEnvelope<T>) -> Result<T, StoreError> {
    match envelope.into_result() {
        Ok(Some(data)) => Ok(data),
        Ok(None) => Err(StoreError::Rejected("Response carried no data".to_string())),
        Err(message) => Err(StoreError::Rejected(message)),
    }
}
