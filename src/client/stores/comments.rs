//! Comment Store
//!
//! Comments grouped by post. New comments appear once the server has created them;
//! edits and deletions are optimistic.

use crate::client::services::CommentService;
use crate::client::stores::optimistic::{EntityList, OptimisticLedger, Slot};
use crate::client::stores::posts::unwrap_data;
use crate::client::stores::StoreError;
use crate::shared::models::{Comment, CommentUpdate, NewComment};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct CommentState {
    by_post: HashMap<String, EntityList<Comment>>,
    loading: HashSet<String>,
    error: Option<String>,
    errors: HashMap<String, String>,
    ledger: OptimisticLedger<String, Option<Slot<Comment>>>,
}

impl CommentState {
    fn list_mut(&mut self, post_id: &str) -> &mut EntityList<Comment> {
        self.by_post.entry(post_id.to_string()).or_default()
    }

    fn capture(&self, post_id: &str, id: &str) -> Option<Slot<Comment>> {
        self.by_post.get(post_id).and_then(|list| list.snapshot(id))
    }
}

pub struct CommentStore {
    service: CommentService,
    state: RwLock<CommentState>,
}

impl CommentStore {
    pub fn new(service: CommentService) -> Self {
        Self {
            service,
            state: RwLock::new(CommentState::default()),
        }
    }

    pub async fn comments(&self, post_id: &str) -> Vec<Comment> {
        let state = self.state.read().await;
        state
            .by_post
            .get(post_id)
            .map(EntityList::to_vec)
            .unwrap_or_default()
    }

    /// Replies to `parent_id`, in list order
    pub async fn replies(&self, post_id: &str, parent_id: &str) -> Vec<Comment> {
        self.comments(post_id)
            .await
            .into_iter()
            .filter(|comment| comment.parent_id.as_deref() == Some(parent_id))
            .collect()
    }

    pub async fn comment(&self, post_id: &str, id: &str) -> Option<Comment> {
        let state = self.state.read().await;
        state.by_post.get(post_id)?.get(id).cloned()
    }

    pub async fn is_loading(&self, post_id: &str) -> bool {
        self.state.read().await.loading.contains(post_id)
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn entity_error(&self, id: &str) -> Option<String> {
        self.state.read().await.errors.get(id).cloned()
    }

    pub async fn is_pending(&self, id: &str) -> bool {
        self.state.read().await.ledger.is_pending(&id.to_string())
    }

    pub async fn fetch_comments(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        {
            let mut state = self.state.write().await;
            state.loading.insert(post_id.to_string());
            state.error = None;
        }

        let result = unwrap_data(self.service.for_post(post_id).await);

        let mut state = self.state.write().await;
        state.loading.remove(post_id);
        match result {
            Ok(comments) => {
                state.list_mut(post_id).replace_all(comments.clone());
                Ok(comments)
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn create_comment(&self, comment: &NewComment) -> Result<Comment, StoreError> {
        let result = unwrap_data(self.service.create(comment).await);
        let mut state = self.state.write().await;
        match result {
            Ok(created) => {
                state.list_mut(&comment.post_id).push(created.clone());
                Ok(created)
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn update_comment(
        &self,
        post_id: &str,
        id: &str,
        update: CommentUpdate,
    ) -> Result<Comment, StoreError> {
        let (ticket, base, applied) = {
            let mut state = self.state.write().await;
            let Some(base) = state.capture(post_id, id) else {
                return Err(not_found(id));
            };
            let mut applied = base.clone();
            update.apply_to(&mut applied.value);
            state.list_mut(post_id).restore(id, Some(applied.clone()));
            state.errors.remove(id);
            let ticket = state.ledger.begin(id.to_string(), Some(base.clone()));
            (ticket, base, applied)
        };

        let envelope = self.service.update(id, &update).await;

        let mut state = self.state.write().await;
        match envelope.into_result() {
            Ok(data) => {
                let confirmed = data.unwrap_or(applied.value);
                let canonical = Slot {
                    index: base.index,
                    value: confirmed.clone(),
                };
                if let Some(snapshot) = state.ledger.confirm(&ticket, Some(canonical)).into_value() {
                    state.list_mut(post_id).restore(id, snapshot);
                }
                Ok(confirmed)
            }
            Err(message) => {
                tracing::warn!("[STORE] Update of comment {} failed, rolling back: {}", id, message);
                if let Some(snapshot) = state.ledger.fail(&ticket).into_value() {
                    state.list_mut(post_id).restore(id, snapshot);
                }
                state.errors.insert(id.to_string(), message.clone());
                Err(StoreError::Rejected(message))
            }
        }
    }

    pub async fn delete_comment(&self, post_id: &str, id: &str) -> Result<(), StoreError> {
        let ticket = {
            let mut state = self.state.write().await;
            let Some(base) = state.capture(post_id, id) else {
                return Err(not_found(id));
            };
            state.list_mut(post_id).remove(id);
            state.errors.remove(id);
            state.ledger.begin(id.to_string(), Some(base))
        };

        let envelope = self.service.delete(id).await;

        let mut state = self.state.write().await;
        match envelope.into_result() {
            Ok(_) => {
                if let Some(snapshot) = state.ledger.confirm(&ticket, None).into_value() {
                    state.list_mut(post_id).restore(id, snapshot);
                }
                Ok(())
            }
            Err(message) => {
                tracing::warn!("[STORE] Delete of comment {} failed, rolling back: {}", id, message);
                if let Some(snapshot) = state.ledger.fail(&ticket).into_value() {
                    state.list_mut(post_id).restore(id, snapshot);
                }
                state.errors.insert(id.to_string(), message.clone());
                Err(StoreError::Rejected(message))
            }
        }
    }

    /// Forget the comments of one post
    pub async fn clear_post(&self, post_id: &str) {
        self.state.write().await.by_post.remove(post_id);
    }
}

fn not_found(id: &str) -> StoreError {
    StoreError::NotFound {
        kind: "comment",
        id: id.to_string(),
    }
}
