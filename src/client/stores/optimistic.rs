//! # Optimistic Mutations
//!
//! Bookkeeping for speculative state changes that are confirmed or rolled back once
//! the backing request settles.
//!
//! A store applies a change to its visible state, records the snapshot taken just
//! before it with [`OptimisticLedger::begin`], and later reports the outcome with
//! [`confirm`](OptimisticLedger::confirm) or [`fail`](OptimisticLedger::fail). The
//! ledger answers with a [`Resolution`] telling the store what, if anything, to write
//! back. Stores hold the ledger under the same lock as the state it describes, so
//! every write-back is a single replacement.
//!
//! ## Ordering
//!
//! Mutations of one entity carry increasing sequence numbers. Snapshots nest in call
//! order, but outcomes may arrive in any order:
//!
//! - an outcome older than the newest confirmed mutation is [`Resolution::Stale`]
//! - while a newer mutation of the same entity is pending, the outcome only rewrites
//!   that newer mutation's snapshot ([`Resolution::Deferred`])
//! - otherwise the snapshot (failure) or canonical value (success) is applied
//!
//! A failed early mutation therefore never clobbers a later one's result.
//!
//! ## Usage
//!
//! ```rust
//! use pressroom::client::stores::optimistic::{OptimisticLedger, Resolution};
//!
//! let mut ledger: OptimisticLedger<&str, u32> = OptimisticLedger::new();
//! let ticket = ledger.begin("post-1", 10); // visible state is now speculative
//! assert!(ledger.is_pending(&"post-1"));
//! assert_eq!(ledger.fail(&ticket), Resolution::Apply(10));
//! ```

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use uuid::Uuid;

/// Handle for one in-flight mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationTicket<K> {
    pub id: Uuid,
    pub key: K,
    pub seq: u64,
    pub started_at: DateTime<Utc>,
}

/// What the store must do with an outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<V> {
    /// Replace the entity's visible state with this value
    Apply(V),
    /// A newer mutation is still in flight; visible state stays as it is
    Deferred,
    /// A newer mutation already settled successfully; ignore this outcome
    Stale,
}

impl<V> Resolution<V> {
    pub fn into_value(self) -> Option<V> {
        match self {
            Self::Apply(value) => Some(value),
            Self::Deferred | Self::Stale => None,
        }
    }
}

#[derive(Debug)]
struct EntityMutations<V> {
    /// Snapshot for each pending mutation, keyed by sequence number
    pending: BTreeMap<u64, V>,
    /// Newest sequence number confirmed by the server
    confirmed: u64,
}

impl<V> Default for EntityMutations<V> {
    fn default() -> Self {
        Self {
            pending: BTreeMap::new(),
            confirmed: 0,
        }
    }
}

/// Pending optimistic mutations of one store, keyed by entity
#[derive(Debug)]
pub struct OptimisticLedger<K, V> {
    next_seq: u64,
    entities: HashMap<K, EntityMutations<V>>,
}

impl<K, V> Default for OptimisticLedger<K, V> {
    fn default() -> Self {
        Self {
            next_seq: 0,
            entities: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> OptimisticLedger<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mutation whose speculative change has just been applied.
    ///
    /// `snapshot` is the entity state immediately before that change.
    pub fn begin(&mut self, key: K, snapshot: V) -> MutationTicket<K> {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.entities
            .entry(key.clone())
            .or_default()
            .pending
            .insert(seq, snapshot);

        MutationTicket {
            id: Uuid::new_v4(),
            key,
            seq,
            started_at: Utc::now(),
        }
    }

    /// The request behind `ticket` failed
    pub fn fail(&mut self, ticket: &MutationTicket<K>) -> Resolution<V> {
        self.settle(ticket, None)
    }

    /// The request behind `ticket` succeeded with `canonical` as the server state
    pub fn confirm(&mut self, ticket: &MutationTicket<K>, canonical: V) -> Resolution<V> {
        self.settle(ticket, Some(canonical))
    }

    fn settle(&mut self, ticket: &MutationTicket<K>, canonical: Option<V>) -> Resolution<V> {
        let Some(entity) = self.entities.get_mut(&ticket.key) else {
            return Resolution::Stale;
        };
        let Some(snapshot) = entity.pending.remove(&ticket.seq) else {
            return Resolution::Stale;
        };

        let resolution = if entity.confirmed > ticket.seq {
            Resolution::Stale
        } else {
            let succeeded = canonical.is_some();
            let value = canonical.unwrap_or(snapshot);
            if succeeded {
                entity.confirmed = ticket.seq;
            }
            match entity.pending.range_mut(ticket.seq + 1..).next() {
                Some((_, newer)) => {
                    *newer = value;
                    Resolution::Deferred
                }
                None => Resolution::Apply(value),
            }
        };

        if entity.pending.is_empty() {
            self.entities.remove(&ticket.key);
        }
        resolution
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.entities
            .get(key)
            .is_some_and(|entity| !entity.pending.is_empty())
    }

    /// Total mutations awaiting an outcome
    pub fn pending_count(&self) -> usize {
        self.entities.values().map(|entity| entity.pending.len()).sum()
    }

    /// Forget every pending mutation (e.g. when the store is reset)
    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

/// Entities addressable by a server id
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for crate::shared::models::Post {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for crate::shared::models::Comment {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for crate::shared::models::User {
    fn id(&self) -> &str {
        &self.id
    }
}

/// An entity together with its position in a list
#[derive(Debug, Clone, PartialEq)]
pub struct Slot<T> {
    pub index: usize,
    pub value: T,
}

/// Ordered entity collection supporting positional snapshots.
///
/// Snapshots are `Option<Slot<T>>`: `None` means the entity was not listed.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityList<T> {
    items: Vec<T>,
}

impl<T> Default for EntityList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Identified + Clone> EntityList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn insert_front(&mut self, item: T) {
        self.items.insert(0, item);
    }

    /// Replace an existing entry in place, or append
    pub fn upsert(&mut self, item: T) {
        match self.get_mut(item.id()) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Slot<T>> {
        let index = self.position(id)?;
        Some(Slot {
            index,
            value: self.items.remove(index),
        })
    }

    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
    }

    pub fn snapshot(&self, id: &str) -> Option<Slot<T>> {
        let index = self.position(id)?;
        Some(Slot {
            index,
            value: self.items[index].clone(),
        })
    }

    /// Put entity `id` back to exactly `snapshot`.
    ///
    /// A listed entity is replaced in place; a missing one is reinserted at its
    /// recorded index (clamped to the current length); `None` removes it.
    pub fn restore(&mut self, id: &str, snapshot: Option<Slot<T>>) {
        match snapshot {
            Some(slot) => match self.get_mut(id) {
                Some(existing) => *existing = slot.value,
                None => {
                    let index = slot.index.min(self.items.len());
                    self.items.insert(index, slot.value);
                }
            },
            None => {
                self.remove(id);
            }
        }
    }
}
