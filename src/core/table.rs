//! # Cache table: key → handle of the key's live actor.
//!
//! The table is the only structure shared between concurrent `get` calls and
//! key actors. Every mutation is a single atomic map operation:
//! - `acquire` → insert-if-absent through the `DashMap` entry API
//! - `remove`  → delete only if the entry still holds the given handle id
//!
//! ## Architecture
//! ```text
//! Cache::get ──► Table::acquire(key)
//!                  ├─ Occupied → clone Handle (request sender)
//!                  └─ Vacant   → new mailbox, insert Handle, caller spawns KeyActor
//!
//! KeyActor retire ──► Table::remove(key, own id) ──► close mailbox
//! Cache::get on a closed handle ──► Table::remove(key, stale id) ──► retry
//! ```
//!
//! ## Rules
//! - An entry exists iff its actor is alive (the actor removes its own entry last).
//! - Removal is conditional on the handle id, so a late remover can never
//!   delete the entry of a successor actor.
//! - No shard lock is held across an `.await`.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{mpsc, oneshot};

use crate::error::RefreshError;

/// Global handle id counter; ids are never reused.
static HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Outcome currently held by a key actor.
pub(crate) type Outcome<V> = Result<V, RefreshError>;

/// One caller waiting for a hand-off.
pub(crate) struct Request<V> {
    reply: oneshot::Sender<Outcome<V>>,
}

impl<V> Request<V> {
    /// Hands `outcome` to the waiting caller.
    ///
    /// Returns `false` if the caller already gave up (its request token fired),
    /// in which case nothing was consumed.
    pub(crate) fn fulfil(self, outcome: Outcome<V>) -> bool {
        self.reply.send(outcome).is_ok()
    }
}

/// Handle to a running key actor.
pub(crate) struct Handle<V> {
    /// Unique id of the actor behind this handle.
    id: u64,
    /// Mailbox of the actor.
    tx: mpsc::Sender<Request<V>>,
}

impl<V> Clone for Handle<V> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            tx: self.tx.clone(),
        }
    }
}

impl<V> Handle<V> {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Rendezvous with the actor.
    ///
    /// Returns `None` when the actor retired before handing anything over.
    pub(crate) async fn request(&self) -> Option<Outcome<V>> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Request { reply }).await.ok()?;
        rx.await.ok()
    }
}

/// Concurrent map of live key actors.
pub(crate) struct Table<K, V> {
    entries: DashMap<K, Handle<V>>,
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Looks up the handle for `key`, inserting a fresh one if absent.
    ///
    /// When this call created the entry, the receiving half of the new mailbox
    /// is returned and the caller must start the actor that owns it.
    pub(crate) fn acquire(
        &self,
        key: &K,
        mailbox_capacity: usize,
    ) -> (Handle<V>, Option<mpsc::Receiver<Request<V>>>) {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(occupied) => (occupied.get().clone(), None),
            Entry::Vacant(vacant) => {
                let (tx, rx) = mpsc::channel(mailbox_capacity.max(1));
                let handle = Handle {
                    id: HANDLE_ID.fetch_add(1, Ordering::Relaxed),
                    tx,
                };
                vacant.insert(handle.clone());
                (handle, Some(rx))
            }
        }
    }

    /// Removes the entry for `key` if it still belongs to actor `id`.
    ///
    /// Idempotent: racing removers are harmless. Returns `true` if this call removed it.
    pub(crate) fn remove(&self, key: &K, id: u64) -> bool {
        self.entries.remove_if(key, |_, h| h.id == id).is_some()
    }

    pub(crate) fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn keys(&self) -> Vec<K> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }
}
