#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Keyed resource pool shared by every entity of a running game.
//!
//! Expensive objects (meshes, textures, effects) are requested by a string key
//! and constructed lazily by a caller-supplied factory. Repeat requesters get
//! the same [`Arc`] back while the pool counts acquisitions explicitly; the
//! last [`ResourcePool::release`] runs the object's [`Poolable::release_native`]
//! hook.
//!
//! The pool only observes its objects through [`Weak`] references. If every
//! strong handle disappears without the matching releases, the next
//! acquisition transparently constructs a replacement ("resurrection") and
//! logs the lost reference count as a leak.
//!
//! All operations serialise on one mutex. Factories run while that mutex is
//! held, so a factory must never call back into the same pool.

use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
    convert::Infallible,
    error::Error as StdError,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use log::{debug, warn};
use thiserror::Error;

/// Objects that can live in a [`ResourcePool`].
///
/// Implementors holding native resources override
/// [`release_native`](Poolable::release_native); everything else relies on the
/// default no-op and is simply dropped once the last handle goes away.
pub trait Poolable: Any + Send + Sync {
    /// Frees native resources once the pool considers the object dead.
    ///
    /// Called at most once per constructed object, while the pool lock is held.
    fn release_native(&self) {}
}

/// Failures reported by [`ResourcePool`] operations.
///
/// Every variant except [`PoolError::Construction`] is a caller bug.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No entry exists for the key.
    #[error("resource `{key}` does not exist in the pool")]
    UnknownKey {
        /// Requested key.
        key: String,
    },
    /// The key already serves a different resource type.
    #[error("resource `{key}` is a {existing}, but a {requested} was requested")]
    TypeConflict {
        /// Requested key.
        key: String,
        /// Type recorded when the entry was first constructed.
        existing: &'static str,
        /// Type the caller asked for.
        requested: &'static str,
    },
    /// The handle passed to release is not the object tracked under the key.
    #[error("handle does not match the object pooled as `{key}`")]
    HandleMismatch {
        /// Key passed to release.
        key: String,
    },
    /// Release was called more often than acquire.
    #[error("resource `{key}` has no outstanding references to release")]
    NotAcquired {
        /// Key passed to release.
        key: String,
    },
    /// The factory failed to construct the resource.
    #[error("failed to construct resource `{key}`")]
    Construction {
        /// Requested key.
        key: String,
        /// Error returned by the factory.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// The pool was already shut down.
    #[error("resource `{key}` requested after the pool was shut down")]
    ShutDown {
        /// Requested key.
        key: String,
    },
}

/// How a leaked entry was detected during [`ResourcePool::shutdown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeakKind {
    /// The object was still alive and was disposed forcibly.
    StillReferenced,
    /// The object had already vanished, so its disposal hook never ran.
    ReclaimedWhileReferenced,
}

/// An entry whose acquisitions were not balanced by releases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leak {
    /// Key of the leaked entry.
    pub key: String,
    /// Type recorded for the entry.
    pub type_name: &'static str,
    /// Outstanding reference count at shutdown.
    pub reference_count: u32,
    /// How the leak was detected.
    pub kind: LeakKind,
}

/// Outcome of [`ResourcePool::shutdown`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Keys whose objects were disposed by the shutdown, sorted.
    pub disposed: Vec<String>,
    /// Entries with unbalanced reference counts, sorted by key.
    pub leaks: Vec<Leak>,
}

/// Diagnostic view of a single pool entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryStats {
    /// Outstanding acquisitions.
    pub reference_count: u32,
    /// Number of times the object was reconstructed after it died.
    pub resurrection_count: u32,
    /// Type recorded when the entry was first constructed.
    pub type_name: &'static str,
    /// Whether the pool still considers the tracked object usable.
    pub alive: bool,
}

struct PoolEntry {
    object: Weak<dyn Any + Send + Sync>,
    disposer: Weak<dyn Poolable>,
    type_id: TypeId,
    type_name: &'static str,
    reference_count: u32,
    resurrection_count: u32,
    disposed: bool,
}

impl PoolEntry {
    fn new<T: Poolable>(object: &Arc<T>) -> Self {
        let (weak_object, disposer) = observe(object);
        Self {
            object: weak_object,
            disposer,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            reference_count: 1,
            resurrection_count: 0,
            disposed: false,
        }
    }

    fn live_object(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        if self.disposed {
            return None;
        }
        self.object.upgrade()
    }

    fn resurrect<T: Poolable>(&mut self, object: &Arc<T>) {
        debug_assert_eq!(self.type_id, TypeId::of::<T>());
        let (weak_object, disposer) = observe(object);
        self.object = weak_object;
        self.disposer = disposer;
        self.reference_count = 1;
        self.resurrection_count = self.resurrection_count.saturating_add(1);
        self.disposed = false;
    }

    fn holds<T: Poolable>(&self, handle: &Arc<T>) -> bool {
        self.object.as_ptr() as *const () == Arc::as_ptr(handle) as *const ()
    }

    fn dispose(&mut self) {
        debug_assert!(!self.disposed);
        if let Some(disposer) = self.disposer.upgrade() {
            disposer.release_native();
        }
        self.disposed = true;
    }

    fn check_type<T: Poolable>(&self, key: &str) -> Result<(), PoolError> {
        if self.type_id == TypeId::of::<T>() {
            Ok(())
        } else {
            Err(PoolError::TypeConflict {
                key: key.to_owned(),
                existing: self.type_name,
                requested: type_name::<T>(),
            })
        }
    }
}

fn observe<T: Poolable>(object: &Arc<T>) -> (Weak<dyn Any + Send + Sync>, Weak<dyn Poolable>) {
    let as_any: Arc<dyn Any + Send + Sync> = object.clone();
    let as_poolable: Arc<dyn Poolable> = object.clone();
    (Arc::downgrade(&as_any), Arc::downgrade(&as_poolable))
}

#[derive(Default)]
struct PoolState {
    entries: HashMap<String, PoolEntry>,
    shut_down: bool,
}

/// Process-wide cache deduplicating resources by string key.
#[derive(Default)]
pub struct ResourcePool {
    state: Mutex<PoolState>,
}

impl std::fmt::Debug for ResourcePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ResourcePool")
            .field("entries", &state.entries.len())
            .field("shut_down", &state.shut_down)
            .finish()
    }
}

impl ResourcePool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the object pooled under `key`, constructing it with `factory`
    /// when no live object exists.
    ///
    /// The factory runs under the pool lock and must not call back into this
    /// pool.
    pub fn acquire<T, F>(&self, key: &str, factory: F) -> Result<Arc<T>, PoolError>
    where
        T: Poolable,
        F: FnOnce() -> T,
    {
        self.try_acquire(key, || Ok::<T, Infallible>(factory()))
    }

    /// Like [`acquire`](Self::acquire) for factories that can fail, such as
    /// content loaders. A failed construction leaves the pool unchanged.
    pub fn try_acquire<T, E, F>(&self, key: &str, factory: F) -> Result<Arc<T>, PoolError>
    where
        T: Poolable,
        E: Into<Box<dyn StdError + Send + Sync>>,
        F: FnOnce() -> Result<T, E>,
    {
        let mut state = self.lock();
        if state.shut_down {
            return Err(PoolError::ShutDown {
                key: key.to_owned(),
            });
        }

        let entries = &mut state.entries;
        let Some(entry) = entries.get_mut(key) else {
            let object = Arc::new(construct(key, factory)?);
            let _ = entries.insert(key.to_owned(), PoolEntry::new(&object));
            return Ok(object);
        };

        entry.check_type::<T>(key)?;

        if let Some(live) = entry.live_object() {
            let object = live
                .downcast::<T>()
                .map_err(|_| PoolError::TypeConflict {
                    key: key.to_owned(),
                    existing: entry.type_name,
                    requested: type_name::<T>(),
                })?;
            entry.reference_count = entry.reference_count.saturating_add(1);
            return Ok(object);
        }

        if !entry.disposed && entry.reference_count > 0 {
            warn!(
                "reference count leak: `{key}` ({}) was reclaimed with {} outstanding references",
                entry.type_name, entry.reference_count
            );
        }
        debug!("`{key}` ({}) is gone, recreating", entry.type_name);

        let object = Arc::new(construct(key, factory)?);
        entry.resurrect(&object);
        Ok(object)
    }

    /// Gives back one acquisition of `handle` under `key`.
    ///
    /// Disposes the object when the count reaches zero. The object itself may
    /// outlive the disposal while other strong handles exist, but the pool
    /// treats it as dead from then on.
    pub fn release<T: Poolable>(&self, key: &str, handle: &Arc<T>) -> Result<(), PoolError> {
        let mut state = self.lock();
        let entry = state
            .entries
            .get_mut(key)
            .ok_or_else(|| PoolError::UnknownKey {
                key: key.to_owned(),
            })?;

        if entry.reference_count == 0 {
            return Err(PoolError::NotAcquired {
                key: key.to_owned(),
            });
        }
        if !entry.holds(handle) {
            return Err(PoolError::HandleMismatch {
                key: key.to_owned(),
            });
        }

        entry.reference_count -= 1;
        if entry.reference_count == 0 {
            debug!("disposing `{key}` ({})", entry.type_name);
            entry.dispose();
        }
        Ok(())
    }

    /// Disposes every object still alive and reports unbalanced entries.
    ///
    /// Leaks are logged, never returned as errors. Calling this more than once
    /// yields an empty report, and later acquisitions fail with
    /// [`PoolError::ShutDown`].
    pub fn shutdown(&self) -> ShutdownReport {
        let mut state = self.lock();
        let mut report = ShutdownReport::default();
        if state.shut_down {
            return report;
        }
        state.shut_down = true;

        let mut entries: Vec<(&String, &mut PoolEntry)> = state.entries.iter_mut().collect();
        entries.sort_by(|left, right| left.0.cmp(right.0));

        for (key, entry) in entries {
            if entry.disposed {
                continue;
            }

            if entry.disposer.upgrade().is_some() {
                if entry.reference_count > 0 {
                    warn!(
                        "resource leak: disposing `{key}` ({}) with reference count {}",
                        entry.type_name, entry.reference_count
                    );
                    report.leaks.push(Leak {
                        key: key.clone(),
                        type_name: entry.type_name,
                        reference_count: entry.reference_count,
                        kind: LeakKind::StillReferenced,
                    });
                }
                entry.dispose();
                report.disposed.push(key.clone());
            } else if entry.reference_count > 0 {
                warn!(
                    "reference count leak: `{key}` ({}) was reclaimed with reference count {}",
                    entry.type_name, entry.reference_count
                );
                report.leaks.push(Leak {
                    key: key.clone(),
                    type_name: entry.type_name,
                    reference_count: entry.reference_count,
                    kind: LeakKind::ReclaimedWhileReferenced,
                });
            }
        }

        state.entries.clear();
        report
    }

    /// Diagnostic snapshot of the entry stored under `key`.
    #[must_use]
    pub fn stats(&self, key: &str) -> Option<EntryStats> {
        let state = self.lock();
        state.entries.get(key).map(|entry| EntryStats {
            reference_count: entry.reference_count,
            resurrection_count: entry.resurrection_count,
            type_name: entry.type_name,
            alive: entry.live_object().is_some(),
        })
    }

    /// Number of keys tracked by the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Reports whether the pool tracks no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ResourcePool {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn construct<T, E, F>(key: &str, factory: F) -> Result<T, PoolError>
where
    E: Into<Box<dyn StdError + Send + Sync>>,
    F: FnOnce() -> Result<T, E>,
{
    factory().map_err(|error| PoolError::Construction {
        key: key.to_owned(),
        source: error.into(),
    })
}
