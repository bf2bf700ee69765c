//! Reader/writer locks keyed by [`ResourceId`].
//!
//! ## Fairness
//!
//! ```text
//!   readers: R R R        writer W arrives → waiting_writers = 1
//!                         new readers block until W has run
//!   W acquires once readers drain, releases → everyone re-checks
//! ```
//!
//! Identity is the `(namespace, name)` pair, never the in-memory library,
//! so two handles on the same logical resource contend for one lock.

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use uuid::Uuid;

use crate::base::ResourceId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockMode {
    Read,
    Write,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LockMode::Read => "read",
            LockMode::Write => "write",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// The lock was not granted within the timeout.
    #[error("timed out after {waited:?} waiting for {mode} lock on {resource}")]
    Timeout {
        resource: ResourceId,
        mode: LockMode,
        waited: Duration,
    },
}

impl LockError {
    pub fn timeout(resource: &ResourceId, mode: LockMode, waited: Duration) -> Self {
        Self::Timeout {
            resource: resource.clone(),
            mode,
            waited,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// ============================================================================
// GUARD
// ============================================================================

/// A held lock. Dropping it releases the lock.
pub struct LockGuard<'a> {
    resource: ResourceId,
    mode: LockMode,
    token: Uuid,
    release: Option<Box<dyn FnOnce() + Send + 'a>>,
}

impl<'a> LockGuard<'a> {
    /// Build a guard whose `release` runs exactly once, on drop.
    pub fn new(resource: ResourceId, mode: LockMode, token: Uuid, release: impl FnOnce() + Send + 'a) -> Self {
        Self {
            resource,
            mode,
            token,
            release: Some(Box::new(release)),
        }
    }

    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    pub fn token(&self) -> Uuid {
        self.token
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for LockGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("resource", &self.resource)
            .field("mode", &self.mode)
            .field("token", &self.token)
            .finish()
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Grants shared and exclusive access to resources.
pub trait LockRegistry: Send + Sync {
    /// Block until a shared lock is granted or `timeout` elapses.
    fn acquire_read(&self, resource: &ResourceId, timeout: Duration) -> Result<LockGuard<'_>, LockError>;

    /// Block until an exclusive lock is granted or `timeout` elapses.
    fn acquire_write(&self, resource: &ResourceId, timeout: Duration) -> Result<LockGuard<'_>, LockError>;
}

#[derive(Debug, Default)]
struct ResourceState {
    readers: FxHashSet<Uuid>,
    writer: Option<Uuid>,
    waiting_writers: usize,
}

impl ResourceState {
    fn is_idle(&self) -> bool {
        self.readers.is_empty() && self.writer.is_none() && self.waiting_writers == 0
    }
}

/// In-process [`LockRegistry`] with writer preference.
#[derive(Default)]
pub struct ResourceLockRegistry {
    state: Mutex<FxHashMap<ResourceId, ResourceState>>,
    changed: Condvar,
}

impl ResourceLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anyone currently holds or waits for `resource`.
    pub fn is_locked(&self, resource: &ResourceId) -> bool {
        self.state.lock().get(resource).is_some_and(|s| !s.is_idle())
    }

    fn release(&self, resource: &ResourceId, token: Uuid) {
        let mut state = self.state.lock();
        if let Some(entry) = state.get_mut(resource) {
            if entry.writer == Some(token) {
                entry.writer = None;
            } else {
                entry.readers.remove(&token);
            }
            if entry.is_idle() {
                state.remove(resource);
            }
        }
        tracing::trace!("[LOCK] released {}", resource);
        self.changed.notify_all();
    }

    fn guard(&self, resource: &ResourceId, mode: LockMode, token: Uuid) -> LockGuard<'_> {
        let owned = resource.clone();
        LockGuard::new(resource.clone(), mode, token, move || self.release(&owned, token))
    }
}

impl LockRegistry for ResourceLockRegistry {
    fn acquire_read(&self, resource: &ResourceId, timeout: Duration) -> Result<LockGuard<'_>, LockError> {
        let started = Instant::now();
        let deadline = started + timeout;
        let token = Uuid::new_v4();
        let mut state = self.state.lock();
        loop {
            let entry = state.entry(resource.clone()).or_default();
            if entry.writer.is_none() && entry.waiting_writers == 0 {
                entry.readers.insert(token);
                break;
            }
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                let entry = state.entry(resource.clone()).or_default();
                if entry.writer.is_none() && entry.waiting_writers == 0 {
                    entry.readers.insert(token);
                    break;
                }
                if entry.is_idle() {
                    state.remove(resource);
                }
                tracing::warn!("[LOCK] read lock on {} timed out after {:?}", resource, timeout);
                return Err(LockError::timeout(resource, LockMode::Read, started.elapsed()));
            }
        }
        drop(state);
        tracing::trace!("[LOCK] read {} granted", resource);
        Ok(self.guard(resource, LockMode::Read, token))
    }

    fn acquire_write(&self, resource: &ResourceId, timeout: Duration) -> Result<LockGuard<'_>, LockError> {
        let started = Instant::now();
        let deadline = started + timeout;
        let token = Uuid::new_v4();
        let mut state = self.state.lock();
        state.entry(resource.clone()).or_default().waiting_writers += 1;
        loop {
            let entry = state.entry(resource.clone()).or_default();
            if entry.writer.is_none() && entry.readers.is_empty() {
                entry.waiting_writers -= 1;
                entry.writer = Some(token);
                break;
            }
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                let entry = state.entry(resource.clone()).or_default();
                entry.waiting_writers -= 1;
                if entry.writer.is_none() && entry.readers.is_empty() {
                    entry.writer = Some(token);
                    break;
                }
                if entry.is_idle() {
                    state.remove(resource);
                }
                // Readers queued behind this writer may proceed now.
                self.changed.notify_all();
                tracing::warn!("[LOCK] write lock on {} timed out after {:?}", resource, timeout);
                return Err(LockError::timeout(resource, LockMode::Write, started.elapsed()));
            }
        }
        drop(state);
        tracing::trace!("[LOCK] write {} granted", resource);
        Ok(self.guard(resource, LockMode::Write, token))
    }
}

impl fmt::Debug for ResourceLockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLockRegistry")
            .field("resources", &self.state.lock().len())
            .finish()
    }
}
