//! Saving libraries back to their wire dialect.
//!
//! ## Pipeline
//!
//! ```text
//! Candidate ─▶ LockAcquired ─▶ Resolved ─▶ Transformed ─▶ ChecksumComputed
//!     │              │             │             │                │
//!  read-only      timeout          │        unavailable           │
//!     ▼              ▼             ▼             ▼                ▼
//!   error          error     (findings)        error          AccessChecked ─▶ Validated ─▶ Persisted
//!                                                                   │                            │
//!                                                                 denied                       I/O
//! ```
//!
//! Read-only libraries, and libraries the handler has nowhere to write,
//! are rejected before the lock registry is touched. Resolution covers the
//! whole model, but a report only carries findings of its own library.
//! The write lock is an RAII guard, so it is released on every exit.

mod access;
mod checksum;
mod error;
mod handler;
mod lock;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use smol_str::SmolStr;

pub use access::{AccessControl, Credentials, NamespaceAccessList};
pub use checksum::{checksum, verify as verify_checksum};
pub use error::SaveError;
pub use handler::{FileSaveHandler, MemorySaveHandler, SaveHandler};
pub use lock::{LockError, LockGuard, LockMode, LockRegistry, ResourceLockRegistry};

use crate::base::Dialect;
use crate::config::EngineConfig;
use crate::diagnostics::Findings;
use crate::model::{LibraryId, LibraryKind, Model, ModelError};
use crate::resolve::ReferenceResolver;
use crate::symbols::{DerivedEntityFactory, FacetDerivationFactory, SymbolTable};
use crate::transform::TransformerRegistry;
use crate::validate::{ModelChecker, check_document};

/// Steps of one save, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SaveState {
    Candidate,
    LockAcquired,
    Resolved,
    Transformed,
    ChecksumComputed,
    AccessChecked,
    Validated,
    Persisted,
}

impl fmt::Display for SaveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome of a successful save.
#[derive(Clone, Debug)]
pub struct SaveReport {
    pub library: LibraryId,
    pub name: SmolStr,
    pub dialect: Dialect,
    /// Checksum computed for the library, also when the dialect cannot
    /// carry it in the document.
    pub checksum: Option<String>,
    /// States passed through, `Candidate` first.
    pub states: Vec<SaveState>,
    /// Resolution and validation findings. Never fatal.
    pub findings: Findings,
}

/// Outcome of [`SavePipeline::save_all`].
#[derive(Debug, Default)]
pub struct SaveBatch {
    pub saved: Vec<SaveReport>,
    pub failed: Vec<(LibraryId, SmolStr, SaveError)>,
    /// Findings of every saved library.
    pub findings: Findings,
}

impl SaveBatch {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The save pipeline and the services it runs against.
#[derive(Clone)]
pub struct SavePipeline {
    transformers: Arc<TransformerRegistry>,
    locks: Arc<dyn LockRegistry>,
    access: Arc<dyn AccessControl>,
    handler: Arc<dyn SaveHandler>,
    derivation: Arc<dyn DerivedEntityFactory>,
    lock_timeout: Duration,
    default_dialect: Dialect,
}

impl SavePipeline {
    pub fn new(
        transformers: Arc<TransformerRegistry>,
        locks: Arc<dyn LockRegistry>,
        access: Arc<dyn AccessControl>,
        handler: Arc<dyn SaveHandler>,
    ) -> Self {
        let defaults = EngineConfig::default();
        Self {
            transformers,
            locks,
            access,
            handler,
            derivation: Arc::new(FacetDerivationFactory),
            lock_timeout: defaults.lock_timeout(),
            default_dialect: defaults.default_dialect,
        }
    }

    /// Take the lock timeout and default dialect from `config`.
    ///
    /// Protected namespaces are not applied here: they belong to the
    /// [`AccessControl`] passed to [`new`](Self::new). Build it with
    /// [`NamespaceAccessList::from_config`].
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.lock_timeout = config.lock_timeout();
        self.default_dialect = config.default_dialect;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_derivation(mut self, derivation: Arc<dyn DerivedEntityFactory>) -> Self {
        self.derivation = derivation;
        self
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Save one library.
    pub fn save_library(
        &self,
        model: &mut Model,
        library: LibraryId,
        credentials: Option<&Credentials>,
    ) -> Result<SaveReport, SaveError> {
        let mut states = vec![SaveState::Candidate];
        let lib = model.library(library).ok_or(ModelError::UnknownLibrary(library))?;
        let name = lib.name.clone();
        if lib.is_read_only() {
            tracing::debug!("[SAVE] '{}' rejected: read-only", name);
            return Err(SaveError::ReadOnly(name.to_string()));
        }
        if !self.handler.can_save(lib) {
            tracing::debug!("[SAVE] '{}' rejected: no save location", name);
            return Err(SaveError::MissingLocation(name.to_string()));
        }
        let resource = lib.resource_id();
        let namespace = lib.namespace().unwrap_or_default().to_string();
        let dialect = lib.dialect.unwrap_or(self.default_dialect);
        let status = lib.status();

        let _guard = self.locks.acquire_write(&resource, self.lock_timeout)?;
        advance(&mut states, &name, SaveState::LockAcquired);

        // Resolve against the whole owning model, not only this library.
        let table = SymbolTable::build_all(model, self.derivation.as_ref());
        let ids = model.library_ids();
        let mut findings = ReferenceResolver::resolve(model, &ids, &table)?;
        findings.retain_library(&name);
        advance(&mut states, &name, SaveState::Resolved);

        let emitted = self
            .transformers
            .emit_library(model, library, dialect, Some(&table), true)?;
        findings.merge(emitted.findings);
        let mut document = emitted.document;
        advance(&mut states, &name, SaveState::Transformed);

        let protected = self.access.is_protected(&namespace);
        let needs_checksum = protected || status.is_some_and(|s| s.requires_checksum());
        let sum = if needs_checksum {
            let sum = checksum(&document)?;
            if !document.set_checksum(Some(sum.clone())) {
                tracing::debug!("[SAVE] dialect {} carries no checksum for '{}'", dialect, name);
            }
            Some(sum)
        } else {
            document.set_checksum(None);
            None
        };
        advance(&mut states, &name, SaveState::ChecksumComputed);

        if protected && !self.access.verify(&namespace, credentials) {
            tracing::warn!("[SAVE] access denied to '{}' for '{}'", namespace, name);
            return Err(SaveError::access_denied(namespace));
        }
        advance(&mut states, &name, SaveState::AccessChecked);

        let mut checker = ModelChecker::new(model);
        checker.check_library(library);
        findings.merge(checker.finish());
        findings.merge(check_document(&document));
        findings.attach_library(&name);
        advance(&mut states, &name, SaveState::Validated);

        let lib = model.library(library).ok_or(ModelError::UnknownLibrary(library))?;
        self.handler.persist(lib, &document)?;
        if let Some(lib) = model.library_mut_untracked(library) {
            lib.set_checksum(sum.clone());
        }
        advance(&mut states, &name, SaveState::Persisted);
        tracing::info!(
            "[SAVE] persisted '{}' as {} ({} findings, checksum {})",
            name,
            dialect,
            findings.len(),
            if sum.is_some() { "attached" } else { "omitted" }
        );

        Ok(SaveReport {
            library,
            name,
            dialect,
            checksum: sum,
            states,
            findings,
        })
    }

    /// Save every user library independently. A failure is recorded and
    /// the batch moves on.
    pub fn save_all(&self, model: &mut Model, credentials: Option<&Credentials>) -> SaveBatch {
        let targets: Vec<_> = model
            .libraries()
            .filter(|l| matches!(l.kind, LibraryKind::User { .. }))
            .map(|l| (l.id(), l.name.clone()))
            .collect();

        let mut batch = SaveBatch::default();
        for (id, name) in targets {
            match self.save_library(model, id, credentials) {
                Ok(report) => {
                    batch.findings.merge(report.findings.clone());
                    batch.saved.push(report);
                }
                Err(err) => {
                    tracing::debug!("[SAVE] '{}' failed: {}", name, err);
                    batch.failed.push((id, name, err));
                }
            }
        }
        tracing::debug!(
            "[SAVE] batch: {} saved, {} failed",
            batch.saved.len(),
            batch.failed.len()
        );
        batch
    }
}

fn advance(states: &mut Vec<SaveState>, library: &str, state: SaveState) {
    tracing::trace!("[SAVE] '{}' → {}", library, state);
    states.push(state);
}

impl fmt::Debug for SavePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SavePipeline")
            .field("transformers", &self.transformers)
            .field("lock_timeout", &self.lock_timeout)
            .field("default_dialect", &self.default_dialect)
            .finish_non_exhaustive()
    }
}
