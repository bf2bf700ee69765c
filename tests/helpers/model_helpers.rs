//! Model builders and instrumented services for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use modelweave::ResourceId;
use modelweave::base::constants::XSD_NAMESPACE;
use modelweave::model::{EntityBody, EntityDef, LibraryDef, LibraryStatus, SimpleType};
use modelweave::save::{
    AccessControl, LockError, LockGuard, LockRegistry, MemorySaveHandler, NamespaceAccessList,
    ResourceLockRegistry, SaveHandler,
};
use modelweave::{Model, SavePipeline, TransformerRegistry, WireDocument};

use super::fixtures::{COMMON_V14, HOTEL_V16};

pub fn hotel_document() -> WireDocument {
    WireDocument::from_json(HOTEL_V16).expect("hotel fixture should parse")
}

pub fn common_document() -> WireDocument {
    WireDocument::from_json(COMMON_V14).expect("common fixture should parse")
}

/// A user library with one simple type deriving from `xsd:string`, placed
/// at `{name}.json`.
pub fn simple_library(name: &str, namespace: &str, prefix: &str, status: LibraryStatus) -> LibraryDef {
    LibraryDef::user(name, namespace, prefix)
        .with_status(status)
        .with_location(format!("{name}.json"))
        .with_import("xsd", XSD_NAMESPACE)
        .with_entity(simple(&format!("{name}Code"), "xsd:string"))
}

pub fn simple(name: &str, parent: &str) -> EntityDef {
    EntityDef::new(name, EntityBody::Simple(SimpleType::new(parent)))
}

/// A model with the built-ins and `libraries` added in order.
pub fn model_with(libraries: Vec<LibraryDef>) -> Model {
    let mut model = Model::with_builtins();
    for library in libraries {
        model.add_library(library).expect("library should attach");
    }
    model
}

pub fn memory_pipeline(
    locks: Arc<dyn LockRegistry>,
    access: NamespaceAccessList,
    handler: Arc<dyn SaveHandler>,
) -> SavePipeline {
    let access: Arc<dyn AccessControl> = Arc::new(access);
    SavePipeline::new(Arc::new(TransformerRegistry::with_defaults()), locks, access, handler)
}

/// An unprotected pipeline over a fresh lock registry and `handler`.
pub fn open_pipeline(handler: Arc<MemorySaveHandler>) -> SavePipeline {
    memory_pipeline(
        Arc::new(ResourceLockRegistry::new()),
        NamespaceAccessList::new(),
        handler,
    )
}

// ============================================================================
// COUNTING LOCK REGISTRY
// ============================================================================

/// Counts acquisitions before delegating to a [`ResourceLockRegistry`].
#[derive(Debug, Default)]
pub struct CountingLockRegistry {
    inner: ResourceLockRegistry,
    calls: AtomicUsize,
}

impl CountingLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LockRegistry for CountingLockRegistry {
    fn acquire_read(&self, resource: &ResourceId, timeout: Duration) -> Result<LockGuard<'_>, LockError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.acquire_read(resource, timeout)
    }

    fn acquire_write(&self, resource: &ResourceId, timeout: Duration) -> Result<LockGuard<'_>, LockError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.acquire_write(resource, timeout)
    }
}
