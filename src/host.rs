//! Ergonomic entry point for compiling and saving a set of libraries.
//!
//! `ModelHost` owns a [`Model`] and runs the whole session:
//!
//! ```text
//! sources ─load─▶ WireDocument ─transform─▶ LibraryDef ─add─▶ Model
//!                                                              │
//!                           findings ◀── validate ◀── resolve ◀┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use modelweave::host::ModelHost;
//!
//! let mut host = ModelHost::new();
//! host.compile(&["hotel.json".into(), "common.json".into()]);
//! for finding in host.findings() {
//!     println!("{finding}");
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::config::EngineConfig;
use crate::diagnostics::{Finding, Findings, codes};
use crate::loader::{JsonLoader, LoadError, Loader, load_all};
use crate::model::{LibraryId, Model, ModelError};
use crate::resolve::ReferenceResolver;
use crate::save::{
    AccessControl, Credentials, FileSaveHandler, LockRegistry, NamespaceAccessList, ResourceLockRegistry, SaveBatch,
    SaveError, SaveHandler, SavePipeline, SaveReport,
};
use crate::symbols::{DerivedEntityFactory, FacetDerivationFactory, SymbolTable};
use crate::transform::{ForwardDeclaration, TransformError, TransformerRegistry, WireDocument};
use crate::validate::ModelChecker;

/// Owns a model and the services used to build and save it.
pub struct ModelHost {
    model: Model,
    config: EngineConfig,
    transformers: Arc<TransformerRegistry>,
    derivation: Arc<dyn DerivedEntityFactory>,
    loader: Arc<dyn Loader>,
    findings: Findings,
    forward_declarations: Vec<(SmolStr, ForwardDeclaration)>,
}

impl Default for ModelHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelHost {
    // ── Construction ─────────────────────────────────────────────────

    /// A host over a model holding only the built-in schema library.
    pub fn new() -> Self {
        Self::from_model(Model::with_builtins())
    }

    /// Wrap an already-constructed model.
    pub fn from_model(model: Model) -> Self {
        Self {
            model,
            config: EngineConfig::default(),
            transformers: Arc::new(TransformerRegistry::with_defaults()),
            derivation: Arc::new(FacetDerivationFactory),
            loader: Arc::new(JsonLoader),
            findings: Findings::new(),
            forward_declarations: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_transformers(mut self, transformers: Arc<TransformerRegistry>) -> Self {
        self.transformers = transformers;
        self
    }

    pub fn with_derivation(mut self, derivation: Arc<dyn DerivedEntityFactory>) -> Self {
        self.derivation = derivation;
        self
    }

    // ── Access ───────────────────────────────────────────────────────

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Mutable model access. Call [`resolve`](Self::resolve) before
    /// trusting handles again.
    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn transformers(&self) -> &Arc<TransformerRegistry> {
        &self.transformers
    }

    /// Everything reported since the last [`compile`](Self::compile).
    pub fn findings(&self) -> &Findings {
        &self.findings
    }

    /// References seen before their target, with the library holding them.
    pub fn forward_declarations(&self) -> &[(SmolStr, ForwardDeclaration)] {
        &self.forward_declarations
    }

    // ── Compilation ──────────────────────────────────────────────────

    /// Load, transform, resolve and validate `sources` in one go.
    ///
    /// Nothing here is fatal: unreadable sources and rejected documents
    /// are findings like any other.
    pub fn compile(&mut self, sources: &[PathBuf]) -> &Findings {
        self.findings = Findings::new();
        self.forward_declarations.clear();

        let (documents, load_findings) = load_all(self.loader.as_ref(), sources);
        self.findings.merge(load_findings);
        for loaded in documents {
            if let Err(err) = self.add_document(&loaded.document, Some(loaded.source.clone())) {
                self.findings.add(
                    Finding::error(codes::LOAD_FAILED, format!("{}: {err}", loaded.source.display()))
                        .in_library(loaded.document.name()),
                );
            }
        }

        let resolved = self.resolve();
        self.findings.merge(resolved);
        let validated = self.validate();
        self.findings.merge(validated);
        tracing::debug!(
            "[HOST] compiled {} sources: {} libraries, {} findings ({} errors)",
            sources.len(),
            self.model.library_count(),
            self.findings.len(),
            self.findings.error_count()
        );
        &self.findings
    }

    /// Load one file into the model without resolving.
    pub fn load_file(&mut self, source: impl Into<PathBuf>) -> Result<LibraryId, HostError> {
        let source = source.into();
        let document = self.loader.load(&source)?;
        self.add_document(&document, Some(source))
    }

    /// Transform `document` and add the library to the model.
    ///
    /// References that name nothing known once the library is in place are
    /// recorded as forward declarations and reported as info findings.
    pub fn add_document(
        &mut self,
        document: &WireDocument,
        location: Option<PathBuf>,
    ) -> Result<LibraryId, HostError> {
        let before = SymbolTable::build_all(&self.model, self.derivation.as_ref());
        let outcome = self.transformers.load_document(document, Some(&before))?;
        let mut def = outcome.library;
        def.location = location;
        let name = def.name.clone();
        let id = self.model.add_library(def)?;

        let after = SymbolTable::build_all(&self.model, self.derivation.as_ref());
        for declaration in outcome.forward_declarations {
            if after.resolve(&declaration.name, id).is_some() {
                continue;
            }
            self.findings.add(
                Finding::info(
                    codes::FORWARD_DECLARATION,
                    format!("'{}' is not known yet", declaration.name),
                )
                .in_library(name.clone())
                .on_entity(declaration.referenced_by.clone()),
            );
            self.forward_declarations.push((name.clone(), declaration));
        }
        let mut findings = outcome.findings;
        findings.attach_library(&name);
        self.findings.merge(findings);
        Ok(id)
    }

    /// Rebuild the symbol table and resolve every library.
    pub fn resolve(&mut self) -> Findings {
        ReferenceResolver::resolve_all(&mut self.model, self.derivation.as_ref())
    }

    /// Structural checks over every user library.
    pub fn validate(&self) -> Findings {
        let mut checker = ModelChecker::new(&self.model);
        checker.check_all();
        checker.finish()
    }

    // ── Saving ───────────────────────────────────────────────────────

    /// A pipeline over this host's transformers and config.
    pub fn save_pipeline(
        &self,
        locks: Arc<dyn LockRegistry>,
        access: Arc<dyn AccessControl>,
        handler: Arc<dyn SaveHandler>,
    ) -> SavePipeline {
        SavePipeline::new(self.transformers.clone(), locks, access, handler)
            .with_config(&self.config)
            .with_derivation(self.derivation.clone())
    }

    /// A pipeline with an in-process lock registry and the configured
    /// protected namespaces.
    pub fn default_pipeline(&self, handler: Arc<dyn SaveHandler>) -> SavePipeline {
        let access = NamespaceAccessList::from_config(&self.config);
        self.save_pipeline(Arc::new(ResourceLockRegistry::new()), Arc::new(access), handler)
    }

    /// [`default_pipeline`](Self::default_pipeline) writing files, with the
    /// configured backup suffix.
    pub fn file_pipeline(&self) -> SavePipeline {
        self.default_pipeline(Arc::new(FileSaveHandler::from_config(&self.config)))
    }

    pub fn save(
        &mut self,
        pipeline: &SavePipeline,
        library: LibraryId,
        credentials: Option<&Credentials>,
    ) -> Result<SaveReport, SaveError> {
        pipeline.save_library(&mut self.model, library, credentials)
    }

    pub fn save_all(&mut self, pipeline: &SavePipeline, credentials: Option<&Credentials>) -> SaveBatch {
        pipeline.save_all(&mut self.model, credentials)
    }
}

impl std::fmt::Debug for ModelHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHost")
            .field("libraries", &self.model.library_count())
            .field("entities", &self.model.entity_count())
            .field("findings", &self.findings.len())
            .field("forward_declarations", &self.forward_declarations.len())
            .finish()
    }
}

// ============================================================================
// ERROR TYPE
// ============================================================================

/// Errors from single-document host operations.
#[derive(Debug)]
pub enum HostError {
    Load(LoadError),
    Transform(TransformError),
    Model(ModelError),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load(e) => write!(f, "load: {e}"),
            Self::Transform(e) => write!(f, "transform: {e}"),
            Self::Model(e) => write!(f, "model: {e}"),
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(e) => Some(e),
            Self::Transform(e) => Some(e),
            Self::Model(e) => Some(e),
        }
    }
}

impl From<LoadError> for HostError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl From<TransformError> for HostError {
    fn from(e: TransformError) -> Self {
        Self::Transform(e)
    }
}

impl From<ModelError> for HostError {
    fn from(e: ModelError) -> Self {
        Self::Model(e)
    }
}
