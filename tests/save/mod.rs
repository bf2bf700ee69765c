//! The save pipeline end to end.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use rstest::rstest;
use tempfile::TempDir;

use modelweave::diagnostics::codes;
use modelweave::model::{LibraryKind, LibraryStatus};
use modelweave::save::{
    Credentials, FileSaveHandler, LockRegistry, MemorySaveHandler, NamespaceAccessList,
    ResourceLockRegistry, SaveHandler, SaveState, verify_checksum,
};
use modelweave::{LibraryId, Model, SaveError, WireDocument};

use crate::helpers::model_helpers::{
    CountingLockRegistry, memory_pipeline, model_with, open_pipeline, simple, simple_library,
};

const HOTEL_NS: &str = "http://example.org/ns/hotel/v1";
const RATES_NS: &str = "http://example.org/ns/rates/v1";

fn hotel_model(status: LibraryStatus) -> (Model, LibraryId) {
    let model = model_with(vec![simple_library("Hotel", HOTEL_NS, "htl", status)]);
    let id = model.library_ids()[1];
    (model, id)
}

fn resource_of(model: &Model, id: LibraryId) -> modelweave::ResourceId {
    model.library(id).unwrap().resource_id()
}

// ── Read-only ────────────────────────────────────────────────────────

#[test]
fn test_builtin_library_rejected_without_locking() {
    let mut model = Model::with_builtins();
    let builtin = model.library_ids()[0];
    let locks = Arc::new(CountingLockRegistry::new());
    let pipeline = memory_pipeline(locks.clone(), NamespaceAccessList::new(), Arc::new(MemorySaveHandler::new()));

    let err = pipeline.save_library(&mut model, builtin, None).unwrap_err();
    assert!(matches!(err, SaveError::ReadOnly(_)), "unexpected error: {err}");
    assert_eq!(locks.calls(), 0);
}

#[test]
fn test_flagged_user_library_rejected_without_locking() {
    let (mut model, id) = hotel_model(LibraryStatus::Draft);
    model.library_mut(id).unwrap().set_read_only(true);
    let locks = Arc::new(CountingLockRegistry::new());
    let handler = Arc::new(MemorySaveHandler::new());
    let pipeline = memory_pipeline(locks.clone(), NamespaceAccessList::new(), handler.clone());

    let err = pipeline.save_library(&mut model, id, None).unwrap_err();
    assert!(matches!(err, SaveError::ReadOnly(ref name) if name == "Hotel"));
    assert_eq!(locks.calls(), 0);
    assert!(handler.is_empty());
}

#[test]
fn test_successful_save_passes_every_state() {
    let (mut model, id) = hotel_model(LibraryStatus::Draft);
    let locks = Arc::new(CountingLockRegistry::new());
    let handler = Arc::new(MemorySaveHandler::new());
    let pipeline = memory_pipeline(locks.clone(), NamespaceAccessList::new(), handler.clone());

    let report = pipeline.save_library(&mut model, id, None).unwrap();
    assert_eq!(report.states.first(), Some(&SaveState::Candidate));
    assert_eq!(report.states.last(), Some(&SaveState::Persisted));
    assert!(report.states.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(locks.calls(), 1);
    assert_eq!(handler.save_count(&resource_of(&model, id)), 1);
}

// ── Locking ──────────────────────────────────────────────────────────

#[test]
fn test_lock_timeout_when_another_writer_holds_the_library() {
    let (mut model, id) = hotel_model(LibraryStatus::Draft);
    let locks = Arc::new(ResourceLockRegistry::new());
    let handler = Arc::new(MemorySaveHandler::new());
    let pipeline = memory_pipeline(locks.clone(), NamespaceAccessList::new(), handler.clone())
        .with_lock_timeout(Duration::from_millis(200));

    let resource = resource_of(&model, id);
    let (held_tx, held_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let holder = {
        let locks = locks.clone();
        let resource = resource.clone();
        thread::spawn(move || {
            let guard = locks.acquire_write(&resource, Duration::from_secs(5)).unwrap();
            held_tx.send(()).unwrap();
            release_rx.recv().unwrap();
            drop(guard);
        })
    };
    held_rx.recv().unwrap();

    let started = Instant::now();
    let err = pipeline.save_library(&mut model, id, None).unwrap_err();
    assert!(err.is_lock_timeout(), "unexpected error: {err}");
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(handler.is_empty());

    release_tx.send(()).unwrap();
    holder.join().unwrap();
    assert!(!locks.is_locked(&resource));
    assert!(pipeline.save_library(&mut model, id, None).is_ok());
}

#[test]
fn test_write_lock_times_out_across_threads() {
    let locks = Arc::new(ResourceLockRegistry::new());
    let resource = modelweave::ResourceId::new("X", "Y");
    let _held = locks.acquire_write(&resource, Duration::from_millis(50)).unwrap();

    let contender = {
        let locks = locks.clone();
        let resource = resource.clone();
        thread::spawn(move || {
            let started = Instant::now();
            let outcome = locks.acquire_write(&resource, Duration::from_millis(200)).map(|_| ());
            (outcome, started.elapsed())
        })
    };
    let (outcome, waited) = contender.join().unwrap();

    assert!(outcome.unwrap_err().is_timeout());
    assert!(waited >= Duration::from_millis(200));
    assert!(waited < Duration::from_secs(2));
}

#[test]
fn test_lock_released_after_failed_save() {
    let (mut model, id) = hotel_model(LibraryStatus::Draft);
    let locks = Arc::new(ResourceLockRegistry::new());
    let mut access = NamespaceAccessList::new();
    access.protect(HOTEL_NS);
    let pipeline = memory_pipeline(locks.clone(), access, Arc::new(MemorySaveHandler::new()));

    assert!(pipeline.save_library(&mut model, id, None).is_err());
    assert!(!locks.is_locked(&resource_of(&model, id)));
}

// ── Checksums ────────────────────────────────────────────────────────

#[rstest]
#[case::draft(LibraryStatus::Draft, false, false)]
#[case::under_review(LibraryStatus::UnderReview, false, false)]
#[case::final_status(LibraryStatus::Final, false, true)]
#[case::obsolete(LibraryStatus::Obsolete, false, true)]
#[case::protected_draft(LibraryStatus::Draft, true, true)]
fn test_checksum_presence(#[case] status: LibraryStatus, #[case] protected: bool, #[case] expected: bool) {
    let (mut model, id) = hotel_model(status);
    let credentials = Credentials::new("editor", "s3cret");
    let mut access = NamespaceAccessList::new();
    if protected {
        access.grant(HOTEL_NS, credentials.clone());
    }
    let handler = Arc::new(MemorySaveHandler::new());
    let pipeline = memory_pipeline(Arc::new(ResourceLockRegistry::new()), access, handler.clone());

    let report = pipeline.save_library(&mut model, id, Some(&credentials)).unwrap();
    assert_eq!(report.checksum.is_some(), expected);

    let stored = handler.current(&resource_of(&model, id)).unwrap();
    assert_eq!(stored.checksum().is_some(), expected);
    assert_eq!(stored.checksum(), report.checksum.as_deref());
    assert_eq!(model.library(id).unwrap().checksum(), report.checksum.as_deref());
    if expected {
        assert!(verify_checksum(&stored).unwrap());
    }
}

#[test]
fn test_checksum_cleared_when_no_longer_required() {
    let (mut model, id) = hotel_model(LibraryStatus::Final);
    let handler = Arc::new(MemorySaveHandler::new());
    let pipeline = open_pipeline(handler.clone());
    assert!(pipeline.save_library(&mut model, id, None).unwrap().checksum.is_some());

    if let LibraryKind::User { status, .. } = &mut model.library_mut(id).unwrap().kind {
        *status = LibraryStatus::Draft;
    }
    let report = pipeline.save_library(&mut model, id, None).unwrap();
    assert!(report.checksum.is_none());
    assert!(model.library(id).unwrap().checksum().is_none());

    let resource = resource_of(&model, id);
    assert!(handler.current(&resource).unwrap().checksum().is_none());
    assert!(handler.backup(&resource).unwrap().checksum().is_some());
}

// ── Access control ───────────────────────────────────────────────────

#[rstest]
#[case::absent(None)]
#[case::wrong_secret(Some(Credentials::new("editor", "guess")))]
#[case::unknown_user(Some(Credentials::new("intruder", "s3cret")))]
fn test_access_denied_for_protected_namespace(#[case] credentials: Option<Credentials>) {
    let (mut model, id) = hotel_model(LibraryStatus::Draft);
    let mut access = NamespaceAccessList::new();
    access.grant(HOTEL_NS, Credentials::new("editor", "s3cret"));
    let handler = Arc::new(MemorySaveHandler::new());
    let pipeline = memory_pipeline(Arc::new(ResourceLockRegistry::new()), access, handler.clone());

    let err = pipeline.save_library(&mut model, id, credentials.as_ref()).unwrap_err();
    assert!(
        matches!(&err, SaveError::AccessDenied { namespace } if namespace == HOTEL_NS),
        "unexpected error: {err}"
    );
    assert!(handler.is_empty());
    assert!(model.library(id).unwrap().checksum().is_none());
}

#[test]
fn test_protection_covers_sub_namespaces() {
    let nested = format!("{HOTEL_NS}/rooms");
    let mut model = model_with(vec![simple_library("Rooms", &nested, "rm", LibraryStatus::Draft)]);
    let id = model.library_ids()[1];
    let mut access = NamespaceAccessList::new();
    access.protect(HOTEL_NS);
    let pipeline = memory_pipeline(Arc::new(ResourceLockRegistry::new()), access, Arc::new(MemorySaveHandler::new()));

    let err = pipeline.save_library(&mut model, id, None).unwrap_err();
    assert!(matches!(err, SaveError::AccessDenied { .. }));
}

// ── Batches ──────────────────────────────────────────────────────────

#[test]
fn test_save_all_records_failures_per_library() {
    let mut model = model_with(vec![
        simple_library("Hotel", HOTEL_NS, "htl", LibraryStatus::Final),
        simple_library("Rates", RATES_NS, "rt", LibraryStatus::Draft),
        simple_library("Frozen", "http://example.org/ns/frozen/v1", "fz", LibraryStatus::Final),
    ]);
    let frozen = model.library_ids()[3];
    model.library_mut(frozen).unwrap().set_read_only(true);

    let mut access = NamespaceAccessList::new();
    access.protect(RATES_NS);
    let handler = Arc::new(MemorySaveHandler::new());
    let pipeline = memory_pipeline(Arc::new(ResourceLockRegistry::new()), access, handler.clone());

    let batch = pipeline.save_all(&mut model, None);
    assert!(!batch.is_success());
    assert_eq!(
        batch.saved.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        vec!["Hotel"]
    );

    let failed: Vec<(&str, bool)> = batch
        .failed
        .iter()
        .map(|(_, name, err)| (name.as_str(), matches!(err, SaveError::ReadOnly(_))))
        .collect();
    assert_eq!(failed, vec![("Rates", false), ("Frozen", true)]);
    assert_eq!(handler.len(), 1);
}

#[test]
fn test_save_all_reports_each_finding_once() {
    let mut model = model_with(vec![
        simple_library("Hotel", HOTEL_NS, "htl", LibraryStatus::Draft),
        simple_library("Rates", RATES_NS, "rt", LibraryStatus::Draft),
        simple_library("Tax", "http://example.org/ns/tax/v1", "tx", LibraryStatus::Draft),
    ]);
    let hotel = model.library_ids()[1];
    model.add_entity(hotel, simple("Broken", "Missing")).unwrap();

    let batch = open_pipeline(Arc::new(MemorySaveHandler::new())).save_all(&mut model, None);
    assert_eq!(batch.saved.len(), 3);

    let unresolved = batch.findings.with_code(codes::UNRESOLVED_REFERENCE);
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].library.as_deref(), Some("Hotel"));
    assert_eq!(unresolved[0].entity.as_deref(), Some("Broken"));
    for report in batch.saved.iter().filter(|r| r.name != "Hotel") {
        assert!(report.findings.with_code(codes::UNRESOLVED_REFERENCE).is_empty());
    }
}

#[test]
fn test_save_all_skips_builtins() {
    let mut model = model_with(vec![simple_library("Hotel", HOTEL_NS, "htl", LibraryStatus::Draft)]);
    let handler = Arc::new(MemorySaveHandler::new());
    let batch = open_pipeline(handler.clone()).save_all(&mut model, None);

    assert!(batch.is_success());
    assert_eq!(batch.saved.len(), 1);
    assert_eq!(handler.len(), 1);
}

// ── File handler ─────────────────────────────────────────────────────

fn read_document(path: &std::path::Path) -> WireDocument {
    WireDocument::from_json(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_file_save_keeps_previous_revision_as_backup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("libraries").join("hotel.json");
    let mut model = model_with(vec![
        simple_library("Hotel", HOTEL_NS, "htl", LibraryStatus::Draft).with_location(&path),
    ]);
    let id = model.library_ids()[1];
    let handler = Arc::new(FileSaveHandler::default());
    let pipeline = memory_pipeline(Arc::new(ResourceLockRegistry::new()), NamespaceAccessList::new(), handler.clone());

    pipeline.save_library(&mut model, id, None).unwrap();
    assert_eq!(read_document(&path).member_names(), vec!["HotelCode"]);
    assert!(!handler.backup_path(&path).exists());

    model.add_entity(id, simple("RoomCode", "HotelCode")).unwrap();
    pipeline.save_library(&mut model, id, None).unwrap();

    assert_eq!(read_document(&path).member_names(), vec!["HotelCode", "RoomCode"]);
    let backup = read_document(&handler.backup_path(&path));
    assert_eq!(backup.member_names(), vec!["HotelCode"]);
}

#[rstest]
#[case::file(Arc::new(FileSaveHandler::default()))]
#[case::memory(Arc::new(MemorySaveHandler::new()))]
fn test_save_without_location_rejected_without_locking(#[case] handler: Arc<dyn SaveHandler>) {
    let mut library = simple_library("Hotel", HOTEL_NS, "htl", LibraryStatus::Draft);
    library.location = None;
    let mut model = model_with(vec![library]);
    let id = model.library_ids()[1];
    let locks = Arc::new(CountingLockRegistry::new());
    let pipeline = memory_pipeline(locks.clone(), NamespaceAccessList::new(), handler);

    let err = pipeline.save_library(&mut model, id, None).unwrap_err();
    assert!(matches!(err, SaveError::MissingLocation(ref name) if name == "Hotel"));
    assert_eq!(locks.calls(), 0);
}
