use async_trait::async_trait;
use clientbook_core::{
    open_db, open_db_in_memory, Client, PersistenceError, Repository, ScopedResource,
    ScratchBuffer, StoreContext, StoreError, UnitOfWork,
};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

type ReleaseLog = Arc<Mutex<Vec<String>>>;

/// Test resource recording which release path ran.
struct ProbeResource {
    label: &'static str,
    sync_supported: bool,
    async_supported: bool,
    log: ReleaseLog,
}

impl ProbeResource {
    fn boxed(
        label: &'static str,
        sync_supported: bool,
        async_supported: bool,
        log: &ReleaseLog,
    ) -> Box<Self> {
        Box::new(Self {
            label,
            sync_supported,
            async_supported,
            log: Arc::clone(log),
        })
    }
}

#[async_trait]
impl ScopedResource for ProbeResource {
    fn name(&self) -> &'static str {
        self.label
    }

    fn supports_sync_release(&self) -> bool {
        self.sync_supported
    }

    fn supports_async_release(&self) -> bool {
        self.async_supported
    }

    fn release(&mut self) -> io::Result<()> {
        self.log.lock().unwrap().push(format!("{}:sync", self.label));
        Ok(())
    }

    async fn release_async(&mut self) -> io::Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:async", self.label));
        Ok(())
    }
}

fn mem_unit_of_work() -> UnitOfWork {
    UnitOfWork::new(StoreContext::new(open_db_in_memory().unwrap()))
}

fn file_unit_of_work(path: &Path) -> UnitOfWork {
    UnitOfWork::new(StoreContext::new(open_db(path).unwrap()))
}

fn probe_unit_of_work(
    log: &ReleaseLog,
    sync_caps: (bool, bool),
    async_caps: (bool, bool),
) -> UnitOfWork {
    UnitOfWork::with_resources(
        StoreContext::new(open_db_in_memory().unwrap()),
        ProbeResource::boxed("sync_slot", sync_caps.0, sync_caps.1, log),
        ProbeResource::boxed("async_slot", async_caps.0, async_caps.1, log),
    )
}

fn release_log() -> ReleaseLog {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn repository_accessor_returns_same_instance() {
    let uow = mem_unit_of_work();

    let first = uow.client_repository() as *const _;
    let second = uow.client_repository() as *const _;
    assert!(std::ptr::eq(first, second));
}

#[tokio::test]
async fn commit_with_nothing_staged_returns_zero() {
    let uow = mem_unit_of_work();

    assert_eq!(uow.commit().await.unwrap(), 0);
}

#[tokio::test]
async fn failed_commit_makes_unit_of_work_unusable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clientbook.db");

    let first = file_unit_of_work(&path);
    first
        .client_repository()
        .add(&Client::new(7, "First"))
        .unwrap();
    first.commit().await.unwrap();

    // Stages id 7 before it exists in the store, so the staging checks pass
    // and the UNIQUE violation only surfaces inside the transaction.
    let second = file_unit_of_work(&path);
    second
        .client_repository()
        .add(&Client::new(7, "Duplicate"))
        .unwrap();
    second
        .client_repository()
        .add(&Client::new(8, "Innocent"))
        .unwrap();

    let err = second.commit().await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Persistence(PersistenceError::Write(_))
    ));

    // Atomic failure: the non-conflicting write rolled back with the rest.
    let fresh = file_unit_of_work(&path);
    assert_eq!(fresh.client_repository().get_by_id(&8).unwrap(), None);

    // The failed instance refuses everything from here on.
    let err = second.commit().await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Persistence(PersistenceError::Unusable)
    ));
    let err = second
        .client_repository()
        .get_by_id(&7)
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Persistence(PersistenceError::Unusable)
    ));
}

#[tokio::test]
async fn update_against_row_deleted_elsewhere_conflicts_at_commit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clientbook.db");

    let seeder = file_unit_of_work(&path);
    seeder
        .client_repository()
        .add(&Client::new(1, "Seed"))
        .unwrap();
    seeder.commit().await.unwrap();

    let updater = file_unit_of_work(&path);
    updater
        .client_repository()
        .update(&Client::new(1, "Renamed"))
        .unwrap();

    let deleter = file_unit_of_work(&path);
    deleter.client_repository().delete(&1).unwrap();
    deleter.commit().await.unwrap();

    let err = updater.commit().await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Persistence(PersistenceError::Conflict { ref key }) if key == "clients:1"
    ));
}

#[test]
fn sync_dispose_releases_both_slots_in_order() {
    let log = release_log();
    let mut uow = probe_unit_of_work(&log, (true, true), (true, true));

    uow.dispose();

    assert!(uow.is_disposed());
    assert_eq!(
        *log.lock().unwrap(),
        vec!["sync_slot:sync".to_string(), "async_slot:sync".to_string()]
    );

    uow.dispose();
    assert_eq!(log.lock().unwrap().len(), 2, "second dispose must be a no-op");
}

#[test]
fn sync_dispose_skips_async_only_resource() {
    let log = release_log();
    let mut uow = probe_unit_of_work(&log, (true, true), (false, true));

    uow.dispose();

    assert!(uow.is_disposed());
    assert_eq!(*log.lock().unwrap(), vec!["sync_slot:sync".to_string()]);
}

#[tokio::test]
async fn async_dispose_prefers_async_release_everywhere() {
    let log = release_log();
    let mut uow = probe_unit_of_work(&log, (true, true), (true, true));

    uow.dispose_async().await;

    assert!(uow.is_disposed());
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "async_slot:async".to_string(),
            "sync_slot:async".to_string()
        ]
    );

    uow.dispose_async().await;
    assert_eq!(log.lock().unwrap().len(), 2, "second dispose must be a no-op");
}

#[tokio::test]
async fn async_dispose_falls_back_to_sync_release() {
    let log = release_log();
    let mut uow = probe_unit_of_work(&log, (true, false), (true, true));

    uow.dispose_async().await;

    assert_eq!(
        *log.lock().unwrap(),
        vec!["async_slot:async".to_string(), "sync_slot:sync".to_string()]
    );
}

#[tokio::test]
async fn operations_after_dispose_fail_with_disposed() {
    let mut uow = mem_unit_of_work();
    let repo = uow.client_repository().clone();
    uow.dispose();

    assert!(matches!(
        repo.add(&Client::new(1, "Late")).unwrap_err(),
        StoreError::Disposed
    ));
    assert!(matches!(repo.get_by_id(&1).unwrap_err(), StoreError::Disposed));
    assert!(matches!(repo.list().unwrap_err(), StoreError::Disposed));
    assert!(matches!(
        repo.update(&Client::new(1, "Late")).unwrap_err(),
        StoreError::Disposed
    ));
    assert!(matches!(repo.delete(&1).unwrap_err(), StoreError::Disposed));
    assert!(matches!(uow.commit().await.unwrap_err(), StoreError::Disposed));
}

#[tokio::test]
async fn operations_after_async_dispose_fail_with_disposed() {
    let mut uow = mem_unit_of_work();
    let repo = uow.client_repository().clone();
    uow.dispose_async().await;

    assert!(matches!(repo.list().unwrap_err(), StoreError::Disposed));
    assert!(matches!(uow.commit().await.unwrap_err(), StoreError::Disposed));
}

#[test]
fn drop_runs_sync_teardown() {
    let log = release_log();
    {
        let _uow = probe_unit_of_work(&log, (true, true), (true, true));
    }

    assert_eq!(
        *log.lock().unwrap(),
        vec!["sync_slot:sync".to_string(), "async_slot:sync".to_string()]
    );
}

#[tokio::test]
async fn explicit_dispose_prevents_release_on_drop() {
    let log = release_log();
    {
        let mut uow = probe_unit_of_work(&log, (true, true), (true, true));
        uow.dispose_async().await;
    }

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "async_slot:async".to_string(),
            "sync_slot:async".to_string()
        ],
        "drop must not release again"
    );
}

#[test]
fn scratch_buffer_refuses_writes_after_release() {
    let mut buffer = ScratchBuffer::with_capacity(16);
    buffer.write(b"spooled bytes").unwrap();
    assert_eq!(buffer.len(), 13);
    assert!(!buffer.is_released());

    buffer.release().unwrap();
    assert!(buffer.is_released());
    assert!(buffer.is_empty());
    assert!(buffer.write(b"more").is_err());
}

#[test]
fn operation_ids_are_distinct_per_unit_of_work() {
    let first = mem_unit_of_work();
    let second = mem_unit_of_work();

    assert_ne!(first.op_id(), second.op_id());
}
