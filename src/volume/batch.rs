//! Batch orchestration
//!
//! Turns one [`Request`] into one or more mount point operations and folds
//! the per-item results into a [`BatchOutcome`]. Items run strictly one after
//! another; a failing item never stops the ones after it.

use std::path::PathBuf;

use crate::error::Result;

use super::manager::MountPointManager;
use super::table::VolumeRegistry;
use super::transport::MountTransport;

/// What the user asked for, built once from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `REMOTE_URI MOUNTPOINT_NAME`, the table is not consulted
    MountExplicit { remote: String, name: String },
    MountByName { name: String },
    MountAll,
    UnmountByName { name: String },
    UnmountAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Mount,
    Unmount,
}

impl Request {
    pub fn action(&self) -> Action {
        match self {
            Request::MountExplicit { .. } | Request::MountByName { .. } | Request::MountAll => {
                Action::Mount
            }
            Request::UnmountByName { .. } | Request::UnmountAll => Action::Unmount,
        }
    }
}

/// What a successful item did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completed {
    Mounted { remote: String, path: PathBuf },
    Unmounted { path: PathBuf },
    UnmountedAll,
}

/// Result of a single item in a batch.
#[derive(Debug)]
pub struct ItemOutcome {
    /// Name as requested (or `*` for unmount-all)
    pub name: String,
    pub result: Result<Completed>,
}

/// Aggregate result of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub action: Action,
    pub attempted: usize,
    pub succeeded: usize,
    worst_status: i32,
}

impl BatchOutcome {
    fn new(action: Action) -> Self {
        Self {
            action,
            attempted: 0,
            succeeded: 0,
            worst_status: 0,
        }
    }

    fn record(&mut self, result: &Result<Completed>) {
        self.attempted += 1;
        match result {
            Ok(_) => self.succeeded += 1,
            Err(e) => self.worst_status = self.worst_status.max(e.exit_code()),
        }
    }

    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }

    pub fn is_success(&self) -> bool {
        self.succeeded == self.attempted
    }

    /// Worst status seen across items, never lower than 1 if anything failed.
    pub fn exit_status(&self) -> i32 {
        let any_failed = if self.is_success() { 0 } else { 1 };
        self.worst_status.max(any_failed)
    }
}

/// Runs requests against the volume table and a mount point manager.
pub struct BatchOrchestrator<T> {
    manager: MountPointManager<T>,
    registry: VolumeRegistry,
}

impl<T: MountTransport> BatchOrchestrator<T> {
    pub fn new(manager: MountPointManager<T>, registry: VolumeRegistry) -> Self {
        Self { manager, registry }
    }

    pub fn manager(&self) -> &MountPointManager<T> {
        &self.manager
    }

    /// Execute `request`, calling `on_item` as each item finishes.
    ///
    /// Only failing to read the table for a mount-all is returned as an
    /// error; every other failure is folded into the outcome.
    pub async fn run<F>(&self, request: &Request, mut on_item: F) -> Result<BatchOutcome>
    where
        F: FnMut(&ItemOutcome),
    {
        let mut outcome = BatchOutcome::new(request.action());

        let mut finish = |item: ItemOutcome| {
            outcome.record(&item.result);
            on_item(&item);
        };

        match request {
            Request::MountExplicit { remote, name } => {
                let result = self.mount(remote, name).await;
                finish(ItemOutcome {
                    name: name.clone(),
                    result,
                });
            }
            Request::MountByName { name } => {
                let result = self.mount_by_name(name).await;
                finish(ItemOutcome {
                    name: name.clone(),
                    result,
                });
            }
            Request::MountAll => {
                let names = self.registry.load()?.volume_names();
                tracing::debug!("Mounting {} volume(s) from the table", names.len());

                for name in names {
                    let result = self.mount_by_name(&name).await;
                    finish(ItemOutcome { name, result });
                }
            }
            Request::UnmountByName { name } => {
                let result = self.unmount_by_name(name).await;
                finish(ItemOutcome {
                    name: name.clone(),
                    result,
                });
            }
            Request::UnmountAll => {
                let result = self
                    .manager
                    .unmount_all()
                    .await
                    .map(|_| Completed::UnmountedAll);
                finish(ItemOutcome {
                    name: "*".to_string(),
                    result,
                });
            }
        }

        Ok(outcome)
    }

    async fn mount(&self, remote: &str, name: &str) -> Result<Completed> {
        let mount_point = self.manager.mount_one(remote, name).await?;
        Ok(Completed::Mounted {
            remote: remote.to_string(),
            path: mount_point.path,
        })
    }

    /// Resolve through the table, then mount on the resolved name.
    async fn mount_by_name(&self, name: &str) -> Result<Completed> {
        let resolved = self.registry.resolve(name)?;
        self.mount(&resolved.remote, &resolved.name).await
    }

    /// Unmount by mount point name, following one alias hop if the table has one.
    async fn unmount_by_name(&self, name: &str) -> Result<Completed> {
        let table = self.registry.load()?;
        let target = table.alias_target(name).unwrap_or(name);

        let mount_point = self.manager.unmount_one(target).await?;
        Ok(Completed::Unmounted {
            path: mount_point.path,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::error::MountError;
    use crate::volume::transport::testing::{Call, FakeTransport};

    const TABLE: &str = "\
vol0 janedoe@host:/home/janedoe
alias v0 vol0
backup admin@nas:/srv/backup
media me@nas:/srv/media
broken me@nas:/srv/broken extra
";

    struct Fixture {
        _dir: tempfile::TempDir,
        base: PathBuf,
        table: PathBuf,
    }

    fn fixture(table: Option<&str>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("mnt");
        let table_path = dir.path().join("config").join("volumes");
        if let Some(content) = table {
            std::fs::create_dir_all(table_path.parent().unwrap()).unwrap();
            std::fs::write(&table_path, content).unwrap();
        }
        Fixture {
            _dir: dir,
            base,
            table: table_path,
        }
    }

    fn orchestrator(fx: &Fixture, transport: FakeTransport) -> BatchOrchestrator<FakeTransport> {
        BatchOrchestrator::new(
            MountPointManager::new(&fx.base, transport),
            VolumeRegistry::new(&fx.table),
        )
    }

    fn mounted_paths(orch: &BatchOrchestrator<FakeTransport>) -> Vec<PathBuf> {
        orch.manager()
            .transport()
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Mount { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_mount_explicit_skips_table() {
        let fx = fixture(None);
        let orch = orchestrator(&fx, FakeTransport::new());

        let request = Request::MountExplicit {
            remote: "jane@host:/data".to_string(),
            name: "data".to_string(),
        };
        let outcome = orch.run(&request, |_| {}).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.exit_status(), 0);
        assert_eq!(mounted_paths(&orch), vec![fx.base.join("data")]);
        assert!(!fx.table.exists());
    }

    #[tokio::test]
    async fn test_mount_by_alias_uses_resolved_name() {
        let fx = fixture(Some(TABLE));
        let orch = orchestrator(&fx, FakeTransport::new());

        let mut seen = Vec::new();
        let outcome = orch
            .run(&Request::MountByName { name: "v0".into() }, |item| {
                seen.push(item.result.as_ref().ok().cloned());
            })
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(
            seen,
            vec![Some(Completed::Mounted {
                remote: "janedoe@host:/home/janedoe".to_string(),
                path: fx.base.join("vol0"),
            })]
        );
    }

    #[tokio::test]
    async fn test_mount_by_name_resolution_failure_short_circuits() {
        let fx = fixture(Some(TABLE));
        let orch = orchestrator(&fx, FakeTransport::new());

        let mut errors = Vec::new();
        let outcome = orch
            .run(&Request::MountByName { name: "nope".into() }, |item| {
                errors.push(matches!(item.result, Err(MountError::NotFound(_))));
            })
            .await
            .unwrap();

        assert_eq!(errors, vec![true]);
        assert_eq!((outcome.attempted, outcome.succeeded), (1, 0));
        assert_ne!(outcome.exit_status(), 0);
        assert!(orch.manager().transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_mount_all_counts_malformed_row_as_failure() {
        let fx = fixture(Some(TABLE));
        let orch = orchestrator(&fx, FakeTransport::new());

        let mut names = Vec::new();
        let outcome = orch
            .run(&Request::MountAll, |item| names.push(item.name.clone()))
            .await
            .unwrap();

        assert_eq!(names, vec!["vol0", "backup", "media", "broken"]);
        assert_eq!(outcome.attempted, 4);
        assert_eq!(outcome.succeeded, 3);
        assert_eq!(outcome.failed(), 1);
        assert!(!outcome.is_success());
        assert_ne!(outcome.exit_status(), 0);
        assert_eq!(mounted_paths(&orch).len(), 3);
    }

    #[tokio::test]
    async fn test_mount_all_items_are_independent() {
        let fx = fixture(Some(TABLE));
        let orch = orchestrator(&fx, FakeTransport::failing("admin@nas:/srv/backup", 5));

        let outcome = orch.run(&Request::MountAll, |_| {}).await.unwrap();

        // backup fails at the transport, media after it still mounts
        assert_eq!(outcome.attempted, 4);
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.exit_status(), 5);
        assert!(fx.base.join("media").is_dir());
        assert!(fx.base.join("backup").is_dir());
    }

    #[tokio::test]
    async fn test_mount_all_empty_table() {
        let fx = fixture(None);
        let orch = orchestrator(&fx, FakeTransport::new());

        let outcome = orch.run(&Request::MountAll, |_| {}).await.unwrap();

        assert_eq!(outcome.attempted, 0);
        assert!(outcome.is_success());
        assert_eq!(outcome.exit_status(), 0);
        assert!(fx.table.exists());
    }

    #[tokio::test]
    async fn test_mount_all_unreadable_table_is_fatal() {
        let fx = fixture(None);
        std::fs::create_dir_all(&fx.table).unwrap();
        let orch = orchestrator(&fx, FakeTransport::new());

        let result = orch.run(&Request::MountAll, |_| {}).await;
        assert!(matches!(result, Err(MountError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_unmount_by_name_unreadable_table_fails_item() {
        let fx = fixture(None);
        std::fs::create_dir_all(&fx.table).unwrap();
        std::fs::create_dir_all(fx.base.join("vol0")).unwrap();
        let orch = orchestrator(&fx, FakeTransport::new());

        let mut failures = Vec::new();
        let outcome = orch
            .run(&Request::UnmountByName { name: "vol0".into() }, |item| {
                if let Err(e) = &item.result {
                    failures.push(matches!(e, MountError::Storage { .. }));
                }
            })
            .await
            .unwrap();

        assert_eq!(failures, vec![true]);
        assert_eq!((outcome.attempted, outcome.succeeded), (1, 0));
        assert_eq!(outcome.exit_status(), 1);
        assert!(orch.manager().transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_unmount_by_alias_follows_one_hop() {
        let fx = fixture(Some(TABLE));
        std::fs::create_dir_all(fx.base.join("vol0")).unwrap();
        let orch = orchestrator(&fx, FakeTransport::new());

        let outcome = orch
            .run(&Request::UnmountByName { name: "v0".into() }, |_| {})
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(
            orch.manager().transport().calls(),
            vec![Call::Unmount {
                path: fx.base.join("vol0")
            }]
        );
        assert!(!fx.base.join("vol0").exists());
    }

    #[tokio::test]
    async fn test_unmount_explicit_mount_not_in_table() {
        let fx = fixture(Some(TABLE));
        std::fs::create_dir_all(fx.base.join("scratch")).unwrap();
        let orch = orchestrator(&fx, FakeTransport::new());

        let outcome = orch
            .run(&Request::UnmountByName { name: "scratch".into() }, |_| {})
            .await
            .unwrap();

        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_unmount_missing_mount_point() {
        let fx = fixture(Some(TABLE));
        let orch = orchestrator(&fx, FakeTransport::new());

        let outcome = orch
            .run(&Request::UnmountByName { name: "vol0".into() }, |_| {})
            .await
            .unwrap();

        assert_eq!((outcome.attempted, outcome.succeeded), (1, 0));
        assert_eq!(outcome.exit_status(), 1);
        assert!(orch.manager().transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_unmount_all_never_reads_table() {
        let fx = fixture(None);
        let orch = orchestrator(&fx, FakeTransport::new());

        let outcome = orch.run(&Request::UnmountAll, |_| {}).await.unwrap();

        assert_eq!((outcome.attempted, outcome.succeeded), (1, 1));
        assert_eq!(orch.manager().transport().calls(), vec![Call::UnmountAll]);
        assert!(!fx.table.exists());
    }

    #[tokio::test]
    async fn test_unmount_all_failure_is_single_outcome() {
        let fx = fixture(None);
        let transport = FakeTransport {
            fail_unmount_all: Some(3),
            ..Default::default()
        };
        let orch = orchestrator(&fx, transport);

        let outcome = orch.run(&Request::UnmountAll, |_| {}).await.unwrap();

        assert_eq!((outcome.attempted, outcome.succeeded), (1, 0));
        assert_eq!(outcome.exit_status(), 3);
    }

    #[test]
    fn test_exit_status_never_downgraded() {
        let mut outcome = BatchOutcome::new(Action::Mount);
        outcome.record(&Err(MountError::MountTransport {
            remote: "r".into(),
            path: Path::new("/mnt/r").to_path_buf(),
            code: Some(9),
            message: "x".into(),
        }));
        outcome.record(&Ok(Completed::UnmountedAll));
        outcome.record(&Err(MountError::NotFound("y".into())));

        assert_eq!(outcome.exit_status(), 9);
        assert_eq!(outcome.failed(), 2);
    }

    #[test]
    fn test_request_action() {
        assert_eq!(Request::MountAll.action(), Action::Mount);
        assert_eq!(
            Request::UnmountByName { name: "x".into() }.action(),
            Action::Unmount
        );
    }
}
