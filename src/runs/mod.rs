//! Run records and their on-disk workspaces.
//!
//! Every pipeline run owns a directory under `<data_dir>/runs/<run_id>/`
//! holding the uploaded document and everything derived from it, plus a
//! `run.json` snapshot of the record so state survives a restart. The
//! in-memory map is the source of truth while the process is up.

pub mod model;

pub use model::{PipelineRun, PipelineStage, RunArtifacts, RunStatus};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

const RECORD_FILE: &str = "run.json";
const DOCUMENT_FILE: &str = "document.pdf";
const EXTRACTED_TEXT_FILE: &str = "extracted.txt";
const SUMMARY_FILE: &str = "summary.txt";
const TEST_CASES_FILE: &str = "test_cases.txt";
const TEST_SCRIPT_FILE: &str = "tests.spec.js";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("run not found: {0}")]
    NotFound(String),
    #[error("run {0} is already running")]
    AlreadyRunning(String),
    #[error("run store lock poisoned: {0}")]
    Lock(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to encode run record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fixed file layout inside one run's workspace.
#[derive(Debug, Clone)]
pub struct RunPaths {
    dir: PathBuf,
}

impl RunPaths {
    fn new(runs_root: &Path, run_id: &str) -> Self {
        Self {
            dir: runs_root.join(run_id),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn document(&self) -> PathBuf {
        self.dir.join(DOCUMENT_FILE)
    }

    pub fn extracted_text(&self) -> PathBuf {
        self.dir.join(EXTRACTED_TEXT_FILE)
    }

    pub fn summary(&self) -> PathBuf {
        self.dir.join(SUMMARY_FILE)
    }

    pub fn test_cases(&self) -> PathBuf {
        self.dir.join(TEST_CASES_FILE)
    }

    pub fn test_script(&self) -> PathBuf {
        self.dir.join(TEST_SCRIPT_FILE)
    }

    pub fn record(&self) -> PathBuf {
        self.dir.join(RECORD_FILE)
    }
}

pub struct RunStore {
    root: PathBuf,
    runs: Mutex<HashMap<String, PipelineRun>>,
}

impl RunStore {
    /// Open the store rooted at `root`, rehydrating any `run.json` records
    /// found there. An unreadable record is logged and skipped rather than
    /// failing the whole startup.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        let mut runs = HashMap::new();
        for entry in fs::read_dir(&root)? {
            let entry = entry?;
            let record_path = entry.path().join(RECORD_FILE);
            if !record_path.is_file() {
                continue;
            }
            match fs::read_to_string(&record_path)
                .map_err(StoreError::from)
                .and_then(|s| serde_json::from_str::<PipelineRun>(&s).map_err(StoreError::from))
            {
                Ok(run) => {
                    runs.insert(run.id.clone(), run);
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable run record {:?}: {}", record_path, e);
                }
            }
        }

        tracing::debug!("Run store opened with {} record(s) at {:?}", runs.len(), root);

        Ok(Self {
            root,
            runs: Mutex::new(runs),
        })
    }

    /// Mark every record still in the running state as failed. Called once at
    /// startup: a running record with no process behind it can only be a run
    /// interrupted by a crash or restart.
    pub fn sweep_interrupted(&self) -> Result<u32, StoreError> {
        let mut runs = self.lock()?;
        let mut swept = 0;
        for run in runs.values_mut() {
            if run.status == RunStatus::Running {
                run.status = RunStatus::Failed;
                run.error = Some("run was interrupted by a service restart".to_string());
                let now = chrono::Utc::now();
                run.updated_at = now;
                run.finished_at = Some(now);
                Self::persist(&self.root, run)?;
                swept += 1;
            }
        }
        Ok(swept)
    }

    /// Create a new pending run and its workspace directory.
    pub fn create(&self) -> Result<PipelineRun, StoreError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let run = PipelineRun::new(run_id.clone());

        fs::create_dir_all(self.paths(&run_id).dir())?;
        Self::persist(&self.root, &run)?;

        let mut runs = self.lock()?;
        runs.insert(run_id, run.clone());
        Ok(run)
    }

    pub fn get(&self, run_id: &str) -> Result<PipelineRun, StoreError> {
        let runs = self.lock()?;
        runs.get(run_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(run_id.to_string()))
    }

    /// All records, most recent first.
    pub fn list(&self) -> Result<Vec<PipelineRun>, StoreError> {
        let runs = self.lock()?;
        let mut all: Vec<PipelineRun> = runs.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    /// Apply `f` to the record, refresh its timestamps, and write the
    /// snapshot back to disk.
    pub fn update<F>(&self, run_id: &str, f: F) -> Result<PipelineRun, StoreError>
    where
        F: FnOnce(&mut PipelineRun),
    {
        let mut runs = self.lock()?;
        let run = runs
            .get_mut(run_id)
            .ok_or_else(|| StoreError::NotFound(run_id.to_string()))?;

        f(run);
        let now = chrono::Utc::now();
        run.updated_at = now;
        if run.status.is_terminal() && run.finished_at.is_none() {
            run.finished_at = Some(now);
        } else if !run.status.is_terminal() {
            run.finished_at = None;
        }

        Self::persist(&self.root, run)?;
        Ok(run.clone())
    }

    pub fn begin_stage(
        &self,
        run_id: &str,
        stage: PipelineStage,
    ) -> Result<PipelineRun, StoreError> {
        tracing::info!(run_id, stage = stage.as_str(), "Entering pipeline stage");
        self.update(run_id, |run| {
            run.status = RunStatus::Running;
            run.stage = Some(stage);
            run.error = None;
        })
    }

    /// Begin a stage only if the run is not already mid-pipeline. The check
    /// and the transition happen under one lock, so two concurrent triggers
    /// cannot both claim the same run.
    pub fn begin_exclusive(
        &self,
        run_id: &str,
        stage: PipelineStage,
    ) -> Result<PipelineRun, StoreError> {
        let mut runs = self.lock()?;
        let run = runs
            .get_mut(run_id)
            .ok_or_else(|| StoreError::NotFound(run_id.to_string()))?;

        if run.status == RunStatus::Running {
            return Err(StoreError::AlreadyRunning(run_id.to_string()));
        }

        run.status = RunStatus::Running;
        run.stage = Some(stage);
        run.error = None;
        run.updated_at = chrono::Utc::now();
        run.finished_at = None;
        Self::persist(&self.root, run)?;

        tracing::info!(run_id, stage = stage.as_str(), "Entering pipeline stage");
        Ok(run.clone())
    }

    pub fn finish_success(&self, run_id: &str) -> Result<PipelineRun, StoreError> {
        self.update(run_id, |run| {
            run.status = RunStatus::Succeeded;
            run.error = None;
        })
    }

    pub fn finish_failed(&self, run_id: &str, error: &str) -> Result<PipelineRun, StoreError> {
        self.update(run_id, |run| {
            run.status = RunStatus::Failed;
            run.error = Some(error.to_string());
        })
    }

    /// Park an upload-complete run back in the pending state, waiting for the
    /// generation trigger.
    pub fn park_pending(&self, run_id: &str) -> Result<PipelineRun, StoreError> {
        self.update(run_id, |run| {
            run.status = RunStatus::Pending;
            run.stage = None;
            run.error = None;
        })
    }

    pub fn paths(&self, run_id: &str) -> RunPaths {
        RunPaths::new(&self.root, run_id)
    }

    fn persist(root: &Path, run: &PipelineRun) -> Result<(), StoreError> {
        let paths = RunPaths::new(root, &run.id);
        let encoded = serde_json::to_string_pretty(run)?;
        fs::write(paths.record(), encoded)?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, PipelineRun>>, StoreError> {
        self.runs.lock().map_err(|e| StoreError::Lock(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, RunStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = RunStore::open(temp_dir.path().join("runs")).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_create_and_get() {
        let (_tmp, store) = create_test_store();
        let run = store.create().unwrap();

        assert_eq!(run.status, RunStatus::Pending);
        assert!(run.stage.is_none());
        assert!(store.paths(&run.id).dir().is_dir());
        assert!(store.paths(&run.id).record().is_file());

        let fetched = store.get(&run.id).unwrap();
        assert_eq!(fetched.id, run.id);
    }

    #[test]
    fn test_get_not_found() {
        let (_tmp, store) = create_test_store();
        assert!(matches!(
            store.get("nonexistent-run-id"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_stage_and_terminal_transitions() {
        let (_tmp, store) = create_test_store();
        let run = store.create().unwrap();

        let running = store.begin_stage(&run.id, PipelineStage::FetchDesign).unwrap();
        assert_eq!(running.status, RunStatus::Running);
        assert_eq!(running.stage, Some(PipelineStage::FetchDesign));
        assert!(running.finished_at.is_none());

        let failed = store.finish_failed(&run.id, "design API returned status 403").unwrap();
        assert_eq!(failed.status, RunStatus::Failed);
        assert!(failed.finished_at.is_some());
        assert_eq!(
            failed.error.as_deref(),
            Some("design API returned status 403")
        );

        // Re-entering a stage clears the previous failure.
        let retried = store.begin_stage(&run.id, PipelineStage::FetchDesign).unwrap();
        assert_eq!(retried.status, RunStatus::Running);
        assert!(retried.error.is_none());
        assert!(retried.finished_at.is_none());
    }

    #[test]
    fn test_begin_exclusive_refuses_running_run() {
        let (_tmp, store) = create_test_store();
        let run = store.create().unwrap();

        store
            .begin_exclusive(&run.id, PipelineStage::FetchDesign)
            .unwrap();
        assert!(matches!(
            store.begin_exclusive(&run.id, PipelineStage::FetchDesign),
            Err(StoreError::AlreadyRunning(_))
        ));

        // A finished run can be claimed again.
        store.finish_failed(&run.id, "remote call failed").unwrap();
        let reclaimed = store
            .begin_exclusive(&run.id, PipelineStage::FetchDesign)
            .unwrap();
        assert_eq!(reclaimed.status, RunStatus::Running);
        assert!(reclaimed.error.is_none());
    }

    #[test]
    fn test_park_pending_after_upload() {
        let (_tmp, store) = create_test_store();
        let run = store.create().unwrap();

        store.begin_stage(&run.id, PipelineStage::Ingest).unwrap();
        let parked = store.park_pending(&run.id).unwrap();
        assert_eq!(parked.status, RunStatus::Pending);
        assert!(parked.stage.is_none());
    }

    #[test]
    fn test_list_most_recent_first() {
        let (_tmp, store) = create_test_store();
        let first = store.create().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = store.create().unwrap();

        let all = store.list().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_records_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("runs");

        let run_id = {
            let store = RunStore::open(&root).unwrap();
            let run = store.create().unwrap();
            store
                .update(&run.id, |r| {
                    r.artifacts.summary_path = Some("/tmp/summary.txt".to_string());
                })
                .unwrap();
            store.finish_success(&run.id).unwrap();
            run.id
        };

        let reopened = RunStore::open(&root).unwrap();
        let run = reopened.get(&run_id).unwrap();
        assert_eq!(run.status, RunStatus::Succeeded);
        assert_eq!(
            run.artifacts.summary_path.as_deref(),
            Some("/tmp/summary.txt")
        );
    }

    #[test]
    fn test_sweep_marks_interrupted_runs_failed() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("runs");

        let (running_id, pending_id) = {
            let store = RunStore::open(&root).unwrap();
            let running = store.create().unwrap();
            store.begin_stage(&running.id, PipelineStage::TestCases).unwrap();
            let pending = store.create().unwrap();
            (running.id, pending.id)
        };

        let reopened = RunStore::open(&root).unwrap();
        assert_eq!(reopened.sweep_interrupted().unwrap(), 1);

        let swept = reopened.get(&running_id).unwrap();
        assert_eq!(swept.status, RunStatus::Failed);
        assert!(swept.error.as_deref().unwrap().contains("interrupted"));

        // Pending runs are legitimate parked state, not crash leftovers.
        assert_eq!(reopened.get(&pending_id).unwrap().status, RunStatus::Pending);

        // Nothing left to sweep on a second pass.
        assert_eq!(reopened.sweep_interrupted().unwrap(), 0);
    }

    #[test]
    fn test_unreadable_record_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("runs");

        {
            let store = RunStore::open(&root).unwrap();
            store.create().unwrap();
        }
        let junk_dir = root.join("not-a-run");
        fs::create_dir_all(&junk_dir).unwrap();
        fs::write(junk_dir.join(RECORD_FILE), "{ not json").unwrap();

        let reopened = RunStore::open(&root).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn test_workspace_file_layout() {
        let (_tmp, store) = create_test_store();
        let run = store.create().unwrap();
        let paths = store.paths(&run.id);

        assert!(paths.document().ends_with("document.pdf"));
        assert!(paths.extracted_text().ends_with("extracted.txt"));
        assert!(paths.summary().ends_with("summary.txt"));
        assert!(paths.test_cases().ends_with("test_cases.txt"));
        assert!(paths.test_script().ends_with("tests.spec.js"));
        for path in [paths.document(), paths.summary(), paths.test_script()] {
            assert!(path.starts_with(paths.dir()));
        }
    }
}
