//! Tuning state persistence
//!
//! Writers are serialized by an exclusive lock with a bounded number of
//! non-blocking attempts. Readers never take that lock: they see the last
//! committed state. A transaction whose closure fails commits nothing.

use crate::error::{EvalError, Result};
use crate::tuning::config::LockPolicy;
use crate::tuning::state::TuningState;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock, TryLockError};

/// Key the tuning state is stored under
pub const TUNING_STATE_KEY: &str = "auto_tune";

/// Outcome of a transaction closure: an optional state to commit plus a value
/// handed back to the caller
#[derive(Debug)]
pub struct Commit<T> {
    pub state: Option<TuningState>,
    pub value: T,
}

impl<T> Commit<T> {
    /// Persist `state` and return `value`
    pub fn write(state: TuningState, value: T) -> Self {
        Self {
            state: Some(state),
            value,
        }
    }

    /// Leave the stored state untouched
    pub fn skip(value: T) -> Self {
        Self { state: None, value }
    }
}

/// Shared, lock-protected store for [`TuningState`]
pub trait TuningStore {
    /// Last committed state, without taking the writer lock
    fn snapshot(&self) -> Result<Option<TuningState>>;

    /// Read-modify-write under the exclusive writer lock
    ///
    /// Fails with [`EvalError::ConcurrentTuningConflict`] when the lock is
    /// still held after the policy's attempts are exhausted.
    fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(Option<TuningState>) -> Result<Commit<T>>;
}

impl<S: TuningStore> TuningStore for &S {
    fn snapshot(&self) -> Result<Option<TuningState>> {
        (**self).snapshot()
    }

    fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(Option<TuningState>) -> Result<Commit<T>>,
    {
        (**self).transact(f)
    }
}

impl<S: TuningStore> TuningStore for Arc<S> {
    fn snapshot(&self) -> Result<Option<TuningState>> {
        (**self).snapshot()
    }

    fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(Option<TuningState>) -> Result<Commit<T>>,
    {
        (**self).transact(f)
    }
}

/// Retry `try_once` until it yields a guard or the attempt budget runs out
fn acquire_with_retry<G>(
    policy: LockPolicy,
    mut try_once: impl FnMut() -> Result<Option<G>>,
) -> Result<G> {
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        if let Some(guard) = try_once()? {
            return Ok(guard);
        }

        if attempt < attempts {
            tracing::debug!(attempt, "Tuning state lock busy, retrying");
            std::thread::sleep(policy.retry_delay);
        }
    }

    tracing::warn!(attempts, "Gave up waiting for tuning state lock");
    Err(EvalError::ConcurrentTuningConflict { attempts })
}

/// In-process store
///
/// The writer gate is a `Mutex`; the committed state sits behind an `RwLock`
/// so snapshots never wait on a long-running transaction.
#[derive(Debug, Default)]
pub struct MemoryTuningStore {
    writer: Mutex<()>,
    committed: RwLock<Option<TuningState>>,
    policy: LockPolicy,
}

impl MemoryTuningStore {
    pub fn new(policy: LockPolicy) -> Self {
        Self {
            writer: Mutex::new(()),
            committed: RwLock::new(None),
            policy,
        }
    }

    /// Store pre-seeded with `state`
    pub fn with_state(state: TuningState, policy: LockPolicy) -> Self {
        Self {
            writer: Mutex::new(()),
            committed: RwLock::new(Some(state)),
            policy,
        }
    }
}

impl TuningStore for MemoryTuningStore {
    fn snapshot(&self) -> Result<Option<TuningState>> {
        let committed = self
            .committed
            .read()
            .map_err(|_| EvalError::Store("tuning state lock poisoned".to_string()))?;
        Ok(committed.clone())
    }

    fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(Option<TuningState>) -> Result<Commit<T>>,
    {
        let _writer = acquire_with_retry(self.policy, || match self.writer.try_lock() {
            Ok(guard) => Ok(Some(guard)),
            Err(TryLockError::WouldBlock) => Ok(None),
            // The gate guards no data; committed state is replaced atomically
            Err(TryLockError::Poisoned(poisoned)) => Ok(Some(poisoned.into_inner())),
        })?;

        let commit = f(self.snapshot()?)?;

        if let Some(state) = commit.state {
            let mut committed = self
                .committed
                .write()
                .map_err(|_| EvalError::Store("tuning state lock poisoned".to_string()))?;
            *committed = Some(state);
        }

        Ok(commit.value)
    }
}

/// Exclusive `flock` on the sibling lock file, released on drop
struct FileLockGuard {
    file: File,
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        // SAFETY: the descriptor is owned by `self.file` and still open
        unsafe {
            libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
        }
    }
}

impl FileLockGuard {
    /// One non-blocking attempt; `Ok(None)` when another holder has it
    fn try_lock(path: &Path) -> Result<Option<Self>> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        // SAFETY: valid open descriptor; flock does not touch memory
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if rc == 0 {
            return Ok(Some(Self { file }));
        }

        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::WouldBlock {
            Ok(None)
        } else {
            Err(err.into())
        }
    }
}

/// JSON key-value document on disk, shared across processes
///
/// The state lives under [`TUNING_STATE_KEY`]; other keys in the document are
/// preserved. Writers hold an `flock` on `<path>.lock` and replace the
/// document through a temporary file and rename, so readers see either the
/// old or the new document.
#[derive(Debug, Clone)]
pub struct JsonFileTuningStore {
    path: PathBuf,
    lock_path: PathBuf,
    policy: LockPolicy,
}

type Document = BTreeMap<String, serde_json::Value>;

impl JsonFileTuningStore {
    pub fn new(path: impl Into<PathBuf>, policy: LockPolicy) -> Self {
        let path = path.into();
        let lock_path = sibling(&path, ".lock");
        Self {
            path,
            lock_path,
            policy,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Document> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Document::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Document::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_document(&self, document: &Document) -> Result<()> {
        let tmp_path = sibling(&self.path, ".tmp");
        let written = write_synced(&tmp_path, document)
            .and_then(|()| fs::rename(&tmp_path, &self.path).map_err(EvalError::from));

        if written.is_err() {
            // No partial document is left next to the store
            if let Err(err) = fs::remove_file(&tmp_path) {
                tracing::debug!(path = %tmp_path.display(), %err, "Temporary file not removed");
            }
        }
        written
    }
}

fn write_synced(path: &Path, document: &Document) -> Result<()> {
    let mut file = File::create(path)?;
    serde_json::to_writer_pretty(&mut file, document)?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    Ok(())
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

impl TuningStore for JsonFileTuningStore {
    fn snapshot(&self) -> Result<Option<TuningState>> {
        match self.read_document()?.remove(TUNING_STATE_KEY) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(Option<TuningState>) -> Result<Commit<T>>,
    {
        let _lock = acquire_with_retry(self.policy, || FileLockGuard::try_lock(&self.lock_path))?;

        let mut document = self.read_document()?;
        let current = match document.get(TUNING_STATE_KEY) {
            Some(value) => Some(serde_json::from_value(value.clone())?),
            None => None,
        };

        let commit = f(current)?;

        if let Some(state) = commit.state {
            document.insert(TUNING_STATE_KEY.to_string(), serde_json::to_value(&state)?);
            self.write_document(&document)?;
            tracing::debug!(
                path = %self.path.display(),
                generation = state.generation,
                "Tuning state committed"
            );
        }

        Ok(commit.value)
    }
}
